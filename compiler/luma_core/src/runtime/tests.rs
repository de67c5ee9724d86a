use super::*;
use std::sync::Arc;

use crate::print_handler::buffer_handler;
use crate::value::Closure;
use pretty_assertions::assert_eq;

fn add(_: &mut Runtime, stack: &mut Stack) -> RuntimeResult<usize> {
    let b = stack.pop()?.as_number().unwrap_or_default();
    let a = stack.pop()?.as_number().unwrap_or_default();
    stack.push(Value::from(a + b));
    Ok(1)
}

fn two_results(_: &mut Runtime, stack: &mut Stack) -> RuntimeResult<usize> {
    stack.push(Value::from("first"));
    stack.push(Value::from("second"));
    Ok(2)
}

fn fails_after_push(_: &mut Runtime, stack: &mut Stack) -> RuntimeResult<usize> {
    stack.push(Value::from("junk"));
    Err(RuntimeError::raised("boom"))
}

fn index_handler(_: &mut Runtime, stack: &mut Stack) -> RuntimeResult<usize> {
    let key = stack.pop()?;
    stack.pop()?;
    stack.push(Value::from(format!("computed {key}")));
    Ok(1)
}

fn tostring_handler(_: &mut Runtime, stack: &mut Stack) -> RuntimeResult<usize> {
    stack.pop()?;
    stack.push(Value::from("custom"));
    Ok(1)
}

fn bad_tostring_handler(_: &mut Runtime, stack: &mut Stack) -> RuntimeResult<usize> {
    stack.pop()?;
    stack.push(Value::from(true));
    Ok(1)
}

fn native(name: &'static str, func: NativeFn) -> Value {
    Value::Function(Function::native(name, func))
}

/// Closure bodies in these tests are plain Rust functions.
type Body = fn(Vec<Value>) -> RuntimeResult<Vec<Value>>;

struct FnEvaluator;

impl Evaluator for FnEvaluator {
    fn call_closure(
        &self,
        _runtime: &mut Runtime,
        _stack: &mut Stack,
        closure: &Closure,
        args: Vec<Value>,
    ) -> RuntimeResult<Vec<Value>> {
        let body = closure
            .body::<Body>()
            .ok_or_else(|| RuntimeError::raised("foreign closure"))?;
        body(args)
    }
}

fn doubled(args: Vec<Value>) -> RuntimeResult<Vec<Value>> {
    let n = args.first().and_then(Value::as_number).unwrap_or_default();
    Ok(vec![Value::from(n * 2.0)])
}

// Calls

#[test]
fn test_call_native_collects_results_in_push_order() {
    let mut rt = Runtime::new();
    let mut stack = rt.new_stack();
    let results = rt
        .call(&mut stack, &native("two", two_results), vec![])
        .unwrap();
    assert_eq!(results, vec![Value::from("first"), Value::from("second")]);
    assert_eq!(stack.top(), 0);
}

#[test]
fn test_call_passes_arguments() {
    let mut rt = Runtime::new();
    let mut stack = rt.new_stack();
    let results = rt
        .call(
            &mut stack,
            &native("add", add),
            vec![Value::from(2), Value::from(3)],
        )
        .unwrap();
    assert_eq!(results, vec![Value::from(5)]);
}

#[test]
fn test_call_restores_stack_on_success_and_error() {
    let mut rt = Runtime::new();
    let mut stack = rt.new_stack();
    stack.push(Value::from("outer"));
    stack.lock(1).unwrap();

    rt.call(&mut stack, &native("two", two_results), vec![Value::Nil])
        .unwrap();
    assert_eq!((stack.top(), stack.bottom()), (1, 1));

    let error = rt
        .call(&mut stack, &native("fail", fails_after_push), vec![Value::Nil])
        .unwrap_err();
    assert_eq!(error, RuntimeError::raised("boom"));
    assert_eq!((stack.top(), stack.bottom()), (1, 1));
}

#[test]
fn test_native_cannot_pop_caller_values() {
    let mut rt = Runtime::new();
    let mut stack = rt.new_stack();
    stack.push(Value::from(1));
    stack.push(Value::from(2));
    let error = rt
        .call(&mut stack, &native("add", add), vec![])
        .unwrap_err();
    assert_eq!(error, RuntimeError::StackUnderflow { bottom: 2 });
    assert_eq!(stack.top(), 2);
}

#[test]
fn test_overstated_result_count_is_rejected() {
    fn claims_too_many(_: &mut Runtime, stack: &mut Stack) -> RuntimeResult<usize> {
        stack.push(Value::from(1));
        Ok(usize::MAX)
    }

    let mut rt = Runtime::new();
    let mut stack = rt.new_stack();
    let error = rt
        .call(&mut stack, &native("liar", claims_too_many), vec![])
        .unwrap_err();
    assert_eq!(
        error,
        RuntimeError::ResultCountMismatch {
            function: "liar",
            count: usize::MAX,
            pushed: 1,
        }
    );
    assert_eq!((stack.top(), stack.bottom()), (0, 0));
}

#[test]
fn test_call_non_function_fails() {
    let mut rt = Runtime::new();
    let mut stack = rt.new_stack();
    assert_eq!(
        rt.call(&mut stack, &Value::from(3), vec![]),
        Err(RuntimeError::NotCallable {
            type_name: "number"
        })
    );
}

#[test]
fn test_closure_without_evaluator_fails() {
    let mut rt = Runtime::new();
    let mut stack = rt.new_stack();
    let body: Body = doubled;
    let closure = Value::Function(Function::closure(Closure::new(Some("double"), body)));
    assert_eq!(
        rt.call(&mut stack, &closure, vec![Value::from(4)]),
        Err(RuntimeError::NoEvaluator {
            name: "double".to_owned()
        })
    );
}

#[test]
fn test_closure_runs_through_evaluator() {
    let mut rt = Runtime::new();
    rt.set_evaluator(Rc::new(FnEvaluator));
    let mut stack = rt.new_stack();
    let body: Body = doubled;
    let closure = Value::Function(Function::closure(Closure::new(Some("double"), body)));
    assert_eq!(
        rt.call(&mut stack, &closure, vec![Value::from(4)]).unwrap(),
        vec![Value::from(8)]
    );
}

#[test]
fn test_protected_call_restores_environment_depth() {
    fn leaks_frame(rt: &mut Runtime, _: &mut Stack) -> RuntimeResult<usize> {
        rt.environment_mut().new_frame();
        Err(RuntimeError::raised("inside frame"))
    }

    let mut rt = Runtime::new();
    let mut stack = rt.new_stack();
    let depth = rt.environment().depth();
    let result = rt.protected_call(&mut stack, &native("leak", leaks_frame), vec![]);
    assert!(result.is_err());
    assert_eq!(rt.environment().depth(), depth);
}

// Registration and globals

#[test]
fn test_base_library_is_registered() {
    let rt = Runtime::new();
    for name in ["print", "error", "type", "pairs", "ipairs", "pcall", "setmetatable"] {
        assert_eq!(rt.global(name).type_name(), "function", "{name}");
    }
}

#[test]
fn test_register_and_lookup() {
    let mut rt = Runtime::new();
    rt.register("add", add);
    rt.environment_mut().define("local_only", 1);
    assert_eq!(rt.lookup("add").type_name(), "function");
    assert_eq!(rt.lookup("local_only"), Value::from(1));
    assert!(rt.lookup("absent").is_nil());
}

#[test]
fn test_config_controls_stack_increment() {
    let rt = Runtime::with_config(RuntimeConfig::default().with_stack_increment(8));
    assert!(rt.new_stack().capacity() >= 8);
    assert_eq!(rt.config().max_index_depth, DEFAULT_MAX_INDEX_DEPTH);
}

#[test]
fn test_print_handler_is_replaceable() {
    let handler = buffer_handler();
    let rt = Runtime::new().with_print_handler(Arc::clone(&handler));
    rt.print_handler().write_line("through runtime");
    assert_eq!(handler.output(), "through runtime\n");
}

// Index delegation

#[test]
fn test_index_prefers_own_entries() {
    let mut rt = Runtime::new();
    let mut stack = rt.new_stack();
    let fallback = Table::new();
    fallback.set_field("x", "fallback");
    let meta = Table::new();
    meta.set_field(INDEX_EVENT, fallback);
    let table = Table::new();
    table.set_field("x", "own");
    table.set_metatable(Some(meta));

    let value = rt
        .index(&mut stack, &Value::Table(table), &Value::from("x"))
        .unwrap();
    assert_eq!(value, Value::from("own"));
}

#[test]
fn test_index_delegates_to_table_chain() {
    let mut rt = Runtime::new();
    let mut stack = rt.new_stack();
    let root = Table::new();
    root.set_field("greeting", "hi");
    let middle = Table::new();
    let meta_middle = Table::new();
    meta_middle.set_field(INDEX_EVENT, root);
    middle.set_metatable(Some(meta_middle));
    let leaf = Table::new();
    let meta_leaf = Table::new();
    meta_leaf.set_field(INDEX_EVENT, middle);
    leaf.set_metatable(Some(meta_leaf));

    let value = rt
        .index(&mut stack, &Value::Table(leaf.clone()), &Value::from("greeting"))
        .unwrap();
    assert_eq!(value, Value::from("hi"));
    assert!(leaf.get_field("greeting").is_nil());
}

#[test]
fn test_index_delegates_to_function() {
    let mut rt = Runtime::new();
    let mut stack = rt.new_stack();
    let meta = Table::new();
    meta.set_field(INDEX_EVENT, native("handler", index_handler));
    let table = Table::new();
    table.set_metatable(Some(meta));

    let value = rt
        .index(&mut stack, &Value::Table(table), &Value::from("k"))
        .unwrap();
    assert_eq!(value, Value::from("computed k"));
    assert_eq!(stack.top(), 0);
}

#[test]
fn test_index_non_callable_handler_is_nil() {
    let mut rt = Runtime::new();
    let mut stack = rt.new_stack();
    let meta = Table::new();
    meta.set_field(INDEX_EVENT, 42);
    let table = Table::new();
    table.set_metatable(Some(meta));
    let value = rt
        .index(&mut stack, &Value::Table(table), &Value::from("k"))
        .unwrap();
    assert!(value.is_nil());
}

#[test]
fn test_index_cycle_hits_depth_limit() {
    let mut rt = Runtime::with_config(RuntimeConfig::default().with_max_index_depth(5));
    let mut stack = rt.new_stack();
    let a = Table::new();
    let b = Table::new();
    let meta_a = Table::new();
    let meta_b = Table::new();
    meta_a.set_field(INDEX_EVENT, b.clone());
    meta_b.set_field(INDEX_EVENT, a.clone());
    a.set_metatable(Some(meta_a));
    b.set_metatable(Some(meta_b));

    assert_eq!(
        rt.index(&mut stack, &Value::Table(a.clone()), &Value::from("missing")),
        Err(RuntimeError::IndexDepthExceeded { limit: 5 })
    );
    // Break the cycle so both tables are released.
    a.set_metatable(None);
}

#[test]
fn test_index_non_table_fails() {
    let mut rt = Runtime::new();
    let mut stack = rt.new_stack();
    assert_eq!(
        rt.index(&mut stack, &Value::from("s"), &Value::from(1)),
        Err(RuntimeError::NotIndexable {
            type_name: "string"
        })
    );
}

// String conversion

#[test]
fn test_tostring_uses_metamethod() {
    let mut rt = Runtime::new();
    let mut stack = rt.new_stack();
    let meta = Table::new();
    meta.set_field(TOSTRING_EVENT, native("show", tostring_handler));
    let table = Table::new();
    table.set_metatable(Some(meta));
    assert_eq!(
        rt.tostring(&mut stack, &Value::Table(table)).unwrap(),
        "custom"
    );
}

#[test]
fn test_tostring_rejects_non_string_result() {
    let mut rt = Runtime::new();
    let mut stack = rt.new_stack();
    let meta = Table::new();
    meta.set_field(TOSTRING_EVENT, native("bad", bad_tostring_handler));
    let table = Table::new();
    table.set_metatable(Some(meta));
    assert_eq!(
        rt.tostring(&mut stack, &Value::Table(table)),
        Err(RuntimeError::InvalidToStringResult)
    );
}

#[test]
fn test_tostring_without_metatable_is_identity_tag() {
    let mut rt = Runtime::new();
    let mut stack = rt.new_stack();
    let table = Table::new();
    let text = rt.tostring(&mut stack, &Value::Table(table.clone())).unwrap();
    assert_eq!(text, format!("table: {:#x}", table.identity()));
    assert_eq!(rt.tostring(&mut stack, &Value::from(1.5)).unwrap(), "1.5");
}

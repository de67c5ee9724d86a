use super::*;

#[test]
fn test_define_lookup() {
    let globals = Table::new();
    let mut env = Environment::new();
    env.define("x", 42);
    assert_eq!(env.lookup(&globals, "x").value, Value::from(42));
}

#[test]
fn test_shadowing_and_restore() {
    let globals = Table::new();
    let mut env = Environment::new();
    env.define("x", 1);

    env.new_frame();
    env.define("x", 2);
    assert_eq!(env.lookup(&globals, "x").value, Value::from(2));

    assert_eq!(env.pop_frame(), Ok(()));
    assert_eq!(env.lookup(&globals, "x").value, Value::from(1));
}

#[test]
fn test_inner_frame_sees_outer_bindings() {
    let globals = Table::new();
    let mut env = Environment::new();
    env.define("outer", "o");
    env.new_frame();
    env.new_frame();
    assert_eq!(env.lookup(&globals, "outer").value, Value::from("o"));
    assert_eq!(env.depth(), 3);
}

#[test]
fn test_global_fallback() {
    let globals = Table::new();
    globals.set_field("g", true);
    let env = Environment::new();

    let found = env.lookup(&globals, "g");
    assert_eq!(found.value, Value::Boolean(true));
    assert!(found.owner.ptr_eq(&globals));
}

#[test]
fn test_unbound_name_is_nil_owned_by_globals() {
    let globals = Table::new();
    let env = Environment::new();
    let found = env.lookup(&globals, "missing");
    assert!(found.value.is_nil());
    assert!(found.owner.ptr_eq(&globals));
}

#[test]
fn test_owner_allows_in_place_assignment() {
    let globals = Table::new();
    let mut env = Environment::new();
    env.define("counter", 1);
    env.new_frame();

    let found = env.lookup(&globals, "counter");
    found.owner.set_field("counter", 2);
    assert_eq!(env.pop_frame(), Ok(()));
    assert_eq!(env.lookup(&globals, "counter").value, Value::from(2));
}

#[test]
fn test_assign_updates_resolving_frame() {
    let globals = Table::new();
    let mut env = Environment::new();
    env.define("x", 1);
    env.new_frame();
    env.assign(&globals, "x", 5);
    env.assign(&globals, "fresh", "g");
    assert_eq!(env.pop_frame(), Ok(()));

    assert_eq!(env.lookup(&globals, "x").value, Value::from(5));
    assert_eq!(globals.get_field("fresh"), Value::from("g"));
}

#[test]
fn test_pop_root_frame_fails() {
    let mut env = Environment::new();
    assert_eq!(env.pop_frame(), Err(RuntimeError::UnbalancedFrames));

    env.new_frame();
    assert_eq!(env.pop_frame(), Ok(()));
    assert_eq!(env.pop_frame(), Err(RuntimeError::UnbalancedFrames));
}

#[test]
fn test_truncate_keeps_root() {
    let mut env = Environment::new();
    env.new_frame();
    env.new_frame();
    env.truncate(2);
    assert_eq!(env.depth(), 2);
    env.truncate(0);
    assert_eq!(env.depth(), 1);
}

#[test]
fn test_nil_binding_shadows_outer() {
    let globals = Table::new();
    let mut env = Environment::new();
    env.define("x", 1);

    env.new_frame();
    env.define("x", Value::Nil);
    let found = env.lookup(&globals, "x");
    assert!(found.value.is_nil());
    assert!(found.owner.ptr_eq(env.current()));

    env.assign(&globals, "x", 7);
    assert_eq!(env.lookup(&globals, "x").value, Value::from(7));

    assert_eq!(env.pop_frame(), Ok(()));
    assert_eq!(env.lookup(&globals, "x").value, Value::from(1));
}

#[test]
fn test_assigning_nil_keeps_binding_declared() {
    let globals = Table::new();
    globals.set_field("x", "global");
    let mut env = Environment::new();
    env.new_frame();
    env.define("x", "local");

    env.assign(&globals, "x", Value::Nil);
    assert!(env.lookup(&globals, "x").value.is_nil());
    assert_eq!(globals.get_field("x"), Value::from("global"));
}

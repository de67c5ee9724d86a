use std::collections::{BTreeMap, HashMap};

use luma_core::{Function, Runtime, RuntimeResult, Stack};
use pretty_assertions::assert_eq;
use serde::Serialize;

use super::*;
use crate::config::TrailingCommas;
use crate::errors::EmitError;

#[derive(Serialize)]
struct Settings {
    name: &'static str,
    volume: u8,
    muted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    theme: Option<&'static str>,
    notes: Option<&'static str>,
}

#[derive(Serialize, Clone, Copy)]
enum Color {
    Red,
    Green,
    #[serde(rename = "Blue")]
    Azure,
}

#[derive(Serialize)]
enum Event {
    Click { x: i32, y: i32 },
    Key(char),
    Move(i32, i32),
}

fn settings() -> Settings {
    Settings {
        name: "main",
        volume: 7,
        muted: false,
        theme: None,
        notes: None,
    }
}

#[test]
fn primitives() {
    let b = Builder::default();
    assert_eq!(b.build(&42).unwrap(), "42");
    assert_eq!(b.build(&-0.5).unwrap(), "-0.5");
    assert_eq!(b.build(&true).unwrap(), "true");
    assert_eq!(b.build("say \"hi\"").unwrap(), "\"say \\\"hi\\\"\"");
    assert_eq!(b.build(&None::<u8>).unwrap(), "nil");
    assert_eq!(b.build(&f64::NEG_INFINITY).unwrap(), "-math.huge");
}

#[test]
fn structs_are_field_tables_in_declared_order() {
    let b = Builder::default();
    assert_eq!(
        b.build(&settings()).unwrap(),
        "{ name = \"main\", volume = 7, muted = false }"
    );
}

#[test]
fn explicit_nil_keeps_nil_fields() {
    let b = Builder::new(EmitConfig::default().with_explicit_nil(true));
    assert_eq!(
        b.build(&settings()).unwrap(),
        "{ name = \"main\", volume = 7, muted = false, notes = nil }"
    );
}

#[test]
fn sequences_keep_nil_items() {
    let b = Builder::default();
    assert_eq!(b.build(&[Some(1), None, Some(3)]).unwrap(), "{ 1, nil, 3 }");
    assert_eq!(b.build(&Vec::<i32>::new()).unwrap(), "{}");
}

#[test]
fn maps_are_sorted_for_determinism() {
    let b = Builder::default();
    let mut map = HashMap::new();
    for (i, name) in ["delta", "alpha", "charlie", "bravo"].into_iter().enumerate() {
        map.insert(name, i);
    }
    let expected = "{ alpha = 1, bravo = 3, charlie = 2, delta = 0 }";
    for _ in 0..5 {
        assert_eq!(b.build(&map).unwrap(), expected);
    }
}

#[test]
fn integer_keyed_maps_become_arrays_when_dense() {
    let b = Builder::default();
    let dense: HashMap<u32, &str> = [(2, "b"), (1, "a"), (3, "c")].into_iter().collect();
    assert_eq!(b.build(&dense).unwrap(), "{ \"a\", \"b\", \"c\" }");

    let sparse: BTreeMap<i32, bool> = [(1, true), (5, false)].into_iter().collect();
    assert_eq!(b.build(&sparse).unwrap(), "{ [1] = true, [5] = false }");
}

#[test]
fn mixed_key_kinds_are_ordered_by_kind() {
    let b = Builder::default();
    let pairs = vec![
        (HostValue::Boolean(true), HostValue::Number(1.0)),
        (HostValue::String("s".to_owned()), HostValue::Number(2.0)),
        (HostValue::Number(10.0), HostValue::Number(3.0)),
    ];
    let literal = b.convert(&HostValue::Map(pairs), &mut Vec::new()).unwrap();
    assert_eq!(
        b.to_source(&literal).unwrap(),
        "{ [10] = 3, [\"s\"] = 2, [true] = 1 }"
    );
}

#[test]
fn pair_lists_keep_caller_order() {
    let b = Builder::default();
    assert_eq!(
        b.build_pairs(&[("a", 1), ("b", 2)]).unwrap(),
        "{ a = 1, b = 2 }"
    );
    assert_eq!(
        b.build_pairs(&[("b", 2), ("a", 1)]).unwrap(),
        "{ b = 2, a = 1 }"
    );
    assert_eq!(
        b.build_pairs(&[("not ident", 1)]).unwrap(),
        "{ [\"not ident\"] = 1 }"
    );
}

#[test]
fn unsupported_keys() {
    let b = Builder::default();
    let mut by_list = BTreeMap::new();
    by_list.insert(vec![1], 1);
    assert_eq!(
        b.build(&by_list),
        Err(BuildError::UnsupportedKey { kind: "sequence" })
    );
    assert_eq!(
        b.build_pairs(&[(f64::NAN, 1)]),
        Err(BuildError::UnsupportedKey { kind: "NaN" })
    );
}

#[test]
fn enums_default_to_numbers() {
    let b = Builder::default();
    assert_eq!(b.build(&[Color::Red, Color::Azure]).unwrap(), "{ 0, 2 }");
}

#[test]
fn enum_styles_per_type_and_by_config() {
    let mut b = Builder::default();
    b.set_enum_style("Color", EnumStyle::String);
    assert_eq!(b.build(&Color::Azure).unwrap(), "\"Blue\"");

    let b = Builder::new(EmitConfig::default().with_enums_as_numbers(false));
    assert_eq!(b.build(&Color::Green).unwrap(), "Color.Green");

    let mut b = Builder::default();
    b.set_enum_style("Color", EnumStyle::Symbol);
    let keyed: BTreeMap<&str, Color> = [("fg", Color::Red)].into_iter().collect();
    assert_eq!(b.build(&keyed).unwrap(), "{ fg = Color.Red }");
}

#[test]
fn data_variants_are_tagged_tables() {
    let b = Builder::default();
    assert_eq!(
        b.build(&Event::Click { x: 1, y: 2 }).unwrap(),
        "{ Click = { x = 1, y = 2 } }"
    );
    assert_eq!(b.build(&Event::Key('q')).unwrap(), "{ Key = \"q\" }");
    assert_eq!(b.build(&Event::Move(3, 4)).unwrap(), "{ Move = { 3, 4 } }");
}

#[test]
fn unrepresentable_integers_fail() {
    let b = Builder::default();
    assert!(matches!(
        b.build(&u64::MAX),
        Err(BuildError::Unconvertible { .. })
    ));
}

struct PointConverter;

impl Converter for PointConverter {
    fn convert(&self, value: &HostValue, cx: &mut ConvertContext<'_>) -> BuildResult<Literal> {
        let x = value.field("x").and_then(HostValue::as_number).unwrap_or(0.0);
        let y = value.field("y").and_then(HostValue::as_number).unwrap_or(0.0);
        let ctor = cx
            .context()
            .and_then(|c| c.field("ctor"))
            .and_then(HostValue::as_str)
            .unwrap_or("Point");
        Ok(Literal::raw(format!("{ctor}({x}, {y})")))
    }
}

#[derive(Serialize)]
struct Point {
    x: i32,
    y: i32,
}

#[derive(Serialize)]
struct Ctx {
    ctor: &'static str,
}

#[derive(Serialize)]
struct Scene {
    __context: Ctx,
    origin: Point,
    names: Vec<&'static str>,
}

#[derive(Serialize)]
struct Plain {
    origin: Point,
}

#[test]
fn converters_override_default_conversion() {
    let mut b = Builder::default();
    b.register_converter("Point", PointConverter);
    assert_eq!(b.build(&Point { x: 1, y: 2 }).unwrap(), "Point(1, 2)");
    assert_eq!(
        b.build(&Plain {
            origin: Point { x: 0, y: -1 }
        })
        .unwrap(),
        "{ origin = Point(0, -1) }"
    );
}

#[test]
fn context_marker_is_visible_to_sibling_conversions_only() {
    let mut b = Builder::default();
    b.register_converter("Point", PointConverter);
    let scene = Scene {
        __context: Ctx { ctor: "vec2" },
        origin: Point { x: 3, y: 4 },
        names: vec!["a"],
    };
    assert_eq!(
        b.build(&scene).unwrap(),
        "{ origin = vec2(3, 4), names = { \"a\" } }"
    );

    let outside = (
        Scene {
            __context: Ctx { ctor: "vec2" },
            origin: Point { x: 0, y: 0 },
            names: vec![],
        },
        Point { x: 1, y: 1 },
    );
    assert_eq!(
        b.build(&outside).unwrap(),
        "{ { origin = vec2(0, 0), names = {} }, Point(1, 1) }"
    );
}

struct CircleOnly;

impl Converter for CircleOnly {
    fn can_convert(&self, concrete: &str) -> bool {
        concrete == "Shape::Circle"
    }

    fn convert(&self, _value: &HostValue, _cx: &mut ConvertContext<'_>) -> BuildResult<Literal> {
        Ok(Literal::raw("circle()"))
    }
}

#[derive(Serialize)]
enum Shape {
    Circle,
    Square,
}

#[test]
fn declining_converter_is_an_error() {
    let mut b = Builder::default();
    b.register_converter("Shape", CircleOnly);
    assert_eq!(b.build(&Shape::Circle).unwrap(), "circle()");
    assert_eq!(
        b.build(&Shape::Square),
        Err(BuildError::ConverterDeclined {
            type_name: "Shape".to_owned(),
            concrete: "Shape::Square".to_owned(),
        })
    );
}

struct Nested;

impl Converter for Nested {
    fn convert(&self, value: &HostValue, cx: &mut ConvertContext<'_>) -> BuildResult<Literal> {
        let HostValue::Named { inner, .. } = value else {
            return Err(BuildError::unconvertible("Wrapper", "expected a newtype"));
        };
        let inner = cx.build(inner)?;
        Ok(TableLiteral::new().with_field("wrapped", inner).into())
    }
}

#[derive(Serialize)]
struct Wrapper(Vec<u8>);

#[test]
fn converters_can_delegate_back() {
    let mut b = Builder::new(EmitConfig::default().with_semicolons(false));
    b.register_converter("Wrapper", Nested);
    assert_eq!(b.build(&Wrapper(vec![1, 2])).unwrap(), "{ wrapped = { 1, 2 } }");
}

#[test]
fn symbolic_names_must_be_identifiers() {
    let mut b = Builder::default();
    b.set_enum_style("Color", EnumStyle::Symbol);
    assert_eq!(
        b.unit_variant("Color", "not valid", 0),
        Err(BuildError::unconvertible(
            "Color",
            "'Color.not valid' is not a valid symbolic name"
        ))
    );
}

#[test]
fn multi_line_layout_through_builder() {
    let b = Builder::new(
        EmitConfig::default()
            .with_single_line_threshold(10)
            .with_trailing_commas(TrailingCommas::Always),
    );
    assert_eq!(
        b.build_pairs(&[("first", 1), ("second", 2)]).unwrap(),
        "{\n\tfirst = 1,\n\tsecond = 2,\n}"
    );
}

#[test]
fn runtime_tables() {
    let b = Builder::default();
    let table = Table::from_sequence([Value::Number(1.0), Value::string("two")]);
    table.set_field("name", "x");
    table.set(Key::Boolean(false), Value::Boolean(true));
    assert_eq!(
        b.value_source(&Value::Table(table)).unwrap(),
        "{ [1] = 1, [2] = \"two\", [\"name\"] = \"x\", [false] = true }"
    );

    let fields = Table::new();
    fields.set_field("a", 1.0);
    fields.set_field("b", Value::Table(Table::from_sequence([Value::Boolean(true)])));
    assert_eq!(
        b.value_source(&Value::Table(fields)).unwrap(),
        "{ a = 1, b = { true } }"
    );
}

fn noop(_runtime: &mut Runtime, _stack: &mut Stack) -> RuntimeResult<usize> {
    Ok(0)
}

#[test]
fn runtime_cycles_and_functions_are_rejected() {
    let b = Builder::default();
    let table = Table::new();
    table.set_field("self", Value::Table(table.clone()));
    assert_eq!(
        b.from_value(&Value::Table(table.clone())),
        Err(BuildError::CyclicTable {
            identity: table.identity()
        })
    );
    table.set_field("self", Value::Nil);

    let f = Value::Function(Function::native("noop", noop));
    assert!(matches!(
        b.from_value(&f),
        Err(BuildError::Unconvertible { .. })
    ));

    let shared = Table::from_sequence([Value::Number(1.0)]);
    let twice = Table::from_sequence([Value::Table(shared.clone()), Value::Table(shared)]);
    assert_eq!(
        b.value_source(&Value::Table(twice)).unwrap(),
        "{ { 1 }, { 1 } }"
    );
}

#[test]
fn failed_build_reports_emit_errors() {
    let b = Builder::default();
    let mut literal = TableLiteral::new();
    literal.insert(LiteralKey::Number(f64::NAN), Literal::Nil);
    assert_eq!(
        b.to_source(&literal.into()),
        Err(BuildError::Emit(EmitError::InvalidKey {
            key: "NaN".to_owned()
        }))
    );
}

#[test]
fn scripts_assemble_statements() {
    let b = Builder::default();
    let mut script = b.script();
    script.comment("settings");
    script.local("volume", &7).unwrap();
    script.assign("config.main", &settings()).unwrap();
    assert!(script.assign("config.bad", &u64::MAX).is_err());
    assert!(script.assign("1bad", &1).is_err());
    script
        .function("config:reset", &["self"], |w| {
            w.assign("self.volume", &Literal::Number(0.0))
        })
        .unwrap();
    script.returning(&Color::Green).unwrap();
    assert_eq!(
        script.finish().unwrap(),
        "-- settings\n\
         local volume = 7;\n\
         config.main = { name = \"main\", volume = 7, muted = false };\n\
         -- generated function config:reset\n\
         function config:reset(self)\n\
         \tself.volume = 0;\n\
         end\n\
         return 1;\n"
    );
}

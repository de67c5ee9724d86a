use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use serde::Serialize;

use super::*;

#[derive(Serialize)]
struct Point {
    x: i32,
    y: f64,
    #[serde(skip)]
    cache: u8,
    #[serde(rename = "label")]
    name: Option<String>,
}

#[derive(Serialize)]
struct Meters(f64);

#[derive(Serialize)]
struct Pair(u8, u8);

#[derive(Serialize)]
struct Marker;

#[derive(Serialize)]
enum Shape {
    Empty,
    Circle(f64),
    Segment(i32, i32),
    Rect { w: u32, h: u32 },
}

#[test]
fn primitives() {
    assert_eq!(capture(&()).unwrap(), HostValue::Nil);
    assert_eq!(capture(&true).unwrap(), HostValue::Boolean(true));
    assert_eq!(capture(&-7i8).unwrap(), HostValue::Number(-7.0));
    assert_eq!(capture(&2.5f32).unwrap(), HostValue::Number(2.5));
    assert_eq!(capture(&'x').unwrap(), HostValue::String("x".to_owned()));
    assert_eq!(capture("hi").unwrap(), HostValue::String("hi".to_owned()));
    assert_eq!(capture(&None::<i32>).unwrap(), HostValue::Nil);
    assert_eq!(capture(&Some(3u16)).unwrap(), HostValue::Number(3.0));
}

#[test]
fn large_integers_must_be_exact() {
    let limit = 1i64 << 53;
    assert_eq!(capture(&limit).unwrap(), HostValue::Number(9_007_199_254_740_992.0));
    assert_eq!(capture(&-limit).unwrap(), HostValue::Number(-9_007_199_254_740_992.0));
    assert!(matches!(
        capture(&(limit + 1)),
        Err(BuildError::Unconvertible { .. })
    ));
    assert!(capture(&u64::MAX).is_err());
    assert!(capture(&i64::MIN).is_err());
    assert_eq!(capture(&12i128).unwrap(), HostValue::Number(12.0));
    assert!(capture(&u128::MAX).is_err());
}

#[test]
fn structs_keep_declared_order_and_annotations() {
    let point = Point {
        x: 1,
        y: 2.5,
        cache: 9,
        name: None,
    };
    let captured = capture(&point).unwrap();
    assert_eq!(
        captured,
        HostValue::Object {
            type_name: "Point",
            fields: vec![
                ("x", HostValue::Number(1.0)),
                ("y", HostValue::Number(2.5)),
                ("label", HostValue::Nil),
            ],
        }
    );
    assert_eq!(captured.type_name(), Some("Point"));
    assert_eq!(captured.concrete_name(), "Point");
    assert_eq!(captured.field("y").and_then(HostValue::as_number), Some(2.5));
    assert_eq!(captured.field("cache"), None);
    assert_eq!(point.cache, 9);
}

#[test]
fn named_values() {
    assert_eq!(
        capture(&Meters(3.0)).unwrap(),
        HostValue::Named {
            type_name: "Meters",
            inner: Box::new(HostValue::Number(3.0)),
        }
    );
    assert_eq!(
        capture(&Pair(1, 2)).unwrap(),
        HostValue::Named {
            type_name: "Pair",
            inner: Box::new(HostValue::Sequence(vec![
                HostValue::Number(1.0),
                HostValue::Number(2.0),
            ])),
        }
    );
    assert_eq!(
        capture(&Marker).unwrap(),
        HostValue::Object {
            type_name: "Marker",
            fields: vec![],
        }
    );
}

#[test]
fn enum_variants() {
    let empty = capture(&Shape::Empty).unwrap();
    assert_eq!(
        empty,
        HostValue::Variant {
            type_name: "Shape",
            variant: "Empty",
            index: 0,
            payload: VariantPayload::Unit,
        }
    );
    assert_eq!(empty.concrete_name(), "Shape::Empty");

    let HostValue::Variant { index, payload, .. } = capture(&Shape::Circle(1.5)).unwrap() else {
        panic!("expected a variant");
    };
    assert_eq!(index, 1);
    assert_eq!(payload, VariantPayload::Newtype(Box::new(HostValue::Number(1.5))));

    let HostValue::Variant { payload, .. } = capture(&Shape::Segment(1, 2)).unwrap() else {
        panic!("expected a variant");
    };
    assert_eq!(
        payload,
        VariantPayload::Tuple(vec![HostValue::Number(1.0), HostValue::Number(2.0)])
    );

    let rect = capture(&Shape::Rect { w: 3, h: 4 }).unwrap();
    assert_eq!(rect.field("h"), Some(&HostValue::Number(4.0)));
}

#[test]
fn collections() {
    assert_eq!(
        capture(&["a", "b"]).unwrap(),
        HostValue::Sequence(vec![
            HostValue::String("a".to_owned()),
            HostValue::String("b".to_owned()),
        ])
    );
    assert_eq!(
        capture(&(1u8, false)).unwrap(),
        HostValue::Sequence(vec![HostValue::Number(1.0), HostValue::Boolean(false)])
    );

    let mut map = BTreeMap::new();
    map.insert("k", 1);
    map.insert("j", 2);
    assert_eq!(
        capture(&map).unwrap(),
        HostValue::Map(vec![
            (HostValue::String("j".to_owned()), HostValue::Number(2.0)),
            (HostValue::String("k".to_owned()), HostValue::Number(1.0)),
        ])
    );
}

#[test]
fn deep_nesting_does_not_overflow() {
    let mut value = HostValueTree::Leaf;
    for _ in 0..10_000 {
        value = HostValueTree::Node(Box::new(value));
    }
    let mut captured = &capture(&value).unwrap();
    let mut depth = 0;
    while let HostValue::Variant {
        payload: VariantPayload::Newtype(inner),
        ..
    } = captured
    {
        captured = inner;
        depth += 1;
    }
    assert_eq!(depth, 10_000);
}

#[derive(Serialize)]
enum HostValueTree {
    Leaf,
    Node(Box<HostValueTree>),
}

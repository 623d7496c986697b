//! Registered types, templates, resources, and instance isolation.

use std::rc::Rc;
use tangle::{
    ClassHandle, Codec, Custom, DecodeError, EncodeError, Proc, RegistryError, Table, TableRef,
    Template, TemplatePart, TypeDef, Value,
};

fn table_of(v: &Value) -> TableRef {
    v.to_table().expect("expected a table")
}

fn cool_table(class: &ClassHandle) -> Value {
    let mut t = Table::with_class(class.clone());
    t.set(Value::from("a"), Value::from("a"));
    t.set(Value::from("b"), Value::from("b"));
    t.set(Value::from("c"), Value::from("c"));
    Value::from(t)
}

#[test]
fn default_codec_round_trips_classed_tables() {
    let class = ClassHandle::named("MyCoolType");
    let mut codec = Codec::new();
    codec
        .register(class.clone(), "MyCoolType", TypeDef::new())
        .unwrap();

    let out = codec.serialize(&[cool_table(&class)]).unwrap();
    let dec = codec.deserialize(&out).unwrap();

    let back = table_of(&dec[0]);
    let back = back.borrow();
    assert_eq!(back.class(), Some(&class));
    for k in ["a", "b", "c"] {
        assert_eq!(back.get(&Value::from(k)), Some(&Value::from(k)));
    }
}

#[test]
fn unregistered_class_travels_as_plain_table() {
    let class = ClassHandle::named("ghost");
    let out = tangle::serialize(&[cool_table(&class)]).unwrap();
    let dec = tangle::deserialize(&out).unwrap();
    let back = table_of(&dec[0]);
    assert_eq!(back.borrow().class(), None);
    assert_eq!(
        back.borrow().get(&Value::from("a")),
        Some(&Value::from("a"))
    );
}

#[test]
fn custom_callbacks_round_trip_opaque_values() {
    #[derive(Debug, PartialEq)]
    struct Point {
        x: i64,
        y: i64,
    }

    let class = ClassHandle::named("point");
    let def = {
        let class = class.clone();
        TypeDef::new()
            .with_encode(|v| match v {
                Value::Custom(c) => {
                    let p = c.downcast_ref::<Point>().ok_or(
                        EncodeError::Unserializable("a point that is not a Point"),
                    )?;
                    Ok(vec![Value::from(p.x), Value::from(p.y)])
                }
                _ => Err(EncodeError::Unserializable("not a point")),
            })
            .with_decode(move |args| {
                let (x, y) = match (args.first(), args.get(1)) {
                    (Some(Value::Int(x)), Some(Value::Int(y))) => (*x, *y),
                    _ => {
                        return Err(DecodeError::Custom {
                            name: "point".to_string(),
                            message: "expected two integers".to_string(),
                        })
                    }
                };
                Ok(Value::from(Custom::new(class.clone(), Point { x, y })))
            })
    };

    let mut codec = Codec::new();
    codec.register(class.clone(), "point", def).unwrap();

    let p = Value::from(Custom::new(class, Point { x: 3, y: -4 }));
    let out = codec.serialize(&[p.clone(), p]).unwrap();
    let dec = codec.deserialize(&out).unwrap();

    match (&dec[0], &dec[1]) {
        (Value::Custom(a), Value::Custom(b)) => {
            // the second tuple entry back-referenced the first
            assert!(Rc::ptr_eq(a, b));
            assert_eq!(a.downcast_ref::<Point>(), Some(&Point { x: 3, y: -4 }));
        }
        _ => panic!("expected custom values"),
    }
}

#[test]
fn custom_without_encoder_is_rejected() {
    let class = ClassHandle::named("blob");
    let mut codec = Codec::new();
    codec.register(class.clone(), "blob", TypeDef::new()).unwrap();

    let v = Value::from(Custom::new(class, 17u32));
    assert!(matches!(
        codec.serialize(&[v]),
        Err(EncodeError::Unserializable(_))
    ));
}

#[test]
fn templates_omit_key_strings() {
    let class = ClassHandle::named("shot");
    let template = Template::new(vec![
        TemplatePart::Key(Value::from("damage")),
        TemplatePart::Nested(Value::from("pos"), Template::keys(["x", "y"])),
    ]);
    let mut codec = Codec::new();
    codec
        .register(
            class.clone(),
            "shot",
            TypeDef::new().with_template(template),
        )
        .unwrap();

    let mut pos = Table::new();
    pos.set(Value::from("x"), Value::from(10));
    pos.set(Value::from("y"), Value::from(20));
    let mut shot = Table::with_class(class.clone());
    shot.set(Value::from("damage"), Value::from(42));
    shot.set(Value::from("pos"), Value::from(pos));
    shot.set(Value::from("crit"), Value::from(true)); // not in the template

    let out = codec.serialize(&[Value::from(shot)]).unwrap();

    // templated keys never hit the wire; the tail key does
    let has = |needle: &[u8]| out.windows(needle.len()).any(|w| w == needle);
    assert!(!has(b"damage"));
    assert!(!has(b"x"));
    assert!(has(b"crit"));

    let dec = codec.deserialize(&out).unwrap();
    let back = table_of(&dec[0]);
    let back = back.borrow();
    assert_eq!(back.class(), Some(&class));
    assert_eq!(back.get(&Value::from("damage")), Some(&Value::from(42)));
    assert_eq!(back.get(&Value::from("crit")), Some(&Value::from(true)));
    let pos = table_of(back.get(&Value::from("pos")).unwrap());
    assert_eq!(pos.borrow().get(&Value::from("y")), Some(&Value::from(20)));
}

#[test]
fn template_missing_keys_travel_as_null() {
    let class = ClassHandle::named("sparse");
    let mut codec = Codec::new();
    codec
        .register(
            class.clone(),
            "sparse",
            TypeDef::new().with_template(Template::keys(["x", "y"])),
        )
        .unwrap();

    let mut t = Table::with_class(class);
    t.set(Value::from("y"), Value::from(2));

    let out = codec.serialize(&[Value::from(t)]).unwrap();
    let dec = codec.deserialize(&out).unwrap();
    let back = table_of(&dec[0]);
    assert_eq!(back.borrow().get(&Value::from("x")), None);
    assert_eq!(back.borrow().get(&Value::from("y")), Some(&Value::from(2)));
}

#[test]
fn unknown_type_is_a_decode_error() {
    let class = ClassHandle::named("here");
    let mut writer = Codec::new();
    writer.register(class.clone(), "here", TypeDef::new()).unwrap();

    let out = writer.serialize(&[cool_table(&class)]).unwrap();
    let reader = Codec::new();
    assert!(matches!(
        reader.deserialize(&out),
        Err(DecodeError::UnknownType { name }) if name == "here"
    ));
}

#[test]
fn duplicate_registrations_are_rejected() {
    let a = ClassHandle::named("a");
    let b = ClassHandle::named("b");
    let mut codec = Codec::new();
    codec.register(a.clone(), "a", TypeDef::new()).unwrap();

    assert!(matches!(
        codec.register(b.clone(), "a", TypeDef::new()),
        Err(RegistryError::DuplicateName(_))
    ));
    assert!(matches!(
        codec.register(a.clone(), "other", TypeDef::new()),
        Err(RegistryError::DuplicateIdentity(_))
    ));

    // unregistering frees both directions
    assert!(codec.unregister("a"));
    codec.register(a, "other", TypeDef::new()).unwrap();
    codec.register(b, "a", TypeDef::new()).unwrap();
}

#[test]
fn register_class_uses_the_descriptor_name() {
    let class = ClassHandle::named("FromDescriptor");
    let mut codec = Codec::new();
    codec.register_class(&class, None, TypeDef::new()).unwrap();

    let out = codec.serialize(&[cool_table(&class)]).unwrap();
    let dec = codec.deserialize(&out).unwrap();
    assert_eq!(table_of(&dec[0]).borrow().class(), Some(&class));

    let anon = ClassHandle::new();
    assert!(matches!(
        codec.register_class(&anon, None, TypeDef::new()),
        Err(RegistryError::MissingName)
    ));
}

#[test]
fn instances_are_isolated() {
    let class_a = ClassHandle::named("A");
    let class_b = ClassHandle::named("B");

    let mut codec_a = Codec::new();
    codec_a.register(class_a.clone(), "thing", TypeDef::new()).unwrap();
    let mut codec_b = Codec::new();
    codec_b.register(class_b.clone(), "thing", TypeDef::new()).unwrap();

    let out = codec_a.serialize(&[cool_table(&class_a)]).unwrap();

    // each instance resolves the name against its own registry
    let from_a = codec_a.deserialize(&out).unwrap();
    assert_eq!(table_of(&from_a[0]).borrow().class(), Some(&class_a));
    let from_b = codec_b.deserialize(&out).unwrap();
    assert_eq!(table_of(&from_b[0]).borrow().class(), Some(&class_b));
}

#[test]
fn resources_serialize_by_name_only() {
    let shared = Table::new().into_ref();
    shared.borrow_mut().set(Value::from("kind"), Value::from("db"));

    let mut writer = Codec::new();
    writer
        .register_resource("the-db", Value::Table(shared.clone()))
        .unwrap();

    let v = Value::Table(shared);
    let out = writer.serialize(&[v.clone(), v]).unwrap();

    // two resource tags, but the name string travels once
    assert_eq!(out.iter().filter(|&&b| b == 211).count(), 2);
    let hits = out.windows(6).filter(|w| w[..] == b"the-db"[..]).count();
    assert_eq!(hits, 1);

    // the reader resolves against its own object
    let replacement = Table::new().into_ref();
    let mut reader = Codec::new();
    reader
        .register_resource("the-db", Value::Table(replacement.clone()))
        .unwrap();
    let dec = reader.deserialize(&out).unwrap();
    assert!(Rc::ptr_eq(&table_of(&dec[0]), &replacement));
    assert!(Rc::ptr_eq(&table_of(&dec[1]), &replacement));

    // an unregistered reader fails with a named error
    assert!(matches!(
        Codec::new().deserialize(&out),
        Err(DecodeError::UnknownResource { name }) if name == "the-db"
    ));
}

#[test]
fn resource_registry_validates() {
    let mut codec = Codec::new();
    assert!(matches!(
        codec.register_resource("n", Value::from(1)),
        Err(RegistryError::NotShareable)
    ));

    let t = Table::new().into_ref();
    codec.register_resource("t", Value::Table(t.clone())).unwrap();
    assert!(matches!(
        codec.register_resource("t", Value::Table(Table::new().into_ref())),
        Err(RegistryError::DuplicateName(_))
    ));
    assert!(matches!(
        codec.register_resource("other", Value::Table(t.clone())),
        Err(RegistryError::DuplicateIdentity(_))
    ));

    let back = codec.unregister_resource("t").unwrap();
    assert!(Rc::ptr_eq(&table_of(&back), &t));
    assert!(codec.unregister_resource("t").is_none());
}

#[test]
fn infinite_constructor_is_detected() {
    let class = ClassHandle::named("selfish");
    let def = TypeDef::new().with_encode(|v| Ok(vec![v.clone()]));
    let mut codec = Codec::new();
    codec.register(class.clone(), "selfish", def).unwrap();

    let t = Value::from(Table::with_class(class));
    assert!(matches!(
        codec.serialize(&[t]),
        Err(EncodeError::InfiniteConstructor(name)) if name == "selfish"
    ));
}

#[test]
fn procedures_need_hooks() {
    let p = Value::from(Proc::new(String::from("return 42")));
    assert!(matches!(
        tangle::serialize(&[p.clone()]),
        Err(EncodeError::Unserializable(_))
    ));

    let mut codec = Codec::new();
    codec.set_proc_hooks(
        Rc::new(|p: &Proc| {
            let body = p
                .downcast_ref::<String>()
                .ok_or(EncodeError::Unserializable("a foreign procedure"))?;
            Ok(body.as_bytes().to_vec())
        }),
        Rc::new(|bytes: &[u8]| {
            Ok(Proc::new(String::from_utf8_lossy(bytes).into_owned()))
        }),
    );

    let out = codec.serialize(&[p.clone(), p]).unwrap();
    let dec = codec.deserialize(&out).unwrap();
    match (&dec[0], &dec[1]) {
        (Value::Proc(a), Value::Proc(b)) => {
            assert!(Rc::ptr_eq(a, b));
            assert_eq!(a.downcast_ref::<String>().unwrap(), "return 42");
        }
        _ => panic!("expected procedures"),
    }

    // a hookless reader rejects the tag
    assert!(matches!(
        Codec::new().deserialize(&out),
        Err(DecodeError::BadTag { tag: 210, .. })
    ));
}

#[test]
fn decoder_callback_errors_surface() {
    let class = ClassHandle::named("picky");
    let mut codec = Codec::new();
    codec
        .register(
            class.clone(),
            "picky",
            TypeDef::new()
                .with_encode(|_| Ok(vec![]))
                .with_decode(|_| {
                    Err(DecodeError::Custom {
                        name: "picky".to_string(),
                        message: "always refuses".to_string(),
                    })
                }),
        )
        .unwrap();

    let out = codec
        .serialize(&[Value::from(Table::with_class(class))])
        .unwrap();
    assert!(matches!(
        codec.deserialize(&out),
        Err(DecodeError::Custom { name, .. }) if name == "picky"
    ));
}

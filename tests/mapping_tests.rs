//! End-to-end mapping tests
//!
//! Classes are declared in Rust, loaded from XML, modified and written back.

use pretty_assertions::assert_eq;
use std::sync::Arc;
use xmlacorn::values::{converter, serializer};
use xmlacorn::{
    Class, Content, Document, Element, EntryConfig, Error, OverridePolicy, SchemaErrorKind,
    Value, WriteOptions,
};

fn tag_class() -> Arc<Class> {
    let tag = Class::new("tag").unwrap();
    tag.define(&Content::new().with("name", EntryConfig::attr()))
        .unwrap();
    tag
}

fn item_class() -> Arc<Class> {
    let description = Class::new("description").unwrap();
    description
        .define(&Content::new().with("text", EntryConfig::text()))
        .unwrap();

    let item = Class::new("item").unwrap();
    item.define(
        &Content::new()
            .with("name", EntryConfig::attr())
            .with(
                "count",
                EntryConfig::attr()
                    .with_converter(converter("int").unwrap())
                    .with_default(0),
            )
            .with(
                "kind",
                EntryConfig::attr()
                    .with_options(["tool", "part"])
                    .with_default("part"),
            )
            .with("description", EntryConfig::child(description).optional())
            .with("tags", EntryConfig::children(tag_class())),
    )
    .unwrap();
    item
}

const ITEM_XML: &str = r#"<item name="wrench" count="3" kind="tool">
  <description>A 10mm wrench</description>
  <tag name="metal"/>
  <tag name="hand"/>
</item>"#;

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_item_with_tag_objects() {
    let item = Class::new("item").unwrap();
    item.define(
        &Content::new()
            .with("name", EntryConfig::attr())
            .with(
                "description",
                EntryConfig::child_text().with_tag("description"),
            )
            .with("tag_objects", EntryConfig::children(tag_class())),
    )
    .unwrap();

    let xml = r#"<item name="x"><description>hi</description><tag name="t1"/><tag name="t2"/></item>"#;
    let obj = item.from_xml_str(xml).unwrap();
    assert_eq!(obj.get_str("name"), Some("x"));
    assert_eq!(obj.get_str("description"), Some("hi"));
    let names: Vec<_> = obj
        .get_list("tag_objects")
        .unwrap()
        .iter()
        .map(|t| t.get_str("name").unwrap())
        .collect();
    assert_eq!(names, vec!["t1", "t2"]);

    let el = obj.to_element().unwrap();
    assert_eq!(el.attributes.len(), 1);
    assert_eq!(el.iter_find("description").count(), 1);
    assert_eq!(el.find("description").and_then(Element::text), Some("hi"));
    let tags: Vec<_> = el
        .iter_find("tag")
        .map(|t| t.get_attribute("name").unwrap())
        .collect();
    assert_eq!(tags, vec!["t1", "t2"]);
    assert_eq!(
        obj.to_xml_string(&WriteOptions::compact()).unwrap(),
        xml
    );
}

#[test]
fn test_load_item() {
    let item = item_class();
    let obj = item.from_xml_str(ITEM_XML).unwrap();

    assert_eq!(obj.tag(), "item");
    assert_eq!(obj.get_str("name"), Some("wrench"));
    assert_eq!(obj.get_int("count"), Some(3));
    assert_eq!(obj.get_str("kind"), Some("tool"));
    assert_eq!(
        obj.get_object("description").unwrap().get_str("text"),
        Some("A 10mm wrench")
    );

    let tags: Vec<_> = obj
        .get_list("tags")
        .unwrap()
        .iter()
        .map(|t| t.get_str("name").unwrap())
        .collect();
    assert_eq!(tags, vec!["metal", "hand"]);
}

#[test]
fn test_load_applies_defaults_without_conversion() {
    let item = item_class();
    let obj = item.from_xml_str(r#"<item name="bolt"/>"#).unwrap();

    assert_eq!(obj.get("count"), Some(&Value::Int(0)));
    assert_eq!(obj.get_str("kind"), Some("part"));
    assert!(!obj.contains("description"));
    assert_eq!(obj.get_list("tags").map(|t| t.len()), Some(0));
}

#[test]
fn test_load_missing_required_attribute() {
    let item = item_class();
    let err = item.from_xml_str("<item/>").unwrap_err();
    match err {
        Error::Schema(e) => {
            assert_eq!(e.kind, SchemaErrorKind::MissingRequiredValue);
            assert_eq!(e.attribute.as_deref(), Some("name"));
            assert_eq!(e.element.as_deref(), Some("item"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_load_rejects_value_outside_options() {
    let item = item_class();
    let err = item
        .from_xml_str(r#"<item name="x" kind="toy"/>"#)
        .unwrap_err();
    match err {
        Error::Schema(e) => {
            assert_eq!(e.kind, SchemaErrorKind::InvalidOption);
            assert_eq!(e.value.as_deref(), Some("toy"));
            assert_eq!(
                e.allowed,
                Some(vec!["tool".to_string(), "part".to_string()])
            );
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_conversion_error_passes_through() {
    let item = item_class();
    let err = item
        .from_xml_str(r#"<item name="x" count="many"/>"#)
        .unwrap_err();
    let Error::Conversion(inner) = err else {
        panic!("expected a conversion error");
    };
    assert!(inner.downcast_ref::<std::num::ParseIntError>().is_some());
}

#[test]
fn test_required_child_missing() {
    let nested = tag_class();
    let holder = Class::new("holder").unwrap();
    holder
        .define(&Content::new().with("tag", EntryConfig::child(nested)))
        .unwrap();

    let err = holder.from_xml_str("<holder/>").unwrap_err();
    assert!(err.is_schema(SchemaErrorKind::MissingRequiredChild));

    let obj = holder
        .from_xml_str(r#"<holder><tag name="a"/><tag name="b"/></holder>"#)
        .unwrap();
    assert_eq!(obj.get_object("tag").unwrap().get_str("name"), Some("a"));
}

#[test]
fn test_child_text_and_tag_override() {
    let entry = Class::new("entry").unwrap();
    entry
        .define(
            &Content::new()
                .with("title", EntryConfig::child_text())
                .with("body", EntryConfig::child_text().with_tag("content"))
                .with("note", EntryConfig::child_text().with_default("none")),
        )
        .unwrap();

    let obj = entry
        .from_xml_str("<entry><title>Hi</title><content></content></entry>")
        .unwrap();
    assert_eq!(obj.get_str("title"), Some("Hi"));
    assert_eq!(obj.get_str("body"), Some(""));
    assert_eq!(obj.get_str("note"), Some("none"));

    let el = obj.to_element().unwrap();
    assert_eq!(el.find("content").and_then(Element::text), Some(""));
    assert!(el.find("body").is_none());
    assert_eq!(el.find("note").and_then(Element::text), Some("none"));
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_construct_defaults_then_overrides() {
    let item = item_class();
    let obj = item
        .construct([("name", Value::from("nut")), ("count", Value::from(7))])
        .unwrap();

    assert_eq!(obj.get_str("name"), Some("nut"));
    assert_eq!(obj.get_int("count"), Some(7));
    assert_eq!(obj.get_str("kind"), Some("part"));
    assert!(!obj.contains("description"));
}

#[test]
fn test_construct_unknown_override_policy() {
    let lenient = item_class();
    let obj = lenient.construct([("colour", "red")]).unwrap();
    assert!(!obj.contains("colour"));

    let strict = Class::with_policy("strict", OverridePolicy::Reject).unwrap();
    strict
        .define(&Content::new().with("name", EntryConfig::attr()))
        .unwrap();
    let err = strict.construct([("colour", "red")]).unwrap_err();
    assert!(err.is_schema(SchemaErrorKind::UnknownAttribute));
}

#[test]
fn test_construct_default_child() {
    let inner = Class::new("inner").unwrap();
    inner
        .define(&Content::new().with("level", EntryConfig::attr().with_default(1)))
        .unwrap();
    let outer = Class::new("outer").unwrap();
    outer
        .define(&Content::new().with("inner", EntryConfig::child(inner).with_default_child()))
        .unwrap();

    let obj = outer.construct_default().unwrap();
    assert_eq!(obj.get_object("inner").unwrap().get_int("level"), Some(1));
    assert_eq!(
        obj.to_xml_string(&WriteOptions::compact()).unwrap(),
        r#"<outer><inner level="1"/></outer>"#
    );
}

#[test]
fn test_construct_does_not_check_options() {
    let item = item_class();
    let obj = item.construct([("name", "x"), ("kind", "toy")]).unwrap();
    assert_eq!(obj.get_str("kind"), Some("toy"));
}

// ============================================================================
// Saving
// ============================================================================

#[test]
fn test_round_trip() {
    let item = item_class();
    let obj = item.from_xml_str(ITEM_XML).unwrap();
    let xml = obj.to_xml_string(&WriteOptions::default()).unwrap();

    let expected = r#"<item name="wrench" count="3" kind="tool">
  <description>A 10mm wrench</description>
  <tag name="metal"/>
  <tag name="hand"/>
</item>
"#;
    assert_eq!(xml, expected);

    let again = item.from_xml_str(&xml).unwrap();
    assert_eq!(again, obj);
}

#[test]
fn test_save_after_modification() {
    let item = item_class();
    let mut obj = item.from_xml_str(ITEM_XML).unwrap();

    obj.set("count", 4);
    obj.get_mut("tags")
        .and_then(Value::as_list_mut)
        .unwrap()
        .push(tag_class().construct([("name", "new")]).unwrap());
    obj.unset("description");

    let el = obj.to_element().unwrap();
    assert_eq!(el.get_attribute("count"), Some("4"));
    assert!(el.find("description").is_none());
    assert_eq!(el.iter_find("tag").count(), 3);
}

#[test]
fn test_save_appends_under_parent() {
    let item = item_class();
    let obj = item.construct([("name", "x")]).unwrap();

    let mut parent = Element::new("inventory");
    parent.append(Element::new("header"));
    let el = obj.to_xml(&mut parent, &WriteOptions::default()).unwrap();

    assert_eq!(parent.children.len(), 2);
    assert_eq!(parent.children[1], el);

    // The returned element is a copy of the appended one.
    let mut el = el;
    el.set_attribute("name", "changed");
    assert_eq!(parent.children[1].get_attribute("name"), Some("x"));
}

#[test]
fn test_save_missing_value_fails_without_touching_parent() {
    let item = item_class();
    let mut obj = item.construct_default().unwrap();
    assert!(!obj.contains("name"));

    let mut parent = Element::new("inventory");
    let err = obj.to_xml(&mut parent, &WriteOptions::default()).unwrap_err();
    assert!(err.is_schema(SchemaErrorKind::MissingRequiredValue));
    assert!(parent.children.is_empty());

    obj.set("name", "fixed");
    obj.to_xml(&mut parent, &WriteOptions::default()).unwrap();
    assert_eq!(parent.children.len(), 1);
}

#[test]
fn test_save_wrong_shape() {
    let item = item_class();
    let mut obj = item.construct([("name", "x")]).unwrap();
    obj.set("tags", "not a list");
    let err = obj.to_element().unwrap_err();
    assert!(err.is_schema(SchemaErrorKind::InvalidValue));
}

#[test]
fn test_custom_serializer() {
    let flag = Class::new("flag").unwrap();
    flag.define(
        &Content::new().with(
            "state",
            EntryConfig::text()
                .with_converter(converter("bool").unwrap())
                .with_serializer(serializer("upper").unwrap()),
        ),
    )
    .unwrap();

    let obj = flag.from_xml_str("<flag>true</flag>").unwrap();
    assert_eq!(obj.get_bool("state"), Some(true));
    assert_eq!(
        obj.to_xml_string(&WriteOptions::compact()).unwrap(),
        "<flag>TRUE</flag>"
    );
}

#[test]
fn test_escaping_round_trip() {
    let note = Class::new("note").unwrap();
    note.define(
        &Content::new()
            .with("title", EntryConfig::attr())
            .with("body", EntryConfig::text()),
    )
    .unwrap();

    let obj = note
        .construct([("title", r#"a "quoted" <title>"#), ("body", "x < y & z")])
        .unwrap();
    let xml = obj.to_xml_string(&WriteOptions::compact()).unwrap();
    let back = note.from_xml_str(&xml).unwrap();
    assert_eq!(back.get_str("title"), Some(r#"a "quoted" <title>"#));
    assert_eq!(back.get_str("body"), Some("x < y & z"));
}

#[test]
fn test_blank_and_padded_text_round_trip() {
    let note = Class::new("note").unwrap();
    note.define(
        &Content::new()
            .with("body", EntryConfig::text())
            .with("title", EntryConfig::child_text()),
    )
    .unwrap();

    for body in ["", "   ", " padded "] {
        let obj = note
            .construct([("body", body), ("title", "  two  ")])
            .unwrap();
        for options in [WriteOptions::compact(), WriteOptions::default()] {
            let xml = obj.to_xml_string(&options).unwrap();
            let back = note.from_xml_str(&xml).unwrap();
            assert_eq!(back.get_str("body"), Some(body), "{xml}");
            assert_eq!(back.get_str("title"), Some("  two  "));
        }
    }
}

#[test]
fn test_text_stops_at_first_child() {
    let note = Class::new("note").unwrap();
    note.define(
        &Content::new()
            .with("body", EntryConfig::text())
            .with("b", EntryConfig::child_text()),
    )
    .unwrap();

    let obj = note.from_xml_str("<note>head<b/>tail</note>").unwrap();
    assert_eq!(obj.get_str("body"), Some("head"));
    assert_eq!(obj.get_str("b"), Some(""));
}

// ============================================================================
// Recursion
// ============================================================================

#[test]
fn test_self_recursive_class() {
    let node = Class::new("node").unwrap();
    node.define(
        &Content::new()
            .with("id", EntryConfig::attr())
            .with("children", EntryConfig::children(Arc::clone(&node))),
    )
    .unwrap();

    let xml = r#"<node id="root"><node id="a"><node id="a1"/></node><node id="b"/></node>"#;
    let obj = node.from_xml_str(xml).unwrap();

    let kids = obj.get_list("children").unwrap();
    assert_eq!(kids.len(), 2);
    assert_eq!(kids[0].get_list("children").unwrap()[0].get_str("id"), Some("a1"));
    assert_eq!(
        obj.to_xml_string(&WriteOptions::compact()).unwrap(),
        xml
    );
}

// ============================================================================
// Files
// ============================================================================

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("item.xml");
    let output = dir.path().join("out.xml");
    std::fs::write(&input, ITEM_XML).unwrap();

    let item = item_class();
    let obj = item.from_xml(input.as_path()).unwrap();
    let written = obj
        .to_xml(output.as_path(), &WriteOptions::default())
        .unwrap();

    let reread = Document::from_file(&output).unwrap().into_root().unwrap();
    assert_eq!(reread, written);
    assert_eq!(item.from_xml(output).unwrap(), obj);
}

#[test]
fn test_missing_file() {
    let item = item_class();
    let dir = tempfile::tempdir().unwrap();
    let err = item.from_xml(dir.path().join("nope.xml")).unwrap_err();
    assert!(matches!(err, Error::Resource(_) | Error::Io(_)));
}

//! Property tests: whatever an object holds, saving then loading gives it back

use proptest::prelude::*;
use std::sync::Arc;
use xmlacorn::values::converter;
use xmlacorn::{Class, Content, EntryConfig, Object, Value, WriteOptions};

fn classes() -> (Arc<Class>, Arc<Class>) {
    let tag = Class::new("tag").unwrap();
    tag.define(&Content::new().with("name", EntryConfig::attr()))
        .unwrap();

    let item = Class::new("item").unwrap();
    item.define(
        &Content::new()
            .with("name", EntryConfig::attr())
            .with(
                "count",
                EntryConfig::attr().with_converter(converter("int").unwrap()),
            )
            .with(
                "active",
                EntryConfig::attr().with_converter(converter("bool").unwrap()),
            )
            .with("body", EntryConfig::text())
            .with("note", EntryConfig::child_text())
            .with("tags", EntryConfig::children(Arc::clone(&tag))),
    )
    .unwrap();
    (item, tag)
}

// Any printable text, including empty and blank values. Line breaks are left
// out: whitespace with a line break directly before a child is indentation.
fn text_value() -> impl Strategy<Value = String> {
    "[ -~]{0,16}"
}

fn attr_value() -> impl Strategy<Value = String> {
    "[ -~]{0,16}"
}

proptest! {
    #[test]
    fn save_then_load_is_identity(
        name in attr_value(),
        count in any::<i64>(),
        active in any::<bool>(),
        body in text_value(),
        note in text_value(),
        tags in prop::collection::vec(attr_value(), 0..4),
    ) {
        let (item, tag) = classes();
        let mut obj = item
            .construct([
                ("name", Value::from(name)),
                ("count", Value::from(count)),
                ("active", Value::from(active)),
                ("body", Value::from(body)),
                ("note", Value::from(note)),
            ])
            .unwrap();
        let children = tags
            .iter()
            .map(|t| tag.construct([("name", t.as_str())]))
            .collect::<xmlacorn::Result<Vec<Object>>>()
            .unwrap();
        obj.set("tags", children);

        for options in [WriteOptions::compact(), WriteOptions::default()] {
            let xml = obj.to_xml_string(&options).unwrap();
            let loaded = item.from_xml_str(&xml).unwrap();
            prop_assert_eq!(&loaded, &obj);
        }
    }

    #[test]
    fn out_of_options_values_are_rejected(value in "[a-z]{1,8}") {
        let class = Class::new("pick").unwrap();
        class
            .define(&Content::new().with(
                "choice",
                EntryConfig::attr().with_options(["red", "green", "blue"]),
            ))
            .unwrap();

        let xml = format!(r#"<pick choice="{}"/>"#, value);
        let result = class.from_xml_str(&xml);
        if ["red", "green", "blue"].contains(&value.as_str()) {
            let obj = result.unwrap();
            prop_assert_eq!(obj.get_str("choice"), Some(value.as_str()));
        } else {
            prop_assert!(result.is_err());
        }
    }
}

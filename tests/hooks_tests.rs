//! Load/save hook tests

use std::sync::{Arc, Mutex};
use xmlacorn::hooks::hook;
use xmlacorn::{Class, Content, EntryConfig, Hook, HookEvent, HookTarget, WriteOptions};

type Log = Arc<Mutex<Vec<String>>>;

fn recorder(log: &Log) -> Hook {
    let log = Arc::clone(log);
    hook(move |event, class, target| {
        let what = match target {
            HookTarget::Object(obj) => format!("object:{}", obj.get_str("name").unwrap_or("?")),
            HookTarget::Element(el) => format!("element:{}", el.tag()),
        };
        log.lock()
            .unwrap()
            .push(format!("{} {} {}", event, class.tag(), what));
    })
}

fn classes() -> (Arc<Class>, Arc<Class>) {
    let part = Class::new("part").unwrap();
    part.define(&Content::new().with("name", EntryConfig::attr()))
        .unwrap();
    let machine = Class::new("machine").unwrap();
    machine
        .define(
            &Content::new()
                .with("name", EntryConfig::attr())
                .with("parts", EntryConfig::children(Arc::clone(&part))),
        )
        .unwrap();
    (machine, part)
}

#[test]
fn test_hooks_fire_per_class_in_order() {
    let (machine, part) = classes();
    let log: Log = Arc::default();
    let h = recorder(&log);

    part.add_hook(HookEvent::FromXml, h.clone());
    machine.add_hook(HookEvent::FromXml, h.clone());
    machine.add_hook(HookEvent::ToXml, h);

    let obj = machine
        .from_xml_str(r#"<machine name="m"><part name="p1"/><part name="p2"/></machine>"#)
        .unwrap();
    obj.to_xml_string(&WriteOptions::compact()).unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "fromxml part object:p1",
            "fromxml part object:p2",
            "fromxml machine object:m",
            "toxml machine element:machine",
        ]
    );
}

#[test]
fn test_hooks_do_not_leak_between_classes() {
    let (machine, part) = classes();
    let log: Log = Arc::default();
    part.add_hook(HookEvent::ToXml, recorder(&log));

    let obj = machine.construct([("name", "m")]).unwrap();
    obj.to_element().unwrap();
    assert!(log.lock().unwrap().is_empty());

    assert_eq!(machine.hooks().len(HookEvent::ToXml), 0);
    assert_eq!(part.hooks().len(HookEvent::ToXml), 1);
}

#[test]
fn test_duplicate_and_removed_hooks() {
    let (_, part) = classes();
    let log: Log = Arc::default();
    let h = recorder(&log);

    assert!(part.add_hook(HookEvent::FromXml, h.clone()));
    assert!(!part.add_hook(HookEvent::FromXml, h.clone()));
    part.from_xml_str(r#"<part name="a"/>"#).unwrap();
    assert_eq!(log.lock().unwrap().len(), 1);

    assert!(part.remove_hook(HookEvent::FromXml, &h));
    assert!(!part.remove_hook(HookEvent::FromXml, &h));
    part.from_xml_str(r#"<part name="b"/>"#).unwrap();
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[test]
fn test_hooks_not_fired_on_failure() {
    let (_, part) = classes();
    let log: Log = Arc::default();
    part.add_hook(HookEvent::FromXml, recorder(&log));
    part.add_hook(HookEvent::ToXml, recorder(&log));

    assert!(part.from_xml_str("<part/>").is_err());
    assert!(part.construct_default().unwrap().to_element().is_err());
    assert!(log.lock().unwrap().is_empty());
}

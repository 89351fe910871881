#![forbid(unsafe_code)]
#![cfg(feature = "input-parser")]

//! JSON-encoded host inputs drive the host the same way typed events do.

use core::time::Duration;

use navspy_core::SectionList;
use navspy_runtime::SpyConfig;
use navspy_web::input_parser::{parse_encoded_input, parse_encoded_inputs};
use navspy_web::{LayoutSnapshot, WebNavHost};

fn host() -> WebNavHost {
    WebNavHost::new(
        SectionList::new(["projects", "experience", "about", "contact"]),
        SpyConfig::default(),
        LayoutSnapshot::new(),
    )
}

#[test]
fn encoded_session_matches_expectations() {
    let mut host = host();
    let inputs = r#"[
        {"kind":"intersection","entries":[
            {"id":"projects","isIntersecting":true,"intersectionRatio":0.25},
            {"id":"experience","isIntersecting":true,"intersectionRatio":0.75}
        ],"scrollTop":900,"viewportHeight":800,"documentHeight":5000},
        {"kind":"resize","width":1024,"height":768}
    ]"#;
    for event in parse_encoded_inputs(inputs).unwrap() {
        host.push_event(event);
    }
    let result = host.step().unwrap();
    assert_eq!(result.events_processed, 2);
    assert_eq!(host.active_section().as_str(), "experience");
    assert_eq!(host.engine().viewport(), Some((1024.0, 768.0)));
}

#[test]
fn encoded_navigation_locks_until_scrollend_settles() {
    let mut host = host();
    host.push_event(parse_encoded_input(r#"{"kind":"navigate","section":"about"}"#).unwrap());
    host.step().unwrap();
    assert_eq!(host.active_section().as_str(), "about");

    host.set_time(Duration::from_millis(200));
    host.push_event(
        parse_encoded_input(
            r#"{"kind":"intersection","entries":[{"id":"projects","isIntersecting":true,"intersectionRatio":1}]}"#,
        )
        .unwrap(),
    );
    host.push_event(parse_encoded_input(r#"{"kind":"scrollend"}"#).unwrap());
    host.step().unwrap();
    assert_eq!(host.active_section().as_str(), "about");

    host.set_time(Duration::from_millis(300));
    host.push_event(parse_encoded_input(r#"{"kind":"tick"}"#).unwrap());
    let result = host.step().unwrap();
    assert!(result.lock_released);
    assert_eq!(host.active_section().as_str(), "about");
}

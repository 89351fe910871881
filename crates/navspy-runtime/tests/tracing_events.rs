#![forbid(unsafe_code)]

//! Structured log events emitted by the runtime.

use core::time::Duration;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use navspy_core::{HostEvent, IntersectionEntry, Rect, ScrollMetrics, SectionId, SectionList};
use navspy_runtime::{NavHighlighter, NavLayout, SpyConfig};
use tracing_subscriber::layer::SubscriberExt;

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    target: String,
    fields: HashMap<String, String>,
}

struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCapture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            fields: visitor.0.into_iter().collect(),
        });
    }
}

fn capture(f: impl FnOnce()) -> Vec<CapturedEvent> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let layer = EventCapture {
        events: Arc::clone(&events),
    };
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    let out = events.lock().unwrap().clone();
    out
}

struct NoLayout;

impl NavLayout for NoLayout {
    fn container_rect(&self) -> Option<Rect> {
        None
    }

    fn link_rect(&self, _section: &SectionId) -> Option<Rect> {
        None
    }
}

fn message(event: &CapturedEvent) -> &str {
    event.fields.get("message").map(String::as_str).unwrap_or("")
}

#[test]
fn active_change_is_logged_with_cause() {
    let events = capture(|| {
        let mut nav = NavHighlighter::new(
            SectionList::new(["projects", "about"]),
            SpyConfig::default(),
            NoLayout,
            |_| true,
            Duration::ZERO,
        );
        nav.dispatch(
            HostEvent::Intersection {
                entries: vec![IntersectionEntry::visible("about", 0.8)],
                scroll: Some(ScrollMetrics::new(0.0, 800.0, 4000.0)),
            },
            Duration::from_millis(5),
        );
    });

    let change = events
        .iter()
        .find(|e| e.target == "navspy.tracker" && message(e) == "active section changed")
        .expect("expected an active-section debug event");
    assert_eq!(change.level, tracing::Level::DEBUG);
    assert_eq!(change.fields.get("cause").map(String::as_str), Some("ratio"));
    assert_eq!(change.fields.get("active").map(String::as_str), Some("about"));
}

#[test]
fn lock_lifecycle_is_logged() {
    let events = capture(|| {
        let mut nav = NavHighlighter::new(
            SectionList::new(["projects", "contact"]),
            SpyConfig::default(),
            NoLayout,
            |_| true,
            Duration::ZERO,
        );
        nav.set_active_section("contact", Duration::ZERO);
        nav.advance(Duration::from_millis(1000));
    });

    let lock_messages: Vec<&str> = events
        .iter()
        .filter(|e| e.target == "navspy.lock")
        .map(message)
        .collect();
    assert!(lock_messages.contains(&"navigation lock engaged"));
    assert!(lock_messages.contains(&"navigation lock released"));
}

#[test]
fn missing_elements_are_logged() {
    let events = capture(|| {
        let _nav = NavHighlighter::new(
            SectionList::new(["projects", "about"]),
            SpyConfig::default(),
            NoLayout,
            |id| id.as_str() == "projects",
            Duration::ZERO,
        );
    });

    assert!(events.iter().any(|e| {
        e.target == "navspy.tracker"
            && message(e) == "section element missing, not observed"
            && e.fields.get("section").map(String::as_str) == Some("about")
    }));
}

#[test]
fn refresh_is_logged_as_refresh_not_resize() {
    let events = capture(|| {
        let mut nav = NavHighlighter::new(
            SectionList::new(["projects", "about"]),
            SpyConfig::default(),
            NoLayout,
            |_| true,
            Duration::ZERO,
        );
        nav.refresh_underline();
    });

    let causes: Vec<&str> = events
        .iter()
        .filter(|e| e.target == "navspy.underline" && message(e) == "underline recomputed")
        .filter_map(|e| e.fields.get("cause").map(String::as_str))
        .collect();
    assert_eq!(causes, vec!["Initial", "Refresh"]);
}

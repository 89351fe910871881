#![forbid(unsafe_code)]

//! The facade exposes a complete workflow without reaching into member crates.

use std::time::Duration;

use navspy::prelude::*;
use pretty_assertions::assert_eq;

struct StaticNav;

impl NavLayout for StaticNav {
    fn container_rect(&self) -> Option<Rect> {
        Some(Rect::new(20.0, 0.0, 640.0, 48.0))
    }

    fn link_rect(&self, section: &SectionId) -> Option<Rect> {
        let left = match section.as_str() {
            "projects" => 40.0,
            "experience" => 160.0,
            "about" => 300.0,
            "contact" => 400.0,
            _ => return None,
        };
        Some(Rect::new(left, 12.0, 80.0, 24.0))
    }
}

fn sections() -> SectionList {
    SectionList::new(["projects", "experience", "about", "contact"])
}

#[test]
fn highlighter_with_custom_layout() {
    let mut nav = NavHighlighter::new(
        sections(),
        SpyConfig::default(),
        StaticNav,
        |_| true,
        Duration::ZERO,
    );
    assert_eq!(
        nav.underline(),
        Some(UnderlinePosition {
            left: 20.0,
            width: 80.0
        })
    );
    nav.dispatch(
        HostEvent::Intersection {
            entries: vec![
                IntersectionEntry::visible("experience", 0.5),
                IntersectionEntry::visible("about", 0.25),
            ],
            scroll: Some(ScrollMetrics::new(1400.0, 800.0, 6000.0)),
        },
        Duration::from_millis(10),
    );
    assert_eq!(nav.active_section().as_str(), "experience");
    assert_eq!(nav.underline().map(|u| u.left), Some(140.0));
}

#[cfg(feature = "web")]
#[test]
fn recorded_session_replays_through_facade() -> navspy::Result<()> {
    let mut rec = navspy::SessionRecorder::new(sections(), true, SpyConfig::default());
    rec.push_event(0, HostEvent::navigate("about"));
    rec.step()?;
    rec.set_time(1_000_000_000);
    rec.step()?;
    let trace = rec.finish();
    let result = navspy::replay(&trace)?;
    assert!(result.ok());
    Ok(())
}

#[cfg(feature = "web")]
#[test]
fn torn_down_host_surfaces_as_facade_error() {
    let mut host = WebNavHost::new(sections(), SpyConfig::default(), LayoutSnapshot::new());
    host.teardown();
    let err: navspy::Error = host.step().unwrap_err().into();
    assert_eq!(err.to_string(), "host already torn down");
}

#[cfg(feature = "config")]
#[test]
fn config_file_drives_engine() -> navspy::Result<()> {
    let dir = tempfile::tempdir().map_err(|e| navspy::Error::Config(navspy::ConfigError::Io(e)))?;
    let path = dir.path().join("navspy.toml");
    std::fs::write(&path, "lock_ceiling_ms = 400\n")
        .map_err(|e| navspy::Error::Config(navspy::ConfigError::Io(e)))?;
    let config = SpyConfig::from_toml_file(&path)?;

    let mut nav = NavHighlighter::new(sections(), config, StaticNav, |_| true, Duration::ZERO);
    nav.set_active_section("contact", Duration::ZERO);
    nav.advance(Duration::from_millis(400));
    assert!(!nav.is_locked());
    Ok(())
}

#![forbid(unsafe_code)]

//! Live DOM measurements for the nav bar (`wasm32` only).

use navspy_core::{Rect, SectionId};
use navspy_runtime::NavLayout;
use web_sys::{Document, Element};

use crate::runner_core::link_selector;

fn document() -> Option<Document> {
    web_sys::window()?.document()
}

fn element_rect(element: &Element) -> Rect {
    let r = element.get_bounding_client_rect();
    Rect::new(r.x(), r.y(), r.width(), r.height())
}

/// Whether the page renders an element with `id == section`.
pub fn section_present(section: &SectionId) -> bool {
    document()
        .and_then(|doc| doc.get_element_by_id(section.as_str()))
        .is_some()
}

/// Viewport-relative top of the section element, if rendered.
pub fn section_top(section: &str) -> Option<f64> {
    let element = document()?.get_element_by_id(section)?;
    Some(element.get_bounding_client_rect().top())
}

/// Reads the nav container and its `[data-section]` links on demand.
#[derive(Debug, Clone)]
pub struct DomLayout {
    container_selector: String,
}

impl DomLayout {
    pub fn new(container_selector: impl Into<String>) -> Self {
        Self {
            container_selector: container_selector.into(),
        }
    }

    fn container(&self) -> Option<Element> {
        document()?
            .query_selector(&self.container_selector)
            .ok()
            .flatten()
    }
}

impl NavLayout for DomLayout {
    fn container_rect(&self) -> Option<Rect> {
        self.container().as_ref().map(element_rect)
    }

    fn link_rect(&self, section: &SectionId) -> Option<Rect> {
        let container = self.container()?;
        let link = container
            .query_selector(&link_selector(section.as_str()))
            .ok()
            .flatten()?;
        Some(element_rect(&link))
    }
}

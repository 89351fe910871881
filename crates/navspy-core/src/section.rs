#![forbid(unsafe_code)]

//! Section identifiers and the ordered section list.
//!
//! A [`SectionId`] names a region of the page and must match the `id`
//! attribute of a document element and the `data-section` attribute of its
//! nav link. The order of a [`SectionList`] is meaningful: the first entry is
//! the default active section and the last entry is forced active when the
//! viewport reaches the end of the document.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Opaque identifier of a page section.
///
/// Cloning is cheap (shared `Arc<str>`). The empty id is valid and is the
/// active value of a tracker with no configured sections.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct SectionId(Arc<str>);

impl SectionId {
    /// Create a section id from any string-like value.
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// The empty id.
    #[must_use]
    pub fn empty() -> Self {
        Self(Arc::from(""))
    }

    /// Borrow the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the empty id.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for SectionId {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SectionId({:?})", &*self.0)
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SectionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SectionId {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl AsRef<str> for SectionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SectionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for SectionId {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for SectionId {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

/// Ordered, fixed list of sections for one page view.
///
/// Duplicate ids are dropped on construction (first occurrence wins) so that
/// positions are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct SectionList {
    ids: Vec<SectionId>,
}

impl SectionList {
    /// Build a list from ids in configured order.
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SectionId>,
    {
        let mut out: Vec<SectionId> = Vec::new();
        for id in ids {
            let id = id.into();
            if !out.contains(&id) {
                out.push(id);
            }
        }
        Self { ids: out }
    }

    /// An empty list. A tracker built from it is inert.
    #[must_use]
    pub const fn empty() -> Self {
        Self { ids: Vec::new() }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// First configured section (the default active section).
    #[must_use]
    pub fn first(&self) -> Option<&SectionId> {
        self.ids.first()
    }

    /// Last configured section (forced active at the end of the document).
    #[must_use]
    pub fn last(&self) -> Option<&SectionId> {
        self.ids.last()
    }

    /// Configured position of `id`, if present.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|s| s.as_str() == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SectionId> + '_ {
        self.ids.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[SectionId] {
        &self.ids
    }
}

impl<'a> IntoIterator for &'a SectionList {
    type Item = &'a SectionId;
    type IntoIter = std::slice::Iter<'a, SectionId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

impl<S: Into<SectionId>> FromIterator<S> for SectionList {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_id_compares_with_str() {
        let id = SectionId::new("projects");
        assert_eq!(id, "projects");
        assert_eq!(id.as_str(), "projects");
        assert_eq!(id.to_string(), "projects");
        assert!(!id.is_empty());
        assert!(SectionId::default().is_empty());
    }

    #[test]
    fn list_first_and_last_follow_configured_order() {
        let list = SectionList::new(["projects", "experience", "about", "contact"]);
        assert_eq!(list.first().map(SectionId::as_str), Some("projects"));
        assert_eq!(list.last().map(SectionId::as_str), Some("contact"));
        assert_eq!(list.position("about"), Some(2));
        assert_eq!(list.position("missing"), None);
    }

    #[test]
    fn list_drops_duplicates() {
        let list = SectionList::new(["a", "b", "a", "c", "b"]);
        let ids: Vec<&str> = list.iter().map(SectionId::as_str).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_list_has_no_endpoints() {
        let list = SectionList::empty();
        assert!(list.is_empty());
        assert!(list.first().is_none());
        assert!(list.last().is_none());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn section_list_serializes_as_array() {
        let list = SectionList::new(["about", "contact"]);
        let json = serde_json::to_string(&list).unwrap();
        assert_eq!(json, r#"["about","contact"]"#);
        let back: SectionList = serde_json::from_str(&json).unwrap();
        assert_eq!(back, list);
    }
}

//! In-memory model of the page the front end patches
//!
//! Elements are addressed by id; each one carries replaceable markup and a
//! set of CSS classes.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Page shared between the beacon loop and user actions
pub type SharedPage = Arc<RwLock<Page>>;

/// A single addressable element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    content: String,
    classes: BTreeSet<String>,
}

impl Element {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replace the element's markup entirely
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn add_class(&mut self, class: &str) {
        self.classes.insert(class.to_string());
    }

    pub fn remove_class(&mut self, class: &str) {
        self.classes.remove(class);
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }
}

#[derive(Debug, Default)]
pub struct Page {
    elements: HashMap<String, Element>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page holding empty elements with the given ids
    pub fn with_elements<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        let mut page = Self::new();
        for id in ids {
            page.insert(id);
        }
        page
    }

    pub fn into_shared(self) -> SharedPage {
        Arc::new(RwLock::new(self))
    }

    /// Add an empty element, keeping an existing one with the same id
    pub fn insert(&mut self, id: &str) -> &mut Element {
        self.elements.entry(id.to_string()).or_default()
    }

    pub fn remove(&mut self, id: &str) -> Option<Element> {
        self.elements.remove(id)
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn element_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.get_mut(id)
    }
}

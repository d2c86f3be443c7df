//! Document seam: elements addressed by id, read for values and written for text.

use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use shared::domain::ElementId;

/// Reference to an element that was present when the handles were resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef(ElementId);

impl ElementRef {
    pub fn id(&self) -> &ElementId {
        &self.0
    }
}

pub trait Document: Send + Sync {
    fn query(&self, id: &ElementId) -> Option<ElementRef>;
    fn value(&self, element: &ElementRef) -> String;
    fn set_text_content(&self, element: &ElementRef, text: &str);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ElementState {
    value: String,
    text_content: String,
}

/// In-memory document used by the shell binary and tests.
#[derive(Debug, Default)]
pub struct MemoryDocument {
    elements: Mutex<BTreeMap<ElementId, ElementState>>,
}

impl MemoryDocument {
    pub fn with_elements<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let elements = ids
            .into_iter()
            .map(|id| (ElementId::new(id), ElementState::default()))
            .collect();
        Self {
            elements: Mutex::new(elements),
        }
    }

    fn elements(&self) -> MutexGuard<'_, BTreeMap<ElementId, ElementState>> {
        self.elements.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert(&self, id: impl Into<String>) {
        self.elements().entry(ElementId::new(id)).or_default();
    }

    /// Types into an input element. Returns false when the element is absent.
    pub fn set_value(&self, id: &str, value: impl Into<String>) -> bool {
        match self.elements().get_mut(&ElementId::new(id)) {
            Some(element) => {
                element.value = value.into();
                true
            }
            None => false,
        }
    }

    pub fn text(&self, id: &str) -> Option<String> {
        self.elements()
            .get(&ElementId::new(id))
            .map(|element| element.text_content.clone())
    }
}

impl Document for MemoryDocument {
    fn query(&self, id: &ElementId) -> Option<ElementRef> {
        self.elements()
            .contains_key(id)
            .then(|| ElementRef(id.clone()))
    }

    fn value(&self, element: &ElementRef) -> String {
        self.elements()
            .get(element.id())
            .map(|element| element.value.clone())
            .unwrap_or_default()
    }

    fn set_text_content(&self, element: &ElementRef, text: &str) {
        if let Some(element) = self.elements().get_mut(element.id()) {
            element.text_content = text.to_string();
        }
    }
}

use serde::Deserialize;
use shared::domain::ElementId;

use crate::{
    document::{Document, ElementRef},
    error::BridgeError,
};

/// Ids of the elements the bridge reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ElementIds {
    pub name_input: String,
    pub greeting_output: String,
    pub farewell_output: String,
    pub plugin_list_output: String,
    pub plugin_name_input: String,
    pub plugin_install_output: String,
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            name_input: "greet-input".into(),
            greeting_output: "greet-msg".into(),
            farewell_output: "bye-msg".into(),
            plugin_list_output: "plugin-list-msg".into(),
            plugin_name_input: "plugin-input".into(),
            plugin_install_output: "plugin-msg".into(),
        }
    }
}

impl ElementIds {
    pub fn all(&self) -> [&str; 6] {
        [
            self.name_input.as_str(),
            self.greeting_output.as_str(),
            self.farewell_output.as_str(),
            self.plugin_list_output.as_str(),
            self.plugin_name_input.as_str(),
            self.plugin_install_output.as_str(),
        ]
    }
}

/// Element references resolved once the document is ready. Immutable afterwards.
#[derive(Debug, Clone)]
pub struct BridgeHandles {
    pub name_input: ElementRef,
    pub greeting_output: ElementRef,
    pub farewell_output: ElementRef,
    pub plugin_list_output: ElementRef,
    pub plugin_name_input: ElementRef,
    pub plugin_install_output: ElementRef,
}

impl BridgeHandles {
    pub fn resolve(document: &dyn Document, ids: &ElementIds) -> Result<Self, BridgeError> {
        let find = |id: &str| {
            let id = ElementId::new(id);
            document
                .query(&id)
                .ok_or(BridgeError::MissingElement(id))
        };

        Ok(Self {
            name_input: find(&ids.name_input)?,
            greeting_output: find(&ids.greeting_output)?,
            farewell_output: find(&ids.farewell_output)?,
            plugin_list_output: find(&ids.plugin_list_output)?,
            plugin_name_input: find(&ids.plugin_name_input)?,
            plugin_install_output: find(&ids.plugin_install_output)?,
        })
    }
}

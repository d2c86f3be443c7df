use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const GREET: &str = "greet";
pub const SAY_BYE: &str = "say_bye";
pub const GET_ACTIVE_PLUGINS: &str = "get_active_plugins";
pub const INSTALL_PLUGIN: &str = "install_plugin";

pub type CommandArgs = BTreeMap<String, String>;

/// A named command plus its string arguments, built fresh for every submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: String,
    #[serde(default)]
    pub args: CommandArgs,
}

impl CommandRequest {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: CommandArgs::new(),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    pub fn greet(name: impl Into<String>) -> Self {
        Self::new(GREET).with_arg("name", name)
    }

    pub fn say_bye(input: impl Into<String>) -> Self {
        Self::new(SAY_BYE).with_arg("input", input)
    }

    pub fn get_active_plugins() -> Self {
        Self::new(GET_ACTIVE_PLUGINS)
    }

    pub fn install_plugin(name: impl Into<String>) -> Self {
        Self::new(INSTALL_PLUGIN).with_arg("name", name)
    }

    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandResult {
    Text(String),
    List(Vec<String>),
    Unit,
}

impl CommandResult {
    /// Text written into an output node: lists are joined one entry per line.
    pub fn to_display_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::List(items) => items.join("\n"),
            Self::Unit => String::new(),
        }
    }
}

impl From<String> for CommandResult {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for CommandResult {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<()> for CommandResult {
    fn from(_: ()) -> Self {
        Self::Unit
    }
}

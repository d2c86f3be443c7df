//! Command bridge between a document-style UI and named backend commands.
//!
//! A submit handler cancels the default navigation, reads its input elements,
//! issues a command through a [`CommandInvoker`] and writes the outcome into
//! an output element. Failures are rendered into the same element.

pub mod bridge;
pub mod document;
pub mod error;
pub mod handles;
pub mod invoker;

pub use bridge::{CommandBridge, Form, SubmitEvent, INSTALL_SUCCESS_MESSAGE};
pub use document::{Document, ElementRef, MemoryDocument};
pub use error::{BridgeError, ErrorCategory, InvokeError};
pub use handles::{BridgeHandles, ElementIds};
pub use invoker::{CommandInvoker, LocalInvoker};

#[cfg(test)]
#[path = "tests/bridge_tests.rs"]
mod tests;

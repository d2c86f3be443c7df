//! Form submissions to command invocations, results to output nodes.

use std::{
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use futures::future::{BoxFuture, FutureExt};
use shared::protocol::CommandRequest;
use tracing::{debug, warn};

use crate::{
    document::{Document, ElementRef},
    handles::BridgeHandles,
    invoker::CommandInvoker,
};

pub const INSTALL_SUCCESS_MESSAGE: &str = "New plugin installed successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
    Greet,
    ListPlugins,
    InstallPlugin,
}

/// A form submission. Handlers always cancel the default navigation.
#[derive(Debug, Default)]
pub struct SubmitEvent {
    default_prevented: bool,
}

impl SubmitEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

pub struct CommandBridge<I, D> {
    invoker: I,
    document: Arc<D>,
    handles: BridgeHandles,
    install_generation: AtomicU64,
}

impl<I, D> CommandBridge<I, D>
where
    I: CommandInvoker,
    D: Document,
{
    pub fn new(invoker: I, document: Arc<D>, handles: BridgeHandles) -> Self {
        Self {
            invoker,
            document,
            handles,
            install_generation: AtomicU64::new(0),
        }
    }

    pub fn document(&self) -> &Arc<D> {
        &self.document
    }

    /// Routes a submission to its handler. Anything that must happen at
    /// submission time has happened once this returns; the future carries
    /// the pending invocations.
    pub fn handle_submit(&self, form: Form, event: &mut SubmitEvent) -> BoxFuture<'_, ()> {
        match form {
            Form::Greet => self.on_greet_submit(event).boxed(),
            Form::ListPlugins => self.on_list_plugins_submit(event).boxed(),
            Form::InstallPlugin => self.on_install_submit(event).boxed(),
        }
    }

    /// Issues `say_bye` then `greet` for the same name. Neither waits for the
    /// other, and each renders into its own node as soon as it resolves.
    pub fn on_greet_submit(&self, event: &mut SubmitEvent) -> impl Future<Output = ()> + '_ {
        event.prevent_default();
        let name = self.document.value(&self.handles.name_input);

        let farewell = self.run(
            CommandRequest::say_bye(name.clone()),
            &self.handles.farewell_output,
        );
        let greeting = self.run(CommandRequest::greet(name), &self.handles.greeting_output);
        async move {
            futures::join!(farewell, greeting);
        }
    }

    pub fn on_list_plugins_submit(
        &self,
        event: &mut SubmitEvent,
    ) -> impl Future<Output = ()> + '_ {
        event.prevent_default();
        self.run(
            CommandRequest::get_active_plugins(),
            &self.handles.plugin_list_output,
        )
    }

    /// Writes the success notice before the install is even issued; the
    /// returned value is discarded and only a rejection replaces the notice.
    /// A rejection that arrives after a newer install submission leaves the
    /// newer notice alone.
    pub fn on_install_submit(&self, event: &mut SubmitEvent) -> impl Future<Output = ()> + '_ {
        event.prevent_default();
        let name = self.document.value(&self.handles.plugin_name_input);
        let output = &self.handles.plugin_install_output;
        let generation = self.install_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.document.set_text_content(output, INSTALL_SUCCESS_MESSAGE);

        async move {
            let request = CommandRequest::install_plugin(name);
            let command = request.command.clone();
            debug!(command = %command, "issuing command");
            if let Err(err) = self.invoker.invoke(request).await {
                warn!(command = %command, category = ?err.category(), "command failed: {err}");
                if self.install_generation.load(Ordering::SeqCst) == generation {
                    self.document.set_text_content(output, &err.display_text());
                } else {
                    debug!(command = %command, "newer install submitted, keeping its notice");
                }
            }
        }
    }

    async fn run(&self, request: CommandRequest, output: &ElementRef) {
        let command = request.command.clone();
        debug!(command = %command, "issuing command");
        let text = match self.invoker.invoke(request).await {
            Ok(result) => result.to_display_text(),
            Err(err) => {
                warn!(command = %command, category = ?err.category(), "command failed: {err}");
                err.display_text()
            }
        };
        self.document.set_text_content(output, &text);
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use command_api::ApiContext;
use shared::protocol::{CommandRequest, CommandResult};

use crate::error::InvokeError;

/// The remote command capability: sends a named request and eventually
/// yields its result or a failure.
#[async_trait]
pub trait CommandInvoker: Send + Sync {
    async fn invoke(&self, request: CommandRequest) -> Result<CommandResult, InvokeError>;
}

#[async_trait]
impl<T: CommandInvoker + ?Sized> CommandInvoker for Arc<T> {
    async fn invoke(&self, request: CommandRequest) -> Result<CommandResult, InvokeError> {
        (**self).invoke(request).await
    }
}

/// Answers commands from the in-process command handlers.
#[derive(Clone)]
pub struct LocalInvoker {
    ctx: ApiContext,
}

impl LocalInvoker {
    pub fn new(ctx: ApiContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl CommandInvoker for LocalInvoker {
    async fn invoke(&self, request: CommandRequest) -> Result<CommandResult, InvokeError> {
        command_api::dispatch(&self.ctx, &request)
            .await
            .map_err(InvokeError::from)
    }
}

use std::sync::Arc;

use plugin_host::{PluginError, PluginManager};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{
        CommandRequest, CommandResult, GET_ACTIVE_PLUGINS, GREET, INSTALL_PLUGIN, SAY_BYE,
    },
};
use tokio::sync::RwLock;

pub const DEFAULT_APP_NAME: &str = "Rust";

#[derive(Clone)]
pub struct ApiContext {
    pub plugins: Arc<RwLock<PluginManager>>,
    pub app_name: String,
}

impl ApiContext {
    pub fn new(plugins: PluginManager, app_name: impl Into<String>) -> Self {
        Self {
            plugins: Arc::new(RwLock::new(plugins)),
            app_name: app_name.into(),
        }
    }
}

impl Default for ApiContext {
    fn default() -> Self {
        Self::new(PluginManager::default(), DEFAULT_APP_NAME)
    }
}

pub async fn greet(ctx: &ApiContext, name: &str) -> String {
    format!("Hello, {name}! You've been greeted from {}!", ctx.app_name)
}

pub async fn say_bye(input: &str) -> String {
    if input.to_lowercase().contains("hello") {
        "Bye!".to_string()
    } else {
        String::new()
    }
}

pub async fn get_active_plugins(ctx: &ApiContext) -> Vec<String> {
    ctx.plugins.read().await.list_plugins()
}

pub async fn install_plugin(ctx: &ApiContext, name: &str) -> Result<(), ApiError> {
    let plugin_id = ctx
        .plugins
        .write()
        .await
        .install(name)
        .map_err(plugin_error)?;
    tracing::debug!(plugin_id = %plugin_id, name, "install_plugin handled");
    Ok(())
}

/// Routes a request to its handler by command name.
pub async fn dispatch(
    ctx: &ApiContext,
    request: &CommandRequest,
) -> Result<CommandResult, ApiError> {
    match request.command.as_str() {
        GREET => {
            let name = required_arg(request, "name")?;
            Ok(greet(ctx, name).await.into())
        }
        SAY_BYE => {
            let input = required_arg(request, "input")?;
            Ok(say_bye(input).await.into())
        }
        GET_ACTIVE_PLUGINS => Ok(get_active_plugins(ctx).await.into()),
        INSTALL_PLUGIN => {
            let name = required_arg(request, "name")?;
            install_plugin(ctx, name).await?;
            Ok(CommandResult::Unit)
        }
        other => Err(ApiError::not_found(format!("unknown command '{other}'"))),
    }
}

fn required_arg<'a>(request: &'a CommandRequest, key: &str) -> Result<&'a str, ApiError> {
    request.arg(key).ok_or_else(|| {
        ApiError::validation(format!(
            "missing argument '{key}' for command '{}'",
            request.command
        ))
    })
}

fn plugin_error(err: PluginError) -> ApiError {
    let code = match &err {
        PluginError::AlreadyInstalled(_) => ErrorCode::Conflict,
        PluginError::NotFound(_) => ErrorCode::NotFound,
        PluginError::Manifest(_) => ErrorCode::Validation,
        PluginError::Permission(_) => ErrorCode::Forbidden,
    };
    ApiError::new(code, err.to_string())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

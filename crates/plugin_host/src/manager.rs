use std::path::Path;

use chrono::{DateTime, Utc};
use shared::domain::{PluginId, PluginState, PluginSummary};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    manifest::{ManifestError, PluginManifest},
    permission::{CheckContext, CheckResult, Permission, PermissionChecker, PermissionError},
};

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("plugin '{0}' is already installed")]
    AlreadyInstalled(String),
    #[error("plugin {0} not found")]
    NotFound(PluginId),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Permission(#[from] PermissionError),
}

#[derive(Debug, Clone)]
pub struct PluginInstance {
    pub manifest: PluginManifest,
    pub state: PluginState,
    pub installed_at: DateTime<Utc>,
}

impl PluginInstance {
    fn summary(&self) -> PluginSummary {
        PluginSummary {
            plugin_id: self.manifest.id(),
            name: self.manifest.name().to_string(),
            version: self.manifest.version().to_string(),
            state: self.state.clone(),
        }
    }
}

/// Installed plugins in install order, plus the policies governing them.
#[derive(Debug)]
pub struct PluginManager {
    permission_checker: PermissionChecker,
    plugins: Vec<PluginInstance>,
}

impl PluginManager {
    pub fn new(permission_checker: PermissionChecker) -> Self {
        Self {
            permission_checker,
            plugins: Vec::new(),
        }
    }

    pub fn permission_checker(&self) -> &PermissionChecker {
        &self.permission_checker
    }

    /// Installs a bare plugin known only by name.
    pub fn install(&mut self, name: &str) -> Result<PluginId, PluginError> {
        self.register(PluginManifest::new(name.trim()))
    }

    pub fn load_plugin(&mut self, manifest_path: &Path) -> Result<PluginId, PluginError> {
        let manifest = PluginManifest::from_toml_file(manifest_path)?;
        self.register(manifest)
    }

    pub fn register(&mut self, manifest: PluginManifest) -> Result<PluginId, PluginError> {
        manifest.validate()?;
        if self.find_by_name(manifest.name()).is_some() {
            return Err(PluginError::AlreadyInstalled(manifest.name().to_string()));
        }

        let plugin_id = manifest.id();
        self.permission_checker
            .register_plugin(plugin_id, manifest.permissions());
        info!(plugin_id = %plugin_id, name = manifest.name(), "plugin installed");

        self.plugins.push(PluginInstance {
            manifest,
            state: PluginState::Active,
            installed_at: Utc::now(),
        });
        Ok(plugin_id)
    }

    pub fn unload_plugin(&mut self, plugin_id: PluginId) -> Result<PluginManifest, PluginError> {
        let pos = self
            .plugins
            .iter()
            .position(|p| p.manifest.id() == plugin_id)
            .ok_or(PluginError::NotFound(plugin_id))?;
        let instance = self.plugins.remove(pos);
        self.permission_checker.unregister_plugin(plugin_id);
        info!(plugin_id = %plugin_id, name = instance.manifest.name(), "plugin unloaded");
        Ok(instance.manifest)
    }

    /// Names of active plugins, in install order.
    pub fn list_plugins(&self) -> Vec<String> {
        self.plugins
            .iter()
            .filter(|p| p.state.is_active())
            .map(|p| p.manifest.name().to_string())
            .collect()
    }

    pub fn summaries(&self) -> Vec<PluginSummary> {
        self.plugins.iter().map(PluginInstance::summary).collect()
    }

    pub fn get(&self, plugin_id: PluginId) -> Option<&PluginInstance> {
        self.plugins.iter().find(|p| p.manifest.id() == plugin_id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&PluginInstance> {
        self.plugins.iter().find(|p| p.manifest.name() == name)
    }

    pub fn set_state(&mut self, plugin_id: PluginId, state: PluginState) -> Result<(), PluginError> {
        let instance = self
            .plugins
            .iter_mut()
            .find(|p| p.manifest.id() == plugin_id)
            .ok_or(PluginError::NotFound(plugin_id))?;
        if let PluginState::Error(reason) = &state {
            warn!(plugin_id = %plugin_id, reason = reason.as_str(), "plugin moved to error state");
        }
        instance.state = state;
        Ok(())
    }

    pub fn record_decision(
        &mut self,
        plugin_id: PluginId,
        permission: &Permission,
        decision: bool,
    ) -> Result<(), PluginError> {
        if self.get(plugin_id).is_none() {
            return Err(PluginError::NotFound(plugin_id));
        }
        self.permission_checker
            .update_user_decision(plugin_id, permission, decision)?;
        Ok(())
    }

    pub fn check_permission(
        &self,
        plugin_id: PluginId,
        permission: &Permission,
        context: Option<&CheckContext>,
    ) -> CheckResult {
        match self.get(plugin_id) {
            Some(instance) if !instance.state.is_active() => {
                CheckResult::Denied("Plugin is not active".to_string())
            }
            _ => self.permission_checker.check(plugin_id, permission, context),
        }
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new(PermissionChecker::new(Default::default()))
    }
}

#[cfg(test)]
#[path = "tests/manager_tests.rs"]
mod tests;

//! Permission declarations, per-plugin policies, and the checker that grants or denies them.

use std::{
    collections::HashMap,
    hash::{Hash, Hasher},
    path::PathBuf,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::domain::PluginId;
use thiserror::Error;
use tracing::{info, warn};

const MIN_BATTERY_FOR_POWER_MANAGEMENT: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileAccessLevel {
    ReadOnly,
    ReadWrite,
    Execute,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkAccessLevel {
    LocalOnly,
    SpecificDomains,
    FullInternet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemControl {
    ProcessManagement,
    WindowControl,
    PowerManagement,
    HardwareInfo,
    ClipboardAccess,
    NotificationSend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
    NotDecided,
    SystemDenied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityLevel {
    Low,
    #[default]
    Medium,
    High,
    Paranoid,
}

impl std::str::FromStr for SecurityLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "paranoid" => Ok(Self::Paranoid),
            other => Err(format!("unknown security level '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckResult {
    Granted,
    Denied(String),
}

impl CheckResult {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// A capability a plugin declares. `System` and `Custom` are identified by
/// their control/id alone; `params` never takes part in equality or hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Permission {
    FileSystem {
        path: PathBuf,
        access_level: FileAccessLevel,
    },
    Network {
        access_level: NetworkAccessLevel,
        #[serde(default)]
        domains: Vec<String>,
    },
    System {
        control: SystemControl,
        #[serde(default)]
        params: Value,
    },
    Audio {
        microphone_access: bool,
        speaker_access: bool,
    },
    Video {
        camera_access: bool,
        screen_recording_access: bool,
    },
    Custom {
        id: String,
        #[serde(default)]
        params: Value,
    },
}

impl PartialEq for Permission {
    fn eq(&self, other: &Self) -> bool {
        use Permission::*;
        match (self, other) {
            (
                FileSystem { path, access_level },
                FileSystem {
                    path: other_path,
                    access_level: other_level,
                },
            ) => path == other_path && access_level == other_level,
            (
                Network {
                    access_level,
                    domains,
                },
                Network {
                    access_level: other_level,
                    domains: other_domains,
                },
            ) => access_level == other_level && domains == other_domains,
            (System { control, .. }, System { control: other, .. }) => control == other,
            (
                Audio {
                    microphone_access,
                    speaker_access,
                },
                Audio {
                    microphone_access: other_mic,
                    speaker_access: other_speaker,
                },
            ) => microphone_access == other_mic && speaker_access == other_speaker,
            (
                Video {
                    camera_access,
                    screen_recording_access,
                },
                Video {
                    camera_access: other_camera,
                    screen_recording_access: other_screen,
                },
            ) => camera_access == other_camera && screen_recording_access == other_screen,
            (Custom { id, .. }, Custom { id: other, .. }) => id == other,
            _ => false,
        }
    }
}

impl Eq for Permission {}

impl Hash for Permission {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Permission::FileSystem { path, access_level } => {
                path.hash(state);
                access_level.hash(state);
            }
            Permission::Network {
                access_level,
                domains,
            } => {
                access_level.hash(state);
                domains.hash(state);
            }
            Permission::System { control, .. } => control.hash(state),
            Permission::Audio {
                microphone_access,
                speaker_access,
            } => {
                microphone_access.hash(state);
                speaker_access.hash(state);
            }
            Permission::Video {
                camera_access,
                screen_recording_access,
            } => {
                camera_access.hash(state);
                screen_recording_access.hash(state);
            }
            Permission::Custom { id, .. } => id.hash(state),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PermissionError {
    #[error("Plugin {0} not found")]
    UnknownPlugin(PluginId),
    #[error("Plugin did not declare this permission")]
    UndeclaredPermission,
}

#[derive(Debug, Clone)]
struct PluginPolicy {
    permissions: HashMap<Permission, PermissionStatus>,
}

impl PluginPolicy {
    fn new() -> Self {
        Self {
            permissions: HashMap::new(),
        }
    }

    fn allowed(&self, permission: &Permission) -> bool {
        matches!(
            self.permissions.get(permission),
            Some(PermissionStatus::Granted)
        )
    }

    fn update_status(&mut self, permission: Permission, status: PermissionStatus) {
        self.permissions.insert(permission, status);
    }

    fn status(&self, permission: &Permission) -> Option<PermissionStatus> {
        self.permissions.get(permission).copied()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SystemConstraints {
    pub denied_paths: Vec<String>,
    pub denied_domains: Vec<String>,
    pub security_level: SecurityLevel,
}

impl SystemConstraints {
    pub fn new(security_level: SecurityLevel) -> Self {
        Self {
            security_level,
            ..Self::default()
        }
    }

    fn path_denied(&self, path: &std::path::Path) -> bool {
        let path = path.to_string_lossy();
        self.denied_paths
            .iter()
            .any(|denied| path.contains(denied.as_str()))
    }

    fn domain_denied(&self, domain: &str) -> bool {
        self.denied_domains
            .iter()
            .any(|denied| domain.contains(denied.as_str()))
    }
}

/// Host conditions a permission is evaluated against at check time.
#[derive(Debug, Clone)]
pub struct CheckContext {
    pub is_screen_locked: bool,
    pub battery_level: Option<u8>,
    pub network_available: bool,
}

impl Default for CheckContext {
    fn default() -> Self {
        Self {
            is_screen_locked: false,
            battery_level: Some(100),
            network_available: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PermissionChecker {
    plugin_policies: HashMap<PluginId, PluginPolicy>,
    system_constraints: SystemConstraints,
}

impl PermissionChecker {
    pub fn new(security_level: SecurityLevel) -> Self {
        Self::with_constraints(SystemConstraints::new(security_level))
    }

    pub fn with_constraints(system_constraints: SystemConstraints) -> Self {
        Self {
            plugin_policies: HashMap::new(),
            system_constraints,
        }
    }

    pub fn add_denied_path(&mut self, path: impl Into<String>) {
        self.system_constraints.denied_paths.push(path.into());
    }

    pub fn add_denied_domain(&mut self, domain: impl Into<String>) {
        self.system_constraints.denied_domains.push(domain.into());
    }

    pub fn is_registered(&self, plugin_id: PluginId) -> bool {
        self.plugin_policies.contains_key(&plugin_id)
    }

    /// Records a policy for the plugin. Dangerous permissions wait for a user
    /// decision; the rest are granted up front.
    pub fn register_plugin(&mut self, plugin_id: PluginId, permissions: &[Permission]) {
        let mut policy = PluginPolicy::new();
        for permission in permissions {
            let status = if self.is_dangerous_permission(permission) {
                PermissionStatus::NotDecided
            } else {
                PermissionStatus::Granted
            };
            policy.update_status(permission.clone(), status);
        }

        self.plugin_policies.insert(plugin_id, policy);
        info!(plugin_id = %plugin_id, declared = permissions.len(), "plugin registered");
    }

    pub fn unregister_plugin(&mut self, plugin_id: PluginId) -> bool {
        self.plugin_policies.remove(&plugin_id).is_some()
    }

    fn is_dangerous_permission(&self, permission: &Permission) -> bool {
        if self.system_constraints.security_level == SecurityLevel::Paranoid {
            return true;
        }
        match permission {
            Permission::FileSystem { path, .. } => self.system_constraints.path_denied(path),
            Permission::Network { access_level, .. } => {
                matches!(access_level, NetworkAccessLevel::FullInternet)
            }
            Permission::System { control, .. } => {
                matches!(control, SystemControl::PowerManagement)
            }
            _ => false,
        }
    }

    pub fn check(
        &self,
        plugin_id: PluginId,
        permission: &Permission,
        context: Option<&CheckContext>,
    ) -> CheckResult {
        let Some(policy) = self.plugin_policies.get(&plugin_id) else {
            warn!(plugin_id = %plugin_id, "permission check for unknown plugin");
            return CheckResult::Denied("Plugin not found".to_string());
        };

        if !policy.allowed(permission) {
            warn!(plugin_id = %plugin_id, ?permission, "permission denied by policy");
            return CheckResult::Denied("Permission denied by policy".to_string());
        }

        if !self.passes_system_constraints(permission) {
            warn!(plugin_id = %plugin_id, ?permission, "permission denied by system");
            return CheckResult::Denied("Permission denied by system".to_string());
        }

        if let Some(ctx) = context {
            if let Err(reason) = check_context(permission, ctx) {
                warn!(plugin_id = %plugin_id, ?permission, reason, "permission denied by context");
                return CheckResult::Denied("Permission denied by context".to_string());
            }
        }

        CheckResult::Granted
    }

    fn passes_system_constraints(&self, permission: &Permission) -> bool {
        match permission {
            Permission::FileSystem { path, .. } => !self.system_constraints.path_denied(path),
            Permission::Network { domains, .. } => domains
                .iter()
                .all(|domain| !self.system_constraints.domain_denied(domain)),
            _ => true,
        }
    }

    /// Current status of a declared permission; nothing prompts the user here.
    pub fn request_user_approval(
        &self,
        plugin_id: PluginId,
        permission: &Permission,
    ) -> Result<PermissionStatus, PermissionError> {
        let policy = self
            .plugin_policies
            .get(&plugin_id)
            .ok_or(PermissionError::UnknownPlugin(plugin_id))?;
        policy
            .status(permission)
            .ok_or(PermissionError::UndeclaredPermission)
    }

    pub fn update_user_decision(
        &mut self,
        plugin_id: PluginId,
        permission: &Permission,
        decision: bool,
    ) -> Result<(), PermissionError> {
        let policy = self
            .plugin_policies
            .get_mut(&plugin_id)
            .ok_or(PermissionError::UnknownPlugin(plugin_id))?;

        if policy.status(permission).is_none() {
            return Err(PermissionError::UndeclaredPermission);
        }

        let (status, label) = if decision {
            (PermissionStatus::Granted, "granted")
        } else {
            (PermissionStatus::Denied, "denied")
        };
        policy.update_status(permission.clone(), status);
        info!(
            plugin_id = %plugin_id,
            ?permission,
            decision = label,
            "user permission decision recorded"
        );
        Ok(())
    }

    pub fn pending_requests(&self) -> Vec<(PluginId, Permission)> {
        self.plugin_policies
            .iter()
            .flat_map(|(plugin_id, policy)| {
                policy
                    .permissions
                    .iter()
                    .filter(|(_, status)| **status == PermissionStatus::NotDecided)
                    .map(move |(permission, _)| (*plugin_id, permission.clone()))
            })
            .collect()
    }
}

fn check_context(permission: &Permission, context: &CheckContext) -> Result<(), &'static str> {
    match permission {
        Permission::FileSystem { path, .. } if !path.exists() => Err("File does not exist"),
        Permission::Network { .. } if !context.network_available => Err("Network is unavailable"),
        Permission::System {
            control: SystemControl::PowerManagement,
            ..
        } => match context.battery_level {
            Some(level) if level < MIN_BATTERY_FOR_POWER_MANAGEMENT => {
                Err("Battery too low (<10%)")
            }
            _ => Ok(()),
        },
        Permission::System {
            control: SystemControl::ClipboardAccess,
            ..
        } if context.is_screen_locked => Err("Cannot access clipboard when screen is locked"),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[path = "tests/permission_tests.rs"]
mod tests;

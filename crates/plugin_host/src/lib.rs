//! Plugin host: manifests, permission policies, and the registry of installed plugins.

pub mod manager;
pub mod manifest;
pub mod permission;

pub use manager::{PluginError, PluginInstance, PluginManager};
pub use manifest::{ManifestError, PluginManifest};
pub use permission::{
    CheckContext, CheckResult, Permission, PermissionChecker, PermissionError, PermissionStatus,
    SecurityLevel, SystemConstraints,
};

//! Plugin manifests: identity, metadata, entry point and declared permissions.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use shared::domain::PluginId;
use thiserror::Error;

use crate::permission::Permission;

pub const DEFAULT_VERSION: &str = "1.0.0";
pub const DEFAULT_API_VERSION: &str = "1.0";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Entry point file does not exist: {}", .0.display())]
    EntryPointMissing(PathBuf),
    #[error("Permission already exists")]
    DuplicatePermission,
    #[error("Plugin name cannot be empty")]
    EmptyName,
    #[error("Plugin version cannot be empty")]
    EmptyVersion,
    #[error("API version cannot be empty")]
    EmptyApiVersion,
    #[error("Version must contain at least one number")]
    VersionWithoutDigit,
    #[error("failed to read manifest '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse manifest '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone)]
pub struct PluginManifest {
    id: PluginId,
    name: String,
    version: String,
    author: String,
    description: String,
    entry_point: PathBuf,
    api_version: String,
    permissions: Vec<Permission>,
}

/// On-disk shape of `plugin.toml`.
#[derive(Debug, Deserialize)]
struct ManifestFile {
    name: String,
    version: Option<String>,
    #[serde(default)]
    author: String,
    #[serde(default)]
    description: String,
    entry_point: PathBuf,
    api_version: Option<String>,
    #[serde(default)]
    permissions: Vec<Permission>,
}

impl PluginManifest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PluginId::new_v4(),
            name: name.into(),
            version: DEFAULT_VERSION.to_string(),
            author: String::new(),
            description: String::new(),
            entry_point: PathBuf::new(),
            api_version: DEFAULT_API_VERSION.to_string(),
            permissions: Vec::new(),
        }
    }

    /// Reads a TOML manifest. A relative `entry_point` is resolved against the
    /// manifest's own directory and must exist.
    pub fn from_toml_file(path: &Path) -> Result<Self, ManifestError> {
        let raw = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ManifestFile = toml::from_str(&raw).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let mut manifest = Self::new(file.name);
        if let Some(version) = file.version {
            manifest.version = version;
        }
        if let Some(api_version) = file.api_version {
            manifest.set_api_version(api_version);
        }
        manifest.set_author(file.author);
        manifest.set_description(file.description);

        let entry_point = if file.entry_point.is_relative() {
            path.parent()
                .map(|dir| dir.join(&file.entry_point))
                .unwrap_or(file.entry_point)
        } else {
            file.entry_point
        };
        manifest.set_entry_point(entry_point)?;

        for permission in file.permissions {
            manifest.add_permission(permission)?;
        }

        Ok(manifest)
    }

    pub fn set_author(&mut self, author: impl Into<String>) {
        self.author = author.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn set_entry_point(&mut self, path: PathBuf) -> Result<(), ManifestError> {
        if !path.exists() {
            return Err(ManifestError::EntryPointMissing(path));
        }
        self.entry_point = path;
        Ok(())
    }

    pub fn set_api_version(&mut self, api_version: impl Into<String>) {
        self.api_version = api_version.into();
    }

    pub fn id(&self) -> PluginId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn entry_point(&self) -> &Path {
        &self.entry_point
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    pub fn add_permission(&mut self, permission: Permission) -> Result<(), ManifestError> {
        if self.permissions.contains(&permission) {
            return Err(ManifestError::DuplicatePermission);
        }
        self.permissions.push(permission);
        Ok(())
    }

    pub fn has_permission(&self, permission: &Permission) -> bool {
        self.permissions.contains(permission)
    }

    pub fn remove_permission(&mut self, permission: &Permission) -> bool {
        match self.permissions.iter().position(|p| p == permission) {
            Some(pos) => {
                self.permissions.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.name.trim().is_empty() {
            return Err(ManifestError::EmptyName);
        }
        if self.version.trim().is_empty() {
            return Err(ManifestError::EmptyVersion);
        }
        if self.api_version.trim().is_empty() {
            return Err(ManifestError::EmptyApiVersion);
        }
        if !self.version.chars().any(|c| c.is_ascii_digit()) {
            return Err(ManifestError::VersionWithoutDigit);
        }
        Ok(())
    }

    pub fn display_info(&self) -> String {
        format!(
            "{} v{} (ID: {})\nAuthor: {}\nDescription: {}\nPermissions: {}",
            self.name,
            self.version,
            self.id,
            self.author,
            self.description,
            self.permissions.len()
        )
    }
}

#[cfg(test)]
#[path = "tests/manifest_tests.rs"]
mod tests;

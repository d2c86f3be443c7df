use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use bridge_core::ElementIds;
use command_api::DEFAULT_APP_NAME;
use plugin_host::{PermissionChecker, SecurityLevel, SystemConstraints};
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "shell.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellSettings {
    pub app_name: String,
    pub security_level: SecurityLevel,
    pub denied_paths: Vec<String>,
    pub denied_domains: Vec<String>,
    pub plugin_dir: Option<PathBuf>,
    pub elements: ElementIds,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.into(),
            security_level: SecurityLevel::Medium,
            denied_paths: Vec::new(),
            denied_domains: Vec::new(),
            plugin_dir: None,
            elements: ElementIds::default(),
        }
    }
}

impl ShellSettings {
    pub fn permission_checker(&self) -> PermissionChecker {
        PermissionChecker::with_constraints(SystemConstraints {
            denied_paths: self.denied_paths.clone(),
            denied_domains: self.denied_domains.clone(),
            security_level: self.security_level,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    app_name: Option<String>,
    security_level: Option<SecurityLevel>,
    denied_paths: Option<Vec<String>>,
    denied_domains: Option<Vec<String>>,
    plugin_dir: Option<PathBuf>,
    elements: Option<ElementIds>,
}

/// Defaults, then the config file when present, then `APP__*` variables.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<ShellSettings> {
    let path = config_path.unwrap_or(Path::new(DEFAULT_CONFIG_PATH));
    let required = config_path.is_some();
    load_settings_with(path, required, |key| std::env::var(key).ok())
}

pub fn load_settings_with(
    path: &Path,
    required: bool,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<ShellSettings> {
    let mut settings = ShellSettings::default();

    match fs::read_to_string(path) {
        Ok(raw) => {
            let file_cfg: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
            apply_file(&mut settings, file_cfg);
        }
        Err(err) if required => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()));
        }
        Err(_) => {}
    }

    if let Some(v) = env("APP__APP_NAME") {
        settings.app_name = v;
    }
    if let Some(v) = env("APP__SECURITY_LEVEL") {
        match v.parse::<SecurityLevel>() {
            Ok(level) => settings.security_level = level,
            Err(err) => tracing::warn!("ignoring APP__SECURITY_LEVEL: {err}"),
        }
    }
    if let Some(v) = env("APP__DENIED_PATHS") {
        settings.denied_paths = split_list(&v);
    }
    if let Some(v) = env("APP__DENIED_DOMAINS") {
        settings.denied_domains = split_list(&v);
    }
    if let Some(v) = env("APP__PLUGIN_DIR") {
        settings.plugin_dir = (!v.trim().is_empty()).then(|| PathBuf::from(v));
    }

    Ok(settings)
}

fn apply_file(settings: &mut ShellSettings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.app_name {
        settings.app_name = v;
    }
    if let Some(v) = file_cfg.security_level {
        settings.security_level = v;
    }
    if let Some(v) = file_cfg.denied_paths {
        settings.denied_paths = v;
    }
    if let Some(v) = file_cfg.denied_domains {
        settings.denied_domains = v;
    }
    if let Some(v) = file_cfg.plugin_dir {
        settings.plugin_dir = Some(v);
    }
    if let Some(v) = file_cfg.elements {
        settings.elements = v;
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

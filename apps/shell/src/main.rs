use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use bridge_core::{BridgeHandles, CommandBridge, Form, LocalInvoker, MemoryDocument, SubmitEvent};
use clap::{Parser, Subcommand};
use command_api::ApiContext;
use plugin_host::PluginManager;
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, ShellSettings};

#[derive(Parser, Debug)]
struct Args {
    /// Settings file; `shell.toml` in the working directory is used when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Plugins to install before the form is submitted.
    #[arg(long = "preinstall")]
    preinstall: Vec<String>,
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Submit the greeting form.
    Greet {
        #[arg(long)]
        name: String,
    },
    /// Submit the active-plugin listing form.
    Plugins,
    /// Submit the plugin install form, then list active plugins.
    Install {
        #[arg(long)]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok()))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    let settings = load_settings(args.config.as_deref())?;

    let mut plugins = PluginManager::new(settings.permission_checker());
    if let Some(dir) = &settings.plugin_dir {
        load_plugin_dir(&mut plugins, dir)?;
    }
    for name in &args.preinstall {
        plugins
            .install(name)
            .with_context(|| format!("failed to preinstall plugin '{name}'"))?;
    }

    let bridge = build_bridge(&settings, plugins)?;
    let document = bridge.document().clone();
    let ids = &settings.elements;

    match args.action {
        Action::Greet { name } => {
            document.set_value(&ids.name_input, name);
            bridge.handle_submit(Form::Greet, &mut SubmitEvent::new()).await;
            print_node(&document, &ids.greeting_output);
            print_node(&document, &ids.farewell_output);
        }
        Action::Plugins => {
            bridge
                .handle_submit(Form::ListPlugins, &mut SubmitEvent::new())
                .await;
            print_node(&document, &ids.plugin_list_output);
        }
        Action::Install { name } => {
            document.set_value(&ids.plugin_name_input, name);
            bridge
                .handle_submit(Form::InstallPlugin, &mut SubmitEvent::new())
                .await;
            print_node(&document, &ids.plugin_install_output);
            bridge
                .handle_submit(Form::ListPlugins, &mut SubmitEvent::new())
                .await;
            print_node(&document, &ids.plugin_list_output);
        }
    }

    Ok(())
}

/// `RUST_LOG` when set and valid, `info` otherwise.
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn build_bridge(
    settings: &ShellSettings,
    plugins: PluginManager,
) -> Result<CommandBridge<LocalInvoker, MemoryDocument>> {
    let ctx = ApiContext::new(plugins, settings.app_name.clone());
    let document = Arc::new(MemoryDocument::with_elements(settings.elements.all()));
    let handles = BridgeHandles::resolve(&*document, &settings.elements)
        .context("document is missing a bridge element")?;
    Ok(CommandBridge::new(LocalInvoker::new(ctx), document, handles))
}

/// Loads every `<dir>/*/plugin.toml`. A plugin that fails to load is skipped.
fn load_plugin_dir(plugins: &mut PluginManager, dir: &Path) -> Result<()> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read plugin directory '{}'", dir.display()))?;

    let mut manifests: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path().join("plugin.toml"))
        .filter(|path| path.is_file())
        .collect();
    manifests.sort();

    for manifest in manifests {
        if let Err(err) = plugins.load_plugin(&manifest) {
            tracing::warn!("skipping plugin at '{}': {err}", manifest.display());
        }
    }
    Ok(())
}

fn print_node(document: &MemoryDocument, id: &str) {
    let text = document.text(id).unwrap_or_default();
    println!("#{id}:");
    for line in text.lines() {
        println!("  {line}");
    }
}

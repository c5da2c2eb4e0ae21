use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use intersection_core::config::{Config, WarnLevel};
use intersection_core::paths;
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Write a default .intersection/config.yaml
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show,

    /// Set a single key, e.g. `timing.tick_millis 500`
    Set {
        /// One of service.base_url, service.timeout_secs, timing.tick_millis,
        /// timing.notification_secs, server.port
        key: String,
        value: String,
    },

    /// Validate the config for common mistakes
    Validate,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Init { force } => init(root, force),
        ConfigSubcommand::Show => show(root, json),
        ConfigSubcommand::Set { key, value } => set(root, &key, &value),
        ConfigSubcommand::Validate => validate(root, json),
    }
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

fn init(root: &Path, force: bool) -> anyhow::Result<()> {
    let path = paths::config_path(root);
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    Config::default()
        .save(root)
        .context("failed to write config")?;
    println!("Wrote {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    if json {
        return print_json(&config);
    }
    let rows = vec![
        vec!["service.base_url".into(), config.service.base_url.clone()],
        vec![
            "service.timeout_secs".into(),
            config.service.timeout_secs.to_string(),
        ],
        vec![
            "timing.tick_millis".into(),
            config.timing.tick_millis.to_string(),
        ],
        vec![
            "timing.notification_secs".into(),
            config.timing.notification_secs.to_string(),
        ],
        vec!["server.port".into(), config.server.port.to_string()],
    ];
    print_table(&["KEY", "VALUE"], rows);
    Ok(())
}

// ---------------------------------------------------------------------------
// set
// ---------------------------------------------------------------------------

fn set(root: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let mut config = Config::load(root).context("failed to load config")?;
    let invalid = || format!("invalid value '{value}' for {key}");
    match key {
        "service.base_url" => config.service.base_url = value.to_string(),
        "service.timeout_secs" => {
            config.service.timeout_secs = value.parse().with_context(invalid)?
        }
        "timing.tick_millis" => config.timing.tick_millis = value.parse().with_context(invalid)?,
        "timing.notification_secs" => {
            config.timing.notification_secs = value.parse().with_context(invalid)?
        }
        "server.port" => config.server.port = value.parse().with_context(invalid)?,
        other => anyhow::bail!("unknown config key '{other}'"),
    }
    config.save(root).context("failed to write config")?;
    println!("Set {key} = {value}");
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}

//! Flat `key: value` settings file.
//!
//! A missing file is created with the defaults so users have something to
//! edit. Blank lines and lines starting with `#` are ignored.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};

use crate::processor::{CodecPolicy, OutOfRange};

pub const DEFAULT_CONFIG_FILE: &str = "mapconv.cfg";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub original_maps_dir: PathBuf,
    pub editable_maps_dir: PathBuf,
    pub final_maps_dir: PathBuf,
    pub policy: CodecPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            original_maps_dir: PathBuf::from("./s1_original_maps"),
            editable_maps_dir: PathBuf::from("./s2_editable_maps"),
            final_maps_dir: PathBuf::from("./s3_final_maps"),
            policy: CodecPolicy::default(),
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        other => bail!("`{key}` must be true or false, found `{other}`"),
    }
}

impl Settings {
    pub fn parse(text: &str) -> Result<Settings> {
        let mut settings = Settings::default();
        for (n, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                tracing::warn!(line = n + 1, "config line is not `key: value`, ignoring it");
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            match key {
                "original_maps_dir" => settings.original_maps_dir = value.into(),
                "editable_maps_dir" => settings.editable_maps_dir = value.into(),
                "final_maps_dir" => settings.final_maps_dir = value.into(),
                "out_of_range_tiles" => {
                    settings.policy.out_of_range = match value {
                        "warn" => OutOfRange::Warn,
                        "fatal" => OutOfRange::Fatal,
                        other => bail!("`out_of_range_tiles` must be warn or fatal, found `{other}`"),
                    }
                }
                "strict_properties" => settings.policy.strict_properties = parse_bool(key, value)?,
                other => tracing::warn!(line = n + 1, key = other, "unknown config key, ignoring it"),
            }
        }
        Ok(settings)
    }

    pub fn render(&self) -> String {
        let out_of_range = match self.policy.out_of_range {
            OutOfRange::Warn => "warn",
            OutOfRange::Fatal => "fatal",
        };
        format!(
            "# map converter settings\n\
             original_maps_dir: {}\n\
             editable_maps_dir: {}\n\
             final_maps_dir: {}\n\
             # warn | fatal\n\
             out_of_range_tiles: {out_of_range}\n\
             strict_properties: {}\n",
            self.original_maps_dir.display(),
            self.editable_maps_dir.display(),
            self.final_maps_dir.display(),
            self.policy.strict_properties,
        )
    }

    /// Load `path`, writing the defaults there first if it does not exist.
    pub fn load_or_create(path: &Path) -> Result<Settings> {
        if !path.exists() {
            let settings = Settings::default();
            fs::write(path, settings.render())
                .with_context(|| format!("Creating default config {}", path.display()))?;
            tracing::info!(path = %path.display(), "created default config");
            return Ok(settings);
        }
        let text = fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
        Settings::parse(&text).with_context(|| format!("Parsing {}", path.display()))
    }
}

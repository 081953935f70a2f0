//! Directory-level driving: find the files, check nothing will be lost,
//! convert them one by one.
//!
//! A fatal error aborts only the file it occurred in; the batch moves on
//! and the failure shows up in the exit status.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;
use std::process::ExitCode;

use crate::config::Settings;
use crate::error::{ConvertError, Result as ConvertResult};
use crate::parser::{self, MapFile};
use crate::processor::{self, diagnostics::Diagnostics, diagnostics::Warning};
use crate::writer;

pub const MAP_EXT: &str = "map";
pub const JSON_EXT: &str = "json";

#[derive(Debug)]
pub struct FileOutcome {
    pub name: String,
    pub warnings: Vec<Warning>,
    pub error: Option<ConvertError>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub files: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn failed(&self) -> usize {
        self.files.iter().filter(|f| f.error.is_some()).count()
    }

    pub fn warnings(&self) -> usize {
        self.files.iter().map(|f| f.warnings.len()).sum()
    }

    /// 0 clean, 1 finished with warnings, 2 some file failed.
    pub fn status(&self) -> u8 {
        if self.failed() > 0 {
            2
        } else if self.warnings() > 0 {
            1
        } else {
            0
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.status())
    }
}

/// Stems of every `*.ext` file in `dir`, sorted.
pub fn list_names(dir: &Path, ext: &str) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir).with_context(|| format!("Listing {}", dir.display()))?;
    let mut names = Vec::new();
    for entry in entries {
        let path = entry.with_context(|| format!("Listing {}", dir.display()))?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(ext) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            names.push(stem.to_string());
        }
    }
    names.sort();
    Ok(names)
}

fn file_path(dir: &Path, name: &str, ext: &str) -> std::path::PathBuf {
    dir.join(format!("{name}.{ext}"))
}

/// One binary map → one editable document.
pub fn convert_map_to_json(settings: &Settings, name: &str, diag: &mut Diagnostics) -> ConvertResult<()> {
    let source = file_path(&settings.original_maps_dir, name, MAP_EXT);
    let target = file_path(&settings.editable_maps_dir, name, JSON_EXT);
    tracing::info!("Converting original map file -> json : {name}");

    let map = MapFile::open(&source)?;
    let doc = processor::map_to_document(&map, diag);
    writer::json::emit(&doc, &target)
}

/// One editable document, applied on top of its original map, → one final map.
pub fn convert_json_to_map(settings: &Settings, name: &str, diag: &mut Diagnostics) -> ConvertResult<()> {
    let base = file_path(&settings.original_maps_dir, name, MAP_EXT);
    let source = file_path(&settings.editable_maps_dir, name, JSON_EXT);
    let target = file_path(&settings.final_maps_dir, name, MAP_EXT);
    tracing::info!("Converting json -> final map file : {name}");

    let json = fs::read_to_string(&source).map_err(|e| ConvertError::io(&source, e))?;
    let doc = parser::load_from_json(&json)?;
    let map = MapFile::open(&base)?;
    let map = processor::document_to_map(&doc, map, settings.policy, diag)?;
    writer::bin::emit(&map, &target)
}

fn run_each(
    names: &[String],
    mut convert: impl FnMut(&str, &mut Diagnostics) -> ConvertResult<()>,
) -> BatchReport {
    let mut report = BatchReport::default();
    for name in names {
        let span = tracing::info_span!("file", name = %name);
        let _enter = span.enter();

        let mut diag = Diagnostics::new();
        let error = convert(name, &mut diag).err();
        if let Some(err) = &error {
            tracing::error!("{err}");
        }
        report.files.push(FileOutcome { name: name.clone(), warnings: diag.into_warnings(), error });
    }
    report
}

pub fn map_to_json(settings: &Settings, names: Option<Vec<String>>, force: bool) -> Result<BatchReport> {
    let names = match names {
        Some(names) => names,
        None => list_names(&settings.original_maps_dir, MAP_EXT)?,
    };

    let existing: Vec<&String> = names
        .iter()
        .filter(|n| file_path(&settings.editable_maps_dir, n, JSON_EXT).is_file())
        .collect();
    for name in &existing {
        tracing::warn!("The file {} already exists.", file_path(&settings.editable_maps_dir, name, JSON_EXT).display());
    }
    if !existing.is_empty() && !force {
        bail!(
            "There are editable .json files that would be overwritten! Delete them first or pass --force; \
             they may contain unsaved work."
        );
    }

    fs::create_dir_all(&settings.editable_maps_dir)
        .with_context(|| format!("Creating {}", settings.editable_maps_dir.display()))?;

    Ok(run_each(&names, |name, diag| convert_map_to_json(settings, name, diag)))
}

pub fn json_to_map(settings: &Settings, names: Option<Vec<String>>) -> Result<BatchReport> {
    let names = match names {
        Some(names) => names,
        None => list_names(&settings.editable_maps_dir, JSON_EXT)?,
    };

    let missing: Vec<&String> = names
        .iter()
        .filter(|n| !file_path(&settings.original_maps_dir, n, MAP_EXT).is_file())
        .collect();
    for name in &missing {
        tracing::error!("The map {} is missing!", file_path(&settings.original_maps_dir, name, MAP_EXT).display());
    }
    if !missing.is_empty() {
        bail!(
            "There are missing maps in {}! Final maps are built on top of the original .map files.",
            settings.original_maps_dir.display()
        );
    }

    fs::create_dir_all(&settings.final_maps_dir)
        .with_context(|| format!("Creating {}", settings.final_maps_dir.display()))?;
    for name in &names {
        let target = file_path(&settings.final_maps_dir, name, MAP_EXT);
        if target.is_file() {
            tracing::info!("Automatically overriding {}.", target.display());
        }
    }

    Ok(run_each(&names, |name, diag| convert_json_to_map(settings, name, diag)))
}

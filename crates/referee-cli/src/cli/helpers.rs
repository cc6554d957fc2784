//! Shared argument plumbing for the subcommands.

use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use referee_core::config::{load_matrix, EvalMatrix};
use referee_core::model::DatasetVariant;
use referee_core::store::DataRoot;

use super::args::CommonArgs;

pub struct Target {
    pub root: DataRoot,
    pub variant: DatasetVariant,
    pub matrix: EvalMatrix,
}

pub fn resolve(common: &CommonArgs) -> anyhow::Result<Target> {
    let variant: DatasetVariant = common.variant.parse()?;
    let matrix = match &common.matrix {
        Some(path) => load_matrix(path)?,
        None => EvalMatrix::default(),
    };
    Ok(Target {
        root: DataRoot::new(&common.data_root),
        variant,
        matrix,
    })
}

/// Empty selection means every language the matrix knows; a nonempty one is
/// validated against it.
pub fn pick_langs(matrix: &EvalMatrix, requested: &[String]) -> anyhow::Result<Vec<String>> {
    if requested.is_empty() {
        return Ok(matrix.language_codes());
    }
    for code in requested {
        matrix.language(code)?;
    }
    Ok(requested.to_vec())
}

pub fn pick_modes(matrix: &EvalMatrix, requested: &[String]) -> anyhow::Result<Vec<String>> {
    if requested.is_empty() {
        return Ok(matrix.mode_names());
    }
    for name in requested {
        matrix.mode(name)?;
    }
    Ok(requested.to_vec())
}

pub fn pick_models(matrix: &EvalMatrix, requested: &[String]) -> anyhow::Result<Vec<String>> {
    if requested.is_empty() {
        return Ok(matrix.model_ids());
    }
    for id in requested {
        matrix.model(id)?;
    }
    Ok(requested.to_vec())
}

/// Pretty-printed JSON to the given file, or stdout when absent.
pub fn write_report<T: Serialize>(report: &T, output: Option<&Path>) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(report)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("failed to create {}", parent.display()))?;
                }
            }
            std::fs::write(path, rendered + "\n")
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

//! Where evaluation artifacts live under the data root.
//!
//! Raw model outputs and their judged counterparts share one partitioned
//! naming scheme, so a judged file can always be traced back to the raw
//! file it was produced from:
//!
//! ```text
//! <root>/outputs/<variant>/<lang>/<model>/outputs-<variant>-<lang>-<model>-<mode>-<order>.jsonl
//! <root>/judged_outputs/<variant>/<lang>/<model>/outputs-...-<order>.jsonl
//! <root>/judge-inputs/coarse-judge-input-<stamp>.jsonl
//! <root>/judge-inputs/entity-judge-input-<stamp>.jsonl
//! <root>/raw_judge_outputs/<downloaded batch results>
//! ```

use std::path::{Path, PathBuf};

use crate::model::{DatasetVariant, Permutation};

/// One raw-output file in the evaluation matrix. Doubles as the correlation
/// key inside batch task ids, so the rendered form includes the `.jsonl`
/// extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileKey {
    pub variant: DatasetVariant,
    pub lang: String,
    pub model: String,
    pub mode: String,
    pub order: Permutation,
}

impl FileKey {
    pub fn new(
        variant: DatasetVariant,
        lang: impl Into<String>,
        model: impl Into<String>,
        mode: impl Into<String>,
        order: Permutation,
    ) -> Self {
        Self {
            variant,
            lang: lang.into(),
            model: model.into(),
            mode: mode.into(),
            order,
        }
    }

    /// Relative path under `outputs/` (and under `judged_outputs/`).
    pub fn relative_path(&self) -> String {
        format!(
            "{v}/{l}/{m}/outputs-{v}-{l}-{m}-{mode}-{o}.jsonl",
            v = self.variant,
            l = self.lang,
            m = self.model,
            mode = self.mode,
            o = self.order,
        )
    }
}

impl std::fmt::Display for FileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.relative_path())
    }
}

/// Root directory of one evaluation data set.
#[derive(Debug, Clone)]
pub struct DataRoot {
    root: PathBuf,
}

impl DataRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn outputs_dir(&self) -> PathBuf {
        self.root.join("outputs")
    }

    pub fn judged_dir(&self) -> PathBuf {
        self.root.join("judged_outputs")
    }

    pub fn judge_inputs_dir(&self) -> PathBuf {
        self.root.join("judge-inputs")
    }

    pub fn raw_results_dir(&self) -> PathBuf {
        self.root.join("raw_judge_outputs")
    }

    /// Raw model outputs for one matrix cell.
    pub fn raw_file(&self, key: &FileKey) -> PathBuf {
        self.outputs_dir().join(key.relative_path())
    }

    /// Judged counterpart of [`raw_file`](Self::raw_file).
    pub fn judged_file(&self, key: &FileKey) -> PathBuf {
        self.judged_dir().join(key.relative_path())
    }

    /// Raw file addressed by the string key recovered from a batch task id.
    pub fn raw_file_for(&self, file_key: &str) -> PathBuf {
        self.outputs_dir().join(file_key)
    }

    /// Judged file addressed by the string key recovered from a batch task id.
    pub fn judged_file_for(&self, file_key: &str) -> PathBuf {
        self.judged_dir().join(file_key)
    }

    pub fn coarse_task_file(&self, stamp: &str) -> PathBuf {
        self.judge_inputs_dir()
            .join(format!("coarse-judge-input-{stamp}.jsonl"))
    }

    pub fn entity_task_file(&self, stamp: &str) -> PathBuf {
        self.judge_inputs_dir()
            .join(format!("entity-judge-input-{stamp}.jsonl"))
    }
}

/// Timestamp used in judge-input file names, UTC so two hosts agree on it.
pub fn timestamp() -> String {
    chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Entity orders evaluated for one language. Only English has outputs for
/// the shuffled orders; every other language carries the identity order.
pub fn orders_for_lang(variant: DatasetVariant, lang: &str) -> Vec<Permutation> {
    if lang == "en" {
        Permutation::all(variant.entity_count())
    } else {
        vec![variant.identity_order()]
    }
}

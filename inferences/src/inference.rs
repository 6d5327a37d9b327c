use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{error, info};
use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::artifact::{self, ArtifactFormat, Classifier};
use crate::error::{PredictorError, PredictorResult};
use crate::schema::{FeatureRow, N_FEATURES};

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct PredictionResult {
    pub adopted: bool,
    /// Positive-class probability in `[0, 1]`.
    pub probability: f64,
}

/// Owned handle to the trained classifier.
///
/// The artifact is read on first use and kept for the life of the handle; it
/// never changes underneath a running process. A failed load is not cached,
/// so the next submission reads the file again.
pub struct ModelHandle {
    path: PathBuf,
    threshold: f32,
    classifier: OnceCell<Arc<dyn Classifier>>,
}

impl ModelHandle {
    pub fn new(path: impl Into<PathBuf>, threshold: f32) -> Self {
        Self {
            path: path.into(),
            threshold,
            classifier: OnceCell::new(),
        }
    }

    /// Wraps a classifier that is already in memory.
    pub fn with_classifier(path: impl Into<PathBuf>, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            path: path.into(),
            threshold: 0.5,
            classifier: OnceCell::with_value(classifier),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.classifier.get().is_some()
    }

    pub fn classifier(&self) -> PredictorResult<&Arc<dyn Classifier>> {
        self.classifier.get_or_try_init(|| {
            let classifier = artifact::load_classifier(&self.path, self.threshold)
                .inspect_err(|e| error!("{}", e))?;
            info!(
                "Model loaded from {} ({:?}, {} features)",
                self.path.display(),
                classifier.format(),
                classifier.n_features()
            );
            Ok(classifier)
        })
    }

    /// Runs the classifier's decision and probability estimate on one row.
    ///
    /// # Errors
    ///
    /// `ModelLoad` when the artifact cannot be read, `SchemaMismatch` when it
    /// was trained on different columns, `Inference` when the runtime fails.
    pub fn predict(&self, row: &FeatureRow) -> PredictorResult<PredictionResult> {
        let classifier = self.classifier()?;
        check_schema(classifier.as_ref()).inspect_err(|e| error!("{}", e))?;

        let features = row.to_array();
        let (adopted, probability) = classifier.predict_with_proba(&features)?;
        Ok(PredictionResult {
            adopted,
            probability,
        })
    }

    pub fn model_info(&self) -> ModelInfo {
        let loaded = self.classifier.get();
        ModelInfo {
            path: self.path.display().to_string(),
            loaded: loaded.is_some(),
            format: loaded
                .map(|c| c.format())
                .or_else(|| ArtifactFormat::from_path(&self.path)),
            n_features: N_FEATURES,
            features: FeatureRow::COLUMNS.iter().map(|c| c.to_string()).collect(),
            threshold: self.threshold,
        }
    }
}

/// Checks that the classifier was trained on the encoder's columns.
///
/// Named artifacts must list the same columns in the same order; unnamed ones
/// must at least agree on the count.
pub fn check_schema(classifier: &dyn Classifier) -> PredictorResult<()> {
    let found = || -> Vec<String> { FeatureRow::COLUMNS.iter().map(|c| c.to_string()).collect() };
    match classifier.feature_names() {
        Some(names) if names.iter().map(String::as_str).ne(FeatureRow::COLUMNS) => {
            Err(PredictorError::SchemaMismatch {
                expected: names.to_vec(),
                found: found(),
            })
        }
        None if classifier.n_features() != N_FEATURES => Err(PredictorError::SchemaMismatch {
            expected: (0..classifier.n_features()).map(|i| format!("#{i}")).collect(),
            found: found(),
        }),
        _ => Ok(()),
    }
}

#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub path: String,
    pub loaded: bool,
    pub format: Option<ArtifactFormat>,
    pub n_features: usize,
    pub features: Vec<String>,
    pub threshold: f32,
}

use std::path::Path;
use std::sync::Arc;

use log::debug;
use serde::Serialize;

use crate::error::{PredictorError, PredictorResult};
use crate::forest::RandomForest;
use crate::onnx::OnnxClassifier;
use crate::schema::N_FEATURES;

/// A trained binary classifier. Class `1` means adopted.
pub trait Classifier: Send + Sync {
    fn predict(&self, features: &[f32]) -> PredictorResult<bool>;

    /// Probability of the positive class.
    fn predict_proba(&self, features: &[f32]) -> PredictorResult<f64>;

    /// Decision and positive-class probability from a single pass.
    fn predict_with_proba(&self, features: &[f32]) -> PredictorResult<(bool, f64)> {
        Ok((self.predict(features)?, self.predict_proba(features)?))
    }

    fn n_features(&self) -> usize;

    /// Column names recorded in the artifact, if it carries any.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    fn format(&self) -> ArtifactFormat;
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    Json,
    Onnx,
}

impl ArtifactFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(ArtifactFormat::Json),
            "onnx" => Some(ArtifactFormat::Onnx),
            _ => None,
        }
    }
}

/// Reads the artifact at `path`. `threshold` only applies to single-logit ONNX graphs.
pub fn load_classifier(path: &Path, threshold: f32) -> PredictorResult<Arc<dyn Classifier>> {
    let format = ArtifactFormat::from_path(path)
        .ok_or_else(|| PredictorError::model_load(path, "unsupported artifact format"))?;
    if !path.is_file() {
        return Err(PredictorError::model_load(path, "artifact not found"));
    }
    debug!("Loading artifact {} ({:?})", path.display(), format);

    match format {
        ArtifactFormat::Json => {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| PredictorError::model_load(path, e))?;
            let forest =
                RandomForest::from_json(&raw).map_err(|e| PredictorError::model_load(path, e))?;
            Ok(Arc::new(forest))
        }
        ArtifactFormat::Onnx => {
            let model = OnnxClassifier::load(path, N_FEATURES, threshold)
                .map_err(|e| PredictorError::model_load(path, format!("{e:#}")))?;
            Ok(Arc::new(model))
        }
    }
}

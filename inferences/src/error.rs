use std::fmt::Display;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredictorError {
    #[error("Model load error: {path}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    #[error("Schema mismatch: model expects {expected:?}, feature row has {found:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Inference error: {0}")]
    Inference(String),
}

pub type PredictorResult<T> = Result<T, PredictorError>;

impl PredictorError {
    pub fn model_load(path: &Path, reason: impl Display) -> Self {
        PredictorError::ModelLoad {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Text shown to the person filling in the form.
    pub fn user_message(&self) -> &'static str {
        match self {
            PredictorError::ModelLoad { .. } => {
                "Prediction unavailable: the model could not be loaded."
            }
            PredictorError::SchemaMismatch { .. } => {
                "Internal error: the model does not match the feature schema."
            }
            PredictorError::Inference(_) => "Internal error: the prediction could not be computed.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_load_keeps_path() {
        let err = PredictorError::model_load(Path::new("rf_model.json"), "No such file");
        assert_eq!(
            err.to_string(),
            "Model load error: rf_model.json: No such file"
        );
        assert!(err.user_message().starts_with("Prediction unavailable"));
    }

    #[test]
    fn schema_mismatch_is_internal() {
        let err = PredictorError::SchemaMismatch {
            expected: vec!["Fixed".into()],
            found: vec!["Color_black".into()],
        };
        assert!(err.user_message().starts_with("Internal error"));
        assert!(err.to_string().contains("Fixed"));
    }
}

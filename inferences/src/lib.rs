//! Feature schema, classifier artifacts and the model handle behind the
//! adoption predictor form.

pub mod artifact;
pub mod error;
pub mod forest;
pub mod inference;
pub mod onnx;
pub mod schema;

pub use artifact::{ArtifactFormat, Classifier};
pub use error::{PredictorError, PredictorResult};
pub use inference::{ModelHandle, ModelInfo, PredictionResult};
pub use schema::{encode, AnimalDescriptor, AnimalType, FeatureRow, N_FEATURES};

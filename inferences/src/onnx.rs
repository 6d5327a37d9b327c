use std::path::Path;

use tract_onnx::prelude::*;

use crate::artifact::{ArtifactFormat, Classifier};
use crate::error::{PredictorError, PredictorResult};

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX classifier run through tract.
///
/// Graphs exported from a tree ensemble (ZipMap disabled) yield a label and a
/// `[1, 2]` probability tensor. Graphs with a single output are read as one
/// logit and thresholded after a sigmoid.
pub struct OnnxClassifier {
    model: Plan,
    n_features: usize,
    threshold: f32,
}

impl OnnxClassifier {
    pub fn load<P: AsRef<Path>>(model_path: P, n_features: usize, threshold: f32) -> TractResult<Self> {
        let model = tract_onnx::onnx()
            .model_for_path(model_path)?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, n_features)),
            )?
            .into_optimized()?
            .into_runnable()?;

        Ok(Self {
            model,
            n_features,
            threshold,
        })
    }

    fn run(&self, features: &[f32]) -> TractResult<(bool, f64)> {
        let input = Tensor::from_shape(&[1, self.n_features], features)?;
        let outputs = self.model.run(tvec!(input.into()))?;

        match outputs.len() {
            0 => anyhow::bail!("model produced no outputs"),
            1 => {
                let logits = outputs[0].cast_to::<f32>()?;
                let logit = first_value(&logits)?;
                let probability = 1.0 / (1.0 + (-logit).exp());
                Ok((probability >= self.threshold, f64::from(probability)))
            }
            _ => {
                let label = outputs[0].cast_to::<i64>()?;
                let label = *label
                    .as_slice::<i64>()?
                    .first()
                    .ok_or_else(|| anyhow::anyhow!("empty label output"))?;
                let proba = outputs[1].cast_to::<f32>()?;
                let positive = *proba
                    .as_slice::<f32>()?
                    .get(1)
                    .ok_or_else(|| anyhow::anyhow!("probability output has no positive class"))?;
                Ok((label == 1, f64::from(positive).clamp(0.0, 1.0)))
            }
        }
    }

    fn checked_run(&self, features: &[f32]) -> PredictorResult<(bool, f64)> {
        if features.len() != self.n_features {
            return Err(PredictorError::Inference(format!(
                "expected {} features, got {}",
                self.n_features,
                features.len()
            )));
        }
        self.run(features)
            .map_err(|e| PredictorError::Inference(format!("{e:#}")))
    }
}

fn first_value(tensor: &Tensor) -> TractResult<f32> {
    tensor
        .as_slice::<f32>()?
        .first()
        .copied()
        .ok_or_else(|| anyhow::anyhow!("empty model output"))
}

impl Classifier for OnnxClassifier {
    fn predict(&self, features: &[f32]) -> PredictorResult<bool> {
        self.checked_run(features).map(|(adopted, _)| adopted)
    }

    fn predict_proba(&self, features: &[f32]) -> PredictorResult<f64> {
        self.checked_run(features).map(|(_, probability)| probability)
    }

    fn predict_with_proba(&self, features: &[f32]) -> PredictorResult<(bool, f64)> {
        self.checked_run(features)
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn format(&self) -> ArtifactFormat {
        ArtifactFormat::Onnx
    }
}

use adoption_inference::{FeatureRow, PredictionResult};
use serde::{Deserialize, Serialize};

/// Result text as shown under the form.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct RenderedPrediction {
    pub headline: String,
    pub detail: String,
}

pub fn format_probability(probability: f64) -> String {
    format!("{:.2} %", probability * 100.0)
}

pub fn render(result: &PredictionResult) -> RenderedPrediction {
    let headline = if result.adopted {
        "The animal is predicted to be adopted!"
    } else {
        "The animal is not predicted to be adopted"
    };
    RenderedPrediction {
        headline: headline.to_string(),
        detail: format!(
            "Predicted probability of adoption: {}",
            format_probability(result.probability)
        ),
    }
}

/// HTML form body. Checkboxes only appear in the body when ticked.
#[derive(Debug, Deserialize, Default)]
pub struct PredictForm {
    pub animal_type: Option<adoption_inference::AnimalType>,
    pub color_black: Option<String>,
    pub female: Option<String>,
    pub young: Option<String>,
    pub fixed: Option<String>,
    pub intake_condition: Option<String>,
}

impl From<PredictForm> for adoption_inference::AnimalDescriptor {
    fn from(form: PredictForm) -> Self {
        Self {
            animal_type: form.animal_type.unwrap_or_default(),
            color_black: form.color_black.is_some(),
            female: form.female.is_some(),
            younger_than_one_year: form.young.is_some(),
            fixed: form.fixed.is_some(),
            abnormal_intake_condition: form.intake_condition.is_some(),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct PredictionReport {
    pub feature_row: FeatureRow,
    pub adopted: bool,
    pub probability: f64,
    pub headline: String,
    pub detail: String,
}

impl PredictionReport {
    pub fn new(feature_row: FeatureRow, result: &PredictionResult) -> Self {
        let RenderedPrediction { headline, detail } = render(result);
        Self {
            feature_row,
            adopted: result.adopted,
            probability: result.probability,
            headline,
            detail,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: String,
    pub execution_time_ms: Option<u64>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            execution_time_ms: None,
        }
    }

    pub fn error(message: &str) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
            execution_time_ms: None,
        }
    }

    pub fn with_elapsed(mut self, start: std::time::Instant) -> Self {
        self.execution_time_ms = Some(start.elapsed().as_millis() as u64);
        self
    }
}

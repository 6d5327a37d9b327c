use std::path::PathBuf;
use std::str::FromStr;

use log::warn;

/// Server settings read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub model_path: PathBuf,
    /// Decision threshold for single-logit ONNX models.
    pub threshold: f32,
}

impl AppConfig {
    /// Reads `HOST`, `PORT`, `WORKERS`, `MODEL_PATH` and `MODEL_THRESHOLD`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_or(&lookup, "PORT", 8080);
        let workers = parse_or(&lookup, "WORKERS", num_cpus::get()).max(1);
        let model_path = lookup("MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("rf_model.json"));
        let mut threshold = parse_or(&lookup, "MODEL_THRESHOLD", 0.5f32);
        if !(0.0..=1.0).contains(&threshold) {
            warn!("MODEL_THRESHOLD={} is outside [0, 1], using 0.5", threshold);
            threshold = 0.5;
        }

        Self {
            host,
            port,
            workers,
            model_path,
            threshold,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid {}={:?}, using {}", key, raw, default);
            default
        }),
        None => default,
    }
}

use std::path::PathBuf;

/// Hub repository used when no local fine-tuned model is present.
pub const DEFAULT_MODEL_ID: &str = "distilbert-base-uncased-finetuned-sst-2-english";

/// Local directory checked for a fine-tuned model before falling back to the hub.
pub const DEFAULT_MODEL_PATH: &str = "./model";

pub const MODEL_PATH_VAR: &str = "MODEL_PATH";
pub const USE_ML_MODEL_VAR: &str = "USE_ML_MODEL";
pub const FORCE_CPU_VAR: &str = "FORCE_CPU";

/// Engine settings, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub model_path: PathBuf,
    pub model_id: String,
    pub use_ml_model: bool,
    pub force_cpu: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            model_id: DEFAULT_MODEL_ID.to_string(),
            use_ml_model: false,
            force_cpu: false,
        }
    }
}

impl EngineConfig {
    /// Reads `MODEL_PATH`, `USE_ML_MODEL` and `FORCE_CPU` from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] but with an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let model_path = lookup(MODEL_PATH_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.model_path);

        Self {
            model_path,
            model_id: defaults.model_id,
            use_ml_model: lookup(USE_ML_MODEL_VAR).is_some_and(|v| is_truthy(&v)),
            force_cpu: lookup(FORCE_CPU_VAR).is_some_and(|v| is_truthy(&v)),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = EngineConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.model_path, PathBuf::from("./model"));
        assert!(!config.use_ml_model);
    }

    #[test]
    fn reads_overrides() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            ("MODEL_PATH", "/srv/models/sst2"),
            ("USE_ML_MODEL", "TRUE"),
            ("FORCE_CPU", "1"),
        ]));
        assert_eq!(config.model_path, PathBuf::from("/srv/models/sst2"));
        assert!(config.use_ml_model);
        assert!(config.force_cpu);
    }

    #[test]
    fn non_truthy_values_are_false() {
        for value in ["false", "0", "no", "", "maybe"] {
            let config = EngineConfig::from_lookup(lookup_from(&[("USE_ML_MODEL", value)]));
            assert!(!config.use_ml_model, "{value:?} should not enable the model");
        }
    }

    #[test]
    fn blank_model_path_keeps_default() {
        let config = EngineConfig::from_lookup(lookup_from(&[("MODEL_PATH", "  ")]));
        assert_eq!(config.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
    }
}

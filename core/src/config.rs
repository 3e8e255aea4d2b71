//! Feature run configuration, loaded from JSON.

use crate::deriver::Lag;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_FEATURE_GROUP: &str = "cc_trans_fraud";
pub const DEFAULT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureConfig {
    pub lag: Lag,
    /// Name of the feature group the derived rows belong to.
    pub feature_group: String,
    pub version: u32,
}

/// On-disk shape. Every key is optional; `lag` stays untyped until
/// `Lag::from_json` has looked at it so a `1.5` is an input error and not
/// a parse error.
#[derive(Debug, Clone, Deserialize)]
struct FeatureConfigFile {
    #[serde(default)]
    lag: Option<Value>,
    #[serde(default)]
    feature_group: Option<String>,
    #[serde(default)]
    version: Option<u32>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            lag: Lag::default(),
            feature_group: DEFAULT_FEATURE_GROUP.into(),
            version: DEFAULT_VERSION,
        }
    }
}

impl FeatureConfig {
    /// Load from a JSON file.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        Self::from_json_str(&content).map_err(|e| anyhow::anyhow!("Invalid config {path}: {e}"))
    }

    pub fn from_json_str(content: &str) -> anyhow::Result<Self> {
        let file: FeatureConfigFile = serde_json::from_str(content)?;
        let lag = match file.lag {
            Some(value) => Lag::from_json(&value)?,
            None => Lag::default(),
        };
        Ok(Self {
            lag,
            feature_group: file
                .feature_group
                .unwrap_or_else(|| DEFAULT_FEATURE_GROUP.into()),
            version: file.version.unwrap_or(DEFAULT_VERSION),
        })
    }

    /// `<feature_group>_v<version>`, the label used in logs and run summaries.
    /// Stored rows are keyed by group and version columns, not by this name.
    pub fn qualified_name(&self) -> String {
        format!("{}_v{}", self.feature_group, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let cfg = FeatureConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, FeatureConfig::default());
        assert_eq!(cfg.qualified_name(), "cc_trans_fraud_v1");
    }

    #[test]
    fn explicit_values_override_defaults() {
        let cfg = FeatureConfig::from_json_str(
            r#"{"lag": 3, "feature_group": "card_activity", "version": 2}"#,
        )
        .unwrap();
        assert_eq!(cfg.lag.get(), 3);
        assert_eq!(cfg.qualified_name(), "card_activity_v2");
    }

    #[test]
    fn fractional_lag_is_rejected() {
        let err = FeatureConfig::from_json_str(r#"{"lag": 1.5}"#).unwrap_err();
        assert!(err.to_string().contains("lag must be a positive integer"));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = FeatureConfig::load("/nonexistent/features.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/features.json"));
    }
}

//! TOML-backed runtime configuration, read with `--config` and layered over
//! `EvalConfig::default()` and the cache's default TTL.

use std::time::Duration;

use rules_eval::EvalConfig;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct RulesCliConfig {
    #[serde(default)]
    pub decimal_scale: Option<i64>,
    #[serde(default)]
    pub max_iterations: Option<u32>,
    #[serde(default)]
    pub cache_ttl_secs: Option<u64>,
}

impl RulesCliConfig {
    pub fn from_str(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|e| format!("invalid config: {e}"))
    }

    pub fn eval_config(&self) -> EvalConfig {
        let default = EvalConfig::default();
        EvalConfig::new(
            self.decimal_scale.unwrap_or(default.decimal_scale),
            self.max_iterations.unwrap_or(default.default_max_iterations),
        )
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs.unwrap_or(300))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = RulesCliConfig::from_str("").unwrap();
        assert_eq!(config.eval_config().decimal_scale, EvalConfig::default().decimal_scale);
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn overrides_apply() {
        let config = RulesCliConfig::from_str("decimal_scale = 8\nmax_iterations = 50\ncache_ttl_secs = 60\n").unwrap();
        let eval_config = config.eval_config();
        assert_eq!(eval_config.decimal_scale, 8);
        assert_eq!(eval_config.default_max_iterations, 50);
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
    }

    #[test]
    fn malformed_toml_is_rejected() {
        assert!(RulesCliConfig::from_str("not = [valid").is_err());
    }

    #[test]
    fn decimal_scale_below_the_currency_floor_is_clamped() {
        let config = RulesCliConfig::from_str("decimal_scale = 0\n").unwrap();
        assert_eq!(config.eval_config().decimal_scale, 2);

        let config = RulesCliConfig::from_str("decimal_scale = -5\n").unwrap();
        assert_eq!(config.eval_config().decimal_scale, 2);
    }
}

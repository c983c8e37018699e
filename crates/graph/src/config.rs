use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};

const ENV_MIN_NAME_LEN: &str = "REFGRAPH_MIN_NAME_LEN";
const ENV_MAX_REFERENCES: &str = "REFGRAPH_MAX_REFERENCES";

/// Tuning knobs for the correlation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Functions whose index name is shorter than this are never correlated.
    /// Short names match too many unrelated tokens to be worth the time.
    pub min_index_name_len: usize,

    /// A function referenced more often than this stays unconnected.
    /// Overridden names like `toString` otherwise fan out to thousands of
    /// edges nobody analyzes.
    pub max_references_per_function: Option<usize>,
}

impl GraphConfig {
    /// Limits suited to big repositories: skip names under 4 chars and
    /// functions with more than 1024 references
    pub fn for_large_repos() -> Self {
        Self {
            min_index_name_len: 4,
            max_references_per_function: Some(1024),
        }
    }

    /// Default config with `REFGRAPH_MIN_NAME_LEN` / `REFGRAPH_MAX_REFERENCES`
    /// applied on top, validated
    pub fn from_env() -> Result<Self> {
        Self::from_env_values(
            std::env::var(ENV_MIN_NAME_LEN).ok().as_deref(),
            std::env::var(ENV_MAX_REFERENCES).ok().as_deref(),
        )
    }

    fn from_env_values(min_name_len: Option<&str>, max_refs: Option<&str>) -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides(min_name_len, max_refs);
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self, min_name_len: Option<&str>, max_refs: Option<&str>) {
        match min_name_len.map(str::trim) {
            Some("") | None => {}
            Some(raw) => match parse_usize(raw) {
                Some(v) => self.min_index_name_len = v,
                None => log::warn!("Ignoring invalid {ENV_MIN_NAME_LEN}={raw:?}"),
            },
        }
        match max_refs.map(str::trim) {
            Some("" | "none" | "off") | None => {}
            Some(raw) => match parse_usize(raw) {
                Some(v) => self.max_references_per_function = Some(v),
                None => log::warn!("Ignoring invalid {ENV_MAX_REFERENCES}={raw:?}"),
            },
        }
    }

    /// Parse a config document, JSON first, then TOML
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let config: Self = match serde_json::from_slice(bytes) {
            Ok(config) => config,
            Err(json_err) => {
                let utf8 = std::str::from_utf8(bytes)
                    .map_err(|err| GraphError::invalid_config(format!("{json_err}; {err}")))?;
                toml::from_str(utf8).map_err(|toml_err| {
                    GraphError::invalid_config(format!(
                        "config is not valid JSON or TOML ({json_err}); TOML parse error: {toml_err}"
                    ))
                })?
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_references_per_function == Some(0) {
            return Err(GraphError::invalid_config(
                "max_references_per_function must be > 0 (omit it to disable the limit)",
            ));
        }
        Ok(())
    }
}

fn parse_usize(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_presets_valid() {
        assert!(GraphConfig::default().validate().is_ok());
        assert!(GraphConfig::for_large_repos().validate().is_ok());
    }

    #[test]
    fn test_zero_reference_limit_rejected() {
        let config = GraphConfig {
            max_references_per_function: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(GraphError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_parse_json_and_toml() {
        let json = br#"{"min_index_name_len": 3}"#;
        let config = GraphConfig::parse(json).unwrap();
        assert_eq!(config.min_index_name_len, 3);
        assert_eq!(config.max_references_per_function, None);

        let toml = b"min_index_name_len = 4\nmax_references_per_function = 10\n";
        let config = GraphConfig::parse(toml).unwrap();
        assert_eq!(
            config,
            GraphConfig {
                min_index_name_len: 4,
                max_references_per_function: Some(10),
            }
        );

        assert!(GraphConfig::parse(b"max_references_per_function = 0").is_err());
        assert!(GraphConfig::parse(b"[[[").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = GraphConfig::default();
        config.apply_env_overrides(Some(" 5 "), Some("64"));
        assert_eq!(config.min_index_name_len, 5);
        assert_eq!(config.max_references_per_function, Some(64));

        let mut config = GraphConfig::for_large_repos();
        config.apply_env_overrides(Some("abc"), Some("off"));
        assert_eq!(config, GraphConfig::for_large_repos());

        let mut config = GraphConfig::for_large_repos();
        config.apply_env_overrides(Some("4"), Some("-1"));
        assert_eq!(config, GraphConfig::for_large_repos());
    }

    #[test]
    fn test_env_values_are_validated() {
        let config = GraphConfig::from_env_values(Some("3"), None).unwrap();
        assert_eq!(config.min_index_name_len, 3);
        assert_eq!(config.max_references_per_function, None);

        assert!(matches!(
            GraphConfig::from_env_values(None, Some("0")),
            Err(GraphError::InvalidConfig(_))
        ));
    }
}

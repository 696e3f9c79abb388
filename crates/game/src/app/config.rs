use std::fs;
use std::path::{Path, PathBuf};

use engine::{SimConfig, SimConfigError};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config json{}: {source}", at_path(.path))]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Invalid(#[from] SimConfigError),
}

fn at_path(path: &str) -> String {
    if path.is_empty() || path == "." {
        String::new()
    } else {
        format!(" at {path}")
    }
}

/// Defaults when `path` is `None`, otherwise defaults overlaid with the file.
pub(crate) fn load_sim_config(path: Option<&Path>) -> Result<SimConfig, ConfigError> {
    let Some(path) = path else {
        let config = SimConfig::default();
        config.validate()?;
        return Ok(config);
    };
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_sim_config(&raw)?;
    info!(path = %path.display(), tile_size = config.tile_size, "sim_config_loaded");
    Ok(config)
}

pub(crate) fn parse_sim_config(raw: &str) -> Result<SimConfig, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let config: SimConfig =
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            let path = error.path().to_string();
            ConfigError::Json {
                path,
                source: error.into_inner(),
            }
        })?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_means_defaults() {
        let config = load_sim_config(None).expect("defaults");
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = parse_sim_config(
            r#"{ "attack_range": 40, "steering": { "coarse_sight_step": 32 } }"#,
        )
        .expect("parse");
        assert_eq!(config.attack_range, 40);
        assert_eq!(config.steering.coarse_sight_step, 32);
        assert_eq!(config.tile_size, SimConfig::default().tile_size);
    }

    #[test]
    fn type_errors_report_the_field_path() {
        let err = parse_sim_config(r#"{ "animation": { "enemy_walk_ms": "fast" } }"#)
            .expect_err("bad type");
        match &err {
            ConfigError::Json { path, .. } => assert_eq!(path, "animation.enemy_walk_ms"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("at animation.enemy_walk_ms"));
    }

    #[test]
    fn invalid_values_are_rejected_after_parsing() {
        let err = parse_sim_config(r#"{ "tile_size": 0 }"#).expect_err("zero tile");
        assert!(matches!(err, ConfigError::Invalid(SimConfigError::ZeroTileSize)));
    }

    #[test]
    fn unreadable_file_names_the_path() {
        let missing = Path::new("definitely/not/a/config.json");
        let err = load_sim_config(Some(missing)).expect_err("missing file");
        assert!(matches!(err, ConfigError::Io { ref path, .. } if path == missing));
    }
}

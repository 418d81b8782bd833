//! Configuration loading.
//!
//! The default configuration is embedded at compile time via
//! [`include_str!`]. A file given on the command line replaces it; keys it
//! leaves out fall back to the built-in defaults.

use std::path::{Path, PathBuf};

use caps_map_color::{ColorError, Rgb};
use caps_map_municipality_models::config::CapsMapConfig;
use thiserror::Error;

/// The configuration shipped with the binary.
pub const DEFAULT_CONFIG: &str = include_str!("../default_config.toml");

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the config file failed.
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// The file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The document is not valid TOML or does not match the schema.
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    /// The no-data color is not a hex color.
    #[error("Invalid no-data color: {0}")]
    Color(#[from] ColorError),

    /// The values parse but contradict each other.
    #[error("Invalid config: {message}")]
    Invalid {
        /// What is wrong.
        message: String,
    },
}

/// Parses and validates a TOML configuration document.
///
/// # Errors
///
/// Returns [`ConfigError`] if the document does not parse or fails
/// validation.
pub fn parse_config(contents: &str) -> Result<CapsMapConfig, ConfigError> {
    let config: CapsMapConfig = toml::from_str(contents)?;
    validate(&config)?;
    Ok(config)
}

/// Loads the configuration at `path`, or the embedded default when `None`.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read, does not parse, or
/// fails validation.
pub fn load_config(path: Option<&Path>) -> Result<CapsMapConfig, ConfigError> {
    let Some(path) = path else {
        return parse_config(DEFAULT_CONFIG);
    };

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Loaded config from {}", path.display());

    parse_config(&contents)
}

fn validate(config: &CapsMapConfig) -> Result<(), ConfigError> {
    let years = &config.years;
    if years.min > years.max {
        return Err(ConfigError::Invalid {
            message: format!("years.min ({}) exceeds years.max ({})", years.min, years.max),
        });
    }
    if !years.contains(years.default) {
        return Err(ConfigError::Invalid {
            message: format!(
                "years.default ({}) is outside [{}, {}]",
                years.default, years.min, years.max
            ),
        });
    }
    if !(0.0..=1.0).contains(&config.style.fill_opacity) {
        return Err(ConfigError::Invalid {
            message: format!(
                "style.fill_opacity ({}) must be within [0, 1]",
                config.style.fill_opacity
            ),
        });
    }
    if config.geometry.simplify_tolerance < 0.0 {
        return Err(ConfigError::Invalid {
            message: "geometry.simplify_tolerance must not be negative".to_string(),
        });
    }
    if config.population.snapshot_years.is_empty() {
        log::warn!("No population snapshot years configured; every rate will be 0");
    }

    Rgb::from_hex(&config.scale.no_data_color)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use caps_map_municipality_models::config::PaletteName;

    use super::*;

    #[test]
    fn embedded_default_matches_schema_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config, CapsMapConfig::default());
    }

    #[test]
    fn override_keeps_unmentioned_defaults() {
        let config = parse_config("[scale]\npalette = \"reds\"\n").unwrap();
        assert_eq!(config.scale.palette, PaletteName::Reds);
        assert_eq!(config.years.default, 2023);
    }

    #[test]
    fn rejects_default_year_outside_range() {
        let err = parse_config("[years]\nmin = 2014\nmax = 2020\ndefault = 2023\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn rejects_bad_no_data_color() {
        let err = parse_config("[scale]\nno_data_color = \"white\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Color(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Some(Path::new("/nonexistent/caps-map.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}

use serde::Deserialize;
use std::fs;
use std::path::Path;

const ENV_CONFIG_PATH: &str = "DLM_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

const DEFAULT_GREEN: &str = "#D5E8D4";
const DEFAULT_RED: &str = "#F8CECC";
const DEFAULT_GREY: &str = "#808080";

/// Colors used for the valid / invalid / no-software series
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChartColors {
    pub valid: String,
    pub invalid: String,
    pub no_software: String,
}

impl Default for ChartColors {
    fn default() -> Self {
        Self {
            valid: DEFAULT_GREEN.to_string(),
            invalid: DEFAULT_RED.to_string(),
            no_software: DEFAULT_GREY.to_string(),
        }
    }
}

/// Chart rendering configuration
///
/// Sizes are in pixels. `per_platform_bar_width` is the width of a single
/// bar expressed as a fraction of one group slot on the x-axis.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub per_platform_width: u32,
    pub per_platform_height: u32,
    pub per_platform_bar_width: f64,
    pub pie_width: u32,
    pub pie_height: u32,
    pub colors: ChartColors,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            per_platform_width: 1000,
            per_platform_height: 500,
            per_platform_bar_width: 0.15,
            pie_width: 640,
            pie_height: 480,
            colors: ChartColors::default(),
        }
    }
}

impl ChartConfig {
    /// Clamp values that would produce an unusable chart
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.per_platform_width < 200 || self.per_platform_height < 150 {
            tracing::warn!(
                width = self.per_platform_width,
                height = self.per_platform_height,
                "Bar chart size too small, using defaults"
            );
            self.per_platform_width = defaults.per_platform_width;
            self.per_platform_height = defaults.per_platform_height;
        }
        if self.pie_width < 150 || self.pie_height < 150 {
            tracing::warn!(
                width = self.pie_width,
                height = self.pie_height,
                "Pie chart size too small, using defaults"
            );
            self.pie_width = defaults.pie_width;
            self.pie_height = defaults.pie_height;
        }
        // Three bars must fit in one group slot
        if !(self.per_platform_bar_width > 0.0 && self.per_platform_bar_width <= 0.33) {
            tracing::warn!(
                bar_width = self.per_platform_bar_width,
                "Bar width out of range, using default"
            );
            self.per_platform_bar_width = defaults.per_platform_bar_width;
        }
        self
    }
}

/// YAML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub charts: ChartConfig,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub charts: ChartConfig,
    pub port: u16,
    pub host: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            charts: ChartConfig::default(),
            port: 8080,
            host: "127.0.0.1".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let config_path =
            std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let charts = Self::load_config_file(&config_path)
            .map(|cf| cf.charts)
            .unwrap_or_default()
            .sanitized();

        Self { charts, port, host }
    }

    /// Load configuration from YAML file
    fn load_config_file(path: &str) -> Option<ConfigFile> {
        let path = Path::new(path);

        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => Self::parse_config(&contents).map_or_else(
                |e| {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to parse config file, using defaults");
                    None
                },
                |config| {
                    tracing::info!(path = %path.display(), "Loaded configuration from file");
                    Some(config)
                },
            ),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read config file, using defaults");
                None
            }
        }
    }

    fn parse_config(contents: &str) -> Result<ConfigFile, serde_yaml::Error> {
        let contents = contents.trim();
        if contents.is_empty() {
            return Ok(ConfigFile::default());
        }
        serde_yaml::from_str(contents)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = Config::parse_config("   \n").unwrap();
        assert_eq!(config.charts, ChartConfig::default());
    }

    #[test]
    fn test_partial_chart_section() {
        let yaml = r##"
charts:
  per_platform_width: 1400
  colors:
    valid: "#00FF00"
"##;
        let config = Config::parse_config(yaml).unwrap();
        assert_eq!(config.charts.per_platform_width, 1400);
        assert_eq!(config.charts.per_platform_height, 500);
        assert_eq!(config.charts.colors.valid, "#00FF00");
        assert_eq!(config.charts.colors.invalid, DEFAULT_RED);
    }

    #[test]
    fn test_sanitize_rejects_wide_bars() {
        let charts = ChartConfig {
            per_platform_bar_width: 0.5,
            ..ChartConfig::default()
        }
        .sanitized();
        assert_eq!(charts.per_platform_bar_width, 0.15);
    }

    #[test]
    fn test_sanitize_rejects_tiny_canvas() {
        let charts = ChartConfig {
            pie_width: 10,
            ..ChartConfig::default()
        }
        .sanitized();
        assert_eq!(charts.pie_width, 640);
        assert_eq!(charts.pie_height, 480);
    }

    #[test]
    fn test_bind_addr() {
        let config = Config::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }
}

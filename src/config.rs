//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::flipkart::selectors::SelectorTable;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Site root that search URLs and relative links are built from
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Directory the per-query CSV files are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Leading search containers to ignore (ads, filter panels)
    #[serde(default = "default_skip_listings")]
    pub skip_listings: usize,

    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Send requests with a browser TLS fingerprint
    #[serde(default = "default_emulate_browser")]
    pub emulate_browser: bool,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Write logs to this file instead of stderr
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Selector overrides
    #[serde(default)]
    pub selectors: SelectorTable,
}

fn default_base_url() -> String {
    "https://www.flipkart.com".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("reviews_data")
}

fn default_skip_listings() -> usize {
    3
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_emulate_browser() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            output_dir: default_output_dir(),
            skip_listings: default_skip_listings(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            proxy: None,
            emulate_browser: default_emulate_browser(),
            format: OutputFormat::Table,
            log_file: None,
            selectors: SelectorTable::default(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("fk-reviews").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(base_url) = std::env::var("FK_BASE_URL") {
            self.base_url = base_url;
        }

        if let Ok(dir) = std::env::var("FK_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }

        if let Ok(proxy) = std::env::var("FK_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(skip) = std::env::var("FK_SKIP_LISTINGS") {
            if let Ok(n) = skip.parse() {
                self.skip_listings = n;
            }
        }

        self
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.base_url, "https://www.flipkart.com");
        assert_eq!(config.output_dir, PathBuf::from("reviews_data"));
        assert_eq!(config.skip_listings, 3);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.connect_timeout_secs, 10);
        assert!(config.emulate_browser);
        assert_eq!(config.format, OutputFormat::Table);
        assert!(config.proxy.is_none());
        assert!(config.log_file.is_none());
        assert_eq!(config.selectors, SelectorTable::default());
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("csv".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);

        let err = "invalid".parse::<OutputFormat>().unwrap_err();
        assert!(err.contains("Unknown format"));
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Table.to_string(), "table");
        assert_eq!(OutputFormat::Json.to_string(), "json");
        assert_eq!(OutputFormat::Markdown.to_string(), "markdown");
        assert_eq!(OutputFormat::Csv.to_string(), "csv");
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            output_dir = "/tmp/reviews"
            skip_listings = 2
            emulate_browser = false
            format = "json"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/tmp/reviews"));
        assert_eq!(config.skip_listings, 2);
        assert!(!config.emulate_browser);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.base_url, "https://www.flipkart.com");
    }

    #[test]
    fn test_config_selector_overrides() {
        let toml = r#"
            [selectors]
            review_container = "div.review-card"

            [selectors.rating]
            select = "span.stars"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.selectors.review_container, "div.review-card");
        assert_eq!(config.selectors.rating.select, "span.stars");
        assert_eq!(config.selectors.listing, SelectorTable::default().listing);
    }

    #[test]
    fn test_config_partial_field_override() {
        let toml = r#"
            [selectors.name]
            select = "p.reviewer"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.selectors.name.select, "p.reviewer");
        assert_eq!(config.selectors.name.within, vec!["div", "div"]);
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            base_url = "http://localhost:9000"
            timeout_secs = 5
            "#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn test_config_from_file_not_found() {
        let result = Config::from_file("/nonexistent/path/config.toml");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_config_from_file_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml {{{{").unwrap();

        let err = Config::from_file(file.path()).unwrap_err().to_string();
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_config_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "skip_listings = 5").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.skip_listings, 5);
    }

    #[test]
    fn test_config_with_env() {
        let keys = ["FK_BASE_URL", "FK_OUTPUT_DIR", "FK_PROXY", "FK_SKIP_LISTINGS"];
        let saved: Vec<_> = keys.iter().map(|k| std::env::var(k).ok()).collect();

        std::env::set_var("FK_BASE_URL", "http://mirror.local");
        std::env::set_var("FK_OUTPUT_DIR", "/var/reviews");
        std::env::set_var("FK_PROXY", "http://proxy:8080");
        std::env::set_var("FK_SKIP_LISTINGS", "not_a_number");

        let config = Config::new().with_env();
        assert_eq!(config.base_url, "http://mirror.local");
        assert_eq!(config.output_dir, PathBuf::from("/var/reviews"));
        assert_eq!(config.proxy, Some("http://proxy:8080".to_string()));
        // Invalid values are ignored
        assert_eq!(config.skip_listings, 3);

        std::env::set_var("FK_SKIP_LISTINGS", "1");
        assert_eq!(Config::new().with_env().skip_listings, 1);

        for (key, value) in keys.iter().zip(saved) {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config {
            proxy: Some("socks5://localhost:1080".to_string()),
            skip_listings: 4,
            format: OutputFormat::Markdown,
            log_file: Some(PathBuf::from("scraper.log")),
            ..Config::default()
        };

        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert_eq!(parsed.proxy, config.proxy);
        assert_eq!(parsed.skip_listings, 4);
        assert_eq!(parsed.format, OutputFormat::Markdown);
        assert_eq!(parsed.log_file, config.log_file);
        assert_eq!(parsed.selectors, config.selectors);
    }
}

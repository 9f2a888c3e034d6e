//! Configuration management for collatz-pool
//!
//! Settings come from defaults, then an optional TOML file, then `CP_*`
//! environment variables. The binary applies command line overrides last.

use crate::types::{Error, Result};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Config file picked up from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "collatz-pool.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// What to compute and with how many workers
    pub workload: WorkloadConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,

    /// Result rendering
    pub output: OutputConfig,
}

/// Workload configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    /// Upper bound of the input range `1..=numbers`
    pub numbers: u64,

    /// Worker counts to sweep, one run each
    pub thread_counts: Vec<ThreadCount>,

    /// Per-input iteration bound (None = unbounded)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u64>,

    /// Capacity of the queue feeding the workers
    pub queue_capacity: usize,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log line format
    pub format: LogFormat,
}

/// Metrics configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Print the Prometheus exposition after the sweep
    pub enabled: bool,
}

/// Output configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// How each run summary is printed
    pub format: OutputFormat,
}

/// Log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line, abbreviated
    #[default]
    Compact,
    /// Default `tracing-subscriber` layout
    Full,
}

/// Run summary rendering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per run
    Json,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "compact" => Ok(Self::Compact),
            "full" => Ok(Self::Full),
            _ => Err(Error::config(format!(
                "Invalid log format: {}. Valid options: compact, full",
                s
            ))),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(Error::config(format!(
                "Invalid output format: {}. Valid options: text, json",
                s
            ))),
        }
    }
}

/// A worker count in the sweep: fixed, or one per CPU core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadCount {
    /// Exactly this many workers. Zero is kept so the run reports it.
    Fixed(usize),
    /// `num_cpus::get()` workers
    Auto,
}

impl ThreadCount {
    /// Concrete worker count
    pub fn resolve(self) -> usize {
        match self {
            Self::Fixed(n) => n,
            Self::Auto => num_cpus::get().max(1),
        }
    }

    /// Parse a comma-separated list such as `1,2,4,auto`
    pub fn parse_list(s: &str) -> Result<Vec<Self>> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl FromStr for ThreadCount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        s.parse::<usize>()
            .map(Self::Fixed)
            .map_err(|e| Error::config(format!("Invalid worker count '{}': {}", s, e)))
    }
}

impl fmt::Display for ThreadCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(n) => write!(f, "{}", n),
            Self::Auto => f.write_str("auto"),
        }
    }
}

impl Serialize for ThreadCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Fixed(n) => serializer.serialize_u64(*n as u64),
            Self::Auto => serializer.serialize_str("auto"),
        }
    }
}

// Accepts integers and the string "auto"
impl<'de> Deserialize<'de> for ThreadCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ThreadCountVisitor;

        impl<'de> Visitor<'de> for ThreadCountVisitor {
            type Value = ThreadCount;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a non-negative worker count or \"auto\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<ThreadCount, E> {
                usize::try_from(v)
                    .map(ThreadCount::Fixed)
                    .map_err(|_| E::custom(format!("worker count {} is too large", v)))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<ThreadCount, E> {
                if v < 0 {
                    return Err(E::custom(format!("worker count {} is negative", v)));
                }
                self.visit_u64(v as u64)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<ThreadCount, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(ThreadCountVisitor)
    }
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            numbers: 100_000,
            thread_counts: [1, 2, 4, 8, 16].into_iter().map(ThreadCount::Fixed).collect(),
            max_iterations: None,
            queue_capacity: crate::collatz::pool::DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl Config {
    /// Load configuration from the default file (if present) and environment
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration from `path`, or the default file when `None`.
    ///
    /// An explicit path must exist; the default file is optional.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file {:?}: {}", path, e)))?;

        toml::from_str(&contents)
            .map_err(|e| Error::config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    /// Apply `CP_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup (the environment in production)
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(numbers) = lookup("CP_NUMBERS") {
            self.workload.numbers = numbers
                .parse()
                .map_err(|e| Error::config(format!("Invalid CP_NUMBERS: {}", e)))?;
        }

        if let Some(threads) = lookup("CP_THREADS") {
            self.workload.thread_counts = ThreadCount::parse_list(&threads)?;
        }

        if let Some(max_iterations) = lookup("CP_MAX_ITERATIONS") {
            self.workload.max_iterations = Some(
                max_iterations
                    .parse()
                    .map_err(|e| Error::config(format!("Invalid CP_MAX_ITERATIONS: {}", e)))?,
            );
        }

        if let Some(level) = lookup("CP_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(format) = lookup("CP_LOG_FORMAT") {
            self.logging.format = format.parse()?;
        }

        Ok(())
    }

    /// Validate configuration values.
    ///
    /// Zero `numbers` or a zero worker count are left for the aggregator to
    /// reject per run.
    pub fn validate(&self) -> Result<()> {
        if self.workload.thread_counts.is_empty() {
            return Err(Error::config("At least one worker count is required"));
        }

        if self.workload.queue_capacity == 0 {
            return Err(Error::config("Queue capacity must be at least 1"));
        }

        if self.workload.thread_counts.iter().any(|t| t.resolve() > 1024) {
            return Err(Error::config("Too many worker threads (maximum 1024)"));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => return Err(Error::config("Invalid log level")),
        }

        Ok(())
    }

    /// Worker counts of the sweep with `auto` resolved
    pub fn resolved_thread_counts(&self) -> Vec<usize> {
        self.workload.thread_counts.iter().map(|t| t.resolve()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.workload.numbers, 100_000);
        assert_eq!(config.resolved_thread_counts(), vec![1, 2, 4, 8, 16]);
        assert_eq!(config.workload.max_iterations, None);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.output.format, OutputFormat::Text);
        assert!(!config.metrics.enabled);
        config.validate().unwrap();
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[workload]
numbers = 500
thread_counts = [1, 3, "auto"]
max_iterations = 1000

[output]
format = "json"
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.workload.numbers, 500);
        assert_eq!(
            config.workload.thread_counts,
            vec![ThreadCount::Fixed(1), ThreadCount::Fixed(3), ThreadCount::Auto]
        );
        assert_eq!(config.workload.max_iterations, Some(1000));
        assert_eq!(config.output.format, OutputFormat::Json);
        // Untouched sections keep their defaults
        assert_eq!(config.logging, LoggingConfig::default());
        assert_eq!(config.workload.queue_capacity, crate::collatz::pool::DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = Config::default();
        config.workload.thread_counts.push(ThreadCount::Auto);
        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_negative_thread_count_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str("[workload]\nthread_counts = [-1]\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("/nonexistent/collatz-pool.toml").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("CP_NUMBERS", "42"),
            ("CP_THREADS", "2, 0 ,auto"),
            ("CP_MAX_ITERATIONS", "200"),
            ("CP_LOG_LEVEL", "debug"),
            ("CP_LOG_FORMAT", "full"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides_from(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.workload.numbers, 42);
        assert_eq!(
            config.workload.thread_counts,
            vec![ThreadCount::Fixed(2), ThreadCount::Fixed(0), ThreadCount::Auto]
        );
        assert_eq!(config.workload.max_iterations, Some(200));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Full);
        config.validate().unwrap();
    }

    #[test]
    fn test_bad_override() {
        let mut config = Config::default();
        let err = config
            .apply_overrides_from(|key| (key == "CP_NUMBERS").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate_rejects() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.workload.thread_counts.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.workload.queue_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.workload.thread_counts = vec![ThreadCount::Fixed(4096)];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_auto_resolves_to_cpus() {
        assert_eq!(ThreadCount::Auto.resolve(), num_cpus::get().max(1));
        assert_eq!("AUTO".parse::<ThreadCount>().unwrap(), ThreadCount::Auto);
        assert_eq!(ThreadCount::Fixed(8).to_string(), "8");
        assert!("x".parse::<ThreadCount>().is_err());
    }
}

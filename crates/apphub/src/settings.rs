//! Hub settings.
//!
//! Built once at startup from defaults, an optional YAML file and the
//! environment, then shared read-only as `Arc<Settings>`.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Models whose file references may be listed in `file.refs`.
pub const FILE_REF_MODELS: &[&str] = &["task", "task_report", "rule", "target"];

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("Invalid value '{value}' for environment variable {name}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("Settings validation failed: {message}")]
    Validation { message: String },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub hub: HubSettings,
    pub frequency: FrequencySettings,
    pub bucket: BucketSettings,
    pub file: FileSettings,
    pub encryption: EncryptionSettings,
    pub shutdown: ShutdownSettings,
    pub log: LogSettings,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HubSettings {
    pub db: DbSettings,
    pub bucket: PathSettings,
    pub file: PathSettings,
    pub task: TaskSettings,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            db: DbSettings::default(),
            bucket: PathSettings::under("bucket"),
            file: PathSettings::under("file"),
            task: TaskSettings::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DbSettings {
    pub path: PathBuf,
    pub seed_path: PathBuf,
}

impl Default for DbSettings {
    fn default() -> Self {
        Self {
            path: data_root().join("data").join("hub.db"),
            seed_path: data_root().join("seed"),
        }
    }
}

/// Root directory of a side-store.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub path: PathBuf,
}

impl PathSettings {
    fn under(name: &str) -> Self {
        Self {
            path: data_root().join(name),
        }
    }
}

impl Default for PathSettings {
    fn default() -> Self {
        Self::under("data")
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TaskSettings {
    pub reaper: TaskReaperSettings,
    pub pod: PodSettings,
}

/// Task release delays in minutes.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct TaskReaperSettings {
    pub created: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl Default for TaskReaperSettings {
    fn default() -> Self {
        Self {
            created: 4320,
            succeeded: 4320,
            failed: 43200,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PodSettings {
    pub retention: RetentionSettings,
}

/// Pod retention in minutes after the task terminates.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RetentionSettings {
    pub succeeded: u64,
    pub failed: u64,
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            succeeded: 1,
            failed: 4320,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FrequencySettings {
    /// Minutes between reaper cycles.
    pub reaper: u64,
    /// Seconds.
    pub metrics: u64,
    /// Minutes.
    pub volume: u64,
}

impl Default for FrequencySettings {
    fn default() -> Self {
        Self {
            reaper: 60,
            metrics: 30,
            volume: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BucketSettings {
    /// Orphan grace period in minutes.
    pub ttl: u64,
}

impl Default for BucketSettings {
    fn default() -> Self {
        Self { ttl: 1 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    /// Orphan grace period in minutes.
    pub ttl: u64,
    /// Models scanned for file references.
    pub refs: Vec<String>,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            ttl: 720,
            refs: FILE_REF_MODELS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EncryptionSettings {
    #[serde(deserialize_with = "secret_string")]
    pub passphrase: SecretString,
}

impl Default for EncryptionSettings {
    fn default() -> Self {
        Self {
            passphrase: SecretString::from("tackle".to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ShutdownSettings {
    /// Seconds to wait for runnables before giving up.
    pub timeout: u64,
}

impl Default for ShutdownSettings {
    fn default() -> Self {
        Self { timeout: 30 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub format: LogFormat,
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            level: "info".to_string(),
        }
    }
}

fn secret_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    let value = String::deserialize(deserializer)?;
    Ok(SecretString::from(value))
}

/// `~/.apphub`, or `./.apphub` without a home directory.
fn data_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".apphub")
}

impl Settings {
    /// Defaults, overlaid by the YAML file at `path` (when given), then by
    /// the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env(|name| std::env::var(name).ok())?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|e| SettingsError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    /// Parses a (possibly partial) YAML document. An empty document yields
    /// the defaults.
    pub fn from_yaml(content: &str) -> Result<Self, SettingsError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Applies environment overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = |name: &str, target: &mut PathBuf| {
            if let Some(value) = lookup(name) {
                *target = PathBuf::from(value);
            }
        };
        path("DB_PATH", &mut self.hub.db.path);
        path("DB_SEED_PATH", &mut self.hub.db.seed_path);
        path("BUCKET_PATH", &mut self.hub.bucket.path);
        path("FILE_PATH", &mut self.hub.file.path);

        let numbers: [(&'static str, &mut u64); 11] = [
            ("TASK_REAP_CREATED", &mut self.hub.task.reaper.created),
            ("TASK_REAP_SUCCEEDED", &mut self.hub.task.reaper.succeeded),
            ("TASK_REAP_FAILED", &mut self.hub.task.reaper.failed),
            ("TASK_POD_RETAIN_SUCCEEDED", &mut self.hub.task.pod.retention.succeeded),
            ("TASK_POD_RETAIN_FAILED", &mut self.hub.task.pod.retention.failed),
            ("FREQUENCY_REAPER", &mut self.frequency.reaper),
            ("FREQUENCY_METRICS", &mut self.frequency.metrics),
            ("FREQUENCY_VOLUME", &mut self.frequency.volume),
            ("BUCKET_TTL", &mut self.bucket.ttl),
            ("FILE_TTL", &mut self.file.ttl),
            ("SHUTDOWN_TIMEOUT", &mut self.shutdown.timeout),
        ];
        for (name, target) in numbers {
            if let Some(value) = lookup(name) {
                *target = parse_env(name, &value)?;
            }
        }

        if let Some(value) = lookup("ENCRYPTION_PASSPHRASE") {
            self.encryption.passphrase = SecretString::from(value);
        }
        if let Some(value) = lookup("LOG_FORMAT") {
            self.log.format = parse_env("LOG_FORMAT", &value)?;
        }
        if let Some(value) = lookup("LOG_LEVEL") {
            self.log.level = value;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.frequency.reaper == 0 {
            return Err(invalid("frequency.reaper must be greater than zero"));
        }
        if self.shutdown.timeout == 0 {
            return Err(invalid("shutdown.timeout must be greater than zero"));
        }
        if self.encryption.passphrase.expose_secret().trim().is_empty() {
            return Err(invalid("encryption.passphrase must not be empty"));
        }
        if let Some(unknown) = self
            .file
            .refs
            .iter()
            .find(|m| !FILE_REF_MODELS.contains(&m.as_str()))
        {
            return Err(invalid(format!(
                "file.refs names unknown model '{}' (expected one of {})",
                unknown,
                FILE_REF_MODELS.join(", ")
            )));
        }
        Ok(())
    }
}

fn parse_env<T: FromStr>(name: &'static str, value: &str) -> Result<T, SettingsError> {
    value.trim().parse().map_err(|_| SettingsError::InvalidEnv {
        name,
        value: value.to_string(),
    })
}

fn invalid(message: impl Into<String>) -> SettingsError {
    SettingsError::Validation {
        message: message.into(),
    }
}

//! Configuration module for the bucket adapter

use serde::Deserialize;
use config::{Config, ConfigError, Environment, File, Map};
use std::path::{Path, PathBuf};

/// Region used when none is configured
pub const DEFAULT_AREA: &str = "cn-hangzhou";

/// Main application settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub aliyun: AliyunSettings,
}

/// Aliyun OSS configuration for one bucket
#[derive(Clone, Deserialize)]
pub struct AliyunSettings {
    pub access_id: String,
    pub access_key: String,
    pub bucket: String,
    /// Region code, e.g. `cn-hangzhou`
    #[serde(default = "default_area")]
    pub area: String,
    /// Serve private objects through signed URLs
    #[serde(default)]
    pub private_read: bool,
    /// Upload and download through the intranet endpoint
    #[serde(default)]
    pub internal: bool,
    /// Public host override, must carry a scheme (`https://cdn.example.com`)
    #[serde(default)]
    pub host: Option<String>,
}

fn default_area() -> String {
    DEFAULT_AREA.to_string()
}

impl std::fmt::Debug for AliyunSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AliyunSettings")
            .field("access_id", &"<redacted>")
            .field("access_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("area", &self.area)
            .field("private_read", &self.private_read)
            .field("internal", &self.internal)
            .field("host", &self.host)
            .finish()
    }
}

impl AliyunSettings {
    /// Settings for `bucket` with every optional field at its default
    pub fn new(access_id: &str, access_key: &str, bucket: &str) -> Self {
        AliyunSettings {
            access_id: access_id.to_string(),
            access_key: access_key.to_string(),
            bucket: bucket.to_string(),
            area: default_area(),
            private_read: false,
            internal: false,
            host: None,
        }
    }

    /// The host public URLs are built on
    ///
    /// Falls back to the bucket's virtual-hosted OSS domain when no override is set.
    pub fn public_host(&self) -> String {
        self.host.clone().unwrap_or_else(|| {
            format!("https://{}.oss-{}.aliyuncs.com", self.bucket, self.area)
        })
    }

    /// Create from flat `ALIYUN_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create from `ALIYUN_*` variables resolved through `lookup`
    ///
    /// Flags accept `1`/`true`/`yes`/`on` and `0`/`false`/`no`/`off`, in any case.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name).ok_or_else(|| ConfigError::NotFound(name.to_string()))
        };
        let flag = |name: &str| match lookup(name) {
            Some(value) => parse_flag(name, &value),
            None => Ok(false),
        };

        Ok(AliyunSettings {
            access_id: required("ALIYUN_ACCESS_ID")?,
            access_key: required("ALIYUN_ACCESS_KEY")?,
            bucket: required("ALIYUN_BUCKET")?,
            area: lookup("ALIYUN_AREA").unwrap_or_else(default_area),
            private_read: flag("ALIYUN_PRIVATE_READ")?,
            internal: flag("ALIYUN_INTERNAL")?,
            host: lookup("ALIYUN_HOST"),
        })
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Message(format!(
            "{} must be a boolean flag, got {:?}",
            name, value
        ))),
    }
}

impl Settings {
    /// Load configuration from files and environment variables
    ///
    /// Files are read from `$CONFIG_PATH`, or `config/` when unset.
    ///
    /// Configuration priority (highest to lowest):
    /// 1. Environment variables (prefixed with CARRIERWAVE_)
    /// 2. config/local.toml (gitignored)
    /// 3. config/default.toml
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let dir = config_dir(std::env::var("CONFIG_PATH").ok());
        Self::load_from(&dir, None)
    }

    /// Load from the TOML files in `dir`, layered under `env`
    ///
    /// `env` stands in for the process environment when given.
    pub fn load_from(dir: &Path, env: Option<Map<String, String>>) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::from(dir.join("default.toml")).required(false))
            .add_source(File::from(dir.join("local.toml")).required(false))
            // CARRIERWAVE_ALIYUN__BUCKET, CARRIERWAVE_ALIYUN__PRIVATE_READ, etc.
            .add_source(
                Environment::with_prefix("CARRIERWAVE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            );

        builder.build()?.try_deserialize()
    }
}

fn config_dir(config_path: Option<String>) -> PathBuf {
    config_path
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config"))
}

//! Configuration system for the kxlink CLI.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use kxlink_core::{CodecConfig, DEFAULT_MAX_MESSAGE_SIZE, MAX_MESSAGE_SIZE_LIMIT, SessionConfig};
use kxlink_crypto::TAG_SIZE;
use kxlink_transport::TransportConfig;

/// kxlink configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Connection configuration
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Protocol limits
    #[serde(default)]
    pub protocol: ProtocolConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Server port used when none is given on the command line
    #[serde(default = "default_port")]
    pub port: u16,
    /// TCP connect timeout in seconds (0 waits for the OS timeout)
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Read/write deadline in seconds; unset blocks indefinitely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub io_timeout_secs: Option<u64>,
}

/// Protocol configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Largest ciphertext length accepted from the server, in bytes
    #[serde(default = "default_max_message_size")]
    pub max_message_size: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default values

fn default_port() -> u16 {
    kxlink_core::DEFAULT_PORT
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_message_size() -> u32 {
    DEFAULT_MAX_MESSAGE_SIZE
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            connect_timeout_secs: default_connect_timeout_secs(),
            io_timeout_secs: None,
        }
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_message_size: default_max_message_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, contents)?;
        Ok(())
    }

    /// Get default config path
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("kxlink/config.toml")
    }

    /// Load config from the default path, or fall back to defaults if there
    /// is no file
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load_or_default() -> anyhow::Result<Self> {
        let path = Self::default_path();

        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.connection.port == 0 {
            anyhow::bail!("Port must be between 1 and 65535");
        }

        if self.connection.io_timeout_secs == Some(0) {
            anyhow::bail!("I/O timeout must be at least 1 second (omit it to block indefinitely)");
        }

        let max = self.protocol.max_message_size;
        if (max as usize) < TAG_SIZE || max > MAX_MESSAGE_SIZE_LIMIT {
            anyhow::bail!(
                "Max message size must be between {} and {} bytes, got {}",
                TAG_SIZE,
                MAX_MESSAGE_SIZE_LIMIT,
                max
            );
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!(
                "Invalid log level: {}. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            );
        }

        Ok(())
    }

    /// Library settings for one client session
    #[must_use]
    pub fn to_session_config(&self) -> SessionConfig {
        let io_timeout = self.connection.io_timeout_secs.map(Duration::from_secs);
        let connect_timeout = match self.connection.connect_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        SessionConfig {
            transport: TransportConfig {
                connect_timeout,
                read_timeout: io_timeout,
                write_timeout: io_timeout,
                nodelay: true,
            },
            codec: CodecConfig::new(self.protocol.max_message_size),
        }
    }
}

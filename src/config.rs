use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub extractor: ExtractorConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Metadata tool binary, resolved via PATH.
    pub binary: String,
    /// Upper bound on one metadata fetch; the child is killed on expiry.
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            binary: "yt-dlp".to_string(),
            timeout_secs: 120,
        }
    }
}

impl Config {
    /// Read `config.toml`, falling back to defaults when the file is absent
    /// or empty. A `PORT` environment variable overrides the configured port.
    pub fn load() -> Result<Self, toml::de::Error> {
        let config_str = std::fs::read_to_string("config.toml").unwrap_or_default();
        let mut config: Config = if config_str.is_empty() {
            Config::default()
        } else {
            toml::from_str(&config_str)?
        };

        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            config.server.port = port;
        }

        Ok(config)
    }
}

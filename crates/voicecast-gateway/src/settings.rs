//! Gateway configuration. Loaded once at startup and handed to the router state; the core
//! library never reads the environment itself.
//!
//! | Key | Env | Default |
//! |-----|-----|---------|
//! | bind_addr | VOICECAST__BIND_ADDR | 0.0.0.0 |
//! | port | VOICECAST__PORT or PORT | 8080 |
//! | upload_dir | VOICECAST__UPLOAD_DIR | uploads |
//! | frame_rate | VOICECAST__FRAME_RATE | 30.0 |
//! | sample_rows | VOICECAST__SAMPLE_ROWS | 5 |
//! | max_upload_bytes | VOICECAST__MAX_UPLOAD_BYTES | 1 GiB |
//! | voice_api_base_url | VOICECAST__VOICE_API_BASE_URL | https://api.elevenlabs.io/v1 |
//! | voice_api_key | VOICECAST__VOICE_API_KEY or ELEVENLABS_API_KEY | unset |

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};
use serde::Deserialize;
use voicecast_core::{
    ImportOptions, TimecodeParser, TimelineResult, DEFAULT_FRAME_RATE, DEFAULT_SAMPLE_ROWS,
    ELEVENLABS_BASE_URL,
};

const DEFAULT_MAX_UPLOAD_BYTES: i64 = 1024 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub bind_addr: String,
    pub port: u16,
    /// Directory holding uploaded CSV and video files under generated names.
    pub upload_dir: String,
    /// Frames per second for `H:M:S:F` timecodes.
    pub frame_rate: f64,
    pub sample_rows: usize,
    pub max_upload_bytes: usize,
    pub voice_api_base_url: String,
    #[serde(default)]
    pub voice_api_key: Option<String>,
}

impl GatewayConfig {
    /// Load config from file and environment. Precedence: env > `VOICECAST_CONFIG` file
    /// (default `config/gateway.toml`, optional) > defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("VOICECAST_CONFIG").unwrap_or_else(|_| "config/gateway".to_string());

        let mut builder = defaults()?
            .add_source(config::File::with_name(&config_path).required(false))
            .add_source(config::Environment::with_prefix("VOICECAST").separator("__"));
        if let Some(port) = env_opt_string("PORT") {
            builder = builder.set_override("port", port)?;
        }

        let mut cfg: Self = builder.build()?.try_deserialize()?;
        cfg.voice_api_key = cfg
            .voice_api_key
            .take()
            .or_else(|| env_opt_string("ELEVENLABS_API_KEY"))
            .filter(|k| !k.trim().is_empty());
        Ok(cfg)
    }

    /// Defaults overlaid with an inline TOML document. No environment involved.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        defaults()?
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// Per-import settings for the core. Fails on a non-positive frame rate.
    pub fn import_options(&self) -> TimelineResult<ImportOptions> {
        Ok(ImportOptions {
            parser: TimecodeParser::new(self.frame_rate)?,
            sample_rows: self.sample_rows.max(1),
        })
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    config::Config::builder()
        .set_default("bind_addr", "0.0.0.0")?
        .set_default("port", 8080_i64)?
        .set_default("upload_dir", "uploads")?
        .set_default("frame_rate", DEFAULT_FRAME_RATE)?
        .set_default("sample_rows", DEFAULT_SAMPLE_ROWS as i64)?
        .set_default("max_upload_bytes", DEFAULT_MAX_UPLOAD_BYTES)?
        .set_default("voice_api_base_url", ELEVENLABS_BASE_URL)
}

fn env_opt_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

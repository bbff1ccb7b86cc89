//! Runtime configuration for the CertiMate server.
//!
//! Values are merged with figment, highest precedence first:
//! 1. `CERTIMATE_*` environment variables (`__` separates sections,
//!    e.g. `CERTIMATE_SERVER__PORT=9000`)
//! 2. `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET`
//! 3. `certimate.toml` in the working directory
//! 4. Built-in defaults

use crate::error::{ApiError, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

const CONFIG_FILE_NAME: &str = "certimate.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub sessions: SessionConfig,
    pub render: RenderConfig,
    pub google: GoogleConfig,
    pub email: EmailConfig,
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogLevel(pub String);

impl Default for LogLevel {
    fn default() -> Self {
        Self("info".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum JSON body size in bytes.
    pub json_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            json_limit: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    pub database_path: PathBuf,
    pub max_upload_size: usize,
    /// Uploads remembered per session and kind.
    pub upload_history_limit: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            database_path: PathBuf::from("certimate.sqlite"),
            max_upload_size: 50 * 1024 * 1024,
            upload_history_limit: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 24 * 60 * 60,
            sweep_interval_secs: 600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub fonts_dir: PathBuf,
    pub font_family: String,
    pub min_font_size: u32,
    /// Rows handed to the rayon pool at a time.
    pub chunk_size: usize,
    pub pdf_dpi: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fonts_dir: PathBuf::from("fonts"),
            font_family: "LiberationSans".to_string(),
            min_font_size: 8,
            chunk_size: 64,
            pdf_dpi: 150.0,
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    #[serde(alias = "google_client_id")]
    pub client_id: String,
    #[serde(alias = "google_client_secret")]
    pub client_secret: String,
    pub token_url: String,
    pub gmail_api_base: String,
    pub redirect_uri: String,
    pub timeout_secs: u64,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            gmail_api_base: "https://gmail.googleapis.com".to_string(),
            redirect_uri: "postmessage".to_string(),
            timeout_secs: 30,
        }
    }
}

impl GoogleConfig {
    pub fn is_configured(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.client_secret.trim().is_empty()
    }
}

impl fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("token_url", &self.token_url)
            .field("gmail_api_base", &self.gmail_api_base)
            .field("redirect_uri", &self.redirect_uri)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// Recipients processed per send request; 0 disables the limit.
    pub batch_limit: usize,
    pub default_subject: String,
    pub default_body: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            batch_limit: 10,
            default_subject: "Your Certificate is Ready!".to_string(),
            default_body: "Hi {{name}},\n\nCongratulations! Your certificate is attached.\n\nBest regards,\nThe CertiMate Team".to_string(),
        }
    }
}

impl Settings {
    /// Loads settings from defaults, `certimate.toml` and the environment.
    pub fn load() -> Result<Self> {
        Self::figment(Toml::file(CONFIG_FILE_NAME)).extract::<Settings>().map_err(ApiError::from)?.validated()
    }

    fn figment(file: figment::providers::Data<Toml>) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(file)
            .merge(
                Env::raw()
                    .only(&["GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET"])
                    .map(|key| {
                        let key = key.as_str().to_ascii_lowercase();
                        let field = key.trim_start_matches("google_").to_string();
                        format!("google.{}", field).into()
                    }),
            )
            .merge(Env::prefixed("CERTIMATE_").split("__"))
    }

    fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(ApiError::config("server.port must be non-zero"));
        }
        if self.storage.upload_dir.as_os_str().is_empty() {
            return Err(ApiError::config("storage.upload_dir must not be empty"));
        }
        if self.storage.max_upload_size == 0 {
            return Err(ApiError::config("storage.max_upload_size must be non-zero"));
        }
        if self.sessions.ttl_secs == 0 {
            return Err(ApiError::config("sessions.ttl_secs must be non-zero"));
        }
        if self.sessions.sweep_interval_secs == 0 {
            return Err(ApiError::config(
                "sessions.sweep_interval_secs must be non-zero",
            ));
        }
        if self.render.chunk_size == 0 {
            return Err(ApiError::config("render.chunk_size must be non-zero"));
        }
        if self.render.min_font_size == 0 {
            return Err(ApiError::config("render.min_font_size must be non-zero"));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}

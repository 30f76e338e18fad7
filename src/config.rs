//! Layered configuration: defaults, config file, environment, CLI.

use clap::{Parser, ValueEnum};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::transport::{DEFAULT_CHAT_PATH, DEFAULT_TIMEOUT_SECS};
use crate::widget::{DEFAULT_ERROR_TEXT, DEFAULT_PLACEHOLDER_TEXT, WidgetOptions};

/// Config file looked up in the working directory when none is given.
const DEFAULT_CONFIG_NAME: &str = "wanderwise";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Base URL of the chat backend
    #[arg(long, env = "CHAT_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "CHAT_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub endpoint: EndpointConfig,
    pub widget: WidgetOptions,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EndpointConfig {
    pub base_url: String,
    pub chat_path: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn as_str(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    /// Priority: CLI flag (or its env var) > `WANDERWISE_*` env > config file > defaults.
    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("endpoint.base_url", "http://127.0.0.1:5001")?
            .set_default("endpoint.chat_path", DEFAULT_CHAT_PATH)?
            .set_default("endpoint.timeout_secs", DEFAULT_TIMEOUT_SECS)?
            .set_default("widget.placeholder_text", DEFAULT_PLACEHOLDER_TEXT)?
            .set_default("widget.error_text", DEFAULT_ERROR_TEXT)?
            .set_default("widget.on_failure", "error_bubble")?
            .set_default("logging.format", LogFormat::Pretty.as_str())?
            .set_default("logging.filter", "info")?;

        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_NAME).required(false)),
        };

        // E.g. WANDERWISE_ENDPOINT__BASE_URL=http://localhost:8080
        builder = builder.add_source(
            Environment::with_prefix("WANDERWISE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(endpoint) = cli.endpoint {
            builder = builder.set_override("endpoint.base_url", endpoint)?;
        }
        if let Some(timeout) = cli.timeout_secs {
            builder = builder.set_override("endpoint.timeout_secs", timeout)?;
        }
        if let Some(format) = cli.log_format {
            builder = builder.set_override("logging.format", format.as_str())?;
        }

        builder.build()?.try_deserialize()
    }
}

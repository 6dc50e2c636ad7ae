//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{num::NonZeroUsize, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::domain::changes::{DEFAULT_SENSITIVE_FIELDS, SensitiveFields};
use crate::purge::{DEFAULT_DELETE_MENU_FLAG, DEFAULT_STAGE_PARAM, DEFAULT_STAGE_VALUE};

mod cli;

pub use cli::{
    CliArgs, Command, DispatchArgs, EventArg, PlanArgs, PurgeOverrides, StageUrlArgs,
    TransportOverrides,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "edgepurge";
const DEFAULT_TRANSPORT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_URLS_PER_REQUEST: u64 = 30;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub purge: PurgeSettings,
    pub transport: TransportSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct PurgeSettings {
    pub enabled: bool,
    pub sensitive_fields: SensitiveFields,
    pub delete_menu_flag: String,
    pub stage_param: String,
    pub stage_value: String,
    pub base_url: Option<Url>,
}

#[derive(Debug, Clone)]
pub struct TransportSettings {
    /// Webhook endpoint; `None` selects the dry-run transport.
    pub endpoint: Option<Url>,
    pub timeout: Duration,
    pub max_urls_per_request: NonZeroUsize,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix("EDGEPURGE")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("purge.sensitive_fields")
            .try_parsing(true),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match &cli.command {
        Command::Plan(args) => raw.apply_purge_overrides(&args.overrides),
        Command::Dispatch(args) => {
            raw.apply_purge_overrides(&args.plan.overrides);
            raw.apply_transport_overrides(&args.transport);
        }
        Command::StageUrl(args) => raw.apply_purge_overrides(&args.overrides),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    purge: RawPurgeSettings,
    transport: RawTransportSettings,
}

impl RawSettings {
    fn apply_purge_overrides(&mut self, overrides: &PurgeOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(base_url) = overrides.base_url.as_ref() {
            self.purge.base_url = Some(base_url.clone());
        }
        if let Some(param) = overrides.stage_param.as_ref() {
            self.purge.stage_param = Some(param.clone());
        }
        if let Some(value) = overrides.stage_value.as_ref() {
            self.purge.stage_value = Some(value.clone());
        }
        if !overrides.sensitive_fields.is_empty() {
            self.purge.sensitive_fields = Some(overrides.sensitive_fields.clone());
        }
        if let Some(flag) = overrides.delete_menu_flag.as_ref() {
            self.purge.delete_menu_flag = Some(flag.clone());
        }
    }

    fn apply_transport_overrides(&mut self, overrides: &TransportOverrides) {
        if let Some(endpoint) = overrides.endpoint.as_ref() {
            self.transport.endpoint = Some(endpoint.clone());
        }
        if let Some(seconds) = overrides.timeout_seconds {
            self.transport.timeout_seconds = Some(seconds);
        }
        if let Some(max) = overrides.max_urls_per_request {
            self.transport.max_urls_per_request = Some(max);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            purge,
            transport,
        } = raw;

        let logging = build_logging_settings(logging)?;
        let purge = build_purge_settings(purge)?;
        let transport = build_transport_settings(transport)?;

        Ok(Self {
            logging,
            purge,
            transport,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_purge_settings(purge: RawPurgeSettings) -> Result<PurgeSettings, LoadError> {
    let sensitive_fields = match purge.sensitive_fields {
        Some(fields) => {
            let fields: Vec<String> = fields
                .into_iter()
                .map(|field| field.trim().to_string())
                .collect();
            if fields.iter().any(String::is_empty) {
                return Err(LoadError::invalid(
                    "purge.sensitive_fields",
                    "field names must not be empty",
                ));
            }
            SensitiveFields::new(fields)
        }
        None => SensitiveFields::new(DEFAULT_SENSITIVE_FIELDS),
    };

    let delete_menu_flag = non_empty(
        purge.delete_menu_flag,
        DEFAULT_DELETE_MENU_FLAG,
        "purge.delete_menu_flag",
    )?;
    let stage_param = non_empty(purge.stage_param, DEFAULT_STAGE_PARAM, "purge.stage_param")?;
    let stage_value = non_empty(purge.stage_value, DEFAULT_STAGE_VALUE, "purge.stage_value")?;

    let base_url = purge
        .base_url
        .map(|value| parse_http_url(&value, "purge.base_url"))
        .transpose()?;

    Ok(PurgeSettings {
        enabled: purge.enabled.unwrap_or(true),
        sensitive_fields,
        delete_menu_flag,
        stage_param,
        stage_value,
        base_url,
    })
}

fn build_transport_settings(
    transport: RawTransportSettings,
) -> Result<TransportSettings, LoadError> {
    let endpoint = transport
        .endpoint
        .and_then(|value| {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .map(|value| parse_http_url(&value, "transport.endpoint"))
        .transpose()?;

    let timeout_secs = transport
        .timeout_seconds
        .unwrap_or(DEFAULT_TRANSPORT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "transport.timeout_seconds",
            "must be greater than zero",
        ));
    }

    let max_urls = transport
        .max_urls_per_request
        .unwrap_or(DEFAULT_MAX_URLS_PER_REQUEST);
    let max_urls_per_request = usize::try_from(max_urls)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| {
            LoadError::invalid(
                "transport.max_urls_per_request",
                "must be greater than zero and fit in usize",
            )
        })?;

    Ok(TransportSettings {
        endpoint,
        timeout: Duration::from_secs(timeout_secs),
        max_urls_per_request,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPurgeSettings {
    enabled: Option<bool>,
    sensitive_fields: Option<Vec<String>>,
    delete_menu_flag: Option<String>,
    stage_param: Option<String>,
    stage_value: Option<String>,
    base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawTransportSettings {
    endpoint: Option<String>,
    timeout_seconds: Option<u64>,
    max_urls_per_request: Option<u64>,
}

fn non_empty(value: Option<String>, default: &str, key: &'static str) -> Result<String, LoadError> {
    let value = value.unwrap_or_else(|| default.to_string());
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LoadError::invalid(key, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn parse_http_url(value: &str, key: &'static str) -> Result<Url, LoadError> {
    let url = Url::parse(value.trim())
        .map_err(|err| LoadError::invalid(key, format!("invalid URL `{value}`: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(key, "scheme must be http or https"));
    }
    Ok(url)
}

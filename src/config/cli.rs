use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint, builder::BoolishValueParser};

use crate::purge::EventKind;

/// Command-line arguments for the edgepurge binary.
#[derive(Debug, Parser)]
#[command(
    name = "edgepurge",
    version,
    about = "Decide and submit CDN purges for content lifecycle events"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "EDGEPURGE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Print the purge decision and request for an event without sending it.
    Plan(PlanArgs),
    /// Compute the purge for an event and submit it through the transport.
    Dispatch(DispatchArgs),
    /// Print the stage variant of each URL.
    #[command(name = "stage-url")]
    StageUrl(StageUrlArgs),
}

/// Lifecycle moment named on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EventArg {
    PrePublish,
    PostWrite,
    PostDelete,
}

impl From<EventArg> for EventKind {
    fn from(value: EventArg) -> Self {
        match value {
            EventArg::PrePublish => EventKind::PrePublish,
            EventArg::PostWrite => EventKind::PostWrite,
            EventArg::PostDelete => EventKind::PostDelete,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct PlanArgs {
    /// Lifecycle event to evaluate.
    #[arg(long, value_enum)]
    pub event: EventArg,

    #[command(flatten)]
    pub overrides: PurgeOverrides,

    /// Event document (JSON); `-` reads stdin.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct DispatchArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    #[command(flatten)]
    pub transport: TransportOverrides,
}

#[derive(Debug, Args, Clone)]
pub struct StageUrlArgs {
    #[command(flatten)]
    pub overrides: PurgeOverrides,

    /// URLs to rewrite.
    #[arg(value_name = "URL", required = true)]
    pub urls: Vec<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct PurgeOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Site origin used to make purge URLs absolute.
    #[arg(long = "base-url", value_name = "URL")]
    pub base_url: Option<String>,

    /// Query parameter that selects the stage rendering.
    #[arg(long = "stage-param", value_name = "NAME")]
    pub stage_param: Option<String>,

    /// Value of the stage query parameter.
    #[arg(long = "stage-value", value_name = "VALUE")]
    pub stage_value: Option<String>,

    /// Navigation-sensitive field; repeat to list several. Replaces the configured set.
    #[arg(long = "sensitive-field", value_name = "FIELD")]
    pub sensitive_fields: Vec<String>,

    /// Field read on delete to decide whether the object was shown in menus.
    #[arg(long = "delete-menu-flag", value_name = "FIELD")]
    pub delete_menu_flag: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct TransportOverrides {
    /// Purge webhook endpoint. Without one, purges are only logged.
    #[arg(long = "endpoint", env = "EDGEPURGE_ENDPOINT", value_name = "URL")]
    pub endpoint: Option<String>,

    /// Override the transport request timeout.
    #[arg(long = "timeout-seconds", value_name = "SECONDS")]
    pub timeout_seconds: Option<u64>,

    /// Override the maximum number of URLs per purge request.
    #[arg(long = "max-urls-per-request", value_name = "COUNT")]
    pub max_urls_per_request: Option<u64>,
}

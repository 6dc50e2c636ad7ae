use std::{process, sync::Arc};

use edgepurge::{
    application::{
        error::AppError,
        ports::{PurgeTransport, TracingNoticeSink},
    },
    config::{self, Command, DispatchArgs, PlanArgs, Settings, StageUrlArgs},
    domain::types::{PurgeDecision, PurgeRequest},
    infra::{
        fixture::EventDocument,
        telemetry,
        transport::{LogTransport, WebhookTransport},
    },
    purge::{
        EventKind, PreparedPurge, PurgeConfig, PurgeOutcome, PurgeTrigger, SkipReason,
        StageVariant,
    },
};
use serde::Serialize;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    let chain = error.chain();
    if dispatcher::has_been_set() {
        error!(error = %error, chain = ?chain, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, chain = ?chain, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;

    match cli_args.command {
        Command::Plan(args) => run_plan(&settings, args).await,
        Command::Dispatch(args) => run_dispatch(&settings, args).await,
        Command::StageUrl(args) => run_stage_url(&settings, &args),
    }
}

#[derive(Debug, Serialize)]
struct PlanReport {
    event: EventKind,
    object_id: String,
    received_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    skipped: Option<SkipReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    decision: Option<PurgeDecision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    request: Option<PurgeRequest>,
}

impl From<&PreparedPurge> for PlanReport {
    fn from(prepared: &PreparedPurge) -> Self {
        let event = prepared.event();
        let (skipped, decision, request) = match prepared {
            PreparedPurge::Skipped { reason, .. } => (Some(*reason), None, None),
            PreparedPurge::Planned { plan, .. } => {
                (None, Some(plan.decision), Some(plan.request.clone()))
            }
        };
        Self {
            event: event.kind,
            object_id: event.object_id.to_string(),
            received_at: event.received_at(),
            skipped,
            decision,
            request,
        }
    }
}

#[derive(Debug, Serialize)]
struct DispatchReport {
    event: EventKind,
    object_id: String,
    received_at: String,
    #[serde(flatten)]
    outcome: PurgeOutcome,
}

fn build_trigger(
    settings: &Settings,
    document: &EventDocument,
    transport: Arc<dyn PurgeTransport>,
) -> PurgeTrigger {
    let collaborators = document.collaborators(transport, Arc::new(TracingNoticeSink));
    PurgeTrigger::new(PurgeConfig::from(&settings.purge), collaborators)
}

async fn run_plan(settings: &Settings, args: PlanArgs) -> Result<(), AppError> {
    let document = EventDocument::load(&args.file).await?;
    let trigger = build_trigger(settings, &document, Arc::new(LogTransport));

    let prepared = trigger.prepare(args.event.into(), &document.object).await;
    print_json(&PlanReport::from(&prepared))
}

async fn run_dispatch(settings: &Settings, args: DispatchArgs) -> Result<(), AppError> {
    let document = EventDocument::load(&args.plan.file).await?;

    let transport: Arc<dyn PurgeTransport> = match &settings.transport.endpoint {
        Some(endpoint) => {
            let webhook = WebhookTransport::new(endpoint.clone(), &settings.transport)?;
            info!(endpoint = %webhook.endpoint(), "Using webhook purge transport");
            Arc::new(webhook)
        }
        None => {
            info!("No purge endpoint configured; using dry-run transport");
            Arc::new(LogTransport)
        }
    };
    let trigger = build_trigger(settings, &document, transport);

    let prepared = trigger
        .prepare(args.plan.event.into(), &document.object)
        .await;
    let event = prepared.event().clone();
    let outcome = trigger.dispatch(prepared).await;
    print_json(&DispatchReport {
        event: event.kind,
        object_id: event.object_id.to_string(),
        received_at: event.received_at(),
        outcome,
    })
}

fn run_stage_url(settings: &Settings, args: &StageUrlArgs) -> Result<(), AppError> {
    let variant = StageVariant::new(&settings.purge.stage_param, &settings.purge.stage_value);
    for url in &args.urls {
        println!("{}", variant.to_stage_variant(url));
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

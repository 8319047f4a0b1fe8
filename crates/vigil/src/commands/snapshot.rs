use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use clap::ArgMatches;
use tracing::{error, info};

use vigil_core::render::{WriterOutput, dashboard_panels};
use vigil_core::sinks::{Dispatch, SinkKey, SinkList};
use vigil_core::{
    DashboardData, DashboardEndpoint, ErrorSink, HttpTransport, PollOutcome, PollingController,
    QueryParams, SinkError, VigilConfig,
};

use super::helpers::{load_config, runtime};

/// Keeps the last failure message so it can become the command's error.
#[derive(Default)]
struct LastError(Mutex<Option<String>>);

impl LastError {
    fn take(&self) -> Option<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

impl ErrorSink for LastError {
    fn show_error(&self, message: &str) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(message.to_string());
    }

    fn clear_error(&self, _refreshed_at: DateTime<Utc>) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

pub fn handle_snapshot_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(matches)?;
    let json = matches.get_flag("json");

    info!(
        event = "cli.snapshot_started",
        base_url = config.server.base_url(),
        symbol = config.dashboard.symbol(),
        json = json
    );

    runtime()?.block_on(snapshot(&config, json))
}

async fn snapshot(config: &VigilConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let captured: Arc<Mutex<Option<DashboardData>>> = Arc::new(Mutex::new(None));
    let sinks: Arc<dyn Dispatch<DashboardData>> = if json {
        let slot = captured.clone();
        Arc::new(SinkList::<DashboardData>::new(SinkKey::Dashboard).with(
            move |data: &DashboardData| -> Result<(), SinkError> {
                *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(data.clone());
                Ok(())
            },
        ))
    } else {
        Arc::new(dashboard_panels(Arc::new(WriterOutput::stdout())))
    };
    let errors = Arc::new(LastError::default());

    let controller = PollingController::builder(
        DashboardEndpoint,
        Arc::new(HttpTransport::new()?),
        sinks,
    )
    .base_url(config.server.base_url())
    .policy(config.dashboard.retry_policy())
    .params(QueryParams::symbol(config.dashboard.symbol()))
    .error_sink(errors.clone())
    .build();

    match controller.poll_once().await {
        PollOutcome::Failed { kind, attempts } => {
            let message = errors
                .take()
                .unwrap_or_else(|| format!("Dashboard poll failed ({})", kind));
            error!(
                event = "cli.snapshot_failed",
                kind = %kind,
                attempts = attempts,
                message = %message
            );
            return Err(message.into());
        }
        PollOutcome::Skipped => return Err("Dashboard poll was already running".into()),
        PollOutcome::Succeeded { report, .. } => {
            info!(
                event = "cli.snapshot_completed",
                delivered = report.delivered.len(),
                sink_failures = report.failures.len()
            );
        }
    }

    if json {
        let data = captured
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .unwrap_or_default();
        println!("{}", serde_json::to_string_pretty(&data)?);
    }

    Ok(())
}

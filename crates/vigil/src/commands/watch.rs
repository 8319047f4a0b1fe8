use std::sync::Arc;

use clap::ArgMatches;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use vigil_core::config::is_valid_symbol;
use vigil_core::render::WriterOutput;
use vigil_core::{DashboardApp, DashboardSinkSet, HttpTransport, PNL_CHART_ID, VigilConfig};

use super::helpers::{load_config, runtime};

const PERIOD_USAGE: &str = "Usage: period <24h|7d|30d> or period <chart> <period>";

/// One line typed while watching.
#[derive(Debug, PartialEq, Eq)]
enum WatchInput {
    Refresh,
    Quit,
    Period { chart_id: String, period: String },
    Symbol(String),
    /// Not a command; the message says why.
    Rejected(String),
}

impl WatchInput {
    fn parse(line: &str) -> Self {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => WatchInput::Refresh,
            ["quit" | "exit"] => WatchInput::Quit,
            ["period", period] => WatchInput::Period {
                chart_id: PNL_CHART_ID.to_string(),
                period: period.to_string(),
            },
            ["period", chart_id, period] => WatchInput::Period {
                chart_id: chart_id.to_string(),
                period: period.to_string(),
            },
            ["period", ..] => WatchInput::Rejected(PERIOD_USAGE.to_string()),
            [symbol] if is_valid_symbol(symbol) => WatchInput::Symbol(symbol.to_uppercase()),
            _ => WatchInput::Rejected(format!(
                "Not a symbol or command: '{}' (try ETHUSDT, period 7d, quit)",
                line.trim()
            )),
        }
    }
}

pub fn handle_watch_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(matches)?;

    info!(
        event = "cli.watch_started",
        base_url = config.server.base_url(),
        symbol = config.dashboard.symbol(),
        charts = config.charts.enabled()
    );

    runtime()?.block_on(watch(&config))?;

    info!(event = "cli.watch_completed");
    Ok(())
}

async fn watch(config: &VigilConfig) -> Result<(), Box<dyn std::error::Error>> {
    let app = Arc::new(DashboardApp::new(
        config,
        Arc::new(HttpTransport::new()?),
        DashboardSinkSet::panels(Arc::new(WriterOutput::stdout())),
    ));

    println!(
        "Watching {} on {} (Enter to refresh, type a symbol to switch, Ctrl-C to quit)",
        app.symbol(),
        config.server.base_url()
    );

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    // A failed first load is already on screen; keep polling regardless.
    tokio::select! {
        _ = &mut ctrl_c => {
            app.stop();
            return Ok(());
        }
        _ = app.start() => {}
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match WatchInput::parse(&line) {
                    WatchInput::Quit => break,
                    WatchInput::Rejected(message) => {
                        warn!(event = "cli.watch_input_rejected", input = %line.trim());
                        eprintln!("{}", message);
                    }
                    input => handle_input(&app, input),
                },
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!(event = "cli.watch_stdin_failed", error = %e);
                    stdin_open = false;
                }
            },
        }
    }

    app.stop();
    Ok(())
}

fn handle_input(app: &Arc<DashboardApp>, input: WatchInput) {
    info!(event = "cli.watch_input", input = ?input);
    let app = app.clone();
    tokio::spawn(async move {
        match input {
            WatchInput::Refresh => {
                let _ = futures::join!(app.refresh(), app.refresh_charts());
            }
            WatchInput::Period { chart_id, period } => {
                if app.select_chart_period(&chart_id, &period).await.is_none() {
                    warn!(
                        event = "cli.watch_chart_unavailable",
                        chart_id = %chart_id,
                        period = %period
                    );
                    eprintln!("Chart '{}' is not available (charts off or unknown id)", chart_id);
                }
            }
            WatchInput::Symbol(symbol) => {
                app.select_symbol(&symbol).await;
            }
            WatchInput::Quit | WatchInput::Rejected(_) => {}
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(chart_id: &str, period: &str) -> WatchInput {
        WatchInput::Period {
            chart_id: chart_id.to_string(),
            period: period.to_string(),
        }
    }

    #[test]
    fn test_parse_watch_input() {
        assert_eq!(WatchInput::parse(""), WatchInput::Refresh);
        assert_eq!(WatchInput::parse("   "), WatchInput::Refresh);
        assert_eq!(WatchInput::parse("quit"), WatchInput::Quit);
        assert_eq!(WatchInput::parse("period 7d"), period("pnl", "7d"));
        assert_eq!(
            WatchInput::parse("period performance 30d"),
            period("performance", "30d")
        );
        assert_eq!(
            WatchInput::parse(" btcusdt "),
            WatchInput::Symbol("BTCUSDT".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_what_is_not_a_symbol() {
        assert_eq!(
            WatchInput::parse("period"),
            WatchInput::Rejected(PERIOD_USAGE.to_string())
        );
        assert!(matches!(
            WatchInput::parse("period pnl 7d extra"),
            WatchInput::Rejected(_)
        ));
        assert!(matches!(WatchInput::parse("eth/usdt"), WatchInput::Rejected(_)));
        assert!(matches!(WatchInput::parse("show me"), WatchInput::Rejected(_)));
        assert!(matches!(WatchInput::parse("?"), WatchInput::Rejected(_)));
    }
}

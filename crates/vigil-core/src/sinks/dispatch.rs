//! Fan-out of a fetched payload to its render sinks.
//!
//! Every sink runs inside its own failure boundary: an error return or a
//! panic is recorded in the [`DispatchReport`] and the remaining sinks still
//! run. Dispatch itself never fails.

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use serde::Serialize;
use tracing::{debug, error};

use crate::api::types::{AccountSnapshot, DashboardData, MarketData, PnlSummary, Position, Trade};
use crate::sinks::errors::SinkError;
use crate::sinks::traits::RenderSink;

/// Routes a payload of type `P` to the sinks registered for it.
pub trait Dispatch<P: ?Sized>: Send + Sync {
    fn dispatch(&self, payload: &P) -> DispatchReport;
}

/// Identifies which sink a dispatch entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKey {
    /// The whole dashboard payload
    Dashboard,
    Account,
    Positions,
    Trades,
    Pnl,
    Market,
    PnlSeries,
    TradingStats,
}

impl SinkKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkKey::Dashboard => "dashboard",
            SinkKey::Account => "account",
            SinkKey::Positions => "positions",
            SinkKey::Trades => "trades",
            SinkKey::Pnl => "pnl",
            SinkKey::Market => "market",
            SinkKey::PnlSeries => "pnl_series",
            SinkKey::TradingStats => "trading_stats",
        }
    }
}

impl fmt::Display for SinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct SinkFailure {
    pub sink: SinkKey,
    pub error: SinkError,
}

/// What happened to each sink during one dispatch.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Sinks that rendered successfully (one entry per sink invocation)
    pub delivered: Vec<SinkKey>,
    /// Sub-fields absent from the payload, or present with no sink registered
    pub skipped: Vec<SinkKey>,
    pub failures: Vec<SinkFailure>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_sinks(&self) -> Vec<SinkKey> {
        self.failures.iter().map(|f| f.sink).collect()
    }
}

/// Run one sink inside a failure boundary and record the result.
pub(crate) fn deliver<T: ?Sized>(
    key: SinkKey,
    sink: &dyn RenderSink<T>,
    value: &T,
    report: &mut DispatchReport,
) {
    let result = match catch_unwind(AssertUnwindSafe(|| sink.render(value))) {
        Ok(result) => result,
        Err(payload) => Err(SinkError::Panicked {
            message: panic_message(payload.as_ref()),
        }),
    };

    match result {
        Ok(()) => {
            debug!(event = "core.sink.rendered", sink = key.as_str());
            report.delivered.push(key);
        }
        Err(e) => {
            error!(
                event = "core.sink.failed",
                sink = key.as_str(),
                error = %e
            );
            report.failures.push(SinkFailure { sink: key, error: e });
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn route<T: ?Sized>(
    key: SinkKey,
    sink: &Option<Box<dyn RenderSink<T>>>,
    value: Option<&T>,
    report: &mut DispatchReport,
) {
    match (sink, value) {
        (Some(sink), Some(value)) => deliver(key, sink.as_ref(), value, report),
        _ => report.skipped.push(key),
    }
}

/// Sinks for the dashboard payload, keyed by sub-field.
///
/// Each sub-field present in the payload goes to its sink. Absent
/// sub-fields are skipped; an empty list is present and is dispatched.
#[derive(Default)]
pub struct DashboardSinks {
    account: Option<Box<dyn RenderSink<AccountSnapshot>>>,
    positions: Option<Box<dyn RenderSink<[Position]>>>,
    trades: Option<Box<dyn RenderSink<[Trade]>>>,
    pnl: Option<Box<dyn RenderSink<PnlSummary>>>,
    market: Option<Box<dyn RenderSink<MarketData>>>,
}

impl DashboardSinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(mut self, sink: impl RenderSink<AccountSnapshot> + 'static) -> Self {
        self.account = Some(Box::new(sink));
        self
    }

    pub fn positions(mut self, sink: impl RenderSink<[Position]> + 'static) -> Self {
        self.positions = Some(Box::new(sink));
        self
    }

    pub fn trades(mut self, sink: impl RenderSink<[Trade]> + 'static) -> Self {
        self.trades = Some(Box::new(sink));
        self
    }

    pub fn pnl(mut self, sink: impl RenderSink<PnlSummary> + 'static) -> Self {
        self.pnl = Some(Box::new(sink));
        self
    }

    pub fn market(mut self, sink: impl RenderSink<MarketData> + 'static) -> Self {
        self.market = Some(Box::new(sink));
        self
    }
}

impl fmt::Debug for DashboardSinks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DashboardSinks")
            .field("account", &self.account.is_some())
            .field("positions", &self.positions.is_some())
            .field("trades", &self.trades.is_some())
            .field("pnl", &self.pnl.is_some())
            .field("market", &self.market.is_some())
            .finish()
    }
}

impl Dispatch<DashboardData> for DashboardSinks {
    fn dispatch(&self, data: &DashboardData) -> DispatchReport {
        let mut report = DispatchReport::default();
        route(SinkKey::Account, &self.account, data.account.as_ref(), &mut report);
        route(SinkKey::Positions, &self.positions, data.positions.as_deref(), &mut report);
        route(SinkKey::Trades, &self.trades, data.recent_trades.as_deref(), &mut report);
        route(SinkKey::Pnl, &self.pnl, data.pnl_analysis.as_ref(), &mut report);
        route(SinkKey::Market, &self.market, data.market_data.as_ref(), &mut report);
        report
    }
}

/// Any number of sinks receiving the whole payload under one key.
pub struct SinkList<T: ?Sized> {
    key: SinkKey,
    sinks: Vec<Box<dyn RenderSink<T>>>,
}

impl<T: ?Sized> SinkList<T> {
    pub fn new(key: SinkKey) -> Self {
        Self {
            key,
            sinks: Vec::new(),
        }
    }

    pub fn with(mut self, sink: impl RenderSink<T> + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl<T: ?Sized> fmt::Debug for SinkList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkList")
            .field("key", &self.key)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl<T: ?Sized> Dispatch<T> for SinkList<T> {
    fn dispatch(&self, payload: &T) -> DispatchReport {
        let mut report = DispatchReport::default();
        if self.sinks.is_empty() {
            report.skipped.push(self.key);
        }
        for sink in &self.sinks {
            deliver(self.key, sink.as_ref(), payload, &mut report);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::Side;
    use std::sync::{Arc, Mutex};

    fn sample_data() -> DashboardData {
        DashboardData {
            account: Some(AccountSnapshot {
                total_balance: Some(1000.5),
                ..AccountSnapshot::default()
            }),
            positions: Some(Vec::new()),
            recent_trades: Some(vec![Trade {
                symbol: "ETHUSDT".to_string(),
                side: Side::Buy,
                exec_price: 2500.0,
                exec_qty: 0.1,
                exec_time: None,
            }]),
            pnl_analysis: None,
            market_data: None,
        }
    }

    #[test]
    fn test_absent_fields_are_skipped_and_empty_lists_delivered() {
        let positions_seen = Arc::new(Mutex::new(None));
        let seen = positions_seen.clone();
        let sinks = DashboardSinks::new()
            .positions(move |positions: &[Position]| -> Result<(), SinkError> {
                *seen.lock().unwrap() = Some(positions.len());
                Ok(())
            })
            .pnl(|_: &PnlSummary| -> Result<(), SinkError> { panic!("pnl is absent") });

        let report = sinks.dispatch(&sample_data());

        assert_eq!(*positions_seen.lock().unwrap(), Some(0));
        assert_eq!(report.delivered, vec![SinkKey::Positions]);
        assert_eq!(
            report.skipped,
            vec![SinkKey::Account, SinkKey::Trades, SinkKey::Pnl, SinkKey::Market]
        );
        assert!(report.is_clean());
    }

    #[test]
    fn test_failing_and_panicking_sinks_do_not_stop_siblings() {
        let trades_seen = Arc::new(Mutex::new(0));
        let seen = trades_seen.clone();
        let sinks = DashboardSinks::new()
            .account(|_: &AccountSnapshot| -> Result<(), SinkError> {
                panic!("account widget exploded")
            })
            .positions(|_: &[Position]| -> Result<(), SinkError> {
                Err(SinkError::render("container missing"))
            })
            .trades(move |trades: &[Trade]| -> Result<(), SinkError> {
                *seen.lock().unwrap() += trades.len();
                Ok(())
            });

        let report = sinks.dispatch(&sample_data());

        assert_eq!(*trades_seen.lock().unwrap(), 1);
        assert_eq!(report.delivered, vec![SinkKey::Trades]);
        assert_eq!(
            report.failed_sinks(),
            vec![SinkKey::Account, SinkKey::Positions]
        );
        match &report.failures[0].error {
            SinkError::Panicked { message } => assert_eq!(message, "account widget exploded"),
            other => panic!("expected panic failure, got {other:?}"),
        }
    }

    #[test]
    fn test_sink_list_delivers_to_every_sink() {
        let count = Arc::new(Mutex::new(0));
        let first = count.clone();
        let second = count.clone();
        let list = SinkList::<String>::new(SinkKey::PnlSeries)
            .with(move |_: &String| -> Result<(), SinkError> {
                *first.lock().unwrap() += 1;
                Ok(())
            })
            .with(move |_: &String| -> Result<(), SinkError> {
                *second.lock().unwrap() += 1;
                Ok(())
            });

        let report = list.dispatch(&"payload".to_string());

        assert_eq!(*count.lock().unwrap(), 2);
        assert_eq!(report.delivered.len(), 2);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_empty_sink_list_reports_skip() {
        let list = SinkList::<u32>::new(SinkKey::TradingStats);
        let report = list.dispatch(&7);
        assert_eq!(report.skipped, vec![SinkKey::TradingStats]);
        assert!(report.delivered.is_empty());
    }
}

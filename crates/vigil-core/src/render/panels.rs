//! Text panels for each dashboard payload.
//!
//! The `*_lines` functions are pure; [`TextPanel`] turns one of them into a
//! render sink writing to a [`PanelOutput`].

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::api::types::{
    AccountSnapshot, MarketData, PnlSeries, PnlSummary, Position, Side, Trade, TradingStats,
};
use crate::render::format::{
    MarginLevel, PnlTone, clock, currency, percent, quantity, signed_percent, sparkline,
    volume_millions,
};
use crate::render::output::PanelOutput;
use crate::sinks::{DashboardSinks, ErrorSink, RenderSink, SinkError, SinkKey, SinkList};

pub const ACCOUNT: &str = "Account";
pub const POSITIONS: &str = "Positions";
pub const TRADES: &str = "Recent trades";
pub const PNL: &str = "PnL";
pub const MARKET: &str = "Market";
pub const PNL_CHART: &str = "PnL chart";
pub const PERFORMANCE: &str = "Performance";
pub const STATUS: &str = "Status";

pub fn account_lines(account: &AccountSnapshot) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(total) = account.total_balance {
        lines.push(format!("Balance: {}", currency(total)));
    }
    if let Some(available) = account.available_balance {
        lines.push(format!("Available: {}", currency(available)));
    }
    if let Some(ratio) = account.margin_ratio {
        lines.push(format!(
            "Margin ratio: {} ({})",
            percent(ratio),
            MarginLevel::classify(ratio)
        ));
    }
    if let Some(pnl) = account.daily_pnl {
        lines.push(format!(
            "Daily PnL: {} {}",
            PnlTone::of(pnl).marker(),
            currency(pnl)
        ));
    }
    lines
}

pub fn position_lines(positions: &[Position]) -> Vec<String> {
    if positions.is_empty() {
        return vec!["No open positions".to_string()];
    }

    positions
        .iter()
        .map(|p| {
            let roe = p
                .roe_percent()
                .map(percent)
                .unwrap_or_else(|| "n/a".to_string());
            format!(
                "{} {} {} | Entry {} | Mark {} | PnL {} {} | ROE {}",
                p.symbol,
                p.side.as_str(),
                quantity(p.size),
                currency(p.avg_price),
                currency(p.mark_price),
                PnlTone::of(p.unrealised_pnl).marker(),
                currency(p.unrealised_pnl),
                roe
            )
        })
        .collect()
}

pub fn trade_lines(trades: &[Trade]) -> Vec<String> {
    if trades.is_empty() {
        return vec!["No recent trades".to_string()];
    }

    trades
        .iter()
        .map(|t| {
            let at = t
                .exec_time
                .map(clock)
                .unwrap_or_else(|| "--:--:--".to_string());
            let marker = match t.side {
                Side::Buy => '+',
                Side::Sell => '-',
                Side::Unknown => ' ',
            };
            format!(
                "{} {} {} {} {} @ {}",
                at,
                marker,
                t.symbol,
                t.side.as_str(),
                quantity(t.exec_qty),
                currency(t.exec_price)
            )
        })
        .collect()
}

pub fn pnl_lines(pnl: &PnlSummary) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(total) = pnl.total_pnl {
        lines.push(format!(
            "Total PnL: {} {}",
            PnlTone::of(total).marker(),
            currency(total)
        ));
    }
    if let Some(win_rate) = pnl.win_rate {
        lines.push(format!("Win rate: {:.1}%", win_rate));
    }
    if let Some(total_trades) = pnl.total_trades {
        lines.push(format!("Total trades: {}", total_trades));
    }
    lines
}

pub fn market_lines(market: &MarketData) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(price) = market.price {
        lines.push(format!("Price: {}", currency(price)));
    }
    if let Some(change) = market.price_change_24h {
        lines.push(format!("24h change: {}", signed_percent(change)));
    }
    if let Some(volume) = market.volume_24h {
        lines.push(format!("24h volume: {}", volume_millions(volume)));
    }
    lines
}

pub fn pnl_series_lines(series: &PnlSeries) -> Vec<String> {
    match (series.last(), series.high(), series.low()) {
        (Some(last), Some(high), Some(low)) => {
            let span = match (series.labels.first(), series.labels.last()) {
                (Some(first), Some(end)) => format!(" ({} - {})", first, end),
                _ => String::new(),
            };
            vec![
                format!(
                    "Last {} | High {} | Low {}",
                    currency(last),
                    currency(high),
                    currency(low)
                ),
                format!("{}{}", sparkline(&series.values), span),
            ]
        }
        _ => vec!["No PnL data".to_string()],
    }
}

pub fn trading_stats_lines(stats: &TradingStats) -> Vec<String> {
    let mut lines = vec![format!(
        "Wins {:.1}% | Losses {:.1}%",
        stats.win_rate,
        stats.loss_rate()
    )];
    if let Some(total) = stats.total_trades {
        lines.push(format!("Trades: {}", total));
    }
    lines
}

/// Render sink writing the lines built by `build` under a fixed title.
pub struct TextPanel<T: ?Sized> {
    title: &'static str,
    build: fn(&T) -> Vec<String>,
    output: Arc<dyn PanelOutput>,
}

impl<T: ?Sized> TextPanel<T> {
    pub fn new(
        title: &'static str,
        build: fn(&T) -> Vec<String>,
        output: Arc<dyn PanelOutput>,
    ) -> Self {
        Self {
            title,
            build,
            output,
        }
    }
}

impl<T: ?Sized> fmt::Debug for TextPanel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextPanel")
            .field("title", &self.title)
            .finish()
    }
}

impl<T: ?Sized> RenderSink<T> for TextPanel<T> {
    fn render(&self, value: &T) -> Result<(), SinkError> {
        self.output.write_panel(self.title, &(self.build)(value))
    }
}

/// Text panels for every dashboard sub-field.
pub fn dashboard_panels(output: Arc<dyn PanelOutput>) -> DashboardSinks {
    DashboardSinks::new()
        .account(TextPanel::new(ACCOUNT, account_lines, output.clone()))
        .positions(TextPanel::new(POSITIONS, position_lines, output.clone()))
        .trades(TextPanel::new(TRADES, trade_lines, output.clone()))
        .pnl(TextPanel::new(PNL, pnl_lines, output.clone()))
        .market(TextPanel::new(MARKET, market_lines, output))
}

pub fn pnl_chart_panel(output: Arc<dyn PanelOutput>) -> SinkList<PnlSeries> {
    SinkList::new(SinkKey::PnlSeries).with(TextPanel::new(PNL_CHART, pnl_series_lines, output))
}

pub fn performance_panel(output: Arc<dyn PanelOutput>) -> SinkList<TradingStats> {
    SinkList::new(SinkKey::TradingStats).with(TextPanel::new(
        PERFORMANCE,
        trading_stats_lines,
        output,
    ))
}

/// Error sink showing the error banner and "Last updated" line.
#[derive(Clone)]
pub struct StatusPanel {
    output: Arc<dyn PanelOutput>,
}

impl StatusPanel {
    pub fn new(output: Arc<dyn PanelOutput>) -> Self {
        Self { output }
    }

    fn write(&self, line: String) {
        if let Err(e) = self.output.write_panel(STATUS, &[line]) {
            warn!(event = "core.sink.status_write_failed", error = %e);
        }
    }
}

impl ErrorSink for StatusPanel {
    fn show_error(&self, message: &str) {
        self.write(format!("Error: {}", message));
    }

    fn clear_error(&self, refreshed_at: DateTime<Utc>) {
        self.write(format!("Last updated: {}", clock(refreshed_at)));
    }
}

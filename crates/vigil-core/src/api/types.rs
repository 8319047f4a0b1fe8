//! Payload types delivered to render sinks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::flex;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "Buy",
            Side::Sell => "Sell",
            Side::Unknown => "?",
        }
    }
}

/// Balances and margin state of the trading account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    #[serde(default, deserialize_with = "flex::opt_number")]
    pub total_balance: Option<f64>,
    #[serde(default, deserialize_with = "flex::opt_number")]
    pub available_balance: Option<f64>,
    /// Margin in use as a percentage of equity
    #[serde(default, deserialize_with = "flex::opt_number")]
    pub margin_ratio: Option<f64>,
    #[serde(default, deserialize_with = "flex::opt_number")]
    pub daily_pnl: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    #[serde(default)]
    pub side: Side,
    #[serde(default, deserialize_with = "flex::number")]
    pub size: f64,
    #[serde(default, deserialize_with = "flex::number")]
    pub avg_price: f64,
    #[serde(default, deserialize_with = "flex::number")]
    pub mark_price: f64,
    #[serde(default, deserialize_with = "flex::number")]
    pub unrealised_pnl: f64,
    #[serde(default, deserialize_with = "flex::number")]
    pub position_value: f64,
}

impl Position {
    /// Return on equity in percent, `None` when the position has no value.
    pub fn roe_percent(&self) -> Option<f64> {
        if self.position_value == 0.0 {
            None
        } else {
            Some(self.unrealised_pnl / self.position_value * 100.0)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: String,
    #[serde(default)]
    pub side: Side,
    #[serde(default, deserialize_with = "flex::number")]
    pub exec_price: f64,
    #[serde(default, deserialize_with = "flex::number")]
    pub exec_qty: f64,
    #[serde(default, deserialize_with = "flex::opt_timestamp")]
    pub exec_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PnlSummary {
    #[serde(default, deserialize_with = "flex::opt_number")]
    pub total_pnl: Option<f64>,
    #[serde(default, deserialize_with = "flex::opt_number")]
    pub win_rate: Option<f64>,
    #[serde(default, deserialize_with = "flex::opt_count")]
    pub total_trades: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    #[serde(default, deserialize_with = "flex::opt_number")]
    pub price: Option<f64>,
    /// 24h change in percent
    #[serde(default, deserialize_with = "flex::opt_number")]
    pub price_change_24h: Option<f64>,
    /// 24h volume in quote currency
    #[serde(default, deserialize_with = "flex::opt_number")]
    pub volume_24h: Option<f64>,
}

/// Everything the dashboard endpoint returns for one symbol.
///
/// Every sub-field is optional; the dispatcher skips the ones that are
/// absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    #[serde(default)]
    pub account: Option<AccountSnapshot>,
    #[serde(default)]
    pub positions: Option<Vec<Position>>,
    #[serde(default)]
    pub recent_trades: Option<Vec<Trade>>,
    #[serde(default)]
    pub pnl_analysis: Option<PnlSummary>,
    #[serde(default)]
    pub market_data: Option<MarketData>,
}

/// Cumulative PnL line: one value per label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PnlSeries {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default, deserialize_with = "flex::number_seq")]
    pub values: Vec<f64>,
}

impl PnlSeries {
    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }

    pub fn high(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    pub fn low(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradingStats {
    #[serde(default, deserialize_with = "flex::number")]
    pub win_rate: f64,
    #[serde(default, deserialize_with = "flex::opt_count")]
    pub total_trades: Option<u64>,
    #[serde(default, deserialize_with = "flex::opt_count")]
    pub winning_trades: Option<u64>,
    #[serde(default, deserialize_with = "flex::opt_count")]
    pub losing_trades: Option<u64>,
}

impl TradingStats {
    pub fn loss_rate(&self) -> f64 {
        100.0 - self.win_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_data_accepts_strings_and_numbers() {
        let json = r#"{
            "account": {"total_balance": 1000.5, "available_balance": "750.25", "margin_ratio": ""},
            "positions": [{
                "symbol": "ETHUSDT", "side": "Buy", "size": "0.5",
                "avg_price": "2400", "mark_price": 2500,
                "unrealised_pnl": "50", "position_value": "1250"
            }],
            "recent_trades": [],
            "market_data": {"price": "2500.1", "price_change_24h": -1.5, "volume_24h": 123456789}
        }"#;

        let data: DashboardData = serde_json::from_str(json).unwrap();

        let account = data.account.unwrap();
        assert_eq!(account.total_balance, Some(1000.5));
        assert_eq!(account.available_balance, Some(750.25));
        assert_eq!(account.margin_ratio, None);
        assert_eq!(account.daily_pnl, None);

        let positions = data.positions.unwrap();
        assert_eq!(positions[0].side, Side::Buy);
        assert_eq!(positions[0].size, 0.5);
        assert_eq!(positions[0].roe_percent(), Some(4.0));

        assert_eq!(data.recent_trades, Some(Vec::new()));
        assert!(data.pnl_analysis.is_none());
        assert_eq!(data.market_data.unwrap().price, Some(2500.1));
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let result: Result<AccountSnapshot, _> =
            serde_json::from_str(r#"{"total_balance": "lots"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_trade_time_formats() {
        let millis: Trade =
            serde_json::from_str(r#"{"symbol": "BTCUSDT", "exec_time": "1700000000000"}"#).unwrap();
        let rfc: Trade =
            serde_json::from_str(r#"{"symbol": "BTCUSDT", "exec_time": "2023-11-14T22:13:20Z"}"#)
                .unwrap();
        let plain: Trade =
            serde_json::from_str(r#"{"symbol": "BTCUSDT", "exec_time": "2023-11-14 22:13:20"}"#)
                .unwrap();

        assert!(millis.exec_time.is_some());
        assert_eq!(millis.exec_time, rfc.exec_time);
        assert_eq!(rfc.exec_time, plain.exec_time);
        assert_eq!(millis.side, Side::Unknown);
    }

    #[test]
    fn test_unknown_side_and_zero_value_position() {
        let position: Position =
            serde_json::from_str(r#"{"symbol": "SOLUSDT", "side": "None"}"#).unwrap();
        assert_eq!(position.side, Side::Unknown);
        assert_eq!(position.roe_percent(), None);
    }

    #[test]
    fn test_pnl_series_extremes() {
        let series: PnlSeries =
            serde_json::from_str(r#"{"labels": ["a", "b", "c"], "values": [1.5, "-2", 3]}"#)
                .unwrap();
        assert_eq!(series.last(), Some(3.0));
        assert_eq!(series.high(), Some(3.0));
        assert_eq!(series.low(), Some(-2.0));
        assert_eq!(PnlSeries::default().last(), None);
    }

    #[test]
    fn test_loss_rate_complements_win_rate() {
        let stats: TradingStats = serde_json::from_str(r#"{"win_rate": 62.5}"#).unwrap();
        assert_eq!(stats.loss_rate(), 37.5);
        assert_eq!(TradingStats::default().loss_rate(), 100.0);
    }
}

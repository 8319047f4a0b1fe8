//! Terminal rendering of dashboard payloads.

pub mod format;
pub mod output;
pub mod panels;

pub use output::{CapturedPanel, MemoryOutput, PanelOutput, WriterOutput};
pub use panels::{StatusPanel, TextPanel, dashboard_panels, performance_panel, pnl_chart_panel};

pub mod dispatch;
pub mod errors;
pub mod traits;

pub use dispatch::{DashboardSinks, Dispatch, DispatchReport, SinkFailure, SinkKey, SinkList};
pub use errors::SinkError;
pub use traits::{ErrorSink, LogErrorSink, RenderSink};

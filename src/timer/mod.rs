/// Session timer
///
/// A stopwatch hosted in a background task that keeps running when no client
/// is attached, the indicator it keeps posted, and the controller clients
/// use to drive it.

pub mod controller;
pub mod format;
pub mod indicator;
pub mod service;
pub mod session;

pub use controller::SessionController;
pub use format::format_elapsed;
pub use indicator::{Indicator, Notification, RecordingIndicator, TracingIndicator};
pub use service::{ServiceHost, DEFAULT_SESSION_LABEL};
pub use session::{SessionState, Stopwatch};

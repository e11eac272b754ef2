pub mod alerts;
pub mod notifier;
pub mod poll_loop;

pub use alerts::{dispatch, DispatchReport};
pub use notifier::{AlertSink, Notifier};
pub use poll_loop::run_poll_loop;

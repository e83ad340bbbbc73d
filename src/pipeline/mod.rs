//! The monitoring engine.
//!
//! - `Monitor`: polling loop, probe then audit on a changed total
//! - `ChangeDetector` / `AuditGuard`: diffing and the empty-fetch guard
//! - `NotificationDispatcher`: alerts, webhook and pinned summary
//! - `CommandListener`: `/start` and `/check` over long polling
//! - `supervise`: bounded restarts for long-running tasks
//! - `serve`: monitor and listener together until shutdown

pub mod commands;
pub mod diff;
pub mod dispatch;
pub mod guard;
pub mod messages;
pub mod monitor;
pub mod service;
pub mod state;
pub mod supervisor;

pub use commands::{Command, CommandHandler, CommandListener, UpdateSource};
pub use diff::{Audit, ChangeDetector};
pub use dispatch::{DispatchSummary, NotificationDispatcher, WebhookOutcome, send_product};
pub use guard::{AuditGuard, GuardResult};
pub use monitor::{CycleOutcome, Monitor};
pub use service::serve;
pub use state::MonitorState;
pub use supervisor::{RetryPolicy, supervise};

//! Review Watch
//!
//! Polls the homework review API, detects review status changes, and
//! forwards them to a Telegram chat.

pub mod api;
pub mod config;
pub mod error;
pub mod notifier;
pub mod poll_loop;
pub mod response;
pub mod verdict;

pub use api::{ApiClient, HomeworkSource};
pub use config::{load_env_file, Config, Credentials, RETRY_PERIOD};
pub use error::{Disposition, Result, WatchError};
pub use notifier::{Notifier, TelegramNotifier};
pub use poll_loop::{CycleOutcome, PollLoop, ReportState, ALERT_PREFIX};
pub use response::check_response;
pub use verdict::{parse_status, HomeworkStatus, HomeworkUpdate};

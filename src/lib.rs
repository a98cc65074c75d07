pub mod app;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod engine;
pub mod epoch;
pub mod errors;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod rewards;
pub mod state;
pub mod stats;
pub mod ui;

pub use app::router;
pub use catalog::Catalog;
pub use config::Config;
pub use engine::{PointsEngine, ToggleOutcome};
pub use errors::{LedgerError, LedgerResult};
pub use ledger::Ledger;
pub use state::AppState;

//! Message-driven front end: typed chat commands executed against the engine.
//!
//! Parsing and delivery belong to the chat transport; this module only turns a
//! resolved command into engine calls and a reply.

use crate::catalog::DEFAULT_SEARCH_LIMIT;
use crate::engine::PointsEngine;
use crate::errors::{LedgerError, LedgerResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

/// Who sent the command. The transport decides `is_admin` (e.g. a role check).
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Complete { activity_id: String },
    Uncomplete { activity_id: String },
    Balance,
    SetBalance { amount: i64 },
    Total,
    SetVip { vip: bool },
    ToggleEvent { enabled: bool },
    EventStatus,
    Help,
    /// Autocomplete source: open activities for `Complete`, finished ones for `Uncomplete`.
    Suggest { query: String, completed: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub text: String,
    /// Visible only to the caller.
    pub ephemeral: bool,
    pub suggestions: Vec<Suggestion>,
}

impl Reply {
    fn private(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ephemeral: true,
            suggestions: Vec::new(),
        }
    }

    fn public(text: impl Into<String>) -> Self {
        Self {
            ephemeral: false,
            ..Self::private(text)
        }
    }
}

/// Rejections (unknown activity, bad amount) become replies; storage failures
/// are returned so the transport can report a generic error.
pub fn execute(
    engine: &PointsEngine,
    caller: &Caller,
    command: Command,
    now: DateTime<Utc>,
) -> LedgerResult<Reply> {
    match dispatch(engine, caller, command, now) {
        Err(LedgerError::ActivityNotFound(_)) => Ok(Reply::private("Activity not found!")),
        Err(LedgerError::Validation(message)) => Ok(Reply::private(message)),
        other => other,
    }
}

fn dispatch(
    engine: &PointsEngine,
    caller: &Caller,
    command: Command,
    now: DateTime<Utc>,
) -> LedgerResult<Reply> {
    let user = caller.user_id.as_str();
    match command {
        Command::Complete { activity_id } => {
            let name = engine.activity(&activity_id)?.name.clone();
            let outcome = engine.toggle(user, &activity_id, true, now)?;
            if outcome.bp_delta == 0 {
                return Ok(Reply::private(format!(
                    "Activity \"{name}\" is already completed today!"
                )));
            }
            let event_note = if outcome.event_applied { " (x2 event)" } else { "" };
            Ok(Reply::private(format!(
                "Activity \"{name}\" marked as completed!\n+{} BP{event_note}\nCurrent balance: {} BP",
                outcome.bp_delta, outcome.new_balance
            )))
        }
        Command::Uncomplete { activity_id } => {
            let name = engine.activity(&activity_id)?.name.clone();
            let outcome = engine.toggle(user, &activity_id, false, now)?;
            if outcome.bp_delta == 0 {
                return Ok(Reply::private(format!("Activity \"{name}\" was not completed!")));
            }
            Ok(Reply::private(format!(
                "Activity \"{name}\" marked as not completed.\n{} BP\nCurrent balance: {} BP",
                outcome.bp_delta, outcome.new_balance
            )))
        }
        Command::Balance => {
            let stats = engine.stats(user, now)?;
            let mut text = format!(
                "Balance: {} BP\nVIP: {}",
                stats.balance,
                on_off(stats.vip)
            );
            if stats.event_active {
                text.push_str("\nEvent: x2 BP active!");
            }
            Ok(Reply::private(text))
        }
        Command::SetBalance { amount } => {
            let balance = engine.set_balance(user, amount)?;
            Ok(Reply::private(format!("Balance set: {balance} BP")))
        }
        Command::Total => {
            let stats = engine.stats(user, now)?;
            let mut text = format!(
                "Earned today: {} BP\nCurrent balance: {} BP\nActivities completed: {}/{}\nVIP: {}",
                stats.total_earned,
                stats.balance,
                stats.completed_count,
                stats.total_activities,
                on_off(stats.vip)
            );
            if stats.event_active {
                text.push_str("\nx2 event is active!");
            }
            Ok(Reply::private(text))
        }
        Command::SetVip { vip } => {
            engine.set_vip(user, vip)?;
            Ok(Reply::private(format!(
                "VIP status {}",
                if vip { "activated" } else { "deactivated" }
            )))
        }
        Command::ToggleEvent { enabled } => {
            if !caller.is_admin {
                warn!(user, "non-admin attempted to toggle the double BP event");
                return Ok(Reply::private("You do not have permission to use this command!"));
            }
            engine.set_event_active(enabled)?;
            info!(user, enabled, "double BP event toggled from chat");
            Ok(Reply::public(format!(
                "Double BP event {}! All bonus points are now multiplied by {}.",
                if enabled { "ACTIVATED" } else { "DEACTIVATED" },
                if enabled { 2 } else { 1 }
            )))
        }
        Command::EventStatus => {
            let text = if engine.ledger().get_event_active()? {
                "Double BP event: ACTIVE\nAll activities award twice the bonus points!"
            } else {
                "Double BP event: INACTIVE"
            };
            Ok(Reply::private(text))
        }
        Command::Help => Ok(Reply::private(help_text(engine, caller.is_admin))),
        Command::Suggest { query, completed } => {
            let done = engine.ledger().completed_activities(user, engine.day_of(now))?;
            let suggestions = engine
                .catalog()
                .search(&query, engine.catalog().len())
                .into_iter()
                .filter(|activity| done.contains(&activity.id) == completed)
                .take(DEFAULT_SEARCH_LIMIT)
                .map(|activity| Suggestion {
                    id: activity.id.clone(),
                    label: format!(
                        "{} ({}/{} BP)",
                        activity.name, activity.base_reward, activity.vip_reward
                    ),
                })
                .collect();
            Ok(Reply {
                suggestions,
                ..Reply::private("")
            })
        }
    }
}

fn help_text(engine: &PointsEngine, is_admin: bool) -> String {
    let mut text = String::from(
        "Activities\n\
         /complete <activity> - mark an activity as completed (adds BP)\n\
         /uncomplete <activity> - undo a completion (refunds BP)\n\
         \n\
         Balance\n\
         /balance - show your BP balance\n\
         /setbalance <amount> - set your BP balance\n\
         /total - today's earnings and your balance\n\
         \n\
         Settings\n\
         /setvip <true|false> - turn VIP status on or off\n\
         /eventstatus - check the x2 BP event\n",
    );
    if is_admin {
        text.push_str("\nAdmin\n/toggleevent <true|false> - turn the x2 BP event on or off\n");
    }
    let schedule = engine.schedule();
    text.push_str(&format!(
        "\nVIP doubles activity rewards and the x2 event doubles them again.\n\
         Balance carries over between days; activities reset daily at {:02}:00 (UTC{}).",
        schedule.hour(),
        schedule.offset()
    ));
    text
}

fn on_off(flag: bool) -> &'static str {
    if flag { "active" } else { "inactive" }
}

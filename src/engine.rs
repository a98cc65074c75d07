use crate::catalog::{ActivityDefinition, Catalog};
use crate::epoch::ResetSchedule;
use crate::errors::{LedgerError, LedgerResult};
use crate::ledger::Ledger;
use crate::rewards::reward;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToggleOutcome {
    pub new_balance: i64,
    /// Signed BP actually applied; zero when the activity was already in the requested state.
    pub bp_delta: i64,
    /// Whether the double BP event multiplied the amount credited by this call.
    pub event_applied: bool,
}

/// The single entry point both front ends use to read and mutate points state.
pub struct PointsEngine {
    ledger: Ledger,
    catalog: Catalog,
    schedule: ResetSchedule,
}

impl PointsEngine {
    pub fn new(ledger: Ledger, catalog: Catalog, schedule: ResetSchedule) -> Self {
        Self {
            ledger,
            catalog,
            schedule,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn schedule(&self) -> ResetSchedule {
        self.schedule
    }

    pub fn day_of(&self, now: DateTime<Utc>) -> NaiveDate {
        self.schedule.current_day(now)
    }

    pub fn activity(&self, activity_id: &str) -> LedgerResult<&ActivityDefinition> {
        self.catalog
            .get(activity_id)
            .ok_or_else(|| LedgerError::ActivityNotFound(activity_id.to_string()))
    }

    /// Move an activity into the requested completion state for the activity
    /// day containing `now`, crediting or refunding BP in the same transaction.
    ///
    /// Completing banks the reward under the VIP and event flags read at this
    /// instant. Uncompleting refunds exactly what was banked, whatever the flags
    /// are now.
    pub fn toggle(
        &self,
        user_id: &str,
        activity_id: &str,
        completed: bool,
        now: DateTime<Utc>,
    ) -> LedgerResult<ToggleOutcome> {
        let day = self.day_of(now);
        let activity = self.activity(activity_id)?;

        let outcome = self.ledger.write(|tx| {
            let existing = tx.completion(user_id, &activity.id, day)?;
            match (existing, completed) {
                (Some(_), true) | (None, false) => Ok(ToggleOutcome {
                    new_balance: tx.balance(user_id)?,
                    bp_delta: 0,
                    event_applied: false,
                }),
                (None, true) => {
                    let event_active = tx.event_active()?;
                    let amount = reward(activity, tx.vip(user_id)?, event_active);
                    tx.insert_completion(user_id, &activity.id, day, now, amount)?;
                    Ok(ToggleOutcome {
                        new_balance: tx.adjust_balance(user_id, amount)?,
                        bp_delta: amount,
                        event_applied: event_active,
                    })
                }
                (Some(record), false) => {
                    tx.delete_completion(user_id, &activity.id, day)?;
                    let refund = -record.bp_awarded;
                    Ok(ToggleOutcome {
                        new_balance: tx.adjust_balance(user_id, refund)?,
                        bp_delta: refund,
                        event_applied: false,
                    })
                }
            }
        })?;

        if outcome.bp_delta == 0 {
            debug!(user_id, activity_id, completed, %day, "toggle was a no-op");
        } else {
            info!(
                user_id,
                activity_id,
                %day,
                bp_delta = outcome.bp_delta,
                new_balance = outcome.new_balance,
                "activity toggled"
            );
        }
        Ok(outcome)
    }

    pub fn set_balance(&self, user_id: &str, amount: i64) -> LedgerResult<i64> {
        self.ledger.set_balance(user_id, amount)
    }

    pub fn set_vip(&self, user_id: &str, vip: bool) -> LedgerResult<bool> {
        self.ledger.set_vip(user_id, vip)
    }

    /// Callers are expected to have passed their own admin check first.
    pub fn set_event_active(&self, active: bool) -> LedgerResult<bool> {
        self.ledger.set_event_active(active)
    }
}

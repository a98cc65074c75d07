use crate::catalog::ActivityDefinition;

pub const EVENT_MULTIPLIER: i64 = 2;

/// BP awarded for one completion. The VIP rate already carries its own
/// doubling; the event multiplier stacks on top of whichever rate applies.
pub fn reward(activity: &ActivityDefinition, vip: bool, event_active: bool) -> i64 {
    let base = if vip {
        activity.vip_reward
    } else {
        activity.base_reward
    };
    base * event_multiplier(event_active)
}

pub fn event_multiplier(event_active: bool) -> i64 {
    if event_active { EVENT_MULTIPLIER } else { 1 }
}

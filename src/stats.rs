use crate::catalog::Catalog;
use crate::engine::PointsEngine;
use crate::errors::LedgerResult;
use crate::ledger::UserSnapshot;
use crate::rewards::reward;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub balance: i64,
    pub vip: bool,
    pub event_active: bool,
    pub completed_count: usize,
    pub total_activities: usize,
    pub total_earned: i64,
    pub total_remaining: i64,
    pub progress_percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BpValues {
    pub activities: BTreeMap<String, i64>,
    pub total_earned: i64,
    pub total_remaining: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityView {
    pub id: String,
    pub name: String,
    pub base_reward: i64,
    pub vip_reward: i64,
    pub completed: bool,
    pub bp_value: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    pub name: String,
    pub activities: Vec<ActivityView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub date: String,
    pub stats: UserStats,
    pub completed_activities: Vec<String>,
    pub categories: Vec<CategoryView>,
}

impl PointsEngine {
    pub fn stats(&self, user_id: &str, now: DateTime<Utc>) -> LedgerResult<UserStats> {
        self.stats_for_day(user_id, self.day_of(now))
    }

    pub fn stats_for_day(&self, user_id: &str, day: NaiveDate) -> LedgerResult<UserStats> {
        let snapshot = self.ledger().snapshot(user_id, day)?;
        Ok(build_stats(self.catalog(), &snapshot))
    }

    pub fn activity_bp_values(&self, user_id: &str, now: DateTime<Utc>) -> LedgerResult<BpValues> {
        let snapshot = self.ledger().snapshot(user_id, self.day_of(now))?;
        Ok(build_bp_values(self.catalog(), &snapshot))
    }

    pub fn dashboard(&self, user_id: &str, now: DateTime<Utc>) -> LedgerResult<Dashboard> {
        let day = self.day_of(now);
        let snapshot = self.ledger().snapshot(user_id, day)?;
        Ok(build_dashboard(self.catalog(), day, &snapshot))
    }
}

/// Earned/remaining are a live estimate under the current flags, not the
/// amounts actually banked at completion time.
pub fn build_stats(catalog: &Catalog, snapshot: &UserSnapshot) -> UserStats {
    let values = build_bp_values(catalog, snapshot);
    let total_activities = catalog.len();
    // Rows for activities retired from the catalog stay in history but do not count.
    let completed_count = snapshot
        .completed
        .iter()
        .filter(|id| catalog.get(id).is_some())
        .count();

    UserStats {
        balance: snapshot.balance,
        vip: snapshot.vip,
        event_active: snapshot.event_active,
        completed_count,
        total_activities,
        total_earned: values.total_earned,
        total_remaining: values.total_remaining,
        progress_percentage: progress_percentage(completed_count, total_activities),
    }
}

pub fn build_bp_values(catalog: &Catalog, snapshot: &UserSnapshot) -> BpValues {
    let completed: HashSet<&str> = snapshot.completed.iter().map(String::as_str).collect();
    let mut activities = BTreeMap::new();
    let mut total_earned = 0;
    let mut total_remaining = 0;

    for activity in catalog.all() {
        let value = reward(activity, snapshot.vip, snapshot.event_active);
        if completed.contains(activity.id.as_str()) {
            total_earned += value;
        } else {
            total_remaining += value;
        }
        activities.insert(activity.id.clone(), value);
    }

    BpValues {
        activities,
        total_earned,
        total_remaining,
    }
}

/// Per category: completed activities first (most recent first), then the
/// rest in catalog order.
pub fn build_dashboard(catalog: &Catalog, day: NaiveDate, snapshot: &UserSnapshot) -> Dashboard {
    let completed: HashSet<&str> = snapshot.completed.iter().map(String::as_str).collect();
    let view = |id: &str, done: bool| {
        catalog.get(id).map(|activity| ActivityView {
            id: activity.id.clone(),
            name: activity.name.clone(),
            base_reward: activity.base_reward,
            vip_reward: activity.vip_reward,
            completed: done,
            bp_value: reward(activity, snapshot.vip, snapshot.event_active),
        })
    };

    let categories = catalog
        .categories()
        .iter()
        .map(|category| {
            let done = snapshot
                .completed
                .iter()
                .filter(|id| catalog.get(id).is_some_and(|a| &a.category == category))
                .filter_map(|id| view(id, true));
            let open = catalog
                .in_category(category)
                .filter(|activity| !completed.contains(activity.id.as_str()))
                .filter_map(|activity| view(&activity.id, false));
            CategoryView {
                name: category.clone(),
                activities: done.chain(open).collect(),
            }
        })
        .collect();

    Dashboard {
        date: day.to_string(),
        stats: build_stats(catalog, snapshot),
        completed_activities: snapshot
            .completed
            .iter()
            .filter(|id| catalog.get(id).is_some())
            .cloned()
            .collect(),
        categories,
    }
}

fn progress_percentage(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (completed * 100 / total) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(completed: &[&str], vip: bool, event_active: bool) -> UserSnapshot {
        UserSnapshot {
            balance: 1000,
            vip,
            event_active,
            completed: completed.iter().map(|id| id.to_string()).collect(),
        }
    }

    fn catalog_total(catalog: &Catalog) -> i64 {
        catalog.all().iter().map(|a| a.base_reward).sum()
    }

    #[test]
    fn nothing_completed_means_everything_remaining() {
        let catalog = Catalog::builtin();
        let stats = build_stats(&catalog, &snapshot(&[], false, false));
        assert_eq!(stats.completed_count, 0);
        assert_eq!(stats.total_activities, 40);
        assert_eq!(stats.total_earned, 0);
        assert_eq!(stats.total_remaining, catalog_total(&catalog));
        assert_eq!(stats.progress_percentage, 0);
    }

    #[test]
    fn earned_and_remaining_partition_the_catalog() {
        let catalog = Catalog::builtin();
        let stats = build_stats(&catalog, &snapshot(&["dp_case", "fishing"], false, false));
        assert_eq!(stats.completed_count, 2);
        assert_eq!(stats.total_earned, 14);
        assert_eq!(stats.total_earned + stats.total_remaining, catalog_total(&catalog));
        assert_eq!(stats.progress_percentage, 5);
        assert_eq!(stats.balance, 1000);
    }

    #[test]
    fn estimates_follow_current_flags() {
        let catalog = Catalog::builtin();
        let stats = build_stats(&catalog, &snapshot(&["dp_case"], true, true));
        assert_eq!(stats.total_earned, 40);
        assert_eq!(stats.total_earned + stats.total_remaining, catalog_total(&catalog) * 4);
    }

    #[test]
    fn bp_values_cover_every_activity() {
        let catalog = Catalog::builtin();
        let values = build_bp_values(&catalog, &snapshot(&[], false, true));
        assert_eq!(values.activities.len(), catalog.len());
        assert_eq!(values.activities["browser"], 2);
        assert_eq!(values.activities["dp_case"], 20);
    }

    #[test]
    fn dashboard_lists_completed_first_in_each_category() {
        let catalog = Catalog::builtin();
        let day = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        let dashboard = build_dashboard(&catalog, day, &snapshot(&["tennis", "metro", "brawl"], false, false));

        assert_eq!(dashboard.date, "2026-04-01");
        let solo = &dashboard.categories[0];
        assert_eq!(solo.name, "Solo");
        assert_eq!(solo.activities.len(), 32);
        let head: Vec<_> = solo.activities.iter().take(3).map(|a| (a.id.as_str(), a.completed)).collect();
        assert_eq!(head, [("metro", true), ("brawl", true), ("browser", false)]);

        let paired = &dashboard.categories[1];
        assert_eq!(paired.activities[0].id, "tennis");
        assert!(paired.activities[0].completed);
        assert_eq!(paired.activities[1].id, "table_tennis");
        assert_eq!(dashboard.stats.completed_count, 3);
    }

    #[test]
    fn retired_activities_are_not_counted() {
        let catalog = Catalog::builtin();
        let mut ids: Vec<&str> = catalog.all().iter().map(|a| a.id.as_str()).collect();
        ids.push("retired_activity");

        let stats = build_stats(&catalog, &snapshot(&ids, false, false));
        assert_eq!(stats.completed_count, 40);
        assert_eq!(stats.total_activities, 40);
        assert_eq!(stats.progress_percentage, 100);
        assert_eq!(stats.total_remaining, 0);

        let day = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        let dashboard = build_dashboard(&catalog, day, &snapshot(&["retired_activity", "gym"], false, false));
        assert_eq!(dashboard.completed_activities, ["gym"]);
        assert_eq!(dashboard.stats.completed_count, 1);
    }

    #[test]
    fn progress_handles_empty_catalog() {
        assert_eq!(progress_percentage(0, 0), 0);
        assert_eq!(progress_percentage(40, 40), 100);
        assert_eq!(progress_percentage(1, 3), 33);
    }
}

use bonus_points::catalog::{ActivityDefinition, Catalog};
use bonus_points::epoch::ResetSchedule;
use bonus_points::{Ledger, LedgerError, PointsEngine};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Barrier};
use std::thread;

struct TempDb {
    path: PathBuf,
}

impl TempDb {
    fn new(tag: &str) -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!("bonus_points_{tag}_{}_{}.db", std::process::id(), nanos));
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut name = self.path.clone().into_os_string();
            name.push(suffix);
            let _ = std::fs::remove_file(name);
        }
    }
}

fn two_point_catalog() -> Catalog {
    let activity = |id: &str| ActivityDefinition {
        id: id.to_string(),
        name: id.to_uppercase(),
        category: "Solo".to_string(),
        base_reward: 2,
        vip_reward: 4,
    };
    Catalog::from_definitions(vec![activity("x"), activity("y")]).unwrap()
}

fn engine_at(path: &Path, catalog: Catalog) -> PointsEngine {
    PointsEngine::new(Ledger::open(path).unwrap(), catalog, ResetSchedule::default())
}

fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, 14, 12, 0, 0).unwrap()
}

#[test]
fn event_scenario_banks_and_refunds_original_amounts() {
    let db = TempDb::new("scenario");
    let engine = engine_at(db.path(), two_point_catalog());
    let user = "scenario-user";
    engine.set_balance(user, 1000).unwrap();

    let x = engine.toggle(user, "x", true, noon()).unwrap();
    assert_eq!(x.new_balance, 1002);
    assert_eq!(engine.stats(user, noon()).unwrap().completed_count, 1);

    engine.set_event_active(true).unwrap();
    let values = engine.activity_bp_values(user, noon()).unwrap();
    assert_eq!(values.activities["y"], 4);
    assert_eq!(engine.ledger().get_balance(user).unwrap(), 1002);

    let y = engine.toggle(user, "y", true, noon()).unwrap();
    assert_eq!(y.new_balance, 1006);

    let undo_x = engine.toggle(user, "x", false, noon()).unwrap();
    assert_eq!(undo_x.bp_delta, -2);
    assert_eq!(undo_x.new_balance, 1004);
}

#[test]
fn state_survives_reopening_the_database() {
    let db = TempDb::new("reopen");
    {
        let engine = engine_at(db.path(), Catalog::builtin());
        engine.set_vip("persist", true).unwrap();
        engine.toggle("persist", "fishing", true, noon()).unwrap();
        engine.set_event_active(true).unwrap();
    }

    let engine = engine_at(db.path(), Catalog::builtin());
    let stats = engine.stats("persist", noon()).unwrap();
    assert_eq!(stats.balance, 8);
    assert!(stats.vip);
    assert!(stats.event_active);
    assert_eq!(stats.completed_count, 1);

    let undo = engine.toggle("persist", "fishing", false, noon()).unwrap();
    assert_eq!(undo.new_balance, 0);
}

#[test]
fn history_is_kept_across_days() {
    let engine = PointsEngine::new(Ledger::in_memory().unwrap(), Catalog::builtin(), ResetSchedule::default());
    let tomorrow = noon() + Duration::days(1);
    let day_one = engine.day_of(noon());
    let day_two = engine.day_of(tomorrow);

    engine.toggle("u", "lottery", true, noon()).unwrap();
    assert!(engine.ledger().is_completed("u", "lottery", day_one).unwrap());
    assert!(!engine.ledger().is_completed("u", "lottery", day_two).unwrap());
    assert_eq!(engine.stats("u", tomorrow).unwrap().completed_count, 0);
    assert!(engine.ledger().completion("u", "lottery", day_one).unwrap().is_some());
}

#[test]
fn concurrent_completions_credit_once() {
    const THREADS: usize = 16;
    let engine = Arc::new(PointsEngine::new(
        Ledger::in_memory().unwrap(),
        Catalog::builtin(),
        ResetSchedule::default(),
    ));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                engine.toggle("racer", "dp_case", true, noon()).unwrap()
            })
        })
        .collect();

    let deltas: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap().bp_delta).collect();
    assert_eq!(deltas.iter().filter(|&&d| d == 10).count(), 1);
    assert_eq!(deltas.iter().filter(|&&d| d == 0).count(), THREADS - 1);
    assert_eq!(engine.ledger().get_balance("racer").unwrap(), 10);
    assert_eq!(
        engine.ledger().completed_activities("racer", engine.day_of(noon())).unwrap(),
        ["dp_case"]
    );
}

#[test]
fn separate_connections_to_one_file_serialize_toggles() {
    const PER_ENGINE: usize = 4;
    let db = TempDb::new("two_front_ends");
    let chat = Arc::new(engine_at(db.path(), Catalog::builtin()));
    let web = Arc::new(engine_at(db.path(), Catalog::builtin()));
    let barrier = Arc::new(Barrier::new(PER_ENGINE * 2));

    let handles: Vec<_> = [&chat, &web]
        .into_iter()
        .flat_map(|engine| std::iter::repeat(engine).take(PER_ENGINE))
        .map(|engine| {
            let engine = Arc::clone(engine);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                engine.toggle("shared", "fishing", true, noon())
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }
    assert_eq!(chat.ledger().get_balance("shared").unwrap(), 4);
    assert_eq!(web.ledger().get_balance("shared").unwrap(), 4);
}

#[test]
fn balance_bounds_leave_state_unchanged() {
    let engine = PointsEngine::new(Ledger::in_memory().unwrap(), Catalog::builtin(), ResetSchedule::default());
    engine.set_balance("b", 77).unwrap();

    for amount in [-1, 1_000_001] {
        let err = engine.set_balance("b", amount).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }
    assert_eq!(engine.ledger().get_balance("b").unwrap(), 77);
    assert_eq!(engine.set_balance("b", 1_000_000).unwrap(), 1_000_000);
}

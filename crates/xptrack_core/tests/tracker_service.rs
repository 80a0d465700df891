use chrono::NaiveDate;
use rusqlite::Connection;
use std::collections::HashSet;
use uuid::Uuid;
use xptrack_core::db::open_db_in_memory;
use xptrack_core::{
    open_sqlite_service, LevelPolicy, LevelingRules, SqliteTrackerService, TaskPatch,
    TaskValidationError, TrackerError, MAX_XP_VALUE,
};

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn service(conn: &Connection) -> SqliteTrackerService<'_> {
    open_sqlite_service(conn, LevelingRules::default()).unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn set_profile(conn: &Connection, level: i64, xp: i64) {
    conn.execute("UPDATE profiles SET level = ?1, xp = ?2;", [level, xp])
        .unwrap();
}

#[test]
fn added_tasks_get_consecutive_positions() {
    let conn = setup();
    let mut service = service(&conn);

    let read = service.add_task("Read", 50).unwrap();
    let exercise = service.add_task("Exercise", 100).unwrap();

    assert_eq!(read.position, 0);
    assert_eq!(exercise.position, 1);
    assert_eq!(service.tasks().len(), 2);
}

#[test]
fn validation_failure_never_reaches_store() {
    let conn = setup();
    let mut service = service(&conn);

    let err = service.add_task("   ", 10).unwrap_err();
    assert!(matches!(
        err,
        TrackerError::Validation(TaskValidationError::EmptyTitle)
    ));
    let err = service.add_entry("Walk", -10, day(2024, 6, 1)).unwrap_err();
    assert!(matches!(
        err,
        TrackerError::Validation(TaskValidationError::NegativeXp(-10))
    ));

    let tasks: i64 = conn
        .query_row("SELECT COUNT(*) FROM tasks;", [], |row| row.get(0))
        .unwrap();
    let entries: i64 = conn
        .query_row("SELECT COUNT(*) FROM completions;", [], |row| row.get(0))
        .unwrap();
    assert_eq!((tasks, entries), (0, 0));
}

#[test]
fn update_task_is_partial() {
    let conn = setup();
    let mut service = service(&conn);
    let task = service.add_task("Read", 50).unwrap();

    let updated = service
        .update_task(
            task.id,
            TaskPatch {
                title: Some("Read a chapter".to_string()),
                xp_value: None,
            },
        )
        .unwrap();
    assert_eq!(updated.title, "Read a chapter");
    assert_eq!(updated.xp_value, 50);
}

#[test]
fn reorder_from_back_to_front_shifts_others() {
    let conn = setup();
    let mut service = service(&conn);
    let ids: Vec<_> = (0..5)
        .map(|index| service.add_task(format!("task-{index}"), 10).unwrap().id)
        .collect();

    service.reorder_task(ids[3], 0).unwrap();

    let after: Vec<_> = service.tasks().iter().map(|task| task.id).collect();
    assert_eq!(after, vec![ids[3], ids[0], ids[1], ids[2], ids[4]]);
    assert_eq!(
        after.iter().collect::<HashSet<_>>(),
        ids.iter().collect::<HashSet<_>>()
    );
    let positions: Vec<_> = service.tasks().iter().map(|task| task.position).collect();
    assert_eq!(positions, vec![0, 1, 2, 3, 4]);

    let err = service.reorder_task(ids[0], 5).unwrap_err();
    assert!(matches!(
        err,
        TrackerError::PositionOutOfRange {
            position: 5,
            len: 5
        }
    ));
}

#[test]
fn report_levels_up_and_snapshots_task() {
    let conn = setup();
    set_profile(&conn, 1, 480);
    let mut service = service(&conn);
    let task = service.add_task("Read", 50).unwrap();

    let change = service.report_task(task.id, day(2024, 6, 1)).unwrap();
    assert_eq!((change.after.level, change.after.xp), (2, 30));
    assert_eq!(change.levels_gained(), 1);
    assert_eq!(change.record.label, "Read");
    assert_eq!(change.record.xp_awarded, 50);
    assert_eq!(service.profile(), &change.after);

    let progress = service.progress();
    assert_eq!(progress.remaining, 470);
}

#[test]
fn report_then_delete_restores_profile() {
    let conn = setup();
    set_profile(&conn, 3, 470);
    let mut service = service(&conn);
    let before = *service.profile();
    let task = service.add_task("Exercise", 100).unwrap();

    let reported = service.report_task(task.id, day(2024, 6, 1)).unwrap();
    assert_eq!(reported.after.level, 4);
    let reversed = service.delete_entry(reported.record.id).unwrap();

    assert_eq!(reversed.after, before);
    assert_eq!(*service.profile(), before);
    assert!(service.ledger().entries().is_empty());
}

#[test]
fn reversal_borrows_from_previous_level() {
    let conn = setup();
    set_profile(&conn, 2, 10);
    let mut service = service(&conn);
    conn.execute(
        "INSERT INTO completions (id, task_id, label, xp, occurred_on)
         VALUES (?1, NULL, 'old run', 50, '2024-05-30');",
        [Uuid::new_v4().to_string()],
    )
    .unwrap();
    service.refresh().unwrap();

    let id = service.ledger().entries()[0].id;
    let change = service.delete_entry(id).unwrap();
    assert_eq!((change.after.level, change.after.xp), (1, 460));
}

#[test]
fn deleting_task_keeps_history() {
    let conn = setup();
    let mut service = service(&conn);
    let task = service.add_task("Read", 50).unwrap();
    service.report_task(task.id, day(2024, 6, 1)).unwrap();

    service.remove_task(task.id).unwrap();

    assert!(service.tasks().is_empty());
    let entries = service.entries_on(day(2024, 6, 1));
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].task_id, Some(task.id));
    assert_eq!(entries[0].label, "Read");
    assert!(matches!(
        service.report_task(task.id, day(2024, 6, 2)).unwrap_err(),
        TrackerError::TaskNotFound(id) if id == task.id
    ));
}

#[test]
fn month_history_groups_days() {
    let conn = setup();
    let mut service = service(&conn);
    service.add_entry("a", 10, day(2024, 6, 1)).unwrap();
    service.add_entry("b", 20, day(2024, 6, 1)).unwrap();
    service.add_entry("c", 30, day(2024, 6, 2)).unwrap();
    service.add_entry("d", 40, day(2024, 7, 1)).unwrap();

    let june = service.month(2024, 6).unwrap();
    assert_eq!(june.len(), 2);
    assert_eq!(june[0].date, day(2024, 6, 1));
    assert_eq!(june[0].entries.len(), 2);
    assert_eq!(june[0].total_xp, 30);

    let history = service.history();
    assert_eq!(history.group_by_day().len(), 3);
    assert_eq!(service.total_xp(None), 100);
    assert!(matches!(
        service.month(2024, 0).unwrap_err(),
        TrackerError::InvalidMonth { .. }
    ));
}

#[test]
fn cascade_rules_flow_through_service() {
    let conn = setup();
    let rules = LevelingRules::new(100, LevelPolicy::Cascade).unwrap();
    let mut service = open_sqlite_service(&conn, rules).unwrap();

    let change = service.add_entry("Marathon", 250, day(2024, 6, 1)).unwrap();
    assert_eq!((change.after.level, change.after.xp), (3, 50));
    assert_eq!(service.rules().threshold, 100);
}

#[test]
fn unknown_entry_delete_is_not_found() {
    let conn = setup();
    let mut service = service(&conn);
    let missing = Uuid::new_v4();
    assert!(matches!(
        service.delete_entry(missing).unwrap_err(),
        TrackerError::EntryNotFound(id) if id == missing
    ));
}

#[test]
fn oversized_xp_and_empty_edits_are_rejected_before_the_store() {
    let conn = setup();
    let mut service = service(&conn);
    let read = service.add_task("Read", 50).unwrap();

    let err = service
        .add_entry("big", i64::MAX, day(2024, 6, 1))
        .unwrap_err();
    assert!(matches!(
        err,
        TrackerError::Validation(TaskValidationError::XpTooLarge(i64::MAX))
    ));
    let err = service
        .update_task(
            read.id,
            TaskPatch {
                xp_value: Some(MAX_XP_VALUE + 1),
                ..TaskPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        TrackerError::Validation(TaskValidationError::XpTooLarge(_))
    ));
    let err = service
        .update_task(read.id, TaskPatch::default())
        .unwrap_err();
    assert!(matches!(
        err,
        TrackerError::Validation(TaskValidationError::EmptyPatch)
    ));

    let entries: i64 = conn
        .query_row("SELECT COUNT(*) FROM completions;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(entries, 0);
    assert_eq!(service.task(read.id).unwrap().xp_value, 50);
    assert_eq!(service.total_xp(None), 0);
}

#[test]
fn max_xp_entries_sum_and_reverse_under_cascade() {
    let conn = setup();
    let rules = LevelingRules::new(500, LevelPolicy::Cascade).unwrap();
    let mut service = open_sqlite_service(&conn, rules).unwrap();
    let start = *service.profile();

    let first = service
        .add_entry("big", MAX_XP_VALUE, day(2024, 6, 1))
        .unwrap();
    service
        .add_entry("big again", MAX_XP_VALUE, day(2024, 6, 1))
        .unwrap();
    assert_eq!(service.total_xp(None), 2 * MAX_XP_VALUE);
    assert_eq!(service.month(2024, 6).unwrap()[0].total_xp, 2 * MAX_XP_VALUE);

    let change = service.delete_entry(first.record.id).unwrap();
    assert_eq!(change.after.level, 1 + MAX_XP_VALUE / 500);
    assert_eq!(service.ledger().entries().len(), 1);

    let last = service.ledger().entries()[0].id;
    let change = service.delete_entry(last).unwrap();
    assert_eq!(change.after, start);
}

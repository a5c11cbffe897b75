mod fixtures;

use fixtures::TestStorage;
use predicates::prelude::*;

#[test]
fn repair_rebuilds_missing_index() {
    let storage = TestStorage::new();
    storage.add_location("aaa111", Some("file:///home/dev/app"));
    storage.write_snapshot("aaa111", "s1", "first question", 1000);
    storage.write_snapshot("aaa111", "s2", "second question", 2000);

    storage
        .command()
        .args(["repair", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Repaired 1 location(s)"));

    let stored = chatfix_store::read(&storage.db_path("aaa111")).unwrap();
    assert_eq!(stored.index.entries.len(), 2);
    assert_eq!(stored.index.entries["s1"].title, "first question");
    assert_eq!(stored.index.entries["s2"].last_message_date, 2000);
    assert_eq!(stored.model_cache.len(), 2);
    assert_eq!(stored.state_cache.len(), 2);
}

#[test]
fn dry_run_reports_without_writing() {
    let storage = TestStorage::new();
    storage.add_location("aaa111", None);
    storage.write_snapshot("aaa111", "s1", "first question", 1000);

    storage
        .command()
        .args(["repair", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"))
        .stdout(predicate::str::contains("would restore 1 session(s)"));

    assert!(!storage.db_path("aaa111").exists());
}

#[test]
fn second_repair_finds_nothing_to_do() {
    let storage = TestStorage::new();
    storage.add_location("aaa111", None);
    storage.write_snapshot("aaa111", "s1", "first question", 1000);

    storage.command().args(["repair", "--yes"]).assert().success();

    storage
        .command()
        .args(["repair", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "All locations are healthy; nothing to repair.",
        ));
}

#[test]
fn unknown_location_id_fails_with_hint() {
    let storage = TestStorage::new();
    storage.add_location("aaa111", None);

    storage
        .command()
        .args(["repair", "zzz999", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn repair_creates_backup_when_database_exists() {
    let storage = TestStorage::new();
    let dir = storage.add_location("aaa111", None);
    storage.write_snapshot("aaa111", "s1", "first question", 1000);

    // Seed an empty store so the repair has something to back up.
    chatfix_store::write(&storage.db_path("aaa111"), &Default::default()).unwrap();

    storage
        .command()
        .args(["repair", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("backup: "));

    let backups: Vec<_> = std::fs::read_dir(&dir)
        .unwrap()
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().contains(".backup."))
        .collect();
    assert_eq!(backups.len(), 1);
}

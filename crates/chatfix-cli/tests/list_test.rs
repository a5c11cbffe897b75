mod fixtures;

use fixtures::TestStorage;
use predicates::prelude::*;

#[test]
fn help_describes_the_tool() {
    TestStorage::new()
        .command()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Repair chat-session indexes in workspace storage",
        ))
        .stdout(predicate::str::contains("repair"))
        .stdout(predicate::str::contains("merge"));
}

#[test]
fn list_flags_locations_needing_repair() {
    let storage = TestStorage::new();
    storage.add_location("aaa111", Some("file:///home/dev/app"));
    storage.write_snapshot("aaa111", "s1", "first question", 1000);

    storage
        .command()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("app (aaa111)"))
        .stdout(predicate::str::contains("NEEDS REPAIR"))
        .stdout(predicate::str::contains("Sessions on disk: 1"))
        .stdout(predicate::str::contains("Sessions in index: 0"));
}

#[test]
fn list_is_quiet_when_everything_is_healthy() {
    let storage = TestStorage::new();
    storage.add_location("aaa111", None);
    storage.write_snapshot("aaa111", "s1", "first question", 1000);
    storage.command().args(["repair", "--yes"]).assert().success();

    storage
        .command()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No locations need repair."));

    storage
        .command()
        .args(["list", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("healthy"));
}

#[test]
fn empty_root_lists_nothing() {
    let storage = TestStorage::new();

    storage
        .command()
        .args(["list", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "No storage locations with chat sessions found.",
        ));
}

#[test]
fn missing_storage_root_is_fatal() {
    let storage = TestStorage::new();
    let missing = storage.root().join("does-not-exist");

    let mut cmd = assert_cmd::Command::cargo_bin("chatfix").unwrap();
    cmd.arg("--storage-root")
        .arg(&missing)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot enumerate storage root"));
}

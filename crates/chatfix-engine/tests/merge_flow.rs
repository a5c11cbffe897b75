use chatfix_engine::{RunMode, apply_merge, merge_groups};
use chatfix_store::StoreSnapshot;
use chatfix_types::{IndexEntry, StorageLocation};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

fn make_location(root: &Path, id: &str, workspace: &str) -> StorageLocation {
    let dir = root.join(id);
    fs::create_dir_all(dir.join("sessions")).unwrap();
    StorageLocation {
        id: id.to_string(),
        workspace_path: Some(workspace.to_string()),
        db_path: dir.join("state.db"),
        records_dir: dir.join("sessions"),
    }
}

fn write_snapshot(location: &StorageLocation, session_id: &str, title: &str, ts: i64) {
    let body = format!(
        r#"{{"id":"{id}","title":"{title}","turns":[{{"text":"{title}","timestamp":{ts}}}]}}"#,
        id = session_id,
        title = title,
        ts = ts,
    );
    fs::write(
        location.records_dir.join(format!("{}.snapshot", session_id)),
        body,
    )
    .unwrap();
}

fn listed(dir: &Path) -> BTreeSet<String> {
    fs::read_dir(dir)
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect()
}

fn set_db_mtime(location: &StorageLocation, unix_seconds: i64) {
    filetime::set_file_mtime(
        &location.db_path,
        filetime::FileTime::from_unix_time(unix_seconds, 0),
    )
    .unwrap();
}

/// Two locations for the same workspace: the active one gains everything the
/// donor has, the donor loses nothing.
#[test]
fn merge_copies_into_active_and_never_deletes() {
    let tmp = tempfile::tempdir().unwrap();
    let active = make_location(tmp.path(), "new", "file:///w/app");
    let donor = make_location(tmp.path(), "old", "/w/app");

    write_snapshot(&active, "shared", "shared", 10);
    write_snapshot(&active, "only-new", "newer work", 20);
    write_snapshot(&donor, "shared", "shared", 10);
    write_snapshot(&donor, "only-old", "older work", 5);

    chatfix_store::write(&active.db_path, &StoreSnapshot::default()).unwrap();
    chatfix_store::write(&donor.db_path, &StoreSnapshot::default()).unwrap();
    set_db_mtime(&donor, 1_000);
    set_db_mtime(&active, 2_000);

    let groups = merge_groups(&[active.clone(), donor.clone()]);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].active.id, "new");

    let donor_before = listed(&donor.records_dir);
    let donor_db_before = fs::read(&donor.db_path).unwrap();
    let active_before = listed(&active.records_dir);

    let outcome = apply_merge(&groups[0], RunMode::Apply, |_| {}).unwrap();

    assert!(outcome.applied);
    assert_eq!(outcome.sessions_copied, 1);
    assert_eq!(outcome.files_copied, 1);

    // files(active after) ⊇ files(active before) ∪ files(donor)
    let active_after = listed(&active.records_dir);
    assert!(active_after.is_superset(&active_before));
    assert!(active_after.is_superset(&donor_before));

    // files(donor) unchanged, donor database untouched
    assert_eq!(listed(&donor.records_dir), donor_before);
    assert_eq!(fs::read(&donor.db_path).unwrap(), donor_db_before);

    // The reconciliation pass indexed every record in the active location.
    let stored = chatfix_store::read(&active.db_path).unwrap();
    assert_eq!(stored.index.entries.len(), 3);
    assert!(stored.index.entries.contains_key("only-old"));
}

#[test]
fn merge_preview_is_side_effect_free() {
    let tmp = tempfile::tempdir().unwrap();
    let active = make_location(tmp.path(), "new", "/w/app");
    let donor = make_location(tmp.path(), "old", "/w/app");

    write_snapshot(&donor, "only-old", "older work", 5);
    chatfix_store::write(&active.db_path, &StoreSnapshot::default()).unwrap();
    chatfix_store::write(&donor.db_path, &StoreSnapshot::default()).unwrap();
    set_db_mtime(&donor, 1_000);
    set_db_mtime(&active, 2_000);

    let active_db_before = fs::read(&active.db_path).unwrap();

    let groups = merge_groups(&[active.clone(), donor.clone()]);
    let outcome = apply_merge(&groups[0], RunMode::Preview, |_| {}).unwrap();

    // The outcome reports what would happen without doing any of it.
    assert!(!outcome.applied);
    assert_eq!(outcome.sessions_copied, 1);
    assert_eq!(outcome.entries_added, 1);
    assert!(listed(&active.records_dir).is_empty());
    assert_eq!(fs::read(&active.db_path).unwrap(), active_db_before);
}

#[test]
fn donor_caches_merge_last_write_wins() {
    let tmp = tempfile::tempdir().unwrap();
    let active = make_location(tmp.path(), "new", "/w/app");
    let donor = make_location(tmp.path(), "old", "/w/app");

    let mut active_seed = StoreSnapshot::default();
    active_seed.state_cache = vec![
        serde_json::json!({"resource": "chat-session://local/a", "archived": false, "read": 100}),
    ];
    let mut donor_seed = StoreSnapshot::default();
    donor_seed.state_cache = vec![
        serde_json::json!({"resource": "chat-session://local/a", "archived": true, "read": 900}),
        serde_json::json!({"resource": "chat-session://local/b", "archived": false, "read": 50}),
    ];
    // The donor index references a session so the merge has something to do.
    donor_seed.index.entries.insert(
        "s1".to_string(),
        IndexEntry {
            session_id: "s1".to_string(),
            title: "t".to_string(),
            last_message_date: 1,
            is_imported: false,
            initial_location: "panel".to_string(),
            is_empty: false,
        },
    );
    write_snapshot(&donor, "s1", "t", 1);

    chatfix_store::write(&active.db_path, &active_seed).unwrap();
    chatfix_store::write(&donor.db_path, &donor_seed).unwrap();
    set_db_mtime(&donor, 1_000);
    set_db_mtime(&active, 2_000);

    let groups = merge_groups(&[active.clone(), donor.clone()]);
    apply_merge(&groups[0], RunMode::Apply, |_| {}).unwrap();

    let stored = chatfix_store::read(&active.db_path).unwrap();
    let item_a = stored
        .state_cache
        .iter()
        .find(|i| i["resource"] == "chat-session://local/a")
        .unwrap();
    // Donor's copy of `a` is newer and wins; `b` is appended.
    assert_eq!(item_a["read"], 900);
    assert_eq!(item_a["archived"], true);
    assert!(
        stored
            .state_cache
            .iter()
            .any(|i| i["resource"] == "chat-session://local/b")
    );
}

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

/// A throwaway storage root with helpers for building locations inside it.
pub struct TestStorage {
    root: TempDir,
}

impl TestStorage {
    pub fn new() -> Self {
        Self {
            root: TempDir::new().expect("Failed to create temp storage root"),
        }
    }

    pub fn root(&self) -> &std::path::Path {
        self.root.path()
    }

    pub fn add_location(&self, id: &str, workspace: Option<&str>) -> PathBuf {
        let dir = self.root.path().join(id);
        std::fs::create_dir_all(dir.join("sessions")).expect("Failed to create location");
        if let Some(workspace) = workspace {
            std::fs::write(
                dir.join("workspace.json"),
                format!(r#"{{"folder":"{}"}}"#, workspace),
            )
            .expect("Failed to write workspace metadata");
        }
        dir
    }

    pub fn write_snapshot(&self, location_id: &str, session_id: &str, title: &str, ts: i64) {
        let body = format!(
            r#"{{"id":"{id}","title":"{title}","turns":[{{"text":"{title}","timestamp":{ts}}}]}}"#,
            id = session_id,
            title = title,
            ts = ts,
        );
        std::fs::write(
            self.root
                .path()
                .join(location_id)
                .join("sessions")
                .join(format!("{}.snapshot", session_id)),
            body,
        )
        .expect("Failed to write snapshot record");
    }

    pub fn db_path(&self, location_id: &str) -> PathBuf {
        self.root.path().join(location_id).join("state.db")
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("chatfix").expect("Failed to find chatfix binary");
        cmd.arg("--storage-root").arg(self.root.path());
        cmd
    }
}

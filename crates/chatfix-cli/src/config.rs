use anyhow::Result;
use std::path::PathBuf;

/// Resolve the workspace storage root based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. CHATFIX_STORAGE_ROOT environment variable (with tilde expansion)
/// 3. The host's per-platform storage directory under the config dir
pub fn resolve_storage_root(explicit: Option<&str>, insiders: bool) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(expand_tilde(path));
    }

    if let Ok(env_path) = std::env::var("CHATFIX_STORAGE_ROOT") {
        return Ok(expand_tilde(&env_path));
    }

    let app_dir = if insiders { "Code - Insiders" } else { "Code" };
    if let Some(config_dir) = dirs::config_dir() {
        return Ok(config_dir
            .join(app_dir)
            .join("User")
            .join("workspaceStorage"));
    }

    anyhow::bail!("Could not determine the storage root; pass --storage-root explicitly")
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}

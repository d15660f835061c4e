use std::path::{Path, PathBuf};

use super::constants::{AUDIT_CONFIG_CANDIDATES, CONFIG_PATH_ENV};

/// An explicit path (CLI) wins over `POSTURE_AUDIT_CONFIG`, which wins over
/// the per-OS candidate locations. Explicit paths must exist.
pub(super) fn resolve_config_path(explicit: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("config file does not exist: {}", path.display());
        }
        return Ok(Some(path.to_path_buf()));
    }

    if let Ok(p) = std::env::var(CONFIG_PATH_ENV) {
        let p = p.trim();
        if !p.is_empty() {
            let path = PathBuf::from(p);
            if !path.exists() {
                anyhow::bail!("configured {} does not exist: {}", CONFIG_PATH_ENV, path.display());
            }
            return Ok(Some(path));
        }
    }

    Ok(AUDIT_CONFIG_CANDIDATES
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map(Path::to_path_buf))
}

//! Clean step: removes the destination tree before a run.

use std::fs;

use crate::paths::ProjectPaths;
use crate::pipeline::PipelineError;

/// Delete the destination root and everything under it.
///
/// The destination tree is fully regenerable, so it is treated as
/// disposable. Deleting a destination that does not exist is a no-op.
/// A deletion failure propagates: continuing into the transforms would risk
/// mixing stale and fresh output.
///
/// Returns `true` if anything was removed.
pub fn clean_dest(paths: &ProjectPaths) -> Result<bool, PipelineError> {
    let dest = &paths.dest_root;

    if !dest.exists() {
        tracing::debug!("{} does not exist, nothing to clean", dest.display());
        return Ok(false);
    }

    // Log what is about to go, top-level entries only.
    if let Ok(entries) = fs::read_dir(dest) {
        for entry in entries.flatten() {
            tracing::debug!("removing {}", entry.path().display());
        }
    }

    fs::remove_dir_all(dest).map_err(|e| PipelineError::Clean {
        path: dest.display().to_string(),
        message: e.to_string(),
    })?;

    tracing::info!("cleaned {}", dest.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    fn paths_for(dest: &Path) -> ProjectPaths {
        ProjectPaths::from_roots(Path::new("src"), dest)
    }

    #[test]
    fn removes_destination_recursively() {
        let temp = tempdir().unwrap();
        let dest = temp.path().join("dist");
        fs::create_dir_all(dest.join("assets/images")).unwrap();
        fs::write(dest.join("index.html"), "<html></html>").unwrap();
        fs::write(dest.join("assets/images/logo.png"), b"png").unwrap();

        let removed = clean_dest(&paths_for(&dest)).unwrap();

        assert!(removed);
        assert!(!dest.exists());
    }

    #[test]
    fn cleaning_twice_is_a_no_op() {
        let temp = tempdir().unwrap();
        let dest = temp.path().join("dist");
        fs::create_dir_all(&dest).unwrap();

        let paths = paths_for(&dest);
        assert!(clean_dest(&paths).unwrap());
        assert!(!clean_dest(&paths).unwrap());
        assert!(!dest.exists());
    }
}

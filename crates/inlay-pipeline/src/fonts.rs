//! Font step: verbatim recursive copy.

use std::fs;

use walkdir::WalkDir;

use crate::paths::ProjectPaths;
use crate::pipeline::{PipelineError, StepOutcome};

/// Mirror the fonts source tree into the destination, byte for byte.
///
/// No transformation is applied; directory structure is preserved. A file
/// that fails to copy is logged and skipped.
pub(crate) fn copy_fonts(paths: &ProjectPaths) -> Result<StepOutcome, PipelineError> {
    let source_dir = &paths.fonts.source;
    if !source_dir.exists() {
        return Ok(StepOutcome::default());
    }

    let mut outcome = StepOutcome::default();

    for entry in WalkDir::new(source_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let rel = path.strip_prefix(source_dir).unwrap_or(path);
        let out_path = paths.fonts.dest.join(rel);

        let copied = out_path
            .parent()
            .map(fs::create_dir_all)
            .transpose()
            .and_then(|_| fs::copy(path, &out_path));

        match copied {
            Ok(_) => outcome.written += 1,
            Err(e) => {
                tracing::warn!("skipping {}: {}", path.display(), e);
                outcome.skipped += 1;
            }
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use std::path::Path;
    use tempfile::tempdir;

    fn project(temp: &Path) -> ProjectPaths {
        let mut config = SiteConfig::default();
        config.paths.source = temp.join("src");
        config.paths.dest = temp.join("dist");
        let paths = config.project_paths();
        fs::create_dir_all(&paths.fonts.source).unwrap();
        paths
    }

    #[test]
    fn mirrors_tree_byte_identically() {
        let temp = tempdir().unwrap();
        let paths = project(temp.path());

        let inter = paths.fonts.source.join("inter");
        fs::create_dir_all(&inter).unwrap();
        fs::write(inter.join("Inter-Bold.woff2"), b"\x00\x01woff2-bytes").unwrap();
        fs::write(paths.fonts.source.join("LICENSE.txt"), "ofl").unwrap();

        let outcome = copy_fonts(&paths).unwrap();

        assert_eq!(outcome.written, 2);
        assert_eq!(
            fs::read(paths.fonts.dest.join("inter/Inter-Bold.woff2")).unwrap(),
            b"\x00\x01woff2-bytes"
        );
        assert_eq!(
            fs::read_to_string(paths.fonts.dest.join("LICENSE.txt")).unwrap(),
            "ofl"
        );
    }

    #[test]
    fn empty_source_copies_nothing() {
        let temp = tempdir().unwrap();
        let paths = project(temp.path());

        let outcome = copy_fonts(&paths).unwrap();

        assert_eq!(outcome.written, 0);
        assert!(!paths.fonts.dest.exists());
    }
}

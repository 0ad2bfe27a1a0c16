//! Stylesheet step: Sass compilation, vendor prefixing, minification.

use std::fs;
use std::path::Path;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use parcel_sourcemap::SourceMap;
use walkdir::WalkDir;

use crate::config::SiteConfig;
use crate::paths::ProjectPaths;
use crate::pipeline::{PipelineError, StepOutcome};

/// Compile every non-partial `.scss` file under the styles source directory.
///
/// Output is flattened: every `.css` (plus its `.css.map`) lands directly in
/// the styles destination regardless of source subdirectory. A file that
/// fails to compile is logged and skipped; siblings still compile.
pub(crate) fn compile_styles(
    config: &SiteConfig,
    paths: &ProjectPaths,
) -> Result<StepOutcome, PipelineError> {
    let source_dir = &paths.styles.source;
    if !source_dir.exists() {
        return Ok(StepOutcome::default());
    }

    let targets = browser_targets(&config.styles.browsers)?;

    fs::create_dir_all(&paths.styles.dest).map_err(|e| PipelineError::Write(e.to_string()))?;

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

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if ext != "scss" {
            continue;
        }

        // Partials are compiled into their importers, never on their own.
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if name.starts_with('_') {
            continue;
        }

        match compile_one(path, source_dir, targets, &paths.styles.dest) {
            Ok(()) => outcome.written += 1,
            Err(e) => {
                tracing::warn!("skipping {}: {}", path.display(), e);
                outcome.skipped += 1;
            }
        }
    }

    Ok(outcome)
}

/// Resolve browserslist queries into lightningcss targets.
fn browser_targets(queries: &[String]) -> Result<Targets, PipelineError> {
    let browsers =
        Browsers::from_browserslist(queries).map_err(|e| PipelineError::Css(e.to_string()))?;

    Ok(Targets {
        browsers,
        ..Targets::default()
    })
}

/// Compile a single entry stylesheet: Sass -> CSS -> prefixed, minified CSS
/// with a source map.
fn compile_one(
    entry: &Path,
    load_root: &Path,
    targets: Targets,
    dest_dir: &Path,
) -> Result<(), PipelineError> {
    let options = grass::Options::default()
        .style(grass::OutputStyle::Expanded)
        .load_path(load_root);
    let css = grass::from_path(entry, &options).map_err(|e| PipelineError::Css(e.to_string()))?;

    let stem = entry
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| PipelineError::Css(format!("invalid file name: {}", entry.display())))?;
    let css_name = format!("{stem}.css");
    let map_name = format!("{stem}.css.map");

    let mut source_map = SourceMap::new("/");
    source_map.add_source(&css_name);
    let _ = source_map.set_source_content(0, &css);

    let mut stylesheet = StyleSheet::parse(
        &css,
        ParserOptions {
            filename: css_name.clone(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| PipelineError::Css(e.to_string()))?;

    stylesheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| PipelineError::Css(e.to_string()))?;

    let output = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            source_map: Some(&mut source_map),
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| PipelineError::Css(e.to_string()))?;

    let map_json = source_map
        .to_json(None)
        .map_err(|e| PipelineError::Css(e.to_string()))?;

    let code = format!("{}\n/*# sourceMappingURL={map_name} */", output.code);
    fs::write(dest_dir.join(&css_name), code).map_err(|e| PipelineError::Write(e.to_string()))?;
    fs::write(dest_dir.join(&map_name), map_json)
        .map_err(|e| PipelineError::Write(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn project(temp: &Path) -> (SiteConfig, ProjectPaths) {
        let mut config = SiteConfig::default();
        config.paths.source = temp.join("src");
        config.paths.dest = temp.join("dist");
        let paths = config.project_paths();
        fs::create_dir_all(&paths.styles.source).unwrap();
        (config, paths)
    }

    #[test]
    fn compiles_entry_and_excludes_partials() {
        let temp = tempdir().unwrap();
        let (config, paths) = project(temp.path());

        fs::write(
            paths.styles.source.join("_vars.scss"),
            "$accent: #ff0000;\n",
        )
        .unwrap();
        fs::write(
            paths.styles.source.join("main.scss"),
            "@use \"vars\";\nbody { color: vars.$accent; }\n",
        )
        .unwrap();

        let outcome = compile_styles(&config, &paths).unwrap();

        assert_eq!(outcome.written, 1);
        assert!(paths.styles.dest.join("main.css").exists());
        assert!(paths.styles.dest.join("main.css.map").exists());
        assert!(!paths.styles.dest.join("_vars.css").exists());

        let css = fs::read_to_string(paths.styles.dest.join("main.css")).unwrap();
        assert!(css.contains("red") || css.contains("#ff0000") || css.contains("#f00"));
        assert!(css.contains("sourceMappingURL=main.css.map"));
    }

    #[test]
    fn flattens_nested_sources() {
        let temp = tempdir().unwrap();
        let (config, paths) = project(temp.path());

        let nested = paths.styles.source.join("components");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("card.scss"), ".card { margin: 0; }\n").unwrap();

        compile_styles(&config, &paths).unwrap();

        assert!(paths.styles.dest.join("card.css").exists());

        // Flattening invariant: no subdirectories in the output.
        let subdirs: Vec<_> = fs::read_dir(&paths.styles.dest)
            .unwrap()
            .flatten()
            .filter(|e| e.path().is_dir())
            .collect();
        assert!(subdirs.is_empty());
    }

    #[test]
    fn invalid_stylesheet_degrades_without_aborting() {
        let temp = tempdir().unwrap();
        let (config, paths) = project(temp.path());

        fs::write(paths.styles.source.join("broken.scss"), "body { color: ").unwrap();
        fs::write(paths.styles.source.join("ok.scss"), "p { margin: 0; }\n").unwrap();

        let outcome = compile_styles(&config, &paths).unwrap();

        assert_eq!(outcome.written, 1);
        assert_eq!(outcome.skipped, 1);
        assert!(paths.styles.dest.join("ok.css").exists());
        assert!(!paths.styles.dest.join("broken.css").exists());
    }

    #[test]
    fn missing_source_directory_is_not_an_error() {
        let temp = tempdir().unwrap();
        let mut config = SiteConfig::default();
        config.paths.source = temp.path().join("nowhere");
        config.paths.dest = temp.path().join("dist");
        let paths = config.project_paths();

        let outcome = compile_styles(&config, &paths).unwrap();

        assert_eq!(outcome.written, 0);
    }
}

//! Script step: JavaScript minification with source maps.
//!
//! Uses oxc to parse, compress, mangle, and re-print each top-level script.

use std::fs;
use std::path::Path;

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use crate::paths::ProjectPaths;
use crate::pipeline::{PipelineError, StepOutcome};

/// Minify every top-level `.js` file in the scripts source directory.
///
/// Non-recursive on purpose: nested directories are left to a bundler,
/// which this pipeline deliberately is not. Already-minified `.min.js`
/// files are copied through untouched.
pub(crate) fn minify_scripts(paths: &ProjectPaths) -> Result<StepOutcome, PipelineError> {
    let source_dir = &paths.scripts.source;
    if !source_dir.exists() {
        return Ok(StepOutcome::default());
    }

    fs::create_dir_all(&paths.scripts.dest).map_err(|e| PipelineError::Write(e.to_string()))?;

    let mut outcome = StepOutcome::default();

    let entries = fs::read_dir(source_dir).map_err(|e| PipelineError::Read(e.to_string()))?;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("js") {
            continue;
        }

        let file_name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };

        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
        if stem.ends_with(".min") {
            fs::copy(&path, paths.scripts.dest.join(&file_name))
                .map_err(|e| PipelineError::Write(e.to_string()))?;
            outcome.written += 1;
            continue;
        }

        let source = fs::read_to_string(&path).map_err(|e| PipelineError::Read(e.to_string()))?;

        match minify_js(&source, &path) {
            Some((code, map)) => {
                let map_name = format!("{stem}.js.map");
                let code = format!("{code}\n//# sourceMappingURL={map_name}");
                fs::write(paths.scripts.dest.join(&file_name), code)
                    .map_err(|e| PipelineError::Write(e.to_string()))?;
                if let Some(map_json) = map {
                    fs::write(paths.scripts.dest.join(&map_name), map_json)
                        .map_err(|e| PipelineError::Write(e.to_string()))?;
                }
                outcome.written += 1;
            }
            None => {
                tracing::warn!("skipping {}: failed to parse", path.display());
                outcome.skipped += 1;
            }
        }
    }

    Ok(outcome)
}

/// Minify JavaScript source code, returning the code and its source map.
///
/// Returns `None` when the parser reports errors; the minifier itself does
/// not attempt recovery beyond that.
fn minify_js(source: &str, source_path: &Path) -> Option<(String, Option<String>)> {
    let allocator = Allocator::default();
    let source_type = SourceType::mjs();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() {
        return None;
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let out = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            source_map_path: Some(source_path.to_path_buf()),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program);

    Some((out.code, out.map.map(|m| m.to_json_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use tempfile::tempdir;

    fn project(temp: &Path) -> ProjectPaths {
        let mut config = SiteConfig::default();
        config.paths.source = temp.join("src");
        config.paths.dest = temp.join("dist");
        let paths = config.project_paths();
        fs::create_dir_all(&paths.scripts.source).unwrap();
        paths
    }

    #[test]
    fn minifies_with_source_map() {
        let temp = tempdir().unwrap();
        let paths = project(temp.path());

        fs::write(
            paths.scripts.source.join("app.js"),
            "const greeting = 'hello';\nconsole.log(greeting);\n",
        )
        .unwrap();

        let outcome = minify_scripts(&paths).unwrap();

        assert_eq!(outcome.written, 1);
        let code = fs::read_to_string(paths.scripts.dest.join("app.js")).unwrap();
        assert!(code.contains("console.log"));
        assert!(!code.contains("greeting = "));
        assert!(code.contains("sourceMappingURL=app.js.map"));
        assert!(paths.scripts.dest.join("app.js.map").exists());
    }

    #[test]
    fn ignores_nested_scripts() {
        let temp = tempdir().unwrap();
        let paths = project(temp.path());

        let vendor = paths.scripts.source.join("vendor");
        fs::create_dir_all(&vendor).unwrap();
        fs::write(vendor.join("lib.js"), "var x = 1;").unwrap();
        fs::write(paths.scripts.source.join("main.js"), "var y = 2;").unwrap();

        let outcome = minify_scripts(&paths).unwrap();

        assert_eq!(outcome.written, 1);
        assert!(!paths.scripts.dest.join("vendor").exists());
    }

    #[test]
    fn copies_preminified_files_through() {
        let temp = tempdir().unwrap();
        let paths = project(temp.path());

        let preminified = "!function(){console.log(1)}();";
        fs::write(paths.scripts.source.join("lib.min.js"), preminified).unwrap();

        minify_scripts(&paths).unwrap();

        let copied = fs::read_to_string(paths.scripts.dest.join("lib.min.js")).unwrap();
        assert_eq!(copied, preminified);
    }

    #[test]
    fn unparseable_script_is_skipped() {
        let temp = tempdir().unwrap();
        let paths = project(temp.path());

        fs::write(paths.scripts.source.join("broken.js"), "function {").unwrap();
        fs::write(paths.scripts.source.join("ok.js"), "var ok = true;").unwrap();

        let outcome = minify_scripts(&paths).unwrap();

        assert_eq!(outcome.written, 1);
        assert_eq!(outcome.skipped, 1);
        assert!(paths.scripts.dest.join("ok.js").exists());
        assert!(!paths.scripts.dest.join("broken.js").exists());
    }
}

//! Project configuration (`inlay.toml`).

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::paths::ProjectPaths;
use crate::pipeline::PipelineError;

/// Top-level configuration, loaded from `inlay.toml` if present.
///
/// Every section falls back to its defaults, so a project without a config
/// file gets the conventional `src/` -> `dist/` layout.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SiteConfig {
    pub paths: PathsSection,
    pub serve: ServeSection,
    pub build: BuildSection,
    pub styles: StylesSection,
}

/// `[paths]` section: the two tree roots.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    /// Source tree root
    pub source: PathBuf,

    /// Destination tree root (disposable, regenerated on every run)
    pub dest: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            source: PathBuf::from("src"),
            dest: PathBuf::from("dist"),
        }
    }
}

/// `[serve]` section: development server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServeSection {
    /// Interface to bind. `127.0.0.1` keeps the server localhost-only.
    pub host: String,

    /// HTTP port number.
    pub port: u16,

    /// Open a browser tab when the server starts.
    pub open: bool,
}

impl Default for ServeSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            open: false,
        }
    }
}

/// `[build]` section: knobs for the production pipeline variant.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    /// Collapse whitespace in rendered HTML (build pipeline only).
    pub minify_html: bool,

    /// JPEG re-encode quality (0-100).
    pub jpeg_quality: u8,

    /// Strip the root `viewBox` attribute from SVGs.
    pub svg_remove_viewbox: bool,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            minify_html: true,
            jpeg_quality: 75,
            svg_remove_viewbox: true,
        }
    }
}

/// `[styles]` section: stylesheet compilation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StylesSection {
    /// Browserslist queries resolved into vendor-prefixing targets.
    pub browsers: Vec<String>,
}

impl Default for StylesSection {
    fn default() -> Self {
        Self {
            browsers: vec!["defaults".to_string()],
        }
    }
}

impl SiteConfig {
    /// Load configuration from the given file, falling back to defaults when
    /// the file does not exist. A file that exists but fails to parse is an
    /// error, not a silent fallback.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        if !path.exists() {
            tracing::debug!("no config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: SiteConfig = toml::from_str(&content).map_err(|e| {
            PipelineError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;

        tracing::info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Construct the immutable path mapping for this configuration.
    pub fn project_paths(&self) -> ProjectPaths {
        ProjectPaths::from_roots(&self.paths.source, &self.paths.dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_conventional_layout() {
        let config = SiteConfig::default();

        assert_eq!(config.paths.source, PathBuf::from("src"));
        assert_eq!(config.paths.dest, PathBuf::from("dist"));
        assert_eq!(config.serve.port, 3000);
        assert!(!config.serve.open);
        assert!(config.build.minify_html);
        assert_eq!(config.build.jpeg_quality, 75);
        assert_eq!(config.styles.browsers, vec!["defaults".to_string()]);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let temp = tempdir().unwrap();
        let config = SiteConfig::load(&temp.path().join("inlay.toml")).unwrap();

        assert_eq!(config.paths.dest, PathBuf::from("dist"));
    }

    #[test]
    fn partial_file_overrides_defaults() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("inlay.toml");
        fs::write(
            &path,
            r#"
[paths]
dest = "public"

[serve]
port = 8080
"#,
        )
        .unwrap();

        let config = SiteConfig::load(&path).unwrap();

        assert_eq!(config.paths.source, PathBuf::from("src"));
        assert_eq!(config.paths.dest, PathBuf::from("public"));
        assert_eq!(config.serve.port, 8080);
        assert_eq!(config.build.jpeg_quality, 75);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("inlay.toml");
        fs::write(&path, "[paths\nsource = ").unwrap();

        assert!(SiteConfig::load(&path).is_err());
    }
}

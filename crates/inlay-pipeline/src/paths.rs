//! Source and destination path mapping.

use std::path::{Path, PathBuf};

/// Source and destination directories for one asset category.
#[derive(Debug, Clone)]
pub struct CategoryPaths {
    /// Directory the category's files are read from
    pub source: PathBuf,

    /// Directory the category's outputs are written to
    pub dest: PathBuf,
}

/// The full path mapping for a project.
///
/// Constructed once at startup from the two configured roots and passed
/// explicitly to each step; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    /// Root of the source tree
    pub source_root: PathBuf,

    /// Root of the destination tree (deleted and regenerated on every run)
    pub dest_root: PathBuf,

    /// `src/scss` -> `dist/css`, flattened
    pub styles: CategoryPaths,

    /// `src/js` -> `dist/js`, top-level files only
    pub scripts: CategoryPaths,

    /// `src/html` -> `dist/`, entry pages under `src/html/pages`
    pub pages: CategoryPaths,

    /// `src/images` -> `dist/assets/images`, structure preserved
    pub images: CategoryPaths,

    /// `src/fonts` -> `dist/assets/fonts`, verbatim mirror
    pub fonts: CategoryPaths,
}

impl ProjectPaths {
    /// Build the category mapping from the two configured roots.
    pub fn from_roots(source_root: &Path, dest_root: &Path) -> Self {
        Self {
            source_root: source_root.to_path_buf(),
            dest_root: dest_root.to_path_buf(),
            styles: CategoryPaths {
                source: source_root.join("scss"),
                dest: dest_root.join("css"),
            },
            scripts: CategoryPaths {
                source: source_root.join("js"),
                dest: dest_root.join("js"),
            },
            pages: CategoryPaths {
                source: source_root.join("html"),
                dest: dest_root.to_path_buf(),
            },
            images: CategoryPaths {
                source: source_root.join("images"),
                dest: dest_root.join("assets").join("images"),
            },
            fonts: CategoryPaths {
                source: source_root.join("fonts"),
                dest: dest_root.join("assets").join("fonts"),
            },
        }
    }

    /// Directory holding the page entry templates (`src/html/pages`).
    ///
    /// Includes and layouts live anywhere under `pages.source`; only files
    /// in this subdirectory are rendered as standalone pages.
    pub fn page_entries_dir(&self) -> PathBuf {
        self.pages.source.join("pages")
    }
}

/// The five asset categories the pipeline knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Styles,
    Scripts,
    Pages,
    Images,
    Fonts,
}

impl AssetKind {
    pub const ALL: [AssetKind; 5] = [
        AssetKind::Styles,
        AssetKind::Scripts,
        AssetKind::Pages,
        AssetKind::Images,
        AssetKind::Fonts,
    ];

    /// Short label used in log output.
    pub fn label(&self) -> &'static str {
        match self {
            AssetKind::Styles => "styles",
            AssetKind::Scripts => "scripts",
            AssetKind::Pages => "pages",
            AssetKind::Images => "images",
            AssetKind::Fonts => "fonts",
        }
    }

    /// Classify a changed file into the category whose transform it should
    /// re-run, or `None` if no category covers it.
    ///
    /// Mirrors the watch globs: styles recursively match `.scss`, scripts
    /// match top-level `.js` only, pages match `.html`/`.njk` anywhere under
    /// the template root, images match supported raster/vector extensions,
    /// and any file under the fonts root counts as a font.
    pub fn classify(path: &Path, paths: &ProjectPaths) -> Option<AssetKind> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        if path.starts_with(&paths.styles.source) {
            return (ext == "scss").then_some(AssetKind::Styles);
        }

        if path.starts_with(&paths.scripts.source) {
            let top_level = path.parent() == Some(paths.scripts.source.as_path());
            return (ext == "js" && top_level).then_some(AssetKind::Scripts);
        }

        if path.starts_with(&paths.pages.source) {
            return matches!(ext.as_str(), "html" | "njk").then_some(AssetKind::Pages);
        }

        if path.starts_with(&paths.images.source) {
            return matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "svg")
                .then_some(AssetKind::Images);
        }

        if path.starts_with(&paths.fonts.source) {
            return Some(AssetKind::Fonts);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> ProjectPaths {
        ProjectPaths::from_roots(Path::new("src"), Path::new("dist"))
    }

    #[test]
    fn maps_categories_from_roots() {
        let p = paths();

        assert_eq!(p.styles.source, Path::new("src/scss"));
        assert_eq!(p.styles.dest, Path::new("dist/css"));
        assert_eq!(p.pages.dest, Path::new("dist"));
        assert_eq!(p.images.dest, Path::new("dist/assets/images"));
        assert_eq!(p.fonts.dest, Path::new("dist/assets/fonts"));
        assert_eq!(p.page_entries_dir(), Path::new("src/html/pages"));
    }

    #[test]
    fn classifies_styles_recursively() {
        let p = paths();

        assert_eq!(
            AssetKind::classify(Path::new("src/scss/components/_card.scss"), &p),
            Some(AssetKind::Styles)
        );
        assert_eq!(AssetKind::classify(Path::new("src/scss/notes.txt"), &p), None);
    }

    #[test]
    fn classifies_scripts_top_level_only() {
        let p = paths();

        assert_eq!(
            AssetKind::classify(Path::new("src/js/app.js"), &p),
            Some(AssetKind::Scripts)
        );
        assert_eq!(AssetKind::classify(Path::new("src/js/vendor/lib.js"), &p), None);
    }

    #[test]
    fn classifies_pages_and_fonts() {
        let p = paths();

        assert_eq!(
            AssetKind::classify(Path::new("src/html/partials/nav.njk"), &p),
            Some(AssetKind::Pages)
        );
        assert_eq!(
            AssetKind::classify(Path::new("src/fonts/inter/Inter-Bold.woff2"), &p),
            Some(AssetKind::Fonts)
        );
    }

    #[test]
    fn classifies_images_by_extension() {
        let p = paths();

        assert_eq!(
            AssetKind::classify(Path::new("src/images/icons/logo.SVG"), &p),
            Some(AssetKind::Images)
        );
        assert_eq!(AssetKind::classify(Path::new("src/images/raw.psd"), &p), None);
    }

    #[test]
    fn ignores_unrelated_paths() {
        let p = paths();

        assert_eq!(AssetKind::classify(Path::new("README.md"), &p), None);
        assert_eq!(AssetKind::classify(Path::new("dist/css/main.css"), &p), None);
    }
}

//! Initialize an asset source tree in a project.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Run the init command.
pub async fn run(yes: bool) -> Result<()> {
    tracing::info!("Initializing inlay...");

    let src_dir = Path::new("src");

    if src_dir.exists() && !yes {
        tracing::warn!("src/ directory already exists. Use --yes to overwrite.");
        return Ok(());
    }

    // Create default config
    let config_path = Path::new("inlay.toml");
    if !config_path.exists() || yes {
        fs::write(config_path, DEFAULT_CONFIG).context("Failed to write inlay.toml")?;
        tracing::info!("Created inlay.toml");
    }

    for dir in ["scss", "js", "html/pages", "images", "fonts"] {
        fs::create_dir_all(src_dir.join(dir))
            .with_context(|| format!("Failed to create src/{dir}"))?;
    }

    let starters: &[(&str, &str)] = &[
        ("scss/_variables.scss", DEFAULT_VARIABLES),
        ("scss/main.scss", DEFAULT_SCSS),
        ("js/main.js", DEFAULT_JS),
        ("html/base.njk", DEFAULT_BASE),
        ("html/pages/index.njk", DEFAULT_INDEX),
    ];

    for (rel, content) in starters {
        let path = src_dir.join(rel);
        if !path.exists() || yes {
            fs::write(&path, content).with_context(|| format!("Failed to write src/{rel}"))?;
            tracing::info!("Created src/{rel}");
        }
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'inlay dev' to start the development server.");

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# Inlay configuration

[paths]
# Source tree root
source = "src"

# Destination tree root (regenerated on every run)
dest = "dist"

[serve]
host = "127.0.0.1"
port = 3000
open = false

[build]
# Collapse whitespace in rendered HTML (build pipeline only)
minify_html = true

# JPEG re-encode quality
jpeg_quality = 75

# Strip the root viewBox attribute from SVGs
svg_remove_viewbox = true

[styles]
# Browserslist queries used for vendor prefixing
browsers = ["defaults"]
"#;

const DEFAULT_VARIABLES: &str = r#"$text: #1a1a1a;
$background: #ffffff;
$accent: #2563eb;
"#;

const DEFAULT_SCSS: &str = r#"@use "variables" as *;

body {
  margin: 0 auto;
  max-width: 42rem;
  padding: 2rem 1rem;
  font-family: system-ui, sans-serif;
  color: $text;
  background: $background;
}

a {
  color: $accent;
}
"#;

const DEFAULT_JS: &str = r#"document.addEventListener('DOMContentLoaded', () => {
  console.log('inlay is running');
});
"#;

const DEFAULT_BASE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{% block title %}My Site{% endblock %}</title>
  <link rel="stylesheet" href="/css/main.css">
</head>
<body>
  {% block content %}{% endblock %}
  <script src="/js/main.js"></script>
</body>
</html>
"#;

const DEFAULT_INDEX: &str = r#"{% extends "base.njk" %}

{% block title %}Home{% endblock %}

{% block content %}
<h1>Hello from inlay</h1>
<p>Edit <code>src/html/pages/index.njk</code> and save to reload.</p>
{% endblock %}
"#;

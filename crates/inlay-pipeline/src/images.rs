//! Image step: raster recompression and SVG cleanup.

use std::fs;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use walkdir::WalkDir;

use crate::config::SiteConfig;
use crate::paths::ProjectPaths;
use crate::pipeline::{PipelineError, StepOutcome};

/// Optimize every PNG, JPEG, and SVG under the images source directory,
/// preserving relative subdirectory placement.
///
/// An output is never larger than its source: when recompression grows a
/// file, the original bytes are written instead. Corrupt or undecodable
/// files are logged and skipped without aborting the batch.
pub(crate) fn optimize_images(
    config: &SiteConfig,
    paths: &ProjectPaths,
) -> Result<StepOutcome, PipelineError> {
    let source_dir = &paths.images.source;
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

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if !matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "svg") {
            continue;
        }

        let rel = path.strip_prefix(source_dir).unwrap_or(path);
        let out_path = paths.images.dest.join(rel);
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| PipelineError::Write(e.to_string()))?;
        }

        match optimize_one(path, &ext, config) {
            Ok(bytes) => {
                fs::write(&out_path, bytes).map_err(|e| PipelineError::Write(e.to_string()))?;
                outcome.written += 1;
            }
            Err(e) => {
                tracing::warn!("skipping {}: {}", path.display(), e);
                outcome.skipped += 1;
            }
        }
    }

    Ok(outcome)
}

/// Optimize a single image, returning the bytes to write.
fn optimize_one(path: &Path, ext: &str, config: &SiteConfig) -> Result<Vec<u8>, PipelineError> {
    let original = fs::read(path).map_err(|e| PipelineError::Read(e.to_string()))?;

    let optimized = match ext {
        "svg" => {
            let source = std::str::from_utf8(&original)
                .map_err(|e| PipelineError::Image(format!("invalid utf-8: {e}")))?;
            clean_svg(source, config.build.svg_remove_viewbox)?
        }
        "png" => {
            let img = image::load_from_memory(&original)
                .map_err(|e| PipelineError::Image(e.to_string()))?;
            let mut buf = Vec::new();
            img.write_with_encoder(PngEncoder::new_with_quality(
                &mut buf,
                CompressionType::Best,
                FilterType::Adaptive,
            ))
            .map_err(|e| PipelineError::Image(e.to_string()))?;
            buf
        }
        _ => {
            let img = image::load_from_memory(&original)
                .map_err(|e| PipelineError::Image(e.to_string()))?;
            // JPEG has no alpha channel.
            let rgb = img.into_rgb8();
            let mut buf = Vec::new();
            rgb.write_with_encoder(JpegEncoder::new_with_quality(
                &mut buf,
                config.build.jpeg_quality,
            ))
            .map_err(|e| PipelineError::Image(e.to_string()))?;
            buf
        }
    };

    // Keep whichever is smaller.
    if optimized.len() < original.len() {
        Ok(optimized)
    } else {
        Ok(original)
    }
}

/// Rewrite an SVG, dropping the root `viewBox` attribute when configured.
/// Element `id` attributes and all other content pass through unchanged.
fn clean_svg(source: &str, remove_viewbox: bool) -> Result<Vec<u8>, PipelineError> {
    if !remove_viewbox {
        return Ok(source.as_bytes().to_vec());
    }

    let mut reader = Reader::from_str(source);
    let mut writer = Writer::new(Vec::new());

    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) if e.name().as_ref() == b"svg" => {
                writer
                    .write_event(Event::Start(without_viewbox(&e)))
                    .map_err(|e| PipelineError::Image(e.to_string()))?;
            }
            Ok(Event::Empty(e)) if e.name().as_ref() == b"svg" => {
                writer
                    .write_event(Event::Empty(without_viewbox(&e)))
                    .map_err(|e| PipelineError::Image(e.to_string()))?;
            }
            Ok(event) => {
                writer
                    .write_event(event)
                    .map_err(|e| PipelineError::Image(e.to_string()))?;
            }
            Err(e) => return Err(PipelineError::Image(e.to_string())),
        }
    }

    Ok(writer.into_inner())
}

fn without_viewbox(elem: &BytesStart<'_>) -> BytesStart<'static> {
    let mut out = BytesStart::new("svg");
    for attr in elem.attributes().flatten() {
        if attr.key.as_ref() != b"viewBox" {
            out.push_attribute(attr);
        }
    }
    out
}

//! Output file writing.
//!
//! Serializes the aggregated series as SVG, PNG or JSON and writes the
//! result atomically next to its final location.

use crate::cli::OutputFormat;
use crate::config::ChartStyle;
use crate::models::Aggregate;
use crate::report::chart::render_svg;
use anyhow::{Context, Result};
use resvg::{tiny_skia, usvg};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Render `aggregate` in `format` and write it to `path`.
pub fn write_output(
    aggregate: &Aggregate,
    style: &ChartStyle,
    days_back: u32,
    path: &Path,
    format: OutputFormat,
) -> Result<()> {
    let bytes = match format {
        OutputFormat::Svg => render_svg(aggregate, style, days_back).into_bytes(),
        OutputFormat::Png => rasterize(&render_svg(aggregate, style, days_back), style.scale)?,
        OutputFormat::Json => serde_json::to_vec_pretty(aggregate)
            .context("Failed to serialize aggregate to JSON")?,
    };

    write_atomic(path, &bytes)
        .with_context(|| format!("Failed to write output to {}", path.display()))?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());

    Ok(())
}

/// Rasterize an SVG document to PNG bytes at `scale`.
pub fn rasterize(svg: &str, scale: f32) -> Result<Vec<u8>> {
    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &options).context("Failed to parse chart SVG")?;

    let size = tree.size();
    let width = (size.width() * scale).ceil() as u32;
    let height = (size.height() * scale).ceil() as u32;

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .with_context(|| format!("Invalid image dimensions: {}x{}", width, height))?;
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    pixmap.encode_png().context("Failed to encode PNG")
}

/// Write through a temp file in the destination directory, then rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.persist(path)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailyTotal, TopPage};
    use tempfile::TempDir;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn sample() -> Aggregate {
        Aggregate {
            daily: vec![
                DailyTotal {
                    day: "2024-01-01".to_string(),
                    count: 5,
                },
                DailyTotal {
                    day: "2024-01-02".to_string(),
                    count: 1,
                },
            ],
            top_pages: vec![TopPage {
                path: "/a".to_string(),
                count: 5,
            }],
        }
    }

    fn small_style() -> ChartStyle {
        ChartStyle {
            width: 700,
            height: 300,
            scale: 1.0,
            ..ChartStyle::default()
        }
    }

    #[test]
    fn test_write_svg() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("analytics.svg");

        write_output(&sample(), &small_style(), 30, &path, OutputFormat::Svg).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("<svg"));
        assert!(content.contains("Top Pages"));
    }

    #[test]
    fn test_write_png() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("analytics.png");

        write_output(&sample(), &small_style(), 30, &path, OutputFormat::Png).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(&PNG_SIGNATURE));
    }

    #[test]
    fn test_write_png_empty_aggregate() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.png");

        write_output(
            &Aggregate::default(),
            &small_style(),
            30,
            &path,
            OutputFormat::Png,
        )
        .unwrap();

        assert!(std::fs::read(&path).unwrap().starts_with(&PNG_SIGNATURE));
    }

    #[test]
    fn test_write_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("analytics.json");

        write_output(&sample(), &small_style(), 30, &path, OutputFormat::Json).unwrap();

        let parsed: Aggregate =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn test_write_overwrites_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("analytics.json");
        std::fs::write(&path, "stale").unwrap();

        write_output(&sample(), &small_style(), 30, &path, OutputFormat::Json).unwrap();

        assert!(std::fs::read_to_string(&path).unwrap().contains("top_pages"));
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nope").join("analytics.svg");

        let err = write_output(&sample(), &small_style(), 30, &path, OutputFormat::Svg)
            .unwrap_err();
        assert!(err.to_string().contains("Failed to write output"));
    }
}

//! Chart files written under the output directory

use crate::chart::Chart;
use crate::config::{AssistantConfig, ChartFormat, IMAGE_DIR};
use crate::error::Result;
use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A chart file that has been written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Absolute or output-dir-relative location on disk
    pub path: PathBuf,
    /// Reference relative to the output directory, always `/`-separated
    pub reference: String,
}

impl Artifact {
    /// Markdown image reference, e.g. `![Forecast](image_show/arima_1.png)`
    pub fn markdown(&self, alt: &str) -> String {
        format!("![{alt}]({})", self.reference)
    }
}

/// Writes chart files into `<output_dir>/image_show`
///
/// File names are `<prefix>_<unix millis>.<ext>`. Files are opened with
/// create-new semantics, so two charts saved in the same millisecond get a
/// numeric suffix instead of overwriting each other.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    output_dir: PathBuf,
    format: ChartFormat,
}

impl ArtifactStore {
    pub fn new(output_dir: impl Into<PathBuf>, format: ChartFormat) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
        }
    }

    pub fn from_config(config: &AssistantConfig) -> Self {
        Self::new(config.output_dir.clone(), config.chart_format)
    }

    /// Directory that receives the files
    pub fn directory(&self) -> PathBuf {
        self.output_dir.join(IMAGE_DIR)
    }

    pub fn format(&self) -> ChartFormat {
        self.format
    }

    /// Render `chart` and write it as a new file named after `prefix`
    pub fn save(&self, prefix: &str, chart: &Chart) -> Result<Artifact> {
        let bytes = chart.encode(self.format)?;
        self.write(prefix, &bytes)
    }

    fn write(&self, prefix: &str, bytes: &[u8]) -> Result<Artifact> {
        let dir = self.directory();
        fs::create_dir_all(&dir)?;

        let stem = format!("{}_{}", sanitize(prefix), Utc::now().timestamp_millis());
        let extension = self.format.extension();

        let mut attempt = 0usize;
        loop {
            let name = if attempt == 0 {
                format!("{stem}.{extension}")
            } else {
                format!("{stem}_{attempt}.{extension}")
            };
            let path = dir.join(&name);

            match create_new(&path) {
                Ok(mut file) => {
                    file.write_all(bytes)?;
                    debug!(path = %path.display(), bytes = bytes.len(), "Wrote chart");
                    return Ok(Artifact {
                        path,
                        reference: format!("{IMAGE_DIR}/{name}"),
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn create_new(path: &Path) -> std::io::Result<fs::File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}

/// Keep file name prefixes to a portable character set
fn sanitize(prefix: &str) -> String {
    let cleaned: String = prefix
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "chart".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_writes_under_image_dir() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path(), ChartFormat::Svg);
        let artifact = store.save("stock", &Chart::placeholder("No data")).unwrap();

        assert!(artifact.path.starts_with(dir.path().join(IMAGE_DIR)));
        assert!(artifact.reference.starts_with("image_show/stock_"));
        assert!(artifact.reference.ends_with(".svg"));
        let content = fs::read_to_string(&artifact.path).unwrap();
        assert!(content.contains("No data"));
    }

    #[test]
    fn test_same_millisecond_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path(), ChartFormat::Svg);
        let artifacts: Vec<Artifact> = (0..5)
            .map(|i| store.write("stock", format!("chart {i}").as_bytes()).unwrap())
            .collect();

        let mut paths: Vec<&PathBuf> = artifacts.iter().map(|a| &a.path).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 5);
        for (i, artifact) in artifacts.iter().enumerate() {
            assert_eq!(fs::read_to_string(&artifact.path).unwrap(), format!("chart {i}"));
        }
    }

    #[test]
    fn test_png_artifact() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path(), ChartFormat::Png);
        let artifact = store.save("arima_600519.SH", &Chart::placeholder("x")).unwrap();
        assert!(artifact.reference.starts_with("image_show/arima_600519.SH_"));
        assert!(artifact.reference.ends_with(".png"));
        assert!(fs::metadata(&artifact.path).unwrap().len() > 0);
    }

    #[test]
    fn test_markdown_reference() {
        let artifact = Artifact {
            path: PathBuf::from("/tmp/image_show/stock_1.png"),
            reference: "image_show/stock_1.png".to_string(),
        };
        assert_eq!(artifact.markdown("Stock chart"), "![Stock chart](image_show/stock_1.png)");
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("arima_600519.SH"), "arima_600519.SH");
        assert_eq!(sanitize("a/b c"), "a_b_c");
        assert_eq!(sanitize(""), "chart");
    }
}

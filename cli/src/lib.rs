pub mod monitor;
pub mod source;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use image::GrayImage;
use strum::VariantNames;
use thiserror::Error;
use turbidity::{AnalysisConfig, AnalysisResult, LabelerKind, Pipeline, TurbidityError};

pub use monitor::{run_monitor, MonitorOptions, MonitorSummary};
pub use source::DirectoryFrameSource;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    Analysis(#[from] TurbidityError),
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// File-format helpers for [`AnalysisConfig`]
pub trait ConfigFile: Sized {
    fn from_toml(content: &str) -> Result<Self, CliError>;
    fn from_json(content: &str) -> Result<Self, CliError>;
    fn to_toml(&self) -> Result<String, CliError>;
    fn to_json(&self) -> Result<String, CliError>;

    /// Auto-detect file format from the extension and load
    fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&fs::read_to_string(path_ref)?),
            Some("json") => Self::from_json(&fs::read_to_string(path_ref)?),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }

    /// Auto-detect file format from the extension and save
    fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CliError> {
        let path_ref = path.as_ref();
        let content = match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => self.to_toml()?,
            Some("json") => self.to_json()?,
            _ => return Err(CliError::UnsupportedFileFormat),
        };
        fs::write(path_ref, content)?;
        Ok(())
    }
}

impl ConfigFile for AnalysisConfig {
    fn from_toml(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }

    fn from_json(content: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(content)?)
    }

    fn to_toml(&self) -> Result<String, CliError> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn to_json(&self) -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Command-line overrides layered on top of a configuration file
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Binarization threshold (clamped to 0-255)
    #[arg(short, long, allow_hyphen_values = true)]
    pub threshold: Option<i32>,
    /// Minimum particle size in pixels
    #[arg(long)]
    pub min_size: Option<usize>,
    /// Highest particle count still considered potable
    #[arg(long)]
    pub max_safe: Option<usize>,
    /// Highest particle count still considered moderate risk
    #[arg(long)]
    pub high_risk: Option<usize>,
    /// Gaussian smoothing sigma (0 disables smoothing)
    #[arg(long)]
    pub sigma: Option<f32>,
    /// Labeling algorithm
    #[arg(long, value_parser = parse_labeler)]
    pub labeler: Option<LabelerKind>,
}

fn parse_labeler(value: &str) -> Result<LabelerKind, String> {
    value
        .parse()
        .map_err(|_| format!("expected one of {:?}", LabelerKind::VARIANTS))
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut AnalysisConfig) {
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(min_size) = self.min_size {
            config.min_size = min_size;
        }
        if let Some(max_safe) = self.max_safe {
            config.max_safe = max_safe;
        }
        if let Some(high_risk) = self.high_risk {
            config.high_risk = high_risk;
        }
        if let Some(sigma) = self.sigma {
            config.sigma = sigma;
        }
        if let Some(labeler) = self.labeler {
            config.labeler = labeler;
        }
    }
}

/// Load the configuration file (if any), apply overrides and validate
pub fn resolve_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<AnalysisConfig, CliError> {
    let mut config = match path {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// One analyzed image file
#[derive(Debug, Clone)]
pub struct AnalyzedFrame {
    pub path: PathBuf,
    pub frame: GrayImage,
    pub result: AnalysisResult,
}

/// Load and analyze image files concurrently on the blocking pool.
///
/// Results come back in input order.
pub async fn analyze_files(
    paths: &[PathBuf],
    pipeline: Arc<Pipeline>,
    threshold: i32,
) -> Result<Vec<AnalyzedFrame>, CliError> {
    let handles: Vec<_> = paths
        .iter()
        .cloned()
        .map(|path| {
            let pipeline = Arc::clone(&pipeline);
            tokio::task::spawn_blocking(move || -> Result<AnalyzedFrame, CliError> {
                let frame = image::open(&path).map_err(TurbidityError::from)?.to_luma8();
                let result = pipeline.process(&frame, threshold)?;
                Ok(AnalyzedFrame { path, frame, result })
            })
        })
        .collect();

    let mut analyzed = Vec::with_capacity(handles.len());
    for handle in handles {
        analyzed.push(handle.await??);
    }
    Ok(analyzed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    pub(crate) fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("turbidity_cli_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("Should create scratch dir");
        dir
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = AnalysisConfig {
            threshold: 90,
            labeler: LabelerKind::FloodFill,
            max_dimension: Some(4096),
            ..Default::default()
        };
        let toml = config.to_toml().expect("Should serialize");
        assert!(toml.contains("labeler = \"flood_fill\""));
        assert_eq!(AnalysisConfig::from_toml(&toml).expect("Should parse"), config);
    }

    #[test]
    fn test_from_file_detects_format() {
        let dir = scratch_dir("config");
        let json_path = dir.join("config.json");
        fs::write(&json_path, r#"{ "min_size": 12 }"#).expect("Should write");
        let config = AnalysisConfig::from_file(&json_path).expect("Should load json");
        assert_eq!(config.min_size, 12);

        let toml_path = dir.join("config.toml");
        fs::write(&toml_path, "threshold = 70\nhigh_risk = 80\n").expect("Should write");
        let config = AnalysisConfig::from_file(&toml_path).expect("Should load toml");
        assert_eq!((config.threshold, config.high_risk), (70, 80));

        assert!(matches!(
            AnalysisConfig::from_file(dir.join("config.yaml")),
            Err(CliError::UnsupportedFileFormat)
        ));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_to_file_roundtrips_both_formats() {
        let dir = scratch_dir("to_file");
        let overrides = ConfigOverrides {
            sigma: Some(0.5),
            labeler: Some(LabelerKind::FloodFill),
            ..Default::default()
        };
        let config = resolve_config(None, &overrides).expect("Should resolve");

        for name in ["written.toml", "written.json"] {
            let path = dir.join(name);
            config.to_file(&path).expect("Should write config");
            let loaded = resolve_config(Some(&path), &ConfigOverrides::default()).expect("Should reload");
            assert_eq!(loaded, config);
        }
        assert!(matches!(
            config.to_file(dir.join("written.ini")),
            Err(CliError::UnsupportedFileFormat)
        ));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_overrides_win_and_are_validated() {
        let overrides = ConfigOverrides {
            threshold: Some(-5),
            max_safe: Some(3),
            ..Default::default()
        };
        let config = resolve_config(None, &overrides).expect("Should resolve");
        assert_eq!(config.threshold, -5);
        assert_eq!(config.max_safe, 3);

        let bad = ConfigOverrides {
            max_safe: Some(100),
            ..Default::default()
        };
        assert!(matches!(
            resolve_config(None, &bad),
            Err(CliError::Analysis(TurbidityError::InvalidConfig(_)))
        ));
    }

    #[test]
    fn test_parse_labeler() {
        assert_eq!(parse_labeler("union_find"), Ok(LabelerKind::UnionFind));
        assert!(parse_labeler("watershed").is_err());
    }

    #[tokio::test]
    async fn test_analyze_files_keeps_order() {
        let dir = scratch_dir("analyze");
        let mut paths = Vec::new();
        for count in [2u32, 0, 4] {
            let mut img = GrayImage::from_pixel(60, 20, Luma([240u8]));
            for i in 0..count {
                for y in 8..13 {
                    for x in 4 + i * 12..9 + i * 12 {
                        img.put_pixel(x, y, Luma([10u8]));
                    }
                }
            }
            let path = dir.join(format!("frame_{count}.png"));
            img.save(&path).expect("Should save frame");
            paths.push(path);
        }

        let pipeline = Arc::new(Pipeline::builder().build());
        let analyzed = analyze_files(&paths, pipeline, 128).await.expect("Should analyze");
        let counts: Vec<usize> = analyzed.iter().map(|a| a.result.object_count).collect();
        assert_eq!(counts, vec![2, 0, 4]);
        assert_eq!(analyzed[2].path, paths[2]);
        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_analyze_files_reports_missing_file() {
        let pipeline = Arc::new(Pipeline::builder().build());
        let missing = vec![PathBuf::from("/definitely/not/here.png")];
        assert!(analyze_files(&missing, pipeline, 128).await.is_err());
    }
}

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::classify::Category;
use crate::frame::Rotation;
use crate::gate::DEFAULT_CADENCE;
use crate::preprocess::DEFAULT_CROP_SIZE;

const DEFAULT_SOURCE_PATH: &str = "stub://nature";
const DEFAULT_SOURCE_FPS: u32 = 10;
const DEFAULT_CATEGORY: Category = Category::Plant;
const DEFAULT_MODEL_DIR: &str = "models";
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.1;
const DEFAULT_MAX_RESULTS: usize = 3;

#[derive(Debug, Deserialize, Default)]
struct EcolensConfigFile {
    source: Option<SourceConfigFile>,
    pipeline: Option<PipelineConfigFile>,
    classify: Option<ClassifyConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    path: Option<String>,
    target_fps: Option<u32>,
    rotation_degrees: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct PipelineConfigFile {
    cadence: Option<u32>,
    crop_size: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct ClassifyConfigFile {
    category: Option<String>,
    backend: Option<String>,
    model_dir: Option<PathBuf>,
    confidence_threshold: Option<f32>,
    max_results: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct EcolensConfig {
    pub source: SourceSettings,
    pub pipeline: PipelineSettings,
    pub classify: ClassifySettings,
}

#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub path: String,
    pub target_fps: u32,
    pub rotation: Rotation,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub cadence: u32,
    pub crop_size: u32,
}

#[derive(Debug, Clone)]
pub struct ClassifySettings {
    pub category: Category,
    pub backend: BackendKind,
    pub model_dir: PathBuf,
    pub confidence_threshold: f32,
    pub max_results: usize,
}

/// Which classifier implementation the daemon should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Stub,
    Tract,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Stub => write!(f, "stub"),
            BackendKind::Tract => write!(f, "tract"),
        }
    }
}

impl EcolensConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("ECOLENS_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: EcolensConfigFile) -> Result<Self> {
        let source = SourceSettings {
            path: file
                .source
                .as_ref()
                .and_then(|source| source.path.clone())
                .unwrap_or_else(|| DEFAULT_SOURCE_PATH.to_string()),
            target_fps: file
                .source
                .as_ref()
                .and_then(|source| source.target_fps)
                .unwrap_or(DEFAULT_SOURCE_FPS),
            rotation: match file.source.as_ref().and_then(|source| source.rotation_degrees) {
                Some(degrees) => Rotation::from_degrees(degrees)?,
                None => Rotation::Deg0,
            },
        };
        let pipeline = PipelineSettings {
            cadence: file
                .pipeline
                .as_ref()
                .and_then(|pipeline| pipeline.cadence)
                .unwrap_or(DEFAULT_CADENCE),
            crop_size: file
                .pipeline
                .as_ref()
                .and_then(|pipeline| pipeline.crop_size)
                .unwrap_or(DEFAULT_CROP_SIZE),
        };
        let classify = ClassifySettings {
            category: match file.classify.as_ref().and_then(|classify| classify.category.clone()) {
                Some(category) => category.parse()?,
                None => DEFAULT_CATEGORY,
            },
            backend: match file.classify.as_ref().and_then(|classify| classify.backend.clone()) {
                Some(backend) => parse_backend(&backend)?,
                None => BackendKind::Stub,
            },
            model_dir: file
                .classify
                .as_ref()
                .and_then(|classify| classify.model_dir.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR)),
            confidence_threshold: file
                .classify
                .as_ref()
                .and_then(|classify| classify.confidence_threshold)
                .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
            max_results: file
                .classify
                .and_then(|classify| classify.max_results)
                .unwrap_or(DEFAULT_MAX_RESULTS),
        };
        Ok(Self {
            source,
            pipeline,
            classify,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("ECOLENS_SOURCE_PATH") {
            if !path.trim().is_empty() {
                self.source.path = path;
            }
        }
        if let Ok(category) = std::env::var("ECOLENS_CATEGORY") {
            if !category.trim().is_empty() {
                self.classify.category = category.parse()?;
            }
        }
        if let Ok(backend) = std::env::var("ECOLENS_BACKEND") {
            if !backend.trim().is_empty() {
                self.classify.backend = parse_backend(&backend)?;
            }
        }
        if let Ok(model_dir) = std::env::var("ECOLENS_MODEL_DIR") {
            if !model_dir.trim().is_empty() {
                self.classify.model_dir = PathBuf::from(model_dir);
            }
        }
        if let Ok(cadence) = std::env::var("ECOLENS_CADENCE") {
            let cadence: u32 = cadence
                .parse()
                .map_err(|_| anyhow!("ECOLENS_CADENCE must be an integer frame count"))?;
            self.pipeline.cadence = cadence;
        }
        if let Ok(degrees) = std::env::var("ECOLENS_ROTATION_DEGREES") {
            let degrees: u32 = degrees
                .parse()
                .map_err(|_| anyhow!("ECOLENS_ROTATION_DEGREES must be an integer"))?;
            self.source.rotation = Rotation::from_degrees(degrees)?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.pipeline.cadence == 0 {
            return Err(anyhow!("cadence must be greater than zero"));
        }
        if self.pipeline.crop_size == 0 {
            return Err(anyhow!("crop size must be greater than zero"));
        }
        if self.source.target_fps == 0 {
            return Err(anyhow!("target fps must be greater than zero"));
        }
        if !(0.0..=1.0).contains(&self.classify.confidence_threshold) {
            return Err(anyhow!("confidence threshold must be between 0.0 and 1.0"));
        }
        if self.classify.max_results == 0 {
            return Err(anyhow!("max results must be greater than zero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<EcolensConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn parse_backend(value: &str) -> Result<BackendKind> {
    match value.trim().to_ascii_lowercase().as_str() {
        "stub" => Ok(BackendKind::Stub),
        "tract" => Ok(BackendKind::Tract),
        other => Err(anyhow!(
            "unknown classifier backend '{}' (expected stub/tract)",
            other
        )),
    }
}

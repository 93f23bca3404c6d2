use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use serde_json::Value;

use crate::{
    error::{ReelError, ReelResult},
    pipeline::Pipeline,
};

/// Declarative pipeline file: where sources live, which steps run, where the result goes.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    pub steps: Vec<StepDecl>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub player: PlayerConfig,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
    #[serde(default = "default_fps")]
    pub fps: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlayerConfig {
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

/// Raw step as written in configuration: `[operation, arg, ...]`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct StepDecl(pub Vec<Value>);

impl StepDecl {
    pub fn op(&self) -> ReelResult<&str> {
        match self.0.first() {
            Some(Value::String(op)) => Ok(op),
            Some(other) => Err(ReelError::validation(format!(
                "step operation must be a string, got {other}"
            ))),
            None => Err(ReelError::validation("step must name an operation")),
        }
    }

    pub fn args(&self) -> &[Value] {
        self.0.get(1..).unwrap_or(&[])
    }
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("input")
}

fn default_output_path() -> PathBuf {
    PathBuf::from("output.mp4")
}

fn default_fps() -> u32 {
    30
}

fn default_delay_ms() -> u64 {
    30
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            fps: default_fps(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> ReelResult<Self> {
        serde_json::from_str(json).map_err(|e| ReelError::serde(e.to_string()))
    }

    /// Read a pipeline file. A relative `input_dir` is resolved against the file's directory.
    pub fn load(path: &Path) -> ReelResult<Self> {
        let f = File::open(path).map_err(|e| {
            ReelError::io(format!("failed to open pipeline '{}': {e}", path.display()))
        })?;
        let mut cfg: Self = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            ReelError::serde(format!("failed to parse pipeline '{}': {e}", path.display()))
        })?;
        if cfg.input_dir.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            cfg.input_dir = base.join(&cfg.input_dir);
        }
        Ok(cfg)
    }

    pub fn validate(&self) -> ReelResult<()> {
        if self.output.fps == 0 {
            return Err(ReelError::validation("output fps must be > 0"));
        }
        if self.output.path.as_os_str().is_empty() {
            return Err(ReelError::validation("output path must be non-empty"));
        }
        Ok(())
    }

    /// Validate and resolve every step against the catalog.
    pub fn pipeline(&self) -> ReelResult<Pipeline> {
        self.validate()?;
        Pipeline::from_decls(&self.steps)
    }
}

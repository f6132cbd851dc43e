//! Function code packaging.
//!
//! The deployer never compiles anything itself; it asks a [`Packager`]
//! for the path of a ready artifact.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use xaas_common::config::ProjectConfig;
use xaas_common::error::{Result, XaasError};

/// Produces the code artifact of a stack's function.
pub trait Packager {
    /// Returns the path of the packaged artifact for `stack`.
    ///
    /// # Errors
    ///
    /// Returns [`XaasError::Build`] if the artifact cannot be produced.
    fn compile(&self, stack: &str, config: &ProjectConfig) -> Result<PathBuf>;
}

/// How function artifacts are obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackagingMode {
    /// Run `make build` in each function directory.
    #[default]
    Make,
    /// Use artifacts that already exist on disk.
    Prebuilt,
}

impl PackagingMode {
    /// Creates the packager for this mode.
    #[must_use]
    pub fn packager(self) -> Box<dyn Packager> {
        match self {
            Self::Make => Box::new(MakePackager::new()),
            Self::Prebuilt => Box::new(PrebuiltPackager),
        }
    }
}

/// Runs `make build` in `<functions dir>/<stack>`.
#[derive(Debug, Clone)]
pub struct MakePackager {
    program: String,
    target: String,
}

impl MakePackager {
    /// Packager invoking `make build`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_program("make", "build")
    }

    /// Packager invoking `<program> <target>`.
    #[must_use]
    pub fn with_program(program: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            target: target.into(),
        }
    }
}

impl Default for MakePackager {
    fn default() -> Self {
        Self::new()
    }
}

impl Packager for MakePackager {
    fn compile(&self, stack: &str, config: &ProjectConfig) -> Result<PathBuf> {
        let build_err = |message: String| XaasError::Build {
            stack: stack.to_string(),
            message,
        };
        let program = which::which(&self.program)
            .map_err(|_| build_err(format!("{} not found on PATH", self.program)))?;
        let dir = config.function_dir(stack);
        if !dir.is_dir() {
            return Err(build_err(format!(
                "function source directory {} does not exist",
                dir.display()
            )));
        }

        tracing::info!(stack, dir = %dir.display(), "packaging function");
        let output = Command::new(&program)
            .arg(&self.target)
            .current_dir(&dir)
            .output()
            .map_err(|e| build_err(format!("cannot run {}: {e}", program.display())))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(build_err(format!(
                "{} {} exited with {}: {}",
                self.program,
                self.target,
                output.status,
                stderr.trim()
            )));
        }
        existing_artifact(stack, &config.artifact_path(stack))
    }
}

/// Uses artifacts built ahead of time.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrebuiltPackager;

impl Packager for PrebuiltPackager {
    fn compile(&self, stack: &str, config: &ProjectConfig) -> Result<PathBuf> {
        existing_artifact(stack, &config.artifact_path(stack))
    }
}

fn existing_artifact(stack: &str, path: &Path) -> Result<PathBuf> {
    if path.is_file() {
        tracing::debug!(stack, artifact = %path.display(), "artifact ready");
        Ok(path.to_path_buf())
    } else {
        Err(XaasError::Build {
            stack: stack.to_string(),
            message: format!("artifact {} not found", path.display()),
        })
    }
}

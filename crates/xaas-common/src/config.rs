//! Project configuration resolver.
//!
//! A build needs exactly one required parameter, the product line
//! (`animal`). Every naming fragment and content location is derived
//! from it and from the project root.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{Result, XaasError};

/// Raw inputs the resolver draws from, in precedence order.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    /// Explicit product line (highest precedence).
    pub animal: Option<String>,
    /// Pulumi-style stack configuration file (lowest precedence).
    pub stack_file: Option<PathBuf>,
    /// Directory containing the `assets/` tree.
    pub project_root: PathBuf,
}

impl ConfigSource {
    /// Creates a source rooted at `project_root` with no explicit values.
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Self::default()
        }
    }

    /// Sets the explicit product line.
    #[must_use]
    pub fn with_animal(mut self, animal: impl Into<String>) -> Self {
        self.animal = Some(animal.into());
        self
    }

    /// Sets the stack configuration file.
    #[must_use]
    pub fn with_stack_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.stack_file = Some(path.into());
        self
    }
}

/// Fully resolved, stack-scoped naming and path configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Selected product line.
    pub animal: String,
    /// Short prefix used in every resource name (`<first letter>aas`).
    pub acronym: String,
    /// Project root all relative paths hang from.
    pub project_root: PathBuf,
    /// `<root>/assets`.
    pub assets_dir: PathBuf,
    /// `<assets>/animals/<animal>`.
    pub animal_dir: PathBuf,
    /// `<animal dir>/images/`.
    pub image_dir: PathBuf,
    /// Name of the sidecar metadata file inside the image directory.
    pub metadata_file: String,
    /// `<animal dir>/facts.txt`.
    pub facts_file: PathBuf,
    /// `<assets>/lambda`.
    pub functions_dir: PathBuf,
    /// Packaged artifact path relative to a function's source directory.
    pub artifact_suffix: String,
    /// Object key prefix: the image directory relative to the project root.
    pub object_key_prefix: String,
}

#[derive(Debug, Deserialize)]
struct StackFile {
    #[serde(default)]
    config: BTreeMap<String, serde_yaml::Value>,
}

impl ProjectConfig {
    /// Resolves configuration using the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`XaasError::Configuration`] if no product line can be found
    /// or the stack file is unreadable.
    pub fn resolve(source: &ConfigSource) -> Result<Self> {
        Self::resolve_with(source, |key| std::env::var(key).ok())
    }

    /// Resolves configuration with an injected environment lookup.
    ///
    /// # Errors
    ///
    /// Returns [`XaasError::Configuration`] if no product line can be found
    /// or the stack file is unreadable.
    pub fn resolve_with<F>(source: &ConfigSource, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let explicit = non_empty(source.animal.clone())
            .or_else(|| non_empty(env(constants::ANIMAL_ENV_VAR)));
        let animal = match explicit {
            Some(animal) => animal,
            None => {
                let from_file = match &source.stack_file {
                    Some(path) => animal_from_stack_file(path)?,
                    None => None,
                };
                from_file.ok_or_else(|| {
                    XaasError::config(format!(
                        "missing required parameter \"{}\" (pass --animal, set {}, or add it to the stack file)",
                        constants::ANIMAL_CONFIG_KEY,
                        constants::ANIMAL_ENV_VAR,
                    ))
                })?
            }
        };
        validate_animal(&animal)?;
        tracing::debug!(animal = %animal, "resolved product line");
        Ok(Self::derive(&animal, &source.project_root))
    }

    /// Derives every path and naming fragment from the product line.
    #[must_use]
    pub fn derive(animal: &str, project_root: &Path) -> Self {
        let assets_dir = project_root.join(constants::ASSETS_DIR);
        let animal_dir = assets_dir.join(constants::ANIMALS_DIR).join(animal);
        let image_dir = animal_dir.join(constants::IMAGES_DIR);
        let object_key_prefix = format!(
            "{}/{}/{animal}/{}/",
            constants::ASSETS_DIR,
            constants::ANIMALS_DIR,
            constants::IMAGES_DIR
        );
        Self {
            animal: animal.to_string(),
            acronym: acronym_for(animal),
            project_root: project_root.to_path_buf(),
            facts_file: animal_dir.join(constants::FACTS_FILE),
            functions_dir: assets_dir.join(constants::FUNCTIONS_DIR),
            metadata_file: constants::IMAGE_METADATA_FILE.to_string(),
            artifact_suffix: constants::ARTIFACT_SUFFIX.to_string(),
            assets_dir,
            animal_dir,
            image_dir,
            object_key_prefix,
        }
    }

    /// Path of the sidecar metadata file.
    #[must_use]
    pub fn metadata_path(&self) -> PathBuf {
        self.image_dir.join(&self.metadata_file)
    }

    /// Source directory of a function.
    #[must_use]
    pub fn function_dir(&self, stack: &str) -> PathBuf {
        self.functions_dir.join(stack)
    }

    /// Packaged artifact of a function.
    #[must_use]
    pub fn artifact_path(&self, stack: &str) -> PathBuf {
        self.function_dir(stack).join(&self.artifact_suffix)
    }
}

/// Returns `<first letter of animal>aas`, lower-cased.
#[must_use]
pub fn acronym_for(animal: &str) -> String {
    let first = animal
        .chars()
        .next()
        .map_or_else(String::new, |c| c.to_lowercase().collect());
    format!("{first}{}", constants::ACRONYM_SUFFIX)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn validate_animal(animal: &str) -> Result<()> {
    if animal.contains(['/', '\\']) || animal == "." || animal == ".." {
        return Err(XaasError::config(format!(
            "invalid {} value: \"{animal}\"",
            constants::ANIMAL_CONFIG_KEY
        )));
    }
    Ok(())
}

fn animal_from_stack_file(path: &Path) -> Result<Option<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        XaasError::config(format!("cannot read stack file {}: {e}", path.display()))
    })?;
    let file: StackFile = serde_yaml::from_str(&content).map_err(|e| {
        XaasError::config(format!("malformed stack file {}: {e}", path.display()))
    })?;
    let suffix = format!(":{}", constants::ANIMAL_CONFIG_KEY);
    let value = file
        .config
        .iter()
        .find(|(k, _)| *k == constants::ANIMAL_CONFIG_KEY || k.ends_with(&suffix))
        .and_then(|(_, v)| v.as_str().map(str::to_string));
    Ok(non_empty(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn explicit_animal_derives_paths() {
        let source = ConfigSource::new("/work/project").with_animal("cat");
        let config = ProjectConfig::resolve_with(&source, no_env).expect("resolve");
        assert_eq!(config.acronym, "caas");
        assert_eq!(config.animal_dir, PathBuf::from("/work/project/assets/animals/cat"));
        assert_eq!(
            config.facts_file,
            PathBuf::from("/work/project/assets/animals/cat/facts.txt")
        );
        assert_eq!(
            config.metadata_path(),
            PathBuf::from("/work/project/assets/animals/cat/images/metadata.json")
        );
        assert_eq!(config.object_key_prefix, "assets/animals/cat/images/");
        assert_eq!(
            config.artifact_path("facts"),
            PathBuf::from("/work/project/assets/lambda/facts/bin/main.zip")
        );
    }

    #[test]
    fn missing_animal_is_configuration_error() {
        let source = ConfigSource::new("/work");
        let err = ProjectConfig::resolve_with(&source, no_env).expect_err("should fail");
        assert!(matches!(err, XaasError::Configuration { .. }));
    }

    #[test]
    fn blank_animal_is_treated_as_missing() {
        let source = ConfigSource::new("/work").with_animal("   ");
        assert!(ProjectConfig::resolve_with(&source, no_env).is_err());
    }

    #[test]
    fn env_var_is_used_when_no_explicit_value() {
        let source = ConfigSource::new("/work");
        let config = ProjectConfig::resolve_with(&source, |k| {
            (k == constants::ANIMAL_ENV_VAR).then(|| "dog".to_string())
        })
        .expect("resolve");
        assert_eq!(config.animal, "dog");
        assert_eq!(config.acronym, "daas");
    }

    #[test]
    fn explicit_value_wins_over_env() {
        let source = ConfigSource::new("/work").with_animal("cat");
        let config =
            ProjectConfig::resolve_with(&source, |_| Some("dog".into())).expect("resolve");
        assert_eq!(config.animal, "cat");
    }

    #[test]
    fn stack_file_with_namespaced_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Pulumi.dev.yaml");
        std::fs::write(&path, "config:\n  aws:region: eu-west-1\n  xaas:animal: goat\n")
            .expect("write");
        let source = ConfigSource::new(dir.path()).with_stack_file(&path);
        let config = ProjectConfig::resolve_with(&source, no_env).expect("resolve");
        assert_eq!(config.animal, "goat");
        assert_eq!(config.acronym, "gaas");
    }

    #[test]
    fn stack_file_without_animal_is_configuration_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Pulumi.dev.yaml");
        std::fs::write(&path, "config:\n  aws:region: eu-west-1\n").expect("write");
        let source = ConfigSource::new(dir.path()).with_stack_file(&path);
        let err = ProjectConfig::resolve_with(&source, no_env).expect_err("should fail");
        assert!(matches!(err, XaasError::Configuration { .. }));
    }

    #[test]
    fn malformed_stack_file_is_configuration_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Pulumi.dev.yaml");
        std::fs::write(&path, "config: [unclosed").expect("write");
        let source = ConfigSource::new(dir.path()).with_stack_file(&path);
        assert!(ProjectConfig::resolve_with(&source, no_env).is_err());
    }

    #[test]
    fn path_like_animal_is_rejected() {
        let source = ConfigSource::new("/work").with_animal("../etc");
        assert!(ProjectConfig::resolve_with(&source, no_env).is_err());
    }

    #[test]
    fn acronym_lowercases_first_letter() {
        assert_eq!(acronym_for("Llama"), "laas");
    }
}

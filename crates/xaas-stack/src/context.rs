//! Explicit build context threaded through every build step.

use xaas_common::config::ProjectConfig;
use xaas_common::error::Result;
use xaas_common::types::ResourceName;
use xaas_graph::{Declaration, InfrastructureBundle, Output, Provisioner, ResourceHandle};

/// Everything a build step needs: configuration, the provisioning
/// boundary, and the bundle of handles declared so far.
pub struct BuildContext<'a> {
    config: &'a ProjectConfig,
    provisioner: &'a mut dyn Provisioner,
    bundle: InfrastructureBundle,
}

impl<'a> BuildContext<'a> {
    /// Starts an empty build.
    pub fn new(config: &'a ProjectConfig, provisioner: &'a mut dyn Provisioner) -> Self {
        Self {
            config,
            provisioner,
            bundle: InfrastructureBundle::new(),
        }
    }

    /// Resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &ProjectConfig {
        self.config
    }

    /// `<acronym>-<part>-<part>...`, sanitized.
    #[must_use]
    pub fn name(&self, parts: &[&str]) -> ResourceName {
        let mut raw = self.config.acronym.clone();
        for part in parts {
            raw.push('-');
            raw.push_str(part);
        }
        ResourceName::new(raw)
    }

    /// Declares a resource and records its handle in the bundle.
    ///
    /// # Errors
    ///
    /// Propagates the provisioner's rejection unchanged.
    pub fn declare(&mut self, declaration: Declaration) -> Result<ResourceHandle> {
        let handle = self.provisioner.declare(declaration)?;
        tracing::debug!(kind = %handle.kind(), name = %handle.name(), "declared");
        self.bundle.record(handle.clone());
        Ok(handle)
    }

    /// Publishes a stack output.
    ///
    /// # Errors
    ///
    /// Propagates the provisioner's rejection unchanged.
    pub fn export(&mut self, name: &str, value: Output) -> Result<()> {
        self.provisioner.export(name, value)
    }

    /// Handles declared so far.
    #[must_use]
    pub const fn bundle(&self) -> &InfrastructureBundle {
        &self.bundle
    }

    /// Ends the build, returning the bundle.
    #[must_use]
    pub fn into_bundle(self) -> InfrastructureBundle {
        self.bundle
    }
}

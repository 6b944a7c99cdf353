use std::collections::BTreeSet;

use anyhow::anyhow;
use isopack_core::Requirement;
use isopack_store::{InstalledIndex, StoreLayout};

use crate::env::ProcessEnvironment;
use crate::error::SandboxError;
use crate::pkgman::{Activator, Installer};

/// One declared dependency: a name, the merged version constraints, and
/// the environments it applies to. An empty environment set applies
/// everywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub requirement: Requirement,
    pub environments: BTreeSet<String>,
}

impl Entry {
    pub(crate) fn new(
        name: impl Into<String>,
        requirement: Requirement,
        environments: BTreeSet<String>,
    ) -> Self {
        Self {
            name: name.into(),
            requirement,
            environments,
        }
    }

    pub fn matches(&self, environment: &str) -> bool {
        self.environments.is_empty() || self.environments.contains(environment)
    }

    /// Merge a re-declaration into this entry. Constraints accumulate;
    /// environment scopes widen, with an unscoped declaration making the
    /// entry apply everywhere.
    pub(crate) fn update(
        &mut self,
        requirement: &Requirement,
        environments: &BTreeSet<String>,
    ) -> Result<(), SandboxError> {
        let merged =
            self.requirement
                .merged(requirement)
                .map_err(|source| SandboxError::Conflict {
                    name: self.name.clone(),
                    existing: self.requirement.to_string(),
                    requested: requirement.to_string(),
                    source,
                })?;
        self.requirement = merged;

        if environments.is_empty() {
            self.environments.clear();
        } else if !self.environments.is_empty() {
            self.environments.extend(environments.iter().cloned());
        }
        Ok(())
    }

    pub(crate) fn install(
        &self,
        installer: &dyn Installer,
        layout: &StoreLayout,
    ) -> Result<(), SandboxError> {
        installer
            .install(&self.name, &self.requirement, layout)
            .map_err(|source| SandboxError::Install {
                name: self.name.clone(),
                requirement: self.requirement.to_string(),
                source,
            })
    }

    pub(crate) fn activate(
        &self,
        index: &mut InstalledIndex,
        activator: &dyn Activator,
        env: &mut dyn ProcessEnvironment,
    ) -> Result<(), SandboxError> {
        let found = index
            .find(&self.name, &self.requirement)
            .map_err(|source| SandboxError::Index { source })?;
        let Some(spec) = found else {
            return Err(SandboxError::Activation {
                name: self.name.clone(),
                requirement: self.requirement.to_string(),
                source: anyhow!("no installed version satisfies the requirement"),
            });
        };

        activator
            .activate(&spec, index.layout(), env)
            .map_err(|source| SandboxError::Activation {
                name: self.name.clone(),
                requirement: self.requirement.to_string(),
                source,
            })
    }
}

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use isopack_core::{PackageSpec, Requirement};
use isopack_store::{expose_binary, install_tree, uninstall_package, InstalledIndex, StoreLayout};

use crate::env::ProcessEnvironment;

/// Installs a package satisfying a requirement into the isolation path.
pub trait Installer {
    fn install(&self, name: &str, requirement: &Requirement, layout: &StoreLayout) -> Result<()>;
}

/// Removes an installed package from the isolation path.
pub trait Uninstaller {
    fn uninstall(
        &self,
        spec: &PackageSpec,
        layout: &StoreLayout,
        options: &UninstallOptions,
    ) -> Result<()>;
}

/// Makes an installed package's code reachable to the running process.
pub trait Activator {
    fn activate(
        &self,
        spec: &PackageSpec,
        layout: &StoreLayout,
        env: &mut dyn ProcessEnvironment,
    ) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UninstallOptions {
    pub ignore_dependents: bool,
    pub remove_executables: bool,
}

/// Default installer: copies a prebuilt package tree out of a local,
/// store-shaped source directory. Remote channels belong to a different
/// installer implementation.
#[derive(Debug, Clone)]
pub struct StoreInstaller {
    source: Option<PathBuf>,
}

impl StoreInstaller {
    pub fn new(source: Option<PathBuf>) -> Self {
        Self { source }
    }
}

impl Installer for StoreInstaller {
    fn install(&self, name: &str, requirement: &Requirement, layout: &StoreLayout) -> Result<()> {
        let Some(source) = &self.source else {
            return Err(anyhow!(
                "no package source configured; set the sandbox 'source' option"
            ));
        };

        let mut source_index = InstalledIndex::open(source);
        let found = source_index
            .find(name, requirement)
            .with_context(|| format!("failed to read package source: {}", source.display()))?;
        let Some(spec) = found else {
            return Err(anyhow!(
                "package '{name}' ({requirement}) not found in source: {}",
                source.display()
            ));
        };

        let staged = source_index
            .layout()
            .package_dir(&spec.name, &spec.version.to_string());
        install_tree(layout, &spec, &staged)
            .with_context(|| format!("failed to copy '{}' into the sandbox", spec.full_name()))?;
        Ok(())
    }
}

/// Default uninstaller over the store's removal primitives. The store
/// tracks no dependents of its own, so `ignore_dependents` is inherently
/// honored.
#[derive(Debug, Clone, Default)]
pub struct StoreUninstaller;

impl StoreUninstaller {
    pub fn new() -> Self {
        Self
    }
}

impl Uninstaller for StoreUninstaller {
    fn uninstall(
        &self,
        spec: &PackageSpec,
        layout: &StoreLayout,
        options: &UninstallOptions,
    ) -> Result<()> {
        uninstall_package(layout, spec, options.remove_executables)
    }
}

/// Default activator: prepends the package's `lib/` directory to the load
/// path and exposes its declared executables in the sandbox `bin/`.
#[derive(Debug, Clone, Default)]
pub struct PathActivator;

impl PathActivator {
    pub fn new() -> Self {
        Self
    }
}

impl Activator for PathActivator {
    fn activate(
        &self,
        spec: &PackageSpec,
        layout: &StoreLayout,
        env: &mut dyn ProcessEnvironment,
    ) -> Result<()> {
        let package_dir = layout.package_dir(&spec.name, &spec.version.to_string());
        let lib_dir = package_dir.join("lib");

        let mut load_path = env.load_path();
        if !load_path.contains(&lib_dir) {
            load_path.insert(0, lib_dir);
            env.set_load_path(&load_path);
        }

        for executable in &spec.executables {
            expose_binary(
                layout,
                &package_dir,
                executable,
                &format!("bin/{executable}"),
            )
            .with_context(|| format!("failed to expose '{executable}' from {}", spec.full_name()))?;
        }

        Ok(())
    }
}

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use isopack_core::{DeclarationFile, PackageSpec, Requirement};
use isopack_store::{InstalledIndex, StoreLayout};

use crate::cleanup;
use crate::entry::Entry;
use crate::env::{
    split_path_list, EnvSnapshot, ProcessEnvironment, SystemEnvironment, PACKAGE_HOME_VAR,
    PACKAGE_PATH_VAR, PATH_LIST_SEPARATOR, PATH_VAR, SANDBOX_MARKER_VAR,
};
use crate::error::SandboxError;
use crate::events::{Hook, Observer};
use crate::options::{FileOption, Options, DEFAULT_DECLARATION_FILE};
use crate::pkgman::{
    Activator, Installer, PathActivator, StoreInstaller, StoreUninstaller, Uninstaller,
    UninstallOptions,
};

/// Overrides the environment name for `activate(None)`.
pub const ENVIRONMENT_VAR: &str = "ISOPACK_ENV";
/// Conventional application-environment variable, consulted second.
pub const FALLBACK_ENVIRONMENT_VAR: &str = "APP_ENV";
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// An isolated, reproducible package environment for one project. Owns
/// the declared entries, the process-state snapshot, and the installed
/// index, and drives the lifecycle:
/// initialize → enable → install → activate → cleanup → disable.
///
/// Only one sandbox should be enabled at a time per process: enable
/// snapshots process-global state, so a second sandbox's snapshot would
/// capture the first one's mutations.
pub struct Sandbox {
    options: Options,
    entries: Vec<Entry>,
    environments: Vec<BTreeSet<String>>,
    files: Vec<PathBuf>,
    enabled: bool,
    saved_env: Option<EnvSnapshot>,
    index: InstalledIndex,
    env: Box<dyn ProcessEnvironment>,
    observers: Vec<Box<dyn Observer>>,
    installer: Box<dyn Installer>,
    installer_is_default: bool,
    uninstaller: Box<dyn Uninstaller>,
    activator: Box<dyn Activator>,
}

impl std::fmt::Debug for Sandbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sandbox")
            .field("options", &self.options)
            .field("entries", &self.entries)
            .field("environments", &self.environments)
            .field("files", &self.files)
            .field("enabled", &self.enabled)
            .field("saved_env", &self.saved_env)
            .field("index", &self.index)
            .field("installer_is_default", &self.installer_is_default)
            .finish_non_exhaustive()
    }
}

impl Sandbox {
    pub fn new(options: Options) -> Self {
        Self::with_environment(options, Box::new(SystemEnvironment::new()))
    }

    pub fn with_environment(options: Options, env: Box<dyn ProcessEnvironment>) -> Self {
        let index = InstalledIndex::open(options.isolation_path());
        let installer = Box::new(StoreInstaller::new(options.source.clone()));
        Self {
            options,
            entries: Vec::new(),
            environments: Vec::new(),
            files: Vec::new(),
            enabled: false,
            saved_env: None,
            index,
            env,
            observers: Vec::new(),
            installer,
            installer_is_default: true,
            uninstaller: Box::new(StoreUninstaller::new()),
            activator: Box::new(PathActivator::new()),
        }
    }

    pub fn with_collaborators(
        options: Options,
        env: Box<dyn ProcessEnvironment>,
        installer: Box<dyn Installer>,
        uninstaller: Box<dyn Uninstaller>,
        activator: Box<dyn Activator>,
    ) -> Self {
        let mut sandbox = Self::with_environment(options, env);
        sandbox.installer = installer;
        sandbox.installer_is_default = false;
        sandbox.uninstaller = uninstaller;
        sandbox.activator = activator;
        sandbox
    }

    pub fn register(&mut self, observer: Box<dyn Observer>) {
        self.observers.push(observer);
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn installed(&mut self) -> Result<Vec<PackageSpec>, SandboxError> {
        self.index
            .all_installed()
            .map(<[PackageSpec]>::to_vec)
            .map_err(|source| SandboxError::Index { source })
    }

    /// Declare a dependency. Re-declaring a name merges the requirement
    /// into the existing entry instead of creating a duplicate.
    pub fn declare(&mut self, name: &str, requirement: &str) -> Result<(), SandboxError> {
        let parsed =
            Requirement::parse(requirement).map_err(|source| SandboxError::InvalidRequirement {
                name: name.to_string(),
                requirement: requirement.to_string(),
                source,
            })?;
        let scope = self.current_scope();
        self.declare_parsed(name, parsed, scope)
    }

    /// Scope the declarations made inside the block to the given
    /// environments. Blocks nest; the innermost declaration carries the
    /// union of every enclosing scope.
    pub fn scoped<T, F>(&mut self, environments: &[&str], block: F) -> Result<T, SandboxError>
    where
        F: FnOnce(&mut Self) -> Result<T, SandboxError>,
    {
        self.environments
            .push(environments.iter().map(|name| name.to_string()).collect());
        let result = block(self);
        self.environments.pop();
        result
    }

    fn current_scope(&self) -> BTreeSet<String> {
        self.environments.iter().flatten().cloned().collect()
    }

    fn declare_parsed(
        &mut self,
        name: &str,
        requirement: Requirement,
        environments: BTreeSet<String>,
    ) -> Result<(), SandboxError> {
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(existing) => existing.update(&requirement, &environments),
            None => {
                self.entries.push(Entry::new(name, requirement, environments));
                Ok(())
            }
        }
    }

    /// Load the declaration sources: the configured file, then the inline
    /// block, then the `.local` override. Later sources merge into
    /// entries declared by earlier ones.
    pub fn initialize(&mut self) -> Result<&mut Self, SandboxError> {
        self.initialize_with(|_| Ok(()))
    }

    pub fn initialize_with<F>(&mut self, declare: F) -> Result<&mut Self, SandboxError>
    where
        F: FnOnce(&mut Self) -> Result<(), SandboxError>,
    {
        self.fire(Hook::Initializing)?;

        let primary = match self.options.file.clone() {
            FileOption::Explicit(path) => {
                self.load_declaration_file(&path)?;
                Some(path)
            }
            FileOption::Discover => {
                let path = PathBuf::from(DEFAULT_DECLARATION_FILE);
                if path.exists() {
                    self.load_declaration_file(&path)?;
                }
                Some(path)
            }
            FileOption::Disabled => None,
        };

        declare(self)?;

        if let Some(path) = &primary {
            let local = local_override_path(path);
            if local.exists() {
                self.load_declaration_file(&local)?;
            }
        }

        // The file may have merged options, so rebuild everything derived
        // from them.
        self.index = InstalledIndex::open(self.options.isolation_path());
        if self.installer_is_default {
            self.installer = Box::new(StoreInstaller::new(self.options.source.clone()));
        }

        self.fire(Hook::Initialized)?;
        Ok(self)
    }

    fn load_declaration_file(&mut self, path: &Path) -> Result<(), SandboxError> {
        let file = DeclarationFile::load(path).map_err(|source| SandboxError::Config {
            path: path.to_path_buf(),
            source,
        })?;

        self.options.merge(&file.options);
        for record in &file.packages {
            let environments: BTreeSet<String> = record.environments.iter().cloned().collect();
            let requirement = Requirement::from_req(record.requirement.clone());
            self.declare_parsed(&record.name, requirement, environments)?;
        }
        self.files.push(path.to_path_buf());
        Ok(())
    }

    /// Apply the isolation to process-global state. Idempotent.
    pub fn enable(&mut self) -> Result<&mut Self, SandboxError> {
        if self.enabled {
            return Ok(self);
        }
        self.fire(Hook::Enabling)?;

        let snapshot = EnvSnapshot::capture(self.env.as_ref());
        let isolation = self.options.isolation_path();
        let isolation_value = isolation.to_string_lossy().into_owned();
        let ambient_search = self.env.var(PACKAGE_PATH_VAR);

        self.env.set_var(PACKAGE_HOME_VAR, &isolation_value);
        let search_path = match (&ambient_search, self.options.system) {
            (Some(ambient), true) if !ambient.is_empty() => {
                format!("{isolation_value}{PATH_LIST_SEPARATOR}{ambient}")
            }
            _ => isolation_value.clone(),
        };
        self.env.set_var(PACKAGE_PATH_VAR, &search_path);

        if !self.options.system {
            let ambient_roots = ambient_search
                .as_deref()
                .map(split_path_list)
                .unwrap_or_default();
            let pruned: Vec<PathBuf> = self
                .env
                .load_path()
                .into_iter()
                .filter(|dir| !ambient_roots.iter().any(|root| dir.starts_with(root)))
                .collect();
            self.env.set_load_path(&pruned);
        }

        let bin_value = StoreLayout::new(&isolation)
            .bin_dir()
            .to_string_lossy()
            .into_owned();
        let path_value = match self.env.var(PATH_VAR) {
            Some(prior) if !prior.is_empty() => {
                format!("{bin_value}{PATH_LIST_SEPARATOR}{prior}")
            }
            _ => bin_value,
        };
        self.env.set_var(PATH_VAR, &path_value);
        self.env.set_var(SANDBOX_MARKER_VAR, &isolation_value);

        self.saved_env = Some(snapshot);
        self.enabled = true;
        self.fire(Hook::Enabled)?;
        Ok(self)
    }

    /// Restore the pre-enable process state verbatim. Idempotent.
    pub fn disable(&mut self) -> Result<&mut Self, SandboxError> {
        if !self.enabled {
            return Ok(self);
        }
        self.fire(Hook::Disabling)?;

        if let Some(snapshot) = self.saved_env.take() {
            snapshot.restore(self.env.as_mut());
        }
        self.enabled = false;

        self.fire(Hook::Disabled)?;
        Ok(self)
    }

    /// Run the block with isolation lifted, re-enabling afterward on both
    /// the success and the error exit path.
    pub fn run_disabled<T, F>(&mut self, block: F) -> Result<T, SandboxError>
    where
        F: FnOnce(&mut Self) -> Result<T, SandboxError>,
    {
        let was_enabled = self.enabled;
        self.disable()?;
        let result = block(self);
        if was_enabled {
            match self.enable() {
                Ok(_) => {}
                Err(enable_err) => {
                    if result.is_ok() {
                        return Err(enable_err);
                    }
                }
            }
        }
        result
    }

    /// The full activation sequence for the resolved environment: ensure
    /// enabled, install what is missing, activate every matching entry in
    /// declaration order, then reconcile the store.
    pub fn activate(&mut self, environment: Option<&str>) -> Result<&mut Self, SandboxError> {
        self.enable()?;
        self.fire(Hook::Activating)?;

        let environment = self.effective_environment(environment);

        if self.options.install {
            self.install(&environment)?;
        }

        for entry in &self.entries {
            if !entry.matches(&environment) {
                continue;
            }
            entry.activate(&mut self.index, self.activator.as_ref(), self.env.as_mut())?;
        }

        if self.options.install && self.options.cleanup {
            self.cleanup()?;
        }

        self.fire(Hook::Activated)?;
        Ok(self)
    }

    fn effective_environment(&self, explicit: Option<&str>) -> String {
        if let Some(explicit) = explicit {
            return explicit.to_string();
        }
        for var in [ENVIRONMENT_VAR, FALLBACK_ENVIRONMENT_VAR] {
            if let Some(value) = self.env.var(var) {
                if !value.is_empty() {
                    return value;
                }
            }
        }
        DEFAULT_ENVIRONMENT.to_string()
    }

    fn install(&mut self, environment: &str) -> Result<(), SandboxError> {
        self.fire(Hook::Installing)?;

        let mut missing = Vec::new();
        for (position, entry) in self.entries.iter().enumerate() {
            if !entry.matches(environment) {
                continue;
            }
            let satisfied = self
                .index
                .find(&entry.name, &entry.requirement)
                .map_err(|source| SandboxError::Index { source })?
                .is_some();
            if !satisfied {
                missing.push(position);
            }
        }

        let total = missing.len();
        for (sequence, position) in missing.iter().enumerate() {
            let entry = &self.entries[*position];
            self.note(&format!(
                "[{}/{}] Isolating {} ({})",
                sequence + 1,
                total,
                entry.name,
                entry.requirement
            ));
            entry.install(self.installer.as_ref(), self.index.layout())?;
        }

        self.index.refresh();
        self.fire(Hook::Installed)?;
        Ok(())
    }

    /// Remove every installed package no longer reachable from the
    /// declared entries. Individual removal failures are reported and
    /// skipped; the sweep continues. Returns the removed specs.
    pub fn cleanup(&mut self) -> Result<Vec<PackageSpec>, SandboxError> {
        self.fire(Hook::Cleaning)?;

        let installed = self
            .index
            .all_installed()
            .map_err(|source| SandboxError::Index { source })?
            .to_vec();
        let legit = cleanup::legitimate(&mut self.index, &self.entries)
            .map_err(|source| SandboxError::Index { source })?;
        let legit_names: HashSet<String> = legit.iter().map(PackageSpec::full_name).collect();

        let mut extra: Vec<PackageSpec> = installed
            .into_iter()
            .filter(|spec| !legit_names.contains(&spec.full_name()))
            .collect();
        extra.sort_by_key(PackageSpec::full_name);

        let options = UninstallOptions {
            ignore_dependents: true,
            remove_executables: true,
        };
        let total = extra.len();
        let mut removed = Vec::new();
        for (sequence, spec) in extra.iter().enumerate() {
            self.note(&format!(
                "[{}/{}] Nuking {}",
                sequence + 1,
                total,
                spec.full_name()
            ));
            match self.uninstaller.uninstall(spec, self.index.layout(), &options) {
                Ok(()) => removed.push(spec.clone()),
                Err(err) => {
                    eprintln!("isopack: failed to remove {}: {err:#}", spec.full_name());
                }
            }
        }

        self.index.refresh();
        self.fire(Hook::Cleaned)?;
        Ok(removed)
    }

    fn fire(&mut self, hook: Hook) -> Result<(), SandboxError> {
        for observer in &mut self.observers {
            observer
                .on_hook(hook)
                .map_err(|source| SandboxError::Hook { hook, source })?;
        }
        Ok(())
    }

    fn note(&self, message: &str) {
        if self.options.verbose {
            eprintln!("{message}");
        }
    }
}

fn local_override_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("isopack");
    let file_name = match path.extension().and_then(|value| value.to_str()) {
        Some(extension) => format!("{stem}.local.{extension}"),
        None => format!("{stem}.local"),
    };
    path.with_file_name(file_name)
}

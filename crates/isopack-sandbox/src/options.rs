use std::path::{Path, PathBuf};

use isopack_core::DeclaredOptions;

pub const DEFAULT_DECLARATION_FILE: &str = "isopack.toml";
const DEFAULT_ISOLATION_ROOT: &str = ".isopack";

/// Where declarations come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOption {
    /// Load `isopack.toml` from the working directory when present.
    Discover,
    /// Load exactly this file; missing or malformed is fatal.
    Explicit(PathBuf),
    /// Load no declaration files at all.
    Disabled,
}

/// Resolved sandbox configuration. Immutable after the sandbox is
/// constructed, except for an explicit `merge` of a declaration file's
/// `[options]` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub(crate) path: PathBuf,
    pub(crate) source: Option<PathBuf>,
    pub(crate) install: bool,
    pub(crate) cleanup: bool,
    pub(crate) verbose: bool,
    pub(crate) system: bool,
    pub(crate) multiruntime: bool,
    pub(crate) file: FileOption,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_ISOLATION_ROOT),
            source: None,
            install: true,
            cleanup: true,
            verbose: true,
            system: true,
            multiruntime: true,
            file: FileOption::Discover,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn install(mut self, install: bool) -> Self {
        self.install = install;
        self
    }

    pub fn cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn system(mut self, system: bool) -> Self {
        self.system = system;
        self
    }

    pub fn multiruntime(mut self, multiruntime: bool) -> Self {
        self.multiruntime = multiruntime;
        self
    }

    pub fn file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = FileOption::Explicit(file.into());
        self
    }

    pub fn no_file(mut self) -> Self {
        self.file = FileOption::Disabled;
        self
    }

    pub fn root_path(&self) -> &Path {
        &self.path
    }

    /// The private package location. A pure function of the options: the
    /// configured root, suffixed with the runtime tag unless multiruntime
    /// is off.
    pub fn isolation_path(&self) -> PathBuf {
        if self.multiruntime {
            self.path.join(runtime_tag())
        } else {
            self.path.clone()
        }
    }

    /// Apply a declaration file's `[options]` table.
    pub fn merge(&mut self, declared: &DeclaredOptions) {
        if let Some(path) = &declared.path {
            self.path = path.clone();
        }
        if let Some(source) = &declared.source {
            self.source = Some(source.clone());
        }
        if let Some(install) = declared.install {
            self.install = install;
        }
        if let Some(cleanup) = declared.cleanup {
            self.cleanup = cleanup;
        }
        if let Some(verbose) = declared.verbose {
            self.verbose = verbose;
        }
        if let Some(system) = declared.system {
            self.system = system;
        }
        if let Some(multiruntime) = declared.multiruntime {
            self.multiruntime = multiruntime;
        }
    }
}

/// Platform identity used to keep isolation paths of different runtimes
/// from colliding.
pub fn runtime_tag() -> String {
    format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH)
}

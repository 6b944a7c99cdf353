mod cleanup;
mod entry;
mod env;
mod error;
mod events;
mod options;
mod pkgman;
mod sandbox;

pub use entry::Entry;
pub use env::{
    EnvSnapshot, ProcessEnvironment, SystemEnvironment, LOAD_PATH_VAR, PACKAGE_HOME_VAR,
    PACKAGE_PATH_VAR, PATH_VAR, SANDBOX_MARKER_VAR,
};
pub use error::SandboxError;
pub use events::{Hook, Observer};
pub use options::{runtime_tag, FileOption, Options, DEFAULT_DECLARATION_FILE};
pub use pkgman::{
    Activator, Installer, PathActivator, StoreInstaller, StoreUninstaller, Uninstaller,
    UninstallOptions,
};
pub use sandbox::{Sandbox, DEFAULT_ENVIRONMENT, ENVIRONMENT_VAR, FALLBACK_ENVIRONMENT_VAR};

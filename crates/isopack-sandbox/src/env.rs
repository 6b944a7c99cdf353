use std::path::PathBuf;

/// Package search path, analogous to a gem path.
pub const PACKAGE_PATH_VAR: &str = "ISOPACK_PATH";
/// Install target for new packages.
pub const PACKAGE_HOME_VAR: &str = "ISOPACK_HOME";
/// Marker announcing that an isolated sandbox is active.
pub const SANDBOX_MARKER_VAR: &str = "ISOPACK_SANDBOX";
/// Code search path consumed by activated packages.
pub const LOAD_PATH_VAR: &str = "ISOPACK_LOAD_PATH";
/// Executable search path.
pub const PATH_VAR: &str = "PATH";

pub(crate) const PATH_LIST_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };

pub(crate) const TRACKED_VARS: [&str; 4] = [
    PACKAGE_PATH_VAR,
    PACKAGE_HOME_VAR,
    SANDBOX_MARKER_VAR,
    PATH_VAR,
];

/// The process-global state the sandbox mutates, behind a capability so
/// tests can substitute a fake instead of touching the real process.
pub trait ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String>;
    fn set_var(&mut self, name: &str, value: &str);
    fn remove_var(&mut self, name: &str);
    fn load_path(&self) -> Vec<PathBuf>;
    fn set_load_path(&mut self, entries: &[PathBuf]);
}

/// Verbatim record of the tracked variables and the load path, restored
/// exactly on disable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: Vec<(String, Option<String>)>,
    load_path: Vec<PathBuf>,
}

impl EnvSnapshot {
    pub fn capture(env: &dyn ProcessEnvironment) -> Self {
        Self {
            vars: TRACKED_VARS
                .iter()
                .map(|name| (name.to_string(), env.var(name)))
                .collect(),
            load_path: env.load_path(),
        }
    }

    pub fn restore(&self, env: &mut dyn ProcessEnvironment) {
        for (name, value) in &self.vars {
            match value {
                Some(value) => env.set_var(name, value),
                None => env.remove_var(name),
            }
        }
        env.set_load_path(&self.load_path);
    }
}

pub(crate) fn join_path_list(entries: &[PathBuf]) -> String {
    entries
        .iter()
        .map(|entry| entry.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(&PATH_LIST_SEPARATOR.to_string())
}

pub(crate) fn split_path_list(value: &str) -> Vec<PathBuf> {
    value
        .split(PATH_LIST_SEPARATOR)
        .filter(|piece| !piece.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// The real process environment. The load path is backed by the
/// `ISOPACK_LOAD_PATH` variable as a separator-joined list.
#[derive(Debug, Default)]
pub struct SystemEnvironment;

impl SystemEnvironment {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessEnvironment for SystemEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn set_var(&mut self, name: &str, value: &str) {
        std::env::set_var(name, value);
    }

    fn remove_var(&mut self, name: &str) {
        std::env::remove_var(name);
    }

    fn load_path(&self) -> Vec<PathBuf> {
        self.var(LOAD_PATH_VAR)
            .map(|value| split_path_list(&value))
            .unwrap_or_default()
    }

    fn set_load_path(&mut self, entries: &[PathBuf]) {
        if entries.is_empty() {
            self.remove_var(LOAD_PATH_VAR);
        } else {
            let joined = join_path_list(entries);
            self.set_var(LOAD_PATH_VAR, &joined);
        }
    }
}

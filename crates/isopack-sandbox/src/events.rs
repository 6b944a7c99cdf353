use std::fmt;

/// Lifecycle points a sandbox announces. Hooks fire synchronously on the
/// calling thread, in observer registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    Initializing,
    Initialized,
    Enabling,
    Enabled,
    Activating,
    Activated,
    Installing,
    Installed,
    Cleaning,
    Cleaned,
    Disabling,
    Disabled,
}

impl Hook {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Initialized => "initialized",
            Self::Enabling => "enabling",
            Self::Enabled => "enabled",
            Self::Activating => "activating",
            Self::Activated => "activated",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Cleaning => "cleaning",
            Self::Cleaned => "cleaned",
            Self::Disabling => "disabling",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle observer. An error return propagates to the caller of the
/// lifecycle method that fired the hook.
pub trait Observer {
    fn on_hook(&mut self, hook: Hook) -> anyhow::Result<()>;
}

//! Router lifecycle states and step reports.

use std::fmt;

/// Where the router is in its install/activate lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RouterState {
    /// Constructed, never installed.
    #[default]
    Parsed,
    /// Core assets are being fetched.
    Installing,
    /// Core assets stored; waiting to activate.
    Installed,
    /// Old caches are being pruned.
    Activating,
    /// In control of requests.
    Activated,
    /// Install failed; this version will never activate.
    Redundant,
}

impl RouterState {
    /// Lower-case state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RouterState::Parsed => "parsed",
            RouterState::Installing => "installing",
            RouterState::Installed => "installed",
            RouterState::Activating => "activating",
            RouterState::Activated => "activated",
            RouterState::Redundant => "redundant",
        }
    }
}

impl fmt::Display for RouterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful install.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallReport {
    /// Cache the assets were written to
    pub cache_name: String,
    /// Number of core assets stored
    pub assets_cached: usize,
    /// Take over without waiting for open pages to close
    pub skip_waiting: bool,
}

/// Result of a successful activation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivateReport {
    /// Cache that remains current
    pub cache_name: String,
    /// Caches that were deleted
    pub deleted: Vec<String>,
    /// Start controlling already-open pages
    pub clients_claimed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(RouterState::Activated.to_string(), "activated");
        assert_eq!(RouterState::default(), RouterState::Parsed);
    }
}

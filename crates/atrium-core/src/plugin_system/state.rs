use std::fmt;

/// Lifecycle state of a plugin instance (and of the service as a whole).
///
/// The numeric ordering is part of the contract: comparisons such as
/// `state < PluginState::Setup` are load-bearing for dependency gating, so
/// the discriminants are explicit and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PluginState {
    /// Constructed but not yet driven through any lifecycle phase
    None = 0,
    /// The stop hook is running
    Shutdown = 1,
    /// Out of service, either after shutdown or after a failed transition
    Disabled = 2,
    /// The setup hook completed
    Setup = 3,
    /// The start hook is running
    Start = 4,
    /// Fully operational
    Enabled = 5,
}

impl PluginState {
    /// A plugin counts as disabled in every state below `Setup`.
    pub fn is_disabled(self) -> bool {
        self < PluginState::Setup
    }

    /// A plugin counts as enabled from `Setup` onward.
    pub fn is_enabled(self) -> bool {
        self >= PluginState::Setup
    }
}

impl fmt::Display for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PluginState::None => "None",
            PluginState::Shutdown => "Shutdown",
            PluginState::Disabled => "Disabled",
            PluginState::Setup => "Setup",
            PluginState::Start => "Start",
            PluginState::Enabled => "Enabled",
        };
        write!(f, "{}", name)
    }
}

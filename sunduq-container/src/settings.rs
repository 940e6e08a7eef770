//! Container configuration.
//!
//! Settings are plain data and deserialize with serde, so an application
//! can keep them next to the rest of its configuration:
//!
//! ```
//! use sunduq_container::settings::{ContainerSettings, DisposeMode};
//!
//! let settings: ContainerSettings =
//!     serde_json::from_str(r#"{ "dispose_mode": "keep_registrations" }"#).unwrap();
//! assert_eq!(settings.dispose_mode, DisposeMode::KeepRegistrations);
//! assert_eq!(settings.max_suggestions, 3);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// What [`Container::dispose`](crate::container::Container::dispose) leaves
/// behind once every teardown hook has run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisposeMode {
    /// Remove every registration. The container must be re-populated before
    /// it can resolve anything again.
    #[default]
    Clear,

    /// Drop cached instances only. Factory registrations survive and their
    /// singletons are rebuilt on their next resolve. Registrations of ready
    /// values (`register_instance`, `register_disposable_instance`) are
    /// removed, since their instance cannot be rebuilt.
    KeepRegistrations,
}

impl fmt::Display for DisposeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisposeMode::Clear => write!(f, "clear"),
            DisposeMode::KeepRegistrations => write!(f, "keep_registrations"),
        }
    }
}

/// Tunables of a [`Container`](crate::container::Container).
///
/// Child containers inherit the settings of their parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContainerSettings {
    /// Upper bound on "did you mean?" suggestions attached to
    /// not-registered errors. `0` disables suggestions.
    pub max_suggestions: usize,

    /// Behaviour of `dispose()` after teardown.
    pub dispose_mode: DisposeMode,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            max_suggestions: 3,
            dispose_mode: DisposeMode::Clear,
        }
    }
}

impl ContainerSettings {
    pub fn with_max_suggestions(mut self, max_suggestions: usize) -> Self {
        self.max_suggestions = max_suggestions;
        self
    }

    pub fn with_dispose_mode(mut self, dispose_mode: DisposeMode) -> Self {
        self.dispose_mode = dispose_mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = ContainerSettings::default();
        assert_eq!(settings.max_suggestions, 3);
        assert_eq!(settings.dispose_mode, DisposeMode::Clear);
    }

    #[test]
    fn empty_object_uses_defaults() {
        let settings: ContainerSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, ContainerSettings::default());
    }

    #[test]
    fn unknown_fields_rejected() {
        let result = serde_json::from_str::<ContainerSettings>(r#"{ "allow_override": true }"#);
        assert!(result.is_err());
    }

    #[test]
    fn builder_methods() {
        let settings = ContainerSettings::default()
            .with_max_suggestions(0)
            .with_dispose_mode(DisposeMode::KeepRegistrations);
        assert_eq!(settings.max_suggestions, 0);
        assert_eq!(settings.dispose_mode.to_string(), "keep_registrations");
    }
}

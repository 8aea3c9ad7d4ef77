//! Session mode flags and their transitions.

use crate::core::types::{OutputMode, on_off};

/// One of the two session-wide toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Debug,
    Confirmation,
}

impl Mode {
    pub fn label(self) -> &'static str {
        match self {
            Mode::Debug => "debug",
            Mode::Confirmation => "confirmation",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Mode::Debug => "Debug",
            Mode::Confirmation => "Confirmation",
        }
    }
}

/// Session-wide flags. Set at start-up and by the internal `set` commands only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionFlags {
    pub debug: bool,
    pub confirm: bool,
}

impl Default for SessionFlags {
    fn default() -> Self {
        Self {
            debug: false,
            confirm: true,
        }
    }
}

/// Result of applying a `set` command to [`SessionFlags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChange {
    Changed { mode: Mode, enabled: bool },
    Unchanged { mode: Mode, enabled: bool },
}

impl ModeChange {
    pub fn is_change(self) -> bool {
        matches!(self, ModeChange::Changed { .. })
    }

    /// Informational line shown to the operator.
    pub fn message(self) -> String {
        match self {
            ModeChange::Changed { mode, enabled } => format!(
                "{} mode {}.",
                mode.title(),
                if enabled { "enabled" } else { "disabled" }
            ),
            ModeChange::Unchanged { mode, enabled } => {
                format!("{} mode is already {}.", mode.title(), on_off(enabled))
            }
        }
    }
}

impl SessionFlags {
    pub fn get(&self, mode: Mode) -> bool {
        match mode {
            Mode::Debug => self.debug,
            Mode::Confirmation => self.confirm,
        }
    }

    /// Set `mode` to `enabled`, reporting whether the value actually changed.
    pub fn set(&mut self, mode: Mode, enabled: bool) -> ModeChange {
        if self.get(mode) == enabled {
            return ModeChange::Unchanged { mode, enabled };
        }
        match mode {
            Mode::Debug => self.debug = enabled,
            Mode::Confirmation => self.confirm = enabled,
        }
        ModeChange::Changed { mode, enabled }
    }

    pub fn output_mode(&self) -> OutputMode {
        OutputMode::from_debug(self.debug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_reports_change_and_updates_flag() {
        let mut flags = SessionFlags::default();
        let change = flags.set(Mode::Debug, true);
        assert_eq!(
            change,
            ModeChange::Changed {
                mode: Mode::Debug,
                enabled: true
            }
        );
        assert!(flags.debug);
        assert_eq!(change.message(), "Debug mode enabled.");
    }

    #[test]
    fn set_to_current_value_is_unchanged() {
        let mut flags = SessionFlags {
            debug: false,
            confirm: true,
        };
        let before = flags;
        let change = flags.set(Mode::Confirmation, true);
        assert!(!change.is_change());
        assert_eq!(flags, before);
        assert_eq!(change.message(), "Confirmation mode is already on.");
    }

    #[test]
    fn disabling_confirmation_message() {
        let mut flags = SessionFlags::default();
        assert_eq!(
            flags.set(Mode::Confirmation, false).message(),
            "Confirmation mode disabled."
        );
        assert!(!flags.confirm);
        assert!(!flags.get(Mode::Confirmation));
    }
}

//! Severity levels for compile issues.
//!
//! Severities are totally ordered: `Debug < Info < Warn < Error`. Anything at
//! [`Severity::Error`] or above fails the file it was raised for.

use std::fmt;

/// The severity level of an [`Issue`](super::Issue).
///
/// The derived ordering follows declaration order, so comparisons such as
/// `severity >= Severity::Warn` read naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Tracing detail, only interesting when debugging a template.
    Debug,

    /// Informational note that needs no action.
    Info,

    /// Advisory issue; the template still compiles.
    Warn,

    /// The template is invalid and the file counts as a failure.
    Error,
}

impl Severity {
    /// All severities, lowest first.
    pub const ALL: [Severity; 4] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
    ];

    /// Returns `true` if this severity fails compilation.
    pub fn is_failure(&self) -> bool {
        *self >= Severity::Error
    }

    /// Returns the report channel for this severity.
    ///
    /// Each severity maps onto exactly one [`log::Level`].
    pub fn log_level(&self) -> log::Level {
        match self {
            Severity::Debug => log::Level::Debug,
            Severity::Info => log::Level::Info,
            Severity::Warn => log::Level::Warn,
            Severity::Error => log::Level::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Debug => write!(f, "debug"),
            Severity::Info => write!(f, "info"),
            Severity::Warn => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_total_order() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);

        let mut shuffled = vec![
            Severity::Warn,
            Severity::Error,
            Severity::Debug,
            Severity::Info,
        ];
        shuffled.sort();
        assert_eq!(shuffled, Severity::ALL.to_vec());
    }

    #[test]
    fn test_only_error_is_failure() {
        assert!(!Severity::Debug.is_failure());
        assert!(!Severity::Info.is_failure());
        assert!(!Severity::Warn.is_failure());
        assert!(Severity::Error.is_failure());
    }

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(Severity::Debug.log_level(), log::Level::Debug);
        assert_eq!(Severity::Info.log_level(), log::Level::Info);
        assert_eq!(Severity::Warn.log_level(), log::Level::Warn);
        assert_eq!(Severity::Error.log_level(), log::Level::Error);
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Warn.to_string(), "warning");
        assert_eq!(Severity::Error.to_string(), "error");
    }
}

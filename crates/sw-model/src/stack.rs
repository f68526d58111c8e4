//! Observed remote stack state
//!
//! A fresh snapshot is taken from the provisioning service whenever a
//! decision depends on it; nothing here is cached.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Statuses from which a stack can be updated
pub const HEALTHY_STATUSES: [&str; 4] = [
    "ROLLBACK_COMPLETE",
    "CREATE_COMPLETE",
    "UPDATE_COMPLETE",
    "UPDATE_ROLLBACK_COMPLETE",
];

/// Status string reported by the provisioning service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackStatus(String);

impl StackStatus {
    #[inline]
    #[must_use]
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact match against [`HEALTHY_STATUSES`]
    #[inline]
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        HEALTHY_STATUSES.contains(&self.0.as_str())
    }
}

impl fmt::Display for StackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Existence and status of a remote stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackState {
    /// No stack with that name
    Absent,
    /// Stack exists with the given status
    Present(StackStatus),
}

impl StackState {
    #[inline]
    #[must_use]
    pub fn present(status: impl Into<String>) -> Self {
        Self::Present(StackStatus::new(status))
    }

    #[inline]
    #[must_use]
    pub fn exists(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    #[inline]
    #[must_use]
    pub fn status(&self) -> Option<&StackStatus> {
        match self {
            Self::Absent => None,
            Self::Present(status) => Some(status),
        }
    }

    /// Classify into exactly one of the three buckets
    #[must_use]
    pub fn health(&self) -> StackHealth {
        match self {
            Self::Absent => StackHealth::Absent,
            Self::Present(status) if status.is_healthy() => StackHealth::Healthy,
            Self::Present(_) => StackHealth::Unhealthy,
        }
    }
}

/// Classification of a [`StackState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackHealth {
    /// Eligible for create
    Absent,
    /// Eligible for update
    Healthy,
    /// Any unlisted status; fatal for the run
    Unhealthy,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn absent_is_absent() {
        assert_eq!(StackState::Absent.health(), StackHealth::Absent);
        assert!(!StackState::Absent.exists());
        assert!(StackState::Absent.status().is_none());
    }

    #[test]
    fn allow_list_is_healthy() {
        for status in HEALTHY_STATUSES {
            assert_eq!(StackState::present(status).health(), StackHealth::Healthy);
        }
    }

    #[test]
    fn failure_states_are_unhealthy() {
        for status in [
            "DELETE_FAILED",
            "CREATE_IN_PROGRESS",
            "UPDATE_ROLLBACK_FAILED",
            "ROLLBACK_FAILED",
            "create_complete",
            "",
        ] {
            assert_eq!(
                StackState::present(status).health(),
                StackHealth::Unhealthy,
                "{status:?}"
            );
        }
    }

    proptest! {
        #[test]
        fn prop_unlisted_status_is_never_healthy(status in "\\PC*") {
            let health = StackState::present(status.clone()).health();
            if HEALTHY_STATUSES.contains(&status.as_str()) {
                prop_assert_eq!(health, StackHealth::Healthy);
            } else {
                prop_assert_eq!(health, StackHealth::Unhealthy);
            }
        }

        #[test]
        fn prop_present_is_never_absent(status in "[A-Z_]{0,32}") {
            prop_assert_ne!(StackState::present(status).health(), StackHealth::Absent);
        }
    }
}

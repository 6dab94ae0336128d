//! User-facing outcome of a mutation.
//!
//! A notice tells the user whether a change reached the remote service or
//! only this device, so they know whether the data is durable elsewhere.

use crate::{CollectionName, Record};
use serde::Serialize;
use std::fmt;

/// Kind of mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Create,
    Update,
    Delete,
}

impl OpKind {
    fn past_tense(&self) -> &'static str {
        match self {
            OpKind::Create => "created",
            OpKind::Update => "updated",
            OpKind::Delete => "deleted",
        }
    }
}

/// Why a mutation only reached the local tiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradeReason {
    /// No remote service is configured
    Unconfigured,
    /// The remote service was called and failed
    CallFailed(String),
}

impl fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegradeReason::Unconfigured => write!(f, "remote service not configured"),
            DegradeReason::CallFailed(message) => write!(f, "remote call failed: {message}"),
        }
    }
}

/// Where a mutation was persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tier {
    Remote,
    LocalOnly(DegradeReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
}

/// Transient notification produced by every successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: OpKind,
    pub resource: CollectionName,
    pub tier: Tier,
}

impl Notice {
    pub fn new(kind: OpKind, resource: impl Into<CollectionName>, tier: Tier) -> Self {
        Self {
            kind,
            resource: resource.into(),
            tier,
        }
    }

    /// The change exists only in memory and in the local snapshot.
    pub fn is_degraded(&self) -> bool {
        matches!(self.tier, Tier::LocalOnly(_))
    }

    /// Running without a backend is a normal mode; a failing backend is not.
    pub fn severity(&self) -> Severity {
        match &self.tier {
            Tier::LocalOnly(DegradeReason::CallFailed(_)) => Severity::Warning,
            _ => Severity::Success,
        }
    }

    pub fn message(&self) -> String {
        let verb = self.kind.past_tense();
        match &self.tier {
            Tier::Remote => format!("{verb} {} record (saved remotely)", self.resource),
            Tier::LocalOnly(reason) => format!(
                "{verb} {} record (saved locally only: {reason})",
                self.resource
            ),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// A mutation result together with its notice.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub notice: Notice,
}

/// Result of a delete request.
#[derive(Debug, Clone, PartialEq)]
pub enum Deletion {
    /// The record was removed from the list
    Removed(Outcome<Record>),
    /// The user declined; nothing changed
    Cancelled,
}

impl Deletion {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Deletion::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_notice() {
        let notice = Notice::new(OpKind::Create, "customers", Tier::Remote);
        assert!(!notice.is_degraded());
        assert_eq!(notice.severity(), Severity::Success);
        assert_eq!(notice.to_string(), "created customers record (saved remotely)");
    }

    #[test]
    fn unconfigured_notice_is_degraded_but_not_a_warning() {
        let notice = Notice::new(
            OpKind::Update,
            "vendors",
            Tier::LocalOnly(DegradeReason::Unconfigured),
        );
        assert!(notice.is_degraded());
        assert_eq!(notice.severity(), Severity::Success);
        assert_eq!(
            notice.message(),
            "updated vendors record (saved locally only: remote service not configured)"
        );
    }

    #[test]
    fn failed_call_notice_is_a_warning() {
        let notice = Notice::new(
            OpKind::Delete,
            "orders",
            Tier::LocalOnly(DegradeReason::CallFailed("timeout".into())),
        );
        assert!(notice.is_degraded());
        assert_eq!(notice.severity(), Severity::Warning);
        assert_eq!(
            notice.message(),
            "deleted orders record (saved locally only: remote call failed: timeout)"
        );
    }
}

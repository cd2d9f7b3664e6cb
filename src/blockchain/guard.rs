//! Named pre-call checks for state-mutating contract calls.
//!
//! A mutating operation lists its checks in order; the blockchain client
//! evaluates them one by one and stops at the first failure, so nothing is
//! sent unless every check passed.

/// One precondition of a mutating call.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Check<'a> {
    /// The connection can sign transactions.
    Signer,
    /// A summary contract is bound.
    SummaryBound,
    /// The signer is the summary's custodian.
    Custodian,
    /// A text argument is non-empty.
    NotEmpty { value: &'a str, message: &'static str },
    /// A syntactically valid address.
    Address { value: &'a str, label: &'static str },
    /// Non-negative and below the interactions length.
    InteractionInRange(i64),
    /// Non-negative permission level.
    PermissionLevel(i64),
    /// Positive whole number of seconds.
    Duration(f64),
    /// 32-byte hex merkle root.
    MerkleRoot(&'a str),
    /// No interaction registered under this address or reference.
    Unregistered { value: &'a str, message: &'static str },
    /// Owner interaction whose `owner()` is the summary contract.
    OwnedBySummary(i64),
    /// Provider interaction whose `provider()` is the summary contract.
    ProvidedBySummary(i64),
    /// The interaction's enabled flag currently equals `enabled`.
    EnabledIs { id: i64, enabled: bool },
}

impl Check<'_> {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Check::Signer => "signer",
            Check::SummaryBound => "summary_bound",
            Check::Custodian => "custodian",
            Check::NotEmpty { .. } => "not_empty",
            Check::Address { .. } => "address",
            Check::InteractionInRange(_) => "interaction_in_range",
            Check::PermissionLevel(_) => "permission_level",
            Check::Duration(_) => "duration",
            Check::MerkleRoot(_) => "merkle_root",
            Check::Unregistered { .. } => "unregistered",
            Check::OwnedBySummary(_) => "owned_by_summary",
            Check::ProvidedBySummary(_) => "provided_by_summary",
            Check::EnabledIs { .. } => "enabled_is",
        }
    }

    /// True if the check needs no network round trip.
    pub(crate) fn is_local(&self) -> bool {
        matches!(
            self,
            Check::Signer
                | Check::SummaryBound
                | Check::NotEmpty { .. }
                | Check::Address { .. }
                | Check::PermissionLevel(_)
                | Check::Duration(_)
                | Check::MerkleRoot(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_checks() {
        assert!(Check::Signer.is_local());
        assert!(Check::Duration(1.0).is_local());
        assert!(!Check::Custodian.is_local());
        assert!(!Check::InteractionInRange(0).is_local());
        assert!(!Check::EnabledIs { id: 0, enabled: true }.is_local());
    }

    #[test]
    fn test_names_are_distinct() {
        let checks = [
            Check::Signer,
            Check::SummaryBound,
            Check::Custodian,
            Check::InteractionInRange(0),
            Check::OwnedBySummary(0),
            Check::ProvidedBySummary(0),
        ];
        let mut names: Vec<_> = checks.iter().map(Check::name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), checks.len());
    }
}

//! Metrics collection.
//!
//! # Metrics
//! - `unison_graphql_requests_total` (counter): requests by operation, outcome
//! - `unison_contract_calls_total` (counter): contract calls by kind, outcome
//! - `unison_guard_rejections_total` (counter): pre-call rejections by kind
//!
//! # Design Decisions
//! - Emits through the `metrics` facade only; the host application installs
//!   a recorder (Prometheus or otherwise). Without one every call is a no-op.

use crate::error::UnisonError;

/// Outcome label for a completed remote call.
pub fn outcome<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() {
        "ok"
    } else {
        "error"
    }
}

/// Record a GraphQL round trip.
pub fn record_graphql_request(operation: &'static str, outcome: &'static str) {
    ::metrics::counter!(
        "unison_graphql_requests_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a contract read or write.
pub fn record_contract_call(kind: &'static str, outcome: &'static str) {
    ::metrics::counter!(
        "unison_contract_calls_total",
        "kind" => kind,
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a precondition failure raised before any network call.
pub fn record_guard_rejection(err: &UnisonError) {
    let kind = match err {
        UnisonError::InvalidArgument(_) => "invalid_argument",
        UnisonError::NotAuthorized(_) => "not_authorized",
        UnisonError::NotFound(_) => "not_found",
        UnisonError::Remote(_) => "remote",
        UnisonError::AlreadyInState(_) => "already_in_state",
    };
    ::metrics::counter!("unison_guard_rejections_total", "kind" => kind).increment(1);
}

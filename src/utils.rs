//! Input predicates, time units and argument converters.
//!
//! The predicates are syntactic only. Converters turn caller input into the
//! on-chain types the contract calls expect and fail with
//! [`UnisonError::InvalidArgument`] before any network traffic happens.

use alloy::primitives::{hex, Address, B256, U256};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{UnisonError, UnisonResult};

/// True iff `digits` is bare hex of whole bytes.
fn is_hex_payload(digits: &str) -> bool {
    // `hex::decode` accepts a prefix of its own; a second one is not valid input here.
    !digits.starts_with("0x") && hex::decode(digits).is_ok()
}

/// True iff `address` is 40 hex digits, optionally `0x`-prefixed.
///
/// Checksum casing is not enforced.
pub fn is_address(address: &str) -> bool {
    let digits = address.strip_prefix("0x").unwrap_or(address);
    digits.len() == 40 && is_hex_payload(digits)
}

/// True iff `bytes` is a `0x`-prefixed hex string of whole bytes.
pub fn is_bytes(bytes: &str) -> bool {
    bytes.strip_prefix("0x").is_some_and(is_hex_payload)
}

/// True iff `bytes32` is a hex byte string exactly 32 bytes long.
pub fn is_bytes32(bytes32: &str) -> bool {
    is_bytes(bytes32) && bytes32.len() == 2 + 64
}

pub const fn seconds(seconds: u64) -> u64 {
    seconds
}

pub const fn minutes(minutes: u64) -> u64 {
    minutes * seconds(60)
}

pub const fn hours(hours: u64) -> u64 {
    hours * minutes(60)
}

pub const fn days(days: u64) -> u64 {
    days * hours(24)
}

pub const fn weeks(weeks: u64) -> u64 {
    weeks * days(7)
}

/// A month is fixed at four weeks.
pub const fn months(months: u64) -> u64 {
    months * weeks(4)
}

/// Current unix time in seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Absolute deadline `duration_secs` after `now`.
pub fn deadline_after(now: u64, duration_secs: u64) -> UnisonResult<u64> {
    now.checked_add(duration_secs)
        .ok_or_else(|| UnisonError::InvalidArgument("The durationSeconds is invalid".into()))
}

/// Validate an interaction id and convert it to its on-chain index.
pub fn interaction_index(interaction_id: i64) -> UnisonResult<u64> {
    u64::try_from(interaction_id)
        .map_err(|_| UnisonError::InvalidArgument("The interactionId is negative".into()))
}

/// Validate a permission level.
pub fn permission_level(level: i64) -> UnisonResult<U256> {
    u64::try_from(level).map(U256::from).map_err(|_| {
        UnisonError::InvalidArgument("The permission level can't be negative value".into())
    })
}

/// Validate a viewing duration: strictly positive and whole seconds.
pub fn duration_secs(duration: f64) -> UnisonResult<u64> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(UnisonError::InvalidArgument(
            "The durationSeconds is invalid".into(),
        ));
    }
    if duration.fract() != 0.0 {
        return Err(UnisonError::InvalidArgument(
            "The durationSeconds must not have a decimal".into(),
        ));
    }
    if duration > u64::MAX as f64 {
        return Err(UnisonError::InvalidArgument(
            "The durationSeconds is invalid".into(),
        ));
    }
    Ok(duration as u64)
}

/// Parse an address, labelling the error with the argument's role.
pub fn parse_address(address: &str, label: &str) -> UnisonResult<Address> {
    if !is_address(address) {
        return Err(UnisonError::InvalidArgument(format!("Invalid {} address", label)));
    }
    address
        .parse()
        .map_err(|_| UnisonError::InvalidArgument(format!("Invalid {} address", label)))
}

/// Parse a 32-byte merkle root.
pub fn parse_bytes32(bytes32: &str) -> UnisonResult<B256> {
    if !is_bytes32(bytes32) {
        return Err(UnisonError::InvalidArgument("Invalid merkle root".into()));
    }
    bytes32
        .parse()
        .map_err(|_| UnisonError::InvalidArgument("Invalid merkle root".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    #[test]
    fn test_is_address() {
        assert!(is_address(ADDRESS));
        assert!(is_address("0xF39FD6E51AAD88F6F4CE6AB8827279CFFFB92266"));
        assert!(is_address(&ADDRESS[2..]));

        assert!(!is_address(""));
        assert!(!is_address("0x"));
        assert!(!is_address(&ADDRESS[..41]));
        assert!(!is_address(&format!("{}0", ADDRESS)));
        assert!(!is_address("0xg39fd6e51aad88f6f4ce6ab8827279cfffb92266"));
        assert!(!is_address("reference"));
        assert!(!is_address(&format!("0x0x{}", &ADDRESS[4..])));
    }

    #[test]
    fn test_is_bytes() {
        assert!(is_bytes("0x"));
        assert!(is_bytes("0x00ff"));
        assert!(!is_bytes("00ff"));
        assert!(!is_bytes("0x0"));
        assert!(!is_bytes("0xzz"));
        assert!(!is_bytes("0x0x00"));
    }

    #[test]
    fn test_is_bytes32() {
        let root = format!("0x{}", "ab".repeat(32));
        assert!(is_bytes32(&root));
        assert!(!is_bytes32(&format!("0x{}", "ab".repeat(31))));
        assert!(!is_bytes32(&format!("0x{}", "ab".repeat(33))));
        assert!(!is_bytes32(&"ab".repeat(32)));
    }

    #[test]
    fn test_time_units() {
        assert_eq!(seconds(5), 5);
        assert_eq!(minutes(2), 120);
        assert_eq!(hours(1), 3600);
        assert_eq!(days(1), 86_400);
        assert_eq!(weeks(1), 604_800);
        assert_eq!(months(1), 2_419_200);
    }

    #[test]
    fn test_interaction_index() {
        assert_eq!(interaction_index(3).unwrap(), 3);
        let err = interaction_index(-1).unwrap_err();
        assert_eq!(err, UnisonError::InvalidArgument("The interactionId is negative".into()));
    }

    #[test]
    fn test_duration_secs() {
        assert_eq!(duration_secs(3600.0).unwrap(), 3600);
        assert!(duration_secs(0.0).is_err());
        assert!(duration_secs(-5.0).unwrap_err().message().contains("invalid"));
        assert!(duration_secs(1.5).unwrap_err().message().contains("decimal"));
        assert!(duration_secs(f64::NAN).is_err());
    }

    #[test]
    fn test_deadline_after() {
        assert_eq!(deadline_after(1_700_000_000, hours(1)).unwrap(), 1_700_003_600);
        assert!(deadline_after(u64::MAX, 1).is_err());
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(
            parse_address(ADDRESS, "entity").unwrap().to_string().to_lowercase(),
            ADDRESS
        );
        assert_eq!(
            parse_address("0x1234", "entity").unwrap_err().message(),
            "Invalid entity address"
        );
        assert!(parse_bytes32(&format!("0x{}", "11".repeat(32))).is_ok());
        assert!(parse_bytes32("0x11").is_err());
        assert!(permission_level(-1).is_err());
        assert_eq!(permission_level(2).unwrap(), U256::from(2));
    }
}

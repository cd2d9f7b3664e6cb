//! Normalisation of provider-level failures.
//!
//! Every failed contract call is reduced to a `{code, context}` pair. The
//! surfaced message is the context when one exists, otherwise the code.

use alloy::sol_types::decode_revert_reason;
use alloy::transports::TransportError;
use std::fmt;

use crate::error::UnisonError;

/// Classification of a failed contract call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractErrorCode {
    ExecutionReverted,
    CallReverted,
    InsufficientFundsForGas,
    NonceTooLow,
    TransactionUnderpriced,
    TransactionRanOutOfGas,
    RejectedTransaction,
    MaxPriorityFeeHigherThanMaxFee,
    MaxFeeLessThanBaseFee,
    Unknown,
}

impl ContractErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExecutionReverted => "EXECUTION_REVERTED",
            Self::CallReverted => "CALL_REVERTED",
            Self::InsufficientFundsForGas => "INSUFFICIENT_FUNDS_FOR_GAS",
            Self::NonceTooLow => "NONCE_TOO_LOW",
            Self::TransactionUnderpriced => "TRANSACTION_UNDERPRICED",
            Self::TransactionRanOutOfGas => "TRANSACTION_RAN_OUT_OF_GAS",
            Self::RejectedTransaction => "REJECTED_TRANSACTION",
            Self::MaxPriorityFeeHigherThanMaxFee => {
                "MAX_PRIORITY_FEE_PER_GAS_HIGHER_THAN_MAX_FEE_PER_GAS"
            }
            Self::MaxFeeLessThanBaseFee => "MAX_FEE_PER_GAS_LESS_THAN_BLOCK_BASE_FEE",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Classify a node error by its JSON-RPC code and message.
    pub fn classify(code: i64, message: &str) -> Self {
        let message = message.to_ascii_lowercase();
        if message.contains("execution reverted") {
            Self::ExecutionReverted
        } else if message.contains("insufficient funds") {
            Self::InsufficientFundsForGas
        } else if message.contains("nonce too low") {
            Self::NonceTooLow
        } else if message.contains("underpriced") {
            Self::TransactionUnderpriced
        } else if message.contains("out of gas") || message.contains("intrinsic gas too low") {
            Self::TransactionRanOutOfGas
        } else if code == 4001 || message.contains("user rejected") || message.contains("user denied") {
            Self::RejectedTransaction
        } else if message.contains("max priority fee per gas higher than max fee per gas") {
            Self::MaxPriorityFeeHigherThanMaxFee
        } else if message.contains("max fee per gas less than block base fee") {
            Self::MaxFeeLessThanBaseFee
        } else if code == 3 || message.contains("revert") {
            Self::CallReverted
        } else {
            Self::Unknown
        }
    }
}

impl fmt::Display for ContractErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalised failure of a contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedContractError {
    pub code: ContractErrorCode,
    /// Revert reason, or the node's message for unclassified errors.
    pub context: Option<String>,
}

impl ParsedContractError {
    /// Message surfaced to callers: the context if present, else the code.
    pub fn message(&self) -> String {
        match &self.context {
            Some(context) => context.clone(),
            None => self.code.as_str().to_string(),
        }
    }
}

impl From<ParsedContractError> for UnisonError {
    fn from(parsed: ParsedContractError) -> Self {
        UnisonError::Remote(parsed.message())
    }
}

/// Reduce a transport error to `{code, context}`.
pub fn parse_rpc_error(err: &TransportError) -> ParsedContractError {
    let Some(payload) = err.as_error_resp() else {
        return ParsedContractError {
            code: ContractErrorCode::Unknown,
            context: Some(err.to_string()),
        };
    };

    let code = ContractErrorCode::classify(payload.code, &payload.message);
    let reason = payload
        .as_revert_data()
        .and_then(|data| decode_revert_reason(&data))
        .filter(|reason| !reason.is_empty());

    let context = match (code, reason) {
        (_, Some(reason)) => Some(reason),
        (ContractErrorCode::Unknown, None) => Some(payload.message.to_string()),
        _ => None,
    };

    ParsedContractError { code, context }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(
            ContractErrorCode::classify(-32000, "insufficient funds for gas * price + value"),
            ContractErrorCode::InsufficientFundsForGas
        );
        assert_eq!(
            ContractErrorCode::classify(-32000, "nonce too low: next nonce 5, tx nonce 4"),
            ContractErrorCode::NonceTooLow
        );
        assert_eq!(
            ContractErrorCode::classify(-32000, "replacement transaction underpriced"),
            ContractErrorCode::TransactionUnderpriced
        );
        assert_eq!(
            ContractErrorCode::classify(3, "execution reverted: not custodian"),
            ContractErrorCode::ExecutionReverted
        );
        assert_eq!(ContractErrorCode::classify(3, "VM Exception"), ContractErrorCode::CallReverted);
        assert_eq!(
            ContractErrorCode::classify(4001, "User rejected the request"),
            ContractErrorCode::RejectedTransaction
        );
        assert_eq!(ContractErrorCode::classify(-32601, "method not found"), ContractErrorCode::Unknown);
    }

    #[test]
    fn test_message_prefers_context() {
        let parsed = ParsedContractError {
            code: ContractErrorCode::ExecutionReverted,
            context: Some("Summary: caller is not custodian".into()),
        };
        assert_eq!(parsed.message(), "Summary: caller is not custodian");

        let parsed = ParsedContractError {
            code: ContractErrorCode::NonceTooLow,
            context: None,
        };
        assert_eq!(UnisonError::from(parsed), UnisonError::Remote("NONCE_TOO_LOW".into()));
    }

    #[test]
    fn test_transport_failure_is_unknown() {
        let err = alloy::transports::TransportErrorKind::custom_str("connection refused");
        let parsed = parse_rpc_error(&err);
        assert_eq!(parsed.code, ContractErrorCode::Unknown);
        assert!(parsed.message().contains("connection refused"));
    }
}

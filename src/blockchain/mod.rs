//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Project (rpc url, chain id, registrar)
//!     → wallet.rs (key loading, signing)
//!     → connection.rs (HTTP provider, optional signer)
//!     → client.rs (bind registrar, resolve summary, guarded calls)
//!     → errors.rs (provider failure → {code, context})
//! ```
//!
//! # Security Constraints
//! - Private keys come from the caller or the environment only
//! - Never log private keys or sensitive data
//! - Every mutating call is checked locally and on-chain before it is sent

pub mod abi;
pub mod client;
pub mod connection;
pub mod errors;
pub(crate) mod guard;
pub mod types;
pub mod wallet;

pub use abi::{ContractKind, Method};
pub use client::UnisonBlockchain;
pub use connection::ChainConnection;
pub use errors::{ContractErrorCode, ParsedContractError};
pub use types::{ChainId, Interaction, Role};
pub use wallet::Wallet;

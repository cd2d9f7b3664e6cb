//! Project registry subsystem.
//!
//! # Data Flow
//! ```text
//! API key + project id
//!     → client.rs (login mutation, bearer token pair)
//!     → client.rs (getProject query)
//!     → types.rs (Project: registrar, RPC URL, chain id)
//! ```
//!
//! # Security Constraints
//! - Tokens and API keys are never logged
//! - Tokens are opaque; the backend is the trust boundary

pub mod client;
pub mod types;

pub use client::ServerClient;
pub use types::{Project, ProjectId, TokenPair};

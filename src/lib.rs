//! Data Unison SDK: project registry login plus validated calls against the
//! registrar, summary and interaction contracts.

pub mod blockchain;
pub mod client;
pub mod config;
pub mod error;
pub mod observability;
pub mod server;
pub mod utils;

pub use blockchain::{ChainConnection, Interaction, Role, UnisonBlockchain, Wallet};
pub use client::{ConnectOptions, UnisonClient};
pub use config::schema::UnisonConfig;
pub use error::{UnisonError, UnisonResult};
pub use server::{Project, ProjectId, ServerClient};

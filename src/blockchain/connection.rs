//! RPC connection: a type-erased provider plus the optional signer address.
//!
//! # Responsibilities
//! - Build an HTTP provider for a project's RPC URL
//! - Attach a wallet when the caller supplied a private key
//! - Tell signing connections from read-only ones

use alloy::primitives::Address;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use url::Url;

use crate::blockchain::wallet::Wallet;

/// Provider handle shared by every contract call of a blockchain client.
#[derive(Clone)]
pub struct ChainConnection {
    provider: DynProvider,
    /// Present iff transactions can be sent through `provider`.
    signer: Option<Address>,
}

impl ChainConnection {
    /// Query-only connection.
    pub fn read_only(rpc_url: Url) -> Self {
        let provider = ProviderBuilder::new().connect_http(rpc_url).erased();
        Self {
            provider,
            signer: None,
        }
    }

    /// Connection that signs with `wallet`.
    pub fn signing(rpc_url: Url, wallet: &Wallet) -> Self {
        let provider = ProviderBuilder::new()
            .wallet(wallet.network_wallet())
            .connect_http(rpc_url)
            .erased();
        Self {
            provider,
            signer: Some(wallet.address()),
        }
    }

    /// Wrap an already-built provider.
    ///
    /// `signer` must be the address the provider sends transactions from.
    pub fn from_provider(provider: DynProvider, signer: Option<Address>) -> Self {
        Self { provider, signer }
    }

    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    pub fn signer(&self) -> Option<Address> {
        self.signer
    }

    pub fn is_signer(&self) -> bool {
        self.signer.is_some()
    }
}

impl std::fmt::Debug for ChainConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainConnection")
            .field("signer", &self.signer)
            .finish()
    }
}

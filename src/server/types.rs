//! Project registry types and GraphQL wire shapes.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::blockchain::types::ChainId;
use crate::error::{UnisonError, UnisonResult};

/// Project identifier in the registry. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectId(u64);

impl ProjectId {
    pub fn new(id: u64) -> UnisonResult<Self> {
        if id < 1 {
            return Err(UnisonError::InvalidArgument("Invalid project ID".into()));
        }
        Ok(Self(id))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for ProjectId {
    type Error = UnisonError;

    fn try_from(id: u64) -> UnisonResult<Self> {
        Self::new(id)
    }
}

impl FromStr for ProjectId {
    type Err = UnisonError;

    fn from_str(s: &str) -> UnisonResult<Self> {
        let id = s
            .trim()
            .parse::<u64>()
            .map_err(|_| UnisonError::InvalidArgument("Invalid project ID".into()))?;
        Self::new(id)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Access/refresh token pair issued by the backend. Opaque to the SDK.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct TokenPair {
    pub token: String,
    pub refresh: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("token", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

/// A project resolved from the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: ProjectId,
    /// Contract addresses by name. Always contains `registrar`.
    pub contracts: BTreeMap<String, Address>,
    pub rpc_url: Url,
    pub chain_id: ChainId,
}

impl Project {
    /// Address of the registrar contract.
    pub fn registrar(&self) -> UnisonResult<Address> {
        self.contracts
            .get("registrar")
            .copied()
            .ok_or_else(|| UnisonError::NotFound("Registrar is undefined".into()))
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GraphQlRequest<'a> {
    pub query: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlError {
    #[serde(default)]
    pub message: Option<String>,
}

impl GraphQlResponse {
    pub fn first_error(&self) -> Option<&str> {
        self.errors.iter().find_map(|e| e.message.as_deref())
    }

    /// Non-null top-level field of `data`.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data
            .as_ref()
            .and_then(|d| d.get(name))
            .filter(|v| !v.is_null())
    }

    /// Decode a top-level field, failing with the backend's message or `fallback`.
    pub fn decode_field<T: serde::de::DeserializeOwned>(
        &self,
        name: &str,
        fallback: &str,
    ) -> UnisonResult<T> {
        let value = self.field(name).ok_or_else(|| {
            UnisonError::Remote(self.first_error().unwrap_or(fallback).to_string())
        })?;
        T::deserialize(value)
            .map_err(|e| UnisonError::Remote(format!("Malformed '{}' response: {}", name, e)))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshPayload {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<RefreshedTokens>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshedTokens {
    pub token: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectPayload {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub contract: Option<BTreeMap<String, Option<String>>>,
    #[serde(default)]
    pub network: Option<NetworkPayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NetworkPayload {
    pub rpc: Option<String>,
    #[serde(rename = "chainId")]
    pub chain_id: Option<u64>,
}

impl ProjectPayload {
    pub fn into_project(self, id: ProjectId) -> UnisonResult<Project> {
        if !self.success {
            return Err(UnisonError::Remote(
                self.message.unwrap_or_else(|| "getProject failed".to_string()),
            ));
        }

        let mut contracts = BTreeMap::new();
        for (name, address) in self.contract.unwrap_or_default() {
            let Some(address) = address else { continue };
            let parsed: Address = address.parse().map_err(|_| {
                UnisonError::Remote(format!("Invalid {} address '{}'", name, address))
            })?;
            contracts.insert(name, parsed);
        }
        if !contracts.contains_key("registrar") {
            return Err(UnisonError::NotFound("Registrar is undefined".into()));
        }

        let network = self
            .network
            .ok_or_else(|| UnisonError::NotFound("Network is undefined".into()))?;
        let rpc = network
            .rpc
            .ok_or_else(|| UnisonError::NotFound("RPC URL is undefined".into()))?;
        let rpc_url = Url::parse(&rpc)
            .map_err(|e| UnisonError::Remote(format!("Invalid RPC URL '{}': {}", rpc, e)))?;
        let chain_id = network
            .chain_id
            .map(ChainId)
            .ok_or_else(|| UnisonError::NotFound("Chain ID is undefined".into()))?;

        Ok(Project {
            id,
            contracts,
            rpc_url,
            chain_id,
        })
    }
}

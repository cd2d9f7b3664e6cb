//! Shared mock backends for integration tests.
//!
//! Both mocks are axum apps bound to an ephemeral port: a GraphQL project
//! registry and a JSON-RPC node that answers `eth_call` from a table keyed by
//! `(to, selector)`.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use alloy::network::Ethereum;
use alloy::primitives::{Address, Bytes, Selector, B256};
use alloy::providers::{Provider, RootProvider};
use alloy::sol_types::{Revert, SolCall, SolError, SolValue};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use url::Url;

use data_unison::blockchain::{ChainConnection, ChainId, UnisonBlockchain};

pub const REGISTRAR: Address = Address::repeat_byte(0xaa);
pub const SUMMARY: Address = Address::repeat_byte(0x55);
pub const SIGNER: Address = Address::repeat_byte(0x11);
pub const INTERACTION: Address = Address::repeat_byte(0x22);

/// Anvil's first account.
pub const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Serve `router` on an ephemeral local port.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// ABI-encode a single return value.
pub fn ret<T: SolValue>(value: T) -> Vec<u8> {
    (value,).abi_encode_params()
}

// ---------------------------------------------------------------------------
// GraphQL registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub authorization: Option<String>,
    pub query: String,
}

struct RegistryState {
    login: Value,
    project: Value,
    refresh: Value,
    status: StatusCode,
    requests: Vec<RecordedRequest>,
}

/// Project registry answering `login`, `getProject` and `refreshToken`.
/// Any other document is echoed back under `data.echo`.
#[derive(Clone)]
pub struct MockRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl MockRegistry {
    pub fn new(rpc_url: &str) -> Self {
        let state = RegistryState {
            login: json!({ "data": { "login": { "token": "token-1", "refresh": "refresh-1" } } }),
            project: json!({ "data": { "getProject": {
                "success": true,
                "message": null,
                "contract": { "registrar": REGISTRAR.to_string() },
                "network": { "rpc": rpc_url, "chainId": 1 }
            } } }),
            refresh: json!({ "data": { "refreshToken": {
                "success": true,
                "message": null,
                "data": { "token": "token-2", "refresh": "refresh-2" }
            } } }),
            status: StatusCode::OK,
            requests: Vec::new(),
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn set_login(&self, body: Value) {
        self.state.lock().unwrap().login = body;
    }

    pub fn set_project(&self, body: Value) {
        self.state.lock().unwrap().project = body;
    }

    pub fn set_refresh(&self, body: Value) {
        self.state.lock().unwrap().refresh = body;
    }

    /// HTTP status of every reply.
    pub fn set_status(&self, status: StatusCode) {
        self.state.lock().unwrap().status = status;
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Start serving; returns the GraphQL endpoint URL.
    pub async fn start(&self) -> String {
        let router = Router::new()
            .route("/graphql", post(graphql))
            .with_state(self.clone());
        format!("http://{}/graphql", serve(router).await)
    }
}

async fn graphql(
    State(registry): State<MockRegistry>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let query = body["query"].as_str().unwrap_or_default().to_string();
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut state = registry.state.lock().unwrap();
    state.requests.push(RecordedRequest {
        authorization,
        query: query.clone(),
    });

    let reply = if query.contains("login(") {
        state.login.clone()
    } else if query.contains("getProject(") {
        state.project.clone()
    } else if query.contains("refreshToken(") {
        state.refresh.clone()
    } else {
        json!({ "data": { "echo": query } })
    };
    (state.status, Json(reply))
}

// ---------------------------------------------------------------------------
// JSON-RPC node
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Reply {
    Return(Vec<u8>),
    Revert(String),
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub to: Option<Address>,
    pub input: Bytes,
}

impl RecordedCall {
    pub fn selector(&self) -> Option<Selector> {
        (self.input.len() >= 4).then(|| Selector::from_slice(&self.input[..4]))
    }
}

#[derive(Default)]
struct ChainState {
    replies: HashMap<(Address, Selector), Reply>,
    calls: Vec<RecordedCall>,
    /// Receipt status of mined transactions; `None` rejects every transaction.
    receipt_status: Option<bool>,
}

pub const TX_HASH: B256 = B256::repeat_byte(0xab);

/// JSON-RPC node with canned contract replies. Transactions are rejected
/// with a revert until [`MockChain::mine`] is called.
#[derive(Clone, Default)]
pub struct MockChain {
    state: Arc<Mutex<ChainState>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer calls of `C` to `to` with `output`.
    pub fn on<C: SolCall>(&self, to: Address, output: Vec<u8>) {
        self.state
            .lock()
            .unwrap()
            .replies
            .insert((to, Selector::from(C::SELECTOR)), Reply::Return(output));
    }

    /// Revert calls and transactions of `C` to `to` with `reason`.
    pub fn revert_on<C: SolCall>(&self, to: Address, reason: &str) {
        self.state
            .lock()
            .unwrap()
            .replies
            .insert((to, Selector::from(C::SELECTOR)), Reply::Revert(reason.to_string()));
    }

    /// Accept transactions and report receipts with `status`.
    pub fn mine(&self, status: bool) {
        self.state.lock().unwrap().receipt_status = Some(status);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Recorded `eth_call`s and transactions of `C`.
    pub fn calls_of<C: SolCall>(&self) -> Vec<RecordedCall> {
        let selector = Selector::from(C::SELECTOR);
        self.calls()
            .into_iter()
            .filter(|c| c.selector() == Some(selector))
            .collect()
    }

    /// Recorded `eth_sendTransaction`s.
    pub fn sent(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == "eth_sendTransaction")
            .collect()
    }

    /// Start serving; returns the RPC URL.
    pub async fn start(&self) -> Url {
        let router = Router::new().route("/", post(rpc)).with_state(self.clone());
        format!("http://{}", serve(router).await).parse().unwrap()
    }

    fn answer(&self, method: &str, params: &Value) -> Result<Value, Value> {
        match method {
            "eth_call" | "eth_sendTransaction" => self.contract_call(method, &params[0]),
            "eth_chainId" | "eth_blockNumber" => Ok(json!("0x1")),
            "eth_gasPrice" | "eth_maxPriorityFeePerGas" => Ok(json!("0x1")),
            "eth_estimateGas" => Ok(json!("0x5208")),
            "eth_getTransactionCount" => Ok(json!("0x0")),
            "eth_getTransactionReceipt" => Ok(self.receipt()),
            _ => Err(json!({ "code": -32601, "message": format!("method {} not found", method) })),
        }
    }

    fn contract_call(&self, method: &str, tx: &Value) -> Result<Value, Value> {
        let to = tx["to"].as_str().and_then(|s| Address::from_str(s).ok());
        let input = tx["input"]
            .as_str()
            .or_else(|| tx["data"].as_str())
            .and_then(|s| Bytes::from_str(s).ok())
            .unwrap_or_default();

        let call = RecordedCall {
            method: method.to_string(),
            to,
            input,
        };
        let key = match (call.to, call.selector()) {
            (Some(to), Some(selector)) => Some((to, selector)),
            _ => None,
        };

        let mut state = self.state.lock().unwrap();
        state.calls.push(call);

        let reply = key.and_then(|key| state.replies.get(&key).cloned());
        match (method, reply) {
            ("eth_call", Some(Reply::Return(output))) => {
                Ok(json!(alloy::primitives::hex::encode_prefixed(output)))
            }
            (_, Some(Reply::Revert(reason))) => Err(revert(&reason)),
            ("eth_call", None) => Err(revert("no reply configured")),
            _ if state.receipt_status.is_some() => Ok(json!(TX_HASH.to_string())),
            _ => Err(revert("nope")),
        }
    }

    /// Receipt of the last sent transaction, or null if none was mined.
    fn receipt(&self) -> Value {
        let state = self.state.lock().unwrap();
        let (Some(status), Some(sent)) = (
            state.receipt_status,
            state.calls.iter().rev().find(|c| c.method == "eth_sendTransaction"),
        ) else {
            return Value::Null;
        };

        json!({
            "type": "0x2",
            "status": if status { "0x1" } else { "0x0" },
            "cumulativeGasUsed": "0x5208",
            "logs": [],
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "transactionHash": TX_HASH.to_string(),
            "transactionIndex": "0x0",
            "blockHash": B256::repeat_byte(0x0b).to_string(),
            "blockNumber": "0x1",
            "gasUsed": "0x5208",
            "effectiveGasPrice": "0x1",
            "from": SIGNER.to_string(),
            "to": sent.to.map(|to| to.to_string()),
            "contractAddress": null
        })
    }
}

fn revert(reason: &str) -> Value {
    let data = Revert {
        reason: reason.to_string(),
    }
    .abi_encode();
    json!({
        "code": 3,
        "message": format!("execution reverted: {}", reason),
        "data": alloy::primitives::hex::encode_prefixed(data),
    })
}

async fn rpc(State(chain): State<MockChain>, Json(request): Json<Value>) -> Json<Value> {
    let id = request["id"].clone();
    let method = request["method"].as_str().unwrap_or_default();
    let body = match chain.answer(method, &request["params"]) {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        Err(error) => json!({ "jsonrpc": "2.0", "id": id, "error": error }),
    };
    Json(body)
}

/// Contract client on a plain provider against `chain`.
///
/// The provider has no fillers, so writes go out as `eth_sendTransaction`
/// from `signer` without local signing.
pub fn blockchain_on(url: Url, signer: Option<Address>) -> UnisonBlockchain {
    let provider = RootProvider::<Ethereum>::new_http(url).erased();
    UnisonBlockchain::new(
        ChainId(1),
        REGISTRAR,
        ChainConnection::from_provider(provider, signer),
    )
}

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;

use alloy::json_abi::JsonAbi;
use alloy::primitives::keccak256;
use serde_json::{json, Value};
use tiny_http::{Response, Server, StatusCode};

use minty_wallet_adapters::{BackendAdapter, Eip1193Adapter, WalletAdapterConfig};
use minty_wallet_core::{ControlPort, ControlView, NetworkConfig, Orchestrator};

pub const OWNER: &str = "0x1000000000000000000000000000000000000001";
pub const MARKETPLACE: &str = "0x7dA4Bf6D0EdC392C82D6C8A5aac414810689B9AE";
pub const NFT_CONTRACT: &str = "0x000000000000000000000000000000000000BEEF";
pub const BUYER: &str = "0x2000000000000000000000000000000000000002";
pub const TX_HASH: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

/// Scripted state behind the mock backend and JSON-RPC wallet proxy.
#[derive(Debug)]
pub struct MockState {
    pub calls: Vec<String>,
    pub chain_id: u64,
    pub network_config: Option<Value>,
    /// One-shot JSON-RPC errors keyed by method.
    pub rejections: HashMap<String, (i64, String)>,
    /// `eth_call` results keyed by `0x`-prefixed selector.
    pub call_results: HashMap<String, String>,
    /// Receipt requests answered with `null` before the receipt appears.
    pub pending_receipt_polls: u32,
    pub receipt_status: &'static str,
    pub logout_fails: bool,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            chain_id: 1,
            network_config: serde_json::to_value(NetworkConfig::monad_testnet()).ok(),
            rejections: HashMap::new(),
            call_results: HashMap::new(),
            pending_receipt_polls: 0,
            receipt_status: "0x1",
            logout_fails: false,
        }
    }
}

pub type SharedMock = Arc<Mutex<MockState>>;

pub fn mock_state() -> SharedMock {
    Arc::new(Mutex::new(MockState::default()))
}

pub fn calls(state: &SharedMock) -> Vec<String> {
    state.lock().expect("mock lock").calls.clone()
}

/// Serves `/api/*` and a JSON-RPC wallet at `/rpc`. Returns the base URL.
pub fn spawn_mock_server(state: SharedMock) -> String {
    let server = Server::http("127.0.0.1:0").expect("start server");
    let addr = format!("http://{}", server.server_addr());

    thread::spawn(move || {
        while let Ok(mut req) = server.recv() {
            let method = req.method().to_string();
            let path = req.url().to_owned();
            let mut body = String::new();
            let _ = req.as_reader().read_to_string(&mut body);

            let (code, payload) = {
                let mut g = state.lock().expect("mock lock");
                handle(&mut g, &method, &path, &body)
            };
            let response =
                Response::from_string(payload.to_string()).with_status_code(StatusCode(code));
            let _ = req.respond(response);
        }
    });

    addr
}

fn handle(state: &mut MockState, method: &str, path: &str, body: &str) -> (u16, Value) {
    if path == "/rpc" {
        let request: Value = serde_json::from_str(body).unwrap_or(Value::Null);
        let rpc_method = request["method"].as_str().unwrap_or_default().to_owned();
        state.calls.push(format!("rpc:{rpc_method}"));
        return (200, rpc(state, &rpc_method, &request["params"]));
    }

    state.calls.push(format!("{method} {path}"));
    match (method, path) {
        ("GET", "/api/network_config") => match &state.network_config {
            Some(network) => (200, network.clone()),
            None => (500, json!({ "error": "config unavailable" })),
        },
        ("GET", "/api/marketplace_abi") => (
            200,
            serde_json::to_value(marketplace_abi()).expect("abi serializes"),
        ),
        ("GET", "/api/marketplace_contract_address") => {
            (200, json!({ "contract_address": MARKETPLACE }))
        }
        ("POST", "/api/login") => {
            let request: Value = serde_json::from_str(body).unwrap_or(Value::Null);
            (
                200,
                json!({ "id": 7, "wallet_address": request["wallet_address"] }),
            )
        }
        ("GET", "/api/logout") if state.logout_fails => (500, json!({ "error": "boom" })),
        ("GET", "/api/logout") => (200, json!({ "message": "Successfully logged out" })),
        _ => (404, json!({ "error": "not found" })),
    }
}

fn rpc(state: &mut MockState, method: &str, params: &Value) -> Value {
    if let Some((code, message)) = state.rejections.remove(method) {
        return json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": code, "message": message },
        });
    }

    let result = match method {
        "wallet_requestPermissions" => json!([{ "parentCapability": "eth_accounts" }]),
        "eth_requestAccounts" => json!([OWNER]),
        "eth_chainId" => json!(format!("{:#x}", state.chain_id)),
        "wallet_addEthereumChain" => {
            let raw = params[0]["chainId"].as_str().unwrap_or("0x0");
            state.chain_id =
                u64::from_str_radix(raw.trim_start_matches("0x"), 16).unwrap_or_default();
            Value::Null
        }
        "eth_call" => {
            let data = params[0]["data"].as_str().unwrap_or_default();
            let selector = data.get(..10).unwrap_or_default().to_ascii_lowercase();
            let result = state
                .call_results
                .get(&selector)
                .cloned()
                .unwrap_or_else(|| format!("0x{:064x}", 1));
            json!(result)
        }
        "eth_sendTransaction" => json!(TX_HASH),
        "eth_getTransactionReceipt" if state.pending_receipt_polls > 0 => {
            state.pending_receipt_polls -= 1;
            Value::Null
        }
        "eth_getTransactionReceipt" => json!({
            "transactionHash": params[0],
            "blockNumber": "0x2a",
            "status": state.receipt_status,
        }),
        _ => {
            return json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": 4200, "message": "unsupported method" },
            })
        }
    };
    json!({ "jsonrpc": "2.0", "id": 1, "result": result })
}

pub fn marketplace_abi() -> JsonAbi {
    JsonAbi::parse([
        "function setNFTPrice(address nftAddress, uint256 tokenId, uint256 price)",
        "function unlistNFT(address nftAddress, uint256 tokenId)",
        "function acceptNFTProposal(address nftAddress, uint256 tokenId, address buyer)",
        "function getPrice(address nftAddress, uint256 tokenId) view returns (uint256)",
        "function getAllListedNFTs() view returns (address[], uint256[])",
    ])
    .expect("valid marketplace abi")
}

pub fn selector_hex(signature: &str) -> String {
    format!("0x{}", alloy::hex::encode(&keccak256(signature.as_bytes())[..4]))
}

pub fn proxy_config(base_url: &str) -> WalletAdapterConfig {
    WalletAdapterConfig {
        backend_base_url: base_url.to_owned(),
        eip1193_proxy_url: Some(format!("{base_url}/rpc")),
        http_timeout_ms: 5_000,
        receipt_poll_interval_ms: 5,
        ..WalletAdapterConfig::default()
    }
}

pub type HttpOrchestrator = Orchestrator<Eip1193Adapter, BackendAdapter>;

pub fn proxy_orchestrator(base_url: &str) -> HttpOrchestrator {
    let config = proxy_config(base_url);
    Orchestrator::new(
        Eip1193Adapter::with_config(config.clone()),
        BackendAdapter::with_config(&config).expect("backend client"),
    )
}

#[derive(Debug, Default)]
pub struct RecordingControl {
    pub views: Mutex<Vec<ControlView>>,
    pub alerts: Mutex<Vec<String>>,
}

impl RecordingControl {
    pub fn labels(&self) -> Vec<String> {
        self.views
            .lock()
            .expect("views lock")
            .iter()
            .map(|v| v.label.clone())
            .collect()
    }

    pub fn last_view(&self) -> ControlView {
        self.views
            .lock()
            .expect("views lock")
            .last()
            .cloned()
            .expect("at least one render")
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().expect("alerts lock").clone()
    }
}

impl ControlPort for RecordingControl {
    fn render(&self, view: &ControlView) {
        self.views.lock().expect("views lock").push(view.clone());
    }

    fn alert(&self, message: &str) {
        self.alerts.lock().expect("alerts lock").push(message.to_owned());
    }
}

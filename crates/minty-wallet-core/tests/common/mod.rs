#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alloy::json_abi::JsonAbi;
use alloy::primitives::{keccak256, Address, Bytes, B256};

use minty_wallet_core::{
    BackendPort, CallRequest, ControlPort, ControlView, LoginRequest, LoginResponse,
    LogoutResponse, NetworkConfig, Orchestrator, PortError, ProviderPort, TxReceipt,
};

/// Ordered record of everything the wallet, backend and control saw.
#[derive(Debug, Clone, Default)]
pub struct Timeline(Arc<Mutex<Vec<String>>>);

impl Timeline {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().expect("timeline lock").push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().expect("timeline lock").clone()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.entries().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

#[derive(Debug)]
pub struct ScriptedProvider {
    pub timeline: Timeline,
    pub injected: bool,
    pub chain_id: Mutex<u64>,
    pub accounts: Vec<Address>,
    /// One-shot errors keyed by method name.
    pub failures: Mutex<HashMap<&'static str, PortError>>,
    pub call_results: Mutex<HashMap<[u8; 4], Bytes>>,
    pub added_chains: Mutex<Vec<NetworkConfig>>,
    pub sent: Mutex<Vec<CallRequest>>,
    pub receipt_success: bool,
}

impl ScriptedProvider {
    pub fn on_chain(timeline: Timeline, chain_id: u64) -> Self {
        Self {
            timeline,
            injected: true,
            chain_id: Mutex::new(chain_id),
            accounts: vec![owner_address()],
            failures: Mutex::new(HashMap::new()),
            call_results: Mutex::new(HashMap::new()),
            added_chains: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            receipt_success: true,
        }
    }

    pub fn fail_next(&self, method: &'static str, err: PortError) {
        self.failures.lock().expect("failures lock").insert(method, err);
    }

    pub fn respond_to(&self, selector: [u8; 4], data: Bytes) {
        self.call_results
            .lock()
            .expect("call results lock")
            .insert(selector, data);
    }

    fn enter(&self, method: &'static str) -> Result<(), PortError> {
        self.timeline.push(format!("wallet:{method}"));
        match self.failures.lock().expect("failures lock").remove(method) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl ProviderPort for ScriptedProvider {
    fn is_injected(&self) -> bool {
        self.injected
    }

    async fn request_permissions(&self) -> Result<(), PortError> {
        self.enter("wallet_requestPermissions")
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, PortError> {
        self.enter("eth_requestAccounts")?;
        Ok(self.accounts.clone())
    }

    async fn chain_id(&self) -> Result<u64, PortError> {
        self.enter("eth_chainId")?;
        Ok(*self.chain_id.lock().expect("chain lock"))
    }

    async fn add_chain(&self, network: &NetworkConfig) -> Result<(), PortError> {
        self.enter("wallet_addEthereumChain")?;
        self.added_chains
            .lock()
            .expect("added chains lock")
            .push(network.clone());
        *self.chain_id.lock().expect("chain lock") = network.chain_id;
        Ok(())
    }

    async fn call(&self, request: &CallRequest) -> Result<Bytes, PortError> {
        self.enter("eth_call")?;
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&request.data[..4]);
        self.call_results
            .lock()
            .expect("call results lock")
            .get(&selector)
            .cloned()
            .ok_or_else(|| PortError::Transport("execution reverted".to_owned()))
    }

    async fn send_transaction(&self, request: &CallRequest) -> Result<B256, PortError> {
        self.enter("eth_sendTransaction")?;
        self.sent.lock().expect("sent lock").push(request.clone());
        Ok(keccak256(&request.data))
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxReceipt, PortError> {
        self.enter("eth_getTransactionReceipt")?;
        Ok(TxReceipt {
            transaction_hash: tx_hash,
            block_number: Some(42),
            success: self.receipt_success,
        })
    }
}

#[derive(Debug)]
pub struct StaticBackend {
    pub timeline: Timeline,
    pub network: Option<NetworkConfig>,
    pub marketplace: Address,
    pub logout_fails: bool,
    pub logins: Mutex<Vec<LoginRequest>>,
}

impl StaticBackend {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            network: Some(NetworkConfig::monad_testnet()),
            marketplace: marketplace_address(),
            logout_fails: false,
            logins: Mutex::new(Vec::new()),
        }
    }
}

impl BackendPort for StaticBackend {
    async fn network_config(&self) -> Result<NetworkConfig, PortError> {
        self.timeline.push("backend:network_config");
        self.network
            .clone()
            .ok_or_else(|| PortError::Transport("backend status 500".to_owned()))
    }

    async fn marketplace_abi(&self) -> Result<JsonAbi, PortError> {
        self.timeline.push("backend:marketplace_abi");
        serde_json::from_value(marketplace_abi_json())
            .map_err(|e| PortError::Validation(e.to_string()))
    }

    async fn marketplace_address(&self) -> Result<Address, PortError> {
        self.timeline.push("backend:marketplace_contract_address");
        Ok(self.marketplace)
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, PortError> {
        self.timeline.push("backend:login");
        self.logins.lock().expect("logins lock").push(request.clone());
        Ok(LoginResponse {
            id: Some(1),
            wallet_address: request.wallet_address.clone(),
        })
    }

    async fn logout(&self) -> Result<LogoutResponse, PortError> {
        self.timeline.push("backend:logout");
        if self.logout_fails {
            return Err(PortError::Transport("backend status 500".to_owned()));
        }
        Ok(LogoutResponse {
            message: Some("Successfully logged out".to_owned()),
        })
    }
}

#[derive(Debug, Default)]
pub struct RecordingControl {
    pub timeline: Timeline,
    pub views: Mutex<Vec<ControlView>>,
    pub alerts: Mutex<Vec<String>>,
    pub explorer_url: Mutex<Option<String>>,
}

impl RecordingControl {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            ..Self::default()
        }
    }

    pub fn last_view(&self) -> ControlView {
        self.views
            .lock()
            .expect("views lock")
            .last()
            .cloned()
            .expect("at least one render")
    }

    pub fn labels(&self) -> Vec<String> {
        self.views
            .lock()
            .expect("views lock")
            .iter()
            .map(|v| v.label.clone())
            .collect()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().expect("alerts lock").clone()
    }
}

impl ControlPort for RecordingControl {
    fn render(&self, view: &ControlView) {
        self.timeline.push(format!("render:{}", view.label));
        self.views.lock().expect("views lock").push(view.clone());
    }

    fn alert(&self, message: &str) {
        self.timeline.push(format!("alert:{message}"));
        self.alerts.lock().expect("alerts lock").push(message.to_owned());
    }

    fn transaction_sent(&self, tx_hash: B256, explorer_url: Option<&str>) {
        self.timeline.push(format!("sent:{tx_hash}"));
        *self.explorer_url.lock().expect("explorer lock") = explorer_url.map(str::to_owned);
    }
}

pub type TestOrchestrator = Orchestrator<ScriptedProvider, StaticBackend>;

pub fn orchestrator_on_chain(chain_id: u64) -> (TestOrchestrator, RecordingControl, Timeline) {
    let timeline = Timeline::default();
    let orch = Orchestrator::new(
        ScriptedProvider::on_chain(timeline.clone(), chain_id),
        StaticBackend::new(timeline.clone()),
    );
    (orch, RecordingControl::new(timeline.clone()), timeline)
}

pub fn owner_address() -> Address {
    "0x1000000000000000000000000000000000000001"
        .parse()
        .expect("valid owner address")
}

pub fn marketplace_address() -> Address {
    "0x7dA4Bf6D0EdC392C82D6C8A5aac414810689B9AE"
        .parse()
        .expect("valid marketplace address")
}

pub const NFT_CONTRACT: &str = "0x000000000000000000000000000000000000BEEF";
pub const BUYER: &str = "0x2000000000000000000000000000000000000002";

pub fn marketplace_abi_json() -> serde_json::Value {
    fn param(name: &str, ty: &str) -> serde_json::Value {
        serde_json::json!({ "name": name, "type": ty, "internalType": ty })
    }
    fn function(
        name: &str,
        inputs: Vec<serde_json::Value>,
        outputs: Vec<serde_json::Value>,
        mutability: &str,
    ) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "name": name,
            "inputs": inputs,
            "outputs": outputs,
            "stateMutability": mutability,
        })
    }

    serde_json::json!([
        function(
            "setNFTPrice",
            vec![
                param("nftAddress", "address"),
                param("tokenId", "uint256"),
                param("price", "uint256"),
            ],
            vec![],
            "nonpayable",
        ),
        function(
            "unlistNFT",
            vec![param("nftAddress", "address"), param("tokenId", "uint256")],
            vec![],
            "nonpayable",
        ),
        function(
            "acceptNFTProposal",
            vec![
                param("nftAddress", "address"),
                param("tokenId", "uint256"),
                param("buyer", "address"),
            ],
            vec![],
            "nonpayable",
        ),
        function(
            "getPrice",
            vec![param("nftAddress", "address"), param("tokenId", "uint256")],
            vec![param("", "uint256")],
            "view",
        ),
        function(
            "getAllListedNFTs",
            vec![],
            vec![param("", "address[]"), param("", "uint256[]")],
            "view",
        ),
    ])
}

/// ABI-encoded `true`.
pub fn encoded_true() -> Bytes {
    let mut word = [0u8; 32];
    word[31] = 1;
    Bytes::from(word.to_vec())
}

pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    out
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use alloy::primitives::{address, keccak256, Address, Bytes, B256};
use serde_json::{json, Value};

use minty_wallet_core::{
    parse_chain_id, CallRequest, NetworkConfig, PortError, ProviderPort, TxReceipt,
    UNSUPPORTED_METHOD_CODE,
};

use crate::WalletAdapterConfig;

/// Wallet provider speaking EIP-1193 `request({ method, params })`.
///
/// Backed by `window.ethereum` in the browser, by a JSON-RPC proxy on native
/// targets, or by an in-memory wallet when neither is available outside the
/// production profile.
#[derive(Debug, Clone)]
pub struct Eip1193Adapter {
    mode: ProviderMode,
    state: Arc<Mutex<ProviderState>>,
    poll_interval: Duration,
}

#[derive(Debug, Clone)]
enum ProviderMode {
    Disabled(String),
    Deterministic,
    #[cfg(not(target_arch = "wasm32"))]
    Proxy(ProxyRuntime),
    #[cfg(target_arch = "wasm32")]
    Browser,
}

#[derive(Debug, Clone)]
#[cfg(not(target_arch = "wasm32"))]
struct ProxyRuntime {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Clone)]
struct ProviderState {
    accounts: Vec<Address>,
    chain_id: u64,
    rejections: HashMap<String, (i64, String)>,
    call_results: HashMap<[u8; 4], Bytes>,
    receipt_success: bool,
    requests: Vec<String>,
    sent: Vec<CallRequest>,
}

impl Default for ProviderState {
    fn default() -> Self {
        Self {
            accounts: vec![address!("1000000000000000000000000000000000000001")],
            chain_id: 1,
            rejections: HashMap::new(),
            call_results: HashMap::new(),
            receipt_success: true,
            requests: Vec::new(),
            sent: Vec::new(),
        }
    }
}

impl Default for Eip1193Adapter {
    fn default() -> Self {
        Self::with_config(WalletAdapterConfig::from_env())
    }
}

impl Eip1193Adapter {
    pub fn with_config(config: WalletAdapterConfig) -> Self {
        #[cfg(target_arch = "wasm32")]
        let mode = if browser_provider().is_ok() {
            ProviderMode::Browser
        } else if config.strict_runtime_required() {
            ProviderMode::Disabled(
                "EIP-1193 browser provider not found in production runtime profile".to_owned(),
            )
        } else {
            ProviderMode::Deterministic
        };

        #[cfg(not(target_arch = "wasm32"))]
        let mode = if let Some(ref base_url) = config.eip1193_proxy_url {
            match reqwest::Client::builder()
                .timeout(Duration::from_millis(config.http_timeout_ms))
                .build()
            {
                Ok(client) => ProviderMode::Proxy(ProxyRuntime {
                    base_url: base_url.clone(),
                    client,
                }),
                Err(e) if config.strict_runtime_required() => ProviderMode::Disabled(format!(
                    "failed to initialize EIP-1193 proxy client in production profile: {e}"
                )),
                Err(e) => {
                    tracing::warn!(error = %e, "proxy client unavailable; using deterministic wallet");
                    ProviderMode::Deterministic
                }
            }
        } else if config.strict_runtime_required() {
            ProviderMode::Disabled(
                "EIP-1193 proxy URL not configured in production runtime profile".to_owned(),
            )
        } else {
            ProviderMode::Deterministic
        };

        tracing::debug!(mode = mode.name(), "wallet provider selected");
        Self {
            mode,
            state: Arc::new(Mutex::new(ProviderState::default())),
            poll_interval: Duration::from_millis(config.receipt_poll_interval_ms),
        }
    }

    /// In-memory wallet, regardless of environment.
    pub fn deterministic() -> Self {
        Self {
            mode: ProviderMode::Deterministic,
            state: Arc::new(Mutex::new(ProviderState::default())),
            poll_interval: Duration::ZERO,
        }
    }

    pub fn mode_name(&self) -> &'static str {
        self.mode.name()
    }

    fn state(&self) -> Result<MutexGuard<'_, ProviderState>, PortError> {
        self.state
            .lock()
            .map_err(|e| PortError::Transport(format!("provider lock poisoned: {e}")))
    }

    pub fn debug_inject_accounts_changed(&self, accounts: Vec<Address>) -> Result<(), PortError> {
        self.state()?.accounts = accounts;
        Ok(())
    }

    pub fn debug_inject_chain_changed(&self, chain_id: u64) -> Result<(), PortError> {
        self.state()?.chain_id = chain_id;
        Ok(())
    }

    /// Makes the next `method` request fail with the given EIP-1193 error.
    pub fn debug_reject_next(&self, method: &str, code: i64, message: &str) -> Result<(), PortError> {
        self.state()?
            .rejections
            .insert(method.to_owned(), (code, message.to_owned()));
        Ok(())
    }

    /// Sets the raw `eth_call` result for calls whose data starts with `selector`.
    pub fn debug_set_call_result(&self, selector: [u8; 4], data: Bytes) -> Result<(), PortError> {
        self.state()?.call_results.insert(selector, data);
        Ok(())
    }

    pub fn debug_set_receipt_success(&self, success: bool) -> Result<(), PortError> {
        self.state()?.receipt_success = success;
        Ok(())
    }

    /// Methods the in-memory wallet has served, oldest first.
    pub fn debug_requests(&self) -> Result<Vec<String>, PortError> {
        Ok(self.state()?.requests.clone())
    }

    pub fn debug_sent(&self) -> Result<Vec<CallRequest>, PortError> {
        Ok(self.state()?.sent.clone())
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, PortError> {
        tracing::debug!(method, mode = self.mode.name(), "eip1193 request");
        match &self.mode {
            ProviderMode::Disabled(reason) => Err(PortError::Policy(reason.clone())),
            ProviderMode::Deterministic => self.deterministic_request(method, &params),
            #[cfg(not(target_arch = "wasm32"))]
            ProviderMode::Proxy(proxy) => proxy.call(method, params).await,
            #[cfg(target_arch = "wasm32")]
            ProviderMode::Browser => wasm_request(method, params).await,
        }
    }

    fn deterministic_request(&self, method: &str, params: &Value) -> Result<Value, PortError> {
        let mut g = self.state()?;
        g.requests.push(method.to_owned());
        if let Some((code, message)) = g.rejections.remove(method) {
            return Err(PortError::Rpc { code, message });
        }

        match method {
            "wallet_requestPermissions" => Ok(json!([{ "parentCapability": "eth_accounts" }])),
            "eth_requestAccounts" | "eth_accounts" => Ok(json!(g
                .accounts
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>())),
            "eth_chainId" => Ok(json!(format!("{:#x}", g.chain_id))),
            "wallet_addEthereumChain" => {
                let chain = params
                    .get(0)
                    .and_then(|p| p.get("chainId"))
                    .ok_or_else(|| PortError::Validation("chainId param required".to_owned()))?;
                g.chain_id = json_chain_id_to_u64(chain)?;
                Ok(Value::Null)
            }
            "eth_call" => {
                let request = first_call_param(params)?;
                let mut selector = [0u8; 4];
                if request.data.len() >= 4 {
                    selector.copy_from_slice(&request.data[..4]);
                }
                let result = g.call_results.get(&selector).cloned().unwrap_or_else(|| {
                    let mut word = [0u8; 32];
                    word[31] = 1;
                    Bytes::from(word.to_vec())
                });
                Ok(json!(result))
            }
            "eth_sendTransaction" => {
                let request = first_call_param(params)?;
                let mut seed = serde_json::to_vec(&request)
                    .map_err(|e| PortError::Validation(format!("tx payload serialization failed: {e}")))?;
                seed.extend_from_slice(&(g.sent.len() as u64).to_be_bytes());
                g.sent.push(request);
                Ok(json!(keccak256(seed)))
            }
            "eth_getTransactionReceipt" => {
                let hash = params
                    .get(0)
                    .cloned()
                    .ok_or_else(|| PortError::Validation("tx hash param required".to_owned()))?;
                Ok(json!({
                    "transactionHash": hash,
                    "blockNumber": "0x1",
                    "status": if g.receipt_success { "0x1" } else { "0x0" },
                }))
            }
            other => Err(PortError::Rpc {
                code: UNSUPPORTED_METHOD_CODE,
                message: format!("method {other} is not supported"),
            }),
        }
    }
}

impl ProviderMode {
    fn name(&self) -> &'static str {
        match self {
            Self::Disabled(_) => "disabled",
            Self::Deterministic => "deterministic",
            #[cfg(not(target_arch = "wasm32"))]
            Self::Proxy(_) => "proxy",
            #[cfg(target_arch = "wasm32")]
            Self::Browser => "browser",
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl ProxyRuntime {
    async fn call(&self, method: &str, params: Value) -> Result<Value, PortError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response = self
            .client
            .post(&self.base_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PortError::Transport(format!("eip1193 proxy request failed: {e}")))?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| PortError::Transport(format!("eip1193 proxy json decode failed: {e}")))?;
        if let Some(err) = body.get("error") {
            return Err(rpc_error(err));
        }
        if !status.is_success() {
            return Err(PortError::Transport(format!(
                "eip1193 proxy status {status}: {body}"
            )));
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| PortError::Transport("eip1193 proxy missing result".to_owned()))
    }
}

impl ProviderPort for Eip1193Adapter {
    fn is_injected(&self) -> bool {
        !matches!(self.mode, ProviderMode::Disabled(_))
    }

    async fn request_permissions(&self) -> Result<(), PortError> {
        self.request("wallet_requestPermissions", json!([{ "eth_accounts": {} }]))
            .await?;
        Ok(())
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, PortError> {
        let result = self.request("eth_requestAccounts", json!([])).await?;
        let arr = result
            .as_array()
            .ok_or_else(|| PortError::Transport("eth_requestAccounts: array expected".to_owned()))?;
        arr.iter()
            .map(|item| {
                item.as_str()
                    .ok_or_else(|| {
                        PortError::Transport("eth_requestAccounts: string expected".to_owned())
                    })?
                    .parse()
                    .map_err(|e| PortError::Validation(format!("invalid account address: {e}")))
            })
            .collect()
    }

    async fn chain_id(&self) -> Result<u64, PortError> {
        let result = self.request("eth_chainId", json!([])).await?;
        json_chain_id_to_u64(&result)
    }

    async fn add_chain(&self, network: &NetworkConfig) -> Result<(), PortError> {
        let param = serde_json::to_value(network)
            .map_err(|e| PortError::Validation(format!("network config serialization failed: {e}")))?;
        self.request("wallet_addEthereumChain", json!([param]))
            .await?;
        Ok(())
    }

    async fn call(&self, request: &CallRequest) -> Result<Bytes, PortError> {
        let result = self.request("eth_call", json!([request, "latest"])).await?;
        result
            .as_str()
            .ok_or_else(|| PortError::Transport("eth_call must return hex data".to_owned()))?
            .parse()
            .map_err(|e| PortError::Validation(format!("invalid eth_call result: {e}")))
    }

    async fn send_transaction(&self, request: &CallRequest) -> Result<B256, PortError> {
        let result = self.request("eth_sendTransaction", json!([request])).await?;
        result
            .as_str()
            .ok_or_else(|| PortError::Transport("eth_sendTransaction must return hash".to_owned()))?
            .parse()
            .map_err(|e| PortError::Validation(format!("invalid tx hash: {e}")))
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxReceipt, PortError> {
        loop {
            let result = self
                .request("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;
            if !result.is_null() {
                return parse_receipt(tx_hash, &result);
            }
            tracing::trace!(%tx_hash, "receipt not yet available");
            pause(self.poll_interval).await?;
        }
    }
}

fn first_call_param(params: &Value) -> Result<CallRequest, PortError> {
    let raw = params
        .get(0)
        .cloned()
        .ok_or_else(|| PortError::Validation("transaction param required".to_owned()))?;
    serde_json::from_value(raw)
        .map_err(|e| PortError::Validation(format!("invalid transaction param: {e}")))
}

fn parse_receipt(tx_hash: B256, raw: &Value) -> Result<TxReceipt, PortError> {
    let transaction_hash = match raw.get("transactionHash").and_then(Value::as_str) {
        Some(hash) => hash
            .parse()
            .map_err(|e| PortError::Validation(format!("invalid receipt hash: {e}")))?,
        None => tx_hash,
    };
    let block_number = raw
        .get("blockNumber")
        .filter(|v| !v.is_null())
        .map(json_chain_id_to_u64)
        .transpose()?;
    let status = raw
        .get("status")
        .ok_or_else(|| PortError::Validation("receipt missing status".to_owned()))
        .and_then(json_chain_id_to_u64)?;
    Ok(TxReceipt {
        transaction_hash,
        block_number,
        success: status == 1,
    })
}

/// Maps a JSON-RPC / EIP-1193 error object onto [`PortError::Rpc`].
fn rpc_error(err: &Value) -> PortError {
    let message = err
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("unknown provider error")
        .to_owned();
    match err.get("code").and_then(Value::as_i64) {
        Some(code) => PortError::Rpc { code, message },
        None => PortError::Transport(format!("provider returned error: {err}")),
    }
}

/// Chain ids and other quantities arrive as hex strings, decimal strings or numbers.
fn json_chain_id_to_u64(value: &Value) -> Result<u64, PortError> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    let s = value
        .as_str()
        .ok_or_else(|| PortError::Validation("quantity must be string or number".to_owned()))?;
    parse_chain_id(s).map_err(|e| PortError::Validation(format!("invalid quantity {s}: {e}")))
}

#[cfg(not(target_arch = "wasm32"))]
async fn pause(duration: Duration) -> Result<(), PortError> {
    tokio::time::sleep(duration).await;
    Ok(())
}

#[cfg(target_arch = "wasm32")]
async fn pause(duration: Duration) -> Result<(), PortError> {
    let window =
        web_sys::window().ok_or_else(|| PortError::Transport("missing window".to_owned()))?;
    let millis = i32::try_from(duration.as_millis()).unwrap_or(i32::MAX);
    let mut scheduled = Ok(0);
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        scheduled = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis);
    });
    scheduled.map_err(|e| PortError::Transport(format!("setTimeout failed: {e:?}")))?;
    wasm_bindgen_futures::JsFuture::from(promise)
        .await
        .map(|_| ())
        .map_err(|e| PortError::Transport(format!("timer rejected: {e:?}")))
}

#[cfg(target_arch = "wasm32")]
async fn wasm_request(method: &str, params: Value) -> Result<Value, PortError> {
    use wasm_bindgen::JsCast;

    let provider = browser_provider()?;
    let request_fn = get_prop(&provider, "request")
        .ok()
        .and_then(|v| v.dyn_into::<js_sys::Function>().ok())
        .ok_or(PortError::NotImplemented(
            "window.ethereum.request is unavailable",
        ))?;

    let request = json!({
        "method": method,
        "params": params,
    });
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    let request_js = serde::Serialize::serialize(&request, &serializer)
        .map_err(|e| PortError::Transport(format!("failed to encode wasm request: {e}")))?;
    let promise_js = request_fn
        .call1(&provider, &request_js)
        .map_err(|e| PortError::Transport(format!("provider request dispatch failed: {e:?}")))?;
    let promise = promise_js
        .dyn_into::<js_sys::Promise>()
        .map_err(|_| PortError::Transport("provider request did not return Promise".to_owned()))?;
    let result_js = wasm_bindgen_futures::JsFuture::from(promise)
        .await
        .map_err(js_rpc_error)?;
    if result_js.is_null() || result_js.is_undefined() {
        return Ok(Value::Null);
    }
    serde_wasm_bindgen::from_value(result_js)
        .map_err(|e| PortError::Transport(format!("failed to decode wasm response: {e}")))
}

/// Rejections from `window.ethereum` carry a numeric `code` and a `message`.
#[cfg(target_arch = "wasm32")]
fn js_rpc_error(err: wasm_bindgen::JsValue) -> PortError {
    let code = get_prop(&err, "code").ok().and_then(|v| v.as_f64());
    let message = get_prop(&err, "message")
        .ok()
        .and_then(|v| v.as_string())
        .unwrap_or_else(|| format!("{err:?}"));
    match code {
        Some(code) => PortError::Rpc {
            code: code as i64,
            message,
        },
        None => PortError::Transport(format!("provider request rejected: {message}")),
    }
}

#[cfg(target_arch = "wasm32")]
fn browser_provider() -> Result<wasm_bindgen::JsValue, PortError> {
    let window =
        web_sys::window().ok_or_else(|| PortError::Transport("missing window".to_owned()))?;
    let provider = get_prop(&window.into(), "ethereum")?;
    if provider.is_null() || provider.is_undefined() {
        return Err(PortError::NotFound("window.ethereum missing".to_owned()));
    }
    Ok(provider)
}

#[cfg(target_arch = "wasm32")]
fn get_prop(target: &wasm_bindgen::JsValue, key: &str) -> Result<wasm_bindgen::JsValue, PortError> {
    js_sys::Reflect::get(target, &wasm_bindgen::JsValue::from_str(key))
        .map_err(|e| PortError::Transport(format!("read provider property {key} failed: {e:?}")))
}

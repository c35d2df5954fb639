use alloy::json_abi::JsonAbi;
use alloy::primitives::{Address, Bytes, B256};
use thiserror::Error;

use crate::domain::{
    CallRequest, ControlView, LoginRequest, LoginResponse, LogoutResponse, NetworkConfig,
    TxReceipt,
};

/// EIP-1193 error code for a request the user rejected in the wallet.
pub const USER_REJECTED_CODE: i64 = 4001;
/// EIP-1193 error code for a method the provider does not support.
pub const UNSUPPORTED_METHOD_CODE: i64 = 4200;
/// Returned by wallets asked to switch to a chain they do not know.
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

#[derive(Debug, Error)]
pub enum PortError {
    #[error("port not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("policy error: {0}")]
    Policy(String),
    #[error("unsupported operation: {0}")]
    Unsupported(String),
    #[error("provider error {code}: {message}")]
    Rpc { code: i64, message: String },
}

impl PortError {
    pub fn rpc_code(&self) -> Option<i64> {
        match self {
            Self::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Wallet provider seam. Every awaited call may surface a wallet prompt.
#[allow(async_fn_in_trait)]
pub trait ProviderPort {
    /// Whether a wallet is present at all.
    fn is_injected(&self) -> bool;
    async fn request_permissions(&self) -> Result<(), PortError>;
    async fn request_accounts(&self) -> Result<Vec<Address>, PortError>;
    async fn chain_id(&self) -> Result<u64, PortError>;
    async fn add_chain(&self, network: &NetworkConfig) -> Result<(), PortError>;
    async fn call(&self, request: &CallRequest) -> Result<Bytes, PortError>;
    async fn send_transaction(&self, request: &CallRequest) -> Result<B256, PortError>;
    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxReceipt, PortError>;
}

#[allow(async_fn_in_trait)]
pub trait BackendPort {
    async fn network_config(&self) -> Result<NetworkConfig, PortError>;
    async fn marketplace_abi(&self) -> Result<JsonAbi, PortError>;
    async fn marketplace_address(&self) -> Result<Address, PortError>;
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, PortError>;
    async fn logout(&self) -> Result<LogoutResponse, PortError>;
}

/// A clickable control plus the page's alert surface.
pub trait ControlPort {
    fn render(&self, view: &ControlView);
    fn alert(&self, message: &str);

    /// Called once the wallet has broadcast the transaction, before its receipt.
    fn transaction_sent(&self, _tx_hash: B256, _explorer_url: Option<&str>) {}
}

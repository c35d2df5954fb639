use thiserror::Error;

use crate::domain::MarketAction;
use crate::ports::{PortError, UNSUPPORTED_METHOD_CODE, USER_REJECTED_CODE};

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("no wallet provider injected")]
    MissingWallet,
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("failed to switch to {chain_name}: {reason}")]
    NetworkSwitch { chain_name: String, reason: String },
    #[error("request rejected by user")]
    UserRejected,
    #[error("unsupported wallet operation: {0}")]
    Unsupported(String),
    #[error("backend request failed: {0}")]
    BackendFetch(String),
    #[error("contract call failed: {0}")]
    ContractCall(String),
    #[error("no accounts found")]
    NoAccounts,
    #[error("token is not an ERC-721 NFT")]
    NotErc721,
}

impl ActionError {
    pub fn backend(err: PortError) -> Self {
        Self::BackendFetch(err.to_string())
    }

    /// Whether the action stopped before anything reached the wallet or backend.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::MissingField(_) | Self::InvalidField { .. })
    }

    pub fn user_message(&self, action: MarketAction) -> String {
        match self {
            Self::MissingWallet => "Please install MetaMask or a Monad-compatible wallet".to_owned(),
            Self::MissingField(_) if action == MarketAction::List => {
                "Please fill all fields!".to_owned()
            }
            Self::MissingField(_) => "Invalid NFT details!".to_owned(),
            Self::InvalidField { field, reason } => format!("Invalid {field}: {reason}"),
            Self::NetworkSwitch { chain_name, .. } => format!("Failed to switch to {chain_name}"),
            Self::UserRejected => format!("{} was cancelled by user", action.noun()),
            Self::Unsupported(_) => {
                "Wallet connection issue. Please try reconnecting your wallet.".to_owned()
            }
            Self::NotErc721 => {
                "This token is not an ERC-721 NFT. Approval not supported.".to_owned()
            }
            Self::BackendFetch(reason) | Self::ContractCall(reason) => {
                format!("{} failed: {reason}", action.noun())
            }
            Self::NoAccounts => format!("{} failed: No accounts found", action.noun()),
        }
    }

    pub fn connect_message(&self) -> String {
        match self {
            Self::MissingWallet => {
                "Please install MetaMask or another Ethereum wallet extension!".to_owned()
            }
            Self::UserRejected => "Please approve the connection to continue".to_owned(),
            Self::NetworkSwitch { chain_name, .. } => {
                format!("Error: Failed to switch to {chain_name}")
            }
            Self::NoAccounts => "Error: No accounts found".to_owned(),
            Self::BackendFetch(_) => "Error: Login failed".to_owned(),
            other => format!("Error: {other}"),
        }
    }
}

/// Classifies a wallet-side failure.
impl From<PortError> for ActionError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::Rpc {
                code: USER_REJECTED_CODE,
                ..
            } => Self::UserRejected,
            PortError::Rpc {
                code: UNSUPPORTED_METHOD_CODE,
                message,
            } => Self::Unsupported(message),
            PortError::Unsupported(reason) => Self::Unsupported(reason),
            other => Self::ContractCall(other.to_string()),
        }
    }
}

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use alloy::primitives::utils::{ParseUnits, Unit};
use alloy::primitives::{Address, Bytes, B256, U256};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::ActionError;

/// Chain id of Monad Testnet, the network the marketplace contract lives on.
pub const DEFAULT_CHAIN_ID: u64 = 10_143;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Target network description, shaped like an EIP-3085 `wallet_addEthereumChain`
/// parameter so it can be forwarded to the wallet unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    #[serde(
        serialize_with = "serialize_chain_id",
        deserialize_with = "deserialize_chain_id"
    )]
    pub chain_id: u64,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_gas_limit: Option<u64>,
}

impl NetworkConfig {
    pub fn monad_testnet() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            chain_name: "Monad Testnet".to_owned(),
            native_currency: NativeCurrency {
                name: "Monad".to_owned(),
                symbol: "MON".to_owned(),
                decimals: 18,
            },
            rpc_urls: vec!["https://testnet-rpc.monad.xyz".to_owned()],
            block_explorer_urls: vec!["https://testnet.monadexplorer.com/".to_owned()],
            block_gas_limit: Some(150_000_000),
        }
    }

    pub fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    /// Network label sent to the backend on login, e.g. `monad-testnet`.
    pub fn slug(&self) -> String {
        self.chain_name
            .split_whitespace()
            .map(str::to_ascii_lowercase)
            .collect::<Vec<_>>()
            .join("-")
    }

    pub fn explorer_tx_url(&self, tx_hash: B256) -> Option<String> {
        self.block_explorer_urls
            .first()
            .map(|base| format!("{}/tx/{tx_hash}", base.trim_end_matches('/')))
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::monad_testnet()
    }
}

/// Parses a chain id given either as `0x`-prefixed hex or as decimal.
pub fn parse_chain_id(raw: &str) -> Result<u64, ParseIntError> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => raw.parse(),
    }
}

fn serialize_chain_id<S: Serializer>(chain_id: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{chain_id:#x}"))
}

fn deserialize_chain_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| D::Error::custom("chain id must be a non-negative integer")),
        Value::String(s) => {
            parse_chain_id(&s).map_err(|e| D::Error::custom(format!("invalid chain id {s}: {e}")))
        }
        _ => Err(D::Error::custom("chain id must be a string or number")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarketAction {
    Approve,
    List,
    Unlist,
    AcceptProposal,
}

impl MarketAction {
    pub fn labels(self) -> ActionLabels {
        match self {
            Self::Approve => ActionLabels {
                idle: "Approve",
                pending: "Approving...",
                submitted: "Confirming...",
                confirmed: "Approved",
            },
            Self::List => ActionLabels {
                idle: "List NFT",
                pending: "Listing...",
                submitted: "Confirming...",
                confirmed: "Listed!",
            },
            Self::Unlist => ActionLabels {
                idle: "Unlist",
                pending: "Unlisting...",
                submitted: "Confirming...",
                confirmed: "Unlisted",
            },
            Self::AcceptProposal => ActionLabels {
                idle: "Accept Proposal",
                pending: "Accepting...",
                submitted: "Confirming...",
                confirmed: "Confirmed",
            },
        }
    }

    /// Contract method invoked for this action.
    pub fn method_name(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::List => "setNFTPrice",
            Self::Unlist => "unlistNFT",
            Self::AcceptProposal => "acceptNFTProposal",
        }
    }

    /// Noun used in user-facing messages.
    pub fn noun(self) -> &'static str {
        match self {
            Self::Approve => "Approval",
            Self::List => "Listing",
            Self::Unlist => "Unlisting",
            Self::AcceptProposal => "Proposal acceptance",
        }
    }
}

impl fmt::Display for MarketAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Approve => "approve",
            Self::List => "list",
            Self::Unlist => "unlist",
            Self::AcceptProposal => "acceptProposal",
        };
        f.write_str(name)
    }
}

impl FromStr for MarketAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(Self::Approve),
            "list" => Ok(Self::List),
            "unlist" => Ok(Self::Unlist),
            "acceptProposal" | "accept-proposal" => Ok(Self::AcceptProposal),
            other => Err(format!("unknown marketplace action: {other}")),
        }
    }
}

/// Raw action input as captured from the page when the user clicks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxIntent {
    pub action: MarketAction,
    pub nft_contract: String,
    pub token_id: String,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub buyer: Option<String>,
}

impl TxIntent {
    pub fn approve(nft_contract: impl Into<String>, token_id: impl Into<String>) -> Self {
        Self::bare(MarketAction::Approve, nft_contract, token_id)
    }

    pub fn list(
        nft_contract: impl Into<String>,
        token_id: impl Into<String>,
        price: impl Into<String>,
    ) -> Self {
        Self {
            price: Some(price.into()),
            ..Self::bare(MarketAction::List, nft_contract, token_id)
        }
    }

    pub fn unlist(nft_contract: impl Into<String>, token_id: impl Into<String>) -> Self {
        Self::bare(MarketAction::Unlist, nft_contract, token_id)
    }

    pub fn accept_proposal(
        nft_contract: impl Into<String>,
        token_id: impl Into<String>,
        buyer: impl Into<String>,
    ) -> Self {
        Self {
            buyer: Some(buyer.into()),
            ..Self::bare(MarketAction::AcceptProposal, nft_contract, token_id)
        }
    }

    fn bare(
        action: MarketAction,
        nft_contract: impl Into<String>,
        token_id: impl Into<String>,
    ) -> Self {
        Self {
            action,
            nft_contract: nft_contract.into(),
            token_id: token_id.into(),
            price: None,
            buyer: None,
        }
    }

    /// Checks every required field for presence before parsing any of them, so
    /// an incomplete form always reports the missing field first.
    pub fn validate(&self) -> Result<ValidatedIntent, ActionError> {
        let nft_contract = required("nft contract", &self.nft_contract)?;
        let token_id = required("token id", &self.token_id)?;
        let price = match self.action {
            MarketAction::List => Some(required("price", self.price.as_deref().unwrap_or(""))?),
            _ => None,
        };
        let buyer = match self.action {
            MarketAction::AcceptProposal => {
                Some(required("buyer", self.buyer.as_deref().unwrap_or(""))?)
            }
            _ => None,
        };

        let params = match (price, buyer) {
            (Some(price), _) => ActionParams::Price(parse_price(price)?),
            (_, Some(buyer)) => ActionParams::Buyer(parse_address("buyer", buyer)?),
            _ => ActionParams::None,
        };

        Ok(ValidatedIntent {
            action: self.action,
            nft_contract: parse_address("nft contract", nft_contract)?,
            token_id: parse_token_id(token_id)?,
            params,
        })
    }
}

fn required<'a>(field: &'static str, raw: &'a str) -> Result<&'a str, ActionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ActionError::MissingField(field));
    }
    Ok(trimmed)
}

fn parse_address(field: &'static str, raw: &str) -> Result<Address, ActionError> {
    raw.parse().map_err(|e| ActionError::InvalidField {
        field,
        reason: format!("{e}"),
    })
}

fn parse_token_id(raw: &str) -> Result<U256, ActionError> {
    U256::from_str(raw).map_err(|e| ActionError::InvalidField {
        field: "token id",
        reason: e.to_string(),
    })
}

/// Price in ether, converted to wei. Signed amounts are rejected rather than
/// wrapped into `uint256`.
fn parse_price(raw: &str) -> Result<U256, ActionError> {
    let invalid = |reason: String| ActionError::InvalidField {
        field: "price",
        reason,
    };
    match ParseUnits::parse_units(raw, Unit::ETHER).map_err(|e| invalid(e.to_string()))? {
        ParseUnits::U256(wei) => Ok(wei),
        ParseUnits::I256(_) => Err(invalid("must not be negative".to_owned())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionParams {
    None,
    /// Listing price in wei.
    Price(U256),
    Buyer(Address),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedIntent {
    pub action: MarketAction,
    pub nft_contract: Address,
    pub token_id: U256,
    pub params: ActionParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionLabels {
    pub idle: &'static str,
    pub pending: &'static str,
    pub submitted: &'static str,
    pub confirmed: &'static str,
}

impl ActionLabels {
    pub const CONNECT: Self = Self {
        idle: "Connect Wallet",
        pending: "Connecting...",
        submitted: "Connecting...",
        confirmed: "Connected",
    };
}

/// What a UI control should currently show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlView {
    pub label: String,
    pub busy: bool,
    pub disabled: bool,
}

/// Transaction fields as sent to `eth_call` / `eth_sendTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    pub to: Address,
    pub data: Bytes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    pub success: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkAssurance {
    AlreadyOnTarget,
    SwitchRequested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub action: MarketAction,
    pub signer: Address,
    pub tx_hash: B256,
    pub receipt: TxReceipt,
    pub explorer_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub nft_contract: Address,
    pub token_id: U256,
    pub price_wei: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub wallet_address: String,
    pub network: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub id: Option<u64>,
    pub wallet_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSession {
    pub address: Address,
    pub login: LoginResponse,
}

/// `0x1234...abcd` form of a checksummed address.
pub fn truncate_address(address: Address) -> String {
    let full = address.to_string();
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

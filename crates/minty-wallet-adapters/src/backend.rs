use alloy::json_abi::JsonAbi;
use alloy::primitives::Address;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use minty_wallet_core::{
    BackendPort, LoginRequest, LoginResponse, LogoutResponse, NetworkConfig, PortError,
};

use crate::WalletAdapterConfig;

/// HTTP client for the marketplace backend's `/api` endpoints.
#[derive(Debug, Clone)]
pub struct BackendAdapter {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ContractAddressResponse {
    contract_address: String,
}

impl BackendAdapter {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_config(config: &WalletAdapterConfig) -> Result<Self, PortError> {
        let builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(std::time::Duration::from_millis(config.http_timeout_ms));
        let client = builder
            .build()
            .map_err(|e| PortError::Transport(format!("failed to build backend client: {e}")))?;
        Ok(Self {
            base_url: config.backend_base_url.trim_end_matches('/').to_owned(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, PortError> {
        tracing::debug!(path, "backend GET");
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| PortError::Transport(format!("GET {path} failed: {e}")))?;
        decode(path, response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, PortError> {
        tracing::debug!(path, "backend POST");
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| PortError::Transport(format!("POST {path} failed: {e}")))?;
        decode(path, response).await
    }
}

async fn decode<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> Result<T, PortError> {
    let status = response.status();
    if !status.is_success() {
        return Err(PortError::Transport(format!("{path} returned status {status}")));
    }
    response
        .json()
        .await
        .map_err(|e| PortError::Validation(format!("{path} response decode failed: {e}")))
}

impl BackendPort for BackendAdapter {
    async fn network_config(&self) -> Result<NetworkConfig, PortError> {
        self.get_json("/api/network_config").await
    }

    async fn marketplace_abi(&self) -> Result<JsonAbi, PortError> {
        self.get_json("/api/marketplace_abi").await
    }

    async fn marketplace_address(&self) -> Result<Address, PortError> {
        let response: ContractAddressResponse =
            self.get_json("/api/marketplace_contract_address").await?;
        response.contract_address.trim().parse().map_err(|e| {
            PortError::Validation(format!(
                "invalid marketplace address {}: {e}",
                response.contract_address
            ))
        })
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, PortError> {
        self.post_json("/api/login", request).await
    }

    async fn logout(&self) -> Result<LogoutResponse, PortError> {
        self.get_json("/api/logout").await
    }
}

//! Bridge between the shell front-ends and the wallet workspace crates.
//! This must remain the only shell-facing boundary for wallet operations.

use std::sync::Arc;

use alloy::primitives::{Address, U256};

use minty_wallet_adapters::{BackendAdapter, Eip1193Adapter, WalletAdapterConfig};
use minty_wallet_core::{
    ActionError, ActionOutcome, ControlPort, Listing, NetworkAssurance, NetworkConfig,
    Orchestrator, PortError, TxIntent, WalletSession,
};

type WalletOrchestrator = Orchestrator<Eip1193Adapter, BackendAdapter>;

#[derive(Clone)]
pub struct WalletBridge {
    orchestrator: Arc<WalletOrchestrator>,
}

impl WalletBridge {
    pub fn with_config(config: WalletAdapterConfig) -> Result<Self, PortError> {
        let backend = BackendAdapter::with_config(&config)?;
        tracing::debug!(backend = backend.base_url(), "wallet bridge configured");
        Ok(Self {
            orchestrator: Arc::new(Orchestrator::new(
                Eip1193Adapter::with_config(config),
                backend,
            )),
        })
    }

    pub fn provider_mode(&self) -> &'static str {
        self.orchestrator.provider.mode_name()
    }

    pub async fn connect<C>(&self, control: &C) -> Result<WalletSession, ActionError>
    where
        C: ControlPort + ?Sized,
    {
        self.orchestrator.connect_wallet(control).await
    }

    pub async fn disconnect<C>(&self, control: &C) -> Result<String, ActionError>
    where
        C: ControlPort + ?Sized,
    {
        self.orchestrator.disconnect_wallet(control).await
    }

    pub async fn submit<C>(&self, intent: &TxIntent, control: &C) -> Result<ActionOutcome, ActionError>
    where
        C: ControlPort + ?Sized,
    {
        self.orchestrator.submit(intent, control).await
    }

    pub async fn network(&self) -> NetworkConfig {
        self.orchestrator.network_config().await
    }

    pub async fn ensure_network(&self) -> Result<NetworkAssurance, ActionError> {
        self.orchestrator.ensure_network().await
    }

    pub async fn listings(&self) -> Result<Vec<Listing>, ActionError> {
        self.orchestrator.listed_nfts().await
    }

    pub async fn listing_price(&self, nft_contract: Address, token_id: U256) -> Result<U256, ActionError> {
        self.orchestrator.listing_price(nft_contract, token_id).await
    }
}

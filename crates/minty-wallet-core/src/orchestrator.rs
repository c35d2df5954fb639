use std::sync::{Mutex, PoisonError};

use alloy::dyn_abi::DynSolValue;
use alloy::json_abi::JsonAbi;
use alloy::primitives::{Address, U256};
use tracing::{debug, info, warn};

use crate::contract;
use crate::domain::{
    truncate_address, ActionLabels, ActionOutcome, Listing, LoginRequest, MarketAction,
    NetworkAssurance, NetworkConfig, TxIntent, ValidatedIntent, WalletSession,
};
use crate::error::ActionError;
use crate::ports::{BackendPort, ControlPort, PortError, ProviderPort, USER_REJECTED_CODE};
use crate::state_machine::TrackedControl;

pub struct Orchestrator<P, B>
where
    P: ProviderPort,
    B: BackendPort,
{
    pub provider: P,
    pub backend: B,
    fallback_network: NetworkConfig,
    network: Mutex<Option<NetworkConfig>>,
}

impl<P, B> Orchestrator<P, B>
where
    P: ProviderPort,
    B: BackendPort,
{
    pub fn new(provider: P, backend: B) -> Self {
        Self::with_fallback_network(provider, backend, NetworkConfig::default())
    }

    pub fn with_fallback_network(
        provider: P,
        backend: B,
        fallback_network: NetworkConfig,
    ) -> Self {
        Self {
            provider,
            backend,
            fallback_network,
            network: Mutex::new(None),
        }
    }

    /// Target network, fetched from the backend on first use and cached for the
    /// orchestrator's lifetime. A failed fetch caches the fallback instead.
    pub async fn network_config(&self) -> NetworkConfig {
        if let Some(cached) = self.cached_network() {
            return cached;
        }

        let loaded = match self.backend.network_config().await {
            Ok(network) => network,
            Err(e) => {
                warn!(error = %e, "network config fetch failed; using built-in default");
                self.fallback_network.clone()
            }
        };
        *self.network.lock().unwrap_or_else(PoisonError::into_inner) = Some(loaded.clone());
        loaded
    }

    fn cached_network(&self) -> Option<NetworkConfig> {
        self.network
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn ensure_network(&self) -> Result<NetworkAssurance, ActionError> {
        if !self.provider.is_injected() {
            return Err(ActionError::MissingWallet);
        }

        let network = self.network_config().await;
        let current = self.provider.chain_id().await?;
        if current == network.chain_id {
            debug!(chain_id = current, "wallet already on target chain");
            return Ok(NetworkAssurance::AlreadyOnTarget);
        }

        info!(
            current,
            target = network.chain_id,
            chain = %network.chain_name,
            "requesting wallet chain switch"
        );
        self.provider
            .add_chain(&network)
            .await
            .map_err(|e| match e {
                PortError::Rpc {
                    code: USER_REJECTED_CODE,
                    ..
                } => ActionError::UserRejected,
                other => ActionError::NetworkSwitch {
                    chain_name: network.chain_name.clone(),
                    reason: other.to_string(),
                },
            })?;
        Ok(NetworkAssurance::SwitchRequested)
    }

    async fn signer(&self) -> Result<Address, ActionError> {
        self.provider
            .request_accounts()
            .await?
            .first()
            .copied()
            .ok_or(ActionError::NoAccounts)
    }

    /// Runs one marketplace action end to end, reflecting every stage on
    /// `control`. Failures are alerted and leave the control enabled.
    pub async fn submit<C>(
        &self,
        intent: &TxIntent,
        control: &C,
    ) -> Result<ActionOutcome, ActionError>
    where
        C: ControlPort + ?Sized,
    {
        let mut tracked = TrackedControl::new(control, intent.action.labels());
        let result = self.submit_tracked(intent, &mut tracked).await;
        if let Err(err) = &result {
            warn!(action = %intent.action, error = %err, "marketplace action failed");
            control.alert(&err.user_message(intent.action));
            tracked.fail();
        }
        result
    }

    async fn submit_tracked<C>(
        &self,
        intent: &TxIntent,
        tracked: &mut TrackedControl<'_, C>,
    ) -> Result<ActionOutcome, ActionError>
    where
        C: ControlPort + ?Sized,
    {
        tracked.start()?;
        let intent = intent.validate()?;

        self.ensure_network().await?;
        let signer = self.signer().await?;
        let marketplace = self
            .backend
            .marketplace_address()
            .await
            .map_err(ActionError::backend)?;

        let request = match intent.action {
            MarketAction::Approve => {
                self.require_erc721(&intent).await?;
                contract::approve_request(&intent, marketplace, signer)?
            }
            _ => {
                let abi = self
                    .backend
                    .marketplace_abi()
                    .await
                    .map_err(ActionError::backend)?;
                contract::marketplace_request(&abi, &intent, marketplace, signer)?
            }
        };

        let tx_hash = self.provider.send_transaction(&request).await?;
        info!(action = %intent.action, %tx_hash, "transaction sent");
        tracked.submitted()?;
        let explorer_url = self.network_config().await.explorer_tx_url(tx_hash);
        let control = tracked.control();
        control.alert(&format!("{} submitted! TX: {tx_hash}", intent.action.noun()));
        control.transaction_sent(tx_hash, explorer_url.as_deref());

        let receipt = self.provider.wait_for_receipt(tx_hash).await?;
        if !receipt.success {
            return Err(ActionError::ContractCall(format!(
                "transaction {tx_hash} reverted"
            )));
        }
        info!(
            action = %intent.action,
            %tx_hash,
            block = ?receipt.block_number,
            "transaction confirmed"
        );
        tracked.confirmed(None)?;
        control.alert(&format!("{} confirmed! TX: {tx_hash}", intent.action.noun()));

        Ok(ActionOutcome {
            action: intent.action,
            signer,
            tx_hash,
            receipt,
            explorer_url,
        })
    }

    async fn require_erc721(&self, intent: &ValidatedIntent) -> Result<(), ActionError> {
        let function = contract::supports_interface()?;
        let request = contract::supports_erc721_request(intent.nft_contract)?;
        let raw = self.provider.call(&request).await?;
        if !contract::decode_bool(&function, &raw)? {
            return Err(ActionError::NotErc721);
        }
        Ok(())
    }

    /// Connects the wallet, puts it on the target chain and opens a backend
    /// session for the first account.
    pub async fn connect_wallet<C>(&self, control: &C) -> Result<WalletSession, ActionError>
    where
        C: ControlPort + ?Sized,
    {
        let mut tracked = TrackedControl::new(control, ActionLabels::CONNECT);
        let result = self.connect_tracked(&mut tracked).await;
        if let Err(err) = &result {
            warn!(error = %err, "wallet connection failed");
            control.alert(&err.connect_message());
            tracked.fail();
        }
        result
    }

    async fn connect_tracked<C>(
        &self,
        tracked: &mut TrackedControl<'_, C>,
    ) -> Result<WalletSession, ActionError>
    where
        C: ControlPort + ?Sized,
    {
        tracked.start()?;
        if !self.provider.is_injected() {
            return Err(ActionError::MissingWallet);
        }

        self.provider.request_permissions().await?;
        self.ensure_network().await?;
        let address = self.signer().await?;

        let request = LoginRequest {
            wallet_address: address.to_string(),
            network: self.network_config().await.slug(),
        };
        let login = self
            .backend
            .login(&request)
            .await
            .map_err(ActionError::backend)?;
        info!(%address, network = %request.network, "wallet session opened");

        tracked.confirmed(Some(format!("Connected: {}", truncate_address(address))))?;
        Ok(WalletSession { address, login })
    }

    /// Closes the backend session and alerts the outcome.
    pub async fn disconnect_wallet<C>(&self, control: &C) -> Result<String, ActionError>
    where
        C: ControlPort + ?Sized,
    {
        match self.backend.logout().await {
            Ok(response) => {
                let message = response
                    .message
                    .unwrap_or_else(|| "Logged out successfully".to_owned());
                control.alert(&message);
                Ok(message)
            }
            Err(e) => {
                warn!(error = %e, "logout failed");
                control.alert("Logout failed. Please try again.");
                Err(ActionError::backend(e))
            }
        }
    }

    pub async fn listing_price(
        &self,
        nft_contract: Address,
        token_id: U256,
    ) -> Result<U256, ActionError> {
        self.ensure_network().await?;
        let (abi, marketplace) = self.marketplace().await?;
        self.read_price(&abi, marketplace, nft_contract, token_id)
            .await
    }

    /// Every listed NFT joined with its current price.
    pub async fn listed_nfts(&self) -> Result<Vec<Listing>, ActionError> {
        self.ensure_network().await?;
        let (abi, marketplace) = self.marketplace().await?;
        let (function, request) =
            contract::read_request(&abi, "getAllListedNFTs", marketplace, &[])?;
        let raw = self.provider.call(&request).await?;

        let mut listings = Vec::new();
        for (nft_contract, token_id) in contract::decode_listed(&function, &raw)? {
            let price_wei = self
                .read_price(&abi, marketplace, nft_contract, token_id)
                .await?;
            listings.push(Listing {
                nft_contract,
                token_id,
                price_wei,
            });
        }
        Ok(listings)
    }

    async fn read_price(
        &self,
        abi: &JsonAbi,
        marketplace: Address,
        nft_contract: Address,
        token_id: U256,
    ) -> Result<U256, ActionError> {
        let (function, request) = contract::read_request(
            abi,
            "getPrice",
            marketplace,
            &[
                DynSolValue::Address(nft_contract),
                DynSolValue::Uint(token_id, 256),
            ],
        )?;
        let raw = self.provider.call(&request).await?;
        Ok(contract::decode_uint(&function, &raw)?)
    }

    async fn marketplace(&self) -> Result<(JsonAbi, Address), ActionError> {
        let abi = self
            .backend
            .marketplace_abi()
            .await
            .map_err(ActionError::backend)?;
        let address = self
            .backend
            .marketplace_address()
            .await
            .map_err(ActionError::backend)?;
        Ok((abi, address))
    }
}

use alloy::primitives::utils::format_ether;
use alloy::primitives::{Address, U256};
use clap::{Parser, Subcommand};
use eyre::WrapErr;

use minty_wallet_adapters::{RuntimeProfile, WalletAdapterConfig};
use minty_wallet_core::{NetworkAssurance, TxIntent};

use crate::bridge::WalletBridge;
use crate::console::ConsoleControl;

#[derive(Parser, Debug)]
#[command(name = "minty-wallet", version, about = "Sign and track Minty marketplace transactions")]
pub struct Cli {
    /// Base URL of the marketplace backend serving `/api/*`
    #[arg(long, env = "MINTY_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// JSON-RPC endpoint standing in for the injected wallet
    #[arg(long, env = "MINTY_EIP1193_PROXY_URL")]
    pub proxy_url: Option<String>,

    #[arg(long, env = "MINTY_RUNTIME_PROFILE")]
    pub profile: Option<RuntimeProfile>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Connect the wallet, switch it to the marketplace network and log in
    Connect,
    /// Close the backend session
    Disconnect,
    /// Approve the marketplace to transfer an NFT
    Approve { nft_contract: String, token_id: String },
    /// List an NFT at a price in the native currency
    List {
        nft_contract: String,
        token_id: String,
        price: String,
    },
    Unlist { nft_contract: String, token_id: String },
    /// Accept a buyer's proposal for a listed NFT
    AcceptProposal {
        nft_contract: String,
        token_id: String,
        buyer: String,
    },
    /// Show every listed NFT with its price
    Listings,
    Price { nft_contract: Address, token_id: U256 },
    /// Show the target network and put the wallet on it
    Network,
}

impl Cli {
    pub fn adapter_config(&self) -> WalletAdapterConfig {
        let mut config = WalletAdapterConfig::from_env();
        if let Some(url) = &self.backend_url {
            config.backend_base_url = url.clone();
        }
        if let Some(url) = &self.proxy_url {
            config.eip1193_proxy_url = Some(url.clone());
        }
        if let Some(profile) = self.profile {
            config.runtime_profile = profile;
        }
        config
    }
}

pub async fn run(cli: Cli) -> eyre::Result<()> {
    let bridge =
        WalletBridge::with_config(cli.adapter_config()).wrap_err("failed to set up wallet")?;
    tracing::debug!(provider = bridge.provider_mode(), "wallet provider ready");
    let control = ConsoleControl;

    let intent = match cli.command {
        Command::Connect => {
            let session = bridge.connect(&control).await?;
            println!("{}", session.address);
            return Ok(());
        }
        Command::Disconnect => {
            bridge.disconnect(&control).await?;
            return Ok(());
        }
        Command::Listings => {
            let symbol = bridge.network().await.native_currency.symbol;
            for listing in bridge.listings().await? {
                println!(
                    "{}\t{}\t{} {symbol}",
                    listing.nft_contract,
                    listing.token_id,
                    format_ether(listing.price_wei)
                );
            }
            return Ok(());
        }
        Command::Price {
            nft_contract,
            token_id,
        } => {
            let price = bridge.listing_price(nft_contract, token_id).await?;
            let symbol = bridge.network().await.native_currency.symbol;
            println!("{} {symbol}", format_ether(price));
            return Ok(());
        }
        Command::Network => {
            let network = bridge.network().await;
            println!("{}", serde_json::to_string_pretty(&network)?);
            match bridge.ensure_network().await? {
                NetworkAssurance::AlreadyOnTarget => println!("wallet already on {}", network.chain_name),
                NetworkAssurance::SwitchRequested => println!("wallet switched to {}", network.chain_name),
            }
            return Ok(());
        }
        Command::Approve {
            nft_contract,
            token_id,
        } => TxIntent::approve(nft_contract, token_id),
        Command::List {
            nft_contract,
            token_id,
            price,
        } => TxIntent::list(nft_contract, token_id, price),
        Command::Unlist {
            nft_contract,
            token_id,
        } => TxIntent::unlist(nft_contract, token_id),
        Command::AcceptProposal {
            nft_contract,
            token_id,
            buyer,
        } => TxIntent::accept_proposal(nft_contract, token_id, buyer),
    };

    let outcome = bridge.submit(&intent, &control).await?;
    if let Some(url) = outcome.explorer_url {
        println!("{url}");
    }
    Ok(())
}

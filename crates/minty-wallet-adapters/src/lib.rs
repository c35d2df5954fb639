pub mod backend;
pub mod config;
pub mod eip1193;

pub use backend::BackendAdapter;
pub use config::{RuntimeProfile, WalletAdapterConfig};
pub use eip1193::Eip1193Adapter;

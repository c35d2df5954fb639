pub mod contract;
pub mod domain;
pub mod error;
pub mod orchestrator;
pub mod ports;
pub mod state_machine;

pub use domain::{
    parse_chain_id, truncate_address, ActionLabels, ActionOutcome, ActionParams, CallRequest,
    ControlView, Listing, LoginRequest, LoginResponse, LogoutResponse, MarketAction,
    NativeCurrency, NetworkAssurance, NetworkConfig, TxIntent, TxReceipt, ValidatedIntent,
    WalletSession, DEFAULT_CHAIN_ID,
};
pub use error::ActionError;
pub use orchestrator::Orchestrator;
pub use ports::{
    BackendPort, ControlPort, PortError, ProviderPort, UNRECOGNIZED_CHAIN_CODE,
    UNSUPPORTED_METHOD_CODE, USER_REJECTED_CODE,
};
pub use state_machine::{
    lifecycle_transition, LifecycleEvent, LifecycleStatus, StateTransition, TrackedControl,
};

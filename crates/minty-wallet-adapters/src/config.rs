use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeProfile {
    Development,
    Production,
}

impl FromStr for RuntimeProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Development),
            "prod" | "production" => Ok(Self::Production),
            other => Err(format!("unknown runtime profile: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WalletAdapterConfig {
    pub runtime_profile: RuntimeProfile,
    pub backend_base_url: String,
    /// JSON-RPC endpoint standing in for an injected wallet on native targets.
    pub eip1193_proxy_url: Option<String>,
    pub http_timeout_ms: u64,
    pub receipt_poll_interval_ms: u64,
}

impl Default for WalletAdapterConfig {
    fn default() -> Self {
        Self {
            runtime_profile: RuntimeProfile::Development,
            backend_base_url: "http://127.0.0.1:5000".to_owned(),
            eip1193_proxy_url: None,
            http_timeout_ms: 15_000,
            receipt_poll_interval_ms: 1_000,
        }
    }
}

impl WalletAdapterConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            runtime_profile: env_parsed("MINTY_RUNTIME_PROFILE")
                .unwrap_or(defaults.runtime_profile),
            backend_base_url: env_string("MINTY_BACKEND_URL").unwrap_or(defaults.backend_base_url),
            eip1193_proxy_url: env_string("MINTY_EIP1193_PROXY_URL"),
            http_timeout_ms: env_parsed("MINTY_HTTP_TIMEOUT_MS").unwrap_or(defaults.http_timeout_ms),
            receipt_poll_interval_ms: env_parsed("MINTY_RECEIPT_POLL_INTERVAL_MS")
                .unwrap_or(defaults.receipt_poll_interval_ms),
        }
    }

    /// Production never substitutes the deterministic wallet for a missing one.
    pub fn strict_runtime_required(&self) -> bool {
        self.runtime_profile == RuntimeProfile::Production
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn env_parsed<T: FromStr>(key: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    let raw = env_string(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, value = %raw, error = %e, "ignoring invalid config value");
            None
        }
    }
}

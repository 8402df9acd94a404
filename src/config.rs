use std::env;

pub const REGISTRY_CONTRACT_VAR: &str = "BANK_REGISTRY_CONTRACT";
pub const REGISTRY_CHANNEL_VAR: &str = "BANK_REGISTRY_CHANNEL";

/// Where the person registry contract lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractConfig {
    pub registry_contract: String,
    pub registry_channel: String,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            registry_contract: "personCC".to_string(),
            registry_channel: "mychannel".to_string(),
        }
    }
}

impl ContractConfig {
    /// Defaults, overridden by `BANK_REGISTRY_CONTRACT` and
    /// `BANK_REGISTRY_CHANNEL` when they are set and not blank.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let var = |name: &str, default: String| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };
        Self {
            registry_contract: var(REGISTRY_CONTRACT_VAR, defaults.registry_contract),
            registry_channel: var(REGISTRY_CHANNEL_VAR, defaults.registry_channel),
        }
    }
}

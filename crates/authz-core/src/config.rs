//! # Authorization Configuration
//!
//! Signing domain, cross-contract policy and verifier tuning.

use crate::domain::ecdsa::DEFAULT_PARALLEL_THRESHOLD;
use crate::domain::entities::Address;
use crate::domain::frost::{KeyPolicy, TranscriptVersion};
use crate::domain::hasher::DomainSeparator;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("invalid value for {var}: {reason}")]
    InvalidVar {
        /// Variable name
        var: &'static str,
        /// What was wrong with it
        reason: String,
    },

    /// The configuration is internally inconsistent.
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Authorization core configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationConfig {
    /// Domain every request must be signed under (modulo the allow-list).
    pub domain: DomainSeparator,

    /// Other verifying contracts whose signatures this deployment accepts.
    pub allowed_contracts: Vec<Address>,

    /// FROST group-key acceptance policy.
    pub frost_key_policy: KeyPolicy,

    /// FROST challenge transcript.
    pub frost_transcript: TranscriptVersion,

    /// Batch size from which ECDSA recovery runs in parallel.
    pub parallel_threshold: usize,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            domain: DomainSeparator::new("Authorization", "1", 1, [0u8; 20]),
            allowed_contracts: Vec::new(),
            frost_key_policy: KeyPolicy::RecoveryCompatible,
            frost_transcript: TranscriptVersion::V1,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl AuthorizationConfig {
    /// Create a config for testing.
    pub fn for_testing() -> Self {
        Self {
            domain: DomainSeparator::new("AuthzTest", "1", 31337, [0xC0; 20]),
            allowed_contracts: Vec::new(),
            frost_key_policy: KeyPolicy::RecoveryCompatible,
            frost_transcript: TranscriptVersion::V1,
            parallel_threshold: 4,
        }
    }

    /// Load from `AUTHZ_*` environment variables over the defaults.
    ///
    /// | Variable | Meaning |
    /// |----------|---------|
    /// | `AUTHZ_DOMAIN_NAME` | domain name |
    /// | `AUTHZ_DOMAIN_VERSION` | domain version |
    /// | `AUTHZ_CHAIN_ID` | chain id (decimal) |
    /// | `AUTHZ_VERIFYING_CONTRACT` | 20-byte hex address |
    /// | `AUTHZ_ALLOWED_CONTRACTS` | comma-separated hex addresses |
    /// | `AUTHZ_FROST_KEY_POLICY` | `recovery-compatible` or `direct` |
    /// | `AUTHZ_PARALLEL_THRESHOLD` | batch size (decimal) |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(name) = lookup("AUTHZ_DOMAIN_NAME") {
            config.domain.name = name;
        }
        if let Some(version) = lookup("AUTHZ_DOMAIN_VERSION") {
            config.domain.version = version;
        }
        if let Some(chain_id) = lookup("AUTHZ_CHAIN_ID") {
            config.domain.chain_id = parse_number("AUTHZ_CHAIN_ID", &chain_id)?;
        }
        if let Some(contract) = lookup("AUTHZ_VERIFYING_CONTRACT") {
            config.domain.verifying_contract =
                parse_address("AUTHZ_VERIFYING_CONTRACT", &contract)?;
        }
        if let Some(list) = lookup("AUTHZ_ALLOWED_CONTRACTS") {
            config.allowed_contracts = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| parse_address("AUTHZ_ALLOWED_CONTRACTS", s))
                .collect::<Result<_, _>>()?;
        }
        if let Some(policy) = lookup("AUTHZ_FROST_KEY_POLICY") {
            config.frost_key_policy = match policy.to_lowercase().as_str() {
                "recovery-compatible" => KeyPolicy::RecoveryCompatible,
                "direct" => KeyPolicy::Direct,
                other => {
                    return Err(ConfigError::InvalidVar {
                        var: "AUTHZ_FROST_KEY_POLICY",
                        reason: format!("unknown policy {other}"),
                    })
                }
            };
        }
        if let Some(threshold) = lookup("AUTHZ_PARALLEL_THRESHOLD") {
            config.parallel_threshold =
                parse_number::<usize>("AUTHZ_PARALLEL_THRESHOLD", &threshold)?;
        }

        Ok(config)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.domain.name.is_empty() {
            return Err(ConfigError::Invalid("domain name must not be empty"));
        }
        if self.domain.chain_id == 0 {
            return Err(ConfigError::Invalid("chain id must be non-zero"));
        }
        if self.domain.verifying_contract == [0u8; 20] {
            return Err(ConfigError::Invalid("verifying contract must be set"));
        }
        if self.allowed_contracts.contains(&[0u8; 20]) {
            return Err(ConfigError::Invalid("allow-list contains the zero address"));
        }
        if self.parallel_threshold == 0 {
            return Err(ConfigError::Invalid("parallel threshold must be positive"));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidVar {
        var,
        reason: e.to_string(),
    })
}

fn parse_address(var: &'static str, value: &str) -> Result<Address, ConfigError> {
    let trimmed = value.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(digits).map_err(|e| ConfigError::InvalidVar {
        var,
        reason: e.to_string(),
    })?;
    bytes.try_into().map_err(|_| ConfigError::InvalidVar {
        var,
        reason: "expected 20 bytes".to_string(),
    })
}

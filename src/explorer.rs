//! Verified-source lookup against block-explorer APIs.
//!
//! The network round-trip lives entirely here, before the engine runs:
//! validate the `chain:address` target, call the explorer's
//! `getsourcecode` endpoint once, and hand the raw `SourceCode` string to
//! the payload parser. The engine itself never sees a socket.

use thiserror::Error;
use tracing::{debug, info};

use solfuse_core::ErrorCode;

/// Supported chains and their explorer API endpoints.
const CHAIN_EXPLORERS: &[(&str, &str)] = &[
    ("eth", "https://api.etherscan.io/api"),
    ("polygon", "https://api.polygonscan.com/api"),
    ("bsc", "https://api.bscscan.com/api"),
    ("base", "https://api.basescan.org/api"),
    ("arbitrum", "https://api.arbiscan.io/api"),
    ("optimism", "https://api-optimistic.etherscan.io/api"),
    ("avalanche", "https://api.snowtrace.io/api"),
];

fn api_url(chain: &str) -> Option<&'static str> {
    CHAIN_EXPLORERS
        .iter()
        .find(|(name, _)| *name == chain)
        .map(|(_, url)| *url)
}

fn supported_chains() -> String {
    CHAIN_EXPLORERS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Errors
// ============================================================================

/// Failures before or during the explorer round-trip.
#[derive(Debug, Error)]
pub enum ExplorerError {
    /// Not a `0x` + 40 hex digit address.
    #[error("invalid contract address '{address}'")]
    InvalidAddress { address: String },

    /// Chain name without a known explorer endpoint.
    #[error("unsupported chain '{chain}' (supported: {supported})")]
    UnsupportedChain { chain: String, supported: String },

    /// Transport-level failure.
    #[error("{chain} explorer request failed: {message}")]
    Http { chain: String, message: String },

    /// The explorer answered but refused the lookup (unverified contract,
    /// rate limit, bad key).
    #[error("{chain} explorer API error: {message}")]
    Api { chain: String, message: String },
}

impl ExplorerError {
    /// The stable error code for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            ExplorerError::InvalidAddress { .. } => ErrorCode::InvalidInput,
            ExplorerError::UnsupportedChain { .. } => ErrorCode::InvalidInput,
            ExplorerError::Http { .. } => ErrorCode::IoError,
            ExplorerError::Api { .. } => ErrorCode::ResolutionError,
        }
    }
}

// ============================================================================
// Targets
// ============================================================================

/// A validated `chain:address` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerTarget {
    pub chain: String,
    pub address: String,
}

/// Parse and validate an explorer target token.
///
/// Accepts `0xADDRESS` (using `default_chain`) or `chain:0xADDRESS`.
pub fn parse_target(token: &str, default_chain: &str) -> Result<ExplorerTarget, ExplorerError> {
    let (chain, address) = match token.split_once(':') {
        Some((chain, address)) => (chain.trim().to_lowercase(), address.trim().to_lowercase()),
        None => (default_chain.trim().to_lowercase(), token.trim().to_lowercase()),
    };

    let hex = address.strip_prefix("0x").unwrap_or("");
    if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ExplorerError::InvalidAddress { address });
    }
    if api_url(&chain).is_none() {
        return Err(ExplorerError::UnsupportedChain {
            chain,
            supported: supported_chains(),
        });
    }
    Ok(ExplorerTarget { chain, address })
}

/// Whether a CLI source token looks like an explorer target rather than a
/// filesystem path.
pub fn looks_like_target(token: &str) -> bool {
    token.starts_with("0x") || token.split_once(':').is_some_and(|(chain, _)| api_url(&chain.to_lowercase()).is_some())
}

// ============================================================================
// Fetching
// ============================================================================

/// The fields of a `getsourcecode` result the flattener cares about.
#[derive(Debug, Clone)]
pub struct VerifiedContract {
    /// Contract name as published.
    pub name: String,
    /// The raw `SourceCode` string, shape undetermined.
    pub source: String,
    /// Declared license, if the explorer knows one.
    pub license: Option<String>,
}

/// Fetch the verified source of a contract. One request, no retries.
pub fn fetch_verified_source(
    target: &ExplorerTarget,
    api_key: Option<&str>,
) -> Result<VerifiedContract, ExplorerError> {
    let url = api_url(&target.chain).ok_or_else(|| ExplorerError::UnsupportedChain {
        chain: target.chain.clone(),
        supported: supported_chains(),
    })?;

    info!(chain = %target.chain, address = %target.address, "fetching verified source");
    let mut response = ureq::get(url)
        .query("module", "contract")
        .query("action", "getsourcecode")
        .query("address", &target.address)
        .query("apikey", api_key.unwrap_or(""))
        .call()
        .map_err(|err| ExplorerError::Http {
            chain: target.chain.clone(),
            message: err.to_string(),
        })?;

    let body: serde_json::Value =
        response
            .body_mut()
            .read_json()
            .map_err(|err| ExplorerError::Http {
                chain: target.chain.clone(),
                message: format!("unreadable response body: {err}"),
            })?;

    if body.get("status").and_then(|s| s.as_str()) != Some("1") {
        let message = body
            .get("result")
            .and_then(|r| r.as_str())
            .or_else(|| body.get("message").and_then(|m| m.as_str()))
            .unwrap_or("unknown explorer failure")
            .to_string();
        return Err(ExplorerError::Api {
            chain: target.chain.clone(),
            message,
        });
    }

    let result = body
        .get("result")
        .and_then(|r| r.as_array())
        .and_then(|entries| entries.first())
        .ok_or_else(|| ExplorerError::Api {
            chain: target.chain.clone(),
            message: "empty result set".to_string(),
        })?;

    let source = result
        .get("SourceCode")
        .and_then(|s| s.as_str())
        .unwrap_or("")
        .to_string();
    if source.is_empty() {
        return Err(ExplorerError::Api {
            chain: target.chain.clone(),
            message: "contract has no verified source".to_string(),
        });
    }

    let name = result
        .get("ContractName")
        .and_then(|n| n.as_str())
        .unwrap_or("Contract")
        .to_string();
    let license = result
        .get("LicenseType")
        .and_then(|l| l.as_str())
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.eq_ignore_ascii_case("none"))
        .map(String::from);

    debug!(contract = %name, license = ?license, "verified source received");
    Ok(VerifiedContract {
        name,
        source,
        license,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0x1234567890123456789012345678901234567890";

    mod target_parsing {
        use super::*;

        #[test]
        fn bare_address_uses_default_chain() {
            let target = parse_target(ADDR, "eth").unwrap();
            assert_eq!(target.chain, "eth");
            assert_eq!(target.address, ADDR);
        }

        #[test]
        fn chain_prefix_overrides_default() {
            let target = parse_target(&format!("bsc:{ADDR}"), "eth").unwrap();
            assert_eq!(target.chain, "bsc");
        }

        #[test]
        fn chain_and_address_are_lowercased() {
            let target = parse_target(&format!("ETH:{}", ADDR.to_uppercase()), "eth").unwrap();
            assert_eq!(target.chain, "eth");
            assert_eq!(target.address, ADDR);
        }

        #[test]
        fn short_address_is_rejected() {
            let err = parse_target("eth:0x1234", "eth").unwrap_err();
            assert!(matches!(err, ExplorerError::InvalidAddress { .. }));
            assert_eq!(err.error_code().code(), 2);
        }

        #[test]
        fn non_hex_address_is_rejected() {
            let err = parse_target(&format!("0x{}", "zz".repeat(20)), "eth").unwrap_err();
            assert!(matches!(err, ExplorerError::InvalidAddress { .. }));
        }

        #[test]
        fn unknown_chain_is_rejected() {
            let err = parse_target(&format!("doge:{ADDR}"), "eth").unwrap_err();
            match err {
                ExplorerError::UnsupportedChain { supported, .. } => {
                    assert!(supported.contains("eth"));
                    assert!(supported.contains("avalanche"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    mod token_classification {
        use super::*;

        #[test]
        fn addresses_look_like_targets() {
            assert!(looks_like_target(ADDR));
            assert!(looks_like_target(&format!("polygon:{ADDR}")));
        }

        #[test]
        fn paths_do_not() {
            assert!(!looks_like_target("contracts/Main.sol"));
            assert!(!looks_like_target("./src"));
            assert!(!looks_like_target("C:/Users/dev/Main.sol"));
        }
    }
}

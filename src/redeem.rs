//! Coupon redemption orchestration.
//!
//! The browser-driven redemption portal is an external collaborator; this
//! module owns only its interface and the server/account iteration around
//! it. Per-account failures are logged and never stop the run.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::log;

/// External coupon portal. `submit` drives the third-party web form for
/// one account and returns its confirmation text.
pub trait CouponPortal {
    fn submit(&self, server_name: &str, account_id: &str, code: &str) -> Result<String>;
}

/// One game server and the account ids registered on it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Display name the portal's server dropdown uses, e.g. "Conquest (US)"
    pub server_name: String,
    pub ids: Vec<String>,
}

/// All servers keyed by short code (US, TW, ...). A BTreeMap keeps
/// iteration order deterministic across runs.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RedemptionConfig {
    pub servers: BTreeMap<String, ServerConfig>,
}

/// Counts reported after a redemption run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RedemptionSummary {
    pub submitted: usize,
    pub failed: usize,
}

/// Submits one coupon code for every configured account.
///
/// `server_filter` limits the run to the named server codes; unknown
/// codes and servers without accounts are skipped with a logged notice.
pub fn run_redemption(
    portal: &dyn CouponPortal,
    config: &RedemptionConfig,
    code: &str,
    server_filter: Option<&[String]>,
) -> RedemptionSummary {
    let codes: Vec<&String> = match server_filter {
        Some(filter) => filter.iter().collect(),
        None => config.servers.keys().collect(),
    };

    let mut summary = RedemptionSummary::default();

    for server_code in codes {
        let Some(server) = config.servers.get(server_code) else {
            log(&format!("Server {} not found. Skipping.", server_code));
            continue;
        };
        if server.ids.is_empty() {
            log(&format!("No IDs configured for {}. Skipping.", server_code));
            continue;
        }

        log(&format!("Redeeming on {} server", server_code));

        for account_id in &server.ids {
            match portal.submit(&server.server_name, account_id, code) {
                Ok(confirmation) => {
                    log(&format!("{}: {} - {}", account_id, confirmation, code));
                    summary.submitted += 1;
                }
                Err(e) => {
                    log(&format!("Error redeeming for {}: {}", account_id, e));
                    summary.failed += 1;
                }
            }
        }
    }

    summary
}

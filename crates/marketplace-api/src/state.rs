//! Application state

use marketplace_auth::{AuthGate, TokenBlacklist, TokenIssuer};
use marketplace_db::Repository;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Handle used to render the Prometheus scrape output
pub type MetricsHandle = PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub tokens: Arc<TokenIssuer>,
    pub blacklist: TokenBlacklist,
    pub gate: AuthGate,
    /// Whether `DELETE /seller/clear` may wipe the store
    pub allow_clear: bool,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repository>, tokens: Arc<TokenIssuer>, allow_clear: bool) -> Self {
        let blacklist = TokenBlacklist::new(repo.clone());
        let gate = AuthGate::new(tokens.clone(), blacklist.clone(), repo.clone());
        Self {
            repo,
            tokens,
            blacklist,
            gate,
            allow_clear,
        }
    }
}

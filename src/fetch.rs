//! Remote rule files referenced by a model's external-rules annotation.
//!
//! Each URL is fetched with its own timeout. Every failure is captured as
//! the source's error string so the remaining URLs are still fetched.

use crate::models::rule::rules_from_json;
use crate::models::source::RuleSource;
use serde_json::Value as Json;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    /// Accept invalid TLS certificates (hosts with local trust-store gaps).
    pub insecure_tls: bool,
    pub user_agent: String,
}

/// Fetch a JSON array of rules from `url`.
pub fn fetch_rules_from_url(url: &str, opts: &FetchOptions) -> RuleSource {
    let mut source = RuleSource::new(format!("URL: {}", url));
    match fetch_json(url, opts) {
        Ok(data) => match rules_from_json(&data) {
            Ok(rules) => {
                debug!(url, count = rules.len(), "fetched rules");
                source.rules = rules;
            }
            Err(_) => source.error = Some("Response is not a JSON array".to_string()),
        },
        Err(e) => {
            warn!(url, error = %e, "rule fetch failed");
            source.error = Some(e);
        }
    }
    source
}

fn fetch_json(url: &str, opts: &FetchOptions) -> Result<Json, String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(opts.timeout)
        .danger_accept_invalid_certs(opts.insecure_tls)
        .build()
        .map_err(|e| e.to_string())?;
    let response = client
        .get(url)
        .header("User-Agent", &opts.user_agent)
        .send()
        .map_err(|e| {
            if e.is_timeout() {
                format!("Timed out after {}s", opts.timeout.as_secs())
            } else {
                format!("URL error: {}", e)
            }
        })?;
    let status = response.status();
    if !status.is_success() {
        return Err(format!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        ));
    }
    let body = response.text().map_err(|e| e.to_string())?;
    serde_json::from_str(&body).map_err(|e| format!("Invalid JSON: {}", e))
}

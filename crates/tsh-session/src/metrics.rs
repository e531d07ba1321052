//! Session boundary counters, exported through the daemon's /metrics endpoint.
//!
//! `legacy_token_reads` tracks the migration: it falls to zero once every live
//! session has been rewritten in encrypted form.

use prometheus_client::metrics::counter::Counter;
use prometheus_client::registry::Registry;

#[derive(Debug, Clone, Default)]
pub struct SessionMetrics {
    pub legacy_token_reads: Counter,
    pub token_decrypt_failures: Counter,
    pub token_encrypt_failures: Counter,
    pub session_refreshes: Counter,
    pub session_refresh_failures: Counter,
}

impl SessionMetrics {
    pub fn register(&self, registry: &mut Registry) {
        registry.register(
            "tsh_legacy_token_reads",
            "Cookie reads that returned an unencrypted legacy token",
            self.legacy_token_reads.clone(),
        );
        registry.register(
            "tsh_token_decrypt_failures",
            "Stored envelopes that failed to decrypt",
            self.token_decrypt_failures.clone(),
        );
        registry.register(
            "tsh_token_encrypt_failures",
            "Token encryptions that failed; the request was rejected",
            self.token_encrypt_failures.clone(),
        );
        registry.register(
            "tsh_session_refreshes",
            "Successful token pair refreshes",
            self.session_refreshes.clone(),
        );
        registry.register(
            "tsh_session_refresh_failures",
            "Refresh attempts that ended the session",
            self.session_refresh_failures.clone(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus_client::encoding::text::encode;

    #[test]
    fn test_registered_counters_are_encoded() {
        let metrics = SessionMetrics::default();
        let mut registry = Registry::default();
        metrics.register(&mut registry);

        metrics.legacy_token_reads.inc();
        metrics.legacy_token_reads.inc();

        let mut body = String::new();
        encode(&mut body, &registry).unwrap();
        assert!(body.contains("tsh_legacy_token_reads_total 2"));
        assert!(body.contains("tsh_session_refresh_failures_total 0"));
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = SessionMetrics::default();
        let clone = metrics.clone();
        clone.session_refreshes.inc();
        assert_eq!(metrics.session_refreshes.get(), 1);
    }
}

//! Errors surfaced by the session core.
//!
//! Almost everything in this crate degrades to "no observable effect"
//! instead of erroring: malformed frames are logged and dropped, sends on
//! closed transports are no-ops, and logical guard violations are skipped.
//! The only errors callers ever see are connect-time failures.

/// Errors from establishing signaling connections. Bad environment
/// values never get here; configuration falls back to defaults instead.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("websocket connect to {url} failed: {source}")]
    Connect {
        url: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_error_names_the_endpoint() {
        let err = SignalError::Connect {
            url: "wss://example:1/ws/t1/alice/i1".to_string(),
            source: tokio_tungstenite::tungstenite::Error::ConnectionClosed,
        };
        assert!(err.to_string().contains("wss://example:1/ws/t1/alice/i1"));
    }
}

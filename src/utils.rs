//! Utility functions for ids, error messages and logging

use bech32::Bech32m;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid7::uuid7;

// construct a unique id then encode using bech32
pub fn new_uuid_to_bech32(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}

/// Removes one leading occurrence of `prefix`, the convention the server uses
/// to mark its error messages.
pub fn strip_error_prefix<'a>(message: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return message;
    }
    message.strip_prefix(prefix).unwrap_or(message)
}

/// Initialize tracing with the SALES_DESK_LOG environment variable.
///
/// Defaults to "info" level if SALES_DESK_LOG is not set. Calling it more
/// than once is harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("SALES_DESK_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

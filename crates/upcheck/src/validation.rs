//! Validation for externally supplied probe targets and options.

use anyhow::Result;
use url::Url;

const MAX_TIMEOUT_MS: u64 = 300_000; // 5 minutes
const MIN_TIMEOUT_MS: u64 = 100;
const MAX_HEADERS: usize = 20;
const MAX_HEADER_SIZE: usize = 8192;

/// Validate a tracked URL registration
pub fn validate_tracked(tracked: &crate::types::TrackedUrl) -> Result<()> {
    validate_target(&tracked.url)?;

    if let Some(timeout_ms) = tracked.timeout_ms {
        validate_timeout(timeout_ms)?;
    }

    if let Some(headers) = &tracked.headers {
        validate_headers(headers)?;
    }

    Ok(())
}

/// Validate URL format and scheme
pub fn validate_target(url: &str) -> Result<()> {
    let parsed = Url::parse(url)?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(anyhow::anyhow!("Unsupported URL scheme: {}", parsed.scheme())),
    }
}

/// Validate a timeout override value
pub fn validate_timeout(timeout_ms: u64) -> Result<()> {
    if timeout_ms < MIN_TIMEOUT_MS {
        return Err(anyhow::anyhow!(
            "Timeout too small: {} ms (min: {} ms)",
            timeout_ms,
            MIN_TIMEOUT_MS
        ));
    }

    if timeout_ms > MAX_TIMEOUT_MS {
        return Err(anyhow::anyhow!(
            "Timeout too large: {} ms (max: {} ms)",
            timeout_ms,
            MAX_TIMEOUT_MS
        ));
    }

    Ok(())
}

/// Validate extra probe headers
pub fn validate_headers(headers: &[(String, String)]) -> Result<()> {
    if headers.len() > MAX_HEADERS {
        return Err(anyhow::anyhow!(
            "Too many headers: {} (max: {})",
            headers.len(),
            MAX_HEADERS
        ));
    }

    for (key, value) in headers {
        if key.len() + value.len() > MAX_HEADER_SIZE {
            return Err(anyhow::anyhow!(
                "Header too large: {} bytes (max: {} bytes)",
                key.len() + value.len(),
                MAX_HEADER_SIZE
            ));
        }
    }

    Ok(())
}

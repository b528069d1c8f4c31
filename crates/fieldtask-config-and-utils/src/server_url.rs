//! Server url normalization.

use crate::{CoreError, CoreResult};
use url::Url;

/// Normalize a server url as entered by the user.
///
/// A missing scheme defaults to `https`. Only http(s) urls with a host are
/// accepted. The trailing slash is dropped so the same server is always
/// registered under the same string.
pub fn normalize_server_url(raw: &str) -> CoreResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Config("server url must not be blank".into()));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&with_scheme)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(CoreError::Config(format!(
            "unsupported server url scheme: {}",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(CoreError::Config(format!("server url has no host: {}", raw)));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

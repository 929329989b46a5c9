//! URL helpers for talking to the local daemon.
//!
//! The daemon address can come from config, a CLI flag, or the built-in
//! default, with or without a scheme or trailing slash. Everything funnels
//! through here so endpoint construction never produces double slashes or
//! scheme-less URLs.

/// Normalize a daemon address into a usable base URL.
///
/// Adds an `http://` scheme when none is present (the daemon is plain HTTP
/// on localhost) and strips trailing slashes.
///
/// # Examples
///
/// ```
/// use ocular::utils::url::normalize_host;
///
/// assert_eq!(normalize_host("localhost:11434"), "http://localhost:11434");
/// assert_eq!(normalize_host("http://localhost:11434/"), "http://localhost:11434");
/// ```
pub fn normalize_host(host: &str) -> String {
    let trimmed = host.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

/// Construct a daemon endpoint URL from a base URL and an endpoint path.
///
/// # Examples
///
/// ```
/// use ocular::utils::url::endpoint_url;
///
/// assert_eq!(
///     endpoint_url("http://localhost:11434", "api/tags"),
///     "http://localhost:11434/api/tags"
/// );
/// ```
pub fn endpoint_url(base_url: &str, endpoint: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let endpoint = endpoint.trim_start_matches('/');
    format!("{base}/{endpoint}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_host_adds_scheme() {
        assert_eq!(normalize_host("localhost:11434"), "http://localhost:11434");
        assert_eq!(
            normalize_host("192.168.1.20:11434"),
            "http://192.168.1.20:11434"
        );
    }

    #[test]
    fn normalize_host_keeps_existing_scheme() {
        assert_eq!(
            normalize_host("http://localhost:11434"),
            "http://localhost:11434"
        );
        assert_eq!(
            normalize_host("https://ollama.lan:11434"),
            "https://ollama.lan:11434"
        );
    }

    #[test]
    fn normalize_host_strips_trailing_slashes() {
        assert_eq!(
            normalize_host("http://localhost:11434///"),
            "http://localhost:11434"
        );
        assert_eq!(normalize_host("localhost:11434/"), "http://localhost:11434");
    }

    #[test]
    fn endpoint_url_joins_without_double_slashes() {
        assert_eq!(
            endpoint_url("http://localhost:11434", "api/tags"),
            "http://localhost:11434/api/tags"
        );
        assert_eq!(
            endpoint_url("http://localhost:11434/", "/api/chat"),
            "http://localhost:11434/api/chat"
        );
    }
}

//! Model directory client.
//!
//! Retrieves the list of installed models from the daemon's tags endpoint.
//! The listing is read-only and superseded wholesale on each refresh; order
//! is whatever the daemon returns.

use std::time::Duration;

use tracing::debug;

use crate::api::{ApiError, ModelEntry, TagsResponse};
use crate::utils::url::endpoint_url;

/// How long the startup reachability probe waits before declaring the
/// daemon offline.
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Fetch the installed models from `GET {base}/api/tags`.
///
/// A daemon with zero installed models yields an empty list, not an error.
pub async fn fetch_models(
    client: &reqwest::Client,
    base_url: &str,
    timeout: Duration,
) -> Result<Vec<ModelEntry>, ApiError> {
    let url = endpoint_url(base_url, "api/tags");
    debug!(%url, "fetching model directory");

    let response = client
        .get(&url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| ApiError::from_transport(e, timeout.as_secs()))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::from_status(status, &body));
    }

    let tags = response
        .json::<TagsResponse>()
        .await
        .map_err(|e| ApiError::Protocol {
            reason: e.to_string(),
        })?;

    debug!(count = tags.models.len(), "model directory loaded");
    Ok(tags.models)
}

/// Check whether the daemon is reachable at all.
///
/// Used at startup so a stopped daemon surfaces as a status warning instead
/// of a failed first request.
pub async fn probe_daemon(client: &reqwest::Client, base_url: &str) -> bool {
    let url = endpoint_url(base_url, "api/tags");
    match client.get(&url).timeout(PROBE_TIMEOUT).send().await {
        Ok(response) => response.status().is_success(),
        Err(e) => {
            debug!(%url, error = %e, "daemon probe failed");
            false
        }
    }
}

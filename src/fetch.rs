use crate::error::{Result, VpaidError};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Timeout for remote ad parameter requests
const FETCH_TIMEOUT: Duration = Duration::from_secs(3);

/// Load an `AdParameters` payload from a file path, `file://` URL or web URL
pub async fn fetch_ad_parameters(url_or_path: &str) -> Result<String> {
    if let Some(path) = url_or_path.strip_prefix("file://") {
        #[cfg(target_os = "windows")]
        let path = path.trim_start_matches('/');

        let file_path = resolve_local(path);
        log::info!("Reading ad parameters from file: {}", file_path.display());
        return Ok(tokio::fs::read_to_string(file_path).await?);
    }

    if Path::new(url_or_path).exists() {
        log::info!("Reading ad parameters from local file: {}", url_or_path);
        return Ok(tokio::fs::read_to_string(url_or_path).await?);
    }

    fetch_from_url(url_or_path).await
}

/// Try the path as given, then under `samples/`
fn resolve_local(path: &str) -> PathBuf {
    let path_buf = PathBuf::from(path);
    if path_buf.exists() {
        return path_buf;
    }
    let samples_path = PathBuf::from("samples").join(path);
    if samples_path.exists() {
        samples_path
    } else {
        path_buf
    }
}

async fn fetch_from_url(url: &str) -> Result<String> {
    // Random request ID for tracking in logs
    let req_id: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();

    let url = url::Url::parse(url)?;
    log::info!("[{}] Fetching ad parameters from URL: {}", req_id, url);

    let start_time = Instant::now();

    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(|e| VpaidError::Fetch(format!("Failed to build HTTP client: {}", e)))?;

    let response = client.get(url).send().await.map_err(|e| {
        log::warn!("[{}] Request failed after {:?}", req_id, start_time.elapsed());
        VpaidError::Fetch(format!("Failed to fetch URL: {}", e))
    })?;

    log::debug!("[{}] Received response in {:?}", req_id, start_time.elapsed());

    if !response.status().is_success() {
        return Err(VpaidError::Fetch(format!(
            "Failed to fetch URL: HTTP status {}",
            response.status()
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| VpaidError::Fetch(format!("Failed to read response body: {}", e)))?;

    log::info!("[{}] Total request completed in {:?}", req_id, start_time.elapsed());

    Ok(body)
}

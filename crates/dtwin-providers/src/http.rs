//! Shared HTTP helpers for provider clients.

use std::path::Path;

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::error::{ProviderError, ProviderResult};

const MAX_ERROR_BODY: usize = 512;

/// Map a non-success response into a classified `ProviderError`.
pub(crate) async fn check_response(
    resp: reqwest::Response,
    provider: &str,
) -> ProviderResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let retry_after_ms = resp
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .map(|secs| secs * 1000);

    let mut body = resp.text().await.unwrap_or_default();
    body.truncate(MAX_ERROR_BODY);

    Err(ProviderError::from_http_status(
        status.as_u16(),
        format!("{}: {}", provider, body),
        retry_after_ms,
    ))
}

/// Stream a response body to a local file chunk by chunk.
pub(crate) async fn stream_to_file(resp: reqwest::Response, path: &Path) -> ProviderResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut file = tokio::fs::File::create(path).await?;
    let mut stream = resp.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
    }

    file.flush().await?;
    Ok(())
}

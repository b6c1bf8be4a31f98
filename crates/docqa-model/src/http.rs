//! Shared blocking HTTP plumbing for remote providers.

use crate::error::{ModelError, ModelResult};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Build a blocking client with a whole-request timeout.
pub(crate) fn build_client(provider: &str, timeout_secs: u64) -> ModelResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
        .map_err(|e| ModelError::provider_not_available(provider, e.to_string()))
}

/// Decode a JSON body, turning non-2xx statuses into `Err(message)`.
pub(crate) fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, String> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        let snippet: String = body.chars().take(200).collect();
        return Err(format!("status={} body={}", status, snippet));
    }
    response.json::<T>().map_err(|e| e.to_string())
}

/// Join a base URL and a path without doubling slashes.
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_join() {
        assert_eq!(
            endpoint("http://127.0.0.1:11434/", "/api/generate"),
            "http://127.0.0.1:11434/api/generate"
        );
        assert_eq!(
            endpoint("https://api.openai.com", "v1/embeddings"),
            "https://api.openai.com/v1/embeddings"
        );
    }
}

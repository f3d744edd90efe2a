//! HTTP synthesis client.
//!
//! The production [`SynthesisPort`] implementation: one `POST` with a JSON
//! `{ "text": … }` body, answered by a binary audio payload. Any transport
//! error or non-success status is a single generic synthesis failure; there
//! is no retry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use url::Url;

use voicesync_core::{
    DEFAULT_AUDIO_CONTENT_TYPE, PlaybackError, Settings, SynthesisPort, SynthesizedAudio,
};

/// Maximum number of bytes of an error body echoed into the error message.
const ERROR_BODY_PREVIEW: usize = 200;

/// JSON request body.
#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
}

/// Synthesis client backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpSynthesisClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpSynthesisClient {
    /// Create a client for `endpoint` with the given request timeout.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, PlaybackError> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            PlaybackError::InvalidSettings(format!("invalid synthesis URL '{endpoint}': {e}"))
        })?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PlaybackError::SynthesisRequestFailed {
                status: None,
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self { client, endpoint })
    }

    /// Create a client from the effective settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, PlaybackError> {
        Self::new(
            settings.effective_synthesis_url(),
            settings.effective_request_timeout(),
        )
    }

    /// The endpoint this client posts to.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl SynthesisPort for HttpSynthesisClient {
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio, PlaybackError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            text_len = text.len(),
            "Sending synthesis request"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(ACCEPT, "audio/*")
            .json(&SynthesisRequest { text })
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), &body));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or_else(|| DEFAULT_AUDIO_CONTENT_TYPE.to_string(), str::to_string);

        let data = response.bytes().await.map_err(|e| transport_error(&e))?;
        if data.is_empty() {
            return Err(PlaybackError::SynthesisRequestFailed {
                status: Some(status.as_u16()),
                message: "synthesis returned an empty audio payload".to_string(),
            });
        }

        tracing::debug!(bytes = data.len(), content_type = %content_type, "Synthesis succeeded");
        Ok(SynthesizedAudio { data, content_type })
    }
}

/// Map a reqwest transport failure.
fn transport_error(e: &reqwest::Error) -> PlaybackError {
    let message = if e.is_timeout() {
        "synthesis request timed out".to_string()
    } else if e.is_connect() {
        format!("could not connect to synthesis service: {e}")
    } else {
        e.to_string()
    };
    PlaybackError::SynthesisRequestFailed {
        status: e.status().map(|s| s.as_u16()),
        message,
    }
}

/// Map a non-success response, keeping a short preview of the body.
fn status_error(status: u16, body: &str) -> PlaybackError {
    let body = body.trim();
    let message = if body.is_empty() {
        "synthesis service returned an error".to_string()
    } else {
        body.chars().take(ERROR_BODY_PREVIEW).collect()
    };
    PlaybackError::SynthesisRequestFailed {
        status: Some(status),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_endpoint() {
        let err = HttpSynthesisClient::new("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, PlaybackError::InvalidSettings(_)));
    }

    #[test]
    fn from_settings_uses_default_endpoint() {
        let client = HttpSynthesisClient::from_settings(&Settings::with_defaults()).unwrap();
        assert_eq!(client.endpoint().as_str(), "http://localhost:8000/tts");
    }

    #[test]
    fn status_error_keeps_body_preview() {
        let err = status_error(500, "  {\"detail\":\"model exploded\"} ");
        assert_eq!(
            err,
            PlaybackError::SynthesisRequestFailed {
                status: Some(500),
                message: "{\"detail\":\"model exploded\"}".to_string(),
            }
        );
    }

    #[test]
    fn status_error_truncates_long_bodies() {
        let body = "x".repeat(1000);
        let PlaybackError::SynthesisRequestFailed { message, .. } = status_error(502, &body) else {
            panic!("expected synthesis failure");
        };
        assert_eq!(message.len(), ERROR_BODY_PREVIEW);
    }

    #[test]
    fn status_error_without_body() {
        let PlaybackError::SynthesisRequestFailed { status, message } = status_error(404, "")
        else {
            panic!("expected synthesis failure");
        };
        assert_eq!(status, Some(404));
        assert_eq!(message, "synthesis service returned an error");
    }
}

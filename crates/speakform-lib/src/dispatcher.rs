//! Request dispatcher — one POST per payload, no retries.

use std::time::Duration;

use reqwest::{StatusCode, Url};
use tracing::{debug, warn};

use speakform_core::error::{ConfigError, SubmissionError};
use speakform_core::types::{ClientConfig, ProcessTextRequest, ProcessTextResponse};

/// Posts payloads to the text processing endpoint.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: reqwest::Client,
    endpoint: Url,
    timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| ConfigError::InvalidEndpoint {
            endpoint: config.endpoint.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEndpoint {
                endpoint: config.endpoint.clone(),
                reason: format!("unsupported scheme {:?}", endpoint.scheme()),
            });
        }

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            timeout: config.timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Send `payload` and return the audio URL.
    ///
    /// Only a 200 counts as success. A relative `audioUrl` is resolved
    /// against the endpoint.
    pub async fn submit(&self, payload: &str) -> Result<String, SubmissionError> {
        let mut req = self
            .client
            .post(self.endpoint.clone())
            .json(&ProcessTextRequest { text: payload });
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        debug!("POST {} ({} chars)", self.endpoint, payload.chars().count());
        let resp = req.send().await.map_err(transport_error)?;

        let status = resp.status();
        if status != StatusCode::OK {
            warn!("{} answered {status}", self.endpoint);
            return Err(SubmissionError::ServerRejected {
                status: status.as_u16(),
            });
        }

        let body: ProcessTextResponse = resp.json().await.map_err(transport_error)?;
        if let Some(logs) = body.logs.as_deref().filter(|l| !l.trim().is_empty()) {
            debug!("backend logs:\n{logs}");
        }

        self.absolute_audio_url(&body.audio_url)
    }

    fn absolute_audio_url(&self, audio_url: &str) -> Result<String, SubmissionError> {
        if audio_url.trim().is_empty() {
            return Err(SubmissionError::Transport(
                "response contained an empty audioUrl".into(),
            ));
        }
        self.endpoint
            .join(audio_url)
            .map(String::from)
            .map_err(|e| SubmissionError::Transport(format!("bad audioUrl {audio_url:?}: {e}")))
    }
}

fn transport_error(e: reqwest::Error) -> SubmissionError {
    if e.is_timeout() {
        SubmissionError::Transport(format!("request timed out: {e}"))
    } else if e.is_decode() {
        SubmissionError::Transport(format!("malformed response: {e}"))
    } else {
        SubmissionError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn dispatcher(server: &MockServer) -> Dispatcher {
        Dispatcher::new(&ClientConfig {
            endpoint: format!("{}/process-text", server.uri()),
            timeout: Some(Duration::from_secs(5)),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn rejects_bad_endpoints() {
        for endpoint in ["not a url", "ftp://host/process-text"] {
            let config = ClientConfig {
                endpoint: endpoint.into(),
                ..Default::default()
            };
            assert!(matches!(
                Dispatcher::new(&config),
                Err(ConfigError::InvalidEndpoint { .. })
            ));
        }
    }

    #[tokio::test]
    async fn posts_text_and_returns_audio_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/process-text"))
            .and(body_json(json!({ "text": "Hello world" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "audioUrl": "http://x/a.mp3",
                "logs": "2024-01-01 - INFO - done"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let url = dispatcher(&server).submit("Hello world").await.unwrap();
        assert_eq!(url, "http://x/a.mp3");
    }

    #[tokio::test]
    async fn relative_audio_url_is_resolved() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "audioUrl": "/output/final.mp3" })),
            )
            .mount(&server)
            .await;

        let url = dispatcher(&server).submit("Hi").await.unwrap();
        assert_eq!(url, format!("{}/output/final.mp3", server.uri()));
    }

    #[tokio::test]
    async fn non_200_success_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({ "audioUrl": "http://x/a.mp3" })),
            )
            .mount(&server)
            .await;

        let err = dispatcher(&server).submit("Hi").await.unwrap_err();
        assert_eq!(err, SubmissionError::ServerRejected { status: 201 });
    }

    #[tokio::test]
    async fn server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "message": "No valid dialogue structure found in input text.",
                "logs": ""
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = dispatcher(&server).submit("Hi").await.unwrap_err();
        assert_eq!(err, SubmissionError::ServerRejected { status: 500 });
    }

    #[tokio::test]
    async fn malformed_body_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = dispatcher(&server).submit("Hi").await.unwrap_err();
        assert!(matches!(err, SubmissionError::Transport(_)), "{err:?}");
    }

    #[tokio::test]
    async fn empty_audio_url_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "audioUrl": "" })))
            .mount(&server)
            .await;

        let err = dispatcher(&server).submit("Hi").await.unwrap_err();
        assert!(matches!(err, SubmissionError::Transport(_)), "{err:?}");
    }

    #[tokio::test]
    async fn timeout_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "audioUrl": "http://x/a.mp3" }))
                    .set_delay(Duration::from_secs(2)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = Dispatcher::new(&ClientConfig {
            endpoint: server.uri(),
            timeout: Some(Duration::from_millis(100)),
            ..Default::default()
        })
        .unwrap();

        match dispatcher.submit("Hi").await.unwrap_err() {
            SubmissionError::Transport(msg) => assert!(msg.contains("timed out"), "{msg}"),
            other => panic!("expected Transport, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connection_refused_is_transport_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let dispatcher = Dispatcher::new(&ClientConfig {
            endpoint: format!("http://{addr}/process-text"),
            ..Default::default()
        })
        .unwrap();

        assert!(matches!(
            dispatcher.submit("Hi").await,
            Err(SubmissionError::Transport(_))
        ));
    }
}

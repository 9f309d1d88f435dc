use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::{debug, error, info};

use super::{encoder::EncodedBody, error::AnalysisError};

/// Transport boundary to the external analysis endpoint.
#[async_trait]
pub trait AnalysisWebhook: Send + Sync {
    /// Posts `body` and returns the raw response text of a 2xx reply.
    /// A missing endpoint is reported before any network attempt.
    async fn submit(&self, endpoint: Option<&str>, body: EncodedBody) -> Result<String, AnalysisError>;
}

#[derive(Clone)]
pub struct HttpWebhookClient {
    client: Client,
}

impl HttpWebhookClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("build webhook http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl AnalysisWebhook for HttpWebhookClient {
    async fn submit(&self, endpoint: Option<&str>, body: EncodedBody) -> Result<String, AnalysisError> {
        let endpoint = endpoint
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or(AnalysisError::Configuration)?;

        let encoding = body.encoding();
        let content_type = body.content_type_hint();
        let request = match body {
            EncodedBody::Multipart(form) => self.client.post(endpoint).multipart(form),
            EncodedBody::Json(raw) => self
                .client
                .post(endpoint)
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::ACCEPT, "application/json")
                .body(raw),
        };

        info!(%endpoint, %encoding, content_type, "submitting image to analysis webhook");
        let response = request.send().await.map_err(|e| {
            error!(error = %e, %endpoint, "webhook request failed");
            AnalysisError::Transport(e.to_string())
        })?;

        let status = response.status();
        let text = response.text().await;
        debug!(status = status.as_u16(), "webhook responded");

        if !status.is_success() {
            let body = text.unwrap_or_default();
            error!(status = status.as_u16(), body_len = body.len(), "webhook returned error status");
            return Err(AnalysisError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        text.map_err(|e| AnalysisError::Transport(format!("reading response body: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::encoder::{encode_json, encode_multipart, AnalysisFields},
        images::upload::UploadedImage,
        test_support::{closed_port_url, spawn_server},
    };
    use axum::{
        extract::Multipart,
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use bytes::Bytes;
    use serde_json::{json, Value};
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn image() -> UploadedImage {
        UploadedImage::new(Bytes::from_static(b"\xff\xd8\xff\xe0jpeg"), "image/jpeg", Some("lunch.jpg"))
            .unwrap()
    }

    async fn echo_multipart(mut mp: Multipart) -> Json<Value> {
        let mut out = serde_json::Map::new();
        while let Some(field) = mp.next_field().await.unwrap() {
            let name = field.name().unwrap().to_string();
            if name == "image" {
                let file_name = field.file_name().map(str::to_string);
                let ct = field.content_type().map(str::to_string);
                let data = field.bytes().await.unwrap();
                out.insert(
                    name,
                    json!({ "fileName": file_name, "contentType": ct, "len": data.len() }),
                );
            } else {
                out.insert(name, json!(field.text().await.unwrap()));
            }
        }
        Json(Value::Object(out))
    }

    async fn echo_json(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
        let accept = headers
            .get("accept")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        Json(json!({ "accept": accept, "received": body }))
    }

    fn hook_router() -> Router {
        Router::new()
            .route("/multipart", post(echo_multipart))
            .route("/json", post(echo_json))
            .route(
                "/broken",
                post(|| async { (StatusCode::BAD_GATEWAY, "workflow crashed") }),
            )
            .route(
                "/slow",
                post(|| async {
                    tokio::time::sleep(Duration::from_secs(3)).await;
                    "late"
                }),
            )
    }

    #[tokio::test]
    async fn missing_endpoint_is_configuration_error() {
        let client = HttpWebhookClient::new(Duration::from_secs(5)).unwrap();
        let fields = AnalysisFields::for_image(&image(), None, OffsetDateTime::now_utc());

        let err = client.submit(None, encode_multipart(&image(), &fields)).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration));

        let err = client.submit(Some("  "), encode_multipart(&image(), &fields)).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration));
    }

    #[tokio::test]
    async fn multipart_submission_carries_image_and_fields() {
        let base = spawn_server(hook_router()).await;
        let client = HttpWebhookClient::new(Duration::from_secs(5)).unwrap();
        let user = Uuid::new_v4();
        let fields = AnalysisFields::for_image(&image(), Some(user), OffsetDateTime::now_utc());

        let raw = client
            .submit(Some(&format!("{}/multipart", base)), encode_multipart(&image(), &fields))
            .await
            .unwrap();
        let echoed: Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(echoed["image"]["fileName"], "lunch.jpg");
        assert_eq!(echoed["image"]["contentType"], "image/jpeg");
        assert_eq!(echoed["image"]["len"], 8);
        assert_eq!(echoed["fileName"], "lunch.jpg");
        assert_eq!(echoed["mimeType"], "image/jpeg");
        assert_eq!(echoed["fileSize"], "8");
        assert_eq!(echoed["timestamp"], fields.timestamp.as_str());
        assert_eq!(echoed["user_id"], user.to_string());
    }

    #[tokio::test]
    async fn json_submission_sends_accept_header() {
        let base = spawn_server(hook_router()).await;
        let client = HttpWebhookClient::new(Duration::from_secs(5)).unwrap();
        let fields = AnalysisFields::for_image(&image(), None, OffsetDateTime::now_utc());

        let raw = client
            .submit(Some(&format!("{}/json", base)), encode_json(&image(), &fields).unwrap())
            .await
            .unwrap();
        let echoed: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(echoed["accept"], "application/json");
        assert!(echoed["received"]["image"]
            .as_str()
            .unwrap()
            .starts_with("data:image/jpeg;base64,"));
    }

    #[tokio::test]
    async fn non_success_status_keeps_body() {
        let base = spawn_server(hook_router()).await;
        let client = HttpWebhookClient::new(Duration::from_secs(5)).unwrap();
        let fields = AnalysisFields::for_image(&image(), None, OffsetDateTime::now_utc());

        let err = client
            .submit(Some(&format!("{}/broken", base)), encode_multipart(&image(), &fields))
            .await
            .unwrap_err();
        match err {
            AnalysisError::UpstreamStatus { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "workflow crashed");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_and_slow_endpoints_are_transport_errors() {
        let client = HttpWebhookClient::new(Duration::from_millis(300)).unwrap();
        let fields = AnalysisFields::for_image(&image(), None, OffsetDateTime::now_utc());

        let dead = closed_port_url().await;
        let err = client
            .submit(Some(&dead), encode_multipart(&image(), &fields))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "transport");

        let base = spawn_server(hook_router()).await;
        let err = client
            .submit(Some(&format!("{}/slow", base)), encode_multipart(&image(), &fields))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "transport");
    }
}

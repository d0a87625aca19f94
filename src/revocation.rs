//! Revocation status lookups.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Error;

/// Remote check of whether a credential has been revoked.
#[async_trait]
pub trait RevocationCheck: Send + Sync {
    /// `Ok(true)` when the credential is confirmed not revoked.
    async fn is_clean(&self, credential: &Value) -> Result<bool, Error>;
}

/// POSTs the credential as JSON to a revocation endpoint. HTTP 200 means
/// not revoked; any other status means revoked.
#[derive(Debug, Clone)]
pub struct HttpRevocationCheck {
    client: reqwest::Client,
    url: String,
}

impl HttpRevocationCheck {
    pub fn new(url: &str) -> Result<Self, Error> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "User-Agent",
            reqwest::header::HeaderValue::from_static(crate::USER_AGENT),
        );
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RevocationCheck for HttpRevocationCheck {
    async fn is_clean(&self, credential: &Value) -> Result<bool, Error> {
        let resp = self
            .client
            .post(&self.url)
            .header("Accept", "application/json")
            .json(credential)
            .send()
            .await
            .map_err(|e| Error::RevocationCheckFailed(e.to_string()))?;
        let status = resp.status();
        log::debug!("revocation check {} returned {}", self.url, status);
        Ok(status == reqwest::StatusCode::OK)
    }
}

/// Fixed answer, for deployments without a revocation service and for tests.
#[derive(Debug, Clone, Copy)]
pub struct StaticRevocationCheck(pub bool);

#[async_trait]
impl RevocationCheck for StaticRevocationCheck {
    async fn is_clean(&self, _credential: &Value) -> Result<bool, Error> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::{Body, Response, Server, StatusCode};
    use serde_json::json;

    fn revocation_server(
        status: StatusCode,
    ) -> Result<(String, impl FnOnce() -> Result<(), ()>), hyper::Error> {
        use hyper::service::{make_service_fn, service_fn};
        let addr = ([127, 0, 0, 1], 0).into();
        let make_svc = make_service_fn(move |_| async move {
            Ok::<_, hyper::Error>(service_fn(move |req| async move {
                assert_eq!(req.method(), hyper::Method::POST);
                let body = hyper::body::to_bytes(req.into_body()).await?;
                let credential: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
                let (mut parts, body) = Response::<Body>::default().into_parts();
                parts.status = if credential.is_object() {
                    status
                } else {
                    StatusCode::BAD_REQUEST
                };
                Ok::<_, hyper::Error>(Response::from_parts(parts, body))
            }))
        });
        let server = Server::try_bind(&addr)?.serve(make_svc);
        let url = "http://".to_string() + &server.local_addr().to_string() + "/revoked";
        let (shutdown_tx, shutdown_rx) = futures::channel::oneshot::channel();
        let graceful = server.with_graceful_shutdown(async {
            shutdown_rx.await.ok();
        });
        tokio::task::spawn(async move {
            graceful.await.ok();
        });
        let shutdown = || shutdown_tx.send(());
        Ok((url, shutdown))
    }

    #[tokio::test]
    async fn status_ok_is_clean() {
        let (url, shutdown) = revocation_server(StatusCode::OK).unwrap();
        let check = HttpRevocationCheck::new(&url).unwrap();
        assert!(check.is_clean(&json!({"id": "urn:uuid:1"})).await.unwrap());
        shutdown().ok();
    }

    #[tokio::test]
    async fn other_status_is_revoked() {
        for status in &[StatusCode::NOT_FOUND, StatusCode::INTERNAL_SERVER_ERROR] {
            let (url, shutdown) = revocation_server(*status).unwrap();
            let check = HttpRevocationCheck::new(&url).unwrap();
            assert!(!check.is_clean(&json!({"id": "urn:uuid:1"})).await.unwrap());
            shutdown().ok();
        }
    }

    #[tokio::test]
    async fn unreachable_endpoint() {
        // nothing listens on the discard port
        let check = HttpRevocationCheck::new("http://127.0.0.1:9/revoked").unwrap();
        let err = check.is_clean(&json!({})).await.unwrap_err();
        assert!(matches!(err, Error::RevocationCheckFailed(_)));
    }
}

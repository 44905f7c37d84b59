use crate::domain::model::{BackendRequest, HttpMethod, Payload};
use crate::domain::ports::{MaterialsBackend, Transport, TransportResponse};
use crate::utils::error::{ConsoleError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// 以 reqwest 實作的 HTTP 傳輸層
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(
        &self,
        method: HttpMethod,
        url: &str,
        payload: Option<&Payload>,
    ) -> Result<TransportResponse> {
        let mut request = match method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
            HttpMethod::Put => self.client.put(url),
            HttpMethod::Delete => self.client.delete(url),
        };

        request = request.header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE_JSON);

        if let Some(body) = payload {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(TransportResponse { status, body })
    }
}

/// 把 BackendRequest 轉成一次後端呼叫，並把回應轉成可列印的 JSON
pub struct RequestAdapter<T: Transport> {
    transport: T,
    base_url: String,
}

impl<T: Transport> RequestAdapter<T> {
    pub fn new(transport: T, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Sends one request. An unsupported method fails before any I/O.
    pub async fn send(&self, request: &BackendRequest) -> Result<Value> {
        let method = HttpMethod::parse(&request.method)?;
        let url = self.url_for(&request.path);

        tracing::debug!("📡 {} {}", method, url);

        let response = self
            .transport
            .execute(method, &url, request.payload.as_ref())
            .await?;

        tracing::debug!("📡 {} {} -> {}", method, url, response.status);

        if !(200..300).contains(&response.status) {
            return Err(ConsoleError::BackendError {
                status: response.status,
                body: response.body.trim().to_string(),
            });
        }

        Ok(decode_body(&response.body))
    }

    /// `send`, with every failure reported here and turned into `None`.
    pub async fn dispatch(&self, request: BackendRequest) -> Option<Value> {
        match self.send(&request).await {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(
                    "❌ {} {} failed: {} (Category: {:?})",
                    request.method,
                    request.path,
                    e,
                    e.category()
                );
                eprintln!("❌ {}", e.user_friendly_message());
                None
            }
        }
    }
}

fn decode_body(body: &str) -> Value {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    // 後端部分錯誤回應是純文字
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

#[async_trait]
impl<T: Transport> MaterialsBackend for RequestAdapter<T> {
    async fn register_material(&self, payload: Option<Payload>) -> Option<Value> {
        self.dispatch(BackendRequest::post("/register-material", payload))
            .await
    }

    async fn register_material_prices(
        &self,
        material_id: &str,
        payload: Option<Payload>,
    ) -> Option<Value> {
        self.dispatch(BackendRequest::post(
            format!("/register-material-prices/{}", material_id),
            payload,
        ))
        .await
    }

    async fn list_materials(&self) -> Option<Value> {
        self.dispatch(BackendRequest::get("/materials")).await
    }

    async fn get_material(&self, material_id: &str) -> Option<Value> {
        self.dispatch(BackendRequest::get(format!("/materials/{}", material_id)))
            .await
    }

    async fn get_piece_prices(&self, material_id: &str) -> Option<Value> {
        self.dispatch(BackendRequest::get(format!(
            "/materials/{}/piece-prices",
            material_id
        )))
        .await
    }

    async fn delete_material(&self, material_id: &str) -> Option<Value> {
        self.dispatch(BackendRequest::delete(format!(
            "/remove/material/{}",
            material_id
        )))
        .await
    }

    async fn update_piece(&self, material_id: &str, payload: Option<Payload>) -> Option<Value> {
        self.dispatch(BackendRequest::post(
            format!("/update/material/{}/piece", material_id),
            payload,
        ))
        .await
    }

    async fn add_piece(&self, material_id: &str, payload: Option<Payload>) -> Option<Value> {
        self.dispatch(BackendRequest::post(
            format!("/add/material/{}/piece", material_id),
            payload,
        ))
        .await
    }

    async fn optimize_cuts(&self, material_id: &str, length: &str) -> Option<Value> {
        self.dispatch(BackendRequest::get(format!(
            "/material/{}/optimize-cuts/{}",
            material_id, length
        )))
        .await
    }
}

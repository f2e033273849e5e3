use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::{debug, instrument};

use crate::config::AppConfig;
use crate::error::{ProxyError, Result};
use crate::models::{ModelCallSpec, RawModelResponse, RequestBody};

/// Single-shot client for the hosted inference provider.
#[derive(Clone)]
pub struct ModelGateway {
  client: reqwest::Client,
  api_base: String,
  auth: HeaderValue,
}

impl ModelGateway {
  pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
    let client = reqwest::Client::builder().timeout(config.timeout()).build()?;
    let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
      .context("access token is not a valid header value")?;
    auth.set_sensitive(true);
    Ok(Self {
      client,
      api_base: config.api_base.trim_end_matches('/').to_string(),
      auth,
    })
  }

  fn headers(&self) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, self.auth.clone());
    headers
  }

  #[instrument(skip_all, fields(model = %spec.model_id))]
  pub async fn call_model(&self, spec: ModelCallSpec) -> Result<RawModelResponse> {
    let url = format!("{}/{}", self.api_base, spec.model_id);
    let request = self.client.post(&url).headers(self.headers());
    let request = match spec.body {
      RequestBody::Json(value) => request.json(&value),
      RequestBody::Binary(bytes) => request.body(bytes),
    };

    let resp = request
      .send()
      .await
      .map_err(|err| transport_error(&spec.model_id, err))?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp
        .text()
        .await
        .unwrap_or_else(|_| "provider request failed".to_string());
      return Err(ProxyError::RemoteModel {
        model: spec.model_id,
        status: status.as_u16(),
        body,
      });
    }

    let content_type = resp
      .headers()
      .get(CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .map(|v| v.to_ascii_lowercase());
    let bytes = resp
      .bytes()
      .await
      .map_err(|err| transport_error(&spec.model_id, err))?
      .to_vec();
    debug!(status = %status, content_type = ?content_type, len = bytes.len(), "model responded");

    classify_body(content_type, bytes)
  }
}

fn transport_error(model: &str, err: reqwest::Error) -> ProxyError {
  if err.is_timeout() {
    ProxyError::Timeout {
      model: model.to_string(),
    }
  } else {
    ProxyError::Transport(err.to_string())
  }
}

/// Tags a successful provider body as JSON or binary from its content type,
/// sniffing the bytes when the provider sends none.
fn classify_body(content_type: Option<String>, bytes: Vec<u8>) -> Result<RawModelResponse> {
  match content_type.as_deref() {
    Some(ct) if ct.contains("json") => serde_json::from_slice(&bytes)
      .map(RawModelResponse::Json)
      .map_err(|err| ProxyError::Decode(format!("provider sent invalid JSON: {err}"))),
    Some(ct) if ct.starts_with("text/") => Ok(RawModelResponse::Json(
      serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
      }),
    )),
    Some(_) => Ok(RawModelResponse::Binary {
      content_type: content_type.clone(),
      bytes,
    }),
    None => match serde_json::from_slice(&bytes) {
      Ok(value) => Ok(RawModelResponse::Json(value)),
      Err(_) => Ok(RawModelResponse::Binary {
        content_type: None,
        bytes,
      }),
    },
  }
}

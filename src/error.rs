use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProxyError>;

#[derive(Debug, Error)]
pub enum ProxyError {
  #[error("Invalid request: {0}")]
  InvalidRequest(String),
  /// The body never reached the handler: wrong content type, oversized, or not JSON.
  #[error("Rejected request body: {message}")]
  RejectedBody { status: StatusCode, message: String },
  #[error("Model {model} failed ({status}): {body}")]
  RemoteModel {
    model: String,
    status: u16,
    body: String,
  },
  #[error("Decode error: {0}")]
  Decode(String),
  #[error("Model {model} timed out")]
  Timeout { model: String },
  #[error("Transport error: {0}")]
  Transport(String),
}

impl ProxyError {
  pub fn status(&self) -> StatusCode {
    match self {
      ProxyError::InvalidRequest(_) | ProxyError::Decode(_) => StatusCode::BAD_REQUEST,
      ProxyError::RejectedBody { status, .. } => *status,
      ProxyError::RemoteModel { .. } | ProxyError::Transport(_) => StatusCode::BAD_GATEWAY,
      ProxyError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
    }
  }

  pub fn code(&self) -> &'static str {
    match self {
      ProxyError::InvalidRequest(_) => "invalid_request",
      ProxyError::RejectedBody { .. } => "rejected_body",
      ProxyError::RemoteModel { .. } => "remote_model_error",
      ProxyError::Decode(_) => "decode_error",
      ProxyError::Timeout { .. } => "timeout",
      ProxyError::Transport(_) => "transport_error",
    }
  }
}

impl From<JsonRejection> for ProxyError {
  fn from(rejection: JsonRejection) -> Self {
    ProxyError::RejectedBody {
      status: rejection.status(),
      message: rejection.body_text(),
    }
  }
}

impl From<base64::DecodeError> for ProxyError {
  fn from(err: base64::DecodeError) -> Self {
    ProxyError::Decode(err.to_string())
  }
}

impl IntoResponse for ProxyError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(code = self.code(), "{self}");
    } else {
      tracing::warn!(code = self.code(), "{self}");
    }
    error_response(status, self.code(), &self.to_string())
  }
}

pub fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
  let body = Json(serde_json::json!({ "error": message, "code": code }));
  (status, body).into_response()
}

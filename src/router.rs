use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::routing::{get, post};
use axum::{middleware, Extension, Json, Router};
use chrono::{DateTime, Utc};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, Instrument};

use crate::config::AppConfig;
use crate::error::Result;
use crate::gateway::ModelGateway;
use crate::intent::{classify, ChatInput};
use crate::models::{ChatRequest, ChatResponse, Intent, ModelCallSpec, ReplyBody};
use crate::normalize::{caption_text, normalize};
use crate::request_context::{attach_request_context, RequestContext};

pub struct RouterState {
  pub started_at: Instant,
  pub started_at_utc: DateTime<Utc>,
  pub config: Arc<AppConfig>,
  pub gateway: ModelGateway,
}

impl RouterState {
  pub fn new(config: AppConfig) -> anyhow::Result<Self> {
    let gateway = ModelGateway::new(&config)?;
    Ok(Self {
      started_at: Instant::now(),
      started_at_utc: Utc::now(),
      config: Arc::new(config),
      gateway,
    })
  }
}

pub fn build_router(state: RouterState) -> Router {
  let body_limit = state.config.max_body_bytes;
  Router::new()
    .route("/health", get(health))
    .route("/api/ai", post(chat))
    .layer(DefaultBodyLimit::max(body_limit))
    .layer(middleware::from_fn(attach_request_context))
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
    .with_state(Arc::new(state))
}

pub async fn run_router<F>(listener: tokio::net::TcpListener, state: RouterState, shutdown: F) -> anyhow::Result<()>
where
  F: std::future::Future<Output = ()> + Send + 'static,
{
  let app = build_router(state);
  axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
  Ok(())
}

async fn health(State(state): State<Arc<RouterState>>) -> Json<serde_json::Value> {
  let uptime = state.started_at.elapsed().as_millis();
  Json(serde_json::json!({
    "status": "ok",
    "version": env!("CARGO_PKG_VERSION"),
    "started_at": state.started_at_utc.to_rfc3339(),
    "uptime_ms": uptime
  }))
}

async fn chat(
  State(state): State<Arc<RouterState>>,
  Extension(ctx): Extension<RequestContext>,
  payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ReplyBody>> {
  let Json(req) = payload?;
  let input = ChatInput::from_request(req)?;
  let intent = classify(input, &state.config)?;

  let span = info_span!("chat", request_id = %ctx.request_id, intent = intent.name());
  let res = dispatch(&state, intent).instrument(span).await?;
  Ok(Json(res.into()))
}

/// Runs one intent's pipeline: build the model call, send it, normalize the result.
async fn dispatch(state: &RouterState, intent: Intent) -> Result<ChatResponse> {
  let config = &state.config;
  let gateway = &state.gateway;
  info!("dispatching");

  match &intent {
    Intent::GenerateImage { prompt } => {
      let raw = gateway
        .call_model(ModelCallSpec::prompt(&config.image_model, prompt))
        .await?;
      Ok(normalize(&intent, raw, None))
    }
    Intent::VisualQuestionAnswer { question, image } => {
      // the text model only sees the caption, so the answer has to wait for it
      let raw = gateway
        .call_model(ModelCallSpec::image(&config.caption_model, image.clone()))
        .await?;
      let caption = caption_text(&raw);
      let prompt = vqa_prompt(&caption, question);
      let raw = gateway
        .call_model(ModelCallSpec::prompt(&config.text_model, &prompt))
        .await?;
      Ok(normalize(&intent, raw, Some(caption)))
    }
    Intent::Caption { image } => {
      let raw = gateway
        .call_model(ModelCallSpec::image(&config.caption_model, image.clone()))
        .await?;
      Ok(normalize(&intent, raw, None))
    }
    Intent::TextChat { message } => {
      let raw = gateway
        .call_model(ModelCallSpec::prompt(&config.text_model, message))
        .await?;
      Ok(normalize(&intent, raw, None))
    }
  }
}

fn vqa_prompt(caption: &str, question: &str) -> String {
  format!("Deskripsi gambar: {caption}\n\nPertanyaan: {question}\nJawaban singkat dan jelas:")
}

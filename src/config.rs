use std::time::Duration;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_API_BASE: &str = "https://api-inference.huggingface.co/models";
pub const DEFAULT_TEXT_MODEL: &str = "gpt2";
pub const DEFAULT_CAPTION_MODEL: &str = "Salesforce/blip-image-captioning-large";
pub const DEFAULT_IMAGE_MODEL: &str = "stabilityai/stable-diffusion-2";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8888;
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AppConfig {
  #[serde(skip_serializing)]
  pub token: String,
  pub api_base: String,
  pub text_model: String,
  pub caption_model: String,
  pub image_model: String,
  pub timeout_secs: u64,
  pub host: String,
  pub port: u16,
  pub max_body_bytes: usize,
  pub default_image_prompt: String,
  pub default_greeting: String,
  pub image_triggers: Vec<String>,
}

impl AppConfig {
  /// Builds a config with the given token and every other field at its default.
  pub fn with_token(token: impl Into<String>) -> Self {
    Self {
      token: token.into(),
      api_base: DEFAULT_API_BASE.to_string(),
      text_model: DEFAULT_TEXT_MODEL.to_string(),
      caption_model: DEFAULT_CAPTION_MODEL.to_string(),
      image_model: DEFAULT_IMAGE_MODEL.to_string(),
      timeout_secs: DEFAULT_TIMEOUT_SECS,
      host: DEFAULT_HOST.to_string(),
      port: DEFAULT_PORT,
      max_body_bytes: DEFAULT_MAX_BODY_BYTES,
      default_image_prompt: "pemandangan alam yang indah".to_string(),
      default_greeting: "Halo".to_string(),
      // longest first so "buatkan gambar" is never cut down to "gambar"
      image_triggers: vec!["buatkan gambar".to_string(), "gambar".to_string()],
    }
  }

  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }

  pub fn bind_addr(&self) -> String {
    format!("{}:{}", self.host, self.port)
  }

  pub fn from_env() -> anyhow::Result<Self> {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let get = |key: &str| {
      lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
    };

    let token = get("HUGGINGFACE_TOKEN").context("HUGGINGFACE_TOKEN is not set")?;
    let mut config = Self::with_token(token);

    if let Some(base) = get("HF_API_BASE") {
      config.api_base = base.trim_end_matches('/').to_string();
    }
    if let Some(model) = get("HF_TEXT_MODEL") {
      config.text_model = model;
    }
    if let Some(model) = get("HF_CAPTION_MODEL") {
      config.caption_model = model;
    }
    if let Some(model) = get("HF_IMAGE_MODEL") {
      config.image_model = model;
    }
    if let Some(raw) = get("HF_TIMEOUT_SECS") {
      match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => config.timeout_secs = secs,
        _ => bail!("HF_TIMEOUT_SECS must be a positive integer, got '{raw}'"),
      }
    }
    if let Some(host) = get("ROJA_HOST") {
      config.host = host;
    }
    if let Some(raw) = get("ROJA_PORT") {
      match raw.parse::<u16>() {
        Ok(port) => config.port = port,
        Err(_) => warn!("Invalid ROJA_PORT='{}', falling back to {}", raw, DEFAULT_PORT),
      }
    }
    if let Some(raw) = get("ROJA_MAX_BODY_BYTES") {
      match raw.parse::<usize>() {
        Ok(limit) => config.max_body_bytes = limit,
        Err(_) => warn!(
          "Invalid ROJA_MAX_BODY_BYTES='{}', falling back to {}",
          raw, DEFAULT_MAX_BODY_BYTES
        ),
      }
    }
    // an explicitly blank prompt is kept so generation requests fail loudly
    if let Some(prompt) = lookup("ROJA_DEFAULT_IMAGE_PROMPT") {
      config.default_image_prompt = prompt.trim().to_string();
    }
    if let Some(greeting) = get("ROJA_DEFAULT_GREETING") {
      config.default_greeting = greeting;
    }

    Ok(config)
  }
}

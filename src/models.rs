use serde::{Deserialize, Serialize};

/// Inbound chat turn as posted by the browser UI.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ChatRequest {
  pub message: Option<String>,
  /// Data URL (`data:image/png;base64,...`) or bare base64.
  pub image: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
  GenerateImage { prompt: String },
  VisualQuestionAnswer { question: String, image: Vec<u8> },
  Caption { image: Vec<u8> },
  TextChat { message: String },
}

impl Intent {
  pub fn name(&self) -> &'static str {
    match self {
      Intent::GenerateImage { .. } => "generate_image",
      Intent::VisualQuestionAnswer { .. } => "vqa",
      Intent::Caption { .. } => "caption",
      Intent::TextChat { .. } => "chat",
    }
  }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
  Json(serde_json::Value),
  Binary(Vec<u8>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ModelCallSpec {
  pub model_id: String,
  pub body: RequestBody,
}

impl ModelCallSpec {
  /// `{ "inputs": prompt }`, the shape text and text-to-image models accept.
  pub fn prompt(model_id: &str, prompt: &str) -> Self {
    Self {
      model_id: model_id.to_string(),
      body: RequestBody::Json(serde_json::json!({ "inputs": prompt })),
    }
  }

  pub fn image(model_id: &str, bytes: Vec<u8>) -> Self {
    Self {
      model_id: model_id.to_string(),
      body: RequestBody::Binary(bytes),
    }
  }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RawModelResponse {
  Json(serde_json::Value),
  Binary { content_type: Option<String>, bytes: Vec<u8> },
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
  Text,
  Image,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatResponse {
  pub kind: ResponseKind,
  pub content: String,
  pub caption: Option<String>,
}

impl ChatResponse {
  pub fn text(content: impl Into<String>) -> Self {
    Self {
      kind: ResponseKind::Text,
      content: content.into(),
      caption: None,
    }
  }

  pub fn image(content: impl Into<String>) -> Self {
    Self {
      kind: ResponseKind::Image,
      content: content.into(),
      caption: None,
    }
  }
}

/// Success body sent back to the UI: `{reply}`, `{reply, caption}` or `{image}`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplyBody {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reply: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub image: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub caption: Option<String>,
}

impl From<ChatResponse> for ReplyBody {
  fn from(res: ChatResponse) -> Self {
    match res.kind {
      ResponseKind::Text => ReplyBody {
        reply: Some(res.content),
        image: None,
        caption: res.caption,
      },
      ResponseKind::Image => ReplyBody {
        reply: None,
        image: Some(res.content),
        caption: res.caption,
      },
    }
  }
}

//! Turns provider responses into the `{reply}` / `{image}` shapes the UI renders.
//!
//! Providers disagree on response layout, so each kind of output has a fixed,
//! ordered list of known shapes. The first shape that matches wins; anything
//! else falls through to a per-intent fallback.

use serde_json::Value;

use crate::models::{ChatResponse, Intent, RawModelResponse};
use crate::payload::{as_data_url, encode_data_url, image_mime};

pub const UNCERTAIN_ANSWER: &str = "Maaf, saya belum yakin dengan jawabannya.";
pub const NO_CAPTION: &str = "Maaf, saya tidak bisa mendeskripsikan gambar ini.";
pub const NO_REPLY: &str = "Tidak ada respons dari AI.";

const GENERATED_TEXT: &str = "generated_text";
const EMBEDDED_IMAGE_FIELDS: [&str; 3] = ["generated_image", "image", "b64_json"];
const URL_CONTAINERS: [&str; 2] = ["data", "images"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextShape {
  /// `[{"generated_text": "..."}]`
  ArrayOfGenerated,
  /// `{"generated_text": "..."}`
  ObjectGenerated,
  /// `"..."`
  PlainString,
}

const TEXT_SHAPES: [TextShape; 3] = [
  TextShape::ArrayOfGenerated,
  TextShape::ObjectGenerated,
  TextShape::PlainString,
];

impl TextShape {
  fn extract<'a>(&self, value: &'a Value) -> Option<&'a str> {
    match self {
      TextShape::ArrayOfGenerated => value.as_array()?.first()?.get(GENERATED_TEXT)?.as_str(),
      TextShape::ObjectGenerated => value.as_object()?.get(GENERATED_TEXT)?.as_str(),
      TextShape::PlainString => value.as_str(),
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageShape {
  /// `[{"generated_image": "<b64>"}]`
  ArrayEmbedded,
  /// `{"generated_image" | "image" | "b64_json": "<b64>"}`
  ObjectEmbedded,
  /// `{"data" | "images": [{"url": "..."}]}`
  NestedUrl,
}

const IMAGE_SHAPES: [ImageShape; 3] = [
  ImageShape::ArrayEmbedded,
  ImageShape::ObjectEmbedded,
  ImageShape::NestedUrl,
];

impl ImageShape {
  fn extract(&self, value: &Value) -> Option<String> {
    match self {
      ImageShape::ArrayEmbedded => {
        let first = value.as_array()?.first()?;
        embedded_field(first).map(as_data_url)
      }
      ImageShape::ObjectEmbedded if value.is_object() => embedded_field(value).map(as_data_url),
      ImageShape::ObjectEmbedded => None,
      ImageShape::NestedUrl => URL_CONTAINERS.iter().find_map(|key| {
        let url = value.get(key)?.as_array()?.first()?.get("url")?.as_str()?;
        (!url.is_empty()).then(|| url.to_string())
      }),
    }
  }
}

fn embedded_field(value: &Value) -> Option<&str> {
  EMBEDDED_IMAGE_FIELDS
    .iter()
    .find_map(|key| value.get(key)?.as_str())
    .filter(|s| !s.is_empty())
}

/// First non-blank generated text found in `value`, trying known shapes in order.
pub fn extract_text(value: &Value) -> Option<String> {
  TEXT_SHAPES
    .iter()
    .find_map(|shape| shape.extract(value))
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
}

pub fn extract_image(value: &Value) -> Option<String> {
  IMAGE_SHAPES.iter().find_map(|shape| shape.extract(value))
}

pub fn normalize(intent: &Intent, raw: RawModelResponse, caption: Option<String>) -> ChatResponse {
  let mut res = match intent {
    Intent::GenerateImage { .. } => match raw {
      RawModelResponse::Binary {
        content_type,
        bytes,
      } => ChatResponse::image(encode_data_url(image_mime(content_type.as_deref()), &bytes)),
      RawModelResponse::Json(value) => match extract_image(&value) {
        Some(image) => ChatResponse::image(image),
        None => ChatResponse::text(value.to_string()),
      },
    },
    Intent::VisualQuestionAnswer { .. } => ChatResponse::text(text_or(&raw, UNCERTAIN_ANSWER)),
    Intent::Caption { .. } => ChatResponse::text(caption_text(&raw)),
    Intent::TextChat { .. } => ChatResponse::text(text_or(&raw, NO_REPLY)),
  };
  res.caption = caption;
  res
}

/// Caption text, the stringified payload when its shape is unknown, or a fallback.
pub fn caption_text(raw: &RawModelResponse) -> String {
  match raw {
    RawModelResponse::Json(value) => match extract_text(value) {
      Some(text) => text,
      None if is_blank(value) => NO_CAPTION.to_string(),
      None => value.to_string(),
    },
    RawModelResponse::Binary { .. } => NO_CAPTION.to_string(),
  }
}

fn text_or(raw: &RawModelResponse, fallback: &str) -> String {
  match raw {
    RawModelResponse::Json(value) => extract_text(value),
    RawModelResponse::Binary { .. } => None,
  }
  .unwrap_or_else(|| fallback.to_string())
}

fn is_blank(value: &Value) -> bool {
  match value {
    Value::Null => true,
    Value::String(s) => s.trim().is_empty(),
    Value::Array(items) => items.is_empty(),
    Value::Object(map) => map.is_empty(),
    _ => false,
  }
}

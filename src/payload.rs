use base64::Engine;

use crate::error::{ProxyError, Result};

pub const PNG_MIME: &str = "image/png";
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Decodes an image sent by the UI. Accepts `data:<mime>;base64,<b64>` or bare base64.
pub fn decode_image(raw: &str) -> Result<Vec<u8>> {
  let raw = raw.trim();
  let encoded = match raw.strip_prefix("data:") {
    Some(rest) => {
      let (meta, data) = rest
        .split_once(',')
        .ok_or_else(|| ProxyError::Decode("data URL has no payload".to_string()))?;
      if !meta.ends_with(";base64") {
        return Err(ProxyError::Decode(
          "only base64 data URLs are supported".to_string(),
        ));
      }
      data
    }
    None => raw,
  };
  Ok(base64::engine::general_purpose::STANDARD.decode(encoded)?)
}

pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
  let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
  format!("data:{mime};base64,{b64}")
}

/// MIME type for a generated image: the provider's `image/*` type, else PNG.
pub fn image_mime(content_type: Option<&str>) -> &str {
  content_type
    .and_then(|ct| ct.split(';').next())
    .map(str::trim)
    .filter(|mime| mime.starts_with("image/") && mime.len() > "image/".len())
    .unwrap_or(PNG_MIME)
}

/// Wraps a provider-supplied base64 image in a data URL unless it already is one.
pub fn as_data_url(embedded: &str) -> String {
  if embedded.starts_with("data:") {
    embedded.to_string()
  } else {
    format!("{PNG_DATA_URL_PREFIX}{embedded}")
  }
}

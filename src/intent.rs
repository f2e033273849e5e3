use crate::config::AppConfig;
use crate::error::{ProxyError, Result};
use crate::models::{ChatRequest, Intent};
use crate::payload::decode_image;

/// A chat turn with the message trimmed. The image stays encoded until an
/// intent actually needs it.
#[derive(Clone, Debug, Default)]
pub struct ChatInput {
  pub message: String,
  pub image: Option<String>,
}

impl ChatInput {
  pub fn from_request(req: ChatRequest) -> Result<Self> {
    let message = req.message.as_deref().map(str::trim).unwrap_or_default();
    let image = req
      .image
      .as_deref()
      .map(str::trim)
      .filter(|raw| !raw.is_empty());

    match (&req.message, image) {
      (None, None) => Err(ProxyError::InvalidRequest(
        "request must carry a message or an image".to_string(),
      )),
      // a blank attachment with nothing to say is not a greeting
      (_, None) if req.image.is_some() && message.is_empty() => Err(ProxyError::InvalidRequest(
        "image payload is empty".to_string(),
      )),
      _ => Ok(Self {
        message: message.to_string(),
        image: image.map(str::to_string),
      }),
    }
  }
}

/// Returns the generation prompt if `message` starts with one of `triggers`,
/// compared case-insensitively.
pub fn strip_image_trigger<'a>(message: &'a str, triggers: &[String]) -> Option<&'a str> {
  triggers.iter().find_map(|trigger| {
    let head = message.get(..trigger.len())?;
    if head.to_lowercase() == trigger.to_lowercase() {
      let rest = &message[trigger.len()..];
      Some(rest.trim_start_matches(|c: char| c.is_whitespace() || c == ':' || c == ',').trim_end())
    } else {
      None
    }
  })
}

pub fn classify(input: ChatInput, config: &AppConfig) -> Result<Intent> {
  if let Some(rest) = strip_image_trigger(&input.message, &config.image_triggers) {
    let prompt = if rest.is_empty() {
      config.default_image_prompt.clone()
    } else {
      rest.to_string()
    };
    if prompt.is_empty() {
      return Err(ProxyError::InvalidRequest(
        "no prompt for image generation".to_string(),
      ));
    }
    return Ok(Intent::GenerateImage { prompt });
  }

  let image = input.image.as_deref().map(decode_image).transpose()?;
  match image {
    Some(image) if image.is_empty() => Err(ProxyError::InvalidRequest(
      "image payload is empty".to_string(),
    )),
    Some(image) if !input.message.is_empty() => Ok(Intent::VisualQuestionAnswer {
      question: input.message,
      image,
    }),
    Some(image) => Ok(Intent::Caption { image }),
    None => {
      let message = if input.message.is_empty() {
        config.default_greeting.clone()
      } else {
        input.message
      };
      Ok(Intent::TextChat { message })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn config() -> AppConfig {
    AppConfig::with_token("hf_test")
  }

  fn text(message: &str) -> ChatInput {
    ChatInput {
      message: message.to_string(),
      image: None,
    }
  }

  fn with_image(message: &str) -> ChatInput {
    ChatInput {
      message: message.to_string(),
      image: Some("data:image/png;base64,AQID".to_string()),
    }
  }

  #[test]
  fn gambar_prefix_generates_image() {
    let intent = classify(text("gambar kucing lucu"), &config()).unwrap();
    assert_eq!(
      intent,
      Intent::GenerateImage {
        prompt: "kucing lucu".to_string()
      }
    );
  }

  #[test]
  fn trigger_is_case_insensitive_and_longest_first() {
    let intent = classify(text("Buatkan Gambar: naga merah"), &config()).unwrap();
    assert_eq!(
      intent,
      Intent::GenerateImage {
        prompt: "naga merah".to_string()
      }
    );
    let intent = classify(text("GAMBAR gunung"), &config()).unwrap();
    assert_eq!(
      intent,
      Intent::GenerateImage {
        prompt: "gunung".to_string()
      }
    );
  }

  #[test]
  fn bare_trigger_uses_default_prompt() {
    let cfg = config();
    let intent = classify(text("gambar"), &cfg).unwrap();
    assert_eq!(
      intent,
      Intent::GenerateImage {
        prompt: cfg.default_image_prompt.clone()
      }
    );
  }

  #[test]
  fn bare_trigger_without_default_prompt_is_invalid() {
    let mut cfg = config();
    cfg.default_image_prompt.clear();
    let err = classify(text("buatkan gambar"), &cfg).unwrap_err();
    assert!(matches!(err, ProxyError::InvalidRequest(_)));
  }

  #[test]
  fn trigger_wins_over_attached_image() {
    let intent = classify(with_image("gambar pantai"), &config()).unwrap();
    assert!(matches!(intent, Intent::GenerateImage { .. }));
  }

  #[test]
  fn image_with_question_is_vqa() {
    let intent = classify(with_image("apa warna baju ini?"), &config()).unwrap();
    assert_eq!(
      intent,
      Intent::VisualQuestionAnswer {
        question: "apa warna baju ini?".to_string(),
        image: vec![1, 2, 3]
      }
    );
  }

  #[test]
  fn image_alone_is_caption() {
    let intent = classify(with_image(""), &config()).unwrap();
    assert_eq!(intent, Intent::Caption { image: vec![1, 2, 3] });
  }

  #[test]
  fn empty_image_is_invalid() {
    let input = ChatInput {
      message: String::new(),
      image: Some("data:image/png;base64,".to_string()),
    };
    assert!(matches!(
      classify(input, &config()),
      Err(ProxyError::InvalidRequest(_))
    ));
  }

  #[test]
  fn plain_message_is_text_chat() {
    for message in ["halo apa kabar", "siapa kamu?", "gamba", "menggambar itu seru"] {
      let intent = classify(text(message), &config()).unwrap();
      assert_eq!(
        intent,
        Intent::TextChat {
          message: message.to_string()
        }
      );
    }
  }

  #[test]
  fn blank_message_gets_greeting() {
    let cfg = config();
    let intent = classify(text(""), &cfg).unwrap();
    assert_eq!(
      intent,
      Intent::TextChat {
        message: cfg.default_greeting.clone()
      }
    );
  }

  #[test]
  fn request_without_fields_is_invalid() {
    let err = ChatInput::from_request(ChatRequest::default()).unwrap_err();
    assert!(matches!(err, ProxyError::InvalidRequest(_)));
  }

  #[test]
  fn request_trims_message_and_keeps_image_encoded() {
    let input = ChatInput::from_request(ChatRequest {
      message: Some("  halo  ".to_string()),
      image: Some(" data:image/png;base64,aGFsbw== ".to_string()),
    })
    .unwrap();
    assert_eq!(input.message, "halo");
    assert_eq!(input.image.as_deref(), Some("data:image/png;base64,aGFsbw=="));
  }

  #[test]
  fn blank_image_without_message_is_invalid() {
    for image in ["", "   "] {
      let err = ChatInput::from_request(ChatRequest {
        message: None,
        image: Some(image.to_string()),
      })
      .unwrap_err();
      assert!(matches!(err, ProxyError::InvalidRequest(_)));
    }
  }

  #[test]
  fn blank_image_with_message_is_text_chat() {
    let input = ChatInput::from_request(ChatRequest {
      message: Some("halo".to_string()),
      image: Some(String::new()),
    })
    .unwrap();
    assert!(input.image.is_none());
    let intent = classify(input, &config()).unwrap();
    assert_eq!(
      intent,
      Intent::TextChat {
        message: "halo".to_string()
      }
    );
  }

  #[test]
  fn bad_image_is_decode_error() {
    let input = ChatInput {
      message: String::new(),
      image: Some("data:image/png;base64,%%%".to_string()),
    };
    assert!(matches!(classify(input, &config()), Err(ProxyError::Decode(_))));
  }

  #[test]
  fn bad_image_is_ignored_when_generating() {
    let input = ChatInput {
      message: "gambar kucing".to_string(),
      image: Some("data:image/png;base64,%%%".to_string()),
    };
    let intent = classify(input, &config()).unwrap();
    assert_eq!(
      intent,
      Intent::GenerateImage {
        prompt: "kucing".to_string()
      }
    );
  }
}

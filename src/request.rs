//! Request and response types seen by gateway callers

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::schema::ResponseSchema;

/// One prompt, optionally asking for schema-constrained JSON
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest
{   /// The prompt text
    pub prompt: String
  , /// Expected response shape; `None` asks for plain text
    pub schema: Option<ResponseSchema>
}

impl PromptRequest
{   pub fn text(prompt: impl Into<String>) -> Self
    {   PromptRequest
        {   prompt: prompt.into()
          , schema: None
        }
    }

    pub fn structured(
      prompt: impl Into<String>
    , schema: ResponseSchema
    ) -> Self
    {   PromptRequest
        {   prompt: prompt.into()
          , schema: Some(schema)
        }
    }
}

/// A validated, sanitized reply
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse
{   /// Sanitized plain text
    Text(String)
  , /// Parsed JSON holding every required schema field
    Json(Value)
}

impl ApiResponse
{   pub fn as_text(&self) -> Option<&str>
    {   match self
        {   ApiResponse::Text(text) => Some(text)
          , ApiResponse::Json(_) => None
        }
    }

    pub fn as_json(&self) -> Option<&Value>
    {   match self
        {   ApiResponse::Json(value) => Some(value)
          , ApiResponse::Text(_) => None
        }
    }

    /// Decode a structured reply into a typed value
    pub fn decode<T: DeserializeOwned>(&self)
      -> Result<T, crate::error::Error>
    {   match self
        {   ApiResponse::Json(value) => {
              T::deserialize(value)
                .map_err(|e| crate::error::Error::ParseError(e.to_string()))
            }
          , ApiResponse::Text(_) => Err(crate::error::Error::ParseError(
              "expected a structured response, got text".to_string()
            ))
        }
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use serde_json::json;

    #[test]
    fn accessors_pick_the_matching_variant()
    {   let text = ApiResponse::Text("8".to_string());
        assert_eq!(text.as_text(), Some("8"));
        assert_eq!(text.as_json(), None);

        let value = ApiResponse::Json(json!({ "answer": 8 }));
        assert_eq!(value.as_text(), None);
        assert_eq!(value.as_json().map(|v| &v["answer"]), Some(&json!(8)));
    }

    #[test]
    fn decode_refuses_plain_text()
    {   let text = ApiResponse::Text("8".to_string());
        assert!(text.decode::<serde_json::Value>().is_err());
    }
}

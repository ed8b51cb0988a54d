use serde::{Deserialize, Serialize};
use serde_json::Value;
use log::{debug, trace, error};
use async_trait::async_trait;

use crate::schema::ResponseSchema;

const USER_AGENT: &str = "EducationalApp/1.0";
const BLOCK_MEDIUM_AND_ABOVE: &str = "BLOCK_MEDIUM_AND_ABOVE";

/// Categories blocked at medium severity and above on every request
pub const SAFETY_CATEGORIES: [&str; 4] = [
  "HARM_CATEGORY_HARASSMENT"
, "HARM_CATEGORY_HATE_SPEECH"
, "HARM_CATEGORY_SEXUALLY_EXPLICIT"
, "HARM_CATEGORY_DANGEROUS_CONTENT"
];

// ===== Wire Types =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part
{   #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content
{   #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>
  , #[serde(default)]
    pub parts: Vec<Part>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetySetting
{   pub category: String
  , pub threshold: String
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig
{   pub response_mime_type: String
  , pub response_schema: Value
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest
{   pub contents: Vec<Content>
  , pub safety_settings: Vec<SafetySetting>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>
}

impl GenerateContentRequest
{   /// The prompt as the sole user turn, fixed safety settings, and
    /// JSON mode when a schema is given
    pub fn new(prompt: &str, schema: Option<&ResponseSchema>) -> Self
    {   GenerateContentRequest
        {   contents: vec![
              Content
              {   role: Some("user".to_string())
                , parts: vec![
                    Part { text: Some(prompt.to_string()) }
                  ]
              }
            ]
          , safety_settings: SAFETY_CATEGORIES
              .iter()
              .map(|category| SafetySetting
              {   category: category.to_string()
                , threshold: BLOCK_MEDIUM_AND_ABOVE.to_string()
              })
              .collect()
          , generation_config: schema.map(|s| GenerationConfig
            {   response_mime_type: "application/json".to_string()
              , response_schema: s.to_wire()
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate
{   #[serde(default)]
    pub content: Option<Content>
  , #[serde(default)]
    pub finish_reason: Option<String>
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateContentResponse
{   #[serde(default)]
    pub candidates: Vec<Candidate>
}

impl GenerateContentResponse
{   /// `candidates[0].content.parts[0].text`, if present and non-empty
    pub fn first_text(&self) -> Option<&str>
    {   self.candidates
          .first()?
          .content
          .as_ref()?
          .parts
          .first()?
          .text
          .as_deref()
          .filter(|t| !t.is_empty())
    }

    /// Envelope carrying a single text part
    pub fn from_text(text: impl Into<String>) -> Self
    {   GenerateContentResponse
        {   candidates: vec![
              Candidate
              {   content: Some(Content
                  {   role: Some("model".to_string())
                    , parts: vec![Part { text: Some(text.into()) }]
                  })
                , finish_reason: Some("STOP".to_string())
              }
            ]
        }
    }
}

// ===== HTTP Transport =====

/// reqwest-backed transport for the generateContent endpoint
#[derive(Debug, Clone)]
pub struct GeminiClient
{   http_client: reqwest::Client
  , api_base: String
  , model: String
}

impl GeminiClient
{   pub fn new(api_base: impl Into<String>, model: impl Into<String>) -> Self
    {   let api_base = api_base.into();
        let model = model.into();
        debug!("Creating GeminiClient for model: {}", model);
        GeminiClient
        {   http_client: reqwest::Client::new()
          , api_base: api_base.trim_end_matches('/').to_string()
          , model
        }
    }

    pub fn from_config(config: &crate::config::GatewayConfig) -> Self
    {   GeminiClient::new(config.api_base.clone(), config.model.clone())
    }

    pub fn endpoint(&self) -> String
    {   format!(
          "{}/v1beta/models/{}:generateContent",
          self.api_base, self.model
        )
    }
}

#[async_trait]
impl crate::providers::Transport for GeminiClient
{   async fn generate(
      &self
    , api_key: &str
    , request: &GenerateContentRequest
    ) -> Result<GenerateContentResponse, crate::error::Error>
    {   debug!("Sending generateContent to model: {}", self.model);

        // Key travels in a header so it never appears in a URL that
        // reqwest might echo into an error message.
        let response = self.http_client
          .post(self.endpoint())
          .header("x-goog-api-key", api_key)
          .header("Content-Type", "application/json")
          .header("User-Agent", USER_AGENT)
          .json(request)
          .send()
          .await
          .map_err(|e| {
            let message = crate::security::redact_key(
              &e.without_url().to_string(), api_key
            );
            error!("HTTP error: {}", message);
            crate::error::Error::HttpError(message)
          })?;

        let status = response.status();
        trace!("generateContent response status: {}", status);

        if !status.is_success()
        {   return Err(crate::error::Error::from_status(status.as_u16()));
        }

        response.json::<GenerateContentResponse>().await.map_err(|e| {
          let message = crate::security::redact_key(
            &e.without_url().to_string(), api_key
          );
          error!("Parse error: {}", message);
          crate::error::Error::ParseError(message)
        })
    }
}

//! Typed description of the JSON shape a structured response must have
//!
//! A [`ResponseSchema`] is sent upstream to request JSON mode and used
//! afterwards to check the parsed reply: every `required` field must be
//! present as a key of the top-level object.

use std::collections::BTreeMap;
use serde_json::{json, Map, Value};
use log::{debug, trace};

/// Type of a single schema field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind
{   String
  , Number
  , Integer
  , Boolean
  , Array(Box<FieldKind>)
  , Object(ResponseSchema)
}

impl FieldKind
{   pub fn array_of(item: FieldKind) -> Self
    {   FieldKind::Array(Box::new(item))
    }

    fn to_wire(&self) -> Value
    {   match self
        {   FieldKind::String => json!({ "type": "STRING" })
          , FieldKind::Number => json!({ "type": "NUMBER" })
          , FieldKind::Integer => json!({ "type": "INTEGER" })
          , FieldKind::Boolean => json!({ "type": "BOOLEAN" })
          , FieldKind::Array(item) => json!({
              "type": "ARRAY",
              "items": item.to_wire()
            })
          , FieldKind::Object(schema) => schema.to_wire()
        }
    }
}

/// Object schema: named properties plus the set that must be present
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResponseSchema
{   pub properties: BTreeMap<String, FieldKind>
  , pub required: Vec<String>
}

impl ResponseSchema
{   pub fn new() -> Self
    {   ResponseSchema::default()
    }

    /// Add an optional property
    pub fn property(mut self, name: &str, kind: FieldKind) -> Self
    {   self.properties.insert(name.to_string(), kind);
        self
    }

    /// Add a property that every response must contain
    pub fn required(mut self, name: &str, kind: FieldKind) -> Self
    {   self.properties.insert(name.to_string(), kind);
        if !self.required.iter().any(|r| r == name)
        {   self.required.push(name.to_string());
        }
        self
    }

    /// Upstream schema format: `{"type":"OBJECT","properties":...}`
    pub fn to_wire(&self) -> Value
    {   let properties: Map<String, Value> = self.properties
          .iter()
          .map(|(name, kind)| (name.clone(), kind.to_wire()))
          .collect();
        let mut wire = json!({
          "type": "OBJECT",
          "properties": properties
        });
        if !self.required.is_empty()
        {   wire["required"] = json!(self.required);
        }
        wire
    }

    /// Required fields absent from `value`. A non-object value is
    /// missing all of them.
    pub fn missing_required(&self, value: &Value) -> Vec<String>
    {   match value.as_object()
        {   Some(object) => self.required
              .iter()
              .filter(|field| !object.contains_key(field.as_str()))
              .cloned()
              .collect()
          , None => self.required.clone()
        }
    }

    /// Strip fences, parse, and check required fields
    pub fn parse_response(
      &self
    , text: &str
    ) -> Result<Value, crate::error::Error>
    {   let body = strip_code_fence(text);
        trace!("Parsing {} bytes of structured response", body.len());

        let value: Value = serde_json::from_str(body)
          .map_err(|e| crate::error::Error::ParseError(e.to_string()))?;

        let missing = self.missing_required(&value);
        if !missing.is_empty()
        {   debug!("Structured response lacks {} field(s)", missing.len());
            return Err(crate::error::Error::MissingRequiredFields(missing));
        }
        Ok(value)
    }
}

/// Remove a surrounding ```` ``` ```` or ```` ```json ```` fence
pub fn strip_code_fence(text: &str) -> &str
{   let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```")
    else
    {   return trimmed;
    };
    let rest = rest
      .strip_prefix("json")
      .or_else(|| rest.strip_prefix("JSON"))
      .unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests
{   use super::*;

    fn word_problem_schema() -> ResponseSchema
    {   ResponseSchema::new()
          .required("problem", FieldKind::String)
          .required("answer", FieldKind::Number)
    }

    #[test]
    fn wire_format_matches_upstream()
    {   let wire = word_problem_schema().to_wire();
        assert_eq!(wire, json!({
          "type": "OBJECT",
          "properties": {
            "answer": { "type": "NUMBER" },
            "problem": { "type": "STRING" }
          },
          "required": ["problem", "answer"]
        }));
    }

    #[test]
    fn nested_wire_format()
    {   let item = ResponseSchema::new()
          .required("q", FieldKind::String)
          .required("a", FieldKind::array_of(FieldKind::String));
        let schema = ResponseSchema::new()
          .required("questions", FieldKind::array_of(FieldKind::Object(item)));
        let wire = schema.to_wire();
        assert_eq!(wire["properties"]["questions"]["type"], "ARRAY");
        assert_eq!(
          wire["properties"]["questions"]["items"]["required"],
          json!(["q", "a"])
        );
        assert_eq!(
          wire["properties"]["questions"]["items"]["properties"]["a"]["items"]["type"],
          "STRING"
        );
    }

    #[test]
    fn optional_only_schema_omits_required()
    {   let wire = ResponseSchema::new()
          .property("hint", FieldKind::String)
          .to_wire();
        assert!(wire.get("required").is_none());
    }

    #[test]
    fn strips_fences()
    {   assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn rejects_missing_required_field()
    {   let err = word_problem_schema()
          .parse_response(r#"{"problem": "Sam has 3 bags of 4 apples."}"#)
          .unwrap_err();
        assert_eq!(
          err,
          crate::error::Error::MissingRequiredFields(vec!["answer".to_string()])
        );
    }

    #[test]
    fn accepts_complete_object()
    {   let value = word_problem_schema()
          .parse_response("```json\n{\"problem\": \"3 x 4?\", \"answer\": 12}\n```")
          .expect("complete response");
        assert_eq!(value["answer"], 12);
    }

    #[test]
    fn rejects_non_object_and_bad_json()
    {   let schema = word_problem_schema();
        assert!(matches!(
          schema.parse_response("[1, 2]"),
          Err(crate::error::Error::MissingRequiredFields(_))
        ));
        assert!(matches!(
          schema.parse_response("not json"),
          Err(crate::error::Error::ParseError(_))
        ));
    }
}

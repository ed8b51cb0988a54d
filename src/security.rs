//! Input/output sanitization and shape validation
//!
//! Everything crossing the gateway boundary in either direction goes
//! through [`sanitize_input`]. The validators are whitelists: a single
//! character outside the allowed set rejects the whole string.

use std::sync::OnceLock;

use regex::Regex;

/// Longest prompt accepted as educational input, in characters
pub const MAX_EDUCATIONAL_INPUT_CHARS: usize = 620;
pub const MIN_API_KEY_LEN: usize = 20;
pub const MAX_API_KEY_LEN: usize = 100;

/// Punctuation allowed in educational input besides letters,
/// digits and whitespace
const EDUCATIONAL_PUNCTUATION: &[char] = &[
  '.', ',', '!', '?', '\'', '"', '(', ')', '-', '+', '÷', '×', '=', ':', '/'
];

struct Patterns
{   angle_brackets: Regex
  , script_scheme: Regex
  , event_handler: Regex
  , key_param: Regex
}

fn patterns() -> &'static Patterns
{   static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns
    {   angle_brackets: Regex::new(r"[<>]")
          .expect("static pattern")
      , script_scheme: Regex::new(r"(?i-u)javascript:")
          .expect("static pattern")
      , event_handler: Regex::new(r"(?i-u)on[a-z0-9_]+=")
          .expect("static pattern")
      , key_param: Regex::new(r"(?i)(key=)[^&\s]+")
          .expect("static pattern")
    })
}

/// Result of a validation check with a human-readable reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome
{   pub valid: bool
  , pub reason: String
}

impl ValidationOutcome
{   pub fn ok() -> Self
    {   ValidationOutcome
        {   valid: true
          , reason: "ok".to_string()
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self
    {   ValidationOutcome
        {   valid: false
          , reason: reason.into()
        }
    }
}

/// Strip angle brackets, `javascript:` and `on<word>=` handlers.
///
/// Removal repeats until nothing matches, so fragments like
/// `javajavascript:script:` cannot reassemble a pattern and the
/// function is idempotent.
pub fn sanitize_input(input: &str) -> String
{   let p = patterns();
    let mut current = input.to_string();
    loop
    {   let stripped = p.angle_brackets.replace_all(&current, "");
        let stripped = p.script_scheme.replace_all(&stripped, "");
        let stripped = p.event_handler
          .replace_all(&stripped, "")
          .into_owned();
        if stripped == current
        {   return current;
        }
        current = stripped;
    }
}

/// Absent input sanitizes to the empty string
pub fn sanitize_optional(input: Option<&str>) -> String
{   input.map(sanitize_input).unwrap_or_default()
}

fn is_educational_char(c: char) -> bool
{   c.is_ascii_alphanumeric()
      || c.is_whitespace()
      || EDUCATIONAL_PUNCTUATION.contains(&c)
}

pub fn validate_educational_input(input: &str) -> ValidationOutcome
{   if input.is_empty()
    {   return ValidationOutcome::rejected("input is empty");
    }
    let len = input.chars().count();
    if len > MAX_EDUCATIONAL_INPUT_CHARS
    {   return ValidationOutcome::rejected(format!(
          "input is {} characters, limit is {}",
          len, MAX_EDUCATIONAL_INPUT_CHARS
        ));
    }
    if input.chars().any(|c| !is_educational_char(c))
    {   return ValidationOutcome::rejected(
          "input contains characters outside letters, numbers and basic punctuation"
        );
    }
    ValidationOutcome::ok()
}

pub fn is_valid_educational_input(input: &str) -> bool
{   validate_educational_input(input).valid
}

/// Shape check only; says nothing about whether the key works
pub fn validate_api_key(key: Option<&str>) -> ValidationOutcome
{   let key = match key
    {   Some(k) if !k.is_empty() => k
      , _ => return ValidationOutcome::rejected("API key is missing")
    };
    if key.len() < MIN_API_KEY_LEN || key.len() > MAX_API_KEY_LEN
    {   return ValidationOutcome::rejected(format!(
          "API key length must be between {} and {}",
          MIN_API_KEY_LEN, MAX_API_KEY_LEN
        ));
    }
    if !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {   return ValidationOutcome::rejected(
          "API key may only contain letters, digits, '_' and '-'"
        );
    }
    ValidationOutcome::ok()
}

pub fn is_valid_api_key(key: Option<&str>) -> bool
{   validate_api_key(key).valid
}

/// Mask the API key, and any `key=...` parameter, in text about to
/// reach a log line or an error value
pub fn redact_key(text: &str, api_key: &str) -> String
{   let masked = if api_key.is_empty()
    {   text.to_string()
    }
    else
    {   text.replace(api_key, "***")
    };
    patterns().key_param
      .replace_all(&masked, "${1}***")
      .into_owned()
}

/// Friendly messages shown to students; never carry internal detail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafeMessage
{   ApiCallFailed
  , InvalidResponse
  , NetworkError
  , RateLimit
}

impl SafeMessage
{   pub fn text(self) -> &'static str
    {   match self
        {   SafeMessage::ApiCallFailed =>
              "Unable to connect to our learning service. Please try again."
          , SafeMessage::InvalidResponse =>
              "Received an unexpected response. Please try again."
          , SafeMessage::NetworkError =>
              "Network connection issue. Please check your internet connection."
          , SafeMessage::RateLimit =>
              "Too many requests. Please wait a moment before trying again."
        }
    }

    /// The message used whenever the cause should not be surfaced
    pub fn generic() -> Self
    {   SafeMessage::ApiCallFailed
    }
}

impl std::fmt::Display for SafeMessage
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {   f.write_str(self.text())
    }
}

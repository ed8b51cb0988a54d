pub mod error;
pub mod config;
pub mod clock;
pub mod security;
pub mod rate_limiter;
pub mod schema;
pub mod request;
pub mod providers;
pub mod gateway;
pub mod throttle;
pub mod prompts;
pub mod client;

pub use client::TutorBackend;
pub use config::{GatewayConfig, RateLimiterConfig};
pub use error::{Error, ErrorKind};
pub use gateway::SecureGateway;
pub use rate_limiter::RateLimiter;
pub use request::{ApiResponse, PromptRequest};
pub use schema::{FieldKind, ResponseSchema};
pub use throttle::{CallStatus, CallThrottle};

/*

eduapi: the one door between the learning widgets (math, reading,
science) and the generative-language service. Widgets hand it a prompt
and maybe a schema and get back sanitized text, a checked JSON object,
or None.

eduapi/
├── Cargo.toml
├── src/
│   ├── lib.rs          # Re-exports and backend channel types
│   ├── error.rs        # Error enum and failure taxonomy
│   ├── config.rs       # Gateway, quota and cooldown settings
│   ├── clock.rs        # Time source (swappable in tests)
│   ├── security.rs     # Sanitizer and whitelist validators
│   ├── rate_limiter.rs # Sliding-window quota
│   ├── schema.rs       # Typed response schemas
│   ├── request.rs      # PromptRequest / ApiResponse
│   ├── providers/      # Transport trait and the Gemini HTTP client
│   ├── gateway.rs      # The secure call pipeline
│   ├── throttle.rs     # Caller-side cooldown and loading state
│   ├── prompts.rs      # Prompts and schemas used by the widgets
│   ├── client.rs       # Background task driving the throttle
│   └── bin/tutor.rs    # Command-line front-end
└── tests/

*/

/// BACKEND API INTERFACE:

// ===== Ask =====

/// `None` for every kind of failure
pub type AskReply = Option<crate::request::ApiResponse>;
pub type AskReplySender
  = tokio::sync::mpsc::UnboundedSender<AskReply>;

pub struct AskArgs
{   pub prompt: String
  , pub schema: Option<crate::schema::ResponseSchema>
  , pub reply: AskReplySender
}

// ===== GetStatus =====

pub type GetStatusReply = crate::throttle::CallStatus;
pub type GetStatusReplySender
  = tokio::sync::mpsc::UnboundedSender<GetStatusReply>;

pub struct GetStatusArgs
{   pub reply: GetStatusReplySender
}

// ===== ClearError =====

pub type ClearErrorReply = ();
pub type ClearErrorReplySender
  = tokio::sync::mpsc::UnboundedSender<ClearErrorReply>;

pub struct ClearErrorArgs
{   pub reply: ClearErrorReplySender
}

// ===== KillProcess =====

pub type KillProcessReply = Result<(), crate::error::Error>;
pub type KillProcessReplySender
  = tokio::sync::mpsc::UnboundedSender<KillProcessReply>;

pub struct KillProcessArgs
{   pub reply: KillProcessReplySender
}

// ===== TutorHand (sender side) =====

pub struct TutorHand
{   pub ask_tx
      : tokio::sync::mpsc::UnboundedSender<AskArgs>
  , pub get_status_tx
      : tokio::sync::mpsc::UnboundedSender<GetStatusArgs>
  , pub clear_error_tx
      : tokio::sync::mpsc::UnboundedSender<ClearErrorArgs>
  , pub kill_process_tx
      : tokio::sync::mpsc::UnboundedSender<KillProcessArgs>
}

// ===== TutorFoot (receiver side) =====

pub struct TutorFoot
{   pub ask_rx
      : tokio::sync::mpsc::UnboundedReceiver<AskArgs>
  , pub get_status_rx
      : tokio::sync::mpsc::UnboundedReceiver<GetStatusArgs>
  , pub clear_error_rx
      : tokio::sync::mpsc::UnboundedReceiver<ClearErrorArgs>
  , pub kill_process_rx
      : tokio::sync::mpsc::UnboundedReceiver<KillProcessArgs>
}

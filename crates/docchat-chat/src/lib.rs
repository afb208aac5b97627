//! Conversation layer: intent routing, prompt templates, answer generation,
//! per-namespace history and the ask flow.
pub mod generator;
pub mod history;
pub mod intent;
pub mod prompts;
pub mod service;

pub use generator::GeminiGenerator;
pub use history::InMemoryHistory;
pub use intent::{detect_intent, Intent};
pub use service::{AskRequest, AskResponse, ChatService, Citation};

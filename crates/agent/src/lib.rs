//! Conversation orchestration for the booking assistant.
//!
//! This crate owns the per-session glue between the deterministic
//! conversation core and the outside world:
//!
//! 1. **Routing** (`session`) - rate limiting, intent dispatch, chat memory
//! 2. **Completion** (`llm`) - pluggable text-completion client for general
//!    questions (OpenAI-compatible endpoints)
//! 3. **Retrieval** (`retrieval`) - document-context interface for grounded
//!    answers
//! 4. **Limits** (`rate_limit`) - per-session message/booking throttles
//!
//! The language model is strictly a response generator. Slot validation,
//! flow transitions, and persistence are deterministic decisions made by
//! `medbook-core`; nothing the model says can move the booking state
//! machine.

pub mod llm;
pub mod rate_limit;
pub mod retrieval;
pub mod session;

pub use llm::{ChatMessage, ChatRole, CompletionClient, CompletionRequest, HttpCompletionClient};
pub use rate_limit::RateLimiter;
pub use retrieval::{DocumentRetriever, NoopRetriever, RetrievedContext};
pub use session::{ChatSession, SessionDeps, SessionRegistry};

/// Health check responses.
pub mod health;
/// Server-sent event payloads.
pub mod sse;
pub mod sync;
/// Table score, penalty and saved-match responses.
pub mod table;
pub mod validation;

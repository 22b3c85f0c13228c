/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Sync message routing and persistence acknowledgments.
pub mod relay_service;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Read-only table, penalty and saved game queries.
pub mod table_service;
/// WebSocket connection and message handling service.
pub mod websocket_service;

/// Outbound event filtering and fan-out.
pub mod broadcast;
/// Command dispatch for control WebSocket clients.
pub mod commands;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Leg statistics recording.
pub mod legs;
/// Match and lobby lifecycle handling.
pub mod lifecycle;
/// Inbound push-frame routing.
pub mod router;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Statistics store supervision with reconnect backoff.
pub mod storage_supervisor;

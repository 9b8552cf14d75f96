// Adapters layer: concrete implementations for external systems (TED HTTP API, local filesystem).

pub mod http;
pub mod storage;

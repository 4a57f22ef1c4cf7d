//! Interface adapters: the JSON-over-HTTP transport

pub mod http;

//! Text backend adapters

mod http;

pub use http::HttpTextBackend;

//! HTTP transport layer shared by provider clients and readiness probes.

mod http;
mod reqwest;

pub use self::http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
pub use self::reqwest::ReqwestTransport;
pub use crate::error::TransportError;

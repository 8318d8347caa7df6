//! HTTP request/response types and the transport seam

mod request;
mod response;
mod transport;

pub use request::{build_request, BasicAuth, HttpRequest};
pub use response::HttpResponse;
pub use transport::{ReqwestTransport, Transport};

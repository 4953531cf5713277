//! Core request, response and endpoint types.

mod api_url;
mod request;
mod response;

pub use api_url::ApiUrl;
pub use request::{AUTHORIZATION, Method, Request};
pub use response::Response;

//! Mapping reqwest failures into reauth errors.

use serde::Deserialize;

use reauth_core::error::{Error, ProtocolError, TransportError};

pub(crate) fn map_reqwest(err: reqwest::Error) -> Error {
    let transport = if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else if err.is_decode() || err.is_body() {
        TransportError::Body {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    };
    Error::Transport(transport)
}

/// Error body as returned by OAuth2 token endpoints and most JSON APIs.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
}

/// Parse a non-success response into a protocol error.
pub(crate) async fn parse_error_response(response: reqwest::Response) -> ProtocolError {
    let status = response.status().as_u16();

    match response.json::<ErrorBody>().await {
        Ok(body) => ProtocolError::new(status, body.error, body.error_description.or(body.message)),
        Err(_) => ProtocolError::status(status),
    }
}

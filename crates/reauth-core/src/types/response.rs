//! Successful response returned by a transport.

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::error::{Error, TransportError};

/// A response with a success status.
///
/// Transports report non-success statuses as [`Error::Protocol`], so holding
/// a `Response` means the server accepted the request.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl Response {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns the value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as UTF-8 text, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.body).map_err(|e| {
            TransportError::Body {
                message: e.to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_json_body() {
        let response = Response::new(
            200,
            vec![("Content-Type".into(), "application/json".into())],
            r#"{"id": 7}"#,
        );
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(response.header("content-type"), Some("application/json"));
    }

    #[test]
    fn invalid_json_is_body_error() {
        let response = Response::new(200, Vec::new(), "not json");
        let err = response.json::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Body { .. })));
    }
}

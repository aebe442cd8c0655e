//! Wire models for the client-facing API.
//!
//! Every synthesized response (anything that is not an upstream relay) is an
//! [`Envelope`]:
//!
//! ```json
//! { "code": 200, "msg": "AeraCanoeV2", "time": "1732147200", "data": null }
//! ```
//!
//! `time` is unix seconds as a string. The HTTP status of an envelope response
//! equals its `code`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::utils::parse_query_int;
use crate::manifest::{Pagination, is_truthy, loose_int};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub code: u16,
    pub msg: String,
    pub time: String,
    pub data: Value,
}

impl Envelope {
    pub fn new(status: StatusCode, msg: impl Into<String>, data: Value) -> Self {
        Self {
            code: status.as_u16(),
            msg: msg.into(),
            time: unix_time(),
            data,
        }
    }

    pub fn ok(msg: impl Into<String>, data: Value) -> Self {
        Self::new(StatusCode::OK, msg, data)
    }

    pub fn error(status: StatusCode, msg: impl Into<String>) -> Self {
        Self::new(status, msg, Value::Null)
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Current unix time in whole seconds, as the envelope carries it
pub fn unix_time() -> String {
    chrono::Utc::now().timestamp().to_string()
}

/// Raw `getComponentList` query string
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// Raw `getComponentDetail` query string
#[derive(Debug, Default, Deserialize)]
pub struct DetailQuery {
    pub id: Option<String>,
}

/// Parsed `getComponentList` input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListParams {
    /// `None` when absent or unusable; always answered with 400
    pub kind: Option<i64>,
    pub pagination: Pagination,
}

impl ListParams {
    pub fn from_query(query: &ListQuery) -> Self {
        let int = |raw: &Option<String>| raw.as_deref().and_then(parse_query_int);
        Self {
            kind: int(&query.kind),
            pagination: Pagination::new(int(&query.page), int(&query.page_size)),
        }
    }

    /// An unparseable body yields no type rather than an error
    pub fn from_body(body: &[u8]) -> Self {
        let Ok(body) = serde_json::from_slice::<Value>(body) else {
            return Self {
                kind: None,
                pagination: Pagination::default(),
            };
        };

        let page_size = body.get("page_size").or_else(|| body.get("pageSize"));
        Self {
            kind: body.get("type").and_then(loose_int),
            pagination: Pagination::new(
                body.get("page").and_then(loose_int),
                page_size.and_then(loose_int),
            ),
        }
    }
}

/// Requested component id from a JSON body value; falsy or non-numeric ids count
/// as missing
pub fn requested_id(value: &Value) -> Option<i64> {
    if !is_truthy(value) {
        return None;
    }
    loose_int(value).filter(|id| *id != 0)
}

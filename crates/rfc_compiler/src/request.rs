//! HTTP request fields consumed by the classifier
//!
//! A request always carries exactly [`FIELD_COUNT`] optional fields, in the
//! positional order the compiled predictor expects on its command line.
//! Field names serialize as the capture dataset's column names; the short
//! names are accepted as aliases.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Number of positional request fields.
pub const FIELD_COUNT: usize = 8;

/// Dataset column names, in positional order.
pub const FIELD_NAMES: [&str; FIELD_COUNT] = [
    "headers_Host",
    "url",
    "method",
    "requestHeaders_Origin",
    "requestHeaders_Content_Type",
    "responseHeaders_Content_Type",
    "requestHeaders_Referer",
    "requestHeaders_Accept",
];

/// Short field names, in positional order.
pub const FIELD_ALIASES: [&str; FIELD_COUNT] = [
    "host",
    "url",
    "method",
    "origin",
    "request_content_type",
    "response_content_type",
    "referer",
    "accept",
];

/// One request to classify; any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    #[serde(rename = "headers_Host", alias = "host", default)]
    pub host: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(rename = "requestHeaders_Origin", alias = "origin", default)]
    pub origin: Option<String>,
    #[serde(
        rename = "requestHeaders_Content_Type",
        alias = "request_content_type",
        default
    )]
    pub request_content_type: Option<String>,
    #[serde(
        rename = "responseHeaders_Content_Type",
        alias = "response_content_type",
        default
    )]
    pub response_content_type: Option<String>,
    #[serde(rename = "requestHeaders_Referer", alias = "referer", default)]
    pub referer: Option<String>,
    #[serde(rename = "requestHeaders_Accept", alias = "accept", default)]
    pub accept: Option<String>,
}

impl Request {
    /// Build a request from positional values.
    pub fn from_fields(fields: [Option<String>; FIELD_COUNT]) -> Self {
        let [host, url, method, origin, request_content_type, response_content_type, referer, accept] =
            fields;
        Self {
            host,
            url,
            method,
            origin,
            request_content_type,
            response_content_type,
            referer,
            accept,
        }
    }

    /// Fields in positional order.
    pub fn fields(&self) -> [Option<&str>; FIELD_COUNT] {
        [
            self.host.as_deref(),
            self.url.as_deref(),
            self.method.as_deref(),
            self.origin.as_deref(),
            self.request_content_type.as_deref(),
            self.response_content_type.as_deref(),
            self.referer.as_deref(),
            self.accept.as_deref(),
        ]
    }

    /// Extract the request fields from a loosely typed dataset row.
    ///
    /// Column names or aliases are accepted; nulls stay absent and numbers
    /// or booleans are rendered as text. Other columns are ignored.
    pub fn from_row(row: &Map<String, Value>) -> Self {
        let mut fields: [Option<String>; FIELD_COUNT] = Default::default();
        for (i, slot) in fields.iter_mut().enumerate() {
            let value = row
                .get(FIELD_NAMES[i])
                .or_else(|| row.get(FIELD_ALIASES[i]));
            *slot = match value {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
            };
        }
        Self::from_fields(fields)
    }
}

//! Payload encoders.
//!
//! Each encoder maps a flat string mapping to a content type and a body.
//! Picking an encoder by an unknown name fails through `Format::from_str`;
//! the JSON encoder surfaces serializer errors as `ClientError::Serialization`.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use rand::Rng;
use serde::Deserialize;

use crate::error::ClientError;

/// Flat key/value payload, encoded in insertion order.
pub type FormData = IndexMap<String, String>;

/// Exclusive upper bound for generated multipart boundaries.
const BOUNDARY_LIMIT: u64 = 999_999_999_999;

/// Supported payload serializations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Urlencoded,
    Json,
    Multipart,
    Plain,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Urlencoded => "urlencoded",
            Format::Json => "json",
            Format::Multipart => "multipart",
            Format::Plain => "plain",
        }
    }

    /// Content type sent for a body in this format. Multipart bodies carry
    /// their boundary, so only `EncodedPayload::content_type` is exact there.
    pub fn content_type(self) -> &'static str {
        match self {
            Format::Urlencoded => "application/x-www-form-urlencoded",
            Format::Json => "application/json",
            Format::Multipart => "multipart/form-data",
            Format::Plain => "text/plain",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "urlencoded" => Ok(Format::Urlencoded),
            "json" => Ok(Format::Json),
            "multipart" => Ok(Format::Multipart),
            "plain" => Ok(Format::Plain),
            other => Err(ClientError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl From<Format> for String {
    fn from(format: Format) -> Self {
        format.as_str().to_string()
    }
}

/// Result of encoding a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    pub content_type: String,
    pub body: String,
}

/// Encode `data` with the given format.
pub fn encode(format: Format, data: &FormData) -> Result<EncodedPayload, ClientError> {
    match format {
        Format::Urlencoded => Ok(urlencoded(data)),
        Format::Json => json(data),
        Format::Multipart => Ok(multipart(data)),
        Format::Plain => Ok(plain(data)),
    }
}

/// `key=value` pairs joined with `&`. Everything except `A-Z a-z 0-9 - _ . ~`
/// is percent-encoded and spaces become `+`. `*` is written as `%2a`.
pub fn urlencoded(data: &FormData) -> EncodedPayload {
    let body = data
        .iter()
        .map(|(k, v)| format!("{}={}", form_escape(k), form_escape(v)))
        .collect::<Vec<_>>()
        .join("&");
    EncodedPayload {
        content_type: Format::Urlencoded.content_type().to_string(),
        body,
    }
}

fn form_escape(s: &str) -> String {
    urlencoding::encode(s).replace("%20", "+").replace("%2A", "%2a")
}

/// Compact JSON object, keys in insertion order.
pub fn json(data: &FormData) -> Result<EncodedPayload, ClientError> {
    let body = serde_json::to_string(data)?;
    Ok(EncodedPayload {
        content_type: Format::Json.content_type().to_string(),
        body,
    })
}

/// `multipart/form-data` body with a numeric boundary absent from every value.
pub fn multipart(data: &FormData) -> EncodedPayload {
    let boundary = pick_boundary(data, &mut rand::rng());

    let delimiter = format!("--{boundary}\r\n");
    let mut body = delimiter.clone();
    let parts = data
        .iter()
        .map(|(k, v)| {
            format!(
                "Content-Disposition: form-data; name=\"{}\"\r\n\r\n{v}\r\n",
                k.replace('"', "\\\"")
            )
        })
        .collect::<Vec<_>>();
    body.push_str(&parts.join(&delimiter));
    body.push_str(&format!("--{boundary}--"));

    EncodedPayload {
        content_type: format!("{}; boundary={boundary}", Format::Multipart.content_type()),
        body,
    }
}

fn pick_boundary(data: &FormData, rng: &mut impl Rng) -> String {
    loop {
        let boundary = rng.random_range(0..BOUNDARY_LIMIT).to_string();
        if !data.values().any(|v| v.contains(&boundary)) {
            return boundary;
        }
        tracing::trace!(%boundary, "multipart boundary collides with a value, regenerating");
    }
}

/// `key=value` lines joined with CRLF, unescaped.
pub fn plain(data: &FormData) -> EncodedPayload {
    let body = data
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("\r\n");
    EncodedPayload {
        content_type: Format::Plain.content_type().to_string(),
        body,
    }
}

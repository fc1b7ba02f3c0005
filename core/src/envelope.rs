//! The `{code, msg, data}` response envelope.
//!
//! # Design
//! Decoding happens in two passes. The first pass reads `code` and `msg` and
//! keeps `data` as an untyped JSON value, because error responses either omit
//! `data` or fill it with something unrelated to the expected payload. Only
//! once `code` says `SUCCESS` is `data` decoded into the caller's type.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{serde_as, DefaultOnNull};

use crate::error::{ApiError, Result};

/// Envelope code that marks a successful call.
pub const SUCCESS_CODE: &str = "SUCCESS";

/// The wrapper every endpoint returns.
///
/// A missing or null `msg` reads as empty so the `code` is never lost.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub code: String,
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub msg: String,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// Return `data` on success, the code and message otherwise.
    pub fn into_result(self) -> Result<T> {
        if self.is_success() {
            Ok(self.data)
        } else {
            Err(ApiError::Application {
                code: self.code,
                msg: self.msg,
            })
        }
    }
}

/// Decode a response body into the payload type `T`.
///
/// A body that is not an envelope fails with `MalformedResponse`. A non-success
/// code fails with `Application` without looking at `data`. A missing `data`
/// on success decodes as JSON `null`.
pub fn decode_envelope<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let raw: Envelope<Option<Value>> =
        serde_json::from_slice(body).map_err(ApiError::MalformedResponse)?;
    let data = raw.into_result()?;
    serde_json::from_value(data.unwrap_or(Value::Null)).map_err(ApiError::MalformedResponse)
}

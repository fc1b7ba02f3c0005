//! Domain DTOs for the developer user API.
//!
//! # Design
//! Request types distinguish "not set" from "set to empty": optional fields
//! are `Option` and absent values are left out of the JSON entirely, which is
//! what makes `UpdateUser` a partial update. The response type defaults every
//! field, because the console omits fields it has no value for or sends
//! them as `null`.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};

/// Account status of a user.
///
/// Closed set: an unknown status string fails to decode instead of being
/// carried around as free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Deactivated,
}

/// A user record as returned by the API.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    #[serde(alias = "Id")]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub id: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub first_name: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub last_name: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub full_name: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub alias: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub user_email: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub email_status: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub phone: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub employee_number: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub onboard_time: i64,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub nfc_cards: Vec<NfcCard>,
    pub pin_code: Option<PinCode>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub access_policy_ids: Vec<String>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub access_policies: Vec<AccessPolicy>,
    pub status: Option<UserStatus>,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NfcCard {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub id: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub token: String,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinCode {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub token: String,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessPolicy {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub id: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub name: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub resources: Vec<PolicyResource>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub schedule_id: String,
}

/// A door or door group covered by an access policy.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyResource {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub id: String,
    #[serde(rename = "type")]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub kind: String,
}

/// Request payload for creating a user. Names are always sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUser {
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onboard_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
}

impl CreateUser {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Self::default()
        }
    }
}

/// Request payload for updating a user. Only the fields present in the JSON
/// are applied; omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onboard_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
}

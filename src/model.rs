//! REST payloads exchanged with the API Manager.
//!
//! Field names follow the platform's camelCase JSON. Fields the platform may
//! omit default to empty values so lists and single objects decode alike.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Full application record as returned by `GET /applications/{id}`
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(default)]
    pub application_id: String,
    pub name: String,
    #[serde(default)]
    pub throttling_policy: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub subscription_count: i64,
    #[serde(default)]
    pub keys: Vec<ApplicationKey>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub subscription_scopes: Vec<Value>,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub hash_enabled: bool,
}

/// Summary entry in an application listing
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationInfo {
    #[serde(default)]
    pub application_id: String,
    pub name: String,
    #[serde(default)]
    pub throttling_policy: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub subscription_count: i64,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub owner: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ApplicationList {
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub list: Vec<ApplicationInfo>,
}

/// Payload for creating an application
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
    pub name: String,
    pub throttling_policy: String,
    #[serde(default)]
    pub description: String,
    pub token_type: String,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationKey {
    #[serde(default)]
    pub key_mapping_id: String,
    #[serde(default)]
    pub key_manager: String,
    #[serde(default)]
    pub consumer_key: String,
    #[serde(default)]
    pub consumer_secret: String,
    #[serde(default)]
    pub supported_grant_types: Vec<String>,
    #[serde(default)]
    pub callback_url: Option<String>,
    #[serde(default)]
    pub key_state: String,
    #[serde(default)]
    pub key_type: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub token: Option<Value>,
    #[serde(default)]
    pub additional_properties: Option<Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ApplicationKeyList {
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub list: Vec<ApplicationKey>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(default)]
    pub subscription_id: String,
    #[serde(default)]
    pub application_id: String,
    #[serde(default)]
    pub api_id: String,
    #[serde(default)]
    pub api_info: Option<Value>,
    #[serde(default)]
    pub application_info: Option<Value>,
    #[serde(default)]
    pub throttling_policy: String,
    #[serde(default)]
    pub requested_throttling_policy: Option<String>,
    #[serde(default)]
    pub status: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SubscriptionList {
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub list: Vec<Subscription>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiInfo {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub life_cycle_status: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ApiList {
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub list: Vec<ApiInfo>,
}

/// Dynamic client registration result
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientRegistration {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TokenResponse {
    pub access_token: String,
}

// src/api/types.rs
//! Request parameter records and the commands they belong to.

use crate::api::errors::ApiError;
use crate::core::geometry::Boundary;
use crate::core::indexing::kdmap::Asset;
use crate::event_engine::handler::ClientEvent;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Commands accepted at the request boundary, named as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    InsertAsset,
    RemoveAsset,
    GetAssetMap,
    GetAssetMapBoundingBoxes,
    GetAssetMapUpdates,
}

impl Command {
    pub const ALL: [Command; 5] = [
        Command::InsertAsset,
        Command::RemoveAsset,
        Command::GetAssetMap,
        Command::GetAssetMapBoundingBoxes,
        Command::GetAssetMapUpdates,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Command::InsertAsset => "insertAsset",
            Command::RemoveAsset => "removeAsset",
            Command::GetAssetMap => "getAssetMap",
            Command::GetAssetMapBoundingBoxes => "getAssetMapBoundingBoxes",
            Command::GetAssetMapUpdates => "getAssetMapUpdates",
        }
    }
}

impl FromStr for Command {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|cmd| cmd.as_str() == s)
            .ok_or_else(|| ApiError::Validation(format!("unknown command '{}'", s)))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of `insertAsset` and `removeAsset`. Both fields are required;
/// they are optional here so a missing one is reported by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetParams {
    pub asset_id: Option<String>,
    pub boundary: Option<Boundary>,
}

impl AssetParams {
    pub fn new<S: Into<String>>(asset_id: S, boundary: Boundary) -> Self {
        AssetParams { asset_id: Some(asset_id.into()), boundary: Some(boundary) }
    }

    /// The asset these parameters describe, with a well-formed boundary.
    pub fn into_asset(self, cmd: Command) -> Result<Asset, ApiError> {
        let asset_id = self
            .asset_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::Validation(format!("{}.assetId expected", cmd)))?;
        let boundary = self
            .boundary
            .ok_or_else(|| ApiError::Validation(format!("{}.boundary expected", cmd)))?;
        boundary.validate()?;
        Ok(Asset::new(asset_id, boundary))
    }
}

/// Parameters of `getAssetMapBoundingBoxes`; an absent mode means "basic".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBoxParams {
    pub mode: Option<String>,
}

/// Parameters of `getAssetMapUpdates`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatesParams {
    pub events: Option<Vec<ClientEvent>>,
}

impl UpdatesParams {
    pub fn into_events(self) -> Result<Vec<ClientEvent>, ApiError> {
        self.events
            .ok_or_else(|| ApiError::Validation("getAssetMapUpdates.events expected".to_string()))
    }
}

/// Result body of `removeAsset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveResponse {
    pub removed: bool,
}

/// Result body of `getAssetMapUpdates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatesResponse {
    pub configs: serde_json::Map<String, serde_json::Value>,
}

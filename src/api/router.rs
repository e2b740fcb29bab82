// src/api/router.rs
//! Dispatch of JSON requests carrying a `cmd` field to the service.

use crate::api::errors::ApiError;
use crate::api::service::AssetMapService;
use crate::api::types::{
    AssetParams, BoundingBoxParams, Command, RemoveResponse, UpdatesParams, UpdatesResponse,
};
use crate::core::indexing::kdmap::Removal;
use crate::core::storage::DocumentStore;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Turns request objects into service calls and results into response
/// objects. Every request gets exactly one response; failures are rendered
/// as `{ "error": code, "message": text }`.
#[derive(Debug)]
pub struct RequestRouter<S> {
    service: Arc<AssetMapService<S>>,
}

impl<S> Clone for RequestRouter<S> {
    fn clone(&self) -> Self {
        RequestRouter { service: Arc::clone(&self.service) }
    }
}

impl<S: DocumentStore> RequestRouter<S> {
    pub fn new(service: Arc<AssetMapService<S>>) -> Self {
        RequestRouter { service }
    }

    pub fn service(&self) -> &AssetMapService<S> {
        &self.service
    }

    /// Handles one request given as JSON text.
    pub async fn handle_text(&self, text: &str) -> Value {
        match serde_json::from_str::<Value>(text) {
            Ok(request) => self.handle(request).await,
            Err(e) => render_error(&ApiError::Validation(format!("request is not JSON: {}", e))),
        }
    }

    /// Handles one request object.
    pub async fn handle(&self, request: Value) -> Value {
        match self.dispatch(request).await {
            Ok(body) => body,
            Err(e) => render_error(&e),
        }
    }

    async fn dispatch(&self, request: Value) -> Result<Value, ApiError> {
        let cmd: Command = request
            .get("cmd")
            .and_then(Value::as_str)
            .ok_or_else(|| ApiError::Validation("cmd expected".to_string()))?
            .parse()?;
        debug!(%cmd, "dispatching request");

        match cmd {
            Command::InsertAsset => {
                let asset = params::<AssetParams>(cmd, request)?.into_asset(cmd)?;
                self.service.insert_asset(asset).await?;
                Ok(json!({}))
            }
            Command::RemoveAsset => {
                let asset = params::<AssetParams>(cmd, request)?.into_asset(cmd)?;
                let removal = self.service.remove_asset(&asset.asset_id, &asset.boundary).await?;
                let removed = matches!(removal, Removal::Removed { .. });
                serde_json::to_value(RemoveResponse { removed }).map_err(internal)
            }
            Command::GetAssetMap => {
                let document = self.service.get_asset_map().await;
                serde_json::to_value(document).map_err(internal)
            }
            Command::GetAssetMapBoundingBoxes => {
                let mode = params::<BoundingBoxParams>(cmd, request)?.mode;
                let boxes = self.service.get_asset_map_bounding_boxes(mode.as_deref()).await?;
                Ok(boxes.into_scene_configs()?)
            }
            Command::GetAssetMapUpdates => {
                let events = params::<UpdatesParams>(cmd, request)?.into_events()?;
                let configs = self.service.get_asset_map_updates(&events).await?;
                serde_json::to_value(UpdatesResponse { configs }).map_err(internal)
            }
        }
    }
}

fn params<T: DeserializeOwned>(cmd: Command, request: Value) -> Result<T, ApiError> {
    serde_json::from_value(request)
        .map_err(|e| ApiError::Validation(format!("{} parameters: {}", cmd, e)))
}

fn internal(e: serde_json::Error) -> ApiError {
    ApiError::Internal(format!("response serialization failed: {}", e))
}

fn render_error(err: &ApiError) -> Value {
    let response = err.to_response();
    if matches!(err, ApiError::Persistence(_) | ApiError::Internal(_)) {
        warn!(code = response.error, message = %response.message, "request failed");
    } else {
        debug!(code = response.error, message = %response.message, "request rejected");
    }
    json!({ "error": response.error, "message": response.message })
}

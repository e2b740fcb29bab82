// src/api/mod.rs
//! Request boundary of the asset map: the service owning the map, the
//! command router in front of it, and their parameter and error types.

pub mod errors;
pub mod router;
pub mod service;
pub mod types;

pub use errors::{ApiError, ErrorResponse};
pub use router::RequestRouter;
pub use service::AssetMapService;
pub use types::{AssetParams, BoundingBoxParams, Command, RemoveResponse, UpdatesParams, UpdatesResponse};

// src/event_engine/handler/mod.rs

// Handling of client-reported boundary-state changes:
// - "types.rs": event records, the update context and result type
// - "core.rs": dispatch of events and batches to processors
// - "processors.rs": the per-tag processors
// - "delivery.rs": the asset delivery collaborator consulted for `near`

pub mod core;
pub mod delivery;
pub mod processors;
pub mod types;

pub use self::core::{process_batch, process_event};
pub use self::delivery::{AssetDelivery, NoDelivery, ResidentAssetDelivery};
pub use self::processors::Processor;
pub use self::types::{ClientEvent, EventKind, EventResult, UpdateContext};

// src/event_engine/mod.rs

//! Intake of client boundary-state events.

pub mod handler;

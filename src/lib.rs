//! Challenge board: tracks startup engagements, their actions, timeline and
//! contacts, and ranks them by urgency.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod models;

// dockmon-api: Async Rust client for the dockmon container monitor API

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

mod containers;
mod images;
mod settings;
mod status;

pub use client::MonitorClient;
pub use error::Error;
pub use models::{
    EntityMeta, EntityStatus, HealthReport, MASKED_API_KEY, PruneReport, Settings, SettingsUpdate,
    StatusSnapshot, UnusedImage, UnusedImages, UpdateOutcome, UpdateResponse,
};
pub use transport::{TlsMode, TransportConfig};

//! Core library for the `gdash` dashboard client.
//!
//! This crate defines:
//! - Configuration & session handling
//! - Typed clients for the weather backend and the public character API
//! - The insight correlator: city matching, selection and polling
//! - The dashboard driver that ties selection state to displayed insights
//!
//! It is used by `gdash-cli`, but can also be reused by other binaries or
//! services.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod insight;
pub mod model;
pub mod poller;
pub mod session;

pub use api::{ApiClient, PeopleClient, WeatherBackend};
pub use config::Config;
pub use dashboard::{Dashboard, GenerateOutcome};
pub use error::{ApiError, ApiResult};
pub use model::{
    AuthResponse, AvatarFile, ExportBlob, Page, Person, RegisterPayload, User, WeatherInsight,
    WeatherLog,
};
pub use poller::{LatestInsight, poll_for_new_insight};
pub use session::{Session, SessionStore};

//! OpenAPI documentation aggregator.
//!
//! Collects all `#[utoipa::path]`-annotated handlers and `ToSchema`-derived
//! types into a single OpenAPI 3.1 spec, served via Scalar UI at `/docs`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "jobcast API",
        version = "0.1.0",
        description = "Job-feed watcher: polls source categories, dedups and ranks postings, and fans out updates over SSE.",
    ),
    tags(
        (name = "Health", description = "Server readiness and version"),
        (name = "Bot", description = "Watcher lifecycle control and status"),
        (name = "Jobs", description = "Current posting snapshot and read-state updates"),
        (name = "Settings", description = "Watch configuration reads and live updates"),
        (name = "Events", description = "Server-sent event stream of snapshots and new postings"),
    ),
    paths(
        // Health
        crate::api::health::health,
        // Bot
        crate::api::control::status,
        crate::api::control::bot_start,
        crate::api::control::bot_stop,
        crate::api::control::bot_pause,
        crate::api::control::bot_resume,
        // Jobs
        crate::api::jobs::jobs_list,
        crate::api::jobs::jobs_mark_read,
        crate::api::jobs::jobs_mark_all_read,
        // Settings
        crate::api::settings::settings_get,
        crate::api::settings::settings_update,
        // Events
        crate::api::stream::events,
    ),
    components(schemas(
        // Shared
        crate::api::ErrorResponse,
        crate::api::AckResponse,
        // Health
        crate::api::health::HealthResponse,
        // Jobs
        crate::api::jobs::JobsResponse,
        crate::api::jobs::ReadResponse,
        jobcast_core::job::Job,
        jobcast_core::job::JobView,
        jobcast_core::job::JobPrice,
        jobcast_core::job::PriceKind,
        jobcast_core::job::Client,
        // Settings
        jobcast_core::config::WatchConfig,
        jobcast_core::config::SettingsUpdate,
        // Status
        jobcast_pipeline::status::BotStatus,
        jobcast_pipeline::status::BotState,
        jobcast_pipeline::status::StatusEvent,
        jobcast_pipeline::hub::HubStats,
    ))
)]
pub struct ApiDoc;

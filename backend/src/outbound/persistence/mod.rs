//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain's outbound ports, backed by
//! PostgreSQL via `diesel-async` and `bb8` connection pooling.
//!
//! The adapters are thin: they translate between Diesel row structs and
//! domain types and map database failures into port error variants. Row
//! structs (`models.rs`) and table definitions (`schema.rs`) never leave
//! this module.

mod diesel_achievement_repository;
mod diesel_badge_repository;
mod diesel_capture_repository;
mod diesel_score_ledger;
mod diesel_scoreboard_query;
mod migrate;
mod models;
mod pool;
mod schema;

pub use diesel_achievement_repository::DieselAchievementRepository;
pub use diesel_badge_repository::DieselBadgeRepository;
pub use diesel_capture_repository::DieselCaptureRepository;
pub use diesel_score_ledger::DieselScoreLedger;
pub use diesel_scoreboard_query::DieselScoreboardQuery;
pub use migrate::{run_pending_migrations, MigrationError};
pub use pool::{DbPool, PoolConfig, PoolError};

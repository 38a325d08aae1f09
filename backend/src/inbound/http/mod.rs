//! HTTP inbound adapter exposing the badge and scoreboard REST endpoints.

pub mod badge;
pub mod captures;
pub mod error;
pub mod health;
pub mod scoreboards;
pub mod state;
#[cfg(test)]
pub(crate) mod test_support;

pub use error::ApiResult;
pub use state::HttpState;

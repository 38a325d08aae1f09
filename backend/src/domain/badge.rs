//! Badge data model.
//!
//! A badge is a physical token carrying a secure-element chip. It is
//! identified by a MAC-style address and bound to exactly one player. The
//! shared secret is set the first time the badge authenticates (badges may
//! ship, or be hard reset, with a blank secret) and is never overwritten
//! afterwards while non-blank.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::UserId;

/// Validation errors returned by the badge value constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BadgeValidationError {
    /// MAC address is not in IEEE 802 `XX-XX-XX-XX-XX-XX` form.
    #[error("The MAC address does not appear to be in the correct format.")]
    MalformedMacAddress,
    /// Secret is not exactly 64 lowercase hex characters.
    #[error("The badge secret does not appear to be in the correct format.")]
    MalformedSecret,
}

static MAC_ADDRESS_RE: OnceLock<Regex> = OnceLock::new();
static BADGE_SECRET_RE: OnceLock<Regex> = OnceLock::new();

fn mac_address_regex() -> &'static Regex {
    MAC_ADDRESS_RE.get_or_init(|| {
        Regex::new("^([0-9A-F]{2}-){5}[0-9A-F]{2}$")
            .unwrap_or_else(|error| panic!("MAC address regex failed to compile: {error}"))
    })
}

fn badge_secret_regex() -> &'static Regex {
    BADGE_SECRET_RE.get_or_init(|| {
        Regex::new("^[0-9a-f]{64}$")
            .unwrap_or_else(|error| panic!("badge secret regex failed to compile: {error}"))
    })
}

/// Badge hardware address in IEEE 802 format, e.g. `12-34-56-78-90-AB`.
///
/// The canonical form is uppercase hyphen-separated hex octets; anything
/// else is rejected rather than normalised, since badges always submit the
/// canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress(String);

impl MacAddress {
    /// Validate and construct a [`MacAddress`].
    pub fn new(value: impl Into<String>) -> Result<Self, BadgeValidationError> {
        let value = value.into();
        if !mac_address_regex().is_match(&value) {
            return Err(BadgeValidationError::MalformedMacAddress);
        }
        Ok(Self(value))
    }

    /// Borrow the canonical string form.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for MacAddress {
    type Error = BadgeValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MacAddress> for String {
    fn from(value: MacAddress) -> Self {
        value.0
    }
}

/// Badge shared secret: 64 lowercase hex characters.
///
/// Comparison is deliberately constant time. The `Debug` impl redacts the
/// value so secrets never reach logs.
#[derive(Clone, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
pub struct BadgeSecret(String);

impl BadgeSecret {
    /// Validate and construct a [`BadgeSecret`].
    pub fn new(value: impl Into<String>) -> Result<Self, BadgeValidationError> {
        let value = value.into();
        if !badge_secret_regex().is_match(&value) {
            return Err(BadgeValidationError::MalformedSecret);
        }
        Ok(Self(value))
    }

    /// Borrow the secret material.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Constant-time equality against another secret.
    pub fn matches(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl fmt::Debug for BadgeSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BadgeSecret(..)")
    }
}

impl PartialEq for BadgeSecret {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other)
    }
}

impl Eq for BadgeSecret {}

impl TryFrom<String> for BadgeSecret {
    type Error = BadgeValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BadgeSecret> for String {
    fn from(value: BadgeSecret) -> Self {
        value.0
    }
}

/// Stable badge identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BadgeId(Uuid);

impl BadgeId {
    /// Wrap an existing UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for BadgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A physical badge bound to a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    /// Stable identifier.
    pub id: BadgeId,
    /// Hardware address, unique across all badges.
    pub mac_address: MacAddress,
    /// Owning player.
    pub user_id: UserId,
    /// Shared secret; `None` when blank (fresh or hard-reset badge).
    pub secret: Option<BadgeSecret>,
    /// Disabled badges cannot capture locations.
    pub is_enabled: bool,
}

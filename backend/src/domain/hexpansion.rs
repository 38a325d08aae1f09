//! Hexpansion data model.
//!
//! A hexpansion is the expansion board installed at a capturable location.
//! It carries an ATSHA204 secure element whose 72-bit serial number is
//! transmitted by badges as a 128-bit integer.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// ATSHA204 chip serial number, carried on the wire as a 128-bit integer.
///
/// Only the low 72 bits are meaningful to the chip; storage keeps the full
/// 128-bit value (as a UUID column) so the wire value round-trips exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexpansionSerial(u128);

impl HexpansionSerial {
    /// Wrap the wire integer.
    pub const fn from_u128(value: u128) -> Self {
        Self(value)
    }

    /// Recover the serial from its storage form.
    pub const fn from_uuid(value: Uuid) -> Self {
        Self(value.as_u128())
    }

    /// The wire integer.
    pub const fn as_u128(&self) -> u128 {
        self.0
    }

    /// Storage form: the 128-bit value as a UUID.
    pub const fn as_uuid(&self) -> Uuid {
        Uuid::from_u128(self.0)
    }

    /// The 9 little-endian bytes fed to the key diversification algorithm.
    ///
    /// This mirrors the chip protocol: the serial is truncated to 9 bytes,
    /// least significant first.
    pub fn chip_bytes(&self) -> [u8; 9] {
        let le = self.0.to_le_bytes();
        let mut out = [0u8; 9];
        out.copy_from_slice(&le[..9]);
        out
    }
}

impl fmt::Display for HexpansionSerial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Stable hexpansion identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexpansionId(Uuid);

impl HexpansionId {
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

impl fmt::Display for HexpansionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A physical hexpansion device.
///
/// Immutable once created except for its (externally managed) link to a
/// location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hexpansion {
    /// Stable identifier.
    pub id: HexpansionId,
    /// Identifier written on the device for humans, e.g. `HX0042`.
    pub human_identifier: String,
    /// Secure element serial number, unique across devices.
    pub serial_number: HexpansionSerial,
}

//! ATSHA204 challenge-response emulation.
//!
//! Badges prove physical presence by asking the hexpansion's secure element
//! to MAC a nonce with a diversified key. The server holds the root key and
//! recomputes the expected response. The byte layouts below mirror the
//! chip's internal hash inputs exactly; every opcode, marker and padding
//! length is a hard contract with the hardware. Any deviation yields a
//! different digest and verification fails silently with a wrong key rather
//! than an error.
//!
//! Slot 0 is reserved for the capture proof.

use std::fmt;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Errors raised when parsing the configured root key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RootKeyError {
    /// Key material is not valid hex.
    #[error("root key must be hex encoded")]
    NotHex,
    /// Key material is not exactly 32 bytes.
    #[error("root key must be exactly 32 bytes, got {actual}")]
    WrongLength {
        /// Decoded length in bytes.
        actual: usize,
    },
}

/// The 32-byte root key shared with the badge fleet.
///
/// `Debug` and `Display` are redacted; the key only ever leaves this type
/// as hash input.
#[derive(Clone, PartialEq, Eq)]
pub struct RootKey([u8; 32]);

impl RootKey {
    /// Wrap raw key material.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a hex-encoded root key, as delivered via configuration.
    pub fn from_hex(value: &str) -> Result<Self, RootKeyError> {
        let decoded = hex::decode(value.trim()).map_err(|_| RootKeyError::NotHex)?;
        let bytes: [u8; 32] = decoded
            .as_slice()
            .try_into()
            .map_err(|_| RootKeyError::WrongLength {
                actual: decoded.len(),
            })?;
        Ok(Self(bytes))
    }

    fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for RootKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RootKey(..)")
    }
}

/// Derive the per-device diversified key for `target_slot`.
///
/// Hash input layout (SHA-256 over the concatenation):
///
/// ```text
/// root_key (32) | 0x1C 0x04 | target_slot LE (2) | 0xEE 0x01 0x23
/// | zeros (25) | chip_serial | zeros (23)
/// ```
///
/// The trailing pad is a fixed 23 bytes regardless of the serial length,
/// mirroring the provisioning tool this must interoperate with.
pub fn derive_diversified_key(chip_serial: &[u8], root_key: &RootKey, target_slot: u16) -> [u8; 32] {
    let slot = target_slot.to_le_bytes();

    let mut hasher = Sha256::new();
    hasher.update(root_key.as_bytes());
    hasher.update([0x1C, 0x04, slot[0], slot[1]]);
    hasher.update([0xEE, 0x01, 0x23]);
    hasher.update([0x00; 25]);
    hasher.update(chip_serial);
    hasher.update([0x00; 23]);
    hasher.finalize().into()
}

/// Compute the response the badge's chip would produce for this capture.
///
/// Reproduces the chip's Nonce then MAC command sequence:
/// 1. the challenge is the ASCII MAC address padded with 3 zero bytes;
/// 2. `tempkey = SHA-256(nonce | challenge | 0x16 0x01 0x00)`;
/// 3. the final MAC hashes the diversified key, tempkey and a fixed-layout
///    "other data" block carrying the MAC opcode (0x08), mode (0x01) and
///    slot, interleaved with the chip's serial markers (0xEE, 0x01 0x23).
pub fn compute_badge_response(
    chip_serial: &[u8],
    nonce: &[u8; 32],
    badge_mac: &str,
    root_key: &RootKey,
    slot: u8,
) -> [u8; 32] {
    let diversified_key = derive_diversified_key(chip_serial, root_key, 0x00);

    let mut challenge = badge_mac.as_bytes().to_vec();
    challenge.extend_from_slice(&[0x00; 3]);

    let mut nonce_hasher = Sha256::new();
    nonce_hasher.update(nonce);
    nonce_hasher.update(&challenge);
    nonce_hasher.update([0x16, 0x01, 0x00]);
    let tempkey: [u8; 32] = nonce_hasher.finalize().into();

    let otherdata: [u8; 13] = [
        0x08, 0x01, slot, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];

    let mut mac_hasher = Sha256::new();
    mac_hasher.update(diversified_key);
    mac_hasher.update(tempkey);
    mac_hasher.update(&otherdata[0..4]);
    mac_hasher.update([0x00; 8]);
    mac_hasher.update(&otherdata[4..7]);
    mac_hasher.update([0xEE]);
    mac_hasher.update(&otherdata[7..11]);
    mac_hasher.update([0x01, 0x23]);
    mac_hasher.update(&otherdata[11..13]);
    mac_hasher.finalize().into()
}

/// Constant-time comparison of an expected response against the submitted
/// hex-encoded proof.
///
/// A mismatch is an expected outcome, not an error; malformed hex simply
/// fails the comparison.
pub fn verify_badge_response(expected: &[u8; 32], submitted_hex: &str) -> bool {
    let expected_hex = hex::encode(expected);
    expected_hex
        .as_bytes()
        .ct_eq(submitted_hex.as_bytes())
        .into()
}

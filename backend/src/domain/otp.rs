//! Badge one-time password issuance.
//!
//! Badges log their player into the web UI by fetching a short-lived code
//! over the authenticated badge API. The code is a standard RFC 6238 TOTP
//! (SHA-1, 30 second step, 6 digits) whose secret is the raw bytes of the
//! badge MAC address concatenated with a server-side secret. The secret is
//! deliberately not base32: both ends just feed bytes to HMAC.

use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Time step width in seconds.
const STEP_SECS: u64 = 30;
/// Number of code digits.
const DIGITS: u32 = 6;

/// TOTP generator bound to a single badge.
#[derive(Clone)]
pub struct BadgeTotp {
    secret: Vec<u8>,
}

impl BadgeTotp {
    /// Build a generator for `mac_address` using the server OTP secret.
    pub fn new(mac_address: &str, server_secret: &str) -> Self {
        let mut secret = Vec::with_capacity(mac_address.len() + server_secret.len());
        secret.extend_from_slice(mac_address.as_bytes());
        secret.extend_from_slice(server_secret.as_bytes());
        Self { secret }
    }

    /// The current 6-digit code.
    pub fn now(&self) -> String {
        let unix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.at_counter(unix / STEP_SECS)
    }

    /// The code for an explicit time-step counter.
    fn at_counter(&self, counter: u64) -> String {
        #[allow(clippy::expect_used)]
        let mut mac = HmacSha1::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(&counter.to_be_bytes());
        let digest = mac.finalize().into_bytes();

        // RFC 4226 dynamic truncation.
        let offset = usize::from(digest[19] & 0x0f);
        let binary = (u32::from(digest[offset]) & 0x7f) << 24
            | u32::from(digest[offset + 1]) << 16
            | u32::from(digest[offset + 2]) << 8
            | u32::from(digest[offset + 3]);
        let code = binary % 10u32.pow(DIGITS);
        format!("{code:06}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn codes_are_six_digits() {
        let totp = BadgeTotp::new("DC-54-75-D8-6E-88", "server-secret");
        let code = totp.at_counter(57_433_299);
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[rstest]
    fn codes_differ_between_badges_and_steps() {
        let a = BadgeTotp::new("DC-54-75-D8-6E-88", "server-secret");
        let b = BadgeTotp::new("AA-AA-AA-AA-AA-AA", "server-secret");
        assert_ne!(a.at_counter(1), b.at_counter(1));
        assert_ne!(a.at_counter(1), a.at_counter(2));
    }

    #[rstest]
    fn rfc4226_appendix_d_vector() {
        // HOTP test secret "12345678901234567890", counter 0 -> 755224.
        let totp = BadgeTotp::new("1234567890", "1234567890");
        assert_eq!(totp.at_counter(0), "755224");
    }
}

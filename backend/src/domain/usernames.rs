//! Random username generation for auto-provisioned players.
//!
//! Unknown badges get an `adjective-noun` account name. Collisions are
//! unlikely at event scale, so the caller retries with a fresh draw instead
//! of locking anything.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::user::{UserValidationError, Username};

const ADJECTIVES: &[&str] = &[
    "ancient", "brave", "bright", "clever", "crimson", "curious", "daring", "dashing", "eager",
    "electric", "fearless", "fuzzy", "gentle", "gleaming", "hidden", "jolly", "keen", "lucky",
    "mellow", "mighty", "nimble", "plucky", "quiet", "rapid", "rustic", "shiny", "silent",
    "sneaky", "spritely", "stealthy", "sturdy", "swift", "tidy", "wandering", "wily", "zesty",
];

const NOUNS: &[&str] = &[
    "antenna", "badger", "beacon", "bunting", "capacitor", "cipher", "compass", "crowbar",
    "duck", "enigma", "ferret", "flag", "gateway", "hedgehog", "hexpansion", "kestrel",
    "lantern", "magpie", "marmot", "otter", "packet", "pigeon", "pylon", "relay", "resistor",
    "robin", "rocket", "satellite", "signal", "sparrow", "spanner", "stoat", "tent", "torch",
    "weasel", "wren",
];

/// Draw a fresh candidate username.
///
/// Uniqueness is not checked here; the provisioning flow retries on a
/// storage-level collision.
pub fn generate_username() -> Result<Username, UserValidationError> {
    let mut rng = SmallRng::from_entropy();
    draw(&mut rng)
}

fn draw(rng: &mut SmallRng) -> Result<Username, UserValidationError> {
    // Both lists are non-empty constants; choose cannot fail.
    let adjective = ADJECTIVES.choose(rng).copied().unwrap_or("curious");
    let noun = NOUNS.choose(rng).copied().unwrap_or("badger");
    Username::new(format!("{adjective}-{noun}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn generated_usernames_are_valid() {
        for _ in 0..64 {
            let name = generate_username().expect("valid username");
            let (adjective, noun) = name
                .as_str()
                .split_once('-')
                .expect("adjective-noun shape");
            assert!(ADJECTIVES.contains(&adjective));
            assert!(NOUNS.contains(&noun));
        }
    }

    #[rstest]
    fn seeded_draws_are_deterministic() {
        let mut a = SmallRng::seed_from_u64(42);
        let mut b = SmallRng::seed_from_u64(42);
        assert_eq!(draw(&mut a).expect("draw"), draw(&mut b).expect("draw"));
    }
}

//! Badge credential checking and player auto-provisioning.
//!
//! Badges authenticate with their MAC address and a 64-hex-character shared
//! secret. Three cases fall out of a credential check:
//!
//! 1. Known badge, matching secret: authenticate the owning player.
//! 2. Known badge, blank stored secret: adopt the submitted secret (fresh
//!    or hard-reset badges bootstrap themselves on first contact), then
//!    authenticate.
//! 3. Unknown badge: provision a brand new player with a generated
//!    `adjective-noun` username and bind the badge to them.
//!
//! A known badge with a non-matching secret is the only rejection, and the
//! failure message never reveals which check failed.

use std::sync::Arc;

use tracing::{info, warn};

use super::badge::{Badge, BadgeSecret, MacAddress};
use super::error::Error;
use super::ports::{BadgePersistenceError, BadgeRepository};
use super::user::User;
use super::usernames::generate_username;

/// How many fresh username draws to attempt before giving up on
/// provisioning. Collisions are rare; exhausting this means the generator
/// pool is effectively full.
const USERNAME_ATTEMPTS: usize = 16;

/// Outcome of a successful credential check.
#[derive(Debug, Clone)]
pub enum BadgeCredentials {
    /// The badge and player already existed.
    Existing {
        /// The authenticated badge.
        badge: Badge,
        /// Its owning player.
        user: User,
    },
    /// A new player was provisioned for an unknown badge.
    Provisioned {
        /// The freshly created badge.
        badge: Badge,
        /// The freshly created player.
        user: User,
    },
}

impl BadgeCredentials {
    /// The authenticated badge, however it was obtained.
    pub fn badge(&self) -> &Badge {
        match self {
            Self::Existing { badge, .. } | Self::Provisioned { badge, .. } => badge,
        }
    }

    /// The authenticated player, however they were obtained.
    pub fn user(&self) -> &User {
        match self {
            Self::Existing { user, .. } | Self::Provisioned { user, .. } => user,
        }
    }

    /// Whether this check created a new player.
    pub fn is_provisioned(&self) -> bool {
        matches!(self, Self::Provisioned { .. })
    }
}

/// Gateway service authenticating badges and provisioning players.
pub struct BadgeAuthService {
    repository: Arc<dyn BadgeRepository>,
}

impl BadgeAuthService {
    /// Build the service over its persistence port.
    pub fn new(repository: Arc<dyn BadgeRepository>) -> Self {
        Self { repository }
    }

    /// Check badge credentials, binding or provisioning as required.
    pub async fn check_badge_credentials(
        &self,
        mac_address: &MacAddress,
        secret: &BadgeSecret,
    ) -> Result<BadgeCredentials, Error> {
        match self
            .repository
            .find_by_mac(mac_address)
            .await
            .map_err(map_badge_error)?
        {
            Some((badge, user)) => self.check_existing(badge, user, secret).await,
            None => self.provision(mac_address, secret).await,
        }
    }

    async fn check_existing(
        &self,
        mut badge: Badge,
        user: User,
        submitted: &BadgeSecret,
    ) -> Result<BadgeCredentials, Error> {
        if !badge.is_enabled {
            warn!(mac_address = %badge.mac_address, "rejected disabled badge");
            return Err(Error::authentication_failed());
        }

        match badge.secret.as_ref() {
            None => {
                // First contact after manufacture or a hard reset: the badge
                // keeps whatever secret it presents now.
                self.repository
                    .bind_secret(badge.id, submitted)
                    .await
                    .map_err(map_badge_error)?;
                info!(mac_address = %badge.mac_address, "bound secret to blank badge");
                badge.secret = Some(submitted.clone());
                Ok(BadgeCredentials::Existing { badge, user })
            }
            Some(stored) if stored.matches(submitted) => {
                Ok(BadgeCredentials::Existing { badge, user })
            }
            Some(_) => Err(Error::authentication_failed()),
        }
    }

    async fn provision(
        &self,
        mac_address: &MacAddress,
        secret: &BadgeSecret,
    ) -> Result<BadgeCredentials, Error> {
        for _ in 0..USERNAME_ATTEMPTS {
            let username =
                generate_username().map_err(|err| Error::internal(err.to_string()))?;
            let user = User::provisioned(username).map_err(|err| Error::internal(err.to_string()))?;
            match self
                .repository
                .create_badge_and_user(mac_address, secret, &user)
                .await
            {
                Ok(badge) => {
                    info!(
                        mac_address = %mac_address,
                        username = %user.username,
                        "provisioned new player for unknown badge"
                    );
                    return Ok(BadgeCredentials::Provisioned { badge, user });
                }
                Err(BadgePersistenceError::UsernameTaken) => continue,
                Err(err) => return Err(map_badge_error(err)),
            }
        }
        Err(Error::internal(
            "could not find an unused username for provisioning",
        ))
    }
}

fn map_badge_error(err: BadgePersistenceError) -> Error {
    match err {
        BadgePersistenceError::Connection { message } => Error::service_unavailable(message),
        BadgePersistenceError::Query { message } => Error::internal(message),
        // Callers handle collisions via retry; reaching here is a logic slip.
        BadgePersistenceError::UsernameTaken => Error::internal("unexpected username collision"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use rstest::rstest;

    use super::*;
    use crate::domain::badge::BadgeId;
    use crate::domain::error::ErrorCode;

    #[derive(Default)]
    struct StubBadgeRepository {
        badge: Mutex<Option<(Badge, User)>>,
        bound_secrets: Mutex<Vec<(BadgeId, BadgeSecret)>>,
        taken_usernames: Mutex<usize>,
        fail_with: Option<BadgePersistenceError>,
    }

    #[async_trait]
    impl BadgeRepository for StubBadgeRepository {
        async fn find_by_mac(
            &self,
            mac_address: &MacAddress,
        ) -> Result<Option<(Badge, User)>, BadgePersistenceError> {
            if let Some(err) = &self.fail_with {
                return Err(err.clone());
            }
            let stored = self.badge.lock().expect("lock").clone();
            Ok(stored.filter(|(badge, _)| badge.mac_address == *mac_address))
        }

        async fn bind_secret(
            &self,
            badge_id: BadgeId,
            secret: &BadgeSecret,
        ) -> Result<(), BadgePersistenceError> {
            self.bound_secrets
                .lock()
                .expect("lock")
                .push((badge_id, secret.clone()));
            Ok(())
        }

        async fn create_badge_and_user(
            &self,
            mac_address: &MacAddress,
            secret: &BadgeSecret,
            user: &User,
        ) -> Result<Badge, BadgePersistenceError> {
            let mut taken = self.taken_usernames.lock().expect("lock");
            if *taken > 0 {
                *taken -= 1;
                return Err(BadgePersistenceError::UsernameTaken);
            }
            let badge = Badge {
                id: BadgeId::random(),
                mac_address: mac_address.clone(),
                user_id: user.id,
                secret: Some(secret.clone()),
                is_enabled: true,
            };
            *self.badge.lock().expect("lock") = Some((badge.clone(), user.clone()));
            Ok(badge)
        }
    }

    fn mac() -> MacAddress {
        MacAddress::new("12-34-56-78-90-AB").expect("valid MAC")
    }

    fn secret(fill: char) -> BadgeSecret {
        BadgeSecret::new(fill.to_string().repeat(64)).expect("valid secret")
    }

    fn existing_badge(stored_secret: Option<BadgeSecret>, enabled: bool) -> (Badge, User) {
        let user = User::provisioned(
            crate::domain::user::Username::new("resident-owl").expect("valid username"),
        )
        .expect("valid user");
        let badge = Badge {
            id: BadgeId::random(),
            mac_address: mac(),
            user_id: user.id,
            secret: stored_secret,
            is_enabled: enabled,
        };
        (badge, user)
    }

    #[rstest]
    #[tokio::test]
    async fn matching_secret_authenticates() {
        let repo = Arc::new(StubBadgeRepository::default());
        *repo.badge.lock().expect("lock") = Some(existing_badge(Some(secret('a')), true));
        let service = BadgeAuthService::new(repo);

        let creds = service
            .check_badge_credentials(&mac(), &secret('a'))
            .await
            .expect("authenticated");
        assert!(!creds.is_provisioned());
        assert_eq!(creds.user().username.as_str(), "resident-owl");
    }

    #[rstest]
    #[tokio::test]
    async fn wrong_secret_is_rejected_with_generic_message() {
        let repo = Arc::new(StubBadgeRepository::default());
        *repo.badge.lock().expect("lock") = Some(existing_badge(Some(secret('a')), true));
        let service = BadgeAuthService::new(repo);

        let err = service
            .check_badge_credentials(&mac(), &secret('b'))
            .await
            .expect_err("rejected");
        assert_eq!(err.code(), ErrorCode::AuthenticationFailed);
        assert_eq!(err.message(), "Incorrect authentication credentials.");
    }

    #[rstest]
    #[tokio::test]
    async fn blank_badge_adopts_submitted_secret() {
        let repo = Arc::new(StubBadgeRepository::default());
        *repo.badge.lock().expect("lock") = Some(existing_badge(None, true));
        let service = BadgeAuthService::new(Arc::clone(&repo) as Arc<dyn BadgeRepository>);

        let creds = service
            .check_badge_credentials(&mac(), &secret('c'))
            .await
            .expect("authenticated");
        assert!(!creds.is_provisioned());
        assert_eq!(creds.badge().secret, Some(secret('c')));

        let bound = repo.bound_secrets.lock().expect("lock");
        assert_eq!(bound.len(), 1);
        assert!(bound[0].1.matches(&secret('c')));
    }

    #[rstest]
    #[tokio::test]
    async fn disabled_badge_is_rejected() {
        let repo = Arc::new(StubBadgeRepository::default());
        *repo.badge.lock().expect("lock") = Some(existing_badge(Some(secret('a')), false));
        let service = BadgeAuthService::new(repo);

        let err = service
            .check_badge_credentials(&mac(), &secret('a'))
            .await
            .expect_err("rejected");
        assert_eq!(err.code(), ErrorCode::AuthenticationFailed);
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_badge_provisions_a_player() {
        let repo = Arc::new(StubBadgeRepository::default());
        let service = BadgeAuthService::new(Arc::clone(&repo) as Arc<dyn BadgeRepository>);

        let creds = service
            .check_badge_credentials(&mac(), &secret('d'))
            .await
            .expect("provisioned");
        assert!(creds.is_provisioned());
        // adjective-noun and display name mirror each other.
        assert!(creds.user().username.as_str().contains('-'));
        assert_eq!(
            creds.user().display_name.as_str(),
            creds.user().username.as_str()
        );
    }

    #[rstest]
    #[tokio::test]
    async fn username_collisions_are_retried() {
        let repo = Arc::new(StubBadgeRepository::default());
        *repo.taken_usernames.lock().expect("lock") = 3;
        let service = BadgeAuthService::new(Arc::clone(&repo) as Arc<dyn BadgeRepository>);

        let creds = service
            .check_badge_credentials(&mac(), &secret('e'))
            .await
            .expect("provisioned after retries");
        assert!(creds.is_provisioned());
    }

    #[rstest]
    #[tokio::test]
    async fn connection_failures_surface_as_service_unavailable() {
        let repo = Arc::new(StubBadgeRepository {
            fail_with: Some(BadgePersistenceError::connection("pool exhausted")),
            ..StubBadgeRepository::default()
        });
        let service = BadgeAuthService::new(repo);

        let err = service
            .check_badge_credentials(&mac(), &secret('a'))
            .await
            .expect_err("unavailable");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }
}

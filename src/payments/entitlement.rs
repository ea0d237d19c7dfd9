use axum::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo::User;
use crate::payments::repo;

/// Whether a user currently holds active premium access.
///
/// Injected as a capability rather than checked inline so alternate sources
/// (trial, subscription, admin override) compose without branching inside
/// the planner.
#[async_trait]
pub trait EntitlementSource: Send + Sync {
    async fn is_active(&self, user_id: Uuid, now: OffsetDateTime) -> anyhow::Result<bool>;
}

/// Entitlements derived from stored state: a paid, unexpired payment wins;
/// otherwise the profile-level premium flag with its expiry.
pub struct StoredEntitlements {
    db: PgPool,
}

impl StoredEntitlements {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Profile-flag check, split out for testability.
pub fn profile_premium_active(
    premium: bool,
    premium_until: Option<OffsetDateTime>,
    now: OffsetDateTime,
) -> bool {
    premium && premium_until.map(|until| until > now).unwrap_or(false)
}

#[async_trait]
impl EntitlementSource for StoredEntitlements {
    async fn is_active(&self, user_id: Uuid, now: OffsetDateTime) -> anyhow::Result<bool> {
        if repo::has_active_paid(&self.db, user_id, now).await? {
            return Ok(true);
        }
        let Some(user) = User::find_by_id(&self.db, user_id).await? else {
            return Ok(false);
        };
        Ok(profile_premium_active(user.premium, user.premium_until, now))
    }
}

/// Grants everything; for tests.
pub struct AlwaysEntitled;

#[async_trait]
impl EntitlementSource for AlwaysEntitled {
    async fn is_active(&self, _user_id: Uuid, _now: OffsetDateTime) -> anyhow::Result<bool> {
        Ok(true)
    }
}

/// Grants nothing; for tests.
pub struct NeverEntitled;

#[async_trait]
impl EntitlementSource for NeverEntitled {
    async fn is_active(&self, _user_id: Uuid, _now: OffsetDateTime) -> anyhow::Result<bool> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn profile_flag_requires_unexpired_date() {
        let now = datetime!(2025-06-01 00:00 UTC);
        let future = Some(datetime!(2025-07-01 00:00 UTC));
        let past = Some(datetime!(2025-05-01 00:00 UTC));

        assert!(profile_premium_active(true, future, now));
        assert!(!profile_premium_active(true, past, now));
        assert!(!profile_premium_active(true, None, now));
        assert!(!profile_premium_active(false, future, now));
    }
}

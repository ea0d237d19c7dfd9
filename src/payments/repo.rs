use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::pagination::PageQuery;

/// Premium package prices, VND. Pupils and students get the reduced rate.
pub const PREMIUM_PRICE_STANDARD: i64 = 29_000;
pub const PREMIUM_PRICE_STUDENT: i64 = 19_000;

/// Days of premium granted per paid package. Monthly includes a 3-day bonus.
const MONTHLY_PREMIUM_DAYS: i64 = 33;
const TRIAL_PREMIUM_DAYS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PackageType {
    Monthly,
    Trial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Cancelled,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub order_code: i64,
    pub user_id: Uuid,
    pub amount: i64,
    pub description: String,
    pub package: PackageType,
    pub status: PaymentStatus,
    pub checkout_url: Option<String>,
    pub qr_code: Option<String>,
    pub expires_at: Option<OffsetDateTime>,
    pub paid_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

const COLUMNS: &str = "id, order_code, user_id, amount, description, package, status, \
     checkout_url, qr_code, expires_at, paid_at, created_at";

pub struct NewPayment<'a> {
    pub order_code: i64,
    pub user_id: Uuid,
    pub amount: i64,
    pub description: &'a str,
    pub package: PackageType,
    pub status: PaymentStatus,
    pub checkout_url: Option<&'a str>,
    pub qr_code: Option<&'a str>,
    pub expires_at: Option<OffsetDateTime>,
}

pub async fn insert(db: &PgPool, new: NewPayment<'_>) -> anyhow::Result<Payment> {
    let row = sqlx::query_as::<_, Payment>(&format!(
        "INSERT INTO payments (order_code, user_id, amount, description, package, status,
                               checkout_url, qr_code, expires_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING {COLUMNS}"
    ))
    .bind(new.order_code)
    .bind(new.user_id)
    .bind(new.amount)
    .bind(new.description)
    .bind(new.package)
    .bind(new.status)
    .bind(new.checkout_url)
    .bind(new.qr_code)
    .bind(new.expires_at)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn find_by_order_code(db: &PgPool, order_code: i64) -> anyhow::Result<Option<Payment>> {
    let row = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {COLUMNS} FROM payments WHERE order_code = $1"
    ))
    .bind(order_code)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn update_status(
    db: &PgPool,
    id: Uuid,
    status: PaymentStatus,
    expires_at: Option<OffsetDateTime>,
    paid_at: Option<OffsetDateTime>,
) -> anyhow::Result<Payment> {
    let row = sqlx::query_as::<_, Payment>(&format!(
        "UPDATE payments
         SET status = $2,
             expires_at = COALESCE($3, expires_at),
             paid_at = COALESCE($4, paid_at)
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(status)
    .bind(expires_at)
    .bind(paid_at)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    status: Option<PaymentStatus>,
    page: &PageQuery,
) -> anyhow::Result<Vec<Payment>> {
    let rows = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {COLUMNS} FROM payments
         WHERE user_id = $1 AND ($2::text IS NULL OR status = $2)
         ORDER BY created_at DESC
         LIMIT $3 OFFSET $4"
    ))
    .bind(user_id)
    .bind(status.map(PaymentStatus::as_str))
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn count_by_user(
    db: &PgPool,
    user_id: Uuid,
    status: Option<PaymentStatus>,
) -> anyhow::Result<i64> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM payments
         WHERE user_id = $1 AND ($2::text IS NULL OR status = $2)",
    )
    .bind(user_id)
    .bind(status.map(PaymentStatus::as_str))
    .fetch_one(db)
    .await?;
    Ok(total)
}

/// Whether any paid, unexpired payment exists for the user.
pub async fn has_active_paid(
    db: &PgPool,
    user_id: Uuid,
    now: OffsetDateTime,
) -> anyhow::Result<bool> {
    let found: Option<i32> = sqlx::query_scalar(
        "SELECT 1 FROM payments
         WHERE user_id = $1 AND status = 'paid' AND expires_at > $2
         LIMIT 1",
    )
    .bind(user_id)
    .bind(now)
    .fetch_optional(db)
    .await?;
    Ok(found.is_some())
}

/// Premium period granted by a paid package: extends the remaining time when
/// the old expiry is still in the future, otherwise starts from now.
pub fn extended_expiry(
    package: PackageType,
    current: Option<OffsetDateTime>,
    now: OffsetDateTime,
) -> OffsetDateTime {
    let base = current.filter(|t| *t > now).unwrap_or(now);
    let days = match package {
        PackageType::Monthly => MONTHLY_PREMIUM_DAYS,
        PackageType::Trial => TRIAL_PREMIUM_DAYS,
    };
    base + Duration::days(days)
}

/// Expiry granted when a trial is activated directly (no gateway involved).
pub fn trial_expiry(now: OffsetDateTime) -> OffsetDateTime {
    now + Duration::days(TRIAL_PREMIUM_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn extension_stacks_on_remaining_time() {
        let now = datetime!(2025-01-01 00:00 UTC);
        let current = Some(datetime!(2025-01-10 00:00 UTC));
        let expiry = extended_expiry(PackageType::Monthly, current, now);
        assert_eq!(expiry, datetime!(2025-02-12 00:00 UTC));
    }

    #[test]
    fn extension_restarts_after_lapse() {
        let now = datetime!(2025-03-01 00:00 UTC);
        let lapsed = Some(datetime!(2025-01-10 00:00 UTC));
        let expiry = extended_expiry(PackageType::Trial, lapsed, now);
        assert_eq!(expiry, datetime!(2025-03-04 00:00 UTC));
    }

    #[test]
    fn extension_without_history_starts_from_now() {
        let now = datetime!(2025-03-01 00:00 UTC);
        let expiry = extended_expiry(PackageType::Monthly, None, now);
        assert_eq!(expiry, datetime!(2025-04-03 00:00 UTC));
    }
}

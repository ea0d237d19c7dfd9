use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::pagination::PageQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Occupation {
    Pupil,
    Student,
    Employed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    pub gender: Option<Gender>,
    pub birth_date: Option<Date>,
    pub occupation: Occupation,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub premium: bool,
    pub premium_until: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

const USER_COLUMNS: &str = "id, email, password_hash, full_name, role, gender, birth_date, \
     occupation, height_cm, weight_kg, premium, premium_until, created_at";

pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub full_name: &'a str,
    pub gender: Gender,
    pub birth_date: Date,
    pub occupation: Occupation,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
}

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_full_name(db: &PgPool, full_name: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE full_name = $1"
        ))
        .bind(full_name)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn create(db: &PgPool, new: NewUser<'_>) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash, full_name, gender, birth_date, occupation, height_cm, weight_kg)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.full_name)
        .bind(new.gender)
        .bind(new.birth_date)
        .bind(new.occupation)
        .bind(new.height_cm)
        .bind(new.weight_kg)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        full_name: Option<&str>,
        height_cm: Option<f64>,
        weight_kg: Option<f64>,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET full_name = COALESCE($2, full_name),
                 height_cm = COALESCE($3, height_cm),
                 weight_kg = COALESCE($4, weight_kg)
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(full_name)
        .bind(height_cm)
        .bind(weight_kg)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Sync premium state after a payment event.
    pub async fn set_premium(
        db: &PgPool,
        id: Uuid,
        premium: bool,
        premium_until: Option<OffsetDateTime>,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET premium = $2, premium_until = $3 WHERE id = $1")
            .bind(id)
            .bind(premium)
            .bind(premium_until)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn list(db: &PgPool, page: &PageQuery, role: Role) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = $1
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(role)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    pub async fn count(db: &PgPool, role: Role) -> anyhow::Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(role)
            .fetch_one(db)
            .await?;
        Ok(total)
    }

    /// Age in whole years on `today`, decremented when the birthday has not
    /// been reached yet.
    pub fn age_on(birth_date: Date, today: Date) -> i32 {
        let mut age = today.year() - birth_date.year();
        if (today.month() as u8, today.day()) < (birth_date.month() as u8, birth_date.day()) {
            age -= 1;
        }
        age
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn age_counts_completed_years() {
        assert_eq!(
            User::age_on(date!(1990 - 06 - 15), date!(2020 - 06 - 15)),
            30
        );
        assert_eq!(
            User::age_on(date!(1990 - 06 - 15), date!(2020 - 06 - 14)),
            29
        );
        assert_eq!(
            User::age_on(date!(1990 - 06 - 15), date!(2020 - 12 - 01)),
            30
        );
    }

    #[test]
    fn age_handles_year_boundary() {
        assert_eq!(
            User::age_on(date!(2000 - 12 - 31), date!(2021 - 01 - 01)),
            20
        );
    }
}

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::auth::repo::{Gender, Occupation, Role, User};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub gender: Gender,
    pub birth_date: Date,
    pub occupation: Occupation,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Request body for profile updates.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UserListQuery {
    pub role: Option<Role>,
}

/// Response returned after login, register or refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: PublicUser,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub gender: Option<Gender>,
    pub birth_date: Option<Date>,
    pub occupation: Occupation,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub premium: bool,
    pub premium_until: Option<OffsetDateTime>,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            full_name: u.full_name,
            role: u.role,
            gender: u.gender,
            birth_date: u.birth_date,
            occupation: u.occupation,
            height_cm: u.height_cm,
            weight_kg: u.weight_kg,
            premium: u.premium,
            premium_until: u.premium_until,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_omits_password_hash() {
        let user = PublicUser {
            id: Uuid::new_v4(),
            email: "test@example.com".into(),
            full_name: "Test User".into(),
            role: Role::Customer,
            gender: Some(Gender::Female),
            birth_date: None,
            occupation: Occupation::Student,
            height_cm: Some(170.0),
            weight_kg: Some(65.0),
            premium: false,
            premium_until: None,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("\"student\""));
        assert!(!json.contains("password"));
    }
}

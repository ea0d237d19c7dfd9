use axum::{
    extract::{Query, State},
    Json,
};
use rand::Rng;
use serde_json::json;
use time::{Duration, OffsetDateTime};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{
        repo::{Occupation, User},
        AuthUser,
    },
    error::ApiError,
    notifications::{self, notifier::NotificationEvent, repo::NotificationKind},
    pagination::{PageQuery, Paginated},
    payments::{
        dto::{
            CreatePaymentRequest, CreatePaymentResponse, TransactionListQuery, UpdateStatusRequest,
        },
        gateway::CheckoutRequest,
        repo::{
            self, NewPayment, PackageType, Payment, PaymentStatus, PREMIUM_PRICE_STANDARD,
            PREMIUM_PRICE_STUDENT,
        },
    },
    state::AppState,
};

/// Pending checkout sessions expire after 15 minutes.
const CHECKOUT_TTL: Duration = Duration::minutes(15);

/// Monthly price depends on occupation: pupils and students pay the reduced
/// rate.
pub fn premium_price(occupation: Occupation) -> i64 {
    match occupation {
        Occupation::Pupil | Occupation::Student => PREMIUM_PRICE_STUDENT,
        Occupation::Employed => PREMIUM_PRICE_STANDARD,
    }
}

fn next_order_code(now: OffsetDateTime) -> i64 {
    now.unix_timestamp() * 1000 + rand::thread_rng().gen_range(0..1000)
}

fn response_from(payment: Payment) -> CreatePaymentResponse {
    CreatePaymentResponse {
        payment_id: payment.id,
        order_code: payment.order_code,
        package: payment.package,
        status: payment.status,
        amount: payment.amount,
        description: payment.description,
        checkout_url: payment.checkout_url,
        qr_code: payment.qr_code,
        expires_at: payment.expires_at,
    }
}

#[instrument(skip(state, payload))]
pub async fn create_payment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreatePaymentRequest>,
) -> Result<Json<CreatePaymentResponse>, ApiError> {
    let now = OffsetDateTime::now_utc();

    match payload.package {
        PackageType::Trial => activate_trial(&state, user_id, now).await.map(Json),
        PackageType::Monthly => create_checkout(&state, user_id, now).await.map(Json),
    }
}

/// Trials need no gateway round-trip: the record is paid immediately and
/// premium is granted for the trial period.
async fn activate_trial(
    state: &AppState,
    user_id: Uuid,
    now: OffsetDateTime,
) -> Result<CreatePaymentResponse, ApiError> {
    let expires_at = repo::trial_expiry(now);
    let payment = repo::insert(
        &state.db,
        NewPayment {
            order_code: next_order_code(now),
            user_id,
            amount: 0,
            description: "3-day free trial",
            package: PackageType::Trial,
            status: PaymentStatus::Paid,
            checkout_url: None,
            qr_code: None,
            expires_at: Some(expires_at),
        },
    )
    .await?;

    User::set_premium(&state.db, user_id, true, Some(expires_at)).await?;

    info!(user_id = %user_id, order_code = payment.order_code, "trial activated");
    Ok(response_from(payment))
}

async fn create_checkout(
    state: &AppState,
    user_id: Uuid,
    now: OffsetDateTime,
) -> Result<CreatePaymentResponse, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("user"))?;

    let amount = premium_price(user.occupation);
    let order_code = next_order_code(now);
    let description = "Monthly premium subscription";

    let redirect_base = state
        .config
        .payment
        .as_ref()
        .map(|p| p.redirect_base.trim_end_matches('/').to_string())
        .unwrap_or_default();
    let session = state
        .gateway
        .create_checkout(CheckoutRequest {
            order_code,
            amount,
            description: description.to_string(),
            return_url: format!("{redirect_base}/payments/return?order_code={order_code}"),
            cancel_url: format!("{redirect_base}/payments/cancel?order_code={order_code}"),
        })
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;

    let payment = repo::insert(
        &state.db,
        NewPayment {
            order_code,
            user_id,
            amount,
            description,
            package: PackageType::Monthly,
            status: PaymentStatus::Pending,
            checkout_url: Some(&session.checkout_url),
            qr_code: session.qr_code.as_deref(),
            expires_at: Some(now + CHECKOUT_TTL),
        },
    )
    .await?;

    info!(user_id = %user_id, order_code, amount, "checkout session created");
    Ok(response_from(payment))
}

/// Status callback from the gateway return leg. A transition to `paid`
/// extends the premium period and syncs it onto the user profile.
#[instrument(skip(state, payload))]
pub async fn update_status(
    State(state): State<AppState>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Payment>, ApiError> {
    let payment = repo::find_by_order_code(&state.db, payload.order_code)
        .await?
        .ok_or_else(|| ApiError::not_found("payment"))?;

    let now = OffsetDateTime::now_utc();
    let updated = if payload.status == PaymentStatus::Paid {
        let expires_at = repo::extended_expiry(payment.package, payment.expires_at, now);
        let updated = repo::update_status(
            &state.db,
            payment.id,
            PaymentStatus::Paid,
            Some(expires_at),
            Some(now),
        )
        .await?;

        User::set_premium(&state.db, payment.user_id, true, Some(expires_at)).await?;

        let event = NotificationEvent {
            kind: NotificationKind::PremiumSuccess,
            title: "Premium activated".into(),
            message: format!("Your premium membership is active until {expires_at}"),
            data: json!({ "order_code": payment.order_code, "package": payment.package }),
        };
        let notify_state = state.clone();
        let paid_user = payment.user_id;
        tokio::spawn(async move {
            notifications::emit_best_effort(&notify_state, paid_user, event).await;
        });

        updated
    } else {
        repo::update_status(&state.db, payment.id, payload.status, None, None).await?
    };

    info!(order_code = payload.order_code, status = ?payload.status, "payment status updated");
    Ok(Json(updated))
}

#[instrument(skip(state))]
pub async fn my_transactions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(page): Query<PageQuery>,
    Query(filter): Query<TransactionListQuery>,
) -> Result<Json<Paginated<Payment>>, ApiError> {
    let page = page.validated();
    let total = repo::count_by_user(&state.db, user_id, filter.status).await?;
    let items = repo::list_by_user(&state.db, user_id, filter.status, &page).await?;
    Ok(Json(Paginated::new(items, &page, total)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn students_pay_the_reduced_rate() {
        assert_eq!(premium_price(Occupation::Pupil), PREMIUM_PRICE_STUDENT);
        assert_eq!(premium_price(Occupation::Student), PREMIUM_PRICE_STUDENT);
        assert_eq!(premium_price(Occupation::Employed), PREMIUM_PRICE_STANDARD);
    }

    #[test]
    fn order_codes_are_positive_and_time_based() {
        let now = OffsetDateTime::now_utc();
        let code = next_order_code(now);
        assert!(code >= now.unix_timestamp() * 1000);
        assert!(code < (now.unix_timestamp() + 1) * 1000);
    }
}

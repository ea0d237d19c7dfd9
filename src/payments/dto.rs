use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::payments::repo::{PackageType, PaymentStatus};

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub package: PackageType,
}

#[derive(Debug, Serialize)]
pub struct CreatePaymentResponse {
    pub payment_id: Uuid,
    pub order_code: i64,
    pub package: PackageType,
    pub status: PaymentStatus,
    pub amount: i64,
    pub description: String,
    pub checkout_url: Option<String>,
    pub qr_code: Option<String>,
    pub expires_at: Option<OffsetDateTime>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub order_code: i64,
    pub status: PaymentStatus,
}

#[derive(Debug, Deserialize, Default)]
pub struct TransactionListQuery {
    pub status: Option<PaymentStatus>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_purpose", rename_all = "snake_case")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentPurpose {
    Job,
    Donation,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub payer_id: Uuid,
    pub beneficiary_id: Option<Uuid>,
    pub job_id: Option<Uuid>,
    pub donation_id: Option<Uuid>,
    pub purpose: PaymentPurpose,
    pub amount: BigDecimal,
    pub checkout_request_id: Option<String>,
    pub mpesa_receipt: Option<String>,
    pub result_code: Option<i32>,
    pub raw_callback: Option<serde_json::Value>,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Donation {
    pub id: Uuid,
    pub donor_id: Option<Uuid>,
    pub amount: BigDecimal,
    pub message: String,
    pub mpesa_code: Option<String>,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
}

/// A job payment row before the gateway has been contacted.
#[derive(Debug, Clone)]
pub struct NewJobPayment {
    pub payer_id: Uuid,
    pub beneficiary_id: Option<Uuid>,
    pub job_id: Uuid,
    pub amount: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct NewDonation {
    pub donor_id: Uuid,
    pub amount: BigDecimal,
    pub message: String,
}

/// Parsed body of an STK push confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct StkCallback {
    pub checkout_request_id: String,
    pub result_code: i32,
    pub result_desc: Option<String>,
    pub receipt: Option<String>,
}

impl StkCallback {
    pub const SUCCESS_CODE: i32 = 0;

    pub fn is_success(&self) -> bool {
        self.result_code == Self::SUCCESS_CODE
    }
}

#[derive(Debug, Clone)]
pub enum CallbackOutcome {
    /// First delivery for a pending payment; the payment is now terminal.
    Settled(Payment),
    /// Redelivery for a payment that is already terminal; nothing changed.
    AlreadySettled(Payment),
    NotFound,
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::userdtos::validate_phone_number;
use crate::{
    models::paymentmodel::{Payment, PaymentStatus},
    utils::currency::AmountInput,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PayForJobDto {
    #[validate(custom = "validate_phone_number")]
    pub phone_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DonateDto {
    pub amount: AmountInput,

    #[validate(custom = "validate_phone_number")]
    pub phone_number: String,

    #[validate(length(max = 1000))]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentInitiatedDto {
    pub payment_id: Uuid,
    pub checkout_request_id: Option<String>,
    pub status: PaymentStatus,
    pub donation_id: Option<Uuid>,
}

impl PaymentInitiatedDto {
    pub fn from_payment(payment: &Payment) -> Self {
        Self {
            payment_id: payment.id,
            checkout_request_id: payment.checkout_request_id.clone(),
            status: payment.status,
            donation_id: payment.donation_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentStatusDto {
    pub status: PaymentStatus,
}

// service/payment_service.rs
use std::sync::Arc;

use serde_json::Value;
use sqlx::types::BigDecimal;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    db::{jobdb::JobExt, paymentdb::PaymentExt, MarketplaceDb},
    dtos::paymentdtos::DonateDto,
    models::{
        jobmodel::JobStatus,
        paymentmodel::{CallbackOutcome, NewDonation, NewJobPayment, Payment},
        usermodel::User,
    },
    service::{
        error::ServiceError,
        mpesa::{parse_stk_callback, PaymentGateway, StkPushRequest},
    },
    utils::currency::{decimal_to_shillings, parse_amount_to_shillings},
};

const DONATION_DESCRIPTION: &str = "ComradeGigs Donation";

fn short_id(id: Uuid) -> String {
    id.simple().to_string()[..8].to_uppercase()
}

#[derive(Debug, Clone)]
pub struct PaymentService {
    db_client: Arc<dyn MarketplaceDb>,
    gateway: Arc<dyn PaymentGateway>,
    country_code: String,
}

impl PaymentService {
    pub fn new(
        db_client: Arc<dyn MarketplaceDb>,
        gateway: Arc<dyn PaymentGateway>,
        country_code: String,
    ) -> Self {
        Self {
            db_client,
            gateway,
            country_code,
        }
    }

    /// Client pays the hired student the job budget.
    pub async fn pay_for_job(
        &self,
        client: &User,
        job_id: Uuid,
        phone_number: &str,
    ) -> Result<Payment, ServiceError> {
        let job = self
            .db_client
            .get_job(job_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Job", job_id))?;

        if job.client_id != client.id {
            return Err(ServiceError::UnauthorizedJobAccess(client.id, job_id));
        }
        if job.status != JobStatus::Assigned {
            return Err(ServiceError::Validation(format!(
                "Only assigned jobs can be paid for; this job is {}",
                job.status.to_str()
            )));
        }

        let shillings = decimal_to_shillings(&job.budget).map_err(ServiceError::Validation)?;

        let payment = self
            .db_client
            .create_job_payment(NewJobPayment {
                payer_id: client.id,
                beneficiary_id: job.assigned_to,
                job_id,
                amount: BigDecimal::from(shillings),
            })
            .await?
            .ok_or_else(|| {
                warn!("Job {} already has a payment in progress or settled", job_id);
                ServiceError::Validation(
                    "A payment for this job is already in progress or complete".to_string(),
                )
            })?;

        let request = StkPushRequest::new(
            phone_number,
            shillings,
            &format!("JOB-{}", short_id(job.id)),
            &format!("Payment for {}", job.title),
            &self.country_code,
        );
        self.dispatch(payment, request).await
    }

    /// Donation and its pending payment are created together, after the
    /// amount has been validated.
    pub async fn donate(&self, donor: &User, body: DonateDto) -> Result<Payment, ServiceError> {
        let shillings = parse_amount_to_shillings(&body.amount).map_err(ServiceError::Validation)?;

        let (donation, payment) = self
            .db_client
            .create_donation_with_payment(NewDonation {
                donor_id: donor.id,
                amount: BigDecimal::from(shillings),
                message: body.message.unwrap_or_default(),
            })
            .await?;

        let request = StkPushRequest::new(
            &body.phone_number,
            shillings,
            &format!("DON-{}", short_id(donation.id)),
            DONATION_DESCRIPTION,
            &self.country_code,
        );
        self.dispatch(payment, request).await
    }

    /// Pushes the STK request for a freshly recorded payment. An accepted
    /// push leaves the payment pending with its checkout id; any failure
    /// marks it failed on the spot.
    async fn dispatch(
        &self,
        payment: Payment,
        request: StkPushRequest,
    ) -> Result<Payment, ServiceError> {
        match self.gateway.stk_push(&request).await {
            Ok(ack) => {
                let updated = self
                    .db_client
                    .attach_checkout_request_id(payment.id, &ack.checkout_request_id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Pending payment", payment.id))?;

                info!(
                    "📲 STK push sent for payment {} (checkout {})",
                    updated.id, ack.checkout_request_id
                );
                Ok(updated)
            }
            Err(e) => {
                error!("STK push failed for payment {}: {}", payment.id, e);
                self.db_client.mark_payment_failed(payment.id).await?;
                Err(ServiceError::Gateway(e))
            }
        }
    }

    /// Reconciles a gateway confirmation. The raw payload is stored with the
    /// payment for audit.
    pub async fn handle_callback(&self, payload: Value) -> Result<CallbackOutcome, ServiceError> {
        let callback = parse_stk_callback(&payload).map_err(|e| {
            warn!("Rejected malformed STK callback: {}", e);
            ServiceError::CallbackIntegrity(e)
        })?;

        let outcome = self
            .db_client
            .apply_payment_callback(&callback, payload)
            .await?;

        match &outcome {
            CallbackOutcome::Settled(payment) => info!(
                "💰 Payment {} settled as {:?} (result code {})",
                payment.id, payment.status, callback.result_code
            ),
            CallbackOutcome::AlreadySettled(payment) => warn!(
                "Callback redelivered for settled payment {}; ignored",
                payment.id
            ),
            CallbackOutcome::NotFound => warn!(
                "Callback for unknown checkout id {}",
                callback.checkout_request_id
            ),
        }
        Ok(outcome)
    }

    /// Status for the payer's own poll. Other users get a not-found.
    pub async fn payment_status(
        &self,
        viewer: &User,
        payment_id: Uuid,
    ) -> Result<Payment, ServiceError> {
        self.db_client
            .get_payment(payment_id)
            .await?
            .filter(|p| p.payer_id == viewer.id || viewer.is_admin())
            .ok_or_else(|| ServiceError::not_found("Payment", payment_id))
    }
}

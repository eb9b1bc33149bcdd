// db/paymentdb.rs
use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::paymentmodel::{
    CallbackOutcome, Donation, NewDonation, NewJobPayment, Payment, PaymentPurpose, StkCallback,
};

#[async_trait]
pub trait PaymentExt {
    /// Records a pending job payment before the gateway is contacted.
    /// Returns `None` when the job already has a pending or successful payment.
    async fn create_job_payment(
        &self,
        payment: NewJobPayment,
    ) -> Result<Option<Payment>, sqlx::Error>;

    /// Creates the donation and its pending payment together.
    async fn create_donation_with_payment(
        &self,
        donation: NewDonation,
    ) -> Result<(Donation, Payment), sqlx::Error>;

    /// Stores the gateway correlation id on a payment that is still pending
    /// and has none yet.
    async fn attach_checkout_request_id(
        &self,
        payment_id: Uuid,
        checkout_request_id: &str,
    ) -> Result<Option<Payment>, sqlx::Error>;

    async fn mark_payment_failed(&self, payment_id: Uuid) -> Result<Option<Payment>, sqlx::Error>;

    async fn get_payment(&self, payment_id: Uuid) -> Result<Option<Payment>, sqlx::Error>;

    async fn get_payment_by_checkout_id(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<Payment>, sqlx::Error>;

    /// Reconciles a gateway confirmation into the payment and its target.
    async fn apply_payment_callback(
        &self,
        callback: &StkCallback,
        raw: Value,
    ) -> Result<CallbackOutcome, sqlx::Error>;

    async fn get_donation(&self, donation_id: Uuid) -> Result<Option<Donation>, sqlx::Error>;

    async fn get_donor_donations(&self, donor_id: Uuid) -> Result<Vec<Donation>, sqlx::Error>;
}

#[async_trait]
impl PaymentExt for DBClient {
    async fn create_job_payment(
        &self,
        payment: NewJobPayment,
    ) -> Result<Option<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (payer_id, beneficiary_id, job_id, purpose, amount)
            VALUES ($1, $2, $3, 'job'::payment_purpose, $4)
            ON CONFLICT (job_id) WHERE purpose = 'job' AND status <> 'failed' DO NOTHING
            RETURNING *
            "#,
        )
        .bind(payment.payer_id)
        .bind(payment.beneficiary_id)
        .bind(payment.job_id)
        .bind(payment.amount)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_donation_with_payment(
        &self,
        donation: NewDonation,
    ) -> Result<(Donation, Payment), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Donation>(
            r#"
            INSERT INTO donations (donor_id, amount, message)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(donation.donor_id)
        .bind(&donation.amount)
        .bind(donation.message)
        .fetch_one(&mut *tx)
        .await?;

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (payer_id, donation_id, purpose, amount)
            VALUES ($1, $2, 'donation'::payment_purpose, $3)
            RETURNING *
            "#,
        )
        .bind(donation.donor_id)
        .bind(created.id)
        .bind(donation.amount)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((created, payment))
    }

    async fn attach_checkout_request_id(
        &self,
        payment_id: Uuid,
        checkout_request_id: &str,
    ) -> Result<Option<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments
            SET checkout_request_id = $2, updated_at = NOW()
            WHERE id = $1
              AND status = 'pending'::payment_status
              AND checkout_request_id IS NULL
            RETURNING *
            "#,
        )
        .bind(payment_id)
        .bind(checkout_request_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn mark_payment_failed(&self, payment_id: Uuid) -> Result<Option<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments
            SET status = 'failed'::payment_status, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'::payment_status
            RETURNING *
            "#,
        )
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_payment(&self, payment_id: Uuid) -> Result<Option<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(r#"SELECT * FROM payments WHERE id = $1"#)
            .bind(payment_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_payment_by_checkout_id(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(r#"SELECT * FROM payments WHERE checkout_request_id = $1"#)
            .bind(checkout_request_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn apply_payment_callback(
        &self,
        callback: &StkCallback,
        raw: Value,
    ) -> Result<CallbackOutcome, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let payment = sqlx::query_as::<_, Payment>(
            r#"SELECT * FROM payments WHERE checkout_request_id = $1 FOR UPDATE"#,
        )
        .bind(&callback.checkout_request_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(payment) = payment else {
            tx.rollback().await?;
            return Ok(CallbackOutcome::NotFound);
        };

        if payment.status.is_terminal() {
            tx.rollback().await?;
            return Ok(CallbackOutcome::AlreadySettled(payment));
        }

        let payment = if callback.is_success() {
            sqlx::query_as::<_, Payment>(
                r#"
                UPDATE payments
                SET status = 'success'::payment_status,
                    result_code = $2,
                    raw_callback = $3,
                    mpesa_receipt = $4,
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(payment.id)
            .bind(callback.result_code)
            .bind(raw)
            .bind(&callback.receipt)
            .fetch_one(&mut *tx)
            .await?
        } else {
            sqlx::query_as::<_, Payment>(
                r#"
                UPDATE payments
                SET status = 'failed'::payment_status,
                    result_code = $2,
                    raw_callback = $3,
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(payment.id)
            .bind(callback.result_code)
            .bind(raw)
            .fetch_one(&mut *tx)
            .await?
        };

        if callback.is_success() {
            match payment.purpose {
                PaymentPurpose::Donation => {
                    if let Some(donation_id) = payment.donation_id {
                        sqlx::query(
                            r#"
                            UPDATE donations
                            SET is_paid = TRUE, mpesa_code = $2
                            WHERE id = $1
                            "#,
                        )
                        .bind(donation_id)
                        .bind(&callback.receipt)
                        .execute(&mut *tx)
                        .await?;
                    }
                }
                PaymentPurpose::Job => {
                    if let Some(job_id) = payment.job_id {
                        sqlx::query(
                            r#"
                            UPDATE jobs
                            SET status = 'completed'::job_status,
                                completed_at = NOW(),
                                updated_at = NOW()
                            WHERE id = $1
                            "#,
                        )
                        .bind(job_id)
                        .execute(&mut *tx)
                        .await?;
                    }
                }
            }
        }

        tx.commit().await?;
        Ok(CallbackOutcome::Settled(payment))
    }

    async fn get_donation(&self, donation_id: Uuid) -> Result<Option<Donation>, sqlx::Error> {
        sqlx::query_as::<_, Donation>(r#"SELECT * FROM donations WHERE id = $1"#)
            .bind(donation_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_donor_donations(&self, donor_id: Uuid) -> Result<Vec<Donation>, sqlx::Error> {
        sqlx::query_as::<_, Donation>(
            r#"SELECT * FROM donations WHERE donor_id = $1 ORDER BY created_at DESC"#,
        )
        .bind(donor_id)
        .fetch_all(&self.pool)
        .await
    }
}

// service/mpesa.rs
//
// Daraja STK push client and callback parsing.
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{config::MpesaConfig, models::paymentmodel::StkCallback};

/// Daraja rejects longer account references.
pub const ACCOUNT_REFERENCE_MAX: usize = 12;
pub const TRANSACTION_DESC_MAX: usize = 13;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Could not generate access token: {0}")]
    Auth(String),

    #[error("{0}")]
    Rejected(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StkPushRequest {
    pub phone_number: String,
    pub amount: i64,
    pub account_reference: String,
    pub transaction_desc: String,
}

impl StkPushRequest {
    pub fn new(
        phone_number: &str,
        amount: i64,
        account_reference: &str,
        transaction_desc: &str,
        country_code: &str,
    ) -> Self {
        Self {
            phone_number: normalize_phone(phone_number, country_code),
            amount,
            account_reference: truncate(account_reference, ACCOUNT_REFERENCE_MAX),
            transaction_desc: truncate(transaction_desc, TRANSACTION_DESC_MAX),
        }
    }
}

/// Acknowledgement of an accepted push; the payment is still pending.
#[derive(Debug, Clone, PartialEq)]
pub struct StkPushAck {
    pub checkout_request_id: String,
    pub merchant_request_id: Option<String>,
    pub customer_message: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: std::fmt::Debug + Send + Sync {
    async fn stk_push(&self, request: &StkPushRequest) -> Result<StkPushAck, GatewayError>;
}

/// `07..` becomes `2547..`, a leading `+` is dropped.
pub fn normalize_phone(phone: &str, country_code: &str) -> String {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    let without_plus = compact.strip_prefix('+').unwrap_or(&compact);
    match without_plus.strip_prefix('0') {
        Some(local) => format!("{}{}", country_code, local),
        None => without_plus.to_string(),
    }
}

fn truncate(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

/// Builds the STK password: base64(shortcode + passkey + timestamp).
pub fn stk_password(shortcode: &str, passkey: &str, timestamp: &str) -> String {
    STANDARD.encode(format!("{}{}{}", shortcode, passkey, timestamp))
}

/// Reads the parts of a confirmation body the reconciliation needs.
pub fn parse_stk_callback(payload: &Value) -> Result<StkCallback, String> {
    let callback = payload
        .get("Body")
        .and_then(|body| body.get("stkCallback"))
        .filter(|cb| cb.is_object())
        .ok_or_else(|| "missing Body.stkCallback".to_string())?;

    let result_code = match callback.get("ResultCode") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .and_then(|code| i32::try_from(code).ok())
    .ok_or_else(|| "missing or non-numeric ResultCode".to_string())?;

    let checkout_request_id = callback
        .get("CheckoutRequestID")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| "missing CheckoutRequestID".to_string())?
        .to_string();

    let result_desc = callback
        .get("ResultDesc")
        .and_then(Value::as_str)
        .map(str::to_string);

    let receipt = callback
        .get("CallbackMetadata")
        .and_then(|meta| meta.get("Item"))
        .and_then(Value::as_array)
        .and_then(|items| {
            items
                .iter()
                .find(|item| item.get("Name").and_then(Value::as_str) == Some("MpesaReceiptNumber"))
        })
        .and_then(|item| match item.get("Value") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        });

    Ok(StkCallback {
        checkout_request_id,
        result_code,
        result_desc,
        receipt,
    })
}

#[derive(Debug, Clone)]
pub struct MpesaClient {
    http: reqwest::Client,
    config: MpesaConfig,
}

impl MpesaClient {
    pub fn new(config: MpesaConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn access_token(&self) -> Result<String, GatewayError> {
        if self.config.consumer_key.is_empty() || self.config.consumer_secret.is_empty() {
            return Err(GatewayError::Config(
                "MPESA_CONSUMER_KEY or MPESA_CONSUMER_SECRET not set".to_string(),
            ));
        }

        let response = self
            .http
            .get(self.url("/oauth/v1/generate?grant_type=client_credentials"))
            .basic_auth(&self.config.consumer_key, Some(&self.config.consumer_secret))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GatewayError::Auth(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;
        body["access_token"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| GatewayError::Auth("access_token missing from response".to_string()))
    }
}

#[async_trait]
impl PaymentGateway for MpesaClient {
    async fn stk_push(&self, request: &StkPushRequest) -> Result<StkPushAck, GatewayError> {
        if self.config.shortcode.is_empty() || self.config.passkey.is_empty() {
            return Err(GatewayError::Config(
                "MPESA_SHORTCODE or MPESA_PASSKEY not set".to_string(),
            ));
        }

        let token = self.access_token().await?;
        let timestamp = Local::now().format("%Y%m%d%H%M%S").to_string();
        let password = stk_password(&self.config.shortcode, &self.config.passkey, &timestamp);

        let payload = json!({
            "BusinessShortCode": self.config.shortcode,
            "Password": password,
            "Timestamp": timestamp,
            "TransactionType": "CustomerPayBillOnline",
            "Amount": request.amount,
            "PartyA": request.phone_number,
            "PartyB": self.config.shortcode,
            "PhoneNumber": request.phone_number,
            "CallBackURL": self.config.callback_url,
            "AccountReference": request.account_reference,
            "TransactionDesc": request.transaction_desc,
        });

        let response = self
            .http
            .post(self.url("/mpesa/stkpush/v1/processrequest"))
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;

        let body: Value = response.json().await?;
        parse_push_response(&body)
    }
}

fn parse_push_response(body: &Value) -> Result<StkPushAck, GatewayError> {
    let accepted = match body.get("ResponseCode") {
        Some(Value::String(code)) => code == "0",
        Some(Value::Number(code)) => code.as_i64() == Some(0),
        _ => false,
    };

    if !accepted {
        let message = body
            .get("errorMessage")
            .or_else(|| body.get("ResponseDescription"))
            .and_then(Value::as_str)
            .unwrap_or("Unknown error");
        return Err(GatewayError::Rejected(message.to_string()));
    }

    let checkout_request_id = body
        .get("CheckoutRequestID")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| GatewayError::Rejected("CheckoutRequestID missing".to_string()))?;

    Ok(StkPushAck {
        checkout_request_id: checkout_request_id.to_string(),
        merchant_request_id: body
            .get("MerchantRequestID")
            .and_then(Value::as_str)
            .map(str::to_string),
        customer_message: body
            .get("CustomerMessage")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

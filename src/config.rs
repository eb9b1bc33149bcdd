// config.rs
pub const MPESA_SANDBOX_URL: &str = "https://sandbox.safaricom.co.ke";
pub const MPESA_CONFIRMATION_PATH: &str = "/api/mpesa/confirmation";

#[derive(Debug, Clone)]
pub struct MpesaConfig {
    pub base_url: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub shortcode: String,
    pub passkey: String,
    pub callback_url: String,
    pub country_code: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub app_url: String,
    pub jwt_secret: String,
    pub jwt_maxage: i64,
    pub port: u16,
    pub mpesa: MpesaConfig,
    // optional bootstrap admin account
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let jwt_secret = std::env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");
        let jwt_maxage = std::env::var("JWT_MAXAGE").expect("JWT_MAXAGE must be set");
        let app_url = std::env::var("APP_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8000);

        let mpesa = MpesaConfig {
            base_url: std::env::var("MPESA_BASE_URL")
                .unwrap_or_else(|_| MPESA_SANDBOX_URL.to_string()),
            consumer_key: std::env::var("MPESA_CONSUMER_KEY").unwrap_or_default(),
            consumer_secret: std::env::var("MPESA_CONSUMER_SECRET").unwrap_or_default(),
            shortcode: std::env::var("MPESA_SHORTCODE").unwrap_or_else(|_| "174379".to_string()),
            passkey: std::env::var("MPESA_PASSKEY").unwrap_or_default(),
            callback_url: normalize_callback_url(
                &std::env::var("MPESA_CALLBACK_URL").unwrap_or_else(|_| app_url.clone()),
            ),
            country_code: std::env::var("MPESA_COUNTRY_CODE")
                .unwrap_or_else(|_| "254".to_string()),
        };

        Config {
            database_url,
            app_url,
            jwt_secret,
            jwt_maxage: jwt_maxage.parse::<i64>().unwrap_or(60),
            port,
            mpesa,
            admin_email: std::env::var("ADMIN_EMAIL").ok().filter(|v| !v.trim().is_empty()),
            admin_password: std::env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty()),
        }
    }
}

/// Trims the configured callback URL and appends the confirmation path when
/// only a host was given.
pub fn normalize_callback_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.ends_with(MPESA_CONFIRMATION_PATH) {
        trimmed.to_string()
    } else {
        format!("{}{}", trimmed, MPESA_CONFIRMATION_PATH)
    }
}

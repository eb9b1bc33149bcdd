mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::sync::Arc;

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use config::Config;
use db::{db::DBClient, MarketplaceDb};
use dotenv::dotenv;
use routes::create_router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use service::{
    account_service::AccountService,
    dashboard_service::DashboardService,
    hiring_service::HiringService,
    job_service::JobService,
    mpesa::{MpesaClient, PaymentGateway},
    payment_service::PaymentService,
    skill_service::SkillService,
};

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<dyn MarketplaceDb>,
    // Services
    pub account_service: Arc<AccountService>,
    pub skill_service: Arc<SkillService>,
    pub job_service: Arc<JobService>,
    pub hiring_service: Arc<HiringService>,
    pub payment_service: Arc<PaymentService>,
    pub dashboard_service: Arc<DashboardService>,
}

impl AppState {
    pub fn new(
        db_client: Arc<dyn MarketplaceDb>,
        gateway: Arc<dyn PaymentGateway>,
        config: Config,
    ) -> Self {
        let payment_service = Arc::new(PaymentService::new(
            db_client.clone(),
            gateway,
            config.mpesa.country_code.clone(),
        ));

        Self {
            account_service: Arc::new(AccountService::new(db_client.clone())),
            skill_service: Arc::new(SkillService::new(db_client.clone())),
            job_service: Arc::new(JobService::new(db_client.clone())),
            hiring_service: Arc::new(HiringService::new(db_client.clone())),
            dashboard_service: Arc::new(DashboardService::new(db_client.clone())),
            payment_service,
            db_client,
            env: config,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    dotenv().ok();

    let config = Config::init();

    let pool = match PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            info!("✅ Connection to the database is successful!");
            pool
        }
        Err(err) => {
            error!("🔥 Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    let db_client = DBClient::new(pool);
    if let Err(err) = db_client.migrate().await {
        error!("🔥 Failed to run migrations: {:?}", err);
        std::process::exit(1);
    }

    let gateway = Arc::new(MpesaClient::new(config.mpesa.clone()));
    let app_state = Arc::new(AppState::new(Arc::new(db_client), gateway, config.clone()));

    if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
        match app_state.account_service.ensure_admin(email, password).await {
            Ok(Some(_)) => info!("🛡️ Admin account {} created", email),
            Ok(None) => info!("Admin account {} already exists", email),
            Err(err) => warn!("Could not bootstrap admin account: {}", err),
        }
    }

    let allowed_origins: Vec<HeaderValue> = [config.app_url.as_str(), "http://localhost:5173"]
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE]);

    let app = create_router(app_state).layer(cors);

    info!("🚀 Server is running on http://localhost:{}", config.port);
    info!("📲 M-Pesa callbacks expected at {}", config.mpesa.callback_url);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("🔥 Failed to bind port {}: {:?}", config.port, err);
            std::process::exit(1);
        }
    };

    if let Err(err) = axum::serve(listener, app).await {
        error!("🔥 Server error: {:?}", err);
    }
}

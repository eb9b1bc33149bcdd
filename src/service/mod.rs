pub mod account_service;
pub mod dashboard_service;
pub mod error;
pub mod hiring_service;
pub mod job_service;
pub mod mpesa;
pub mod payment_service;
pub mod skill_service;

#[cfg(test)]
pub mod test_support;

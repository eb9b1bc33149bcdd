pub mod admin;
pub mod auth;
pub mod client;
pub mod donor;
pub mod jobs;
pub mod mpesa;
pub mod payments;
pub mod student;
pub mod users;

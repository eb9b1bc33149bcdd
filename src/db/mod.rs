pub mod db;
pub mod jobdb;
pub mod paymentdb;
pub mod skilldb;
pub mod userdb;

#[cfg(test)]
pub mod memory;

use self::{
    jobdb::{ApplicationExt, JobExt},
    paymentdb::PaymentExt,
    skilldb::SkillExt,
    userdb::{SiteUpdateExt, UserExt},
};

/// Every storage capability the services need, bundled so they can hold a
/// single `Arc<dyn MarketplaceDb>`.
pub trait MarketplaceDb:
    UserExt + SkillExt + JobExt + ApplicationExt + PaymentExt + SiteUpdateExt + std::fmt::Debug + Send + Sync
{
}

impl<T> MarketplaceDb for T where
    T: UserExt + SkillExt + JobExt + ApplicationExt + PaymentExt + SiteUpdateExt + std::fmt::Debug + Send + Sync
{
}

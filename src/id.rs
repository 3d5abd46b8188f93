//! Prefixed ID generation for Cobranca entities.
//!
//! Local IDs carry a `cb_` brand prefix so they can never collide with
//! Asaas identifiers (`cus_`, `sub_`, `pay_`).
//!
//! Format: `cb_{entity}_{uuid_simple}` (32 hex chars, no hyphens)

use uuid::Uuid;

/// Entity types that have prefixed IDs.
#[derive(Debug, Clone, Copy)]
pub enum EntityType {
    User,
    Subscription,
    Payment,
}

impl EntityType {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::User => "cb_usr",
            Self::Subscription => "cb_sub",
            Self::Payment => "cb_pay",
        }
    }
}

/// Generate a new prefixed ID for the given entity type.
pub fn generate(entity: EntityType) -> String {
    format!("{}_{}", entity.prefix(), Uuid::new_v4().simple())
}

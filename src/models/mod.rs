mod payment;
mod subscription;
mod user;

pub use payment::*;
pub use subscription::*;
pub use user::*;

use serde::{Deserialize, Serialize};

/// How a charge is collected. Mirrors the gateway's `billingType` field.
///
/// `Undefined` doubles as the catch-all for values this build does not know,
/// so a webhook carrying a new billing type still deserializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingType {
    Pix,
    Boleto,
    CreditCard,
    #[serde(other)]
    Undefined,
}

impl BillingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pix => "PIX",
            Self::Boleto => "BOLETO",
            Self::CreditCard => "CREDIT_CARD",
            Self::Undefined => "UNDEFINED",
        }
    }
}

impl std::str::FromStr for BillingType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "PIX" => Self::Pix,
            "BOLETO" => Self::Boleto,
            "CREDIT_CARD" => Self::CreditCard,
            _ => Self::Undefined,
        })
    }
}

impl std::fmt::Display for BillingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscription billing interval. Mirrors the gateway's `cycle` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingCycle {
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Semiannually,
    Yearly,
}

impl Default for BillingCycle {
    fn default() -> Self {
        Self::Monthly
    }
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "WEEKLY",
            Self::Biweekly => "BIWEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Quarterly => "QUARTERLY",
            Self::Semiannually => "SEMIANNUALLY",
            Self::Yearly => "YEARLY",
        }
    }
}

impl std::str::FromStr for BillingCycle {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "WEEKLY" => Self::Weekly,
            "BIWEEKLY" => Self::Biweekly,
            "QUARTERLY" => Self::Quarterly,
            "SEMIANNUALLY" => Self::Semiannually,
            "YEARLY" => Self::Yearly,
            _ => Self::Monthly,
        })
    }
}

impl std::fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

mod calculator;
mod policy;

pub use calculator::{compute, CommissionError};
pub use policy::{resolve_policy, tds_rate_percent, SplitPolicy};

use rust_decimal::Decimal;

use super::domain::{BrokerChain, CommissionBreakdown, CommissionPlan};

/// Resolve the split table for the enquiry's broker chain and compute the
/// exact breakdown in one step.
pub fn breakdown_for(
    chain: &BrokerChain,
    plan: &CommissionPlan,
    deal_amount: Decimal,
) -> Result<CommissionBreakdown, CommissionError> {
    let policy = resolve_policy(chain);
    compute(deal_amount, plan, &policy)
}

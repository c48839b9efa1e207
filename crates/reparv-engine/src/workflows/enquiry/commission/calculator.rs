use rust_decimal::Decimal;

use super::super::domain::{CommissionBreakdown, CommissionPlan};
use super::policy::{tds_rate_percent, SplitPolicy};

/// Calculator failures. Both are client-fixable input problems.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommissionError {
    #[error("deal amount must be positive for percentage commission, got {amount}")]
    InvalidDealAmount { amount: Decimal },
    #[error("property commission configuration is unusable: {reason}")]
    InvalidCommissionConfig { reason: String },
}

/// Compute the exact monetary split of the brokerage commission.
///
/// All arithmetic stays in `Decimal`; nothing is rounded mid-calculation,
/// so the persisted components always sum back to the total. Taxed shares
/// are returned net of TDS and the withheld amounts are aggregated in
/// `tds`.
pub fn compute(
    deal_amount: Decimal,
    plan: &CommissionPlan,
    policy: &SplitPolicy,
) -> Result<CommissionBreakdown, CommissionError> {
    let total = total_commission(deal_amount, plan)?;
    let hundred = Decimal::from(100u32);
    let rate = tds_rate_percent();

    let reparv = total * policy.reparv_percent / hundred;
    let sales_gross = total * policy.sales_percent / hundred;
    let territory_gross = total * policy.territory_percent / hundred;
    let project_gross = total * policy.project_percent / hundred;

    let sales_tds = sales_gross * rate / hundred;
    let territory_tds = territory_gross * rate / hundred;
    let project_tds = project_gross * rate / hundred;

    Ok(CommissionBreakdown {
        total_commission: total,
        reparv_commission: reparv,
        sales_commission: sales_gross - sales_tds,
        territory_commission: territory_gross - territory_tds,
        project_commission: project_gross - project_tds,
        tds: sales_tds + territory_tds + project_tds,
    })
}

fn total_commission(
    deal_amount: Decimal,
    plan: &CommissionPlan,
) -> Result<Decimal, CommissionError> {
    match plan {
        CommissionPlan::Percentage { percent } => {
            if *percent <= Decimal::ZERO {
                return Err(CommissionError::InvalidCommissionConfig {
                    reason: format!("non-positive commission percentage {percent}"),
                });
            }
            if deal_amount <= Decimal::ZERO {
                return Err(CommissionError::InvalidDealAmount {
                    amount: deal_amount,
                });
            }
            Ok(deal_amount * *percent / Decimal::from(100u32))
        }
        CommissionPlan::Flat { amount } => {
            if *amount <= Decimal::ZERO {
                return Err(CommissionError::InvalidCommissionConfig {
                    reason: format!("non-positive flat commission {amount}"),
                });
            }
            Ok(*amount)
        }
    }
}

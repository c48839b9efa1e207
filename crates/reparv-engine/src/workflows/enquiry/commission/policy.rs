use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::super::domain::BrokerChain;

/// Gross percentages of the total commission assigned to each party.
///
/// Every partner share is taxed at [`tds_rate_percent`] on its gross value;
/// Reparv's own share is never taxed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitPolicy {
    pub reparv_percent: Decimal,
    pub sales_percent: Decimal,
    pub territory_percent: Decimal,
    pub project_percent: Decimal,
}

impl SplitPolicy {
    fn from_whole(reparv: u32, sales: u32, territory: u32, project: u32) -> Self {
        Self {
            reparv_percent: Decimal::from(reparv),
            sales_percent: Decimal::from(sales),
            territory_percent: Decimal::from(territory),
            project_percent: Decimal::from(project),
        }
    }

    pub fn gross_total_percent(&self) -> Decimal {
        self.reparv_percent + self.sales_percent + self.territory_percent + self.project_percent
    }
}

/// Withholding rate applied to each taxed gross share, in percent.
pub fn tds_rate_percent() -> Decimal {
    Decimal::from(2u32)
}

/// The split table, keyed by which partner tier originated the lead.
///
/// Leads owned by a territory or project partner share one row: the 40%
/// partner cut goes to the project side and 20% to the territory side.
/// House leads route the partner cut to the internal sales team instead.
pub fn resolve_policy(chain: &BrokerChain) -> SplitPolicy {
    match chain {
        BrokerChain::Sales(_) => SplitPolicy::from_whole(40, 40, 0, 20),
        BrokerChain::Territory(_) | BrokerChain::Project(_) => {
            SplitPolicy::from_whole(40, 0, 20, 40)
        }
        BrokerChain::House => SplitPolicy::from_whole(40, 40, 20, 0),
    }
}

//! Commission engine specifications driven through the public facade.

use rust_decimal::Decimal;

use reparv_engine::workflows::enquiry::{
    breakdown_for, resolve_policy, BrokerChain, CommissionError, CommissionPlan, PartnerId,
};

fn partner(id: &str) -> PartnerId {
    PartnerId(id.to_string())
}

fn two_percent() -> CommissionPlan {
    CommissionPlan::Percentage {
        percent: Decimal::from(2u32),
    }
}

#[test]
fn sales_lead_example_from_the_rate_card() {
    let breakdown = breakdown_for(
        &BrokerChain::Sales(partner("SP-1")),
        &two_percent(),
        Decimal::from(1_000_000u32),
    )
    .expect("computes");

    assert_eq!(breakdown.total_commission, Decimal::from(20_000u32));
    assert_eq!(breakdown.reparv_commission, Decimal::from(8_000u32));
    assert_eq!(breakdown.sales_commission, Decimal::from(7_840u32));
    assert_eq!(breakdown.territory_commission, Decimal::ZERO);
    assert_eq!(breakdown.project_commission, Decimal::from(3_920u32));
    assert_eq!(breakdown.tds, Decimal::from(240u32));
}

#[test]
fn breakdowns_balance_across_origins_plans_and_awkward_amounts() {
    let chains = [
        BrokerChain::House,
        BrokerChain::Sales(partner("SP-1")),
        BrokerChain::Territory(partner("TP-2")),
        BrokerChain::Project(partner("PP-3")),
    ];
    let plans = [
        two_percent(),
        CommissionPlan::Percentage {
            percent: Decimal::new(275, 2), // 2.75%
        },
        CommissionPlan::Flat {
            amount: Decimal::from(99_999u32),
        },
    ];
    let amounts = [
        Decimal::from(1u32),
        Decimal::from(333_333u32),
        Decimal::from(12_345_678u32),
        Decimal::new(450_000_050, 2), // 4,500,000.50
    ];

    for chain in &chains {
        for plan in &plans {
            for amount in &amounts {
                let breakdown = breakdown_for(chain, plan, *amount).expect("computes");
                assert!(
                    breakdown.balanced(),
                    "breakdown drifted for {chain:?} / {plan:?} / {amount}"
                );
            }
        }
    }
}

#[test]
fn reparv_share_is_never_taxed() {
    for chain in [
        BrokerChain::House,
        BrokerChain::Sales(partner("SP-1")),
        BrokerChain::Territory(partner("TP-2")),
    ] {
        let policy = resolve_policy(&chain);
        let breakdown =
            breakdown_for(&chain, &two_percent(), Decimal::from(1_000_000u32)).expect("computes");
        let expected_reparv =
            breakdown.total_commission * policy.reparv_percent / Decimal::from(100u32);
        assert_eq!(breakdown.reparv_commission, expected_reparv);
    }
}

#[test]
fn misconfigured_properties_are_rejected() {
    let result = breakdown_for(
        &BrokerChain::House,
        &CommissionPlan::Flat {
            amount: Decimal::ZERO,
        },
        Decimal::from(1_000_000u32),
    );
    assert!(matches!(
        result,
        Err(CommissionError::InvalidCommissionConfig { .. })
    ));

    let zero_deal = breakdown_for(&BrokerChain::House, &two_percent(), Decimal::ZERO);
    assert!(matches!(
        zero_deal,
        Err(CommissionError::InvalidDealAmount { .. })
    ));
}

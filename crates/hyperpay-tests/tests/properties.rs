//! Property tests over routing arithmetic: conservation and bounded
//! truncation leakage regardless of amount or split shape.

use proptest::prelude::*;

use hyperpay_categories::{CategoryHandler, ClaimsRegistry, DepositClaim};
use hyperpay_core::constants::FULL_PERCENT;
use hyperpay_core::ledger::ProductLedger;
use hyperpay_core::token::TokenBank;
use hyperpay_engine::{Flow, HyperpayEngine, Spline};
use hyperpay_tests::helpers::*;

/// A random partition of the full percentage budget into 1..=6 cuts.
fn percentage_partition() -> impl Strategy<Value = Vec<u64>> {
    proptest::collection::vec(1..FULL_PERCENT, 0..5).prop_map(|mut cuts| {
        cuts.sort_unstable();
        cuts.push(FULL_PERCENT);
        let mut previous = 0;
        let mut parts = Vec::with_capacity(cuts.len());
        for cut in cuts {
            if cut > previous {
                parts.push(cut - previous);
                previous = cut;
            }
        }
        parts
    })
}

proptest! {
    #[test]
    fn ledger_splits_conserve_value(
        amount in 0u128..=u128::MAX / 1_000_000_000_000_000_000,
        parts in percentage_partition(),
    ) {
        let mut ledger = ProductLedger::new();
        ledger.store_initial_product("r", amount).unwrap();

        let mut total: u128 = 0;
        for &p in &parts {
            total += ledger.split("r", p).unwrap().delivered;
        }

        // Cuts summed to 100%, so the product is gone.
        prop_assert!(ledger.is_empty());
        // Delivered never exceeds the original, and truncation loses at
        // most one base unit per split.
        prop_assert!(total <= amount);
        prop_assert!(amount - total <= parts.len() as u128);
    }

    #[test]
    fn each_split_is_independent_of_firing_order(
        amount in 1u128..=u128::MAX / 1_000_000_000_000_000_000,
        parts in percentage_partition(),
    ) {
        // Delivering p% must give floor(amount * p / 100%) no matter how
        // many splits came before it.
        let mut ledger = ProductLedger::new();
        ledger.store_initial_product("r", amount).unwrap();
        for &p in &parts {
            let delivered = ledger.split("r", p).unwrap().delivered;
            prop_assert_eq!(delivered, amount * p as u128 / FULL_PERCENT as u128);
        }
    }
}

/// Build a two-way specification: business takes `p`, partner takes the
/// rest.
fn two_way_engine(p: u64) -> (HyperpayEngine, u64) {
    let mut engine = HyperpayEngine::new(engine_addr());
    engine.register_handler(CategoryHandler::DepositClaim(DepositClaim::new(customer_addr())));
    engine.register_handler(CategoryHandler::ClaimsRegistry(ClaimsRegistry::new(business_addr())));
    engine.register_handler(CategoryHandler::ClaimsRegistry(ClaimsRegistry::new(addr(7))));
    let spec_id = engine.create_specification(
        "spec.example/two-way",
        vec![
            ("customer".to_string(), customer_addr()),
            ("business".to_string(), business_addr()),
            ("partner".to_string(), addr(7)),
        ],
        vec![
            ("customer".to_string(), token()),
            ("business".to_string(), token()),
            ("partner".to_string(), token()),
        ],
        3,
    );
    engine
        .add_splines(
            spec_id,
            vec![
                Spline { before_junction: 0, after_junction: 0, category: "customer".into() },
                Spline { before_junction: 0, after_junction: 0, category: "business".into() },
                Spline { before_junction: 0, after_junction: 0, category: "partner".into() },
            ],
        )
        .unwrap();
    engine
        .add_flows(
            spec_id,
            vec![
                Flow { from: "customer".into(), to: "customer".into(), percentage: FULL_PERCENT },
                Flow { from: "customer".into(), to: "business".into(), percentage: p },
                Flow { from: "customer".into(), to: "partner".into(), percentage: FULL_PERCENT - p },
            ],
        )
        .unwrap();
    (engine, spec_id)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn routed_payments_conserve_tokens(
        amount in 1u128..=1_000_000u128 * UNIT,
        p in 1..FULL_PERCENT,
    ) {
        let (mut engine, spec_id) = two_way_engine(p);
        let project_id = engine
            .create_project(
                spec_id,
                vec![
                    ("business".into(), business_payload()),
                    ("partner".into(), business_payload()),
                ],
            )
            .unwrap();
        let payload = deposit_payload(1, amount);
        fund_deposit(&mut engine, spec_id, project_id, &payload, amount);
        engine.hyperpay(spec_id, project_id, &payload).unwrap();

        let business = engine.bank().balance_of(&token(), &business_addr());
        let partner = engine.bank().balance_of(&token(), &addr(7));
        let stranded = engine.bank().balance_of(&token(), &engine_addr());

        prop_assert_eq!(business, amount * p as u128 / FULL_PERCENT as u128);
        prop_assert_eq!(
            partner,
            amount * (FULL_PERCENT - p) as u128 / FULL_PERCENT as u128
        );
        // Truncation dust stays on the engine account, at most one unit
        // per non-initial spline.
        prop_assert_eq!(business + partner + stranded, amount);
        prop_assert!(stranded <= 2);
        prop_assert_eq!(engine.product_count(), 0);
    }
}

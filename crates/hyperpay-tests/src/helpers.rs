//! Shared fixtures: the published open-source routing specification and
//! its standard project.

use hyperpay_categories::{CategoryHandler, ClaimsRegistry, DepositClaim, LedgerFanOut};
use hyperpay_core::constants::{FULL_PERCENT, PERCENT};
use hyperpay_core::payload::{ClaimPayload, DepositPayload, SharesPayload};
use hyperpay_core::types::{Address, ProjectId, SpecId};
use hyperpay_engine::{Flow, HyperpayEngine, Spline};

/// One 18-decimal token.
pub const UNIT: u128 = 1_000_000_000_000_000_000;

/// Simple account address from a seed byte.
pub fn addr(seed: u8) -> Address {
    Address([seed; 32])
}

/// The engine's own account.
pub fn engine_addr() -> Address {
    addr(9)
}

/// The test token every resource is denominated in.
pub fn token() -> Address {
    addr(0xEE)
}

/// Category accounts of the open-source specification.
pub fn customer_addr() -> Address {
    addr(1)
}
pub fn business_addr() -> Address {
    addr(2)
}
pub fn environment_addr() -> Address {
    addr(3)
}
pub fn dep_addr() -> Address {
    addr(4)
}

/// The business project owner's payout account.
pub fn withdrawer_addr() -> Address {
    addr(5)
}

fn spline(before: u64, after: u64, category: &str) -> Spline {
    Spline { before_junction: before, after_junction: after, category: category.into() }
}

fn flow(from: &str, to: &str, percentage: u64) -> Flow {
    Flow { from: from.into(), to: to.into(), percentage }
}

/// Engine loaded with the 4-spline open-source specification:
/// customer 100% (initial), business 80%, environment 0.1%, dep 19.9%.
pub fn open_source_engine() -> (HyperpayEngine, SpecId) {
    let mut engine = HyperpayEngine::new(engine_addr());
    engine.register_handler(CategoryHandler::DepositClaim(DepositClaim::new(customer_addr())));
    engine.register_handler(CategoryHandler::ClaimsRegistry(ClaimsRegistry::new(business_addr())));
    engine.register_handler(CategoryHandler::LedgerFanOut(LedgerFanOut::new(environment_addr())));
    engine.register_handler(CategoryHandler::LedgerFanOut(LedgerFanOut::new(dep_addr())));

    let categories = vec![
        ("customer".to_string(), customer_addr()),
        ("business".to_string(), business_addr()),
        ("environment".to_string(), environment_addr()),
        ("dep".to_string(), dep_addr()),
    ];
    let resources = ["customer", "business", "environment", "dep"]
        .into_iter()
        .map(|name| (name.to_string(), token()))
        .collect();
    let spec_id = engine.create_specification(
        "hyperpayment.org/specification/opensource-hyperpayment-specification",
        categories,
        resources,
        4,
    );
    engine
        .add_splines(
            spec_id,
            vec![
                spline(0, 0, "customer"),
                spline(3, 0, "business"),
                spline(0, 0, "environment"),
                spline(0, 2, "dep"),
            ],
        )
        .unwrap();
    engine
        .add_flows(
            spec_id,
            vec![
                flow("customer", "customer", FULL_PERCENT),
                flow("customer", "business", 80 * PERCENT),
                flow("customer", "environment", PERCENT / 10),
                flow("customer", "dep", 19 * PERCENT + 9 * PERCENT / 10),
            ],
        )
        .unwrap();
    (engine, spec_id)
}

/// Registration payload of the business project owner.
pub fn business_payload() -> Vec<u8> {
    ClaimPayload {
        purl: "pkg:git@github.com/acme/project.git".into(),
        username: "acme".into(),
        auth_provider: "github.com".into(),
        withdrawer: withdrawer_addr(),
    }
    .encode()
}

/// A fan-out registration payload over the given share names.
pub fn shares_payload(names: &[&str]) -> Vec<u8> {
    SharesPayload { names: names.iter().map(|s| s.to_string()).collect() }.encode()
}

/// Create the standard project: business owner, one environment share,
/// two dependency shares.
pub fn standard_project(engine: &mut HyperpayEngine, spec_id: SpecId) -> ProjectId {
    engine
        .create_project(
            spec_id,
            vec![
                ("business".into(), business_payload()),
                ("environment".into(), shares_payload(&["env:charity"])),
                (
                    "dep".into(),
                    shares_payload(&["pkg:npm/left-pad@latest", "pkg:npm/is-even@latest"]),
                ),
            ],
        )
        .unwrap()
}

/// Deposit claim payload for `counter` declaring `amount` of the test
/// token under the "customer" resource.
pub fn deposit_payload(counter: u64, amount: u128) -> Vec<u8> {
    DepositPayload {
        counter,
        amount,
        resource_token: token(),
        resource_name: "customer".into(),
    }
    .encode()
}

/// Fund the counterfactual deposit slot for `payload` with `amount`.
pub fn fund_deposit(
    engine: &mut HyperpayEngine,
    spec_id: SpecId,
    project_id: ProjectId,
    payload: &[u8],
    amount: u128,
) {
    let slot = hyperpay_categories::deposit::calculated_address(spec_id, project_id, payload);
    engine.bank_mut().mint(&token(), &slot, amount).unwrap();
}

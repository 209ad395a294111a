//! Runs the gateway conformance suite against the in-memory contract.

use vault_chain::conformance::run_conformance_suite;
use vault_chain::MemoryContract;

fn fresh_contract() -> MemoryContract {
    let contract = MemoryContract::new("0x00000000000000000000000000000000000c0ffe");
    contract.connect_signer("0x1111111111111111111111111111111111111111");
    contract
}

#[tokio::test]
async fn memory_contract_passes_conformance() {
    let report = run_conformance_suite(|| async { fresh_contract() }).await;

    assert_eq!(report.total(), 6);
    assert!(report.is_clean(), "{report}");
}

#[tokio::test]
async fn missing_signer_is_reported_per_check() {
    let report = run_conformance_suite(|| async {
        let contract = fresh_contract();
        contract.disconnect_signer();
        contract
    })
    .await;

    // Only the lookup of an unknown id needs no signer.
    assert_eq!(report.failures.len(), 5);
    assert!(report
        .failures
        .iter()
        .all(|f| f.check != "unknown_record_is_not_found"));
    assert!(report.to_string().starts_with("gateway conformance: 6 checks, 5 failed"));
}

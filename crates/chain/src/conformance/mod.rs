//! Conformance test suite for contract gateway implementations.
//!
//! Any [`ContractConnector`] backed by a real provider or a local double can
//! run these checks to see that it behaves the way the workflow engine
//! expects: records are enumerable and unique, and verification stores the
//! clear value exactly once.
//!
//! ```ignore
//! let report = run_conformance_suite(|| async { connect_devnet().await }).await;
//! assert!(report.is_clean(), "{report}");
//! ```
//!
//! The factory must return a connector with a signer attached and an empty
//! contract behind it.

mod records;
mod verification;

use std::fmt;
use std::future::Future;

use crate::ContractConnector;

/// A check that did not hold, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckFailure {
    pub check: &'static str,
    pub reason: String,
}

/// Outcome of a conformance run.
#[derive(Debug, Clone, Default)]
pub struct ConformanceReport {
    /// Every check that ran, in order.
    pub checks: Vec<&'static str>,
    pub failures: Vec<CheckFailure>,
}

impl ConformanceReport {
    pub fn total(&self) -> usize {
        self.checks.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, check: &'static str, outcome: Result<(), String>) {
        self.checks.push(check);
        if let Err(reason) = outcome {
            self.failures.push(CheckFailure { check, reason });
        }
    }
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "gateway conformance: {} checks, {} failed",
            self.total(),
            self.failures.len()
        )?;
        for failure in &self.failures {
            writeln!(f, "  {}: {}", failure.check, failure.reason)?;
        }
        Ok(())
    }
}

/// Run every conformance check against a gateway implementation.
///
/// `factory` is called once per check so each check starts from an empty
/// contract.
pub async fn run_conformance_suite<C, F, Fut>(factory: F) -> ConformanceReport
where
    C: ContractConnector,
    F: Fn() -> Fut,
    Fut: Future<Output = C>,
{
    let mut report = ConformanceReport::default();
    report.record(
        "created_record_is_enumerated",
        records::created_record_is_enumerated(&factory().await).await,
    );
    report.record(
        "fields_round_trip_unverified",
        records::fields_round_trip_unverified(&factory().await).await,
    );
    report.record(
        "unknown_record_is_not_found",
        records::unknown_record_is_not_found(&factory().await).await,
    );
    report.record(
        "duplicate_id_is_refused",
        records::duplicate_id_is_refused(&factory().await).await,
    );
    report.record(
        "verification_stores_clear_value",
        verification::verification_stores_clear_value(&factory().await).await,
    );
    report.record(
        "second_verification_is_already_verified",
        verification::second_verification_is_already_verified(&factory().await).await,
    );
    report
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Ciphertext stand-in. Gateways treat it as opaque bytes.
const CIPHERTEXT: [u8; 32] = [0x5a; 32];
const PROOF: &[u8] = b"conformance-proof";

async fn create_record<C: ContractConnector>(connector: &C, id: &str) -> Result<(), String> {
    let writer = connector
        .with_signer()
        .await
        .ok_or_else(|| "factory returned a connector without a signer".to_string())?;
    let tx = writer
        .create_business_data(id, "Sample", &CIPHERTEXT, PROOF, 7, 0, "conformance record")
        .await
        .map_err(|e| format!("create {id}: {e}"))?;
    tx.wait()
        .await
        .map_err(|e| format!("confirm create {id}: {e}"))?;
    Ok(())
}

//! Startup registration of every node account as an oracle

use std::sync::Arc;

use tracing::{info, warn};

use crate::chain::{AccountSource, Address, ContractError, OracleContract};
use crate::models::oracle::RegistrationReport;

/// Immutable, shared list of accounts acting as oracles
pub type AccountRoster = Arc<[Address]>;

pub async fn load_roster(source: &dyn AccountSource) -> Result<AccountRoster, ContractError> {
    let accounts = source.accounts().await?;
    info!(accounts = accounts.len(), "loaded oracle accounts");
    Ok(accounts.into())
}

/// Register each roster account, paying the contract's registration fee.
///
/// Reading the fee is the only fatal step. Accounts are registered one after
/// another; one that fails is reported and skipped, it will simply hold no
/// indexes when requests arrive.
pub async fn register_oracles(
    contract: &dyn OracleContract,
    roster: &[Address],
    gas: u64,
) -> Result<RegistrationReport, ContractError> {
    let fee = contract.registration_fee().await?;
    info!(fee = %fee, oracles = roster.len(), gas, "registering oracles");

    let mut report = RegistrationReport {
        fee,
        registered: Vec::with_capacity(roster.len()),
        failed: Vec::new(),
    };

    for &account in roster {
        match contract.register_oracle(account, fee, gas).await {
            Ok(receipt) => {
                info!(oracle = %account, tx = %receipt.transaction_hash, "oracle registered");
                report.registered.push(account);
            }
            Err(err) => {
                warn!(oracle = %account, error = %err, "oracle registration failed");
                report.failed.push((account, err));
            }
        }
    }

    info!(
        registered = report.registered.len(),
        failed = report.failed.len(),
        "oracle registration finished"
    );
    Ok(report)
}

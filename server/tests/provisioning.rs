mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{flight_request, provisioned_pool, signer, MockChain, POOL_SIZE};
use flightsurety_oracles::config::OracleConfig;
use flightsurety_oracles::error::ConfigError;
use flightsurety_oracles::matcher::match_request;
use flightsurety_oracles::pool::{EntryState, IdentityPool};
use flightsurety_oracles::services::{resolve_signers, ProvisioningService};

fn oracle_config(accounts: Option<Vec<ethers_core::types::Address>>, offset: usize, count: usize) -> OracleConfig {
    OracleConfig {
        accounts,
        account_offset: offset,
        count,
        index_max: 9,
        provisioning_timeout: Duration::from_secs(5),
        submission_timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn every_provisioned_oracle_holds_three_distinct_indices() {
    let chain = MockChain::with_oracles(POOL_SIZE);
    let pool = provisioned_pool(&chain).await;

    assert_eq!(pool.assigned_count(), POOL_SIZE);
    for identity in pool.identities() {
        let [a, b, c] = identity.indices;
        assert!(a != b && a != c && b != c, "{:?}", identity);
        assert!(identity.indices.iter().all(|index| *index <= pool.index_max()));
    }
    assert_eq!(chain.state().registrations.len(), POOL_SIZE);
}

#[tokio::test]
async fn one_rejected_registration_leaves_the_rest_available() {
    let chain = MockChain::with_oracles(POOL_SIZE);
    chain.state().reject_registration.insert(signer(12));

    let accounts = chain.state().accounts.clone();
    let pool = Arc::new(IdentityPool::new(accounts, 9).unwrap());
    let summary = ProvisioningService::new(chain.clone(), pool.clone(), Duration::from_secs(5))
        .run()
        .await;

    assert_eq!(summary.succeeded, 24);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].0, signer(12));
    assert!(summary.failures[0].1.contains("registerOracle failed"));

    assert_eq!(pool.assigned_count(), 24);
    assert!(matches!(
        pool.snapshot()[12].state,
        EntryState::Failed { .. }
    ));
    assert!(pool.pending().is_empty());
}

#[tokio::test]
async fn failed_oracles_never_match() {
    let chain = MockChain::with_oracles(POOL_SIZE);
    // signer 7 would hold index 9 together with a few others
    chain.state().reject_registration.insert(signer(7));
    let pool = provisioned_pool(&chain).await;

    for index in [2, 5, 9] {
        let matched = match_request(&pool, &flight_request(index, "ND1309"));
        assert!(matched.iter().all(|identity| identity.signer != signer(7)));
    }
    assert!(pool.eligible_for(9).iter().all(|s| *s != signer(7)));
}

#[tokio::test]
async fn a_stalled_registration_times_out_without_blocking_the_others() {
    let chain = MockChain::with_oracles(5);
    chain.state().stall_registration.insert(signer(3));

    let accounts = chain.state().accounts.clone();
    let pool = Arc::new(IdentityPool::new(accounts, 9).unwrap());
    let summary = ProvisioningService::new(chain.clone(), pool.clone(), Duration::from_millis(100))
        .run()
        .await;

    assert_eq!(summary.succeeded, 4);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].0, signer(3));
    assert!(summary.failures[0].1.contains("timed out"));
}

#[tokio::test]
async fn signers_come_from_the_node_account_window() {
    let chain = MockChain::with_oracles(50);

    let signers = resolve_signers(&oracle_config(None, 20, 25), &*chain).await.unwrap();
    assert_eq!(signers.len(), 25);
    assert_eq!(signers[0], signer(20));
    assert_eq!(signers[24], signer(44));
}

#[tokio::test]
async fn too_few_node_accounts_is_a_configuration_error() {
    let chain = MockChain::with_oracles(30);

    let err = resolve_signers(&oracle_config(None, 20, 25), &*chain)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::NotEnoughAccounts { available: 30, required: 45, .. }
    ));
}

#[tokio::test]
async fn explicit_accounts_still_require_a_reachable_node() {
    let chain = MockChain::with_oracles(0);
    let accounts = vec![signer(1), signer(2)];

    let signers = resolve_signers(&oracle_config(Some(accounts.clone()), 20, 2), &*chain)
        .await
        .unwrap();
    assert_eq!(signers, accounts);

    chain.state().unreachable = true;
    let err = resolve_signers(&oracle_config(Some(accounts), 20, 2), &*chain)
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::ChainUnreachable(_)));
}

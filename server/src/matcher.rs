//! Request-to-oracle matching

use crate::models::{OracleIdentity, RequestRecord};
use crate::pool::IdentityPool;

/// Identities eligible to answer `record`, in pool order.
///
/// Computed fresh on every call. Entries that are pending or failed never
/// match, and since each signer holds one pool entry no identity appears twice.
pub fn match_request(pool: &IdentityPool, record: &RequestRecord) -> Vec<OracleIdentity> {
    pool.identities()
        .filter(|identity| identity.responds_to(record.index))
        .collect()
}

#[cfg(test)]
mod tests {
    use ethers_core::types::{Address, U256};

    use super::*;

    fn record(index: u8) -> RequestRecord {
        RequestRecord::new(index, Address::repeat_byte(0xa1), "ND1309", U256::from(1_600_000_000u64))
    }

    #[test]
    fn returns_exactly_the_eligible_subset_in_pool_order() {
        let signers: Vec<Address> = (1..=6).map(Address::from_low_u64_be).collect();
        let pool = IdentityPool::new(signers.clone(), 9).unwrap();
        pool.assign(signers[4], [1, 2, 3]).unwrap();
        pool.assign(signers[0], [3, 4, 5]).unwrap();
        pool.assign(signers[2], [6, 7, 8]).unwrap();
        pool.mark_failed(signers[1], "reverted").unwrap();
        pool.assign(signers[5], [0, 3, 9]).unwrap();

        let matched: Vec<Address> = match_request(&pool, &record(3)).iter().map(|i| i.signer).collect();
        assert_eq!(matched, vec![signers[0], signers[4], signers[5]]);

        let matched = match_request(&pool, &record(7));
        assert_eq!(matched, vec![OracleIdentity { signer: signers[2], indices: [6, 7, 8] }]);
    }

    #[test]
    fn no_match_is_empty_not_an_error() {
        let pool = IdentityPool::new(vec![Address::from_low_u64_be(1)], 9).unwrap();
        pool.assign(Address::from_low_u64_be(1), [0, 1, 2]).unwrap();
        assert!(match_request(&pool, &record(3)).is_empty());
    }
}

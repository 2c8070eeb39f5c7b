//! Identity pool: the fixed set of simulated oracle signers and their index assignments
//!
//! Entries are keyed by signer. Each entry resolves at most once, either to its
//! three assigned indices or to a provisioning failure, and is published through a
//! `OnceLock` so readers never need a lock and never see a partial assignment.

use std::collections::HashMap;
use std::sync::OnceLock;

use ethers_core::types::Address;
use serde::Serialize;

use crate::error::{ConfigError, PoolError};
use crate::models::OracleIdentity;

/// Number of indices the app contract hands out per oracle.
pub const INDICES_PER_ORACLE: usize = 3;

#[derive(Debug, Clone)]
enum Resolution {
    Assigned([u8; INDICES_PER_ORACLE]),
    Failed(String),
}

#[derive(Debug)]
struct PoolEntry {
    signer: Address,
    resolution: OnceLock<Resolution>,
}

#[derive(Debug)]
pub struct IdentityPool {
    entries: Vec<PoolEntry>,
    positions: HashMap<Address, usize>,
    index_max: u8,
}

/// Operator-facing state of a single pool entry
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EntryState {
    Pending,
    Assigned { indices: [u8; INDICES_PER_ORACLE] },
    Failed { reason: String },
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct EntrySnapshot {
    pub position: usize,
    pub signer: Address,
    #[serde(flatten)]
    pub state: EntryState,
}

impl IdentityPool {
    /// Builds the pool in the given order. Indices must fall in `0..=index_max`.
    pub fn new(signers: Vec<Address>, index_max: u8) -> Result<Self, ConfigError> {
        if signers.is_empty() {
            return Err(ConfigError::NoIdentities);
        }

        let mut positions = HashMap::with_capacity(signers.len());
        let mut entries = Vec::with_capacity(signers.len());
        for (position, signer) in signers.into_iter().enumerate() {
            if positions.insert(signer, position).is_some() {
                return Err(ConfigError::DuplicateIdentity(signer));
            }
            entries.push(PoolEntry {
                signer,
                resolution: OnceLock::new(),
            });
        }

        Ok(Self {
            entries,
            positions,
            index_max,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index_max(&self) -> u8 {
        self.index_max
    }

    /// Signers in pool order.
    pub fn signers(&self) -> impl Iterator<Item = Address> + '_ {
        self.entries.iter().map(|entry| entry.signer)
    }

    pub fn position(&self, signer: &Address) -> Option<usize> {
        self.positions.get(signer).copied()
    }

    /// Records the indices the contract assigned to `signer`. Allowed once per signer.
    pub fn assign(&self, signer: Address, indices: [u8; INDICES_PER_ORACLE]) -> Result<(), PoolError> {
        if !self.valid_indices(&indices) {
            return Err(PoolError::InvalidIndices {
                indices,
                max: self.index_max,
            });
        }

        self.resolve(signer, Resolution::Assigned(indices))
    }

    /// Records why `signer` could not be provisioned. The entry stays in the
    /// pool so the failure remains visible, but it never matches a request.
    pub fn mark_failed(&self, signer: Address, reason: impl Into<String>) -> Result<(), PoolError> {
        self.resolve(signer, Resolution::Failed(reason.into()))
    }

    fn resolve(&self, signer: Address, resolution: Resolution) -> Result<(), PoolError> {
        let entry = self
            .position(&signer)
            .map(|position| &self.entries[position])
            .ok_or(PoolError::UnknownSigner(signer))?;

        entry.resolution.set(resolution).map_err(|_| match entry.resolution.get() {
            Some(Resolution::Failed(_)) => PoolError::AlreadyFailed(signer),
            _ => PoolError::AlreadyAssigned(signer),
        })
    }

    fn valid_indices(&self, indices: &[u8; INDICES_PER_ORACLE]) -> bool {
        let distinct = indices[0] != indices[1] && indices[0] != indices[2] && indices[1] != indices[2];
        distinct && indices.iter().all(|index| *index <= self.index_max)
    }

    /// Provisioned identities in pool order. Pending and failed entries are skipped.
    pub fn identities(&self) -> impl Iterator<Item = OracleIdentity> + '_ {
        self.entries.iter().filter_map(|entry| match entry.resolution.get() {
            Some(Resolution::Assigned(indices)) => Some(OracleIdentity {
                signer: entry.signer,
                indices: *indices,
            }),
            _ => None,
        })
    }

    /// Signers allowed to answer a request tagged with `index`.
    pub fn eligible_for(&self, index: u8) -> Vec<Address> {
        self.identities()
            .filter(|identity| identity.responds_to(index))
            .map(|identity| identity.signer)
            .collect()
    }

    /// Signers whose provisioning has not resolved yet.
    pub fn pending(&self) -> Vec<Address> {
        self.entries
            .iter()
            .filter(|entry| entry.resolution.get().is_none())
            .map(|entry| entry.signer)
            .collect()
    }

    pub fn assigned_count(&self) -> usize {
        self.identities().count()
    }

    /// Failure reasons in pool order.
    pub fn failures(&self) -> Vec<(Address, String)> {
        self.entries
            .iter()
            .filter_map(|entry| match entry.resolution.get() {
                Some(Resolution::Failed(reason)) => Some((entry.signer, reason.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn snapshot(&self) -> Vec<EntrySnapshot> {
        self.entries
            .iter()
            .enumerate()
            .map(|(position, entry)| EntrySnapshot {
                position,
                signer: entry.signer,
                state: match entry.resolution.get() {
                    None => EntryState::Pending,
                    Some(Resolution::Assigned(indices)) => EntryState::Assigned { indices: *indices },
                    Some(Resolution::Failed(reason)) => EntryState::Failed {
                        reason: reason.clone(),
                    },
                },
            })
            .collect()
    }
}

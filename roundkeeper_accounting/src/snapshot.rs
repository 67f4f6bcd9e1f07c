// Copyright (C) 2024, 2025 Roundkeeper Developers (see AUTHORS)
//
// This file is part of Roundkeeper
//
// Roundkeeper is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Roundkeeper is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// Roundkeeper. If not, see <https://www.gnu.org/licenses/>.

//! Read snapshot taken right before commands are built.
//!
//! The snapshot must reflect the store at, or just before, the moment the
//! batch is built. Staleness here is the only source of an acceptable race:
//! it can only skew the submitting worker's own time and luck figures.

use crate::chain::{CHAIN_COUNT, Chain};
use std::collections::HashMap;

/// Snapshot of one chain's open round.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainSnapshot {
    /// worker -> accumulated effective difficulty
    pub shares: HashMap<String, f64>,
    /// worker -> last submission epoch ms
    pub submissions: HashMap<String, u64>,
}

impl ChainSnapshot {
    /// Sum of all accumulated effective difficulty in the round.
    pub fn total_shares(&self) -> f64 {
        self.shares.values().sum()
    }

    pub fn last_submission(&self, worker: &str) -> Option<u64> {
        self.submissions.get(worker).copied()
    }
}

/// Snapshots for every chain, indexed by chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadResults {
    chains: [ChainSnapshot; CHAIN_COUNT],
}

impl ReadResults {
    /// Build from the positional bundle
    /// `[primaryShares, primarySubmissions, auxiliaryShares, auxiliarySubmissions]`.
    ///
    /// Missing entries are treated as empty maps, so an empty bundle means
    /// nothing has been recorded in the open rounds yet.
    pub fn from_bundle(bundle: Vec<HashMap<String, f64>>) -> Self {
        let mut results = ReadResults::default();
        let mut entries = bundle.into_iter();
        for chain in Chain::ALL {
            let snapshot = &mut results.chains[chain.index()];
            snapshot.shares = entries.next().unwrap_or_default();
            snapshot.submissions = entries
                .next()
                .unwrap_or_default()
                .into_iter()
                .map(|(worker, time)| (worker, time.max(0.0) as u64))
                .collect();
        }
        results
    }

    pub fn chain(&self, chain: Chain) -> &ChainSnapshot {
        &self.chains[chain.index()]
    }

    pub fn chain_mut(&mut self, chain: Chain) -> &mut ChainSnapshot {
        &mut self.chains[chain.index()]
    }

    pub fn with_shares(mut self, chain: Chain, worker: &str, shares: f64) -> Self {
        self.chain_mut(chain).shares.insert(worker.to_string(), shares);
        self
    }

    pub fn with_submission(mut self, chain: Chain, worker: &str, time: u64) -> Self {
        self.chain_mut(chain)
            .submissions
            .insert(worker.to_string(), time);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bundle_positions() {
        let bundle = vec![
            HashMap::from([("example1".to_string(), 8.0)]),
            HashMap::from([("example1".to_string(), 1_700_000_000_000.0)]),
            HashMap::from([("example2".to_string(), 2.0)]),
            HashMap::from([("example2".to_string(), 1_700_000_000_500.0)]),
        ];
        let results = ReadResults::from_bundle(bundle);

        assert_eq!(results.chain(Chain::Primary).total_shares(), 8.0);
        assert_eq!(
            results.chain(Chain::Primary).last_submission("example1"),
            Some(1_700_000_000_000)
        );
        assert_eq!(results.chain(Chain::Auxiliary).total_shares(), 2.0);
        assert_eq!(
            results.chain(Chain::Auxiliary).last_submission("example2"),
            Some(1_700_000_000_500)
        );
    }

    #[test]
    fn test_from_empty_bundle() {
        let results = ReadResults::from_bundle(vec![]);
        assert_eq!(results, ReadResults::default());
        assert_eq!(results.chain(Chain::Primary).total_shares(), 0.0);
        assert_eq!(
            results.chain(Chain::Primary).last_submission("example"),
            None
        );
    }

    #[test]
    fn test_total_shares_sums_all_workers() {
        let results = ReadResults::default()
            .with_shares(Chain::Primary, "example1", 8.0)
            .with_shares(Chain::Primary, "example2", 8.0)
            .with_shares(Chain::Primary, "example3", 8.0);
        assert_eq!(results.chain(Chain::Primary).total_shares(), 24.0);
        assert_eq!(results.chain(Chain::Auxiliary).total_shares(), 0.0);
    }
}

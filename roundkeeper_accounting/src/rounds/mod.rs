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

//! Round accounting command builders.
//!
//! - [`time`] credits the seconds elapsed since a worker's previous share
//! - [`shares`] counts the share, samples hashrate and credits difficulty
//! - [`blocks`] closes the round when a block is accepted
//!
//! Each builder walks the active chains in [`Chain::ALL`] order and applies
//! the same rules to every chain.

pub mod blocks;
pub mod shares;
pub mod time;

use crate::chain::{Chain, ChainValidity};
use crate::command::StoreCommand;
use crate::error::AccountingError;
use crate::keys::RoundKeys;
use crate::snapshot::ReadResults;
use crate::submission::ShareSubmission;
use std::time::Duration;

/// Longest idle time, in ms, credited to a worker between two shares.
/// Longer gaps come from disconnected or stale miners and are not credited.
pub const DEFAULT_MAX_SUBMISSION_GAP_MS: u64 = 900_000;

/// Builds the store commands recording shares for one pool.
#[derive(Debug, Clone)]
pub struct RoundAccounting {
    pool: String,
    auxiliary_enabled: bool,
    max_submission_gap_ms: u64,
}

impl RoundAccounting {
    pub fn new(pool: impl Into<String>, auxiliary_enabled: bool) -> Self {
        Self {
            pool: pool.into(),
            auxiliary_enabled,
            max_submission_gap_ms: DEFAULT_MAX_SUBMISSION_GAP_MS,
        }
    }

    pub fn with_max_submission_gap(mut self, gap: Duration) -> Self {
        self.max_submission_gap_ms = gap.as_millis() as u64;
        self
    }

    pub fn pool(&self) -> &str {
        &self.pool
    }

    pub fn auxiliary_enabled(&self) -> bool {
        self.auxiliary_enabled
    }

    pub fn max_submission_gap_ms(&self) -> u64 {
        self.max_submission_gap_ms
    }

    pub fn keys(&self, chain: Chain) -> RoundKeys<'_> {
        RoundKeys::new(&self.pool, chain)
    }

    /// Chains the share is accounted on, paired with the worker address on that chain.
    ///
    /// The primary chain is always active. The auxiliary chain is active when
    /// the pool merge mines and the share carries an auxiliary address. A share
    /// claiming a block on a chain that is not active is rejected.
    pub fn active_chains<'s>(
        &self,
        share: &'s ShareSubmission,
    ) -> Result<Vec<(Chain, &'s str)>, AccountingError> {
        let mut active = Vec::with_capacity(Chain::ALL.len());
        for chain in Chain::ALL {
            let address = share.address(chain).filter(|address| !address.is_empty());
            match (chain, address) {
                (Chain::Primary, None) => return Err(AccountingError::MissingAddress(chain)),
                (Chain::Auxiliary, Some(_)) if !self.auxiliary_enabled => {}
                (_, Some(address)) => active.push((chain, address)),
                (_, None) => {}
            }
        }

        if let Some(block_chain) = share.block_type.chain() {
            if !active.iter().any(|(chain, _)| *chain == block_chain) {
                return Err(AccountingError::InactiveBlockChain(block_chain));
            }
        }
        Ok(active)
    }

    /// Full command list for one share: share contributions followed by block
    /// transitions, ready to be submitted as a single atomic batch.
    ///
    /// `block_accepted` also marks the block as found for time accounting, so
    /// the closing round's submission timestamps are not refreshed.
    pub fn build_commands(
        &self,
        read_results: &ReadResults,
        share: &ShareSubmission,
        validity: ChainValidity,
        block_accepted: bool,
        now: u64,
    ) -> Result<Vec<StoreCommand>, AccountingError> {
        let mut commands =
            self.build_share_commands(read_results, share, validity, block_accepted, now)?;
        commands.extend(self.calculate_blocks(read_results, share, validity, block_accepted, now)?);
        Ok(commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::BlockType;
    use crate::keys::RoundMap;
    use crate::test_utils::{TEST_NOW, TEST_POOL, sample_merged_share, sample_share};

    #[test]
    fn test_active_chains_primary_only() {
        let accounting = RoundAccounting::new(TEST_POOL, false);
        let share = sample_merged_share(BlockType::Share);

        let active = accounting.active_chains(&share).unwrap();
        assert_eq!(active, vec![(Chain::Primary, "example1")]);
    }

    #[test]
    fn test_active_chains_with_auxiliary() {
        let accounting = RoundAccounting::new(TEST_POOL, true);
        let share = sample_merged_share(BlockType::Share);

        let active = accounting.active_chains(&share).unwrap();
        assert_eq!(
            active,
            vec![(Chain::Primary, "example1"), (Chain::Auxiliary, "example2")]
        );
    }

    #[test]
    fn test_active_chains_auxiliary_enabled_without_address() {
        let accounting = RoundAccounting::new(TEST_POOL, true);
        let share = sample_share();
        let active = accounting.active_chains(&share).unwrap();
        assert_eq!(active, vec![(Chain::Primary, "example")]);
    }

    #[test]
    fn test_missing_primary_address_is_rejected() {
        let accounting = RoundAccounting::new(TEST_POOL, false);
        let share = ShareSubmission {
            addr_primary: None,
            ..sample_share()
        };
        assert_eq!(
            accounting.active_chains(&share),
            Err(AccountingError::MissingAddress(Chain::Primary))
        );

        let share = ShareSubmission {
            addr_primary: Some(String::new()),
            ..sample_share()
        };
        assert_eq!(
            accounting.active_chains(&share),
            Err(AccountingError::MissingAddress(Chain::Primary))
        );
    }

    #[test]
    fn test_auxiliary_block_without_auxiliary_chain_is_rejected() {
        let share = ShareSubmission {
            block_type: BlockType::Auxiliary,
            ..sample_share()
        };

        let accounting = RoundAccounting::new(TEST_POOL, true);
        assert_eq!(
            accounting.active_chains(&share),
            Err(AccountingError::InactiveBlockChain(Chain::Auxiliary))
        );

        // Address present but merge mining disabled for the pool
        let accounting = RoundAccounting::new(TEST_POOL, false);
        let share = sample_merged_share(BlockType::Auxiliary);
        assert_eq!(
            accounting.active_chains(&share),
            Err(AccountingError::InactiveBlockChain(Chain::Auxiliary))
        );
    }

    #[test]
    fn test_build_commands_for_plain_share() {
        let accounting = RoundAccounting::new(TEST_POOL, false);
        let read_results =
            ReadResults::default().with_submission(Chain::Primary, "example", TEST_NOW - 300_000);

        let commands = accounting
            .build_commands(
                &read_results,
                &sample_share(),
                ChainValidity::all(true),
                false,
                TEST_NOW,
            )
            .unwrap();

        let verbs: Vec<&str> = commands.iter().map(StoreCommand::verb).collect();
        assert_eq!(verbs, vec!["hincrbyfloat", "hset", "zadd", "hincrby", "hincrbyfloat"]);
    }

    #[test]
    fn test_build_commands_for_accepted_block() {
        let accounting = RoundAccounting::new(TEST_POOL, false);
        let read_results = ReadResults::default()
            .with_shares(Chain::Primary, "example", 10.0)
            .with_submission(Chain::Primary, "example", TEST_NOW - 300_000);
        let share = ShareSubmission {
            block_type: BlockType::Primary,
            ..sample_share()
        };

        let commands = accounting
            .build_commands(
                &read_results,
                &share,
                ChainValidity::all(true),
                true,
                TEST_NOW,
            )
            .unwrap();

        let verbs: Vec<&str> = commands.iter().map(StoreCommand::verb).collect();
        // No submission timestamp refresh, the round is being closed
        assert_eq!(
            verbs,
            vec![
                "hincrbyfloat",
                "zadd",
                "hincrby",
                "hincrbyfloat",
                "del",
                "rename",
                "rename",
                "rename",
                "sadd",
                "hincrby"
            ]
        );

        // Contributions land in the open round before it is archived
        let keys = accounting.keys(Chain::Primary);
        assert_eq!(commands[3].key(), keys.current(RoundMap::Shares));
        assert_eq!(
            commands[6],
            StoreCommand::Rename {
                from: keys.current(RoundMap::Shares),
                to: keys.archived(1972211, RoundMap::Shares),
            }
        );
    }

    #[test]
    fn test_build_commands_rejects_malformed_share() {
        let accounting = RoundAccounting::new(TEST_POOL, false);
        let share = ShareSubmission {
            addr_primary: None,
            block_type: BlockType::Primary,
            ..sample_share()
        };

        let result = accounting.build_commands(
            &ReadResults::default(),
            &share,
            ChainValidity::all(true),
            true,
            TEST_NOW,
        );
        assert_eq!(result, Err(AccountingError::MissingAddress(Chain::Primary)));
    }

    #[test]
    fn test_max_submission_gap_override() {
        let accounting =
            RoundAccounting::new(TEST_POOL, false).with_max_submission_gap(Duration::from_secs(60));
        assert_eq!(accounting.max_submission_gap_ms(), 60_000);
        assert_eq!(
            RoundAccounting::new(TEST_POOL, false).max_submission_gap_ms(),
            DEFAULT_MAX_SUBMISSION_GAP_MS
        );
    }
}

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

//! Time contribution: seconds a worker spent mining in the open round.
//!
//! Every share credits the time elapsed since the worker's previous share,
//! as found in the read snapshot, then moves the worker's submission
//! timestamp forward. A worker coming back after a long disconnect does not
//! get its idle time credited.

use super::RoundAccounting;
use crate::chain::{Chain, ChainValidity};
use crate::command::{FieldValue, StoreCommand};
use crate::error::AccountingError;
use crate::keys::RoundMap;
use crate::snapshot::ReadResults;
use crate::submission::ShareSubmission;
use tracing::debug;

impl RoundAccounting {
    /// Time commands for every active chain on which the share is valid.
    ///
    /// Primary chain commands come first. Within a chain the time increment
    /// precedes the submission timestamp update. When `block_found` is set,
    /// the chain closing its round does not get a timestamp update, as its
    /// submissions map is deleted in the same batch.
    pub fn build_time_commands(
        &self,
        read_results: &ReadResults,
        share: &ShareSubmission,
        validity: ChainValidity,
        block_found: bool,
        now: u64,
    ) -> Result<Vec<StoreCommand>, AccountingError> {
        let mut commands = Vec::new();
        for (chain, worker) in self.active_chains(share)? {
            if validity.is_valid(chain) {
                commands.extend(self.chain_time_commands(
                    read_results,
                    share,
                    chain,
                    worker,
                    block_found,
                    now,
                ));
            }
        }
        Ok(commands)
    }

    /// Time commands for a single chain, zero to two commands.
    pub(crate) fn chain_time_commands(
        &self,
        read_results: &ReadResults,
        share: &ShareSubmission,
        chain: Chain,
        worker: &str,
        block_found: bool,
        now: u64,
    ) -> Vec<StoreCommand> {
        let keys = self.keys(chain);
        let mut commands = Vec::with_capacity(2);

        // Future timestamps from skewed clocks count as no time spent
        let elapsed = read_results
            .chain(chain)
            .last_submission(worker)
            .map_or(0, |last| now.saturating_sub(last));

        if elapsed <= self.max_submission_gap_ms() {
            commands.push(StoreCommand::HashIncrementByFloat {
                key: keys.current(RoundMap::Times),
                field: worker.to_string(),
                amount: elapsed as f64 / 1000.0,
            });
        } else {
            debug!(
                "Not crediting {elapsed}ms to {worker} on {chain}, longer than {}ms gap",
                self.max_submission_gap_ms()
            );
        }

        if !(block_found && share.block_type.is_block_for(chain)) {
            commands.push(StoreCommand::HashSet {
                key: keys.current(RoundMap::Submissions),
                field: worker.to_string(),
                value: FieldValue::Int(now as i64),
            });
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::BlockType;
    use crate::test_utils::{TEST_NOW, TEST_POOL, sample_merged_share, sample_share};

    fn times_increment(command: &StoreCommand) -> (&str, &str, f64) {
        match command {
            StoreCommand::HashIncrementByFloat { key, field, amount } => {
                (key.as_str(), field.as_str(), *amount)
            }
            other => panic!("Expected hincrbyfloat, got {other}"),
        }
    }

    fn submission_set(command: &StoreCommand) -> (&str, &str, FieldValue) {
        match command {
            StoreCommand::HashSet { key, field, value } => (key.as_str(), field.as_str(), *value),
            other => panic!("Expected hset, got {other}"),
        }
    }

    #[test]
    fn test_time_credit_for_recent_submission() {
        let accounting = RoundAccounting::new(TEST_POOL, false);
        let read_results =
            ReadResults::default().with_submission(Chain::Primary, "example", TEST_NOW - 300_000);

        let commands = accounting
            .build_time_commands(
                &read_results,
                &sample_share(),
                ChainValidity::all(true),
                false,
                TEST_NOW,
            )
            .unwrap();

        assert_eq!(commands.len(), 2);
        assert_eq!(
            times_increment(&commands[0]),
            ("Pool1:rounds:primary:current:times", "example", 300.0)
        );
        assert_eq!(
            submission_set(&commands[1]),
            (
                "Pool1:rounds:primary:current:submissions",
                "example",
                FieldValue::Int(TEST_NOW as i64)
            )
        );
    }

    #[test]
    fn test_time_credit_without_previous_submission() {
        let accounting = RoundAccounting::new(TEST_POOL, false);

        let commands = accounting
            .build_time_commands(
                &ReadResults::default(),
                &sample_share(),
                ChainValidity::all(true),
                false,
                TEST_NOW,
            )
            .unwrap();

        assert_eq!(commands.len(), 2);
        assert_eq!(times_increment(&commands[0]).2, 0.0);
        assert_eq!(
            submission_set(&commands[1]).2,
            FieldValue::Int(TEST_NOW as i64)
        );
    }

    #[test_log::test]
    fn test_stale_submission_is_not_credited() {
        let accounting = RoundAccounting::new(TEST_POOL, false);
        let read_results = ReadResults::default().with_submission(
            Chain::Primary,
            "example",
            TEST_NOW - 1_000_000,
        );

        let commands = accounting
            .build_time_commands(
                &read_results,
                &sample_share(),
                ChainValidity::all(true),
                false,
                TEST_NOW,
            )
            .unwrap();

        // Only the timestamp refresh survives
        assert_eq!(commands.len(), 1);
        assert_eq!(
            submission_set(&commands[0]),
            (
                "Pool1:rounds:primary:current:submissions",
                "example",
                FieldValue::Int(TEST_NOW as i64)
            )
        );
    }

    #[test]
    fn test_gap_bound_is_inclusive() {
        let accounting = RoundAccounting::new(TEST_POOL, false);
        let read_results = ReadResults::default().with_submission(
            Chain::Primary,
            "example",
            TEST_NOW - accounting.max_submission_gap_ms(),
        );

        let commands = accounting
            .build_time_commands(
                &read_results,
                &sample_share(),
                ChainValidity::all(true),
                false,
                TEST_NOW,
            )
            .unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(times_increment(&commands[0]).2, 900.0);
    }

    #[test]
    fn test_future_submission_credits_nothing() {
        let accounting = RoundAccounting::new(TEST_POOL, false);
        let read_results =
            ReadResults::default().with_submission(Chain::Primary, "example", TEST_NOW + 5_000);

        let commands = accounting
            .build_time_commands(
                &read_results,
                &sample_share(),
                ChainValidity::all(true),
                false,
                TEST_NOW,
            )
            .unwrap();
        assert_eq!(times_increment(&commands[0]).2, 0.0);
    }

    #[test]
    fn test_block_found_skips_submission_refresh() {
        let accounting = RoundAccounting::new(TEST_POOL, false);
        let read_results =
            ReadResults::default().with_submission(Chain::Primary, "example", TEST_NOW - 300_000);
        let share = ShareSubmission {
            block_type: BlockType::Primary,
            ..sample_share()
        };

        let commands = accounting
            .build_time_commands(
                &read_results,
                &share,
                ChainValidity::all(true),
                true,
                TEST_NOW,
            )
            .unwrap();

        assert_eq!(commands.len(), 1);
        assert_eq!(
            times_increment(&commands[0]),
            ("Pool1:rounds:primary:current:times", "example", 300.0)
        );
    }

    #[test]
    fn test_merged_share_credits_both_chains() {
        let accounting = RoundAccounting::new(TEST_POOL, true);
        let read_results = ReadResults::default()
            .with_submission(Chain::Primary, "example1", TEST_NOW - 300_000)
            .with_submission(Chain::Auxiliary, "example2", TEST_NOW - 300_000);

        let commands = accounting
            .build_time_commands(
                &read_results,
                &sample_merged_share(BlockType::Auxiliary),
                ChainValidity::all(true),
                false,
                TEST_NOW,
            )
            .unwrap();

        assert_eq!(commands.len(), 4);
        assert_eq!(
            times_increment(&commands[0]),
            ("Pool1:rounds:primary:current:times", "example1", 300.0)
        );
        assert_eq!(
            submission_set(&commands[1]).0,
            "Pool1:rounds:primary:current:submissions"
        );
        assert_eq!(
            times_increment(&commands[2]),
            ("Pool1:rounds:auxiliary:current:times", "example2", 300.0)
        );
        assert_eq!(
            submission_set(&commands[3]).0,
            "Pool1:rounds:auxiliary:current:submissions"
        );
    }

    #[test]
    fn test_auxiliary_block_keeps_primary_timestamps_moving() {
        let accounting = RoundAccounting::new(TEST_POOL, true);

        let commands = accounting
            .build_time_commands(
                &ReadResults::default(),
                &sample_merged_share(BlockType::Auxiliary),
                ChainValidity::all(true),
                true,
                TEST_NOW,
            )
            .unwrap();

        let keys: Vec<&str> = commands.iter().map(StoreCommand::key).collect();
        assert_eq!(
            keys,
            vec![
                "Pool1:rounds:primary:current:times",
                "Pool1:rounds:primary:current:submissions",
                "Pool1:rounds:auxiliary:current:times",
            ]
        );
    }

    #[test]
    fn test_invalid_chain_gets_no_time_commands() {
        let accounting = RoundAccounting::new(TEST_POOL, true);
        let validity = ChainValidity::all(true).with(Chain::Primary, false);

        let commands = accounting
            .build_time_commands(
                &ReadResults::default(),
                &sample_merged_share(BlockType::Share),
                validity,
                false,
                TEST_NOW,
            )
            .unwrap();

        assert_eq!(commands.len(), 2);
        assert!(
            commands
                .iter()
                .all(|command| command.key().contains(":auxiliary:"))
        );
    }
}

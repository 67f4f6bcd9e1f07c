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

//! Round closing on block candidates.
//!
//! An accepted block moves the open round's counts, shares and times to
//! `round-<height>` and drops its submission timestamps, so the next share
//! starts a fresh round. A rejected candidate only bumps the chain's invalid
//! block count and leaves the round untouched.

use super::RoundAccounting;
use crate::chain::ChainValidity;
use crate::command::StoreCommand;
use crate::error::AccountingError;
use crate::keys::{RoundMap, count_field};
use crate::snapshot::ReadResults;
use crate::submission::ShareSubmission;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Block found by the pool, stored pending external confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Time the block was found, epoch ms
    pub time: u64,
    pub height: u64,
    pub hash: Option<String>,
    pub reward: u64,
    pub transaction: Option<String>,
    /// Address of the worker that found the block
    pub worker: String,
    /// Effective difficulty of the block finding share
    pub difficulty: f64,
    /// Round work as a percentage of the block difficulty
    pub luck: f64,
}

impl BlockRecord {
    pub fn to_member(&self) -> Result<String, AccountingError> {
        serde_json::to_string(self).map_err(|e| AccountingError::Serialization {
            what: "block record",
            reason: e.to_string(),
        })
    }
}

/// Luck of a round in percent, below 100 is lucky.
///
/// `round_shares` is the work recorded in the round before the block finding
/// share, which is added on top as it is not part of the snapshot.
pub fn luck(round_shares: f64, share_difficulty: f64, block_difficulty: f64) -> f64 {
    (round_shares + share_difficulty) / block_difficulty * 100.0
}

impl RoundAccounting {
    /// Block transition commands for the chain named by the share's block type.
    ///
    /// Returns nothing for a plain share, a single invalid block count for a
    /// rejected candidate, and six commands closing the round for an accepted
    /// block.
    pub fn calculate_blocks(
        &self,
        read_results: &ReadResults,
        share: &ShareSubmission,
        validity: ChainValidity,
        block_accepted: bool,
        now: u64,
    ) -> Result<Vec<StoreCommand>, AccountingError> {
        let Some(chain) = share.block_type.chain() else {
            return Ok(Vec::new());
        };
        let worker = self
            .active_chains(share)?
            .into_iter()
            .find_map(|(active, worker)| (active == chain).then_some(worker))
            .ok_or(AccountingError::InactiveBlockChain(chain))?;
        let keys = self.keys(chain);

        if !block_accepted {
            info!(
                "Rejected {chain} block candidate at height {} from {worker}, hash {:?}",
                share.height,
                share.hash_invalid.as_deref().or(share.hash.as_deref())
            );
            return Ok(vec![StoreCommand::HashIncrementBy {
                key: keys.block_counts(),
                field: count_field(false).to_string(),
                amount: 1,
            }]);
        }

        let block_difficulty = share.block_difficulty(chain);
        if !block_difficulty.is_finite() || block_difficulty <= 0.0 {
            return Err(AccountingError::InvalidBlockDifficulty {
                chain,
                difficulty: block_difficulty,
            });
        }
        // An invalid share is never credited to the round's shares, but its
        // difficulty still counts toward the work behind the block's luck.
        if !validity.is_valid(chain) {
            warn!(
                "Accepted {chain} block at height {} from a share marked invalid",
                share.height
            );
        }

        let record = BlockRecord {
            time: now,
            height: share.height,
            hash: share.hash.clone(),
            reward: share.reward,
            transaction: share.transaction.clone(),
            worker: worker.to_string(),
            difficulty: share.difficulty,
            luck: luck(
                read_results.chain(chain).total_shares(),
                share.difficulty,
                block_difficulty,
            ),
        };
        info!(
            "Closing {chain} round at height {} found by {worker}, luck {:.2}%",
            record.height, record.luck
        );

        let mut commands = Vec::with_capacity(6);
        commands.push(StoreCommand::Delete {
            key: keys.current(RoundMap::Submissions),
        });
        for map in RoundMap::ARCHIVED {
            commands.push(StoreCommand::Rename {
                from: keys.current(map),
                to: keys.archived(share.height, map),
            });
        }
        commands.push(StoreCommand::SetAdd {
            key: keys.pending_blocks(),
            member: record.to_member()?,
        });
        commands.push(StoreCommand::HashIncrementBy {
            key: keys.block_counts(),
            field: count_field(true).to_string(),
            amount: 1,
        });
        Ok(commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{BlockType, Chain};
    use crate::test_utils::{TEST_NOW, TEST_POOL, sample_merged_share, sample_share};

    fn primary_block() -> ShareSubmission {
        ShareSubmission {
            block_type: BlockType::Primary,
            ..sample_share()
        }
    }

    fn expected_round_close(chain: &str) -> Vec<StoreCommand> {
        vec![
            StoreCommand::Delete {
                key: format!("Pool1:rounds:{chain}:current:submissions"),
            },
            StoreCommand::Rename {
                from: format!("Pool1:rounds:{chain}:current:counts"),
                to: format!("Pool1:rounds:{chain}:round-1972211:counts"),
            },
            StoreCommand::Rename {
                from: format!("Pool1:rounds:{chain}:current:shares"),
                to: format!("Pool1:rounds:{chain}:round-1972211:shares"),
            },
            StoreCommand::Rename {
                from: format!("Pool1:rounds:{chain}:current:times"),
                to: format!("Pool1:rounds:{chain}:round-1972211:times"),
            },
        ]
    }

    #[test]
    fn test_accepted_block_closes_round() {
        let accounting = RoundAccounting::new(TEST_POOL, false);

        let commands = accounting
            .calculate_blocks(
                &ReadResults::default(),
                &primary_block(),
                ChainValidity::all(true),
                true,
                TEST_NOW,
            )
            .unwrap();

        assert_eq!(commands.len(), 6);
        assert_eq!(commands[..4], expected_round_close("primary")[..]);
        assert_eq!(commands[4].verb(), "sadd");
        assert_eq!(commands[4].key(), "Pool1:blocks:primary:pending");
        assert_eq!(
            commands[5],
            StoreCommand::HashIncrementBy {
                key: "Pool1:blocks:primary:counts".to_string(),
                field: "valid".to_string(),
                amount: 1,
            }
        );
    }

    #[test_log::test]
    fn test_rejected_block_only_counts() {
        let accounting = RoundAccounting::new(TEST_POOL, false);
        let share = ShareSubmission {
            hash: Some("example".to_string()),
            transaction: Some("example".to_string()),
            ..primary_block()
        };

        let commands = accounting
            .calculate_blocks(
                &ReadResults::default(),
                &share,
                ChainValidity::all(true),
                false,
                TEST_NOW,
            )
            .unwrap();

        assert_eq!(
            commands,
            vec![StoreCommand::HashIncrementBy {
                key: "Pool1:blocks:primary:counts".to_string(),
                field: "invalid".to_string(),
                amount: 1,
            }]
        );
    }

    #[test]
    fn test_plain_share_has_no_block_commands() {
        let accounting = RoundAccounting::new(TEST_POOL, false);

        for (valid, accepted) in [(true, false), (false, false), (true, true)] {
            let commands = accounting
                .calculate_blocks(
                    &ReadResults::default(),
                    &sample_share(),
                    ChainValidity::all(valid),
                    accepted,
                    TEST_NOW,
                )
                .unwrap();
            assert!(commands.is_empty());
        }
    }

    #[test]
    fn test_block_record_luck() {
        let accounting = RoundAccounting::new(TEST_POOL, false);
        let read_results = ReadResults::default()
            .with_shares(Chain::Primary, "example1", 8.0)
            .with_shares(Chain::Primary, "example2", 8.0)
            .with_shares(Chain::Primary, "example3", 8.0);
        let share = ShareSubmission {
            block_diff_primary: 32.0,
            difficulty: 4.0,
            share_diff: 4.0,
            hash: Some("blockhash".to_string()),
            ..primary_block()
        };

        let commands = accounting
            .calculate_blocks(
                &read_results,
                &share,
                ChainValidity::all(true),
                true,
                TEST_NOW,
            )
            .unwrap();

        assert_eq!(commands[..4], expected_round_close("primary")[..]);
        let StoreCommand::SetAdd { member, .. } = &commands[4] else {
            panic!("Expected sadd, got {}", commands[4]);
        };
        let record: BlockRecord = serde_json::from_str(member).unwrap();
        assert_eq!(
            record,
            BlockRecord {
                time: TEST_NOW,
                height: 1972211,
                hash: Some("blockhash".to_string()),
                reward: 10006839,
                transaction: None,
                worker: "example".to_string(),
                difficulty: 4.0,
                luck: 87.5,
            }
        );
    }

    #[test_log::test]
    fn test_invalid_share_block_luck_includes_uncredited_work() {
        let accounting = RoundAccounting::new(TEST_POOL, false);
        let read_results = ReadResults::default().with_shares(Chain::Primary, "example1", 24.0);
        let share = ShareSubmission {
            block_diff_primary: 32.0,
            difficulty: 4.0,
            share_diff: 4.0,
            ..primary_block()
        };

        let commands = accounting
            .build_commands(
                &read_results,
                &share,
                ChainValidity::all(false),
                true,
                TEST_NOW,
            )
            .unwrap();

        // Nothing credits the share to the round before it is archived
        assert!(
            commands
                .iter()
                .all(|command| command.verb() == "rename"
                    || command.key() != "Pool1:rounds:primary:current:shares")
        );
        let record = commands
            .iter()
            .find_map(|command| match command {
                StoreCommand::SetAdd { member, .. } => {
                    Some(serde_json::from_str::<BlockRecord>(member).unwrap())
                }
                _ => None,
            })
            .unwrap();
        assert_eq!(record.difficulty, 4.0);
        assert_eq!(record.luck, 87.5);
    }

    #[test]
    fn test_luck_formula() {
        assert_eq!(luck(24.0, 4.0, 32.0), 87.5);
        assert_eq!(luck(0.0, 16.0, 8.0), 200.0);
    }

    #[test]
    fn test_auxiliary_block_uses_auxiliary_round() {
        let accounting = RoundAccounting::new(TEST_POOL, true);
        let read_results = ReadResults::default()
            .with_shares(Chain::Primary, "example1", 1000.0)
            .with_shares(Chain::Auxiliary, "example2", 1023.0);

        let commands = accounting
            .calculate_blocks(
                &read_results,
                &sample_merged_share(BlockType::Auxiliary),
                ChainValidity::all(true),
                true,
                TEST_NOW,
            )
            .unwrap();

        assert_eq!(commands[..4], expected_round_close("auxiliary")[..]);
        let StoreCommand::SetAdd { key, member } = &commands[4] else {
            panic!("Expected sadd, got {}", commands[4]);
        };
        assert_eq!(key, "Pool1:blocks:auxiliary:pending");
        let record: BlockRecord = serde_json::from_str(member).unwrap();
        assert_eq!(record.worker, "example2");
        // (1023 + 1) / 2048
        assert_eq!(record.luck, 50.0);
    }

    #[test]
    fn test_accepted_block_with_bad_difficulty_fails() {
        let accounting = RoundAccounting::new(TEST_POOL, false);
        let share = ShareSubmission {
            block_diff_primary: 0.0,
            ..primary_block()
        };

        let result = accounting.calculate_blocks(
            &ReadResults::default(),
            &share,
            ChainValidity::all(true),
            true,
            TEST_NOW,
        );
        assert_eq!(
            result,
            Err(AccountingError::InvalidBlockDifficulty {
                chain: Chain::Primary,
                difficulty: 0.0
            })
        );
    }
}

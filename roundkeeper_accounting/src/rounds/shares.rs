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

use super::RoundAccounting;
use crate::chain::ChainValidity;
use crate::command::StoreCommand;
use crate::error::AccountingError;
use crate::keys::{RoundMap, count_field};
use crate::snapshot::ReadResults;
use crate::submission::ShareSubmission;
use serde::{Deserialize, Serialize};

/// One entry of a round's hashrate sorted set, scored by `time`.
///
/// Rejected work is sampled too, flagged with `valid: false`, so rejected
/// shares stay visible in hashrate views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashrateSample {
    /// Submission time, epoch ms
    pub time: u64,
    /// Worker address on the sampled chain
    pub worker: String,
    /// Effective difficulty of the share
    pub work: f64,
    pub valid: bool,
}

impl HashrateSample {
    pub fn to_member(&self) -> Result<String, AccountingError> {
        serde_json::to_string(self).map_err(|e| AccountingError::Serialization {
            what: "hashrate sample",
            reason: e.to_string(),
        })
    }
}

impl RoundAccounting {
    /// Share contribution commands for every active chain.
    ///
    /// Per chain, in order: the chain's time commands if the share is valid
    /// on it, one hashrate sample, one valid or invalid count, and the
    /// difficulty credit if valid. The primary chain's sequence comes first.
    pub fn build_share_commands(
        &self,
        read_results: &ReadResults,
        share: &ShareSubmission,
        validity: ChainValidity,
        block_found: bool,
        now: u64,
    ) -> Result<Vec<StoreCommand>, AccountingError> {
        let mut commands = Vec::new();
        for (chain, worker) in self.active_chains(share)? {
            let keys = self.keys(chain);
            let valid = validity.is_valid(chain);

            if valid {
                commands.extend(self.chain_time_commands(
                    read_results,
                    share,
                    chain,
                    worker,
                    block_found,
                    now,
                ));
            }

            let sample = HashrateSample {
                time: now,
                worker: worker.to_string(),
                work: share.difficulty,
                valid,
            };
            commands.push(StoreCommand::SortedSetAdd {
                key: keys.current(RoundMap::Hashrate),
                score: now,
                member: sample.to_member()?,
            });

            commands.push(StoreCommand::HashIncrementBy {
                key: keys.current(RoundMap::Counts),
                field: count_field(valid).to_string(),
                amount: 1,
            });

            if valid {
                commands.push(StoreCommand::HashIncrementByFloat {
                    key: keys.current(RoundMap::Shares),
                    field: worker.to_string(),
                    amount: share.difficulty,
                });
            }
        }
        Ok(commands)
    }
}

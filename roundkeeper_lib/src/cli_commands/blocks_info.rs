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

use crate::store::Store;
use crate::store::writer::StoreError;
use roundkeeper_accounting::keys::{INVALID_FIELD, RoundKeys, VALID_FIELD};
use roundkeeper_accounting::{BlockRecord, Chain};
use serde::Serialize;
use std::error::Error;
use tracing::warn;

/// Block state for JSON output
#[derive(Debug, Serialize)]
pub struct BlocksInfo {
    pub chain: Chain,
    pub valid: i64,
    pub invalid: i64,
    /// Blocks awaiting confirmation, by height
    pub pending: Vec<BlockRecord>,
}

/// Collect the block counts and pending blocks of a chain.
///
/// Pending members that do not parse as block records are skipped.
pub fn blocks_info(store: &Store, pool: &str, chain: Chain) -> Result<BlocksInfo, StoreError> {
    let keys = RoundKeys::new(pool, chain);
    let counts = store.get_hash(&keys.block_counts())?.unwrap_or_default();
    let count = |field: &str| counts.get(field).map_or(0, |value| value.as_i64());

    let mut pending: Vec<BlockRecord> = store
        .get_set(&keys.pending_blocks())?
        .unwrap_or_default()
        .iter()
        .filter_map(|member| match serde_json::from_str(member) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping unreadable pending block {member}: {e}");
                None
            }
        })
        .collect();
    pending.sort_by_key(|record| (record.height, record.time));

    Ok(BlocksInfo {
        chain,
        valid: count(VALID_FIELD),
        invalid: count(INVALID_FIELD),
        pending,
    })
}

/// Implementation of the blocks command
pub fn execute(store: &Store, pool: &str, chain: Chain) -> Result<(), Box<dyn Error>> {
    let info = blocks_info(store, pool, chain)?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

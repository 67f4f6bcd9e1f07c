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
use roundkeeper_accounting::Chain;
use roundkeeper_accounting::keys::{CURRENT_ROUND, RoundKeys, RoundMap};
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;

/// Round state for JSON output
#[derive(Debug, Serialize)]
pub struct RoundInfo {
    pub chain: Chain,
    pub round: String,
    pub counts: BTreeMap<String, i64>,
    pub shares: BTreeMap<String, f64>,
    pub total_shares: f64,
    /// worker -> seconds spent mining in the round
    pub times: BTreeMap<String, f64>,
    /// Only kept for the open round
    pub submissions: BTreeMap<String, i64>,
    pub hashrate_samples: usize,
}

/// Collect the state of the open round, or of the round archived at `height`.
pub fn round_info(
    store: &Store,
    pool: &str,
    chain: Chain,
    height: Option<u64>,
) -> Result<RoundInfo, StoreError> {
    let keys = RoundKeys::new(pool, chain);
    let key = |map| match height {
        Some(height) => keys.archived(height, map),
        None => keys.current(map),
    };
    let hash = |map| -> Result<_, StoreError> { Ok(store.get_hash(&key(map))?.unwrap_or_default()) };

    let counts = hash(RoundMap::Counts)?
        .into_iter()
        .map(|(field, value)| (field, value.as_i64()))
        .collect();
    let shares: BTreeMap<String, f64> = hash(RoundMap::Shares)?
        .into_iter()
        .map(|(worker, value)| (worker, value.as_f64()))
        .collect();
    let times = hash(RoundMap::Times)?
        .into_iter()
        .map(|(worker, value)| (worker, value.as_f64()))
        .collect();
    let submissions = hash(RoundMap::Submissions)?
        .into_iter()
        .map(|(worker, value)| (worker, value.as_i64()))
        .collect();

    Ok(RoundInfo {
        chain,
        round: height.map_or_else(|| CURRENT_ROUND.to_string(), |height| format!("round-{height}")),
        counts,
        total_shares: shares.values().sum(),
        shares,
        times,
        submissions,
        hashrate_samples: store.count_sorted_set(&key(RoundMap::Hashrate))?,
    })
}

/// Implementation of the round command
pub fn execute(
    store: &Store,
    pool: &str,
    chain: Chain,
    height: Option<u64>,
) -> Result<(), Box<dyn Error>> {
    let info = round_info(store, pool, chain, height)?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

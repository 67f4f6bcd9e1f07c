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

use crate::store::column_families::ColumnFamily;
use crate::store::writer::StoreError;
use roundkeeper_accounting::keys::{RoundKeys, RoundMap};
use roundkeeper_accounting::{Chain, FieldValue, ReadResults};
use rocksdb::{ColumnFamilyDescriptor, DB, Options as RocksDbOptions};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

mod batch;
pub mod column_families;
pub mod connection;
pub mod writer;

/// Fields of a stored hash.
pub type HashFields = BTreeMap<String, FieldValue>;

/// A rocksdb based store holding the pool's hashes, sets and sorted sets.
///
/// Each data type lives in its own column family:
/// - hash: key -> CBOR encoded field map
/// - set: key -> CBOR encoded member set
/// - sorted_set: one empty row per member, keyed by [`sorted_set_row`] so
///   that members iterate in score order and appending never reads the set
pub struct Store {
    path: String,
    db: DB,
}

impl Store {
    /// Open the store, creating it if missing unless opened read only.
    pub fn new(path: String, read_only: bool) -> Result<Self, StoreError> {
        let cfs = ColumnFamily::ALL
            .into_iter()
            .map(|cf| ColumnFamilyDescriptor::new(cf, RocksDbOptions::default()))
            .collect::<Vec<_>>();

        let mut db_options = RocksDbOptions::default();
        db_options.create_missing_column_families(true);
        db_options.create_if_missing(true);
        let db = if read_only {
            DB::open_cf_descriptors_read_only(&db_options, path.clone(), cfs, false)?
        } else {
            DB::open_cf_descriptors(&db_options, path.clone(), cfs)?
        };
        debug!("Opened store at {path}, read only: {read_only}");
        Ok(Self { path, db })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get a rocksb write batch
    /// An associated function as batch is not obtained from db
    pub fn get_write_batch() -> rocksdb::WriteBatch {
        rocksdb::WriteBatch::default()
    }

    /// Commit a write batch earlier obtained using get batch
    pub fn commit_batch(&self, batch: rocksdb::WriteBatch) -> Result<(), rocksdb::Error> {
        self.db.write(batch)
    }

    fn cf_handle(&self, cf: ColumnFamily) -> Result<&rocksdb::ColumnFamily, StoreError> {
        self.db
            .cf_handle(&cf)
            .ok_or_else(|| StoreError::Database(format!("Missing column family {}", cf.as_str())))
    }

    fn get_value<T: DeserializeOwned>(
        &self,
        cf: ColumnFamily,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        let cf = self.cf_handle(cf)?;
        match self.db.get_cf(cf, key.as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Get all fields of a hash, None if the hash does not exist.
    pub fn get_hash(&self, key: &str) -> Result<Option<HashFields>, StoreError> {
        self.get_value(ColumnFamily::Hash, key)
    }

    /// Get all members of a set, None if the set does not exist.
    pub fn get_set(&self, key: &str) -> Result<Option<BTreeSet<String>>, StoreError> {
        self.get_value(ColumnFamily::Set, key)
    }

    /// Get all (score, member) pairs of a sorted set in ascending score order.
    pub fn get_sorted_set(&self, key: &str) -> Result<Vec<(u64, String)>, StoreError> {
        let sorted_set_cf = self.cf_handle(ColumnFamily::SortedSet)?;
        let (lower, upper) = sorted_set_bounds(key);

        let mut read_opts = rocksdb::ReadOptions::default();
        read_opts.set_iterate_upper_bound(upper);
        let iter = self.db.iterator_cf_opt(
            sorted_set_cf,
            read_opts,
            rocksdb::IteratorMode::From(&lower, rocksdb::Direction::Forward),
        );

        let mut entries = Vec::new();
        for item in iter {
            let (row, _) = item?;
            entries.push(parse_sorted_set_row(&row[lower.len()..])?);
        }
        Ok(entries)
    }

    /// Number of members in a sorted set.
    pub fn count_sorted_set(&self, key: &str) -> Result<usize, StoreError> {
        Ok(self.get_sorted_set(key)?.len())
    }

    /// Read the open round state the accounting needs for the given chains.
    ///
    /// Chains not listed are left empty in the result.
    pub fn read_snapshot(&self, pool: &str, chains: &[Chain]) -> Result<ReadResults, StoreError> {
        let mut read_results = ReadResults::default();
        for chain in chains {
            let keys = RoundKeys::new(pool, *chain);
            let snapshot = read_results.chain_mut(*chain);
            if let Some(shares) = self.get_hash(&keys.current(RoundMap::Shares))? {
                snapshot.shares = shares
                    .into_iter()
                    .map(|(worker, value)| (worker, value.as_f64()))
                    .collect();
            }
            if let Some(submissions) = self.get_hash(&keys.current(RoundMap::Submissions))? {
                snapshot.submissions = submissions
                    .into_iter()
                    .map(|(worker, value)| (worker, value.as_i64().max(0) as u64))
                    .collect();
            }
        }
        Ok(read_results)
    }
}

/// Row key for one sorted set member: `key \0 score_be member`.
///
/// Keys never contain a NUL byte, so rows of one sorted set are contiguous and
/// ordered by score, then member.
pub fn sorted_set_row(key: &str, score: u64, member: &str) -> Vec<u8> {
    let mut row = Vec::with_capacity(key.len() + 9 + member.len());
    row.extend_from_slice(key.as_bytes());
    row.push(0);
    row.extend_from_slice(&score.to_be_bytes());
    row.extend_from_slice(member.as_bytes());
    row
}

/// Half open row range `[key \0, key \1)` covering every member of a sorted set.
fn sorted_set_bounds(key: &str) -> (Vec<u8>, Vec<u8>) {
    let mut lower = Vec::with_capacity(key.len() + 1);
    lower.extend_from_slice(key.as_bytes());
    let mut upper = lower.clone();
    lower.push(0);
    upper.push(1);
    (lower, upper)
}

fn parse_sorted_set_row(suffix: &[u8]) -> Result<(u64, String), StoreError> {
    if suffix.len() < 8 {
        return Err(StoreError::Serialization(
            "Sorted set row too short".to_string(),
        ));
    }
    let (score, member) = suffix.split_at(8);
    let score = u64::from_be_bytes(
        score
            .try_into()
            .map_err(|_| StoreError::Serialization("Invalid sorted set score".to_string()))?,
    );
    let member = String::from_utf8(member.to_vec())
        .map_err(|e| StoreError::Serialization(format!("Invalid sorted set member: {e}")))?;
    Ok((score, member))
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    let mut bytes = Vec::new();
    ciborium::ser::into_writer(value, &mut bytes)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(bytes)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    ciborium::de::from_reader(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

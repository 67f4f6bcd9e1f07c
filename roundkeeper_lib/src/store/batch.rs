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

//! Atomic application of a command list.
//!
//! Commands are replayed against an in-memory overlay of the keys they touch,
//! so later commands see the effect of earlier ones in the same list. The
//! overlay is then turned into a single rocksdb write batch, which either
//! lands completely or not at all.

use super::column_families::ColumnFamily;
use super::writer::StoreError;
use super::{HashFields, Store, encode, sorted_set_bounds, sorted_set_row};
use roundkeeper_accounting::{FieldValue, StoreCommand};
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Pending state of one sorted set.
enum SortedSetState {
    /// Members added on top of whatever is stored
    Added(Vec<(u64, String)>),
    /// Stored rows are dropped and replaced, None deletes the set
    Replaced(Option<BTreeSet<(u64, String)>>),
}

struct Overlay<'a> {
    store: &'a Store,
    /// None marks a key deleted by the batch
    hashes: HashMap<String, Option<HashFields>>,
    sets: HashMap<String, Option<BTreeSet<String>>>,
    sorted_sets: HashMap<String, SortedSetState>,
}

/// Load a key into the overlay on first touch.
fn slot<'m, T>(
    overlay: &'m mut HashMap<String, Option<T>>,
    key: &str,
    load: impl FnOnce() -> Result<Option<T>, StoreError>,
) -> Result<&'m mut Option<T>, StoreError> {
    Ok(match overlay.entry(key.to_string()) {
        Entry::Occupied(entry) => entry.into_mut(),
        Entry::Vacant(entry) => entry.insert(load()?),
    })
}

impl<'a> Overlay<'a> {
    fn new(store: &'a Store) -> Self {
        Self {
            store,
            hashes: HashMap::new(),
            sets: HashMap::new(),
            sorted_sets: HashMap::new(),
        }
    }

    fn hash(&mut self, key: &str) -> Result<&mut Option<HashFields>, StoreError> {
        let store = self.store;
        slot(&mut self.hashes, key, || store.get_hash(key))
    }

    fn set(&mut self, key: &str) -> Result<&mut Option<BTreeSet<String>>, StoreError> {
        let store = self.store;
        slot(&mut self.sets, key, || store.get_set(key))
    }

    /// Current members of a sorted set, including pending additions.
    fn sorted_set(&self, key: &str) -> Result<Option<BTreeSet<(u64, String)>>, StoreError> {
        match self.sorted_sets.get(key) {
            Some(SortedSetState::Replaced(members)) => Ok(members.clone()),
            Some(SortedSetState::Added(added)) => {
                let mut members: BTreeSet<_> =
                    self.store.get_sorted_set(key)?.into_iter().collect();
                members.extend(added.iter().cloned());
                Ok(Some(members))
            }
            None => {
                let members: BTreeSet<_> = self.store.get_sorted_set(key)?.into_iter().collect();
                Ok((!members.is_empty()).then_some(members))
            }
        }
    }

    fn apply(&mut self, command: &StoreCommand) -> Result<(), StoreError> {
        match command {
            StoreCommand::HashIncrementBy { key, field, amount } => {
                let fields = self.hash(key)?.get_or_insert_with(HashFields::new);
                let value = fields.entry(field.clone()).or_insert(FieldValue::Int(0));
                *value = value.add_int(*amount);
            }
            StoreCommand::HashIncrementByFloat { key, field, amount } => {
                let fields = self.hash(key)?.get_or_insert_with(HashFields::new);
                let value = fields.entry(field.clone()).or_insert(FieldValue::Float(0.0));
                *value = value.add_float(*amount);
            }
            StoreCommand::HashSet { key, field, value } => {
                self.hash(key)?
                    .get_or_insert_with(HashFields::new)
                    .insert(field.clone(), *value);
            }
            StoreCommand::SortedSetAdd { key, score, member } => {
                let entry = (*score, member.clone());
                match self.sorted_sets.entry(key.clone()) {
                    Entry::Vacant(vacant) => {
                        vacant.insert(SortedSetState::Added(vec![entry]));
                    }
                    Entry::Occupied(mut occupied) => match occupied.get_mut() {
                        SortedSetState::Added(added) => added.push(entry),
                        SortedSetState::Replaced(members) => {
                            members.get_or_insert_with(BTreeSet::new).insert(entry);
                        }
                    },
                }
            }
            StoreCommand::SetAdd { key, member } => {
                self.set(key)?
                    .get_or_insert_with(BTreeSet::new)
                    .insert(member.clone());
            }
            StoreCommand::Delete { key } => self.delete(key),
            StoreCommand::Rename { from, to } => self.rename(from, to)?,
        }
        Ok(())
    }

    fn delete(&mut self, key: &str) {
        self.hashes.insert(key.to_string(), None);
        self.sets.insert(key.to_string(), None);
        self.sorted_sets
            .insert(key.to_string(), SortedSetState::Replaced(None));
    }

    /// Move a key to a new name, replacing whatever the destination held.
    ///
    /// A missing source leaves the destination untouched.
    fn rename(&mut self, from: &str, to: &str) -> Result<(), StoreError> {
        if from == to {
            return Ok(());
        }
        let hash = self.hash(from)?.take();
        let set = self.set(from)?.take();
        let sorted_set = self.sorted_set(from)?;
        if hash.is_none() && set.is_none() && sorted_set.is_none() {
            debug!("Rename of missing key {from} skipped");
            return Ok(());
        }

        self.delete(from);
        self.delete(to);
        self.hashes.insert(to.to_string(), hash);
        self.sets.insert(to.to_string(), set);
        self.sorted_sets
            .insert(to.to_string(), SortedSetState::Replaced(sorted_set));
        Ok(())
    }

    fn into_write_batch(self) -> Result<rocksdb::WriteBatch, StoreError> {
        let mut batch = Store::get_write_batch();

        let hash_cf = self.store.cf_handle(ColumnFamily::Hash)?;
        for (key, fields) in &self.hashes {
            match fields {
                Some(fields) => batch.put_cf(hash_cf, key.as_bytes(), encode(fields)?),
                None => batch.delete_cf(hash_cf, key.as_bytes()),
            }
        }

        let set_cf = self.store.cf_handle(ColumnFamily::Set)?;
        for (key, members) in &self.sets {
            match members {
                Some(members) => batch.put_cf(set_cf, key.as_bytes(), encode(members)?),
                None => batch.delete_cf(set_cf, key.as_bytes()),
            }
        }

        // Range deletes go before the puts that refill the range
        let sorted_set_cf = self.store.cf_handle(ColumnFamily::SortedSet)?;
        for (key, state) in &self.sorted_sets {
            let members = match state {
                SortedSetState::Added(added) => added.iter().collect::<Vec<_>>(),
                SortedSetState::Replaced(members) => {
                    let (lower, upper) = sorted_set_bounds(key);
                    batch.delete_range_cf(sorted_set_cf, lower, upper);
                    members.iter().flatten().collect()
                }
            };
            for (score, member) in members {
                batch.put_cf(sorted_set_cf, sorted_set_row(key, *score, member), b"");
            }
        }
        Ok(batch)
    }
}

impl Store {
    /// Apply a command list atomically.
    ///
    /// Either every command takes effect or, on error, none does.
    pub fn apply_commands(&self, commands: &[StoreCommand]) -> Result<(), StoreError> {
        let mut overlay = Overlay::new(self);
        for command in commands {
            overlay.apply(command)?;
        }
        let batch = overlay.into_write_batch()?;
        self.commit_batch(batch)?;
        Ok(())
    }
}

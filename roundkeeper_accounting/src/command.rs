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

//! Typed store operations produced by the builders.
//!
//! Builders never touch the store. They return an ordered list of these
//! commands which the store applies as one all or nothing batch.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Value held in a hash field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
}

impl FieldValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            FieldValue::Int(value) => *value as f64,
            FieldValue::Float(value) => *value,
        }
    }

    /// Integer view, floats are truncated.
    pub fn as_i64(&self) -> i64 {
        match self {
            FieldValue::Int(value) => *value,
            FieldValue::Float(value) => *value as i64,
        }
    }

    /// Add an integer, keeping integer fields integral.
    pub fn add_int(self, amount: i64) -> FieldValue {
        match self {
            FieldValue::Int(value) => FieldValue::Int(value.saturating_add(amount)),
            FieldValue::Float(value) => FieldValue::Float(value + amount as f64),
        }
    }

    /// Add a float, the field becomes a float field.
    pub fn add_float(self, amount: f64) -> FieldValue {
        FieldValue::Float(self.as_f64() + amount)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(value) => write!(f, "{value}"),
            FieldValue::Float(value) => write!(f, "{value}"),
        }
    }
}

/// A single store mutation.
///
/// Missing hashes, sets and fields start out empty or zero, the same way a
/// redis style key value store treats them.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCommand {
    /// Increment an integer hash field
    HashIncrementBy {
        key: String,
        field: String,
        amount: i64,
    },
    /// Increment a float hash field
    HashIncrementByFloat {
        key: String,
        field: String,
        amount: f64,
    },
    /// Set a hash field, replacing any previous value
    HashSet {
        key: String,
        field: String,
        value: FieldValue,
    },
    /// Add a member to a sorted set ordered by score
    SortedSetAdd {
        key: String,
        score: u64,
        member: String,
    },
    /// Add a member to a set
    SetAdd { key: String, member: String },
    /// Remove a key of any type
    Delete { key: String },
    /// Move a key of any type to a new name, replacing the destination
    Rename { from: String, to: String },
}

impl StoreCommand {
    /// The key this command writes to. For a rename this is the source.
    pub fn key(&self) -> &str {
        match self {
            StoreCommand::HashIncrementBy { key, .. }
            | StoreCommand::HashIncrementByFloat { key, .. }
            | StoreCommand::HashSet { key, .. }
            | StoreCommand::SortedSetAdd { key, .. }
            | StoreCommand::SetAdd { key, .. }
            | StoreCommand::Delete { key } => key,
            StoreCommand::Rename { from, .. } => from,
        }
    }

    /// Short verb in the redis naming, useful for logs and assertions.
    pub fn verb(&self) -> &'static str {
        match self {
            StoreCommand::HashIncrementBy { .. } => "hincrby",
            StoreCommand::HashIncrementByFloat { .. } => "hincrbyfloat",
            StoreCommand::HashSet { .. } => "hset",
            StoreCommand::SortedSetAdd { .. } => "zadd",
            StoreCommand::SetAdd { .. } => "sadd",
            StoreCommand::Delete { .. } => "del",
            StoreCommand::Rename { .. } => "rename",
        }
    }
}

impl fmt::Display for StoreCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreCommand::HashIncrementBy { key, field, amount } => {
                write!(f, "hincrby {key} {field} {amount}")
            }
            StoreCommand::HashIncrementByFloat { key, field, amount } => {
                write!(f, "hincrbyfloat {key} {field} {amount}")
            }
            StoreCommand::HashSet { key, field, value } => write!(f, "hset {key} {field} {value}"),
            StoreCommand::SortedSetAdd { key, score, member } => {
                write!(f, "zadd {key} {score} {member}")
            }
            StoreCommand::SetAdd { key, member } => write!(f, "sadd {key} {member}"),
            StoreCommand::Delete { key } => write!(f, "del {key}"),
            StoreCommand::Rename { from, to } => write!(f, "rename {from} {to}"),
        }
    }
}

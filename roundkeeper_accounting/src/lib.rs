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

//! Share, round and block accounting for a mining pool.
//!
//! Everything in this crate is pure: a share submission and a read snapshot go
//! in, an ordered list of [`StoreCommand`]s comes out. Executing the commands
//! atomically is left to the store.

pub mod chain;
pub mod command;
pub mod error;
pub mod keys;
pub mod rounds;
pub mod snapshot;
pub mod submission;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use chain::{BlockType, Chain, ChainValidity};
pub use command::{FieldValue, StoreCommand};
pub use error::AccountingError;
pub use rounds::RoundAccounting;
pub use rounds::blocks::BlockRecord;
pub use rounds::shares::HashrateSample;
pub use snapshot::{ChainSnapshot, ReadResults};
pub use submission::ShareSubmission;

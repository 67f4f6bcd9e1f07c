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

//! Test utilities for roundkeeper_accounting

use crate::chain::BlockType;
use crate::submission::ShareSubmission;

/// Fixed "now" used across tests, epoch ms.
pub const TEST_NOW: u64 = 1_700_000_000_000;

/// Pool identifier used across tests.
pub const TEST_POOL: &str = "Pool1";

/// A plain share on the primary chain from worker `example`.
pub fn sample_share() -> ShareSubmission {
    ShareSubmission {
        job: "4".to_string(),
        ip: "::1".to_string(),
        port: 3001,
        addr_primary: Some("example".to_string()),
        addr_auxiliary: None,
        block_diff_primary: 137403310.58987552,
        block_diff_auxiliary: 0.0,
        block_type: BlockType::Share,
        difficulty: 1.0,
        share_diff: 2.3517082,
        hash: None,
        hash_invalid: None,
        height: 1972211,
        reward: 10006839,
        transaction: None,
    }
}

/// A merge mined share from `example1` on primary and `example2` on auxiliary.
pub fn sample_merged_share(block_type: BlockType) -> ShareSubmission {
    ShareSubmission {
        addr_primary: Some("example1".to_string()),
        addr_auxiliary: Some("example2".to_string()),
        block_diff_auxiliary: 2048.0,
        block_type,
        ..sample_share()
    }
}

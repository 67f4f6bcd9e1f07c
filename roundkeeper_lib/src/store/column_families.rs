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

/// Column families strings defined in one place for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnFamily {
    /// key -> CBOR map of field to value
    Hash,
    /// key -> CBOR set of members
    Set,
    /// one empty row per member, see [`crate::store::sorted_set_row`]
    SortedSet,
}

impl ColumnFamily {
    pub const ALL: [ColumnFamily; 3] = [
        ColumnFamily::Hash,
        ColumnFamily::Set,
        ColumnFamily::SortedSet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnFamily::Hash => "hash",
            ColumnFamily::Set => "set",
            ColumnFamily::SortedSet => "sorted_set",
        }
    }
}

impl std::ops::Deref for ColumnFamily {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl AsRef<str> for ColumnFamily {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<ColumnFamily> for String {
    fn from(val: ColumnFamily) -> Self {
        val.as_str().to_string()
    }
}

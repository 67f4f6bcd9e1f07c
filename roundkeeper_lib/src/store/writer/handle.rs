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

//! Store handle providing direct reads and serialized writes.
//!
//! `StoreHandle` combines an `Arc<Store>` for direct read access with a
//! write channel for serialized batches. Cloning the handle is cheap and all
//! clones feed the same writer.

use super::{StoreError, WriteCommand, WriteSender};
use crate::store::Store;
use crate::store::connection::{ConnectionReceiver, ConnectionState};
use roundkeeper_accounting::{Chain, ReadResults, StoreCommand};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Handle for interacting with the store.
///
/// Provides direct read access via `Arc<Store>` and serialized write
/// access through a channel to the `StoreWriter` task.
#[derive(Clone)]
pub struct StoreHandle {
    store: Arc<Store>,
    write_tx: WriteSender,
    state_rx: ConnectionReceiver,
}

impl StoreHandle {
    /// Create a new store handle.
    pub fn new(store: Arc<Store>, write_tx: WriteSender, state_rx: ConnectionReceiver) -> Self {
        Self {
            store,
            write_tx,
            state_rx,
        }
    }

    /// Get direct access to the underlying store for read operations.
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Latest connection state published by the writer.
    pub fn connection_state(&self) -> ConnectionState {
        self.state_rx.borrow().clone()
    }

    /// Receiver notified on every connection state change.
    pub fn subscribe(&self) -> ConnectionReceiver {
        self.state_rx.clone()
    }

    /// Read the open round snapshot for the given chains.
    pub fn read_snapshot(&self, pool: &str, chains: &[Chain]) -> Result<ReadResults, StoreError> {
        self.store.read_snapshot(pool, chains)
    }

    /// Apply a command list atomically, after every batch sent before it.
    pub async fn execute_batch(&self, commands: Vec<StoreCommand>) -> Result<(), StoreError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.write_tx
            .send(WriteCommand::ExecuteBatch {
                commands,
                reply: reply_tx,
            })
            .await
            .map_err(|_| StoreError::ChannelClosed)?;
        reply_rx.await.map_err(|_| StoreError::ChannelClosed)?
    }

    /// Stop the writer. Batches already queued are applied first, later
    /// ones fail with [`StoreError::ChannelClosed`].
    pub async fn close(&self) -> Result<(), StoreError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.write_tx
            .send(WriteCommand::Close { reply: reply_tx })
            .await
            .map_err(|_| StoreError::ChannelClosed)?;
        reply_rx.await.map_err(|_| StoreError::ChannelClosed)
    }
}

// Mock for StoreHandle using mockall
// This allows tests to create specific scenarios without real storage
#[cfg(test)]
mockall::mock! {
    pub StoreHandle {
        pub fn new(store: Arc<Store>, write_tx: WriteSender, state_rx: ConnectionReceiver) -> Self;
        pub fn store(&self) -> &Arc<Store>;
        pub fn connection_state(&self) -> ConnectionState;
        pub fn subscribe(&self) -> ConnectionReceiver;
        pub fn read_snapshot(&self, pool: &str, chains: &[Chain]) -> Result<ReadResults, StoreError>;
        pub async fn execute_batch(&self, commands: Vec<StoreCommand>) -> Result<(), StoreError>;
        pub async fn close(&self) -> Result<(), StoreError>;
    }

    impl Clone for StoreHandle {
        fn clone(&self) -> Self;
    }
}

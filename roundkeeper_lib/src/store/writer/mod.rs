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

//! Store writer for serialized database writes.
//!
//! This module provides a dedicated task applying command batches one at a
//! time. Reads are direct via Arc<Store>, while batches go through a channel
//! so that no two batches ever interleave.

mod handle;

pub use handle::StoreHandle;
#[cfg(test)]
pub use handle::MockStoreHandle;

use crate::store::Store;
use crate::store::connection::{
    ConnectionSender, ConnectionState, connection_channel, start_connection_logger,
};
use roundkeeper_accounting::StoreCommand;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Channel buffer size for write commands
pub const WRITE_CHANNEL_SIZE: usize = 100;

/// Error type for store operations
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Database error
    Database(String),
    /// Stored value could not be encoded or decoded
    Serialization(String),
    /// Channel closed
    ChannelClosed,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Database(msg) => write!(f, "Database error: {msg}"),
            StoreError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            StoreError::ChannelClosed => write!(f, "Channel closed"),
        }
    }
}

impl Error for StoreError {}

impl From<rocksdb::Error> for StoreError {
    fn from(e: rocksdb::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// Commands for write operations on the Store.
#[derive(Debug)]
pub enum WriteCommand {
    /// Apply a command list as one atomic batch
    ExecuteBatch {
        commands: Vec<StoreCommand>,
        reply: oneshot::Sender<Result<(), StoreError>>,
    },
    /// Stop the writer once earlier batches are done
    Close { reply: oneshot::Sender<()> },
}

/// Sender type for write commands
pub type WriteSender = mpsc::Sender<WriteCommand>;

/// Receiver type for write commands
pub type WriteReceiver = mpsc::Receiver<WriteCommand>;

/// Create a new write channel
pub fn write_channel() -> (WriteSender, WriteReceiver) {
    mpsc::channel(WRITE_CHANNEL_SIZE)
}

/// Store writer that processes write commands sequentially.
///
/// This ensures batches are applied to RocksDB one after another, so each
/// batch sees the complete effect of the previous one, while reads stay
/// direct.
pub struct StoreWriter {
    store: Arc<Store>,
    command_rx: WriteReceiver,
    state_tx: ConnectionSender,
}

impl StoreWriter {
    /// Create a new store writer
    pub fn new(store: Arc<Store>, command_rx: WriteReceiver, state_tx: ConnectionSender) -> Self {
        Self {
            store,
            command_rx,
            state_tx,
        }
    }

    /// Run the writer event loop until closed or the channel is dropped
    pub async fn run(mut self) {
        info!("Store writer started for {}", self.store.path());
        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                WriteCommand::ExecuteBatch { commands, reply } => {
                    let result = self.execute_batch(&commands);
                    let _ = reply.send(result);
                }
                WriteCommand::Close { reply } => {
                    self.command_rx.close();
                    let _ = reply.send(());
                    break;
                }
            }
        }
        self.state_tx.send_replace(ConnectionState::Closed);
        info!("Store writer stopped");
    }

    fn execute_batch(&self, commands: &[StoreCommand]) -> Result<(), StoreError> {
        debug!("Applying batch of {} commands", commands.len());
        match self.store.apply_commands(commands) {
            Ok(()) => {
                self.state_tx.send_if_modified(|state| {
                    let faulted = matches!(state, ConnectionState::Faulted(_));
                    if faulted {
                        *state = ConnectionState::Connected;
                    }
                    faulted
                });
                Ok(())
            }
            Err(e) => {
                error!("Failed to apply batch of {} commands: {e}", commands.len());
                if let StoreError::Database(reason) = &e {
                    self.state_tx
                        .send_replace(ConnectionState::Faulted(reason.clone()));
                }
                Err(e)
            }
        }
    }
}

/// Spawn a writer for the store and return a handle to it.
///
/// Connection state changes are logged by a connection logger spawned
/// alongside the writer. The returned task finishes once the writer has
/// stopped and the logger has reported the closed store.
pub fn start_store_writer(store: Arc<Store>) -> (StoreHandle, JoinHandle<()>) {
    let (write_tx, write_rx) = write_channel();
    let (state_tx, state_rx) = connection_channel();
    let logger = start_connection_logger(state_rx.clone());
    let writer = StoreWriter::new(store.clone(), write_rx, state_tx);
    let writer_handle = tokio::spawn(async move {
        writer.run().await;
        if let Err(e) = logger.await {
            error!("Store connection logger failed: {e}");
        }
    });
    (StoreHandle::new(store, write_tx, state_rx), writer_handle)
}

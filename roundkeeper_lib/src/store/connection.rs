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

//! Store connectivity as observable states.
//!
//! The store writer publishes its state on a watch channel. Anyone holding a
//! receiver can react to faults and closure, the connection logger simply
//! reports them.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Last commit succeeded, or nothing was committed yet
    Connected,
    /// Last commit failed with the given reason
    Faulted(String),
    /// Writer stopped, no further batches are accepted
    Closed,
}

pub type ConnectionSender = watch::Sender<ConnectionState>;
pub type ConnectionReceiver = watch::Receiver<ConnectionState>;

/// Create a connection state channel starting out connected.
pub fn connection_channel() -> (ConnectionSender, ConnectionReceiver) {
    watch::channel(ConnectionState::Connected)
}

/// Log every state change until the store is closed.
pub fn start_connection_logger(mut state_rx: ConnectionReceiver) -> JoinHandle<()> {
    tokio::spawn(async move {
        while state_rx.changed().await.is_ok() {
            let state = state_rx.borrow_and_update().clone();
            match state {
                ConnectionState::Connected => info!("Store connection recovered"),
                ConnectionState::Faulted(reason) => error!("Store had an error: {reason}"),
                ConnectionState::Closed => {
                    info!("Connection to store has been closed");
                    return;
                }
            }
        }
        info!("Store connection state channel dropped");
    })
}

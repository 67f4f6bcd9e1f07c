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

//! Records shares against the store.
//!
//! The recorder glues the pure accounting builders to the store: it reads
//! the open round snapshot, builds the command list for a share and submits
//! it as one batch. Nothing is retried, a failed batch is reported to the
//! caller, which can re-read and resubmit.

use crate::config::PoolConfig;
#[mockall_double::double]
use crate::store::writer::StoreHandle;
use crate::store::writer::StoreError;
use crate::utils::time_provider::{SystemTimeProvider, TimeProvider};
use roundkeeper_accounting::{
    AccountingError, ChainValidity, ReadResults, RoundAccounting, ShareSubmission, StoreCommand,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("Invalid share: {0}")]
    Accounting(#[from] AccountingError),
    #[error("Store failed: {0}")]
    Store(#[from] StoreError),
}

pub struct ShareRecorder {
    accounting: RoundAccounting,
    store_handle: StoreHandle,
    time_provider: Arc<dyn TimeProvider>,
}

impl ShareRecorder {
    pub fn new(
        accounting: RoundAccounting,
        store_handle: StoreHandle,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            accounting,
            store_handle,
            time_provider,
        }
    }

    /// Recorder for the configured pool using the system clock.
    pub fn from_config(pool_config: &PoolConfig, store_handle: StoreHandle) -> Self {
        Self::new(
            pool_config.accounting(),
            store_handle,
            Arc::new(SystemTimeProvider),
        )
    }

    pub fn accounting(&self) -> &RoundAccounting {
        &self.accounting
    }

    /// Read the open round state of every chain the share is accounted on.
    ///
    /// Take the snapshot right before building, any write landing in
    /// between is not reflected in the share's time credit or luck.
    pub fn read_snapshot(&self, share: &ShareSubmission) -> Result<ReadResults, RecordError> {
        let chains: Vec<_> = self
            .accounting
            .active_chains(share)?
            .into_iter()
            .map(|(chain, _)| chain)
            .collect();
        Ok(self
            .store_handle
            .read_snapshot(self.accounting.pool(), &chains)?)
    }

    /// Build the full command list for a share without touching the store.
    pub fn build_commands(
        &self,
        read_results: &ReadResults,
        share: &ShareSubmission,
        validity: ChainValidity,
        block_accepted: bool,
    ) -> Result<Vec<StoreCommand>, AccountingError> {
        let now = self.time_provider.millis_since_epoch();
        self.accounting
            .build_commands(read_results, share, validity, block_accepted, now)
    }

    /// Build and submit the commands for a share, waiting for the store.
    ///
    /// Returns the submitted commands once the batch has been applied.
    pub async fn execute(
        &self,
        read_results: &ReadResults,
        share: &ShareSubmission,
        validity: ChainValidity,
        block_accepted: bool,
    ) -> Result<Vec<StoreCommand>, RecordError> {
        let commands = self.build_commands(read_results, share, validity, block_accepted)?;
        self.store_handle.execute_batch(commands.clone()).await?;
        debug!(
            "Recorded share at height {} with {} commands",
            share.height,
            commands.len()
        );
        Ok(commands)
    }

    /// Build the commands for a share and submit them in the background.
    ///
    /// Returns the command list as soon as it is built. `on_complete` is
    /// called exactly once: with the batch outcome once the store has
    /// applied it, or straight away with the build error when the share is
    /// malformed, in which case nothing is submitted.
    ///
    /// Must be called from within a tokio runtime.
    pub fn record_share<F>(
        &self,
        read_results: &ReadResults,
        share: &ShareSubmission,
        validity: ChainValidity,
        block_accepted: bool,
        on_complete: F,
    ) -> Result<Vec<StoreCommand>, RecordError>
    where
        F: FnOnce(Result<(), RecordError>) + Send + 'static,
    {
        let commands = match self.build_commands(read_results, share, validity, block_accepted) {
            Ok(commands) => commands,
            Err(e) => {
                error!("Not recording share at height {}: {e}", share.height);
                let err = RecordError::from(e);
                on_complete(Err(err.clone()));
                return Err(err);
            }
        };

        let store_handle = self.store_handle.clone();
        let batch = commands.clone();
        tokio::spawn(async move {
            let result = store_handle.execute_batch(batch).await;
            if let Err(e) = &result {
                error!("Failed to record share batch: {e}");
            }
            on_complete(result.map_err(RecordError::from));
        });
        Ok(commands)
    }
}

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

use roundkeeper_accounting::test_utils::TEST_NOW;
use roundkeeper_lib::config::Config;
use roundkeeper_lib::shares::ShareRecorder;
use roundkeeper_lib::store::Store;
use roundkeeper_lib::store::writer::{StoreHandle, start_store_writer};
use roundkeeper_lib::utils::time_provider::TestTimeProvider;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// Config from the repository's config.toml with the store in `temp_dir`.
pub fn default_test_config(temp_dir: &TempDir) -> Config {
    Config::load("../config.toml")
        .unwrap()
        .with_store_path(temp_dir.path().to_str().unwrap().to_string())
}

pub struct TestPool {
    pub recorder: ShareRecorder,
    pub store_handle: StoreHandle,
    pub writer: JoinHandle<()>,
    pub clock: TestTimeProvider,
    _temp_dir: TempDir,
}

/// Recorder on a fresh store, with the clock at `TEST_NOW`.
pub fn setup_pool(auxiliary_enabled: bool) -> TestPool {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = default_test_config(&temp_dir).with_auxiliary_enabled(auxiliary_enabled);
    let store = Store::new(config.store.path.clone(), false).unwrap();
    pool_on_store(config, store, temp_dir)
}

/// Recorder on a store reopened read only, so every write fails at the database.
pub fn setup_read_only_pool() -> TestPool {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = default_test_config(&temp_dir);
    drop(Store::new(config.store.path.clone(), false).unwrap());
    let store = Store::new(config.store.path.clone(), true).unwrap();
    pool_on_store(config, store, temp_dir)
}

fn pool_on_store(config: Config, store: Store, temp_dir: TempDir) -> TestPool {
    let (store_handle, writer) = start_store_writer(Arc::new(store));
    let clock = TestTimeProvider::from_millis(TEST_NOW);
    let recorder = ShareRecorder::new(
        config.pool.accounting(),
        store_handle.clone(),
        Arc::new(clock.clone()),
    );
    TestPool {
        recorder,
        store_handle,
        writer,
        clock,
        _temp_dir: temp_dir,
    }
}

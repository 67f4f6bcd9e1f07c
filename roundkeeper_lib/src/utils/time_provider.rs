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

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Trait to get current system time, allowing for mocking in tests
pub trait TimeProvider: Send + Sync {
    fn now(&self) -> SystemTime;

    /// Milliseconds since the unix epoch, zero for clocks set before it.
    fn millis_since_epoch(&self) -> u64 {
        self.now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or_default()
    }
}

/// Default implementation that uses actual system time
#[derive(Clone, Debug, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Mock time provider for testing
///
/// Clones share the same clock, so a test can move time forward for a
/// component it handed a clone to.
#[derive(Clone, Debug)]
pub struct TestTimeProvider {
    time: Arc<Mutex<SystemTime>>,
}

impl TestTimeProvider {
    pub fn new(time: SystemTime) -> Self {
        Self {
            time: Arc::new(Mutex::new(time)),
        }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(UNIX_EPOCH + Duration::from_millis(millis))
    }

    pub fn set_millis_since_epoch(&self, millis: u64) {
        *self.time.lock().unwrap() = UNIX_EPOCH + Duration::from_millis(millis);
    }

    pub fn advance(&self, duration: Duration) {
        *self.time.lock().unwrap() += duration;
    }
}

impl TimeProvider for TestTimeProvider {
    fn now(&self) -> SystemTime {
        *self.time.lock().unwrap()
    }
}

// Copyright (c) 2023 The TQUIC Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Monotonic time used by the congestion controllers.
//!
//! Timestamps are plain microsecond counters relative to an arbitrary origin
//! chosen by the clock. A timestamp which has not been observed yet is
//! represented by `Option<Timestamp>`, never by a magic zero.

use std::cell::Cell;
use std::fmt;
use std::ops::Add;
use std::time::Duration;

/// A point on a monotonic clock, in microseconds since the clock origin.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The clock origin.
    pub const ZERO: Timestamp = Timestamp(0);

    pub const fn from_micros(micros: u64) -> Self {
        Timestamp(micros)
    }

    pub const fn from_millis(millis: u64) -> Self {
        Timestamp(millis.saturating_mul(1000))
    }

    pub const fn as_micros(&self) -> u64 {
        self.0
    }

    /// Return the amount of time elapsed from `earlier` to `self`, or zero
    /// if `earlier` is later than `self`.
    pub fn saturating_duration_since(&self, earlier: Timestamp) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        let micros = u64::try_from(rhs.as_micros()).unwrap_or(u64::MAX);
        Timestamp(self.0.saturating_add(micros))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}us", self.0)
    }
}

/// A monotonic clock capability.
pub trait Clock {
    /// Return the current time.
    fn now(&self) -> Timestamp;
}

/// A clock that only moves when told to. Used by simulations and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Cell::new(start.0),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, d: Duration) {
        let next = Timestamp(self.now.get()) + d;
        self.now.set(next.0);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.now.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_arithmetic() {
        let t = Timestamp::from_millis(10);
        assert_eq!(t.as_micros(), 10_000);
        assert_eq!(t + Duration::from_micros(5), Timestamp::from_micros(10_005));
        assert_eq!(
            (t + Duration::from_millis(3)).saturating_duration_since(t),
            Duration::from_millis(3)
        );

        // Going backwards saturates.
        assert_eq!(Timestamp::ZERO.saturating_duration_since(t), Duration::ZERO);
        assert_eq!(
            Timestamp::from_micros(u64::MAX) + Duration::from_secs(1),
            Timestamp::from_micros(u64::MAX)
        );
        assert_eq!(format!("{:?}", t), "10000us");
    }

    #[test]
    fn manual_clock() {
        let clock = ManualClock::new(Timestamp::from_millis(1));
        assert_eq!(clock.now(), Timestamp::from_millis(1));

        clock.advance(Duration::from_millis(20));
        assert_eq!(clock.now(), Timestamp::from_millis(21));
    }
}

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

use std::cmp;
use std::time::Duration;

/// RTT statistics of a connection.
///
/// The congestion controllers only read from it; the transport feeds it one
/// sample per acknowledged packet.
#[derive(Debug, Clone)]
pub struct RttEstimator {
    /// The most recent RTT sample.
    latest_rtt: Duration,

    /// Exponentially weighted moving average of the samples, unset until the
    /// first sample arrives.
    smoothed_rtt: Option<Duration>,

    /// The minimum RTT observed.
    min_rtt: Duration,

    /// Number of samples seen so far.
    sample_count: u64,
}

impl RttEstimator {
    pub fn new(initial_rtt: Duration) -> Self {
        Self {
            latest_rtt: initial_rtt,
            smoothed_rtt: None,
            min_rtt: initial_rtt,
            sample_count: 0,
        }
    }

    /// Return the latest rtt sample.
    pub fn latest_rtt(&self) -> Duration {
        self.latest_rtt
    }

    /// Return the current best RTT estimation.
    pub fn smoothed_rtt(&self) -> Duration {
        self.smoothed_rtt.unwrap_or(self.latest_rtt)
    }

    /// Return the minimum RTT observed so far.
    pub fn min_rtt(&self) -> Duration {
        self.min_rtt
    }

    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// Update the estimator with a new RTT sample.
    pub fn update(&mut self, rtt: Duration) {
        self.latest_rtt = rtt;
        self.sample_count = self.sample_count.saturating_add(1);

        match self.smoothed_rtt {
            Some(srtt) => {
                self.min_rtt = cmp::min(self.min_rtt, rtt);
                self.smoothed_rtt = Some((7 * srtt + rtt) / 8);
            }
            None => {
                // The initial rtt is only a guess, the first sample replaces it.
                self.min_rtt = rtt;
                self.smoothed_rtt = Some(rtt);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial() {
        let initial_rtt = Duration::from_millis(200);
        let r = RttEstimator::new(initial_rtt);
        assert_eq!(r.latest_rtt(), initial_rtt);
        assert_eq!(r.min_rtt(), initial_rtt);
        assert_eq!(r.smoothed_rtt(), initial_rtt);
        assert_eq!(r.sample_count(), 0);
    }

    #[test]
    fn update() {
        let mut r = RttEstimator::new(Duration::from_millis(200));

        r.update(Duration::from_millis(400));
        assert_eq!(r.latest_rtt(), Duration::from_millis(400));
        assert_eq!(r.min_rtt(), Duration::from_millis(400));
        assert_eq!(r.smoothed_rtt(), Duration::from_millis(400));

        r.update(Duration::from_millis(80));
        assert_eq!(r.latest_rtt(), Duration::from_millis(80));
        assert_eq!(r.min_rtt(), Duration::from_millis(80));
        assert_eq!(r.smoothed_rtt(), Duration::from_millis(360));
        assert_eq!(r.sample_count(), 2);
    }
}

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

//! `pcc_engine` is an online, learning-based congestion controller for a
//! reliable multi-stream transport.
//!
//! Instead of reacting to loss with additive-increase/multiplicative-decrease,
//! the controller partitions time into measurement intervals, runs each
//! interval at a fixed candidate congestion window, and scores the interval
//! with a utility combining throughput, loss and RTT. The best scoring window
//! is kept in a smoothed utility profile and a hill climbing search (slow start
//! followed by directional probing) picks the next candidate.
//!
//! ## Get started
//!
//! The transport owns one controller per connection and drives it from its
//! send path and its ack/loss processing path:
//!
//! ```
//! use pcc_engine::congestion_control::build_congestion_controller;
//! use pcc_engine::packet::{AckEvent, InflightPacket, LossEvent};
//! use pcc_engine::rtt::RttEstimator;
//! use pcc_engine::time::Timestamp;
//! use pcc_engine::CongestionController;
//! use pcc_engine::RecoveryConfig;
//!
//! let conf = RecoveryConfig::default();
//! let mut cc = build_congestion_controller(&conf);
//! let rtt = RttEstimator::new(conf.initial_rtt);
//!
//! let now = Timestamp::from_millis(1);
//! cc.on_data_sent(now, &InflightPacket::new(0, 9));
//! cc.on_data_ack_or_loss(
//!     Timestamp::from_millis(50),
//!     &AckEvent::new(0, now),
//!     &LossEvent::default(),
//!     &rtt,
//! );
//! assert!(cc.congestion_window() >= conf.min_congestion_window);
//! ```
//!
//! ## Logging
//!
//! The crate logs through the `log` facade. With the `debug` level enabled,
//! every interval creation and completion is emitted as a JSON trace record
//! that can be collected with [`trace::TraceCollector`].

use std::cmp;
use std::time::Duration;

/// The RECOMMENDED value of the timer granularity is 1 millisecond.
/// See RFC 9002 Section 6.1
pub const TIMER_GRANULARITY: Duration = Duration::from_millis(1);

/// When no previous RTT is available, the initial RTT SHOULD be set to 333
/// milliseconds.
pub const INITIAL_RTT: Duration = Duration::from_millis(333);

/// Default initial congestion window in packets.
pub const DEFAULT_INITIAL_CONGESTION_WINDOW: u32 = 10;

/// Default minimal congestion window in packets.
pub const DEFAULT_MIN_CONGESTION_WINDOW: u32 = 2;

/// Result type for congestion control operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Baseline recovery configuration shared by all congestion controllers.
///
/// Windows are measured in packets. Algorithm specific configurations such as
/// [`PccConfig`] derive their window limits from this one.
#[derive(Clone, Debug)]
pub struct RecoveryConfig {
    /// The congestion control algorithm used for a connection.
    pub congestion_control_algorithm: CongestionControlAlgorithm,

    /// The minimal congestion window in packets.
    pub min_congestion_window: u32,

    /// The initial congestion window in packets.
    pub initial_congestion_window: u32,

    /// The initial rtt, used before real rtt is estimated.
    pub initial_rtt: Duration,
}

impl RecoveryConfig {
    /// Set the congestion control algorithm.
    pub fn set_congestion_control_algorithm(&mut self, cca: CongestionControlAlgorithm) {
        self.congestion_control_algorithm = cca;
    }

    /// Set the initial congestion window in packets.
    /// The default value is 10. A zero window is raised to one packet.
    pub fn set_initial_congestion_window(&mut self, packets: u32) {
        self.initial_congestion_window = cmp::max(packets, 1);
    }

    /// Set the minimal congestion window in packets.
    /// The default value is 2. A zero window is raised to one packet.
    pub fn set_min_congestion_window(&mut self, packets: u32) {
        self.min_congestion_window = cmp::max(packets, 1);
    }

    /// Set the initial RTT in milliseconds. The default value is 333ms.
    pub fn set_initial_rtt(&mut self, millis: u64) {
        self.initial_rtt = cmp::max(Duration::from_millis(millis), TIMER_GRANULARITY);
    }
}

impl Default for RecoveryConfig {
    fn default() -> RecoveryConfig {
        RecoveryConfig {
            congestion_control_algorithm: CongestionControlAlgorithm::Pcc,
            min_congestion_window: DEFAULT_MIN_CONGESTION_WINDOW,
            initial_congestion_window: DEFAULT_INITIAL_CONGESTION_WINDOW,
            initial_rtt: INITIAL_RTT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[ctor::ctor]
    fn init() {
        env_logger::builder()
            .filter_level(log::LevelFilter::Trace)
            .format_timestamp_millis()
            .is_test(true)
            .init();
    }

    #[test]
    fn recovery_config_default() {
        let conf = RecoveryConfig::default();
        assert_eq!(conf.congestion_control_algorithm, CongestionControlAlgorithm::Pcc);
        assert_eq!(conf.min_congestion_window, 2);
        assert_eq!(conf.initial_congestion_window, 10);
        assert_eq!(conf.initial_rtt, INITIAL_RTT);
    }

    #[test]
    fn initial_rtt() {
        let mut conf = RecoveryConfig::default();

        conf.set_initial_rtt(0);
        assert_eq!(conf.initial_rtt, TIMER_GRANULARITY);

        conf.set_initial_rtt(100);
        assert_eq!(conf.initial_rtt, Duration::from_millis(100));
    }

    #[test]
    fn congestion_windows() {
        let mut conf = RecoveryConfig::default();

        conf.set_min_congestion_window(0);
        assert_eq!(conf.min_congestion_window, 1);
        conf.set_min_congestion_window(4);
        assert_eq!(conf.min_congestion_window, 4);

        conf.set_initial_congestion_window(0);
        assert_eq!(conf.initial_congestion_window, 1);
        conf.set_initial_congestion_window(32);
        assert_eq!(conf.initial_congestion_window, 32);

        conf.set_congestion_control_algorithm(CongestionControlAlgorithm::Dummy);
        assert_eq!(
            conf.congestion_control_algorithm,
            CongestionControlAlgorithm::Dummy
        );
    }
}

pub use crate::congestion_control::CongestionControlAlgorithm;
pub use crate::congestion_control::CongestionController;
pub use crate::congestion_control::Pcc;
pub use crate::congestion_control::PccConfig;
pub use crate::error::Error;

#[path = "congestion_control/congestion_control.rs"]
pub mod congestion_control;

pub mod error;
pub mod packet;
pub mod rtt;
pub mod time;
pub mod trace;

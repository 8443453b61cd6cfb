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

use core::str::FromStr;
use std::fmt;

use rand::RngCore;

use crate::packet::AckEvent;
use crate::packet::InflightPacket;
use crate::packet::LossEvent;
use crate::rtt::RttEstimator;
use crate::time::Timestamp;
use crate::Error;
use crate::RecoveryConfig;
use crate::Result;
pub use dummy::Dummy;
pub use interval::Interval;
pub use interval::IntervalHistory;
pub use interval::IntervalType;
pub use pcc::Pcc;
pub use pcc::PccConfig;
pub use pcc::ProbeDirection;
pub use profile::UtilityProfile;

/// Available congestion control algorithm
#[repr(C)]
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub enum CongestionControlAlgorithm {
    /// PCC searches the congestion window maximizing a utility function of
    /// throughput, loss rate and RTT. It measures candidate windows in
    /// consecutive intervals and climbs toward the best scoring one.
    #[default]
    Pcc,

    /// DUMMY keeps a static congestion window. It is intended to be used for
    /// testing and experiments.
    Dummy,
}

impl FromStr for CongestionControlAlgorithm {
    type Err = Error;

    fn from_str(algor: &str) -> Result<CongestionControlAlgorithm> {
        if algor.eq_ignore_ascii_case("pcc") {
            Ok(CongestionControlAlgorithm::Pcc)
        } else if algor.eq_ignore_ascii_case("dummy") {
            Ok(CongestionControlAlgorithm::Dummy)
        } else {
            Err(Error::InvalidConfig("unknown".into()))
        }
    }
}

/// Congestion control statistics.
#[derive(Debug, Default, Clone)]
pub struct CongestionStats {
    /// Total packets sent in slow start.
    pub packets_sent_in_slow_start: u64,

    /// Total packets acked in slow start.
    pub packets_acked_in_slow_start: u64,

    /// Total packets lost in slow start.
    pub packets_lost_in_slow_start: u64,

    /// Total packets sent.
    pub packets_sent_in_total: u64,

    /// Total packets acked.
    pub packets_acked_in_total: u64,

    /// Total packets lost.
    pub packets_lost_in_total: u64,

    /// Measurement intervals created.
    pub intervals_created: u64,

    /// Measurement intervals completed.
    pub intervals_completed: u64,
}

/// Congestion control interfaces shared by different algorithms.
///
/// Windows are measured in packets. Calls for a given connection are
/// serialized by the transport.
pub trait CongestionController {
    /// Name of congestion control algorithm.
    fn name(&self) -> &str;

    /// Algorithm implemented by the controller.
    fn algorithm(&self) -> CongestionControlAlgorithm;

    /// Callback after packet was sent out.
    fn on_data_sent(&mut self, now: Timestamp, packet: &InflightPacket);

    /// Callback for an acknowledgement and/or a loss report. Invalid events
    /// are ignored.
    fn on_data_ack_or_loss(
        &mut self,
        now: Timestamp,
        ack: &AckEvent,
        loss: &LossEvent,
        rtt: &RttEstimator,
    );

    /// Check if in slow start.
    fn in_slow_start(&self) -> bool {
        false
    }

    /// Current congestion window.
    fn congestion_window(&self) -> u32;

    /// Initial congestion window.
    fn initial_window(&self) -> u32;

    /// Minimal congestion window.
    fn minimal_window(&self) -> u32;

    /// Congestion stats.
    fn stats(&self) -> &CongestionStats;
}

impl fmt::Debug for dyn CongestionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "congestion controller {}.", self.name())
    }
}

/// Build a congestion controller.
pub fn build_congestion_controller(conf: &RecoveryConfig) -> Box<dyn CongestionController> {
    match conf.congestion_control_algorithm {
        CongestionControlAlgorithm::Pcc => {
            Box::new(Pcc::new(PccConfig::from_recovery_config(conf)))
        }
        CongestionControlAlgorithm::Dummy => Box::new(Dummy::new(conf.initial_congestion_window)),
    }
}

/// Build a congestion controller drawing its randomness from `rng`, which
/// makes runs reproducible.
pub fn build_congestion_controller_with_rng(
    conf: &RecoveryConfig,
    rng: Box<dyn RngCore + Send>,
) -> Box<dyn CongestionController> {
    match conf.congestion_control_algorithm {
        CongestionControlAlgorithm::Pcc => Box::new(Pcc::with_rng(
            PccConfig::from_recovery_config(conf),
            rng,
        )),
        CongestionControlAlgorithm::Dummy => Box::new(Dummy::new(conf.initial_congestion_window)),
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn congestion_control_name() {
        let cases = [
            ("pcc", Ok(CongestionControlAlgorithm::Pcc)),
            ("Pcc", Ok(CongestionControlAlgorithm::Pcc)),
            ("PCC", Ok(CongestionControlAlgorithm::Pcc)),
            ("dummy", Ok(CongestionControlAlgorithm::Dummy)),
            ("Dummy", Ok(CongestionControlAlgorithm::Dummy)),
            ("DUMMY", Ok(CongestionControlAlgorithm::Dummy)),
            ("pcx", Err(Error::InvalidConfig("unknown".into()))),
            ("", Err(Error::InvalidConfig("unknown".into()))),
        ];

        for (name, algor) in cases {
            assert_eq!(CongestionControlAlgorithm::from_str(name), algor);
        }
    }

    #[test]
    fn congestion_control_build() {
        let mut conf = RecoveryConfig::default();
        conf.set_initial_congestion_window(16);
        conf.set_min_congestion_window(4);

        let cc = build_congestion_controller(&conf);
        assert_eq!(cc.name(), "PCC");
        assert_eq!(cc.algorithm(), CongestionControlAlgorithm::Pcc);
        assert_eq!(cc.initial_window(), 16);
        assert_eq!(cc.minimal_window(), 4);
        assert_eq!(cc.congestion_window(), 16);
        assert!(cc.in_slow_start());
        assert_eq!(format!("{:?}", cc), "congestion controller PCC.");

        conf.set_congestion_control_algorithm(CongestionControlAlgorithm::Dummy);
        let cc = build_congestion_controller_with_rng(&conf, Box::new(StdRng::seed_from_u64(1)));
        assert_eq!(cc.name(), "DUMMY");
        assert_eq!(cc.congestion_window(), 16);
        assert!(!cc.in_slow_start());
    }

    #[test]
    fn congestion_control_seeded() {
        let conf = RecoveryConfig::default();
        let run = |seed| {
            let mut cc =
                build_congestion_controller_with_rng(&conf, Box::new(StdRng::seed_from_u64(seed)));
            let rtt = RttEstimator::new(conf.initial_rtt);
            let mut cwnds = Vec::new();
            for seq in 0..64 {
                let now = Timestamp::from_millis(seq as u64);
                let inflight = cc.congestion_window() - 1;
                cc.on_data_sent(now, &InflightPacket::new(seq, inflight));
                if seq >= 10 {
                    let acked = seq - 10;
                    cc.on_data_ack_or_loss(
                        now,
                        &AckEvent::new(acked, Timestamp::from_millis(acked as u64)),
                        &LossEvent::default(),
                        &rtt,
                    );
                }
                cwnds.push(cc.congestion_window());
            }
            cwnds
        };

        assert_eq!(run(3), run(3));
    }
}

mod dummy;
mod interval;
mod pcc;
mod profile;

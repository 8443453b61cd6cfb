// Copyright (c) 2024 The TQUIC Authors.
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

#![allow(unused_variables)]

use super::CongestionControlAlgorithm;
use super::CongestionController;
use super::CongestionStats;
use crate::packet::is_seq_valid;
use crate::packet::AckEvent;
use crate::packet::InflightPacket;
use crate::packet::LossEvent;
use crate::rtt::RttEstimator;
use crate::time::Timestamp;

/// Dummy is a simple congestion controller with a static congestion window.
/// It is intended to be used for testing and experiments, e.g. as a baseline
/// for the PCC search in the simulator.
#[derive(Debug)]
pub struct Dummy {
    /// Congestion window in packets.
    cwnd: u32,

    /// Congestion statistics.
    stats: CongestionStats,
}

impl Dummy {
    pub fn new(initial_cwnd: u32) -> Self {
        Self {
            cwnd: initial_cwnd,
            stats: Default::default(),
        }
    }
}

impl CongestionController for Dummy {
    fn name(&self) -> &str {
        "DUMMY"
    }

    fn algorithm(&self) -> CongestionControlAlgorithm {
        CongestionControlAlgorithm::Dummy
    }

    fn on_data_sent(&mut self, now: Timestamp, packet: &InflightPacket) {
        self.stats.packets_sent_in_total = self.stats.packets_sent_in_total.saturating_add(1);
    }

    fn on_data_ack_or_loss(
        &mut self,
        now: Timestamp,
        ack: &AckEvent,
        loss: &LossEvent,
        rtt: &RttEstimator,
    ) {
        if ack.valid && is_seq_valid(ack.seq) {
            self.stats.packets_acked_in_total = self.stats.packets_acked_in_total.saturating_add(1);
        }
        if loss.valid {
            let lost = loss.lost_seqs.iter().filter(|seq| is_seq_valid(**seq)).count();
            self.stats.packets_lost_in_total =
                self.stats.packets_lost_in_total.saturating_add(lost as u64);
        }
    }

    fn in_slow_start(&self) -> bool {
        false
    }

    fn congestion_window(&self) -> u32 {
        self.cwnd
    }

    fn initial_window(&self) -> u32 {
        self.cwnd
    }

    fn minimal_window(&self) -> u32 {
        self.cwnd
    }

    fn stats(&self) -> &CongestionStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::MAX_SEQ_NUMBER;
    use std::time::Duration;

    #[test]
    fn dummy_init() {
        let d = Dummy::new(10);
        assert_eq!(d.name(), "DUMMY");
        assert_eq!(d.algorithm(), CongestionControlAlgorithm::Dummy);
        assert_eq!(d.congestion_window(), 10);
        assert_eq!(d.initial_window(), 10);
        assert_eq!(d.minimal_window(), 10);

        assert_eq!(d.in_slow_start(), false);
        assert_eq!(d.stats().packets_sent_in_total, 0);
    }

    #[test]
    fn dummy_stats() {
        let mut d = Dummy::new(10);
        let rtt = Duration::from_millis(100);
        let rtt_estimator = RttEstimator::new(rtt);
        let now = Timestamp::from_millis(1);

        // Sent and acked a packet
        d.on_data_sent(now, &InflightPacket::new(0, 0));
        assert_eq!(d.stats().packets_sent_in_total, 1);

        let now = now + rtt;
        d.on_data_ack_or_loss(
            now,
            &AckEvent::new(0, Timestamp::from_millis(1)),
            &LossEvent::default(),
            &rtt_estimator,
        );
        assert_eq!(d.stats().packets_acked_in_total, 1);

        // Sent and lost two packets
        d.on_data_sent(now, &InflightPacket::new(1, 0));
        d.on_data_sent(now, &InflightPacket::new(2, 1));
        assert_eq!(d.stats().packets_sent_in_total, 3);

        d.on_data_ack_or_loss(
            now,
            &AckEvent::default(),
            &LossEvent::new(&[1, 2, MAX_SEQ_NUMBER]),
            &rtt_estimator,
        );
        assert_eq!(d.stats().packets_acked_in_total, 1);
        assert_eq!(d.stats().packets_lost_in_total, 2);

        // The window never moves.
        assert_eq!(d.congestion_window(), 10);
    }
}

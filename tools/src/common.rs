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

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::collections::VecDeque;
use std::fs::File;
use std::time::Duration;

use log::debug;
use log::trace;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use pcc_engine::congestion_control::build_congestion_controller_with_rng;
use pcc_engine::packet::AckEvent;
use pcc_engine::packet::InflightPacket;
use pcc_engine::packet::LossEvent;
use pcc_engine::rtt::RttEstimator;
use pcc_engine::time::Clock;
use pcc_engine::time::ManualClock;
use pcc_engine::time::Timestamp;
use pcc_engine::CongestionController;
use pcc_engine::RecoveryConfig;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Payload bytes carried by a simulated packet.
pub const PACKET_SIZE: u64 = 1024;

/// Return the log target. Logs are written to `stderr` unless a file is
/// given.
pub fn log_target(log_file: &Option<String>) -> Result<env_logger::Target> {
    if let Some(log_file) = log_file {
        let file = File::create(log_file)?;
        return Ok(env_logger::Target::Pipe(Box::new(file)));
    }
    Ok(env_logger::Target::Stderr)
}

/// Bottleneck link parameters.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Bottleneck bandwidth in packets per second.
    pub bandwidth: u64,

    /// Round trip propagation delay.
    pub base_rtt: Duration,

    /// Bottleneck buffer in packets.
    pub buffer: usize,

    /// Probability of a random drop, in [0, 1).
    pub loss_rate: f64,
}

/// A FIFO bottleneck with a drop-tail buffer.
#[derive(Debug)]
struct Link {
    config: LinkConfig,

    /// Time needed to serialize one packet.
    service_time: Duration,

    /// Departure times of the queued packets.
    queue: VecDeque<Timestamp>,

    /// Time at which the link becomes idle.
    idle_at: Timestamp,
}

impl Link {
    fn new(config: LinkConfig) -> Self {
        let bandwidth = config.bandwidth.max(1);
        Self {
            service_time: Duration::from_micros(1_000_000 / bandwidth),
            queue: VecDeque::new(),
            idle_at: Timestamp::ZERO,
            config,
        }
    }

    /// Enqueue a packet. Return its departure time, or None if it is
    /// dropped.
    fn enqueue(&mut self, now: Timestamp, rng: &mut StdRng) -> Option<Timestamp> {
        while self.queue.front().map_or(false, |t| *t <= now) {
            self.queue.pop_front();
        }

        if self.config.loss_rate > 0.0 && rng.gen::<f64>() < self.config.loss_rate {
            return None;
        }
        if self.queue.len() >= self.config.buffer {
            return None;
        }

        let departure = std::cmp::max(now, self.idle_at) + self.service_time;
        self.idle_at = departure;
        self.queue.push_back(departure);
        Some(departure)
    }
}

/// Feedback scheduled by the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Feedback {
    at: Timestamp,
    seq: u32,
    send_time: Timestamp,
    lost: bool,
}

/// Result of a simulation run.
#[derive(Debug, Default, Clone)]
pub struct SimulationReport {
    /// Simulated time.
    pub duration: Duration,

    pub sent: u64,

    pub acked: u64,

    pub lost: u64,

    /// Congestion window sampled at every feedback.
    pub cwnd_samples: Vec<f64>,

    /// RTT samples in milliseconds.
    pub rtt_samples: Vec<f64>,

    /// Minimum RTT seen by the estimator.
    pub min_rtt: Duration,

    /// Smoothed RTT of the estimator at the end of the run.
    pub smoothed_rtt: Duration,
}

impl SimulationReport {
    /// Goodput in Mbps.
    pub fn goodput_mbps(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        (self.acked * PACKET_SIZE * 8) as f64 / secs / 1_000_000.0
    }

    /// Share of the sent packets lost.
    pub fn loss_ratio(&self) -> f64 {
        if self.sent == 0 {
            return 0.0;
        }
        self.lost as f64 / self.sent as f64
    }
}

/// Drives a congestion controller over a simulated bottleneck. It plays the
/// role of the transport: it sends while the window allows, feeds
/// acknowledgements with their RTT, and declares losses one RTT after the
/// drop.
pub struct Simulator {
    cc: Box<dyn CongestionController>,

    link: Link,

    rtt: RttEstimator,

    clock: ManualClock,

    rng: StdRng,

    feedback: BinaryHeap<Reverse<Feedback>>,

    next_seq: u32,

    inflight: u32,

    report: SimulationReport,
}

impl Simulator {
    pub fn new(conf: &RecoveryConfig, link: LinkConfig, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let cc_rng = StdRng::seed_from_u64(rng.gen());

        Self {
            cc: build_congestion_controller_with_rng(conf, Box::new(cc_rng)),
            link: Link::new(link),
            rtt: RttEstimator::new(conf.initial_rtt),
            clock: ManualClock::new(Timestamp::from_millis(1)),
            rng,
            feedback: BinaryHeap::new(),
            next_seq: 0,
            inflight: 0,
            report: SimulationReport::default(),
        }
    }

    pub fn controller(&self) -> &dyn CongestionController {
        self.cc.as_ref()
    }

    /// Run for the given simulated time.
    pub fn run(&mut self, duration: Duration) -> &SimulationReport {
        let start = self.clock.now();
        let end = start + duration;

        while self.clock.now() < end {
            self.send();

            let Reverse(fb) = match self.feedback.pop() {
                Some(fb) => fb,
                None => break,
            };
            if fb.at > end {
                break;
            }
            self.clock.advance(fb.at.saturating_duration_since(self.clock.now()));
            self.on_feedback(fb);
        }

        self.report.duration = self.clock.now().saturating_duration_since(start);
        self.report.min_rtt = self.rtt.min_rtt();
        self.report.smoothed_rtt = self.rtt.smoothed_rtt();
        &self.report
    }

    fn send(&mut self) {
        let now = self.clock.now();
        while self.inflight < self.cc.congestion_window() {
            let seq = self.next_seq;
            self.next_seq = self.next_seq.wrapping_add(1);

            self.cc.on_data_sent(now, &InflightPacket::new(seq, self.inflight));
            self.inflight += 1;
            self.report.sent += 1;

            let fb = match self.link.enqueue(now, &mut self.rng) {
                Some(departure) => Feedback {
                    at: departure + self.link.config.base_rtt,
                    seq,
                    send_time: now,
                    lost: false,
                },
                None => {
                    trace!("packet {} dropped at {:?}", seq, now);
                    Feedback {
                        at: now + self.link.config.base_rtt,
                        seq,
                        send_time: now,
                        lost: true,
                    }
                }
            };
            self.feedback.push(Reverse(fb));
        }
    }

    fn on_feedback(&mut self, fb: Feedback) {
        let now = self.clock.now();
        self.inflight = self.inflight.saturating_sub(1);

        if fb.lost {
            self.report.lost += 1;
            self.cc.on_data_ack_or_loss(
                now,
                &AckEvent::default(),
                &LossEvent::new(&[fb.seq]),
                &self.rtt,
            );
        } else {
            self.report.acked += 1;
            let sample = now.saturating_duration_since(fb.send_time);
            self.rtt.update(sample);
            self.report
                .rtt_samples
                .push(sample.as_micros() as f64 / 1000.0);
            self.cc.on_data_ack_or_loss(
                now,
                &AckEvent::new(fb.seq, fb.send_time),
                &LossEvent::default(),
                &self.rtt,
            );
        }

        let cwnd = self.cc.congestion_window();
        self.report.cwnd_samples.push(cwnd as f64);
        debug!(
            "{:?} seq={} lost={} cwnd={} inflight={}",
            now, fb.seq, fb.lost, cwnd, self.inflight
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcc_engine::CongestionControlAlgorithm;

    fn link(loss_rate: f64) -> LinkConfig {
        LinkConfig {
            bandwidth: 1000,
            base_rtt: Duration::from_millis(40),
            buffer: 20,
            loss_rate,
        }
    }

    #[test]
    fn link_drop_tail() {
        let mut l = Link::new(LinkConfig {
            bandwidth: 1000,
            base_rtt: Duration::from_millis(10),
            buffer: 2,
            loss_rate: 0.0,
        });
        let mut rng = StdRng::seed_from_u64(0);
        let now = Timestamp::from_millis(1);

        assert_eq!(l.enqueue(now, &mut rng), Some(Timestamp::from_millis(2)));
        assert_eq!(l.enqueue(now, &mut rng), Some(Timestamp::from_millis(3)));
        assert_eq!(l.enqueue(now, &mut rng), None);

        // The queue drains with time.
        let later = Timestamp::from_millis(3);
        assert_eq!(l.enqueue(later, &mut rng), Some(Timestamp::from_millis(4)));
    }

    #[test]
    fn simulate_dummy() {
        let mut conf = RecoveryConfig::default();
        conf.set_congestion_control_algorithm(CongestionControlAlgorithm::Dummy);
        conf.set_initial_congestion_window(10);

        let mut sim = Simulator::new(&conf, link(0.0), 1);
        let report = sim.run(Duration::from_secs(2)).clone();
        assert!(report.sent > 0);
        assert_eq!(report.lost, 0);
        assert!(report.acked > 0);
        assert!(report.sent >= report.acked + report.lost);
        assert!(report.cwnd_samples.iter().all(|c| *c == 10.0));
        assert!(report.goodput_mbps() > 0.0);

        // The queue never builds up with a window below the BDP, so every
        // sample sits close to the base RTT.
        assert!(report.min_rtt >= Duration::from_millis(40));
        assert!(report.min_rtt < Duration::from_millis(50));
        assert!(report.smoothed_rtt >= report.min_rtt);
        assert!(report.smoothed_rtt < Duration::from_millis(60));
    }

    #[test]
    fn simulate_pcc() {
        let conf = RecoveryConfig::default();
        let mut sim = Simulator::new(&conf, link(0.01), 7);
        let report = sim.run(Duration::from_secs(5)).clone();

        assert!(report.acked > 0);
        assert!(report.loss_ratio() < 1.0);
        assert!(report
            .cwnd_samples
            .iter()
            .all(|c| *c >= conf.min_congestion_window as f64));
        assert!(sim.controller().stats().intervals_completed > 0);
    }

    #[test]
    fn simulate_reproducible() {
        let conf = RecoveryConfig::default();
        let run = || {
            let mut sim = Simulator::new(&conf, link(0.02), 42);
            sim.run(Duration::from_secs(2)).cwnd_samples.clone()
        };
        assert_eq!(run(), run());
    }
}

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

//! PCC: Performance-oriented Congestion Control, utility driven variant.
//!
//! The controller does not react to individual congestion signals. It runs
//! measurement intervals, each at a fixed candidate window, scores every
//! interval with
//!
//! ```text
//! utility = throughput * (1 - loss_rate)^3 / avg_rtt
//! ```
//!
//! and keeps an exponentially smoothed utility per window. Intervals
//! alternate between `Normal`, which re-measures the best known window, and
//! `Probe`, which tries `best_cwnd +/- 2^probe_step_power`.
//!
//! The search starts in slow start, where probes only move up and the step
//! doubles after every successful probe. Repeated failures to improve move
//! the controller to the steady state, a hill climb which keeps a direction
//! and widens its step while utility holds, and turns around on regression.
//!
//! See <https://www.usenix.org/conference/nsdi18/presentation/dong>.

use std::cmp;
use std::time::Duration;

use log::*;
use rand::rngs::StdRng;
use rand::Rng;
use rand::RngCore;
use rand::SeedableRng;

use super::interval::Interval;
use super::interval::IntervalHistory;
use super::interval::IntervalType;
use super::profile::UtilityProfile;
use super::CongestionControlAlgorithm;
use super::CongestionController;
use super::CongestionStats;
use crate::packet::is_seq_valid;
use crate::packet::AckEvent;
use crate::packet::InflightPacket;
use crate::packet::LossEvent;
use crate::packet::MAX_SEQ_NUMBER;
use crate::rtt::RttEstimator;
use crate::time::Timestamp;
use crate::trace::trace_line;
use crate::trace::IntervalTrace;
use crate::trace::TraceKind;
use crate::Error;
use crate::RecoveryConfig;
use crate::Result;

/// Weight of a new utility sample in the profile.
const UTILITY_EWMA_ALPHA: f64 = 0.5;

/// Number of intervals kept in the history.
const MAX_HISTORY: usize = 3;

/// Upper bound of the step power during slow start.
const SLOW_START_MAX_STEP_POWER: u32 = 3;

/// Consecutive non-improving probes tolerated in slow start.
const SLOW_START_MAX_FAILURES: u32 = 2;

/// Step power once slow start is over.
const STEADY_STATE_STEP_POWER: u32 = 1;

/// Upper bound of the step power.
const MAX_STEP_POWER: u32 = 31;

/// The step is reset when it reaches this share of the best window.
const STEP_RESET_RATIO: f64 = 0.1;

/// A probe whose utility is this much below the best turns the search
/// around.
const UTILITY_REGRESS_RATIO: f64 = 0.1;

/// Payload bits carried by a packet.
const BITS_PER_PACKET: f64 = 1024.0 * 8.0;

/// Upper bound of the interval loss rate.
const MAX_LOSS_RATE: f64 = 0.99;

/// PCC configurable parameters.
#[derive(Debug, Clone)]
pub struct PccConfig {
    /// Minimal congestion window in packets.
    min_cwnd: u32,

    /// Initial congestion window in packets.
    initial_cwnd: u32,

    /// Acknowledged packets needed to free one slot of the output window
    /// ramp. Never zero.
    ack_per_free_slot: u32,

    /// Weight of a new utility sample in the profile.
    utility_ewma_alpha: f64,

    /// Number of intervals kept in the history.
    max_history: usize,

    /// Upper bound of the step power during slow start.
    slow_start_max_step_power: u32,

    /// Consecutive non-improving probes before leaving slow start.
    slow_start_max_failures: u32,

    /// Step power once slow start is over.
    steady_state_step_power: u32,

    /// Upper bound of the step power.
    max_step_power: u32,

    /// Share of the best window at which the step is reset.
    step_reset_ratio: f64,

    /// Relative utility regression which turns the search around.
    utility_regress_ratio: f64,

    /// Payload bits carried by a packet.
    bits_per_packet: f64,

    /// Upper bound of the interval loss rate.
    max_loss_rate: f64,
}

impl PccConfig {
    pub fn new(min_cwnd: u32, initial_cwnd: u32) -> Self {
        let min_cwnd = cmp::max(min_cwnd, 1);
        Self {
            min_cwnd,
            initial_cwnd: cmp::max(initial_cwnd, min_cwnd),
            ..Default::default()
        }
    }

    /// Derive the PCC configuration from the baseline recovery configuration.
    pub fn from_recovery_config(conf: &RecoveryConfig) -> Self {
        Self::new(conf.min_congestion_window, conf.initial_congestion_window)
    }

    /// Check the consistency of the parameters.
    pub fn validate(&self) -> Result<()> {
        if self.min_cwnd == 0 || self.initial_cwnd < self.min_cwnd {
            return Err(Error::InvalidConfig(format!(
                "initial cwnd {} min cwnd {}",
                self.initial_cwnd, self.min_cwnd
            )));
        }
        if !(self.utility_ewma_alpha > 0.0 && self.utility_ewma_alpha <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "utility ewma alpha {}",
                self.utility_ewma_alpha
            )));
        }
        if self.max_step_power > MAX_STEP_POWER
            || self.slow_start_max_step_power > self.max_step_power
            || self.steady_state_step_power > self.max_step_power
        {
            return Err(Error::InvalidConfig("step power above max".into()));
        }
        Ok(())
    }

    pub fn min_cwnd(&self) -> u32 {
        self.min_cwnd
    }

    pub fn initial_cwnd(&self) -> u32 {
        self.initial_cwnd
    }

    pub fn ack_per_free_slot(&self) -> u32 {
        self.ack_per_free_slot
    }

    /// Set the number of acknowledged packets freeing one slot of the output
    /// window ramp. Zero is raised to one.
    pub fn set_ack_per_free_slot(&mut self, v: u32) {
        self.ack_per_free_slot = cmp::max(v, 1);
    }

    /// Set the weight of a new utility sample, in (0, 1].
    pub fn set_utility_ewma_alpha(&mut self, v: f64) -> Result<()> {
        if !(v > 0.0 && v <= 1.0) {
            return Err(Error::InvalidConfig(format!("utility ewma alpha {}", v)));
        }
        self.utility_ewma_alpha = v;
        Ok(())
    }

    /// Set the number of intervals kept in the history. Zero is raised to
    /// one.
    pub fn set_max_history(&mut self, v: usize) {
        self.max_history = cmp::max(v, 1);
    }

    pub fn max_step_power(&self) -> u32 {
        self.max_step_power
    }

    /// Set the upper bound of the step power, at most 31. The slow start and
    /// steady state powers are lowered to the new bound.
    pub fn set_max_step_power(&mut self, v: u32) {
        self.max_step_power = cmp::min(v, MAX_STEP_POWER);
        self.slow_start_max_step_power =
            cmp::min(self.slow_start_max_step_power, self.max_step_power);
        self.steady_state_step_power = cmp::min(self.steady_state_step_power, self.max_step_power);
    }

    pub fn set_slow_start_max_step_power(&mut self, v: u32) {
        self.slow_start_max_step_power = cmp::min(v, self.max_step_power);
    }

    /// Set the number of consecutive failed probes ending slow start. Zero
    /// is raised to one.
    pub fn set_slow_start_max_failures(&mut self, v: u32) {
        self.slow_start_max_failures = cmp::max(v, 1);
    }

    pub fn set_steady_state_step_power(&mut self, v: u32) {
        self.steady_state_step_power = cmp::min(v, self.max_step_power);
    }

    pub fn set_step_reset_ratio(&mut self, v: f64) -> Result<()> {
        if !(v >= 0.0 && v.is_finite()) {
            return Err(Error::InvalidConfig(format!("step reset ratio {}", v)));
        }
        self.step_reset_ratio = v;
        Ok(())
    }

    pub fn set_utility_regress_ratio(&mut self, v: f64) -> Result<()> {
        if !(0.0..1.0).contains(&v) {
            return Err(Error::InvalidConfig(format!("utility regress ratio {}", v)));
        }
        self.utility_regress_ratio = v;
        Ok(())
    }

    pub fn set_bits_per_packet(&mut self, v: f64) -> Result<()> {
        if !(v > 0.0 && v.is_finite()) {
            return Err(Error::InvalidConfig(format!("bits per packet {}", v)));
        }
        self.bits_per_packet = v;
        Ok(())
    }

    pub fn set_max_loss_rate(&mut self, v: f64) -> Result<()> {
        if !(0.0..1.0).contains(&v) {
            return Err(Error::InvalidConfig(format!("max loss rate {}", v)));
        }
        self.max_loss_rate = v;
        Ok(())
    }
}

impl Default for PccConfig {
    fn default() -> Self {
        Self {
            min_cwnd: crate::DEFAULT_MIN_CONGESTION_WINDOW,
            initial_cwnd: crate::DEFAULT_INITIAL_CONGESTION_WINDOW,
            ack_per_free_slot: 1,
            utility_ewma_alpha: UTILITY_EWMA_ALPHA,
            max_history: MAX_HISTORY,
            slow_start_max_step_power: SLOW_START_MAX_STEP_POWER,
            slow_start_max_failures: SLOW_START_MAX_FAILURES,
            steady_state_step_power: STEADY_STATE_STEP_POWER,
            max_step_power: MAX_STEP_POWER,
            step_reset_ratio: STEP_RESET_RATIO,
            utility_regress_ratio: UTILITY_REGRESS_RATIO,
            bits_per_packet: BITS_PER_PACKET,
            max_loss_rate: MAX_LOSS_RATE,
        }
    }
}

/// Direction of the steady state search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeDirection {
    /// Probe above the best window.
    Up,

    /// Probe below the best window.
    Down,
}

impl ProbeDirection {
    pub fn reverse(self) -> Self {
        match self {
            ProbeDirection::Up => ProbeDirection::Down,
            ProbeDirection::Down => ProbeDirection::Up,
        }
    }

    /// +1 or -1.
    pub fn sign(self) -> i32 {
        match self {
            ProbeDirection::Up => 1,
            ProbeDirection::Down => -1,
        }
    }
}

/// PCC congestion controller.
pub struct Pcc {
    /// Config.
    config: PccConfig,

    /// Statistics.
    stats: CongestionStats,

    /// Connection scoped id used in traces.
    id: u32,

    /// Source of the interval length jitter.
    rng: Box<dyn RngCore + Send>,

    /// Recent intervals, the latest one receives the sent packets.
    history: IntervalHistory,

    /// Smoothed utility per window.
    profile: UtilityProfile,

    /// Window with the best smoothed utility.
    best_cwnd: u32,

    /// The probe step is `2^probe_step_power` packets.
    probe_step_power: u32,

    /// Direction of the steady state search.
    probe_direction: ProbeDirection,

    /// Is in slow start state.
    in_slow_start: bool,

    /// Consecutive slow start probes which did not improve the best window.
    slow_start_fail_count: u32,

    /// Largest acknowledged sequence number.
    largest_acked: u32,

    /// Acknowledged packets not yet converted into output window ramp.
    free_count: u32,

    /// Latest RTT sample, bounds the interval length jitter.
    latest_rtt: Duration,
}

impl Pcc {
    pub fn new(config: PccConfig) -> Self {
        Self::with_rng(config, Box::new(StdRng::from_entropy()))
    }

    /// Create a controller using the given random generator for the interval
    /// length jitter and the controller id.
    pub fn with_rng(config: PccConfig, mut rng: Box<dyn RngCore + Send>) -> Self {
        let id = rng.next_u32();
        let initial_cwnd = config.initial_cwnd;
        debug!("ccid:{} pcc created, config {:?}", id, config);
        if let Err(e) = config.validate() {
            warn!("ccid:{} pcc config {}", id, e);
        }

        Self {
            stats: Default::default(),
            id,
            rng,
            history: IntervalHistory::new(config.max_history),
            profile: UtilityProfile::new(config.utility_ewma_alpha),
            best_cwnd: initial_cwnd,
            probe_step_power: 0,
            probe_direction: ProbeDirection::Up,
            in_slow_start: true,
            slow_start_fail_count: 0,
            largest_acked: MAX_SEQ_NUMBER,
            free_count: 0,
            latest_rtt: Duration::ZERO,
            config,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn config(&self) -> &PccConfig {
        &self.config
    }

    pub fn best_cwnd(&self) -> u32 {
        self.best_cwnd
    }

    pub fn probe_step_power(&self) -> u32 {
        self.probe_step_power
    }

    pub fn probe_direction(&self) -> ProbeDirection {
        self.probe_direction
    }

    pub fn profile(&self) -> &UtilityProfile {
        &self.profile
    }

    pub fn history(&self) -> &IntervalHistory {
        &self.history
    }

    /// Current probe step in packets.
    fn probe_step(&self) -> u32 {
        1u32 << cmp::min(self.probe_step_power, self.config.max_step_power)
    }

    /// Candidate window of the next probe interval.
    pub fn calculate_probe_cwnd(&self) -> u32 {
        let step = self.probe_step();
        if self.in_slow_start || self.probe_direction == ProbeDirection::Up {
            self.best_cwnd.saturating_add(step)
        } else {
            cmp::max(self.best_cwnd.saturating_sub(step), 1)
        }
    }

    fn extra_duration(&mut self) -> Duration {
        let latest_rtt_us = u64::try_from(self.latest_rtt.as_micros()).unwrap_or(u64::MAX);
        if latest_rtt_us == 0 {
            return Duration::ZERO;
        }
        Duration::from_micros(self.rng.gen_range(0..latest_rtt_us))
    }

    fn maybe_create_interval(&self) -> bool {
        self.history.latest().map_or(true, |itvl| itvl.sent_done())
    }

    /// Create the next interval and append it to the history.
    fn create_interval(&mut self) {
        let (interval_type, target_cwnd, output_cwnd) = match self.history.latest() {
            None => (
                IntervalType::Normal,
                self.config.initial_cwnd,
                self.config.initial_cwnd,
            ),
            Some(prev) => {
                let (interval_type, target_cwnd) = match prev.interval_type() {
                    IntervalType::Normal => (IntervalType::Probe, self.calculate_probe_cwnd()),
                    IntervalType::Probe => (IntervalType::Normal, self.best_cwnd),
                };
                // Do not jump above the window of the previous interval, the
                // output ramps up on acknowledgements instead.
                let output_cwnd = cmp::min(target_cwnd, prev.target_cwnd());
                (interval_type, target_cwnd, output_cwnd)
            }
        };

        let target_cwnd = cmp::max(target_cwnd, self.config.min_cwnd);
        let output_cwnd = cmp::max(output_cwnd, self.config.min_cwnd);
        let extra_duration = self.extra_duration();
        let itvl = Interval::new(interval_type, target_cwnd, output_cwnd, extra_duration);

        if log_enabled!(Level::Debug) {
            debug!("{}", self.interval_line(TraceKind::Created, &itvl));
        }

        if let Some(evicted) = self.history.push(itvl) {
            trace!(
                "ccid:{} evict interval target_cwnd={} recv_done={}",
                self.id,
                evicted.target_cwnd(),
                evicted.recv_done()
            );
        }
        self.stats.intervals_created = self.stats.intervals_created.saturating_add(1);
    }

    /// Fold a completed interval into the utility profile and steer the
    /// search.
    pub fn update_cwnd_profile(&mut self, itvl: &Interval) {
        let smoothed = self.profile.update(itvl.target_cwnd(), itvl.utility());
        trace!(
            "ccid:{} profile cwnd={} sample={} smoothed={}",
            self.id,
            itvl.target_cwnd(),
            itvl.utility(),
            smoothed
        );

        // Normal intervals calibrate the profile but do not drive the search.
        if itvl.interval_type() == IntervalType::Normal {
            return;
        }

        let (best_cwnd, best_utility) = match self.profile.best() {
            Some(best) => best,
            None => return,
        };

        if self.in_slow_start {
            self.update_slow_start(best_cwnd);
        } else {
            self.update_steady_state(itvl, best_cwnd, best_utility);
        }

        self.best_cwnd = best_cwnd;
    }

    fn update_slow_start(&mut self, best_cwnd: u32) {
        let old_best = self.best_cwnd;

        if best_cwnd > old_best {
            self.slow_start_fail_count = 0;
            // The step just tried won, double it.
            if best_cwnd == old_best.saturating_add(self.probe_step())
                && self.probe_step_power < self.config.slow_start_max_step_power
            {
                self.probe_step_power += 1;
            }
            return;
        }

        self.slow_start_fail_count += 1;
        if self.slow_start_fail_count >= self.config.slow_start_max_failures {
            self.in_slow_start = false;
            self.slow_start_fail_count = 0;
            self.probe_step_power = self.config.steady_state_step_power;
            debug!(
                "ccid:{} exit slow start, best_cwnd={} probe_step_power={}",
                self.id, best_cwnd, self.probe_step_power
            );
        } else if self.probe_step_power > 0 {
            self.probe_step_power -= 1;
        }
    }

    fn update_steady_state(&mut self, itvl: &Interval, best_cwnd: u32, best_utility: f64) {
        if best_cwnd != self.best_cwnd {
            // Another window than the one just probed took the lead, the
            // search went the wrong way.
            if best_cwnd != itvl.target_cwnd() {
                self.probe_direction = self.probe_direction.reverse();
            }
            self.maybe_reset_step(best_cwnd);
            return;
        }

        let regressed = itvl.utility() < best_utility * (1.0 - self.config.utility_regress_ratio);
        if regressed || itvl.target_cwnd() == self.config.min_cwnd {
            self.probe_direction = self.probe_direction.reverse();
            self.maybe_reset_step(best_cwnd);
        } else if self.probe_step_power < self.config.max_step_power {
            self.probe_step_power += 1;
        }
    }

    /// Restart with the smallest step once it becomes large relative to the
    /// best window.
    fn maybe_reset_step(&mut self, best_cwnd: u32) {
        let step = self.probe_step() as f64;
        if step >= self.config.step_reset_ratio * best_cwnd as f64 {
            self.probe_step_power = 0;
        }
    }

    fn on_interval_completed(&mut self, i: usize) {
        let itvl = match self.history.get(i) {
            Some(itvl) => itvl.clone(),
            None => return,
        };

        self.update_cwnd_profile(&itvl);
        self.stats.intervals_completed = self.stats.intervals_completed.saturating_add(1);

        if log_enabled!(Level::Debug) {
            debug!("{}", self.interval_line(TraceKind::Completed, &itvl));
        }
    }

    fn on_data_loss(&mut self, now: Timestamp, loss: &LossEvent) {
        let lost = loss
            .lost_seqs
            .iter()
            .filter(|seq| is_seq_valid(**seq))
            .count() as u64;
        self.stats.packets_lost_in_total = self.stats.packets_lost_in_total.saturating_add(lost);
        if self.in_slow_start {
            self.stats.packets_lost_in_slow_start =
                self.stats.packets_lost_in_slow_start.saturating_add(lost);
        }

        for i in 0..self.history.len() {
            let completed = match self.history.get_mut(i) {
                Some(itvl) => {
                    for &seq in loss.lost_seqs.iter() {
                        if itvl.contains(seq) {
                            itvl.on_packet_lost(now);
                        }
                    }
                    itvl.try_complete_on_loss(
                        now,
                        self.config.bits_per_packet,
                        self.config.max_loss_rate,
                    )
                }
                None => false,
            };

            if completed {
                self.on_interval_completed(i);
            }
        }
    }

    fn on_data_recv(&mut self, now: Timestamp, ack: &AckEvent) {
        let seq = ack.seq;

        self.stats.packets_acked_in_total = self.stats.packets_acked_in_total.saturating_add(1);
        if self.in_slow_start {
            self.stats.packets_acked_in_slow_start =
                self.stats.packets_acked_in_slow_start.saturating_add(1);
        }

        // Newly acknowledged range feeds the output window ramp.
        if !is_seq_valid(self.largest_acked) {
            self.free_count = self.free_count.saturating_add(1);
            self.largest_acked = seq;
        } else if seq > self.largest_acked {
            self.free_count = self.free_count.saturating_add(seq - self.largest_acked);
            self.largest_acked = seq;
        }

        let rtt_sample = now.saturating_duration_since(ack.send_time);
        for i in 0..self.history.len() {
            let completed = match self.history.get_mut(i) {
                Some(itvl) => {
                    if itvl.contains(seq) {
                        itvl.on_packet_acked(now, rtt_sample);
                    }
                    itvl.try_complete_on_ack(
                        seq,
                        now,
                        self.config.bits_per_packet,
                        self.config.max_loss_rate,
                    )
                }
                None => false,
            };

            if completed {
                self.on_interval_completed(i);
            }
        }
    }

    /// Trace log message of an interval.
    fn interval_line(&self, kind: TraceKind, itvl: &Interval) -> String {
        trace_line(kind, &self.interval_trace(itvl))
    }

    fn interval_trace(&self, itvl: &Interval) -> IntervalTrace {
        IntervalTrace {
            connid: self.id,
            interval_type: itvl.interval_type(),
            target_cwnd: itvl.target_cwnd(),
            output_cwnd: itvl.output_cwnd(),
            send_cnt: itvl.send_cnt(),
            ack_cnt: itvl.ack_cnt(),
            loss_cnt: itvl.loss_cnt(),
            max_inflight: itvl.max_inflight(),
            rtt: itvl.rtt().as_micros() as f64 / 1000.0,
            avg_rtt: itvl.avg_rtt().as_micros() as f64 / 1000.0,
            throughput: itvl.throughput(),
            loss_rate: itvl.loss_rate(),
            utility: itvl.utility(),
            best_cwnd: self.best_cwnd,
            probe_step_power: self.probe_step_power,
            probe_direction: self.probe_direction.sign(),
        }
    }
}

impl std::fmt::Debug for Pcc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pcc")
            .field("id", &self.id)
            .field("best_cwnd", &self.best_cwnd)
            .field("probe_step_power", &self.probe_step_power)
            .field("probe_direction", &self.probe_direction)
            .field("in_slow_start", &self.in_slow_start)
            .field("history", &self.history.len())
            .field("profile", &self.profile.len())
            .finish()
    }
}

impl CongestionController for Pcc {
    fn name(&self) -> &str {
        "PCC"
    }

    fn algorithm(&self) -> CongestionControlAlgorithm {
        CongestionControlAlgorithm::Pcc
    }

    fn on_data_sent(&mut self, now: Timestamp, packet: &InflightPacket) {
        self.stats.packets_sent_in_total = self.stats.packets_sent_in_total.saturating_add(1);
        if self.in_slow_start {
            self.stats.packets_sent_in_slow_start =
                self.stats.packets_sent_in_slow_start.saturating_add(1);
        }

        if self.maybe_create_interval() {
            self.create_interval();
        }

        if let Some(itvl) = self.history.latest_mut() {
            if !itvl.sent_done() {
                itvl.on_data_sent(now, packet);
            }
        }
    }

    fn on_data_ack_or_loss(
        &mut self,
        now: Timestamp,
        ack: &AckEvent,
        loss: &LossEvent,
        rtt: &RttEstimator,
    ) {
        let mut largest_seq = None;

        if loss.valid {
            self.on_data_loss(now, loss);
            largest_seq = loss.largest_lost();
        }

        if ack.valid && is_seq_valid(ack.seq) {
            self.on_data_recv(now, ack);
            largest_seq = Some(largest_seq.map_or(ack.seq, |seq: u32| seq.max(ack.seq)));
        }

        if let Some(seq) = largest_seq {
            let newly_free = self.free_count / self.config.ack_per_free_slot;
            self.free_count %= self.config.ack_per_free_slot;

            // The event which ends sending may also resolve the last packet.
            let completed = match self.history.latest_mut() {
                Some(itvl) => {
                    itvl.check_if_sent_done(seq, now, newly_free);
                    itvl.try_complete_on_loss(
                        now,
                        self.config.bits_per_packet,
                        self.config.max_loss_rate,
                    )
                }
                None => false,
            };
            if completed {
                self.on_interval_completed(self.history.len() - 1);
            }
        }

        self.latest_rtt = rtt.latest_rtt();

        if self.maybe_create_interval() {
            self.create_interval();
        }

        trace!(
            "{}. ccid:{} cwnd={} best_cwnd={} power={} direction={:?} slow_start={} free={}",
            self.name(),
            self.id,
            self.congestion_window(),
            self.best_cwnd,
            self.probe_step_power,
            self.probe_direction,
            self.in_slow_start,
            self.free_count
        );
    }

    fn in_slow_start(&self) -> bool {
        self.in_slow_start
    }

    fn congestion_window(&self) -> u32 {
        self.history
            .latest()
            .map_or(self.config.initial_cwnd, |itvl| itvl.output_cwnd())
    }

    fn initial_window(&self) -> u32 {
        self.config.initial_cwnd
    }

    fn minimal_window(&self) -> u32 {
        self.config.min_cwnd
    }

    fn stats(&self) -> &CongestionStats {
        &self.stats
    }
}

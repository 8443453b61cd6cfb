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

//! Measurement intervals.
//!
//! An interval exercises a single candidate congestion window. It starts when
//! the number of outstanding packets reaches one below its target window,
//! admits every packet sent until it is marked as sent done, and completes
//! once the fate of its packets is known. On completion it derives
//! throughput, loss rate, RTT and utility, and never changes again.

use std::cmp;
use std::mem;
use std::time::Duration;

use log::*;
use serde::Deserialize;
use serde::Serialize;

use crate::packet::is_seq_valid;
use crate::packet::InflightPacket;
use crate::packet::MAX_SEQ_NUMBER;
use crate::time::Timestamp;

/// Interval type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntervalType {
    /// Re-confirms the current best window.
    Normal,

    /// Trials a new candidate window.
    Probe,
}

/// One measurement epoch at a fixed target window.
#[derive(Clone, Debug)]
pub struct Interval {
    /// Interval type.
    interval_type: IntervalType,

    /// First sequence number covered by this interval.
    start_seq: u32,

    /// Last sequence number covered by this interval.
    end_seq: u32,

    /// Packets admitted into this interval.
    send_cnt: u32,

    /// Packets of this interval acknowledged.
    ack_cnt: u32,

    /// Packets of this interval declared lost.
    loss_cnt: u32,

    /// Largest inflight count observed while sending.
    max_inflight: u32,

    first_send_time: Option<Timestamp>,

    first_recv_time: Option<Timestamp>,

    last_recv_time: Option<Timestamp>,

    /// Running mean of the RTT samples of acknowledged packets.
    avg_rtt: Duration,

    /// Randomized extension of the sending phase, in `[0, latest_rtt)`.
    extra_duration: Duration,

    /// Window chosen for this interval.
    target_cwnd: u32,

    /// Window exposed to the pacer. Ramps toward `target_cwnd`.
    output_cwnd: u32,

    /// No more packets are admitted.
    sent_done: bool,

    /// All packets are resolved and the statistics are final.
    recv_done: bool,

    /// Delivery rate in bits per millisecond, at least 1.
    throughput: f64,

    /// Unacknowledged share of the sent packets.
    loss_rate: f64,

    /// Time from the first send to the first feedback.
    rtt: Duration,

    /// Score of this interval.
    utility: f64,
}

impl Interval {
    pub fn new(
        interval_type: IntervalType,
        target_cwnd: u32,
        output_cwnd: u32,
        extra_duration: Duration,
    ) -> Self {
        Self {
            interval_type,
            start_seq: MAX_SEQ_NUMBER,
            end_seq: MAX_SEQ_NUMBER,
            send_cnt: 0,
            ack_cnt: 0,
            loss_cnt: 0,
            max_inflight: 0,
            first_send_time: None,
            first_recv_time: None,
            last_recv_time: None,
            avg_rtt: Duration::ZERO,
            extra_duration,
            target_cwnd,
            output_cwnd: cmp::min(output_cwnd, target_cwnd),
            sent_done: false,
            recv_done: false,
            throughput: 0.0,
            loss_rate: 0.0,
            rtt: Duration::ZERO,
            utility: 0.0,
        }
    }

    pub fn interval_type(&self) -> IntervalType {
        self.interval_type
    }

    pub fn start_seq(&self) -> u32 {
        self.start_seq
    }

    pub fn end_seq(&self) -> u32 {
        self.end_seq
    }

    pub fn send_cnt(&self) -> u32 {
        self.send_cnt
    }

    pub fn ack_cnt(&self) -> u32 {
        self.ack_cnt
    }

    pub fn loss_cnt(&self) -> u32 {
        self.loss_cnt
    }

    pub fn max_inflight(&self) -> u32 {
        self.max_inflight
    }

    pub fn first_send_time(&self) -> Option<Timestamp> {
        self.first_send_time
    }

    pub fn first_recv_time(&self) -> Option<Timestamp> {
        self.first_recv_time
    }

    pub fn last_recv_time(&self) -> Option<Timestamp> {
        self.last_recv_time
    }

    pub fn avg_rtt(&self) -> Duration {
        self.avg_rtt
    }

    pub fn extra_duration(&self) -> Duration {
        self.extra_duration
    }

    pub fn target_cwnd(&self) -> u32 {
        self.target_cwnd
    }

    pub fn output_cwnd(&self) -> u32 {
        self.output_cwnd
    }

    pub fn sent_done(&self) -> bool {
        self.sent_done
    }

    pub fn recv_done(&self) -> bool {
        self.recv_done
    }

    pub fn throughput(&self) -> f64 {
        self.throughput
    }

    pub fn loss_rate(&self) -> f64 {
        self.loss_rate
    }

    pub fn rtt(&self) -> Duration {
        self.rtt
    }

    pub fn utility(&self) -> f64 {
        self.utility
    }

    /// Whether the interval has admitted its first packet.
    pub fn is_started(&self) -> bool {
        is_seq_valid(self.start_seq)
    }

    /// Whether every admitted packet has been acknowledged or declared lost.
    pub fn is_resolved(&self) -> bool {
        self.send_cnt == self.ack_cnt.saturating_add(self.loss_cnt)
    }

    /// Whether `seq` falls into the sequence range of this interval.
    pub fn contains(&self, seq: u32) -> bool {
        is_seq_valid(seq)
            && is_seq_valid(self.start_seq)
            && is_seq_valid(self.end_seq)
            && seq >= self.start_seq
            && seq <= self.end_seq
    }

    /// Admit a sent packet.
    ///
    /// The interval begins with the first packet sent while the number of
    /// outstanding packets is exactly one below the target window. Packets
    /// sent before that belong to no interval.
    pub fn on_data_sent(&mut self, now: Timestamp, pkt: &InflightPacket) {
        if self.sent_done || !is_seq_valid(pkt.seq) {
            return;
        }

        if !self.is_started() {
            if pkt.inflight != self.target_cwnd.saturating_sub(1) {
                return;
            }
            self.start_seq = pkt.seq;
            self.end_seq = pkt.seq;
            self.first_send_time = Some(now);
        }

        if pkt.seq < self.end_seq {
            warn!(
                "send reorder packets start_seq:{} end_seq:{} sentpkt.seq:{}",
                self.start_seq, self.end_seq, pkt.seq
            );
        }

        self.end_seq = cmp::max(self.end_seq, pkt.seq);
        self.max_inflight = cmp::max(self.max_inflight, pkt.inflight);
        self.send_cnt = self.send_cnt.saturating_add(1);
    }

    /// Account an acknowledged packet of this interval.
    ///
    /// Returns false if the acknowledgement was ignored, either because the
    /// interval is already complete or because all its packets are resolved.
    pub fn on_packet_acked(&mut self, now: Timestamp, rtt_sample: Duration) -> bool {
        if self.recv_done || self.is_resolved() {
            return false;
        }

        self.first_recv_time.get_or_insert(now);

        // Incremental mean over the acknowledged packets.
        let n = self.ack_cnt;
        self.avg_rtt = (self.avg_rtt * n + rtt_sample) / (n + 1);
        self.ack_cnt += 1;

        true
    }

    /// Account a lost packet of this interval.
    pub fn on_packet_lost(&mut self, now: Timestamp) -> bool {
        if self.recv_done || self.is_resolved() {
            return false;
        }

        self.first_recv_time.get_or_insert(now);
        self.loss_cnt += 1;

        true
    }

    /// Complete the interval once it is sent done and every admitted packet
    /// is resolved.
    pub fn try_complete_on_loss(
        &mut self,
        now: Timestamp,
        bits_per_packet: f64,
        max_loss_rate: f64,
    ) -> bool {
        if self.recv_done || !self.sent_done || !self.is_resolved() {
            return false;
        }

        self.recv_done = true;
        self.calculate_statistics(now, bits_per_packet, max_loss_rate);
        true
    }

    /// Complete the interval once an acknowledgement reaches its last
    /// sequence number.
    ///
    /// Packets of the interval that are still unresolved at this point are
    /// accounted as lost.
    pub fn try_complete_on_ack(
        &mut self,
        ack_seq: u32,
        now: Timestamp,
        bits_per_packet: f64,
        max_loss_rate: f64,
    ) -> bool {
        if self.recv_done || !self.sent_done {
            return false;
        }
        if !is_seq_valid(ack_seq) || !is_seq_valid(self.end_seq) || ack_seq < self.end_seq {
            return false;
        }

        let unresolved = self
            .send_cnt
            .saturating_sub(self.ack_cnt.saturating_add(self.loss_cnt));
        self.loss_cnt += unresolved;

        self.recv_done = true;
        self.calculate_statistics(now, bits_per_packet, max_loss_rate);
        true
    }

    /// Derive the interval statistics. Called once, when the interval
    /// completes.
    pub fn calculate_statistics(
        &mut self,
        now: Timestamp,
        bits_per_packet: f64,
        max_loss_rate: f64,
    ) {
        self.last_recv_time = Some(now);

        let elapsed = match self.first_send_time {
            Some(first_send) => now.saturating_duration_since(first_send),
            None => Duration::ZERO,
        };
        let elapsed_ms = duration_as_millis_f64(elapsed).max(1.0);
        self.throughput = (self.ack_cnt as f64 * bits_per_packet / elapsed_ms).max(1.0);

        let send_cnt = cmp::max(self.send_cnt, 1) as f64;
        let unacked = self.send_cnt.saturating_sub(self.ack_cnt) as f64;
        self.loss_rate = (unacked / send_cnt).min(max_loss_rate);

        self.rtt = match (self.first_send_time, self.first_recv_time) {
            (Some(first_send), Some(first_recv)) => {
                first_recv.saturating_duration_since(first_send)
            }
            _ => Duration::ZERO,
        };

        let avg_rtt_ms = duration_as_millis_f64(self.avg_rtt).max(1.0);
        self.utility = self.throughput * (1.0 - self.loss_rate).powi(3) / avg_rtt_ms;

        trace!(
            "interval complete: target_cwnd={} send={} ack={} loss={} elapsed={}ms throughput={} loss_rate={} avg_rtt={}ms utility={}",
            self.target_cwnd,
            self.send_cnt,
            self.ack_cnt,
            self.loss_cnt,
            elapsed_ms,
            self.throughput,
            self.loss_rate,
            avg_rtt_ms,
            self.utility
        );
    }

    /// Ramp the output window and check whether the sending phase is over.
    ///
    /// `output_cwnd` grows by `newly_free` packets per call, capped at the
    /// target. Sending is over once feedback for a sequence number at or
    /// beyond the start of the interval arrives, and at least
    /// `extra_duration` has passed since the first feedback.
    pub fn check_if_sent_done(&mut self, seq: u32, now: Timestamp, newly_free: u32) {
        self.output_cwnd = cmp::min(
            self.output_cwnd.saturating_add(newly_free),
            self.target_cwnd,
        );

        if self.sent_done || !self.is_started() || !is_seq_valid(seq) || seq < self.start_seq {
            return;
        }

        let extended = self
            .first_recv_time
            .map_or(true, |first_recv| now >= first_recv + self.extra_duration);
        if extended {
            self.sent_done = true;
        }
    }
}

fn duration_as_millis_f64(d: Duration) -> f64 {
    d.as_micros() as f64 / 1000.0
}

/// Fixed capacity history of intervals. Once full, a new interval
/// overwrites the oldest one.
#[derive(Debug)]
pub struct IntervalHistory {
    slots: Vec<Interval>,

    /// Physical index of the oldest interval.
    head: usize,

    capacity: usize,
}

impl IntervalHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = cmp::max(capacity, 1);
        Self {
            slots: Vec::with_capacity(capacity),
            head: 0,
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an interval, returning the evicted one if the history was full.
    pub fn push(&mut self, itvl: Interval) -> Option<Interval> {
        if self.slots.len() < self.capacity {
            self.slots.push(itvl);
            return None;
        }

        let evicted = mem::replace(&mut self.slots[self.head], itvl);
        self.head = (self.head + 1) % self.capacity;
        Some(evicted)
    }

    fn physical(&self, i: usize) -> usize {
        (self.head + i) % self.slots.len()
    }

    /// Return the i-th interval, the oldest being 0.
    pub fn get(&self, i: usize) -> Option<&Interval> {
        if i >= self.slots.len() {
            return None;
        }
        let idx = self.physical(i);
        self.slots.get(idx)
    }

    pub fn get_mut(&mut self, i: usize) -> Option<&mut Interval> {
        if i >= self.slots.len() {
            return None;
        }
        let idx = self.physical(i);
        self.slots.get_mut(idx)
    }

    /// The most recently created interval.
    pub fn latest(&self) -> Option<&Interval> {
        self.get(self.slots.len().wrapping_sub(1))
    }

    pub fn latest_mut(&mut self) -> Option<&mut Interval> {
        self.get_mut(self.slots.len().wrapping_sub(1))
    }

    /// Iterate from the oldest to the latest interval.
    pub fn iter(&self) -> impl Iterator<Item = &Interval> + '_ {
        (0..self.slots.len()).map(move |i| &self.slots[self.physical(i)])
    }
}

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

//! Packet events consumed by the congestion controllers.
//!
//! The events are produced by the transport's send path and by its loss
//! detection. The controllers only read them.

use smallvec::SmallVec;

use crate::time::Timestamp;

/// Sequence number reserved to mean "unset".
pub const MAX_SEQ_NUMBER: u32 = u32::MAX;

/// Check if a sequence number may be used in range comparisons.
pub fn is_seq_valid(seq: u32) -> bool {
    seq != MAX_SEQ_NUMBER
}

/// A packet handed to the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InflightPacket {
    /// Packet sequence number.
    pub seq: u32,

    /// Number of outstanding packets at the time this packet was sent.
    pub inflight: u32,
}

impl InflightPacket {
    pub fn new(seq: u32, inflight: u32) -> Self {
        Self { seq, inflight }
    }
}

/// An acknowledgement for a single packet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AckEvent {
    /// Sequence number of the acknowledged packet.
    pub seq: u32,

    /// Time the acknowledged packet was sent.
    pub send_time: Timestamp,

    /// Whether this event carries an acknowledgement.
    pub valid: bool,
}

impl AckEvent {
    pub fn new(seq: u32, send_time: Timestamp) -> Self {
        Self {
            seq,
            send_time,
            valid: true,
        }
    }
}

/// Packets declared lost by loss detection in a single pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LossEvent {
    /// Sequence numbers of the lost packets.
    pub lost_seqs: SmallVec<[u32; 8]>,

    /// Whether this event carries losses.
    pub valid: bool,
}

impl LossEvent {
    pub fn new(lost_seqs: &[u32]) -> Self {
        Self {
            lost_seqs: SmallVec::from_slice(lost_seqs),
            valid: !lost_seqs.is_empty(),
        }
    }

    /// Largest valid lost sequence number.
    pub fn largest_lost(&self) -> Option<u32> {
        self.lost_seqs
            .iter()
            .copied()
            .filter(|seq| is_seq_valid(*seq))
            .max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_validity() {
        assert!(is_seq_valid(0));
        assert!(is_seq_valid(MAX_SEQ_NUMBER - 1));
        assert!(!is_seq_valid(MAX_SEQ_NUMBER));
    }

    #[test]
    fn ack_event() {
        let ack = AckEvent::new(7, Timestamp::from_millis(3));
        assert!(ack.valid);
        assert_eq!(ack.seq, 7);

        let ack = AckEvent::default();
        assert!(!ack.valid);
    }

    #[test]
    fn loss_event() {
        let loss = LossEvent::new(&[3, MAX_SEQ_NUMBER, 9, 4]);
        assert!(loss.valid);
        assert_eq!(loss.largest_lost(), Some(9));

        let loss = LossEvent::new(&[]);
        assert!(!loss.valid);
        assert_eq!(loss.largest_lost(), None);

        let loss = LossEvent::new(&[MAX_SEQ_NUMBER]);
        assert_eq!(loss.largest_lost(), None);
    }
}

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

#![no_main]

use std::time::Duration;

use lazy_static::lazy_static;
use libfuzzer_sys::fuzz_target;
use rand::rngs::StdRng;
use rand::SeedableRng;

use pcc_engine::packet::AckEvent;
use pcc_engine::packet::InflightPacket;
use pcc_engine::packet::LossEvent;
use pcc_engine::rtt::RttEstimator;
use pcc_engine::time::Timestamp;
use pcc_engine::CongestionController;
use pcc_engine::Pcc;
use pcc_engine::PccConfig;

lazy_static! {
    static ref CONFIG: PccConfig = {
        let mut conf = PccConfig::new(2, 10);
        conf.set_ack_per_free_slot(2);
        conf
    };
}

// Every 4 bytes of input encode one transport event: kind, argument, and
// the time elapsed since the previous event.
fuzz_target!(|data: &[u8]| {
    let mut pcc = Pcc::with_rng(CONFIG.clone(), Box::new(StdRng::seed_from_u64(0)));
    let mut rtt = RttEstimator::new(Duration::from_millis(100));
    let mut now = Timestamp::from_millis(1);
    let mut next_seq: u32 = 0;
    let mut send_times = Vec::new();

    for chunk in data.chunks_exact(4) {
        now = now + Duration::from_millis(chunk[3] as u64);
        let arg = u16::from_le_bytes([chunk[1], chunk[2]]) as u32;

        match chunk[0] % 3 {
            0 => {
                pcc.on_data_sent(now, &InflightPacket::new(next_seq, arg % 64));
                send_times.push(now);
                next_seq += 1;
            }
            1 if next_seq > 0 => {
                let seq = arg % next_seq;
                let send_time = send_times[seq as usize];
                rtt.update(now.saturating_duration_since(send_time));
                pcc.on_data_ack_or_loss(
                    now,
                    &AckEvent::new(seq, send_time),
                    &LossEvent::default(),
                    &rtt,
                );
            }
            2 if next_seq > 0 => {
                let lost = [arg % next_seq, (arg / 2) % next_seq, u32::MAX];
                pcc.on_data_ack_or_loss(now, &AckEvent::default(), &LossEvent::new(&lost), &rtt);
            }
            _ => (),
        }

        assert!(pcc.congestion_window() >= CONFIG.min_cwnd());
        assert!(pcc.probe_step_power() <= 31);
        assert!(pcc.history().len() <= 3);
        for itvl in pcc.history().iter() {
            assert!(itvl.output_cwnd() <= itvl.target_cwnd());
            assert!(itvl.loss_rate() >= 0.0 && itvl.loss_rate() <= 0.99);
            assert!(itvl.utility().is_finite());
            if itvl.recv_done() {
                assert_eq!(itvl.send_cnt(), itvl.ack_cnt() + itvl.loss_cnt());
            }
        }
    }
});

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

use std::time::Duration;

use criterion::criterion_group;
use criterion::criterion_main;
use criterion::Criterion;
use rand::rngs::StdRng;
use rand::SeedableRng;

use pcc_engine::congestion_control::UtilityProfile;
use pcc_engine::packet::AckEvent;
use pcc_engine::packet::InflightPacket;
use pcc_engine::packet::LossEvent;
use pcc_engine::rtt::RttEstimator;
use pcc_engine::time::Timestamp;
use pcc_engine::CongestionController;
use pcc_engine::Pcc;
use pcc_engine::PccConfig;

const RTT: Duration = Duration::from_millis(20);

/// Drive a controller over a loss-free path, one window per RTT.
fn run_rounds(pcc: &mut Pcc, rounds: u32) {
    let mut rtt = RttEstimator::new(RTT);
    let mut seq = 0;
    let mut now = Timestamp::from_millis(1);

    for _ in 0..rounds {
        let cwnd = pcc.congestion_window();
        let sent_at = now;
        let first = seq;
        for _ in 0..cwnd {
            pcc.on_data_sent(sent_at, &InflightPacket::new(seq, cwnd - 1));
            seq += 1;
        }

        now = now + RTT;
        rtt.update(RTT);
        for acked in first..seq {
            pcc.on_data_ack_or_loss(
                now,
                &AckEvent::new(acked, sent_at),
                &LossEvent::default(),
                &rtt,
            );
        }
    }
}

pub fn pcc_clean_path_benchmark(c: &mut Criterion) {
    c.bench_function("pcc 100 rounds", |b| {
        b.iter(|| {
            let mut pcc = Pcc::with_rng(PccConfig::default(), Box::new(StdRng::seed_from_u64(1)));
            run_rounds(&mut pcc, 100);
            pcc.congestion_window()
        })
    });
}

pub fn pcc_loss_report_benchmark(c: &mut Criterion) {
    let mut pcc = Pcc::with_rng(PccConfig::default(), Box::new(StdRng::seed_from_u64(1)));
    run_rounds(&mut pcc, 20);
    let rtt = RttEstimator::new(RTT);
    let loss = LossEvent::new(&[1, 2, 3, 4, 5, 6, 7, 8]);

    c.bench_function("pcc loss report", |b| {
        b.iter(|| {
            pcc.on_data_ack_or_loss(
                Timestamp::from_millis(1000),
                &AckEvent::default(),
                &loss,
                &rtt,
            )
        })
    });
}

pub fn utility_profile_benchmark(c: &mut Criterion) {
    let mut profile = UtilityProfile::new(0.5);
    const RANGE: u32 = 1_000;
    for cwnd in 0..RANGE {
        profile.update(cwnd, cwnd as f64 * 0.5);
    }
    c.bench_function("utility profile best", |b| b.iter(|| profile.best()));
}

criterion_group!(
    benches,
    pcc_clean_path_benchmark,
    pcc_loss_report_benchmark,
    utility_profile_benchmark,
);
criterion_main!(benches);

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

use clap::error::ErrorKind;
use clap::CommandFactory;
use clap::Parser;
use log::info;
use statrs::statistics::Data;
use statrs::statistics::Distribution;
use statrs::statistics::Max;
use statrs::statistics::Min;
use statrs::statistics::OrderStatistics;

use pcc_engine::CongestionControlAlgorithm;
use pcc_engine::RecoveryConfig;
use pcc_tools::LinkConfig;
use pcc_tools::Result;
use pcc_tools::SimulationReport;
use pcc_tools::Simulator;

#[cfg(unix)]
#[global_allocator]
static GLOBAL: jemallocator::Jemalloc = jemallocator::Jemalloc;

#[derive(Parser, Debug, Clone)]
#[clap(name = "pcc_sim")]
pub struct SimOpt {
    /// Congestion control algorithm.
    #[clap(long, default_value = "PCC")]
    pub congestion_control_algorithm: CongestionControlAlgorithm,

    /// Bottleneck bandwidth in packets per second.
    #[clap(short, long, default_value = "1000", value_name = "NUM")]
    pub bandwidth: u64,

    /// Round trip propagation delay in milliseconds.
    #[clap(long, default_value = "40", value_name = "TIME")]
    pub rtt: u64,

    /// Bottleneck buffer in packets.
    #[clap(long, default_value = "50", value_name = "NUM")]
    pub buffer: usize,

    /// Probability of a random drop, in [0, 1).
    #[clap(long, default_value = "0", value_name = "RATE")]
    pub loss_rate: f64,

    /// Simulated time in seconds.
    #[clap(short, long, default_value = "30", value_name = "TIME")]
    pub duration: u64,

    /// Random seed. The same seed replays the same run.
    #[clap(long, default_value = "1", value_name = "NUM")]
    pub seed: u64,

    /// Initial congestion window in packets.
    #[clap(long, default_value = "10", value_name = "NUM")]
    pub initial_congestion_window: u32,

    /// Minimal congestion window in packets.
    #[clap(long, default_value = "2", value_name = "NUM")]
    pub min_congestion_window: u32,

    /// Initial RTT in milliseconds.
    #[clap(long, default_value = "333", value_name = "TIME")]
    pub initial_rtt: u64,

    /// Log level, support OFF/ERROR/WARN/INFO/DEBUG/TRACE.
    #[clap(long, default_value = "INFO", value_name = "STR")]
    pub log_level: log::LevelFilter,

    /// Log file path. If no file is specified, logs will be written to `stderr`.
    #[clap(long, value_name = "FILE")]
    pub log_file: Option<String>,
}

fn parse_option() -> std::result::Result<SimOpt, clap::error::Error> {
    let option = SimOpt::parse();

    if !(0.0..1.0).contains(&option.loss_rate) {
        return Err(SimOpt::command().error(
            ErrorKind::InvalidValue,
            "loss rate should be in [0, 1)",
        ));
    }
    if option.bandwidth == 0 {
        return Err(
            SimOpt::command().error(ErrorKind::InvalidValue, "bandwidth should be positive"),
        );
    }

    Ok(option)
}

fn print_stats(name: &str, unit: &str, samples: &[f64]) {
    if samples.is_empty() {
        println!("{}: no samples", name);
        return;
    }

    let mut s = Data::new(samples.to_vec());
    println!("{}({}):", name, unit);
    println!(
        "\tmin: {:.2}, max: {:.2}, mean: {:.2}, sd: {:.2}",
        s.min(),
        s.max(),
        s.mean().unwrap_or_default(),
        s.std_dev().unwrap_or_default(),
    );
    println!(
        "\tmedian: {:.2}, p80: {:.2}, p90: {:.2}, p99: {:.2}",
        s.median(),
        s.percentile(80),
        s.percentile(90),
        s.percentile(99),
    );
}

fn print_report(option: &SimOpt, report: &SimulationReport) {
    println!();
    println!(
        "finished in {:?}, goodput {:.3} Mbps",
        report.duration,
        report.goodput_mbps()
    );
    println!(
        "pkts: sent {}, acked {}, lost {} ({:.2}%)",
        report.sent,
        report.acked,
        report.lost,
        report.loss_ratio() * 100.0
    );
    println!(
        "link: bandwidth {} pkt/s, rtt {}ms, buffer {} pkts, bdp {} pkts",
        option.bandwidth,
        option.rtt,
        option.buffer,
        option.bandwidth * option.rtt / 1000
    );
    print_stats("cwnd", "pkts", &report.cwnd_samples);
    print_stats("rtt", "ms", &report.rtt_samples);
    println!("rtt estimator: min {:?}, smoothed {:?}", report.min_rtt, report.smoothed_rtt);
}

fn main() -> Result<()> {
    let option = match parse_option() {
        Ok(option) => option,
        Err(e) => e.exit(),
    };

    env_logger::builder()
        .target(pcc_tools::log_target(&option.log_file)?)
        .filter_level(option.log_level)
        .format_timestamp_millis()
        .init();

    let mut conf = RecoveryConfig::default();
    conf.set_congestion_control_algorithm(option.congestion_control_algorithm);
    conf.set_initial_congestion_window(option.initial_congestion_window);
    conf.set_min_congestion_window(option.min_congestion_window);
    conf.set_initial_rtt(option.initial_rtt);

    let link = LinkConfig {
        bandwidth: option.bandwidth,
        base_rtt: Duration::from_millis(option.rtt),
        buffer: option.buffer,
        loss_rate: option.loss_rate,
    };
    info!("simulate {:?} over {:?}", conf, link);

    let mut sim = Simulator::new(&conf, link, option.seed);
    let report = sim.run(Duration::from_secs(option.duration)).clone();
    print_report(&option, &report);

    let stats = sim.controller().stats();
    println!(
        "controller {}: intervals created {}, completed {}",
        sim.controller().name(),
        stats.intervals_created,
        stats.intervals_completed
    );

    Ok(())
}

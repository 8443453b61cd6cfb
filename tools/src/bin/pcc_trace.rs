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

use std::fs::File;
use std::io::BufReader;
use std::io::Write;

use clap::Parser;
use log::debug;
use log::warn;
use statrs::statistics::Data;
use statrs::statistics::Distribution;
use statrs::statistics::Max;

use pcc_engine::trace::TraceCollector;
use pcc_tools::Result;

#[derive(Parser, Debug, Clone)]
#[clap(name = "pcc_trace")]
pub struct TraceOpt {
    /// Log file written by a controller with the DEBUG log level.
    #[clap(value_name = "FILE")]
    pub input: String,

    /// Output file of the metric series. If no file is specified, the series
    /// are written to `stdout`.
    #[clap(short, long, value_name = "FILE")]
    pub output: Option<String>,

    /// Only print the summary.
    #[clap(short, long)]
    pub summary: bool,

    /// Log level, support OFF/ERROR/WARN/INFO/DEBUG/TRACE.
    #[clap(long, default_value = "WARN", value_name = "STR")]
    pub log_level: log::LevelFilter,
}

fn print_summary(collector: &TraceCollector) {
    for (connid, conn) in collector.connections() {
        let utility = conn.series("utility");
        let best_cwnd = conn.series("best_cwnd");
        let u = Data::new(utility.clone());

        eprintln!(
            "ccid:{} intervals created {}, completed {}, mean utility {:.3}, max utility {:.3}, final best_cwnd {}",
            connid,
            conn.intervals_created,
            conn.completed.len(),
            u.mean().unwrap_or_default(),
            if utility.is_empty() { 0.0 } else { u.max() },
            best_cwnd.last().copied().unwrap_or_default(),
        );
    }
}

fn main() -> Result<()> {
    let option = TraceOpt::parse();

    env_logger::builder()
        .filter_level(option.log_level)
        .format_timestamp_millis()
        .init();

    let reader = BufReader::new(File::open(&option.input)?);
    let mut collector = TraceCollector::new();
    let records = collector.read_from(reader)?;
    debug!("{} records collected from {}", records, option.input);

    if collector.is_empty() {
        warn!("no interval trace found in {}", option.input);
    }

    print_summary(&collector);
    if option.summary {
        return Ok(());
    }

    let json = collector.to_json()?;
    match &option.output {
        Some(path) => File::create(path)?.write_all(json.as_bytes())?,
        None => println!("{}", json),
    }

    Ok(())
}

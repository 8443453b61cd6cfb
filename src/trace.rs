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

//! Interval traces.
//!
//! The PCC controller logs a JSON record each time it creates an interval
//! and each time an interval completes:
//!
//! ```text
//! ccid:42 create new interval:{"connid":42,"type":"Probe",...}
//! ccid:42 recv_done:{"connid":42,"type":"Probe",...}
//! ```
//!
//! This module defines the record and collects records from log lines into
//! per-connection metric series. Each value of a series is paired with the
//! timestamp of the log line which carried it.

use std::collections::BTreeMap;
use std::io::BufRead;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;

use crate::congestion_control::IntervalType;
use crate::Result;

/// Log tag preceding the record of a newly created interval.
pub const CREATE_TAG: &str = "create new interval:";

/// Log tag preceding the record of a completed interval.
pub const DONE_TAG: &str = "recv_done:";

/// Metrics which can be extracted from a trace as a numeric series.
pub const METRICS: [&str; 12] = [
    "target_cwnd",
    "output_cwnd",
    "send_cnt",
    "ack_cnt",
    "loss_cnt",
    "max_inflight",
    "rtt",
    "avg_rtt",
    "throughput",
    "loss_rate",
    "utility",
    "best_cwnd",
];

/// Snapshot of an interval and of the controller search state.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct IntervalTrace {
    /// Connection scoped controller id.
    pub connid: u32,

    #[serde(rename = "type")]
    pub interval_type: IntervalType,

    pub target_cwnd: u32,

    pub output_cwnd: u32,

    pub send_cnt: u32,

    pub ack_cnt: u32,

    pub loss_cnt: u32,

    pub max_inflight: u32,

    /// Time to first feedback in milliseconds.
    pub rtt: f64,

    /// Mean RTT of the acknowledged packets in milliseconds.
    pub avg_rtt: f64,

    pub throughput: f64,

    pub loss_rate: f64,

    pub utility: f64,

    pub best_cwnd: u32,

    pub probe_step_power: u32,

    pub probe_direction: i32,
}

impl IntervalTrace {
    /// Serialize the record as a single JSON line.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Return the named metric as a number.
    pub fn metric(&self, name: &str) -> Option<f64> {
        let v = match name {
            "target_cwnd" => self.target_cwnd as f64,
            "output_cwnd" => self.output_cwnd as f64,
            "send_cnt" => self.send_cnt as f64,
            "ack_cnt" => self.ack_cnt as f64,
            "loss_cnt" => self.loss_cnt as f64,
            "max_inflight" => self.max_inflight as f64,
            "rtt" => self.rtt,
            "avg_rtt" => self.avg_rtt,
            "throughput" => self.throughput,
            "loss_rate" => self.loss_rate,
            "utility" => self.utility,
            "best_cwnd" => self.best_cwnd as f64,
            _ => return None,
        };
        Some(v)
    }
}

/// Kind of a trace record.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceKind {
    /// An interval was created.
    Created,

    /// An interval completed.
    Completed,
}

impl TraceKind {
    /// Log tag preceding a record of this kind.
    pub fn tag(self) -> &'static str {
        match self {
            TraceKind::Created => CREATE_TAG,
            TraceKind::Completed => DONE_TAG,
        }
    }
}

/// Format the log message carrying a trace record.
pub fn trace_line(kind: TraceKind, trace: &IntervalTrace) -> String {
    format!("ccid:{} {}{}", trace.connid, kind.tag(), trace.to_json())
}

/// A trace record recovered from a log line.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct TraceRecord {
    pub kind: TraceKind,

    /// Time of the log line in milliseconds since the UNIX epoch, if the line
    /// starts with an RFC 3339 timestamp.
    pub ts: Option<u64>,

    pub trace: IntervalTrace,
}

/// Extract a trace record from a log line. Lines without a trace tag or with
/// a malformed payload yield `None`.
pub fn parse_trace_line(line: &str) -> Option<TraceRecord> {
    let (kind, pos) = if let Some(pos) = line.find(CREATE_TAG) {
        (TraceKind::Created, pos + CREATE_TAG.len())
    } else if let Some(pos) = line.find(DONE_TAG) {
        (TraceKind::Completed, pos + DONE_TAG.len())
    } else {
        return None;
    };

    let trace = serde_json::from_str(line[pos..].trim()).ok()?;
    Some(TraceRecord {
        kind,
        ts: parse_log_time(line),
        trace,
    })
}

/// Parse the timestamp of a log line in the env_logger format, e.g.
/// `[2024-01-01T00:00:00.123Z DEBUG pcc_engine] ...`.
fn parse_log_time(line: &str) -> Option<u64> {
    let header = line.trim_start().strip_prefix('[')?;
    let stamp = header.split_whitespace().next()?.trim_end_matches(']');
    let time = humantime::parse_rfc3339_weak(stamp).ok()?;
    let since_epoch = time.duration_since(UNIX_EPOCH).ok()?;
    u64::try_from(since_epoch.as_millis()).ok()
}

/// Values of a metric with the timestamps of their log lines.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct MetricSeries {
    pub val: Vec<f64>,

    /// Milliseconds since the UNIX epoch, `null` for lines without a
    /// timestamp.
    pub ts: Vec<Option<u64>>,
}

/// Trace records of a single connection.
#[derive(Clone, Debug, Default)]
pub struct ConnectionTrace {
    /// Number of intervals created.
    pub intervals_created: u64,

    /// Completed intervals, in completion order.
    pub completed: Vec<TraceRecord>,
}

impl ConnectionTrace {
    /// Values of a metric over the completed intervals.
    pub fn series(&self, metric: &str) -> Vec<f64> {
        self.completed
            .iter()
            .filter_map(|r| r.trace.metric(metric))
            .collect()
    }

    /// Values of a metric over the completed intervals, with their
    /// timestamps.
    pub fn timed_series(&self, metric: &str) -> MetricSeries {
        let mut series = MetricSeries::default();
        for r in self.completed.iter() {
            if let Some(val) = r.trace.metric(metric) {
                series.val.push(val);
                series.ts.push(r.ts);
            }
        }
        series
    }
}

/// Groups trace records per connection.
#[derive(Debug, Default)]
pub struct TraceCollector {
    connections: BTreeMap<u32, ConnectionTrace>,
}

impl TraceCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record.
    pub fn add(&mut self, record: TraceRecord) {
        let conn = self.connections.entry(record.trace.connid).or_default();
        match record.kind {
            TraceKind::Created => conn.intervals_created += 1,
            TraceKind::Completed => conn.completed.push(record),
        }
    }

    /// Parse a log line and add its record, if any. Return whether the line
    /// carried a record.
    pub fn add_line(&mut self, line: &str) -> bool {
        match parse_trace_line(line) {
            Some(record) => {
                self.add(record);
                true
            }
            None => false,
        }
    }

    /// Add the records of every line read from `reader`. Return the number
    /// of records found.
    pub fn read_from<R: BufRead>(&mut self, reader: R) -> Result<usize> {
        let mut records = 0;
        for line in reader.lines() {
            if self.add_line(&line?) {
                records += 1;
            }
        }
        Ok(records)
    }

    pub fn connection(&self, connid: u32) -> Option<&ConnectionTrace> {
        self.connections.get(&connid)
    }

    pub fn connections(&self) -> impl Iterator<Item = (&u32, &ConnectionTrace)> {
        self.connections.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Metric series of every connection, keyed by connection id then by
    /// metric name.
    pub fn metric_series(&self) -> BTreeMap<u32, BTreeMap<&'static str, MetricSeries>> {
        self.connections
            .iter()
            .map(|(connid, conn)| {
                let series = METRICS
                    .iter()
                    .map(|metric| (*metric, conn.timed_series(metric)))
                    .collect();
                (*connid, series)
            })
            .collect()
    }

    /// Serialize the metric series as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.metric_series())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(connid: u32, interval_type: IntervalType, cwnd: u32, utility: f64) -> IntervalTrace {
        IntervalTrace {
            connid,
            interval_type,
            target_cwnd: cwnd,
            output_cwnd: cwnd,
            send_cnt: cwnd,
            ack_cnt: cwnd,
            loss_cnt: 0,
            max_inflight: cwnd,
            rtt: 20.0,
            avg_rtt: 21.5,
            throughput: 100.0,
            loss_rate: 0.0,
            utility,
            best_cwnd: 10,
            probe_step_power: 0,
            probe_direction: 1,
        }
    }

    #[test]
    fn trace_json_line() {
        let t = sample(7, IntervalType::Probe, 11, 4.5);
        let json = t.to_json();
        assert!(json.starts_with("{\"connid\":7,\"type\":\"Probe\""));

        let line = format!("[2024-01-01T00:00:00.250Z DEBUG pcc] ccid:7 {}{}", DONE_TAG, json);
        let record = parse_trace_line(&line).unwrap();
        assert_eq!(record.kind, TraceKind::Completed);
        assert_eq!(record.ts, Some(1_704_067_200_250));
        assert_eq!(record.trace, t);

        let line = format!("ccid:7 {} {}", CREATE_TAG, json);
        let record = parse_trace_line(&line).unwrap();
        assert_eq!(record.kind, TraceKind::Created);
        assert_eq!(record.ts, None);

        let line = trace_line(TraceKind::Created, &t);
        assert!(line.starts_with("ccid:7 create new interval:{"));
        assert_eq!(parse_trace_line(&line).unwrap().trace, t);
    }

    #[test]
    fn trace_log_time() {
        assert_eq!(parse_log_time("[1970-01-01T00:00:01Z INFO  pcc] x"), Some(1000));
        assert_eq!(parse_log_time("[1970-01-01T00:00:01.5Z] x"), Some(1500));
        assert_eq!(parse_log_time("1970-01-01T00:00:01Z x"), None);
        assert_eq!(parse_log_time("[not a time] x"), None);
    }

    #[test]
    fn trace_invalid_lines() {
        assert_eq!(parse_trace_line("nothing to see"), None);
        assert_eq!(parse_trace_line("ccid:1 recv_done:{not json"), None);
        assert_eq!(parse_trace_line("ccid:1 create new interval:"), None);
    }

    #[test]
    fn trace_metrics() {
        let t = sample(1, IntervalType::Normal, 10, 2.0);
        for metric in METRICS {
            assert!(t.metric(metric).is_some(), "{}", metric);
        }
        assert_eq!(t.metric("avg_rtt"), Some(21.5));
        assert_eq!(t.metric("unknown"), None);
    }

    #[test]
    fn trace_collector() {
        let mut c = TraceCollector::new();
        assert!(c.is_empty());

        let lines = [
            trace_line(TraceKind::Created, &sample(1, IntervalType::Normal, 10, 0.0)),
            format!(
                "[1970-01-01T00:00:01Z DEBUG pcc] {}",
                trace_line(TraceKind::Completed, &sample(1, IntervalType::Normal, 10, 2.0))
            ),
            format!(
                "[1970-01-01T00:00:02Z DEBUG pcc] {}",
                trace_line(TraceKind::Completed, &sample(1, IntervalType::Probe, 11, 3.0))
            ),
            trace_line(TraceKind::Completed, &sample(2, IntervalType::Normal, 4, 1.0)),
        ];
        for line in lines.iter() {
            assert!(c.add_line(line));
        }
        assert!(!c.add_line("unrelated"));

        let conn = c.connection(1).unwrap();
        assert_eq!(conn.intervals_created, 1);
        assert_eq!(conn.completed.len(), 2);
        assert_eq!(conn.series("utility"), vec![2.0, 3.0]);
        assert_eq!(conn.series("target_cwnd"), vec![10.0, 11.0]);
        assert_eq!(c.connections().count(), 2);

        let series = c.metric_series();
        assert_eq!(series[&2]["utility"].val, vec![1.0]);
        assert_eq!(series[&2]["utility"].ts, vec![None]);
        assert_eq!(series[&1]["target_cwnd"].ts, vec![Some(1000), Some(2000)]);

        let json = c.to_json().unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["1"]["target_cwnd"]["val"][1], 11.0);
        assert_eq!(v["1"]["target_cwnd"]["ts"][1], 2000);
        assert!(v["2"]["utility"]["ts"][0].is_null());
    }

    #[test]
    fn trace_read_from() {
        let log = format!(
            "[1970-01-01T00:00:01Z DEBUG pcc] {}\nunrelated\n{}\n",
            trace_line(TraceKind::Created, &sample(3, IntervalType::Normal, 10, 0.0)),
            trace_line(TraceKind::Completed, &sample(3, IntervalType::Normal, 10, 2.0)),
        );
        let mut c = TraceCollector::new();
        assert_eq!(c.read_from(log.as_bytes()), Ok(2));
        assert_eq!(c.connection(3).unwrap().completed.len(), 1);

        // Read errors are reported.
        let mut c = TraceCollector::new();
        let invalid_utf8: &[u8] = b"unrelated\n\xff\xfe\n";
        assert!(matches!(c.read_from(invalid_utf8), Err(crate::Error::IoError(_))));
    }
}

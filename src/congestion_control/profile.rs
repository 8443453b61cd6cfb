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

use std::collections::BTreeMap;

/// Smoothed utility of every congestion window tried so far.
#[derive(Debug, Clone)]
pub struct UtilityProfile {
    /// Smoothed utility keyed by congestion window.
    entries: BTreeMap<u32, f64>,

    /// Weight of a new sample.
    alpha: f64,
}

impl UtilityProfile {
    pub fn new(alpha: f64) -> Self {
        Self {
            entries: BTreeMap::new(),
            alpha,
        }
    }

    /// Fold a utility sample into the entry of `cwnd` and return the new
    /// smoothed value. The first sample seeds the entry.
    pub fn update(&mut self, cwnd: u32, sample: f64) -> f64 {
        let alpha = self.alpha;
        let value = self
            .entries
            .entry(cwnd)
            .and_modify(|u| *u = *u * (1.0 - alpha) + sample * alpha)
            .or_insert(sample);
        *value
    }

    pub fn get(&self, cwnd: u32) -> Option<f64> {
        self.entries.get(&cwnd).copied()
    }

    /// The window with the highest smoothed utility. Ties go to the smaller
    /// window.
    pub fn best(&self) -> Option<(u32, f64)> {
        let mut best: Option<(u32, f64)> = None;
        for (&cwnd, &utility) in &self.entries {
            match best {
                Some((_, best_utility)) if utility <= best_utility => (),
                _ => best = Some((cwnd, utility)),
            }
        }
        best
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the entries in increasing window order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.entries.iter().map(|(&cwnd, &utility)| (cwnd, utility))
    }
}

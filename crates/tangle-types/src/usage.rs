use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Running token totals for one model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageTally {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub calls: u64,
}

/// Per-model usage accounting, fed by `ChatEvent::UsageReported`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageTracker {
    pub per_model: HashMap<String, UsageTally>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, model: &str, input_tokens: u32, output_tokens: u32) {
        let tally = self.per_model.entry(model.to_string()).or_default();
        tally.input_tokens += u64::from(input_tokens);
        tally.output_tokens += u64::from(output_tokens);
        tally.calls += 1;
    }

    pub fn total_tokens(&self) -> u64 {
        self.per_model
            .values()
            .map(|t| t.input_tokens + t.output_tokens)
            .sum()
    }
}

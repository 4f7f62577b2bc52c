//! Common types for the mentor-agent crate.

use serde::{Deserialize, Serialize};

/// Cost of a single agent call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallCost {
    /// Number of input tokens processed
    pub input_tokens: u32,
    /// Number of output tokens generated
    pub output_tokens: u32,
    /// Total processing time in milliseconds
    pub processing_time_ms: u64,
}

impl CallCost {
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

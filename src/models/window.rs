use serde::{Deserialize, Serialize};

/// Configuration for window generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    /// Number of turns per window
    pub size: usize,
    /// Number of turns shared between consecutive windows
    pub overlap: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            size: 20,
            overlap: 3,
        }
    }
}

impl WindowConfig {
    /// Turns advanced between window starts. Never zero: an overlap that
    /// swallows the whole window falls back to non-overlapping windows.
    pub fn stride(&self) -> usize {
        if self.size > self.overlap {
            self.size - self.overlap
        } else {
            self.size.max(1)
        }
    }
}

/// A contiguous slice of turns rendered as one block of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// 0-based position among the windows of one chunking call
    pub index: usize,
    /// Turn index of the first line
    pub first_turn: usize,
    /// Turn index of the last line
    pub last_turn: usize,
    /// One `[Q1] 수사관: ...` line per turn
    pub text: String,
}

impl Window {
    /// Number of turns in this window
    pub fn turn_count(&self) -> usize {
        self.last_turn + 1 - self.first_turn
    }

    /// Human-facing label, e.g. `[chunk 2/6]`
    pub fn label(&self, total: usize) -> String {
        format!("[chunk {}/{}]", self.index + 1, total)
    }
}

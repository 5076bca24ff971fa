use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// Token accounting for completion requests and tool calls.
///
/// Usage is strictly additive: the runtime sums the usage of every
/// round and of every tool call within a round, and never resets it
/// in the middle of a run.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct Usage {
    /// Tokens consumed by the request side.
    pub prompt_tokens: u64,
    /// Tokens produced by the completion side.
    pub completion_tokens: u64,
    /// Sum of prompt and completion tokens.
    pub total_tokens: u64,
}

impl Usage {
    /// Creates a usage record from prompt and completion counts.
    #[inline]
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Returns whether no tokens have been recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total_tokens == 0
            && self.prompt_tokens == 0
            && self.completion_tokens == 0
    }
}

impl Add for Usage {
    type Output = Usage;

    #[inline]
    fn add(self, rhs: Usage) -> Usage {
        Usage {
            prompt_tokens: self.prompt_tokens + rhs.prompt_tokens,
            completion_tokens: self.completion_tokens + rhs.completion_tokens,
            total_tokens: self.total_tokens + rhs.total_tokens,
        }
    }
}

impl AddAssign for Usage {
    #[inline]
    fn add_assign(&mut self, rhs: Usage) {
        *self = *self + rhs;
    }
}

impl Sum for Usage {
    #[inline]
    fn sum<I: Iterator<Item = Usage>>(iter: I) -> Usage {
        iter.fold(Usage::default(), Add::add)
    }
}

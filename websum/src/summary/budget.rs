use std::fmt;
use std::str::FromStr;

/// Rough characters-per-token ratio for OpenAI tokenizers on English text
const CHARS_PER_TOKEN_ESTIMATE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetUnit {
    Words,
    /// Estimated tokens, `ceil(chars / 4)` per word
    Tokens,
}

impl FromStr for BudgetUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "words" | "word" => Ok(Self::Words),
            "tokens" | "token" => Ok(Self::Tokens),
            other => Err(format!("unknown budget unit: {}", other)),
        }
    }
}

impl fmt::Display for BudgetUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Words => f.write_str("words"),
            Self::Tokens => f.write_str("tokens"),
        }
    }
}

/// Ceiling on the merged text handed to the reduce call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReductionBudget {
    pub limit: usize,
    pub unit: BudgetUnit,
}

/// Outcome of applying a budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncation {
    pub text: String,
    /// Units in the input
    pub original: usize,
    /// Units kept
    pub kept: usize,
}

impl Truncation {
    pub fn truncated(&self) -> bool {
        self.kept < self.original
    }
}

impl ReductionBudget {
    pub fn words(limit: usize) -> Self {
        Self { limit, unit: BudgetUnit::Words }
    }

    pub fn tokens(limit: usize) -> Self {
        Self { limit, unit: BudgetUnit::Tokens }
    }

    fn cost(&self, word: &str) -> usize {
        match self.unit {
            BudgetUnit::Words => 1,
            BudgetUnit::Tokens => word.chars().count().div_ceil(CHARS_PER_TOKEN_ESTIMATE).max(1),
        }
    }

    /// Keep the longest prefix of whole words whose cost fits the limit.
    /// Text already within budget is returned unchanged; trailing content is dropped, not summarized.
    pub fn apply(&self, text: &str) -> Truncation {
        let original: usize = text.split_whitespace().map(|w| self.cost(w)).sum();
        if original <= self.limit {
            return Truncation {
                text: text.to_string(),
                original,
                kept: original,
            };
        }

        let mut kept = 0;
        let mut words = Vec::new();
        for word in text.split_whitespace() {
            let cost = self.cost(word);
            if kept + cost > self.limit {
                break;
            }
            kept += cost;
            words.push(word);
        }

        Truncation {
            text: words.join(" "),
            original,
            kept,
        }
    }
}

//! The scripted prompt sequence.
//!
//! A script is configured once at startup as a single pipe-delimited
//! string (e.g. `"Hey|What are you doing?|And what else?"`) and never
//! changes afterwards. Sessions consume a private copy of it.

/// Ordered, immutable list of prompts delivered to each session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSource {
    prompts: Vec<String>,
}

impl ScriptSource {
    /// Parse a pipe-delimited script string.
    ///
    /// Segments are trimmed; empty segments are dropped; order is
    /// preserved. `"A| B ||C"` parses to `["A", "B", "C"]`.
    pub fn parse(raw: &str) -> Self {
        let prompts = raw
            .split('|')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self { prompts }
    }

    /// Build a script from pre-split prompts (mainly for tests).
    pub fn from_prompts<I, S>(prompts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prompts: prompts.into_iter().map(Into::into).collect(),
        }
    }

    /// The prompts, in delivery order.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// Number of prompts in the script.
    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    /// Whether the script has no prompts at all.
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

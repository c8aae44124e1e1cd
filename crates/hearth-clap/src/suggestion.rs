use std::ops::Range;

/// A single completion candidate replacing `range` of the original input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub range: Range<usize>,
    pub text: String,
    pub tooltip: Option<String>,
}

/// The completions for one position in the input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Suggestions {
    pub range: Range<usize>,
    pub list: Vec<Suggestion>,
}

impl Suggestions {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.list.iter().map(|suggestion| suggestion.text.as_str())
    }

    /// Moves every range `by` bytes to the right, for input that had a prefix stripped.
    pub fn shift(&mut self, by: usize) {
        self.range = self.range.start + by..self.range.end + by;
        for suggestion in &mut self.list {
            suggestion.range = suggestion.range.start + by..suggestion.range.end + by;
        }
    }
}

/// Collects suggestions for the text starting at `start`.
#[derive(Debug, Clone)]
pub struct SuggestionsBuilder {
    input: String,
    start: usize,
    remaining_lowercase: String,
    list: Vec<Suggestion>,
}

impl SuggestionsBuilder {
    #[must_use]
    pub fn new(input: impl Into<String>, start: usize) -> Self {
        let input = input.into();
        let start = start.min(input.len());
        let remaining_lowercase = input[start..].to_lowercase();
        Self {
            input,
            start,
            remaining_lowercase,
            list: Vec::new(),
        }
    }

    #[must_use]
    pub fn remaining(&self) -> &str {
        &self.input[self.start..]
    }

    #[must_use]
    pub fn remaining_lowercase(&self) -> &str {
        &self.remaining_lowercase
    }

    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Adds `text`, unless it is exactly what was already typed.
    pub fn suggest(&mut self, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        if text != self.remaining() {
            self.list.push(Suggestion {
                range: self.start..self.input.len(),
                text,
                tooltip: None,
            });
        }
        self
    }

    #[must_use]
    pub fn build(mut self) -> Suggestions {
        self.list.sort_by(|a, b| a.text.cmp(&b.text));
        self.list.dedup_by(|a, b| a.text == b.text);
        Suggestions {
            range: self.start..self.input.len(),
            list: self.list,
        }
    }
}

/// Whether `input` matches `candidate` at its start or right after any `_`.
#[must_use]
pub fn matches_sub_str(input: &str, candidate: &str) -> bool {
    if candidate.starts_with(input) {
        return true;
    }

    candidate
        .match_indices('_')
        .any(|(index, _)| candidate[index + 1..].starts_with(input))
}

/// Suggests every candidate matching the lowercase remaining input.
pub fn suggest<I, S>(candidates: I, mut builder: SuggestionsBuilder) -> Suggestions
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let remaining = builder.remaining_lowercase().to_owned();
    for candidate in candidates {
        let candidate = candidate.as_ref();
        if matches_sub_str(&remaining, &candidate.to_lowercase()) {
            builder.suggest(candidate);
        }
    }
    builder.build()
}

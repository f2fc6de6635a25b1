//! Word-level diff between an expected reading and its transcription.
//!
//! The default [`AlignmentStrategy::Positional`] walks both token sequences
//! with two cursors and pairs tokens purely by position. It stays in sync only
//! while the learner neither skips nor inserts a word: a single omission
//! shifts every later pair and shows up as a run of mismatches. The optional
//! [`AlignmentStrategy::EditDistance`] strategy runs a word-level Levenshtein
//! alignment instead and resynchronizes after insertions and deletions.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::normalize::normalize;

/// A whitespace-delimited word of a source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// Position within its sequence.
    pub index: usize,
    /// Original text, punctuation and case intact.
    pub text: &'a str,
}

impl Token<'_> {
    pub fn normalized(&self) -> String {
        normalize(self.text)
    }
}

/// Split a text on whitespace into positional tokens.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    text.split_whitespace()
        .enumerate()
        .map(|(index, text)| Token { index, text })
        .collect()
}

/// Classification of one aligned position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AlignmentEntry {
    /// Transcribed word matches the expected word after normalization.
    Correct { word: String },
    /// Both sides have a word here but they differ.
    Mismatch {
        expected: String,
        transcribed: String,
    },
    /// Expected word with no transcribed counterpart.
    Missing { word: String },
    /// Transcribed word with no expected counterpart.
    Extra { word: String },
}

impl AlignmentEntry {
    pub fn correct(word: impl Into<String>) -> Self {
        Self::Correct { word: word.into() }
    }

    pub fn mismatch(expected: impl Into<String>, transcribed: impl Into<String>) -> Self {
        Self::Mismatch {
            expected: expected.into(),
            transcribed: transcribed.into(),
        }
    }

    pub fn missing(word: impl Into<String>) -> Self {
        Self::Missing { word: word.into() }
    }

    pub fn extra(word: impl Into<String>) -> Self {
        Self::Extra { word: word.into() }
    }

    pub fn is_correct(&self) -> bool {
        matches!(self, Self::Correct { .. })
    }
}

/// Ordered diff, one entry per visited position, in reading order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlignmentReport {
    entries: Vec<AlignmentEntry>,
}

/// Per-class entry counts of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlignmentSummary {
    pub correct: usize,
    pub mismatch: usize,
    pub missing: usize,
    pub extra: usize,
}

impl AlignmentReport {
    pub fn entries(&self) -> &[AlignmentEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AlignmentEntry> {
        self.entries.iter()
    }

    pub fn summary(&self) -> AlignmentSummary {
        let mut summary = AlignmentSummary::default();
        for entry in &self.entries {
            match entry {
                AlignmentEntry::Correct { .. } => summary.correct += 1,
                AlignmentEntry::Mismatch { .. } => summary.mismatch += 1,
                AlignmentEntry::Missing { .. } => summary.missing += 1,
                AlignmentEntry::Extra { .. } => summary.extra += 1,
            }
        }
        summary
    }
}

impl From<Vec<AlignmentEntry>> for AlignmentReport {
    fn from(entries: Vec<AlignmentEntry>) -> Self {
        Self { entries }
    }
}

impl IntoIterator for AlignmentReport {
    type Item = AlignmentEntry;
    type IntoIter = std::vec::IntoIter<AlignmentEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'r> IntoIterator for &'r AlignmentReport {
    type Item = &'r AlignmentEntry;
    type IntoIter = std::slice::Iter<'r, AlignmentEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// How expected and transcribed words are paired up.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum AlignmentStrategy {
    /// Two-cursor scan pairing words by position.
    #[default]
    Positional,
    /// Word-level Levenshtein alignment that recovers from skipped or inserted words.
    ///
    /// Keeps an `(n + 1) * (m + 1)` cost table, so time and memory grow with
    /// the product of both word counts.
    EditDistance,
}

/// Produces word diffs using the configured strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordAligner {
    strategy: AlignmentStrategy,
}

impl WordAligner {
    pub fn new(strategy: AlignmentStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> AlignmentStrategy {
        self.strategy
    }

    pub fn align(&self, expected: &str, transcribed: &str) -> AlignmentReport {
        let expected = tokenize(expected);
        let transcribed = tokenize(transcribed);
        let report = match self.strategy {
            AlignmentStrategy::Positional => align_positional(&expected, &transcribed),
            AlignmentStrategy::EditDistance => align_edit_distance(&expected, &transcribed),
        };
        debug!(
            strategy = ?self.strategy,
            expected_words = expected.len(),
            transcribed_words = transcribed.len(),
            entries = report.len(),
            "aligned words"
        );
        report
    }
}

/// Positional word diff of `transcribed` against `expected`.
pub fn align(expected: &str, transcribed: &str) -> AlignmentReport {
    WordAligner::default().align(expected, transcribed)
}

fn align_positional(expected: &[Token<'_>], transcribed: &[Token<'_>]) -> AlignmentReport {
    let mut entries = Vec::with_capacity(expected.len().max(transcribed.len()));
    let (mut i, mut j) = (0, 0);
    while i < expected.len() || j < transcribed.len() {
        match (expected.get(i), transcribed.get(j)) {
            (Some(e), Some(t)) => {
                if e.normalized() == t.normalized() {
                    entries.push(AlignmentEntry::correct(t.text));
                } else {
                    entries.push(AlignmentEntry::mismatch(e.text, t.text));
                }
                i += 1;
                j += 1;
            }
            (Some(e), None) => {
                entries.push(AlignmentEntry::missing(e.text));
                i += 1;
            }
            (None, Some(t)) => {
                entries.push(AlignmentEntry::extra(t.text));
                j += 1;
            }
            (None, None) => unreachable!("loop condition guarantees one cursor in range"),
        }
    }
    AlignmentReport::from(entries)
}

fn align_edit_distance(expected: &[Token<'_>], transcribed: &[Token<'_>]) -> AlignmentReport {
    let e_norm: Vec<String> = expected.iter().map(Token::normalized).collect();
    let t_norm: Vec<String> = transcribed.iter().map(Token::normalized).collect();
    let (n, m) = (e_norm.len(), t_norm.len());

    // cost[i * width + j]: edits to turn expected[..i] into transcribed[..j]
    let width = m + 1;
    let mut cost = vec![0usize; (n + 1) * width];
    let at = |i: usize, j: usize| i * width + j;
    for i in 0..=n {
        cost[at(i, 0)] = i;
    }
    for j in 0..=m {
        cost[at(0, j)] = j;
    }
    for i in 1..=n {
        for j in 1..=m {
            let substitution = usize::from(e_norm[i - 1] != t_norm[j - 1]);
            cost[at(i, j)] = (cost[at(i - 1, j - 1)] + substitution)
                .min(cost[at(i - 1, j)] + 1)
                .min(cost[at(i, j - 1)] + 1);
        }
    }

    // Backtrace preferring pairings, then omissions, then insertions.
    let mut entries = Vec::with_capacity(n.max(m));
    let (mut i, mut j) = (n, m);
    while i > 0 || j > 0 {
        if i > 0 && j > 0 {
            let same = e_norm[i - 1] == t_norm[j - 1];
            if cost[at(i, j)] == cost[at(i - 1, j - 1)] + usize::from(!same) {
                entries.push(if same {
                    AlignmentEntry::correct(transcribed[j - 1].text)
                } else {
                    AlignmentEntry::mismatch(expected[i - 1].text, transcribed[j - 1].text)
                });
                i -= 1;
                j -= 1;
                continue;
            }
        }
        if i > 0 && (j == 0 || cost[at(i, j)] == cost[at(i - 1, j)] + 1) {
            entries.push(AlignmentEntry::missing(expected[i - 1].text));
            i -= 1;
        } else {
            entries.push(AlignmentEntry::extra(transcribed[j - 1].text));
            j -= 1;
        }
    }
    entries.reverse();
    AlignmentReport::from(entries)
}

//! Fuzzy filtering of bucket names and file labels.
//!
//! A query matches a label when every query character appears in the label
//! in order, ignoring case. Matches are ranked by [`fuzzy_score`]; equal
//! scores keep the canonical order. Filtering never changes the canonical
//! sequence: a label picked from a filtered view is resolved back to its
//! position in the canonical sequence with [`resolve_pick`].

const MATCH_SCORE: i64 = 1;
const CONSECUTIVE_BONUS: i64 = 5;
const FIRST_CHAR_BONUS: i64 = 8;
const BOUNDARY_BONUS: i64 = 6;
const LEADING_GAP_PENALTY: i64 = -1;
const MAX_LEADING_GAP_PENALTY: i64 = -5;

/// Characters after which a match counts as a word boundary.
const BOUNDARIES: &[char] = &['/', '-', '_', '.', ' '];

/// A label that matched a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Position in the canonical sequence.
    pub index: usize,
    /// The matched label.
    pub label: String,
    /// Ranking score, higher is better.
    pub score: i64,
}

/// Scores `candidate` against `query`, `None` if it does not match.
///
/// ```
/// use s3nav_core::search::fuzzy_score;
///
/// assert!(fuzzy_score("pho", "photos/").is_some());
/// assert!(fuzzy_score("xyz", "photos/").is_none());
/// assert!(fuzzy_score("pb", "photos/b.jpg") > fuzzy_score("pb", "xphotosxb.jpg"));
/// ```
pub fn fuzzy_score(query: &str, candidate: &str) -> Option<i64> {
    let mut query_chars = query.chars().peekable();
    let mut score = 0;
    let mut previous: Option<char> = None;
    let mut last_match: Option<usize> = None;
    let mut first_match: Option<usize> = None;

    for (index, c) in candidate.chars().enumerate() {
        let Some(&wanted) = query_chars.peek() else {
            break;
        };

        if chars_match(wanted, c) {
            score += MATCH_SCORE;
            if index == 0 {
                score += FIRST_CHAR_BONUS;
            } else if previous.is_some_and(|p| BOUNDARIES.contains(&p)) {
                score += BOUNDARY_BONUS;
            }
            if last_match.is_some_and(|last| last + 1 == index) {
                score += CONSECUTIVE_BONUS;
            }

            first_match.get_or_insert(index);
            last_match = Some(index);
            query_chars.next();
        }

        previous = Some(c);
    }

    if query_chars.peek().is_some() {
        return None;
    }

    let leading_gap = first_match.unwrap_or(0) as i64;
    score += (LEADING_GAP_PENALTY * leading_gap).max(MAX_LEADING_GAP_PENALTY);
    Some(score)
}

fn chars_match(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// Returns every label matching `query`, best first.
///
/// An empty query matches everything in canonical order.
pub fn find<S: AsRef<str>>(query: &str, labels: &[S]) -> Vec<Match> {
    let mut matches: Vec<Match> = labels
        .iter()
        .enumerate()
        .filter_map(|(index, label)| {
            let label = label.as_ref();
            let score = if query.is_empty() {
                0
            } else {
                fuzzy_score(query, label)?
            };
            Some(Match {
                index,
                label: label.to_string(),
                score,
            })
        })
        .collect();

    // Stable, so equal scores keep canonical order.
    matches.sort_by(|a, b| b.score.cmp(&a.score));
    matches
}

/// Returns the filtered view of `labels` for `query`.
///
/// An empty or whitespace-only query restores the full canonical list.
pub fn filter<S: AsRef<str>>(query: &str, labels: &[S]) -> Vec<String> {
    let query = query.trim();
    if query.is_empty() {
        return labels.iter().map(|l| l.as_ref().to_string()).collect();
    }

    find(query, labels).into_iter().map(|m| m.label).collect()
}

/// Resolves a label picked from a filtered view to its canonical index.
pub fn resolve_pick<S: AsRef<str>>(labels: &[S], picked: &str) -> Option<usize> {
    labels.iter().position(|label| label.as_ref() == picked)
}

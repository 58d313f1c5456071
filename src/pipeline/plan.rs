//! File-manifest extraction from a planning stream.
//!
//! Planning output is free-form text that contains one JSON object with a
//! `files` list. The accumulator grows a buffer fragment by fragment and
//! attempts a parse whenever the buffer holds a brace-balanced candidate.
//! Balance tracking is character-accurate: braces inside JSON string values
//! and escaped characters do not affect the depth count, so a description
//! containing literal `{` or `}` cannot produce a false positive.

use serde::{Deserialize, Serialize};

use crate::error::PlanParseError;
use crate::ports::{Fragment, FragmentReceiver};

/// One planned file: where it goes and what it is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileManifestEntry {
    /// Relative path the file will be generated at. Non-empty, trimmed; the
    /// model may leave wildcard placeholders unexpanded.
    pub path: String,
    /// Short description used in the per-file prompt.
    #[serde(default)]
    pub description: String,
}

/// Incremental manifest parser fed one fragment at a time.
///
/// Once a manifest has been returned the accumulator is done and further
/// pushes return `None`; callers stop consuming the stream for planning
/// purposes at that point.
#[derive(Debug, Default)]
pub struct PlanAccumulator {
    buffer: String,
    done: bool,
}

impl PlanAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one fragment and attempts a parse of the buffer so far.
    ///
    /// Returns the manifest on the first successful parse of a non-empty
    /// `files` list, `None` while more fragments are needed.
    pub fn push(&mut self, fragment: &str) -> Option<Vec<FileManifestEntry>> {
        if self.done {
            return None;
        }
        self.buffer.push_str(fragment);

        let cleaned = strip_code_fences(&self.buffer);
        let manifest = first_parsable_manifest(&cleaned)?;
        self.done = true;
        Some(manifest)
    }
}

/// Drives a fragment receiver through a [`PlanAccumulator`] until a manifest
/// parses or the stream ends.
///
/// # Errors
///
/// Returns [`PlanParseError::StreamFailed`] when the stream's terminal error
/// marker arrives first, and [`PlanParseError::StreamExhausted`] when the
/// stream ends without a parsable manifest. Callers must not substitute a
/// default plan on failure here; a conversion-style caller that wants a fixed
/// fallback manifest applies it itself.
pub async fn extract_plan(
    receiver: &mut FragmentReceiver,
) -> Result<Vec<FileManifestEntry>, PlanParseError> {
    let mut accumulator = PlanAccumulator::new();
    while let Some(fragment) = receiver.recv().await {
        match fragment {
            Fragment::Text(text) => {
                if let Some(manifest) = accumulator.push(&text) {
                    return Ok(manifest);
                }
            }
            Fragment::Failed(message) => return Err(PlanParseError::StreamFailed(message)),
        }
    }
    Err(PlanParseError::StreamExhausted)
}

/// Removes Markdown code-fence lines (` ```json `, ` ``` `) so a fenced JSON
/// wrapper does not interfere with brace scanning.
fn strip_code_fences(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Finds the first brace-balanced region that parses as a non-empty manifest.
///
/// Candidates are tried at each `{` in order, so a stray balanced region in
/// leading prose (e.g. "here is the plan {below}") does not mask the real
/// JSON object that follows it.
fn first_parsable_manifest(text: &str) -> Option<Vec<FileManifestEntry>> {
    let mut from = 0;
    while let Some(offset) = text[from..].find('{') {
        let start = from + offset;
        let Some(candidate) = balanced_region(&text[start..]) else {
            // Unbalanced from here on: more fragments are needed.
            return None;
        };
        if let Some(manifest) = parse_manifest(candidate) {
            return Some(manifest);
        }
        from = start + 1;
    }
    None
}

/// Returns the substring from the leading `{` through its balancing `}`,
/// or `None` when the braces have not balanced yet.
fn balanced_region(text: &str) -> Option<&str> {
    debug_assert!(text.starts_with('{'));
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (index, ch) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[..=index]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parses a candidate JSON object into manifest entries.
///
/// Entries with an empty or whitespace-only path are dropped silently; a
/// candidate whose `files` list is missing or filters down to nothing is not
/// a manifest.
fn parse_manifest(candidate: &str) -> Option<Vec<FileManifestEntry>> {
    #[derive(Deserialize)]
    struct PlanDoc {
        #[serde(default)]
        files: Vec<RawEntry>,
    }

    #[derive(Deserialize)]
    struct RawEntry {
        #[serde(default)]
        path: String,
        #[serde(default)]
        description: String,
    }

    let doc: PlanDoc = serde_json::from_str(candidate).ok()?;
    let entries: Vec<FileManifestEntry> = doc
        .files
        .into_iter()
        .filter(|entry| !entry.path.trim().is_empty())
        .map(|entry| FileManifestEntry {
            path: entry.path.trim().to_string(),
            description: entry.description.trim().to_string(),
        })
        .collect();

    if entries.is_empty() {
        None
    } else {
        Some(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    const BLOG_PLAN: &str = r#"{"files":[{"path":"src/server.ts","description":"entry point"},{"path":"src/models/Post.ts","description":"Post model"}]}"#;

    fn paths(manifest: &[FileManifestEntry]) -> Vec<&str> {
        manifest.iter().map(|entry| entry.path.as_str()).collect()
    }

    #[test]
    fn bare_json_parses_in_one_push() {
        let mut acc = PlanAccumulator::new();
        let manifest = acc.push(BLOG_PLAN).expect("manifest");
        assert_eq!(paths(&manifest), vec!["src/server.ts", "src/models/Post.ts"]);
        assert_eq!(manifest[0].description, "entry point");
    }

    #[test]
    fn split_fragments_accumulate_until_balanced() {
        let mut acc = PlanAccumulator::new();
        let (head, tail) = BLOG_PLAN.split_at(40);
        assert!(acc.push(head).is_none());
        let manifest = acc.push(tail).expect("manifest");
        assert_eq!(manifest.len(), 2);
    }

    #[test]
    fn leading_prose_and_fenced_wrapper_recover_same_manifest() {
        let noisy = format!("Here is the generation plan you asked for.\n```json\n{BLOG_PLAN}\n```\n");
        let mut acc = PlanAccumulator::new();
        let manifest = acc.push(&noisy).expect("manifest");
        assert_eq!(paths(&manifest), vec!["src/server.ts", "src/models/Post.ts"]);
    }

    #[test]
    fn stray_balanced_braces_in_prose_do_not_mask_the_manifest() {
        let noisy = format!("Plan {{attached below}} as requested:\n{BLOG_PLAN}");
        let mut acc = PlanAccumulator::new();
        let manifest = acc.push(&noisy).expect("manifest");
        assert_eq!(manifest.len(), 2);
    }

    #[test]
    fn braces_inside_descriptions_do_not_break_balance_tracking() {
        let tricky = r#"{"files":[{"path":"src/a.ts","description":"renders {{ mustache }} blocks"}]}"#;
        let mut acc = PlanAccumulator::new();
        let manifest = acc.push(tricky).expect("manifest");
        assert_eq!(manifest[0].path, "src/a.ts");
    }

    #[test]
    fn escaped_quotes_in_strings_are_honoured() {
        let tricky = r#"{"files":[{"path":"src/a.ts","description":"say \"hi {there}\""}]}"#;
        let mut acc = PlanAccumulator::new();
        assert!(acc.push(tricky).is_some());
    }

    #[test]
    fn empty_paths_are_dropped_silently() {
        let plan = r#"{"files":[{"path":"  ","description":"ghost"},{"path":"src/real.ts","description":"kept"}]}"#;
        let mut acc = PlanAccumulator::new();
        let manifest = acc.push(plan).expect("manifest");
        assert_eq!(paths(&manifest), vec!["src/real.ts"]);
    }

    #[test]
    fn all_paths_empty_is_not_a_manifest() {
        let plan = r#"{"files":[{"path":"","description":"a"}]}"#;
        let mut acc = PlanAccumulator::new();
        assert!(acc.push(plan).is_none());
    }

    #[test]
    fn done_accumulator_ignores_further_pushes() {
        let mut acc = PlanAccumulator::new();
        assert!(acc.push(BLOG_PLAN).is_some());
        assert!(acc.push(BLOG_PLAN).is_none());
    }

    #[tokio::test]
    async fn extract_plan_reads_fragments_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (head, tail) = BLOG_PLAN.split_at(25);
        tx.send(Fragment::Text(head.to_string())).unwrap();
        tx.send(Fragment::Text(tail.to_string())).unwrap();
        drop(tx);

        let manifest = extract_plan(&mut rx).await.expect("manifest");
        assert_eq!(manifest.len(), 2);
    }

    #[tokio::test]
    async fn exhausted_stream_is_a_plan_parse_error() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(Fragment::Text("no json here".to_string())).unwrap();
        drop(tx);

        let err = extract_plan(&mut rx).await.unwrap_err();
        assert_eq!(err, PlanParseError::StreamExhausted);
    }

    #[tokio::test]
    async fn failed_marker_is_a_stream_failure() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(Fragment::Failed("model unavailable".to_string())).unwrap();
        drop(tx);

        let err = extract_plan(&mut rx).await.unwrap_err();
        assert_eq!(err, PlanParseError::StreamFailed("model unavailable".into()));
    }
}

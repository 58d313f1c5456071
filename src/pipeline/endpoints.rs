//! Endpoint-map derivation by pattern scanning of generated source.
//!
//! Best-effort by design: only the conventional two-argument registration
//! form `<router-or-app>.<verb>("<path>", ...)` is recognized, for the verbs
//! get/post/put/delete. Routes registered indirectly (via a loop, a table,
//! or the `patch` verb) are missed; that is accepted lossy behavior for a
//! derived artifact, not a defect.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::pipeline::GeneratedFile;

/// One HTTP route found in generated source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRecord {
    /// Uppercased HTTP verb (GET/POST/PUT/DELETE).
    pub method: String,
    /// The path literal exactly as written in the source.
    pub endpoint: String,
    /// Path of the generated file the route was found in.
    pub file: String,
}

/// Matches `.get("/path"`, `.post('/path'`, and backtick variants.
fn route_regex() -> &'static Regex {
    static ROUTE: OnceLock<Regex> = OnceLock::new();
    ROUTE.get_or_init(|| {
        Regex::new(r#"\.(get|post|put|delete)\s*\(\s*["'`]([^"'`]+)["'`]"#)
            .expect("route regex is valid")
    })
}

/// Scans each file's content for route registrations.
///
/// Records are deduplicated by `(method, endpoint)`: the first occurrence
/// wins and insertion order is preserved. A later occurrence in a different
/// file is discarded, not merged.
#[must_use]
pub fn build_endpoint_map(files: &[GeneratedFile]) -> Vec<EndpointRecord> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut records = Vec::new();

    for file in files {
        for capture in route_regex().captures_iter(&file.content) {
            let method = capture[1].to_uppercase();
            let endpoint = capture[2].to_string();
            if seen.insert((method.clone(), endpoint.clone())) {
                records.push(EndpointRecord { method, endpoint, file: file.path.clone() });
            }
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, content: &str) -> GeneratedFile {
        GeneratedFile { path: path.into(), content: content.into() }
    }

    #[test]
    fn finds_routes_and_uppercases_verbs() {
        let files = vec![file(
            "src/routes/posts.js",
            "router.get(\"/posts\", listPosts);\nrouter.post('/posts', createPost);",
        )];
        let records = build_endpoint_map(&files);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].method, "GET");
        assert_eq!(records[0].endpoint, "/posts");
        assert_eq!(records[1].method, "POST");
    }

    #[test]
    fn dedup_keeps_first_occurrence_and_order() {
        let files = vec![
            file("src/a.js", "app.get(\"/x\", a);"),
            file("src/b.js", "app.get(\"/x\", b);\napp.delete(\"/x\", c);"),
        ];
        let records = build_endpoint_map(&files);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], EndpointRecord {
            method: "GET".into(),
            endpoint: "/x".into(),
            file: "src/a.js".into(),
        });
        assert_eq!(records[1].method, "DELETE");
    }

    #[test]
    fn same_path_different_verbs_are_distinct() {
        let files = vec![file("src/a.js", "app.get(\"/x\", a);\napp.put(\"/x\", b);")];
        assert_eq!(build_endpoint_map(&files).len(), 2);
    }

    #[test]
    fn patch_is_a_documented_gap() {
        let files = vec![file("src/a.js", "app.patch(\"/x\", a);")];
        assert!(build_endpoint_map(&files).is_empty());
    }

    #[test]
    fn whitespace_between_call_and_literal_is_tolerated() {
        let files = vec![file("src/a.ts", "router\n  .get ( \"/spaced\", handler);")];
        let records = build_endpoint_map(&files);
        assert_eq!(records[0].endpoint, "/spaced");
    }

    #[test]
    fn no_routes_yields_empty_map() {
        let files = vec![file("README.md", "no routes here")];
        assert!(build_endpoint_map(&files).is_empty());
    }
}

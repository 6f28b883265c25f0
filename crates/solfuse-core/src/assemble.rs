//! Flatten assembly: strip import spans, consolidate SPDX headers,
//! concatenate nodes in dependency order.
//!
//! Assembly is fully deterministic: node order comes from the graph's
//! `order`, SPDX identifiers keep first-seen order, and every separator is
//! fixed. Identical inputs produce byte-identical output.

use crate::extract::Span;
use crate::graph::DependencyGraph;

/// The comment prefix an SPDX declaration line carries.
const SPDX_PREFIX: &str = "SPDX-License-Identifier:";

/// Assembly knobs.
#[derive(Debug, Default, Clone)]
pub struct AssembleOptions {
    /// Replace every collected identifier with this license expression
    /// (used for explorer payloads carrying a declared license).
    pub license_override: Option<String>,
}

/// Concatenate the graph's nodes into one flattened artifact.
///
/// Each node contributes a `// File:` boundary marker followed by its
/// content with import statements and SPDX lines removed. One consolidated
/// SPDX header is prepended when any identifier was collected.
pub fn assemble(graph: &DependencyGraph, options: &AssembleOptions) -> String {
    let mut sections: Vec<String> = Vec::with_capacity(graph.order.len());
    let mut licenses: Vec<String> = Vec::new();

    for id in &graph.order {
        let Some(node) = graph.nodes.get(id) else {
            continue;
        };
        let spans: Vec<Span> = node.edges.iter().map(|e| e.span).collect();
        let without_imports = strip_spans(&node.content, &spans);
        let (body, identifiers) = strip_spdx_lines(&without_imports);
        for identifier in identifiers {
            if !licenses.contains(&identifier) {
                licenses.push(identifier);
            }
        }
        sections.push(format!("// File: {}\n{}\n", id, body.trim()));
    }

    let expression = match &options.license_override {
        Some(license) => Some(license.clone()),
        None if !licenses.is_empty() => Some(licenses.join(" AND ")),
        None => None,
    };

    let mut out = String::new();
    if let Some(expression) = expression {
        out.push_str("// ");
        out.push_str(SPDX_PREFIX);
        out.push(' ');
        out.push_str(&expression);
        out.push_str("\n\n");
    }
    out.push_str(&sections.join("\n"));
    out
}

/// Remove byte spans from content, back-to-front so offsets stay valid.
fn strip_spans(content: &str, spans: &[Span]) -> String {
    let mut result = content.to_string();
    for span in spans.iter().rev() {
        debug_assert!(
            span.end <= result.len(),
            "import span {}..{} exceeds content length {}",
            span.start,
            span.end,
            result.len()
        );
        if span.end <= result.len() {
            result.replace_range(span.start..span.end, "");
        }
    }
    result
}

/// Drop SPDX declaration lines, collecting their identifiers in order.
///
/// This is a dedicated line scan, separate from the import extractor: an
/// SPDX declaration is a `//` comment line whose first token after the
/// slashes is the SPDX prefix.
fn strip_spdx_lines(content: &str) -> (String, Vec<String>) {
    let mut identifiers = Vec::new();
    let mut kept: Vec<&str> = Vec::new();

    for line in content.lines() {
        match spdx_identifier(line) {
            Some(identifier) => identifiers.push(identifier.to_string()),
            None => kept.push(line),
        }
    }

    (kept.join("\n"), identifiers)
}

/// The license expression of an SPDX declaration line, if it is one.
fn spdx_identifier(line: &str) -> Option<&str> {
    let comment = line.trim_start().strip_prefix("//")?;
    let expression = comment.trim_start().strip_prefix(SPDX_PREFIX)?.trim();
    if expression.is_empty() {
        None
    } else {
        Some(expression)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use crate::remap::RemappingTable;
    use crate::resolve::Scope;
    use crate::source::{SourceContent, SourceRepository};
    use std::collections::BTreeMap;
    use std::io;

    struct MapSource(BTreeMap<String, String>);

    impl SourceRepository for MapSource {
        fn fetch(&self, id: &str) -> io::Result<Option<SourceContent>> {
            Ok(self.0.get(id).map(|text| SourceContent {
                id: id.to_string(),
                text: text.clone(),
            }))
        }
    }

    fn flatten_sources(entries: &[(&str, &str)], root: &str) -> String {
        let repo = MapSource(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        let table = RemappingTable::new();
        let graph = GraphBuilder::new(&repo, &table, Scope::Unbounded)
            .build([root])
            .unwrap();
        assemble(&graph, &AssembleOptions::default())
    }

    mod concatenation {
        use super::*;

        #[test]
        fn dependency_bodies_come_first_and_imports_are_gone() {
            let out = flatten_sources(
                &[
                    ("A.sol", "import \"./B.sol\";\ncontract A {}"),
                    ("B.sol", "contract B {}"),
                ],
                "A.sol",
            );
            let a = out.find("contract A {}").unwrap();
            let b = out.find("contract B {}").unwrap();
            assert!(b < a);
            assert!(!out.contains("import"));
        }

        #[test]
        fn boundary_markers_name_every_source() {
            let out = flatten_sources(
                &[
                    ("A.sol", "import \"./B.sol\";\ncontract A {}"),
                    ("B.sol", "contract B {}"),
                ],
                "A.sol",
            );
            assert!(out.contains("// File: A.sol"));
            assert!(out.contains("// File: B.sol"));
        }

        #[test]
        fn surrounding_code_survives_span_removal() {
            let out = flatten_sources(
                &[
                    (
                        "Main.sol",
                        "pragma solidity ^0.8.0;\nimport \"./A.sol\"; import \"./B.sol\";\ncontract Main is A, B {}",
                    ),
                    ("A.sol", "contract A {}"),
                    ("B.sol", "contract B {}"),
                ],
                "Main.sol",
            );
            assert!(out.contains("pragma solidity ^0.8.0;"));
            assert!(out.contains("contract Main is A, B {}"));
            assert!(!out.contains("import"));
        }

        #[test]
        fn empty_file_still_gets_a_marker() {
            let out = flatten_sources(
                &[
                    ("Main.sol", "import \"./Empty.sol\";\ncontract Main {}"),
                    ("Empty.sol", "   // just a comment"),
                ],
                "Main.sol",
            );
            assert!(out.contains("// File: Empty.sol"));
            assert!(out.contains("// just a comment"));
        }
    }

    mod spdx_consolidation {
        use super::*;

        #[test]
        fn shared_license_collapses_to_one_header() {
            let out = flatten_sources(
                &[
                    (
                        "A.sol",
                        "// SPDX-License-Identifier: MIT\nimport \"./B.sol\";\ncontract A {}",
                    ),
                    ("B.sol", "// SPDX-License-Identifier: MIT\ncontract B {}"),
                ],
                "A.sol",
            );
            assert!(out.starts_with("// SPDX-License-Identifier: MIT\n"));
            assert_eq!(out.matches("SPDX-License-Identifier").count(), 1);
        }

        #[test]
        fn distinct_licenses_combine_in_first_seen_order() {
            let out = flatten_sources(
                &[
                    (
                        "A.sol",
                        "// SPDX-License-Identifier: MIT\nimport \"./B.sol\";\ncontract A {}",
                    ),
                    (
                        "B.sol",
                        "// SPDX-License-Identifier: Apache-2.0\ncontract B {}",
                    ),
                ],
                "A.sol",
            );
            // B is assembled first, so Apache-2.0 is seen first
            assert!(out.starts_with("// SPDX-License-Identifier: Apache-2.0 AND MIT\n"));
        }

        #[test]
        fn no_header_when_no_source_declares_one() {
            let out = flatten_sources(&[("A.sol", "contract A {}")], "A.sol");
            assert!(!out.contains("SPDX"));
        }

        #[test]
        fn override_replaces_collected_identifiers() {
            let repo = MapSource(
                [(
                    "A.sol".to_string(),
                    "// SPDX-License-Identifier: GPL-3.0\ncontract A {}".to_string(),
                )]
                .into_iter()
                .collect(),
            );
            let table = RemappingTable::new();
            let graph = GraphBuilder::new(&repo, &table, Scope::Unbounded)
                .build(["A.sol"])
                .unwrap();
            let out = assemble(
                &graph,
                &AssembleOptions {
                    license_override: Some("MIT".to_string()),
                },
            );
            assert!(out.starts_with("// SPDX-License-Identifier: MIT\n"));
            assert!(!out.contains("GPL-3.0"));
        }

        #[test]
        fn indented_declarations_are_still_collected() {
            let out = flatten_sources(
                &[("A.sol", "    //   SPDX-License-Identifier:   MIT\ncontract A {}")],
                "A.sol",
            );
            assert!(out.starts_with("// SPDX-License-Identifier: MIT\n"));
        }
    }

    mod span_stripping {
        use super::*;
        use crate::extract::Span;

        #[test]
        fn spans_are_removed_back_to_front() {
            let content = "import \"A.sol\";\nkeep\nimport \"B.sol\";\n";
            let spans = vec![Span::new(0, 15), Span::new(21, 36)];
            assert_eq!(strip_spans(content, &spans), "\nkeep\n\n");
        }

        #[test]
        #[should_panic(expected = "exceeds content length")]
        fn out_of_range_span_is_a_bug() {
            let _ = strip_spans("short", &[Span::new(0, 99)]);
        }
    }

    mod determinism {
        use super::*;

        #[test]
        fn identical_inputs_produce_identical_bytes() {
            let entries = [
                (
                    "Main.sol",
                    "// SPDX-License-Identifier: MIT\nimport \"./A.sol\";\nimport \"./B.sol\";\ncontract Main {}",
                ),
                ("A.sol", "contract A {}"),
                ("B.sol", "contract B {}"),
            ];
            let first = flatten_sources(&entries, "Main.sol");
            let second = flatten_sources(&entries, "Main.sol");
            assert_eq!(first, second);
        }
    }
}

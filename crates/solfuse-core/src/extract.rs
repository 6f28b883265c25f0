//! Comment- and string-aware extraction of Solidity import directives.
//!
//! The extractor scans raw source text and produces, for every import
//! statement, the raw import path and the exact byte span to strip during
//! assembly. It understands just enough Solidity lexical structure to be
//! safe: an `import` keyword inside a line comment, a block comment, or a
//! string literal is never a directive.
//!
//! Accepted statement forms:
//!
//! - `import "path";` / `import 'path';`
//! - `import "path" as Alias;`
//! - `import * as Alias from "path";`
//! - `import {A, B} from "path";` (the symbol list may span lines)
//! - several statements on one physical line, or one statement broken
//!   across lines
//!
//! The import path is the last quoted literal in the statement; symbol
//! lists are never interpreted, only carried inside the span. Malformed
//! statements are reported as [`SyntaxIssue`]s and skipped; extraction of
//! the rest of the file always continues.

// ============================================================================
// Spans
// ============================================================================

/// Byte offsets into source content.
///
/// Spans are half-open intervals: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Create a new span.
    ///
    /// # Panics
    /// Panics if `start > end`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(
            start <= end,
            "Span start ({}) must be <= end ({})",
            start,
            end
        );
        Span { start, end }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

// ============================================================================
// Extraction Results
// ============================================================================

/// One extracted import directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDirective {
    /// The import path exactly as written between the quotes.
    pub raw_path: String,
    /// Byte range of the whole statement, including the terminating `;`.
    pub span: Span,
}

/// A malformed import fragment that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxIssue {
    /// Byte offset where the problem was detected.
    pub offset: usize,
    /// What went wrong.
    pub message: String,
}

/// The result of scanning one file.
#[derive(Debug, Default)]
pub struct Extraction {
    /// Directives in source order.
    pub directives: Vec<ImportDirective>,
    /// Malformed fragments, in source order.
    pub issues: Vec<SyntaxIssue>,
}

// ============================================================================
// Scanner
// ============================================================================

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Position just past the end of a line comment starting at `i`.
fn skip_line_comment(bytes: &[u8], i: usize) -> usize {
    let mut j = i + 2;
    while j < bytes.len() && bytes[j] != b'\n' {
        j += 1;
    }
    j
}

/// Position just past the closing `*/` of a block comment starting at `i`.
fn skip_block_comment(bytes: &[u8], i: usize) -> usize {
    let mut j = i + 2;
    while j + 1 < bytes.len() {
        if bytes[j] == b'*' && bytes[j + 1] == b'/' {
            return j + 2;
        }
        j += 1;
    }
    bytes.len()
}

/// Position just past a string literal starting at `i`.
///
/// Solidity string literals do not span lines; an unterminated literal
/// ends at the next newline so scanning can resync.
fn skip_string(bytes: &[u8], i: usize) -> usize {
    let quote = bytes[i];
    let mut j = i + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b'\n' => return j,
            b if b == quote => return j + 1,
            _ => j += 1,
        }
    }
    bytes.len()
}

/// Whether `keyword` sits at `i` on identifier boundaries.
fn is_keyword_at(bytes: &[u8], i: usize, keyword: &[u8]) -> bool {
    if i > 0 && is_ident_byte(bytes[i - 1]) {
        return false;
    }
    if i + keyword.len() > bytes.len() || &bytes[i..i + keyword.len()] != keyword {
        return false;
    }
    match bytes.get(i + keyword.len()) {
        Some(&b) => !is_ident_byte(b),
        None => true,
    }
}

enum Scanned {
    Directive(ImportDirective, usize),
    Malformed(SyntaxIssue, usize),
}

/// Scan a single import statement starting at `start`.
///
/// Returns the directive (or issue) plus the position to resume scanning at.
fn scan_statement(text: &str, start: usize) -> Scanned {
    let bytes = text.as_bytes();
    let mut j = start + "import".len();
    let mut last_literal: Option<String> = None;

    while j < bytes.len() {
        match bytes[j] {
            b'/' if bytes.get(j + 1) == Some(&b'/') => j = skip_line_comment(bytes, j),
            b'/' if bytes.get(j + 1) == Some(&b'*') => j = skip_block_comment(bytes, j),
            b'"' | b'\'' => {
                let quote = bytes[j];
                let lit_start = j + 1;
                let mut k = lit_start;
                let mut terminated = false;
                while k < bytes.len() {
                    match bytes[k] {
                        b'\\' => k += 2,
                        b'\n' => break,
                        b if b == quote => {
                            terminated = true;
                            break;
                        }
                        _ => k += 1,
                    }
                }
                if !terminated {
                    return Scanned::Malformed(
                        SyntaxIssue {
                            offset: j,
                            message: "unterminated string literal in import".to_string(),
                        },
                        k.min(bytes.len()),
                    );
                }
                last_literal = Some(text[lit_start..k].to_string());
                j = k + 1;
            }
            b';' => {
                let end = j + 1;
                return match last_literal {
                    Some(raw_path) => Scanned::Directive(
                        ImportDirective {
                            raw_path,
                            span: Span::new(start, end),
                        },
                        end,
                    ),
                    None => Scanned::Malformed(
                        SyntaxIssue {
                            offset: start,
                            message: "import statement without a path".to_string(),
                        },
                        end,
                    ),
                };
            }
            _ => j += 1,
        }
    }

    Scanned::Malformed(
        SyntaxIssue {
            offset: start,
            message: "unterminated import statement".to_string(),
        },
        bytes.len(),
    )
}

/// Extract all import directives from raw source text.
///
/// Comments and string literals are skipped; malformed fragments are
/// recorded as issues and never abort the scan.
pub fn extract_imports(text: &str) -> Extraction {
    let bytes = text.as_bytes();
    let mut out = Extraction::default();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => i = skip_line_comment(bytes, i),
            b'/' if bytes.get(i + 1) == Some(&b'*') => i = skip_block_comment(bytes, i),
            b'"' | b'\'' => i = skip_string(bytes, i),
            b'i' if is_keyword_at(bytes, i, b"import") => match scan_statement(text, i) {
                Scanned::Directive(directive, next) => {
                    out.directives.push(directive);
                    i = next;
                }
                Scanned::Malformed(issue, next) => {
                    out.issues.push(issue);
                    // resume past the offending fragment, never behind it
                    i = next.max(i + 1);
                }
            },
            _ => i += 1,
        }
    }

    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(extraction: &Extraction) -> Vec<&str> {
        extraction
            .directives
            .iter()
            .map(|d| d.raw_path.as_str())
            .collect()
    }

    mod statement_forms {
        use super::*;

        #[test]
        fn plain_import() {
            let src = "pragma solidity ^0.8.0;\nimport \"./Lib.sol\";\ncontract A {}";
            let ex = extract_imports(src);
            assert_eq!(paths(&ex), vec!["./Lib.sol"]);
            assert!(ex.issues.is_empty());
        }

        #[test]
        fn single_quoted_import() {
            let ex = extract_imports("import './B.sol';\ncontract A {}");
            assert_eq!(paths(&ex), vec!["./B.sol"]);
        }

        #[test]
        fn aliased_import() {
            let ex = extract_imports("import \"./Lib.sol\" as Lib;\n");
            assert_eq!(paths(&ex), vec!["./Lib.sol"]);
        }

        #[test]
        fn star_alias_import() {
            let ex = extract_imports("import * as Utils from \"./Utils.sol\";\n");
            assert_eq!(paths(&ex), vec!["./Utils.sol"]);
        }

        #[test]
        fn symbol_list_import() {
            let ex = extract_imports("import {Ownable, Context} from \"@oz/access/Ownable.sol\";");
            assert_eq!(paths(&ex), vec!["@oz/access/Ownable.sol"]);
        }

        #[test]
        fn symbol_list_spanning_lines() {
            let src = "import {\n    Ownable,\n    Context\n} from \"./Access.sol\";\ncontract A {}";
            let ex = extract_imports(src);
            assert_eq!(paths(&ex), vec!["./Access.sol"]);
        }

        #[test]
        fn statement_broken_across_lines() {
            let ex = extract_imports("import\n    \"A.sol\";\ncontract C {}");
            assert_eq!(paths(&ex), vec!["A.sol"]);
        }

        #[test]
        fn multiple_statements_on_one_line() {
            let ex = extract_imports("import \"A.sol\"; import \"B.sol\";\ncontract C {}");
            assert_eq!(paths(&ex), vec!["A.sol", "B.sol"]);
        }
    }

    mod spans {
        use super::*;

        #[test]
        fn span_covers_whole_statement() {
            let src = "import \"A.sol\";\ncontract C {}";
            let ex = extract_imports(src);
            let span = ex.directives[0].span;
            assert_eq!(&src[span.start..span.end], "import \"A.sol\";");
        }

        #[test]
        fn spans_are_in_source_order() {
            let src = "import \"A.sol\";\nimport \"B.sol\";\n";
            let ex = extract_imports(src);
            assert!(ex.directives[0].span.end <= ex.directives[1].span.start);
        }
    }

    mod comment_and_string_skipping {
        use super::*;

        #[test]
        fn import_in_line_comment_is_ignored() {
            let ex = extract_imports("// import \"Fake.sol\";\nimport \"Real.sol\";");
            assert_eq!(paths(&ex), vec!["Real.sol"]);
        }

        #[test]
        fn import_in_block_comment_is_ignored() {
            let src = "/*\nimport \"Fake.sol\";\n*/\nimport \"Real.sol\";";
            let ex = extract_imports(src);
            assert_eq!(paths(&ex), vec!["Real.sol"]);
        }

        #[test]
        fn import_in_string_literal_is_ignored() {
            let src = "contract A { string s = \"import \\\"Fake.sol\\\";\"; }";
            let ex = extract_imports(src);
            assert!(ex.directives.is_empty());
        }

        #[test]
        fn comment_inside_statement() {
            let src = "import /* the lib */ \"Lib.sol\";\ncontract A {}";
            let ex = extract_imports(src);
            assert_eq!(paths(&ex), vec!["Lib.sol"]);
        }

        #[test]
        fn identifier_prefix_is_not_a_keyword() {
            let ex = extract_imports("uint importance = 1; import \"A.sol\";");
            assert_eq!(paths(&ex), vec!["A.sol"]);
        }
    }

    mod malformed_fragments {
        use super::*;

        #[test]
        fn unterminated_string_is_reported_and_skipped() {
            let src = "import \"Broken.sol\ncontract A {}\nimport \"Ok.sol\";";
            let ex = extract_imports(src);
            assert_eq!(paths(&ex), vec!["Ok.sol"]);
            assert_eq!(ex.issues.len(), 1);
            assert!(ex.issues[0].message.contains("unterminated string"));
        }

        #[test]
        fn pathless_statement_is_reported() {
            let ex = extract_imports("import ;\nimport \"Ok.sol\";");
            assert_eq!(paths(&ex), vec!["Ok.sol"]);
            assert_eq!(ex.issues.len(), 1);
            assert!(ex.issues[0].message.contains("without a path"));
        }

        #[test]
        fn statement_at_eof_without_semicolon() {
            let ex = extract_imports("contract A {}\nimport \"Tail.sol\"");
            assert!(ex.directives.is_empty());
            assert_eq!(ex.issues.len(), 1);
            assert!(ex.issues[0].message.contains("unterminated import"));
        }
    }

    mod span_type {
        use super::*;

        #[test]
        fn span_len() {
            let span = Span::new(3, 10);
            assert_eq!(span.len(), 7);
            assert!(!span.is_empty());
            assert!(Span::new(4, 4).is_empty());
        }

        #[test]
        #[should_panic(expected = "must be <=")]
        fn span_rejects_inverted_range() {
            let _ = Span::new(5, 2);
        }
    }
}

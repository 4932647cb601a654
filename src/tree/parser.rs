use crate::tree::errors::ParseError;
use ast_grep_language::{LanguageExt, SupportLang};
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser, Tree, TreeCursor};

/// Tree-sitter parser wrapper for TypeScript source code.
pub struct TsParser {
    parser: Parser,
}

impl TsParser {
    /// Create a new TypeScript parser.
    pub fn new() -> Result<Self, ParseError> {
        let mut parser = Parser::new();
        // Get the tree-sitter Language from ast-grep-language
        let ts_lang = SupportLang::TypeScript.get_ts_language();
        parser
            .set_language(&ts_lang)
            .map_err(|_| ParseError::LanguageSet)?;

        Ok(Self { parser })
    }

    /// Parse source text into a [`SourceFile`].
    ///
    /// The returned value owns the text and the parsed tree; it is intended
    /// to live only for the duration of one file's processing.
    pub fn parse(
        &mut self,
        path: impl Into<PathBuf>,
        text: impl Into<String>,
    ) -> Result<SourceFile, ParseError> {
        let text = text.into();
        let tree = self
            .parser
            .parse(&text, None)
            .ok_or(ParseError::ParseFailed)?;
        Ok(SourceFile::new(path.into(), text, tree))
    }

    /// Read and parse a file from disk.
    pub fn parse_file(&mut self, path: &Path) -> Result<SourceFile, ParseError> {
        let text = std::fs::read_to_string(path).map_err(|e| ParseError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.parse(path, text)
    }
}

/// A parsed source file: immutable original text plus its syntax tree.
///
/// Owns all nodes reachable from the root. Nodes are never mutated; edits
/// act on text spans, not on the tree.
pub struct SourceFile {
    path: PathBuf,
    text: String,
    tree: Tree,
    line_starts: Vec<usize>,
}

impl SourceFile {
    fn new(path: PathBuf, text: String, tree: Tree) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            path,
            text,
            tree,
            line_starts,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Get the root node of the tree.
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Extract text for a node's byte range.
    pub fn node_text(&self, node: Node<'_>) -> &str {
        &self.text[node.byte_range()]
    }

    /// Convert a byte offset to a 1-based (line, column) pair.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        (line_idx + 1, offset - self.line_starts[line_idx] + 1)
    }

    /// Byte offset of the start of a 1-based line, if the line exists.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        if line == 0 {
            return None;
        }
        self.line_starts.get(line - 1).copied()
    }

    /// Iterate over all named nodes in document (depth-first, pre-order) order.
    pub fn named_nodes(&self) -> NamedNodes<'_> {
        NamedNodes {
            cursor: self.tree.root_node().walk(),
            done: false,
        }
    }

    /// Check if the tree contains any ERROR or MISSING nodes.
    pub fn has_errors(&self) -> bool {
        self.named_nodes().any(|n| n.is_error() || n.is_missing())
    }
}

/// Depth-first pre-order iterator over the named nodes of a tree.
pub struct NamedNodes<'t> {
    cursor: TreeCursor<'t>,
    done: bool,
}

impl<'t> NamedNodes<'t> {
    fn advance(&mut self) {
        if self.cursor.goto_first_child() {
            return;
        }
        loop {
            if self.cursor.goto_next_sibling() {
                return;
            }
            if !self.cursor.goto_parent() {
                self.done = true;
                return;
            }
        }
    }
}

impl<'t> Iterator for NamedNodes<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Node<'t>> {
        loop {
            if self.done {
                return None;
            }
            let node = self.cursor.node();
            self.advance();
            if node.is_named() {
                return Some(node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> SourceFile {
        TsParser::new().unwrap().parse("test.ts", src).unwrap()
    }

    #[test]
    fn parse_valid_typescript() {
        let file = parse("const x: number = 1;\n");
        assert_eq!(file.root().kind(), "program");
        assert!(!file.has_errors());
    }

    #[test]
    fn parse_invalid_typescript() {
        let file = parse("function broken( {\n");
        assert!(file.has_errors());
    }

    #[test]
    fn node_text_extraction() {
        let file = parse("let answer = 42;\n");
        let declarator = file
            .named_nodes()
            .find(|n| n.kind() == "variable_declarator")
            .unwrap();
        assert_eq!(file.node_text(declarator), "answer = 42");
    }

    #[test]
    fn line_col_conversion() {
        let file = parse("const a = 1;\nconst b = 2;\n");
        assert_eq!(file.line_col(0), (1, 1));
        assert_eq!(file.line_col(13), (2, 1));
        assert_eq!(file.line_col(19), (2, 7));
    }

    #[test]
    fn line_start_lookup() {
        let file = parse("const a = 1;\nconst b = 2;\n");
        assert_eq!(file.line_start(1), Some(0));
        assert_eq!(file.line_start(2), Some(13));
        assert_eq!(file.line_start(0), None);
    }

    #[test]
    fn preorder_visits_parent_before_children() {
        let file = parse("if (x) { y(); }\n");
        let kinds: Vec<_> = file.named_nodes().map(|n| n.kind()).collect();
        let if_pos = kinds.iter().position(|k| *k == "if_statement").unwrap();
        let call_pos = kinds.iter().position(|k| *k == "call_expression").unwrap();
        assert!(if_pos < call_pos);
        assert_eq!(kinds[0], "program");
    }
}

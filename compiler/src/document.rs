//! Generic document tree consumed by the IDL parser.
//!
//! The parser works on a YAML-shaped object model with three node kinds,
//! mapping, scalar and sequence. Mappings preserve entry order and keep
//! duplicate keys; whether a duplicate is an error is a parser decision,
//! not a loader decision. The loader below reads the YAML subset the IDL
//! grammar needs: block mappings, block sequences, flow sequences
//! (`[a, b]`), plain and quoted scalars, and `#` comments.

use serde::Serialize;

use crate::error::IdlError;

/// A (file, line, column) triple attached to every node, 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(file: &str, line: usize, column: usize) -> Self {
        SourceLocation {
            file: file.to_string(),
            line,
            column,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarNode {
    pub value: String,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SequenceNode {
    pub items: Vec<Node>,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MappingNode {
    pub entries: Vec<(ScalarNode, Node)>,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Scalar(ScalarNode),
    Sequence(SequenceNode),
    Mapping(MappingNode),
}

impl Node {
    pub fn loc(&self) -> &SourceLocation {
        match self {
            Node::Scalar(n) => &n.loc,
            Node::Sequence(n) => &n.loc,
            Node::Mapping(n) => &n.loc,
        }
    }

    /// Node kind name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Scalar(_) => "scalar",
            Node::Sequence(_) => "sequence",
            Node::Mapping(_) => "mapping",
        }
    }

    pub fn as_scalar(&self) -> Option<&ScalarNode> {
        match self {
            Node::Scalar(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&MappingNode> {
        match self {
            Node::Mapping(n) => Some(n),
            _ => None,
        }
    }
}

/// One significant input line after comment stripping.
struct Line {
    number: usize,
    indent: usize,
    /// Content after the indent, trailing whitespace removed.
    text: String,
}

fn parse_error(msg: impl Into<String>, line: usize, column: usize) -> IdlError {
    IdlError::Parse {
        msg: msg.into(),
        line,
        column,
    }
}

/// Strip a trailing `#` comment, honoring single and double quotes.
fn strip_comment(raw: &str) -> &str {
    let mut in_single = false;
    let mut in_double = false;
    for (idx, ch) in raw.char_indices() {
        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '#' if !in_single && !in_double => return &raw[..idx],
            _ => {}
        }
    }
    raw
}

fn scan_lines(text: &str) -> Result<Vec<Line>, IdlError> {
    let mut lines = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let number = idx + 1;
        let stripped = strip_comment(raw);
        let content = stripped.trim_end();
        if content.trim().is_empty() {
            continue;
        }
        let mut indent = 0;
        for ch in content.chars() {
            match ch {
                ' ' => indent += 1,
                '\t' => {
                    return Err(parse_error(
                        "tab characters are not allowed in indentation",
                        number,
                        indent + 1,
                    ))
                }
                _ => break,
            }
        }
        lines.push(Line {
            number,
            indent,
            text: content[indent..].to_string(),
        });
    }
    Ok(lines)
}

/// Remove one level of matching quotes from a scalar.
fn unquote(value: &str) -> String {
    let v = value.trim();
    if v.len() >= 2
        && ((v.starts_with('"') && v.ends_with('"'))
            || (v.starts_with('\'') && v.ends_with('\'')))
    {
        v[1..v.len() - 1].to_string()
    } else {
        v.to_string()
    }
}

/// Parse an inline value: a flow sequence `[a, b]` or a plain scalar.
fn parse_flow(file: &str, value: &str, line: usize, column: usize) -> Result<Node, IdlError> {
    let trimmed = value.trim();
    let loc = SourceLocation::new(file, line, column);
    if trimmed.starts_with('[') {
        if !trimmed.ends_with(']') {
            return Err(parse_error("unterminated flow sequence", line, column));
        }
        let inner = &trimmed[1..trimmed.len() - 1];
        let mut items = Vec::new();
        if !inner.trim().is_empty() {
            for part in inner.split(',') {
                if part.trim().is_empty() {
                    return Err(parse_error("empty flow sequence entry", line, column));
                }
                items.push(Node::Scalar(ScalarNode {
                    value: unquote(part),
                    loc: loc.clone(),
                }));
            }
        }
        return Ok(Node::Sequence(SequenceNode { items, loc }));
    }
    Ok(Node::Scalar(ScalarNode {
        value: unquote(trimmed),
        loc,
    }))
}

struct Loader<'a> {
    file: &'a str,
    lines: Vec<Line>,
    pos: usize,
}

impl<'a> Loader<'a> {
    fn current(&self) -> Option<&Line> {
        self.lines.get(self.pos)
    }

    fn loc(&self, line: &Line) -> SourceLocation {
        SourceLocation::new(self.file, line.number, line.indent + 1)
    }

    /// Parse a block (mapping or sequence) whose lines sit at `indent`.
    fn parse_block(&mut self, indent: usize) -> Result<Node, IdlError> {
        let first = self
            .current()
            .expect("parse_block called with no lines left");
        if first.text.starts_with('-') {
            self.parse_sequence(indent)
        } else {
            self.parse_mapping(indent)
        }
    }

    fn parse_sequence(&mut self, indent: usize) -> Result<Node, IdlError> {
        let loc = {
            let line = self.current().unwrap();
            self.loc(line)
        };
        let mut items = Vec::new();
        while let Some(line) = self.current() {
            if line.indent != indent || !line.text.starts_with('-') {
                break;
            }
            let number = line.number;
            let rest = line.text[1..].trim_start().to_string();
            let rest_column = indent + 1 + (line.text.len() - line.text[1..].trim_start().len());
            self.pos += 1;
            if rest.is_empty() {
                // Nested block item.
                match self.current() {
                    Some(next) if next.indent > indent => {
                        let child_indent = next.indent;
                        items.push(self.parse_block(child_indent)?);
                    }
                    _ => {
                        return Err(parse_error(
                            "expected a value after \"-\"",
                            number,
                            indent + 1,
                        ))
                    }
                }
            } else {
                items.push(parse_flow(self.file, &rest, number, rest_column)?);
            }
        }
        Ok(Node::Sequence(SequenceNode { items, loc }))
    }

    fn parse_mapping(&mut self, indent: usize) -> Result<Node, IdlError> {
        let loc = {
            let line = self.current().unwrap();
            self.loc(line)
        };
        let mut entries = Vec::new();
        while let Some(line) = self.current() {
            if line.indent != indent {
                break;
            }
            if line.text.starts_with('-') {
                return Err(parse_error(
                    "unexpected sequence entry in mapping",
                    line.number,
                    line.indent + 1,
                ));
            }
            let number = line.number;
            let colon = match find_key_colon(&line.text) {
                Some(idx) => idx,
                None => {
                    return Err(parse_error(
                        format!("expected \"key: value\", found {:?}", line.text),
                        number,
                        indent + 1,
                    ))
                }
            };
            let key_text = unquote(&line.text[..colon]);
            if key_text.is_empty() {
                return Err(parse_error("empty mapping key", number, indent + 1));
            }
            let key = ScalarNode {
                value: key_text,
                loc: SourceLocation::new(self.file, number, indent + 1),
            };
            let after = &line.text[colon + 1..];
            let value_offset = indent + colon + 2 + (after.len() - after.trim_start().len());
            let rest = after.trim().to_string();
            self.pos += 1;
            let value = if !rest.is_empty() {
                parse_flow(self.file, &rest, number, value_offset + 1)?
            } else {
                match self.current() {
                    Some(next) if next.indent > indent => {
                        let child_indent = next.indent;
                        self.parse_block(child_indent)?
                    }
                    // A sequence may sit at the key's own indent level.
                    Some(next) if next.indent == indent && next.text.starts_with('-') => {
                        self.parse_sequence(indent)?
                    }
                    _ => Node::Scalar(ScalarNode {
                        value: String::new(),
                        loc: SourceLocation::new(self.file, number, indent + 1),
                    }),
                }
            };
            entries.push((key, value));
        }
        Ok(Node::Mapping(MappingNode { entries, loc }))
    }
}

/// Find the colon that terminates a mapping key, skipping quoted keys.
fn find_key_colon(text: &str) -> Option<usize> {
    let mut in_single = false;
    let mut in_double = false;
    for (idx, ch) in text.char_indices() {
        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            ':' if !in_single && !in_double => {
                let rest = &text[idx + 1..];
                if rest.is_empty() || rest.starts_with(' ') {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Load a document into the generic node tree.
///
/// The root of a non-empty document must be a block mapping; an empty
/// document loads as a mapping with no entries so the parser can report
/// missing sections itself.
pub fn load(file: &str, text: &str) -> Result<Node, IdlError> {
    let lines = scan_lines(text)?;
    if lines.is_empty() {
        return Ok(Node::Mapping(MappingNode {
            entries: Vec::new(),
            loc: SourceLocation::new(file, 1, 1),
        }));
    }
    let root_indent = lines[0].indent;
    if root_indent != 0 {
        return Err(parse_error(
            "root node must start at column 1",
            lines[0].number,
            root_indent + 1,
        ));
    }
    let mut loader = Loader {
        file,
        lines,
        pos: 0,
    };
    let node = loader.parse_block(0)?;
    if let Some(line) = loader.current() {
        return Err(parse_error(
            "trailing content after root node",
            line.number,
            line.indent + 1,
        ));
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_ok(text: &str) -> Node {
        load("test.idl", text).expect("load failed")
    }

    fn root_entries(node: &Node) -> &[(ScalarNode, Node)] {
        match node {
            Node::Mapping(m) => &m.entries,
            other => panic!("expected mapping root, got {}", other.kind_name()),
        }
    }

    #[test]
    fn test_load_scalar_mapping() {
        let node = load_ok("global:\n    cpp_namespace: mongo\n");
        let entries = root_entries(&node);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0.value, "global");
        assert_eq!(entries[0].0.loc.line, 1);
        let global = entries[0].1.as_mapping().unwrap();
        assert_eq!(global.entries[0].0.value, "cpp_namespace");
        assert_eq!(global.entries[0].1.as_scalar().unwrap().value, "mongo");
        assert_eq!(global.entries[0].1.loc().line, 2);
        assert_eq!(global.entries[0].1.loc().column, 20);
    }

    #[test]
    fn test_load_block_sequence() {
        let node = load_ok("global:\n    cpp_includes:\n        - \"first.h\"\n        - second.h\n");
        let entries = root_entries(&node);
        let global = entries[0].1.as_mapping().unwrap();
        match &global.entries[0].1 {
            Node::Sequence(seq) => {
                assert_eq!(seq.items.len(), 2);
                assert_eq!(seq.items[0].as_scalar().unwrap().value, "first.h");
                assert_eq!(seq.items[1].as_scalar().unwrap().value, "second.h");
            }
            other => panic!("expected sequence, got {}", other.kind_name()),
        }
    }

    #[test]
    fn test_load_flow_sequence() {
        let node = load_ok("type:\n    bson_serialization_type: [int, long]\n");
        let entries = root_entries(&node);
        let ty = entries[0].1.as_mapping().unwrap();
        match &ty.entries[0].1 {
            Node::Sequence(seq) => {
                assert_eq!(seq.items.len(), 2);
                assert_eq!(seq.items[0].as_scalar().unwrap().value, "int");
                assert_eq!(seq.items[1].as_scalar().unwrap().value, "long");
            }
            other => panic!("expected sequence, got {}", other.kind_name()),
        }
    }

    #[test]
    fn test_load_preserves_duplicate_keys() {
        let node = load_ok("type:\n    name: a\ntype:\n    name: b\n");
        let entries = root_entries(&node);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0.value, "type");
        assert_eq!(entries[1].0.value, "type");
    }

    #[test]
    fn test_load_comments_and_blank_lines() {
        let node = load_ok("# header\n\nglobal:\n    cpp_namespace: mongo # trailing\n");
        let entries = root_entries(&node);
        let global = entries[0].1.as_mapping().unwrap();
        assert_eq!(global.entries[0].1.as_scalar().unwrap().value, "mongo");
    }

    #[test]
    fn test_load_empty_value_is_empty_scalar() {
        let node = load_ok("struct:\n    fields:\n    name: foo\n");
        let entries = root_entries(&node);
        let s = entries[0].1.as_mapping().unwrap();
        assert_eq!(s.entries[0].0.value, "fields");
        assert_eq!(s.entries[0].1.as_scalar().unwrap().value, "");
        assert_eq!(s.entries[1].0.value, "name");
    }

    #[test]
    fn test_load_rejects_tab_indentation() {
        let err = load("test.idl", "global:\n\tcpp_namespace: mongo\n").unwrap_err();
        assert!(matches!(err, IdlError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_load_rejects_missing_colon() {
        let err = load("test.idl", "global\n").unwrap_err();
        assert!(matches!(err, IdlError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_load_empty_document() {
        let node = load_ok("");
        assert!(root_entries(&node).is_empty());
    }
}

//! Template rendering.
//!
//! The orchestrator only depends on [`TemplateRenderer`]; any engine can sit
//! behind it. [`PlaceholderRenderer`] is the engine shipped with the crate and
//! understands the subset of Velocity syntax used by the bundled templates:
//!
//! - `$name`, `${name}`, `$table.className` and quiet `$!{name}` references
//! - `#foreach($col in $table.columns) ... #end` with `$foreach.hasNext`,
//!   `$foreach.index`, `$foreach.count` and `$foreach.first`
//! - `#if($ref) ... #else ... #end`, negated with `#if(!$ref)`, or comparing
//!   against a string literal with `#if($ref == "UUID")` / `!=`
//! - `## comment` lines
//!
//! A directive alone on its line consumes the whole line. References that do
//! not resolve are written out verbatim, quiet ones render as nothing.

use regex::Regex;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::codegen::context::RenderContext;
use crate::codegen::fs_utils;
use crate::error::GenError;

/// Black-box template collaborator.
pub trait TemplateRenderer {
    /// Render `template` with `context` and write UTF-8 text to `output`,
    /// creating parent directories as needed.
    fn render(&self, output: &Path, template: &Path, context: &RenderContext) -> Result<(), GenError>;
}

/// Built-in renderer for the Velocity subset described in the module docs.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderRenderer;

impl PlaceholderRenderer {
    pub fn new() -> Self {
        PlaceholderRenderer
    }

    /// Render template source to a string.
    pub fn render_str(&self, source: &str, context: &RenderContext) -> Result<String, String> {
        let nodes = parse(source)?;
        let mut out = String::with_capacity(source.len());
        let mut scope = Scope {
            context,
            locals: Vec::new(),
        };
        render_nodes(&nodes, &mut scope, &mut out);
        Ok(out)
    }
}

impl TemplateRenderer for PlaceholderRenderer {
    fn render(&self, output: &Path, template: &Path, context: &RenderContext) -> Result<(), GenError> {
        let source = fs::read_to_string(template).map_err(|e| GenError::Render {
            path: template.to_path_buf(),
            reason: format!("Failed to read template: {}", e),
        })?;
        let text = self.render_str(&source, context).map_err(|reason| GenError::Render {
            path: template.to_path_buf(),
            reason,
        })?;
        fs_utils::write_file(output, text).map_err(|e| GenError::io(output, e))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Reference {
        path: Vec<String>,
        quiet: bool,
        raw: String,
    },
    Foreach {
        var: String,
        path: Vec<String>,
        body: Vec<Node>,
    },
    If {
        condition: Condition,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Condition {
    negate: bool,
    path: Vec<String>,
    /// `(equal, literal)` for `==` / `!=` comparisons.
    compare: Option<(bool, String)>,
}

impl Condition {
    fn holds(&self, value: Option<&Value>) -> bool {
        let result = match &self.compare {
            None => truthy(value),
            Some((equal, literal)) => {
                let text = match value {
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(Value::Null) | None => None,
                    Some(other) => Some(other.to_string()),
                };
                (text.as_deref() == Some(literal.as_str())) == *equal
            }
        };
        result != self.negate
    }
}

#[derive(Debug)]
enum Token {
    Text(String),
    Reference { path: Vec<String>, quiet: bool, raw: String },
    Foreach { var: String, path: Vec<String> },
    If(Condition),
    Else,
    End,
}

fn foreach_args() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*\$([A-Za-z_]\w*)\s+in\s+\$\{?([A-Za-z_][\w.]*)\}?\s*$").expect("static pattern is valid")
    })
}

fn if_args() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*(!)?\s*\$\{?([A-Za-z_][\w.]*)\}?\s*(?:(==|!=)\s*"([^"]*)")?\s*$"#).expect("static pattern is valid")
    })
}

fn split_path(path: &str) -> Vec<String> {
    path.split('.').map(str::to_string).collect()
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Try to read a directive at `at` (which points to `#`). Returns the token and the end offset.
fn read_directive(src: &str, at: usize) -> Result<Option<(Token, usize)>, String> {
    let rest = &src[at + 1..];
    for (keyword, braced) in [("else", "{else}"), ("end", "{end}")] {
        let len = if rest.starts_with(braced) {
            braced.len()
        } else if rest.starts_with(keyword)
            && !rest.as_bytes().get(keyword.len()).copied().is_some_and(is_ident)
        {
            keyword.len()
        } else {
            continue;
        };
        let token = if keyword == "else" { Token::Else } else { Token::End };
        return Ok(Some((token, at + 1 + len)));
    }

    for keyword in ["foreach", "if"] {
        let Some(after) = rest.strip_prefix(keyword) else {
            continue;
        };
        let after = after.trim_start_matches(|c| c == ' ' || c == '\t');
        if !after.starts_with('(') {
            continue;
        }
        let open = src.len() - after.len();
        let close = src[open..]
            .find(')')
            .map(|offset| open + offset)
            .ok_or_else(|| format!("Unclosed #{} directive", keyword))?;
        let args = &src[open + 1..close];

        let token = if keyword == "foreach" {
            let caps = foreach_args()
                .captures(args)
                .ok_or_else(|| format!("Malformed #foreach arguments: ({})", args))?;
            Token::Foreach {
                var: caps[1].to_string(),
                path: split_path(&caps[2]),
            }
        } else {
            let caps = if_args()
                .captures(args)
                .ok_or_else(|| format!("Malformed #if arguments: ({})", args))?;
            Token::If(Condition {
                negate: caps.get(1).is_some(),
                path: split_path(&caps[2]),
                compare: caps.get(3).map(|op| (op.as_str() == "==", caps[4].to_string())),
            })
        };
        return Ok(Some((token, close + 1)));
    }

    Ok(None)
}

/// Try to read a reference at `at` (which points to `$`).
fn read_reference(src: &str, at: usize) -> Option<(Token, usize)> {
    let bytes = src.as_bytes();
    let mut i = at + 1;
    let quiet = bytes.get(i) == Some(&b'!');
    if quiet {
        i += 1;
    }

    let (path, end) = if bytes.get(i) == Some(&b'{') {
        let close = i + src[i..].find('}')?;
        let inner = src[i + 1..close].trim();
        let valid = inner
            .split('.')
            .all(|seg| seg.bytes().next().is_some_and(is_ident_start) && seg.bytes().all(is_ident));
        if !valid {
            return None;
        }
        (inner.to_string(), close + 1)
    } else {
        if !bytes.get(i).copied().is_some_and(is_ident_start) {
            return None;
        }
        let start = i;
        loop {
            while bytes.get(i).copied().is_some_and(is_ident) {
                i += 1;
            }
            // only continue through a dot when another identifier follows
            if bytes.get(i) == Some(&b'.') && bytes.get(i + 1).copied().is_some_and(is_ident_start) {
                i += 1;
            } else {
                break;
            }
        }
        (src[start..i].to_string(), i)
    };

    Some((
        Token::Reference {
            path: split_path(&path),
            quiet,
            raw: src[at..end].to_string(),
        },
        end,
    ))
}

fn tokenize(src: &str) -> Result<Vec<Token>, String> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    let push_text = |tokens: &mut Vec<Token>, text: &str| {
        if !text.is_empty() {
            tokens.push(Token::Text(text.to_string()));
        }
    };

    while i < bytes.len() {
        match bytes[i] {
            b'#' if bytes.get(i + 1) == Some(&b'#') => {
                let line_start = src[..i].rfind('\n').map_or(0, |p| p + 1);
                let line_end = src[i..].find('\n').map_or(src.len(), |p| i + p);
                let standalone = line_start >= text_start && src[line_start..i].trim().is_empty();
                if standalone {
                    push_text(&mut tokens, &src[text_start..line_start]);
                    i = (line_end + 1).min(src.len());
                } else {
                    // an inline comment keeps its line break
                    push_text(&mut tokens, &src[text_start..i]);
                    i = line_end;
                }
                text_start = i;
            }
            b'#' => match read_directive(src, i)? {
                Some((token, end)) => {
                    let line_start = src[..i].rfind('\n').map_or(0, |p| p + 1);
                    let line_end = src[end..].find('\n').map_or(src.len(), |p| end + p);
                    let standalone = line_start >= text_start
                        && src[line_start..i].trim().is_empty()
                        && src[end..line_end].trim().is_empty();
                    if standalone {
                        push_text(&mut tokens, &src[text_start..line_start]);
                        i = (line_end + 1).min(src.len());
                    } else {
                        push_text(&mut tokens, &src[text_start..i]);
                        i = end;
                    }
                    tokens.push(token);
                    text_start = i;
                }
                None => i += 1,
            },
            b'$' => match read_reference(src, i) {
                Some((token, end)) => {
                    push_text(&mut tokens, &src[text_start..i]);
                    tokens.push(token);
                    i = end;
                    text_start = i;
                }
                None => i += 1,
            },
            _ => i += 1,
        }
    }
    push_text(&mut tokens, &src[text_start..]);
    Ok(tokens)
}

enum Frame {
    Root(Vec<Node>),
    Foreach {
        var: String,
        path: Vec<String>,
        body: Vec<Node>,
    },
    If {
        condition: Condition,
        then: Vec<Node>,
        otherwise: Vec<Node>,
        in_else: bool,
    },
}

impl Frame {
    fn nodes(&mut self) -> &mut Vec<Node> {
        match self {
            Frame::Root(nodes) => nodes,
            Frame::Foreach { body, .. } => body,
            Frame::If {
                then,
                otherwise,
                in_else,
                ..
            } => {
                if *in_else {
                    otherwise
                } else {
                    then
                }
            }
        }
    }
}

fn parse(src: &str) -> Result<Vec<Node>, String> {
    let mut stack = vec![Frame::Root(Vec::new())];

    for token in tokenize(src)? {
        match token {
            Token::Text(text) => push_node(&mut stack, Node::Text(text)),
            Token::Reference { path, quiet, raw } => push_node(&mut stack, Node::Reference { path, quiet, raw }),
            Token::Foreach { var, path } => stack.push(Frame::Foreach {
                var,
                path,
                body: Vec::new(),
            }),
            Token::If(condition) => stack.push(Frame::If {
                condition,
                then: Vec::new(),
                otherwise: Vec::new(),
                in_else: false,
            }),
            Token::Else => match stack.last_mut() {
                Some(Frame::If { in_else, .. }) if !*in_else => *in_else = true,
                _ => return Err("#else without matching #if".to_string()),
            },
            Token::End => {
                let node = match stack.pop() {
                    Some(Frame::Foreach { var, path, body }) => Node::Foreach { var, path, body },
                    Some(Frame::If {
                        condition,
                        then,
                        otherwise,
                        ..
                    }) => Node::If {
                        condition,
                        then,
                        otherwise,
                    },
                    _ => return Err("#end without matching #foreach or #if".to_string()),
                };
                push_node(&mut stack, node);
            }
        }
    }

    match stack.pop() {
        Some(Frame::Root(nodes)) if stack.is_empty() => Ok(nodes),
        _ => Err("Unclosed #foreach or #if block".to_string()),
    }
}

fn push_node(stack: &mut [Frame], node: Node) {
    if let Some(frame) = stack.last_mut() {
        frame.nodes().push(node);
    }
}

struct Scope<'a> {
    context: &'a RenderContext,
    locals: Vec<(String, Value)>,
}

impl Scope<'_> {
    fn lookup(&self, path: &[String]) -> Option<&Value> {
        let (head, rest) = path.split_first()?;
        let root = self
            .locals
            .iter()
            .rev()
            .find(|(name, _)| name == head)
            .map(|(_, value)| value)
            .or_else(|| self.context.get(head))?;

        rest.iter().try_fold(root, |value, segment| match value {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|idx| items.get(idx)),
            _ => None,
        })
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(_)) => true,
    }
}

fn render_nodes(nodes: &[Node], scope: &mut Scope<'_>, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Reference { path, quiet, raw } => match scope.lookup(path) {
                Some(Value::String(s)) => out.push_str(s),
                Some(Value::Null) | None => {
                    if !quiet {
                        out.push_str(raw);
                    }
                }
                Some(other) => out.push_str(&other.to_string()),
            },
            Node::Foreach { var, path, body } => {
                let items = match scope.lookup(path) {
                    Some(Value::Array(items)) => items.clone(),
                    _ => Vec::new(),
                };
                let total = items.len();
                for (index, item) in items.into_iter().enumerate() {
                    let status = json!({
                        "index": index,
                        "count": index + 1,
                        "first": index == 0,
                        "hasNext": index + 1 < total,
                    });
                    scope.locals.push(("foreach".to_string(), status));
                    scope.locals.push((var.clone(), item));
                    render_nodes(body, scope, out);
                    scope.locals.pop();
                    scope.locals.pop();
                }
            }
            Node::If {
                condition,
                then,
                otherwise,
            } => {
                let branch = if condition.holds(scope.lookup(&condition.path)) {
                    then
                } else {
                    otherwise
                };
                render_nodes(branch, scope, out);
            }
        }
    }
}

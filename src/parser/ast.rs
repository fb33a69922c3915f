use crate::lexer::Comment;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Represents a position in the source code, both fields are 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourcePosition {
    pub line: usize,
    pub column: usize,
}

/// Represents a span in the source code (start and end positions)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpan {
    pub start: SourcePosition,
    pub end: SourcePosition,
}

impl SourceSpan {
    pub fn new(start: SourcePosition, end: SourcePosition) -> Self {
        Self { start, end }
    }

    /// Zero width span at `position`
    pub fn point(position: SourcePosition) -> Self {
        Self { start: position, end: position }
    }
}

/// A span tied to the file it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: Arc<str>,
    pub span: SourceSpan,
}

impl SourceLocation {
    pub fn new(file: Arc<str>, span: SourceSpan) -> Self {
        Self { file, span }
    }

    pub fn line(&self) -> usize {
        self.span.start.line
    }

    pub fn column(&self) -> usize {
        self.span.start.column
    }
}

impl Ord for SourceLocation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.file
            .cmp(&other.file)
            .then(self.span.start.cmp(&other.span.start))
            .then(self.span.end.cmp(&other.span.end))
    }
}

impl PartialOrd for SourceLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line(), self.column())
    }
}

/// The structural kinds of block a spec file is made of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Describe,
    Context,
    It,
    Let,
    Before,
    Subject,
    SharedExample,
}

impl NodeKind {
    /// Maps a block opener to its kind, `None` for anything that is not structural
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let kind = match keyword {
            "describe" | "xdescribe" | "fdescribe" | "feature" => NodeKind::Describe,
            "context" | "xcontext" | "fcontext" => NodeKind::Context,
            "it" | "specify" | "example" | "scenario" | "its" | "xit" | "fit" | "xspecify"
            | "fspecify" | "xexample" | "fexample" | "xscenario" | "fscenario" | "pending" => {
                NodeKind::It
            }
            "let" | "let!" | "given" | "given!" => NodeKind::Let,
            "before" | "after" | "around" | "prepend_before" | "append_before"
            | "prepend_after" | "append_after" | "background" => NodeKind::Before,
            "subject" | "subject!" => NodeKind::Subject,
            "shared_examples" | "shared_examples_for" | "shared_context" => {
                NodeKind::SharedExample
            }
            _ => return None,
        };
        Some(kind)
    }

    /// Example groups are the kinds that own examples
    pub fn is_group(self) -> bool {
        matches!(
            self,
            NodeKind::Describe | NodeKind::Context | NodeKind::SharedExample
        )
    }

    pub fn requires_label(self) -> bool {
        self.is_group()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Describe => "describe",
            NodeKind::Context => "context",
            NodeKind::It => "example",
            NodeKind::Let => "let",
            NodeKind::Before => "hook",
            NodeKind::Subject => "subject",
            NodeKind::SharedExample => "shared example group",
        };
        f.write_str(name)
    }
}

/// Lexical classification of a block label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Empty,
    /// free form string description
    Description,
    /// `"#save"`
    InstanceMethod,
    /// `".find"` or `"::find"`
    ClassMethod,
    /// a constant path, `User` or `Admin::User`
    Constant,
    Symbol,
    Expression,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub text: String,
    pub kind: LabelKind,
}

impl Label {
    pub fn empty() -> Self {
        Self { text: String::new(), kind: LabelKind::Empty }
    }

    /// Classifies a string literal label, method names are recognised by their prefix only
    pub fn from_description(text: &str) -> Self {
        let kind = if text.starts_with('#') {
            LabelKind::InstanceMethod
        } else if text.starts_with('.') || text.starts_with("::") {
            LabelKind::ClassMethod
        } else {
            LabelKind::Description
        };
        Self { text: text.to_string(), kind }
    }

    pub fn is_empty(&self) -> bool {
        self.kind == LabelKind::Empty
    }

    pub fn is_method_name(&self) -> bool {
        matches!(self.kind, LabelKind::InstanceMethod | LabelKind::ClassMethod)
    }
}

/// The loop or enumeration a node was generated inside of
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Iteration {
    /// `each`, `times`, `for`, ...
    pub method: String,
    pub location: SourceLocation,
}

/// What a method call was sent to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receiver {
    /// implicit self
    None,
    /// a plain constant or method chain such as `User.any_instance`
    Path(String),
    /// anything more complex, like the result of `expect(x)`
    Expression,
}

impl Receiver {
    /// First segment of a path receiver, `User` for `User.any_instance`
    pub fn root(&self) -> Option<&str> {
        match self {
            Receiver::Path(path) => path.split('.').next(),
            _ => None,
        }
    }
}

/// A reference to an identifier inside a statement, Ruby makes no distinction
/// between local variables and method calls at this level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub name: String,
    pub receiver: Receiver,
    /// rendered text of the first argument when it is passed in parentheses
    /// or as a single literal
    pub first_arg: Option<String>,
    pub position: SourcePosition,
}

impl CallSite {
    /// First argument with surrounding quotes removed, `"User"` becomes `User`
    pub fn first_arg_unquoted(&self) -> Option<&str> {
        self.first_arg
            .as_deref()
            .map(|arg| arg.trim_matches(|c| c == '"' || c == '\''))
    }
}

/// A non-structural statement in a block body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub calls: Vec<CallSite>,
    /// statements of blocks attached to this statement, e.g. `aggregate_failures do ... end`
    pub nested: Vec<Statement>,
    pub location: SourceLocation,
}

impl Statement {
    /// The call a statement starts with
    pub fn head(&self) -> Option<&CallSite> {
        self.calls.first()
    }

    pub fn calls_named(&self, name: &str) -> bool {
        self.calls.iter().any(|call| call.name == name)
    }

    /// This statement and every nested statement, depth first
    pub fn walk(&self) -> Vec<&Statement> {
        let mut all = vec![self];
        for nested in &self.nested {
            all.extend(nested.walk());
        }
        all
    }
}

/// A structural block of a spec file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    /// the opener as written, `RSpec.describe`, `let!`, `xit`
    pub keyword: String,
    pub label: Label,
    /// the arguments after the label, rendered as text
    pub metadata: Vec<String>,
    pub children: Vec<Node>,
    pub body: Vec<Statement>,
    pub iteration: Option<Iteration>,
    pub location: SourceLocation,
}

impl Node {
    pub fn children_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.children.iter().filter(move |child| child.kind == kind)
    }

    pub fn has_metadata(&self, needle: &str) -> bool {
        self.metadata.iter().any(|meta| meta == needle)
    }

    /// Every statement in this node and its descendants, nested blocks included
    pub fn all_statements(&self) -> Vec<&Statement> {
        let mut all = Vec::new();
        for statement in &self.body {
            all.extend(statement.walk());
        }
        for child in &self.children {
            all.extend(child.all_statements());
        }
        all
    }

    /// Depth first iterator over this node and its descendants
    pub fn descendants(&self) -> Vec<&Node> {
        let mut all = vec![self];
        for child in &self.children {
            all.extend(child.descendants());
        }
        all
    }
}

/// The root of a parsed spec file, owns all top-level nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecTree {
    pub file: Arc<str>,
    pub nodes: Vec<Node>,
    /// statements outside any structural block, `require "rails_helper"` and friends
    pub statements: Vec<Statement>,
    pub comments: Vec<Comment>,
}

impl SpecTree {
    pub fn node_count(&self) -> usize {
        self.nodes.iter().map(|node| node.descendants().len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(file: &str, line: usize, column: usize) -> SourceLocation {
        let position = SourcePosition { line, column };
        SourceLocation::new(Arc::from(file), SourceSpan::point(position))
    }

    #[test]
    fn label_classification() {
        assert_eq!(Label::from_description("#save").kind, LabelKind::InstanceMethod);
        assert_eq!(Label::from_description(".find").kind, LabelKind::ClassMethod);
        assert_eq!(Label::from_description("::find").kind, LabelKind::ClassMethod);
        assert_eq!(
            Label::from_description("when logged in").kind,
            LabelKind::Description
        );
    }

    #[test]
    fn locations_order_by_file_then_line_then_column() {
        let mut locations = vec![
            location("b_spec.rb", 1, 1),
            location("a_spec.rb", 3, 1),
            location("a_spec.rb", 2, 9),
            location("a_spec.rb", 2, 3),
        ];
        locations.sort();
        let rendered: Vec<String> = locations.iter().map(|l| l.to_string()).collect();
        assert_eq!(
            rendered,
            vec!["a_spec.rb:2:3", "a_spec.rb:2:9", "a_spec.rb:3:1", "b_spec.rb:1:1"]
        );
    }

    #[test]
    fn keyword_mapping() {
        assert_eq!(NodeKind::from_keyword("xit"), Some(NodeKind::It));
        assert_eq!(NodeKind::from_keyword("let!"), Some(NodeKind::Let));
        assert_eq!(NodeKind::from_keyword("shared_context"), Some(NodeKind::SharedExample));
        assert_eq!(NodeKind::from_keyword("expect"), None);
    }

    #[test]
    fn receiver_root() {
        assert_eq!(Receiver::Path("User.any_instance".into()).root(), Some("User"));
        assert_eq!(Receiver::Expression.root(), None);
    }
}

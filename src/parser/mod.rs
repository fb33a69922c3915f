use crate::SyntaxError;
use crate::lexer::{Lexer, SpannedToken, Token};
use crate::parser::ast::*;
use crate::parser::calls::{collect_calls, render_tokens};
use std::sync::Arc;

pub mod ast;
pub(crate) mod calls;

/// Methods whose blocks run once per element, examples defined inside them are generated
const ITERATOR_METHODS: &[&str] = &[
    "each",
    "each_with_index",
    "each_with_object",
    "each_pair",
    "each_key",
    "each_value",
    "each_slice",
    "each_cons",
    "map",
    "flat_map",
    "collect",
    "times",
    "upto",
    "downto",
    "step",
    "loop",
    "product",
];

/// Tokenizes and parses a spec file into its tree of example groups
pub fn parse(source: &str, file: Arc<str>) -> Result<SpecTree, SyntaxError> {
    let mut lexer = Lexer::new(source, file.clone());
    let tokens = lexer.tokenize()?;
    let mut parser = Parser::new(tokens, file);
    let mut tree = parser.parse_program()?;
    tree.comments = lexer.take_comments();
    Ok(tree)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminator {
    End,
    RightBrace,
    Eof,
}

impl Terminator {
    fn describe(self) -> &'static str {
        match self {
            Terminator::End => "`end`",
            Terminator::RightBrace => "`}`",
            Terminator::Eof => "end of file",
        }
    }
}

/// Nodes and statements collected while parsing one block body
#[derive(Debug, Default)]
struct Body {
    children: Vec<Node>,
    statements: Vec<Statement>,
}

pub struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    file: Arc<str>,
    /// set after `while`, `until` and `for`, whose header may end in an optional `do`
    loop_header_do: bool,
}

impl Parser {
    pub fn new(tokens: Vec<SpannedToken>, file: Arc<str>) -> Self {
        Parser { tokens, pos: 0, file, loop_header_do: false }
    }

    fn current(&self) -> &SpannedToken {
        // the lexer always ends the stream with EOF
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn peek(&self, offset: usize) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.pos + offset).min(last)].token
    }

    fn advance(&mut self) -> SpannedToken {
        let token = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn location(&self, start: SourcePosition, end: SourcePosition) -> SourceLocation {
        SourceLocation::new(self.file.clone(), SourceSpan::new(start, end))
    }

    fn error_at(&self, position: SourcePosition, reason: impl Into<String>) -> SyntaxError {
        SyntaxError::new(&self.file, position, reason)
    }

    fn unexpected(&self, spanned: &SpannedToken) -> SyntaxError {
        self.error_at(spanned.start, format!("unexpected `{}`", spanned.token))
    }

    fn unclosed(&self, opener: &SpannedToken) -> SyntaxError {
        self.error_at(opener.start, format!("`{}` opened here is never closed", opener.token))
    }

    fn unterminated(&self, opener: &SpannedToken, terminator: Terminator) -> SyntaxError {
        self.error_at(
            opener.start,
            format!(
                "`{}` opened here is never closed with {}",
                opener.token,
                terminator.describe()
            ),
        )
    }

    pub fn parse_program(&mut self) -> Result<SpecTree, SyntaxError> {
        let body = self.parse_body(Terminator::Eof, None, None)?;
        Ok(SpecTree {
            file: self.file.clone(),
            nodes: body.children,
            statements: body.statements,
            comments: Vec::new(),
        })
    }

    fn parse_body(
        &mut self,
        terminator: Terminator,
        opener: Option<&SpannedToken>,
        iteration: Option<&Iteration>,
    ) -> Result<Body, SyntaxError> {
        let mut body = Body::default();

        loop {
            let current = self.current().clone();
            match &current.token {
                Token::Newline | Token::Semicolon => {
                    self.advance();
                }
                // clause keywords only split the statements of the enclosing construct
                Token::Else
                | Token::Elsif
                | Token::When
                | Token::Rescue
                | Token::Ensure
                | Token::Then
                | Token::In => {
                    self.advance();
                }
                Token::End if terminator == Terminator::End => return Ok(body),
                Token::RightBrace if terminator == Terminator::RightBrace => return Ok(body),
                Token::EOF if terminator == Terminator::Eof => return Ok(body),
                Token::End | Token::RightBrace => return Err(self.unexpected(&current)),
                Token::EOF => {
                    return Err(match opener {
                        Some(opener) => self.unterminated(opener, terminator),
                        None => self.unexpected(&current),
                    });
                }
                _ => match self.parse_node(iteration)? {
                    Some(node) => body.children.push(node),
                    None => self.parse_statement(&mut body, iteration)?,
                },
            }
        }
    }

    /// Parses a structural block if one starts here, restoring the position otherwise
    fn parse_node(&mut self, iteration: Option<&Iteration>) -> Result<Option<Node>, SyntaxError> {
        let checkpoint = self.pos;
        let start = self.current().start;
        let mut keyword = String::new();

        if self.current().token == Token::DoubleColon
            && matches!(self.peek(1), Token::Constant(name) if name == "RSpec")
        {
            self.advance();
            keyword.push_str("::");
        }
        if matches!(&self.current().token, Token::Constant(name) if name == "RSpec")
            && *self.peek(1) == Token::Dot
        {
            self.advance();
            self.advance();
            keyword.push_str("RSpec.");
        }

        let kind = match &self.current().token {
            Token::Identifier(name) => NodeKind::from_keyword(name).map(|kind| (kind, name.clone())),
            _ => None,
        };
        let Some((kind, name)) = kind else {
            self.pos = checkpoint;
            return Ok(None);
        };

        // `subject.name`, `let = 1`, `it[0]` are references, not definitions
        if matches!(
            self.peek(1),
            Token::Dot
                | Token::SafeNav
                | Token::Assign
                | Token::Operator(_)
                | Token::LeftBracket
                | Token::DoubleColon
                | Token::Comma
                | Token::RightParen
                | Token::RightBracket
                | Token::Arrow
        ) {
            self.pos = checkpoint;
            return Ok(None);
        }

        let keyword_token = self.advance();
        keyword.push_str(&name);
        let arguments = self.parse_arguments()?;

        let terminator = match self.current().token {
            Token::Do => Some(Terminator::End),
            Token::LeftBrace => Some(Terminator::RightBrace),
            _ => None,
        };

        // only examples may be declared without a block, as pending. A bare
        // `pending "reason"` marks the surrounding example instead
        if terminator.is_none()
            && (kind != NodeKind::It || arguments.is_empty() || name == "pending")
        {
            self.pos = checkpoint;
            return Ok(None);
        }

        let (label, metadata) = label_and_metadata(&arguments);
        if kind.requires_label() && label.is_empty() {
            return Err(self.error_at(
                keyword_token.start,
                format!("`{}` requires a label", keyword),
            ));
        }

        let mut node = Node {
            kind,
            keyword,
            label,
            metadata,
            children: Vec::new(),
            body: Vec::new(),
            iteration: iteration.cloned(),
            location: self.location(start, keyword_token.end),
        };

        match terminator {
            Some(terminator) => {
                let opener = self.advance();
                self.skip_block_parameters()?;
                let body = self.parse_body(terminator, Some(&opener), iteration)?;
                let closing = self.advance();
                node.children = body.children;
                node.body = body.statements;
                node.location = self.location(start, closing.end);
            }
            None => {
                let end = arguments
                    .last()
                    .and_then(|argument| argument.last())
                    .map(|token| token.end)
                    .unwrap_or(keyword_token.end);
                node.location = self.location(start, end);
            }
        }

        Ok(Some(node))
    }

    /// Arguments of a structural call, split on top level commas, stopping before its block
    fn parse_arguments(&mut self) -> Result<Vec<Vec<SpannedToken>>, SyntaxError> {
        let mut arguments = Vec::new();
        let mut argument: Vec<SpannedToken> = Vec::new();
        let mut depth = 0usize;

        if self.current().token == Token::LeftParen {
            let opener = self.advance();
            loop {
                let current = self.current().clone();
                match &current.token {
                    Token::EOF => return Err(self.unclosed(&opener)),
                    Token::RightParen if depth == 0 => {
                        self.advance();
                        break;
                    }
                    Token::Comma if depth == 0 => {
                        arguments.push(std::mem::take(&mut argument));
                        self.advance();
                        continue;
                    }
                    Token::Newline => {
                        self.advance();
                        continue;
                    }
                    Token::LeftParen | Token::LeftBracket | Token::LeftBrace => depth += 1,
                    Token::RightParen | Token::RightBracket | Token::RightBrace => {
                        depth = depth.saturating_sub(1)
                    }
                    _ => {}
                }
                argument.push(self.advance());
            }
        } else {
            loop {
                let current = self.current().clone();
                let at_top = depth == 0;
                match &current.token {
                    Token::EOF => break,
                    Token::Newline if at_top => {
                        let trailing_comma = matches!(
                            argument.last().map(|t| &t.token),
                            None if !arguments.is_empty()
                        );
                        if !trailing_comma {
                            break;
                        }
                        self.advance();
                        continue;
                    }
                    Token::Newline => {
                        self.advance();
                        continue;
                    }
                    Token::Semicolon
                    | Token::Do
                    | Token::End
                    | Token::RightBrace
                    | Token::RightParen
                    | Token::RightBracket
                        if at_top =>
                    {
                        break;
                    }
                    Token::LeftBrace if at_top => {
                        let hash = match argument.last().map(|t| &t.token) {
                            None => !arguments.is_empty(),
                            Some(previous) => matches!(
                                previous,
                                Token::HashKey(_)
                                    | Token::Comma
                                    | Token::Arrow
                                    | Token::Assign
                                    | Token::Operator(_)
                            ),
                        };
                        if !hash {
                            break;
                        }
                        depth += 1;
                    }
                    Token::Comma if at_top => {
                        arguments.push(std::mem::take(&mut argument));
                        self.advance();
                        continue;
                    }
                    Token::LeftParen | Token::LeftBracket | Token::LeftBrace => depth += 1,
                    Token::RightParen | Token::RightBracket | Token::RightBrace => depth -= 1,
                    _ => {}
                }
                argument.push(self.advance());
            }
        }

        if !argument.is_empty() {
            arguments.push(argument);
        }
        Ok(arguments)
    }

    /// Skips `|a, (b, c)|` after a block opener
    fn skip_block_parameters(&mut self) -> Result<(), SyntaxError> {
        if matches!(&self.current().token, Token::Operator(op) if op == "||") {
            self.advance();
            return Ok(());
        }
        if self.current().token != Token::Pipe {
            return Ok(());
        }

        let opener = self.advance();
        loop {
            match self.current().token {
                Token::Pipe => {
                    self.advance();
                    return Ok(());
                }
                Token::EOF => return Err(self.unclosed(&opener)),
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// A newline does not end the statement after a binary operator, a comma or a dot,
    /// nor when the next line starts with `.method`
    fn continues_statement(&self, last: Option<&SpannedToken>) -> bool {
        let dangling = last.is_some_and(|last| {
            matches!(
                last.token,
                Token::Operator(_)
                    | Token::Comma
                    | Token::Dot
                    | Token::SafeNav
                    | Token::DoubleColon
                    | Token::Assign
                    | Token::Arrow
                    | Token::HashKey(_)
            )
        });
        if dangling {
            return true;
        }

        let mut offset = 0;
        while *self.peek(offset) == Token::Newline {
            offset += 1;
        }
        matches!(self.peek(offset), Token::Dot | Token::SafeNav)
    }

    /// `if`, `while` and friends open a construct only where an expression starts,
    /// after a value they are modifiers
    fn opens_construct(previous: Option<&SpannedToken>) -> bool {
        match previous {
            None => true,
            Some(previous) => matches!(
                previous.token,
                Token::Assign
                    | Token::Operator(_)
                    | Token::LeftParen
                    | Token::LeftBracket
                    | Token::LeftBrace
                    | Token::Comma
                    | Token::Arrow
                    | Token::HashKey(_)
                    | Token::Pipe
                    | Token::Lambda
            ),
        }
    }

    /// `def name(args) = expr` has no `end`
    fn is_endless_def(&self) -> bool {
        let mut depth = 0usize;
        let mut offset = 1;
        loop {
            match self.peek(offset) {
                Token::Newline | Token::Semicolon | Token::EOF => return false,
                Token::LeftParen => depth += 1,
                Token::RightParen => depth = depth.saturating_sub(1),
                Token::Assign if depth == 0 => {
                    let before = self.peek(offset - 1);
                    let after = self.peek(offset + 1);
                    return *before == Token::RightParen
                        || (matches!(before, Token::Identifier(_)) && *after != Token::LeftParen);
                }
                _ => {}
            }
            offset += 1;
        }
    }

    fn iteration_for(&self, callee: Option<&str>, opener: &SpannedToken) -> Option<Iteration> {
        let method = callee?;
        ITERATOR_METHODS.contains(&method).then(|| Iteration {
            method: method.to_string(),
            location: self.location(opener.start, opener.end),
        })
    }

    /// Parses the body of a non-structural block, hoisting nodes into `body`
    fn parse_nested_block(
        &mut self,
        terminator: Terminator,
        iteration: Option<&Iteration>,
        body: &mut Body,
        nested: &mut Vec<Statement>,
    ) -> Result<SpannedToken, SyntaxError> {
        let opener = self.advance();
        self.skip_block_parameters()?;
        let inner = self.parse_body(terminator, Some(&opener), iteration)?;
        let closing = self.advance();
        body.children.extend(inner.children);
        nested.extend(inner.statements);
        Ok(closing)
    }

    fn parse_statement(
        &mut self,
        body: &mut Body,
        iteration: Option<&Iteration>,
    ) -> Result<(), SyntaxError> {
        let start = self.current().start;
        let mut end = start;
        // statement level tokens, the insides of blocks are parsed separately
        let mut tokens: Vec<SpannedToken> = Vec::new();
        let mut nested: Vec<Statement> = Vec::new();
        // open brackets with the call that owns them
        let mut groups: Vec<(SpannedToken, Option<String>)> = Vec::new();
        let mut last_callee: Option<String> = None;

        loop {
            let current = self.current().clone();
            let at_top = groups.is_empty();
            match &current.token {
                Token::EOF => {
                    if let Some((opener, _)) = groups.last() {
                        return Err(self.unclosed(opener));
                    }
                    break;
                }
                Token::Newline | Token::Semicolon if at_top => {
                    if self.continues_statement(tokens.last()) {
                        self.advance();
                        continue;
                    }
                    self.loop_header_do = false;
                    break;
                }
                Token::Newline => {
                    self.advance();
                    continue;
                }
                Token::End | Token::RightBrace if at_top => break,
                Token::Else
                | Token::Elsif
                | Token::When
                | Token::Rescue
                | Token::Ensure
                | Token::Then
                | Token::In
                    if at_top =>
                {
                    break;
                }
                Token::End => return Err(self.unexpected(&current)),
                Token::Do if self.loop_header_do => {
                    self.advance();
                    self.loop_header_do = false;
                    break;
                }
                Token::Do => {
                    let callee = match tokens.last().map(|t| &t.token) {
                        Some(Token::Identifier(name)) => Some(name.clone()),
                        Some(Token::RightParen) => last_callee.take(),
                        _ => None,
                    };
                    let inner = self.iteration_for(callee.as_deref(), &current);
                    let closing = self.parse_nested_block(
                        Terminator::End,
                        inner.as_ref().or(iteration),
                        body,
                        &mut nested,
                    )?;
                    end = closing.end;
                    tokens.push(current);
                    tokens.push(closing);
                    continue;
                }
                Token::LeftBrace
                    if matches!(
                        tokens.last().map(|t| &t.token),
                        Some(Token::Identifier(_) | Token::RightParen | Token::Lambda)
                    ) =>
                {
                    let callee = match tokens.last().map(|t| &t.token) {
                        Some(Token::Identifier(name)) => Some(name.clone()),
                        Some(Token::RightParen) => last_callee.take(),
                        _ => None,
                    };
                    let inner = self.iteration_for(callee.as_deref(), &current);
                    let closing = self.parse_nested_block(
                        Terminator::RightBrace,
                        inner.as_ref().or(iteration),
                        body,
                        &mut nested,
                    )?;
                    end = closing.end;
                    tokens.push(current);
                    tokens.push(closing);
                    continue;
                }
                Token::LeftParen | Token::LeftBracket | Token::LeftBrace => {
                    let owner = match tokens.last().map(|t| &t.token) {
                        Some(Token::Identifier(name)) => Some(name.clone()),
                        _ => None,
                    };
                    groups.push((current.clone(), owner));
                }
                Token::RightParen | Token::RightBracket | Token::RightBrace => {
                    let expected = match groups.pop() {
                        Some((opener, owner)) => {
                            last_callee = owner;
                            match opener.token {
                                Token::LeftParen => Token::RightParen,
                                Token::LeftBracket => Token::RightBracket,
                                _ => Token::RightBrace,
                            }
                        }
                        None => return Err(self.unexpected(&current)),
                    };
                    if expected != current.token {
                        return Err(self.unexpected(&current));
                    }
                }
                Token::If
                | Token::Unless
                | Token::While
                | Token::Until
                | Token::Case
                | Token::Begin
                | Token::Def
                | Token::Class
                | Token::Module
                | Token::For
                    if Self::opens_construct(tokens.last()) =>
                {
                    if current.token == Token::Def && self.is_endless_def() {
                        tokens.push(self.advance());
                        continue;
                    }
                    let opener = self.advance();
                    if matches!(opener.token, Token::While | Token::Until | Token::For) {
                        self.loop_header_do = true;
                    }
                    let for_loop = (opener.token == Token::For).then(|| Iteration {
                        method: "for".to_string(),
                        location: self.location(opener.start, opener.end),
                    });
                    let inner = self.parse_body(
                        Terminator::End,
                        Some(&opener),
                        for_loop.as_ref().or(iteration),
                    )?;
                    let closing = self.advance();
                    body.children.extend(inner.children);
                    nested.extend(inner.statements);
                    end = closing.end;
                    tokens.push(opener);
                    tokens.push(closing);
                    continue;
                }
                _ => {}
            }
            end = current.end;
            tokens.push(self.advance());
        }

        if !tokens.is_empty() || !nested.is_empty() {
            body.statements.push(Statement {
                calls: collect_calls(&tokens),
                nested,
                location: self.location(start, end),
            });
        }
        Ok(())
    }
}

/// Splits structural call arguments into the label and the rest
fn label_and_metadata(arguments: &[Vec<SpannedToken>]) -> (Label, Vec<String>) {
    let Some(first) = arguments.first() else {
        return (Label::empty(), Vec::new());
    };

    // `it focus: true do` has metadata but no label
    if matches!(first.first().map(|t| &t.token), Some(Token::HashKey(_) | Token::Arrow)) {
        return (Label::empty(), arguments.iter().map(|a| render_tokens(a)).collect());
    }

    let label = match first.as_slice() {
        [] => Label::empty(),
        [single] => match &single.token {
            Token::StringLiteral(text) => Label::from_description(text),
            Token::Symbol(name) => Label { text: name.clone(), kind: LabelKind::Symbol },
            Token::Constant(name) => Label { text: name.clone(), kind: LabelKind::Constant },
            _ => Label { text: render_tokens(first), kind: LabelKind::Expression },
        },
        many if many
            .iter()
            .all(|t| matches!(t.token, Token::Constant(_) | Token::DoubleColon)) =>
        {
            Label { text: render_tokens(first), kind: LabelKind::Constant }
        }
        _ => Label { text: render_tokens(first), kind: LabelKind::Expression },
    };

    let metadata = arguments[1..].iter().map(|a| render_tokens(a)).collect();
    (label, metadata)
}

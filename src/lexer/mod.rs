use crate::SyntaxError;
use crate::parser::ast::SourcePosition;
use std::fmt;
use std::sync::Arc;

#[derive(PartialEq, Debug, Clone)]
pub enum Token {
    // Keywords that open or split `end` terminated constructs
    Do,
    End,
    If,
    Unless,
    While,
    Until,
    Case,
    Begin,
    Def,
    Class,
    Module,
    For,
    In,
    Then,
    Else,
    Elsif,
    When,
    Rescue,
    Ensure,

    // Identifiers and literals
    Identifier(String),
    Constant(String),
    /// `@ivar`, `@@cvar`, `$global`
    Variable(String),
    /// `key:` in a hash or keyword argument
    HashKey(String),
    Symbol(String),
    StringLiteral(String),
    /// `%w[...]` and `%i[...]`
    WordList(Vec<String>),
    NumberLiteral(String),
    Regex(String),

    // Punctuation
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Comma,
    Dot,
    /// `&.`
    SafeNav,
    DoubleColon,
    Pipe,
    Semicolon,
    /// `=>`
    Arrow,
    /// `->`
    Lambda,
    Assign,
    Operator(String),

    Newline,
    EOF,
}

impl Token {
    /// Tokens after which a `/`, `{` or `if` continues an expression instead of starting one
    pub fn ends_value(&self) -> bool {
        matches!(
            self,
            Token::Identifier(_)
                | Token::Constant(_)
                | Token::Variable(_)
                | Token::Symbol(_)
                | Token::StringLiteral(_)
                | Token::WordList(_)
                | Token::NumberLiteral(_)
                | Token::Regex(_)
                | Token::RightParen
                | Token::RightBracket
                | Token::RightBrace
                | Token::End
        )
    }

    fn keyword(word: &str) -> Option<Token> {
        let token = match word {
            "do" => Token::Do,
            "end" => Token::End,
            "if" => Token::If,
            "unless" => Token::Unless,
            "while" => Token::While,
            "until" => Token::Until,
            "case" => Token::Case,
            "begin" => Token::Begin,
            "def" => Token::Def,
            "class" => Token::Class,
            "module" => Token::Module,
            "for" => Token::For,
            "in" => Token::In,
            "then" => Token::Then,
            "else" => Token::Else,
            "elsif" => Token::Elsif,
            "when" => Token::When,
            "rescue" => Token::Rescue,
            "ensure" => Token::Ensure,
            _ => return None,
        };
        Some(token)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Do => f.write_str("do"),
            Token::End => f.write_str("end"),
            Token::If => f.write_str("if"),
            Token::Unless => f.write_str("unless"),
            Token::While => f.write_str("while"),
            Token::Until => f.write_str("until"),
            Token::Case => f.write_str("case"),
            Token::Begin => f.write_str("begin"),
            Token::Def => f.write_str("def"),
            Token::Class => f.write_str("class"),
            Token::Module => f.write_str("module"),
            Token::For => f.write_str("for"),
            Token::In => f.write_str("in"),
            Token::Then => f.write_str("then"),
            Token::Else => f.write_str("else"),
            Token::Elsif => f.write_str("elsif"),
            Token::When => f.write_str("when"),
            Token::Rescue => f.write_str("rescue"),
            Token::Ensure => f.write_str("ensure"),
            Token::Identifier(name) | Token::Constant(name) | Token::Variable(name) => {
                f.write_str(name)
            }
            Token::HashKey(name) => write!(f, "{}:", name),
            Token::Symbol(name) => write!(f, ":{}", name),
            Token::StringLiteral(value) => write!(f, "\"{}\"", value),
            Token::WordList(words) => write!(f, "%w[{}]", words.join(" ")),
            Token::NumberLiteral(value) => f.write_str(value),
            Token::Regex(value) => write!(f, "/{}/", value),
            Token::LeftBrace => f.write_str("{"),
            Token::RightBrace => f.write_str("}"),
            Token::LeftParen => f.write_str("("),
            Token::RightParen => f.write_str(")"),
            Token::LeftBracket => f.write_str("["),
            Token::RightBracket => f.write_str("]"),
            Token::Comma => f.write_str(","),
            Token::Dot => f.write_str("."),
            Token::SafeNav => f.write_str("&."),
            Token::DoubleColon => f.write_str("::"),
            Token::Pipe => f.write_str("|"),
            Token::Semicolon => f.write_str(";"),
            Token::Arrow => f.write_str("=>"),
            Token::Lambda => f.write_str("->"),
            Token::Assign => f.write_str("="),
            Token::Operator(op) => f.write_str(op),
            Token::Newline => f.write_str("\\n"),
            Token::EOF => f.write_str("end of file"),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub start: SourcePosition,
    pub end: SourcePosition,
}

/// Multi character operators, longest first
const OPERATORS: &[&str] = &[
    "**=", "<=>", "===", "...", "||=", "&&=", "<<=", ">>=", "==", "!=", "=~", "!~", ">=", "<=",
    "&&", "||", "+=", "-=", "*=", "/=", "%=", "|=", "&=", "^=", "**", "<<", ">>", "..",
];

struct PendingHeredoc {
    terminator: String,
    /// `<<~` and `<<-` allow an indented terminator
    indented: bool,
}

/// A `#` comment, `text` is everything after the `#`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub line: usize,
    pub text: String,
}

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    file: Arc<str>,
    previous: Option<Token>,
    heredocs: Vec<PendingHeredoc>,
    comments: Vec<Comment>,
}

impl Lexer {
    pub fn new(source: &str, file: Arc<str>) -> Self {
        Lexer {
            // a byte order mark is not part of the program text
            chars: source.strip_prefix('\u{feff}').unwrap_or(source).chars().collect(),
            pos: 0,
            line: 1,
            column: 0,
            file,
            previous: None,
            heredocs: Vec::new(),
            comments: Vec::new(),
        }
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied();
        if let Some(c) = ch {
            self.pos += 1;
            self.column += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 0;
            }
        }
        ch
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn position(&self) -> SourcePosition {
        SourcePosition { line: self.line, column: self.column + 1 }
    }

    fn error(&self, position: SourcePosition, reason: impl Into<String>) -> SyntaxError {
        SyntaxError::new(&self.file, position, reason)
    }

    fn at_line_start(&self) -> bool {
        self.column == 0
    }

    fn starts_with(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c))
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c == ' ' || c == '\t' || c == '\r' {
                self.advance();
            } else if c == '\\' && self.peek_at(1) == Some('\n') {
                // explicit line continuation
                self.advance();
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn skip_line(&mut self) {
        self.skip_comment();
        self.advance();
    }

    /// `=begin` ... `=end` block comments, only recognised at the start of a line
    fn skip_block_comment(&mut self) -> Result<(), SyntaxError> {
        let start = self.position();
        self.skip_line();
        loop {
            if self.peek().is_none() {
                return Err(self.error(start, "unterminated =begin comment"));
            }
            if self.starts_with("=end") {
                self.skip_line();
                return Ok(());
            }
            self.skip_line();
        }
    }

    /// Consumes the bodies of heredocs started on the line that just ended
    fn read_heredoc_bodies(&mut self) -> Result<(), SyntaxError> {
        let pending = std::mem::take(&mut self.heredocs);
        for heredoc in pending {
            let start = self.position();
            loop {
                if self.peek().is_none() {
                    return Err(self.error(
                        start,
                        format!("unterminated heredoc, expected {}", heredoc.terminator),
                    ));
                }
                let mut line = String::new();
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    line.push(c);
                    self.advance();
                }
                self.advance();
                let candidate = if heredoc.indented { line.trim() } else { line.trim_end() };
                if candidate == heredoc.terminator {
                    break;
                }
            }
        }
        Ok(())
    }

    fn is_identifier_char(c: char) -> bool {
        c.is_alphanumeric() || c == '_'
    }

    fn read_identifier(&mut self, first_char: char) -> String {
        let mut identifier = String::new();
        identifier.push(first_char);

        while let Some(c) = self.peek() {
            if Self::is_identifier_char(c) {
                identifier.push(c);
                self.advance();
            } else {
                break;
            }
        }

        // predicate and bang methods, but not `!=` or `?:`
        if let Some(suffix) = self.peek()
            && (suffix == '?' || suffix == '!')
            && self.peek_at(1) != Some('=')
            && self.peek_at(1) != Some(':')
        {
            identifier.push(suffix);
            self.advance();
        }

        identifier
    }

    fn read_number(&mut self, first_char: char) -> String {
        let mut number = String::new();
        number.push(first_char);

        let mut has_decimal = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                number.push(c);
                self.advance();
            } else if c == '.'
                && !has_decimal
                && self.peek_at(1).is_some_and(|next| next.is_ascii_digit())
            {
                has_decimal = true;
                number.push(c);
                self.advance();
            } else {
                break;
            }
        }

        number
    }

    /// Reads the inside of `#{ ... }` verbatim, nested strings included
    fn read_interpolation(&mut self, out: &mut String) -> Result<(), SyntaxError> {
        let start = self.position();
        let mut depth = 1;
        while let Some(c) = self.advance() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        out.push('}');
                        return Ok(());
                    }
                }
                '"' | '\'' => {
                    out.push(c);
                    let inner = self.read_string(c, c, c == '"')?;
                    out.push_str(&inner);
                }
                _ => {}
            }
            out.push(c);
        }
        Err(self.error(start, "unterminated string interpolation"))
    }

    /// Reads up to the closing delimiter, `open` and `close` differ for bracketed
    /// percent literals and nest
    fn read_string(
        &mut self,
        open: char,
        close: char,
        interpolates: bool,
    ) -> Result<String, SyntaxError> {
        let start = self.position();
        let mut string = String::new();
        let mut depth = 0;

        while let Some(c) = self.advance() {
            if c == close && depth == 0 {
                return Ok(string);
            } else if c == close {
                depth -= 1;
                string.push(c);
            } else if c == open && open != close {
                depth += 1;
                string.push(c);
            } else if c == '\\' {
                match self.advance() {
                    Some('n') if interpolates => string.push('\n'),
                    Some('t') if interpolates => string.push('\t'),
                    Some(escaped) if escaped == close || escaped == '\\' => string.push(escaped),
                    Some(escaped) => {
                        string.push('\\');
                        string.push(escaped);
                    }
                    None => break,
                }
            } else if c == '#' && interpolates && self.peek() == Some('{') {
                self.advance();
                string.push_str("#{");
                self.read_interpolation(&mut string)?;
            } else {
                string.push(c);
            }
        }

        Err(self.error(start, "unterminated string literal"))
    }

    fn closing_delimiter(open: char) -> char {
        match open {
            '(' => ')',
            '[' => ']',
            '{' => '}',
            '<' => '>',
            other => other,
        }
    }

    /// `%w[]`, `%i[]`, `%q()`, `%Q{}`, `%()`, `%r{}` and `%s()`
    fn read_percent_literal(&mut self) -> Result<Token, SyntaxError> {
        let kind = match self.peek() {
            Some(c) if c.is_ascii_alphabetic() => {
                self.advance();
                c
            }
            _ => 'Q',
        };
        let start = self.position();
        let open = self
            .advance()
            .ok_or_else(|| self.error(start, "unterminated percent literal"))?;
        let close = Self::closing_delimiter(open);
        let interpolates = matches!(kind, 'Q' | 'W' | 'I' | 'r');
        let body = self.read_string(open, close, interpolates)?;

        let token = match kind {
            'w' | 'W' | 'i' | 'I' => {
                Token::WordList(body.split_whitespace().map(str::to_string).collect())
            }
            'r' => {
                while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
                    self.advance();
                }
                Token::Regex(body)
            }
            's' => Token::Symbol(body),
            _ => Token::StringLiteral(body),
        };
        Ok(token)
    }

    fn starts_percent_literal(&self) -> bool {
        let value_before = self.previous.as_ref().is_some_and(Token::ends_value);
        match (self.peek(), self.peek_at(1)) {
            (Some('w' | 'W' | 'i' | 'I' | 'q' | 'Q' | 'r' | 's'), Some(delimiter)) => {
                !delimiter.is_alphanumeric() && !delimiter.is_whitespace()
            }
            (Some('(' | '[' | '{' | '|' | '<'), _) => !value_before,
            _ => false,
        }
    }

    /// `puts <<SQL`: a method name, a space, then `<<` glued to what follows
    fn heredoc_argument(&self, had_space: bool) -> bool {
        matches!(self.previous, Some(Token::Identifier(_)))
            && had_space
            && self.peek_at(1).is_some_and(|next| !next.is_whitespace())
    }

    /// `<<~ID`, `<<-ID` or `<<ID` where an expression is expected
    fn try_heredoc(&mut self, argument: bool) -> Option<Token> {
        let mut offset = 0;
        let indented = matches!(self.peek(), Some('~' | '-'));
        if indented {
            offset += 1;
        }
        let quote = match self.peek_at(offset) {
            Some(q @ ('\'' | '"' | '`')) => {
                offset += 1;
                Some(q)
            }
            _ => None,
        };
        let first = self.peek_at(offset)?;
        if !(first.is_ascii_uppercase() || first == '_' || (quote.is_some() && first.is_alphabetic())) {
            return None;
        }
        if !indented
            && quote.is_none()
            && !argument
            && self.previous.as_ref().is_some_and(Token::ends_value)
        {
            // `list<<VALUE` reads as an append
            return None;
        }

        for _ in 0..offset {
            self.advance();
        }
        let mut terminator = String::new();
        while let Some(c) = self.peek() {
            if Self::is_identifier_char(c) {
                terminator.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if let Some(q) = quote
            && self.peek() == Some(q)
        {
            self.advance();
        }
        self.heredocs.push(PendingHeredoc { terminator, indented });
        Some(Token::StringLiteral(String::new()))
    }

    fn read_symbol(&mut self) -> Result<Option<Token>, SyntaxError> {
        match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.advance();
                let name = self.read_string(q, q, q == '"')?;
                Ok(Some(Token::Symbol(name)))
            }
            Some(c) if c.is_alphabetic() || c == '_' => {
                self.advance();
                let mut name = self.read_identifier(c);
                if self.peek() == Some('=') && !matches!(self.peek_at(1), Some('=' | '>' | '~')) {
                    self.advance();
                    name.push('=');
                }
                Ok(Some(Token::Symbol(name)))
            }
            _ => Ok(None),
        }
    }

    fn read_operator(&mut self, first: char) -> Token {
        for op in OPERATORS {
            let mut chars = op.chars();
            if chars.next() == Some(first) && chars.enumerate().all(|(i, c)| self.peek_at(i) == Some(c)) {
                for _ in 1..op.len() {
                    self.advance();
                }
                return Token::Operator(op.to_string());
            }
        }
        Token::Operator(first.to_string())
    }

    fn lex_token(&mut self, c: char, had_space: bool) -> Result<Token, SyntaxError> {
        let start = SourcePosition { line: self.line, column: self.column };
        let token = match c {
            '\n' => {
                self.read_heredoc_bodies()?;
                Token::Newline
            }
            '{' => Token::LeftBrace,
            '}' => Token::RightBrace,
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            '[' => Token::LeftBracket,
            ']' => Token::RightBracket,
            ',' => Token::Comma,
            ';' => Token::Semicolon,
            '.' => {
                if self.peek() == Some('.') {
                    self.read_operator(c)
                } else {
                    Token::Dot
                }
            }
            ':' => {
                if self.peek() == Some(':') {
                    self.advance();
                    Token::DoubleColon
                } else if let Some(symbol) = self.read_symbol()? {
                    symbol
                } else {
                    Token::Operator(":".to_string())
                }
            }
            '"' | '`' => Token::StringLiteral(self.read_string(c, c, true)?),
            '\'' => Token::StringLiteral(self.read_string(c, c, false)?),
            '@' | '$' => {
                let mut name = String::from(c);
                while let Some(next) = self.peek() {
                    if Self::is_identifier_char(next) || next == '@' {
                        name.push(next);
                        self.advance();
                    } else {
                        break;
                    }
                }
                Token::Variable(name)
            }
            '%' if self.starts_percent_literal() => self.read_percent_literal()?,
            '/' => {
                let value_before = self.previous.as_ref().is_some_and(Token::ends_value);
                let ambiguous_argument = matches!(self.previous, Some(Token::Identifier(_)))
                    && had_space
                    && self.peek().is_some_and(|next| !next.is_whitespace() && next != '=');
                if !value_before || ambiguous_argument {
                    let body = self.read_string('/', '/', true)?;
                    while self.peek().is_some_and(|flag| flag.is_ascii_alphabetic()) {
                        self.advance();
                    }
                    Token::Regex(body)
                } else {
                    self.read_operator(c)
                }
            }
            '<' if self.peek() == Some('<')
                && (!self.previous.as_ref().is_some_and(Token::ends_value)
                    || matches!(self.peek_at(1), Some('~' | '-'))
                    || self.heredoc_argument(had_space)) =>
            {
                let argument = self.heredoc_argument(had_space);
                self.advance();
                match self.try_heredoc(argument) {
                    Some(token) => token,
                    None => Token::Operator("<<".to_string()),
                }
            }
            '=' => match self.peek() {
                Some('>') => {
                    self.advance();
                    Token::Arrow
                }
                Some('=' | '~') => self.read_operator(c),
                _ => Token::Assign,
            },
            '-' if self.peek() == Some('>') => {
                self.advance();
                Token::Lambda
            }
            '&' if self.peek() == Some('.') => {
                self.advance();
                Token::SafeNav
            }
            '|' if !matches!(self.peek(), Some('|' | '=')) => Token::Pipe,
            '0'..='9' => Token::NumberLiteral(self.read_number(c)),
            c if c.is_alphabetic() || c == '_' => {
                let identifier = self.read_identifier(c);
                let after_dot = matches!(
                    self.previous,
                    Some(Token::Dot | Token::SafeNav | Token::Def)
                );
                if self.peek() == Some(':') && self.peek_at(1) != Some(':') && !after_dot {
                    self.advance();
                    Token::HashKey(identifier)
                } else if after_dot {
                    Token::Identifier(identifier)
                } else if let Some(keyword) = Token::keyword(&identifier) {
                    keyword
                } else if identifier.starts_with(|first: char| first.is_uppercase()) {
                    Token::Constant(identifier)
                } else {
                    Token::Identifier(identifier)
                }
            }
            '+' | '-' | '*' | '<' | '>' | '!' | '&' | '|' | '^' | '~' | '?' | '%' => {
                self.read_operator(c)
            }
            _ => return Err(self.error(start, format!("unexpected character '{}'", c))),
        };
        Ok(token)
    }

    pub fn next_token(&mut self) -> Result<SpannedToken, SyntaxError> {
        loop {
            let before = self.pos;
            self.skip_whitespace();
            let had_space = self.pos > before;

            if self.at_line_start() {
                if self.starts_with("=begin") {
                    self.skip_block_comment()?;
                    continue;
                }
                if self.starts_with("__END__")
                    && matches!(self.peek_at(7), None | Some('\n' | '\r'))
                {
                    self.pos = self.chars.len();
                }
            }

            let start = self.position();

            let c = match self.advance() {
                Some(c) => c,
                None => {
                    return Ok(SpannedToken { token: Token::EOF, start, end: start });
                }
            };

            if c == '#' {
                let text_start = self.pos;
                self.skip_comment();
                let text = self.chars[text_start..self.pos].iter().collect();
                self.comments.push(Comment { line: start.line, text });
                continue;
            }

            let token = self.lex_token(c, had_space)?;
            let end = SourcePosition { line: self.line, column: self.column.max(1) };
            self.previous = Some(token.clone());
            return Ok(SpannedToken { token, start, end });
        }
    }

    /// Comments seen so far, in source order
    pub fn take_comments(&mut self) -> Vec<Comment> {
        std::mem::take(&mut self.comments)
    }

    pub fn tokenize(&mut self) -> Result<Vec<SpannedToken>, SyntaxError> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = token.token == Token::EOF;
            tokens.push(token);

            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lex(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source, Arc::from("lexer_spec.rb"));
        lexer
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_lexer() {
        let tokens = lex("describe User, type: :model do\n  it { is_expected.to be_valid }\nend\n");
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("describe".into()),
                Token::Constant("User".into()),
                Token::Comma,
                Token::HashKey("type".into()),
                Token::Symbol("model".into()),
                Token::Do,
                Token::Newline,
                Token::Identifier("it".into()),
                Token::LeftBrace,
                Token::Identifier("is_expected".into()),
                Token::Dot,
                Token::Identifier("to".into()),
                Token::Identifier("be_valid".into()),
                Token::RightBrace,
                Token::Newline,
                Token::End,
                Token::Newline,
                Token::EOF,
            ]
        );
    }

    #[test]
    fn comments_and_interpolation() {
        let tokens = lex("# a comment with do\nit \"has #{count} \\\"items\\\"\" # trailing\n");
        assert_eq!(
            tokens,
            vec![
                Token::Newline,
                Token::Identifier("it".into()),
                Token::StringLiteral("has #{count} \"items\"".into()),
                Token::Newline,
                Token::EOF,
            ]
        );
    }

    #[test]
    fn percent_literals_and_predicates() {
        let tokens = lex("%w[admin guest].each { |r| r.valid? }");
        assert_eq!(tokens[0], Token::WordList(vec!["admin".into(), "guest".into()]));
        assert_eq!(tokens[1], Token::Dot);
        assert_eq!(tokens[2], Token::Identifier("each".into()));
        assert!(tokens.contains(&Token::Identifier("valid?".into())));
    }

    #[test]
    fn heredoc_body_is_skipped() {
        let tokens = lex("let(:sql) { <<~SQL }\n  select 'end' do\nSQL\nit 'x'\n");
        assert!(!tokens.contains(&Token::Do));
        assert!(tokens.contains(&Token::Identifier("it".into())));
    }

    #[test]
    fn heredoc_as_command_argument() {
        let tokens = lex("puts <<SQL\n  select 'end' do\nSQL\nit 'x'\n");
        assert!(!tokens.contains(&Token::Do));
        assert_eq!(tokens[0], Token::Identifier("puts".into()));
        assert_eq!(tokens[1], Token::StringLiteral(String::new()));

        let tokens = lex("items << Item.new\n");
        assert_eq!(tokens[1], Token::Operator("<<".into()));
    }

    #[test]
    fn byte_order_mark_is_skipped() {
        let mut lexer = Lexer::new("\u{feff}describe User do\nend\n", Arc::from("lexer_spec.rb"));
        let token = lexer.next_token().unwrap();
        assert_eq!(token.token, Token::Identifier("describe".into()));
        assert_eq!(token.start, SourcePosition { line: 1, column: 1 });
    }

    #[test]
    fn comments_are_recorded_with_their_line() {
        let mut lexer = Lexer::new(
            "# top\nit 'has # no comment' do # trailing\nend\n",
            Arc::from("lexer_spec.rb"),
        );
        lexer.tokenize().unwrap();
        assert_eq!(
            lexer.take_comments(),
            vec![
                Comment { line: 1, text: " top".into() },
                Comment { line: 2, text: " trailing".into() },
            ]
        );
    }

    #[test]
    fn keywords_after_dot_are_identifiers() {
        let tokens = lex("user.class.then");
        assert_eq!(tokens[2], Token::Identifier("class".into()));
        assert_eq!(tokens[4], Token::Identifier("then".into()));
    }

    #[test]
    fn positions_are_one_based() {
        let mut lexer = Lexer::new("  it 'x'", Arc::from("lexer_spec.rb"));
        let token = lexer.next_token().unwrap();
        assert_eq!(token.start, SourcePosition { line: 1, column: 3 });
    }

    #[test]
    fn test_fail() {
        let mut lexer = Lexer::new("it \"never closed\n", Arc::from("lexer_spec.rb"));
        let err = lexer.tokenize().unwrap_err();
        assert_eq!(err.reason, "unterminated string literal");
        assert_eq!(err.location.line(), 1);
    }

    #[test]
    fn block_comments_and_end_marker() {
        let tokens = lex("=begin\nit 'hidden'\n=end\nx\n__END__\nit 'gone'\n");
        assert_eq!(
            tokens,
            vec![Token::Identifier("x".into()), Token::Newline, Token::EOF]
        );
    }
}

use crate::lexer::{SpannedToken, Token};
use crate::parser::ast::{CallSite, Receiver};

/// Extracts every identifier reference of a statement with its receiver and first argument
pub fn collect_calls(tokens: &[SpannedToken]) -> Vec<CallSite> {
    tokens
        .iter()
        .enumerate()
        .filter_map(|(index, spanned)| match &spanned.token {
            Token::Identifier(name) => Some(CallSite {
                name: name.clone(),
                receiver: receiver_before(tokens, index),
                first_arg: first_argument(tokens, index),
                position: spanned.start,
            }),
            _ => None,
        })
        .collect()
}

fn is_separator(token: &Token) -> bool {
    matches!(token, Token::Dot | Token::SafeNav | Token::DoubleColon)
}

fn receiver_before(tokens: &[SpannedToken], index: usize) -> Receiver {
    if index == 0 || !is_separator(&tokens[index - 1].token) {
        return Receiver::None;
    }

    // walk back over `a.b::C.` collecting segments until the chain stops
    let mut path = String::new();
    let mut separator = index - 1;
    loop {
        if separator == 0 {
            return Receiver::Expression;
        }
        let segment = match &tokens[separator - 1].token {
            Token::Identifier(name) | Token::Constant(name) | Token::Variable(name) => name,
            _ => return Receiver::Expression,
        };
        let joiner = if tokens[separator].token == Token::DoubleColon { "::" } else { "." };
        path = if path.is_empty() {
            segment.clone()
        } else {
            format!("{}{}{}", segment, joiner, path)
        };

        let before = separator - 1;
        if before > 0 && is_separator(&tokens[before - 1].token) {
            separator = before - 1;
        } else {
            break;
        }
    }

    Receiver::Path(path)
}

fn first_argument(tokens: &[SpannedToken], index: usize) -> Option<String> {
    let next = tokens.get(index + 1)?;
    match &next.token {
        Token::LeftParen => {
            let mut depth = 0usize;
            let mut argument = Vec::new();
            for spanned in &tokens[index + 2..] {
                match &spanned.token {
                    Token::LeftParen | Token::LeftBracket | Token::LeftBrace => depth += 1,
                    Token::RightParen | Token::RightBracket | Token::RightBrace if depth == 0 => {
                        break;
                    }
                    Token::RightParen | Token::RightBracket | Token::RightBrace => depth -= 1,
                    Token::Comma if depth == 0 => break,
                    _ => {}
                }
                argument.push(spanned.clone());
            }
            if argument.is_empty() {
                None
            } else {
                Some(render_tokens(&argument))
            }
        }
        Token::StringLiteral(_) | Token::Symbol(_) | Token::NumberLiteral(_) => {
            Some(next.token.to_string())
        }
        Token::Constant(_) => {
            let path: Vec<SpannedToken> = tokens[index + 1..]
                .iter()
                .take_while(|t| matches!(t.token, Token::Constant(_) | Token::DoubleColon))
                .cloned()
                .collect();
            Some(render_tokens(&path))
        }
        _ => None,
    }
}

/// Renders tokens back to compact source text, `type: :model`, `Admin::User`, `foo(1, 2)`
pub fn render_tokens(tokens: &[SpannedToken]) -> String {
    let mut out = String::new();
    let mut previous: Option<&Token> = None;
    for spanned in tokens {
        let token = &spanned.token;
        let glue_left = matches!(
            token,
            Token::Dot
                | Token::SafeNav
                | Token::DoubleColon
                | Token::Comma
                | Token::RightParen
                | Token::RightBracket
        ) || (*token == Token::LeftParen
            && matches!(previous, Some(Token::Identifier(_) | Token::Constant(_))));
        let glue_right = matches!(
            previous,
            Some(
                Token::Dot
                    | Token::SafeNav
                    | Token::DoubleColon
                    | Token::LeftParen
                    | Token::LeftBracket
            )
        );
        if previous.is_some() && !glue_left && !glue_right {
            out.push(' ');
        }
        out.push_str(&token.to_string());
        previous = Some(token);
    }
    out
}

//! Tokenizer for filter expressions

/// One lexical token
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Ident(String),
    Str(String),
    Int(i64),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    Comma,
    Not,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => push(&mut tokens, &mut i, Token::LParen, 1),
            ')' => push(&mut tokens, &mut i, Token::RParen, 1),
            '[' => push(&mut tokens, &mut i, Token::LBracket, 1),
            ']' => push(&mut tokens, &mut i, Token::RBracket, 1),
            '.' => push(&mut tokens, &mut i, Token::Dot, 1),
            ',' => push(&mut tokens, &mut i, Token::Comma, 1),
            '!' if next == Some('=') => push(&mut tokens, &mut i, Token::Ne, 2),
            '!' => push(&mut tokens, &mut i, Token::Not, 1),
            '=' if next == Some('=') => push(&mut tokens, &mut i, Token::Eq, 2),
            '<' if next == Some('=') => push(&mut tokens, &mut i, Token::Le, 2),
            '<' => push(&mut tokens, &mut i, Token::Lt, 1),
            '>' if next == Some('=') => push(&mut tokens, &mut i, Token::Ge, 2),
            '>' => push(&mut tokens, &mut i, Token::Gt, 1),
            '&' if next == Some('&') => push(&mut tokens, &mut i, Token::And, 2),
            '|' if next == Some('|') => push(&mut tokens, &mut i, Token::Or, 2),
            '"' | '\'' => {
                let (literal, end) = string_literal(&chars, i)?;
                tokens.push(Token::Str(literal));
                i = end;
            }
            c if c.is_ascii_digit() || (c == '-' && next.is_some_and(|n| n.is_ascii_digit())) => {
                let start = i;
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse::<i64>()
                    .map_err(|e| format!("invalid integer {text:?}: {e}"))?;
                tokens.push(Token::Int(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => return Err(format!("unexpected character {other:?} at offset {i}")),
        }
    }

    Ok(tokens)
}

fn push(tokens: &mut Vec<Token>, i: &mut usize, token: Token, width: usize) {
    tokens.push(token);
    *i += width;
}

/// Read a quoted string starting at `start`; returns the value and the index after the closing quote
fn string_literal(chars: &[char], start: usize) -> Result<(String, usize), String> {
    let quote = chars[start];
    let mut value = String::new();
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                let escaped = chars
                    .get(i + 1)
                    .ok_or_else(|| "unterminated escape sequence".to_string())?;
                value.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => *other,
                });
                i += 2;
            }
            c if c == quote => return Ok((value, i + 1)),
            c => {
                value.push(c);
                i += 1;
            }
        }
    }
    Err(format!("unterminated string starting at offset {start}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_comparison() {
        let tokens = tokenize(r#"size_bytes >= -12 && name != 'x\'y'"#).expect("tokens");
        assert_eq!(
            tokens,
            vec![
                Token::Ident("size_bytes".to_string()),
                Token::Ge,
                Token::Int(-12),
                Token::And,
                Token::Ident("name".to_string()),
                Token::Ne,
                Token::Str("x'y".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_errors() {
        assert!(tokenize("k = 1").is_err());
        assert!(tokenize("k == \"open").is_err());
        assert!(tokenize("k == #").is_err());
    }
}

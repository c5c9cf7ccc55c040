//! Line-oriented tokenizer (§4.5).

use crate::error::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Identifier(String),
    Number(i64),
    Register(usize),
    Colon,
    LBracket,
    RBracket,
    DirSection,
    DirGlobal,
    DirWord,
    DirDat,
    DirOrg,
    Newline,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Parses a numeric literal the way the original lexer's `strtoll(…, 0)`
/// does: optional sign, `0x`/`0X` hex prefix, decimal otherwise.
fn parse_number_literal(text: &str) -> Option<i64> {
    let (sign, rest) = match text.strip_prefix('-') {
        Some(r) => (-1i64, r),
        None => (1i64, text.strip_prefix('+').unwrap_or(text)),
    };
    let magnitude = if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else {
        rest.parse::<i64>().ok()?
    };
    Some(sign * magnitude)
}

fn directive_kind(lower: &str) -> Option<TokenKind> {
    match lower {
        ".section" => Some(TokenKind::DirSection),
        ".global" => Some(TokenKind::DirGlobal),
        ".word" | ".int" => Some(TokenKind::DirWord),
        ".dat" => Some(TokenKind::DirDat),
        ".org" => Some(TokenKind::DirOrg),
        _ => None,
    }
}

fn register_index(lower: &str) -> Option<usize> {
    match lower {
        "sp" => return Some(13),
        "lr" => return Some(14),
        "pc" => return Some(15),
        _ => {}
    }
    let rest = lower.strip_prefix('r')?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}

pub fn tokenize(source: &str) -> Vec<Token> {
    let chars: Vec<char> = source.chars().collect();
    let mut pos = 0usize;
    let mut line = 1u32;
    let mut column = 1u32;
    let mut tokens = Vec::new();

    let advance = |pos: &mut usize, line: &mut u32, column: &mut u32, chars: &[char]| {
        if chars[*pos] == '\n' {
            *line += 1;
            *column = 1;
        } else {
            *column += 1;
        }
        *pos += 1;
    };

    while pos < chars.len() {
        let c = chars[pos];

        if c == ' ' || c == '\t' || c == '\r' || c == ',' {
            advance(&mut pos, &mut line, &mut column, &chars);
            continue;
        }
        if c == ';' {
            while pos < chars.len() && chars[pos] != '\n' {
                advance(&mut pos, &mut line, &mut column, &chars);
            }
            continue;
        }

        let span = Span { line, column };

        if c == '\n' {
            advance(&mut pos, &mut line, &mut column, &chars);
            tokens.push(Token {
                kind: TokenKind::Newline,
                span,
            });
            continue;
        }
        if c == ':' {
            advance(&mut pos, &mut line, &mut column, &chars);
            tokens.push(Token {
                kind: TokenKind::Colon,
                span,
            });
            continue;
        }
        if c == '[' {
            advance(&mut pos, &mut line, &mut column, &chars);
            tokens.push(Token {
                kind: TokenKind::LBracket,
                span,
            });
            continue;
        }
        if c == ']' {
            advance(&mut pos, &mut line, &mut column, &chars);
            tokens.push(Token {
                kind: TokenKind::RBracket,
                span,
            });
            continue;
        }

        if c.is_ascii_digit() || c == '-' || c == '+' {
            let start = pos;
            advance(&mut pos, &mut line, &mut column, &chars);
            while pos < chars.len() && chars[pos].is_alphanumeric() {
                advance(&mut pos, &mut line, &mut column, &chars);
            }
            let text: String = chars[start..pos].iter().collect();
            let value = parse_number_literal(&text).unwrap_or(0);
            tokens.push(Token {
                kind: TokenKind::Number(value),
                span,
            });
            continue;
        }

        if c.is_alphabetic() || c == '.' || c == '_' {
            let start = pos;
            while pos < chars.len()
                && (chars[pos].is_alphanumeric() || chars[pos] == '_' || chars[pos] == '.')
            {
                advance(&mut pos, &mut line, &mut column, &chars);
            }
            let text: String = chars[start..pos].iter().collect();
            let lower = text.to_ascii_lowercase();
            let kind = if let Some(dir) = directive_kind(&lower) {
                dir
            } else if let Some(reg) = register_index(&lower) {
                TokenKind::Register(reg)
            } else {
                TokenKind::Identifier(lower)
            };
            tokens.push(Token { kind, span });
            continue;
        }

        // Unrecognized character: surface as a single-char identifier so
        // the parser can reject it with a located diagnostic.
        advance(&mut pos, &mut line, &mut column, &chars);
        tokens.push(Token {
            kind: TokenKind::Identifier(c.to_string()),
            span,
        });
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span { line, column },
    });
    tokens
}

/// Vector registers `v0`..`v3` are ordinary identifiers at the lexer
/// level; the parser resolves them to register indices (§4.5).
pub fn vector_register_index(name: &str) -> Option<usize> {
    if name.len() == 2 {
        let mut chars = name.chars();
        if chars.next() == Some('v') {
            if let Some(d) = chars.next().and_then(|c| c.to_digit(10)) {
                if d <= 3 {
                    return Some(d as usize);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_instruction_line() {
        let tokens = tokenize("add.w r1 r2 r3\n");
        assert!(matches!(tokens[0].kind, TokenKind::Identifier(ref s) if s == "add.w"));
        assert!(matches!(tokens[1].kind, TokenKind::Register(1)));
        assert!(matches!(tokens[4].kind, TokenKind::Newline));
    }

    #[test]
    fn hex_and_decimal_numbers() {
        let tokens = tokenize("0x10 -5");
        assert!(matches!(tokens[0].kind, TokenKind::Number(16)));
        assert!(matches!(tokens[1].kind, TokenKind::Number(-5)));
    }

    #[test]
    fn comment_is_skipped() {
        let tokens = tokenize("nop ; a comment\nhlt");
        assert!(matches!(tokens[0].kind, TokenKind::Identifier(ref s) if s == "nop"));
        assert!(matches!(tokens[1].kind, TokenKind::Newline));
        assert!(matches!(tokens[2].kind, TokenKind::Identifier(ref s) if s == "hlt"));
    }
}

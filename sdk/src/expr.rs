// ============ Balance Expressions ============
// Pool configs write amounts as small integer expressions ("1000 * 10**18").
// Grammar, loosest binding first:
//   expr  := term (('+' | '-') term)*
//   term  := unary (('*' | '/') unary)*
//   unary := '-' unary | power
//   power := atom ('**' unary)?
//   atom  := number | '(' expr ')'
// `**` is right-associative and binds tighter than unary minus. `/` floors.
// Every intermediate value must stay in [0, 2^256).

use catalyst_math::U256;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("unexpected character '{ch}' at byte {pos}")]
    UnexpectedChar { ch: char, pos: usize },
    #[error("expected {expected} at byte {pos}")]
    Expected { expected: &'static str, pos: usize },
    #[error("unexpected input at byte {pos}")]
    TrailingInput { pos: usize },
    #[error("overflow at byte {pos}")]
    Overflow { pos: usize },
    #[error("division by zero at byte {pos}")]
    DivisionByZero { pos: usize },
    #[error("negative result at byte {pos}")]
    Negative { pos: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Token {
    Number(U256),
    Plus,
    Minus,
    Star,
    Pow,
    Slash,
    Open,
    Close,
}

/// Evaluate an integer expression.
pub fn evaluate(input: &str) -> Result<U256, ExprError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens: &tokens,
        index: 0,
        end: input.len(),
    };
    let value = parser.expr()?;
    match parser.peek() {
        None => Ok(value),
        Some((_, pos)) => Err(ExprError::TrailingInput { pos }),
    }
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, ExprError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let start = pos;
        let token = match bytes[pos] {
            b' ' | b'\t' | b'\n' | b'\r' => {
                pos += 1;
                continue;
            }
            b'0'..=b'9' => {
                let mut value = U256::zero();
                while pos < bytes.len() && (bytes[pos].is_ascii_digit() || bytes[pos] == b'_') {
                    if bytes[pos] != b'_' {
                        let digit = U256::from(bytes[pos] - b'0');
                        value = value
                            .checked_mul(U256::from(10u8))
                            .and_then(|v| v.checked_add(digit))
                            .ok_or(ExprError::Overflow { pos: start })?;
                    }
                    pos += 1;
                }
                // A trailing separator is not a number.
                if bytes[pos - 1] == b'_' {
                    return Err(ExprError::UnexpectedChar { ch: '_', pos: pos - 1 });
                }
                tokens.push((Token::Number(value), start));
                continue;
            }
            b'+' => Token::Plus,
            b'-' => Token::Minus,
            b'*' if bytes.get(pos + 1) == Some(&b'*') => {
                pos += 1;
                Token::Pow
            }
            b'*' => Token::Star,
            b'/' => Token::Slash,
            b'(' => Token::Open,
            b')' => Token::Close,
            _ => {
                let ch = input[pos..].chars().next().unwrap_or('?');
                return Err(ExprError::UnexpectedChar { ch, pos });
            }
        };
        pos += 1;
        tokens.push((token, start));
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [(Token, usize)],
    index: usize,
    end: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<(Token, usize)> {
        self.tokens.get(self.index).copied()
    }

    fn position(&self) -> usize {
        self.peek().map_or(self.end, |(_, pos)| pos)
    }

    fn expr(&mut self) -> Result<U256, ExprError> {
        let mut value = self.term()?;
        while let Some((op @ (Token::Plus | Token::Minus), pos)) = self.peek() {
            self.index += 1;
            let rhs = self.term()?;
            value = match op {
                Token::Plus => value.checked_add(rhs).ok_or(ExprError::Overflow { pos })?,
                _ => value.checked_sub(rhs).ok_or(ExprError::Negative { pos })?,
            };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<U256, ExprError> {
        let mut value = self.unary()?;
        while let Some((op @ (Token::Star | Token::Slash), pos)) = self.peek() {
            self.index += 1;
            let rhs = self.unary()?;
            value = match op {
                Token::Star => value.checked_mul(rhs).ok_or(ExprError::Overflow { pos })?,
                _ => value.checked_div(rhs).ok_or(ExprError::DivisionByZero { pos })?,
            };
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<U256, ExprError> {
        if let Some((Token::Minus, pos)) = self.peek() {
            self.index += 1;
            let value = self.unary()?;
            if !value.is_zero() {
                return Err(ExprError::Negative { pos });
            }
            return Ok(value);
        }
        self.power()
    }

    fn power(&mut self) -> Result<U256, ExprError> {
        let base = self.atom()?;
        if let Some((Token::Pow, pos)) = self.peek() {
            self.index += 1;
            let exponent = self.unary()?;
            return base
                .checked_pow(exponent)
                .ok_or(ExprError::Overflow { pos });
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<U256, ExprError> {
        let pos = self.position();
        match self.peek() {
            Some((Token::Number(value), _)) => {
                self.index += 1;
                Ok(value)
            }
            Some((Token::Open, _)) => {
                self.index += 1;
                let value = self.expr()?;
                match self.peek() {
                    Some((Token::Close, _)) => {
                        self.index += 1;
                        Ok(value)
                    }
                    _ => Err(ExprError::Expected {
                        expected: "')'",
                        pos: self.position(),
                    }),
                }
            }
            _ => Err(ExprError::Expected {
                expected: "a number or '('",
                pos,
            }),
        }
    }
}

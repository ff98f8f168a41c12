//! Arithmetic expression evaluator for the math rule.
//!
//! A tokenizer plus recursive-descent parser over decimal literals and
//! `+ - * / % ( )` with the usual precedence. Both `.` and `,` are accepted
//! as the decimal separator, except that a `,` followed by exactly three
//! digits ("1,000") reads as a thousands separator and is rejected rather
//! than guessed at. Nothing else is accepted: any other character
//! is a parse error, so there is no way to reach anything beyond arithmetic.
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '%') unary)*
//! unary   := ('+' | '-') unary | primary
//! primary := number | '(' expr ')'
//! ```

/// Why an expression could not be evaluated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("unexpected character '{0}' at {1}")]
    UnexpectedChar(char, usize),

    #[error("malformed number '{0}'")]
    BadNumber(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected token at position {0}")]
    UnexpectedToken(usize),

    #[error("unbalanced parentheses")]
    Unbalanced,

    #[error("result is not a finite number")]
    NonFinite,

    #[error("expression is empty")]
    Empty,

    #[error("expression nested too deeply")]
    TooDeep,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
}

/// Nesting limit for parentheses and unary chains.
const MAX_DEPTH: usize = 64;

fn tokenize(input: &str) -> Result<Vec<Token>, EvalError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' | ',' => {
                let start = i;
                while i < chars.len() && matches!(chars[i], '0'..='9' | '.' | ',') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                tokens.push(Token::Num(parse_number(&literal)?));
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            other => return Err(EvalError::UnexpectedChar(other, i)),
        }
    }

    Ok(tokens)
}

fn parse_number(literal: &str) -> Result<f64, EvalError> {
    if let Some((_, fraction)) = literal.split_once(',')
        && fraction.len() == 3
        && fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(EvalError::BadNumber(literal.to_string()));
    }
    let normalized = literal.replace(',', ".");
    let separators = normalized.matches('.').count();
    if separators > 1 || !normalized.chars().any(|c| c.is_ascii_digit()) {
        return Err(EvalError::BadNumber(literal.to_string()));
    }
    normalized
        .parse::<f64>()
        .map_err(|_| EvalError::BadNumber(literal.to_string()))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.peek();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn enter(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EvalError::TooDeep);
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<f64, EvalError> {
        let mut value = self.term()?;
        while let Some(tok @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if tok == Token::Plus {
                value + rhs
            } else {
                value - rhs
            };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, EvalError> {
        let mut value = self.unary()?;
        while let Some(tok @ (Token::Star | Token::Slash | Token::Percent)) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            value = match tok {
                Token::Star => value * rhs,
                Token::Slash => value / rhs,
                _ => value % rhs,
            };
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<f64, EvalError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                self.enter()?;
                let v = self.unary()?;
                self.depth -= 1;
                Ok(-v)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.enter()?;
                let v = self.unary()?;
                self.depth -= 1;
                Ok(v)
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<f64, EvalError> {
        match self.bump() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::LParen) => {
                self.enter()?;
                let v = self.expr()?;
                self.depth -= 1;
                match self.bump() {
                    Some(Token::RParen) => Ok(v),
                    Some(_) => Err(EvalError::UnexpectedToken(self.pos - 1)),
                    None => Err(EvalError::Unbalanced),
                }
            }
            Some(Token::RParen) => Err(EvalError::Unbalanced),
            Some(_) => Err(EvalError::UnexpectedToken(self.pos - 1)),
            None => Err(EvalError::UnexpectedEnd),
        }
    }
}

/// Evaluate an arithmetic expression.
///
/// Division or modulo by zero yields a non-finite value, which is reported
/// as [`EvalError::NonFinite`] rather than returned.
pub fn evaluate(input: &str) -> Result<f64, EvalError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(EvalError::Empty);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    match parser.peek() {
        None => {}
        Some(Token::RParen) => return Err(EvalError::Unbalanced),
        Some(_) => return Err(EvalError::UnexpectedToken(parser.pos)),
    }

    if !value.is_finite() {
        return Err(EvalError::NonFinite);
    }
    Ok(value)
}

/// Render a result: integers without decimals, everything else to two places.
pub fn format_result(value: f64) -> String {
    if value.fract() == 0.0 {
        if value == 0.0 {
            // avoid "-0"
            return "0".to_string();
        }
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respects_precedence() {
        assert_eq!(evaluate("2+3*4").unwrap(), 14.0);
        assert_eq!(evaluate("(2+3)*4").unwrap(), 20.0);
        assert_eq!(evaluate("10-4-3").unwrap(), 3.0);
        assert_eq!(evaluate("100/10/5").unwrap(), 2.0);
    }

    #[test]
    fn unary_minus() {
        assert_eq!(evaluate("-3+5").unwrap(), 2.0);
        assert_eq!(evaluate("2*-3").unwrap(), -6.0);
        assert_eq!(evaluate("-(2+2)").unwrap(), -4.0);
    }

    #[test]
    fn modulo_keeps_dividend_sign() {
        assert_eq!(evaluate("10%3").unwrap(), 1.0);
        assert_eq!(evaluate("-7%3").unwrap(), -1.0);
    }

    #[test]
    fn decimal_separators() {
        assert_eq!(evaluate("1.5+1").unwrap(), 2.5);
        assert_eq!(evaluate("1,5*2").unwrap(), 3.0);
        assert_eq!(evaluate(".5+.5").unwrap(), 1.0);
        assert_eq!(evaluate("1,25+1").unwrap(), 2.25);
    }

    #[test]
    fn comma_thousands_are_rejected() {
        assert_eq!(
            evaluate("1,000+1"),
            Err(EvalError::BadNumber("1,000".to_string()))
        );
        assert_eq!(evaluate("1,0000+1").unwrap(), 2.0);
    }

    #[test]
    fn division_by_zero_is_non_finite() {
        assert_eq!(evaluate("10/0"), Err(EvalError::NonFinite));
        assert_eq!(evaluate("0/0"), Err(EvalError::NonFinite));
        assert_eq!(evaluate("5%0"), Err(EvalError::NonFinite));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(evaluate("2+").is_err());
        assert!(evaluate("*2").is_err());
        assert_eq!(evaluate("(2+2"), Err(EvalError::Unbalanced));
        assert_eq!(evaluate("2+2)"), Err(EvalError::Unbalanced));
        assert!(evaluate("2(3)").is_err());
        assert!(evaluate("1.2.3").is_err());
        assert!(evaluate("2**3").is_err());
        assert_eq!(evaluate("   "), Err(EvalError::Empty));
    }

    #[test]
    fn rejects_non_arithmetic_characters() {
        assert!(matches!(
            evaluate("alert(1)"),
            Err(EvalError::UnexpectedChar('a', 0))
        ));
        assert!(evaluate("2+x").is_err());
    }

    #[test]
    fn deep_nesting_is_bounded() {
        let deep = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        assert_eq!(evaluate(&deep), Err(EvalError::TooDeep));
    }

    #[test]
    fn formatting() {
        assert_eq!(format_result(4.0), "4");
        assert_eq!(format_result(3.5), "3.50");
        assert_eq!(format_result(1.0 / 3.0), "0.33");
        assert_eq!(format_result(-0.0), "0");
        assert_eq!(format_result(-6.0), "-6");
    }
}

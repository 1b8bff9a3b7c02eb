//! Restricted arithmetic formula evaluator
//!
//! Custom price-multiplier formulas are evaluated through a fixed numeric
//! grammar: tokenize, parse to an AST, evaluate. There is no scripting host
//! and nothing outside the grammar can run. Supported: `+ - * / ^`,
//! parentheses, decimal literals, the constants `E` and `PI`, and a fixed
//! whitelist of math functions.
//!
//! Binary operators at the same precedence level evaluate left-to-right,
//! including `^`. Division by zero evaluates to 0.0. A malformed formula
//! evaluates to 0.0 rather than failing; only a source string containing an
//! execution/reflection keyword is rejected outright.

use thiserror::Error;

/// Formula evaluation error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("Formula contains forbidden keyword: {0}")]
    Forbidden(String),

    #[error("Formula parse error: {0}")]
    Parse(String),
}

/// Result type for formula parsing
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Keywords that must never appear in a formula source string.
///
/// The grammar could not execute them anyway, but their presence means the
/// formula was written for a scripting host and should be surfaced as a
/// security rejection rather than silently evaluating to zero.
const FORBIDDEN: &[&str] = &[
    "exec", "eval", "system", "runtime", "process", "import", "package", "class", "invoke",
    "getclass", "forname", "function", "script", "new ",
];

/// Whitelisted unary math functions
const FUNCTIONS: &[&str] = &[
    "sqrt", "pow", "log", "log10", "sin", "cos", "tan", "asin", "acos", "atan", "abs", "round",
    "floor", "ceil",
];

/// Evaluate a formula source string.
///
/// Returns `Ok(0.0)` for anything that fails to lex or parse, and
/// `Err(FormulaError::Forbidden)` when the source matches the keyword
/// denylist. The denylist check runs before any evaluation.
pub fn evaluate(src: &str) -> FormulaResult<f64> {
    screen(src)?;
    match parse(src) {
        Ok(ast) => Ok(ast.eval()),
        Err(_) => Ok(0.0),
    }
}

/// Reject source strings containing execution/reflection keywords
pub fn screen(src: &str) -> FormulaResult<()> {
    let lowered = src.to_ascii_lowercase();
    for keyword in FORBIDDEN {
        if lowered.contains(keyword) {
            return Err(FormulaError::Forbidden(keyword.trim().to_string()));
        }
    }
    Ok(())
}

/// Parse a formula into an AST
pub fn parse(src: &str) -> FormulaResult<Ast> {
    let tokens = tokenize(src)?;
    let mut parser = Parser { tokens, pos: 0 };
    let ast = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(FormulaError::Parse(format!(
            "unexpected trailing input at token {}",
            parser.pos
        )));
    }
    Ok(ast)
}

/// A parsed formula expression
#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    /// Numeric literal or substituted constant
    Num(f64),
    /// Negation
    Neg(Box<Ast>),
    /// Binary operation
    Bin(BinOp, Box<Ast>, Box<Ast>),
    /// Whitelisted single-argument function call
    Call(Func, Box<Ast>),
    /// Two-argument power function
    Pow(Box<Ast>, Box<Ast>),
}

/// Binary arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Exp,
}

/// Whitelisted unary math functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Sqrt,
    Log,
    Log10,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Abs,
    Round,
    Floor,
    Ceil,
}

impl Ast {
    /// Evaluate this expression to a number
    pub fn eval(&self) -> f64 {
        match self {
            Ast::Num(n) => *n,
            Ast::Neg(a) => -a.eval(),
            Ast::Bin(op, a, b) => {
                let (x, y) = (a.eval(), b.eval());
                match op {
                    BinOp::Add => x + y,
                    BinOp::Sub => x - y,
                    BinOp::Mul => x * y,
                    BinOp::Div => {
                        if y == 0.0 {
                            0.0
                        } else {
                            x / y
                        }
                    }
                    BinOp::Exp => x.powf(y),
                }
            }
            Ast::Call(func, a) => {
                let x = a.eval();
                match func {
                    Func::Sqrt => x.sqrt(),
                    Func::Log => x.ln(),
                    Func::Log10 => x.log10(),
                    Func::Sin => x.sin(),
                    Func::Cos => x.cos(),
                    Func::Tan => x.tan(),
                    Func::Asin => x.asin(),
                    Func::Acos => x.acos(),
                    Func::Atan => x.atan(),
                    Func::Abs => x.abs(),
                    Func::Round => x.round(),
                    Func::Floor => x.floor(),
                    Func::Ceil => x.ceil(),
                }
            }
            Ast::Pow(a, b) => a.eval().powf(b.eval()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Comma,
}

fn tokenize(src: &str) -> FormulaResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = src.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
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
            '^' => {
                tokens.push(Token::Caret);
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
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let n = text
                    .parse::<f64>()
                    .map_err(|_| FormulaError::Parse(format!("bad number: {}", text)))?;
                tokens.push(Token::Num(n));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => {
                return Err(FormulaError::Parse(format!("unexpected character: {}", other)));
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, token: Token) -> FormulaResult<()> {
        match self.next() {
            Some(t) if t == token => Ok(()),
            other => Err(FormulaError::Parse(format!(
                "expected {:?}, got {:?}",
                token, other
            ))),
        }
    }

    /// expr := term (('+' | '-') term)*
    fn expr(&mut self) -> FormulaResult<Ast> {
        let mut lhs = self.term()?;
        while let Some(op) = match self.peek() {
            Some(Token::Plus) => Some(BinOp::Add),
            Some(Token::Minus) => Some(BinOp::Sub),
            _ => None,
        } {
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Ast::Bin(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    /// term := power (('*' | '/') power)*
    fn term(&mut self) -> FormulaResult<Ast> {
        let mut lhs = self.power()?;
        while let Some(op) = match self.peek() {
            Some(Token::Star) => Some(BinOp::Mul),
            Some(Token::Slash) => Some(BinOp::Div),
            _ => None,
        } {
            self.pos += 1;
            let rhs = self.power()?;
            lhs = Ast::Bin(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    /// power := unary ('^' unary)*, left-associative
    fn power(&mut self) -> FormulaResult<Ast> {
        let mut lhs = self.unary()?;
        while matches!(self.peek(), Some(Token::Caret)) {
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Ast::Bin(BinOp::Exp, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    /// unary := '-' unary | primary
    fn unary(&mut self) -> FormulaResult<Ast> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.pos += 1;
            let inner = self.unary()?;
            return Ok(Ast::Neg(Box::new(inner)));
        }
        self.primary()
    }

    /// primary := NUMBER | CONST | FUNC '(' expr [',' expr] ')' | '(' expr ')'
    fn primary(&mut self) -> FormulaResult<Ast> {
        match self.next() {
            Some(Token::Num(n)) => Ok(Ast::Num(n)),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => match name.as_str() {
                "E" => Ok(Ast::Num(std::f64::consts::E)),
                "PI" => Ok(Ast::Num(std::f64::consts::PI)),
                "pow" => {
                    self.expect(Token::LParen)?;
                    let base = self.expr()?;
                    self.expect(Token::Comma)?;
                    let exp = self.expr()?;
                    self.expect(Token::RParen)?;
                    Ok(Ast::Pow(Box::new(base), Box::new(exp)))
                }
                _ if FUNCTIONS.contains(&name.as_str()) => {
                    let func = match name.as_str() {
                        "sqrt" => Func::Sqrt,
                        "log" => Func::Log,
                        "log10" => Func::Log10,
                        "sin" => Func::Sin,
                        "cos" => Func::Cos,
                        "tan" => Func::Tan,
                        "asin" => Func::Asin,
                        "acos" => Func::Acos,
                        "atan" => Func::Atan,
                        "abs" => Func::Abs,
                        "round" => Func::Round,
                        "floor" => Func::Floor,
                        "ceil" => Func::Ceil,
                        _ => unreachable!(),
                    };
                    self.expect(Token::LParen)?;
                    let arg = self.expr()?;
                    self.expect(Token::RParen)?;
                    Ok(Ast::Call(func, Box::new(arg)))
                }
                other => Err(FormulaError::Parse(format!("unknown identifier: {}", other))),
            },
            other => Err(FormulaError::Parse(format!("unexpected token: {:?}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(src: &str) -> f64 {
        evaluate(src).unwrap()
    }

    #[test]
    fn test_literals_and_arithmetic() {
        assert_eq!(eval("42"), 42.0);
        assert_eq!(eval("1 + 2 * 3"), 7.0);
        assert_eq!(eval("(1 + 2) * 3"), 9.0);
        assert_eq!(eval("10 - 4 - 3"), 3.0);
        assert_eq!(eval("8 / 2 / 2"), 2.0);
    }

    #[test]
    fn test_exponent_binds_tighter_than_mul() {
        assert_eq!(eval("2 * 3 ^ 2"), 18.0);
        assert_eq!(eval("2 ^ 3 * 2"), 16.0);
    }

    #[test]
    fn test_exponent_left_associative() {
        // (2^3)^2, not 2^(3^2)
        assert_eq!(eval("2 ^ 3 ^ 2"), 64.0);
    }

    #[test]
    fn test_unary_minus() {
        assert_eq!(eval("-3 + 5"), 2.0);
        assert_eq!(eval("2 * -3"), -6.0);
        assert_eq!(eval("--4"), 4.0);
    }

    #[test]
    fn test_functions_and_constants() {
        assert_eq!(eval("sqrt(16)"), 4.0);
        assert_eq!(eval("pow(2, 10)"), 1024.0);
        assert_eq!(eval("abs(-5)"), 5.0);
        assert_eq!(eval("floor(3.7)"), 3.0);
        assert_eq!(eval("ceil(3.2)"), 4.0);
        assert_eq!(eval("round(2.5)"), 3.0);
        assert!((eval("log(E)") - 1.0).abs() < 1e-12);
        assert!((eval("cos(PI)") + 1.0).abs() < 1e-12);
        assert!((eval("log10(1000)") - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_division_by_zero_is_zero() {
        assert_eq!(eval("5 / 0"), 0.0);
        assert_eq!(eval("1 + 4 / (2 - 2)"), 1.0);
    }

    #[test]
    fn test_malformed_evaluates_to_zero() {
        assert_eq!(eval(""), 0.0);
        assert_eq!(eval("1 +"), 0.0);
        assert_eq!(eval("(1 + 2"), 0.0);
        assert_eq!(eval("bogus(3)"), 0.0);
        assert_eq!(eval("1 ? 2"), 0.0);
    }

    #[test]
    fn test_forbidden_keywords_rejected() {
        for src in [
            "exec(1)",
            "eval(2 + 2)",
            "System.currentTime",
            "Runtime(1)",
            "new Thing()",
            "function(x)",
        ] {
            assert!(
                matches!(evaluate(src), Err(FormulaError::Forbidden(_))),
                "should reject: {}",
                src
            );
        }
    }

    #[test]
    fn test_forbidden_checked_before_parse() {
        // Even syntactically invalid input is rejected when it carries a
        // forbidden keyword, never evaluated to 0.0.
        assert!(matches!(
            evaluate("((( eval"),
            Err(FormulaError::Forbidden(_))
        ));
    }
}

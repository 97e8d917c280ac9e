//! Calculator tool — evaluates arithmetic expressions.
//!
//! Supports `+`, `-`, `*`, `/`, parentheses, unary negation, and decimal
//! numbers. Implemented as a precedence-climbing parser over a simple
//! token stream; no dependencies beyond std.

use async_trait::async_trait;
use serde_json::{Map, Value};

use cipher_core::error::ToolError;
use cipher_core::tool::{ParamKind, ParamSpec, Tool, ToolSpec};

pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "calculator",
            "Evaluate a mathematical expression. Supports +, -, *, /, \
             parentheses, and decimal numbers, e.g. '(8000 + 36500) / 12'.",
            vec![ParamSpec::required(
                "expression",
                ParamKind::String,
                "The expression to evaluate",
            )],
        )
    }

    async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let expression = arguments
            .get("expression")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArgument("'expression' must be a string".into()))?;

        let result = evaluate(expression).map_err(|reason| ToolError::Execution {
            tool_name: "calculator".into(),
            reason,
        })?;

        Ok(serde_json::json!({ "result": result }))
    }
}

// ── Expression evaluator ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Op(char),
    Open,
    Close,
}

/// Evaluate an arithmetic expression string.
pub fn evaluate(expression: &str) -> Result<f64, String> {
    let tokens = scan(expression)?;
    if tokens.is_empty() {
        return Err("Empty expression".into());
    }
    let mut cursor = Cursor { tokens, pos: 0 };
    let value = cursor.expression(0)?;
    if cursor.pos < cursor.tokens.len() {
        return Err(format!(
            "Unexpected trailing token at position {}",
            cursor.pos
        ));
    }
    Ok(value)
}

fn scan(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '+' | '-' | '*' | '/' => {
                tokens.push(Token::Op(c));
                chars.next();
            }
            '(' => {
                tokens.push(Token::Open);
                chars.next();
            }
            ')' => {
                tokens.push(Token::Close);
                chars.next();
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let number: f64 = literal
                    .parse()
                    .map_err(|_| format!("Invalid number: {literal}"))?;
                tokens.push(Token::Number(number));
            }
            other => return Err(format!("Unexpected character: '{other}'")),
        }
    }

    Ok(tokens)
}

struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl Cursor {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Precedence climbing: parse operands joined by operators of at least
    /// `min_bp` binding power.
    fn expression(&mut self, min_bp: u8) -> Result<f64, String> {
        let mut left = self.operand()?;

        while let Some(Token::Op(op)) = self.peek() {
            let bp = binding_power(op);
            if bp < min_bp {
                break;
            }
            self.advance();
            let right = self.expression(bp + 1)?;
            left = apply(op, left, right)?;
        }

        Ok(left)
    }

    fn operand(&mut self) -> Result<f64, String> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::Op('-')) => Ok(-self.operand()?),
            Some(Token::Open) => {
                let value = self.expression(0)?;
                match self.advance() {
                    Some(Token::Close) => Ok(value),
                    _ => Err("Expected closing parenthesis".into()),
                }
            }
            Some(token) => Err(format!("Unexpected token: {token:?}")),
            None => Err("Unexpected end of expression".into()),
        }
    }
}

fn binding_power(op: char) -> u8 {
    match op {
        '+' | '-' => 1,
        '*' | '/' => 2,
        _ => 0,
    }
}

fn apply(op: char, left: f64, right: f64) -> Result<f64, String> {
    match op {
        '+' => Ok(left + right),
        '-' => Ok(left - right),
        '*' => Ok(left * right),
        '/' => {
            if right == 0.0 {
                Err("Division by zero".into())
            } else {
                Ok(left / right)
            }
        }
        other => Err(format!("Unknown operator: '{other}'")),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_addition() {
        assert_eq!(evaluate("2 + 3").unwrap(), 5.0);
    }

    #[test]
    fn operator_precedence() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("20 - 10 / 2").unwrap(), 15.0);
    }

    #[test]
    fn parentheses_override_precedence() {
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(evaluate("((1 + 2) * (3 + 4))").unwrap(), 21.0);
    }

    #[test]
    fn left_associative_subtraction() {
        assert_eq!(evaluate("10 - 3 - 2").unwrap(), 5.0);
        assert_eq!(evaluate("100 / 10 / 2").unwrap(), 5.0);
    }

    #[test]
    fn unary_negation() {
        assert_eq!(evaluate("-5 + 3").unwrap(), -2.0);
        assert_eq!(evaluate("2 * -3").unwrap(), -6.0);
        assert_eq!(evaluate("--4").unwrap(), 4.0);
    }

    #[test]
    fn decimals() {
        assert_eq!(evaluate("3.5 * 2").unwrap(), 7.0);
        assert_eq!(evaluate("10 / 4").unwrap(), 2.5);
    }

    #[test]
    fn division_by_zero_is_error() {
        assert!(evaluate("1 / 0").is_err());
    }

    #[test]
    fn malformed_expressions_are_errors() {
        assert!(evaluate("").is_err());
        assert!(evaluate("2 +").is_err());
        assert!(evaluate("(2 + 3").is_err());
        assert!(evaluate("2 3").is_err());
        assert!(evaluate("hello").is_err());
        assert!(evaluate("1..2 + 3").is_err());
    }

    #[test]
    fn original_style_expression() {
        assert_eq!(evaluate("5 + (9 - 4) * 3650").unwrap(), 18255.0);
    }

    #[tokio::test]
    async fn tool_returns_result_object() {
        let tool = CalculatorTool;
        let mut args = Map::new();
        args.insert("expression".into(), Value::String("(2 + 3) * 4".into()));

        let payload = tool.invoke(args).await.unwrap();
        assert_eq!(payload["result"], 20.0);
    }

    #[tokio::test]
    async fn tool_surfaces_evaluation_error() {
        let tool = CalculatorTool;
        let mut args = Map::new();
        args.insert("expression".into(), Value::String("1 / 0".into()));

        let err = tool.invoke(args).await.unwrap_err();
        assert!(matches!(err, ToolError::Execution { .. }));
        assert!(err.to_string().contains("Division by zero"));
    }

    #[tokio::test]
    async fn tool_rejects_non_string_expression() {
        let tool = CalculatorTool;
        let mut args = Map::new();
        args.insert("expression".into(), Value::from(5));
        let err = tool.invoke(args).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument(_)));
    }
}

//! The embedded script host: an external collaborator, kept deliberately small. The
//! scripting language itself is out of scope; what's implemented here is just enough of
//! a statement/expression surface to drive the command dispatcher from `-f`/`-e`/`-i`/
//! `-p`, plus the one documented quirk of the original host worth preserving: a bare
//! expression typed at the interactive prompt isn't a valid top-level statement on its
//! own, so evaluation retries with `return ` prepended before giving up.

use crate::commands;
use anyhow::{bail, Context, Result};
use rasterkit_core::{bcn::EncodeFlags, ImageRef};
use std::{collections::HashMap, path::PathBuf};

#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    Text(String),
    Image(ImageRef),
    List(Vec<Value>),
    Unit,
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Image(img) => write!(f, "<image {}x{} c{}{}>", img.width(), img.height(), img.colour_channels(), if img.has_alpha() { "+a" } else { "" }),
            Value::List(items) => write!(f, "[{}]", items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")),
            Value::Unit => write!(f, "()"),
        }
    }
}

impl Value {
    fn as_number(&self) -> Result<f64> {
        match self {
            Value::Number(n) => Ok(*n),
            other => bail!("expected a number, got {other}"),
        }
    }

    fn as_text(&self) -> Result<&str> {
        match self {
            Value::Text(s) => Ok(s),
            other => bail!("expected a string, got {other}"),
        }
    }

    fn as_image(&self) -> Result<&ImageRef> {
        match self {
            Value::Image(img) => Ok(img),
            other => bail!("expected an image, got {other}"),
        }
    }
}

#[derive(Debug, Clone)]
enum Token {
    Ident(String),
    Number(f64),
    Str(String),
    Symbol(char),
}

fn lex(src: &str) -> Result<Vec<Token>> {
    let mut chars = src.chars().peekable();
    let mut tokens = Vec::new();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '#' => {
                while chars.peek().is_some_and(|&c| c != '\n') {
                    chars.next();
                }
            }
            '"' => {
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some(c) => s.push(c),
                        None => bail!("unterminated string literal"),
                    }
                }
                tokens.push(Token::Str(s));
            }
            c if c.is_ascii_digit() || (c == '-' && tokens.last().map_or(true, starts_new_operand)) => {
                let mut s = String::new();
                if c == '-' {
                    s.push(c);
                    chars.next();
                }
                while chars.peek().is_some_and(|&c| c.is_ascii_digit() || c == '.') {
                    s.push(chars.next().unwrap());
                }
                tokens.push(Token::Number(s.parse().with_context(|| format!("invalid number literal {s:?}"))?));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut s = String::new();
                while chars.peek().is_some_and(|&c| c.is_alphanumeric() || c == '_') {
                    s.push(chars.next().unwrap());
                }
                tokens.push(Token::Ident(s));
            }
            '+' | '-' | '*' | '/' | '(' | ')' | ',' | '=' | ';' => {
                tokens.push(Token::Symbol(c));
                chars.next();
            }
            other => bail!("unexpected character {other:?}"),
        }
    }
    Ok(tokens)
}

fn starts_new_operand(tok: &Token) -> bool {
    !matches!(tok, Token::Number(_) | Token::Ident(_)) || matches!(tok, Token::Symbol(')'))
}

#[derive(Debug, Clone)]
enum Expr {
    Number(f64),
    Str(String),
    Var(String),
    Call(String, Vec<Expr>),
    BinOp(Box<Expr>, char, Box<Expr>),
}

#[derive(Debug, Clone)]
enum Stmt {
    Assign(String, Expr),
    Return(Expr),
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
        self.pos += 1;
        t
    }

    fn expect_symbol(&mut self, c: char) -> Result<()> {
        match self.next() {
            Some(Token::Symbol(s)) if s == c => Ok(()),
            other => bail!("expected {c:?}, got {other:?}"),
        }
    }

    fn parse_program(&mut self) -> Result<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while self.peek().is_some() {
            stmts.push(self.parse_stmt()?);
            while matches!(self.peek(), Some(Token::Symbol(';'))) {
                self.next();
            }
        }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt> {
        if let Some(Token::Ident(name)) = self.peek().cloned() {
            if name == "return" {
                self.next();
                return Ok(Stmt::Return(self.parse_expr()?));
            }
            if matches!(self.tokens.get(self.pos + 1), Some(Token::Symbol('='))) {
                self.next();
                self.next();
                return Ok(Stmt::Assign(name, self.parse_expr()?));
            }
        }
        bail!("a statement must be an assignment (`name = expr`) or `return expr`; bare expressions are not statements")
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_term()?;
        while let Some(Token::Symbol(op @ ('+' | '-'))) = self.peek() {
            let op = *op;
            self.next();
            let rhs = self.parse_term()?;
            lhs = Expr::BinOp(Box::new(lhs), op, Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_atom()?;
        while let Some(Token::Symbol(op @ ('*' | '/'))) = self.peek() {
            let op = *op;
            self.next();
            let rhs = self.parse_atom()?;
            lhs = Expr::BinOp(Box::new(lhs), op, Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_atom(&mut self) -> Result<Expr> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Str(s)) => Ok(Expr::Str(s)),
            Some(Token::Symbol('(')) => {
                let e = self.parse_expr()?;
                self.expect_symbol(')')?;
                Ok(e)
            }
            Some(Token::Ident(name)) => {
                if matches!(self.peek(), Some(Token::Symbol('('))) {
                    self.next();
                    let mut args = Vec::new();
                    if !matches!(self.peek(), Some(Token::Symbol(')'))) {
                        loop {
                            args.push(self.parse_expr()?);
                            match self.peek() {
                                Some(Token::Symbol(',')) => {
                                    self.next();
                                }
                                _ => break,
                            }
                        }
                    }
                    self.expect_symbol(')')?;
                    Ok(Expr::Call(name, args))
                } else {
                    Ok(Expr::Var(name))
                }
            }
            other => bail!("expected an expression, got {other:?}"),
        }
    }
}

fn parse_program(src: &str) -> Result<Vec<Stmt>> {
    let tokens = lex(src)?;
    let mut parser = Parser { tokens, pos: 0 };
    let program = parser.parse_program()?;
    if parser.pos < parser.tokens.len() {
        bail!("trailing tokens after end of program");
    }
    Ok(program)
}

/// The script host's variable environment: positional script arguments land in `arg1`,
/// `arg2`, ... (`argN` for each trailing CLI positional, 1-indexed, matching the
/// source's argument-numbering convention) before any statement runs.
pub struct Env {
    vars: HashMap<String, Value>,
}

impl Env {
    pub fn new(script_args: &[String]) -> Self {
        let mut vars = HashMap::new();
        for (i, arg) in script_args.iter().enumerate() {
            vars.insert(format!("arg{}", i + 1), Value::Text(arg.clone()));
        }
        Self { vars }
    }
}

/// Evaluate one script-host snippet. Interactive mode calls this per line typed; `-f`/
/// `-e` call it once with the whole source. Returns the value of the last `return`
/// statement executed, if any.
pub fn eval_snippet(src: &str, env: &mut Env) -> Result<Option<Value>> {
    let program = parse_program(src).or_else(|first_err| {
        parse_program(&format!("return {src}")).map_err(|_| first_err)
    })?;
    let mut result = None;
    for stmt in program {
        match stmt {
            Stmt::Assign(name, expr) => {
                let value = eval_expr(&expr, env)?;
                env.vars.insert(name, value);
            }
            Stmt::Return(expr) => {
                result = Some(eval_expr(&expr, env)?);
            }
        }
    }
    Ok(result)
}

fn eval_expr(expr: &Expr, env: &mut Env) -> Result<Value> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Str(s) => Ok(Value::Text(s.clone())),
        Expr::Var(name) => env.vars.get(name).cloned().with_context(|| format!("undefined variable {name:?}")),
        Expr::BinOp(lhs, op, rhs) => {
            let a = eval_expr(lhs, env)?.as_number()?;
            let b = eval_expr(rhs, env)?.as_number()?;
            Ok(Value::Number(match op {
                '+' => a + b,
                '-' => a - b,
                '*' => a * b,
                '/' => a / b,
                other => bail!("unknown operator {other:?}"),
            }))
        }
        Expr::Call(name, arg_exprs) => {
            let mut args = Vec::with_capacity(arg_exprs.len());
            for e in arg_exprs {
                args.push(eval_expr(e, env)?);
            }
            call_builtin(name, &args)
        }
    }
}

fn call_builtin(name: &str, args: &[Value]) -> Result<Value> {
    match name {
        "load" => Ok(Value::Image(commands::load(&PathBuf::from(args.first().context("load(path)")?.as_text()?))?)),
        "save" => {
            let img = args.first().context("save(img, path[, format])")?.as_image()?;
            let path = PathBuf::from(args.get(1).context("save(img, path[, format])")?.as_text()?);
            let format = args.get(2).map(|v| v.as_text()).transpose()?;
            commands::save(img, &path, format, EncodeFlags::default())?;
            Ok(Value::Unit)
        }
        "make" => {
            let w = args.first().context("make(w, h, channels, alpha, fill...)")?.as_number()? as u32;
            let h = args.get(1).context("make needs height")?.as_number()? as u32;
            let channels = args.get(2).context("make needs channel count")?.as_number()? as usize;
            let alpha = args.get(3).context("make needs an alpha flag")?.as_number()? != 0.0;
            let fill: Vec<f32> = args[4..].iter().map(|v| v.as_number().map(|n| n as f32)).collect::<Result<_>>()?;
            Ok(Value::Image(commands::make(w, h, channels, alpha, &fill)?))
        }
        "crop" => {
            let img = args.first().context("crop(img, left, bottom, w, h)")?.as_image()?;
            let left = args.get(1).context("crop needs left")?.as_number()? as i64;
            let bottom = args.get(2).context("crop needs bottom")?.as_number()? as i64;
            let w = args.get(3).context("crop needs width")?.as_number()? as u32;
            let h = args.get(4).context("crop needs height")?.as_number()? as u32;
            Ok(Value::Image(commands::crop(img, left, bottom, w, h)))
        }
        "flip_x" => Ok(Value::Image(commands::flip_x(args.first().context("flip_x(img)")?.as_image()?))),
        "flip_y" => Ok(Value::Image(commands::flip_y(args.first().context("flip_y(img)")?.as_image()?))),
        "scale" => {
            let img = args.first().context("scale(img, w, h, filter)")?.as_image()?;
            let w = args.get(1).context("scale needs width")?.as_number()? as u32;
            let h = args.get(2).context("scale needs height")?.as_number()? as u32;
            let filter = args.get(3).context("scale needs a filter name")?.as_text()?;
            Ok(Value::Image(commands::scale(img, w, h, filter)?))
        }
        "rotate" => {
            let img = args.first().context("rotate(img, radians)")?.as_image()?;
            let radians = args.get(1).context("rotate needs an angle")?.as_number()?;
            Ok(Value::Image(commands::rotate(img, radians)))
        }
        "mipmaps" => {
            let img = args.first().context("mipmaps(img, filter)")?.as_image()?;
            let filter = args.get(1).context("mipmaps needs a filter name")?.as_text()?;
            Ok(Value::List(commands::mipmaps(img, filter)?.into_iter().map(Value::Image).collect()))
        }
        "volume_mipmaps" => {
            if args.is_empty() {
                bail!("volume_mipmaps(slice1, slice2, ...) needs at least one depth slice");
            }
            let slices: Vec<ImageRef> = args.iter().map(|v| v.as_image().map(|i| i.clone())).collect::<Result<_>>()?;
            let levels = commands::volume_mipmaps(&slices)?;
            Ok(Value::List(
                levels.into_iter().map(|level| Value::List(level.into_iter().map(Value::Image).collect())).collect(),
            ))
        }
        "to_luminance" => Ok(Value::Image(commands::to_luminance(args.first().context("to_luminance(img)")?.as_image()?)?)),
        "swizzle" => {
            let img = args.first().context("swizzle(img, spec)")?.as_image()?;
            let spec = args.get(1).context("swizzle needs a selector spec")?.as_text()?;
            Ok(Value::Image(commands::swizzle(img, spec)?))
        }
        "width" => Ok(Value::Number(args.first().context("width(img)")?.as_image()?.width() as f64)),
        "height" => Ok(Value::Number(args.first().context("height(img)")?.as_image()?.height() as f64)),
        other => bail!("no such builtin {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bare_expression_retries_with_return_prefix() {
        let mut env = Env::new(&[]);
        let value = eval_snippet("1 + 2 * 3", &mut env).unwrap().unwrap();
        assert_eq!(value.as_number().unwrap(), 7.0);
    }

    #[test]
    fn explicit_return_needs_no_retry() {
        let mut env = Env::new(&[]);
        let value = eval_snippet("return 10 - 4", &mut env).unwrap().unwrap();
        assert_eq!(value.as_number().unwrap(), 6.0);
    }

    #[test]
    fn assignment_then_reference_across_snippets() {
        let mut env = Env::new(&[]);
        assert!(eval_snippet("x = 4 * 4", &mut env).unwrap().is_none());
        let value = eval_snippet("return x + 1", &mut env).unwrap().unwrap();
        assert_eq!(value.as_number().unwrap(), 17.0);
    }

    #[test]
    fn script_arguments_land_in_arg_n_variables() {
        let mut env = Env::new(&["hello.png".to_string()]);
        let value = eval_snippet("return arg1", &mut env).unwrap().unwrap();
        assert_eq!(value.as_text().unwrap(), "hello.png");
    }

    #[test]
    fn make_and_width_round_trip_through_the_dispatcher() {
        let mut env = Env::new(&[]);
        assert!(eval_snippet(r#"img = make(3, 2, 1, 0, 0.5)"#, &mut env).unwrap().is_none());
        let value = eval_snippet("return width(img)", &mut env).unwrap().unwrap();
        assert_eq!(value.as_number().unwrap(), 3.0);
    }

    #[test]
    fn volume_mipmaps_builtin_returns_a_nested_list_of_levels() {
        let mut env = Env::new(&[]);
        for i in 0..4 {
            eval_snippet(&format!("s{i} = make(4, 4, 1, 0, 1.0)"), &mut env).unwrap();
        }
        let value = eval_snippet("return volume_mipmaps(s0, s1, s2, s3)", &mut env).unwrap().unwrap();
        match value {
            Value::List(levels) => {
                assert_eq!(levels.len(), 3);
                match &levels[0] {
                    Value::List(slices) => assert_eq!(slices.len(), 4),
                    other => panic!("expected a list of slices, got {other}"),
                }
                match &levels[2] {
                    Value::List(slices) => assert_eq!(slices.len(), 1),
                    other => panic!("expected a list of slices, got {other}"),
                }
            }
            other => panic!("expected a list of levels, got {other}"),
        }
    }

    #[test]
    fn truly_malformed_input_still_errs_after_the_retry() {
        let mut env = Env::new(&[]);
        assert!(eval_snippet("x = = =", &mut env).is_err());
    }
}

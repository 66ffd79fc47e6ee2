//! Small text template engine for channel names and descriptions.
//!
//! Syntax is a subset of Go's `text/template`, which existing configurations
//! are written in:
//!
//! ```text
//! {{ if .Info }}🟢 {{ .Info.Players }}/{{ .Info.MaxPlayers }}{{ else }}🔴 offline{{ end }}
//! {{ ValueColorEmoji .Info.Players .Info.MaxPlayers }} {{ CountryEmoji "Germany" }}
//! ```
//!
//! Actions may trim surrounding whitespace with `{{-` and `-}}`. Helper
//! functions are pure and live in a table owned by the [`Renderer`].

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Signature of a template helper function.
pub type HelperFn = fn(&[Value]) -> Result<Value, TemplateError>;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("unclosed action starting at byte {0}")]
    UnclosedAction(usize),
    #[error("unexpected `{0}` outside of an if block")]
    UnexpectedKeyword(String),
    #[error("if block is missing its end")]
    UnterminatedBlock,
    #[error("invalid expression `{0}`")]
    BadExpression(String),
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    #[error("{name}: {reason}")]
    Helper { name: &'static str, reason: String },
    #[error("failed to build template context: {0}")]
    Context(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Path(Vec<String>),
    Literal(Value),
    Call { name: String, args: Vec<Expr> },
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Expr(Expr),
    If {
        cond: Expr,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

#[derive(Debug)]
enum Token {
    Text(String),
    Action(String),
}

enum Terminator {
    Eof,
    End,
    Else,
    ElseIf(Expr),
}

/// Renders templates against a JSON-like context.
pub struct Renderer {
    helpers: HashMap<&'static str, HelperFn>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    /// Creates a renderer with the built-in helper table registered.
    pub fn new() -> Self {
        let mut renderer = Self {
            helpers: HashMap::new(),
        };
        renderer.register("AppID", helper_app_id);
        renderer.register("TimeEmoji", helper_time_emoji);
        renderer.register("DurationEmoji", helper_duration_emoji);
        renderer.register("OSEmoji", helper_os_emoji);
        renderer.register("CountryEmoji", helper_country_emoji);
        renderer.register("CodeEmoji", helper_code_emoji);
        renderer.register("ValueColorEmoji", helper_value_color_emoji);
        renderer
    }

    pub fn register(&mut self, name: &'static str, helper: HelperFn) {
        self.helpers.insert(name, helper);
    }

    /// Serializes `context` and renders `template` against it.
    pub fn render<C: Serialize>(&self, template: &str, context: &C) -> Result<String, TemplateError> {
        let context = serde_json::to_value(context)?;
        self.render_value(template, &context)
    }

    /// Renders `template` against an already serialized context.
    pub fn render_value(&self, template: &str, context: &Value) -> Result<String, TemplateError> {
        let tokens = tokenize(template)?;
        let mut pos = 0;
        let (nodes, terminator) = parse_block(&tokens, &mut pos)?;
        match terminator {
            Terminator::Eof => {}
            Terminator::End => return Err(TemplateError::UnexpectedKeyword("end".into())),
            Terminator::Else | Terminator::ElseIf(_) => {
                return Err(TemplateError::UnexpectedKeyword("else".into()))
            }
        }

        let mut out = String::with_capacity(template.len());
        self.render_nodes(&nodes, context, &mut out)?;
        Ok(out)
    }

    fn render_nodes(&self, nodes: &[Node], context: &Value, out: &mut String) -> Result<(), TemplateError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Expr(expr) => {
                    let value = self.eval(expr, context)?;
                    write_value(&value, out);
                }
                Node::If { cond, then, otherwise } => {
                    if is_truthy(&self.eval(cond, context)?) {
                        self.render_nodes(then, context, out)?;
                    } else {
                        self.render_nodes(otherwise, context, out)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn eval(&self, expr: &Expr, context: &Value) -> Result<Value, TemplateError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Path(segments) => Ok(lookup(context, segments)),
            Expr::Call { name, args } => {
                let helper = self
                    .helpers
                    .get(name.as_str())
                    .ok_or_else(|| TemplateError::UnknownFunction(name.clone()))?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg, context))
                    .collect::<Result<Vec<_>, _>>()?;
                helper(&args)
            }
        }
    }
}

fn tokenize(template: &str) -> Result<Vec<Token>, TemplateError> {
    let mut tokens = Vec::new();
    let mut rest = template;
    let mut offset = 0;
    let mut trim_next = false;

    while let Some(start) = rest.find("{{") {
        let mut text = &rest[..start];
        if trim_next {
            text = text.trim_start();
        }

        let after_open = &rest[start + 2..];
        let end = after_open
            .find("}}")
            .ok_or(TemplateError::UnclosedAction(offset + start))?;
        let mut inner = &after_open[..end];

        if let Some(stripped) = inner.strip_prefix('-') {
            text = text.trim_end();
            inner = stripped;
        }
        trim_next = false;
        if let Some(stripped) = inner.strip_suffix('-') {
            trim_next = true;
            inner = stripped;
        }

        if !text.is_empty() {
            tokens.push(Token::Text(text.to_string()));
        }
        tokens.push(Token::Action(inner.trim().to_string()));

        let consumed = start + 2 + end + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }

    let tail = if trim_next { rest.trim_start() } else { rest };
    if !tail.is_empty() {
        tokens.push(Token::Text(tail.to_string()));
    }

    Ok(tokens)
}

fn parse_block(tokens: &[Token], pos: &mut usize) -> Result<(Vec<Node>, Terminator), TemplateError> {
    let mut nodes = Vec::new();

    while *pos < tokens.len() {
        let token = &tokens[*pos];
        *pos += 1;

        match token {
            Token::Text(text) => nodes.push(Node::Text(text.clone())),
            Token::Action(action) => {
                let (keyword, rest) = split_keyword(action);
                match keyword {
                    "end" if rest.is_empty() => return Ok((nodes, Terminator::End)),
                    "else" if rest.is_empty() => return Ok((nodes, Terminator::Else)),
                    "else" => {
                        let (inner, cond) = split_keyword(rest);
                        if inner != "if" {
                            return Err(TemplateError::BadExpression(action.clone()));
                        }
                        return Ok((nodes, Terminator::ElseIf(parse_expr(cond)?)));
                    }
                    "if" => {
                        let cond = parse_expr(rest)?;
                        nodes.push(parse_if(cond, tokens, pos)?);
                    }
                    _ if action.is_empty() || action.starts_with("/*") => {}
                    _ => nodes.push(Node::Expr(parse_expr(action)?)),
                }
            }
        }
    }

    Ok((nodes, Terminator::Eof))
}

fn parse_if(cond: Expr, tokens: &[Token], pos: &mut usize) -> Result<Node, TemplateError> {
    let (then, terminator) = parse_block(tokens, pos)?;
    let otherwise = match terminator {
        Terminator::End => Vec::new(),
        Terminator::Else => {
            let (otherwise, terminator) = parse_block(tokens, pos)?;
            match terminator {
                Terminator::End => otherwise,
                Terminator::Eof => return Err(TemplateError::UnterminatedBlock),
                Terminator::Else | Terminator::ElseIf(_) => {
                    return Err(TemplateError::UnexpectedKeyword("else".into()))
                }
            }
        }
        // `else if` shares the `end` of the enclosing if
        Terminator::ElseIf(nested) => vec![parse_if(nested, tokens, pos)?],
        Terminator::Eof => return Err(TemplateError::UnterminatedBlock),
    };

    Ok(Node::If { cond, then, otherwise })
}

fn split_keyword(action: &str) -> (&str, &str) {
    match action.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (action, ""),
    }
}

fn parse_expr(source: &str) -> Result<Expr, TemplateError> {
    let words = split_words(source).ok_or_else(|| TemplateError::BadExpression(source.to_string()))?;

    match words.as_slice() {
        [] => None,
        [single] => parse_operand(single).or_else(|| {
            is_identifier(single).then(|| Expr::Call {
                name: single.clone(),
                args: Vec::new(),
            })
        }),
        [name, args @ ..] if is_identifier(name) => {
            let args = args.iter().map(|arg| parse_operand(arg)).collect::<Option<Vec<_>>>();
            args.map(|args| Expr::Call {
                name: name.clone(),
                args,
            })
        }
        _ => None,
    }
    .ok_or_else(|| TemplateError::BadExpression(source.to_string()))
}

fn parse_operand(word: &str) -> Option<Expr> {
    if word == "." {
        return Some(Expr::Path(Vec::new()));
    }
    if let Some(path) = word.strip_prefix('.') {
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| !is_identifier(s)) {
            return None;
        }
        return Some(Expr::Path(segments));
    }
    if let Some(quoted) = word.strip_prefix('"').and_then(|w| w.strip_suffix('"')) {
        return Some(Expr::Literal(Value::String(quoted.replace("\\\"", "\""))));
    }
    match word {
        "true" => return Some(Expr::Literal(Value::Bool(true))),
        "false" => return Some(Expr::Literal(Value::Bool(false))),
        "nil" => return Some(Expr::Literal(Value::Null)),
        _ => {}
    }
    if let Ok(int) = word.parse::<i64>() {
        return Some(Expr::Literal(Value::from(int)));
    }
    if let Ok(float) = word.parse::<f64>() {
        return Some(Expr::Literal(Value::from(float)));
    }
    None
}

fn is_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Splits on whitespace, keeping double quoted strings intact. Returns
/// `None` on an unbalanced quote.
fn split_words(source: &str) -> Option<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for c in source.chars() {
        if in_quotes {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_quotes = false;
            }
        } else if c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        } else {
            if c == '"' {
                in_quotes = true;
            }
            current.push(c);
        }
    }

    if in_quotes {
        return None;
    }
    if !current.is_empty() {
        words.push(current);
    }
    Some(words)
}

fn lookup(context: &Value, segments: &[String]) -> Value {
    let mut current = context;
    for segment in segments {
        match current.get(segment) {
            Some(next) => current = next,
            None => return Value::Null,
        }
    }
    current.clone()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => {}
        Value::String(s) => out.push_str(s),
        other => out.push_str(&other.to_string()),
    }
}

// Helpers

fn arity(name: &'static str, args: &[Value], expected: usize) -> Result<(), TemplateError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(TemplateError::Helper {
            name,
            reason: format!("expected {} argument(s), got {}", expected, args.len()),
        })
    }
}

/// Coerces numbers and numeric strings to an integer, anything else is 0.
fn to_i64(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| i64::try_from(u).unwrap_or(i64::MAX)))
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        Value::Bool(b) => i64::from(*b),
        _ => 0,
    }
}

fn as_text(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

/// Human readable name of well known Steam application ids.
pub fn app_name(app_id: u64) -> Option<&'static str> {
    let name = match app_id {
        crate::APP_ID_DAYZ => "DayZ",
        crate::APP_ID_DAYZ_EXP => "DayZ Experimental",
        crate::APP_ID_ARMA3 => "Arma 3",
        107_400 => "Arma 2",
        33_930 => "Arma 2: Operation Arrowhead",
        1_874_880 => "Arma Reforger",
        730 => "Counter-Strike 2",
        252_490 => "Rust",
        346_110 => "ARK: Survival Evolved",
        440 => "Team Fortress 2",
        4_000 => "Garry's Mod",
        550 => "Left 4 Dead 2",
        _ => return None,
    };
    Some(name)
}

fn helper_app_id(args: &[Value]) -> Result<Value, TemplateError> {
    arity("AppID", args, 1)?;
    let id = to_i64(&args[0]);
    let name = u64::try_from(id)
        .ok()
        .and_then(app_name)
        .map(str::to_string)
        .unwrap_or_else(|| id.to_string());
    Ok(Value::String(name))
}

/// 🌙 for night (before 7 or after 20 o'clock), 🌞 for day. Accepts an
/// `HH:MM` string or a number of hours.
fn helper_time_emoji(args: &[Value]) -> Result<Value, TemplateError> {
    arity("TimeEmoji", args, 1)?;
    let hours = match &args[0] {
        Value::Null => return Ok(Value::String(String::new())),
        Value::String(s) => match s.split_once(':') {
            Some((h, _)) => h.trim().parse::<f64>().ok(),
            None => s.trim().parse::<f64>().ok(),
        },
        Value::Number(n) => n.as_f64(),
        _ => None,
    };

    let hours = hours.ok_or_else(|| TemplateError::Helper {
        name: "TimeEmoji",
        reason: format!("cannot read a time from {}", args[0]),
    })?;

    Ok(Value::String(day_night_emoji(hours).to_string()))
}

/// Same day/night rule as `TimeEmoji` for a duration since midnight, taken
/// modulo 24 hours. Numbers are seconds; strings may carry `h`, `m` and `s`
/// units such as `13h`, `90m` or `7h30m`.
fn helper_duration_emoji(args: &[Value]) -> Result<Value, TemplateError> {
    arity("DurationEmoji", args, 1)?;
    let seconds = match &args[0] {
        Value::Null => return Ok(Value::String(String::new())),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => duration_seconds(s.trim()),
        _ => None,
    };

    let seconds = seconds.ok_or_else(|| TemplateError::Helper {
        name: "DurationEmoji",
        reason: format!("cannot read a duration from {}", args[0]),
    })?;

    Ok(Value::String(day_night_emoji(seconds / 3600.0).to_string()))
}

fn duration_seconds(text: &str) -> Option<f64> {
    if let Ok(seconds) = text.parse::<f64>() {
        return Some(seconds);
    }

    let mut total = 0.0;
    let mut number = String::new();
    for c in text.chars() {
        let scale = match c {
            'h' => 3600.0,
            'm' => 60.0,
            's' => 1.0,
            c if c.is_ascii_digit() || c == '.' => {
                number.push(c);
                continue;
            }
            _ => return None,
        };
        total += number.parse::<f64>().ok()? * scale;
        number.clear();
    }

    if text.is_empty() || !number.is_empty() {
        return None;
    }
    Some(total)
}

/// 🌙 for night (before 7 or after 20 o'clock), 🌞 for day.
fn day_night_emoji(hours: f64) -> &'static str {
    let hour = hours.rem_euclid(24.0);
    if hour < 7.0 || hour > 20.0 {
        "🌙"
    } else {
        "🌞"
    }
}

fn helper_os_emoji(args: &[Value]) -> Result<Value, TemplateError> {
    arity("OSEmoji", args, 1)?;
    let emoji = match as_text(&args[0]).to_lowercase().as_str() {
        "a" | "m" | "o" | "apple" | "mac" | "osx" | "ios" => "🍎",
        "l" | "nix" | "linux" | "tux" => "🐧",
        "w" | "win" | "windows" | "nt" => "🪟",
        _ => "😈",
    };
    Ok(Value::String(emoji.to_string()))
}

fn helper_country_emoji(args: &[Value]) -> Result<Value, TemplateError> {
    arity("CountryEmoji", args, 1)?;
    Ok(Value::String(country_flag(&as_text(&args[0]))))
}

fn helper_code_emoji(args: &[Value]) -> Result<Value, TemplateError> {
    arity("CodeEmoji", args, 1)?;
    Ok(Value::String(code_flag(&as_text(&args[0]))))
}

/// Colour by fill ratio: 🟣 empty, 🔵 ≤10%, 🟢 ≤50%, 🟡 ≤75%, 🟠 ≤90%,
/// 🔴 above, 🚫 out of range.
fn helper_value_color_emoji(args: &[Value]) -> Result<Value, TemplateError> {
    arity("ValueColorEmoji", args, 2)?;
    let value = to_i64(&args[0]);
    let limit = to_i64(&args[1]);

    let emoji = if value == 0 {
        "🟣"
    } else if value < 0 || value > limit {
        "🚫"
    } else {
        let proportion = value as f64 / limit as f64;
        match proportion {
            p if p <= 0.1 => "🔵",
            p if p <= 0.5 => "🟢",
            p if p <= 0.75 => "🟡",
            p if p <= 0.9 => "🟠",
            _ => "🔴",
        }
    };
    Ok(Value::String(emoji.to_string()))
}

const WHITE_FLAG: &str = "🏳️";

fn country_flag(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    let exception = match lower.as_str() {
        "united kingdom" => Some("GB"),
        "usa" | "united states" => Some("US"),
        "south korea" => Some("KR"),
        "south africa" => Some("ZA"),
        "new zealand" => Some("NZ"),
        "north korea" => Some("KP"),
        "east timor" => Some("TL"),
        "united arab emirates" => Some("AE"),
        _ => None,
    };
    if let Some(code) = exception {
        return code_flag(code);
    }

    let letters: String = lower
        .chars()
        .filter(|c| c.is_alphabetic())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect();
    if letters.chars().count() == 2 {
        code_flag(&letters)
    } else {
        WHITE_FLAG.to_string()
    }
}

fn code_flag(code: &str) -> String {
    let code = code.trim();
    if code.len() != 2 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
        return WHITE_FLAG.to_string();
    }

    code.bytes()
        .filter_map(|b| char::from_u32(0x1F1E6 + u32::from(b - b'A')))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> Value {
        json!({
            "ID": "main",
            "Host": "127.0.0.1",
            "Port": 2302,
            "Info": { "Players": 12, "MaxPlayers": 60, "Name": "Chernarus #1", "Environment": "l" },
            "Extra": { "PlayersQueue": 3, "Time": "21:30" }
        })
    }

    fn render(template: &str) -> Result<String, TemplateError> {
        Renderer::new().render_value(template, &ctx())
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(render("hello").unwrap(), "hello");
        assert_eq!(render("").unwrap(), "");
    }

    #[test]
    fn test_paths() {
        assert_eq!(render("{{ .Info.Players }}/{{.Info.MaxPlayers}}").unwrap(), "12/60");
        assert_eq!(render("{{ .ID }}@{{ .Host }}:{{ .Port }}").unwrap(), "main@127.0.0.1:2302");
    }

    #[test]
    fn test_missing_path_renders_empty() {
        assert_eq!(render("[{{ .Info.Nope.Deeper }}]").unwrap(), "[]");
    }

    #[test]
    fn test_if_else() {
        let tpl = "{{ if .Info }}🟢 {{ .Info.Players }}{{ else }}🔴 offline{{ end }}";
        assert_eq!(render(tpl).unwrap(), "🟢 12");

        let offline = json!({ "ID": "main", "Info": null });
        let out = Renderer::new().render_value(tpl, &offline).unwrap();
        assert_eq!(out, "🔴 offline");
    }

    #[test]
    fn test_else_if_chain() {
        let tpl = "{{ if .Missing }}a{{ else if .Extra.PlayersQueue }}queue {{ .Extra.PlayersQueue }}{{ else }}c{{ end }}";
        assert_eq!(render(tpl).unwrap(), "queue 3");
    }

    #[test]
    fn test_nested_if() {
        let tpl = "{{ if .Info }}{{ if .Extra }}both{{ end }}!{{ end }}";
        assert_eq!(render(tpl).unwrap(), "both!");
    }

    #[test]
    fn test_trim_markers() {
        let tpl = "a   {{- .ID -}}   b";
        assert_eq!(render(tpl).unwrap(), "amainb");
    }

    #[test]
    fn test_comment_action_is_ignored() {
        assert_eq!(render("x{{/* note */}}y").unwrap(), "xy");
    }

    #[test]
    fn test_helper_calls() {
        assert_eq!(render("{{ ValueColorEmoji .Info.Players .Info.MaxPlayers }}").unwrap(), "🟢");
        assert_eq!(render("{{ OSEmoji .Info.Environment }}").unwrap(), "🐧");
        assert_eq!(render("{{ TimeEmoji .Extra.Time }}").unwrap(), "🌙");
        assert_eq!(render(r#"{{ CountryEmoji "Germany" }}"#).unwrap(), "🇬🇪");
        assert_eq!(render(r#"{{ CodeEmoji "DE" }}"#).unwrap(), "🇩🇪");
        assert_eq!(render("{{ AppID 221100 }}").unwrap(), "DayZ");
        assert_eq!(render("{{ AppID 12 }}").unwrap(), "12");
    }

    #[test]
    fn test_unknown_function() {
        assert!(matches!(render("{{ Nope 1 }}"), Err(TemplateError::UnknownFunction(name)) if name == "Nope"));
    }

    #[test]
    fn test_structural_errors() {
        assert!(matches!(render("{{ .ID "), Err(TemplateError::UnclosedAction(0))));
        assert!(matches!(render("{{ if .ID }}x"), Err(TemplateError::UnterminatedBlock)));
        assert!(matches!(render("x{{ end }}"), Err(TemplateError::UnexpectedKeyword(_))));
        assert!(matches!(render("{{ else }}"), Err(TemplateError::UnexpectedKeyword(_))));
        assert!(matches!(render(r#"{{ CodeEmoji "DE }}"#), Err(TemplateError::BadExpression(_))));
    }

    #[test]
    fn test_helper_arity_error() {
        assert!(matches!(
            render("{{ ValueColorEmoji 1 }}"),
            Err(TemplateError::Helper { name: "ValueColorEmoji", .. })
        ));
    }

    #[test]
    fn test_custom_helper_registration() {
        fn shout(args: &[Value]) -> Result<Value, TemplateError> {
            Ok(Value::String(as_text(&args[0]).to_uppercase()))
        }

        let mut renderer = Renderer::new();
        renderer.register("Shout", shout);
        assert_eq!(renderer.render_value("{{ Shout .ID }}", &ctx()).unwrap(), "MAIN");
    }

    #[test]
    fn test_value_color_thresholds() {
        let color = |v: i64, max: i64| helper_value_color_emoji(&[json!(v), json!(max)]).unwrap();
        assert_eq!(color(0, 60), "🟣");
        assert_eq!(color(5, 60), "🔵");
        assert_eq!(color(30, 60), "🟢");
        assert_eq!(color(45, 60), "🟡");
        assert_eq!(color(54, 60), "🟠");
        assert_eq!(color(60, 60), "🔴");
        assert_eq!(color(61, 60), "🚫");
        assert_eq!(color(-1, 60), "🚫");
    }

    #[test]
    fn test_value_color_accepts_numeric_strings() {
        let out = helper_value_color_emoji(&[json!("30"), json!(60)]).unwrap();
        assert_eq!(out, "🟢");
    }

    #[test]
    fn test_country_flags() {
        assert_eq!(country_flag("United Kingdom"), "🇬🇧");
        assert_eq!(country_flag("usa"), "🇺🇸");
        assert_eq!(country_flag("x"), WHITE_FLAG);
        assert_eq!(code_flag("de"), WHITE_FLAG);
        assert_eq!(code_flag("DEU"), WHITE_FLAG);
    }

    #[test]
    fn test_time_emoji_inputs() {
        assert_eq!(helper_time_emoji(&[json!("12:00")]).unwrap(), "🌞");
        assert_eq!(helper_time_emoji(&[json!(6)]).unwrap(), "🌙");
        assert_eq!(helper_time_emoji(&[json!(26)]).unwrap(), "🌙");
        assert_eq!(helper_time_emoji(&[Value::Null]).unwrap(), "");
        assert!(helper_time_emoji(&[json!("noon")]).is_err());
    }

    #[test]
    fn test_duration_emoji_inputs() {
        assert_eq!(helper_duration_emoji(&[json!(12 * 3600)]).unwrap(), "🌞");
        assert_eq!(helper_duration_emoji(&[json!(3 * 3600)]).unwrap(), "🌙");
        // 36h wraps to 12:00
        assert_eq!(helper_duration_emoji(&[json!(36 * 3600)]).unwrap(), "🌞");
        assert_eq!(helper_duration_emoji(&[json!("13h")]).unwrap(), "🌞");
        assert_eq!(helper_duration_emoji(&[json!("21h30m")]).unwrap(), "🌙");
        assert_eq!(helper_duration_emoji(&[json!("450m")]).unwrap(), "🌞");
        assert_eq!(helper_duration_emoji(&[Value::Null]).unwrap(), "");
        assert!(helper_duration_emoji(&[json!("10x")]).is_err());
        assert!(helper_duration_emoji(&[json!("12")]).is_ok());
        assert!(helper_duration_emoji(&[json!("h")]).is_err());
    }

    #[test]
    fn test_duration_emoji_registered() {
        let renderer = Renderer::new();
        let out = renderer.render_value("{{ DurationEmoji .Uptime }}", &json!({ "Uptime": "22h" })).unwrap();
        assert_eq!(out, "🌙");
    }

    #[test]
    fn test_render_serializable_context() {
        #[derive(Serialize)]
        #[serde(rename_all = "PascalCase")]
        struct Data {
            id: &'static str,
            players: u8,
        }

        let out = Renderer::new()
            .render("{{ .Id }}={{ .Players }}", &Data { id: "x", players: 4 })
            .unwrap();
        assert_eq!(out, "x=4");
    }
}

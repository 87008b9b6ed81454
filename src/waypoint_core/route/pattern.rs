use std::collections::HashSet;
use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use tracing::warn;

use crate::waypoint_core::error::MatchError;
use crate::waypoint_core::location::decode;
use crate::waypoint_core::types::Params;

/// 与 `encodeURI` 相同的保留集合。
const URI: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b';')
    .remove(b',')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'#');

/// 普通参数：在 `encodeURI` 基础上再转义 `/ ? #`。
const SEGMENT: &AsciiSet = &URI.add(b'/').add(b'?').add(b'#');

/// catch-all 参数：允许 `/`，只额外转义 `? #`。
const ASTERISK: &AsciiSet = &URI.add(b'?').add(b'#');

/// 未命名捕获组 0 对外暴露的参数名。
pub const PATH_MATCH: &str = "pathMatch";

/// 路径参数的键。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyName {
    /// `:id`
    Named(String),
    /// `(\\d+)` 或 `*`，按出现顺序编号。
    Index(usize),
}

impl KeyName {
    /// 写入 `Route::params` 时使用的名字。
    pub fn param_name(&self) -> String {
        match self {
            KeyName::Named(name) => name.clone(),
            KeyName::Index(0) => PATH_MATCH.to_owned(),
            KeyName::Index(index) => index.to_string(),
        }
    }
}

impl fmt::Display for KeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyName::Named(name) => f.write_str(name),
            KeyName::Index(index) => write!(f, "{index}"),
        }
    }
}

/// 路径模板中的一个参数段。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathKey {
    pub name: KeyName,
    /// 段前缀：`/` 或 `.`，没有时为空串。
    pub prefix: String,
    pub delimiter: char,
    /// `?` 或 `*` 修饰。
    pub optional: bool,
    /// `+` 或 `*` 修饰。
    pub repeat: bool,
    /// 前缀后紧跟的不是分隔符（如 `/:a-:b` 里的 `:b`）。
    pub partial: bool,
    /// 裸 `*` 通配。
    pub asterisk: bool,
    /// 段的正则片段（不含外层分组）。
    pub pattern: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Key(PathKey),
}

/// 编译选项。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatternOptions {
    /// 大小写敏感，默认不敏感。
    pub case_sensitive: bool,
    /// 末尾 `/` 是否有意义；非 strict 时末尾 `/` 可选。
    pub strict: bool,
}

/// 编译后的路径模板。
///
/// 语法是 path-to-regexp 1.x 的子集：字面量、`\x` 转义、`:name`、
/// `:name(pattern)`、`(pattern)`、修饰符 `? * +`，以及裸 `*`。
/// 匹配总是锚定到整条路径的结尾。
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    regex: Regex,
    tokens: Vec<Token>,
    keys: Vec<PathKey>,
    /// 每个参数段的 `^(?:pattern)$` 校验，按 `keys` 顺序排列。
    checks: Vec<Regex>,
}

impl PathPattern {
    pub fn compile(path: &str, options: PatternOptions) -> Result<Self, regex::Error> {
        let tokens = parse(path);
        let keys: Vec<PathKey> = tokens
            .iter()
            .filter_map(|token| match token {
                Token::Key(key) => Some(key.clone()),
                Token::Literal(_) => None,
            })
            .collect();

        let mut seen = HashSet::new();
        for key in &keys {
            if !seen.insert(&key.name) {
                warn!("Duplicate param keys in route with path: \"{path}\"");
            }
        }

        let regex = Regex::new(&to_regex_source(&tokens, options))?;
        let checks = keys.iter().map(compile_check).collect::<Result<_, _>>()?;
        Ok(Self {
            source: path.to_owned(),
            regex,
            tokens,
            keys,
            checks,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn keys(&self) -> &[PathKey] {
        &self.keys
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// 整条匹配时返回解码后的参数；未参与匹配的可选段不出现在结果里。
    pub fn captures(&self, path: &str) -> Option<Params> {
        let captures = self.regex.captures(path)?;
        let mut params = Params::new();
        for (index, key) in self.keys.iter().enumerate() {
            if let Some(value) = captures.get(index + 1) {
                params.insert(key.name.param_name(), decode(value.as_str()));
            }
        }
        Some(params)
    }

    /// 用参数填充模板，得到具体路径。
    pub fn fill(&self, params: &Params, context: &str) -> Result<String, MatchError> {
        fill_tokens(&self.tokens, &self.checks, params, context)
    }
}

/// 直接用模板字符串填参（重定向目标、别名目标使用）。
pub fn fill_params(path: &str, params: &Params, context: &str) -> Result<String, MatchError> {
    let tokens = parse(path);
    let mut checks = Vec::new();
    for key in tokens.iter().filter_map(|token| match token {
        Token::Key(key) => Some(key),
        Token::Literal(_) => None,
    }) {
        let check = compile_check(key).map_err(|source| MatchError::InvalidPattern {
            context: context.to_owned(),
            pattern: key.pattern.clone(),
            source,
        })?;
        checks.push(check);
    }
    fill_tokens(&tokens, &checks, params, context)
}

fn compile_check(key: &PathKey) -> Result<Regex, regex::Error> {
    Regex::new(&format!("(?i)^(?:{})$", key.pattern))
}

fn fill_tokens(
    tokens: &[Token],
    checks: &[Regex],
    params: &Params,
    context: &str,
) -> Result<String, MatchError> {
    let mut path = String::new();
    let mut checks = checks.iter();
    for token in tokens {
        let key = match token {
            Token::Literal(literal) => {
                path.push_str(literal);
                continue;
            }
            Token::Key(key) => key,
        };
        let check = checks.next();

        let value = match &key.name {
            KeyName::Index(0) => params.get(PATH_MATCH).or_else(|| params.get("0")),
            name => params.get(&name.param_name()),
        };
        let Some(value) = value else {
            if key.optional {
                if key.partial {
                    path.push_str(&key.prefix);
                }
                continue;
            }
            return Err(MatchError::MissingParam {
                context: context.to_owned(),
                param: key.name.to_string(),
            });
        };

        let set = if key.asterisk { ASTERISK } else { SEGMENT };
        let segment = utf8_percent_encode(value, set).to_string();
        if !check.is_some_and(|check| check.is_match(&segment)) {
            return Err(MatchError::ParamMismatch {
                context: context.to_owned(),
                param: key.name.to_string(),
                pattern: key.pattern.clone(),
                value: segment,
            });
        }

        path.push_str(&key.prefix);
        path.push_str(&segment);
    }
    Ok(path)
}

//
// ========== 模板解析 ==========
//

fn is_word(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

/// 从 `(` 开始读取一个分组，返回组内文本和 `)` 之后的位置。
///
/// 组内不允许未转义的括号，且不能为空。
fn read_group(source: &str, open: usize) -> Option<(String, usize)> {
    let bytes = source.as_bytes();
    let mut pos = open + 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => {
                let escaped = source[pos + 1..].chars().next()?;
                pos += 1 + escaped.len_utf8();
            }
            b')' if pos > open + 1 => return Some((source[open + 1..pos].to_owned(), pos + 1)),
            b'(' | b')' => return None,
            _ => pos += 1,
        }
    }
    None
}

/// 尝试在 `start` 处读出一个参数段，失败返回 `None`（该字符按字面量处理）。
fn read_key(source: &str, start: usize, next_index: &mut usize) -> Option<(PathKey, usize)> {
    let bytes = source.as_bytes();
    let prefix = match bytes.get(start) {
        Some(b'/') => Some('/'),
        Some(b'.') => Some('.'),
        _ => None,
    };
    let mut pos = start + usize::from(prefix.is_some());

    let mut name = None;
    let mut pattern = None;
    let mut asterisk = false;
    match bytes.get(pos) {
        Some(b':') if bytes.get(pos + 1).copied().is_some_and(is_word) => {
            let name_start = pos + 1;
            pos = name_start;
            while bytes.get(pos).copied().is_some_and(is_word) {
                pos += 1;
            }
            name = Some(source[name_start..pos].to_owned());
            if bytes.get(pos) == Some(&b'(') {
                if let Some((group, after)) = read_group(source, pos) {
                    pattern = Some(group);
                    pos = after;
                }
            }
        }
        Some(b'(') => {
            let (group, after) = read_group(source, pos)?;
            pattern = Some(group);
            pos = after;
        }
        Some(b'*') => {
            asterisk = true;
            pos += 1;
        }
        _ => return None,
    }

    let modifier = if asterisk {
        None
    } else {
        match bytes.get(pos) {
            Some(&m) if matches!(m, b'+' | b'*' | b'?') => {
                pos += 1;
                Some(m)
            }
            _ => None,
        }
    };

    let delimiter = prefix.unwrap_or('/');
    let partial = match (prefix, source[pos..].chars().next()) {
        (Some(p), Some(next)) => next != p,
        _ => false,
    };
    let name = match name {
        Some(name) => KeyName::Named(name),
        None => {
            let index = *next_index;
            *next_index += 1;
            KeyName::Index(index)
        }
    };
    let pattern = match pattern {
        Some(pattern) => pattern,
        None if asterisk => ".*".to_owned(),
        None => format!("[^{}]+?", regex::escape(&delimiter.to_string())),
    };

    let key = PathKey {
        name,
        prefix: prefix.map(String::from).unwrap_or_default(),
        delimiter,
        optional: matches!(modifier, Some(b'?' | b'*')),
        repeat: matches!(modifier, Some(b'+' | b'*')),
        partial,
        asterisk,
        pattern,
    };
    Some((key, pos))
}

fn parse(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut next_index = 0;
    let mut pos = 0;

    while let Some(ch) = source[pos..].chars().next() {
        if ch == '\\' {
            if let Some(escaped) = source[pos + 1..].chars().next() {
                literal.push(escaped);
                pos += 1 + escaped.len_utf8();
                continue;
            }
        }
        if let Some((key, after)) = read_key(source, pos, &mut next_index) {
            if !literal.is_empty() {
                tokens.push(Token::Literal(std::mem::take(&mut literal)));
            }
            tokens.push(Token::Key(key));
            pos = after;
            continue;
        }
        literal.push(ch);
        pos += ch.len_utf8();
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    tokens
}

fn to_regex_source(tokens: &[Token], options: PatternOptions) -> String {
    let mut route = String::new();
    for token in tokens {
        match token {
            Token::Literal(literal) => route.push_str(&regex::escape(literal)),
            Token::Key(key) => {
                let prefix = regex::escape(&key.prefix);
                let mut capture = format!("(?:{})", key.pattern);
                if key.repeat {
                    capture = format!("{capture}(?:{prefix}{capture})*");
                }
                let capture = match (key.optional, key.partial) {
                    (true, false) => format!("(?:{prefix}({capture}))?"),
                    (true, true) => format!("{prefix}({capture})?"),
                    (false, _) => format!("{prefix}({capture})"),
                };
                route.push_str(&capture);
            }
        }
    }

    if !options.strict {
        if route.ends_with('/') {
            route.pop();
        }
        route.push_str("(?:/)?");
    }
    route.push('$');

    let flags = if options.case_sensitive { "" } else { "(?i)" };
    format!("{flags}^{route}")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn compile(path: &str) -> PathPattern {
        PathPattern::compile(path, PatternOptions::default()).unwrap()
    }

    #[test]
    fn named_segment_matches_and_decodes() {
        let pattern = compile("/user/:id");
        assert_eq!(pattern.captures("/user/42"), Some(params(&[("id", "42")])));
        assert_eq!(
            pattern.captures("/USER/a%20b/"),
            Some(params(&[("id", "a b")]))
        );
        assert_eq!(pattern.captures("/user"), None);
        assert_eq!(pattern.captures("/user/1/2"), None);
    }

    #[test]
    fn optional_and_repeat_modifiers() {
        let optional = compile("/files/:name?");
        assert_eq!(optional.captures("/files"), Some(Params::new()));
        assert_eq!(
            optional.captures("/files/a"),
            Some(params(&[("name", "a")]))
        );

        let repeat = compile("/docs/:rest+");
        assert_eq!(
            repeat.captures("/docs/a/b/c"),
            Some(params(&[("rest", "a/b/c")]))
        );
        assert_eq!(repeat.captures("/docs"), None);
        assert!(repeat.keys()[0].repeat);
    }

    #[test]
    fn custom_pattern_and_asterisk() {
        let numeric = compile("/item/:id(\\d+)");
        assert_eq!(numeric.captures("/item/12"), Some(params(&[("id", "12")])));
        assert_eq!(numeric.captures("/item/ab"), None);

        let wildcard = compile("*");
        assert_eq!(
            wildcard.captures("/any/thing"),
            Some(params(&[("pathMatch", "/any/thing")]))
        );

        let nested = compile("/admin/*");
        assert_eq!(
            nested.captures("/admin/x/y"),
            Some(params(&[("pathMatch", "x/y")]))
        );
    }

    #[test]
    fn escaped_characters_stay_literal() {
        let pattern = compile("/a\\:b");
        assert!(pattern.keys().is_empty());
        assert!(pattern.regex().is_match("/a:b"));
    }

    #[test]
    fn strict_and_case_sensitive_options() {
        let strict = PathPattern::compile(
            "/a/",
            PatternOptions {
                strict: true,
                case_sensitive: true,
            },
        )
        .unwrap();
        assert!(strict.regex().is_match("/a/"));
        assert!(!strict.regex().is_match("/a"));
        assert!(!strict.regex().is_match("/A/"));
    }

    #[test]
    fn fill_substitutes_and_encodes() {
        assert_eq!(
            fill_params("/user/:id", &params(&[("id", "a b/c")]), "test").unwrap(),
            "/user/a%20b%2Fc"
        );
        assert_eq!(
            fill_params("/files/:name?", &Params::new(), "test").unwrap(),
            "/files"
        );
        assert_eq!(
            fill_params("/admin/*", &params(&[("pathMatch", "x/y")]), "test").unwrap(),
            "/admin/x/y"
        );
    }

    #[test]
    fn fill_reports_missing_and_mismatched_params() {
        let missing = fill_params("/user/:id", &Params::new(), "named route \"user\"");
        assert!(matches!(
            missing,
            Err(MatchError::MissingParam { ref param, .. }) if param == "id"
        ));

        let mismatch = fill_params("/item/:id(\\d+)", &params(&[("id", "abc")]), "test");
        assert!(matches!(mismatch, Err(MatchError::ParamMismatch { .. })));
    }

    #[test]
    fn compiled_pattern_checks_every_fill() {
        let pattern = compile("/item/:id(\\d+)/:slug?");
        assert_eq!(pattern.checks.len(), 2);
        assert_eq!(
            pattern.fill(&params(&[("id", "7"), ("slug", "lamp")]), "test").unwrap(),
            "/item/7/lamp"
        );
        assert_eq!(pattern.fill(&params(&[("id", "8")]), "test").unwrap(), "/item/8");
        assert!(matches!(
            pattern.fill(&params(&[("id", "x")]), "test"),
            Err(MatchError::ParamMismatch { ref value, .. }) if value == "x"
        ));
    }

    #[test]
    fn unparseable_fill_template_is_reported() {
        let invalid = fill_params("/item/:id([)", &params(&[("id", "1")]), "test");
        assert!(matches!(invalid, Err(MatchError::InvalidPattern { .. })));
    }
}

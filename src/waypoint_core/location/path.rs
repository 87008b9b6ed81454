/// 从原始 path 拆出的三段：路径、query 字符串（不含 `?`）、hash（含 `#`）。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedPath {
    pub path: String,
    pub query: String,
    pub hash: String,
}

/// 拆分 `path?query#hash`。
///
/// hash 从第一个 `#` 开始切，query 从剩余部分的第一个 `?` 开始切。
pub fn parse_path(raw: &str) -> ParsedPath {
    let (rest, hash) = match raw.find('#') {
        Some(index) => (&raw[..index], &raw[index..]),
        None => (raw, ""),
    };
    let (path, query) = match rest.find('?') {
        Some(index) => (&rest[..index], &rest[index + 1..]),
        None => (rest, ""),
    };
    ParsedPath {
        path: path.to_owned(),
        query: query.to_owned(),
        hash: hash.to_owned(),
    }
}

/// 折叠多余的路径分隔符：`/a//b/ /c` -> `/a/b/c`。
///
/// 与 `/(?:\s*/)+` -> `/` 等价：两个 `/` 之间只有空白时也视为冗余。
pub fn clean_path(path: &str) -> String {
    let mut cleaned = String::with_capacity(path.len());
    let mut rest = path;
    while let Some(index) = rest.find('/') {
        cleaned.push_str(&rest[..=index]);
        rest = &rest[index + 1..];
        while let Some(after) = rest.trim_start().strip_prefix('/') {
            rest = after;
        }
    }
    cleaned.push_str(rest);
    cleaned
}

/// 把相对路径解析成绝对路径。
///
/// - `/` 开头：原样返回；
/// - `?` / `#` 开头：直接拼在 `base` 后；
/// - 否则按段处理 `.` 与 `..`。`append` 为 false 时先丢弃 base 的最后一段，
///   base 以 `/` 结尾时最后一段为空，同样丢弃。
pub fn resolve_path(relative: &str, base: &str, append: bool) -> String {
    match relative.chars().next() {
        Some('/') => return relative.to_owned(),
        Some('?') | Some('#') => return format!("{base}{relative}"),
        _ => {}
    }

    let mut stack: Vec<&str> = base.split('/').collect();
    if !append || stack.last().is_some_and(|last| last.is_empty()) {
        stack.pop();
    }

    let relative = relative.strip_prefix('/').unwrap_or(relative);
    for segment in relative.split('/') {
        match segment {
            ".." => {
                stack.pop();
            }
            "." => {}
            other => stack.push(other),
        }
    }

    if stack.first().map_or(true, |first| !first.is_empty()) {
        stack.insert(0, "");
    }
    stack.join("/")
}

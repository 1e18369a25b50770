//! Text transforms used by the recovery ladder
//!
//! Each function here is a pure `&str -> String` (or extraction) step. They
//! are all string-aware: characters inside JSON string literals are never
//! rewritten, tracked via a minimal in-string/escape scanner.

/// Extract the contents of the first fenced code block.
///
/// Accepts both bare fences and language-tagged fences (```json, ```plan,
/// etc.). Returns `None` when no complete fenced block exists.
pub fn extract_fenced_block(text: &str) -> Option<String> {
    let mut in_block = false;
    let mut current = String::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if !in_block && trimmed.starts_with("```") {
            in_block = true;
            current.clear();
        } else if in_block && trimmed == "```" {
            return Some(current);
        } else if in_block {
            current.push_str(line);
            current.push('\n');
        }
    }

    None
}

/// Trim the text to the first `{` and the last `}`.
///
/// Returns `None` when no brace pair exists in the right order.
pub fn trim_to_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Replace known placeholder tokens with literal JSON defaults.
///
/// Handles the three placeholder families generative backends leave behind:
/// - angle tokens: `<text>` / `<title>` -> `""`, `<number>` / `<count>` -> `0`,
///   `<bool>` -> `false`
/// - template moustaches: `{{topic}}` -> `""`
/// - bare ellipses (`...`) standing in for omitted content, which are
///   removed so the trailing-comma pass can clean up what remains
pub fn replace_placeholders(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let chars: Vec<char> = text.chars().collect();
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
                i += 1;
            }
            '<' => {
                if let Some(end) = scan_angle_token(&chars, i) {
                    let token: String = chars[i + 1..end].iter().collect();
                    out.push_str(angle_default(&token));
                    i = end + 1;
                } else {
                    out.push(c);
                    i += 1;
                }
            }
            '{' if chars.get(i + 1) == Some(&'{') => {
                if let Some(end) = scan_moustache(&chars, i) {
                    out.push_str("\"\"");
                    i = end + 2;
                } else {
                    out.push(c);
                    i += 1;
                }
            }
            '.' if chars.get(i + 1) == Some(&'.') && chars.get(i + 2) == Some(&'.') => {
                // Drop the ellipsis entirely
                i += 3;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

/// Find the closing `>` of an angle token starting at `start` (`<`).
///
/// Tokens are short identifier-ish runs; anything containing braces, quotes
/// or newlines is not treated as a placeholder.
fn scan_angle_token(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < chars.len() && i - start < 40 {
        let c = chars[i];
        if c == '>' {
            return (i > start + 1).then_some(i);
        }
        if c.is_alphanumeric() || c == '_' || c == '-' || c == ' ' {
            i += 1;
        } else {
            return None;
        }
    }
    None
}

/// Find the index of the first `}` of a closing `}}` for a moustache opened
/// at `start` (`{{`).
fn scan_moustache(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 2;
    while i + 1 < chars.len() && i - start < 80 {
        if chars[i] == '}' && chars[i + 1] == '}' {
            return Some(i);
        }
        if chars[i] == '{' || chars[i] == '"' {
            return None;
        }
        i += 1;
    }
    None
}

/// Default literal for an angle-token placeholder, keyed on the token text
fn angle_default(token: &str) -> &'static str {
    let lower = token.to_lowercase();
    if ["number", "int", "float", "count", "secs", "seconds", "score"]
        .iter()
        .any(|hint| lower.contains(hint))
    {
        "0"
    } else if lower.contains("bool") {
        "false"
    } else {
        "\"\""
    }
}

/// Quote bare (unquoted) object keys.
///
/// A bare key is an identifier run immediately following `{` or `,` (modulo
/// whitespace) and followed by `:`. The `:` lookahead keeps array literals
/// like `[true, false]` untouched.
pub fn quote_bare_keys(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 16);
    let mut in_string = false;
    let mut escaped = false;
    // Whether the next identifier could be a key position
    let mut key_position = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                key_position = false;
                out.push(c);
                i += 1;
            }
            '{' | ',' => {
                key_position = true;
                out.push(c);
                i += 1;
            }
            c if c.is_whitespace() => {
                out.push(c);
                i += 1;
            }
            c if key_position && (c.is_alphabetic() || c == '_') => {
                let mut end = i;
                while end < chars.len()
                    && (chars[end].is_alphanumeric() || chars[end] == '_' || chars[end] == '-')
                {
                    end += 1;
                }
                // Look ahead past whitespace for the colon
                let mut probe = end;
                while probe < chars.len() && chars[probe].is_whitespace() {
                    probe += 1;
                }
                let identifier: String = chars[i..end].iter().collect();
                if chars.get(probe) == Some(&':') {
                    out.push('"');
                    out.push_str(&identifier);
                    out.push('"');
                } else {
                    out.push_str(&identifier);
                }
                key_position = false;
                i = end;
            }
            _ => {
                key_position = false;
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

/// Strip `//` line comments and `/* */` block comments outside strings
pub fn strip_comments(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
                i += 1;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i + 1 < chars.len() && !(chars[i] == '*' && chars[i + 1] == '/') {
                    i += 1;
                }
                i = (i + 2).min(chars.len());
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

/// Remove commas that directly precede a closing `}` or `]`
pub fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let mut probe = i + 1;
                while probe < chars.len() && chars[probe].is_whitespace() {
                    probe += 1;
                }
                if !matches!(chars.get(probe), Some('}') | Some(']')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }

    out
}

/// Strip non-printable control characters, keeping `\n`, `\t`, `\r`
pub fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|&c| !c.is_control() || c == '\n' || c == '\t' || c == '\r')
        .collect()
}

/// Truncate a cut-off document at the last position where brace depth
/// returns to zero.
///
/// Scans left-to-right from the first `{`, string-aware, tracking `{`/`[`
/// depth. Returns the longest balanced prefix, or `None` when the depth
/// never returns to zero.
pub fn repair_truncation(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let chars: Vec<char> = text[start..].chars().collect();
    let mut in_string = false;
    let mut escaped = false;
    let mut depth: i64 = 0;
    let mut last_balanced: Option<usize> = None;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth -= 1;
                if depth == 0 {
                    last_balanced = Some(i);
                }
                if depth < 0 {
                    break;
                }
            }
            _ => {}
        }
    }

    last_balanced.map(|end| chars[..=end].iter().collect())
}

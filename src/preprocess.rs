//! Source rewrites applied before parsing.
//!
//! The grammar has no increment, decrement or comma operators. These rewrites
//! lower them into constructs it does have:
//!
//! ```text
//! count++          (count = count + 1) - 1
//! count--          (count = count - 1) + 1
//! ++count          (count = count + 1)
//! --count          (count = count - 1)
//! a = 1, b = 2     [a = 1, b = 2].pop()
//! ```
use std::sync::LazyLock;

use regex::Regex;

/// Assignable path: a name followed by any mix of `.name` and `[name]`.
const TARGET: &str = r"\$?\w+(?:\.\w+|\[\w+\])*";

struct Rewrite {
    pattern: Regex,
    replacement: &'static str,
}

static REWRITES: LazyLock<Vec<Rewrite>> = LazyLock::new(|| {
    [
        (format!(r"({TARGET})\+\+"), "(${1} = ${1} + 1) - 1"),
        (format!(r"({TARGET})--"), "(${1} = ${1} - 1) + 1"),
        (format!(r"\+\+({TARGET})"), "(${1} = ${1} + 1)"),
        (format!(r"--({TARGET})"), "(${1} = ${1} - 1)"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| Rewrite {
        pattern: Regex::new(&pattern).expect("increment patterns are valid regexes"),
        replacement,
    })
    .collect()
});

/// Applies every rewrite to `source`.
pub fn preprocess(source: &str) -> String {
    let sequenced = rewrite_comma_sequence(source);
    REWRITES.iter().fold(sequenced, |acc, rewrite| {
        rewrite
            .pattern
            .replace_all(&acc, rewrite.replacement)
            .into_owned()
    })
}

/// Turns a top-level comma sequence into an array whose last element is
/// popped, so every part runs in order and the last one is the result.
///
/// Commas nested in brackets or inside string literals are left alone.
pub fn rewrite_comma_sequence(source: &str) -> String {
    let mut commas = vec![];
    let mut depth: i32 = 0;
    let mut quote: Option<char> = None;
    let mut prev: Option<char> = None;

    for (i, ch) in source.char_indices() {
        let escaped = prev == Some('\\');
        prev = Some(ch);

        if (ch == '"' || ch == '\'') && !escaped {
            match quote {
                Some(q) if q == ch => quote = None,
                None => quote = Some(ch),
                _ => {}
            }
            continue;
        }
        if quote.is_some() {
            continue;
        }

        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => commas.push(i),
            _ => {}
        }
    }

    if commas.is_empty() {
        return source.to_string();
    }

    let mut parts = vec![];
    let mut last = 0;
    for pos in commas {
        parts.push(source[last..pos].trim());
        last = pos + 1;
    }
    parts.push(source[last..].trim());

    format!("[{}].pop()", parts.join(", "))
}

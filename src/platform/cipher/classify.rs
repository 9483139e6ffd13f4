//! Structural classification of helper-object members
//!
//! Each rule is a standalone predicate over a parsed member function so a
//! new player idiom can be added or tested in isolation.

use super::OperationKind;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// JavaScript identifier as it appears in minified player code
pub(crate) const IDENT: &str = r"[A-Za-z_$][A-Za-z0-9_$]*";

/// Matches anything that cannot directly precede an identifier
const BOUNDARY: &str = r"(?:^|[^A-Za-z0-9_$.])";

static BARE_IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{}$", IDENT)).expect("identifier pattern is valid"));

/// Outcome of classifying one helper member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Recognized(OperationKind),
    Unrecognized,
}

impl Classification {
    pub fn kind(&self) -> Option<OperationKind> {
        match self {
            Classification::Recognized(kind) => Some(*kind),
            Classification::Unrecognized => None,
        }
    }
}

/// A `function(<params>){<body>}` split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberFunction<'a> {
    pub params: Vec<&'a str>,
    pub body: &'a str,
}

/// Split a function expression into parameter names and body text.
///
/// Returns `None` when the text is not a plain `function(...){...}` or a
/// parameter is not a bare identifier.
pub fn parse_member_function(source: &str) -> Option<MemberFunction<'_>> {
    let rest = source.trim().strip_prefix("function")?.trim_start();
    let rest = rest.strip_prefix('(')?;
    let close = rest.find(')')?;
    let params_text = rest[..close].trim();
    let body = rest[close + 1..]
        .trim_start()
        .strip_prefix('{')?
        .trim_end()
        .strip_suffix('}')?;

    let params: Vec<&str> = if params_text.is_empty() {
        Vec::new()
    } else {
        params_text.split(',').map(str::trim).collect()
    };
    if !params.iter().all(|p| BARE_IDENT.is_match(p)) {
        return None;
    }

    Some(MemberFunction { params, body })
}

/// Classify a helper member by the shape of its source.
///
/// `member_name` is only used for diagnostics.
pub fn classify(member_name: &str, member_source: &str) -> Classification {
    let Some(function) = parse_member_function(member_source) else {
        debug!("Helper member {} is not a plain function", member_name);
        return Classification::Unrecognized;
    };

    let classification = if is_reverse(&function) {
        Classification::Recognized(OperationKind::Reverse)
    } else if is_splice(&function) {
        Classification::Recognized(OperationKind::Splice)
    } else if is_swap(&function) {
        Classification::Recognized(OperationKind::Swap)
    } else {
        Classification::Unrecognized
    };

    debug!("Classified helper member {} as {:?}", member_name, classification);
    classification
}

/// `function(a){a.reverse()}`
pub fn is_reverse(function: &MemberFunction<'_>) -> bool {
    let [array] = function.params.as_slice() else {
        return false;
    };
    let pattern = format!(
        r"{}(?:return\s+)?{}\s*\.\s*reverse\s*\(\s*\)",
        BOUNDARY,
        regex::escape(array)
    );
    matches(&pattern, function.body)
}

/// `function(a,b){a.splice(0,b)}`
pub fn is_splice(function: &MemberFunction<'_>) -> bool {
    let [array, count] = function.params.as_slice() else {
        return false;
    };
    let pattern = format!(
        r"{}{}\s*\.\s*splice\s*\(\s*0\s*,\s*{}\s*\)",
        BOUNDARY,
        regex::escape(array),
        regex::escape(count)
    );
    matches(&pattern, function.body)
}

/// `function(a,b){var c=a[0];a[0]=a[b%a.length];a[b%a.length]=c}`
///
/// The `%a.length` part is optional; older players index with `b` directly.
/// The three statements must appear in this order.
pub fn is_swap(function: &MemberFunction<'_>) -> bool {
    let [array, index] = function.params.as_slice() else {
        return false;
    };
    let array = regex::escape(array);
    let target = format!(
        r"{}\s*\[\s*{}(?:\s*%\s*{}\s*\.\s*length)?\s*\]",
        array,
        regex::escape(index),
        array
    );

    let capture = format!(r"{}var\s+({})\s*=\s*{}\s*\[\s*0\s*\]", BOUNDARY, IDENT, array);
    let Some((temp, after_capture)) = Regex::new(&capture).ok().and_then(|re| {
        re.captures(function.body).and_then(|caps| {
            let temp = caps.get(1)?;
            let whole = caps.get(0)?;
            Some((temp.as_str().to_string(), whole.end()))
        })
    }) else {
        return false;
    };
    if function.params.iter().any(|p| *p == temp) {
        return false;
    }

    let rest = &function.body[after_capture..];
    let exchange = format!(r"{}\s*\[\s*0\s*\]\s*=\s*{}", array, target);
    let Some(after_exchange) = find_end(&exchange, rest) else {
        return false;
    };

    let write_back = format!(
        r"{}\s*=\s*{}\s*(?:;|$)",
        target,
        regex::escape(&temp)
    );
    matches(&write_back, &rest[after_exchange..])
}

fn matches(pattern: &str, text: &str) -> bool {
    Regex::new(pattern).is_ok_and(|re| re.is_match(text))
}

fn find_end(pattern: &str, text: &str) -> Option<usize> {
    Regex::new(pattern).ok()?.find(text).map(|m| m.end())
}

//! Operation plan extraction from raw player code
//!
//! The routine being recovered looks like this in a minified player:
//!
//! ```text
//! var Mt={splice:function(a,b){a.splice(0,b)},
//! reverse:function(a){a.reverse()},
//! EQ:function(a,b){var c=a[0];a[0]=a[b%a.length];a[b%a.length]=c}};
//!
//! function(a){a=a.split("");Mt.splice(a,3);Mt.EQ(a,39);Mt.reverse(a,52);return a.join("")}
//! ```

use super::classify::{classify, Classification, IDENT};
use super::{Operation, OperationKind, OperationPlan};
use crate::error::DecipherError;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Helper objects carry two or three primitives
const HELPER_MEMBERS: std::ops::RangeInclusive<usize> = 2..=3;

/// Result of one extraction pass over a player asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub plan: OperationPlan,
    /// Empty when the player does not expose one
    pub signature_timestamp: String,
}

/// Decipher entry function: its parameter and body text
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EntryFunction<'a> {
    pub param: &'a str,
    pub body: &'a str,
}

/// A parsed `<helper>.<member>(<array>[,<arg>])` statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HelperCall<'a> {
    pub object: &'a str,
    pub member: &'a str,
    pub array: &'a str,
    pub argument: Option<&'a str>,
}

/// Extract the operation plan and signature timestamp from player code
pub fn extract(player_code: &str) -> Result<Extraction, DecipherError> {
    let entry = find_entry_function(player_code)?;
    debug!("Found decipher entry function with parameter {}", entry.param);

    let helper = helper_name(&entry)?;
    debug!("Decipher entry delegates to helper object {}", helper);

    let members = find_helper_members(player_code, helper)?;
    let mut kinds: HashMap<&str, OperationKind> = HashMap::new();
    for (name, source) in &members {
        match classify(name, source) {
            Classification::Recognized(kind) => {
                kinds.insert(name.as_str(), kind);
            }
            Classification::Unrecognized => {
                return Err(DecipherError::ExtractionFailed(format!(
                    "helper member {}.{} has an unrecognized shape",
                    helper, name
                )));
            }
        }
    }

    let plan = build_plan(&entry, helper, &kinds)?;
    if plan.is_empty() {
        warn!("Decipher entry function produced an empty operation plan");
    }

    let signature_timestamp = find_signature_timestamp(player_code)?.unwrap_or_default();
    if signature_timestamp.is_empty() {
        debug!("No signature timestamp in player code");
    }

    debug!("Extracted plan {} (sts={})", plan, signature_timestamp);
    Ok(Extraction {
        plan,
        signature_timestamp,
    })
}

/// `function [name](<param>){<param>=<param>.split("")...}` without nested braces
static ENTRY_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"function(?:\s+{ident})?\s*\(\s*({ident})\s*\)\s*\{{(\s*{ident}\s*=\s*{ident}\s*\.\s*split\(\s*(?:""|'')\s*\)[^{{}}]*)\}}"#,
        ident = IDENT
    ))
    .expect("entry function pattern is valid")
});

/// `[<lhs>=]<object>.<member>(<array>[,<arg>])`
static HELPER_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?:{ident}\s*=\s*)?({ident})\s*\.\s*({ident})\s*\(\s*({ident})\s*(?:,\s*([^,()]*?)\s*)?\)$",
        ident = IDENT
    ))
    .expect("helper call pattern is valid")
});

/// `name(..){..}` inside an object literal
static METHOD_SHORTHAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?s)^({})\s*(\(.*\}})$", IDENT))
        .expect("method shorthand pattern is valid")
});

/// Locate the single function that splits, delegates and re-joins its input
pub(crate) fn find_entry_function(player_code: &str) -> Result<EntryFunction<'_>, DecipherError> {
    let mut candidates: Vec<EntryFunction<'_>> = Vec::new();
    for captures in ENTRY_FUNCTION.captures_iter(player_code) {
        let (Some(param), Some(body)) = (captures.get(1), captures.get(2)) else {
            continue;
        };
        let entry = EntryFunction {
            param: param.as_str(),
            body: body.as_str(),
        };
        if is_entry_body(&entry) && !candidates.contains(&entry) {
            candidates.push(entry);
        }
    }

    match candidates.len() {
        1 => Ok(candidates.remove(0)),
        0 => Err(DecipherError::ExtractionFailed(
            "decipher entry function not found".to_string(),
        )),
        n => Err(DecipherError::ExtractionFailed(format!(
            "found {} candidate decipher entry functions",
            n
        ))),
    }
}

/// Body starts with `a=a.split("")`, ends with `return a.join("")` and
/// delegates at least once in between
fn is_entry_body(entry: &EntryFunction<'_>) -> bool {
    let statements = statements(entry.body);
    let [first, middle @ .., last] = statements.as_slice() else {
        return false;
    };
    if middle.is_empty()
        || !is_split_statement(first, entry.param)
        || !is_join_statement(last, entry.param)
    {
        return false;
    }

    middle
        .iter()
        .filter_map(|statement| parse_helper_call(statement))
        .any(|call| call.array == entry.param)
}

fn is_split_statement(statement: &str, param: &str) -> bool {
    EMPTY_STRINGS.into_iter().any(|empty| {
        consume_tokens(statement, &[param, "=", param, ".", "split", "(", empty, ")"])
            .is_some_and(str::is_empty)
    })
}

fn is_join_statement(statement: &str, param: &str) -> bool {
    let Some(rest) = statement.strip_prefix("return") else {
        return false;
    };
    rest.starts_with(char::is_whitespace)
        && EMPTY_STRINGS.into_iter().any(|empty| {
            consume_tokens(rest, &[param, ".", "join", "(", empty, ")"]).is_some_and(str::is_empty)
        })
}

const EMPTY_STRINGS: [&str; 2] = ["\"\"", "''"];

/// Strip `tokens` in order, allowing whitespace around each one
fn consume_tokens<'a>(mut text: &'a str, tokens: &[&str]) -> Option<&'a str> {
    for token in tokens {
        text = text.trim_start().strip_prefix(token)?;
    }
    Some(text.trim())
}

/// Helper object named by the first delegated call
fn helper_name<'a>(entry: &EntryFunction<'a>) -> Result<&'a str, DecipherError> {
    statements(entry.body)
        .into_iter()
        .filter_map(parse_helper_call)
        .find(|call| call.array == entry.param)
        .map(|call| call.object)
        .ok_or_else(|| {
            DecipherError::ExtractionFailed("no delegated helper call in entry function".to_string())
        })
}

/// Find `var <helper>={...}` and return its members as (name, function source)
pub(crate) fn find_helper_members(
    player_code: &str,
    helper: &str,
) -> Result<Vec<(String, String)>, DecipherError> {
    let decl_regex = Regex::new(&format!(
        r"(?:^|[^A-Za-z0-9_$.])(?:var|let|const)\s+{}\s*=\s*\{{",
        regex::escape(helper)
    ))?;

    // Unrelated locals may share the helper's name; the first declaration
    // that reads as a helper object wins.
    let mut first_error = None;
    for declaration in decl_regex.find_iter(player_code) {
        match parse_helper_object(player_code, declaration.end() - 1, helper) {
            Ok(members) => return Ok(members),
            Err(err) => {
                debug!("Skipping declaration of {}: {}", helper, err);
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }

    Err(first_error.unwrap_or_else(|| {
        DecipherError::ExtractionFailed(format!("helper object {} definition not found", helper))
    }))
}

/// Members of the object literal opening at `open`
fn parse_helper_object(
    player_code: &str,
    open: usize,
    helper: &str,
) -> Result<Vec<(String, String)>, DecipherError> {
    let close = matching_brace(player_code, open).ok_or_else(|| {
        DecipherError::ExtractionFailed(format!("helper object {} is not terminated", helper))
    })?;

    let object_body = &player_code[open + 1..close];
    let mut members = Vec::new();
    for member in split_top_level(object_body, ',') {
        let member = member.trim();
        if member.is_empty() {
            continue;
        }
        let (name, source) = parse_member(member).ok_or_else(|| {
            DecipherError::ExtractionFailed(format!(
                "helper object {} has a member that is not a function: {}",
                helper, member
            ))
        })?;
        members.push((name, source));
    }

    if !HELPER_MEMBERS.contains(&members.len()) {
        return Err(DecipherError::ExtractionFailed(format!(
            "helper object {} has {} members, expected {} to {}",
            helper,
            members.len(),
            HELPER_MEMBERS.start(),
            HELPER_MEMBERS.end()
        )));
    }

    Ok(members)
}

/// `name:function(..){..}`, `"name":function(..){..}` or `name(..){..}`
fn parse_member(member: &str) -> Option<(String, String)> {
    if let Some((key, value)) = split_once_top_level(member, ':') {
        let key = key.trim();
        let name = key
            .strip_prefix('"')
            .and_then(|k| k.strip_suffix('"'))
            .or_else(|| key.strip_prefix('\'').and_then(|k| k.strip_suffix('\'')))
            .unwrap_or(key);
        let value = value.trim();
        if name.is_empty() || !value.starts_with("function") {
            return None;
        }
        return Some((name.to_string(), value.to_string()));
    }

    // Method shorthand
    let captures = METHOD_SHORTHAND.captures(member)?;
    let name = captures.get(1)?.as_str();
    let rest = captures.get(2)?.as_str();
    Some((name.to_string(), format!("function{}", rest)))
}

/// Walk the entry body and turn each helper call into an operation
pub(crate) fn build_plan(
    entry: &EntryFunction<'_>,
    helper: &str,
    kinds: &HashMap<&str, OperationKind>,
) -> Result<OperationPlan, DecipherError> {
    let mut plan = OperationPlan::default();

    for statement in statements(entry.body) {
        let Some(call) = parse_helper_call(statement) else {
            continue;
        };
        if call.object != helper || call.array != entry.param {
            debug!("Skipping statement outside the helper idiom: {}", statement);
            continue;
        }

        let kind = *kinds.get(call.member).ok_or_else(|| {
            DecipherError::ExtractionFailed(format!(
                "entry function calls unknown helper member {}.{}",
                helper, call.member
            ))
        })?;

        let literal = call.argument.and_then(|arg| arg.parse::<usize>().ok());
        let argument = match (kind, literal) {
            (_, Some(value)) => value,
            (OperationKind::Reverse, None) => 0,
            (_, None) => {
                return Err(DecipherError::ExtractionFailed(format!(
                    "{} call {}.{} has no integer literal argument",
                    kind, helper, call.member
                )))
            }
        };

        plan.push(Operation::new(kind, argument));
    }

    Ok(plan)
}

/// Integer after `signatureTimestamp:`, falling back to the short `sts:` label
pub(crate) fn find_signature_timestamp(player_code: &str) -> Result<Option<String>, DecipherError> {
    for label in ["signatureTimestamp", "sts"] {
        let sts_regex = Regex::new(&format!(
            r"(?:^|[,{{;\s]){}\s*:\s*(\d+)",
            label
        ))?;
        if let Some(value) = sts_regex.captures(player_code).and_then(|caps| caps.get(1)) {
            return Ok(Some(value.as_str().to_string()));
        }
    }
    Ok(None)
}

/// Parse `[<lhs>=]<object>.<member>(<array>[,<arg>])`
pub(crate) fn parse_helper_call(statement: &str) -> Option<HelperCall<'_>> {
    let captures = HELPER_CALL.captures(statement.trim())?;

    Some(HelperCall {
        object: captures.get(1)?.as_str(),
        member: captures.get(2)?.as_str(),
        array: captures.get(3)?.as_str(),
        argument: captures.get(4).map(|m| m.as_str()),
    })
}

fn statements(body: &str) -> Vec<&str> {
    body.split(';')
        .map(str::trim)
        .filter(|statement| !statement.is_empty())
        .collect()
}

/// Index of the brace closing the one at `open`, skipping string literals
fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (index, ch) in text[open..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' | '`' => quote = Some(ch),
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + index);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on `delimiter` where it is not nested in brackets or a string
fn split_top_level(text: &str, delimiter: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for index in top_level_positions(text, delimiter) {
        parts.push(&text[start..index]);
        start = index + delimiter.len_utf8();
    }
    parts.push(&text[start..]);
    parts
}

fn split_once_top_level(text: &str, delimiter: char) -> Option<(&str, &str)> {
    let index = top_level_positions(text, delimiter).into_iter().next()?;
    Some((&text[..index], &text[index + delimiter.len_utf8()..]))
}

fn top_level_positions(text: &str, delimiter: char) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (index, ch) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' | '`' => quote = Some(ch),
            '{' | '(' | '[' => depth += 1,
            '}' | ')' | ']' => depth -= 1,
            c if c == delimiter && depth == 0 => positions.push(index),
            _ => {}
        }
    }
    positions
}

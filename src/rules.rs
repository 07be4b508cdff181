//! Rename rules
//!
//! Every rule is evaluated against the item's original name, split into a
//! base name and an extension at the last `.`. Evaluation is pure: the same
//! original name, index and rule always produce the same output.

use crate::constants::{DEFAULT_SEQUENCE_DIGITS, DEFAULT_SEQUENCE_PREFIX, DEFAULT_SEQUENCE_START};
use crate::item::WorkItem;
use regex::Regex;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextPosition {
    #[default]
    Prefix,
    Suffix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseMode {
    #[default]
    None,
    Lower,
    Upper,
    TitleCase,
}

/// The active renaming strategy. Exactly one variant applies per recompute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameRule {
    Sequence {
        prefix: String,
        start: u64,
        digits: usize,
        suffix: String,
    },
    FindReplace {
        find: String,
        replacement: String,
        use_regex: bool,
    },
    ChangeExtension {
        new_extension: String,
    },
    AddText {
        text: String,
        position: TextPosition,
    },
    ChangeCase {
        mode: CaseMode,
    },
}

impl Default for RenameRule {
    fn default() -> Self {
        RenameRule::Sequence {
            prefix: DEFAULT_SEQUENCE_PREFIX.to_string(),
            start: DEFAULT_SEQUENCE_START,
            digits: DEFAULT_SEQUENCE_DIGITS,
            suffix: String::new(),
        }
    }
}

/// Splits `name` at the last `.` into `(base, extension)`; the extension keeps its dot.
pub fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(index) => name.split_at(index),
        None => (name, ""),
    }
}

enum Pattern {
    Unused,
    Literal,
    /// Compiled expression and the replacement rewritten into its template syntax.
    Regex(Regex, String),
    Invalid,
}

/// A rule prepared for evaluation over a whole batch.
///
/// Regular expressions are compiled once here. An invalid expression turns
/// the rule into a no-op instead of failing the batch.
pub struct NameDeriver<'a> {
    rule: &'a RenameRule,
    pattern: Pattern,
}

impl<'a> NameDeriver<'a> {
    pub fn new(rule: &'a RenameRule) -> Self {
        let pattern = match rule {
            RenameRule::FindReplace {
                find,
                replacement,
                use_regex: true,
            } if !find.is_empty() => {
                match Regex::new(find) {
                    Ok(regex) => {
                        let template = substitution_template(replacement, &regex);
                        Pattern::Regex(regex, template)
                    }
                    Err(e) => {
                        debug!("Ignoring invalid find pattern {:?}: {}", find, e);
                        Pattern::Invalid
                    }
                }
            }
            RenameRule::FindReplace { .. } => Pattern::Literal,
            _ => Pattern::Unused,
        };
        Self { rule, pattern }
    }

    pub fn derive(&self, original: &str, index: usize) -> String {
        let (base, ext) = split_name(original);

        match self.rule {
            RenameRule::Sequence {
                prefix,
                start,
                digits,
                suffix,
            } => {
                let number = start.saturating_add(index as u64).to_string();
                let padding = "0".repeat(digits.saturating_sub(number.len()));
                format!("{prefix}{padding}{number}{suffix}{ext}")
            }
            RenameRule::FindReplace {
                find, replacement, ..
            } => {
                if find.is_empty() {
                    return original.to_string();
                }
                match &self.pattern {
                    Pattern::Regex(regex, template) => regex.replace_all(original, template.as_str()).into_owned(),
                    Pattern::Invalid => original.to_string(),
                    Pattern::Literal | Pattern::Unused => original.replace(find.as_str(), replacement),
                }
            }
            RenameRule::ChangeExtension { new_extension } => {
                if new_extension.is_empty() {
                    return original.to_string();
                }
                if new_extension.starts_with('.') {
                    format!("{base}{new_extension}")
                } else {
                    format!("{base}.{new_extension}")
                }
            }
            RenameRule::AddText { text, position } => match position {
                TextPosition::Prefix => format!("{text}{base}{ext}"),
                TextPosition::Suffix => format!("{base}{text}{ext}"),
            },
            RenameRule::ChangeCase { mode } => match mode {
                CaseMode::None => original.to_string(),
                CaseMode::Lower => original.to_lowercase(),
                CaseMode::Upper => original.to_uppercase(),
                CaseMode::TitleCase => title_case(original),
            },
        }
    }
}

/// Name for `original` at position `index` under `rule`.
pub fn derive_name(original: &str, index: usize, rule: &RenameRule) -> String {
    NameDeriver::new(rule).derive(original, index)
}

/// Name for `item` at position `index` under `rule`, always computed from the original name.
pub fn compute_name(item: &WorkItem, index: usize, rule: &RenameRule) -> String {
    derive_name(item.original_name(), index, rule)
}

/// Rewrites a `$`-reference replacement into the `regex` crate's template syntax.
///
/// `$1`..`$99` name a group only when the expression has it, otherwise the
/// text is literal; `$12` falls back to group 1 followed by `2`. `$&` is the
/// whole match, `$<name>` a named group and `$$` a literal dollar. Every
/// other `$` is literal, so `$1_x` keeps `_x` after group 1.
fn substitution_template(replacement: &str, regex: &Regex) -> String {
    let bytes = replacement.as_bytes();
    let mut out = String::with_capacity(replacement.len() + 8);
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'$' {
            i += 1;
            continue;
        }
        out.push_str(&replacement[literal_start..i]);
        let (reference, consumed) = group_reference(&replacement[i + 1..], regex);
        match reference {
            Some(reference) => out.push_str(&reference),
            None => out.push_str("$$"),
        }
        i += 1 + consumed;
        literal_start = i;
    }

    out.push_str(&replacement[literal_start..]);
    out
}

// Reference following a `$`, with the number of bytes it spans. `None` means
// a literal dollar.
fn group_reference(after: &str, regex: &Regex) -> (Option<String>, usize) {
    let bytes = after.as_bytes();
    let groups = regex.captures_len();
    let digit = |i: usize| bytes.get(i).filter(|b| b.is_ascii_digit()).map(|b| (b - b'0') as usize);

    match bytes.first() {
        Some(b'$') => (None, 1),
        Some(b'&') => (Some("${0}".to_string()), 1),
        Some(b'<') => match after[1..].find('>') {
            Some(end) if regex.capture_names().flatten().any(|name| name == &after[1..1 + end]) => {
                (Some(format!("${{{}}}", &after[1..1 + end])), end + 2)
            }
            _ => (None, 0),
        },
        Some(_) => {
            let Some(first) = digit(0) else {
                return (None, 0);
            };
            if let Some(second) = digit(1) {
                let group = first * 10 + second;
                if group >= 1 && group < groups {
                    return (Some(format!("${{{}}}", group)), 2);
                }
            }
            if first >= 1 && first < groups {
                (Some(format!("${{{}}}", first)), 1)
            } else {
                (None, 0)
            }
        }
        None => (None, 0),
    }
}

// Each word starts at its first alphanumeric character; that character is
// uppercased and the rest of the word lowercased.
fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_word = false;

    for ch in name.chars() {
        if ch.is_whitespace() {
            in_word = false;
            out.push(ch);
        } else if in_word {
            out.extend(ch.to_lowercase());
        } else if ch.is_alphanumeric() || ch == '_' {
            in_word = true;
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
    }

    out
}

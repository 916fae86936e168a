//! Rule declarations and evaluation.
//!
//! Each field carries a [`RuleSet`]: at most one rule per [`RuleKind`], always
//! evaluated in the fixed order required, min length, max length, email. The
//! first failing rule decides the field's single error message.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// Check a value against the `local@domain.tld` shape.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value)
}

/// The kinds of checks a field can declare, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleKind {
    Required,
    MinLength,
    MaxLength,
    Email,
}

impl RuleKind {
    /// All kinds in the order they are evaluated.
    pub const ORDER: [RuleKind; 4] = [
        RuleKind::Required,
        RuleKind::MinLength,
        RuleKind::MaxLength,
        RuleKind::Email,
    ];

    /// Map a metadata key to a rule kind.
    ///
    /// Accepts both the attribute spellings (`require`, `min`, `max`) and the
    /// rule names.
    pub fn from_metadata_key(key: &str) -> Option<Self> {
        match key {
            "require" | "required" => Some(RuleKind::Required),
            "min" | "minLength" => Some(RuleKind::MinLength),
            "max" | "maxLength" => Some(RuleKind::MaxLength),
            "email" => Some(RuleKind::Email),
            _ => None,
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleKind::Required => write!(f, "required"),
            RuleKind::MinLength => write!(f, "minLength"),
            RuleKind::MaxLength => write!(f, "maxLength"),
            RuleKind::Email => write!(f, "email"),
        }
    }
}

/// A single check with its parameters and failure message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Rule {
    Required { message: String },
    MinLength { min: usize, message: String },
    MaxLength { max: usize, message: String },
    Email { message: String },
}

impl Rule {
    pub fn kind(&self) -> RuleKind {
        match self {
            Rule::Required { .. } => RuleKind::Required,
            Rule::MinLength { .. } => RuleKind::MinLength,
            Rule::MaxLength { .. } => RuleKind::MaxLength,
            Rule::Email { .. } => RuleKind::Email,
        }
    }

    /// The user-facing message reported when this rule fails.
    pub fn message(&self) -> &str {
        match self {
            Rule::Required { message }
            | Rule::MinLength { message, .. }
            | Rule::MaxLength { message, .. }
            | Rule::Email { message } => message,
        }
    }

    /// Whether `value` satisfies this rule.
    ///
    /// Length rules also fail on an empty value, so a field declaring only
    /// `MinLength(0)` still rejects `""`.
    pub fn check(&self, value: &str) -> bool {
        let len = value.chars().count();
        match self {
            Rule::Required { .. } => len > 0,
            Rule::MinLength { min, .. } => len > 0 && len >= *min,
            Rule::MaxLength { max, .. } => len > 0 && len <= *max,
            Rule::Email { .. } => is_valid_email(value),
        }
    }

    /// Build a rule from a `[param, message]` metadata list.
    ///
    /// Returns `None` for anything malformed: unparsable JSON, a non-array,
    /// a missing or non-string message, or a length that is not a
    /// non-negative integer.
    pub fn from_metadata(kind: RuleKind, raw: &str) -> Option<Self> {
        let list: Vec<Value> = serde_json::from_str(raw).ok()?;
        let message = list.get(1)?.as_str()?.to_string();

        let rule = match kind {
            RuleKind::Required => Rule::Required { message },
            RuleKind::MinLength => Rule::MinLength {
                min: length_param(list.first()?)?,
                message,
            },
            RuleKind::MaxLength => Rule::MaxLength {
                max: length_param(list.first()?)?,
                message,
            },
            RuleKind::Email => Rule::Email { message },
        };
        Some(rule)
    }
}

fn length_param(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// The rules declared on one field.
///
/// Holds at most one rule per kind, kept in evaluation order. Declaring a
/// kind twice replaces the earlier rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Rule>", into = "Vec<Rule>")]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// An empty rule set. Fields without rules are always valid.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a rule, replacing any existing rule of the same kind.
    pub fn add(&mut self, rule: Rule) -> &mut Self {
        let kind = rule.kind();
        match self.rules.binary_search_by_key(&kind, Rule::kind) {
            Ok(idx) => self.rules[idx] = rule,
            Err(idx) => self.rules.insert(idx, rule),
        }
        self
    }

    /// Builder-style method to add a rule.
    pub fn with(mut self, rule: Rule) -> Self {
        self.add(rule);
        self
    }

    pub fn required(self, message: impl Into<String>) -> Self {
        self.with(Rule::Required {
            message: message.into(),
        })
    }

    pub fn min_length(self, min: usize, message: impl Into<String>) -> Self {
        self.with(Rule::MinLength {
            min,
            message: message.into(),
        })
    }

    pub fn max_length(self, max: usize, message: impl Into<String>) -> Self {
        self.with(Rule::MaxLength {
            max,
            message: message.into(),
        })
    }

    pub fn email(self, message: impl Into<String>) -> Self {
        self.with(Rule::Email {
            message: message.into(),
        })
    }

    /// Parse rules from metadata entries such as `("require", "[true,\"Require\"]")`.
    ///
    /// Unknown keys and malformed lists are skipped: a rule that cannot be
    /// read is treated as not declared.
    pub fn from_metadata<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut set = RuleSet::new();
        for (key, raw) in entries {
            let Some(kind) = RuleKind::from_metadata_key(key) else {
                tracing::trace!(key, "ignoring unknown rule metadata");
                continue;
            };
            match Rule::from_metadata(kind, raw) {
                Some(rule) => {
                    set.add(rule);
                }
                None => tracing::trace!(%kind, raw, "malformed rule metadata treated as absent"),
            }
        }
        set
    }

    pub fn get(&self, kind: RuleKind) -> Option<&Rule> {
        self.rules.iter().find(|r| r.kind() == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The first rule `value` fails, in evaluation order.
    pub fn first_failure(&self, value: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| !rule.check(value))
    }

    /// Validate a value, returning the failing rule's message.
    pub fn validate(&self, value: &str) -> Result<(), &str> {
        match self.first_failure(value) {
            Some(rule) => Err(rule.message()),
            None => Ok(()),
        }
    }
}

impl From<Vec<Rule>> for RuleSet {
    fn from(rules: Vec<Rule>) -> Self {
        rules.into_iter().fold(RuleSet::new(), RuleSet::with)
    }
}

impl From<RuleSet> for Vec<Rule> {
    fn from(set: RuleSet) -> Self {
        set.rules
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<T: IntoIterator<Item = Rule>>(iter: T) -> Self {
        iter.into_iter().fold(RuleSet::new(), RuleSet::with)
    }
}

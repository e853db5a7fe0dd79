//! Sensitive field obfuscation for log metadata.
//!
//! The [`FieldObfuscator`] walks a JSON value and rewrites the value of every
//! object key that names a sensitive field, at any depth. Each field has its
//! own redaction pattern: most sensitive fields collapse to `***`, phone
//! numbers keep their first and last digits.
//!
//! - **Exact matching**: keys match rules by lowercase equality, not substring
//! - **Pre-computed lookup**: rule names are lowercased once at construction
//! - **Change tracking**: untouched subtrees are cloned wholesale, not rebuilt
//! - **Fail-safe**: a pattern that errors or panics yields `***`, never the raw value,
//!   and so does a container nested too deep to inspect

use serde_json::{Map, Number, Value};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::constants::{
    DEFAULT_SENSITIVE_FIELDS, MAX_OBFUSCATION_DEPTH, PHONE_NUMBER_FIELD, PHONE_VISIBLE_PREFIX,
    PHONE_VISIBLE_SUFFIX, REDACTED,
};
use crate::error::{LogError, LogResult, RedactionError};

/// The original value of a sensitive field, as handed to its pattern.
///
/// Null becomes `Undefined`, numbers are passed raw, strings as-is, and any
/// other value (bool, array, object) as its compact JSON text.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternInput<'a> {
    /// The field was null.
    Undefined,
    /// The field held a number.
    Number(&'a Number),
    /// The field held a string, or a value serialized to JSON text.
    Text(Cow<'a, str>),
}

impl<'a> PatternInput<'a> {
    /// Select the pattern input for a field value.
    pub fn from_value(value: &'a Value) -> Self {
        match value {
            Value::Null => Self::Undefined,
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::Text(Cow::Borrowed(s)),
            other => Self::Text(Cow::Owned(other.to_string())),
        }
    }

    /// Textual form of the input; `None` for `Undefined`.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Undefined => None,
            Self::Number(n) => Some(Cow::Owned(n.to_string())),
            Self::Text(t) => Some(Cow::Borrowed(t.as_ref())),
        }
    }
}

/// A redaction pattern: maps the original value to its replacement text.
pub type RedactFn =
    Arc<dyn Fn(PatternInput<'_>) -> Result<String, RedactionError> + Send + Sync>;

/// A sensitive field name paired with its redaction pattern.
#[derive(Clone)]
pub struct ObfuscationRule {
    field: String,
    pattern: RedactFn,
}

impl ObfuscationRule {
    /// Creates a rule with a custom pattern.
    ///
    /// # Example
    ///
    /// ```rust
    /// use reqlog::{ObfuscationRule, PatternInput, RedactionError};
    ///
    /// let rule = ObfuscationRule::new("email", |input: PatternInput<'_>| {
    ///     let text = input.as_text().ok_or_else(|| RedactionError::new("missing"))?;
    ///     let (_, domain) = text.split_once('@').ok_or_else(|| RedactionError::new("no @"))?;
    ///     Ok(format!("***@{domain}"))
    /// });
    /// assert_eq!(rule.apply(PatternInput::Text("a@b.io".into())), "***@b.io");
    /// assert_eq!(rule.apply(PatternInput::Undefined), "***");
    /// ```
    pub fn new<F>(field: impl Into<String>, pattern: F) -> Self
    where
        F: Fn(PatternInput<'_>) -> Result<String, RedactionError> + Send + Sync + 'static,
    {
        Self {
            field: field.into(),
            pattern: Arc::new(pattern),
        }
    }

    /// Creates a rule that replaces any value with a fixed string.
    pub fn constant(field: impl Into<String>, replacement: impl Into<String>) -> Self {
        let replacement = replacement.into();
        Self::new(field, move |_| Ok(replacement.clone()))
    }

    /// Creates a rule that keeps `prefix` leading and `suffix` trailing
    /// characters and replaces everything between them with `*`.
    pub fn mask(field: impl Into<String>, prefix: usize, suffix: usize) -> Self {
        Self::new(field, move |input| {
            let text = input
                .as_text()
                .ok_or_else(|| RedactionError::new("no value to mask"))?;
            mask_middle(&text, prefix, suffix)
        })
    }

    /// The field name this rule matches (case-insensitively).
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Runs the pattern, reporting an error or panic as a
    /// [`LogErrorCode::RedactionFailure`](crate::LogErrorCode::RedactionFailure).
    pub fn try_apply(&self, input: PatternInput<'_>) -> LogResult<String> {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.pattern)(input))) {
            Ok(Ok(redacted)) => Ok(redacted),
            Ok(Err(err)) => Err(LogError::redaction(&self.field, err.to_string())),
            Err(_) => Err(LogError::redaction(&self.field, "redaction pattern panicked")),
        }
    }

    /// Runs the pattern, falling back to `***` if it errors or panics.
    pub fn apply(&self, input: PatternInput<'_>) -> String {
        self.try_apply(input).unwrap_or_else(|err| {
            tracing::trace!(error = %err, field = ?err.field, "Redaction pattern failed");
            REDACTED.to_string()
        })
    }
}

impl fmt::Debug for ObfuscationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObfuscationRule")
            .field("field", &self.field)
            .finish_non_exhaustive()
    }
}

/// Keeps the first `prefix` and last `suffix` characters of `text` and
/// replaces every character strictly between them with `*`.
///
/// Fails when `text` is shorter than `prefix + suffix`, since the visible
/// parts would overlap.
pub fn mask_middle(text: &str, prefix: usize, suffix: usize) -> Result<String, RedactionError> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() < prefix + suffix {
        return Err(RedactionError::new(format!(
            "value of {} characters is too short to mask",
            chars.len()
        )));
    }

    let hidden = chars.len() - prefix - suffix;
    let mut masked = String::with_capacity(text.len());
    masked.extend(&chars[..prefix]);
    masked.extend(std::iter::repeat_n('*', hidden));
    masked.extend(&chars[chars.len() - suffix..]);
    Ok(masked)
}

/// The default rule set: credentials and tokens become `***`, phone numbers
/// are partially masked.
pub fn default_rules() -> Vec<ObfuscationRule> {
    DEFAULT_SENSITIVE_FIELDS
        .iter()
        .map(|field| ObfuscationRule::constant(*field, REDACTED))
        .chain(std::iter::once(ObfuscationRule::mask(
            PHONE_NUMBER_FIELD,
            PHONE_VISIBLE_PREFIX,
            PHONE_VISIBLE_SUFFIX,
        )))
        .collect()
}

/// Recursive obfuscator over JSON values.
///
/// Immutable once built; share it behind an `Arc` across concurrent callers.
#[derive(Debug, Clone)]
pub struct FieldObfuscator {
    rules: Vec<ObfuscationRule>,
    /// Lowercase field name -> index into `rules`.
    lookup: HashMap<String, usize>,
}

impl FieldObfuscator {
    /// Builds an obfuscator from an ordered rule sequence.
    ///
    /// When two rules share a lowercase field name, the later one wins.
    pub fn new(rules: impl IntoIterator<Item = ObfuscationRule>) -> Self {
        let rules: Vec<ObfuscationRule> = rules.into_iter().collect();
        let lookup = rules
            .iter()
            .enumerate()
            .map(|(idx, rule)| (rule.field.to_lowercase(), idx))
            .collect();
        Self { rules, lookup }
    }

    /// Builds an obfuscator with [`default_rules`].
    pub fn with_defaults() -> Self {
        Self::new(default_rules())
    }

    /// Returns a copy of this obfuscator with an extra rule appended.
    pub fn with_rule(mut self, rule: ObfuscationRule) -> Self {
        self.lookup.insert(rule.field.to_lowercase(), self.rules.len());
        self.rules.push(rule);
        self
    }

    /// The configured rules, in order.
    pub fn rules(&self) -> &[ObfuscationRule] {
        &self.rules
    }

    /// Returns the rule matching `key`, if any.
    pub fn rule_for(&self, key: &str) -> Option<&ObfuscationRule> {
        self.lookup
            .get(&key.to_lowercase())
            .map(|&idx| &self.rules[idx])
    }

    /// Whether `key` names a sensitive field.
    pub fn is_sensitive(&self, key: &str) -> bool {
        self.rule_for(key).is_some()
    }

    /// Returns an obfuscated copy of `value`.
    pub fn obfuscate(&self, value: &Value) -> Value {
        self.obfuscate_internal(value, 0)
            .unwrap_or_else(|| value.clone())
    }

    /// Returns an obfuscated copy of a JSON object's entries.
    pub fn obfuscate_map(&self, map: &Map<String, Value>) -> Map<String, Value> {
        self.obfuscate_entries(map, 0).unwrap_or_else(|| map.clone())
    }

    /// Returns `None` when nothing below `value` needed redaction.
    ///
    /// A container nested at [`MAX_OBFUSCATION_DEPTH`] is not inspected and
    /// is replaced by `***` as a whole.
    fn obfuscate_internal(&self, value: &Value, depth: usize) -> Option<Value> {
        if depth >= MAX_OBFUSCATION_DEPTH {
            return match value {
                Value::Object(_) | Value::Array(_) => Some(Value::String(REDACTED.to_string())),
                _ => None,
            };
        }

        match value {
            Value::Object(map) => self.obfuscate_entries(map, depth).map(Value::Object),
            Value::Array(items) => {
                let mut redacted = Vec::with_capacity(items.len());
                let mut any_changed = false;

                for item in items {
                    match self.obfuscate_internal(item, depth + 1) {
                        Some(changed) => {
                            redacted.push(changed);
                            any_changed = true;
                        }
                        None => redacted.push(item.clone()),
                    }
                }

                any_changed.then_some(Value::Array(redacted))
            }
            _ => None,
        }
    }

    fn obfuscate_entries(&self, map: &Map<String, Value>, depth: usize) -> Option<Map<String, Value>> {
        let mut redacted = Map::with_capacity(map.len());
        let mut any_changed = false;

        for (key, val) in map {
            if let Some(rule) = self.rule_for(key) {
                let replacement = rule.apply(PatternInput::from_value(val));
                redacted.insert(key.clone(), Value::String(replacement));
                any_changed = true;
                continue;
            }

            match self.obfuscate_internal(val, depth + 1) {
                Some(changed) => {
                    redacted.insert(key.clone(), changed);
                    any_changed = true;
                }
                None => {
                    redacted.insert(key.clone(), val.clone());
                }
            }
        }

        any_changed.then_some(redacted)
    }
}

impl Default for FieldObfuscator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Obfuscates `value` with an ad-hoc rule set.
///
/// Builds the lookup on every call; hold a [`FieldObfuscator`] when the same
/// rules are applied repeatedly.
pub fn obfuscate(value: &Value, rules: &[ObfuscationRule]) -> Value {
    FieldObfuscator::new(rules.iter().cloned()).obfuscate(value)
}

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::parser::{PROGRAM_END, PROGRAM_START};

/// One trigger/response pair, optionally guarded by a condition and
/// carrying default values for `{placeholder}` template variables.
///
/// Rules are immutable once constructed; evolution operators build new
/// rules instead of editing existing ones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rule {
    /// Non-empty text matched case-insensitively against inputs.
    pub trigger: String,
    /// Response text, may contain `{name}` placeholders.
    pub response: String,
    /// Optional `key==value` guard over external context variables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Optional default values for response placeholders, in declaration order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<IndexMap<String, String>>,
}

impl Rule {
    /// Creates a plain trigger/response rule.
    #[must_use]
    pub fn new(trigger: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            response: response.into(),
            condition: None,
            template: None,
        }
    }

    /// Sets the condition expression.
    #[must_use]
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Sets the template mapping.
    #[must_use]
    pub fn with_template(mut self, template: IndexMap<String, String>) -> Self {
        self.template = Some(template);
        self
    }

    /// Serializes this rule as one wire-grammar clause.
    #[must_use]
    pub fn to_clause(&self) -> String {
        let mut clause = format!("RULE:{}|RESPONSE:{}", self.trigger, self.response);
        if let Some(condition) = &self.condition {
            clause.push_str("|CONDITION:");
            clause.push_str(condition);
        }
        if let Some(template) = &self.template {
            let pairs: Vec<String> = template
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect();
            clause.push_str("|TEMPLATE:");
            clause.push_str(&pairs.join(","));
        }
        clause
    }
}

/// Ordered collection of rules evaluated together against one input.
///
/// Order is significant: matching keeps the response of the last rule
/// whose trigger occurs in the input, so later rules override earlier
/// ones. The system may be empty; every contained rule has a non-empty
/// trigger.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "RawRuleSystem")]
pub struct RuleSystem {
    rules: Vec<Rule>,
}

/// Wire shape of [`RuleSystem`]; conversion re-applies the
/// empty-trigger filter on deserialized input.
#[derive(Deserialize)]
struct RawRuleSystem {
    rules: Vec<Rule>,
}

impl From<RawRuleSystem> for RuleSystem {
    fn from(raw: RawRuleSystem) -> Self {
        Self::new(raw.rules)
    }
}

impl RuleSystem {
    /// Creates a system from rules, dropping any with an empty trigger.
    #[must_use]
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .filter(|rule| !rule.trigger.is_empty())
                .collect(),
        }
    }

    /// The empty system; always answers with the no-match sentinel.
    #[must_use]
    pub const fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rule at `index`, if present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the system holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Serializes the system back to wire-grammar program text.
    ///
    /// Re-parsing the result yields an equal system, which is what the
    /// publishing phase relies on when sharing programs on the channel.
    #[must_use]
    pub fn to_program(&self) -> String {
        let clauses: Vec<String> = self.rules.iter().map(Rule::to_clause).collect();
        format!("{PROGRAM_START} {} {PROGRAM_END}", clauses.join("|"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_triggers_are_dropped_on_construction() {
        let system = RuleSystem::new(vec![Rule::new("", "nope"), Rule::new("hello", "Hi there!")]);
        assert_eq!(system.len(), 1);
        assert_eq!(system.rules()[0].trigger, "hello");
    }

    #[test]
    fn clause_serialization_includes_optional_segments() {
        let mut template = IndexMap::new();
        template.insert("city".to_string(), "Berlin".to_string());
        let rule = Rule::new("weather", "Today in {city}")
            .with_condition("timeOfDay==morning")
            .with_template(template);
        assert_eq!(
            rule.to_clause(),
            "RULE:weather|RESPONSE:Today in {city}|CONDITION:timeOfDay==morning|TEMPLATE:city=Berlin"
        );
    }

    #[test]
    fn program_serialization_joins_clauses_with_rule_separator() {
        let system = RuleSystem::new(vec![
            Rule::new("hello", "Hi there!"),
            Rule::new("pricing", "See our plans."),
        ]);
        assert_eq!(
            system.to_program(),
            "FUNGISTART RULE:hello|RESPONSE:Hi there!|RULE:pricing|RESPONSE:See our plans. FUNGIEND"
        );
    }

    #[test]
    fn deserialization_applies_the_empty_trigger_filter() {
        let json = r#"{"rules":[{"trigger":"","response":"nope"},{"trigger":"hello","response":"Hi there!"}]}"#;
        let system: RuleSystem = serde_json::from_str(json).unwrap();
        assert_eq!(system.len(), 1);
        assert_eq!(system.rules()[0].trigger, "hello");
    }

    #[test]
    fn systems_round_trip_through_serde() {
        let system = RuleSystem::new(vec![Rule::new("hello", "Hi there!")]);
        let json = serde_json::to_string(&system).unwrap();
        let parsed: RuleSystem = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, system);
    }
}

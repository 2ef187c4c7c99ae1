use crate::model::RuleSystem;

/// Sentinel returned when no trigger occurs in the input.
pub const NO_MATCH_RESPONSE: &str = "Sorry, no match";

/// Selects a response for `input` from the rule system.
///
/// Matching is a case-insensitive substring test of each trigger
/// against the input. Every rule is visited in order and the response
/// of the last matching rule wins, so later rules override earlier
/// ones with overlapping triggers. Condition and template fields are
/// inert here; their presence never causes an error.
#[must_use]
pub fn respond(system: &RuleSystem, input: &str) -> String {
    let haystack = input.to_lowercase();
    let mut response = NO_MATCH_RESPONSE.to_string();
    for rule in system.rules() {
        if haystack.contains(&rule.trigger.to_lowercase()) {
            response.clone_from(&rule.response);
        }
    }
    response
}

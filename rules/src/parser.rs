use indexmap::IndexMap;
use thiserror::Error;

use crate::model::{Rule, RuleSystem};

/// Marker opening a program embedded in arbitrary message text.
pub const PROGRAM_START: &str = "FUNGISTART";

/// Marker closing a program.
pub const PROGRAM_END: &str = "FUNGIEND";

/// Failures raised while extracting a program from raw text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The start or end marker is absent.
    #[error("program start or end marker not found")]
    MissingMarkers,
    /// The end marker occurs before the start marker.
    #[error("program end marker precedes the start marker")]
    MarkersOutOfOrder,
    /// A clause carries a trigger but no `RESPONSE:` segment.
    ///
    /// This also rejects the historical `ONREPLY .. DORESPOND ..` token
    /// form, which parses as a single response-less clause.
    #[error("clause {0:?} has no RESPONSE segment")]
    ClauseWithoutResponse(String),
}

/// Parser for the FUNGI wire grammar.
///
/// A program is the text between [`PROGRAM_START`] and [`PROGRAM_END`];
/// surrounding commentary is ignored, which lets the lifecycle scan
/// arbitrary public messages for embedded programs. Clauses are
/// separated by `|RULE:` and have the shape
/// `trigger|RESPONSE:text[|CONDITION:expr][|TEMPLATE:k=v,...]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleParser;

impl RuleParser {
    /// Creates a parser.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Parses raw message text into a rule system.
    ///
    /// Whitespace-only clauses and clauses whose trigger is empty are
    /// silently dropped; the remaining clauses appear in clause order.
    pub fn parse(&self, raw: &str) -> Result<RuleSystem, ParseError> {
        let start = raw.find(PROGRAM_START).ok_or(ParseError::MissingMarkers)?;
        let end = raw.find(PROGRAM_END).ok_or(ParseError::MissingMarkers)?;
        let body_start = start + PROGRAM_START.len();
        if end < body_start {
            return Err(ParseError::MarkersOutOfOrder);
        }

        let interior: String = raw[body_start..end]
            .chars()
            .filter(|c| *c != '\r' && *c != '\n')
            .collect();

        let mut rules = Vec::new();
        for (index, clause) in interior.split("|RULE:").enumerate() {
            let mut clause = clause.trim();
            if index == 0 {
                // The leading clause may carry an explicit RULE: label.
                clause = clause.strip_prefix("RULE:").unwrap_or(clause);
            }
            if clause.chars().all(|c| c == '|' || c.is_whitespace()) {
                continue;
            }
            if let Some(rule) = Self::parse_clause(clause)? {
                rules.push(rule);
            }
        }
        Ok(RuleSystem::new(rules))
    }

    /// Cheap validity check used to filter candidate messages.
    ///
    /// Returns `false` without attempting a parse when neither marker
    /// occurs in the text; otherwise returns whether [`Self::parse`]
    /// succeeds. Never propagates the parse error.
    #[must_use]
    pub fn contains_valid_program(&self, content: &str) -> bool {
        if !content.contains(PROGRAM_START) && !content.contains(PROGRAM_END) {
            return false;
        }
        self.parse(content).is_ok()
    }

    fn parse_clause(clause: &str) -> Result<Option<Rule>, ParseError> {
        let mut segments = clause.split('|');
        let trigger = segments.next().unwrap_or_default().trim();

        let mut response = None;
        let mut condition = None;
        let mut template = None;
        for segment in segments {
            // Only the first colon delimits the key; values may contain more.
            let Some((key, value)) = segment.split_once(':') else {
                continue;
            };
            match key.trim() {
                "RESPONSE" => response = Some(value.trim().to_string()),
                "CONDITION" => condition = Some(value.trim().to_string()),
                "TEMPLATE" => template = Some(Self::parse_template(value)),
                _ => {}
            }
        }

        let Some(response) = response else {
            return Err(ParseError::ClauseWithoutResponse(clause.to_string()));
        };
        if trigger.is_empty() {
            return Ok(None);
        }

        let mut rule = Rule::new(trigger, response);
        if let Some(condition) = condition {
            rule = rule.with_condition(condition);
        }
        if let Some(template) = template {
            rule = rule.with_template(template);
        }
        Ok(Some(rule))
    }

    fn parse_template(value: &str) -> IndexMap<String, String> {
        value
            .split(',')
            .filter_map(|pair| {
                let (key, val) = pair.split_once('=')?;
                let key = key.trim();
                if key.is_empty() {
                    return None;
                }
                Some((key.to_string(), val.trim().to_string()))
            })
            .collect()
    }
}

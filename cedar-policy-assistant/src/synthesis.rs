/*
 * Copyright Cedar Contributors
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *      https://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Synthesis of test scenarios from the comparison conditions in a policy.
//!
//! Conditions are found lexically: an attribute path such as
//! `resource.amount`, one of the six comparison operators, and a bare word or
//! number. Quoted strings, negative numbers, and anything more complex are
//! not recognized. Every condition yields a matching and a non-matching case.
//!
//! The expected decision of each case is a placeholder. It is `true` for the
//! matching case exactly when the text contains `permit` (in any case), and
//! the opposite for the non-matching case. The policy is never evaluated, so a
//! policy containing both `permit` and `forbid`, or several conditions joined
//! with `&&`/`||`, gets decisions that may not hold.

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::syntax::{mentions, PERMIT};

// PANIC SAFETY This is a valid `Regex`
#[allow(clippy::unwrap_used)]
mod constants {
    use regex::Regex;

    lazy_static::lazy_static! {
        pub static ref CONDITION: Regex =
            Regex::new(r"(\w+(?:\.\w+)+)\s*(==|!=|>=|<=|>|<)\s*(\w+)").unwrap();
    }
}

/// Value used in every non-matching case built from a non-numeric literal
pub const DIFFERENT_VALUE: &str = "different_value";

const NAIVE_DECISION_NOTE: &str =
    "expected decision follows the policy's effect keyword; the policy is not evaluated";

/// Comparison operator of a [`Condition`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOp {
    /// `==`
    #[serde(rename = "==")]
    Eq,
    /// `!=`
    #[serde(rename = "!=")]
    NotEq,
    /// `>`
    #[serde(rename = ">")]
    Greater,
    /// `<`
    #[serde(rename = "<")]
    Less,
    /// `>=`
    #[serde(rename = ">=")]
    GreaterEq,
    /// `<=`
    #[serde(rename = "<=")]
    LessEq,
}

impl ComparisonOp {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "==" => Some(Self::Eq),
            "!=" => Some(Self::NotEq),
            ">" => Some(Self::Greater),
            "<" => Some(Self::Less),
            ">=" => Some(Self::GreaterEq),
            "<=" => Some(Self::LessEq),
            _ => None,
        }
    }

    /// The operator as written in policy text
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Greater => ">",
            Self::Less => "<",
            Self::GreaterEq => ">=",
            Self::LessEq => "<=",
        }
    }
}

impl Display for ComparisonOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A comparison found in policy text, e.g. `resource.amount >= 5000`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Dotted attribute path on the left of the operator
    pub attribute_path: SmolStr,
    /// The comparison operator
    pub op: ComparisonOp,
    /// The bare word or number on the right of the operator
    pub literal: SmolStr,
}

/// Attribute value assigned in a [`TestCase`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum LiteralValue {
    /// A literal made only of ASCII digits that fits in a Cedar `Long`
    Long(i64),
    /// A literal made only of ASCII digits that is too large for a `Long`,
    /// kept as its decimal text
    Digits(SmolStr),
    /// Any other bare word, kept as written
    Token(SmolStr),
}

impl LiteralValue {
    fn parse(literal: &str) -> Self {
        if literal.is_empty() || !literal.bytes().all(|b| b.is_ascii_digit()) {
            return Self::Token(SmolStr::new(literal));
        }
        match literal.parse() {
            Ok(n) => Self::Long(n),
            Err(_) => Self::Digits(SmolStr::new(literal)),
        }
    }

    /// A value that should not satisfy the condition this one came from:
    /// one less for numbers, [`DIFFERENT_VALUE`] for anything else
    fn counterexample(&self) -> Self {
        match self {
            // literals are non-negative, so this can't overflow
            Self::Long(n) => Self::Long(n - 1),
            // always greater than `i64::MAX`, so never zero
            Self::Digits(digits) => Self::Digits(decrement_decimal(digits).into()),
            Self::Token(_) => Self::Token(SmolStr::new_static(DIFFERENT_VALUE)),
        }
    }
}

/// Subtract one from a positive decimal numeral, borrowing through trailing
/// `0`s. A leading `0` produced by the borrow is dropped.
fn decrement_decimal(digits: &str) -> String {
    let mut out: Vec<char> = digits.chars().collect();
    for c in out.iter_mut().rev() {
        match c.to_digit(10) {
            Some(0) => *c = '9',
            Some(d) => {
                *c = char::from_digit(d - 1, 10).unwrap_or(*c);
                break;
            }
            None => break,
        }
    }
    let decremented: String = out.into_iter().collect();
    if digits.starts_with('0') {
        return decremented;
    }
    match decremented.strip_prefix('0') {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => decremented,
    }
}

impl Display for LiteralValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Long(n) => write!(f, "{n}"),
            Self::Digits(d) => write!(f, "{d}"),
            Self::Token(t) => write!(f, "{t}"),
        }
    }
}

/// A synthesized test scenario.
///
/// `expected_decision` is derived from the policy's effect keyword only; it
/// is not the result of evaluating the policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    /// Human-readable summary, including a note about how the decision was derived
    pub description: String,
    /// Principal to use for the request
    pub principal: SmolStr,
    /// Action to use for the request
    pub action: SmolStr,
    /// Attribute path to value for the resource (and context) under test
    pub resource_attributes: BTreeMap<SmolStr, LiteralValue>,
    /// Placeholder decision: see the type-level docs
    pub expected_decision: bool,
}

/// Settings for test synthesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct SynthesisConfig {
    /// Principal placed in every test case
    pub test_principal: SmolStr,
    /// Action placed in every test case
    pub test_action: SmolStr,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            test_principal: SmolStr::new_static(r#"User::"TestUser""#),
            test_action: SmolStr::new_static(r#"Action::"TestAction""#),
        }
    }
}

/// Find every comparison condition in `text`, in order of appearance
pub fn extract_conditions(text: &str) -> Vec<Condition> {
    constants::CONDITION
        .captures_iter(text)
        .filter_map(|caps| {
            Some(Condition {
                attribute_path: SmolStr::new(caps.get(1)?.as_str()),
                op: ComparisonOp::from_token(caps.get(2)?.as_str())?,
                literal: SmolStr::new(caps.get(3)?.as_str()),
            })
        })
        .collect()
}

/// Synthesize test cases for `text` with the default [`SynthesisConfig`]
pub fn synthesize(text: &str) -> Vec<TestCase> {
    synthesize_with(text, &SynthesisConfig::default())
}

/// Synthesize two test cases per condition in `text`: one that matches the
/// condition and one that doesn't
pub fn synthesize_with(text: &str, config: &SynthesisConfig) -> Vec<TestCase> {
    let permits = mentions(text, PERMIT);
    extract_conditions(text)
        .into_iter()
        .flat_map(|condition| {
            let value = LiteralValue::parse(&condition.literal);
            let counterexample = value.counterexample();
            let Condition {
                attribute_path,
                op,
                literal,
            } = condition;
            [
                TestCase {
                    description: format!(
                        "Test {attribute_path} {op} {literal} - should match policy ({NAIVE_DECISION_NOTE})"
                    ),
                    principal: config.test_principal.clone(),
                    action: config.test_action.clone(),
                    resource_attributes: BTreeMap::from([(attribute_path.clone(), value)]),
                    expected_decision: permits,
                },
                TestCase {
                    description: format!(
                        "Test {attribute_path} != {literal} - should not match policy ({NAIVE_DECISION_NOTE})"
                    ),
                    principal: config.test_principal.clone(),
                    action: config.test_action.clone(),
                    resource_attributes: BTreeMap::from([(attribute_path, counterexample)]),
                    expected_decision: !permits,
                },
            ]
        })
        .collect()
}

// PANIC SAFETY unit tests
#[allow(clippy::indexing_slicing)]
#[cfg(test)]
mod test {
    use super::*;
    use cool_asserts::assert_matches;

    fn attribute<'a>(case: &'a TestCase, path: &str) -> Option<&'a LiteralValue> {
        case.resource_attributes.get(path)
    }

    #[test]
    fn numeric_condition() {
        let cases = synthesize(
            r#"forbid (principal, action == Action::"CreateTransaction", resource) when { resource.amount >= 5000 };"#,
        );
        assert_eq!(cases.len(), 2);
        assert_eq!(attribute(&cases[0], "resource.amount"), Some(&LiteralValue::Long(5000)));
        assert_eq!(attribute(&cases[1], "resource.amount"), Some(&LiteralValue::Long(4999)));
        // no `permit` in the text
        assert!(!cases[0].expected_decision);
        assert!(cases[1].expected_decision);
    }

    #[test]
    fn permit_flips_decisions() {
        let cases = synthesize("PERMIT (principal, action, resource) when { resource.level < 3 };");
        assert_eq!(cases.len(), 2);
        assert!(cases[0].expected_decision);
        assert!(!cases[1].expected_decision);
        assert_eq!(attribute(&cases[1], "resource.level"), Some(&LiteralValue::Long(2)));
    }

    #[test]
    fn identifier_condition() {
        let cases = synthesize("permit (principal, action, resource) when { resource.status == active };");
        assert_eq!(cases.len(), 2);
        assert_eq!(
            attribute(&cases[0], "resource.status"),
            Some(&LiteralValue::Token("active".into()))
        );
        assert_eq!(
            attribute(&cases[1], "resource.status"),
            Some(&LiteralValue::Token(DIFFERENT_VALUE.into()))
        );
    }

    #[test]
    fn zero_goes_negative() {
        let cases = synthesize("permit(principal, action, resource) when { resource.count > 0 };");
        assert_eq!(attribute(&cases[1], "resource.count"), Some(&LiteralValue::Long(-1)));
    }

    #[test]
    fn descriptions_mention_the_heuristic() {
        let cases = synthesize("permit(principal, action, resource) when { resource.amount >= 5000 };");
        assert!(cases[0]
            .description
            .starts_with("Test resource.amount >= 5000 - should match policy"));
        assert!(cases[1]
            .description
            .starts_with("Test resource.amount != 5000 - should not match policy"));
        for case in &cases {
            assert!(case.description.contains("not evaluated"), "{}", case.description);
        }
    }

    #[test]
    fn cases_follow_condition_order() {
        let cases = synthesize(
            "permit(principal, action, resource) when { context.hour>=9 && resource.owner.tier == gold };",
        );
        assert_eq!(cases.len(), 4);
        assert!(cases[0].resource_attributes.contains_key("context.hour"));
        assert!(cases[1].resource_attributes.contains_key("context.hour"));
        assert!(cases[2].resource_attributes.contains_key("resource.owner.tier"));
        assert!(cases[3].resource_attributes.contains_key("resource.owner.tier"));
    }

    #[test]
    fn unrecognized_conditions() {
        assert!(synthesize(r#"permit(principal, action, resource) when { principal.department == "Engineering" };"#).is_empty());
        assert!(synthesize("permit(principal, action, resource) when { resource.balance > -5 };").is_empty());
        assert!(synthesize(r#"permit(principal == User::"a", action, resource);"#).is_empty());
        assert!(synthesize("").is_empty());
    }

    #[test]
    fn extraction() {
        let conditions = extract_conditions("when { resource.amount <= 10 || context.ok != no }");
        assert_matches!(&conditions[..], [first, second] => {
            assert_eq!(first.attribute_path, "resource.amount");
            assert_eq!(first.op, ComparisonOp::LessEq);
            assert_eq!(first.literal, "10");
            assert_eq!(second.op, ComparisonOp::NotEq);
            assert_eq!(second.literal, "no");
        });
    }

    #[test]
    fn configured_principal_and_action() {
        let config = SynthesisConfig {
            test_principal: r#"Employee::"tester""#.into(),
            test_action: r#"Action::"Approve""#.into(),
        };
        let cases = synthesize_with("forbid(principal, action, resource) when { resource.x == 1 };", &config);
        assert!(cases.iter().all(|c| c.principal == config.test_principal && c.action == config.test_action));

        let defaults = synthesize("forbid(principal, action, resource) when { resource.x == 1 };");
        assert_eq!(defaults[0].principal, r#"User::"TestUser""#);
        assert_eq!(defaults[0].action, r#"Action::"TestAction""#);
    }

    #[test]
    fn numbers_wider_than_long() {
        let cases = synthesize("permit(principal, action, resource) when { resource.n >= 99999999999999999999 };");
        assert_eq!(
            attribute(&cases[0], "resource.n"),
            Some(&LiteralValue::Digits("99999999999999999999".into()))
        );
        assert_eq!(
            attribute(&cases[1], "resource.n"),
            Some(&LiteralValue::Digits("99999999999999999998".into()))
        );

        let cases = synthesize("permit(principal, action, resource) when { resource.n < 100000000000000000000 };");
        assert_eq!(
            attribute(&cases[1], "resource.n"),
            Some(&LiteralValue::Digits("99999999999999999999".into()))
        );
        assert!(cases[1].description.contains("!= 100000000000000000000"));
    }

    #[test]
    fn decrement_borrows() {
        assert_eq!(decrement_decimal("9223372036854775808"), "9223372036854775807");
        assert_eq!(decrement_decimal("100000000000000000000"), "99999999999999999999");
        assert_eq!(decrement_decimal("12300000000000000000000"), "12299999999999999999999");
        assert_eq!(decrement_decimal("010000000000000000000"), "009999999999999999999");
    }

    #[test]
    fn serialized_shape() {
        let cases = synthesize("permit(principal, action, resource) when { resource.amount >= 5000 };");
        let json = serde_json::to_value(&cases[0]).unwrap_or_default();
        assert_eq!(json["resourceAttributes"]["resource.amount"], serde_json::json!(5000));
        assert_eq!(json["expectedDecision"], serde_json::json!(true));
        assert_eq!(json["principal"], serde_json::json!(r#"User::"TestUser""#));
    }
}

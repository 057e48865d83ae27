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

#![cfg(test)]
// PANIC SAFETY tests
#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use cedar_policy_assistant::{
    check_references, check_syntax, customize, recommend, synthesize, validate, LiteralValue,
    Schema, SchemaError, SyntaxError, Validator,
};
use cool_asserts::assert_matches;
use proptest::prelude::*;
use serde_json::json;
use similar_asserts::assert_eq;

fn bank_schema() -> Schema {
    Schema::from_json_str(
        r#"{
            "SecureBank": {
                "entityTypes": {
                    "User": { "shape": { "type": "Record", "attributes": { "userId": { "type": "String" } } } },
                    "Account": { "memberOfTypes": ["User"] },
                    "Transaction": {}
                },
                "actions": {
                    "CreateTransaction": { "appliesTo": { "principalTypes": ["User"], "resourceTypes": ["Transaction"] } },
                    "ViewAccount": { "appliesTo": { "principalTypes": ["User"], "resourceTypes": ["Account"] } }
                }
            }
        }"#,
    )
    .unwrap()
}

#[test]
fn namespaced_schema_matches_unwrapped() {
    let wrapped = bank_schema();
    let unwrapped = Schema::from_json_value(json!({
        "entityTypes": { "User": {}, "Account": {}, "Transaction": {} },
        "actions": { "CreateTransaction": {}, "ViewAccount": {} }
    }))
    .unwrap();
    assert_eq!(wrapped.namespace(), Some("SecureBank"));
    assert_eq!(
        wrapped.entity_type_names().collect::<Vec<_>>(),
        vec!["Account", "Transaction", "User"]
    );
    assert_eq!(
        wrapped.action_names().collect::<Vec<_>>(),
        unwrapped.action_names().collect::<Vec<_>>()
    );
    assert_eq!(
        wrapped.entity_type_names().collect::<Vec<_>>(),
        unwrapped.entity_type_names().collect::<Vec<_>>()
    );
}

#[test]
fn unrecognizable_schema() {
    assert_matches!(
        Schema::from_json_str(r#"{ "Foo": { "Bar": {} } }"#),
        Err(SchemaError::Format(_))
    );
    assert_matches!(
        Schema::from_json_str("entity User;"),
        Err(SchemaError::JsonDeserialization(_))
    );
}

#[test]
fn syntax_examples() {
    assert!(check_syntax("permit(principal,action,resource);").is_empty());
    assert_eq!(
        check_syntax("permit(principal,action,resource)"),
        vec![SyntaxError::MissingSemicolon]
    );
    assert!(check_syntax("forbid(a,b;").contains(&SyntaxError::UnbalancedParentheses));
}

#[test]
fn reference_example() {
    let schema = Schema::from_json_value(json!({
        "entityTypes": ["User", "Account"],
        "actions": ["ViewAccount"]
    }))
    .unwrap();
    let errors = check_references(
        r#"permit(principal == Admin::"x", action == Action::"DeleteAccount", resource);"#,
        &schema,
    );
    let names: Vec<_> = errors.iter().map(|e| e.name()).collect();
    assert_eq!(names, vec!["Admin", "DeleteAccount"]);
}

#[test]
fn synthesis_example() {
    let cases = synthesize(r#"forbid(principal, action, resource) when { resource.amount >= 5000 };"#);
    assert_eq!(cases.len(), 2);
    assert_eq!(
        cases[0].resource_attributes.get("resource.amount"),
        Some(&LiteralValue::Long(5000))
    );
    assert_eq!(
        cases[1].resource_attributes.get("resource.amount"),
        Some(&LiteralValue::Long(4999))
    );
    assert!(!cases[0].expected_decision);
    assert!(cases[1].expected_decision);
}

#[test]
fn recommendation_flow() {
    let schema = bank_schema();
    let current = recommend(&schema);
    let ids: Vec<_> = current.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["high_value_tx", "account_access", "manager_override"]);

    let policy = customize("high_value_tx", [("threshold", 2500)], &current).unwrap();
    let result = validate(&policy, &schema);
    assert!(result.validation_passed(), "{:?}", result.error_messages());
    assert_eq!(result.test_cases().len(), 2);
    assert_eq!(customize("after_hours", [("x", 1)], &current), None);
}

#[test]
fn recommendation_templates_validate() {
    let schema = bank_schema();
    for recommendation in recommend(&schema) {
        let result = validate(&recommendation.render_default(), &schema);
        assert!(
            result.validation_passed(),
            "{}: {:?}",
            recommendation.id,
            result.error_messages()
        );
    }
}

#[test]
fn invalid_policy_still_gets_tests() {
    let result = validate(
        r#"permit (principal == Teller::"t", action == Action::"Refund", resource) when { resource.amount < 100 }"#,
        &bank_schema(),
    );
    assert!(!result.validation_passed());
    assert_eq!(
        result.error_messages(),
        vec![
            "Policy must end with semicolon".to_string(),
            "Unknown entity type: Teller".to_string(),
            "Unknown action: Refund".to_string(),
        ]
    );
    assert_eq!(result.test_cases().len(), 2);
}

#[test]
fn shared_schema_across_threads() {
    let schema = bank_schema();
    let validator = Validator::new();
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let schema = &schema;
                let validator = &validator;
                s.spawn(move || {
                    validator.validate(
                        &format!("permit(principal, action, resource) when {{ resource.amount > {i} }};"),
                        schema,
                    )
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().validation_passed());
        }
    });
}

fn condition() -> impl Strategy<Value = String> {
    (
        "[a-z]{1,8}",
        prop_oneof![
            Just("=="),
            Just("!="),
            Just(">"),
            Just("<"),
            Just(">="),
            Just("<=")
        ],
        "[A-Za-z0-9_]{1,8}",
    )
        .prop_map(|(attr, op, literal)| format!("resource.{attr} {op} {literal}"))
}

proptest! {
    #[test]
    fn never_panics(text in any::<String>()) {
        let schema = bank_schema();
        let result = validate(&text, &schema);
        prop_assert_eq!(result.validation_passed(), result.errors().count() == 0);
    }

    #[test]
    fn idempotent(text in "[ -~]{0,80}") {
        let schema = bank_schema();
        prop_assert_eq!(validate(&text, &schema), validate(&text, &schema));
    }

    #[test]
    fn conditions_always_yield_tests(prefix in "[ -~]{0,20}", cond in condition()) {
        let text = format!("{prefix} when {{ {cond} }}");
        let result = validate(&text, &bank_schema());
        prop_assert!(!result.test_cases().is_empty());
        prop_assert_eq!(result.test_cases().len() % 2, 0);
    }
}

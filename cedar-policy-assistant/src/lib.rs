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

//! Authoring assistance for candidate Cedar policies.
//!
//! Policies produced by a text generator (or typed by a human) are checked
//! lexically against a small set of structural rules, their entity and action
//! references are resolved against a schema, and paired test scenarios are
//! synthesized from the comparison conditions they contain. Independently,
//! a schema can be inspected for well-known shapes to produce parameterized
//! policy recommendations.
//!
//! None of this is a Cedar parser or evaluator. All checks are best-effort
//! lexical scans meant to catch common authoring mistakes, and the expected
//! decisions attached to synthesized test cases are derived from the policy's
//! effect keyword alone.
//!
//! ```
//! use cedar_policy_assistant::{validate, Schema};
//!
//! let schema = Schema::from_json_str(
//!     r#"{ "SecureBank": {
//!         "entityTypes": { "User": {}, "Transaction": {} },
//!         "actions": { "CreateTransaction": {} }
//!     } }"#,
//! )
//! .unwrap();
//! let result = validate(
//!     r#"forbid (principal, action == Action::"CreateTransaction", resource)
//!        when { resource.amount >= 5000 };"#,
//!     &schema,
//! );
//! assert!(result.validation_passed());
//! assert_eq!(result.test_cases().len(), 2);
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

pub mod recommend;
pub use recommend::{customize, recommend, ParameterValue, Priority, Recommendation};
pub mod references;
pub use references::{
    check_references, extract_references, ExtractedReference, ReferenceError, ReferenceKind,
};
pub mod response;
pub use response::GeneratedPolicy;
pub mod schema;
pub use schema::{
    ActionDescriptor, EntityTypeDescriptor, Schema, SchemaDocument, SchemaError,
    SchemaFormatError,
};
mod fuzzy_match;
mod str_checks;
pub mod synthesis;
pub use synthesis::{
    extract_conditions, synthesize, ComparisonOp, Condition, LiteralValue, SynthesisConfig,
    TestCase,
};
pub mod syntax;
pub use syntax::{check_syntax, SyntaxError};
pub mod validator;
pub use validator::{
    validate, GeneratedPolicyReport, ValidationError, ValidationResult, ValidationWarning,
    Validator, ValidatorConfig,
};

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

//! Single-pass validation of a candidate policy against a schema.

use std::fmt::Display;

use miette::{Diagnostic, LabeledSpan, SourceSpan};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use tracing::debug;

use crate::references::{check_references, ReferenceError};
use crate::response::GeneratedPolicy;
use crate::schema::Schema;
use crate::str_checks::confusable_string_checks;
use crate::synthesis::{synthesize_with, SynthesisConfig, TestCase};
use crate::syntax::{check_syntax, has_both_effects, SyntaxError};

/// A problem that makes a policy invalid
#[derive(Debug, Clone, PartialEq, Eq, Hash, Diagnostic, Error)]
pub enum ValidationError {
    /// The text is not structurally well-formed
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] SyntaxError),
    /// The text references something the schema does not declare
    #[error(transparent)]
    #[diagnostic(transparent)]
    Reference(#[from] ReferenceError),
}

/// A potential problem that does not make a policy invalid
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum ValidationWarning {
    /// The text mentions both `permit` and `forbid`, so synthesized decisions
    /// may be wrong. Both are case-insensitive substring tests, the same test
    /// that decides the synthesized decisions, so an attribute such as
    /// `resource.permitted` in a `forbid` policy triggers this warning.
    #[error("policy mentions both `permit` and `forbid`; expected decisions of synthesized test cases may not hold")]
    MixedEffects,
    /// A string literal contains BIDI control characters
    #[error("string `\"{string}\"` contains BIDI control characters")]
    BidiCharsInString {
        /// Contents of the literal
        string: String,
        /// Location of the literal
        span: SourceSpan,
    },
    /// A string literal mixes characters from several scripts
    #[error("string `\"{string}\"` contains mixed scripts")]
    MixedScriptString {
        /// Contents of the literal
        string: String,
        /// Location of the literal
        span: SourceSpan,
    },
}

impl Diagnostic for ValidationWarning {
    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Warning)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Self::MixedEffects => None,
            Self::BidiCharsInString { span, .. } | Self::MixedScriptString { span, .. } => {
                Some(Box::new(std::iter::once(LabeledSpan::underline(*span))))
            }
        }
    }
}

/// Outcome of validating one policy.
///
/// Validation passes when there are no errors; warnings never affect it.
/// Test cases are included whether or not validation passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    is_valid: bool,
    #[serde(serialize_with = "serialize_messages")]
    errors: Vec<ValidationError>,
    #[serde(serialize_with = "serialize_messages")]
    warnings: Vec<ValidationWarning>,
    test_cases: Vec<TestCase>,
}

impl ValidationResult {
    fn new(
        errors: Vec<ValidationError>,
        warnings: Vec<ValidationWarning>,
        test_cases: Vec<TestCase>,
    ) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            test_cases,
        }
    }

    /// True when there are no errors
    pub fn validation_passed(&self) -> bool {
        self.is_valid
    }

    /// Errors, syntax errors first and then reference errors
    pub fn errors(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// Warnings, which do not affect [`Self::validation_passed`]
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationWarning> {
        self.warnings.iter()
    }

    /// Synthesized test cases. Their expected decisions are placeholders
    /// derived from the policy's effect keyword.
    pub fn test_cases(&self) -> &[TestCase] {
        &self.test_cases
    }

    /// Error messages, in order
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// Warning messages, in order
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}

fn serialize_messages<S: Serializer, T: Display>(items: &[T], s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(items.iter().map(ToString::to_string))
}

/// Settings for a [`Validator`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct ValidatorConfig {
    /// Settings for test synthesis
    pub synthesis: SynthesisConfig,
    /// Whether to warn about suspicious string literals
    pub string_checks: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            synthesis: SynthesisConfig::default(),
            string_checks: true,
        }
    }
}

/// Runs the syntax checks, the reference checks, and test synthesis over a
/// policy and gathers everything into a [`ValidationResult`].
///
/// A `Validator` holds only its configuration. The schema is passed to each
/// call, so one schema can be shared by any number of concurrent validations.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidatorConfig,
}

impl Validator {
    /// Construct a new `Validator` with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a new `Validator` with the given configuration
    pub fn with_config(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Get the configuration of this validator
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate `policy` against `schema`.
    ///
    /// Every check runs regardless of the outcome of the others. Malformed
    /// text is reported in the result, never as a failure of this call.
    pub fn validate(&self, policy: &str, schema: &Schema) -> ValidationResult {
        let errors: Vec<ValidationError> = check_syntax(policy)
            .into_iter()
            .map(ValidationError::from)
            .chain(
                check_references(policy, schema)
                    .into_iter()
                    .map(ValidationError::from),
            )
            .collect();

        let mut warnings = Vec::new();
        if has_both_effects(policy) {
            warnings.push(ValidationWarning::MixedEffects);
        }
        if self.config.string_checks {
            warnings.extend(confusable_string_checks(policy));
        }

        let test_cases = synthesize_with(policy, &self.config.synthesis);
        debug!(
            errors = errors.len(),
            warnings = warnings.len(),
            test_cases = test_cases.len(),
            "validated policy"
        );
        ValidationResult::new(errors, warnings, test_cases)
    }

    /// Extract the policy from a text generator's response and validate it
    pub fn validate_generated(&self, response: &str, schema: &Schema) -> GeneratedPolicyReport {
        let GeneratedPolicy { policy, rationale } = GeneratedPolicy::parse(response);
        let validation = self.validate(&policy, schema);
        GeneratedPolicyReport {
            policy,
            rationale,
            validation,
        }
    }
}

/// Validate `policy` against `schema` with the default configuration
pub fn validate(policy: &str, schema: &Schema) -> ValidationResult {
    Validator::new().validate(policy, schema)
}

/// A generated policy together with the result of validating it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPolicyReport {
    /// Policy text extracted from the response
    pub policy: String,
    /// Rationale lines extracted from the response
    pub rationale: Vec<String>,
    /// Outcome of validating `policy`
    pub validation: ValidationResult,
}

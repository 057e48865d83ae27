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

//! Lexical well-formedness checks on raw policy text.
//!
//! These are counts and keyword scans, not a grammar: a policy can pass every
//! check here and still fail to parse.

use miette::Diagnostic;
use thiserror::Error;

// PANIC SAFETY These are valid `Regex`es
#[allow(clippy::unwrap_used)]
mod constants {
    use regex::Regex;

    lazy_static::lazy_static! {
        pub static ref EFFECT: Regex = Regex::new(r"\b(permit|forbid)\b").unwrap();
    }
}

/// Structural problem found in policy text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Diagnostic, Error)]
pub enum SyntaxError {
    /// Neither `permit` nor `forbid` appears as a whole word
    #[error("Policy must start with 'permit' or 'forbid'")]
    MissingEffect,
    /// Different numbers of `(` and `)`
    #[error("Unbalanced parentheses in policy")]
    UnbalancedParentheses,
    /// Different numbers of `{` and `}`
    #[error("Unbalanced braces in policy")]
    UnbalancedBraces,
    /// The text does not end with `;` (ignoring trailing whitespace)
    #[error("Policy must end with semicolon")]
    #[diagnostic(help("every Cedar policy is terminated by `;`"))]
    MissingSemicolon,
}

/// Run all syntax checks on `text`, returning every violation found.
///
/// The checks are independent, and all of them always run. An empty result
/// means the text passes.
pub fn check_syntax(text: &str) -> Vec<SyntaxError> {
    let mut errors = Vec::new();
    if !constants::EFFECT.is_match(text) {
        errors.push(SyntaxError::MissingEffect);
    }
    if count(text, '(') != count(text, ')') {
        errors.push(SyntaxError::UnbalancedParentheses);
    }
    if count(text, '{') != count(text, '}') {
        errors.push(SyntaxError::UnbalancedBraces);
    }
    if !text.trim().ends_with(';') {
        errors.push(SyntaxError::MissingSemicolon);
    }
    errors
}

fn count(text: &str, c: char) -> usize {
    text.chars().filter(|x| *x == c).count()
}

/// Effect keyword whose presence decides the placeholder decisions of
/// synthesized test cases
pub(crate) const PERMIT: &str = "permit";
const FORBID: &str = "forbid";

/// Does `text` mention `keyword` anywhere, ignoring case? Unlike the effect
/// check above this is a plain substring test, so `resource.permitted`
/// mentions `permit`.
pub(crate) fn mentions(text: &str, keyword: &str) -> bool {
    text.to_lowercase().contains(keyword)
}

/// Does the text mention both `permit` and `forbid`, by the same substring
/// test that decides synthesized decisions?
pub(crate) fn has_both_effects(text: &str) -> bool {
    mentions(text, PERMIT) && mentions(text, FORBID)
}

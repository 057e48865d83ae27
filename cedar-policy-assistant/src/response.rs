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

//! Splitting of text-generator responses into policy and rationale.

use serde::{Deserialize, Serialize};

const POLICY_HEADER: &str = "POLICY:";
const RATIONALE_HEADER: &str = "RATIONALE:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Policy,
    Rationale,
}

/// A candidate policy extracted from a generator response of the form
///
/// ```text
/// POLICY:
/// forbid (principal, action, resource) when { ... };
///
/// RATIONALE:
/// - first reason
/// - second reason
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedPolicy {
    /// Non-blank lines after the `POLICY:` header, joined with newlines
    pub policy: String,
    /// Trimmed non-blank lines after the `RATIONALE:` header
    pub rationale: Vec<String>,
}

impl GeneratedPolicy {
    /// Split `response` into its sections.
    ///
    /// Headers must be alone on their line, apart from surrounding whitespace.
    /// Text before the first header is dropped. A header may appear more than
    /// once, in which case the sections accumulate. A response with no headers
    /// yields an empty policy and no rationale.
    pub fn parse(response: &str) -> Self {
        let mut section = Section::Preamble;
        let mut policy = Vec::new();
        let mut rationale = Vec::new();
        for line in response.trim().lines() {
            let trimmed = line.trim();
            if trimmed == POLICY_HEADER {
                section = Section::Policy;
            } else if trimmed == RATIONALE_HEADER {
                section = Section::Rationale;
            } else if !trimmed.is_empty() {
                match section {
                    Section::Preamble => {}
                    Section::Policy => policy.push(line),
                    Section::Rationale => rationale.push(trimmed.to_string()),
                }
            }
        }
        Self {
            policy: policy.join("\n"),
            rationale,
        }
    }
}

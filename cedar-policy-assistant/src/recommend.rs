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

//! Policy recommendations derived from the shape of a schema.
//!
//! Each rule fires when the schema declares the entity types and actions it
//! needs. Rules are independent and always considered in the same order, so
//! the output depends only on which names the schema declares.

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tracing::debug;

use crate::schema::Schema;

/// How urgently a [`Recommendation`] should be considered
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    /// `HIGH`
    High,
    /// `MEDIUM`
    Medium,
    /// `LOW`
    Low,
}

impl Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        })
    }
}

/// Value substituted for a `{placeholder}` in a template
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    /// Integer parameter, e.g. a threshold
    Long(i64),
    /// String parameter, e.g. a role name
    String(SmolStr),
}

impl Display for ParameterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Long(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ParameterValue {
    fn from(n: i64) -> Self {
        Self::Long(n)
    }
}

impl From<&str> for ParameterValue {
    fn from(s: &str) -> Self {
        Self::String(SmolStr::new(s))
    }
}

/// A parameterized policy suggested for a schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Stable identifier of the rule that produced this recommendation
    pub id: SmolStr,
    /// Short human-readable title
    pub title: String,
    /// How urgently this should be considered
    pub priority: Priority,
    /// One-line summary
    pub description: String,
    /// Policy text with `{name}` placeholders
    pub template_text: String,
    /// Reasons for adopting the policy, most important first
    pub rationale: Vec<String>,
    /// Default value for each placeholder in `template_text`
    pub parameters: BTreeMap<SmolStr, ParameterValue>,
}

impl Recommendation {
    /// Substitute `params` into the template.
    ///
    /// Every occurrence of `{key}` is replaced by the value's display form.
    /// Keys with no placeholder are ignored, and placeholders with no key are
    /// left as they are.
    pub fn customize<K, V>(&self, params: impl IntoIterator<Item = (K, V)>) -> String
    where
        K: AsRef<str>,
        V: Display,
    {
        params
            .into_iter()
            .fold(self.template_text.clone(), |text, (key, value)| {
                text.replace(&format!("{{{}}}", key.as_ref()), &value.to_string())
            })
    }

    /// The template with its default parameters substituted
    pub fn render_default(&self) -> String {
        self.customize(&self.parameters)
    }
}

#[derive(Debug, Clone, Copy)]
enum DefaultValue {
    Long(i64),
    Str(&'static str),
}

impl DefaultValue {
    fn to_parameter(self) -> ParameterValue {
        match self {
            Self::Long(n) => ParameterValue::Long(n),
            Self::Str(s) => ParameterValue::String(SmolStr::new_static(s)),
        }
    }
}

#[derive(Debug)]
struct Rule {
    id: &'static str,
    title: &'static str,
    priority: Priority,
    description: &'static str,
    template: &'static str,
    rationale: &'static [&'static str],
    parameters: &'static [(&'static str, DefaultValue)],
    /// Entity types the schema must declare
    entity_types: &'static [&'static str],
    /// Actions the schema must declare
    actions: &'static [&'static str],
}

impl Rule {
    fn applies_to(&self, schema: &Schema) -> bool {
        self.entity_types
            .iter()
            .all(|ty| schema.contains_entity_type(ty))
            && self.actions.iter().all(|a| schema.contains_action(a))
    }

    fn recommendation(&self) -> Recommendation {
        Recommendation {
            id: SmolStr::new_static(self.id),
            title: self.title.to_string(),
            priority: self.priority,
            description: self.description.to_string(),
            template_text: self.template.to_string(),
            rationale: self.rationale.iter().map(ToString::to_string).collect(),
            parameters: self
                .parameters
                .iter()
                .map(|&(name, value)| (SmolStr::new_static(name), value.to_parameter()))
                .collect(),
        }
    }
}

const RULES: &[Rule] = &[
    Rule {
        id: "high_value_tx",
        title: "High-Value Transaction Protection",
        priority: Priority::High,
        description: "Prevent unauthorized large transactions",
        template: r#"forbid (principal == User::"AccountHolder", action == Action::"CreateTransaction", resource) when { resource.amount >= {threshold} };"#,
        rationale: &[
            "Prevents unauthorized high-value transactions above threshold",
            "Reduces fraud risk by requiring additional authorization",
            "Complies with banking regulations for large transactions",
        ],
        parameters: &[("threshold", DefaultValue::Long(5000))],
        entity_types: &["Transaction"],
        actions: &["CreateTransaction"],
    },
    Rule {
        id: "account_access",
        title: "Account Access Control",
        priority: Priority::Medium,
        description: "Restrict account access to owners only",
        template: r#"permit (principal == User::"{role}", action == Action::"ViewAccount", resource) when { resource.ownerId == principal.userId };"#,
        rationale: &[
            "Ensures users can only access their own accounts",
            "Implements principle of least privilege",
            "Protects customer privacy and data security",
        ],
        parameters: &[("role", DefaultValue::Str("AccountHolder"))],
        entity_types: &["Account"],
        actions: &["ViewAccount"],
    },
    Rule {
        id: "manager_override",
        title: "Manager Override Policy",
        priority: Priority::Medium,
        description: "Allow managers to override restrictions",
        template: r#"permit (principal == User::"Manager", action, resource);"#,
        rationale: &[
            "Allows managers to override standard restrictions",
            "Enables exception handling for business needs",
            "Maintains audit trail for management actions",
        ],
        parameters: &[],
        entity_types: &["User"],
        actions: &[],
    },
];

/// Recommendations for every rule whose required names `schema` declares
pub fn recommend(schema: &Schema) -> Vec<Recommendation> {
    let recommendations: Vec<_> = RULES
        .iter()
        .filter(|rule| rule.applies_to(schema))
        .map(Rule::recommendation)
        .collect();
    debug!(
        count = recommendations.len(),
        "generated policy recommendations"
    );
    recommendations
}

/// Substitute `params` into the template of the recommendation with id `id`.
///
/// Only `current` is searched, which should be the output of a recent call to
/// [`recommend`]. Returns `None` if no recommendation there has that id.
pub fn customize<K, V>(
    id: &str,
    params: impl IntoIterator<Item = (K, V)>,
    current: &[Recommendation],
) -> Option<String>
where
    K: AsRef<str>,
    V: Display,
{
    match current.iter().find(|r| r.id == id) {
        Some(recommendation) => Some(recommendation.customize(params)),
        None => {
            debug!(id, "no recommendation with this id");
            None
        }
    }
}

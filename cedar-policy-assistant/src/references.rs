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

//! Checks that entity types and actions referenced in policy text are
//! declared in the schema.
//!
//! References are found by scanning for entity literals of the form
//! `Type::"id"`, where both parts are made of word characters. A literal whose
//! type is `Action` names an action; every other literal names an entity type.
//! Namespace prefixes are not resolved: in `Bank::User::"alice"` only `User`
//! is taken as the type.

use itertools::Itertools;
use miette::{Diagnostic, LabeledSpan, SourceSpan};
use smol_str::SmolStr;
use thiserror::Error;

use crate::fuzzy_match::fuzzy_search;
use crate::schema::Schema;

// PANIC SAFETY This is a valid `Regex`
#[allow(clippy::unwrap_used)]
mod constants {
    use regex::Regex;

    lazy_static::lazy_static! {
        pub static ref ENTITY_LITERAL: Regex = Regex::new(r#"(\w+)::"(\w+)""#).unwrap();
    }
}

/// Type token that marks an entity literal as an action reference
const ACTION_TYPE: &str = "Action";

/// What an [`ExtractedReference`] refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// `name` is an entity type, as in `User::"alice"`
    EntityType,
    /// `name` is an action, as in `Action::"ViewAccount"`
    Action,
}

/// An entity or action reference found in policy text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtractedReference {
    /// Whether this names an entity type or an action
    pub kind: ReferenceKind,
    /// For entity types, the type name. For actions, the action name.
    pub name: SmolStr,
    /// The quoted entity id. For actions this is the same as `name`.
    pub id: SmolStr,
    /// Location of the whole literal in the policy text
    pub span: SourceSpan,
}

/// Find every entity and action reference in `text`, in order of appearance
pub fn extract_references(text: &str) -> Vec<ExtractedReference> {
    constants::ENTITY_LITERAL
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let ty = caps.get(1)?.as_str();
            let id = SmolStr::new(caps.get(2)?.as_str());
            let span = SourceSpan::from((whole.start(), whole.len()));
            Some(if ty == ACTION_TYPE {
                ExtractedReference {
                    kind: ReferenceKind::Action,
                    name: id.clone(),
                    id,
                    span,
                }
            } else {
                ExtractedReference {
                    kind: ReferenceKind::EntityType,
                    name: SmolStr::new(ty),
                    id,
                    span,
                }
            })
        })
        .collect()
}

/// A reference to something the schema does not declare
#[derive(Debug, Clone, PartialEq, Eq, Hash, Diagnostic, Error)]
pub enum ReferenceError {
    /// Entity type not found in the schema
    #[error(transparent)]
    #[diagnostic(transparent)]
    UnknownEntityType(#[from] UnknownEntityType),
    /// Action not found in the schema
    #[error(transparent)]
    #[diagnostic(transparent)]
    UnknownAction(#[from] UnknownAction),
}

impl ReferenceError {
    /// The undeclared name
    pub fn name(&self) -> &str {
        match self {
            Self::UnknownEntityType(e) => &e.name,
            Self::UnknownAction(e) => &e.name,
        }
    }
}

/// Details about an entity type that is used but not declared
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[error("Unknown entity type: {name}")]
pub struct UnknownEntityType {
    /// The entity type seen in the policy
    pub name: SmolStr,
    /// Location of its first use
    pub span: SourceSpan,
    /// A declared entity type the author might have meant
    pub suggestion: Option<SmolStr>,
}

impl Diagnostic for UnknownEntityType {
    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(LabeledSpan::underline(self.span))))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.suggestion
            .as_ref()
            .map(|s| Box::new(format!("did you mean `{s}`?")) as Box<dyn std::fmt::Display>)
    }
}

/// Details about an action that is used but not declared
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[error("Unknown action: {name}")]
pub struct UnknownAction {
    /// The action name seen in the policy
    pub name: SmolStr,
    /// Location of its first use
    pub span: SourceSpan,
    /// A declared action the author might have meant
    pub suggestion: Option<SmolStr>,
}

impl Diagnostic for UnknownAction {
    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(LabeledSpan::underline(self.span))))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.suggestion
            .as_ref()
            .map(|s| Box::new(format!("did you mean `{s}`?")) as Box<dyn std::fmt::Display>)
    }
}

/// Check every reference in `text` against `schema`.
///
/// Unknown entity types are reported before unknown actions, each in order of
/// first appearance. Each undeclared name is reported once, at its first use.
pub fn check_references(text: &str, schema: &Schema) -> Vec<ReferenceError> {
    let references = extract_references(text);
    let entity_errors = undeclared(&references, schema, ReferenceKind::EntityType).map(|r| {
        ReferenceError::from(UnknownEntityType {
            name: r.name.clone(),
            span: r.span,
            suggestion: fuzzy_search(&r.name, schema.entity_types().keys()),
        })
    });
    let action_errors = undeclared(&references, schema, ReferenceKind::Action).map(|r| {
        ReferenceError::from(UnknownAction {
            name: r.name.clone(),
            span: r.span,
            suggestion: fuzzy_search(&r.name, schema.actions().keys()),
        })
    });
    entity_errors.chain(action_errors).collect()
}

/// First occurrence of each reference of `kind` that `schema` doesn't declare
fn undeclared<'a>(
    references: &'a [ExtractedReference],
    schema: &'a Schema,
    kind: ReferenceKind,
) -> impl Iterator<Item = &'a ExtractedReference> + 'a {
    references
        .iter()
        .filter(move |r| {
            r.kind == kind
                && match kind {
                    ReferenceKind::EntityType => !schema.contains_entity_type(&r.name),
                    ReferenceKind::Action => !schema.contains_action(&r.name),
                }
        })
        .unique_by(|r| r.name.clone())
}

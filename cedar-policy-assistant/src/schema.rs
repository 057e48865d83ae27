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

//! Normalized view of the entity types and actions declared by a JSON schema.
//!
//! Only membership is consulted by the checks in this crate, so descriptors
//! are parsed leniently: anything that doesn't look like a Cedar JSON schema
//! entity type or action becomes an empty descriptor rather than an error.

use std::collections::BTreeMap;

use educe::Educe;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smol_str::SmolStr;
use tracing::{debug, warn};

pub mod err;
use err::json_kind;
pub use err::{JsonDeserializationError, SchemaError, SchemaFormatError};

/// A raw schema document, as handed over by whatever loaded it
pub type SchemaDocument = Value;

const ENTITY_TYPES: &str = "entityTypes";
const ACTIONS: &str = "actions";

/// An entity type declared in the schema
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityTypeDescriptor {
    /// Entity types that entities of this type may be members of
    pub member_of_types: Vec<SmolStr>,
    /// Attribute names mapped to the name of their declared type
    pub attributes: BTreeMap<SmolStr, SmolStr>,
}

/// An action declared in the schema
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDescriptor {
    /// Principal types the action applies to
    pub principal_types: Vec<SmolStr>,
    /// Resource types the action applies to
    pub resource_types: Vec<SmolStr>,
    /// Context attribute names mapped to the name of their declared type
    pub context: BTreeMap<SmolStr, SmolStr>,
    /// Ids of the action groups this action belongs to
    pub member_of: Vec<SmolStr>,
}

/// Entity types and actions extracted from a single schema document.
///
/// A `Schema` is immutable once built. To pick up a new schema, build a new
/// value and swap it in; in-flight checks keep the one they were given.
#[derive(Educe, Debug, Clone, Default, Serialize)]
#[educe(PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Namespace key the schema was unwrapped from, if any
    #[educe(PartialEq(ignore))]
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<SmolStr>,
    entity_types: BTreeMap<SmolStr, EntityTypeDescriptor>,
    actions: BTreeMap<SmolStr, ActionDescriptor>,
}

impl Schema {
    /// Build a schema from a parsed document.
    ///
    /// If the document itself has an `entityTypes` or `actions` key, it is
    /// used directly. Otherwise, if it has exactly one key whose value has
    /// either of them, that value is used and the key is recorded as the
    /// namespace. Only this one level of unwrapping is attempted.
    pub fn build(document: &SchemaDocument) -> Result<Self, SchemaFormatError> {
        let (namespace, body) = locate_sections(document)?;
        let entity_types = parse_section::<RawEntityType, _>(
            ENTITY_TYPES,
            body.get(ENTITY_TYPES),
            EntityTypeDescriptor::from,
        )?;
        let actions =
            parse_section::<RawActionType, _>(ACTIONS, body.get(ACTIONS), ActionDescriptor::from)?;
        debug!(
            namespace = namespace.as_deref(),
            entity_types = entity_types.len(),
            actions = actions.len(),
            "built schema"
        );
        Ok(Self {
            namespace,
            entity_types,
            actions,
        })
    }

    /// Build a schema from an owned document
    pub fn from_json_value(document: SchemaDocument) -> Result<Self, SchemaFormatError> {
        Self::build(&document)
    }

    /// Parse JSON text and build a schema from it
    pub fn from_json_str(json: &str) -> Result<Self, SchemaError> {
        let document: SchemaDocument = serde_json::from_str(json)
            .map_err(|err| JsonDeserializationError::new(err, json))?;
        Ok(Self::build(&document)?)
    }

    /// Namespace key this schema was unwrapped from, if it was wrapped
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// All declared entity types
    pub fn entity_types(&self) -> &BTreeMap<SmolStr, EntityTypeDescriptor> {
        &self.entity_types
    }

    /// All declared actions
    pub fn actions(&self) -> &BTreeMap<SmolStr, ActionDescriptor> {
        &self.actions
    }

    /// Look up an entity type by name
    pub fn entity_type(&self, name: &str) -> Option<&EntityTypeDescriptor> {
        self.entity_types.get(name)
    }

    /// Look up an action by name
    pub fn action(&self, name: &str) -> Option<&ActionDescriptor> {
        self.actions.get(name)
    }

    /// Is an entity type with this name declared?
    pub fn contains_entity_type(&self, name: &str) -> bool {
        self.entity_types.contains_key(name)
    }

    /// Is an action with this name declared?
    pub fn contains_action(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Names of all declared entity types, in sorted order
    pub fn entity_type_names(&self) -> impl Iterator<Item = &str> {
        self.entity_types.keys().map(SmolStr::as_str)
    }

    /// Names of all declared actions, in sorted order
    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(SmolStr::as_str)
    }
}

impl TryFrom<&SchemaDocument> for Schema {
    type Error = SchemaFormatError;

    fn try_from(document: &SchemaDocument) -> Result<Self, Self::Error> {
        Self::build(document)
    }
}

impl std::str::FromStr for Schema {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_json_str(s)
    }
}

fn has_sections(object: &Map<String, Value>) -> bool {
    object.contains_key(ENTITY_TYPES) || object.contains_key(ACTIONS)
}

/// Find the object holding `entityTypes`/`actions`, unwrapping at most one
/// namespace key
fn locate_sections(
    document: &SchemaDocument,
) -> Result<(Option<SmolStr>, &Map<String, Value>), SchemaFormatError> {
    let Value::Object(top) = document else {
        return Err(SchemaFormatError::NotAnObject {
            found: json_kind(document),
        });
    };
    if has_sections(top) {
        return Ok((None, top));
    }
    if top.len() == 1 {
        if let Some((namespace, Value::Object(inner))) = top.iter().next() {
            if has_sections(inner) {
                debug!(namespace = namespace.as_str(), "unwrapping namespaced schema");
                return Ok((Some(SmolStr::new(namespace)), inner));
            }
        }
    }
    Err(SchemaFormatError::MissingSections)
}

/// Parse one section, which is either an object from names to descriptors or
/// a plain list of names
fn parse_section<R, D>(
    section: &'static str,
    value: Option<&Value>,
    convert: impl Fn(R) -> D,
) -> Result<BTreeMap<SmolStr, D>, SchemaFormatError>
where
    R: DeserializeOwned + Default,
    D: Default,
{
    match value {
        None => Ok(BTreeMap::new()),
        Some(Value::Object(entries)) => Ok(entries
            .iter()
            .map(|(name, descriptor)| {
                let raw = lenient_descriptor::<R>(section, name, descriptor);
                (SmolStr::new(name), convert(raw))
            })
            .collect()),
        Some(Value::Array(names)) => names
            .iter()
            .map(|name| match name {
                Value::String(name) => Ok((SmolStr::new(name), D::default())),
                _ => Err(SchemaFormatError::MalformedSection {
                    section,
                    found: "a list containing something other than strings",
                }),
            })
            .collect(),
        Some(other) => Err(SchemaFormatError::MalformedSection {
            section,
            found: json_kind(other),
        }),
    }
}

fn lenient_descriptor<R: DeserializeOwned + Default>(
    section: &'static str,
    name: &str,
    descriptor: &Value,
) -> R {
    R::deserialize(descriptor).unwrap_or_else(|err| {
        warn!(section, name, %err, "ignoring unrecognized schema descriptor");
        R::default()
    })
}

// Deserialization targets mirroring the parts of the Cedar JSON schema format
// that are kept. Unknown fields are ignored.

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntityType {
    #[serde(default)]
    member_of_types: Vec<SmolStr>,
    #[serde(default)]
    shape: Option<RawRecord>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawActionType {
    #[serde(default)]
    applies_to: Option<RawApplySpec>,
    #[serde(default)]
    member_of: Vec<RawActionRef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawApplySpec {
    #[serde(default)]
    principal_types: Vec<SmolStr>,
    #[serde(default)]
    resource_types: Vec<SmolStr>,
    #[serde(default)]
    context: Option<RawRecord>,
}

#[derive(Debug, Deserialize)]
struct RawActionRef {
    id: SmolStr,
}

#[derive(Debug, Default, Deserialize)]
struct RawRecord {
    #[serde(default)]
    attributes: BTreeMap<SmolStr, RawAttribute>,
}

#[derive(Debug, Deserialize)]
struct RawAttribute {
    #[serde(rename = "type")]
    ty: Option<SmolStr>,
    /// Present for `Entity`, `Extension` and `EntityOrCommon` types
    name: Option<SmolStr>,
}

fn attribute_types(record: Option<RawRecord>) -> BTreeMap<SmolStr, SmolStr> {
    record
        .map(|record| record.attributes)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(attr, RawAttribute { ty, name })| name.or(ty).map(|ty| (attr, ty)))
        .collect()
}

impl From<RawEntityType> for EntityTypeDescriptor {
    fn from(raw: RawEntityType) -> Self {
        Self {
            member_of_types: raw.member_of_types,
            attributes: attribute_types(raw.shape),
        }
    }
}

impl From<RawActionType> for ActionDescriptor {
    fn from(raw: RawActionType) -> Self {
        let RawApplySpec {
            principal_types,
            resource_types,
            context,
        } = raw.applies_to.unwrap_or_default();
        Self {
            principal_types,
            resource_types,
            context: attribute_types(context),
            member_of: raw.member_of.into_iter().map(|r| r.id).collect(),
        }
    }
}

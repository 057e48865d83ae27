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

//! Errors from building a [`super::Schema`].

use std::fmt::Display;

use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

/// Error when constructing a [`super::Schema`] from JSON text
#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum SchemaError {
    /// The text parsed as JSON but does not have the shape of a schema
    #[error(transparent)]
    #[diagnostic(transparent)]
    Format(#[from] SchemaFormatError),
    /// This error is thrown when `serde_json` fails to deserialize the JSON
    #[error(transparent)]
    #[diagnostic(transparent)]
    JsonDeserialization(#[from] JsonDeserializationError),
}

/// Error when a schema document does not contain a recognizable schema.
///
/// A schema is never partially built: any of these aborts construction.
#[derive(Debug, Clone, PartialEq, Eq, Diagnostic, Error)]
#[non_exhaustive]
pub enum SchemaFormatError {
    /// The document itself is not a JSON object
    #[error("schema document must be a JSON object, found {found}")]
    NotAnObject {
        /// Kind of JSON value that was found instead
        found: &'static str,
    },
    /// Neither `entityTypes` nor `actions` was found at the top level or
    /// inside a single namespace wrapper
    #[error("schema must contain `entityTypes` or `actions`")]
    #[diagnostic(help(
        "a schema may be wrapped in a single namespace key, e.g. `{{ \"MyApp\": {{ \"entityTypes\": .., \"actions\": .. }} }}`; deeper nesting is not unwrapped"
    ))]
    MissingSections,
    /// A section was present but is neither an object nor a list of names
    #[error("`{section}` must be an object or a list of names, found {found}")]
    MalformedSection {
        /// Either `entityTypes` or `actions`
        section: &'static str,
        /// Description of what was found instead
        found: &'static str,
    },
}

/// This error is thrown when `serde_json` fails to deserialize the JSON
#[derive(Debug, Error)]
#[error("{err}")]
pub struct JsonDeserializationError {
    /// Error thrown by the `serde_json` crate
    err: serde_json::Error,
    /// Possible fix for the error
    advice: Option<JsonDeserializationAdvice>,
}

impl Diagnostic for JsonDeserializationError {
    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        self.advice
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn Display + 'a>)
    }
}

#[derive(Debug, Error)]
enum JsonDeserializationAdvice {
    #[error("this API was expecting a schema in the JSON format; the Cedar schema format is not supported here")]
    CedarFormat,
}

impl JsonDeserializationError {
    /// `err`: the `serde_json::Error` that was thrown
    ///
    /// `src`: the JSON that we were trying to deserialize
    pub(crate) fn new(err: serde_json::Error, src: &str) -> Self {
        let advice = match src.trim_start().chars().next() {
            // empty input or something that at least starts like JSON
            None | Some('{') | Some('[') => None,
            Some(_) => Some(JsonDeserializationAdvice::CedarFormat),
        };
        Self { err, advice }
    }
}

/// Name of the kind of JSON value, for error messages
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

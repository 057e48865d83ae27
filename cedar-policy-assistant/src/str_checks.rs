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

//! Warnings for string literals that may render differently than they read.

use miette::SourceSpan;
use unicode_security::MixedScript;

use crate::validator::ValidationWarning;

// PANIC SAFETY This is a valid `Regex`
#[allow(clippy::unwrap_used)]
mod constants {
    use regex::Regex;

    lazy_static::lazy_static! {
        pub static ref STRING_LITERAL: Regex = Regex::new(r#""((?:[^"\\]|\\.)*)""#).unwrap();
    }
}

/// Safety checks on every double-quoted string literal in `text`
pub(crate) fn confusable_string_checks(text: &str) -> impl Iterator<Item = ValidationWarning> + '_ {
    constants::STRING_LITERAL.captures_iter(text).filter_map(|caps| {
        let whole = caps.get(0)?;
        let body = caps.get(1)?;
        permissable_str(SourceSpan::from((whole.start(), whole.len())), body.as_str())
    })
}

fn permissable_str(span: SourceSpan, s: &str) -> Option<ValidationWarning> {
    if s.chars().any(is_bidi_char) {
        Some(ValidationWarning::BidiCharsInString {
            string: s.to_string(),
            span,
        })
    } else if !s.is_single_script() {
        Some(ValidationWarning::MixedScriptString {
            string: s.to_string(),
            span,
        })
    } else {
        None
    }
}

fn is_bidi_char(c: char) -> bool {
    BIDI_CHARS.iter().any(|bidi| bidi == &c)
}

/// List of BIDI chars to warn on.
/// Source: <`https://doc.rust-lang.org/nightly/nightly-rustc/rustc_lint/hidden_unicode_codepoints/static.TEXT_DIRECTION_CODEPOINT_IN_LITERAL.html`>
const BIDI_CHARS: [char; 9] = [
    '\u{202A}', '\u{202B}', '\u{202D}', '\u{202E}', '\u{2066}', '\u{2067}', '\u{2068}', '\u{202C}',
    '\u{2069}',
];

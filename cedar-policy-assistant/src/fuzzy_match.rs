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

//! "Did you mean" suggestions for undeclared names.

use smol_str::SmolStr;

/// Pick the declared name closest to `key` by edit distance.
///
/// Ties go to the earliest candidate. Returns `None` for an empty key or an
/// empty candidate list.
pub(crate) fn fuzzy_search<'a>(
    key: &str,
    candidates: impl IntoIterator<Item = &'a SmolStr>,
) -> Option<SmolStr> {
    if key.is_empty() {
        return None;
    }
    let mut best: Option<(usize, &SmolStr)> = None;
    for candidate in candidates {
        let distance = levenshtein_distance(key, candidate);
        if best.map_or(true, |(best_distance, _)| distance < best_distance) {
            best = Some((distance, candidate));
        }
    }
    best.map(|(_, candidate)| candidate.clone())
}

/// Edit distance between two strings, counted in `char`s.
///
/// Only the previous row of the usual matrix is kept around.
pub(crate) fn levenshtein_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut cur = Vec::with_capacity(b.len() + 1);
        cur.push(i + 1);
        for (j, cb) in b.iter().enumerate() {
            let diag = prev.get(j).copied().unwrap_or_default();
            let up = prev.get(j + 1).copied().unwrap_or_default();
            let left = cur.last().copied().unwrap_or_default();
            cur.push(if ca == *cb {
                diag
            } else {
                1 + diag.min(up).min(left)
            });
        }
        prev = cur;
    }
    prev.last().copied().unwrap_or_default()
}

#[cfg(test)]
mod test {
    use super::*;

    fn names(names: &[&str]) -> Vec<SmolStr> {
        names.iter().map(|n| SmolStr::new(n)).collect()
    }

    #[test]
    fn distances() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("Acount", "Account"), 1);
        assert_eq!(levenshtein_distance("Account", "Account"), 0);
    }

    #[test]
    fn closest_is_suggested() {
        let candidates = names(&["User", "Account", "Transaction"]);
        assert_eq!(
            fuzzy_search("Acount", &candidates),
            Some(SmolStr::new("Account"))
        );
        assert_eq!(
            fuzzy_search("Transactoin", &candidates),
            Some(SmolStr::new("Transaction"))
        );
    }

    #[test]
    fn ties_go_to_the_first_candidate() {
        let candidates = names(&["ab", "ba"]);
        assert_eq!(fuzzy_search("aa", &candidates), Some(SmolStr::new("ab")));
    }

    #[test]
    fn nothing_to_suggest() {
        assert_eq!(fuzzy_search("", &names(&["User"])), None);
        assert_eq!(fuzzy_search("User", &names(&[])), None);
    }
}

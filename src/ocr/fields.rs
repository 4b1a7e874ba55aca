//! Field extraction and comparison
//!
//! OCR responses carry their fields in `information[0]`, each as an object
//! `{ "type": ..., "value": ... }`. Only `text` fields take part in
//! validation. Field values are scored with the Ratcliff/Obershelp ratio.

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Pull the text fields out of an OCR response
///
/// Returns an empty map when the response does not have the expected shape.
pub fn extract_text_fields(ocr_json: &Value) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();

    let first = match ocr_json
        .get("information")
        .and_then(Value::as_array)
        .and_then(|info| info.first())
        .and_then(Value::as_object)
    {
        Some(first) => first,
        None => return fields,
    };

    for (key, meta) in first {
        let Some(meta) = meta.as_object() else {
            continue;
        };
        if meta.get("type").and_then(Value::as_str) != Some("text") {
            continue;
        }
        match meta.get("value") {
            Some(Value::String(s)) => {
                fields.insert(key.clone(), s.clone());
            }
            Some(Value::Number(n)) => {
                fields.insert(key.clone(), n.to_string());
            }
            // Rendered as JSON text, the same way user values are
            Some(Value::Bool(b)) => {
                fields.insert(key.clone(), b.to_string());
            }
            _ => {}
        }
    }

    fields
}

/// Similarity ratio in [0, 1] between two strings, after trimming
///
/// `2 * M / T` where `M` is the number of matched characters and `T` the
/// total length of both strings. Two empty strings compare as 1.0.
pub fn string_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.trim().chars().collect();
    let b: Vec<char> = b.trim().chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let matches = SequenceMatcher::new(&a, &b).matched_chars();
    2.0 * matches as f64 / total as f64
}

/// Score each user field against the OCR field of the same name
///
/// Missing OCR fields compare against the empty string. The overall score is
/// the mean of all field scores, 0.0 when there are no fields.
pub fn compare_fields(
    user_fields: &BTreeMap<String, String>,
    ocr_fields: &BTreeMap<String, String>,
) -> (BTreeMap<String, f64>, f64) {
    let scores: BTreeMap<String, f64> = user_fields
        .iter()
        .map(|(key, user_value)| {
            let ocr_value = ocr_fields.get(key).map(String::as_str).unwrap_or("");
            (key.clone(), string_similarity(user_value, ocr_value))
        })
        .collect();

    let overall = if scores.is_empty() {
        0.0
    } else {
        scores.values().sum::<f64>() / scores.len() as f64
    };

    (scores, overall)
}

/// Longest-common-block matcher over two char sequences
struct SequenceMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    /// Positions of each char of `b`, minus popular chars
    b2j: HashMap<char, Vec<usize>>,
}

impl<'a> SequenceMatcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b2j.entry(c).or_default().push(j);
        }

        // Chars making up more than 1% of a long `b` are too common to anchor on
        let n = b.len();
        if n >= 200 {
            let threshold = n / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= threshold);
        }

        Self { a, b, b2j }
    }

    fn find_longest_match(
        &self,
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
        let mut j2len: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut new_j2len = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    new_j2len.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = new_j2len;
        }

        // Popular chars were left out of b2j; grow the match across them
        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && self.a[best_i + best_size] == self.b[best_j + best_size]
        {
            best_size += 1;
        }

        (best_i, best_j, best_size)
    }

    /// Total size of all matching blocks
    fn matched_chars(&self) -> usize {
        let mut total = 0;
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, k) = self.find_longest_match(alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            total += k;
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }

        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_extract_text_fields() {
        let ocr = json!({
            "information": [{
                "name": {"type": "text", "value": "Jane Doe"},
                "amount": {"type": "text", "value": 42.5},
                "signature": {"type": "image", "value": "base64..."},
                "flag": {"type": "text", "value": true},
                "empty": {"type": "text", "value": null},
                "lines": {"type": "text", "value": ["a", "b"]},
                "loose": "not an object"
            }],
            "processing_time": 1.2
        });

        let fields = extract_text_fields(&ocr);
        assert_eq!(
            fields,
            map(&[("amount", "42.5"), ("flag", "true"), ("name", "Jane Doe")])
        );
    }

    #[test]
    fn test_boolean_fields_match_user_booleans() {
        let ocr = json!({"information": [{
            "paid": {"type": "text", "value": false}
        }]});
        let user = map(&[("paid", "false")]);

        let (scores, overall) = compare_fields(&user, &extract_text_fields(&ocr));
        assert_eq!(scores["paid"], 1.0);
        assert_eq!(overall, 1.0);
    }

    #[test]
    fn test_extract_text_fields_bad_shape() {
        assert!(extract_text_fields(&json!({})).is_empty());
        assert!(extract_text_fields(&json!({"information": []})).is_empty());
        assert!(extract_text_fields(&json!({"information": [1]})).is_empty());
        assert!(extract_text_fields(&json!([1, 2])).is_empty());
    }

    #[test]
    fn test_similarity_known_values() {
        assert_eq!(string_similarity("abc", "abc"), 1.0);
        assert_eq!(string_similarity("", ""), 1.0);
        assert_eq!(string_similarity("abc", ""), 0.0);
        assert_eq!(string_similarity("abc", "xyz"), 0.0);
        // Ratcliff/Obershelp: "abcd" vs "bcde" share "bcd" -> 2*3/8
        assert!((string_similarity("abcd", "bcde") - 0.75).abs() < 1e-9);
        // Whitespace around values is ignored
        assert_eq!(string_similarity("  Jane ", "Jane"), 1.0);
    }

    #[test]
    fn test_similarity_multiple_blocks() {
        // "qabxcd" vs "abycdf": blocks "ab" and "cd" -> 2*4/12
        let ratio = string_similarity("qabxcd", "abycdf");
        assert!((ratio - 8.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_similarity_is_bounded_on_long_inputs() {
        let a = "a".repeat(150) + &"b".repeat(150);
        let b = "a".repeat(300);
        let ratio = string_similarity(&a, &b);
        assert!((0.0..=1.0).contains(&ratio));
    }

    #[test]
    fn test_compare_fields() {
        let user = map(&[("name", "Jane"), ("city", "Oslo")]);
        let ocr = map(&[("name", "Jane")]);

        let (scores, overall) = compare_fields(&user, &ocr);
        assert_eq!(scores["name"], 1.0);
        assert_eq!(scores["city"], 0.0);
        assert!((overall - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_compare_no_fields() {
        let (scores, overall) = compare_fields(&BTreeMap::new(), &map(&[("a", "b")]));
        assert!(scores.is_empty());
        assert_eq!(overall, 0.0);
    }
}

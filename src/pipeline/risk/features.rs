//! Bag-of-words TF-IDF features.
//!
//! Tokens are lowercase runs of two or more word characters. IDF is
//! smoothed (`ln((1 + n) / (1 + df)) + 1`) and every vector is L2-normalized.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Vocabulary cap used by the risk model.
pub const DEFAULT_MAX_FEATURES: usize = 100;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("valid regex"));

pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    /// term → column, columns in alphabetical term order.
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Learn vocabulary and IDF weights.
    ///
    /// When the corpus has more than `max_features` terms, the most frequent
    /// ones (by total count, ties alphabetical) are kept.
    pub fn fit(documents: &[String], max_features: usize) -> Self {
        let mut term_counts: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let tokens = tokenize(doc);
            let unique: HashSet<&String> = tokens.iter().collect();
            for term in unique {
                *doc_freq.entry(term.clone()).or_default() += 1;
            }
            for term in tokens {
                *term_counts.entry(term).or_default() += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = term_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(max_features);

        let mut terms: Vec<String> = ranked.into_iter().map(|(t, _)| t).collect();
        terms.sort();

        let n = documents.len() as f64;
        let idf = terms
            .iter()
            .map(|t| {
                let df = doc_freq.get(t).copied().unwrap_or(0) as f64;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        let vocabulary = terms.into_iter().enumerate().map(|(i, t)| (t, i)).collect();

        Self { vocabulary, idf }
    }

    pub fn len(&self) -> usize {
        self.idf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idf.is_empty()
    }

    pub fn vocabulary(&self) -> impl Iterator<Item = &str> {
        self.vocabulary.keys().map(String::as_str)
    }

    /// Dense, L2-normalized TF-IDF vector. Unknown terms are ignored;
    /// a document with no known terms is the zero vector.
    pub fn transform(&self, document: &str) -> Vec<f64> {
        let mut vector = vec![0.0; self.idf.len()];
        for token in tokenize(document) {
            if let Some(&col) = self.vocabulary.get(&token) {
                vector[col] += 1.0;
            }
        }
        for (value, idf) in vector.iter_mut().zip(&self.idf) {
            *value *= idf;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }

    /// Column count and IDF length agree and every column is addressed once.
    pub fn is_consistent(&self) -> bool {
        let mut cols: Vec<usize> = self.vocabulary.values().copied().collect();
        cols.sort_unstable();
        cols.len() == self.idf.len() && cols.iter().enumerate().all(|(i, c)| i == *c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn tokenize_lowercases_and_drops_single_chars() {
        assert_eq!(
            tokenize("Diabetes check E11.9 a 99213"),
            vec!["diabetes", "check", "e11", "99213"]
        );
    }

    #[test]
    fn vocabulary_is_alphabetical() {
        let vec = TfidfVectorizer::fit(&docs(&["routine visit", "diabetes check"]), 100);
        let vocab: Vec<&str> = vec.vocabulary().collect();
        assert_eq!(vocab, vec!["check", "diabetes", "routine", "visit"]);
        assert!(vec.is_consistent());
    }

    #[test]
    fn max_features_keeps_most_frequent() {
        let vec = TfidfVectorizer::fit(&docs(&["alpha alpha beta", "alpha gamma"]), 2);
        let vocab: Vec<&str> = vec.vocabulary().collect();
        assert_eq!(vocab, vec!["alpha", "beta"]);
    }

    #[test]
    fn transform_is_unit_length() {
        let vec = TfidfVectorizer::fit(&docs(&["diabetes check", "routine visit"]), 100);
        let v = vec.transform("diabetes visit");
        let norm: f64 = v.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rarer_terms_weigh_more() {
        let vec = TfidfVectorizer::fit(&docs(&["visit diabetes", "visit routine", "visit"]), 100);
        let v = vec.transform("visit diabetes");
        let cols: Vec<&str> = vec.vocabulary().collect();
        let diabetes = cols.iter().position(|t| *t == "diabetes").unwrap();
        let visit = cols.iter().position(|t| *t == "visit").unwrap();
        assert!(v[diabetes] > v[visit]);
    }

    #[test]
    fn unknown_document_is_zero_vector() {
        let vec = TfidfVectorizer::fit(&docs(&["diabetes check"]), 100);
        assert!(vec.transform("completely unrelated").iter().all(|x| *x == 0.0));
    }

    #[test]
    fn survives_json_round_trip() {
        let vec = TfidfVectorizer::fit(&docs(&["diabetes check", "routine visit"]), 100);
        let json = serde_json::to_string(&vec).unwrap();
        let restored: TfidfVectorizer = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, vec);
    }
}

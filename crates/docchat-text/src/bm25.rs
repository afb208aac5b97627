//! Okapi BM25 over a whitespace-tokenized in-memory corpus.
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    pub k1: f64,
    pub b: f64,
    /// Negative IDFs are floored at `epsilon * mean(idf)`.
    pub epsilon: f64,
}

impl Default for Bm25Params {
    fn default() -> Self { Self { k1: 1.5, b: 0.75, epsilon: 0.25 } }
}

pub struct Bm25Okapi {
    params: Bm25Params,
    doc_freqs: Vec<HashMap<String, usize>>,
    doc_len: Vec<usize>,
    avgdl: f64,
    idf: HashMap<String, f64>,
}

impl Bm25Okapi {
    pub fn new<S: AsRef<str>>(corpus: &[Vec<S>]) -> Self { Self::with_params(corpus, Bm25Params::default()) }

    pub fn with_params<S: AsRef<str>>(corpus: &[Vec<S>], params: Bm25Params) -> Self {
        let mut doc_freqs = Vec::with_capacity(corpus.len());
        let mut doc_len = Vec::with_capacity(corpus.len());
        // term -> number of documents containing it
        let mut nd: HashMap<String, usize> = HashMap::new();
        let mut total_tokens = 0usize;
        for doc in corpus {
            let mut freqs: HashMap<String, usize> = HashMap::new();
            for token in doc { *freqs.entry(token.as_ref().to_string()).or_default() += 1; }
            for term in freqs.keys() { *nd.entry(term.clone()).or_default() += 1; }
            total_tokens += doc.len();
            doc_len.push(doc.len());
            doc_freqs.push(freqs);
        }
        let avgdl = if corpus.is_empty() { 0.0 } else { total_tokens as f64 / corpus.len() as f64 };
        let idf = Self::calc_idf(&nd, corpus.len(), params.epsilon);
        Self { params, doc_freqs, doc_len, avgdl, idf }
    }

    fn calc_idf(nd: &HashMap<String, usize>, corpus_size: usize, epsilon: f64) -> HashMap<String, f64> {
        let n = corpus_size as f64;
        let mut idf = HashMap::with_capacity(nd.len());
        let mut idf_sum = 0.0;
        let mut negative = Vec::new();
        for (term, &freq) in nd {
            let freq = freq as f64;
            let value = (n - freq + 0.5).ln() - (freq + 0.5).ln();
            idf_sum += value;
            if value < 0.0 { negative.push(term.clone()); }
            idf.insert(term.clone(), value);
        }
        if !idf.is_empty() {
            let floor = epsilon * (idf_sum / idf.len() as f64);
            for term in negative { idf.insert(term, floor); }
        }
        idf
    }

    pub fn len(&self) -> usize { self.doc_len.len() }

    pub fn is_empty(&self) -> bool { self.doc_len.is_empty() }

    /// Score every corpus document against `query`, in corpus order. Repeated
    /// query tokens contribute once per occurrence.
    pub fn scores<S: AsRef<str>>(&self, query: &[S]) -> Vec<f64> {
        let Bm25Params { k1, b, .. } = self.params;
        let mut scores = vec![0.0; self.doc_len.len()];
        for q in query {
            let q = q.as_ref();
            let Some(&idf) = self.idf.get(q) else { continue };
            for (i, freqs) in self.doc_freqs.iter().enumerate() {
                let tf = freqs.get(q).copied().unwrap_or(0) as f64;
                if tf == 0.0 { continue; }
                let rel_len = if self.avgdl > 0.0 { self.doc_len[i] as f64 / self.avgdl } else { 0.0 };
                scores[i] += idf * (tf * (k1 + 1.0) / (tf + k1 * (1.0 - b + b * rel_len)));
            }
        }
        scores
    }
}

pub fn tokenize(text: &str) -> Vec<&str> { text.split_whitespace().collect() }

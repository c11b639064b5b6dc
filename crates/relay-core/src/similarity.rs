//! Cosine similarity over embedding vectors.

/// Cosine similarity in [-1, 1], accumulated in f64.
///
/// Mismatched lengths, empty vectors and zero vectors score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// Best similarity of `query` against any of `candidates`, if there are any.
pub fn max_similarity<'a, I>(query: &[f32], candidates: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a Vec<f32>>,
{
    candidates
        .into_iter()
        .map(|c| cosine_similarity(query, c))
        .fold(None, |best, s| match best {
            Some(b) if b >= s => Some(b),
            _ => Some(s),
        })
}

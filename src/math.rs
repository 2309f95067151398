use ndarray::Array1;

/// `log(exp(a) + exp(b))`, computed without overflow (spec.md §9).
pub fn log_add_exp(a: f32, b: f32) -> f32 {
    if a == f32::NEG_INFINITY && b == f32::NEG_INFINITY {
        return f32::NEG_INFINITY;
    }
    let hi = a.max(b);
    let lo = a.min(b);
    hi + (lo - hi).exp().ln_1p()
}

/// Log-softmax over the last axis of a 1-D logit vector.
pub fn log_softmax(logits: &Array1<f32>) -> Array1<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let shifted = logits.mapv(|v| v - max);
    let sum_exp: f32 = shifted.iter().map(|v| v.exp()).sum();
    let log_sum_exp = sum_exp.ln();
    shifted.mapv(|v| v - log_sum_exp)
}

/// Indices and values of the top-`k` entries of `values`, sorted descending
/// by value. `k` is clamped to `values.len()`.
pub fn top_k(values: &Array1<f32>, k: usize) -> (Vec<usize>, Vec<f32>) {
    let k = k.min(values.len());
    let mut idx: Vec<usize> = (0..values.len()).collect();
    idx.sort_unstable_by(|&a, &b| values[b].partial_cmp(&values[a]).unwrap());
    idx.truncate(k);
    let vals = idx.iter().map(|&i| values[i]).collect();
    (idx, vals)
}

/// Splits one joint-network logit vector `[V | |D|]` into its vocabulary
/// and duration halves, dividing by `temperature` and log-softmaxing each
/// independently (spec.md §3).
pub fn split_log_softmax(
    logits: &Array1<f32>,
    vocab_size: usize,
    temperature: f32,
) -> (Array1<f32>, Array1<f32>) {
    let scaled = logits.mapv(|v| v / temperature);
    let vocab = scaled.slice(ndarray::s![..vocab_size]).to_owned();
    let duration = scaled.slice(ndarray::s![vocab_size..]).to_owned();
    (log_softmax(&vocab), log_softmax(&duration))
}

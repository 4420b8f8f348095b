use fxhash::hash64;

use crate::normalize::l2_normalize_in_place;
use crate::EmbeddingConfig;

/// Deterministic stub used in `"stub"` mode or when local model assets are
/// unavailable. Derives sinusoid values from a hash of the description text, so
/// identical descriptions always map to identical vectors at minimal CPU cost.
/// The vectors carry no semantic signal; they exist for tests and offline runs.
pub(crate) fn make_stub_vector(text: &str, cfg: &EmbeddingConfig) -> Vec<f32> {
    let dim = cfg.stub_dim.max(1);
    let mut v = vec![0f32; dim];
    let h = hash64(text.as_bytes());
    for (idx, value) in v.iter_mut().enumerate() {
        *value = ((h >> (idx % 32)) as f32 * 0.0001).sin();
    }
    if cfg.normalize {
        l2_normalize_in_place(&mut v);
    }
    v
}

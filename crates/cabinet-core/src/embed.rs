//! The `Embedder` seam — text vectorization as an opaque collaborator.
//!
//! The service layer calls this to attach a similarity key to records; the
//! store only persists the result. `None` means "no vector could be
//! produced" and is never an error: creation proceeds without one.

/// Produce a fixed-length numeric fingerprint of `text`, or `None` when the
/// input yields nothing to embed.
pub trait Embedder: Send + Sync {
  fn embed(&self, text: &str) -> Option<Vec<f32>>;
}

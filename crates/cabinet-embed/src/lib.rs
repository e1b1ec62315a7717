//! Token-hash text embedder.
//!
//! Produces a normalized bag-of-tokens vector: markdown formatting is
//! stripped, the text is whitespace-tokenized, each token is hashed into a
//! fixed-dimension bucket, and the count vector is L2-normalized. Tokens are
//! hashed with SHA-256 so the same text embeds identically across processes
//! and restarts.
//!
//! This is a similarity key, not a semantic model; it exists so `Catalog`
//! records carry a stable `vector` the store can rank by cosine similarity.

use cabinet_core::embed::Embedder;
use regex::Regex;
use sha2::{Digest, Sha256};

/// Vector length produced by [`TokenHashEmbedder`].
pub const DIMENSIONS: usize = 384;

pub struct TokenHashEmbedder {
  dimensions: usize,
  headers:    Regex,
  emphasis:   Regex,
  code:       Regex,
  images:     Regex,
  links:      Regex,
}

impl TokenHashEmbedder {
  pub fn new() -> Self { Self::with_dimensions(DIMENSIONS) }

  pub fn with_dimensions(dimensions: usize) -> Self {
    Self {
      dimensions,
      headers:  Regex::new(r"(?m)^#+ ").expect("valid regex"),
      emphasis: Regex::new(r"\*{1,2}([^*]+)\*{1,2}").expect("valid regex"),
      code:     Regex::new(r"`([^`]+)`").expect("valid regex"),
      // Images before links: the image syntax contains the link syntax.
      images:   Regex::new(r"!\[[^\]]*\]\([^)]+\)").expect("valid regex"),
      links:    Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("valid regex"),
    }
  }

  /// Strip markdown formatting down to plain text, keeping link and
  /// emphasis text but dropping targets and images.
  fn preprocess(&self, text: &str) -> String {
    let text = self.headers.replace_all(text, "");
    let text = self.emphasis.replace_all(&text, "$1");
    let text = self.code.replace_all(&text, "$1");
    let text = self.images.replace_all(&text, "");
    let text = self.links.replace_all(&text, "$1");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
  }

  fn bucket(&self, token: &str) -> usize {
    let digest = Sha256::digest(token.to_lowercase().as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(prefix) % self.dimensions as u64) as usize
  }
}

impl Default for TokenHashEmbedder {
  fn default() -> Self { Self::new() }
}

impl Embedder for TokenHashEmbedder {
  fn embed(&self, text: &str) -> Option<Vec<f32>> {
    let processed = self.preprocess(text);
    if processed.is_empty() {
      return None;
    }

    let mut vector = vec![0.0f32; self.dimensions];
    for token in processed.split_whitespace() {
      vector[self.bucket(token)] += 1.0;
    }

    let magnitude = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude == 0.0 {
      return None;
    }
    for x in &mut vector {
      *x /= magnitude;
    }
    Some(vector)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_and_whitespace_input_embed_to_none() {
    let e = TokenHashEmbedder::new();
    assert!(e.embed("").is_none());
    assert!(e.embed("   \n\t ").is_none());
  }

  #[test]
  fn output_is_normalized_and_fixed_length() {
    let e = TokenHashEmbedder::new();
    let v = e.embed("some plain words here").unwrap();
    assert_eq!(v.len(), DIMENSIONS);
    let magnitude = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((magnitude - 1.0).abs() < 1e-5);
  }

  #[test]
  fn same_text_embeds_identically() {
    let e = TokenHashEmbedder::new();
    assert_eq!(e.embed("stable fingerprint"), e.embed("stable fingerprint"));
  }

  #[test]
  fn markdown_formatting_does_not_change_the_vector() {
    let e = TokenHashEmbedder::new();
    let plain = e.embed("heading with emphasis and code").unwrap();
    let marked = e
      .embed("## heading\n\nwith **emphasis** and `code`")
      .unwrap();
    assert_eq!(plain, marked);
  }

  #[test]
  fn link_text_is_kept_and_images_are_dropped() {
    let e = TokenHashEmbedder::new();
    let from_link = e
      .embed("see [the docs](https://example.com/d) ![diagram](img.png)")
      .unwrap();
    let plain = e.embed("see the docs").unwrap();
    assert_eq!(from_link, plain);
  }

  #[test]
  fn related_texts_score_higher_than_unrelated() {
    let e = TokenHashEmbedder::new();
    let a = e.embed("rust ownership borrowing lifetimes").unwrap();
    let b = e.embed("rust ownership and aliasing").unwrap();
    let c = e.embed("sourdough hydration ratios").unwrap();

    let dot = |x: &[f32], y: &[f32]| -> f32 {
      x.iter().zip(y).map(|(p, q)| p * q).sum()
    };
    assert!(dot(&a, &b) > dot(&a, &c));
  }
}

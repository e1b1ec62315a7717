//! Tenant identity — the `(organization, group, user)` triple that names an
//! isolated namespace within the shared storage engine.
//!
//! Every segment is used in SQL identifier and filesystem path positions, so
//! construction validates against a restrictive alphabet. A `TenantId` that
//! exists is always safe to interpolate (and is still double-quoted in SQL).

use serde::Serialize;

use crate::{Error, Result};

/// Longest accepted tenant segment.
pub const MAX_SEGMENT_LEN: usize = 64;

/// Validate one tenant path segment: `[A-Za-z0-9_]{1,64}`.
///
/// `segment` names the position being validated ("organization", "group",
/// "user") and is echoed in the error.
pub fn validate_segment(segment: &'static str, value: &str) -> Result<()> {
  let ok = !value.is_empty()
    && value.len() <= MAX_SEGMENT_LEN
    && value
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || c == '_');
  if ok {
    Ok(())
  } else {
    Err(Error::InvalidIdentifier {
      segment,
      value: value.to_string(),
    })
  }
}

/// A validated `(organization, group, user)` namespace identifier.
///
/// Fields are private; the only way to obtain one is [`TenantId::new`], which
/// rejects any segment outside the allowed alphabet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TenantId {
  org:   String,
  group: String,
  user:  String,
}

impl TenantId {
  pub fn new(
    org: impl Into<String>,
    group: impl Into<String>,
    user: impl Into<String>,
  ) -> Result<Self> {
    let org = org.into();
    let group = group.into();
    let user = user.into();
    validate_segment("organization", &org)?;
    validate_segment("group", &group)?;
    validate_segment("user", &user)?;
    Ok(Self { org, group, user })
  }

  pub fn org(&self) -> &str { &self.org }

  pub fn group(&self) -> &str { &self.group }

  pub fn user(&self) -> &str { &self.user }
}

impl std::fmt::Display for TenantId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}/{}/{}", self.org, self.group, self.user)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_alphanumeric_and_underscore() {
    assert!(TenantId::new("acme", "research_7", "alice").is_ok());
    assert!(TenantId::new("A1", "_private", "x").is_ok());
  }

  #[test]
  fn rejects_empty_segment() {
    assert!(matches!(
      TenantId::new("acme", "", "alice"),
      Err(Error::InvalidIdentifier { segment: "group", .. })
    ));
  }

  #[test]
  fn rejects_sql_metacharacters() {
    for bad in ["users; DROP TABLE x", "a\"b", "a.b", "a-b", "a b", "a'b"] {
      assert!(
        TenantId::new("acme", "g", bad).is_err(),
        "accepted {bad:?}"
      );
    }
  }

  #[test]
  fn rejects_path_traversal() {
    assert!(TenantId::new("..", "g", "u").is_err());
    assert!(TenantId::new("acme", "../etc", "u").is_err());
  }

  #[test]
  fn rejects_overlong_segment() {
    let long = "a".repeat(MAX_SEGMENT_LEN + 1);
    assert!(TenantId::new("acme", "g", long).is_err());
  }

  #[test]
  fn rejects_non_ascii() {
    assert!(TenantId::new("acmé", "g", "u").is_err());
  }
}

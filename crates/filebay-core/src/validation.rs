//! Upload policy: declared content type and size validation.
//!
//! Validation is declarative only: the declared MIME type is trusted as-is
//! and no magic-byte sniffing is performed. The decision is made before any
//! bytes are committed to disk; the byte ceiling is additionally enforced
//! mid-stream by the storage placer.

use thiserror::Error;

/// Baseline upload ceiling: 40 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 40 * 1024 * 1024;

/// Conservative baseline allow-list of declared content types.
pub const DEFAULT_ALLOWED_CONTENT_TYPES: &[&str] =
    &["image/png", "image/jpeg", "image/jpg", "application/pdf"];

/// Validation rejection reasons
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("unsupported content type '{content_type}', allowed: {}", allowed.join(", "))]
    UnsupportedType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("{size} bytes exceeds the upload ceiling of {max} bytes")]
    TooLarge { size: u64, max: u64 },
}

/// Upload acceptance policy: content-type allow-list plus a byte ceiling.
///
/// Stateless and cheap to clone; supplied once at process startup and shared
/// across all request-handling tasks.
#[derive(Clone, Debug)]
pub struct UploadPolicy {
    max_upload_bytes: u64,
    allowed_content_types: Vec<String>,
}

impl UploadPolicy {
    /// Allow-list entries are normalized to lowercase on construction.
    pub fn new(max_upload_bytes: u64, allowed_content_types: Vec<String>) -> Self {
        let allowed_content_types = allowed_content_types
            .into_iter()
            .map(|ct| ct.trim().to_lowercase())
            .filter(|ct| !ct.is_empty())
            .collect();
        UploadPolicy {
            max_upload_bytes,
            allowed_content_types,
        }
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    pub fn allowed_content_types(&self) -> &[String] {
        &self.allowed_content_types
    }

    /// Decide whether an upload with the given declared content type and
    /// (optionally known) declared size is acceptable. Purely a decision
    /// function; no side effects.
    pub fn validate(
        &self,
        declared_content_type: &str,
        declared_size: Option<u64>,
    ) -> Result<(), ValidationError> {
        let normalized = normalize_mime_type(declared_content_type);
        if !self.allowed_content_types.iter().any(|ct| *ct == normalized) {
            return Err(ValidationError::UnsupportedType {
                content_type: normalized,
                allowed: self.allowed_content_types.clone(),
            });
        }

        if let Some(size) = declared_size {
            if size > self.max_upload_bytes {
                return Err(ValidationError::TooLarge {
                    size,
                    max: self.max_upload_bytes,
                });
            }
        }

        Ok(())
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        UploadPolicy::new(
            DEFAULT_MAX_UPLOAD_BYTES,
            DEFAULT_ALLOWED_CONTENT_TYPES
                .iter()
                .map(|ct| ct.to_string())
                .collect(),
        )
    }
}

/// Normalize a MIME type by stripping parameters (e.g. "image/png; charset=utf-8"
/// -> "image/png") and lowercasing, so parameters cannot bypass the allow-list.
fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_type_within_ceiling() {
        let policy = UploadPolicy::default();
        assert!(policy.validate("image/png", Some(10)).is_ok());
        assert!(policy.validate("application/pdf", None).is_ok());
    }

    #[test]
    fn rejects_type_outside_allowlist() {
        let policy = UploadPolicy::default();
        let err = policy.validate("text/plain", Some(10)).unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedType { .. }));
    }

    #[test]
    fn rejects_declared_size_over_ceiling() {
        let policy = UploadPolicy::new(100, vec!["image/png".to_string()]);
        let err = policy.validate("image/png", Some(101)).unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { size: 101, max: 100 }));
    }

    #[test]
    fn mime_parameters_do_not_bypass_allowlist() {
        let policy = UploadPolicy::default();
        assert!(policy.validate("IMAGE/PNG; charset=utf-8", None).is_ok());
        assert!(policy.validate("text/plain; boundary=x", None).is_err());
    }

    #[test]
    fn allowlist_is_normalized_on_construction() {
        let policy = UploadPolicy::new(100, vec![" Image/JPEG ".to_string(), String::new()]);
        assert_eq!(policy.allowed_content_types(), ["image/jpeg"]);
        assert!(policy.validate("image/jpeg", None).is_ok());
    }
}

//! Reversible obfuscation of numeric record ids
//!
//! External ids are `base64url("<secret>-<id>-<secret>")` without padding, so they
//! are safe as path segments. Decoding checks both secret halves.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdCodecError {
    #[error("Secret key cannot be empty")]
    EmptySecret,
    #[error("Invalid id '{0}'")]
    Invalid(String),
}

#[derive(Clone)]
pub struct IdCodec {
    secret: Arc<str>,
}

impl std::fmt::Debug for IdCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdCodec").finish_non_exhaustive()
    }
}

impl IdCodec {
    pub fn new(secret: impl AsRef<str>) -> Result<Self, IdCodecError> {
        let secret = secret.as_ref();
        if secret.trim().is_empty() {
            return Err(IdCodecError::EmptySecret);
        }
        Ok(Self {
            secret: Arc::from(secret),
        })
    }

    pub fn encode(&self, id: i64) -> String {
        URL_SAFE_NO_PAD.encode(format!("{secret}-{id}-{secret}", secret = self.secret))
    }

    pub fn decode(&self, token: &str) -> Result<i64, IdCodecError> {
        let invalid = || IdCodecError::Invalid(token.to_string());

        let bytes = URL_SAFE_NO_PAD.decode(token).map_err(|_| invalid())?;
        let text = String::from_utf8(bytes).map_err(|_| invalid())?;

        let inner = text
            .strip_prefix(&*self.secret)
            .and_then(|rest| rest.strip_prefix('-'))
            .and_then(|rest| rest.strip_suffix(&*self.secret))
            .and_then(|rest| rest.strip_suffix('-'))
            .ok_or_else(invalid)?;

        match inner.parse::<i64>() {
            Ok(id) if id > 0 => Ok(id),
            _ => Err(invalid()),
        }
    }
}

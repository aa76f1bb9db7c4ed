//! Viewer resolution from bearer tokens.

use axum::http::HeaderValue;
use postgrid_core::{AppConfig, Viewer};
use subtle::ConstantTimeEq;

/// Configured tokens for the privileged roles. An unset token grants nothing.
#[derive(Clone, Default)]
pub struct AccessTokens {
    editor: Option<String>,
    admin: Option<String>,
}

impl AccessTokens {
    pub fn new(editor: Option<String>, admin: Option<String>) -> Self {
        let non_empty = |token: Option<String>| token.filter(|t| !t.is_empty());
        Self { editor: non_empty(editor), admin: non_empty(admin) }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.editor_token.clone(), config.admin_token.clone())
    }

    /// Viewer for an `Authorization` header. Missing or unknown tokens are anonymous.
    pub fn resolve(&self, authorization: Option<&HeaderValue>) -> Viewer {
        let Some(token) = extract_bearer(authorization) else {
            return Viewer::anonymous();
        };

        if matches(self.admin.as_deref(), token) {
            Viewer::administrator()
        } else if matches(self.editor.as_deref(), token) {
            Viewer::editor()
        } else {
            tracing::debug!("unrecognized bearer token; treating as anonymous");
            Viewer::anonymous()
        }
    }
}

fn extract_bearer(value: Option<&HeaderValue>) -> Option<&str> {
    let raw = value?.to_str().ok()?;
    let (scheme, token) = raw.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn matches(expected: Option<&str>, presented: &str) -> bool {
    expected.is_some_and(|expected| expected.as_bytes().ct_eq(presented.as_bytes()).unwrap_u8() == 1)
}

use crate::domain::Secret;

pub const HF_TOKEN_VAR: &str = "HF_TOKEN";
pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Read once at startup; blank values count as absent.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub hf_token: Option<Secret>,
    pub gemini_api_key: Option<Secret>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            hf_token: read_secret(HF_TOKEN_VAR),
            gemini_api_key: read_secret(GEMINI_API_KEY_VAR),
        }
    }
}

fn read_secret(var: &str) -> Option<Secret> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(Secret::new)
}

use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{CompletionRequest, LlmClient};
use crate::domain::MediaPayload;
use crate::infrastructure::observability::sanitize_prompt;

pub const SPEAKER_PROMPT: &str = "Describe the main speaker's voice in this video in 2-5 words for an audio \
separation model. Examples: 'Man speaking', 'Woman speaking', 'Young boy speaking', \
'Deep male voice speaking'. Reply with ONLY the short description, nothing else.";

fn refine_instruction(prompt: &str) -> String {
    format!(
        "Rewrite the following description of a sound as a short phrase of 2-8 words \
for an audio separation model. Keep its meaning and use any attached media as context. \
Reply with ONLY the phrase, nothing else.\n\nDescription: {prompt}"
    )
}

/// Outcome of augmentation. The fallback branch is a normal value, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AugmentedPrompt {
    Augmented {
        prompt: String,
        original: Option<String>,
    },
    Original {
        prompt: String,
    },
}

impl AugmentedPrompt {
    pub fn prompt(&self) -> &str {
        match self {
            AugmentedPrompt::Augmented { prompt, .. } | AugmentedPrompt::Original { prompt } => {
                prompt
            }
        }
    }

    pub fn is_augmented(&self) -> bool {
        matches!(self, AugmentedPrompt::Augmented { .. })
    }

    pub fn into_prompt(self) -> String {
        match self {
            AugmentedPrompt::Augmented { prompt, .. } | AugmentedPrompt::Original { prompt } => {
                prompt
            }
        }
    }
}

/// Best-effort prompt rewriting through an external text generation model.
pub struct PromptAugmenter {
    client: Option<Arc<dyn LlmClient>>,
    timeout: Duration,
    default_prompt: String,
}

impl PromptAugmenter {
    pub fn new(client: Option<Arc<dyn LlmClient>>, timeout: Duration, default_prompt: String) -> Self {
        Self {
            client,
            timeout,
            default_prompt,
        }
    }

    pub fn disabled(default_prompt: String) -> Self {
        Self::new(None, Duration::ZERO, default_prompt)
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    pub fn default_prompt(&self) -> &str {
        &self.default_prompt
    }

    /// Never fails: on any problem the user prompt (or the default one) comes back.
    pub async fn augment(
        &self,
        prompt: Option<&str>,
        media: Option<&MediaPayload>,
    ) -> AugmentedPrompt {
        let user_prompt = prompt.map(str::trim).filter(|p| !p.is_empty());
        let fallback = AugmentedPrompt::Original {
            prompt: user_prompt.unwrap_or(&self.default_prompt).to_string(),
        };

        let Some(client) = &self.client else {
            tracing::debug!("Prompt augmentation disabled");
            return fallback;
        };

        let instruction = match (user_prompt, media) {
            (Some(p), _) => refine_instruction(p),
            (None, Some(_)) => SPEAKER_PROMPT.to_string(),
            (None, None) => return fallback,
        };
        let request = CompletionRequest::text(instruction).with_media(media.cloned());

        let reply = match tokio::time::timeout(self.timeout, client.complete(&request)).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                tracing::warn!(
                    kind = "augmentation_degraded",
                    error = %e,
                    "Prompt augmentation failed, using original prompt"
                );
                return fallback;
            }
            Err(_) => {
                tracing::warn!(
                    kind = "augmentation_degraded",
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Prompt augmentation timed out, using original prompt"
                );
                return fallback;
            }
        };

        let cleaned = clean_reply(&reply);
        if cleaned.is_empty() {
            tracing::warn!(
                kind = "augmentation_degraded",
                "Prompt augmentation returned nothing, using original prompt"
            );
            return fallback;
        }

        tracing::info!(
            original = %sanitize_prompt(fallback.prompt()),
            augmented = %sanitize_prompt(&cleaned),
            "Prompt augmented"
        );

        AugmentedPrompt::Augmented {
            prompt: cleaned,
            original: user_prompt.map(str::to_string),
        }
    }
}

/// First non-empty line, without surrounding quotes.
fn clean_reply(reply: &str) -> String {
    reply
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
        .trim()
        .to_string()
}

//! Text-generation service port

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::domain::result::Result;

/// A hosted text-generation model
///
/// Responses are untrusted: nothing guarantees they conform to `schema`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for `prompt`. When `schema` is given the service is asked for JSON
    /// matching it.
    async fn generate(&self, prompt: &str, schema: Option<&JsonValue>) -> Result<String>;

    /// False when no credential is configured and every call would fail
    fn is_configured(&self) -> bool {
        true
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;
    use crate::domain::result::Error;

    /// Generator answering every prompt with one canned reply
    pub struct ScriptedGenerator {
        reply: Option<String>,
        configured: bool,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        pub fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                configured: true,
                prompts: Mutex::new(Vec::new()),
            }
        }

        /// Every call fails with `Error::AiService`
        pub fn failing() -> Self {
            Self {
                reply: None,
                configured: true,
                prompts: Mutex::new(Vec::new()),
            }
        }

        /// No API key: `is_configured` is false
        pub fn unconfigured() -> Self {
            Self {
                reply: None,
                configured: false,
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }

        pub fn last_prompt(&self) -> String {
            self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str, _schema: Option<&JsonValue>) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply
                .clone()
                .ok_or_else(|| Error::ai("model unavailable"))
        }

        fn is_configured(&self) -> bool {
            self.configured
        }
    }
}

// Chat-completions client that turns a topic into raw mind-map JSON text
use futures_util::future::BoxFuture;
use mindx_core::{Error, ImportError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "meta-llama/llama-3.3-8b-instruct:free";

const SYSTEM_PREAMBLE: &str = "You are an expert teacher building study mind maps. \
Produce a four-level hierarchy:
- Level 0: the main topic (exactly one node)
- Level 1: 3-5 major subtopics
- Level 2: 2-4 concepts or categories under each subtopic
- Level 3: detailed content nodes holding 15-40 words of real explanation \
(definitions, formulas, examples), never bare labels such as 'Definition' or 'Formula'

Answer with JSON in exactly this shape:
{
  \"title\": \"Topic Name\",
  \"nodes\": [
    {\"id\": \"1\", \"text\": \"Main Topic\", \"parentId\": null, \"level\": 0},
    {\"id\": \"2\", \"text\": \"Primary Subtopic\", \"parentId\": \"1\", \"level\": 1},
    {\"id\": \"3\", \"text\": \"Concept\", \"parentId\": \"2\", \"level\": 2},
    {\"id\": \"4\", \"text\": \"Detailed explanation in 15-40 words.\", \"parentId\": \"3\", \"level\": 3, \"isDetailNode\": true}
  ]
}

Create 12-20 nodes in total and end every branch with a level 3 content node. \
Return ONLY valid JSON with no markdown formatting or extra text.";

/// Source of raw mind-map text for a topic.
pub trait ContentGenerator: Send + Sync {
    fn generate<'a>(&'a self, topic: &'a str) -> BoxFuture<'a, Result<String>>;
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Sent as `X-Title` for providers that attribute traffic.
    pub app_title: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            app_title: "MindX - Mindmap Generator".to_string(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-style chat completions over HTTPS.
pub struct ChatCompletionsGenerator {
    client: reqwest::Client,
    config: GeneratorConfig,
}

impl ChatCompletionsGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    async fn request(&self, topic: &str) -> Result<String> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(Error::validation("topic must not be empty"));
        }
        let api_key = match self.config.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => key,
            _ => return Err(ImportError::Unauthorized.into()),
        };

        let prompt = format!(
            "Create a detailed mindmap for the topic: {}. Include definitions, formulas, key concepts \
             and applications where applicable. Make sure final child nodes contain actual explanations, \
             not just category labels.",
            topic
        );
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage { role: "system", content: SYSTEM_PREAMBLE },
                ChatMessage { role: "user", content: &prompt },
            ],
        };

        debug!("Requesting mind map for '{}' from {}", topic, self.config.endpoint);
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .header("X-Title", &self.config.app_title)
            .json(&body)
            .send()
            .await
            .map_err(|e| ImportError::Transport(e.to_string()))?;

        let status = response.status();
        match status.as_u16() {
            401 => return Err(ImportError::Unauthorized.into()),
            429 => return Err(ImportError::RateLimited.into()),
            _ if !status.is_success() => {
                let detail = response.text().await.unwrap_or_default();
                warn!("Generator returned HTTP {}: {}", status, detail);
                return Err(ImportError::Transport(format!("HTTP {}", status)).into());
            }
            _ => {}
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| ImportError::ParseFailure(e.to_string()))?;
        reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ImportError::ParseFailure("response has no message content".to_string()).into())
    }
}

impl ContentGenerator for ChatCompletionsGenerator {
    fn generate<'a>(&'a self, topic: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.request(topic))
    }
}

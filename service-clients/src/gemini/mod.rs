use anyhow::{bail, Context};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// A small client for the Generative Language REST API. Only the two calls the server and CLI
/// need are implemented, `generateContent` for reports and `models` for diagnostics. The key is
/// optional so that a server can start without one, requests fail before touching the network
/// until a key is supplied.
#[derive(Clone)]
pub struct GeminiClient {
    pub api_base: String,
    api_key: Option<String>,
    http: Client,
}

/// Sampling parameters sent with every generation request
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: &'a GenerationConfig,
}

#[derive(Serialize, Debug)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize, Debug)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelInfo>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Deserialize, Debug)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl GenerateContentResponse {
    /// Join the text parts of the first candidate. A blocked prompt or a reply without any text is
    /// an error, there is nothing useful to hand back to the caller.
    pub fn text(&self) -> anyhow::Result<String> {
        if let Some(reason) = self.prompt_feedback.as_ref().and_then(|f| f.block_reason.as_ref()) {
            bail!("prompt was blocked by the model, reason: {reason}");
        }
        let candidate = self.candidates
            .first()
            .context("model returned no candidates")?;
        let text: String = candidate.content
            .iter()
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() {
            let reason = candidate.finish_reason.clone().unwrap_or_else(|| "unknown".to_string());
            bail!("model returned an empty response, finish reason: {reason}");
        }
        Ok(text)
    }
}

impl GeminiClient {

    pub fn new(api_base: &str, api_key: Option<String>) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            http: Client::new(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> anyhow::Result<&str> {
        match &self.api_key {
            Some(key) => Ok(key.as_str()),
            None => bail!("API key not configured, set GEMINI_API_KEY and restart"),
        }
    }

    /// Accepts `gemini-2.5-flash` as well as `models/gemini-2.5-flash`
    pub fn generate_content_url(&self, model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/models/{model}:generateContent", self.api_base)
    }

    pub fn list_models_url(&self) -> String {
        format!("{}/models", self.api_base)
    }

    /// Send one prompt and return the generated text
    pub async fn generate_content(
        &self,
        model: &str,
        prompt: &str,
        config: &GenerationConfig,
    ) -> anyhow::Result<String> {
        let key = self.api_key()?;
        let url = self.generate_content_url(model);
        tracing::debug!("sending prompt of {} bytes to {url}", prompt.len());

        let body = build_generate_request(prompt, config);
        let resp = self.http
            .post(&url)
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await
            .context("sending generate content request")?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            bail!("generate content failed with status {status}: {}", api_error_message(&text));
        }
        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .context("parsing generate content response")?;
        parsed.text()
    }

    /// List every model available to the key, following pagination
    pub async fn list_models(&self) -> anyhow::Result<Vec<ModelInfo>> {
        let key = self.api_key()?;
        let url = self.list_models_url();
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut req = self.http.get(&url).header("x-goog-api-key", key);
            if let Some(token) = &page_token {
                req = req.query(&[("pageToken", token)]);
            }
            let resp = req.send().await.context("sending list models request")?;
            let status = resp.status();
            let text = resp.text().await?;
            if !status.is_success() {
                bail!("list models failed with status {status}: {}", api_error_message(&text));
            }
            let page: ModelList = serde_json::from_str(&text)
                .context("parsing list models response")?;
            models.extend(page.models);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(models)
    }
}

fn build_generate_request<'a>(prompt: &'a str, config: &'a GenerationConfig) -> GenerateContentRequest<'a> {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![RequestPart { text: prompt }],
        }],
        generation_config: config,
    }
}

/// Pull the message out of an API error body, falling back to the raw body
fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => match parsed.error.status {
            Some(status) => format!("{status}: {}", parsed.error.message),
            None => parsed.error.message,
        },
        Err(_) => body.to_string(),
    }
}

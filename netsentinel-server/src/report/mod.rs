pub mod prompt;

use anyhow::Context;
use async_trait::async_trait;
use service_clients::gemini::{GeminiClient, GenerationConfig};
use netsentinel_schemas::project::ProjectName;
use netsentinel_schemas::settings::GenerationSettings;
use crate::report::prompt::build_prompt;

/// Turns the text of one capture into a Markdown report
#[async_trait]
pub trait ReportGenerator {
    async fn generate(&self, project: &ProjectName, capture_text: &str) -> anyhow::Result<String>;
}

/// Sends the whole capture to the generative language API in a single request. There is no
/// chunking, a capture larger than the model's context window fails the request.
pub struct GeminiReportGenerator {
    client: GeminiClient,
    model: String,
    config: GenerationConfig,
}

impl GeminiReportGenerator {
    pub fn new(settings: &GenerationSettings) -> Self {
        Self {
            client: GeminiClient::new(&settings.api_base, settings.api_key.clone()),
            model: settings.model.clone(),
            config: generation_config(settings),
        }
    }
}

pub fn generation_config(settings: &GenerationSettings) -> GenerationConfig {
    GenerationConfig {
        temperature: settings.temperature,
        top_p: settings.top_p,
        top_k: settings.top_k,
        max_output_tokens: settings.max_output_tokens,
    }
}

#[async_trait]
impl ReportGenerator for GeminiReportGenerator {
    async fn generate(&self, project: &ProjectName, capture_text: &str) -> anyhow::Result<String> {
        let prompt = build_prompt(project, capture_text);
        tracing::info!("requesting report for {project} from {}", self.model);
        let report = self.client
            .generate_content(&self.model, &prompt, &self.config)
            .await
            .with_context(|| format!("generating report with {}", self.model))?;
        tracing::info!("received report for {project}, {} bytes", report.len());
        Ok(report)
    }
}

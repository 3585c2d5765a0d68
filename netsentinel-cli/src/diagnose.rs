use anyhow::bail;
use service_clients::gemini::{GeminiClient, ModelInfo};
use netsentinel_schemas::API_KEY_ENV;
use netsentinel_schemas::cli_models::DiagnoseCmd;

/// Check the key talks to the remote API and list what it can use. This runs locally, the server
/// does not need to be up.
pub async fn diagnose(cmd: &DiagnoseCmd) -> anyhow::Result<()> {
    let client = GeminiClient::new(&cmd.api_base, cmd.api_key.clone());
    if !client.has_api_key() {
        bail!("no API key found, set {API_KEY_ENV} or pass --api-key");
    }
    tracing::info!("API key found, listing models from {}", client.api_base);

    let models = client.list_models().await?;
    let usable = generation_models(&models);
    for model in &usable {
        match &model.display_name {
            Some(display_name) => println!("{} ({display_name})", model.name),
            None => println!("{}", model.name),
        }
    }
    tracing::info!("{} of {} models support generateContent", usable.len(), models.len());

    if usable.iter().any(|model| is_flash(model)) {
        tracing::info!("a flash model is available");
    } else {
        tracing::warn!("no flash model available to this key, reports will fail with the default model");
    }
    Ok(())
}

/// Models that can be used to write reports
fn generation_models(models: &[ModelInfo]) -> Vec<&ModelInfo> {
    models
        .iter()
        .filter(|model| model.supported_generation_methods.iter().any(|m| m == "generateContent"))
        .collect()
}

fn is_flash(model: &ModelInfo) -> bool {
    model.name.contains("flash")
}

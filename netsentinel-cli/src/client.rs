use anyhow::{anyhow, bail};
use reqwest::{Response, Url};
use netsentinel_schemas::api_models::{AnalyzeRequest, ErrorResponse, HistoryList, ReportResponse};

/// Reusable helper method for parsing the response from the server for command results
async fn parse_response(resp: Response, command_name: &str) -> anyhow::Result<String> {
    let http_code = resp.status();
    let text_response = resp.text().await?;

    if http_code.is_success() {
        tracing::debug!("{command_name} command successful");
    } else {
        tracing::debug!("{command_name} command was not successful with code {http_code}");
        // exit cli with error as we cannot continue
        bail!("server response ({http_code}): {}", error_message(&text_response));
    }
    Ok(text_response)
}

/// Pull the `error` field out of an error body, falling back to the raw text for anything the
/// server did not produce itself (proxies, timeouts)
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(err) => err.error,
        Err(_) => body.trim().to_string(),
    }
}

/// Build `<server>/<segments..>`, each segment is percent encoded
pub fn endpoint(server_url: &str, segments: &[&str]) -> anyhow::Result<Url> {
    let mut url = Url::parse(server_url)?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("{server_url} cannot be used as a server url"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Ask the server to capture and analyse, this blocks for the whole capture window plus the
/// report generation
pub async fn analyze(
    client: &reqwest::Client,
    server_url: &str,
    project_name: &str,
) -> anyhow::Result<String> {
    tracing::info!("capturing traffic for '{project_name}', this takes a while");
    let server_api = endpoint(server_url, &["analyze"])?;
    tracing::trace!("api url used = {server_api}");

    let json = AnalyzeRequest {
        project_name: Some(project_name.to_string()),
    };
    let resp = client.post(server_api).json(&json).send().await?;

    let text = parse_response(resp, "analyze").await?;
    let report: ReportResponse = serde_json::from_str(&text)?;
    Ok(report.report)
}

pub async fn list_history(
    client: &reqwest::Client,
    server_url: &str,
) -> anyhow::Result<Vec<String>> {
    let server_api = endpoint(server_url, &["history"])?;
    tracing::trace!("api url used = {server_api}");
    let resp = client.get(server_api).send().await?;

    let text = parse_response(resp, "history").await?;
    let history: HistoryList = serde_json::from_str(&text)?;
    Ok(history.projects)
}

pub async fn get_report(
    client: &reqwest::Client,
    server_url: &str,
    project_name: &str,
) -> anyhow::Result<String> {
    let server_api = endpoint(server_url, &["history", project_name])?;
    tracing::trace!("api url used = {server_api}");
    let resp = client.get(server_api).send().await?;

    let text = parse_response(resp, "history report").await?;
    let report: ReportResponse = serde_json::from_str(&text)?;
    Ok(report.report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_from_server_body() {
        assert_eq!(error_message(r#"{"error": "Relatorio nao encontrado."}"#), "Relatorio nao encontrado.");
    }

    #[test]
    fn test_error_message_falls_back_to_text() {
        assert_eq!(error_message("502 Bad Gateway\n"), "502 Bad Gateway");
        assert_eq!(error_message(r#"{"detail": "x"}"#), r#"{"detail": "x"}"#);
    }

    #[test]
    fn test_endpoint_joins_segments() -> anyhow::Result<()> {
        let url = endpoint("http://localhost:5000/", &["history"])?;
        assert_eq!(url.as_str(), "http://localhost:5000/history");

        let url = endpoint("http://10.0.0.2:5000", &["history", "office wifi"])?;
        assert_eq!(url.as_str(), "http://10.0.0.2:5000/history/office%20wifi");
        Ok(())
    }

    #[test]
    fn test_endpoint_keeps_reserved_characters_in_segment() -> anyhow::Result<()> {
        let url = endpoint("http://localhost:5000/", &["history", "a/b?c"])?;
        assert_eq!(url.path_segments().map(|s| s.count()), Some(2));
        assert_eq!(url.query(), None);
        Ok(())
    }

    #[test]
    fn test_endpoint_rejects_bad_url() {
        assert!(endpoint("not a url", &["history"]).is_err());
    }
}

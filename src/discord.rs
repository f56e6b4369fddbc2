use std::path::Path;

use log::info;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("failed to read chart file: {0}")]
    Io(#[from] std::io::Error),
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("webhook returned status {0}")]
    Status(reqwest::StatusCode),
}

/// Upload the rendered chart to a Discord webhook as a file attachment.
pub async fn post_burndown_chart(
    client: &Client,
    webhook_url: &str,
    chart_path: &str,
) -> Result<(), WebhookError> {
    let bytes = tokio::fs::read(chart_path).await?;
    let filename = Path::new(chart_path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "burndown.svg".to_owned());

    let form = Form::new()
        .text("content", "Burndown chart")
        .part("file", Part::bytes(bytes).file_name(filename));

    let res = client.post(webhook_url).multipart(form).send().await?;
    let status = res.status();
    info!("Webhook status: {}", status);
    if !status.is_success() {
        return Err(WebhookError::Status(status));
    }
    Ok(())
}

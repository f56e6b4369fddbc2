use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use indicatif::ProgressBar;
use log::{debug, info, warn};
use reqwest::Client;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::Config;
use crate::project::Project;
use crate::queries::project_v2_query;

const GITHUB_GRAPHQL_URL: &str = "https://api.github.com/graphql";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("GitHub rejected the access token; check `github_token` in secrets.json")]
    BadCredentials,
    #[error("GraphQL errors: {0}")]
    GraphQl(String),
    #[error("no project data in the response; check project_number and --type")]
    MissingProject,
    #[error("failed to decode project data: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Fetch the configured Projects V2 board, following item pagination to the
/// end, and build the normalized Project model.
pub async fn fetch_project(
    client: &Client,
    config: &Config,
    use_cache: bool,
) -> Result<Project, ApiError> {
    let query = project_v2_query(config.project_type);
    let mut variables = config.project.query_variables.clone();

    let response = gh_api_query(client, config, &query, &variables, use_cache).await?;
    let mut project_data = extract_project_data(&response, config)?;

    // Follow the cursor until the last page, folding each page's items into
    // the first response.
    loop {
        let page_info = &project_data["items"]["pageInfo"];
        if !page_info["hasNextPage"].as_bool().unwrap_or(false) {
            break;
        }
        let cursor = page_info["endCursor"].clone();
        debug!("Fetching next page after cursor {:?}", cursor);
        variables.insert("cursor".to_owned(), cursor);

        let response = gh_api_query(client, config, &query, &variables, use_cache).await?;
        let page = extract_project_data(&response, config)?;

        let nodes = page["items"]["nodes"]
            .as_array()
            .cloned()
            .unwrap_or_default();
        if let Some(existing) = project_data["items"]["nodes"].as_array_mut() {
            existing.extend(nodes);
        }
        project_data["items"]["pageInfo"] = page["items"]["pageInfo"].clone();
    }

    let data = serde_json::from_value(project_data)?;
    Ok(Project::from_project_data(&data))
}

fn extract_project_data(response: &Value, config: &Config) -> Result<Value, ApiError> {
    let project_data = response
        .get("data")
        .and_then(|data| data.get(config.project_type.key()))
        .and_then(|owner| owner.get("projectV2"));
    match project_data {
        Some(value) if !value.is_null() => Ok(value.clone()),
        _ => Err(ApiError::MissingProject),
    }
}

/// Run one GraphQL request, going through the response cache unless the
/// caller opted out.
async fn gh_api_query(
    client: &Client,
    config: &Config,
    query: &str,
    variables: &serde_json::Map<String, Value>,
    use_cache: bool,
) -> Result<Value, ApiError> {
    if use_cache {
        if let Some(cached) = read_from_cache(query, variables) {
            info!("Using cached response from {:?}", cache_path(query, variables));
            return Ok(cached);
        }
    }

    let response = query_api(client, config, query, variables).await?;
    if let Err(e) = write_to_cache(query, variables, &response) {
        warn!("Could not cache response: {}", e);
    }
    Ok(response)
}

async fn query_api(
    client: &Client,
    config: &Config,
    query: &str,
    variables: &serde_json::Map<String, Value>,
) -> Result<Value, ApiError> {
    let mut request = client
        .post(GITHUB_GRAPHQL_URL)
        .header("Accept", "application/vnd.github+json")
        .header("X-GitHub-Api-Version", "2022-11-28")
        .header("User-Agent", "burndown")
        .json(&payload(query, variables));
    if let Some(token) = &config.secrets.github_token {
        request = request.header("Authorization", format!("bearer {}", token));
    }

    let bar = ProgressBar::new_spinner();
    bar.enable_steady_tick(Duration::from_millis(100));
    let res = request.send().await?;
    bar.finish();

    let status = res.status();
    info!("Status: {}", status);
    let body: Value = res.json().await?;

    if body.get("message").and_then(Value::as_str) == Some("Bad credentials") {
        return Err(ApiError::BadCredentials);
    }
    if let Some(errors) = body.get("errors") {
        if !errors.is_null() {
            return Err(ApiError::GraphQl(errors.to_string()));
        }
    }
    Ok(body)
}

fn payload(query: &str, variables: &serde_json::Map<String, Value>) -> Value {
    json!({"query": query, "variables": variables})
}

// Cache keys include today's date so entries expire daily.
fn cache_path(query: &str, variables: &serde_json::Map<String, Value>) -> PathBuf {
    let mut keyed = payload(query, variables);
    keyed["today"] = json!(Utc::now().date_naive().to_string());
    let digest = Sha256::digest(keyed.to_string().as_bytes());
    std::env::temp_dir().join(format!("{:x}.json", digest))
}

fn read_from_cache(query: &str, variables: &serde_json::Map<String, Value>) -> Option<Value> {
    let path = cache_path(query, variables);
    let contents = fs::read_to_string(path).ok()?;
    serde_json::from_str(&contents).ok()
}

fn write_to_cache(
    query: &str,
    variables: &serde_json::Map<String, Value>,
    response: &Value,
) -> std::io::Result<()> {
    fs::write(cache_path(query, variables), response.to_string())
}

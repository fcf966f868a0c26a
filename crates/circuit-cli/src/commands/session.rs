use super::{App, print_json};
use anyhow::{Result, anyhow};
use circuit_application::TemplateSource;
use circuit_infrastructure::TomlTemplateProvider;
use std::path::PathBuf;

pub async fn start(app: &App, gym: &str, template: Option<String>, file: Option<PathBuf>) -> Result<()> {
    let source = match (template, file) {
        (Some(template_id), _) => TemplateSource::Id(template_id),
        (None, Some(path)) => {
            let template = TomlTemplateProvider::load_file(&path)?
                .ok_or_else(|| anyhow!("Template file not found: {}", path.display()))?;
            TemplateSource::Template(template)
        }
        (None, None) => return Err(anyhow!("Either --template or --file is required")),
    };

    let session = app.usecase.start(gym, source).await?;
    print_json(&session)
}

pub async fn pause(app: &App, id: &str) -> Result<()> {
    print_json(&app.usecase.pause(id).await?)
}

pub async fn resume(app: &App, id: &str) -> Result<()> {
    print_json(&app.usecase.resume(id).await?)
}

pub async fn stop(app: &App, id: &str) -> Result<()> {
    print_json(&app.usecase.stop(id).await?)
}

pub async fn next_step(app: &App, id: &str) -> Result<()> {
    print_json(&app.usecase.next_step(id).await?)
}

pub async fn prev_step(app: &App, id: &str) -> Result<()> {
    print_json(&app.usecase.prev_step(id).await?)
}

pub async fn next_block(app: &App, id: &str) -> Result<()> {
    print_json(&app.usecase.next_block(id).await?)
}

pub async fn prev_block(app: &App, id: &str) -> Result<()> {
    print_json(&app.usecase.prev_block(id).await?)
}

pub async fn tick(app: &App, id: &str, expected_version: u64) -> Result<()> {
    print_json(&app.usecase.auto_advance_check(id, expected_version).await?)
}

/// Prints the live session of a gym, or `null` when there is none.
pub async fn current(app: &App, gym: &str) -> Result<()> {
    print_json(&app.usecase.get_current(gym).await?)
}

pub async fn list(app: &App, gym: &str) -> Result<()> {
    print_json(&app.usecase.list(gym).await?)
}

pub async fn show(app: &App, id: &str) -> Result<()> {
    let session = app.usecase.get(id).await?;
    let view = app.usecase.project(&session);
    print_json(&serde_json::json!({
        "session": session,
        "view": view,
    }))
}

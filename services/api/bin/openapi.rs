use kidplan_api::router::ApiDoc;
use utoipa::OpenApi;

/// Writes the OpenAPI document to the path given as the first argument,
/// defaulting to `openapi.json`.
fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "openapi.json".to_string());
    let spec_json = ApiDoc::openapi().to_pretty_json()?;
    std::fs::write(&path, spec_json)?;
    println!("OpenAPI spec written to {path}.");
    Ok(())
}

//! Render command - expand fileprocessor blocks in a template file

use crate::cli::args::RenderArgs;
use crate::config::Config;
use crate::error::{FileProcessorError, FileProcessorResult};
use crate::front::ProcessorFront;
use crate::template::TemplateRenderer;
use tokio::fs;

/// Execute the render command
pub async fn execute(args: RenderArgs, config: &Config) -> FileProcessorResult<()> {
    let template = fs::read_to_string(&args.template).await.map_err(|e| {
        FileProcessorError::io(format!("reading template {}", args.template.display()), e)
    })?;

    let data = match &args.data {
        Some(path) => {
            let content = fs::read_to_string(path).await.map_err(|e| {
                FileProcessorError::io(format!("reading data {}", path.display()), e)
            })?;
            serde_json::from_str(&content)?
        }
        None => serde_json::Value::Object(Default::default()),
    };

    let renderer = TemplateRenderer::new(ProcessorFront::from_config(config)?);
    let html = renderer.render(&template, &data).await?;
    print!("{}", html);
    Ok(())
}

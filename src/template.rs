//! Template integration: the `fileprocessor` block helper
//!
//! ```handlebars
//! <p>{{#fileprocessor}}http://example.org/{{name}}.gif{{/fileprocessor}}</p>
//! ```
//!
//! The inner block is rendered against the template data and its text is
//! handed to the processor front; the returned output replaces the block
//! verbatim (no HTML escaping). Values interpolated inside the block are
//! escaped as usual, so use `{{{triple}}}` for raw URLs containing `&`.
//!
//! Rendering is two-phase because handlebars helpers are synchronous:
//! the helper records each block's instructions and emits a placeholder,
//! then the placeholders are resolved in order through the front.

use crate::error::{FileProcessorError, FileProcessorResult};
use crate::front::ProcessorFront;
use handlebars::{
    Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext,
    RenderErrorReason, Renderable, StringOutput,
};
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// Name of the block helper
pub const BLOCK_NAME: &str = "fileprocessor";

/// Collects block instructions and emits placeholders
struct FileProcessorBlock {
    nonce: String,
    collected: Arc<Mutex<Vec<String>>>,
}

fn placeholder(nonce: &str, index: usize) -> String {
    format!("\u{0}{}:{}:{}\u{0}", BLOCK_NAME, nonce, index)
}

impl HelperDef for FileProcessorBlock {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let template = h.template().ok_or_else(|| {
            RenderErrorReason::Other(format!("{} must be used as a block helper", BLOCK_NAME))
        })?;

        let mut inner = StringOutput::new();
        template.render(r, ctx, rc, &mut inner)?;
        let instructions = inner.into_string()?;

        let index = {
            let mut collected = self.collected.lock().unwrap_or_else(|e| e.into_inner());
            collected.push(instructions);
            collected.len() - 1
        };

        out.write(&placeholder(&self.nonce, index))?;
        Ok(())
    }
}

/// Renders templates whose `fileprocessor` blocks are resolved by a front
#[derive(Clone)]
pub struct TemplateRenderer {
    front: ProcessorFront,
}

impl TemplateRenderer {
    pub fn new(front: ProcessorFront) -> Self {
        Self { front }
    }

    /// Render `template` against `data`, substituting block outputs
    pub async fn render(
        &self,
        template: &str,
        data: &serde_json::Value,
    ) -> FileProcessorResult<String> {
        let (nonce, mut rendered, blocks) = expand(template, data)?;
        debug!("Template has {} {} block(s)", blocks.len(), BLOCK_NAME);

        for (index, instructions) in blocks.iter().enumerate() {
            let output = self.front.get_output(instructions).await?;
            rendered = rendered.replace(&placeholder(&nonce, index), &output);
        }

        Ok(rendered)
    }
}

/// First phase: render with placeholders, returning the collected blocks
fn expand(
    template: &str,
    data: &serde_json::Value,
) -> FileProcessorResult<(String, String, Vec<String>)> {
    let nonce = Uuid::new_v4().simple().to_string();
    let collected = Arc::new(Mutex::new(Vec::new()));

    let mut hbs = Handlebars::new();
    hbs.register_helper(
        BLOCK_NAME,
        Box::new(FileProcessorBlock {
            nonce: nonce.clone(),
            collected: collected.clone(),
        }),
    );

    let rendered = hbs
        .render_template(template, data)
        .map_err(|e| FileProcessorError::Template(e.to_string()))?;

    let blocks = collected.lock().unwrap_or_else(|e| e.into_inner()).clone();
    Ok((nonce, rendered, blocks))
}

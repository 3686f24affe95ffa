//! Serve command - run the HTTP front

use crate::cli::args::ServeArgs;
use crate::config::Config;
use crate::error::FileProcessorResult;
use crate::server;
use crate::ui::{self, UiContext};

/// Execute the serve command
pub async fn execute(args: ServeArgs, config: &Config) -> FileProcessorResult<()> {
    let ctx = UiContext::detect();
    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());

    ui::intro(&ctx, "fileprocessor server");
    ui::key_value(&ctx, "listening", &format!("http://{}", bind));
    ui::key_value(&ctx, "storage", &format!("{:?}", config.storage.backend).to_lowercase());
    if config.server.serve_blobs {
        ui::key_value(&ctx, "blobs", &config.storage.blob_base_url);
    }
    println!();

    server::serve(config, &bind).await
}

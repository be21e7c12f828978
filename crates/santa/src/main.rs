use std::process;

use anyhow::Result;
use santa::cli::{build_cli, handlers, init_tracing};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        #[allow(clippy::print_stderr)]
        {
            eprintln!("Error: {err:#}");
        }
        #[allow(clippy::exit)]
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    init_tracing()?;
    let matches = build_cli().get_matches();
    handlers::dispatch(&matches).await
}

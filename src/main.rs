use clap::Parser;

use finplan::api::cli::{Cli, run};

#[tokio::main]
async fn main() {
    finplan::init_tracing();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!("finplan failed: {e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

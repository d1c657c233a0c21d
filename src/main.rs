use anyhow::Result;
use clap::Parser;
use fplchat_ai::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    fplchat_ai::run(args).await
}

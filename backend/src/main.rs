use clap::Parser;

#[derive(Parser, Debug)]
#[command(about = "Spider catalog backend")]
struct Args {
    /// Deployment stage, only used for logging
    #[arg(long, default_value = "localhost")]
    stage: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    server::start_server(&args.stage).await
}

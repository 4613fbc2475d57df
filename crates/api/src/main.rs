use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use fastblog_apiserver::config::ServerOptions;
use fastblog_apiserver::server::UnionServer;
use fastblog_apiserver::version::VersionFlag;

/// A mini blog API server serving users and posts.
#[derive(Debug, Parser)]
#[command(name = "fb-apiserver", disable_version_flag = true)]
struct Cli {
    /// Path to the config file. Searches $HOME/.fastblog, . and ./configs
    /// for fb-apiserver.yaml when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print version information and quit (`--version=raw` for all build facts).
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true", value_name = "true|false|raw")]
    version: Option<VersionFlag>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(text) = cli.version.and_then(VersionFlag::render) {
        println!("{text}");
        return Ok(());
    }

    let opts = ServerOptions::load(cli.config.as_deref()).context("failed to load configuration")?;
    fastblog_observability::init(&opts.log);

    let server = UnionServer::new(&opts).await.context("failed to create server")?;
    server.run().await.context("server terminated with an error")?;

    Ok(())
}

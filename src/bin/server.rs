use clap::Parser;
use zipdis::{config::Config, server, Error};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::parse();

    server::run(config).await
}

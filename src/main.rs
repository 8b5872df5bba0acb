mod logger;
mod server;

use std::error::Error;

use server::BalanceServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    logger::init();

    let mut server = BalanceServer::new(tokio::io::stdin(), tokio::io::stdout());
    server.run().await?;
    Ok(())
}

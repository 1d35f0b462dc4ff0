use mongodb::error::Error;
use mongodb::{options::ClientOptions, Client};

pub async fn init_db(uri: &str) -> Result<Client, Error> {
    let mut client_options = ClientOptions::parse(uri).await?;
    client_options.app_name = Some("AssetHub".to_string());
    Client::with_options(client_options)
}

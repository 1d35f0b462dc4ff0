use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use dotenv::dotenv;
use env_logger;

mod config;
mod controllers;
mod db;
mod models;
mod routes;
mod services;
mod state;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file (if exists)
    dotenv().ok();
    env_logger::init();

    // SECRET_KEY signs session tokens; refuse to start without it.
    std::env::var("SECRET_KEY").expect("SECRET_KEY must be set");

    // Read configuration (server host/port, MongoDB, SMTP, ImageKit)
    let config = config::Config::from_env();

    // Initialize MongoDB client
    let db_client = db::init_db(&config.mongo_uri)
        .await
        .expect("Failed to connect to MongoDB");

    // Get handles to the database collections
    let db = db_client.database(&config.mongo_db_name);
    let users_collection = db.collection::<models::user::UserModel>("users");
    let listings_collection = db.collection::<models::listing::ListingModel>("listings");
    let bids_collection = db.collection::<models::bid::BidModel>("bids");

    let mailer = services::email_service::Mailer::from_config(&config)
        .expect("Failed to configure SMTP mailer");

    let imagekit = match (
        &config.imagekit_public_key,
        &config.imagekit_private_key,
        &config.imagekit_url_endpoint,
    ) {
        (Some(public_key), Some(private_key), Some(url_endpoint)) => Some(state::ImageKitKeys {
            public_key: public_key.clone(),
            private_key: private_key.clone(),
            url_endpoint: url_endpoint.clone(),
        }),
        _ => {
            log::warn!("ImageKit keys not configured; upload handshake disabled");
            None
        }
    };

    // Create the shared application state.
    let app_state = state::AppState {
        users_collection,
        listings_collection,
        bids_collection,
        mailer,
        imagekit,
    };

    // Build and run the HTTP server.
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default()) // Logging middleware
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            ) // CORS setup
            .app_data(web::Data::new(app_state.clone()))
            .configure(routes::init) // Registers your routes from routes/mod.rs
    })
    .bind((config.server_host, config.server_port))?
    .run()
    .await
}

// src/main.rs
use dotenvy::dotenv;

#[tokio::main]
async fn main() {
    dotenv().ok();
    survey_backend::start_server().await;
}

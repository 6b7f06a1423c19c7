mod cli;
mod infra;
mod routes;
mod server;

use cliro::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}

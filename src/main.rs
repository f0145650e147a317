// src/main.rs

use migcheck::{cli, logging};

#[tokio::main]
async fn main() {
    let _args = cli::parse();

    if let Err(err) = logging::init_logging() {
        eprintln!("migcheck error: failed to initialise logging: {err:?}");
        std::process::exit(1);
    }

    if let Err(err) = migcheck::run().await {
        eprintln!("migcheck error: {err}");
        std::process::exit(err.exit_code());
    }
}

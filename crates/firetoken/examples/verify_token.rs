//! Run with
//!
//! ```not_rust
//! RUST_LOG=firetoken=debug cargo run --example verify_token -- <project-id> <id-token>
//! ```

use firetoken::Verifier;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "firetoken=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(project), Some(token)) = (args.next(), args.next()) else {
        eprintln!("usage: verify_token <project-id> <id-token>");
        std::process::exit(2);
    };

    let verifier = Verifier::new(project);

    match verifier.verify(&token).await {
        Ok(verification) => {
            tracing::info!(is_valid = verification.is_valid, "verification complete");
            for (claim, value) in verification.payload.iter() {
                println!("{claim}: {value:?}");
            }
            if !verification.is_valid {
                std::process::exit(1);
            }
        }
        Err(e) => {
            tracing::warn!("token rejected: {e}");
            std::process::exit(1);
        }
    }
}

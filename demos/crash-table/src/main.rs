//! A runnable crash-game table with a few seeded demo accounts.
//!
//! Connect with any WebSocket client:
//!
//! ```text
//! websocat ws://127.0.0.1:8080
//! {"type":"get_balance","user_id":1}
//! {"type":"place_bet","user_id":1,"amount":20.0}
//! {"type":"cash_out","user_id":1}
//! ```

use skylift::{Ledger, SkyliftServer, UserId};

/// Demo accounts seeded at startup: users 1-3, 100.00 each.
const DEMO_ACCOUNTS: [(u64, f64); 3] = [(1, 100.0), (2, 100.0), (3, 100.0)];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let server = SkyliftServer::builder().bind("0.0.0.0:8080").build().await?;

    for (user, amount) in DEMO_ACCOUNTS {
        server.ledger().credit(UserId(user), amount)?;
        tracing::info!(user, amount, "demo account seeded");
    }

    server.run().await?;
    Ok(())
}

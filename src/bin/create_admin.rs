//! Bootstrap an administrator account so the first login is possible.

use clap::Parser;
use rust_decimal::Decimal;

use tradejournal::api::auth::hash_password;
use tradejournal::db::{self, user_repo};
use tradejournal::models::Role;

#[derive(Parser, Debug)]
#[command(name = "create-admin", about = "Create an administrator account")]
struct Args {
    #[arg(long)]
    username: String,

    #[arg(long)]
    email: String,

    #[arg(long, env = "ADMIN_PASSWORD")]
    password: String,

    #[arg(long, default_value = "1000")]
    initial_capital: Decimal,

    /// Defaults to the DATABASE_URL environment variable.
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    if args.password.is_empty() {
        anyhow::bail!("password must not be empty");
    }

    let pool = db::init_pool(&args.database_url).await?;
    db::run_migrations(&pool).await?;

    if user_repo::identity_taken(&pool, &args.username, &args.email, None).await? {
        tracing::warn!(username = %args.username, "User already exists, nothing to do");
        return Ok(());
    }

    let hashed = hash_password(&args.password)?;
    let user = user_repo::create_user(
        &pool,
        &args.username,
        &args.email,
        &hashed,
        Role::Admin,
        args.initial_capital,
    )
    .await?;

    tracing::info!(id = %user.id, username = %user.username, "Administrator created");
    Ok(())
}

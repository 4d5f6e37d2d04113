use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rand::RngCore;
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use netprov::config::Config;
use netprov::db::{self, AppState, queries};
use netprov::handlers;
use netprov::remote::ProvisioningClient;
use netprov::token::TokenKey;

#[derive(Parser)]
#[command(name = "netprov", version, about = "Router provisioning service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service (default)
    Serve,
    /// Create a tenant and print its API key
    AddTenant { slug: String },
    /// Generate fresh hex key material for TOKEN_KEY
    GenKey,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "netprov=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match Cli::parse().command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::AddTenant { slug } => add_tenant(&slug),
        Command::GenKey => {
            let mut material = [0u8; 32];
            rand::rngs::OsRng.fill_bytes(&mut material);
            println!("{}", hex::encode(material));
            Ok(())
        }
    }
}

async fn serve() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let token_key = TokenKey::from_hex(&config.token_key)?;

    let pool = db::init_pool(&config.database_path)?;
    let conn = pool.get()?;
    db::init_schema(&conn)?;
    drop(conn);

    let remote = ProvisioningClient::new(&config.mtk_base_url, &config.mtk_api_key)?;

    // Resolved once for the life of the process; a failed lookup degrades
    // config generation instead of blocking startup.
    let walled_garden_ip = match remote.fetch_server_ip().await {
        Ok(ip) => {
            tracing::info!(ip = ip.as_deref().unwrap_or("<none>"), "VPN server IP resolved");
            ip
        }
        Err(err) => {
            tracing::warn!("could not resolve VPN server IP at startup: {err}");
            None
        }
    };

    let addr = config.addr();
    let state = AppState {
        db: pool,
        config: Arc::new(config),
        remote: Arc::new(remote),
        token_key: Arc::new(token_key),
        walled_garden_ip,
    };

    // The device-facing surface is unauthenticated; rate limit per peer IP.
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(2)
            .burst_size(10)
            .finish()
            .expect("static governor configuration is valid"),
    );

    let app = handlers::router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .layer(GovernorLayer::new(governor_conf)),
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("netprov listening on {addr}");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn add_tenant(slug: &str) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let pool = db::init_pool(&config.database_path)?;
    let conn = pool.get()?;
    db::init_schema(&conn)?;

    let tenant = queries::create_tenant(&conn, slug)?;
    println!("tenant: {}", tenant.slug);
    println!("api key: {}", tenant.api_key);
    Ok(())
}

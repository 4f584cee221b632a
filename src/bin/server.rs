use std::net::{IpAddr, SocketAddr};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use pocket_money::{
    AppState, DefaultUser, PasswordHash, build_router, graceful_shutdown, logging_middleware,
};

/// The REST API server for pocket_money.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The IP address to serve the API from.
    #[arg(short, long, default_value = "127.0.0.1")]
    address: IpAddr,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// The username of the account that the app operates on.
    #[arg(long, default_value = DefaultUser::DEFAULT_USERNAME)]
    username: String,

    /// The password given to the account when it is first created.
    #[arg(long, env = "POCKET_MONEY_PASSWORD", default_value = "password123")]
    password: String,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let addr = SocketAddr::from((args.address, args.port));

    let password_hash = PasswordHash::from_raw_password(&args.password, PasswordHash::DEFAULT_COST)
        .expect("Could not hash the default user's password");
    let default_user = DefaultUser::new(&args.username, password_hash);

    let conn = Connection::open(&args.db_path).expect("Could not open the database");
    let app_state =
        AppState::new(conn, default_user).expect("Could not initialize the database");

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(
        build_router(app_state).layer(middleware::from_fn(logging_middleware)),
    );

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .expect("The server stopped unexpectedly");
}

/// Log to stdout, filtered by `RUST_LOG` and defaulting to the `info` level.
fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are already logged by the route handlers.
        .on_failure(());

    router.layer(tracing_layer)
}

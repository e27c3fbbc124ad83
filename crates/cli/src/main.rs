//! Mindoro Auto Parts CLI - drive the client core from a terminal.
//!
//! State is persisted under `MINDORO_DATA_DIR` between invocations, so a
//! `login` followed by `navigate` behaves like a browser session.
//!
//! # Usage
//!
//! ```bash
//! # Log in with a backend session token
//! mindoro-cli login --token eyJhbGciOi...
//!
//! # Check where a navigation would land
//! mindoro-cli navigate /admin/dashboard
//!
//! # Ring up a cart and start a register session
//! mindoro-cli cart add --id 12 --name "Oil filter" --price 215.50 --quantity 2
//! mindoro-cli pos start --initial-cash 1500 --notes "Morning shift"
//! ```
//!
//! # Commands
//!
//! - `navigate` - Run the route guard for a path
//! - `login` / `register` / `logout` / `whoami` - Session management
//! - `cart` - Cart operations and checkout
//! - `pos` - Register sessions and orders
//! - `products` - Inventory listings

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mindoro_client::api::RegistrationForm;
use mindoro_client::{ClientConfig, ClientError};

mod commands;

#[derive(Parser)]
#[command(name = "mindoro-cli")]
#[command(author, version, about = "Mindoro Auto Parts client CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide whether the current session may open a path
    Navigate {
        /// Target path, e.g. `/admin/pos/S1?tab=cart`
        path: String,
    },
    /// Log in
    Login {
        /// Backend session token (JWT)
        #[arg(long, conflicts_with = "id_token", required_unless_present = "id_token")]
        token: Option<String>,

        /// Identity-provider token to exchange at the backend
        #[arg(long)]
        id_token: Option<String>,

        /// Push-notification device token to register
        #[arg(long)]
        fcm_token: Option<String>,
    },
    /// Register a customer account
    Register {
        #[arg(long)]
        email: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long, default_value = "")]
        phone_number: String,

        /// Identity-provider account id
        #[arg(long)]
        firebase_id: String,
    },
    /// Log out and erase the stored session
    Logout,
    /// Show the current session
    Whoami,
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage register sessions
    Pos {
        #[command(subcommand)]
        action: PosAction,
    },
    /// List products
    Products {
        /// Only products at or below their ideal stock count
        #[arg(long)]
        low_stock: bool,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart contents
    Show,
    /// Add a product (merges with an existing line)
    Add {
        #[arg(long)]
        id: i64,

        #[arg(short, long, default_value = "")]
        name: String,

        /// Unit price in pesos
        #[arg(short, long)]
        price: Decimal,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set the quantity of a line
    Set {
        #[arg(long)]
        id: i64,

        #[arg(short, long)]
        quantity: u32,
    },
    /// Remove a line
    Remove {
        #[arg(long)]
        id: i64,
    },
    /// Empty the cart
    Clear,
    /// Place an order for the cart contents
    Checkout,
}

#[derive(Subcommand)]
enum PosAction {
    /// Start a register session
    Start {
        /// Cash in the drawer at opening
        #[arg(long)]
        initial_cash: String,

        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Show the register state
    Status,
    /// List register sessions
    Sessions,
    /// Show one register session
    Details {
        session_id: String,
    },
    /// Open a new order in a session
    NewOrder {
        session_id: String,
    },
    /// Reset the register state
    Reset,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = ClientConfig::from_env();

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mindoro_client=info,mindoro_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), ClientError> {
    let mut ctx = commands::Context::open(config)?;

    match cli.command {
        Commands::Navigate { path } => commands::navigate::run(&mut ctx, &path),
        Commands::Login {
            token,
            id_token,
            fcm_token,
        } => {
            commands::auth::login(&mut ctx, token, id_token, fcm_token.as_deref()).await?;
        }
        Commands::Register {
            email,
            first_name,
            last_name,
            phone_number,
            firebase_id,
        } => {
            let form = RegistrationForm {
                email,
                first_name,
                last_name,
                phone_number,
                firebase_id,
                ..RegistrationForm::default()
            };
            commands::auth::register(&ctx, &form).await?;
        }
        Commands::Logout => commands::auth::logout(&mut ctx),
        Commands::Whoami => commands::auth::whoami(&ctx),
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&ctx),
            CartAction::Add {
                id,
                name,
                price,
                quantity,
            } => commands::cart::add(&mut ctx, id, name, price, quantity),
            CartAction::Set { id, quantity } => commands::cart::set_quantity(&mut ctx, id, quantity),
            CartAction::Remove { id } => commands::cart::remove(&mut ctx, id),
            CartAction::Clear => commands::cart::clear(&mut ctx),
            CartAction::Checkout => commands::cart::checkout(&mut ctx).await?,
        },
        Commands::Pos { action } => match action {
            PosAction::Start {
                initial_cash,
                notes,
            } => commands::pos::start(&mut ctx, initial_cash, notes).await?,
            PosAction::Status => commands::pos::status(&ctx),
            PosAction::Sessions => commands::pos::sessions(&mut ctx).await?,
            PosAction::Details { session_id } => {
                commands::pos::details(&mut ctx, session_id).await?;
            }
            PosAction::NewOrder { session_id } => {
                commands::pos::new_order(&mut ctx, session_id).await?;
            }
            PosAction::Reset => commands::pos::reset(&mut ctx),
        },
        Commands::Products { low_stock } => commands::products::list(&mut ctx, low_stock).await?,
    }

    ctx.close();
    Ok(())
}

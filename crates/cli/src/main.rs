//! Shopstate CLI - Inspect and edit persisted shopping state.
//!
//! # Usage
//!
//! ```bash
//! # Add two mugs to the cart
//! shop-cli --data-dir ./state cart add mug-01 --name "Mug" --price 12.50 --qty 2
//!
//! # Show the cart
//! shop-cli --data-dir ./state cart list
//!
//! # Favorite a product, then move it to the cart
//! shop-cli --data-dir ./state favorites toggle tee-02 --name "Tee" --price 20
//! shop-cli --data-dir ./state favorites to-cart tee-02
//!
//! # Upload product images
//! SHOPSTATE_UPLOAD_URL=https://uploads.example.com/images shop-cli upload a.png b.jpg
//! ```
//!
//! # Commands
//!
//! - `cart add|list|set-qty|remove|clear` - Edit the cart
//! - `favorites toggle|list|to-cart` - Edit the favorites list
//! - `upload` - Upload images and print their URLs

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use shopstate_core::{Price, ProductId, ProductRef};
use shopstate_engine::{EngineConfig, ShopContext};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "shop-cli")]
#[command(author, version, about = "Shopstate CLI tools")]
struct Cli {
    /// Storage directory (overrides `SHOPSTATE_DATA_DIR`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Edit the favorites list
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// Upload image files and print the returned URLs
    Upload {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Add a product, merging with an existing line
    Add {
        #[command(flatten)]
        product: ProductArgs,

        /// Quantity to add (clamped to 1..=99)
        #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
        qty: i64,
    },
    /// Show cart lines and the subtotal
    List {
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set a line's quantity; zero or less removes it
    SetQty {
        id: ProductId,
        #[arg(allow_negative_numbers = true)]
        qty: i64,
    },
    /// Remove a line
    Remove { id: ProductId },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum FavoritesAction {
    /// Add a product if absent, remove it if present
    Toggle {
        #[command(flatten)]
        product: ProductArgs,
    },
    /// Show favorites
    List {
        /// Print the entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Move a favorite into the cart
    ToCart {
        id: ProductId,

        /// Quantity to add (clamped to 1..=99)
        #[arg(short, long, default_value_t = 1)]
        qty: i64,
    },
}

/// Catalog fields of a product given on the command line.
#[derive(Args)]
struct ProductArgs {
    /// Catalog product ID
    id: ProductId,

    /// Display name
    #[arg(short, long)]
    name: String,

    /// Unit price in major units, e.g. 19.99
    #[arg(short, long)]
    price: Price,

    /// Image URL
    #[arg(long, default_value = "")]
    image: String,

    /// Brand
    #[arg(long, default_value = "")]
    brand: String,

    /// Category
    #[arg(long, default_value = "")]
    category: String,
}

impl ProductArgs {
    fn into_product(self) -> ProductRef {
        ProductRef::new(self.id, self.name, self.price)
            .with_image(self.image)
            .with_brand(self.brand)
            .with_category(self.category)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match EngineConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(false);
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };
    init_tracing(config.log_json);

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing with an env filter and plain or JSON output.
fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopstate_cli=info,shopstate_engine=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

async fn run(cli: Cli, mut config: EngineConfig) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }

    match cli.command {
        Commands::Cart { action } => {
            let ctx = commands::open_durable(config)?;
            match action {
                CartAction::Add { product, qty } => {
                    commands::cart::add(&ctx, &product.into_product(), qty);
                }
                CartAction::List { json } => commands::cart::list(&ctx, json)?,
                CartAction::SetQty { id, qty } => commands::cart::set_quantity(&ctx, &id, qty)?,
                CartAction::Remove { id } => commands::cart::remove(&ctx, &id)?,
                CartAction::Clear => commands::cart::clear(&ctx),
            }
            commands::finish(ctx);
        }
        Commands::Favorites { action } => {
            let ctx = commands::open_durable(config)?;
            match action {
                FavoritesAction::Toggle { product } => {
                    commands::favorites::toggle(&ctx, &product.into_product());
                }
                FavoritesAction::List { json } => commands::favorites::list(&ctx, json)?,
                FavoritesAction::ToCart { id, qty } => {
                    commands::favorites::to_cart(&ctx, &id, qty)?;
                }
            }
            commands::finish(ctx);
        }
        Commands::Upload { files } => {
            let ctx = ShopContext::init(config);
            let result = commands::upload::images(&ctx, &files).await;
            commands::finish(ctx);
            result?;
        }
    }
    Ok(())
}

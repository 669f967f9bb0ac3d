//! `storefront` - command-line front end of the product registry.
//!
//! Each invocation restores the stored session, runs one command against the registry,
//! the cart or the wishlist, and shuts the system down again.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use storefront_registry::catalog::{BrowseQuery, CatalogQuery, SortField, SortOrder, SortSpec};
use storefront_registry::config::StorefrontConfig;
use storefront_registry::http::ApiClient;
use storefront_registry::lifecycle::{setup_tracing, StorefrontSystem};
use storefront_registry::model::{Credentials, Product, ProductDraft, ProductId, ProductPatch};
use storefront_registry::storage::{FileStore, KeyValueStore};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "storefront")]
#[command(about = "Browse the demo catalog and manage your own products", long_about = None)]
struct Args {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Directory of the local store (overrides STOREFRONT_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// API base URL (overrides STOREFRONT_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and switch to your own product partition
    Login { username: String, password: String },
    /// Sign out; the guest partition becomes active
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List the products of the active partition
    Products {
        /// Only products created on this device
        #[arg(long)]
        local: bool,
        /// Fetch the remote catalog first
        #[arg(long)]
        refresh: bool,
    },
    /// Replace the remote part of the registry with a fresh catalog page
    Refresh {
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        skip: Option<u32>,
        #[arg(long)]
        sort: Option<SortField>,
        #[arg(long, default_value = "asc")]
        order: SortOrder,
    },
    /// Show one product
    Show { id: String },
    /// Create a local product
    Create {
        title: String,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        stock: Option<u32>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        brand: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Change fields of a product
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        stock: Option<u32>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        brand: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Remove a product from the registry
    Delete { id: String },
    /// Search the registry (remote hits first, then local matches)
    Search { query: String },
    /// Browse the remote catalog
    Browse {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        sort: Option<SortField>,
        #[arg(long, default_value = "asc")]
        order: SortOrder,
    },
    /// List the remote categories
    Categories,
    #[command(subcommand)]
    Wishlist(WishlistCommand),
    #[command(subcommand)]
    Cart(CartCommand),
}

#[derive(Subcommand, Debug)]
enum WishlistCommand {
    Add { id: String },
    Remove { id: String },
    List,
}

#[derive(Subcommand, Debug)]
enum CartCommand {
    Add {
        id: String,
        #[arg(default_value_t = 1)]
        quantity: u32,
    },
    Remove { id: String },
    Set { id: String, quantity: u32 },
    Clear,
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_tracing(&args.log_level);

    let mut config = StorefrontConfig::from_env()?;
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(url) = args.api_url {
        config.api_base_url = url;
    }
    // One command per process: refreshes happen only when asked for.
    config.registry.refresh_on_load = false;
    debug!(?config, "Configuration");

    let store: Arc<dyn KeyValueStore> = Arc::new(
        FileStore::open(&config.data_dir)
            .with_context(|| format!("opening store at {}", config.data_dir.display()))?,
    );
    let api = Arc::new(ApiClient::from_config(&config, store.clone())?);
    let system = StorefrontSystem::new(config.registry.clone(), store, api.clone(), api);

    let outcome = run(&system, args.command).await;
    system.shutdown().await?;
    outcome
}

async fn run(system: &StorefrontSystem, command: Command) -> Result<()> {
    if !matches!(command, Command::Login { .. }) {
        system.restore().await?;
    }

    match command {
        Command::Login { username, password } => {
            let profile = system.login(Credentials::new(username, password)).await?;
            info!(user = %profile.id, "Signed in");
            println!("Signed in as {} ({})", profile.display_name(), profile.username);
        }
        Command::Logout => {
            system.logout().await?;
            println!("Signed out");
        }
        Command::Whoami => match system.auth.profile()? {
            Some(profile) => println!(
                "{} ({}) id={}",
                profile.display_name(),
                profile.username,
                profile.id
            ),
            None => println!("guest"),
        },
        Command::Products { local, refresh } => {
            if refresh {
                system.registry.refresh_remote(CatalogQuery::default()).await?;
            }
            let products = if local {
                system.registry.local_products().await?
            } else {
                system.registry.products().await?
            };
            print_products(&products);
        }
        Command::Refresh {
            limit,
            skip,
            sort,
            order,
        } => {
            let query = CatalogQuery {
                limit,
                skip,
                sort_by: sort,
                order: sort.map(|_| order),
            };
            let size = system.registry.refresh_remote(query).await?;
            println!("{size} products");
        }
        Command::Show { id } => match system.registry.get(ProductId::new(id.clone())).await? {
            Some(product) => println!("{}", serde_json::to_string_pretty(&product)?),
            None => bail!("no product with id {id}"),
        },
        Command::Create {
            title,
            price,
            stock,
            category,
            brand,
            description,
        } => {
            let draft = ProductDraft {
                title,
                price,
                stock,
                category,
                brand,
                description,
                ..ProductDraft::default()
            };
            let product = system.registry.create(draft).await?;
            println!("Created {}", product.id);
        }
        Command::Update {
            id,
            title,
            price,
            stock,
            category,
            brand,
            description,
        } => {
            let patch = ProductPatch {
                title,
                price,
                stock,
                category,
                brand,
                description,
                ..ProductPatch::default()
            };
            let product = system.registry.update(ProductId::new(id), patch).await?;
            print_products(std::slice::from_ref(&product));
        }
        Command::Delete { id } => {
            system.registry.delete(ProductId::new(id.clone())).await?;
            println!("Deleted {id}");
        }
        Command::Search { query } => {
            print_products(&system.registry.search(&query).await?);
        }
        Command::Browse {
            search,
            category,
            sort,
            order,
        } => {
            let query = BrowseQuery {
                search,
                category,
                sort: sort.map(|field| SortSpec::new(field, order)),
            };
            print_products(&system.browse(&query).await?);
        }
        Command::Categories => {
            for category in system.categories().await? {
                println!("{:<24} {}", category.slug, category.name);
            }
        }
        Command::Wishlist(command) => wishlist(system, command).await?,
        Command::Cart(command) => cart(system, command).await?,
    }
    Ok(())
}

async fn wishlist(system: &StorefrontSystem, command: WishlistCommand) -> Result<()> {
    let mut wishlist = system.wishlist()?;
    match command {
        WishlistCommand::Add { id } => {
            let product = lookup(system, &id).await?;
            if wishlist.add(product)? {
                println!("Added {id} to the wishlist");
            } else {
                println!("{id} is already on the wishlist");
            }
        }
        WishlistCommand::Remove { id } => {
            if !wishlist.remove(&ProductId::new(id.clone()))? {
                bail!("{id} is not on the wishlist");
            }
            println!("Removed {id}");
        }
        WishlistCommand::List => print_products(wishlist.items()),
    }
    Ok(())
}

async fn cart(system: &StorefrontSystem, command: CartCommand) -> Result<()> {
    let mut cart = system.cart()?;
    match command {
        CartCommand::Add { id, quantity } => {
            let product = lookup(system, &id).await?;
            cart.add(product, quantity)?;
            println!("{} items in the cart", cart.count());
        }
        CartCommand::Remove { id } => {
            if !cart.remove(&ProductId::new(id.clone()))? {
                bail!("{id} is not in the cart");
            }
            println!("Removed {id}");
        }
        CartCommand::Set { id, quantity } => {
            if !cart.set_quantity(&ProductId::new(id.clone()), quantity)? {
                bail!("{id} is not in the cart");
            }
            println!("{} items in the cart", cart.count());
        }
        CartCommand::Clear => {
            cart.clear()?;
            println!("Cart cleared");
        }
        CartCommand::Show => {
            for item in cart.items() {
                println!(
                    "{:<28} {:>4} x {:>9.2} = {:>9.2}",
                    item.product.id,
                    item.quantity,
                    item.product.price,
                    item.line_total()
                );
            }
            let summary = cart.summary();
            println!("subtotal {:>10.2}", summary.subtotal);
            println!("shipping {:>10.2}", summary.shipping);
            println!("tax      {:>10.2}", summary.tax);
            println!("total    {:>10.2}", summary.total);
        }
    }
    Ok(())
}

/// Resolves an id against the registry first, then the remote catalog.
async fn lookup(system: &StorefrontSystem, id: &str) -> Result<Product> {
    let id = ProductId::new(id);
    if let Some(product) = system.registry.get(id.clone()).await? {
        return Ok(product);
    }
    system
        .catalog()
        .product(&id)
        .await?
        .normalize()
        .with_context(|| format!("product {id} has no usable data"))
}

fn print_products(products: &[Product]) {
    for product in products {
        println!(
            "{:<28} {:<6} {:>9.2} {:>5}  {}",
            product.id, product.origin, product.price, product.stock, product.title
        );
    }
    println!("{} products", products.len());
}

//! storefront - command-line front end for the commerce state core
//!
//! Every invocation wires the components together, runs one command and
//! exits:
//! - Configuration loading
//! - Durable store initialization
//! - Store rehydration (session, cart, favorites, orders)
//! - Product catalog client

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use storefront_api::{CartItem, Order, Product, ProfileUpdate, SessionState};
use storefront_catalog::CatalogClient;
use storefront_config::{Settings, load_config_or_default};
use storefront_core::{CoreError, Mutation, Storefront};
use storefront_store::{KeyValueStore, SqliteStore};
use storefront_util::{
    DATABASE_FILENAME, ProductId, default_config_path, format_order_date, format_price,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// storefront - browse products, manage a cart and place orders
#[derive(Parser, Debug)]
#[command(name = "storefront")]
#[command(about = "Browse products, manage a cart and place orders", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/storefront/config.toml)
    #[arg(short, long, global = true, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set STOREFRONT_DATA_DIR env var)
    #[arg(short, long, global = true, env = "STOREFRONT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with a demo account
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Update profile fields
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    /// List catalog products, newest first
    Products {
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Show one catalog product
    Product { id: u64 },
    /// Manage the cart
    #[command(subcommand)]
    Cart(CartCommand),
    /// Manage favorites
    #[command(subcommand)]
    Favorites(FavoritesCommand),
    /// Order history and checkout
    #[command(subcommand)]
    Orders(OrdersCommand),
}

#[derive(Subcommand, Debug)]
enum CartCommand {
    List,
    Add { id: u64 },
    Remove { id: u64 },
    Clear,
}

#[derive(Subcommand, Debug)]
enum FavoritesCommand {
    List,
    Toggle { id: u64 },
    Clear,
}

#[derive(Subcommand, Debug)]
enum OrdersCommand {
    List,
    Show { id: String },
    /// Turn the cart into an order
    Place,
    Clear,
    /// Reload history from storage
    Refresh,
}

/// One-shot application state
struct App {
    storefront: Storefront,
    settings: Settings,
}

impl App {
    async fn open(args: &Args) -> Result<Self> {
        let mut settings = load_config_or_default(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        if let Some(data_dir) = &args.data_dir {
            settings.storage.data_dir = data_dir.clone();
        }

        debug!(
            config_path = %args.config.display(),
            data_dir = %settings.storage.data_dir.display(),
            key_scope = ?settings.storage.key_scope,
            "Configuration loaded"
        );

        std::fs::create_dir_all(&settings.storage.data_dir).with_context(|| {
            format!(
                "Failed to create data directory {:?}",
                settings.storage.data_dir
            )
        })?;

        let db_path = settings.storage.data_dir.join(DATABASE_FILENAME);
        let kv: Arc<dyn KeyValueStore> = Arc::new(
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open store at {:?}", db_path))?,
        );

        if !kv.is_healthy() {
            warn!(path = %db_path.display(), "Store reports unhealthy");
        }

        let storefront = Storefront::open(kv, settings.storage.key_scope).await;
        Ok(Self {
            storefront,
            settings,
        })
    }

    fn catalog(&self) -> Result<CatalogClient> {
        CatalogClient::new(&self.settings.catalog).context("Failed to create catalog client")
    }

    async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Login { email, password } => self.login(&email, &password).await,
            Command::Logout => {
                self.storefront.logout().await;
                println!("Signed out");
                Ok(())
            }
            Command::Whoami => {
                self.whoami();
                Ok(())
            }
            Command::Profile { name, address } => self.update_profile(name, address).await,
            Command::Products { page } => self.list_products(page).await,
            Command::Product { id } => self.show_product(ProductId::new(id)).await,
            Command::Cart(cmd) => self.cart(cmd).await,
            Command::Favorites(cmd) => self.favorites(cmd).await,
            Command::Orders(cmd) => self.orders(cmd).await,
        }
    }

    async fn login(&self, email: &str, password: &str) -> Result<()> {
        match self.storefront.login(email, password).await {
            Ok(user) => {
                println!("Welcome, {}", user.name);
                Ok(())
            }
            Err(CoreError::InvalidCredentials) => bail!("Invalid email or password"),
            Err(e) => Err(e).context("Login failed"),
        }
    }

    fn whoami(&self) {
        match self.storefront.session().state() {
            SessionState::Authenticated(user) => {
                println!("{} <{}>", user.name, user.email);
                if let Some(address) = user.address.as_deref().filter(|a| !a.is_empty()) {
                    println!("Address: {}", address);
                }
            }
            _ => println!("Not signed in"),
        }
    }

    async fn update_profile(&self, name: Option<String>, address: Option<String>) -> Result<()> {
        let update = ProfileUpdate { name, address };
        if update.is_empty() {
            bail!("Nothing to update: pass --name and/or --address");
        }

        match self
            .storefront
            .update_profile(update)
            .await
            .context("Failed to update profile")?
        {
            Some(user) => {
                println!("Profile updated for {}", user.email);
                Ok(())
            }
            None => bail!("Not signed in"),
        }
    }

    async fn list_products(&self, page: usize) -> Result<()> {
        let catalog = self.catalog()?;
        let products = catalog
            .fetch_products(page, catalog.page_size())
            .await
            .context("Failed to fetch products")?;

        if products.is_empty() {
            println!("No products on page {}", page);
        }
        for product in &products {
            print_product_line(product, self.storefront.favorites().is_favorite(product.id));
        }
        Ok(())
    }

    async fn show_product(&self, id: ProductId) -> Result<()> {
        let product = self
            .catalog()?
            .fetch_product(id)
            .await
            .with_context(|| format!("Failed to fetch product {}", id))?;

        print_product_line(&product, self.storefront.favorites().is_favorite(id));
        if !product.category.is_empty() {
            println!("  Category: {}", product.category);
        }
        if let Some(rating) = product.rating {
            println!("  Rating: {:.1} ({} reviews)", rating.rate, rating.count);
        }
        if !product.description.is_empty() {
            println!("  {}", product.description);
        }
        Ok(())
    }

    async fn cart(&self, cmd: CartCommand) -> Result<()> {
        let cart = self.storefront.cart();
        match cmd {
            CartCommand::List => {
                print_items(&cart.items());
                println!("Total: ${}", format_price(cart.total_price()));
            }
            CartCommand::Add { id } => {
                let product = self
                    .catalog()?
                    .fetch_product(ProductId::new(id))
                    .await
                    .with_context(|| format!("Failed to fetch product {}", id))?;
                let added = durable(cart.add_to_cart(product.to_line_item()).await)?;
                if added {
                    println!("Added \"{}\" to cart", product.title);
                } else {
                    println!("\"{}\" is already in the cart", product.title);
                }
            }
            CartCommand::Remove { id } => {
                if durable(cart.remove_from_cart(ProductId::new(id)).await)? {
                    println!("Removed product {} from cart", id);
                } else {
                    println!("Product {} is not in the cart", id);
                }
            }
            CartCommand::Clear => {
                durable(cart.clear_cart().await)?;
                println!("Cart cleared");
            }
        }
        Ok(())
    }

    async fn favorites(&self, cmd: FavoritesCommand) -> Result<()> {
        let favorites = self.storefront.favorites();
        match cmd {
            FavoritesCommand::List => {
                let ids = favorites.favorites();
                if ids.is_empty() {
                    println!("No favorites");
                }
                for id in ids {
                    println!("{}", id);
                }
            }
            FavoritesCommand::Toggle { id } => {
                let now_favorite = durable(
                    favorites
                        .toggle_favorite(ProductId::new(id))
                        .await
                        .map_err(not_signed_in)?,
                )?;
                if now_favorite {
                    println!("Product {} added to favorites", id);
                } else {
                    println!("Product {} removed from favorites", id);
                }
            }
            FavoritesCommand::Clear => {
                durable(favorites.clear_favorites().await)?;
                println!("Favorites cleared");
            }
        }
        Ok(())
    }

    async fn orders(&self, cmd: OrdersCommand) -> Result<()> {
        let orders = self.storefront.orders();
        match cmd {
            OrdersCommand::List => {
                let history = orders.orders();
                if history.is_empty() {
                    println!("No orders");
                }
                for order in &history {
                    print_order_summary(order);
                }
            }
            OrdersCommand::Show { id } => match orders.get_order_by_id(&id) {
                Some(order) => {
                    print_order_summary(&order);
                    print_items(&order.items);
                }
                None => bail!("Order {} not found", id),
            },
            OrdersCommand::Place => {
                let order = match self.storefront.place_order().await {
                    Ok(placed) => durable(placed)?,
                    Err(CoreError::EmptyCart) => bail!("Cart is empty"),
                    Err(e) => return Err(not_signed_in(e)),
                };
                println!(
                    "Order placed! Reference #{} (${})",
                    order.id.short(),
                    format_price(order.total_price)
                );
            }
            OrdersCommand::Clear => {
                durable(orders.clear_orders().await)?;
                println!("Order history cleared");
            }
            OrdersCommand::Refresh => {
                orders
                    .refresh_orders()
                    .await
                    .context("Failed to reload orders")?;
                println!("{} orders", orders.orders().len());
            }
        }
        Ok(())
    }
}

/// A one-shot process must not exit with an unsaved mutation
fn durable<T>(mutation: Mutation<T>) -> Result<T> {
    mutation
        .into_result()
        .context("Change applied but could not be saved")
}

fn not_signed_in(e: CoreError) -> anyhow::Error {
    match e {
        CoreError::NoActiveSession => anyhow::anyhow!("Not signed in"),
        other => other.into(),
    }
}

fn print_product_line(product: &Product, favorite: bool) {
    println!(
        "{:>4}  {}{}  ${}{}",
        product.id.get(),
        if favorite { "* " } else { "" },
        product.title,
        format_price(product.price),
        if product.is_top_rated() { "  [top rated]" } else { "" }
    );
}

fn print_items(items: &[CartItem]) {
    if items.is_empty() {
        println!("(no items)");
    }
    for item in items {
        println!("{:>4}  {}  ${}", item.id.get(), item.title, format_price(item.price));
    }
}

fn print_order_summary(order: &Order) {
    println!(
        "{}  {}  {} items  ${}  {}",
        order.id,
        format_order_date(&order.date),
        order.item_count(),
        format_price(order.total_price),
        order.status
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "storefront starting");

    let app = App::open(&args).await?;
    app.run(args.command).await
}

//! Harbour CLI
//!
//! Runs the storefront engine against a YAML catalog: list products, price a
//! cart, or take a cart through checkout.

use std::{
    io::{self, Write},
    path::PathBuf,
    str::FromStr,
};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use jiff::Timestamp;
use tabled::{builder::Builder, settings::Style};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use harbour::{
    catalog::Catalog,
    checkout::{Checkout, delivery::DeliverySlot, payment::PaymentMethod},
    config::StorefrontConfig,
    fixtures,
    receipt::Receipt,
    session::User,
    store::Store,
};

/// Harbour storefront engine
#[derive(Debug, Parser)]
#[command(name = "harbour", about = "Seafood storefront cart and checkout engine", long_about = None)]
struct Cli {
    /// Storefront configuration file (YAML)
    #[arg(short, long, env = "HARBOUR_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Product catalog file (YAML); the bundled sample catalog when omitted
    #[arg(long, env = "HARBOUR_CATALOG", global = true)]
    catalog: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List catalog products
    Catalog {
        /// Only show products in this category
        #[arg(long)]
        category: Option<String>,

        /// Only show products matching this text
        #[arg(long)]
        search: Option<String>,
    },

    /// Price a cart
    Quote(CartArgs),

    /// Place an order for a cart
    Checkout {
        #[command(flatten)]
        cart: CartArgs,

        /// Payment method (upi, card, netbanking, cod)
        #[arg(long, default_value = "upi")]
        payment: PaymentMethod,

        /// Delivery slot (express, morning, afternoon, evening)
        #[arg(long, default_value = "express")]
        slot: DeliverySlot,
    },
}

#[derive(Debug, Args)]
struct CartArgs {
    /// Cart line as `ID[:VARIANT][:QTY]`; repeat for more lines
    #[arg(short, long = "item", required = true)]
    items: Vec<ItemArg>,

    /// Coupon code
    #[arg(long)]
    coupon: Option<String>,

    /// Pay part of the order from the wallet
    #[arg(long)]
    wallet: bool,
}

#[derive(Debug, Clone)]
struct ItemArg {
    product_id: String,
    variant: Option<String>,
    quantity: u32,
}

impl FromStr for ItemArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let product_id = parts
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| format!("missing product id in {s:?}"))?
            .to_string();

        let (variant, quantity) = match (parts.next(), parts.next()) {
            (None, _) => (None, 1),
            (Some(qty), None) if qty.parse::<u32>().is_ok() => (None, parse_quantity(qty)?),
            (Some(variant), None) => (Some(variant.to_string()), 1),
            (Some(variant), Some(qty)) => (Some(variant.to_string()), parse_quantity(qty)?),
        };

        if parts.next().is_some() {
            return Err(format!("too many parts in {s:?}"));
        }

        Ok(Self {
            product_id,
            variant: variant.filter(|v| !v.is_empty()),
            quantity,
        })
    }
}

fn parse_quantity(qty: &str) -> Result<u32, String> {
    match qty.parse::<u32>() {
        Ok(0) => Err("quantity must be at least 1".to_string()),
        Ok(qty) => Ok(qty),
        Err(err) => Err(format!("invalid quantity {qty:?}: {err}")),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    let config = match &cli.config {
        Some(path) => StorefrontConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => StorefrontConfig::default(),
    };

    let catalog = match &cli.catalog {
        Some(path) => fixtures::load_catalog(path)
            .with_context(|| format!("loading catalog from {}", path.display()))?,
        None => Catalog::sample().context("loading bundled catalog")?,
    };

    debug!(products = catalog.len(), "catalog loaded");

    let mut store = Store::new(catalog, config);
    let mut out = io::stdout().lock();

    match cli.command {
        Command::Catalog { category, search } => {
            list_catalog(&store, category.as_deref(), search.as_deref(), &mut out)
        }
        Command::Quote(cart) => quote(&mut store, &cart, &mut out),
        Command::Checkout {
            cart,
            payment,
            slot,
        } => checkout(&mut store, &cart, payment, slot, &mut out),
    }
}

fn list_catalog(
    store: &Store,
    category: Option<&str>,
    search: Option<&str>,
    out: &mut impl Write,
) -> Result<()> {
    let products: Vec<_> = match (category, search) {
        (_, Some(query)) => store
            .catalog()
            .search(query)
            .into_iter()
            .filter(|product| category.is_none_or(|c| product.category == c))
            .collect(),
        (Some(category), None) => store.catalog().by_category(category).collect(),
        (None, None) => store.catalog().iter().collect(),
    };

    let mut builder = Builder::default();
    builder.push_record(["ID", "Name", "Category", "Price", "Variants", "Stock"]);

    for product in products {
        let variants = product
            .variants
            .iter()
            .map(|variant| format!("{} {}", variant.name, variant.price))
            .collect::<Vec<_>>()
            .join(", ");

        builder.push_record([
            product.id.to_string(),
            product.name.clone(),
            product.category.clone(),
            format!("{}", product.price),
            variants,
            if product.in_stock { "in stock" } else { "sold out" }.to_string(),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::modern_rounded());

    writeln!(out, "{table}")?;

    Ok(())
}

fn sign_in(store: &mut Store) {
    store.set_user(Some(User::new("shopper@example.com", "Shopper")));
}

fn fill_cart(store: &mut Store, cart: &CartArgs) -> Result<()> {
    for item in &cart.items {
        let line = store
            .add_to_cart(&item.product_id, item.variant.as_deref())
            .with_context(|| format!("adding {} to cart", item.product_id))?;
        let key = line.key().clone();

        if item.quantity > 1 {
            let quantity = store
                .cart()
                .line(&key)
                .map_or(item.quantity, |line| {
                    line.quantity().saturating_sub(1).saturating_add(item.quantity)
                });

            store.update_line_quantity(&key, quantity)?;
        }
    }

    Ok(())
}

fn quote(store: &mut Store, cart: &CartArgs, out: &mut impl Write) -> Result<()> {
    if cart.wallet {
        sign_in(store);
    }

    fill_cart(store, cart)?;

    let store: &Store = store;
    let coupon = cart
        .coupon
        .as_deref()
        .map(|code| store.apply_coupon(code))
        .transpose()?;

    let pricing = store.quote_cart(coupon.as_ref(), cart.wallet)?;

    Receipt::new(store.cart().lines(), pricing)
        .with_coupon(coupon.as_ref().map(|coupon| coupon.code()))
        .write_to(&mut *out)?;

    Ok(())
}

fn checkout(
    store: &mut Store,
    cart: &CartArgs,
    payment: PaymentMethod,
    slot: DeliverySlot,
    out: &mut impl Write,
) -> Result<()> {
    sign_in(store);
    fill_cart(store, cart)?;

    let mut checkout = Checkout::start(store, false)?;

    checkout.set_slot(slot);
    checkout.set_payment(payment);
    checkout.set_use_wallet(cart.wallet);

    if let Some(code) = &cart.coupon {
        checkout.apply_coupon(store, code)?;
    }

    let pending = checkout.begin_placement(store)?;
    let now = Timestamp::now();
    let placed = checkout.complete(pending, store, now)?;

    let Some(order) = store.order(placed.order_id.as_str()) else {
        bail!("order {} missing after placement", placed.order_id);
    };

    info!(order_id = %placed.order_id, redirect = %placed.redirect, "order placed");

    Receipt::for_order(order).write_to(&mut *out)?;

    let window = order.cancellation_window(store.config().cancellation_window);

    writeln!(out, " Payment:  {}", order.payment())?;
    writeln!(out, " Delivery: {slot} ({})", slot.window())?;
    writeln!(out, " Cancel within {} ({})", window.clock(now), window.humanized(now))?;
    writeln!(out, " Next:     {}", placed.redirect)?;

    Ok(())
}

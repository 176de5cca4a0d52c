use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use retail_etl::cli_style::{
    flush, get_styles, print_empty_list, print_entity_counts, print_key_value,
    print_key_value_highlight, print_quality_summary, print_section_footer, print_section_header,
    print_success, TableBuilder,
};
use retail_etl::config::{AppConfig, CliConfig, FileConfig};
use retail_etl::document_store::{Review, SqliteDocumentStore};
use retail_etl::pipeline;
use retail_etl::retail_store::{SqliteRetailStore, DEFAULT_MIN_ORDERS, DEFAULT_MIN_SPENT};
use retail_etl::transform::OrderGrouping;
use retail_etl::warehouse::SqliteWarehouse;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(
    name = "retail-etl",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"),
    about = "Load raw retail CSV exports into a normalized store and report on their quality",
    styles = get_styles()
)]
struct CliArgs {
    /// Path to a TOML config file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory holding customers_raw.csv, products_raw.csv and sales_raw.csv.
    #[clap(long, value_parser = parse_path)]
    pub data_dir: Option<PathBuf>,

    /// Directory for the SQLite databases. Defaults to the data directory.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Directory the quality report is written to. Defaults to the database directory.
    #[clap(long, value_parser = parse_path)]
    pub report_dir: Option<PathBuf>,

    /// Country calling code prepended to national phone numbers.
    #[clap(long)]
    pub phone_country_code: Option<String>,

    /// How sales lines are grouped into orders.
    #[clap(long, value_enum, default_value_t = OrderGrouping::CustomerDate)]
    pub order_grouping: OrderGrouping,

    /// JSON snapshot of product documents.
    #[clap(long, value_parser = parse_path)]
    pub documents_snapshot: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the ETL pipeline and write the data-quality report.
    Load,
    /// Business queries over the loaded store.
    #[command(subcommand)]
    Query(QueryCommand),
    /// Product document store.
    #[command(subcommand)]
    Documents(DocumentsCommand),
    /// Star-schema warehouse built from the loaded store.
    #[command(subcommand)]
    Warehouse(WarehouseCommand),
}

#[derive(Subcommand, Debug)]
enum QueryCommand {
    /// Repeat customers and what they spent.
    History {
        #[clap(long, default_value_t = DEFAULT_MIN_ORDERS)]
        min_orders: u32,
        #[clap(long, default_value_t = DEFAULT_MIN_SPENT)]
        min_spent: Decimal,
    },
    /// Units and revenue per product category.
    Categories,
    /// Month by month revenue with a running total.
    Monthly {
        #[clap(long)]
        year: i32,
    },
}

#[derive(Subcommand, Debug)]
enum DocumentsCommand {
    /// Replace the collection with the configured snapshot.
    Load,
    /// Products in a category, cheapest first.
    Find {
        category: String,
        #[clap(long)]
        max_price: Option<Decimal>,
    },
    /// Products with a minimum average review rating.
    TopRated {
        #[clap(long, default_value_t = 4.0)]
        min_rating: f64,
    },
    /// Append a review to a product document.
    AddReview {
        product_id: String,
        #[clap(long)]
        user: String,
        #[clap(long)]
        rating: i64,
        #[clap(long, default_value = "")]
        comment: String,
        /// Review date, YYYY-MM-DD. Defaults to today.
        #[clap(long)]
        date: Option<NaiveDate>,
    },
    /// Document count, average price and stock per category.
    Stats,
}

#[derive(Subcommand, Debug)]
enum WarehouseCommand {
    /// Rebuild the star schema from the relational store.
    Build,
    /// Revenue by year, quarter and month.
    Drilldown,
    /// Best-selling products by revenue.
    TopProducts {
        #[clap(long, default_value_t = 10)]
        limit: usize,
    },
    /// Customers bucketed by lifetime spend.
    Segments,
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let result = run(cli_args);
    flush();
    result
}

fn run(cli_args: CliArgs) -> Result<()> {
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let cli_config = CliConfig {
        data_dir: cli_args.data_dir,
        db_dir: cli_args.db_dir,
        report_dir: cli_args.report_dir,
        documents_snapshot: cli_args.documents_snapshot,
        phone_country_code: cli_args.phone_country_code,
        order_grouping: cli_args.order_grouping,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    match cli_args.command {
        Command::Load => run_load(&config),
        Command::Query(cmd) => run_query(&config, cmd),
        Command::Documents(cmd) => run_documents(&config, cmd),
        Command::Warehouse(cmd) => run_warehouse(&config, cmd),
    }
}

fn run_load(config: &AppConfig) -> Result<()> {
    let outcome = pipeline::run(&config.pipeline_options())?;
    print_quality_summary(&outcome.report);
    print_entity_counts("Loaded", &outcome.summary.loaded);
    print_success(&format!(
        "Reports written to {} and {}",
        outcome.text_report.display(),
        outcome.json_report.display()
    ));
    Ok(())
}

fn open_retail_store(config: &AppConfig) -> Result<SqliteRetailStore> {
    let path = config.retail_db_path();
    if !path.exists() {
        bail!("No relational store at {:?}, run `load` first", path);
    }
    SqliteRetailStore::new(&path)
}

fn run_query(config: &AppConfig, cmd: QueryCommand) -> Result<()> {
    let store = open_retail_store(config)?;
    match cmd {
        QueryCommand::History {
            min_orders,
            min_spent,
        } => {
            let rows = store.customer_purchase_history(min_orders, min_spent)?;
            print_section_header("Customer Purchase History");
            let mut table = TableBuilder::new(&["ID", "Name", "Email", "Orders", "Spent"])
                .align_right(&[0, 3, 4]);
            for r in &rows {
                table.add_row(vec![
                    r.customer_id.to_string(),
                    r.name.clone(),
                    r.email.clone(),
                    r.order_count.to_string(),
                    format!("{:.2}", r.total_spent),
                ]);
            }
            print_table_or_empty(&table, "No customers match");
        }
        QueryCommand::Categories => {
            let rows = store.product_sales_by_category()?;
            print_section_header("Sales by Category");
            let mut table = TableBuilder::new(&["Category", "Products", "Units", "Revenue"])
                .align_right(&[1, 2, 3]);
            for r in &rows {
                table.add_row(vec![
                    r.category.clone(),
                    r.products_sold.to_string(),
                    r.total_quantity.to_string(),
                    format!("{:.2}", r.revenue),
                ]);
            }
            print_table_or_empty(&table, "No sales loaded");
        }
        QueryCommand::Monthly { year } => {
            let rows = store.monthly_sales_trend(year)?;
            print_section_header(&format!("Monthly Sales {}", year));
            let mut table = TableBuilder::new(&["Month", "Orders", "Revenue", "Cumulative"])
                .align_right(&[0, 1, 2, 3]);
            for r in &rows {
                table.add_row(vec![
                    r.month.to_string(),
                    r.order_count.to_string(),
                    format!("{:.2}", r.revenue),
                    format!("{:.2}", r.cumulative_revenue),
                ]);
            }
            print_table_or_empty(&table, "No orders in that year");
        }
    }
    print_section_footer();
    Ok(())
}

fn run_documents(config: &AppConfig, cmd: DocumentsCommand) -> Result<()> {
    let mut store = SqliteDocumentStore::new(config.documents_db_path())?;
    match cmd {
        DocumentsCommand::Load => {
            let Some(snapshot) = &config.documents_snapshot else {
                bail!("documents_snapshot must be set via --documents-snapshot or the config file");
            };
            let summary = store.load_snapshot_file(snapshot)?;
            print_section_header("Product Documents");
            print_key_value_highlight("Loaded", &summary.loaded.to_string());
            print_key_value("Skipped", &summary.skipped.to_string());
        }
        DocumentsCommand::Find {
            category,
            max_price,
        } => {
            let documents = store.find_by_category(&category, max_price)?;
            print_section_header(&format!("{} Products", category));
            let mut table = TableBuilder::new(&["ID", "Name", "Price", "Stock", "Rating"])
                .align_right(&[2, 3, 4]);
            for d in &documents {
                table.add_row(vec![
                    d.product_id.clone(),
                    d.name.clone(),
                    format!("{:.2}", d.price),
                    d.stock.to_string(),
                    d.average_rating()
                        .map(|r| format!("{:.1}", r))
                        .unwrap_or_else(|| "-".to_string()),
                ]);
            }
            print_table_or_empty(&table, "No products found");
        }
        DocumentsCommand::TopRated { min_rating } => {
            let rated = store.products_with_min_rating(min_rating)?;
            print_section_header("Top Rated Products");
            let mut table =
                TableBuilder::new(&["ID", "Name", "Average", "Reviews"]).align_right(&[2, 3]);
            for r in &rated {
                table.add_row(vec![
                    r.product_id.clone(),
                    r.name.clone(),
                    format!("{:.2}", r.average_rating),
                    r.review_count.to_string(),
                ]);
            }
            print_table_or_empty(&table, "No products reach that rating");
        }
        DocumentsCommand::AddReview {
            product_id,
            user,
            rating,
            comment,
            date,
        } => {
            let review = Review {
                user,
                rating,
                comment,
                date: date.unwrap_or_else(|| Local::now().date_naive()),
            };
            let document = store.add_review(&product_id, review)?;
            print_section_header("Review Added");
            print_key_value("Product", &document.name);
            print_key_value("Reviews", &document.reviews.len().to_string());
            if let Some(avg) = document.average_rating() {
                print_key_value_highlight("Average rating", &format!("{:.2}", avg));
            }
        }
        DocumentsCommand::Stats => {
            let stats = store.category_stats()?;
            print_section_header("Catalog by Category");
            let mut table = TableBuilder::new(&["Category", "Products", "Avg price", "Stock"])
                .align_right(&[1, 2, 3]);
            for s in &stats {
                table.add_row(vec![
                    s.category.clone(),
                    s.product_count.to_string(),
                    format!("{:.2}", s.average_price),
                    s.total_stock.to_string(),
                ]);
            }
            print_table_or_empty(&table, "The collection is empty");
        }
    }
    print_section_footer();
    Ok(())
}

fn run_warehouse(config: &AppConfig, cmd: WarehouseCommand) -> Result<()> {
    let mut warehouse = SqliteWarehouse::new(config.warehouse_db_path())?;
    match cmd {
        WarehouseCommand::Build => {
            let store = open_retail_store(config)?;
            let summary = warehouse.build_from_store(&store)?;
            print_section_header("Warehouse Built");
            print_key_value("Dates", &summary.dates.to_string());
            print_key_value("Products", &summary.products.to_string());
            print_key_value("Customers", &summary.customers.to_string());
            print_key_value_highlight("Facts", &summary.facts.to_string());
        }
        WarehouseCommand::Drilldown => {
            let years = warehouse.time_drilldown()?;
            print_section_header("Revenue Drill-down");
            let mut table = TableBuilder::new(&["Period", "Units", "Revenue"]).align_right(&[1, 2]);
            for y in &years {
                table.add_row(vec![
                    y.year.to_string(),
                    y.quantity.to_string(),
                    format!("{:.2}", y.revenue),
                ]);
                for q in &y.quarters {
                    table.add_row(vec![
                        format!("  {}", q.quarter),
                        q.quantity.to_string(),
                        format!("{:.2}", q.revenue),
                    ]);
                    for m in &q.months {
                        table.add_row(vec![
                            format!("    {}", m.month_name),
                            m.quantity.to_string(),
                            format!("{:.2}", m.revenue),
                        ]);
                    }
                }
            }
            print_table_or_empty(&table, "No facts, run `warehouse build` first");
        }
        WarehouseCommand::TopProducts { limit } => {
            let products = warehouse.top_products(limit)?;
            print_section_header("Top Products");
            let mut table =
                TableBuilder::new(&["ID", "Name", "Category", "Units", "Revenue", "Share %"])
                    .align_right(&[0, 3, 4, 5]);
            for p in &products {
                table.add_row(vec![
                    p.product_id.to_string(),
                    p.product_name.clone(),
                    p.category.clone(),
                    p.quantity.to_string(),
                    format!("{:.2}", p.revenue),
                    format!("{:.2}", p.revenue_share),
                ]);
            }
            print_table_or_empty(&table, "No facts, run `warehouse build` first");
        }
        WarehouseCommand::Segments => {
            let segments = warehouse.customer_segments()?;
            print_section_header("Customer Segments");
            let mut table =
                TableBuilder::new(&["Segment", "Customers", "Revenue"]).align_right(&[1, 2]);
            for s in &segments {
                table.add_row(vec![
                    s.segment.label().to_string(),
                    s.customer_count.to_string(),
                    format!("{:.2}", s.revenue),
                ]);
            }
            print_table_or_empty(&table, "No facts, run `warehouse build` first");
        }
    }
    print_section_footer();
    Ok(())
}

fn print_table_or_empty(table: &TableBuilder, empty_message: &str) {
    if table.is_empty() {
        print_empty_list(empty_message);
    } else {
        table.print();
    }
}

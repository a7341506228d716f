use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use mysticquent::prelude::*;
use serde_json::{json, Map, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "mysticquent-cli")]
#[command(about = "Build, inspect and run search-engine queries", version, long_about = None)]
struct Cli {
    /// Configuration file layered over the built-in defaults
    #[arg(short, long, env = "MYSTICQUENT_CONFIG")]
    config: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the query document without sending it
    Dsl(QueryArgs),

    /// Run a search and print the raw engine response
    Search(QueryArgs),

    /// Run completion suggesters
    Suggest {
        /// Suggester name
        name: String,

        /// Text to complete
        text: String,

        #[arg(short, long, default_value = "_suggest")]
        field: String,

        #[arg(short, long, value_delimiter = ',')]
        index: Vec<String>,
    },

    /// Drop and recreate an index with the default mapping
    ResetIndex {
        #[arg(value_name = "INDEX")]
        index: String,
    },
}

#[derive(Args)]
struct QueryArgs {
    /// Full-text keyword; `*` matches everything
    #[arg(default_value = "*")]
    keyword: String,

    /// Filter map as JSON, e.g. '{"status":"active"}'
    #[arg(short = 'w', long = "where")]
    filters: Option<String>,

    /// Scored query map as JSON
    #[arg(short, long)]
    query: Option<String>,

    /// Sort fields as JSON, e.g. '{"created_at":"desc"}'
    #[arg(short, long)]
    sort: Option<String>,

    /// Fields the keyword is matched against
    #[arg(short, long, value_delimiter = ',')]
    fields: Vec<String>,

    #[arg(short, long, value_delimiter = ',')]
    index: Vec<String>,

    #[arg(short, long)]
    page: Option<u64>,

    #[arg(short = 'n', long)]
    per_page: Option<u64>,
}

impl QueryArgs {
    fn attributes(&self) -> anyhow::Result<SearchAttributes> {
        let mut attributes = Map::new();
        if let Some(filters) = &self.filters {
            attributes.insert("where".to_string(), parse_json("--where", filters)?);
        }
        if let Some(query) = &self.query {
            attributes.insert("query".to_string(), parse_json("--query", query)?);
        }
        if let Some(sort) = &self.sort {
            attributes.insert("sort_by".to_string(), parse_json("--sort", sort)?);
        }
        attributes.insert("fields".to_string(), json!(self.fields));
        attributes.insert("index".to_string(), json!(self.index));
        attributes.insert("page".to_string(), json!(self.page));
        attributes.insert("per_page".to_string(), json!(self.per_page));

        Ok(serde_json::from_value(Value::Object(attributes))?)
    }
}

fn parse_json(flag: &str, raw: &str) -> anyhow::Result<Value> {
    serde_json::from_str(raw).with_context(|| format!("{} is not valid JSON", flag))
}

fn init_tracing(json_logs: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "mysticquent=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    tracing::debug!(hosts = ?config.connection.hosts, index = %config.index, "Configuration loaded");
    let connection = Connection::from_config(config)?;

    match cli.command {
        Commands::Dsl(args) => {
            let builder = connection.search(&args.keyword, &args.attributes()?)?;
            println!("{}", serde_json::to_string_pretty(&builder.to_dsl())?);
        }

        Commands::Search(args) => {
            let mut builder = connection.search(&args.keyword, &args.attributes()?)?;
            let (offset, limit) = (builder.offset(), builder.limit());
            builder.from(offset).size(limit);

            let response = builder.get_raw().await?;
            tracing::info!(total = response.total(), took_ms = response.took, "Search complete");
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Commands::Suggest {
            name,
            text,
            field,
            index,
        } => {
            let mut suggest = connection.suggest();
            if !index.is_empty() {
                suggest.set_index(index);
            }
            suggest.completion_on(name, text, field, Default::default());
            let result = suggest.get().await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::ResetIndex { index } => {
            let response = connection.indices().recreate(&index).await?;
            tracing::info!(index = %index, "Index recreated");
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

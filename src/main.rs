use std::path::Path;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use mdb_redis_operator::{
    create_cluster, delete_cluster, read_cluster, update_cluster, Context, Error, HttpClusterApi,
    RedisClusterSpec,
};

#[derive(Parser)]
#[command(
    name = "mdb-redis-operator",
    about = "Converges managed Redis clusters toward a declarative spec"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show what an apply would change, without side effects
    Plan {
        /// Cluster spec file (YAML)
        #[arg(short = 'f', long)]
        file: std::path::PathBuf,

        /// Cluster to diff against
        #[arg(long)]
        cluster_id: String,
    },
    /// Create the cluster, or converge an existing one toward the spec
    Apply {
        /// Cluster spec file (YAML)
        #[arg(short = 'f', long)]
        file: std::path::PathBuf,

        /// Existing cluster to converge; a new cluster is created when absent
        #[arg(long)]
        cluster_id: Option<String>,
    },
    /// Print the observed cluster state
    Status {
        #[arg(long)]
        cluster_id: String,
    },
    /// Delete the cluster
    Destroy {
        #[arg(long)]
        cluster_id: String,
    },
}

fn load_spec(path: &Path) -> Result<RedisClusterSpec, Box<dyn std::error::Error>> {
    let file = std::fs::File::open(path)
        .map_err(|e| format!("cannot open spec file {}: {e}", path.display()))?;
    Ok(serde_yaml::from_reader(file)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mdb_redis_operator=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let endpoint =
        std::env::var("MDB_API_ENDPOINT").map_err(|_| "MDB_API_ENDPOINT is not set")?;
    let token = std::env::var("MDB_API_TOKEN").map_err(|_| "MDB_API_TOKEN is not set")?;

    let api = Arc::new(HttpClusterApi::new(&endpoint, &token));
    let mut ctx = Context::new(api);
    if let Ok(folder) = std::env::var("MDB_FOLDER_ID") {
        ctx = ctx.with_default_folder(folder);
    }

    match cli.command {
        Command::Plan { file, cluster_id } => {
            let spec = load_spec(&file)?;
            let plan = mdb_redis_operator::plan(&ctx, &cluster_id, &spec).await?;
            if plan.is_empty() {
                info!("cluster matches the spec, nothing to change");
            }
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Command::Apply { file, cluster_id } => {
            let spec = load_spec(&file)?;
            match cluster_id {
                Some(id) => {
                    update_cluster(&ctx, &id, &spec).await?;
                    info!(cluster_id = %id, "cluster converged");
                    println!("{id}");
                }
                None => {
                    let id = create_cluster(&ctx, &spec).await?;
                    println!("{id}");
                }
            }
        }
        Command::Status { cluster_id } => {
            let observed = read_cluster(&ctx, &cluster_id, None).await?;
            println!("{}", serde_json::to_string_pretty(&observed)?);
        }
        Command::Destroy { cluster_id } => match delete_cluster(&ctx, &cluster_id).await {
            Ok(()) => {}
            Err(Error::NotFound(_)) => {
                warn!(cluster_id = %cluster_id, "cluster already absent")
            }
            Err(e) => return Err(e.into()),
        },
    }

    Ok(())
}

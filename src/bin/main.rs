use anyhow::Result;
use clap::{Parser, Subcommand};
use quarry::db::schema::{PrincipalCreate, TenantCreate};
use quarry::types::TenantKey;
use quarry::{
    DatabaseConfig, PrincipalStore, ServerConfig, TenantStore, create_connection, ensure_schema,
    hash_password,
};
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quarry")]
#[command(about = "Multi-tenant issue tracking platform core")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the public and admin HTTP servers
    Serve {
        /// Public API bind address
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: String,
        /// Bind address for the admin API (internal / trusted only)
        #[arg(long, default_value = "127.0.0.1:8081")]
        admin_bind: String,
        #[arg(long, default_value = "memory")]
        db_url: String,
        /// Shared secret for credential signing
        #[arg(long, env = "QUARRY_JWT_SECRET")]
        jwt_secret: Option<String>,
    },
    /// Initialize the database
    Init {
        #[arg(long, default_value = "memory")]
        db_url: String,
    },
    /// Create a new tenant
    CreateTenant {
        /// Unique subdomain key (normalized to lowercase)
        key: String,
        /// Human-readable display name
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value = "memory")]
        db_url: String,
    },
    /// Create a new principal
    CreatePrincipal {
        /// Unique login email
        email: String,
        /// Login password (stored as a digest, never raw)
        #[arg(long)]
        password: String,
        /// Role: member, admin, or operator
        #[arg(long, default_value = "member")]
        role: String,
        /// Home tenant key, if any
        #[arg(long)]
        tenant: Option<String>,
        /// Human-readable display name
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value = "memory")]
        db_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("quarry=info".parse()?),
        )
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            admin_bind,
            db_url,
            jwt_secret,
        } => {
            let mut config = ServerConfig {
                bind,
                admin_bind,
                db: DatabaseConfig {
                    url: db_url,
                    ..Default::default()
                },
                ..Default::default()
            };
            if let Some(secret) = jwt_secret {
                config.jwt_secret = secret;
            }
            info!("using database url: {}", config.db.url);

            quarry::server::run(config).await?;
        }
        Commands::Init { db_url } => {
            let db_config = DatabaseConfig {
                url: db_url,
                ..Default::default()
            };
            info!("Using database url for initialization: {}", db_config.url);

            info!("Initializing database...");
            let db = create_connection(db_config).await?;
            ensure_schema(&db).await?;
            info!("Database initialized successfully");
        }
        Commands::CreateTenant { key, name, db_url } => {
            let db_config = DatabaseConfig {
                url: db_url,
                ..Default::default()
            };
            let db = create_connection(db_config).await?;
            ensure_schema(&db).await?;

            let store = TenantStore::new(db);
            let tenant = store
                .create(&TenantCreate {
                    key,
                    display_name: name,
                })
                .await?;

            println!("Tenant created successfully!");
            println!();
            println!("  Id:   {}", tenant.id);
            println!("  Key:  {}", tenant.key);
            if let Some(n) = &tenant.display_name {
                println!("  Name: {}", n);
            }
        }
        Commands::CreatePrincipal {
            email,
            password,
            role,
            tenant,
            name,
            db_url,
        } => {
            let db_config = DatabaseConfig {
                url: db_url,
                ..Default::default()
            };
            let db = create_connection(db_config).await?;
            ensure_schema(&db).await?;

            let role = role
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?;

            // Resolve the home tenant by key, if one was named.
            let tenant_id = match tenant {
                Some(key) => {
                    let tenants = TenantStore::new(db.clone());
                    let record = tenants
                        .get_by_key(&TenantKey::normalized(&key))
                        .await?
                        .ok_or_else(|| anyhow::anyhow!("no active tenant with key '{key}'"))?;
                    Some(record.id)
                }
                None => None,
            };

            let store = PrincipalStore::new(db);
            let principal = store
                .create(&PrincipalCreate {
                    email,
                    display_name: name,
                    password_hash: hash_password(&password),
                    role,
                    tenant_id,
                })
                .await?;

            println!("Principal created successfully!");
            println!();
            println!("  Id:    {}", principal.id);
            println!("  Email: {}", principal.email);
            println!("  Role:  {}", principal.role);
            if let Some(tenant_id) = &principal.tenant_id {
                println!("  Home tenant: {}", tenant_id);
            }
        }
    }

    Ok(())
}

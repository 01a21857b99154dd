use clap::Parser;
use serde_json::Value;
use tracing::info;

use crate::auth::password::hash_password_async;
use crate::config::{AppConfig, StoreBackend};
use crate::database::models::RegisterInput;
use crate::database::{Document, DocumentStore, StoreError};
use crate::filter::FilterSet;
use crate::types::{Collection, Role};

pub const DEFAULT_LOG_FILTER: &str = "catalog_api=info,tower_http=info";

#[derive(Parser, Debug)]
#[command(name = "catalog-api")]
#[command(about = "Product catalog REST API")]
#[command(version)]
pub struct ServeArgs {
    #[arg(long, help = "Port to listen on (overrides CATALOG_API_PORT/PORT)")]
    pub port: Option<u16>,

    #[arg(long, help = "Document store backend: memory or postgres")]
    pub store: Option<StoreBackend>,

    #[arg(long, help = "PostgreSQL connection URL (overrides DATABASE_URL)")]
    pub database_url: Option<String>,

    #[arg(long, env = "RUST_LOG", default_value = DEFAULT_LOG_FILTER, help = "tracing filter directives")]
    pub log: String,

    #[arg(long, env = "ADMIN_EMAIL", help = "Create this admin account at startup if missing")]
    pub admin_email: Option<String>,

    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true, requires = "admin_email")]
    pub admin_password: Option<String>,
}

impl ServeArgs {
    /// Command-line flags win over environment-derived configuration
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(port) = self.port {
            config.api.port = port;
        }
        if let Some(store) = self.store {
            config.database.backend = store;
        }
        if let Some(url) = &self.database_url {
            config.database.url = Some(url.clone());
        }
    }

    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        Some((self.admin_email.as_deref()?, self.admin_password.as_deref()?))
    }
}

/// Make sure an admin account exists for `email`. Existing accounts are
/// promoted to admin; their password is left alone.
pub async fn ensure_admin(store: &dyn DocumentStore, email: &str, password: &str) -> anyhow::Result<()> {
    let email = email.trim().to_lowercase();
    let existing = store
        .find_one(Collection::Users, &FilterSet::eq("email", &email))
        .await?;

    if let Some(user) = existing {
        let id = user
            .get("_id")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::Malformed("user without _id".into()))?;
        if user.get("role").and_then(Value::as_str) != Some(Role::Admin.as_str()) {
            let mut changes = Document::new();
            changes.insert("role".into(), Value::from(Role::Admin.as_str()));
            store.update_by_id(Collection::Users, id, changes).await?;
            info!("Promoted {} to admin", email);
        }
        return Ok(());
    }

    let new_user = RegisterInput {
        name: Some("Administrator".into()),
        email: Some(email.clone()),
        password: Some(password.to_string()),
    }
    .validate()?;
    let hash = hash_password_async(new_user.password.clone()).await?;
    let mut document = new_user.into_document(hash);
    document.insert("role".into(), Value::from(Role::Admin.as_str()));
    store.insert(Collection::Users, document).await?;
    info!("Created admin account {}", email);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    #[test]
    fn flags_override_config() {
        let args = ServeArgs::try_parse_from([
            "catalog-api",
            "--port",
            "7001",
            "--store",
            "postgres",
            "--database-url",
            "postgres://localhost/catalog",
        ])
        .unwrap();
        let mut config = AppConfig::development();
        args.apply(&mut config);
        assert_eq!(config.api.port, 7001);
        assert_eq!(config.database.backend, StoreBackend::Postgres);
        assert_eq!(config.database.url.as_deref(), Some("postgres://localhost/catalog"));
    }

    #[test]
    fn unknown_store_is_rejected() {
        assert!(ServeArgs::try_parse_from(["catalog-api", "--store", "mongo"]).is_err());
    }

    #[tokio::test]
    async fn ensure_admin_creates_then_promotes() {
        let store = MemoryStore::new();
        ensure_admin(&store, "Root@Example.com", "supersecret").await.unwrap();
        let admin = store
            .find_one(Collection::Users, &FilterSet::eq("email", "root@example.com"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin["role"], "admin");

        // idempotent
        ensure_admin(&store, "root@example.com", "ignored-here").await.unwrap();
        assert_eq!(store.count(Collection::Users, &FilterSet::new()).await.unwrap(), 1);
    }
}

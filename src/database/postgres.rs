use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::{debug, info};

use super::store::{apply_update, prepare_insert, Document, DocumentStore, StoreError, StoreResult};
use crate::config::DatabaseConfig;
use crate::filter::{FilterOrder, FilterSet, FilterWhere, QueryPlan, SqlResult};
use crate::types::Collection;

const UNIQUE_VIOLATION: &str = "23505";

const MIGRATIONS: [&str; 3] = [
    r#"CREATE TABLE IF NOT EXISTS documents (
        collection TEXT NOT NULL,
        id TEXT NOT NULL,
        body JSONB NOT NULL,
        PRIMARY KEY (collection, id)
    )"#,
    r#"CREATE UNIQUE INDEX IF NOT EXISTS documents_users_email_key
        ON documents (lower(body ->> 'email')) WHERE collection = 'users'"#,
    r#"CREATE INDEX IF NOT EXISTS documents_products_category_idx
        ON documents ((body ->> 'category')) WHERE collection = 'products'"#,
];

/// Document store over a single Postgres JSONB table
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open a pool against `DATABASE_URL` and make sure the schema exists
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let url = config
            .url
            .as_deref()
            .ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;
        let parsed = url::Url::parse(url).map_err(|_| StoreError::InvalidDatabaseUrl)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!(
            "Created database pool for: {}",
            parsed.path().trim_start_matches('/')
        );

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        for statement in MIGRATIONS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("documents schema is up to date");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }

    /// `SELECT` for a plan; `$1` is always the collection name
    fn select_sql(collection: Collection, plan: &QueryPlan) -> SqlResult {
        let mut params = vec![Value::String(collection.name().to_string())];
        let mut query = String::from("SELECT body FROM documents WHERE collection = $1");

        if !plan.filter.is_empty() {
            let (clause, values) = FilterWhere::generate(&plan.filter, params.len());
            query.push_str(" AND ");
            query.push_str(&clause);
            params.extend(values);
        }

        let (order, values) = FilterOrder::generate(&plan.sort, params.len());
        if !order.is_empty() {
            query.push(' ');
            query.push_str(&order);
            params.extend(values);
            // tie-break on insertion time so paging is deterministic
            query.push_str(", body -> 'createdAt' ASC, id ASC");
        }

        if plan.skip > 0 {
            params.push(Value::from(i64::try_from(plan.skip).unwrap_or(i64::MAX)));
            query.push_str(&format!(" OFFSET ${}", params.len()));
        }
        if let Ok(limit) = i64::try_from(plan.limit) {
            params.push(Value::from(limit));
            query.push_str(&format!(" LIMIT ${}", params.len()));
        }

        SqlResult { query, params }
    }

    fn count_sql(collection: Collection, filter: &FilterSet) -> SqlResult {
        let mut params = vec![Value::String(collection.name().to_string())];
        let mut query =
            String::from("SELECT COUNT(*) AS count FROM documents WHERE collection = $1");
        if !filter.is_empty() {
            let (clause, values) = FilterWhere::generate(filter, params.len());
            query.push_str(" AND ");
            query.push_str(&clause);
            params.extend(values);
        }
        SqlResult { query, params }
    }

    async fn fetch(&self, sql: &SqlResult) -> StoreResult<Vec<Document>> {
        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param(q, p);
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.iter().map(decode_body).collect()
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn find(&self, collection: Collection, plan: &QueryPlan) -> StoreResult<Vec<Document>> {
        let sql = Self::select_sql(collection, plan);
        let mut documents = self.fetch(&sql).await?;
        for doc in documents.iter_mut() {
            plan.projection.apply(doc);
        }
        Ok(documents)
    }

    async fn find_one(&self, collection: Collection, filter: &FilterSet) -> StoreResult<Option<Document>> {
        let mut plan = QueryPlan::all().with_filter(filter.clone());
        plan.limit = 1;
        // unprojected: callers such as login need the full document
        let sql = Self::select_sql(collection, &plan);
        Ok(self.fetch(&sql).await?.into_iter().next())
    }

    async fn find_by_id(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
        let row = sqlx::query("SELECT body FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.name())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(decode_body).transpose()
    }

    async fn find_by_ids(&self, collection: Collection, ids: &[String]) -> StoreResult<Vec<Document>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let rows = sqlx::query("SELECT body FROM documents WHERE collection = $1 AND id = ANY($2)")
            .bind(collection.name())
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(decode_body).collect()
    }

    async fn exists(&self, collection: Collection, id: &str) -> StoreResult<bool> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM documents WHERE collection = $1 AND id = $2) AS present",
        )
        .bind(collection.name())
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("present")?)
    }

    async fn count(&self, collection: Collection, filter: &FilterSet) -> StoreResult<u64> {
        let sql = Self::count_sql(collection, filter);
        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param(q, p);
        }
        let row = q.fetch_one(&self.pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count.max(0) as u64)
    }

    async fn insert(&self, collection: Collection, document: Document) -> StoreResult<Document> {
        let (id, document) = prepare_insert(document);
        sqlx::query("INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)")
            .bind(collection.name())
            .bind(&id)
            .bind(Json(&document))
            .execute(&self.pool)
            .await
            .map_err(|e| unique_violation(collection, e))?;
        Ok(document)
    }

    async fn update_by_id(
        &self,
        collection: Collection,
        id: &str,
        changes: Document,
    ) -> StoreResult<Option<Document>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT body FROM documents WHERE collection = $1 AND id = $2 FOR UPDATE",
        )
        .bind(collection.name())
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut document = decode_body(&row)?;
        apply_update(&mut document, changes);

        sqlx::query("UPDATE documents SET body = $3 WHERE collection = $1 AND id = $2")
            .bind(collection.name())
            .bind(id)
            .bind(Json(&document))
            .execute(&mut *tx)
            .await
            .map_err(|e| unique_violation(collection, e))?;

        tx.commit().await?;
        Ok(Some(document))
    }

    async fn delete_by_id(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
        let row = sqlx::query(
            "DELETE FROM documents WHERE collection = $1 AND id = $2 RETURNING body",
        )
        .bind(collection.name())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(decode_body).transpose()
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn decode_body(row: &PgRow) -> StoreResult<Document> {
    let Json(body): Json<Value> = row.try_get("body")?;
    match body {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Malformed(format!(
            "expected an object body, found {}",
            other
        ))),
    }
}

fn unique_violation(collection: Collection, error: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &error {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            let field = collection
                .unique_fields()
                .first()
                .copied()
                .unwrap_or("id")
                .to_string();
            return StoreError::Duplicate { collection, field };
        }
    }
    StoreError::Sqlx(error)
}

fn bind_param<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        Value::Array(_) | Value::Object(_) => q.bind(Json(v)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::filter::Filter;

    fn plan(pairs: &[(&str, &str)]) -> QueryPlan {
        let params: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Filter::translate(&params, &AppConfig::development().query).unwrap()
    }

    #[test]
    fn select_binds_collection_first() {
        let sql = PgStore::select_sql(Collection::Products, &plan(&[]));
        assert_eq!(
            sql.query,
            "SELECT body FROM documents WHERE collection = $1 ORDER BY body -> $2 DESC, body -> 'createdAt' ASC, id ASC LIMIT $3"
        );
        assert_eq!(sql.params[0], Value::String("products".into()));
        assert_eq!(sql.params[1], Value::String("createdAt".into()));
        assert_eq!(sql.params[2], Value::from(100));
    }

    #[test]
    fn select_numbers_parameters_in_order() {
        let sql = PgStore::select_sql(
            Collection::Products,
            &plan(&[("category", "abc"), ("page", "3"), ("limit", "10")]),
        );
        assert!(sql
            .query
            .starts_with("SELECT body FROM documents WHERE collection = $1 AND body ->> $2 = $3 ORDER BY body -> $4 DESC"));
        assert!(sql.query.ends_with("OFFSET $5 LIMIT $6"));
        assert_eq!(sql.params.len(), 6);
        assert_eq!(sql.params[4], Value::from(20));
    }

    #[test]
    fn unbounded_plan_has_no_limit() {
        let sql = PgStore::select_sql(Collection::Categories, &QueryPlan::all());
        assert!(!sql.query.contains("LIMIT"));
        assert!(!sql.query.contains("OFFSET"));
    }

    #[test]
    fn count_sql_includes_filter() {
        let sql = PgStore::count_sql(Collection::Products, &FilterSet::eq("category", "c1"));
        assert_eq!(
            sql.query,
            "SELECT COUNT(*) AS count FROM documents WHERE collection = $1 AND body ->> $2 = $3"
        );
        assert_eq!(sql.params.len(), 3);
    }
}

use {
    super::{DATABASE_SERVICE, ItemRepository},
    crate::{
        BoxFuture, LifecycleService, Result,
        api::items::{CreateItem, Item, ItemPage, ListParams, UpdateItem},
    },
    sqlx::{QueryBuilder, Row},
    sqlx_postgres::{PgPool, PgRow, Postgres},
    std::sync::Arc,
    time::OffsetDateTime,
};

const COLUMNS: &str = "id, name, price, description, created_at, updated_at";

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS items (
    id CHAR(16) PRIMARY KEY,
    name VARCHAR(120) NOT NULL,
    price NUMERIC(10, 2) NOT NULL CHECK (price > 0),
    description VARCHAR(500),
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
)";

/// Items stored in the PostgreSQL table `items`.
///
/// ```rust,no_run
/// use axum_hardened::{Config, Lifecycle, PgItemRepository};
///
/// # async fn example() -> axum_hardened::Result<()> {
/// let config = Config::default();
/// let repo = PgItemRepository::new(config.create_pgpool()?);
///
/// let lifecycle = Lifecycle::new();
/// lifecycle.register([repo.into_service()]);
/// lifecycle.startup().await?; // creates the table
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PgItemRepository {
    pool: PgPool,
}

impl PgItemRepository {
    pub fn new(pool: PgPool) -> Self {
        PgItemRepository { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Returns the repository as a lifecycle service sharing this pool.
    pub fn into_service(&self) -> Arc<dyn LifecycleService> {
        Arc::new(self.clone())
    }

    /// Creates the `items` table when it does not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }
}

fn item_from_row(row: &PgRow) -> std::result::Result<Item, sqlx::Error> {
    Ok(Item {
        id: row.try_get::<String, _>("id")?.trim_end().to_string(),
        name: row.try_get("name")?,
        price: row.try_get("price")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Escapes the `LIKE` wildcards so that the term matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, params: &ListParams) {
    qb.push(" WHERE TRUE");
    if let Some(min) = params.min_price {
        qb.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = params.max_price {
        qb.push(" AND price <= ").push_bind(max);
    }
    if let Some(term) = &params.search {
        let pattern = like_pattern(term);
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

impl ItemRepository for PgItemRepository {
    async fn create(&self, input: CreateItem) -> Result<Item> {
        let item = Item::new(input);
        sqlx::query(&format!(
            "INSERT INTO items ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)"
        ))
        .bind(&item.id)
        .bind(&item.name)
        .bind(item.price)
        .bind(&item.description)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(item)
    }

    async fn list(&self, params: &ListParams) -> Result<ItemPage> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM items");
        push_filters(&mut count, params);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM items"));
        push_filters(&mut select, params);
        select
            .push(format!(
                " ORDER BY {column} {order}, id {order}",
                column = params.sort.column(),
                order = params.order
            ))
            .push(" LIMIT ")
            .push_bind(i64::from(params.limit))
            .push(" OFFSET ")
            .push_bind(params.offset() as i64);

        let data = select
            .build()
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(item_from_row)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(ItemPage {
            data,
            total: total as u64,
            page: params.page,
            limit: params.limit,
        })
    }

    async fn get(&self, id: &str) -> Result<Option<Item>> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM items WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(item_from_row).transpose()?)
    }

    async fn update(&self, id: &str, patch: UpdateItem) -> Result<Option<Item>> {
        let row = sqlx::query(&format!(
            "UPDATE items SET
                name = COALESCE($2, name),
                price = COALESCE($3, price),
                description = COALESCE($4, description),
                updated_at = $5
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(patch.name)
        .bind(patch.price)
        .bind(patch.description)
        .bind(OffsetDateTime::now_utc())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(item_from_row).transpose()?)
    }

    async fn replace(&self, id: &str, input: CreateItem) -> Result<Option<Item>> {
        let row = sqlx::query(&format!(
            "UPDATE items SET name = $2, price = $3, description = $4, updated_at = $5
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(input.name)
        .bind(input.price)
        .bind(input.description)
        .bind(OffsetDateTime::now_utc())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(item_from_row).transpose()?)
    }

    async fn remove(&self, id: &str) -> Result<Option<Item>> {
        let row = sqlx::query(&format!("DELETE FROM items WHERE id = $1 RETURNING {COLUMNS}"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(item_from_row).transpose()?)
    }

    async fn ping(&self) -> bool {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "database ping failed");
                false
            }
        }
    }
}

impl LifecycleService for PgItemRepository {
    fn name(&self) -> &str {
        DATABASE_SERVICE
    }

    fn start(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.migrate().await?;
            tracing::info!(
                connections = self.pool.size(),
                "connected to PostgreSQL item store"
            );
            Ok(())
        })
    }

    fn stop(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.pool.close().await;
            tracing::info!("PostgreSQL pool closed");
            Ok(())
        })
    }

    fn is_healthy(&self) -> BoxFuture<'_, bool> {
        Box::pin(async move { !self.pool.is_closed() && self.ping().await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("lamp"), "%lamp%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
    }

    #[test]
    fn test_filters_sql() {
        let params = ListParams {
            search: Some("desk".into()),
            min_price: Some(10.into()),
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM items");
        push_filters(&mut qb, &params);
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM items WHERE TRUE AND price >= $1 AND (name ILIKE $2 OR description ILIKE $3)"
        );
    }
}

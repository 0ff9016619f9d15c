use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use common::{Money, OrderId, OrderItemId, OrderStatus, ProductId, UserId};
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    NewOrder, NewProduct, NewUser, Order, OrderItem, Product, ProductChanges, Result, StoreError,
    User,
    store::{Store, validate_new_order},
};

const USER_COLUMNS: &str = "id, email, password_hash, is_admin, created_at";
const PRODUCT_COLUMNS: &str = "id, name, description, price_cents, stock, created_at, updated_at";
const ORDER_COLUMNS: &str = "id, user_id, status, total_cents, ordered_at, updated_at";
const ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, unit_price_cents";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_user(row: PgRow) -> Result<User> {
        Ok(User {
            id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            is_admin: row.try_get("is_admin")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            stock: row.try_get("stock")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_order(row: &PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        let status = OrderStatus::parse(&status).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            status,
            total: Money::from_cents(row.try_get("total_cents")?),
            ordered_at: row.try_get("ordered_at")?,
            updated_at: row.try_get("updated_at")?,
            items: Vec::new(),
        })
    }

    fn row_to_item(row: &PgRow) -> Result<OrderItem> {
        let quantity: i32 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity)
            .map_err(|_| StoreError::Corrupt(format!("negative quantity {quantity}")))?;

        Ok(OrderItem {
            id: OrderItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            quantity,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
        })
    }

    /// Loads the lines for a set of orders, grouped by order and in line order.
    async fn fetch_items(
        conn: &mut PgConnection,
        order_ids: &[Uuid],
    ) -> Result<HashMap<OrderId, Vec<OrderItem>>> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ANY($1) ORDER BY order_id, position ASC"
        ))
        .bind(order_ids)
        .fetch_all(&mut *conn)
        .await?;

        let mut grouped: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for row in &rows {
            let item = Self::row_to_item(row)?;
            grouped.entry(item.order_id).or_default().push(item);
        }
        Ok(grouped)
    }

    /// Maps unique-constraint violations to their domain meaning.
    fn map_unique_violation(err: sqlx::Error, value: &str) -> StoreError {
        if let sqlx::Error::Database(ref db_err) = err {
            match db_err.constraint() {
                Some("products_active_name_key") => {
                    return StoreError::DuplicateName(value.to_string());
                }
                Some("users_email_key") => return StoreError::DuplicateEmail(value.to_string()),
                _ => {}
            }
        }
        StoreError::Database(err)
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let row = sqlx::query(&format!(
            "INSERT INTO users (id, email, password_hash, is_admin) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Self::map_unique_violation(e, &user.email))?;

        Self::row_to_user(row)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_user).transpose()
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO products (id, name, description, price_cents, stock)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(product.stock)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Self::map_unique_violation(e, &product.name))?;

        Self::row_to_product(row)
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn find_product_by_name(&self, name: &str) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE name = $1 AND deleted_at IS NULL"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE deleted_at IS NULL ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn update_product(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE products SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                price_cents = COALESCE($4, price_cents),
                stock = COALESCE($5, stock),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(changes.name.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.price.map(|p| p.cents()))
        .bind(changes.stock)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Self::map_unique_violation(e, changes.name.as_deref().unwrap_or_default()))?;

        row.map(Self::row_to_product).transpose()
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE products SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order> {
        validate_new_order(&order)?;

        // Start a transaction; dropping it without commit rolls back
        let mut tx = self.pool.begin().await?;

        // Lock referenced products so a concurrent delete waits for us
        for item in &order.items {
            let exists: Option<Uuid> = sqlx::query_scalar(
                "SELECT id FROM products WHERE id = $1 AND deleted_at IS NULL FOR SHARE",
            )
            .bind(item.product_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?;

            if exists.is_none() {
                return Err(StoreError::ProductNotFound(item.product_id));
            }
        }

        let order_id = Uuid::new_v4();
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO orders (id, user_id, status, total_cents, ordered_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order_id)
        .bind(order.user_id.as_uuid())
        .bind(OrderStatus::Pending.as_str())
        .bind(order.total.cents())
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;
        let mut created = Self::row_to_order(&row)?;

        for (position, item) in order.items.iter().enumerate() {
            let row = sqlx::query(&format!(
                r#"
                INSERT INTO order_items (id, order_id, product_id, quantity, unit_price_cents, position)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING {ITEM_COLUMNS}
                "#
            ))
            .bind(Uuid::new_v4())
            .bind(order_id)
            .bind(item.product_id.as_uuid())
            .bind(item.quantity as i32)
            .bind(item.unit_price.cents())
            .bind(position as i32)
            .fetch_one(&mut *tx)
            .await?;

            created.items.push(Self::row_to_item(&row)?);
        }

        tx.commit().await?;

        tracing::debug!(order_id = %created.id, items = created.items.len(), "order inserted");
        Ok(created)
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>> {
        let mut conn = self.pool.acquire().await?;

        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *conn)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut order = Self::row_to_order(&row)?;
        let mut items = Self::fetch_items(&mut conn, &[id.as_uuid()]).await?;
        order.items = items.remove(&id).unwrap_or_default();
        Ok(Some(order))
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let mut conn = self.pool.acquire().await?;

        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY ordered_at ASC, id ASC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&mut *conn)
        .await?;

        let mut orders = rows
            .iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;

        let ids: Vec<Uuid> = orders.iter().map(|o| o.id.as_uuid()).collect();
        let mut items = Self::fetch_items(&mut conn, &ids).await?;
        for order in &mut orders {
            order.items = items.remove(&order.id).unwrap_or_default();
        }

        Ok(orders)
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        new: OrderStatus,
    ) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        // Row lock serialises concurrent transitions of the same order
        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
                .bind(id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;

        let current = current.ok_or(StoreError::OrderNotFound(id))?;
        let actual = OrderStatus::parse(&current).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        if actual != expected {
            return Err(StoreError::StatusConflict {
                order_id: id,
                expected,
                actual,
            });
        }

        let row = sqlx::query(&format!(
            "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(new.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let mut order = Self::row_to_order(&row)?;
        let mut items = Self::fetch_items(&mut tx, &[id.as_uuid()]).await?;
        order.items = items.remove(&id).unwrap_or_default();

        tx.commit().await?;
        Ok(order)
    }
}

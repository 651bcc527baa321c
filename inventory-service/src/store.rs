use anyhow::Result;
use async_trait::async_trait;
use diesel::dsl::Find;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_builder::{DeleteStatement, InsertStatement, IntoUpdateTarget, UpdateStatement};
use diesel_async::{pooled_connection::bb8::Pool, AsyncPgConnection, RunQueryDsl};

use crate::models::{NewProduct, Product};
use crate::schema::products;

pub type DbPool = Pool<AsyncPgConnection>;

/// Persistence operations behind the product routes.
///
/// Each method maps to exactly one SQL statement. `get`, `update` and
/// `delete` report a missing row through their return value, never as an
/// error.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// All products, newest `created_at` first.
    async fn list(&self) -> Result<Vec<Product>>;

    async fn get(&self, id: i32) -> Result<Option<Product>>;

    /// Inserts a row and returns it with the datastore-assigned `id` and `created_at`.
    async fn create(&self, product: NewProduct) -> Result<Product>;

    /// Overwrites every mutable column of the row.
    async fn update(&self, id: i32, product: NewProduct) -> Result<Option<Product>>;

    /// Returns `false` when no row had this id.
    async fn delete(&self, id: i32) -> Result<bool>;
}

type ById = <Find<products::table, i32> as IntoUpdateTarget>::WhereClause;

fn list_query() -> products::BoxedQuery<'static, Pg> {
    products::table
        .order(products::created_at.desc())
        .into_boxed()
}

fn get_query(id: i32) -> products::BoxedQuery<'static, Pg> {
    products::table.find(id).into_boxed()
}

fn insert_query(
    product: NewProduct,
) -> InsertStatement<products::table, <NewProduct as Insertable<products::table>>::Values> {
    diesel::insert_into(products::table).values(product)
}

fn update_query(
    id: i32,
    product: NewProduct,
) -> UpdateStatement<products::table, ById, <NewProduct as AsChangeset>::Changeset> {
    diesel::update(products::table.find(id)).set(product)
}

fn delete_query(id: i32) -> DeleteStatement<products::table, ById> {
    diesel::delete(products::table.find(id))
}

pub struct PgProductStore {
    pool: DbPool,
}

impl PgProductStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn list(&self) -> Result<Vec<Product>> {
        let mut conn = self.pool.get().await?;

        let rows = list_query().load::<Product>(&mut *conn).await?;
        Ok(rows)
    }

    async fn get(&self, id: i32) -> Result<Option<Product>> {
        let mut conn = self.pool.get().await?;

        let row = get_query(id)
            .first::<Product>(&mut *conn)
            .await
            .optional()?;
        Ok(row)
    }

    async fn create(&self, product: NewProduct) -> Result<Product> {
        let mut conn = self.pool.get().await?;

        let row = insert_query(product)
            .get_result::<Product>(&mut *conn)
            .await?;
        Ok(row)
    }

    async fn update(&self, id: i32, product: NewProduct) -> Result<Option<Product>> {
        let mut conn = self.pool.get().await?;

        let row = update_query(id, product)
            .get_result::<Product>(&mut *conn)
            .await
            .optional()?;
        Ok(row)
    }

    async fn delete(&self, id: i32) -> Result<bool> {
        let mut conn = self.pool.get().await?;

        let deleted = delete_query(id).execute(&mut *conn).await?;
        Ok(deleted > 0)
    }
}

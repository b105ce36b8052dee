use anyhow::{Context, Result};
use mongodb::options::ClientOptions;
use mongodb::{
    Client, Collection, Database as MongoDatabase,
    bson::{Document, doc, oid::ObjectId, to_document},
};
use once_cell::sync::OnceCell;
use serde::{Serialize, de::DeserializeOwned};

use crate::config::CONFIG;
use crate::data_models::{ColumnLineage, LineageRecord, TableLineage, TableMetadata};
use crate::task::Loader;

/// Global database instance
static DB: OnceCell<Database> = OnceCell::new();

/// Collection names as constants for consistency
pub mod collections {
    pub const TABLES: &str = "tables";
    pub const TABLE_LINEAGE: &str = "table_lineage";
    pub const COLUMN_LINEAGE: &str = "column_lineage";
}

/// Main database wrapper providing connection management and collection access
#[derive(Debug, Clone)]
pub struct Database {
    client: Client,
    db: MongoDatabase,
}

impl Database {
    /// Create a new Database instance with custom URI and database name.
    /// Useful for testing with a different database.
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        let client_options = ClientOptions::parse(uri)
            .await
            .context("Failed to parse MongoDB connection string")?;

        let client =
            Client::with_options(client_options).context("Failed to create MongoDB client")?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .context("Failed to connect to MongoDB")?;

        log::info!("Connected to MongoDB database: {}", db_name);

        let db = client.database(db_name);

        Ok(Self { client, db })
    }

    /// Create a Database instance using environment configuration
    pub async fn from_config() -> Result<Self> {
        Self::new(CONFIG.mongo_uri(), &CONFIG.mongo_db_name).await
    }

    /// Initialize the global database instance.
    /// Call this once at application startup.
    pub async fn init_global() -> Result<&'static Database> {
        let db = Self::from_config().await?;
        DB.set(db)
            .map_err(|_| anyhow::anyhow!("Database already initialized"))?;
        Ok(Self::get())
    }

    /// Get the global database instance.
    /// Panics if database hasn't been initialized.
    pub fn get() -> &'static Database {
        DB.get()
            .expect("Database not initialized. Call Database::init_global() first.")
    }

    /// Get a typed collection by name
    pub fn collection<T>(&self, name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        self.db.collection(name)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn tables(&self) -> Collection<TableMetadata> {
        self.collection(collections::TABLES)
    }

    pub fn table_lineage(&self) -> Collection<TableLineage> {
        self.collection(collections::TABLE_LINEAGE)
    }

    pub fn column_lineage(&self) -> Collection<ColumnLineage> {
        self.collection(collections::COLUMN_LINEAGE)
    }
}

// =============================================================================
// Generic CRUD operations
// =============================================================================

pub struct Repository<T>
where
    T: Send + Sync,
{
    collection: Collection<T>,
}

impl<T> Repository<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    pub fn new(collection: Collection<T>) -> Self {
        Self { collection }
    }

    pub async fn insert(&self, doc: &T) -> Result<ObjectId> {
        let result = self
            .collection
            .insert_one(doc)
            .await
            .context("Failed to insert document")?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow::anyhow!("Failed to get inserted ObjectId"))
    }

    pub async fn find_one(&self, filter: Document) -> Result<Option<T>> {
        self.collection
            .find_one(filter)
            .await
            .context("Failed to find document")
    }

    pub async fn find(&self, filter: Document) -> Result<Vec<T>> {
        use futures::TryStreamExt;

        let cursor = self
            .collection
            .find(filter)
            .await
            .context("Failed to execute find query")?;

        cursor
            .try_collect()
            .await
            .context("Failed to collect results")
    }

    pub async fn find_all(&self) -> Result<Vec<T>> {
        self.find(doc! {}).await
    }

    pub async fn count(&self, filter: Document) -> Result<u64> {
        self.collection
            .count_documents(filter)
            .await
            .context("Failed to count documents")
    }

    /// Overwrites the document matching `key` when `existing_id` is known,
    /// inserts `doc` otherwise. Returns the id of the stored document.
    pub async fn upsert_by(
        &self,
        key: Document,
        doc: &T,
        existing_id: Option<ObjectId>,
    ) -> Result<ObjectId> {
        let mut serialized = to_document(doc)?;
        // _id is immutable, keep whatever the stored document already has
        serialized.remove("_id");

        match existing_id {
            Some(id) => {
                self.collection
                    .update_one(key, doc! { "$set": serialized })
                    .await
                    .context("failed to upsert document")?;
                Ok(id)
            }
            None => self.insert(doc).await,
        }
    }
}

// =============================================================================
// Table metadata
// =============================================================================

pub struct TableRepo {
    repo: Repository<TableMetadata>,
}

impl TableRepo {
    pub fn new(db: &Database) -> Self {
        Self {
            repo: Repository::new(db.tables()),
        }
    }

    fn key_of(table: &TableMetadata) -> Document {
        doc! {
            "database": &table.database,
            "cluster": &table.cluster,
            "schema": &table.schema,
            "name": &table.name,
        }
    }

    pub async fn upsert(&self, table: &TableMetadata) -> Result<ObjectId> {
        let key = Self::key_of(table);
        let existing = self.repo.find_one(key.clone()).await?.map(|t| t.id);
        self.repo.upsert_by(key, table, existing).await
    }

    pub async fn find_by_key(
        &self,
        database: &str,
        cluster: &str,
        schema: &str,
        name: &str,
    ) -> Result<Option<TableMetadata>> {
        self.repo
            .find_one(doc! {
                "database": database,
                "cluster": cluster,
                "schema": schema,
                "name": name,
            })
            .await
    }

    pub async fn find_by_schema(&self, schema: &str) -> Result<Vec<TableMetadata>> {
        self.repo.find(doc! { "schema": schema }).await
    }

    pub async fn list_all(&self) -> Result<Vec<TableMetadata>> {
        self.repo.find_all().await
    }

    pub async fn count(&self) -> Result<u64> {
        self.repo.count(doc! {}).await
    }
}

// =============================================================================
// Lineage
// =============================================================================

pub struct LineageRepo {
    tables: Repository<TableLineage>,
    columns: Repository<ColumnLineage>,
}

impl LineageRepo {
    pub fn new(db: &Database) -> Self {
        Self {
            tables: Repository::new(db.table_lineage()),
            columns: Repository::new(db.column_lineage()),
        }
    }

    pub async fn upsert(&self, record: &LineageRecord) -> Result<ObjectId> {
        match record {
            LineageRecord::Table(table) => {
                let key = doc! { "table_key": &table.table_key };
                let existing = self.tables.find_one(key.clone()).await?.map(|t| t.id);
                self.tables.upsert_by(key, table, existing).await
            }
            LineageRecord::Column(column) => {
                let key = doc! { "column_key": &column.column_key };
                let existing = self.columns.find_one(key.clone()).await?.map(|c| c.id);
                self.columns.upsert_by(key, column, existing).await
            }
        }
    }

    pub async fn find_table(&self, table_key: &str) -> Result<Option<TableLineage>> {
        self.tables.find_one(doc! { "table_key": table_key }).await
    }

    pub async fn find_column(&self, column_key: &str) -> Result<Option<ColumnLineage>> {
        self.columns.find_one(doc! { "column_key": column_key }).await
    }

    /// Tables whose lineage lists `table_key` as a downstream dependency.
    pub async fn find_upstream_tables(&self, table_key: &str) -> Result<Vec<TableLineage>> {
        self.tables
            .find(doc! { "downstream_deps": table_key })
            .await
    }
}

// =============================================================================
// Loaders
// =============================================================================

impl Loader<TableMetadata> for TableRepo {
    async fn load(&mut self, record: TableMetadata) -> Result<()> {
        let id = self.upsert(&record).await?;
        log::debug!("stored table {} as {id}", record.key());
        Ok(())
    }
}

impl Loader<LineageRecord> for LineageRepo {
    async fn load(&mut self, record: LineageRecord) -> Result<()> {
        let id = self.upsert(&record).await?;
        log::debug!("stored lineage {} as {id}", record.key());
        Ok(())
    }
}

// =============================================================================
// Test utilities
// =============================================================================


#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_models::{BIGQUERY, ColumnMetadata};
    use test_utils::*;

    fn orders_table(description: &str) -> TableMetadata {
        TableMetadata::new(
            BIGQUERY.to_string(),
            "proj".to_string(),
            "sales".to_string(),
            "orders".to_string(),
            description.to_string(),
            vec![ColumnMetadata::new(
                "id".to_string(),
                "".to_string(),
                "INT64".to_string(),
                1,
            )],
            false,
        )
    }

    #[tokio::test]
    #[ignore = "requires a running MongoDB"]
    async fn test_table_upsert() -> Result<()> {
        let (db, db_name) = create_test_db().await?;
        let repo = TableRepo::new(&db);

        let first = repo.upsert(&orders_table("v1")).await?;
        let second = repo.upsert(&orders_table("v2")).await?;
        assert_eq!(first, second);
        assert_eq!(repo.count().await?, 1);

        let found = repo
            .find_by_key(BIGQUERY, "proj", "sales", "orders")
            .await?
            .unwrap();
        assert_eq!(found.description, "v2");
        assert_eq!(repo.find_by_schema("sales").await?.len(), 1);
        assert_eq!(repo.list_all().await?.len(), 1);
        assert!(repo.find_by_schema("hr").await?.is_empty());

        cleanup_test_db(&db, &db_name).await?;
        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a running MongoDB"]
    async fn test_lineage_upsert() -> Result<()> {
        let (db, db_name) = create_test_db().await?;
        let mut repo = LineageRepo::new(&db);

        let orders = "bigquery://proj.sales/orders".to_string();
        let daily = "bigquery://proj.sales/daily".to_string();
        repo.load(LineageRecord::Table(TableLineage::new(
            orders.clone(),
            vec![],
        )))
        .await?;
        repo.load(LineageRecord::Table(TableLineage::new(
            orders.clone(),
            vec![daily.clone()],
        )))
        .await?;
        repo.load(LineageRecord::Column(ColumnLineage::new(
            format!("{orders}/id"),
            vec![format!("{daily}/order_id")],
        )))
        .await?;

        let table = repo.find_table(&orders).await?.unwrap();
        assert_eq!(table.downstream_deps, vec![daily.clone()]);
        let upstream = repo.find_upstream_tables(&daily).await?;
        assert_eq!(upstream.len(), 1);
        assert_eq!(upstream[0].table_key, orders);
        assert!(repo.find_column(&format!("{orders}/id")).await?.is_some());

        cleanup_test_db(&db, &db_name).await?;
        Ok(())
    }
}

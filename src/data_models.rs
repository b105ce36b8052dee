use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

pub const BIGQUERY: &str = "bigquery";

/// `database://cluster.schema/table`, the key lineage records refer to.
pub fn table_key(database: &str, cluster: &str, schema: &str, table: &str) -> String {
    format!("{database}://{cluster}.{schema}/{table}")
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TableMetadata {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub database: String,
    pub cluster: String,
    pub schema: String,
    pub name: String,
    pub description: String,
    pub columns: Vec<ColumnMetadata>,
    pub is_view: bool,
    pub tags: Vec<String>,
    pub extracted_at: DateTime,
}

impl TableMetadata {
    pub fn new(
        database: String,
        cluster: String,
        schema: String,
        name: String,
        description: String,
        columns: Vec<ColumnMetadata>,
        is_view: bool,
    ) -> TableMetadata {
        TableMetadata {
            id: ObjectId::new(),
            database,
            cluster,
            schema,
            name,
            description,
            columns,
            is_view,
            tags: vec![],
            extracted_at: DateTime::now(),
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn key(&self) -> String {
        table_key(&self.database, &self.cluster, &self.schema, &self.name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ColumnMetadata {
    pub name: String,
    pub description: String,
    pub col_type: String,
    pub sort_order: i64,
    pub tags: Vec<String>,
}

impl ColumnMetadata {
    pub fn new(name: String, description: String, col_type: String, sort_order: i64) -> Self {
        ColumnMetadata {
            name,
            description,
            col_type,
            sort_order,
            tags: vec![],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TableLineage {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub table_key: String,
    pub downstream_deps: Vec<String>,
}

impl TableLineage {
    pub fn new(table_key: String, downstream_deps: Vec<String>) -> TableLineage {
        TableLineage {
            id: ObjectId::new(),
            table_key,
            downstream_deps,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ColumnLineage {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub column_key: String,
    pub downstream_deps: Vec<String>,
}

impl ColumnLineage {
    pub fn new(column_key: String, downstream_deps: Vec<String>) -> ColumnLineage {
        ColumnLineage {
            id: ObjectId::new(),
            column_key,
            downstream_deps,
        }
    }
}

/// One unit of lineage output, in the order the extractor emits them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineageRecord {
    Column(ColumnLineage),
    Table(TableLineage),
}

impl LineageRecord {
    pub fn key(&self) -> &str {
        match self {
            LineageRecord::Column(c) => &c.column_key,
            LineageRecord::Table(t) => &t.table_key,
        }
    }

    pub fn downstream_deps(&self) -> &[String] {
        match self {
            LineageRecord::Column(c) => &c.downstream_deps,
            LineageRecord::Table(t) => &t.downstream_deps,
        }
    }
}

//! Response shapes of the Datafold `tables` GraphQL query.
//!
//! The metadata and lineage queries select different fields of the same
//! objects, so every field a query may leave out defaults to empty.

use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TablesData {
    pub tables: TableItems,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TableItems {
    #[serde(default)]
    pub items: Vec<TableNode>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TableNode {
    pub prop: TableProp,
    #[serde(default)]
    pub descriptions: Vec<Description>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub columns: Vec<ColumnNode>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TableProp {
    pub path: String,
    #[serde(default)]
    pub data_source_id: Option<i64>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ColumnNode {
    pub prop: ColumnProp,
    #[serde(default)]
    pub descriptions: Vec<Description>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub downstream: Vec<DownstreamColumn>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ColumnProp {
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub db_type: Option<String>,
    #[serde(default)]
    pub number: Option<i64>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Description {
    pub description: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Tag {
    pub name: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DownstreamColumn {
    pub prop: DownstreamColumnProp,
    pub table: DownstreamTable,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DownstreamColumnProp {
    pub name: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DownstreamTable {
    pub prop: DownstreamTableProp,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DownstreamTableProp {
    pub path: String,
}

/// First description text, or empty when none was written.
pub fn first_description(descriptions: &[Description]) -> String {
    descriptions
        .first()
        .map(|d| d.description.clone())
        .unwrap_or_default()
}

use std::vec;

use crate::data_models::{BIGQUERY, ColumnMetadata, TableMetadata};
use crate::datafold::graphql::{ColumnNode, TablesData, first_description};
use crate::datafold::{DatafoldClient, DatafoldError, TablePath};
use crate::task::Extractor;

pub fn metadata_query(data_source_id: i64) -> String {
    format!(
        r#"
query {{
  tables(dataSourceId: {data_source_id}) {{
    items {{
      prop {{
        path
        dataSourceId
      }}
      descriptions {{
        description
      }}
      tags {{
        name
      }}
      columns {{
        prop {{
          name
          type
          dbType
          number
        }}
        descriptions {{
          description
        }}
        tags {{
          name
        }}
      }}
    }}
  }}
}}
"#
    )
}

/// Turns a `tables` response into catalog table records.
pub fn process_metadata(data: TablesData) -> Result<Vec<TableMetadata>, DatafoldError> {
    let mut tables = Vec::with_capacity(data.tables.items.len());
    for table in data.tables.items {
        let path = TablePath::parse(&table.prop.path)?;
        let description = first_description(&table.descriptions);
        let columns = parse_columns(table.columns);
        let tags = table.tags.into_iter().map(|t| t.name).collect();

        tables.push(
            TableMetadata::new(
                BIGQUERY.to_string(),
                path.cluster,
                path.schema,
                path.table,
                description,
                columns,
                false,
            )
            .with_tags(tags),
        );
    }
    Ok(tables)
}

fn parse_columns(columns: Vec<ColumnNode>) -> Vec<ColumnMetadata> {
    columns
        .into_iter()
        .map(|col| {
            let description = first_description(&col.descriptions);
            let prop = col.prop;
            let col_type = prop.db_type.or(prop.kind).unwrap_or_default();
            let mut column = ColumnMetadata::new(
                prop.name,
                description,
                col_type,
                prop.number.unwrap_or_default(),
            );
            column.tags = col.tags.into_iter().map(|t| t.name).collect();
            column
        })
        .collect()
}

/// Yields every table Datafold knows for the configured data source.
pub struct DatafoldMetadataExtractor {
    tables: vec::IntoIter<TableMetadata>,
}

impl DatafoldMetadataExtractor {
    /// Fetches and processes the whole table listing up front.
    pub async fn init(client: &DatafoldClient) -> Result<Self, DatafoldError> {
        let query = metadata_query(client.config().data_source_id);
        let data: TablesData = client.execute(&query).await?;
        log::info!("datafold returned {} tables", data.tables.items.len());
        Ok(Self::from_tables(process_metadata(data)?))
    }

    pub fn from_tables(tables: Vec<TableMetadata>) -> Self {
        Self {
            tables: tables.into_iter(),
        }
    }
}

impl Extractor for DatafoldMetadataExtractor {
    type Record = TableMetadata;

    fn extract(&mut self) -> Option<TableMetadata> {
        self.tables.next()
    }

    fn scope(&self) -> &'static str {
        "extractor.datafold_metadata_extractor"
    }
}

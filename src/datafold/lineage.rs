use std::collections::BTreeSet;
use std::vec;

use crate::data_models::{ColumnLineage, LineageRecord, TableLineage};
use crate::datafold::graphql::TablesData;
use crate::datafold::{DatafoldClient, DatafoldError, TablePath};
use crate::task::Extractor;

pub fn lineage_query(data_source_id: i64) -> String {
    format!(
        r#"
query {{
  tables(dataSourceId: {data_source_id}) {{
    items {{
      prop {{
        path
        dataSourceId
      }}
      columns {{
        prop {{
          name
        }}
        downstream {{
          prop {{
            name
          }}
          table {{
            prop {{
              path
            }}
          }}
        }}
      }}
    }}
  }}
}}
"#
    )
}

/// Turns a `tables` response into lineage records.
///
/// Per table: the column lineage of every column with downstream columns,
/// then the table lineage. A table without downstream still gets a table
/// record with no deps.
pub fn process_lineage(data: TablesData) -> Result<Vec<LineageRecord>, DatafoldError> {
    let mut lineage = Vec::new();

    for table in data.tables.items {
        let path = TablePath::parse(&table.prop.path)?;
        let table_key = path.table_key();
        let mut downstream_tables = BTreeSet::new();

        for col in table.columns {
            if col.downstream.is_empty() {
                continue;
            }

            let mut downstream_columns = Vec::with_capacity(col.downstream.len());
            for ds_col in col.downstream {
                let ds_table = TablePath::parse(&ds_col.table.prop.path)?;
                downstream_columns.push(ds_table.column_key(&ds_col.prop.name));
                downstream_tables.insert(ds_table.table_key());
            }

            lineage.push(LineageRecord::Column(ColumnLineage::new(
                path.column_key(&col.prop.name),
                downstream_columns,
            )));
        }

        lineage.push(LineageRecord::Table(TableLineage::new(
            table_key,
            downstream_tables.into_iter().collect(),
        )));
    }

    Ok(lineage)
}

pub struct DatafoldLineageExtractor {
    records: vec::IntoIter<LineageRecord>,
}

impl DatafoldLineageExtractor {
    pub async fn init(client: &DatafoldClient) -> Result<Self, DatafoldError> {
        let query = lineage_query(client.config().data_source_id);
        let data: TablesData = client.execute(&query).await?;
        let records = process_lineage(data)?;
        log::info!("datafold lineage produced {} records", records.len());
        Ok(Self::from_records(records))
    }

    pub fn from_records(records: Vec<LineageRecord>) -> Self {
        Self {
            records: records.into_iter(),
        }
    }
}

impl Extractor for DatafoldLineageExtractor {
    type Record = LineageRecord;

    fn extract(&mut self) -> Option<LineageRecord> {
        self.records.next()
    }

    fn scope(&self) -> &'static str {
        "extractor.datafold_lineage_extractor"
    }
}

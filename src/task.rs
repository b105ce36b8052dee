use anyhow::Result;

/// A source of records that have already been fetched and are handed out one
/// at a time.
pub trait Extractor {
    type Record;

    /// Next record, or `None` once drained.
    fn extract(&mut self) -> Option<Self::Record>;

    /// Name used in logs, e.g. `extractor.datafold_metadata_extractor`.
    fn scope(&self) -> &'static str;
}

/// A sink for extracted records.
pub trait Loader<R> {
    fn load(&mut self, record: R) -> impl Future<Output = Result<()>> + Send;

    /// Flushes whatever the loader buffered. Called once after the last record.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }
}

/// Collects records in memory.
impl<R: Send> Loader<R> for Vec<R> {
    async fn load(&mut self, record: R) -> Result<()> {
        self.push(record);
        Ok(())
    }
}

/// Drains `extractor` into `loader` and returns how many records moved.
pub async fn run<E, L>(mut extractor: E, loader: &mut L) -> Result<usize>
where
    E: Extractor,
    L: Loader<E::Record>,
{
    log::info!("running task for {}", extractor.scope());
    let mut count = 0;
    while let Some(record) = extractor.extract() {
        loader.load(record).await?;
        count += 1;
    }
    loader.close().await?;
    log::info!("{} produced {count} records", extractor.scope());
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Countdown(u32);

    impl Extractor for Countdown {
        type Record = u32;

        fn extract(&mut self) -> Option<u32> {
            if self.0 == 0 {
                return None;
            }
            self.0 -= 1;
            Some(self.0)
        }

        fn scope(&self) -> &'static str {
            "extractor.countdown"
        }
    }

    #[tokio::test]
    async fn test_run_drains_extractor() -> Result<()> {
        let mut sink = Vec::new();
        let count = run(Countdown(3), &mut sink).await?;
        assert_eq!(count, 3);
        assert_eq!(sink, vec![2, 1, 0]);
        Ok(())
    }

    #[tokio::test]
    async fn test_run_empty_extractor() -> Result<()> {
        let mut sink: Vec<u32> = Vec::new();
        assert_eq!(run(Countdown(0), &mut sink).await?, 0);
        assert!(sink.is_empty());
        Ok(())
    }
}

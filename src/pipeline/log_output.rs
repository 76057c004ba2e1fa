use crate::pipeline::{CrawledItem, ItemProcessor, SinkFailure};
use crate::SinkError;
use std::io::Write;

/// Dumps every item as one JSON line
pub struct LogItemProcessor {
    out: Box<dyn Write + Send>,
}

impl LogItemProcessor {
    /// Writes to standard output
    pub fn stdout() -> Self {
        Self::with_writer(std::io::stdout())
    }

    pub fn with_writer(out: impl Write + Send + 'static) -> Self {
        Self { out: Box::new(out) }
    }

    fn write_line(&mut self, item: &CrawledItem) -> Result<(), SinkError> {
        let line = serde_json::to_string(item)?;
        writeln!(self.out, "{}", line)?;
        self.out.flush()?;
        Ok(())
    }
}

impl ItemProcessor for LogItemProcessor {
    fn name(&self) -> &str {
        "log"
    }

    fn process_item(&mut self, item: CrawledItem) -> Result<CrawledItem, SinkFailure> {
        match self.write_line(&item) {
            Ok(()) => Ok(item),
            Err(e) => Err(SinkFailure::new(item, e)),
        }
    }
}

use crate::context::OpContext;
use crate::error::Result;
use crate::traits::CellStore;
use crate::types::{Cell, Cursor};

/// Drains a store page by page from a cursor
///
/// Each page starts strictly after the last cell of the previous one. Over
/// `added_at` a consumer that persists [`PartitionScanner::cursor`] between
/// runs resumes without gaps or repeats. Over `created_at` the cursor compares
/// the timestamp alone, so cells sharing the timestamp of a page's last cell
/// are skipped when the page ends inside that run; use `added_at` for
/// exactly-once draining.
pub struct PartitionScanner<'a, S: CellStore + ?Sized> {
    store: &'a S,
    cursor: Cursor,
    page_size: usize,
}

impl<'a, S: CellStore + ?Sized> PartitionScanner<'a, S> {
    pub fn new(store: &'a S, cursor: Cursor, page_size: usize) -> Self {
        Self {
            store,
            cursor,
            page_size,
        }
    }

    /// Position after the last cell handed out
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Next page, or `None` once caught up with the head
    pub fn next_page(&mut self, ctx: &OpContext) -> Result<Option<Vec<Cell>>> {
        let cells = self
            .store
            .partition_read(ctx, self.cursor, self.page_size)?;

        match cells.last() {
            Some(last) => {
                self.cursor = Cursor::at(last, self.cursor.dimension());
                Ok(Some(cells))
            }
            None => Ok(None),
        }
    }

    /// Read every remaining page into one vector
    pub fn drain(&mut self, ctx: &OpContext) -> Result<Vec<Cell>> {
        let mut out = Vec::new();
        while let Some(page) = self.next_page(ctx)? {
            out.extend(page);
        }
        Ok(out)
    }
}

//! Put command implementation

use anyhow::{Context, Result};
use cellar::prelude::*;
use std::io::Read;
use std::path::PathBuf;

/// Returns the process exit code: 0 when written, 2 when the version exists.
pub fn execute(
    location: &str,
    row_key: &str,
    column_name: &str,
    ref_key: i64,
    body: Option<String>,
    file: Option<PathBuf>,
) -> Result<u8> {
    let body = match (body, file) {
        (Some(body), _) => body.into_bytes(),
        (None, Some(path)) => std::fs::read(&path)
            .with_context(|| format!("Failed to read body from {}", path.display()))?,
        (None, None) => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read body from stdin")?;
            buf
        }
    };

    let store = super::open(location)?;
    let ctx = OpContext::background();

    let code = match store.put_cell(&ctx, row_key, column_name, ref_key, &body) {
        Ok(added_at) => {
            println!("✓ Wrote {}/{}@{} as added_at {}", row_key, column_name, ref_key, added_at);
            Ok(0)
        }
        Err(e) if e.is_constraint_violation() => {
            println!("Cell {}/{}@{} already exists, not overwritten", row_key, column_name, ref_key);
            Ok(2)
        }
        Err(e) => Err(e).context("Failed to write cell"),
    };

    store.destroy(&ctx).context("Failed to close store")?;
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_put_exits_two_and_keeps_first_body() {
        let temp_dir = tempfile::tempdir().unwrap();
        let location = temp_dir.path().join("cells");
        let location = location.to_str().unwrap();

        assert_eq!(execute(location, "r", "c", 1, Some("first".into()), None).unwrap(), 0);
        assert_eq!(execute(location, "r", "c", 1, Some("second".into()), None).unwrap(), 2);

        let store = cellar::open(location).unwrap();
        let cell = store
            .get_cell(&OpContext::background(), "r", "c", 1)
            .unwrap()
            .unwrap();
        assert_eq!(cell.body, b"first");
    }
}

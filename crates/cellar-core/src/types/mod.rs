pub mod cell;
pub mod cursor;

pub use cell::{Body, Cell, CellKey, NewCell, Sequence, MAX_COLUMN_NAME_LEN, MAX_ROW_KEY_LEN};
pub use cursor::{Cursor, CursorDimension};

pub mod store;

pub use store::CellStore;

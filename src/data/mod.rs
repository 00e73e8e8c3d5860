//! In-memory tables handed to the engine by the I/O layer.

mod count_table;
mod numeric_table;

pub use count_table::CountTable;
pub use numeric_table::NumericTable;

pub mod filter;
pub mod period;
pub mod schema;
pub mod table;
pub mod value;

//! L2: table access layer. Column-typed lazy readers over the base
//! FIADB tables, behind a two-backend seam.

pub mod backend;
pub mod columnar;
pub mod compat;
pub mod decode;
pub mod schema;

pub use backend::{auto_detect, validate_schema, Backend};
pub use columnar::ColumnarBackend;
pub use compat::CompatBackend;
pub use schema::TableName;

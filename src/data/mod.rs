//! Data layer: table snapshot, loading, filtering and querying.
//!
//! Architecture:
//! ```text
//!   LE.txt (delimited text, header row)
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader  │  parse file, derive _name/_price/_sn → Table
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  Table   │  immutable Vec<Row>, columns, identifier column
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter  │  name / sn / search predicates → row indices
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  query   │  sort → paginate → Page
//!   └──────────┘
//! ```

pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod query;

pub use error::{LoadError, QueryError};
pub use loader::SourceFile;
pub use model::Table;
pub use query::QueryParams;

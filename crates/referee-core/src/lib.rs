pub mod config;
pub mod errors;
pub mod judge;
pub mod model;
pub mod oracle;
pub mod stats;
pub mod store;

// Convenience re-exports
pub use config::{load_matrix, EvalMatrix};
pub use errors::{ConfigError, OracleError};
pub use judge::{Judge, JudgedBatch};
pub use model::{
    CoarseType, Correctness, DatasetVariant, Entry, FineCategory, JudgeResponse, Permutation,
    Response,
};
pub use oracle::JudgeOracle;
pub use store::{DataRoot, FileKey};

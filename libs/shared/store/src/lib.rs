pub mod gates;
pub mod table;

pub use gates::DoctorGates;
pub use table::Table;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("row not found")]
    NotFound,

    #[error("timed out waiting for write access: {0}")]
    LockTimeout(String),
}

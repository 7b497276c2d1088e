//! EventStore trait - storage collaborator seam
//!
//! The database sink only requires an insert-style contract from the
//! storage engine; the SQL dialect lives behind this trait.

use async_trait::async_trait;

use crate::DeliveryError;

/// One row as the `dhtdata` table expects it.
///
/// `ip` and `systime` come from the local host-info helpers, not from the
/// event itself.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    /// Device identifier (MAC column)
    pub mac: String,
    /// Local host IP at insert time
    pub ip: String,
    pub temperature: f64,
    pub humidity: f64,
    /// 14-digit YYYYMMDDHHMMSS string
    pub systime: String,
}

/// Insert-style storage contract.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Insert exactly one row. Must use parameterized binds, never
    /// string-interpolated SQL.
    ///
    /// # Errors
    /// Returns `StoreUnavailable` when the connection or statement fails.
    async fn insert(&self, row: &EventRow) -> Result<(), DeliveryError>;
}

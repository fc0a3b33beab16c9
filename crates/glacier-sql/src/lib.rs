//! SQL bridge for Glacier: the column descriptor protocol, the client type
//! enumeration, and the process-wide driver registration boundary.
#![warn(unreachable_pub)]

pub mod client_type;
pub mod column;
pub mod config;
pub mod driver;

pub use client_type::ClientType;
pub use column::{ColumnError, ColumnInfo};
pub use config::{DriverConfig, PropertyInfo};
pub use driver::{Connection, Driver, DriverError, DriverRegistry, SqlDriver};

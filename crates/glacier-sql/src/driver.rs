use crate::config::{DriverConfig, PropertyInfo};
use std::sync::{LazyLock, PoisonError, RwLock};
use thiserror::Error as ThisError;

///
/// DriverError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum DriverError {
    #[error("a non-null url is required")]
    NullUrl,

    #[error("url '{url}' is not a glacier url")]
    UnsupportedUrl { url: String },

    #[error("unknown property '{key}'")]
    UnknownProperty { key: String },

    #[error("invalid value '{value}' for property '{key}'")]
    InvalidProperty { key: String, value: String },
}

///
/// SqlDriver
///
/// Anything the process-wide registry can hand a URL to.
///

pub trait SqlDriver: Send + Sync {
    fn accepts_url(&self, url: &str) -> bool;

    fn connect(&self, url: Option<&str>) -> Result<Option<Connection>, DriverError>;

    fn major_version(&self) -> u32;

    fn minor_version(&self) -> u32;
}

///
/// Connection
///
/// Handle over a parsed configuration. Transport lives elsewhere.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Connection {
    config: DriverConfig,
}

impl Connection {
    #[must_use]
    pub const fn config(&self) -> &DriverConfig {
        &self.config
    }
}

///
/// Driver
///
/// The crate's single driver instance. It registers itself the first time
/// the registry is touched; `register`/`deregister` are idempotent.
///

#[derive(Debug)]
pub struct Driver;

static INSTANCE: Driver = Driver;

impl Driver {
    /// Register the driver; a second call is a no-op.
    pub fn register() -> &'static Self {
        DriverRegistry::register(&INSTANCE);

        &INSTANCE
    }

    /// Remove the driver from the registry; a second call is a no-op.
    pub fn deregister() {
        DriverRegistry::deregister(&INSTANCE);
    }

    #[must_use]
    pub fn instance() -> &'static Self {
        &INSTANCE
    }

    #[must_use]
    pub fn is_registered() -> bool {
        DriverRegistry::contains(&INSTANCE)
    }

    /// Recognised properties for `url`; empty when the url is not ours.
    pub fn property_info(&self, url: &str) -> Result<Vec<PropertyInfo>, DriverError> {
        if !self.accepts_url(url) {
            return Ok(Vec::new());
        }

        Ok(DriverConfig::from_url(url)?.property_info())
    }
}

impl SqlDriver for Driver {
    fn accepts_url(&self, url: &str) -> bool {
        DriverConfig::accepts_url(url)
    }

    fn connect(&self, url: Option<&str>) -> Result<Option<Connection>, DriverError> {
        let url = url.ok_or(DriverError::NullUrl)?;
        if !self.accepts_url(url) {
            return Ok(None);
        }

        let config = DriverConfig::from_url(url)?;
        if config.debug {
            tracing::debug!(%config, "opening debug connection");
        }

        Ok(Some(Connection { config }))
    }

    fn major_version(&self) -> u32 {
        env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0)
    }

    fn minor_version(&self) -> u32 {
        env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0)
    }
}

///
/// DriverRegistry
///
/// Process-wide list of registered drivers, in registration order.
///

pub struct DriverRegistry {
    drivers: Vec<&'static dyn SqlDriver>,
}

static REGISTRY: LazyLock<RwLock<DriverRegistry>> = LazyLock::new(|| {
    tracing::debug!("registering the glacier driver");

    RwLock::new(DriverRegistry {
        drivers: vec![&INSTANCE as &'static dyn SqlDriver],
    })
});

// Drivers are compared by address; they are all statics.
fn same_driver(a: &dyn SqlDriver, b: &dyn SqlDriver) -> bool {
    std::ptr::addr_eq(a, b)
}

impl DriverRegistry {
    /// Add a driver unless it is already present.
    pub fn register(driver: &'static dyn SqlDriver) {
        let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
        if !registry.drivers.iter().any(|d| same_driver(*d, driver)) {
            registry.drivers.push(driver);
        }
    }

    /// Remove a driver if present.
    pub fn deregister(driver: &'static dyn SqlDriver) {
        let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
        registry.drivers.retain(|d| !same_driver(*d, driver));
    }

    #[must_use]
    pub fn contains(driver: &'static dyn SqlDriver) -> bool {
        REGISTRY
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .drivers
            .iter()
            .any(|d| same_driver(*d, driver))
    }

    #[must_use]
    pub fn len() -> usize {
        REGISTRY
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .drivers
            .len()
    }

    /// Hand `url` to each registered driver in order; the first connection
    /// wins. An absent url is a caller error.
    pub fn connect(url: Option<&str>) -> Result<Option<Connection>, DriverError> {
        let url = url.ok_or(DriverError::NullUrl)?;
        let drivers = REGISTRY
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .drivers
            .clone();

        for driver in drivers {
            if let Some(connection) = driver.connect(Some(url))? {
                return Ok(Some(connection));
            }
        }
        tracing::debug!(url, "no registered driver accepted the url");

        Ok(None)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_url_is_a_caller_error() {
        assert_eq!(Driver::instance().connect(None), Err(DriverError::NullUrl));
        assert_eq!(DriverRegistry::connect(None), Err(DriverError::NullUrl));
    }

    #[test]
    fn foreign_urls_yield_no_connection() {
        assert_eq!(Driver::instance().connect(Some("jdbc:mysql://h")), Ok(None));
    }

    #[test]
    fn accepted_urls_carry_their_configuration() {
        let connection = Driver::instance()
            .connect(Some("jdbc:glacier://h:9300?page.size=10"))
            .expect("url parses")
            .expect("url is accepted");

        assert_eq!(connection.config().host, "h");
        assert_eq!(connection.config().page_size, 10);
    }

    #[test]
    fn accepted_urls_with_bad_properties_fail() {
        assert!(matches!(
            Driver::instance().connect(Some("glacier://h?nope=1")),
            Err(DriverError::UnknownProperty { .. })
        ));
    }

    #[test]
    fn property_info_is_empty_for_foreign_urls() {
        let driver = Driver::instance();

        assert_eq!(driver.property_info("jdbc:mysql://h"), Ok(Vec::new()));
        assert_eq!(
            driver
                .property_info("glacier://h")
                .expect("url parses")
                .len(),
            5
        );
    }

    #[test]
    fn version_follows_the_package() {
        let driver = Driver::instance();

        assert_eq!(
            format!("{}.{}", driver.major_version(), driver.minor_version()),
            format!(
                "{}.{}",
                env!("CARGO_PKG_VERSION_MAJOR"),
                env!("CARGO_PKG_VERSION_MINOR")
            )
        );
    }
}

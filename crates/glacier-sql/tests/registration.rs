//! Registration state is process-wide, so the whole lifecycle runs in one
//! test to keep it sequential.

use glacier_sql::{Driver, DriverError, DriverRegistry, SqlDriver};

const URL: &str = "jdbc:glacier://localhost:9200";

///
/// ProbeDriver
///

struct ProbeDriver;

static PROBE: ProbeDriver = ProbeDriver;

impl SqlDriver for ProbeDriver {
    fn accepts_url(&self, url: &str) -> bool {
        url.starts_with("probe:")
    }

    fn connect(&self, url: Option<&str>) -> Result<Option<glacier_sql::Connection>, DriverError> {
        url.ok_or(DriverError::NullUrl)?;

        Ok(None)
    }

    fn major_version(&self) -> u32 {
        0
    }

    fn minor_version(&self) -> u32 {
        1
    }
}

#[test]
fn driver_registration_lifecycle() {
    // self-registered on first touch
    assert!(Driver::is_registered());
    assert!(
        DriverRegistry::connect(Some(URL))
            .expect("url parses")
            .is_some()
    );

    // register is idempotent
    let before = DriverRegistry::len();
    let driver = Driver::register();
    Driver::register();
    assert_eq!(DriverRegistry::len(), before);
    assert!(driver.accepts_url(URL));

    // deregister is idempotent and removes the driver from dispatch
    Driver::deregister();
    Driver::deregister();
    assert!(!Driver::is_registered());
    assert_eq!(DriverRegistry::connect(Some(URL)), Ok(None));
    assert_eq!(DriverRegistry::connect(None), Err(DriverError::NullUrl));

    // re-registering restores full functionality
    Driver::register();
    assert!(Driver::is_registered());
    let connection = DriverRegistry::connect(Some(URL))
        .expect("url parses")
        .expect("driver accepts its own url");
    assert_eq!(connection.config().port, 9200);

    // other drivers are consulted in registration order
    DriverRegistry::register(&PROBE);
    DriverRegistry::register(&PROBE);
    assert_eq!(DriverRegistry::len(), before + 1);
    assert_eq!(DriverRegistry::connect(Some("probe:x")), Ok(None));
    assert!(DriverRegistry::connect(Some(URL)).expect("url parses").is_some());

    DriverRegistry::deregister(&PROBE);
    assert!(!DriverRegistry::contains(&PROBE));
    assert_eq!(DriverRegistry::len(), before);
}

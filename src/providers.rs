use time::OffsetDateTime;
use uuid::Uuid;

/// Supplies identifiers for newly created requests.
pub trait IdProvider: Send + Sync {
    fn new_request_id(&self) -> Uuid;
}

/// Supplies creation timestamps and the reference time for login expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// Random UUIDs and the system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemProviders;

impl IdProvider for SystemProviders {
    fn new_request_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

impl Clock for SystemProviders {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

//! Effectful capabilities the book store depends on.

use time::OffsetDateTime;
use uuid::Uuid;

const ID_ALPHABET: &[u8; 64] = b"useandom-26T198340PX75pxJACKVERYMINDBUSHWOLF_GQZbfghjklqvwyzrict";
const ID_LENGTH: usize = 16;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// UTC wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Source of fresh, opaque record identifiers.
pub trait IdGenerator: Send + Sync {
    fn new_id(&self) -> String;
}

/// 16-character URL-safe ids drawn from UUIDv4 randomness.
#[derive(Debug, Default, Clone, Copy)]
pub struct NanoIdGenerator;

impl IdGenerator for NanoIdGenerator {
    fn new_id(&self) -> String {
        // Low 6 bits of each byte; byte 6 holds the version nibble so that
        // symbol only spans 16 values.
        Uuid::new_v4()
            .as_bytes()
            .iter()
            .take(ID_LENGTH)
            .map(|byte| ID_ALPHABET[(byte & 63) as usize] as char)
            .collect()
    }
}

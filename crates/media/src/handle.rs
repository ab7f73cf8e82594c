use core_types::MediaHandle;
use uuid::Uuid;

/// Identifier generator for new media records.
pub trait HandleSource {
    fn next_handle(&self) -> MediaHandle;
}

/// Default handle source: UUIDv4 rendered as bare hex.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidHandles;

impl HandleSource for UuidHandles {
    fn next_handle(&self) -> MediaHandle {
        MediaHandle::new(Uuid::new_v4().simple().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_unique() {
        let source = UuidHandles;
        let first = source.next_handle();
        let second = source.next_handle();
        assert_ne!(first, second);
    }

    #[test]
    fn handles_are_bare_hex() {
        let handle = UuidHandles.next_handle();
        assert_eq!(handle.as_str().len(), 32);
        assert!(handle.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}

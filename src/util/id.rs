//! Document ids in a merged view.
//!
//! A merged [`Database`](crate::engine::Database) addresses documents with a
//! 64-bit id whose upper bits name the constituent index (the shard) and
//! whose lower bits hold the id local to that index.
//!
//! Bits 48-63: Shard ID (16 bits)
//! Bits 0-47:  Local ID (48 bits)

pub const SHARD_ID_BITS: u32 = 16;
pub const LOCAL_ID_BITS: u32 = 48;
pub const LOCAL_ID_MASK: u64 = (1 << LOCAL_ID_BITS) - 1;
pub const MAX_LOCAL_ID: u64 = LOCAL_ID_MASK;

/// Maximum number of indexes a single merged view may hold.
pub const MAX_SHARDS: usize = 1 << SHARD_ID_BITS;

/// Compose a merged-view id from a shard index and a local id.
pub fn create_doc_id(shard_id: u16, local_id: u64) -> u64 {
    ((shard_id as u64) << LOCAL_ID_BITS) | (local_id & LOCAL_ID_MASK)
}

/// Which constituent index a merged-view id points into.
pub fn get_shard_id(doc_id: u64) -> u16 {
    (doc_id >> LOCAL_ID_BITS) as u16
}

/// The id of the document inside its own index.
pub fn get_local_id(doc_id: u64) -> u64 {
    doc_id & LOCAL_ID_MASK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip() {
        let doc_id = create_doc_id(42, 12345);
        assert_eq!(get_shard_id(doc_id), 42);
        assert_eq!(get_local_id(doc_id), 12345);
    }

    #[test]
    fn test_first_shard_keeps_local_ids() {
        assert_eq!(create_doc_id(0, 7), 7);
    }

    #[test]
    fn test_shard_isolation() {
        let id1 = create_doc_id(1, 100);
        let id2 = create_doc_id(2, 100);
        assert_ne!(id1, id2);
        assert_eq!(get_shard_id(id1), 1);
        assert_eq!(get_local_id(create_doc_id(1, MAX_LOCAL_ID)), MAX_LOCAL_ID);
    }
}

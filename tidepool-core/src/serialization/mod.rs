//! Deterministic binary serialization.
//!
//! State snapshots are bincode-encoded with a fixed configuration so the
//! same state always produces the same bytes. A snapshot is framed by a
//! short header carrying magic bytes and a format version.

mod snapshot;

pub use snapshot::{
    decode_snapshot, deserialize, encode_snapshot, serialize, serialized_size, SNAPSHOT_MAGIC,
    SNAPSHOT_VERSION,
};

// Helper for generating UUIDv7 (timestamp-sortable UUIDs).
//
// Users keep PG's gen_random_uuid() (v4). Sessions, entries and tags
// are generated app-side as v7 so inserts stay roughly time-ordered.

use uuid::Uuid;

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}

/// Parse a path identifier; `None` for anything that is not a UUID.
pub fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

// document constants
pub const DOC_ID: &str = "_id";
pub const FIELD_SEPARATOR: &str = ".";
pub const RESERVED_FIELDS: [&str; 1] = [DOC_ID];

// collection naming constants
pub const KEY_OBJ_SEPARATOR: &str = "+";

// index constants
pub const UNIQUE_INDEX: &str = "unique";
pub const NON_UNIQUE_INDEX: &str = "non-unique";

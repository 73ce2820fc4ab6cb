//! Static catalog of recognized BSON wire types and bindata subtypes.
//!
//! The catalog is fixed: every bson type name referenced by a syntax or
//! bound tree must resolve here, and the binder rejects anything else.

/// Descriptor for one recognized wire type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BsonTypeInfo {
    pub name: &'static str,
    /// Whether the type holds a single indivisible value (as opposed to a
    /// container type like object).
    pub is_scalar: bool,
    /// The BSONType enumerator name used by generated type assertions.
    pub cpp_type_name: &'static str,
}

pub const BSON_TYPES: [BsonTypeInfo; 14] = [
    BsonTypeInfo { name: "double", is_scalar: true, cpp_type_name: "NumberDouble" },
    BsonTypeInfo { name: "string", is_scalar: true, cpp_type_name: "String" },
    BsonTypeInfo { name: "object", is_scalar: false, cpp_type_name: "Object" },
    BsonTypeInfo { name: "bindata", is_scalar: true, cpp_type_name: "BinData" },
    BsonTypeInfo { name: "undefined", is_scalar: true, cpp_type_name: "Undefined" },
    BsonTypeInfo { name: "objectid", is_scalar: true, cpp_type_name: "jstOID" },
    BsonTypeInfo { name: "bool", is_scalar: true, cpp_type_name: "Bool" },
    BsonTypeInfo { name: "date", is_scalar: true, cpp_type_name: "Date" },
    BsonTypeInfo { name: "null", is_scalar: true, cpp_type_name: "jstNULL" },
    BsonTypeInfo { name: "regex", is_scalar: true, cpp_type_name: "RegEx" },
    BsonTypeInfo { name: "int", is_scalar: true, cpp_type_name: "NumberInt" },
    BsonTypeInfo { name: "timestamp", is_scalar: true, cpp_type_name: "bsonTimestamp" },
    BsonTypeInfo { name: "long", is_scalar: true, cpp_type_name: "NumberLong" },
    BsonTypeInfo { name: "decimal", is_scalar: true, cpp_type_name: "NumberDecimal" },
];

/// Bindata subtype tag names and their BinDataType enumerator spellings.
pub const BINDATA_SUBTYPES: [(&str, &str); 6] = [
    ("generic", "BinDataGeneral"),
    ("function", "Function"),
    ("binary", "ByteArrayDeprecated"),
    ("uuid_old", "bdtUUID"),
    ("uuid", "newUUID"),
    ("md5", "MD5Type"),
];

pub fn bson_type(name: &str) -> Option<&'static BsonTypeInfo> {
    BSON_TYPES.iter().find(|info| info.name == name)
}

pub fn is_valid_bson_type(name: &str) -> bool {
    bson_type(name).is_some()
}

pub fn is_scalar_bson_type(name: &str) -> bool {
    bson_type(name).map(|info| info.is_scalar).unwrap_or(false)
}

/// The BSONType enumerator used by generated `checkAndAssertType` calls.
pub fn cpp_bson_type_name(name: &str) -> Option<&'static str> {
    bson_type(name).map(|info| info.cpp_type_name)
}

pub fn is_valid_bindata_subtype(name: &str) -> bool {
    BINDATA_SUBTYPES.iter().any(|(n, _)| *n == name)
}

pub fn cpp_bindata_subtype(name: &str) -> Option<&'static str> {
    BINDATA_SUBTYPES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, cpp)| *cpp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lookup() {
        assert!(is_valid_bson_type("string"));
        assert!(is_valid_bson_type("bindata"));
        assert!(!is_valid_bson_type("varchar"));
        // "any" is special syntax, not a catalog entry.
        assert!(!is_valid_bson_type("any"));
    }

    #[test]
    fn test_scalar_classification() {
        assert!(is_scalar_bson_type("int"));
        assert!(is_scalar_bson_type("bindata"));
        assert!(!is_scalar_bson_type("object"));
        assert!(!is_scalar_bson_type("unknown"));
    }

    #[test]
    fn test_cpp_names() {
        assert_eq!(cpp_bson_type_name("long"), Some("NumberLong"));
        assert_eq!(cpp_bson_type_name("objectid"), Some("jstOID"));
        assert_eq!(cpp_bson_type_name("nope"), None);
    }

    #[test]
    fn test_bindata_subtypes() {
        assert!(is_valid_bindata_subtype("uuid"));
        assert!(!is_valid_bindata_subtype("uuid5"));
        assert_eq!(cpp_bindata_subtype("md5"), Some("MD5Type"));
    }
}

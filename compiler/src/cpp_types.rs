//! Type-mapping strategy: decides, per bound field, how the generated C++
//! stores a value, what type its public accessors traffic in, and how the
//! two representations convert into each other.
//!
//! The mapping composes in a fixed order: base type, then an array wrapper
//! if the field is an array, then an optional wrapper if the field is
//! optional. Optional-of-array is expressible; array-of-optional is not.

use crate::ast::{BoundField, BoundFieldType};

/// Primitives cheap enough that accessors return them by value.
const CHEAP_COPY_TYPES: [&str; 6] = [
    "bool",
    "double",
    "std::int32_t",
    "std::int64_t",
    "std::uint32_t",
    "std::uint64_t",
];

#[derive(Debug, Clone)]
enum Kind {
    /// Accessor type equals storage type.
    Base { cpp_type: String },
    /// Owned storage exposed through a non-owning view.
    View { storage: String, view: String },
    /// A nested generated class.
    Struct { class_name: String },
    Array(Box<CppTypeInfo>),
    Optional(Box<CppTypeInfo>),
}

#[derive(Debug, Clone)]
pub struct CppTypeInfo {
    kind: Kind,
}

impl CppTypeInfo {
    /// Build the composed mapping for a bound field.
    pub fn for_field(field: &BoundField) -> CppTypeInfo {
        let base = match &field.field_type {
            BoundFieldType::Struct { name } => CppTypeInfo {
                kind: Kind::Struct {
                    class_name: name.clone(),
                },
            },
            BoundFieldType::Scalar { cpp_type, .. } => {
                if cpp_type == "std::string" {
                    CppTypeInfo {
                        kind: Kind::View {
                            storage: "std::string".to_string(),
                            view: "StringData".to_string(),
                        },
                    }
                } else {
                    CppTypeInfo {
                        kind: Kind::Base {
                            cpp_type: cpp_type.clone(),
                        },
                    }
                }
            }
            BoundFieldType::Ignored => CppTypeInfo {
                kind: Kind::Base {
                    cpp_type: String::new(),
                },
            },
        };
        let with_array = if field.array {
            CppTypeInfo {
                kind: Kind::Array(Box::new(base)),
            }
        } else {
            base
        };
        if field.optional {
            CppTypeInfo {
                kind: Kind::Optional(Box::new(with_array)),
            }
        } else {
            with_array
        }
    }

    /// The private member's declared type.
    pub fn storage_type(&self) -> String {
        match &self.kind {
            Kind::Base { cpp_type } => cpp_type.clone(),
            Kind::View { storage, .. } => storage.clone(),
            Kind::Struct { class_name } => class_name.clone(),
            Kind::Array(inner) => format!("std::vector<{}>", inner.storage_type()),
            Kind::Optional(inner) => format!("boost::optional<{}>", inner.storage_type()),
        }
    }

    /// The public accessor type.
    pub fn view_type(&self) -> String {
        match &self.kind {
            Kind::Base { cpp_type } => cpp_type.clone(),
            Kind::View { view, .. } => view.clone(),
            Kind::Struct { class_name } => class_name.clone(),
            Kind::Array(inner) => format!("std::vector<{}>", inner.view_type()),
            Kind::Optional(inner) => format!("boost::optional<{}>", inner.view_type()),
        }
    }

    /// Whether the accessor representation differs from storage.
    pub fn is_view(&self) -> bool {
        match &self.kind {
            Kind::Base { .. } | Kind::Struct { .. } => false,
            Kind::View { .. } => true,
            Kind::Array(inner) | Kind::Optional(inner) => inner.is_view(),
        }
    }

    /// Whether the getter returns `const T&` rather than a value.
    pub fn return_by_reference(&self) -> bool {
        match &self.kind {
            Kind::Base { cpp_type } => !CHEAP_COPY_TYPES.contains(&cpp_type.as_str()),
            Kind::Struct { .. } => true,
            Kind::View { .. } => false,
            // An accessor type that differs from storage cannot alias it.
            Kind::Array(inner) => !inner.is_view(),
            // Optionality always constructs a new value at the boundary.
            Kind::Optional(_) => false,
        }
    }

    /// Whether rvalue-qualified access is deleted, preventing a view into a
    /// temporary from escaping.
    pub fn disable_rvalue(&self) -> bool {
        match &self.kind {
            Kind::Base { .. } | Kind::Struct { .. } => false,
            Kind::View { .. } => true,
            Kind::Array(inner) => inner.disable_rvalue(),
            Kind::Optional(_) => true,
        }
    }

    /// storage -> view conversion for a single element, if one is needed.
    pub fn transform_to_view(&self, expr: &str) -> Option<String> {
        match &self.kind {
            Kind::Base { .. } | Kind::Struct { .. } => None,
            Kind::View { view, .. } => Some(format!("{}{{{}}}", view, expr)),
            Kind::Array(_) | Kind::Optional(_) => None,
        }
    }

    /// view -> storage conversion for a single element, if one is needed.
    pub fn transform_to_storage(&self, expr: &str) -> Option<String> {
        match &self.kind {
            Kind::Base { .. } | Kind::Struct { .. } => None,
            Kind::View { .. } => Some(format!("{}.toString()", expr)),
            Kind::Array(_) | Kind::Optional(_) => None,
        }
    }

    /// Statement lines for the getter body reading `member`.
    pub fn getter_body(&self, member: &str) -> Vec<String> {
        match &self.kind {
            Kind::Base { .. } | Kind::Struct { .. } => vec![format!("return {};", member)],
            Kind::View { .. } => {
                let expr = self.transform_to_view(member).unwrap();
                vec![format!("return {};", expr)]
            }
            Kind::Array(inner) => {
                if let Some(elem) = inner.transform_to_view("value") {
                    vec![
                        format!("std::vector<{}> rvalue;", inner.view_type()),
                        format!(
                            "std::transform({0}.begin(), {0}.end(), std::back_inserter(rvalue),",
                            member
                        ),
                        format!(
                            "               [](const auto& value) {{ return {}; }});",
                            elem
                        ),
                        "return rvalue;".to_string(),
                    ]
                } else {
                    vec![format!("return {};", member)]
                }
            }
            Kind::Optional(inner) => {
                if inner.is_view() {
                    let mut lines = vec![format!("if ({}.is_initialized()) {{", member)];
                    let mut unwrapped = inner.getter_body(&format!("{}.get()", member));
                    if unwrapped.len() == 1 && unwrapped[0].starts_with("return ") {
                        let expr = unwrapped[0]
                            .trim_start_matches("return ")
                            .trim_end_matches(';');
                        lines.push(format!(
                            "    return boost::optional<{}>{{{}}};",
                            inner.view_type(),
                            expr
                        ));
                    } else {
                        // Element conversion needs statements, not one
                        // expression (an optional array of views).
                        for line in unwrapped.drain(..) {
                            if line == "return rvalue;" {
                                lines.push("    return boost::optional<std::vector<StringData>>{std::move(rvalue)};".to_string());
                            } else {
                                lines.push(format!("    {}", line));
                            }
                        }
                    }
                    lines.push("} else {".to_string());
                    lines.push("    return boost::none;".to_string());
                    lines.push("}".to_string());
                    lines
                } else {
                    vec![format!("return {};", member)]
                }
            }
        }
    }

    /// Statement lines for the setter body assigning `param` to `member`.
    pub fn setter_body(&self, member: &str, param: &str) -> Vec<String> {
        match &self.kind {
            Kind::Base { .. } | Kind::Struct { .. } => {
                vec![format!("{} = std::move({});", member, param)]
            }
            Kind::View { .. } => {
                let expr = self.transform_to_storage(param).unwrap();
                vec![format!("{} = {};", member, expr)]
            }
            Kind::Array(inner) => {
                if let Some(elem) = inner.transform_to_storage("value") {
                    vec![
                        format!("std::vector<{}> rvalue;", inner.storage_type()),
                        format!(
                            "std::transform({0}.begin(), {0}.end(), std::back_inserter(rvalue),",
                            param
                        ),
                        format!(
                            "               [](const auto& value) {{ return {}; }});",
                            elem
                        ),
                        format!("{} = std::move(rvalue);", member),
                    ]
                } else {
                    vec![format!("{} = std::move({});", member, param)]
                }
            }
            Kind::Optional(inner) => {
                if inner.is_view() {
                    let mut lines = vec![format!("if ({}.is_initialized()) {{", param)];
                    for line in inner.setter_body(member, &format!("{}.get()", param)) {
                        lines.push(format!("    {}", line));
                    }
                    lines.push("} else {".to_string());
                    lines.push(format!("    {} = boost::none;", member));
                    lines.push("}".to_string());
                    lines
                } else {
                    vec![format!("{} = std::move({});", member, param)]
                }
            }
        }
    }
}

/// Convert an IDL name to PascalCase for accessor method suffixes.
/// Splits on underscores; otherwise only the first letter is adjusted so
/// author casing like `lastMsg` survives as `LastMsg`.
pub fn title_case(s: &str) -> String {
    if s.contains('_') {
        s.split('_')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    None => String::new(),
                    Some(first) => first.to_uppercase().to_string() + chars.as_str(),
                }
            })
            .collect()
    } else {
        let mut chars = s.chars();
        match chars.next() {
            None => String::new(),
            Some(first) => first.to_uppercase().to_string() + chars.as_str(),
        }
    }
}

/// Convert an IDL name to camelCase for member names.
pub fn camel_case(s: &str) -> String {
    let pascal = title_case(s);
    let mut chars = pascal.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().to_string() + chars.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SourceLocation;

    fn scalar_field(cpp_type: &str, array: bool, optional: bool) -> BoundField {
        BoundField {
            loc: SourceLocation::new("test.idl", 1, 1),
            name: "value".to_string(),
            description: None,
            optional,
            array,
            chained: false,
            ignore: false,
            default: None,
            field_type: BoundFieldType::Scalar {
                cpp_type: cpp_type.to_string(),
                bson_serialization_type: vec!["string".to_string()],
                bindata_subtype: None,
                serializer: None,
                deserializer: None,
            },
        }
    }

    #[test]
    fn test_cheap_primitives_return_by_value() {
        let info = CppTypeInfo::for_field(&scalar_field("std::int32_t", false, false));
        assert_eq!(info.storage_type(), "std::int32_t");
        assert_eq!(info.view_type(), "std::int32_t");
        assert!(!info.return_by_reference());
        assert!(!info.is_view());
    }

    #[test]
    fn test_expensive_types_return_by_reference() {
        let info = CppTypeInfo::for_field(&scalar_field("mongo::BSONObj", false, false));
        assert!(info.return_by_reference());
        assert!(!info.disable_rvalue());
    }

    #[test]
    fn test_string_maps_to_view() {
        let info = CppTypeInfo::for_field(&scalar_field("std::string", false, false));
        assert_eq!(info.storage_type(), "std::string");
        assert_eq!(info.view_type(), "StringData");
        assert!(info.is_view());
        assert!(!info.return_by_reference());
        assert!(info.disable_rvalue());
        assert_eq!(
            info.transform_to_view("_value"),
            Some("StringData{_value}".to_string())
        );
        assert_eq!(
            info.transform_to_storage("value"),
            Some("value.toString()".to_string())
        );
    }

    #[test]
    fn test_array_of_view_suppresses_reference() {
        let info = CppTypeInfo::for_field(&scalar_field("std::string", true, false));
        assert_eq!(info.storage_type(), "std::vector<std::string>");
        assert_eq!(info.view_type(), "std::vector<StringData>");
        assert!(!info.return_by_reference());
        let body = info.getter_body("_values");
        assert!(body.iter().any(|l| l.contains("std::transform")));
    }

    #[test]
    fn test_array_passthrough_when_representations_match() {
        let info = CppTypeInfo::for_field(&scalar_field("std::int64_t", true, false));
        assert_eq!(info.storage_type(), "std::vector<std::int64_t>");
        assert!(info.return_by_reference());
        assert_eq!(info.getter_body("_values"), vec!["return _values;"]);
        assert_eq!(
            info.setter_body("_values", "values"),
            vec!["_values = std::move(values);"]
        );
    }

    #[test]
    fn test_optional_always_by_value() {
        let info = CppTypeInfo::for_field(&scalar_field("std::int32_t", false, true));
        assert_eq!(info.storage_type(), "boost::optional<std::int32_t>");
        assert!(!info.return_by_reference());
        assert!(info.disable_rvalue());
    }

    #[test]
    fn test_optional_view_handles_unset_distinctly() {
        let info = CppTypeInfo::for_field(&scalar_field("std::string", false, true));
        let getter = info.getter_body("_value");
        assert!(getter[0].contains("is_initialized"));
        assert!(getter.iter().any(|l| l.contains("boost::none")));
        let setter = info.setter_body("_value", "value");
        assert!(setter.iter().any(|l| l.contains("toString")));
        assert!(setter.iter().any(|l| l.contains("boost::none")));
    }

    #[test]
    fn test_optional_of_array_composes() {
        let info = CppTypeInfo::for_field(&scalar_field("std::string", true, true));
        assert_eq!(
            info.storage_type(),
            "boost::optional<std::vector<std::string>>"
        );
        assert_eq!(info.view_type(), "boost::optional<std::vector<StringData>>");
    }

    #[test]
    fn test_title_and_camel_case() {
        assert_eq!(title_case("int_field"), "IntField");
        assert_eq!(title_case("lastMsg"), "LastMsg");
        assert_eq!(camel_case("int_field"), "intField");
        assert_eq!(camel_case("Value"), "value");
    }
}

//! Keyword tables and identifier rules.
//!
//! Reserved keywords can only be used as identifiers when escaped with `@`
//! (`@class`). Contextual keywords are ordinary identifiers outside the
//! constructs that give them meaning.

/// Reserved keywords.
const RESERVED_KEYWORDS: &[&str] = &[
    "abstract",
    "as",
    "base",
    "bool",
    "break",
    "byte",
    "case",
    "catch",
    "char",
    "checked",
    "class",
    "const",
    "continue",
    "decimal",
    "default",
    "delegate",
    "do",
    "double",
    "else",
    "enum",
    "event",
    "explicit",
    "extern",
    "false",
    "finally",
    "fixed",
    "float",
    "for",
    "foreach",
    "goto",
    "if",
    "implicit",
    "in",
    "int",
    "interface",
    "internal",
    "is",
    "lock",
    "long",
    "namespace",
    "new",
    "null",
    "object",
    "operator",
    "out",
    "override",
    "params",
    "private",
    "protected",
    "public",
    "readonly",
    "ref",
    "return",
    "sbyte",
    "sealed",
    "short",
    "sizeof",
    "stackalloc",
    "static",
    "string",
    "struct",
    "switch",
    "this",
    "throw",
    "true",
    "try",
    "typeof",
    "uint",
    "ulong",
    "unchecked",
    "unsafe",
    "ushort",
    "using",
    "virtual",
    "void",
    "volatile",
    "while",
];

/// Contextual keywords.
const CONTEXTUAL_KEYWORDS: &[&str] = &[
    "add",
    "and",
    "alias",
    "ascending",
    "async",
    "await",
    "by",
    "descending",
    "dynamic",
    "equals",
    "file",
    "from",
    "get",
    "global",
    "group",
    "init",
    "into",
    "join",
    "let",
    "managed",
    "nameof",
    "nint",
    "not",
    "notnull",
    "nuint",
    "on",
    "or",
    "orderby",
    "partial",
    "record",
    "remove",
    "required",
    "scoped",
    "select",
    "set",
    "unmanaged",
    "value",
    "var",
    "when",
    "where",
    "with",
    "yield",
];

/// Predefined type keywords (aliases for corlib types).
const PREDEFINED_TYPES: &[&str] = &[
    "bool", "byte", "char", "decimal", "double", "float", "int", "long", "object", "sbyte",
    "short", "string", "uint", "ulong", "ushort", "void", "nint", "nuint", "dynamic",
];

/// Check if a word is a reserved keyword.
pub fn is_reserved_keyword(word: &str) -> bool {
    RESERVED_KEYWORDS.contains(&word)
}

/// Check if a word is a contextual keyword.
pub fn is_contextual_keyword(word: &str) -> bool {
    CONTEXTUAL_KEYWORDS.contains(&word)
}

/// Check if a word names a predefined type.
pub fn is_predefined_type(word: &str) -> bool {
    PREDEFINED_TYPES.contains(&word)
}

fn is_identifier_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_identifier_part(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Check if `name` is a valid identifier once escaped.
///
/// Reserved keywords count as valid because `@` escaping makes them usable.
pub fn is_valid_identifier(name: &str) -> bool {
    let name = name.strip_prefix('@').unwrap_or(name);
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_identifier_start(first) => chars.all(is_identifier_part),
        _ => false,
    }
}

/// Token text for an identifier: reserved keywords get an `@` prefix.
pub fn escape_identifier(name: &str) -> String {
    if is_reserved_keyword(name) {
        format!("@{}", name)
    } else {
        name.to_string()
    }
}

/// Turn an arbitrary base into a valid (unescaped) identifier.
///
/// Strips a leading `@`, drops characters that cannot appear in an
/// identifier and prefixes `_` when the result starts with a digit. An empty
/// result falls back to `v`.
pub fn make_valid_identifier(base: &str) -> String {
    let base = base.strip_prefix('@').unwrap_or(base);
    let mut name: String = base.chars().filter(|c| is_identifier_part(*c)).collect();
    if name.is_empty() {
        return "v".to_string();
    }
    if name.starts_with(|c: char| c.is_numeric()) {
        name.insert(0, '_');
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_and_contextual() {
        assert!(is_reserved_keyword("class"));
        assert!(!is_reserved_keyword("var"));
        assert!(is_contextual_keyword("var"));
        assert!(is_predefined_type("int"));
    }

    #[test]
    fn test_escape_identifier() {
        assert_eq!(escape_identifier("class"), "@class");
        assert_eq!(escape_identifier("value"), "value");
        assert_eq!(escape_identifier("async"), "async");
    }

    #[test]
    fn test_valid_identifiers() {
        assert!(is_valid_identifier("_x1"));
        assert!(is_valid_identifier("@class"));
        assert!(is_valid_identifier("naïve"));
        assert!(!is_valid_identifier("1x"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("a-b"));
    }

    #[test]
    fn test_make_valid_identifier() {
        assert_eq!(make_valid_identifier("item count"), "itemcount");
        assert_eq!(make_valid_identifier("2nd"), "_2nd");
        assert_eq!(make_valid_identifier("@class"), "class");
        assert_eq!(make_valid_identifier("--"), "v");
        assert_eq!(make_valid_identifier(""), "v");
    }
}

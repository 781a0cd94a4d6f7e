//! Identifier casing and C# reserved-word escaping.
//!
//! Case conversion is deterministic: the same source identifier always
//! produces the same target identifier, which the emitted AST relies on
//! for run-to-run stability.

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;

/// C# keywords that cannot be used as bare identifiers.
static RESERVED_WORDS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
        "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
        "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
        "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
        "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
        "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
        "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
        "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
        "void", "volatile", "while",
    ]
    .into_iter()
    .collect()
});

/// Whether `name` is a C# keyword.
pub fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS.contains(name)
}

/// Escape a C# keyword with the `@` verbatim-identifier prefix.
/// Non-keywords pass through unchanged.
pub fn escape_reserved(name: &str) -> String {
    if is_reserved_word(name) {
        format!("@{name}")
    } else {
        name.to_string()
    }
}

/// Convert a JavaScript identifier to PascalCase.
///
/// Splits on underscores, uppercases the first letter of every part and
/// leaves the rest of each part untouched, so `encryptBlock` becomes
/// `EncryptBlock` and `key_schedule` becomes `KeySchedule`. An all-caps
/// identifier like `BLOCK_SIZE` becomes `BlockSize`.
pub fn to_pascal_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    for part in name.split('_').filter(|p| !p.is_empty()) {
        let all_caps = part.chars().all(|c| !c.is_ascii_lowercase());
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            result.push(first.to_ascii_uppercase());
            if all_caps && part.len() > 1 {
                result.extend(chars.map(|c| c.to_ascii_lowercase()));
            } else {
                result.extend(chars);
            }
        }
    }
    if result.is_empty() {
        result.push('_');
    }
    result
}

/// Convert a JavaScript identifier to camelCase, escaping keywords.
pub fn to_camel_case(name: &str) -> String {
    let pascal = to_pascal_case(name);
    let mut chars = pascal.chars();
    let camel = match chars.next() {
        Some(first) => {
            let mut s = String::with_capacity(pascal.len());
            s.push(first.to_ascii_lowercase());
            s.extend(chars);
            s
        }
        None => pascal,
    };
    escape_reserved(&camel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_case_from_camel() {
        assert_eq!(to_pascal_case("encryptBlock"), "EncryptBlock");
        assert_eq!(to_pascal_case("keySetup"), "KeySetup");
    }

    #[test]
    fn pascal_case_from_snake() {
        assert_eq!(to_pascal_case("key_schedule"), "KeySchedule");
        assert_eq!(to_pascal_case("BLOCK_SIZE"), "BlockSize");
    }

    #[test]
    fn pascal_case_stability() {
        // Stability contract: same input, same output, every time.
        for _ in 0..3 {
            assert_eq!(to_pascal_case("sBox_init"), "SBoxInit");
        }
    }

    #[test]
    fn camel_case_escapes_keywords() {
        assert_eq!(to_camel_case("Params"), "@params");
        assert_eq!(to_camel_case("fixed"), "@fixed");
        assert_eq!(to_camel_case("counter"), "counter");
    }

    #[test]
    fn reserved_words() {
        assert!(is_reserved_word("uint"));
        assert!(is_reserved_word("this"));
        assert!(!is_reserved_word("rotl"));
        assert_eq!(escape_reserved("byte"), "@byte");
        assert_eq!(escape_reserved("nonce"), "nonce");
    }
}

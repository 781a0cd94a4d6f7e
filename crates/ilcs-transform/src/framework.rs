//! The framework knowledge base.
//!
//! A read-only catalogue of the host framework's base classes: method
//! signatures (for override detection), property types (for inherited
//! `this.X` accesses) and the OpCodes helper table. The built-in defaults
//! are data, not code: a JSON document embedded in the crate and parsed
//! exactly once. User-supplied `framework_types` / `opcodes_types`
//! overrides merge *under* the built-ins - built-ins always win on names
//! they define.

use ilcs_csharp::types::{TypeId, TypeInterner};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static BUILTINS_JSON: &str = include_str!("framework.json");

static BUILTINS: Lazy<KbData> = Lazy::new(|| {
    serde_json::from_str(BUILTINS_JSON).expect("embedded framework.json is well-formed")
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbParam {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    /// Default value as C# source text (`"false"`, `"null"`, `"0"`).
    #[serde(default)]
    pub default: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbMethod {
    #[serde(default)]
    pub params: Vec<KbParam>,
    #[serde(default = "default_returns")]
    pub returns: String,
    #[serde(default)]
    pub is_static: bool,
}

fn default_returns() -> String {
    "void".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KbClass {
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub methods: IndexMap<String, KbMethod>,
    #[serde(default)]
    pub properties: IndexMap<String, String>,
    /// Positional constructor parameters, for object-literal rewrites.
    #[serde(default)]
    pub ctor: Vec<KbParam>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbOpCode {
    #[serde(default)]
    pub params: Vec<String>,
    pub returns: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KbData {
    #[serde(default)]
    pub classes: IndexMap<String, KbClass>,
    #[serde(default)]
    pub opcodes: IndexMap<String, KbOpCode>,
}

/// The merged, read-only knowledge base for one compilation.
#[derive(Debug)]
pub struct FrameworkKb {
    data: KbData,
}

impl FrameworkKb {
    /// Build from the built-ins plus optional user overrides. Override
    /// JSON must deserialize into the same shapes as the built-in tables.
    pub fn with_overrides(
        framework_types: Option<&serde_json::Value>,
        opcodes_types: Option<&serde_json::Value>,
    ) -> Result<Self, serde_json::Error> {
        let mut data = BUILTINS.clone();
        if let Some(value) = framework_types {
            let user: IndexMap<String, KbClass> = serde_json::from_value(value.clone())?;
            for (name, class) in user {
                if !data.classes.contains_key(&name) {
                    data.classes.insert(name, class);
                }
            }
        }
        if let Some(value) = opcodes_types {
            let user: IndexMap<String, KbOpCode> = serde_json::from_value(value.clone())?;
            for (name, opcode) in user {
                if !data.opcodes.contains_key(&name) {
                    data.opcodes.insert(name, opcode);
                }
            }
        }
        Ok(Self { data })
    }

    pub fn class(&self, name: &str) -> Option<&KbClass> {
        self.data.classes.get(name)
    }

    pub fn is_known_class(&self, name: &str) -> bool {
        self.data.classes.contains_key(name)
    }

    /// Find a method by walking the `extends` chain from `class`.
    /// Matching is PascalCase-insensitive so IL method `encryptBlock`
    /// finds framework `EncryptBlock`. Returns the defining class and the
    /// canonical (framework) method name with its signature.
    pub fn lookup_method(&self, class: &str, method: &str) -> Option<(&str, &str, &KbMethod)> {
        let wanted = ilcs_common::to_pascal_case(method);
        let mut current = Some(class);
        while let Some(name) = current {
            let (class_name, kb_class) = self.data.classes.get_key_value(name)?;
            for (method_name, sig) in &kb_class.methods {
                if method_name.eq_ignore_ascii_case(&wanted) {
                    return Some((class_name, method_name, sig));
                }
            }
            current = kb_class.extends.as_deref();
        }
        None
    }

    /// Find an inherited property's canonical name and type string,
    /// walking the `extends` chain.
    pub fn lookup_property(&self, class: &str, property: &str) -> Option<(&str, &str)> {
        let wanted = ilcs_common::to_pascal_case(property);
        let mut current = Some(class);
        while let Some(name) = current {
            let kb_class = self.data.classes.get(name)?;
            for (prop_name, ty) in &kb_class.properties {
                if prop_name.eq_ignore_ascii_case(&wanted) {
                    return Some((prop_name, ty));
                }
            }
            current = kb_class.extends.as_deref();
        }
        None
    }

    pub fn opcode(&self, name: &str) -> Option<&KbOpCode> {
        self.data.opcodes.get(name)
    }

    /// Constructor parameter list for framework data classes (TestCase,
    /// KeySize, ...), used to rewrite object literals positionally.
    pub fn ctor_params(&self, class: &str) -> Option<&[KbParam]> {
        let kb_class = self.data.classes.get(class)?;
        if kb_class.ctor.is_empty() {
            None
        } else {
            Some(&kb_class.ctor)
        }
    }
}

/// Parse a KB type string (`"uint[]"`, `"byte[][]"`, `"TestCase[]"`,
/// `"Dictionary<string, uint>"` is not needed - generics in the KB are
/// plain class names) into an interned type.
pub fn parse_type_str(interner: &TypeInterner, text: &str) -> TypeId {
    let trimmed = text.trim();
    if let Some(base) = trimmed.strip_suffix("[][]") {
        let elem = parse_type_str(interner, base);
        return interner.jagged_of(elem);
    }
    if let Some(base) = trimmed.strip_suffix("[]") {
        let elem = parse_type_str(interner, base);
        return interner.array_of(elem);
    }
    match trimmed {
        "bool" => TypeId::BOOL,
        "char" => TypeId::CHAR,
        "sbyte" => TypeId::SBYTE,
        "byte" => TypeId::BYTE,
        "short" => TypeId::SHORT,
        "ushort" => TypeId::USHORT,
        "int" => TypeId::INT,
        "uint" => TypeId::UINT,
        "long" => TypeId::LONG,
        "ulong" => TypeId::ULONG,
        "float" => TypeId::FLOAT,
        "double" => TypeId::DOUBLE,
        "string" => TypeId::STRING,
        "object" | "any" | "dynamic" => TypeId::DYNAMIC,
        "void" => TypeId::VOID,
        "var" => TypeId::VAR,
        name => interner.generic(name, Vec::new()),
    }
}

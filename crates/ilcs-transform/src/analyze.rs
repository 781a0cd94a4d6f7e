//! Body pre-analysis.
//!
//! One pass over a function body before it is transformed, collecting the
//! facts that make single-pass emission possible:
//!
//! - backwards parameter propagation (`local = param`)
//! - return-site propagation (`return local` takes the return type)
//! - cast-assignment hints (`local = (uint)(...)`)
//! - 2-D indexing detection (jagged-array candidates)
//! - parameter usage classification (array / string key / integer index /
//!   scalar bit operand)
//!
//! The results seed the scope frame and feed signature refinement.

use bitflags::bitflags;
use ilcs_csharp::types::TypeId;
use ilcs_il::{AssignOp, BinaryOp, IlMemberProperty, IlNode, IlValue};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::infer::{name_heuristic, numeric_kind_type};

bitflags! {
    /// Everything one walk can observe about how a parameter is used.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ParamUsage: u16 {
        /// `.length` access.
        const LENGTH = 1 << 0;
        /// Computed index read/write on the parameter.
        const INDEXED = 1 << 1;
        /// Spread into a call or literal.
        const SPREAD = 1 << 2;
        /// Operand of an array-op IL node (`slice`, `fill`, `xor`, ...).
        const ARRAY_OP = 1 << 3;
        /// An element of the parameter feeds a 32-bit bitwise operator.
        const ELEM_BITWISE = 1 << 4;
        /// The parameter itself feeds a 32-bit bitwise operator.
        const SCALAR_BITWISE = 1 << 5;
        /// Indexes a container that is also indexed by string literals.
        const STRING_KEY = 1 << 6;
        /// Indexes a container that is an array.
        const INT_INDEX = 1 << 7;
    }
}

impl ParamUsage {
    pub fn is_array_like(self) -> bool {
        self.intersects(
            ParamUsage::LENGTH | ParamUsage::INDEXED | ParamUsage::SPREAD | ParamUsage::ARRAY_OP,
        )
    }
}

/// The collected facts for one body.
#[derive(Debug, Default)]
pub struct BodyAnalysis {
    /// Locals whose type is pinned before their declaration is reached.
    pub local_types: FxHashMap<String, TypeId>,
    /// Variables that need `T[][]` storage.
    pub jagged: FxHashSet<String>,
    pub param_usage: FxHashMap<String, ParamUsage>,
}

impl BodyAnalysis {
    pub fn usage(&self, name: &str) -> ParamUsage {
        self.param_usage.get(name).copied().unwrap_or_default()
    }

    /// Resolve a parameter's type from observed usage, falling back to
    /// the crypto name rules. Body analysis wins over the name heuristic;
    /// on a byte[]-vs-uint[] conflict the unsigned element type wins.
    pub fn classify_param(&self, name: &str) -> TypeId {
        let usage = self.usage(name);
        if usage.contains(ParamUsage::STRING_KEY) {
            return TypeId::STRING;
        }
        if usage.is_array_like() {
            if usage.contains(ParamUsage::ELEM_BITWISE) {
                return TypeId::UINT_ARRAY;
            }
            let by_name = name_heuristic(name);
            return if by_name == TypeId::BYTE_ARRAY || by_name == TypeId::UINT_ARRAY {
                by_name
            } else {
                TypeId::BYTE_ARRAY
            };
        }
        if usage.contains(ParamUsage::INT_INDEX) {
            return TypeId::INT;
        }
        if usage.contains(ParamUsage::SCALAR_BITWISE) {
            return TypeId::UINT;
        }
        name_heuristic(name)
    }
}

struct Analyzer<'a> {
    params: FxHashSet<&'a str>,
    return_type: TypeId,
    param_types: &'a FxHashMap<String, TypeId>,
    /// container -> parameters that index it.
    indexers: FxHashMap<String, Vec<String>>,
    /// Containers indexed by a string literal anywhere in the body.
    string_keyed: FxHashSet<String>,
    /// Containers that are known arrays (declared or array-named).
    array_like: FxHashSet<String>,
    out: BodyAnalysis,
}

/// Run the pre-analysis over one body. `param_types` carries whatever is
/// already known about the parameters (hints, inherited signatures).
pub fn analyze_body(
    param_names: &[&str],
    param_types: &FxHashMap<String, TypeId>,
    body: &IlNode,
    return_type: TypeId,
) -> BodyAnalysis {
    let mut analyzer = Analyzer {
        params: param_names.iter().copied().collect(),
        return_type,
        param_types,
        indexers: FxHashMap::default(),
        string_keyed: FxHashSet::default(),
        array_like: FxHashSet::default(),
        out: BodyAnalysis::default(),
    };
    analyzer.walk(body);
    analyzer.finish()
}

impl<'a> Analyzer<'a> {
    fn mark(&mut self, param: &str, usage: ParamUsage) {
        if self.params.contains(param) {
            *self.out.param_usage.entry(param.to_string()).or_default() |= usage;
        }
    }

    fn walk(&mut self, node: &IlNode) {
        match node {
            // (a) backwards parameter propagation and (c) cast hints,
            // through both declaration and assignment forms.
            IlNode::VarDecl {
                name,
                init: Some(init),
                ..
            } => {
                self.record_local_hint(name, init);
                if matches!(**init, IlNode::ArrayCreation { .. }) {
                    self.array_like.insert(name.clone());
                }
            }
            IlNode::Assignment {
                op: AssignOp::Assign,
                target,
                value,
            } => {
                if let IlNode::Identifier { name } = &**target {
                    self.record_local_hint(name, value);
                }
                // (d) `v[i] = new Array(n)` / `v[i] = [...]` proves v jagged.
                if let IlNode::Member {
                    object,
                    property: IlMemberProperty::Computed(_),
                } = &**target
                {
                    if let IlNode::Identifier { name } = &**object {
                        if matches!(
                            &**value,
                            IlNode::ArrayCreation { .. }
                                | IlNode::ArrayLiteral { .. }
                                | IlNode::TypedArrayCreation { .. }
                        ) {
                            self.out.jagged.insert(name.clone());
                        }
                    }
                }
            }
            // (b) return-site propagation.
            IlNode::Return {
                argument: Some(argument),
            } => {
                if let IlNode::Identifier { name } = &**argument {
                    if self.return_type != TypeId::VOID
                        && self.return_type != TypeId::DYNAMIC
                        && !self.params.contains(name.as_str())
                    {
                        self.out
                            .local_types
                            .entry(name.clone())
                            .or_insert(self.return_type);
                    }
                }
            }
            // (d) two-level reads: v[i][j].
            IlNode::Member {
                object,
                property: IlMemberProperty::Computed(_),
            } => {
                if let IlNode::Member {
                    object: inner,
                    property: IlMemberProperty::Computed(_),
                } = &**object
                {
                    if let IlNode::Identifier { name } = &**inner {
                        self.out.jagged.insert(name.clone());
                    }
                }
                self.observe_index(object, node);
            }
            // (e) array-usage evidence.
            IlNode::ArrayLength { array } => self.mark_array_node(array, ParamUsage::LENGTH),
            IlNode::Spread { argument } => self.mark_array_node(argument, ParamUsage::SPREAD),
            IlNode::ArrayAppend { array, .. }
            | IlNode::ArraySlice { array, .. }
            | IlNode::ArrayFill { array, .. }
            | IlNode::ArrayXor { array, .. }
            | IlNode::ArrayClear { array }
            | IlNode::ArrayIndexOf { array, .. }
            | IlNode::ArrayIncludes { array, .. }
            | IlNode::ArrayConcat { array, .. }
            | IlNode::ArrayReverse { array }
            | IlNode::ArraySort { array, .. }
            | IlNode::ArraySplice { array, .. }
            | IlNode::TypedArraySet { target: array, .. }
            | IlNode::TypedArraySubarray { array, .. } => {
                self.mark_array_node(array, ParamUsage::ARRAY_OP)
            }
            // (e)/(g) bitwise evidence.
            IlNode::Binary { op, left, right } if op.is_bitwise() => {
                self.observe_bit_operand(left);
                self.observe_bit_operand(right);
            }
            _ => {}
        }
        for child in node.children() {
            self.walk(child);
        }
    }

    fn record_local_hint(&mut self, local: &str, value: &IlNode) {
        match value {
            IlNode::Identifier { name } if self.params.contains(name.as_str()) => {
                if let Some(&ty) = self.param_types.get(name) {
                    self.out.local_types.entry(local.to_string()).or_insert(ty);
                }
            }
            IlNode::Cast { target, .. } => {
                self.out
                    .local_types
                    .insert(local.to_string(), numeric_kind_type(*target));
            }
            // A later assignment of a long-range literal upgrades the
            // local before its declaration is emitted.
            IlNode::Literal {
                value: IlValue::Int(v),
            } if crate::infer::int_literal_type(*v) == TypeId::LONG => {
                self.out.local_types.insert(local.to_string(), TypeId::LONG);
            }
            _ => {}
        }
    }

    fn mark_array_node(&mut self, node: &IlNode, usage: ParamUsage) {
        if let IlNode::Identifier { name } = node {
            self.mark(name, usage);
            self.array_like.insert(name.clone());
        }
    }

    /// Record `container[index]` facts for (f).
    fn observe_index(&mut self, object: &IlNode, member: &IlNode) {
        let IlNode::Identifier { name: container } = object else {
            return;
        };
        let IlNode::Member {
            property: IlMemberProperty::Computed(index),
            ..
        } = member
        else {
            return;
        };
        match &**index {
            IlNode::Literal {
                value: IlValue::Str(_),
            } => {
                self.string_keyed.insert(container.clone());
            }
            IlNode::Identifier { name } if self.params.contains(name.as_str()) => {
                self.indexers
                    .entry(container.clone())
                    .or_default()
                    .push(name.clone());
            }
            _ => {}
        }
        if self.params.contains(container.as_str()) {
            self.mark(container, ParamUsage::INDEXED);
        }
    }

    fn observe_bit_operand(&mut self, operand: &IlNode) {
        match operand {
            IlNode::Identifier { name } => self.mark(name, ParamUsage::SCALAR_BITWISE),
            IlNode::Member {
                object,
                property: IlMemberProperty::Computed(_),
            } => {
                if let IlNode::Identifier { name } = &**object {
                    self.mark(name, ParamUsage::ELEM_BITWISE);
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> BodyAnalysis {
        // (f) classify index parameters now that every container use has
        // been seen.
        for (container, params) in &self.indexers {
            let string_keyed = self.string_keyed.contains(container);
            let array_like = self.array_like.contains(container)
                || name_heuristic(container) == TypeId::BYTE_ARRAY
                || name_heuristic(container) == TypeId::UINT_ARRAY
                || self
                    .param_types
                    .get(container)
                    .is_some_and(|&t| t == TypeId::BYTE_ARRAY || t == TypeId::UINT_ARRAY);
            for param in params {
                let usage = if string_keyed {
                    ParamUsage::STRING_KEY
                } else if array_like {
                    ParamUsage::INT_INDEX
                } else {
                    continue;
                };
                *self.out.param_usage.entry(param.clone()).or_default() |= usage;
            }
        }
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ilcs_il::NumericKind;

    fn no_param_types() -> FxHashMap<String, TypeId> {
        FxHashMap::default()
    }

    #[test]
    fn backwards_parameter_propagation() {
        // function f(key) { let k = key; }
        let mut param_types = FxHashMap::default();
        param_types.insert("key".to_string(), TypeId::BYTE_ARRAY);
        let body = IlNode::block(vec![IlNode::VarDecl {
            name: "k".to_string(),
            init: Some(Box::new(IlNode::ident("key"))),
            mutable: true,
        }]);
        let analysis = analyze_body(&["key"], &param_types, &body, TypeId::VOID);
        assert_eq!(analysis.local_types.get("k"), Some(&TypeId::BYTE_ARRAY));
    }

    #[test]
    fn return_site_propagation() {
        // var x = []; return x;  (return type byte[])
        let body = IlNode::block(vec![
            IlNode::VarDecl {
                name: "x".to_string(),
                init: Some(Box::new(IlNode::ArrayLiteral { elements: vec![] })),
                mutable: true,
            },
            IlNode::ret(Some(IlNode::ident("x"))),
        ]);
        let analysis = analyze_body(&[], &no_param_types(), &body, TypeId::BYTE_ARRAY);
        assert_eq!(analysis.local_types.get("x"), Some(&TypeId::BYTE_ARRAY));
    }

    #[test]
    fn cast_assignment_hint() {
        // t = (uint)(...);
        let body = IlNode::block(vec![IlNode::stmt(IlNode::assign(
            IlNode::ident("t"),
            IlNode::Cast {
                target: NumericKind::U32,
                value: Box::new(IlNode::int(1)),
            },
        ))]);
        let analysis = analyze_body(&[], &no_param_types(), &body, TypeId::VOID);
        assert_eq!(analysis.local_types.get("t"), Some(&TypeId::UINT));
    }

    #[test]
    fn two_level_index_marks_jagged() {
        // m[i][j]
        let body = IlNode::block(vec![IlNode::stmt(IlNode::Member {
            object: Box::new(IlNode::Member {
                object: Box::new(IlNode::ident("m")),
                property: IlMemberProperty::Computed(Box::new(IlNode::ident("i"))),
            }),
            property: IlMemberProperty::Computed(Box::new(IlNode::ident("j"))),
        })]);
        let analysis = analyze_body(&[], &no_param_types(), &body, TypeId::VOID);
        assert!(analysis.jagged.contains("m"));
    }

    #[test]
    fn element_assignment_of_fresh_array_marks_jagged() {
        // a[i] = new Array(4);
        let body = IlNode::block(vec![IlNode::stmt(IlNode::assign(
            IlNode::Member {
                object: Box::new(IlNode::ident("a")),
                property: IlMemberProperty::Computed(Box::new(IlNode::ident("i"))),
            },
            IlNode::ArrayCreation {
                length: Some(Box::new(IlNode::int(4))),
            },
        ))]);
        let analysis = analyze_body(&[], &no_param_types(), &body, TypeId::VOID);
        assert!(analysis.jagged.contains("a"));
    }

    #[test]
    fn bitwise_element_use_classifies_uint_array() {
        // function f(state) { state[0] ^ 1; state.length; }
        let body = IlNode::block(vec![
            IlNode::stmt(IlNode::binary(
                BinaryOp::BitXor,
                IlNode::Member {
                    object: Box::new(IlNode::ident("state")),
                    property: IlMemberProperty::Computed(Box::new(IlNode::int(0))),
                },
                IlNode::int(1),
            )),
            IlNode::stmt(IlNode::ArrayLength {
                array: Box::new(IlNode::ident("state")),
            }),
        ]);
        let analysis = analyze_body(&["state"], &no_param_types(), &body, TypeId::VOID);
        assert_eq!(analysis.classify_param("state"), TypeId::UINT_ARRAY);
    }

    #[test]
    fn string_key_vs_int_index() {
        // function f(name, i) { table["aes"]; table[name]; data[i]; }
        let mut param_types = FxHashMap::default();
        param_types.insert("data".to_string(), TypeId::BYTE_ARRAY);
        let index = |container: &str, idx: IlNode| {
            IlNode::stmt(IlNode::Member {
                object: Box::new(IlNode::ident(container)),
                property: IlMemberProperty::Computed(Box::new(idx)),
            })
        };
        let body = IlNode::block(vec![
            index("table", IlNode::str("aes")),
            index("table", IlNode::ident("name")),
            index("data", IlNode::ident("i")),
        ]);
        let analysis = analyze_body(&["name", "i"], &param_types, &body, TypeId::VOID);
        assert_eq!(analysis.classify_param("name"), TypeId::STRING);
        assert_eq!(analysis.classify_param("i"), TypeId::INT);
    }

    #[test]
    fn scalar_bit_operand_is_uint() {
        // function f(x) { x ^ 0x9E3779B9; }
        let body = IlNode::block(vec![IlNode::stmt(IlNode::binary(
            BinaryOp::BitXor,
            IlNode::ident("x"),
            IlNode::int(0x9E37_79B9),
        ))]);
        let analysis = analyze_body(&["x"], &no_param_types(), &body, TypeId::VOID);
        assert_eq!(analysis.classify_param("x"), TypeId::UINT);
    }

    #[test]
    fn spread_use_is_array_evidence() {
        let body = IlNode::block(vec![IlNode::stmt(IlNode::Spread {
            argument: Box::new(IlNode::ident("words")),
        })]);
        let analysis = analyze_body(&["words"], &no_param_types(), &body, TypeId::VOID);
        assert!(analysis.usage("words").is_array_like());
    }
}

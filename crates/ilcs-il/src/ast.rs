//! The IL AST node type.
//!
//! One closed enum over every documented IL variant. The serde form is
//! internally tagged (`"kind"`), matching the JSON the upstream pipeline
//! hands over.

use serde::{Deserialize, Serialize};

use crate::ops::{
    AssignOp, BinaryOp, JsErrorKind, LogicalOp, MathConst, MathFunc, NumberConst, NumericKind,
    UnaryOp, UpdateOp,
};

/// A literal payload. BigInt literals keep their decimal text because the
/// source value may exceed the f64-safe integer range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum IlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    BigInt(String),
}

/// A function/method/constructor parameter.
///
/// `type_hint` carries whatever the upstream JSDoc parser extracted, as a
/// free-form type string (`"Uint8Array"`, `"number"`, `"boolean"`, ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IlParam {
    pub name: String,
    #[serde(default)]
    pub default: Option<Box<IlNode>>,
    #[serde(default)]
    pub type_hint: Option<String>,
}

impl IlParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            type_hint: None,
        }
    }
}

/// Dotted or computed member access.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum IlMemberProperty {
    Dotted(String),
    Computed(Box<IlNode>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IlObjectProperty {
    pub key: String,
    pub value: IlNode,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IlSwitchCase {
    /// `None` is the `default` case.
    pub test: Option<IlNode>,
    pub body: Vec<IlNode>,
}

/// One piece of a template/interpolated string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TemplatePart {
    Text(String),
    Expr(IlNode),
}

/// The IL AST node. `kind` determines the payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum IlNode {
    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------
    Program {
        body: Vec<IlNode>,
    },
    Class {
        name: String,
        #[serde(default)]
        parent: Option<String>,
        members: Vec<IlNode>,
    },
    Method {
        name: String,
        params: Vec<IlParam>,
        body: Box<IlNode>,
        #[serde(default)]
        is_static: bool,
        #[serde(default)]
        return_hint: Option<String>,
    },
    Constructor {
        params: Vec<IlParam>,
        body: Box<IlNode>,
    },
    Field {
        name: String,
        #[serde(default)]
        value: Option<Box<IlNode>>,
        #[serde(default)]
        is_static: bool,
    },
    /// A getter-style class property (`get Name() { ... }`).
    Property {
        name: String,
        body: Box<IlNode>,
        #[serde(default)]
        is_static: bool,
    },
    Block {
        body: Vec<IlNode>,
    },
    VarDecl {
        name: String,
        #[serde(default)]
        init: Option<Box<IlNode>>,
        #[serde(default)]
        mutable: bool,
    },

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------
    Literal {
        value: IlValue,
    },
    Identifier {
        name: String,
    },
    This,
    Super,
    Member {
        object: Box<IlNode>,
        property: IlMemberProperty,
    },
    ThisPropertyAccess {
        property: String,
    },
    ThisMethodCall {
        method: String,
        args: Vec<IlNode>,
    },
    ParentConstructorCall {
        args: Vec<IlNode>,
    },
    ParentMethodCall {
        method: String,
        args: Vec<IlNode>,
    },
    Call {
        callee: Box<IlNode>,
        args: Vec<IlNode>,
    },
    New {
        callee: String,
        args: Vec<IlNode>,
    },
    Binary {
        op: BinaryOp,
        left: Box<IlNode>,
        right: Box<IlNode>,
    },
    Logical {
        op: LogicalOp,
        left: Box<IlNode>,
        right: Box<IlNode>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<IlNode>,
    },
    Update {
        op: UpdateOp,
        prefix: bool,
        target: Box<IlNode>,
    },
    Assignment {
        op: AssignOp,
        target: Box<IlNode>,
        value: Box<IlNode>,
    },
    Conditional {
        cond: Box<IlNode>,
        then_branch: Box<IlNode>,
        else_branch: Box<IlNode>,
    },
    Sequence {
        exprs: Vec<IlNode>,
    },
    Template {
        parts: Vec<TemplatePart>,
    },
    Spread {
        argument: Box<IlNode>,
    },
    ArrayLiteral {
        elements: Vec<IlNode>,
    },
    ObjectLiteral {
        properties: Vec<IlObjectProperty>,
    },
    ArrowFunction {
        params: Vec<IlParam>,
        body: Box<IlNode>,
        /// True when the body is a bare expression rather than a block.
        is_expression: bool,
    },

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------
    ExpressionStatement {
        expr: Box<IlNode>,
    },
    If {
        cond: Box<IlNode>,
        then_branch: Box<IlNode>,
        #[serde(default)]
        else_branch: Option<Box<IlNode>>,
    },
    For {
        #[serde(default)]
        init: Option<Box<IlNode>>,
        #[serde(default)]
        test: Option<Box<IlNode>>,
        #[serde(default)]
        update: Option<Box<IlNode>>,
        body: Box<IlNode>,
    },
    ForOf {
        binding: String,
        iterable: Box<IlNode>,
        body: Box<IlNode>,
    },
    ForIn {
        binding: String,
        object: Box<IlNode>,
        body: Box<IlNode>,
    },
    While {
        cond: Box<IlNode>,
        body: Box<IlNode>,
    },
    DoWhile {
        body: Box<IlNode>,
        cond: Box<IlNode>,
    },
    Switch {
        discriminant: Box<IlNode>,
        cases: Vec<IlSwitchCase>,
    },
    Break,
    Continue,
    Throw {
        argument: Box<IlNode>,
    },
    Try {
        block: Box<IlNode>,
        #[serde(default)]
        catch_binding: Option<String>,
        #[serde(default)]
        handler: Option<Box<IlNode>>,
        #[serde(default)]
        finalizer: Option<Box<IlNode>>,
    },
    Return {
        #[serde(default)]
        argument: Option<Box<IlNode>>,
    },
    Empty,

    // ------------------------------------------------------------------
    // IL-lowered primitives
    // ------------------------------------------------------------------
    RotateLeft {
        bits: u16,
        value: Box<IlNode>,
        amount: Box<IlNode>,
    },
    RotateRight {
        bits: u16,
        value: Box<IlNode>,
        amount: Box<IlNode>,
    },
    /// Pack `bits/8` bytes into one unsigned integer.
    PackBytes {
        bits: u16,
        big_endian: bool,
        bytes: Vec<IlNode>,
    },
    /// Unpack an integer into `bits/8` bytes.
    UnpackBytes {
        bits: u16,
        big_endian: bool,
        value: Box<IlNode>,
    },
    Cast {
        target: NumericKind,
        value: Box<IlNode>,
    },
    BigIntCast {
        bits: u16,
        value: Box<IlNode>,
    },

    ArrayLength {
        array: Box<IlNode>,
    },
    ArrayAppend {
        array: Box<IlNode>,
        items: Vec<IlNode>,
    },
    ArraySlice {
        array: Box<IlNode>,
        #[serde(default)]
        start: Option<Box<IlNode>>,
        #[serde(default)]
        end: Option<Box<IlNode>>,
    },
    ArrayFill {
        array: Box<IlNode>,
        value: Box<IlNode>,
        #[serde(default)]
        start: Option<Box<IlNode>>,
        #[serde(default)]
        end: Option<Box<IlNode>>,
    },
    ArrayXor {
        array: Box<IlNode>,
        other: Box<IlNode>,
    },
    ArrayClear {
        array: Box<IlNode>,
    },
    ArrayIndexOf {
        array: Box<IlNode>,
        value: Box<IlNode>,
    },
    ArrayIncludes {
        array: Box<IlNode>,
        value: Box<IlNode>,
    },
    ArrayConcat {
        array: Box<IlNode>,
        others: Vec<IlNode>,
    },
    ArrayJoin {
        array: Box<IlNode>,
        #[serde(default)]
        separator: Option<Box<IlNode>>,
    },
    ArrayReverse {
        array: Box<IlNode>,
    },
    ArrayReduce {
        array: Box<IlNode>,
        callback: Box<IlNode>,
        #[serde(default)]
        initial: Option<Box<IlNode>>,
    },
    ArrayMap {
        array: Box<IlNode>,
        callback: Box<IlNode>,
    },
    ArrayFilter {
        array: Box<IlNode>,
        callback: Box<IlNode>,
    },
    ArrayForEach {
        array: Box<IlNode>,
        callback: Box<IlNode>,
    },
    ArrayFind {
        array: Box<IlNode>,
        callback: Box<IlNode>,
    },
    ArrayFindIndex {
        array: Box<IlNode>,
        callback: Box<IlNode>,
    },
    ArrayEvery {
        array: Box<IlNode>,
        callback: Box<IlNode>,
    },
    ArraySome {
        array: Box<IlNode>,
        callback: Box<IlNode>,
    },
    ArraySort {
        array: Box<IlNode>,
        #[serde(default)]
        comparator: Option<Box<IlNode>>,
    },
    ArrayPop {
        array: Box<IlNode>,
    },
    ArrayShift {
        array: Box<IlNode>,
    },
    /// `new Array(n)` / `new Array()`.
    ArrayCreation {
        #[serde(default)]
        length: Option<Box<IlNode>>,
    },
    ArraySplice {
        array: Box<IlNode>,
        start: Box<IlNode>,
        #[serde(default)]
        delete_count: Option<Box<IlNode>>,
        items: Vec<IlNode>,
    },

    /// `new Uint8Array(arg)` and friends. `arg` may be a length, a source
    /// array or an ArrayBuffer variable.
    TypedArrayCreation {
        element: NumericKind,
        #[serde(default)]
        arg: Option<Box<IlNode>>,
    },
    TypedArraySet {
        target: Box<IlNode>,
        source: Box<IlNode>,
        #[serde(default)]
        offset: Option<Box<IlNode>>,
    },
    TypedArraySubarray {
        array: Box<IlNode>,
        #[serde(default)]
        start: Option<Box<IlNode>>,
        #[serde(default)]
        end: Option<Box<IlNode>>,
    },
    /// A typed view over an ArrayBuffer-backed variable.
    ByteBufferView {
        buffer: Box<IlNode>,
        element: NumericKind,
        #[serde(default)]
        byte_offset: Option<Box<IlNode>>,
        #[serde(default)]
        length: Option<Box<IlNode>>,
    },

    HexEncode {
        bytes: Box<IlNode>,
    },
    HexDecode {
        text: Box<IlNode>,
    },
    StringToBytes {
        text: Box<IlNode>,
    },
    BytesToString {
        bytes: Box<IlNode>,
    },

    StringCharCodeAt {
        string: Box<IlNode>,
        index: Box<IlNode>,
    },
    StringCharAt {
        string: Box<IlNode>,
        index: Box<IlNode>,
    },
    StringSubstring {
        string: Box<IlNode>,
        start: Box<IlNode>,
        #[serde(default)]
        end: Option<Box<IlNode>>,
    },
    StringReplace {
        string: Box<IlNode>,
        pattern: Box<IlNode>,
        replacement: Box<IlNode>,
        #[serde(default)]
        all: bool,
    },
    StringSplit {
        string: Box<IlNode>,
        separator: Box<IlNode>,
    },
    StringIndexOf {
        string: Box<IlNode>,
        search: Box<IlNode>,
    },
    StringIncludes {
        string: Box<IlNode>,
        search: Box<IlNode>,
    },
    StringToUpperCase {
        string: Box<IlNode>,
    },
    StringToLowerCase {
        string: Box<IlNode>,
    },
    StringTrim {
        string: Box<IlNode>,
    },
    StringRepeat {
        string: Box<IlNode>,
        count: Box<IlNode>,
    },
    StringPadStart {
        string: Box<IlNode>,
        length: Box<IlNode>,
        #[serde(default)]
        pad: Option<Box<IlNode>>,
    },
    StringStartsWith {
        string: Box<IlNode>,
        search: Box<IlNode>,
    },

    MapCreation,
    MapGet {
        map: Box<IlNode>,
        key: Box<IlNode>,
    },
    MapSet {
        map: Box<IlNode>,
        key: Box<IlNode>,
        value: Box<IlNode>,
    },
    MapHas {
        map: Box<IlNode>,
        key: Box<IlNode>,
    },
    MapDelete {
        map: Box<IlNode>,
        key: Box<IlNode>,
    },
    SetCreation,

    ObjectKeys {
        object: Box<IlNode>,
    },
    ObjectValues {
        object: Box<IlNode>,
    },
    ObjectEntries {
        object: Box<IlNode>,
    },
    ObjectCreate {
        prototype: Box<IlNode>,
    },
    ObjectFreeze {
        object: Box<IlNode>,
    },

    MathCall {
        func: MathFunc,
        args: Vec<IlNode>,
    },
    MathConstant {
        name: MathConst,
    },
    NumberConstant {
        name: NumberConst,
    },
    Random,
    Clz32 {
        value: Box<IlNode>,
    },
    Imul {
        left: Box<IlNode>,
        right: Box<IlNode>,
    },

    IsArrayCheck {
        value: Box<IlNode>,
    },
    IsFinite {
        value: Box<IlNode>,
    },
    IsNaN {
        value: Box<IlNode>,
    },
    IsInteger {
        value: Box<IlNode>,
    },
    ArrayFrom {
        source: Box<IlNode>,
        #[serde(default)]
        mapper: Option<Box<IlNode>>,
    },

    DataViewRead {
        view: Box<IlNode>,
        element: NumericKind,
        offset: Box<IlNode>,
        #[serde(default)]
        little_endian: bool,
    },
    DataViewWrite {
        view: Box<IlNode>,
        element: NumericKind,
        offset: Box<IlNode>,
        value: Box<IlNode>,
        #[serde(default)]
        little_endian: bool,
    },

    DebugOutput {
        args: Vec<IlNode>,
    },
    ErrorCreation {
        error: JsErrorKind,
        #[serde(default)]
        message: Option<Box<IlNode>>,
    },
    StringInterpolation {
        parts: Vec<TemplatePart>,
    },
    StringFromCharCodes {
        args: Vec<IlNode>,
    },
    InstanceOfCheck {
        value: Box<IlNode>,
        class_name: String,
    },
    TypeOfExpression {
        value: Box<IlNode>,
    },
    /// `const [a, , c] = src` and the assignment form. `None` targets are
    /// holes in the pattern.
    DestructuringAssignment {
        targets: Vec<Option<String>>,
        source: Box<IlNode>,
        #[serde(default)]
        declare: bool,
    },
    /// Escape hatch: a direct call into the OpCodes helper namespace.
    OpCodesCall {
        method: String,
        args: Vec<IlNode>,
    },
}

impl IlNode {
    /// The variant name, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            IlNode::Program { .. } => "Program",
            IlNode::Class { .. } => "Class",
            IlNode::Method { .. } => "Method",
            IlNode::Constructor { .. } => "Constructor",
            IlNode::Field { .. } => "Field",
            IlNode::Property { .. } => "Property",
            IlNode::Block { .. } => "Block",
            IlNode::VarDecl { .. } => "VarDecl",
            IlNode::Literal { .. } => "Literal",
            IlNode::Identifier { .. } => "Identifier",
            IlNode::This => "This",
            IlNode::Super => "Super",
            IlNode::Member { .. } => "Member",
            IlNode::ThisPropertyAccess { .. } => "ThisPropertyAccess",
            IlNode::ThisMethodCall { .. } => "ThisMethodCall",
            IlNode::ParentConstructorCall { .. } => "ParentConstructorCall",
            IlNode::ParentMethodCall { .. } => "ParentMethodCall",
            IlNode::Call { .. } => "Call",
            IlNode::New { .. } => "New",
            IlNode::Binary { .. } => "Binary",
            IlNode::Logical { .. } => "Logical",
            IlNode::Unary { .. } => "Unary",
            IlNode::Update { .. } => "Update",
            IlNode::Assignment { .. } => "Assignment",
            IlNode::Conditional { .. } => "Conditional",
            IlNode::Sequence { .. } => "Sequence",
            IlNode::Template { .. } => "Template",
            IlNode::Spread { .. } => "Spread",
            IlNode::ArrayLiteral { .. } => "ArrayLiteral",
            IlNode::ObjectLiteral { .. } => "ObjectLiteral",
            IlNode::ArrowFunction { .. } => "ArrowFunction",
            IlNode::ExpressionStatement { .. } => "ExpressionStatement",
            IlNode::If { .. } => "If",
            IlNode::For { .. } => "For",
            IlNode::ForOf { .. } => "ForOf",
            IlNode::ForIn { .. } => "ForIn",
            IlNode::While { .. } => "While",
            IlNode::DoWhile { .. } => "DoWhile",
            IlNode::Switch { .. } => "Switch",
            IlNode::Break => "Break",
            IlNode::Continue => "Continue",
            IlNode::Throw { .. } => "Throw",
            IlNode::Try { .. } => "Try",
            IlNode::Return { .. } => "Return",
            IlNode::Empty => "Empty",
            IlNode::RotateLeft { .. } => "RotateLeft",
            IlNode::RotateRight { .. } => "RotateRight",
            IlNode::PackBytes { .. } => "PackBytes",
            IlNode::UnpackBytes { .. } => "UnpackBytes",
            IlNode::Cast { .. } => "Cast",
            IlNode::BigIntCast { .. } => "BigIntCast",
            IlNode::ArrayLength { .. } => "ArrayLength",
            IlNode::ArrayAppend { .. } => "ArrayAppend",
            IlNode::ArraySlice { .. } => "ArraySlice",
            IlNode::ArrayFill { .. } => "ArrayFill",
            IlNode::ArrayXor { .. } => "ArrayXor",
            IlNode::ArrayClear { .. } => "ArrayClear",
            IlNode::ArrayIndexOf { .. } => "ArrayIndexOf",
            IlNode::ArrayIncludes { .. } => "ArrayIncludes",
            IlNode::ArrayConcat { .. } => "ArrayConcat",
            IlNode::ArrayJoin { .. } => "ArrayJoin",
            IlNode::ArrayReverse { .. } => "ArrayReverse",
            IlNode::ArrayReduce { .. } => "ArrayReduce",
            IlNode::ArrayMap { .. } => "ArrayMap",
            IlNode::ArrayFilter { .. } => "ArrayFilter",
            IlNode::ArrayForEach { .. } => "ArrayForEach",
            IlNode::ArrayFind { .. } => "ArrayFind",
            IlNode::ArrayFindIndex { .. } => "ArrayFindIndex",
            IlNode::ArrayEvery { .. } => "ArrayEvery",
            IlNode::ArraySome { .. } => "ArraySome",
            IlNode::ArraySort { .. } => "ArraySort",
            IlNode::ArrayPop { .. } => "ArrayPop",
            IlNode::ArrayShift { .. } => "ArrayShift",
            IlNode::ArrayCreation { .. } => "ArrayCreation",
            IlNode::ArraySplice { .. } => "ArraySplice",
            IlNode::TypedArrayCreation { .. } => "TypedArrayCreation",
            IlNode::TypedArraySet { .. } => "TypedArraySet",
            IlNode::TypedArraySubarray { .. } => "TypedArraySubarray",
            IlNode::ByteBufferView { .. } => "ByteBufferView",
            IlNode::HexEncode { .. } => "HexEncode",
            IlNode::HexDecode { .. } => "HexDecode",
            IlNode::StringToBytes { .. } => "StringToBytes",
            IlNode::BytesToString { .. } => "BytesToString",
            IlNode::StringCharCodeAt { .. } => "StringCharCodeAt",
            IlNode::StringCharAt { .. } => "StringCharAt",
            IlNode::StringSubstring { .. } => "StringSubstring",
            IlNode::StringReplace { .. } => "StringReplace",
            IlNode::StringSplit { .. } => "StringSplit",
            IlNode::StringIndexOf { .. } => "StringIndexOf",
            IlNode::StringIncludes { .. } => "StringIncludes",
            IlNode::StringToUpperCase { .. } => "StringToUpperCase",
            IlNode::StringToLowerCase { .. } => "StringToLowerCase",
            IlNode::StringTrim { .. } => "StringTrim",
            IlNode::StringRepeat { .. } => "StringRepeat",
            IlNode::StringPadStart { .. } => "StringPadStart",
            IlNode::StringStartsWith { .. } => "StringStartsWith",
            IlNode::MapCreation => "MapCreation",
            IlNode::MapGet { .. } => "MapGet",
            IlNode::MapSet { .. } => "MapSet",
            IlNode::MapHas { .. } => "MapHas",
            IlNode::MapDelete { .. } => "MapDelete",
            IlNode::SetCreation => "SetCreation",
            IlNode::ObjectKeys { .. } => "ObjectKeys",
            IlNode::ObjectValues { .. } => "ObjectValues",
            IlNode::ObjectEntries { .. } => "ObjectEntries",
            IlNode::ObjectCreate { .. } => "ObjectCreate",
            IlNode::ObjectFreeze { .. } => "ObjectFreeze",
            IlNode::MathCall { .. } => "MathCall",
            IlNode::MathConstant { .. } => "MathConstant",
            IlNode::NumberConstant { .. } => "NumberConstant",
            IlNode::Random => "Random",
            IlNode::Clz32 { .. } => "Clz32",
            IlNode::Imul { .. } => "Imul",
            IlNode::IsArrayCheck { .. } => "IsArrayCheck",
            IlNode::IsFinite { .. } => "IsFinite",
            IlNode::IsNaN { .. } => "IsNaN",
            IlNode::IsInteger { .. } => "IsInteger",
            IlNode::ArrayFrom { .. } => "ArrayFrom",
            IlNode::DataViewRead { .. } => "DataViewRead",
            IlNode::DataViewWrite { .. } => "DataViewWrite",
            IlNode::DebugOutput { .. } => "DebugOutput",
            IlNode::ErrorCreation { .. } => "ErrorCreation",
            IlNode::StringInterpolation { .. } => "StringInterpolation",
            IlNode::StringFromCharCodes { .. } => "StringFromCharCodes",
            IlNode::InstanceOfCheck { .. } => "InstanceOfCheck",
            IlNode::TypeOfExpression { .. } => "TypeOfExpression",
            IlNode::DestructuringAssignment { .. } => "DestructuringAssignment",
            IlNode::OpCodesCall { .. } => "OpCodesCall",
        }
    }

    /// Immediate child nodes, in source order. Drives the generic walks
    /// in the pre-analyzer and the return-site scans.
    pub fn children(&self) -> Vec<&IlNode> {
        let mut out = Vec::new();
        self.collect_children(&mut out);
        out
    }

    fn collect_children<'a>(&'a self, out: &mut Vec<&'a IlNode>) {
        fn push<'a>(out: &mut Vec<&'a IlNode>, node: &'a IlNode) {
            out.push(node);
        }
        fn push_opt<'a>(out: &mut Vec<&'a IlNode>, node: &'a Option<Box<IlNode>>) {
            if let Some(node) = node {
                out.push(node);
            }
        }
        fn push_all<'a>(out: &mut Vec<&'a IlNode>, nodes: &'a [IlNode]) {
            out.extend(nodes.iter());
        }
        fn push_params<'a>(out: &mut Vec<&'a IlNode>, params: &'a [IlParam]) {
            for param in params {
                if let Some(default) = &param.default {
                    out.push(default);
                }
            }
        }

        match self {
            IlNode::Program { body } | IlNode::Block { body } => push_all(out, body),
            IlNode::Class { members, .. } => push_all(out, members),
            IlNode::Method { params, body, .. } | IlNode::Constructor { params, body } => {
                push_params(out, params);
                push(out, body);
            }
            IlNode::Field { value, .. } => push_opt(out, value),
            IlNode::Property { body, .. } => push(out, body),
            IlNode::VarDecl { init, .. } => push_opt(out, init),
            IlNode::Literal { .. }
            | IlNode::Identifier { .. }
            | IlNode::This
            | IlNode::Super
            | IlNode::ThisPropertyAccess { .. }
            | IlNode::Break
            | IlNode::Continue
            | IlNode::Empty
            | IlNode::MapCreation
            | IlNode::SetCreation
            | IlNode::MathConstant { .. }
            | IlNode::NumberConstant { .. }
            | IlNode::Random => {}
            IlNode::Member { object, property } => {
                push(out, object);
                if let IlMemberProperty::Computed(index) = property {
                    push(out, index);
                }
            }
            IlNode::ThisMethodCall { args, .. }
            | IlNode::ParentConstructorCall { args }
            | IlNode::ParentMethodCall { args, .. }
            | IlNode::New { args, .. }
            | IlNode::DebugOutput { args }
            | IlNode::StringFromCharCodes { args }
            | IlNode::MathCall { args, .. }
            | IlNode::OpCodesCall { args, .. } => push_all(out, args),
            IlNode::Call { callee, args } => {
                push(out, callee);
                push_all(out, args);
            }
            IlNode::Binary { left, right, .. }
            | IlNode::Logical { left, right, .. }
            | IlNode::Imul { left, right } => {
                push(out, left);
                push(out, right);
            }
            IlNode::Unary { operand, .. } => push(out, operand),
            IlNode::Update { target, .. } => push(out, target),
            IlNode::Assignment { target, value, .. } => {
                push(out, target);
                push(out, value);
            }
            IlNode::Conditional {
                cond,
                then_branch,
                else_branch,
            } => {
                push(out, cond);
                push(out, then_branch);
                push(out, else_branch);
            }
            IlNode::Sequence { exprs } | IlNode::ArrayLiteral { elements: exprs } => {
                push_all(out, exprs)
            }
            IlNode::Template { parts } | IlNode::StringInterpolation { parts } => {
                for part in parts {
                    if let TemplatePart::Expr(expr) = part {
                        push(out, expr);
                    }
                }
            }
            IlNode::Spread { argument } | IlNode::Throw { argument } => push(out, argument),
            IlNode::ObjectLiteral { properties } => {
                for property in properties {
                    push(out, &property.value);
                }
            }
            IlNode::ArrowFunction { params, body, .. } => {
                push_params(out, params);
                push(out, body);
            }
            IlNode::ExpressionStatement { expr } => push(out, expr),
            IlNode::If {
                cond,
                then_branch,
                else_branch,
            } => {
                push(out, cond);
                push(out, then_branch);
                push_opt(out, else_branch);
            }
            IlNode::For {
                init,
                test,
                update,
                body,
            } => {
                push_opt(out, init);
                push_opt(out, test);
                push_opt(out, update);
                push(out, body);
            }
            IlNode::ForOf { iterable, body, .. } => {
                push(out, iterable);
                push(out, body);
            }
            IlNode::ForIn { object, body, .. } => {
                push(out, object);
                push(out, body);
            }
            IlNode::While { cond, body } => {
                push(out, cond);
                push(out, body);
            }
            IlNode::DoWhile { body, cond } => {
                push(out, body);
                push(out, cond);
            }
            IlNode::Switch {
                discriminant,
                cases,
            } => {
                push(out, discriminant);
                for case in cases {
                    if let Some(test) = &case.test {
                        push(out, test);
                    }
                    push_all(out, &case.body);
                }
            }
            IlNode::Try {
                block,
                handler,
                finalizer,
                ..
            } => {
                push(out, block);
                push_opt(out, handler);
                push_opt(out, finalizer);
            }
            IlNode::Return { argument } => push_opt(out, argument),
            IlNode::RotateLeft { value, amount, .. }
            | IlNode::RotateRight { value, amount, .. } => {
                push(out, value);
                push(out, amount);
            }
            IlNode::PackBytes { bytes, .. } => push_all(out, bytes),
            IlNode::UnpackBytes { value, .. }
            | IlNode::Cast { value, .. }
            | IlNode::BigIntCast { value, .. }
            | IlNode::Clz32 { value }
            | IlNode::IsArrayCheck { value }
            | IlNode::IsFinite { value }
            | IlNode::IsNaN { value }
            | IlNode::IsInteger { value }
            | IlNode::TypeOfExpression { value }
            | IlNode::InstanceOfCheck { value, .. } => push(out, value),
            IlNode::ArrayLength { array }
            | IlNode::ArrayReverse { array }
            | IlNode::ArrayClear { array }
            | IlNode::ArrayPop { array }
            | IlNode::ArrayShift { array } => push(out, array),
            IlNode::ArrayAppend { array, items } => {
                push(out, array);
                push_all(out, items);
            }
            IlNode::ArraySlice { array, start, end }
            | IlNode::TypedArraySubarray { array, start, end } => {
                push(out, array);
                push_opt(out, start);
                push_opt(out, end);
            }
            IlNode::ArrayFill {
                array,
                value,
                start,
                end,
            } => {
                push(out, array);
                push(out, value);
                push_opt(out, start);
                push_opt(out, end);
            }
            IlNode::ArrayXor { array, other } => {
                push(out, array);
                push(out, other);
            }
            IlNode::ArrayIndexOf { array, value } | IlNode::ArrayIncludes { array, value } => {
                push(out, array);
                push(out, value);
            }
            IlNode::ArrayConcat { array, others } => {
                push(out, array);
                push_all(out, others);
            }
            IlNode::ArrayJoin { array, separator } => {
                push(out, array);
                push_opt(out, separator);
            }
            IlNode::ArrayReduce {
                array,
                callback,
                initial,
            } => {
                push(out, array);
                push(out, callback);
                push_opt(out, initial);
            }
            IlNode::ArrayMap { array, callback }
            | IlNode::ArrayFilter { array, callback }
            | IlNode::ArrayForEach { array, callback }
            | IlNode::ArrayFind { array, callback }
            | IlNode::ArrayFindIndex { array, callback }
            | IlNode::ArrayEvery { array, callback }
            | IlNode::ArraySome { array, callback } => {
                push(out, array);
                push(out, callback);
            }
            IlNode::ArraySort { array, comparator } => {
                push(out, array);
                push_opt(out, comparator);
            }
            IlNode::ArrayCreation { length } => push_opt(out, length),
            IlNode::ArraySplice {
                array,
                start,
                delete_count,
                items,
            } => {
                push(out, array);
                push(out, start);
                push_opt(out, delete_count);
                push_all(out, items);
            }
            IlNode::TypedArrayCreation { arg, .. } => push_opt(out, arg),
            IlNode::TypedArraySet {
                target,
                source,
                offset,
            } => {
                push(out, target);
                push(out, source);
                push_opt(out, offset);
            }
            IlNode::ByteBufferView {
                buffer,
                byte_offset,
                length,
                ..
            } => {
                push(out, buffer);
                push_opt(out, byte_offset);
                push_opt(out, length);
            }
            IlNode::HexEncode { bytes } | IlNode::BytesToString { bytes } => push(out, bytes),
            IlNode::HexDecode { text } | IlNode::StringToBytes { text } => push(out, text),
            IlNode::StringCharCodeAt { string, index } | IlNode::StringCharAt { string, index } => {
                push(out, string);
                push(out, index);
            }
            IlNode::StringSubstring { string, start, end } => {
                push(out, string);
                push(out, start);
                push_opt(out, end);
            }
            IlNode::StringReplace {
                string,
                pattern,
                replacement,
                ..
            } => {
                push(out, string);
                push(out, pattern);
                push(out, replacement);
            }
            IlNode::StringSplit { string, separator } => {
                push(out, string);
                push(out, separator);
            }
            IlNode::StringIndexOf { string, search }
            | IlNode::StringIncludes { string, search }
            | IlNode::StringStartsWith { string, search } => {
                push(out, string);
                push(out, search);
            }
            IlNode::StringToUpperCase { string }
            | IlNode::StringToLowerCase { string }
            | IlNode::StringTrim { string } => push(out, string),
            IlNode::StringRepeat { string, count } => {
                push(out, string);
                push(out, count);
            }
            IlNode::StringPadStart {
                string,
                length,
                pad,
            } => {
                push(out, string);
                push(out, length);
                push_opt(out, pad);
            }
            IlNode::MapGet { map, key } | IlNode::MapHas { map, key } | IlNode::MapDelete { map, key } => {
                push(out, map);
                push(out, key);
            }
            IlNode::MapSet { map, key, value } => {
                push(out, map);
                push(out, key);
                push(out, value);
            }
            IlNode::ObjectKeys { object }
            | IlNode::ObjectValues { object }
            | IlNode::ObjectEntries { object }
            | IlNode::ObjectFreeze { object } => push(out, object),
            IlNode::ObjectCreate { prototype } => push(out, prototype),
            IlNode::ArrayFrom { source, mapper } => {
                push(out, source);
                push_opt(out, mapper);
            }
            IlNode::DataViewRead { view, offset, .. } => {
                push(out, view);
                push(out, offset);
            }
            IlNode::DataViewWrite {
                view,
                offset,
                value,
                ..
            } => {
                push(out, view);
                push(out, offset);
                push(out, value);
            }
            IlNode::ErrorCreation { message, .. } => push_opt(out, message),
            IlNode::DestructuringAssignment { source, .. } => push(out, source),
        }
    }

    // Construction helpers, used heavily by tests.

    pub fn ident(name: impl Into<String>) -> IlNode {
        IlNode::Identifier { name: name.into() }
    }

    pub fn int(value: i64) -> IlNode {
        IlNode::Literal {
            value: IlValue::Int(value),
        }
    }

    pub fn float(value: f64) -> IlNode {
        IlNode::Literal {
            value: IlValue::Float(value),
        }
    }

    pub fn str(value: impl Into<String>) -> IlNode {
        IlNode::Literal {
            value: IlValue::Str(value.into()),
        }
    }

    pub fn bool(value: bool) -> IlNode {
        IlNode::Literal {
            value: IlValue::Bool(value),
        }
    }

    pub fn binary(op: BinaryOp, left: IlNode, right: IlNode) -> IlNode {
        IlNode::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn assign(target: IlNode, value: IlNode) -> IlNode {
        IlNode::Assignment {
            op: AssignOp::Assign,
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    pub fn stmt(expr: IlNode) -> IlNode {
        IlNode::ExpressionStatement {
            expr: Box::new(expr),
        }
    }

    pub fn block(body: Vec<IlNode>) -> IlNode {
        IlNode::Block { body }
    }

    pub fn ret(argument: Option<IlNode>) -> IlNode {
        IlNode::Return {
            argument: argument.map(Box::new),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_match_variants() {
        assert_eq!(IlNode::ident("x").kind_name(), "Identifier");
        assert_eq!(IlNode::This.kind_name(), "This");
        assert_eq!(
            IlNode::binary(BinaryOp::UShr, IlNode::ident("x"), IlNode::int(0)).kind_name(),
            "Binary"
        );
    }

    #[test]
    fn json_round_trip_tagged_by_kind() {
        let node = IlNode::RotateLeft {
            bits: 32,
            value: Box::new(IlNode::ident("v")),
            amount: Box::new(IlNode::int(7)),
        };
        let json = serde_json::to_string(&node).unwrap();
        assert!(json.contains("\"kind\":\"RotateLeft\""));
        let back: IlNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn param_defaults_are_optional_in_json() {
        let p: IlParam = serde_json::from_str(r#"{"name":"key"}"#).unwrap();
        assert_eq!(p.name, "key");
        assert!(p.default.is_none());
        assert!(p.type_hint.is_none());
    }
}

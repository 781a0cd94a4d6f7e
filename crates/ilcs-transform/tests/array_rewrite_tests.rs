//! Array rewrites: push, slice, empty literals, indexOf/includes, fill.

use ilcs_csharp::ast::{CsExpr, CsMember, CsMethod, CsStmt};
use ilcs_csharp::types::TypeId;
use ilcs_il::{IlNode, IlParam};
use ilcs_transform::{Transpiled, transpile};

fn byte_array_param(name: &str) -> IlParam {
    IlParam {
        name: name.to_string(),
        default: None,
        type_hint: Some("Uint8Array".to_string()),
    }
}

fn run_method_with_hint(
    params: Vec<IlParam>,
    body: Vec<IlNode>,
    return_hint: Option<&str>,
) -> Transpiled {
    let program = IlNode::Program {
        body: vec![IlNode::Class {
            name: "Cipher".to_string(),
            parent: None,
            members: vec![IlNode::Method {
                name: "run".to_string(),
                params,
                body: Box::new(IlNode::block(body)),
                is_static: false,
                return_hint: return_hint.map(str::to_string),
            }],
        }],
    };
    transpile(&program, ilcs_common::TranspileOptions::default()).unwrap()
}

fn run_method(params: Vec<IlParam>, body: Vec<IlNode>) -> Transpiled {
    run_method_with_hint(params, body, None)
}

fn first_method(result: &Transpiled) -> &CsMethod {
    result.unit.types[0]
        .members
        .iter()
        .find_map(|m| match m {
            CsMember::Method(method) => Some(method),
            _ => None,
        })
        .expect("method emitted")
}

/// Renders nested invocation chains as "a.Append(..).ToArray()" heads
/// for shape assertions.
fn callee_name(expr: &CsExpr) -> Option<&str> {
    match expr {
        CsExpr::Invocation { callee, .. } => match &**callee {
            CsExpr::Member { name, .. } => Some(name),
            _ => None,
        },
        _ => None,
    }
}

#[test]
fn push_rewrites_to_append_to_array() {
    // a.push(x)  =>  a = a.Append((byte)x).ToArray();
    let result = run_method(
        vec![byte_array_param("a"), IlParam::new("x0")],
        vec![IlNode::stmt(IlNode::ArrayAppend {
            array: Box::new(IlNode::ident("a")),
            items: vec![IlNode::ident("x0")],
        })],
    );
    let method = first_method(&result);
    let CsStmt::Expr(CsExpr::Assignment { target, value, .. }) = &method.body[0] else {
        panic!("expected assignment, got {:?}", method.body[0]);
    };
    assert_eq!(**target, CsExpr::ident("a"));
    assert_eq!(callee_name(value), Some("ToArray"));
    let CsExpr::Invocation { callee, .. } = &**value else {
        unreachable!()
    };
    let CsExpr::Member { target: chain, .. } = &**callee else {
        unreachable!()
    };
    // The chain under ToArray is the Append call, and the pushed uint
    // gets its byte cast.
    assert_eq!(callee_name(chain), Some("Append"));
    let CsExpr::Invocation { args, .. } = &**chain else {
        unreachable!()
    };
    assert_eq!(args[0], CsExpr::cast(TypeId::BYTE, CsExpr::ident("x0")));
}

#[test]
fn push_spread_uses_concat() {
    // a.push(...b)  =>  a = a.Concat(b).ToArray();
    let result = run_method(
        vec![byte_array_param("a"), byte_array_param("b")],
        vec![IlNode::stmt(IlNode::ArrayAppend {
            array: Box::new(IlNode::ident("a")),
            items: vec![IlNode::Spread {
                argument: Box::new(IlNode::ident("b")),
            }],
        })],
    );
    let method = first_method(&result);
    let CsStmt::Expr(CsExpr::Assignment { value, .. }) = &method.body[0] else {
        panic!("expected assignment");
    };
    assert_eq!(callee_name(value), Some("ToArray"));
    let CsExpr::Invocation { callee, .. } = &**value else {
        unreachable!()
    };
    let CsExpr::Member { target: chain, .. } = &**callee else {
        unreachable!()
    };
    assert_eq!(callee_name(chain), Some("Concat"));
}

#[test]
fn slice_with_negative_start_uses_length_arithmetic() {
    // a.slice(-4)  =>  OpCodes.SliceArray(a, a.Length - 4, a.Length)
    let result = run_method(
        vec![byte_array_param("a")],
        vec![IlNode::VarDecl {
            name: "tail".to_string(),
            init: Some(Box::new(IlNode::ArraySlice {
                array: Box::new(IlNode::ident("a")),
                start: Some(Box::new(IlNode::int(-4))),
                end: None,
            })),
            mutable: false,
        }],
    );
    let method = first_method(&result);
    let CsStmt::LocalDecl { ty, init, .. } = &method.body[0] else {
        panic!("expected declaration");
    };
    assert_eq!(*ty, TypeId::BYTE_ARRAY);
    let CsExpr::Invocation { callee, args } = init.as_ref().unwrap() else {
        panic!("expected SliceArray call");
    };
    assert_eq!(
        **callee,
        CsExpr::member(CsExpr::ident("OpCodes"), "SliceArray")
    );
    assert_eq!(
        args[1],
        CsExpr::binary(
            ilcs_csharp::ast::CsBinaryOp::Sub,
            CsExpr::member(CsExpr::ident("a"), "Length"),
            CsExpr::int(4)
        )
    );
    assert_eq!(args[2], CsExpr::member(CsExpr::ident("a"), "Length"));
}

#[test]
fn empty_literal_with_byte_return_becomes_array_empty() {
    // var x = []; return x;  in a byte[]-returning method.
    let result = run_method_with_hint(
        vec![],
        vec![
            IlNode::VarDecl {
                name: "x".to_string(),
                init: Some(Box::new(IlNode::ArrayLiteral { elements: vec![] })),
                mutable: true,
            },
            IlNode::ret(Some(IlNode::ident("x"))),
        ],
        Some("Uint8Array"),
    );
    let method = first_method(&result);
    assert_eq!(method.return_type, TypeId::BYTE_ARRAY);
    let CsStmt::LocalDecl { ty, init, .. } = &method.body[0] else {
        panic!("expected declaration");
    };
    assert_eq!(*ty, TypeId::BYTE_ARRAY);
    let CsExpr::Invocation { callee, .. } = init.as_ref().unwrap() else {
        panic!("expected Array.Empty call");
    };
    assert_eq!(
        **callee,
        CsExpr::member(CsExpr::ident("Array"), "Empty<byte>")
    );
}

#[test]
fn index_of_splits_between_string_and_array() {
    let result = run_method(
        vec![
            IlParam {
                name: "s".to_string(),
                default: None,
                type_hint: Some("string".to_string()),
            },
            byte_array_param("a"),
        ],
        vec![
            IlNode::VarDecl {
                name: "i".to_string(),
                init: Some(Box::new(IlNode::ArrayIndexOf {
                    array: Box::new(IlNode::ident("s")),
                    value: Box::new(IlNode::str("x")),
                })),
                mutable: false,
            },
            IlNode::VarDecl {
                name: "j".to_string(),
                init: Some(Box::new(IlNode::ArrayIndexOf {
                    array: Box::new(IlNode::ident("a")),
                    value: Box::new(IlNode::int(0)),
                })),
                mutable: false,
            },
        ],
    );
    let method = first_method(&result);
    // String form: s.IndexOf("x")
    let CsStmt::LocalDecl { init: Some(string_form), .. } = &method.body[0] else {
        panic!("expected declaration");
    };
    let CsExpr::Invocation { callee, .. } = string_form else {
        panic!("expected call");
    };
    assert_eq!(**callee, CsExpr::member(CsExpr::ident("s"), "IndexOf"));
    // Array form: Array.IndexOf(a, 0)
    let CsStmt::LocalDecl { init: Some(array_form), .. } = &method.body[1] else {
        panic!("expected declaration");
    };
    let CsExpr::Invocation { callee, args } = array_form else {
        panic!("expected call");
    };
    assert_eq!(**callee, CsExpr::member(CsExpr::ident("Array"), "IndexOf"));
    assert_eq!(args.len(), 2);
}

#[test]
fn fill_of_fresh_creation_uses_enumerable_repeat() {
    // new Array(16).fill(0)
    let result = run_method(
        vec![],
        vec![IlNode::VarDecl {
            name: "state".to_string(),
            init: Some(Box::new(IlNode::ArrayFill {
                array: Box::new(IlNode::ArrayCreation {
                    length: Some(Box::new(IlNode::int(16))),
                }),
                value: Box::new(IlNode::int(0)),
                start: None,
                end: None,
            })),
            mutable: true,
        }],
    );
    let method = first_method(&result);
    let CsStmt::LocalDecl { init: Some(init), .. } = &method.body[0] else {
        panic!("expected declaration");
    };
    assert_eq!(callee_name(init), Some("ToArray"));
    let CsExpr::Invocation { callee, .. } = init else {
        unreachable!()
    };
    let CsExpr::Member { target: repeat, .. } = &**callee else {
        unreachable!()
    };
    let CsExpr::Invocation { callee: repeat_callee, args } = &**repeat else {
        panic!("expected Enumerable.Repeat under ToArray");
    };
    assert_eq!(
        **repeat_callee,
        CsExpr::member(CsExpr::ident("Enumerable"), "Repeat")
    );
    assert_eq!(args.len(), 2);
}

#[test]
fn fill_of_existing_array_is_the_inplace_helper() {
    let result = run_method(
        vec![byte_array_param("a")],
        vec![IlNode::stmt(IlNode::ArrayFill {
            array: Box::new(IlNode::ident("a")),
            value: Box::new(IlNode::int(0)),
            start: None,
            end: None,
        })],
    );
    let method = first_method(&result);
    let CsStmt::Expr(CsExpr::Invocation { callee, .. }) = &method.body[0] else {
        panic!("expected helper statement, got {:?}", method.body[0]);
    };
    assert_eq!(
        **callee,
        CsExpr::member(CsExpr::ident("OpCodes"), "FillArray")
    );
}

//! `>>> 0` coercion and unsigned-shift emission.

use ilcs_csharp::ast::{CsBinaryOp, CsExpr, CsMember, CsMethod, CsStmt};
use ilcs_csharp::types::TypeId;
use ilcs_il::{AssignOp, BinaryOp, IlNode, IlParam};
use ilcs_transform::{Transpiled, transpile};

fn run_method(params: Vec<IlParam>, body: Vec<IlNode>) -> Transpiled {
    let program = IlNode::Program {
        body: vec![IlNode::Class {
            name: "Cipher".to_string(),
            parent: None,
            members: vec![IlNode::Method {
                name: "run".to_string(),
                params,
                body: Box::new(IlNode::block(body)),
                is_static: false,
                return_hint: None,
            }],
        }],
    };
    transpile(&program, ilcs_common::TranspileOptions::default()).unwrap()
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

fn int_param(name: &str) -> IlParam {
    IlParam {
        name: name.to_string(),
        default: None,
        type_hint: Some("number".to_string()),
    }
}

#[test]
fn ushr_zero_over_int_emits_uint_cast() {
    // var y = x >>> 0;  with x : int  =>  uint y = (uint)x;
    let result = run_method(
        vec![int_param("x")],
        vec![IlNode::VarDecl {
            name: "y".to_string(),
            init: Some(Box::new(IlNode::binary(
                BinaryOp::UShr,
                IlNode::ident("x"),
                IlNode::int(0),
            ))),
            mutable: false,
        }],
    );
    let method = first_method(&result);
    let CsStmt::LocalDecl { ty, init, .. } = &method.body[0] else {
        panic!("expected declaration, got {:?}", method.body[0]);
    };
    assert_eq!(*ty, TypeId::UINT);
    assert_eq!(
        init.as_ref().unwrap(),
        &CsExpr::cast(TypeId::UINT, CsExpr::ident("x"))
    );
}

#[test]
fn ushr_zero_over_uint_is_identity() {
    // The crypto default types `x0` as uint already; no cast appears.
    let result = run_method(
        vec![IlParam::new("x0")],
        vec![IlNode::VarDecl {
            name: "y".to_string(),
            init: Some(Box::new(IlNode::binary(
                BinaryOp::UShr,
                IlNode::ident("x0"),
                IlNode::int(0),
            ))),
            mutable: false,
        }],
    );
    let method = first_method(&result);
    let CsStmt::LocalDecl { ty, init, .. } = &method.body[0] else {
        panic!("expected declaration");
    };
    assert_eq!(*ty, TypeId::UINT);
    assert_eq!(init.as_ref().unwrap(), &CsExpr::ident("x0"));
}

#[test]
fn ushr_with_amount_shifts_unsigned_reinterpretation() {
    // x : int, x >>> 8  =>  (uint)x >> 8, typed uint.
    let result = run_method(
        vec![int_param("x")],
        vec![IlNode::VarDecl {
            name: "y".to_string(),
            init: Some(Box::new(IlNode::binary(
                BinaryOp::UShr,
                IlNode::ident("x"),
                IlNode::int(8),
            ))),
            mutable: false,
        }],
    );
    let method = first_method(&result);
    let CsStmt::LocalDecl { ty, init, .. } = &method.body[0] else {
        panic!("expected declaration");
    };
    assert_eq!(*ty, TypeId::UINT);
    let CsExpr::Binary { op, left, .. } = init.as_ref().unwrap() else {
        panic!("expected shift expression");
    };
    assert_eq!(*op, CsBinaryOp::Shr);
    assert_eq!(**left, CsExpr::cast(TypeId::UINT, CsExpr::ident("x")));
}

#[test]
fn compound_ushr_rewrites_to_plain_assignment() {
    // x >>>= 1 cannot stay compound; it becomes x = <shifted form>.
    let result = run_method(
        vec![IlParam::new("x0")],
        vec![IlNode::stmt(IlNode::Assignment {
            op: AssignOp::UShr,
            target: Box::new(IlNode::ident("x0")),
            value: Box::new(IlNode::int(1)),
        })],
    );
    let method = first_method(&result);
    let CsStmt::Expr(CsExpr::Assignment { op, .. }) = &method.body[0] else {
        panic!("expected assignment statement, got {:?}", method.body[0]);
    };
    assert_eq!(*op, ilcs_csharp::ast::CsAssignOp::Assign);
}

#[test]
fn wide_ushr_uses_ulong() {
    // x : ulong (via BigInt hint), x >>> 3 stays in the 64-bit domain.
    let result = run_method(
        vec![IlParam {
            name: "x".to_string(),
            default: None,
            type_hint: Some("bigint".to_string()),
        }],
        vec![IlNode::VarDecl {
            name: "y".to_string(),
            init: Some(Box::new(IlNode::binary(
                BinaryOp::UShr,
                IlNode::ident("x"),
                IlNode::int(3),
            ))),
            mutable: false,
        }],
    );
    let method = first_method(&result);
    let CsStmt::LocalDecl { ty, .. } = &method.body[0] else {
        panic!("expected declaration");
    };
    assert_eq!(*ty, TypeId::ULONG);
}

//! Rotation helpers and byte packing/unpacking.

use ilcs_csharp::ast::{CsBinaryOp, CsExpr, CsMember, CsMethod, CsStmt};
use ilcs_csharp::types::TypeId;
use ilcs_il::{IlNode, IlParam};
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

fn decl_init(method: &CsMethod) -> (&CsExpr, TypeId) {
    let CsStmt::LocalDecl { ty, init, .. } = &method.body[0] else {
        panic!("expected declaration, got {:?}", method.body[0]);
    };
    (init.as_ref().expect("initializer"), *ty)
}

fn opcodes_callee(name: &str) -> CsExpr {
    CsExpr::member(CsExpr::ident("OpCodes"), name)
}

#[test]
fn rotl32_casts_operand_and_calls_helper() {
    // RotateLeft{32}(v, 7) with v : int  =>  OpCodes.RotL32((uint)v, 7)
    let result = run_method(
        vec![IlParam {
            name: "v".to_string(),
            default: None,
            type_hint: Some("number".to_string()),
        }],
        vec![IlNode::VarDecl {
            name: "r".to_string(),
            init: Some(Box::new(IlNode::RotateLeft {
                bits: 32,
                value: Box::new(IlNode::ident("v")),
                amount: Box::new(IlNode::int(7)),
            })),
            mutable: false,
        }],
    );
    let method = first_method(&result);
    let (init, ty) = decl_init(method);
    assert_eq!(ty, TypeId::UINT);
    let CsExpr::Invocation { callee, args } = init else {
        panic!("expected helper call, got {init:?}");
    };
    assert_eq!(**callee, opcodes_callee("RotL32"));
    assert_eq!(args[0], CsExpr::cast(TypeId::UINT, CsExpr::ident("v")));
    assert_eq!(args[1], CsExpr::int(7));
}

#[test]
fn rotr64_uses_ulong_helper() {
    let result = run_method(
        vec![IlParam {
            name: "v".to_string(),
            default: None,
            type_hint: Some("bigint".to_string()),
        }],
        vec![IlNode::VarDecl {
            name: "r".to_string(),
            init: Some(Box::new(IlNode::RotateRight {
                bits: 64,
                value: Box::new(IlNode::ident("v")),
                amount: Box::new(IlNode::int(13)),
            })),
            mutable: false,
        }],
    );
    let method = first_method(&result);
    let (init, ty) = decl_init(method);
    assert_eq!(ty, TypeId::ULONG);
    let CsExpr::Invocation { callee, args } = init else {
        panic!("expected helper call");
    };
    assert_eq!(**callee, opcodes_callee("RotR64"));
    // Already ulong: no cast on the operand.
    assert_eq!(args[0], CsExpr::ident("v"));
}

#[test]
fn pack32be_casts_every_byte() {
    // PackBytes{32, big}([b0..b3]) => OpCodes.Pack32BE((byte)b0, ...)
    let bytes: Vec<IlNode> = (0..4).map(|i| IlNode::ident(format!("b{i}"))).collect();
    let params: Vec<IlParam> = (0..4).map(|i| IlParam::new(format!("b{i}"))).collect();
    let result = run_method(
        params,
        vec![IlNode::VarDecl {
            name: "w".to_string(),
            init: Some(Box::new(IlNode::PackBytes {
                bits: 32,
                big_endian: true,
                bytes,
            })),
            mutable: false,
        }],
    );
    let method = first_method(&result);
    let (init, ty) = decl_init(method);
    assert_eq!(ty, TypeId::UINT);
    let CsExpr::Invocation { callee, args } = init else {
        panic!("expected helper call");
    };
    assert_eq!(**callee, opcodes_callee("Pack32BE"));
    assert_eq!(args.len(), 4);
    for (i, arg) in args.iter().enumerate() {
        assert_eq!(
            *arg,
            CsExpr::cast(TypeId::BYTE, CsExpr::ident(format!("b{i}"))),
            "argument {i}"
        );
    }
}

#[test]
fn pack_spread_expands_to_indexed_access() {
    let result = run_method(
        vec![IlParam::new("data")],
        vec![IlNode::VarDecl {
            name: "w".to_string(),
            init: Some(Box::new(IlNode::PackBytes {
                bits: 16,
                big_endian: false,
                bytes: vec![IlNode::Spread {
                    argument: Box::new(IlNode::ident("data")),
                }],
            })),
            mutable: false,
        }],
    );
    let method = first_method(&result);
    let (init, ty) = decl_init(method);
    assert_eq!(ty, TypeId::USHORT);
    let CsExpr::Invocation { callee, args } = init else {
        panic!("expected helper call");
    };
    assert_eq!(**callee, opcodes_callee("Pack16LE"));
    assert_eq!(args.len(), 2);
    assert_eq!(
        args[0],
        CsExpr::cast(
            TypeId::BYTE,
            CsExpr::index(CsExpr::ident("data"), CsExpr::int(0))
        )
    );
}

#[test]
fn unpack32be_emits_shift_mask_literal() {
    let result = run_method(
        vec![IlParam::new("w0")],
        vec![IlNode::VarDecl {
            name: "b".to_string(),
            init: Some(Box::new(IlNode::UnpackBytes {
                bits: 32,
                big_endian: true,
                value: Box::new(IlNode::ident("w0")),
            })),
            mutable: false,
        }],
    );
    let method = first_method(&result);
    let (init, ty) = decl_init(method);
    assert_eq!(ty, TypeId::BYTE_ARRAY);
    let CsExpr::ArrayCreation {
        elem,
        init: Some(items),
        ..
    } = init
    else {
        panic!("expected a byte-array literal, got {init:?}");
    };
    assert_eq!(*elem, TypeId::BYTE);
    assert_eq!(items.len(), 4);
    // Big endian: the first element extracts the top byte.
    let CsExpr::Cast { ty: cast_ty, expr } = &items[0] else {
        panic!("expected byte cast");
    };
    assert_eq!(*cast_ty, TypeId::BYTE);
    let CsExpr::Binary { op, left, .. } = &**expr else {
        panic!("expected mask expression");
    };
    assert_eq!(*op, CsBinaryOp::BitAnd);
    let CsExpr::Binary { op: shift_op, .. } = &**left else {
        panic!("expected shift under the mask");
    };
    assert_eq!(*shift_op, CsBinaryOp::Shr);
    // Little-endian position 0 has no shift at all.
    let le = run_method(
        vec![IlParam::new("w0")],
        vec![IlNode::VarDecl {
            name: "b".to_string(),
            init: Some(Box::new(IlNode::UnpackBytes {
                bits: 32,
                big_endian: false,
                value: Box::new(IlNode::ident("w0")),
            })),
            mutable: false,
        }],
    );
    let le_method = first_method(&le);
    let (le_init, _) = decl_init(le_method);
    let CsExpr::ArrayCreation {
        init: Some(le_items),
        ..
    } = le_init
    else {
        panic!("expected literal");
    };
    let CsExpr::Cast { expr, .. } = &le_items[0] else {
        panic!("expected cast");
    };
    let CsExpr::Binary { left, .. } = &**expr else {
        panic!("expected mask");
    };
    assert_eq!(**left, CsExpr::ident("w0"));
}

//! Jagged-array detection: `v[i] = new Array(n)` and `v[i][j]` evidence
//! upgrade one-dimensional storage to `T[][]`.

use ilcs_csharp::ast::{CsExpr, CsMember, CsMethod, CsStmt};
use ilcs_csharp::types::TypeId;
use ilcs_il::{IlMemberProperty, IlNode, IlParam};
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

fn index(object: IlNode, idx: IlNode) -> IlNode {
    IlNode::Member {
        object: Box::new(object),
        property: IlMemberProperty::Computed(Box::new(idx)),
    }
}

#[test]
fn element_creation_upgrades_to_jagged() {
    // var m = new Array(4); m[i] = new Array(4); m[i][j];
    let result = run_method(
        vec![IlParam::new("i"), IlParam::new("j")],
        vec![
            IlNode::VarDecl {
                name: "m".to_string(),
                init: Some(Box::new(IlNode::ArrayCreation {
                    length: Some(Box::new(IlNode::int(4))),
                })),
                mutable: true,
            },
            IlNode::stmt(IlNode::assign(
                index(IlNode::ident("m"), IlNode::ident("i")),
                IlNode::ArrayCreation {
                    length: Some(Box::new(IlNode::int(4))),
                },
            )),
            IlNode::stmt(index(
                index(IlNode::ident("m"), IlNode::ident("i")),
                IlNode::ident("j"),
            )),
        ],
    );
    let method = first_method(&result);
    let CsStmt::LocalDecl { ty, init, .. } = &method.body[0] else {
        panic!("expected declaration, got {:?}", method.body[0]);
    };
    // uint is the crypto default element; storage is uint[][].
    assert_eq!(*ty, result.interner.jagged_of(TypeId::UINT));
    let CsExpr::ArrayCreation {
        jagged_inner: true, ..
    } = init.as_ref().unwrap()
    else {
        panic!("expected jagged creation, got {init:?}");
    };
}

#[test]
fn inner_assignment_gets_inner_creation() {
    let result = run_method(
        vec![IlParam::new("i")],
        vec![
            IlNode::VarDecl {
                name: "m".to_string(),
                init: Some(Box::new(IlNode::ArrayCreation {
                    length: Some(Box::new(IlNode::int(2))),
                })),
                mutable: true,
            },
            IlNode::stmt(IlNode::assign(
                index(IlNode::ident("m"), IlNode::ident("i")),
                IlNode::ArrayCreation {
                    length: Some(Box::new(IlNode::int(8))),
                },
            )),
        ],
    );
    let method = first_method(&result);
    // m[i] = new uint[8]
    let CsStmt::Expr(CsExpr::Assignment { target, value, .. }) = &method.body[1] else {
        panic!("expected element assignment, got {:?}", method.body[1]);
    };
    let CsExpr::Index { .. } = &**target else {
        panic!("expected index target");
    };
    let CsExpr::ArrayCreation {
        elem,
        jagged_inner: false,
        ..
    } = &**value
    else {
        panic!("expected inner creation, got {value:?}");
    };
    assert_eq!(*elem, TypeId::UINT);
}

#[test]
fn two_level_read_alone_is_enough_evidence() {
    let result = run_method(
        vec![IlParam::new("i"), IlParam::new("j")],
        vec![
            IlNode::VarDecl {
                name: "grid".to_string(),
                init: Some(Box::new(IlNode::ArrayCreation {
                    length: Some(Box::new(IlNode::int(4))),
                })),
                mutable: true,
            },
            IlNode::VarDecl {
                name: "v".to_string(),
                init: Some(Box::new(index(
                    index(IlNode::ident("grid"), IlNode::ident("i")),
                    IlNode::ident("j"),
                ))),
                mutable: false,
            },
        ],
    );
    let method = first_method(&result);
    let CsStmt::LocalDecl { ty, .. } = &method.body[0] else {
        panic!("expected declaration");
    };
    assert_eq!(*ty, result.interner.jagged_of(TypeId::UINT));
    // The element read types as uint.
    let CsStmt::LocalDecl { ty: v_ty, .. } = &method.body[1] else {
        panic!("expected declaration");
    };
    assert_eq!(*v_ty, TypeId::UINT);
}

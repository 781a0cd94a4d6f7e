//! Type-directed truthiness rewrites in every conditional position.

use ilcs_csharp::ast::{CsBinaryOp, CsExpr, CsMember, CsMethod, CsStmt};
use ilcs_il::{IlNode, IlParam, UnaryOp};
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

fn typed_param(name: &str, hint: &str) -> IlParam {
    IlParam {
        name: name.to_string(),
        default: None,
        type_hint: Some(hint.to_string()),
    }
}

fn if_cond(stmt: &CsStmt) -> &CsExpr {
    let CsStmt::If { cond, .. } = stmt else {
        panic!("expected if, got {stmt:?}");
    };
    cond
}

#[test]
fn numeric_condition_compares_to_zero() {
    let result = run_method(
        vec![typed_param("n", "number")],
        vec![IlNode::If {
            cond: Box::new(IlNode::ident("n")),
            then_branch: Box::new(IlNode::block(vec![])),
            else_branch: None,
        }],
    );
    let method = first_method(&result);
    assert_eq!(
        if_cond(&method.body[0]),
        &CsExpr::binary(CsBinaryOp::Ne, CsExpr::ident("n"), CsExpr::int(0))
    );
}

#[test]
fn reference_condition_compares_to_null() {
    let result = run_method(
        vec![typed_param("s", "string")],
        vec![IlNode::If {
            cond: Box::new(IlNode::ident("s")),
            then_branch: Box::new(IlNode::block(vec![])),
            else_branch: None,
        }],
    );
    let method = first_method(&result);
    assert_eq!(
        if_cond(&method.body[0]),
        &CsExpr::binary(CsBinaryOp::Ne, CsExpr::ident("s"), CsExpr::null())
    );
}

#[test]
fn bool_condition_is_untouched() {
    let result = run_method(
        vec![typed_param("isInverse", "boolean")],
        vec![IlNode::If {
            cond: Box::new(IlNode::ident("isInverse")),
            then_branch: Box::new(IlNode::block(vec![])),
            else_branch: None,
        }],
    );
    let method = first_method(&result);
    assert_eq!(if_cond(&method.body[0]), &CsExpr::ident("isInverse"));
}

#[test]
fn negated_array_compares_equal_to_null() {
    // while (!data) with data : byte[]
    let result = run_method(
        vec![typed_param("data", "Uint8Array")],
        vec![IlNode::While {
            cond: Box::new(IlNode::Unary {
                op: UnaryOp::Not,
                operand: Box::new(IlNode::ident("data")),
            }),
            body: Box::new(IlNode::block(vec![])),
        }],
    );
    let method = first_method(&result);
    let CsStmt::While { cond, .. } = &method.body[0] else {
        panic!("expected while");
    };
    assert_eq!(
        cond,
        &CsExpr::binary(CsBinaryOp::Eq, CsExpr::ident("data"), CsExpr::null())
    );
}

#[test]
fn logical_condition_rewrites_both_sides() {
    // if (n && s) => if (n != 0 && s != null)
    let result = run_method(
        vec![typed_param("n", "number"), typed_param("s", "string")],
        vec![IlNode::If {
            cond: Box::new(IlNode::Logical {
                op: ilcs_il::LogicalOp::And,
                left: Box::new(IlNode::ident("n")),
                right: Box::new(IlNode::ident("s")),
            }),
            then_branch: Box::new(IlNode::block(vec![])),
            else_branch: None,
        }],
    );
    let method = first_method(&result);
    let expected = CsExpr::binary(
        CsBinaryOp::And,
        CsExpr::binary(CsBinaryOp::Ne, CsExpr::ident("n"), CsExpr::int(0)),
        CsExpr::binary(CsBinaryOp::Ne, CsExpr::ident("s"), CsExpr::null()),
    );
    assert_eq!(if_cond(&method.body[0]), &expected);
}

#[test]
fn constant_ternary_folds_to_branch() {
    let result = run_method(
        vec![],
        vec![IlNode::VarDecl {
            name: "x".to_string(),
            init: Some(Box::new(IlNode::Conditional {
                cond: Box::new(IlNode::bool(true)),
                then_branch: Box::new(IlNode::int(1)),
                else_branch: Box::new(IlNode::int(2)),
            })),
            mutable: false,
        }],
    );
    let method = first_method(&result);
    let CsStmt::LocalDecl { init, .. } = &method.body[0] else {
        panic!("expected declaration");
    };
    assert_eq!(init.as_ref().unwrap(), &CsExpr::int(1));
}

#[test]
fn do_while_condition_is_rewritten_too() {
    let result = run_method(
        vec![typed_param("count", "number")],
        vec![IlNode::DoWhile {
            body: Box::new(IlNode::block(vec![])),
            cond: Box::new(IlNode::ident("count")),
        }],
    );
    let method = first_method(&result);
    let CsStmt::DoWhile { cond, .. } = &method.body[0] else {
        panic!("expected do-while");
    };
    assert_eq!(
        cond,
        &CsExpr::binary(CsBinaryOp::Ne, CsExpr::ident("count"), CsExpr::int(0))
    );
}

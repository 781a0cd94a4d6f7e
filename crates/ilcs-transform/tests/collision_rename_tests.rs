//! Collision handling: property/method PascalCase collisions become
//! private backing fields, and CS0136-style local redeclaration gets
//! numeric suffixes.

use ilcs_common::DiagnosticKind;
use ilcs_csharp::ast::{CsExpr, CsMember, CsMethod, CsStmt, CsVisibility};
use ilcs_il::{BinaryOp, IlNode, IlParam, UpdateOp};
use ilcs_transform::{Transpiled, transpile};

fn first_method<'a>(result: &'a Transpiled, name: &str) -> &'a CsMethod {
    result.unit.types[0]
        .members
        .iter()
        .find_map(|m| match m {
            CsMember::Method(method) if method.name == name => Some(method),
            _ => None,
        })
        .expect("method emitted")
}

#[test]
fn field_colliding_with_method_gets_backing_field() {
    // class has `this.result = ...` in the constructor and a method
    // `result()`: the field becomes private `_result`, reads follow.
    let program = IlNode::Program {
        body: vec![IlNode::Class {
            name: "Digest".to_string(),
            parent: None,
            members: vec![
                IlNode::Constructor {
                    params: vec![IlParam {
                        name: "key".to_string(),
                        default: None,
                        type_hint: Some("Uint8Array".to_string()),
                    }],
                    body: Box::new(IlNode::block(vec![IlNode::stmt(IlNode::assign(
                        IlNode::ThisPropertyAccess {
                            property: "result".to_string(),
                        },
                        IlNode::ident("key"),
                    ))])),
                },
                IlNode::Method {
                    name: "result".to_string(),
                    params: vec![],
                    body: Box::new(IlNode::block(vec![IlNode::ret(Some(
                        IlNode::ThisPropertyAccess {
                            property: "result".to_string(),
                        },
                    ))])),
                    is_static: false,
                    return_hint: None,
                },
            ],
        }],
    };
    let result = transpile(&program, ilcs_common::TranspileOptions::default()).unwrap();

    // A private backing field `_result` is emitted instead of a property.
    let field = result.unit.types[0]
        .members
        .iter()
        .find_map(|m| match m {
            CsMember::Field(f) => Some(f),
            _ => None,
        })
        .expect("backing field emitted");
    assert_eq!(field.name, "_result");
    assert_eq!(field.visibility, CsVisibility::Private);

    // The method keeps its name and reads through the backing field.
    let method = first_method(&result, "Result");
    let CsStmt::Return(Some(expr)) = &method.body[0] else {
        panic!("expected return, got {:?}", method.body[0]);
    };
    assert_eq!(expr, &CsExpr::member(CsExpr::This, "_result"));

    assert!(
        result
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::RenamedForCollision),
        "expected a RenamedForCollision diagnostic, got {:?}",
        result.diagnostics
    );
}

#[test]
fn sibling_loop_locals_get_numeric_suffixes() {
    // for (let i...) {} twice in one body: the second i becomes i2.
    let for_loop = |body: IlNode| IlNode::For {
        init: Some(Box::new(IlNode::VarDecl {
            name: "i".to_string(),
            init: Some(Box::new(IlNode::int(0))),
            mutable: true,
        })),
        test: Some(Box::new(IlNode::binary(
            BinaryOp::Lt,
            IlNode::ident("i"),
            IlNode::int(4),
        ))),
        update: Some(Box::new(IlNode::Update {
            op: UpdateOp::Increment,
            prefix: false,
            target: Box::new(IlNode::ident("i")),
        })),
        body: Box::new(body),
    };
    let program = IlNode::Program {
        body: vec![IlNode::Class {
            name: "Cipher".to_string(),
            parent: None,
            members: vec![IlNode::Method {
                name: "run".to_string(),
                params: vec![],
                body: Box::new(IlNode::block(vec![
                    for_loop(IlNode::block(vec![])),
                    for_loop(IlNode::block(vec![])),
                ])),
                is_static: false,
                return_hint: None,
            }],
        }],
    };
    let result = transpile(&program, ilcs_common::TranspileOptions::default()).unwrap();
    let method = first_method(&result, "Run");

    let loop_decl_name = |stmt: &CsStmt| -> String {
        let CsStmt::For { init, .. } = stmt else {
            panic!("expected for loop, got {stmt:?}");
        };
        let CsStmt::LocalDecl { name, .. } = &**init.as_ref().unwrap() else {
            panic!("expected loop declaration");
        };
        name.clone()
    };
    assert_eq!(loop_decl_name(&method.body[0]), "i");
    assert_eq!(loop_decl_name(&method.body[1]), "i2");
    assert!(
        result
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::RenamedForCollision)
    );
}

#[test]
fn rename_is_stable_inside_the_loop_body() {
    // The renamed binding resolves to the same target name throughout.
    let program = IlNode::Program {
        body: vec![IlNode::Class {
            name: "Cipher".to_string(),
            parent: None,
            members: vec![IlNode::Method {
                name: "run".to_string(),
                params: vec![],
                body: Box::new(IlNode::block(vec![
                    IlNode::VarDecl {
                        name: "t".to_string(),
                        init: Some(Box::new(IlNode::int(1))),
                        mutable: true,
                    },
                    IlNode::Block {
                        body: vec![
                            IlNode::VarDecl {
                                name: "t".to_string(),
                                init: Some(Box::new(IlNode::int(2))),
                                mutable: true,
                            },
                            IlNode::stmt(IlNode::assign(IlNode::ident("t"), IlNode::int(3))),
                        ],
                    },
                ])),
                is_static: false,
                return_hint: None,
            }],
        }],
    };
    let result = transpile(&program, ilcs_common::TranspileOptions::default()).unwrap();
    let method = first_method(&result, "Run");
    let CsStmt::Block(inner) = &method.body[1] else {
        panic!("expected block, got {:?}", method.body[1]);
    };
    let CsStmt::LocalDecl { name, .. } = &inner[0] else {
        panic!("expected declaration");
    };
    assert_eq!(name, "t2");
    let CsStmt::Expr(CsExpr::Assignment { target, .. }) = &inner[1] else {
        panic!("expected assignment");
    };
    assert_eq!(**target, CsExpr::ident("t2"));
}

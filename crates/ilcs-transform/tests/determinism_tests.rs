//! Run-to-run determinism: the same IL and options produce an identical
//! target AST and diagnostic list.

use ilcs_il::{BinaryOp, IlNode, IlObjectProperty, IlParam};
use ilcs_transform::transpile;

fn sample_program() -> IlNode {
    // A small cipher exercising fields, overrides, literals, loops and
    // crypto primitives in one unit.
    IlNode::Program {
        body: vec![IlNode::Class {
            name: "Mix".to_string(),
            parent: Some("BlockCipher".to_string()),
            members: vec![
                IlNode::Constructor {
                    params: vec![IlParam {
                        name: "key".to_string(),
                        default: None,
                        type_hint: Some("Uint8Array".to_string()),
                    }],
                    body: Box::new(IlNode::block(vec![
                        IlNode::stmt(IlNode::ParentConstructorCall { args: vec![] }),
                        IlNode::stmt(IlNode::assign(
                            IlNode::ThisPropertyAccess {
                                property: "roundKeys".to_string(),
                            },
                            IlNode::ident("key"),
                        )),
                        IlNode::stmt(IlNode::assign(
                            IlNode::ThisPropertyAccess {
                                property: "tests".to_string(),
                            },
                            IlNode::ArrayLiteral {
                                elements: vec![IlNode::ObjectLiteral {
                                    properties: vec![IlObjectProperty {
                                        key: "text".to_string(),
                                        value: IlNode::str("smoke"),
                                    }],
                                }],
                            },
                        )),
                    ])),
                },
                IlNode::Method {
                    name: "round".to_string(),
                    params: vec![IlParam::new("v"), IlParam::new("i")],
                    body: Box::new(IlNode::block(vec![
                        IlNode::VarDecl {
                            name: "t".to_string(),
                            init: Some(Box::new(IlNode::RotateLeft {
                                bits: 32,
                                value: Box::new(IlNode::ident("v")),
                                amount: Box::new(IlNode::int(7)),
                            })),
                            mutable: true,
                        },
                        IlNode::ret(Some(IlNode::binary(
                            BinaryOp::BitXor,
                            IlNode::ident("t"),
                            IlNode::binary(BinaryOp::UShr, IlNode::ident("v"), IlNode::int(0)),
                        ))),
                    ])),
                    is_static: false,
                    return_hint: None,
                },
            ],
        }],
    }
}

#[test]
fn two_runs_are_byte_identical() {
    let program = sample_program();
    let first = transpile(&program, ilcs_common::TranspileOptions::default()).unwrap();
    let second = transpile(&program, ilcs_common::TranspileOptions::default()).unwrap();
    assert_eq!(first.unit, second.unit);
    assert_eq!(first.diagnostics, second.diagnostics);
}

#[test]
fn namespace_and_usings_are_stable() {
    let program = sample_program();
    let result = transpile(&program, ilcs_common::TranspileOptions::default()).unwrap();
    assert_eq!(result.unit.namespace.as_deref(), Some("Generated"));
    assert_eq!(
        result.unit.usings,
        vec!["System", "System.Collections.Generic", "System.Linq"]
    );
}

#[test]
fn options_round_trip_through_serde() {
    let options = ilcs_common::TranspileOptions {
        namespace: "Ciphers".to_string(),
        class_name: "Registry".to_string(),
        framework_types: None,
        opcodes_types: None,
        debug_index_of: true,
    };
    let json = serde_json::to_string(&options).unwrap();
    let back: ilcs_common::TranspileOptions = serde_json::from_str(&json).unwrap();
    assert_eq!(back.namespace, "Ciphers");
    assert_eq!(back.class_name, "Registry");
    assert!(back.debug_index_of);
}

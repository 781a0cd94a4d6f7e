//! Signature pre-registration, override inheritance and refinement.

use ilcs_csharp::ast::{CsExpr, CsMember, CsMethod};
use ilcs_csharp::types::TypeId;
use ilcs_il::{IlNode, IlParam};
use ilcs_transform::{Transpiled, transpile};

fn method_named<'a>(result: &'a Transpiled, name: &str) -> &'a CsMethod {
    result.unit.types[0]
        .members
        .iter()
        .find_map(|m| match m {
            CsMember::Method(method) if method.name == name => Some(method),
            _ => None,
        })
        .unwrap_or_else(|| panic!("method {name} emitted"))
}

#[test]
fn framework_override_takes_inherited_signature_exactly() {
    // createInstance on a BlockCipher subclass: the KB signature wins,
    // bit for bit, including the default value, and the method cannot be
    // static.
    let program = IlNode::Program {
        body: vec![IlNode::Class {
            name: "Anubis".to_string(),
            parent: Some("BlockCipher".to_string()),
            members: vec![IlNode::Method {
                name: "createInstance".to_string(),
                params: vec![IlParam::new("isInverse")],
                body: Box::new(IlNode::block(vec![IlNode::ret(Some(IlNode::Literal {
                    value: ilcs_il::IlValue::Null,
                }))])),
                is_static: true, // the IL lies; overrides are instance
                return_hint: None,
            }],
        }],
    };
    let result = transpile(&program, ilcs_common::TranspileOptions::default()).unwrap();
    let method = method_named(&result, "CreateInstance");
    assert!(method.is_override);
    assert!(!method.is_static);
    assert_eq!(method.params.len(), 1);
    assert_eq!(method.params[0].name, "isInverse");
    assert_eq!(method.params[0].ty, TypeId::BOOL);
    assert_eq!(
        method.params[0].default,
        Some(CsExpr::Raw("false".to_string()))
    );
    assert_eq!(
        result.interner.display(method.return_type),
        "AlgorithmInstance"
    );
}

#[test]
fn forward_method_calls_resolve_through_refinement() {
    // makeKey calls expand, defined later with a byte[] hint. The cheap
    // pre-registration scan cannot see it; the refinement pass can.
    let program = IlNode::Program {
        body: vec![IlNode::Class {
            name: "Kdf".to_string(),
            parent: None,
            members: vec![
                IlNode::Method {
                    name: "makeKey".to_string(),
                    params: vec![],
                    body: Box::new(IlNode::block(vec![IlNode::ret(Some(
                        IlNode::ThisMethodCall {
                            method: "expand".to_string(),
                            args: vec![],
                        },
                    ))])),
                    is_static: false,
                    return_hint: None,
                },
                IlNode::Method {
                    name: "expand".to_string(),
                    params: vec![],
                    body: Box::new(IlNode::block(vec![IlNode::ret(Some(
                        IlNode::ArrayLiteral { elements: vec![] },
                    ))])),
                    is_static: false,
                    return_hint: Some("Uint8Array".to_string()),
                },
            ],
        }],
    };
    let result = transpile(&program, ilcs_common::TranspileOptions::default()).unwrap();
    let make_key = method_named(&result, "MakeKey");
    assert_eq!(make_key.return_type, TypeId::BYTE_ARRAY);
}

#[test]
fn constructor_parameter_takes_inherited_property_type() {
    // A constructor parameter named like an inherited property types as
    // that property.
    let program = IlNode::Program {
        body: vec![IlNode::Class {
            name: "Anubis".to_string(),
            parent: Some("BlockCipher".to_string()),
            members: vec![IlNode::Constructor {
                params: vec![IlParam::new("blockSize")],
                body: Box::new(IlNode::block(vec![])),
            }],
        }],
    };
    let result = transpile(&program, ilcs_common::TranspileOptions::default()).unwrap();
    let ctor = result.unit.types[0]
        .members
        .iter()
        .find_map(|m| match m {
            CsMember::Constructor(c) => Some(c),
            _ => None,
        })
        .expect("constructor emitted");
    assert_eq!(ctor.params[0].ty, TypeId::INT);
}

#[test]
fn is_inverse_with_no_hint_is_bool() {
    // The boolean name prefix beats the uint crypto default.
    let program = IlNode::Program {
        body: vec![IlNode::Class {
            name: "Cipher".to_string(),
            parent: None,
            members: vec![IlNode::Constructor {
                params: vec![IlParam::new("isInverse")],
                body: Box::new(IlNode::block(vec![])),
            }],
        }],
    };
    let result = transpile(&program, ilcs_common::TranspileOptions::default()).unwrap();
    let ctor = result.unit.types[0]
        .members
        .iter()
        .find_map(|m| match m {
            CsMember::Constructor(c) => Some(c),
            _ => None,
        })
        .expect("constructor emitted");
    assert_eq!(ctor.params[0].ty, TypeId::BOOL);
}

#[test]
fn super_call_becomes_base_initializer() {
    let program = IlNode::Program {
        body: vec![IlNode::Class {
            name: "Anubis".to_string(),
            parent: Some("BlockCipher".to_string()),
            members: vec![IlNode::Constructor {
                params: vec![],
                body: Box::new(IlNode::block(vec![IlNode::stmt(
                    IlNode::ParentConstructorCall { args: vec![] },
                )])),
            }],
        }],
    };
    let result = transpile(&program, ilcs_common::TranspileOptions::default()).unwrap();
    let ctor = result.unit.types[0]
        .members
        .iter()
        .find_map(|m| match m {
            CsMember::Constructor(c) => Some(c),
            _ => None,
        })
        .expect("constructor emitted");
    assert_eq!(ctor.base_args, Some(vec![]));
    assert!(ctor.body.is_empty());
}

//! String, hex and interpolation rewrites.

use ilcs_common::Fatal;
use ilcs_csharp::ast::{CsExpr, CsInterpPart, CsLambdaBody, CsLiteral};
use ilcs_csharp::types::TypeId;
use ilcs_il::{IlNode, IlValue, TemplatePart};

use super::Transformer;

impl<'a> Transformer<'a> {
    pub(crate) fn transform_string_op(&mut self, node: &IlNode) -> Result<(CsExpr, TypeId), Fatal> {
        match node {
            IlNode::HexEncode { bytes } => {
                let (b, _) = self.transform_expr(bytes)?;
                Ok((CsExpr::opcodes_call("BytesToHex", vec![b]), TypeId::STRING))
            }
            IlNode::HexDecode { text } => {
                let (t, _) = self.transform_expr(text)?;
                Ok((
                    CsExpr::opcodes_call("HexToBytes", vec![t]),
                    TypeId::BYTE_ARRAY,
                ))
            }
            IlNode::StringToBytes { text } => {
                let (t, _) = self.transform_expr(text)?;
                Ok((
                    CsExpr::opcodes_call("AnsiToBytes", vec![t]),
                    TypeId::BYTE_ARRAY,
                ))
            }
            IlNode::BytesToString { bytes } => {
                let (b, _) = self.transform_expr(bytes)?;
                Ok((CsExpr::opcodes_call("BytesToAnsi", vec![b]), TypeId::STRING))
            }

            IlNode::StringCharCodeAt { string, index } => {
                let (s, s_ty) = self.transform_expr(string)?;
                // Indexing an already-char value is a no-op: just cast.
                if s_ty == TypeId::CHAR {
                    return Ok((CsExpr::cast(TypeId::INT, s), TypeId::INT));
                }
                let (i, i_ty) = self.transform_expr(index)?;
                let i = self.coerce_assign(i, i_ty, TypeId::INT);
                Ok((
                    CsExpr::cast(TypeId::INT, CsExpr::index(s, i)),
                    TypeId::INT,
                ))
            }
            IlNode::StringCharAt { string, index } => {
                let (s, _) = self.transform_expr(string)?;
                let (i, i_ty) = self.transform_expr(index)?;
                let i = self.coerce_assign(i, i_ty, TypeId::INT);
                Ok((CsExpr::index(s, i), TypeId::CHAR))
            }
            IlNode::StringSubstring { string, start, end } => {
                let (s, _) = self.transform_expr(string)?;
                let (start_expr, start_ty) = self.transform_expr(start)?;
                let start_expr = self.coerce_assign(start_expr, start_ty, TypeId::INT);
                match end {
                    // JS substring(start, end) is C# Substring(start, length).
                    Some(end_node) => {
                        let (end_expr, end_ty) = self.transform_expr(end_node)?;
                        let end_expr = self.coerce_assign(end_expr, end_ty, TypeId::INT);
                        let length = CsExpr::binary(
                            ilcs_csharp::ast::CsBinaryOp::Sub,
                            end_expr,
                            start_expr.clone(),
                        );
                        Ok((
                            CsExpr::call(s, "Substring", vec![start_expr, length]),
                            TypeId::STRING,
                        ))
                    }
                    None => Ok((
                        CsExpr::call(s, "Substring", vec![start_expr]),
                        TypeId::STRING,
                    )),
                }
            }
            IlNode::StringReplace {
                string,
                pattern,
                replacement,
                ..
            } => {
                let (s, _) = self.transform_expr(string)?;
                let (p, _) = self.transform_expr(pattern)?;
                let (r, _) = self.transform_expr(replacement)?;
                Ok((CsExpr::call(s, "Replace", vec![p, r]), TypeId::STRING))
            }
            IlNode::StringSplit { string, separator } => {
                let (s, _) = self.transform_expr(string)?;
                let (sep, _) = self.transform_expr(separator)?;
                Ok((CsExpr::call(s, "Split", vec![sep]), TypeId::STRING_ARRAY))
            }
            IlNode::StringIndexOf { string, search } => {
                let (s, _) = self.transform_expr(string)?;
                let (v, _) = self.transform_expr(search)?;
                Ok((CsExpr::call(s, "IndexOf", vec![v]), TypeId::INT))
            }
            IlNode::StringIncludes { string, search } => {
                let (s, _) = self.transform_expr(string)?;
                let (v, _) = self.transform_expr(search)?;
                Ok((CsExpr::call(s, "Contains", vec![v]), TypeId::BOOL))
            }
            IlNode::StringStartsWith { string, search } => {
                let (s, _) = self.transform_expr(string)?;
                let (v, _) = self.transform_expr(search)?;
                Ok((CsExpr::call(s, "StartsWith", vec![v]), TypeId::BOOL))
            }
            IlNode::StringToUpperCase { string } => {
                let (s, _) = self.transform_expr(string)?;
                Ok((CsExpr::call(s, "ToUpper", vec![]), TypeId::STRING))
            }
            IlNode::StringToLowerCase { string } => {
                let (s, _) = self.transform_expr(string)?;
                Ok((CsExpr::call(s, "ToLower", vec![]), TypeId::STRING))
            }
            IlNode::StringTrim { string } => {
                let (s, _) = self.transform_expr(string)?;
                Ok((CsExpr::call(s, "Trim", vec![]), TypeId::STRING))
            }
            IlNode::StringRepeat { string, count } => {
                let (s, _) = self.transform_expr(string)?;
                let (n, n_ty) = self.transform_expr(count)?;
                let n = self.coerce_assign(n, n_ty, TypeId::INT);
                Ok((
                    CsExpr::call(
                        CsExpr::ident("string"),
                        "Concat",
                        vec![CsExpr::call(
                            CsExpr::ident("Enumerable"),
                            "Repeat",
                            vec![s, n],
                        )],
                    ),
                    TypeId::STRING,
                ))
            }
            IlNode::StringPadStart {
                string,
                length,
                pad,
            } => {
                let (s, _) = self.transform_expr(string)?;
                let (n, n_ty) = self.transform_expr(length)?;
                let n = self.coerce_assign(n, n_ty, TypeId::INT);
                let mut args = vec![n];
                if let Some(pad_node) = pad {
                    args.push(self.pad_char(pad_node)?);
                }
                Ok((CsExpr::call(s, "PadStart", args), TypeId::STRING))
            }

            IlNode::StringFromCharCodes { args } => self.transform_from_char_codes(args),

            other => Err(self
                .ctx
                .fatal_malformed(other.kind_name(), "not a string operation")),
        }
    }

    /// The pad argument of padStart: a single-char literal becomes a char
    /// literal; anything else takes its first character.
    fn pad_char(&mut self, node: &IlNode) -> Result<CsExpr, Fatal> {
        if let IlNode::Literal {
            value: IlValue::Str(s),
        } = node
        {
            if let Some(c) = s.chars().next() {
                return Ok(CsExpr::Literal {
                    value: CsLiteral::Char(c),
                    ty: TypeId::CHAR,
                });
            }
        }
        let (expr, ty) = self.transform_expr(node)?;
        if ty == TypeId::CHAR {
            return Ok(expr);
        }
        Ok(CsExpr::index(expr, CsExpr::int(0)))
    }

    /// `String.fromCharCode(a, b)` / `String.fromCharCode(...codes)`.
    fn transform_from_char_codes(
        &mut self,
        args: &[IlNode],
    ) -> Result<(CsExpr, TypeId), Fatal> {
        if let [IlNode::Spread { argument }] = args {
            let (codes, _) = self.transform_expr(argument)?;
            let lambda = CsExpr::Lambda {
                params: vec!["c".to_string()],
                body: Box::new(CsLambdaBody::Expr(CsExpr::cast(
                    TypeId::CHAR,
                    CsExpr::ident("c"),
                ))),
            };
            let chars = CsExpr::call(
                CsExpr::call(codes, "Select", vec![lambda]),
                "ToArray",
                vec![],
            );
            return Ok((
                CsExpr::ObjectCreation {
                    ty: self.ctx.interner.generic("string", Vec::new()),
                    args: vec![chars],
                },
                TypeId::STRING,
            ));
        }
        let mut chars = Vec::with_capacity(args.len());
        for arg in args {
            let (expr, ty) = self.transform_expr(arg)?;
            chars.push(self.coerce_assign(expr, ty, TypeId::CHAR));
        }
        Ok((
            CsExpr::ObjectCreation {
                ty: self.ctx.interner.generic("string", Vec::new()),
                args: vec![CsExpr::ArrayCreation {
                    elem: TypeId::CHAR,
                    size: None,
                    init: Some(chars),
                    jagged_inner: false,
                }],
            },
            TypeId::STRING,
        ))
    }

    pub(crate) fn transform_interpolation(
        &mut self,
        parts: &[TemplatePart],
    ) -> Result<(CsExpr, TypeId), Fatal> {
        let mut out = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                TemplatePart::Text(text) => out.push(CsInterpPart::Text(text.clone())),
                TemplatePart::Expr(expr) => {
                    let (cs_expr, _) = self.transform_expr(expr)?;
                    out.push(CsInterpPart::Expr(cs_expr));
                }
            }
        }
        Ok((CsExpr::Interpolated(out), TypeId::STRING))
    }
}

// src/shader_graph/typecheck.rs

use std::collections::HashMap;

use super::node::{BinaryOp, Expr, Node, TernaryOp, UnaryOp, ValueType};
use crate::error::ShaderGraphError;

/// Scalars broadcast against vectors; two different vector widths never unify.
pub fn unify(
    op: &'static str,
    left: ValueType,
    right: ValueType,
) -> Result<ValueType, ShaderGraphError> {
    match (left, right) {
        (l, r) if l == r => Ok(l),
        (ValueType::Float, r) => Ok(r),
        (l, ValueType::Float) => Ok(l),
        (l, r) => Err(ShaderGraphError::TypeMismatch { op, left: l, right: r }),
    }
}

pub fn binary_op_name(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "add",
        BinaryOp::Sub => "sub",
        BinaryOp::Mul => "mul",
        BinaryOp::Div => "div",
        BinaryOp::Pow => "pow",
        BinaryOp::Step => "step",
        BinaryOp::Min => "min",
        BinaryOp::Max => "max",
        BinaryOp::Distance => "distance",
    }
}

/// Infers result types for every node in a graph, memoized by node identity.
/// Checked nodes are held by the cache, so an address is never reused for a
/// different node while the checker lives.
#[derive(Default)]
pub struct TypeChecker {
    types: HashMap<usize, (Expr, ValueType)>,
}

impl TypeChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn type_of(&mut self, expr: &Expr) -> Result<ValueType, ShaderGraphError> {
        if let Some((_, ty)) = self.types.get(&expr.key()) {
            return Ok(*ty);
        }
        let ty = self.infer(expr)?;
        self.types.insert(expr.key(), (expr.clone(), ty));
        Ok(ty)
    }

    fn infer(&mut self, expr: &Expr) -> Result<ValueType, ShaderGraphError> {
        match expr.node() {
            Node::Constant { ty, .. } => Ok(*ty),
            Node::Uniform(_) => Ok(ValueType::Float),
            Node::Input(input) => Ok(input.value_type()),
            Node::Unary(UnaryOp::Length, _) => Ok(ValueType::Float),
            Node::Unary(_, a) => self.type_of(a),
            Node::Binary(op, a, b) => {
                let ty = unify(binary_op_name(*op), self.type_of(a)?, self.type_of(b)?)?;
                Ok(if *op == BinaryOp::Distance { ValueType::Float } else { ty })
            }
            Node::Ternary(TernaryOp::Mix, a, b, t) => {
                let ty = unify("mix", self.type_of(a)?, self.type_of(b)?)?;
                let t_ty = self.type_of(t)?;
                if t_ty != ValueType::Float && t_ty != ty {
                    return Err(ShaderGraphError::TypeMismatch { op: "mix", left: ty, right: t_ty });
                }
                Ok(ty)
            }
            Node::Ternary(TernaryOp::Smoothstep, e0, e1, x) => {
                let edges = unify("smoothstep", self.type_of(e0)?, self.type_of(e1)?)?;
                unify("smoothstep", edges, self.type_of(x)?)
            }
            Node::Construct(parts) => {
                let mut width = 0;
                for part in parts {
                    width += self.type_of(part)?.width();
                }
                match ValueType::from_width(width) {
                    Some(ty) if width >= 2 => Ok(ty),
                    _ => Err(ShaderGraphError::InvalidConstruct(width)),
                }
            }
            Node::Component(a, index) => {
                let ty = self.type_of(a)?;
                if *index >= ty.width() {
                    return Err(ShaderGraphError::ComponentOutOfRange { index: *index, ty });
                }
                Ok(ValueType::Float)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader_graph::node::*;

    #[test]
    fn scalars_broadcast_over_vectors() {
        let mut tc = TypeChecker::new();
        assert_eq!(tc.type_of(&(position_local() * 2.0)).unwrap(), ValueType::Vec3);
        assert_eq!(tc.type_of(&(1.0 - screen_uv())).unwrap(), ValueType::Vec2);
        assert_eq!(tc.type_of(&distance(uv(), vec2(0.5, 0.5))).unwrap(), ValueType::Float);
    }

    #[test]
    fn mismatched_vectors_are_rejected() {
        let mut tc = TypeChecker::new();
        let err = tc.type_of(&(position_local() + uv())).unwrap_err();
        assert!(matches!(err, ShaderGraphError::TypeMismatch { op: "add", .. }));
    }

    #[test]
    fn construct_flattens_components() {
        let mut tc = TypeChecker::new();
        let e = construct(vec![uv(), time(), float(1.0)]);
        assert_eq!(tc.type_of(&e).unwrap(), ValueType::Vec4);
        let too_wide = vec3(position_local(), 1.0, 1.0);
        assert!(matches!(tc.type_of(&too_wide), Err(ShaderGraphError::InvalidConstruct(5))));
    }

    #[test]
    fn component_index_is_bounds_checked() {
        let mut tc = TypeChecker::new();
        assert!(tc.type_of(&uv().y()).is_ok());
        assert!(matches!(
            tc.type_of(&uv().z()),
            Err(ShaderGraphError::ComponentOutOfRange { index: 2, ty: ValueType::Vec2 })
        ));
    }

    #[test]
    fn checker_is_reusable_across_dropped_graphs() {
        let mut tc = TypeChecker::new();
        for _ in 0..64 {
            assert_eq!(tc.type_of(&(position_local() * 2.0)).unwrap(), ValueType::Vec3);
            assert_eq!(tc.type_of(&(1.0 - screen_uv())).unwrap(), ValueType::Vec2);
            assert!(tc.type_of(&position_local().z()).is_ok());
            assert!(matches!(
                tc.type_of(&uv().z()),
                Err(ShaderGraphError::ComponentOutOfRange { index: 2, .. })
            ));
        }
    }

    #[test]
    fn mix_accepts_scalar_or_matching_factor() {
        let mut tc = TypeChecker::new();
        let c = mix(color(0x000000), color(0xffffff), time());
        assert_eq!(tc.type_of(&c).unwrap(), ValueType::Vec3);
        let bad = mix(color(0x000000), color(0xffffff), uv());
        assert!(tc.type_of(&bad).is_err());
    }
}

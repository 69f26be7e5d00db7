// src/shader_graph/eval.rs
//
// CPU reference evaluation. Mirrors the WGSL emitted by `wgsl.rs` operation for
// operation, so tests and benches can reason about what the device computes.

use std::collections::HashMap;

use glam::{Vec2, Vec3};

use super::node::{BinaryOp, Expr, Input, Node, TernaryOp, UnaryOp, ValueType};
use super::typecheck::{binary_op_name, unify};
use crate::error::ShaderGraphError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Value {
    ty: ValueType,
    comps: [f32; 4],
}

impl Value {
    pub fn float(v: f32) -> Self {
        Self { ty: ValueType::Float, comps: [v, 0.0, 0.0, 0.0] }
    }

    fn from_parts(ty: ValueType, comps: [f32; 4]) -> Self {
        Self { ty, comps }
    }

    pub fn components(&self) -> &[f32] {
        &self.comps[..self.ty.width()]
    }

    pub fn as_f32(&self) -> Option<f32> {
        (self.ty == ValueType::Float).then_some(self.comps[0])
    }

    pub fn as_vec3(&self) -> Option<Vec3> {
        (self.ty == ValueType::Vec3).then(|| Vec3::new(self.comps[0], self.comps[1], self.comps[2]))
    }

    pub fn as_array4(&self) -> Option<[f32; 4]> {
        (self.ty == ValueType::Vec4).then_some(self.comps)
    }

    fn get(&self, i: usize) -> f32 {
        if self.ty == ValueType::Float {
            self.comps[0]
        } else {
            self.comps[i]
        }
    }

    fn map(self, f: impl Fn(f32) -> f32) -> Self {
        let mut comps = self.comps;
        for c in comps.iter_mut().take(self.ty.width()) {
            *c = f(*c);
        }
        Self::from_parts(self.ty, comps)
    }

    fn zip(
        op: &'static str,
        a: Value,
        b: Value,
        f: impl Fn(f32, f32) -> f32,
    ) -> Result<Self, ShaderGraphError> {
        let ty = unify(op, a.ty, b.ty)?;
        let mut comps = [0.0; 4];
        for (i, c) in comps.iter_mut().enumerate().take(ty.width()) {
            *c = f(a.get(i), b.get(i));
        }
        Ok(Self::from_parts(ty, comps))
    }

    fn length(&self) -> f32 {
        self.components().iter().map(|c| c * c).sum::<f32>().sqrt()
    }
}

/// Builtin input values for one evaluation point.
#[derive(Clone, Copy, Debug)]
pub struct EvalContext {
    pub position: Vec3,
    pub uv: Vec2,
    pub screen_uv: Vec2,
    pub time: f32,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            uv: Vec2::ZERO,
            screen_uv: Vec2::ZERO,
            time: 0.0,
        }
    }
}

impl EvalContext {
    pub fn at_position(position: Vec3, time: f32) -> Self {
        Self { position, time, ..Default::default() }
    }

    pub fn at_screen_uv(screen_uv: Vec2, time: f32) -> Self {
        Self { screen_uv, time, ..Default::default() }
    }
}

pub fn smoothstep_f32(e0: f32, e1: f32, x: f32) -> f32 {
    let t = ((x - e0) / (e1 - e0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

pub fn step_f32(edge: f32, x: f32) -> f32 {
    if x >= edge {
        1.0
    } else {
        0.0
    }
}

/// Evaluates `expr` at one point. Uniforms are read at call time.
pub fn evaluate(expr: &Expr, ctx: &EvalContext) -> Result<Value, ShaderGraphError> {
    Evaluator { ctx, cache: HashMap::new() }.eval(expr)
}

// Keyed by node address. Valid only for one `evaluate` call, while the root keeps
// every cached node alive.
struct Evaluator<'a> {
    ctx: &'a EvalContext,
    cache: HashMap<usize, Value>,
}

impl Evaluator<'_> {
    fn eval(&mut self, expr: &Expr) -> Result<Value, ShaderGraphError> {
        if let Some(v) = self.cache.get(&expr.key()) {
            return Ok(*v);
        }
        let v = self.eval_node(expr)?;
        self.cache.insert(expr.key(), v);
        Ok(v)
    }

    fn eval_node(&mut self, expr: &Expr) -> Result<Value, ShaderGraphError> {
        Ok(match expr.node() {
            Node::Constant { ty, value } => Value::from_parts(*ty, *value),
            Node::Uniform(u) => Value::float(u.get()),
            Node::Input(input) => self.input(*input),
            Node::Unary(op, a) => {
                let a = self.eval(a)?;
                match op {
                    UnaryOp::Neg => a.map(|x| -x),
                    UnaryOp::Sin => a.map(f32::sin),
                    UnaryOp::Cos => a.map(f32::cos),
                    UnaryOp::Abs => a.map(f32::abs),
                    UnaryOp::Fract => a.map(|x| x - x.floor()),
                    UnaryOp::Sqrt => a.map(f32::sqrt),
                    UnaryOp::Exp => a.map(f32::exp),
                    UnaryOp::Log => a.map(f32::ln),
                    UnaryOp::Length => Value::float(a.length()),
                }
            }
            Node::Binary(op, a, b) => {
                let (a, b) = (self.eval(a)?, self.eval(b)?);
                let name = binary_op_name(*op);
                match op {
                    BinaryOp::Add => Value::zip(name, a, b, |x, y| x + y)?,
                    BinaryOp::Sub => Value::zip(name, a, b, |x, y| x - y)?,
                    BinaryOp::Mul => Value::zip(name, a, b, |x, y| x * y)?,
                    BinaryOp::Div => Value::zip(name, a, b, |x, y| x / y)?,
                    BinaryOp::Pow => Value::zip(name, a, b, f32::powf)?,
                    BinaryOp::Step => Value::zip(name, a, b, step_f32)?,
                    BinaryOp::Min => Value::zip(name, a, b, f32::min)?,
                    BinaryOp::Max => Value::zip(name, a, b, f32::max)?,
                    BinaryOp::Distance => {
                        Value::float(Value::zip(name, a, b, |x, y| x - y)?.length())
                    }
                }
            }
            Node::Ternary(TernaryOp::Mix, a, b, t) => {
                let (a, b, t) = (self.eval(a)?, self.eval(b)?, self.eval(t)?);
                let ty = unify("mix", a.ty, b.ty)?;
                if t.ty != ValueType::Float && t.ty != ty {
                    return Err(ShaderGraphError::TypeMismatch { op: "mix", left: ty, right: t.ty });
                }
                let mut comps = [0.0; 4];
                for (i, c) in comps.iter_mut().enumerate().take(ty.width()) {
                    let k = t.get(i);
                    *c = a.get(i) * (1.0 - k) + b.get(i) * k;
                }
                Value::from_parts(ty, comps)
            }
            Node::Ternary(TernaryOp::Smoothstep, e0, e1, x) => {
                let (e0, e1, x) = (self.eval(e0)?, self.eval(e1)?, self.eval(x)?);
                let ty = unify("smoothstep", unify("smoothstep", e0.ty, e1.ty)?, x.ty)?;
                let mut comps = [0.0; 4];
                for (i, c) in comps.iter_mut().enumerate().take(ty.width()) {
                    *c = smoothstep_f32(e0.get(i), e1.get(i), x.get(i));
                }
                Value::from_parts(ty, comps)
            }
            Node::Construct(parts) => {
                let mut comps = [0.0; 4];
                let mut width = 0;
                for part in parts {
                    let v = self.eval(part)?;
                    for c in v.components() {
                        if width < 4 {
                            comps[width] = *c;
                        }
                        width += 1;
                    }
                }
                match ValueType::from_width(width) {
                    Some(ty) if width >= 2 => Value::from_parts(ty, comps),
                    _ => return Err(ShaderGraphError::InvalidConstruct(width)),
                }
            }
            Node::Component(a, index) => {
                let a = self.eval(a)?;
                if *index >= a.ty.width() {
                    return Err(ShaderGraphError::ComponentOutOfRange { index: *index, ty: a.ty });
                }
                Value::float(a.comps[*index])
            }
        })
    }

    fn input(&self, input: Input) -> Value {
        match input {
            Input::PositionLocal => {
                let p = self.ctx.position;
                Value::from_parts(ValueType::Vec3, [p.x, p.y, p.z, 0.0])
            }
            Input::Uv => {
                let uv = self.ctx.uv;
                Value::from_parts(ValueType::Vec2, [uv.x, uv.y, 0.0, 0.0])
            }
            Input::ScreenUv => {
                let s = self.ctx.screen_uv;
                Value::from_parts(ValueType::Vec2, [s.x, s.y, 0.0, 0.0])
            }
            Input::Time => Value::float(self.ctx.time),
        }
    }
}

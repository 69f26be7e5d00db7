// src/shader_graph/node.rs

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use super::uniform::Uniform;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    Float,
    Vec2,
    Vec3,
    Vec4,
}

impl ValueType {
    pub fn width(self) -> usize {
        match self {
            ValueType::Float => 1,
            ValueType::Vec2 => 2,
            ValueType::Vec3 => 3,
            ValueType::Vec4 => 4,
        }
    }

    pub fn from_width(width: usize) -> Option<Self> {
        match width {
            1 => Some(ValueType::Float),
            2 => Some(ValueType::Vec2),
            3 => Some(ValueType::Vec3),
            4 => Some(ValueType::Vec4),
            _ => None,
        }
    }

    pub fn wgsl_name(self) -> &'static str {
        match self {
            ValueType::Float => "f32",
            ValueType::Vec2 => "vec2<f32>",
            ValueType::Vec3 => "vec3<f32>",
            ValueType::Vec4 => "vec4<f32>",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wgsl_name())
    }
}

/// Values supplied by the pipeline rather than by the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Input {
    /// Undisplaced vertex position in object space.
    PositionLocal,
    /// Mesh texture coordinates.
    Uv,
    /// Fragment position divided by the output size, origin top-left. Fragment stage only.
    ScreenUv,
    /// Seconds since the session started.
    Time,
}

impl Input {
    pub fn value_type(self) -> ValueType {
        match self {
            Input::PositionLocal => ValueType::Vec3,
            Input::Uv | Input::ScreenUv => ValueType::Vec2,
            Input::Time => ValueType::Float,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Sin,
    Cos,
    Abs,
    Fract,
    Sqrt,
    Exp,
    Log,
    Length,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Step,
    Min,
    Max,
    Distance,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TernaryOp {
    Mix,
    Smoothstep,
}

pub enum Node {
    Constant { ty: ValueType, value: [f32; 4] },
    Uniform(Uniform<f32>),
    Input(Input),
    Unary(UnaryOp, Expr),
    Binary(BinaryOp, Expr, Expr),
    Ternary(TernaryOp, Expr, Expr, Expr),
    Construct(Vec<Expr>),
    Component(Expr, usize),
}

/// Immutable handle to a graph node. Cloning shares the node, so a subexpression
/// used twice is one node with two parents.
#[derive(Clone)]
pub struct Expr(Rc<Node>);

impl Expr {
    fn from_node(node: Node) -> Self {
        Expr(Rc::new(node))
    }

    pub fn node(&self) -> &Node {
        &self.0
    }

    pub(crate) fn key(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Self::from_node(Node::Unary(op, operand))
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Self::from_node(Node::Binary(op, lhs, rhs))
    }

    pub fn ternary(op: TernaryOp, a: Expr, b: Expr, c: Expr) -> Self {
        Self::from_node(Node::Ternary(op, a, b, c))
    }

    pub fn component(&self, index: usize) -> Expr {
        Self::from_node(Node::Component(self.clone(), index))
    }

    pub fn x(&self) -> Expr {
        self.component(0)
    }

    pub fn y(&self) -> Expr {
        self.component(1)
    }

    pub fn z(&self) -> Expr {
        self.component(2)
    }

    pub fn w(&self) -> Expr {
        self.component(3)
    }

    pub fn r(&self) -> Expr {
        self.component(0)
    }

    pub fn g(&self) -> Expr {
        self.component(1)
    }

    pub fn b(&self) -> Expr {
        self.component(2)
    }

    pub fn children(&self) -> Vec<&Expr> {
        match self.node() {
            Node::Constant { .. } | Node::Uniform(_) | Node::Input(_) => Vec::new(),
            Node::Unary(_, a) | Node::Component(a, _) => vec![a],
            Node::Binary(_, a, b) => vec![a, b],
            Node::Ternary(_, a, b, c) => vec![a, b, c],
            Node::Construct(parts) => parts.iter().collect(),
        }
    }

    /// Pre-order walk that visits each distinct node once.
    pub fn walk(&self, visit: &mut impl FnMut(&Expr)) {
        let mut seen = HashSet::new();
        self.walk_inner(&mut seen, visit);
    }

    fn walk_inner(&self, seen: &mut HashSet<usize>, visit: &mut impl FnMut(&Expr)) {
        if !seen.insert(self.key()) {
            return;
        }
        visit(self);
        for child in self.children() {
            child.walk_inner(seen, visit);
        }
    }

    /// Distinct uniforms referenced by this expression, in first-use order.
    pub fn uniforms(&self) -> Vec<Uniform<f32>> {
        let mut found: Vec<Uniform<f32>> = Vec::new();
        self.walk(&mut |expr| {
            if let Node::Uniform(u) = expr.node() {
                if !found.iter().any(|f| f.same_as(u)) {
                    found.push(u.clone());
                }
            }
        });
        found
    }

    pub fn uses_input(&self, input: Input) -> bool {
        let mut used = false;
        self.walk(&mut |expr| {
            if matches!(expr.node(), Node::Input(i) if *i == input) {
                used = true;
            }
        });
        used
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node() {
            Node::Constant { ty, value } => write!(f, "{ty}{:?}", &value[..ty.width()]),
            Node::Uniform(u) => write!(f, "uniform({})", u.name()),
            Node::Input(i) => write!(f, "{i:?}"),
            Node::Unary(op, a) => write!(f, "{op:?}({a:?})"),
            Node::Binary(op, a, b) => write!(f, "{op:?}({a:?}, {b:?})"),
            Node::Ternary(op, a, b, c) => write!(f, "{op:?}({a:?}, {b:?}, {c:?})"),
            Node::Construct(parts) => f.debug_list().entries(parts).finish(),
            Node::Component(a, i) => write!(f, "{a:?}[{i}]"),
        }
    }
}

impl From<f32> for Expr {
    fn from(value: f32) -> Self {
        float(value)
    }
}

impl From<&Expr> for Expr {
    fn from(value: &Expr) -> Self {
        value.clone()
    }
}

impl From<&Uniform<f32>> for Expr {
    fn from(value: &Uniform<f32>) -> Self {
        uniform(value)
    }
}

macro_rules! impl_binary_operator {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<R: Into<Expr>> std::ops::$trait<R> for Expr {
            type Output = Expr;
            fn $method(self, rhs: R) -> Expr {
                Expr::binary($op, self, rhs.into())
            }
        }

        impl<R: Into<Expr>> std::ops::$trait<R> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: R) -> Expr {
                Expr::binary($op, self.clone(), rhs.into())
            }
        }

        impl std::ops::$trait<Expr> for f32 {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary($op, float(self), rhs)
            }
        }

        impl std::ops::$trait<&Expr> for f32 {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                Expr::binary($op, float(self), rhs.clone())
            }
        }
    };
}

impl_binary_operator!(Add, add, BinaryOp::Add);
impl_binary_operator!(Sub, sub, BinaryOp::Sub);
impl_binary_operator!(Mul, mul, BinaryOp::Mul);
impl_binary_operator!(Div, div, BinaryOp::Div);

impl std::ops::Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Neg, self)
    }
}

impl std::ops::Neg for &Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Neg, self.clone())
    }
}

// Leaf constructors

pub fn float(value: f32) -> Expr {
    Expr::from_node(Node::Constant {
        ty: ValueType::Float,
        value: [value, 0.0, 0.0, 0.0],
    })
}

pub fn constant_vec3(value: [f32; 3]) -> Expr {
    Expr::from_node(Node::Constant {
        ty: ValueType::Vec3,
        value: [value[0], value[1], value[2], 0.0],
    })
}

/// An sRGB hex color (`0xRRGGBB`) as a linear-space `vec3` constant.
pub fn color(hex: u32) -> Expr {
    constant_vec3(hex_to_linear(hex))
}

pub fn uniform(u: &Uniform<f32>) -> Expr {
    Expr::from_node(Node::Uniform(u.clone()))
}

pub fn position_local() -> Expr {
    Expr::from_node(Node::Input(Input::PositionLocal))
}

pub fn uv() -> Expr {
    Expr::from_node(Node::Input(Input::Uv))
}

pub fn screen_uv() -> Expr {
    Expr::from_node(Node::Input(Input::ScreenUv))
}

pub fn time() -> Expr {
    Expr::from_node(Node::Input(Input::Time))
}

pub fn construct(parts: Vec<Expr>) -> Expr {
    Expr::from_node(Node::Construct(parts))
}

pub fn vec2(x: impl Into<Expr>, y: impl Into<Expr>) -> Expr {
    construct(vec![x.into(), y.into()])
}

pub fn vec3(x: impl Into<Expr>, y: impl Into<Expr>, z: impl Into<Expr>) -> Expr {
    construct(vec![x.into(), y.into(), z.into()])
}

pub fn vec4(
    x: impl Into<Expr>,
    y: impl Into<Expr>,
    z: impl Into<Expr>,
    w: impl Into<Expr>,
) -> Expr {
    construct(vec![x.into(), y.into(), z.into(), w.into()])
}

// Combinators

pub fn sin(e: impl Into<Expr>) -> Expr {
    Expr::unary(UnaryOp::Sin, e.into())
}

pub fn cos(e: impl Into<Expr>) -> Expr {
    Expr::unary(UnaryOp::Cos, e.into())
}

pub fn abs(e: impl Into<Expr>) -> Expr {
    Expr::unary(UnaryOp::Abs, e.into())
}

pub fn fract(e: impl Into<Expr>) -> Expr {
    Expr::unary(UnaryOp::Fract, e.into())
}

pub fn sqrt(e: impl Into<Expr>) -> Expr {
    Expr::unary(UnaryOp::Sqrt, e.into())
}

pub fn exp(e: impl Into<Expr>) -> Expr {
    Expr::unary(UnaryOp::Exp, e.into())
}

pub fn log(e: impl Into<Expr>) -> Expr {
    Expr::unary(UnaryOp::Log, e.into())
}

pub fn length(e: impl Into<Expr>) -> Expr {
    Expr::unary(UnaryOp::Length, e.into())
}

pub fn pow(base: impl Into<Expr>, exponent: impl Into<Expr>) -> Expr {
    Expr::binary(BinaryOp::Pow, base.into(), exponent.into())
}

/// 1.0 where `x >= edge`, else 0.0.
pub fn step(edge: impl Into<Expr>, x: impl Into<Expr>) -> Expr {
    Expr::binary(BinaryOp::Step, edge.into(), x.into())
}

pub fn min(a: impl Into<Expr>, b: impl Into<Expr>) -> Expr {
    Expr::binary(BinaryOp::Min, a.into(), b.into())
}

pub fn max(a: impl Into<Expr>, b: impl Into<Expr>) -> Expr {
    Expr::binary(BinaryOp::Max, a.into(), b.into())
}

pub fn distance(a: impl Into<Expr>, b: impl Into<Expr>) -> Expr {
    Expr::binary(BinaryOp::Distance, a.into(), b.into())
}

pub fn mix(a: impl Into<Expr>, b: impl Into<Expr>, t: impl Into<Expr>) -> Expr {
    Expr::ternary(TernaryOp::Mix, a.into(), b.into(), t.into())
}

/// Callers keep `edge0 < edge1`; the device result is undefined otherwise.
pub fn smoothstep(
    edge0: impl Into<Expr>,
    edge1: impl Into<Expr>,
    x: impl Into<Expr>,
) -> Expr {
    Expr::ternary(TernaryOp::Smoothstep, edge0.into(), edge1.into(), x.into())
}

pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

pub fn hex_to_linear(hex: u32) -> [f32; 3] {
    let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
    [channel(16), channel(8), channel(0)]
}

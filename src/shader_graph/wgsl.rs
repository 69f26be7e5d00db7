// src/shader_graph/wgsl.rs

use std::collections::HashMap;
use std::fmt::Write;

use super::node::{BinaryOp, Expr, Input, Node, TernaryOp, UnaryOp, ValueType};
use super::typecheck::TypeChecker;
use super::uniform::Uniform;
use crate::error::ShaderGraphError;
use crate::rendering_lib::shader::FRAME_WGSL;

/// Where a material's position expression lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Space {
    /// Transformed by the camera's view-projection.
    World,
    /// Already in clip space; `xy` of the position is used directly.
    Screen,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Vertex,
    Fragment,
}

/// A compiled material: a complete WGSL module plus the uniforms it reads, in slot order.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    pub source: String,
    pub uniforms: Vec<Uniform<f32>>,
}

impl ShaderProgram {
    pub fn slot_vec4_count(&self) -> usize {
        slot_vec4_count(self.uniforms.len())
    }

    /// Current uniform values packed four to a `vec4`, matching `MaterialUniforms`.
    pub fn pack_uniforms(&self) -> Vec<[f32; 4]> {
        let mut packed = vec![[0.0; 4]; self.slot_vec4_count()];
        for (i, u) in self.uniforms.iter().enumerate() {
            packed[i / 4][i % 4] = u.get();
        }
        packed
    }
}

fn slot_vec4_count(uniforms: usize) -> usize {
    uniforms.div_ceil(4).max(1)
}

pub fn float_literal(v: f32) -> String {
    let s = if v.fract() == 0.0 && v.abs() < 1.0e7 {
        format!("{v:.1}")
    } else {
        format!("{v:?}")
    };
    if v < 0.0 {
        format!("({s})")
    } else {
        s
    }
}

/// Compiles a position expression (`vec3`) and a color expression (`vec3` or `vec4`)
/// into one WGSL module with `vs_main` and `fs_main`, and validates it with naga.
pub fn compile_material(
    position: &Expr,
    color: &Expr,
    space: Space,
) -> Result<ShaderProgram, ShaderGraphError> {
    if position.uses_input(Input::ScreenUv) {
        return Err(ShaderGraphError::StageMismatch { input: Input::ScreenUv, stage: "vertex" });
    }

    let mut uniforms = position.uniforms();
    for u in color.uniforms() {
        if !uniforms.iter().any(|known| known.same_as(&u)) {
            uniforms.push(u);
        }
    }

    let mut types = TypeChecker::new();
    let position_ty = types.type_of(position)?;
    if position_ty != ValueType::Vec3 {
        return Err(ShaderGraphError::UnexpectedType {
            what: "position",
            expected: "vec3<f32>",
            found: position_ty,
        });
    }
    let color_ty = types.type_of(color)?;
    if !matches!(color_ty, ValueType::Vec3 | ValueType::Vec4) {
        return Err(ShaderGraphError::UnexpectedType {
            what: "color",
            expected: "vec3<f32> or vec4<f32>",
            found: color_ty,
        });
    }

    let (vertex_lets, displaced) =
        Emitter::new(&mut types, &uniforms, Stage::Vertex, position).run(position)?;
    let (fragment_lets, shaded) =
        Emitter::new(&mut types, &uniforms, Stage::Fragment, color).run(color)?;

    let mut source = String::from(FRAME_WGSL);
    let _ = write!(
        source,
        "
struct MaterialUniforms {{
    slots: array<vec4<f32>, {}>,
}}

@group(1) @binding(0)
var<uniform> material: MaterialUniforms;
",
        slot_vec4_count(uniforms.len())
    );

    let clip = match space {
        Space::World => "frame.view_proj * vec4<f32>(displaced, 1.0)",
        Space::Screen => "vec4<f32>(displaced.xy, 0.0, 1.0)",
    };
    let _ = write!(
        source,
        "
@vertex
fn vs_main(in: VertexInput) -> VertexOutput {{
    let position_local = in.position;
    let uv = in.uv;
{vertex_lets}    let displaced = {displaced};
    var out: VertexOutput;
    out.clip_position = {clip};
    out.local_position = position_local;
    out.uv = uv;
    return out;
}}
"
    );

    let ret = match color_ty {
        ValueType::Vec3 => "vec4<f32>(color, 1.0)",
        _ => "color",
    };
    let _ = write!(
        source,
        "
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let position_local = in.local_position;
    let uv = in.uv;
    let screen_uv = in.clip_position.xy / frame.resolution;
{fragment_lets}    let color = {shaded};
    return {ret};
}}
"
    );

    validate_wgsl(&source)?;
    log::debug!("Compiled material: {} uniforms, {} bytes of WGSL", uniforms.len(), source.len());
    Ok(ShaderProgram { source, uniforms })
}

pub fn validate_wgsl(source: &str) -> Result<(), ShaderGraphError> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| ShaderGraphError::InvalidWgsl(e.emit_to_string(source)))?;
    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    .map_err(|e| ShaderGraphError::InvalidWgsl(format!("{e:?}")))?;
    Ok(())
}

/// Emits one stage's expression. Non-leaf nodes with more than one parent are bound
/// to a `let` so the device computes them once. `parents` and `bound` are keyed by
/// node address and only live for one `run`, while `root` holds every node.
struct Emitter<'a> {
    types: &'a mut TypeChecker,
    uniforms: &'a [Uniform<f32>],
    stage: Stage,
    parents: HashMap<usize, usize>,
    bound: HashMap<usize, String>,
    lets: String,
}

impl<'a> Emitter<'a> {
    fn new(
        types: &'a mut TypeChecker,
        uniforms: &'a [Uniform<f32>],
        stage: Stage,
        root: &Expr,
    ) -> Self {
        let mut parents: HashMap<usize, usize> = HashMap::new();
        root.walk(&mut |e| {
            for child in e.children() {
                *parents.entry(child.key()).or_default() += 1;
            }
        });
        Self { types, uniforms, stage, parents, bound: HashMap::new(), lets: String::new() }
    }

    fn run(mut self, root: &Expr) -> Result<(String, String), ShaderGraphError> {
        let body = self.emit(root)?;
        Ok((self.lets, body))
    }

    fn emit(&mut self, expr: &Expr) -> Result<String, ShaderGraphError> {
        if let Some(name) = self.bound.get(&expr.key()) {
            return Ok(name.clone());
        }
        let code = self.emit_node(expr)?;
        let is_leaf = matches!(
            expr.node(),
            Node::Constant { .. } | Node::Uniform(_) | Node::Input(_)
        );
        if !is_leaf && self.parents.get(&expr.key()).copied().unwrap_or(0) > 1 {
            let name = format!("v{}", self.bound.len());
            let ty = self.types.type_of(expr)?;
            let _ = writeln!(self.lets, "    let {name}: {ty} = {code};");
            self.bound.insert(expr.key(), name.clone());
            return Ok(name);
        }
        Ok(code)
    }

    // Splats a scalar operand up to `ty` for builtins that require matching types.
    fn emit_as(&mut self, expr: &Expr, ty: ValueType) -> Result<String, ShaderGraphError> {
        let code = self.emit(expr)?;
        if ty != ValueType::Float && self.types.type_of(expr)? == ValueType::Float {
            Ok(format!("{ty}({code})"))
        } else {
            Ok(code)
        }
    }

    fn emit_node(&mut self, expr: &Expr) -> Result<String, ShaderGraphError> {
        let ty = self.types.type_of(expr)?;
        Ok(match expr.node() {
            Node::Constant { ty, value } => {
                if *ty == ValueType::Float {
                    float_literal(value[0])
                } else {
                    let parts: Vec<String> =
                        value[..ty.width()].iter().map(|v| float_literal(*v)).collect();
                    format!("{ty}({})", parts.join(", "))
                }
            }
            Node::Uniform(u) => {
                let slot = self
                    .uniforms
                    .iter()
                    .position(|known| known.same_as(u))
                    .unwrap_or_default();
                let lane = ["x", "y", "z", "w"][slot % 4];
                format!("material.slots[{}].{lane}", slot / 4)
            }
            Node::Input(input) => match input {
                Input::PositionLocal => "position_local".to_string(),
                Input::Uv => "uv".to_string(),
                Input::Time => "frame.time".to_string(),
                Input::ScreenUv => {
                    if self.stage == Stage::Vertex {
                        return Err(ShaderGraphError::StageMismatch {
                            input: *input,
                            stage: "vertex",
                        });
                    }
                    "screen_uv".to_string()
                }
            },
            Node::Unary(op, a) => {
                let a = self.emit(a)?;
                match op {
                    UnaryOp::Neg => format!("(-{a})"),
                    UnaryOp::Sin => format!("sin({a})"),
                    UnaryOp::Cos => format!("cos({a})"),
                    UnaryOp::Abs => format!("abs({a})"),
                    UnaryOp::Fract => format!("fract({a})"),
                    UnaryOp::Sqrt => format!("sqrt({a})"),
                    UnaryOp::Exp => format!("exp({a})"),
                    UnaryOp::Log => format!("log({a})"),
                    UnaryOp::Length => format!("length({a})"),
                }
            }
            Node::Binary(op, a, b) => match op {
                BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                    let symbol = match op {
                        BinaryOp::Add => "+",
                        BinaryOp::Sub => "-",
                        BinaryOp::Mul => "*",
                        _ => "/",
                    };
                    format!("({} {symbol} {})", self.emit(a)?, self.emit(b)?)
                }
                BinaryOp::Distance => {
                    let operand_ty = super::typecheck::unify(
                        "distance",
                        self.types.type_of(a)?,
                        self.types.type_of(b)?,
                    )?;
                    format!(
                        "distance({}, {})",
                        self.emit_as(a, operand_ty)?,
                        self.emit_as(b, operand_ty)?
                    )
                }
                _ => {
                    let name = match op {
                        BinaryOp::Pow => "pow",
                        BinaryOp::Step => "step",
                        BinaryOp::Min => "min",
                        _ => "max",
                    };
                    format!("{name}({}, {})", self.emit_as(a, ty)?, self.emit_as(b, ty)?)
                }
            },
            Node::Ternary(TernaryOp::Mix, a, b, t) => format!(
                "mix({}, {}, {})",
                self.emit_as(a, ty)?,
                self.emit_as(b, ty)?,
                self.emit(t)?
            ),
            Node::Ternary(TernaryOp::Smoothstep, e0, e1, x) => format!(
                "smoothstep({}, {}, {})",
                self.emit_as(e0, ty)?,
                self.emit_as(e1, ty)?,
                self.emit_as(x, ty)?
            ),
            Node::Construct(parts) => {
                let mut codes = Vec::with_capacity(parts.len());
                for part in parts {
                    codes.push(self.emit(part)?);
                }
                format!("{ty}({})", codes.join(", "))
            }
            Node::Component(a, index) => {
                let source_ty = self.types.type_of(a)?;
                let a = self.emit(a)?;
                if source_ty == ValueType::Float {
                    a
                } else {
                    format!("{a}.{}", ["x", "y", "z", "w"][*index])
                }
            }
        })
    }
}

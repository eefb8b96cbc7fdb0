//! Turning a processed [`Model`] into a [`DiscretizedSystem`].

use std::collections::BTreeMap;

use log::{debug, info};
use nalgebra::DVector;
use voltaic_core::{
    BinaryOp, BoundaryCondition, BoundaryKind, DaeProblem, Domain, Expr, ExprError, Model,
    NotImplementedError, Side, Symbol, Variable,
};

use crate::{
    DiscretizationError, MeshError,
    discrete::DiscreteExpr,
    mesh::{Mesh, SubMesh1D},
    method::{EdgeCondition, Interpolation, SpatialMethod},
    sparse::{TripletMatrix, block_diagonal, ones_column, selection},
    system::{DiscretizedSystem, DiscretizedVariable, Location, StateLayout},
};

/// Discretizes `model` on `mesh` with `method`.
///
/// The model's parameters must already be processed. Discretizing the same
/// model and mesh twice gives equal systems.
///
/// # Errors
///
/// Returns a [`DiscretizationError`] for unprocessed parameters, missing
/// sub-meshes or boundary conditions, and structures the method does not
/// support.
pub fn discretize(
    model: &Model,
    mesh: &Mesh,
    method: &impl SpatialMethod,
) -> Result<DiscretizedSystem, DiscretizationError> {
    let mut layout = StateLayout::default();
    for (variable, _) in model.rhs() {
        let size = Shape::of(mesh, method, variable.domain())?.len();
        layout.push(variable.clone(), size, true);
    }
    for (variable, _) in model.algebraic() {
        let size = Shape::of(mesh, method, variable.domain())?.len();
        layout.push(variable.clone(), size, false);
    }

    let discretizer = Discretizer {
        model,
        mesh,
        method,
        layout: &layout,
    };

    let mut equations = Vec::with_capacity(layout.slots().len());
    for (variable, expr) in model.equations() {
        let size = layout.size_of(variable)?;
        let discrete = discretizer.symbol(expr)?;
        equations.push(discretizer.fill(discrete, variable.domain(), size, variable.name())?);
    }

    let mut y0 = DVector::zeros(layout.size());
    for slot in layout.slots() {
        let initial = discretizer.initial_condition(&slot.variable, slot.range.len())?;
        y0.rows_mut(slot.range.start, slot.range.len())
            .copy_from(&initial);
    }

    let mut events = Vec::with_capacity(model.events().len());
    for event in model.events() {
        let discrete = discretizer.symbol(&event.expression)?;
        if discrete.len != 1 {
            return Err(DiscretizationError::ShapeMismatch {
                context: format!("event `{}`", event.name),
                expected: 1,
                found: discrete.len,
            });
        }
        events.push((event.name.clone(), discrete.expr));
    }

    let mut variables = BTreeMap::new();
    for (name, expr) in model.variables() {
        let discrete = discretizer.symbol(expr)?;
        let coordinates = discretizer.coordinates(expr.domain(), discrete.location)?;
        variables.insert(
            name.clone(),
            DiscretizedVariable::new(
                discrete.expr,
                expr.domain().clone(),
                discrete.location,
                coordinates,
                discrete.len,
            ),
        );
    }

    let system = DiscretizedSystem::new(
        model.name().to_owned(),
        layout,
        equations,
        y0,
        events,
        variables,
    );
    info!(
        "discretized model `{}` with the {} method: {} states, {} algebraic, {} events",
        model.name(),
        method.name(),
        system.size(),
        system.algebraic_size(),
        system.event_count()
    );
    Ok(system)
}

/// Number of primary points and secondary blocks of a domain.
struct Shape {
    mesh: Option<SubMesh1D>,
    blocks: usize,
}

impl Shape {
    fn of(
        mesh: &Mesh,
        method: &impl SpatialMethod,
        domain: &Domain,
    ) -> Result<Self, DiscretizationError> {
        if domain.is_scalar() {
            return Ok(Self {
                mesh: None,
                blocks: 1,
            });
        }
        let primary = mesh.combine(domain.primary()).map_err(|err| match err {
            MeshError::TwoDimensional(sub) => DiscretizationError::NotImplemented(
                NotImplementedError::new(format!(
                    "two-dimensional {sub} sub-mesh with the {} method",
                    method.name()
                )),
            ),
            other => DiscretizationError::Mesh(other),
        })?;
        let blocks = mesh.npts(domain.secondary())?;
        Ok(Self {
            mesh: Some(primary),
            blocks,
        })
    }

    fn npts(&self) -> usize {
        self.mesh.as_ref().map_or(1, SubMesh1D::npts)
    }

    fn len(&self) -> usize {
        self.npts() * self.blocks
    }

    fn submesh(&self, operation: &'static str) -> Result<&SubMesh1D, DiscretizationError> {
        self.mesh.as_ref().ok_or(DiscretizationError::Location {
            operation,
            expected: "a spatial domain",
            found: "a scalar",
        })
    }
}

/// A discretized symbol with its location and length.
struct Discrete {
    expr: DiscreteExpr,
    location: Location,
    len: usize,
}

impl Discrete {
    fn scalar(expr: DiscreteExpr) -> Self {
        Self {
            expr,
            location: Location::Scalar,
            len: 1,
        }
    }

    fn nodes(expr: DiscreteExpr, len: usize) -> Self {
        Self {
            expr,
            location: Location::Nodes,
            len,
        }
    }

    fn faces(expr: DiscreteExpr, len: usize) -> Self {
        Self {
            expr,
            location: Location::Faces,
            len,
        }
    }

    fn on(location: Location, expr: DiscreteExpr, len: usize) -> Self {
        Self {
            expr,
            location,
            len,
        }
    }
}

struct Discretizer<'a, M> {
    model: &'a Model,
    mesh: &'a Mesh,
    method: &'a M,
    layout: &'a StateLayout,
}

impl<M: SpatialMethod> Discretizer<'_, M> {
    fn shape(&self, domain: &Domain) -> Result<Shape, DiscretizationError> {
        Shape::of(self.mesh, self.method, domain)
    }

    fn symbol(&self, symbol: &Symbol) -> Result<Discrete, DiscretizationError> {
        match symbol.expr() {
            Expr::Constant(value) => Ok(Discrete::scalar(DiscreteExpr::Constant(*value))),
            Expr::Parameter(name) | Expr::FunctionParameter { name, .. } => {
                Err(DiscretizationError::UnprocessedParameter(name.clone()))
            }
            Expr::Variable(variable) => {
                let range = self
                    .layout
                    .range_of(variable)
                    .ok_or_else(|| DiscretizationError::UnknownVariable(variable.clone()))?;
                let len = range.len();
                let expr = DiscreteExpr::State(range);
                Ok(if variable.domain().is_scalar() {
                    Discrete::scalar(expr)
                } else {
                    Discrete::nodes(expr, len)
                })
            }
            Expr::Time => Ok(Discrete::scalar(DiscreteExpr::Time)),
            Expr::Coordinate(_) => {
                let shape = self.shape(symbol.domain())?;
                let nodes = shape.submesh("coordinate")?.nodes();
                let len = shape.len();
                let values = DVector::from_fn(len, |i, _| nodes[i % nodes.len()]);
                Ok(Discrete::nodes(DiscreteExpr::Vector(values), len))
            }
            Expr::Function(func, child) => {
                let child = self.symbol(child)?;
                Ok(Discrete::on(
                    child.location,
                    DiscreteExpr::Function(*func, Box::new(child.expr)),
                    child.len,
                ))
            }
            Expr::Binary(op, left, right) => self.binary(*op, symbol.domain(), left, right),
            Expr::Gradient(operand) => self.gradient(operand),
            Expr::Divergence(operand) => self.divergence(operand),
            Expr::Integral(operand) => self.integral(symbol, operand),
            Expr::BoundaryValue(side, operand) => self.boundary_value(symbol, *side, operand),
            Expr::Broadcast(operand) => self.broadcast(symbol.domain(), operand),
            Expr::Restrict(operand) => self.restrict(symbol.domain(), operand),
            Expr::Concatenation(parts) => self.concatenation(parts),
            Expr::Reduce(reduction, operand) => {
                let operand = self.symbol(operand)?;
                Ok(Discrete::scalar(DiscreteExpr::Reduce(
                    *reduction,
                    Box::new(operand.expr),
                )))
            }
        }
    }

    fn binary(
        &self,
        op: BinaryOp,
        domain: &Domain,
        left: &Symbol,
        right: &Symbol,
    ) -> Result<Discrete, DiscretizationError> {
        let mut left = self.symbol(left)?;
        let mut right = self.symbol(right)?;

        match (left.location, right.location) {
            (Location::Nodes, Location::Faces) | (Location::Faces, Location::Nodes) => {
                let shape = self.shape(domain)?;
                let converting_faces = matches!(op, BinaryOp::Add | BinaryOp::Sub);
                let (from, target) = if converting_faces {
                    (Location::Faces, Location::Nodes)
                } else {
                    (Location::Nodes, Location::Faces)
                };
                for side in [&mut left, &mut right] {
                    if side.location == from {
                        let moved = std::mem::replace(
                            &mut side.expr,
                            DiscreteExpr::Constant(0.0),
                        );
                        side.expr = if converting_faces {
                            self.face_to_node(&shape, moved)?
                        } else {
                            self.node_to_face(&shape, moved)?
                        };
                        side.location = target;
                        side.len = match target {
                            Location::Faces => (shape.npts() + 1) * shape.blocks,
                            _ => shape.len(),
                        };
                    }
                }
            }
            _ => {}
        }

        let (location, len) = match (left.len, right.len) {
            (1, _) => (right.location, right.len),
            (_, 1) => (left.location, left.len),
            (m, n) if m == n => (left.location, m),
            (m, n) => {
                return Err(DiscretizationError::ShapeMismatch {
                    context: op.name().to_owned(),
                    expected: m,
                    found: n,
                });
            }
        };
        let location = if left.location == Location::Scalar {
            right.location
        } else if right.location == Location::Scalar {
            left.location
        } else {
            location
        };
        Ok(Discrete::on(
            location,
            DiscreteExpr::binary(op, left.expr, right.expr),
            len,
        ))
    }

    fn face_to_node(
        &self,
        shape: &Shape,
        faces: DiscreteExpr,
    ) -> Result<DiscreteExpr, DiscretizationError> {
        let average = self.method.face_to_node(shape.submesh("averaging")?)?;
        Ok(DiscreteExpr::mat_vec(
            block_diagonal(shape.blocks, &average)?,
            faces,
        ))
    }

    fn node_to_face(
        &self,
        shape: &Shape,
        nodes: DiscreteExpr,
    ) -> Result<DiscreteExpr, DiscretizationError> {
        let interpolate = self.method.node_to_face(shape.submesh("interpolation")?)?;
        let interpolate = block_diagonal(shape.blocks, &interpolate)?;
        Ok(match self.method.interpolation() {
            Interpolation::Arithmetic => DiscreteExpr::mat_vec(interpolate, nodes),
            Interpolation::Harmonic => {
                let reciprocal =
                    DiscreteExpr::binary(BinaryOp::Div, DiscreteExpr::Constant(1.0), nodes);
                DiscreteExpr::binary(
                    BinaryOp::Div,
                    DiscreteExpr::Constant(1.0),
                    DiscreteExpr::mat_vec(interpolate, reciprocal),
                )
            }
        })
    }

    fn boundary_conditions(
        &self,
        variable: &Variable,
    ) -> Result<[&BoundaryCondition; 2], DiscretizationError> {
        let conditions = self.model.boundary_conditions(variable);
        let get = |side| {
            conditions
                .and_then(|bcs| bcs.get(&side))
                .ok_or_else(|| DiscretizationError::MissingBoundaryCondition {
                    variable: variable.clone(),
                    side,
                })
        };
        Ok([get(Side::Left)?, get(Side::Right)?])
    }

    fn edge_condition(
        variable: &Variable,
        condition: &BoundaryCondition,
    ) -> Result<EdgeCondition, DiscretizationError> {
        Ok(match &condition.kind {
            BoundaryKind::Dirichlet => EdgeCondition::DIRICHLET,
            BoundaryKind::Neumann => EdgeCondition::NEUMANN,
            BoundaryKind::Robin { alpha, beta } => {
                let constant = |symbol: &Symbol| {
                    symbol.evaluate_constant().map_err(|_| {
                        DiscretizationError::NonConstantCoefficient {
                            variable: variable.clone(),
                        }
                    })
                };
                EdgeCondition {
                    alpha: constant(alpha)?,
                    beta: constant(beta)?,
                }
            }
        })
    }

    /// Discretizes a boundary value for one value per secondary block.
    fn edge_value(
        &self,
        condition: &BoundaryCondition,
        blocks: usize,
    ) -> Result<Discrete, DiscretizationError> {
        let value = self.symbol(&condition.value)?;
        if value.location == Location::Faces {
            return Err(DiscretizationError::Location {
                operation: "boundary condition",
                expected: "nodes",
                found: "faces",
            });
        }
        if value.len != 1 && value.len != blocks {
            return Err(DiscretizationError::ShapeMismatch {
                context: "boundary condition".to_owned(),
                expected: blocks,
                found: value.len,
            });
        }
        Ok(value)
    }

    fn gradient(&self, operand: &Symbol) -> Result<Discrete, DiscretizationError> {
        let variable = operand
            .as_variable()
            .ok_or_else(|| DiscretizationError::GradientOfExpression(operand.to_string()))?;
        let shape = self.shape(variable.domain())?;
        let submesh = shape.submesh("gradient")?;
        let n = submesh.npts();
        let [left, right] = self.boundary_conditions(variable)?;
        let stencil = self.method.gradient(
            variable,
            submesh,
            Self::edge_condition(variable, left)?,
            Self::edge_condition(variable, right)?,
        )?;

        let u = self.symbol(operand)?;
        let mut faces = DiscreteExpr::mat_vec(block_diagonal(shape.blocks, &stencil.matrix)?, u.expr);
        for (condition, face, coefficient) in [
            (left, 0, stencil.left),
            (right, n, stencil.right),
        ] {
            let value = self.edge_value(condition, shape.blocks)?;
            if value.expr == DiscreteExpr::Constant(0.0) {
                continue;
            }
            let mut place = TripletMatrix::new((n + 1) * shape.blocks, value.len);
            for block in 0..shape.blocks {
                place.add(block * (n + 1) + face, block.min(value.len - 1), coefficient);
            }
            faces = DiscreteExpr::binary(
                BinaryOp::Add,
                faces,
                DiscreteExpr::mat_vec(place.to_csr()?, value.expr),
            );
        }
        Ok(Discrete::faces(faces, (n + 1) * shape.blocks))
    }

    fn divergence(&self, operand: &Symbol) -> Result<Discrete, DiscretizationError> {
        let flux = self.symbol(operand)?;
        if flux.location != Location::Faces {
            return Err(DiscretizationError::Location {
                operation: "divergence",
                expected: "faces",
                found: flux.location.name(),
            });
        }
        let shape = self.shape(operand.domain())?;
        let divergence = self.method.divergence(shape.submesh("divergence")?)?;
        Ok(Discrete::nodes(
            DiscreteExpr::mat_vec(block_diagonal(shape.blocks, &divergence)?, flux.expr),
            shape.len(),
        ))
    }

    fn integral(&self, symbol: &Symbol, operand: &Symbol) -> Result<Discrete, DiscretizationError> {
        let integrand = self.nodes_of(operand)?;
        let shape = self.shape(operand.domain())?;
        let weights = self.method.integral_weights(shape.submesh("integral")?);
        let mut row = TripletMatrix::new(1, weights.len());
        for (j, &w) in weights.iter().enumerate() {
            row.add(0, j, w);
        }
        let operator = block_diagonal(shape.blocks, &row.to_csr()?)?;
        Ok(self.collapsed(
            symbol,
            DiscreteExpr::mat_vec(operator, integrand),
            shape.blocks,
        ))
    }

    fn boundary_value(
        &self,
        symbol: &Symbol,
        side: Side,
        operand: &Symbol,
    ) -> Result<Discrete, DiscretizationError> {
        let shape = self.shape(operand.domain())?;
        let submesh = shape.submesh("boundary value")?;

        let condition = operand.as_variable().and_then(|variable| {
            self.model
                .boundary_conditions(variable)
                .and_then(|bcs| bcs.get(&side))
        });
        let expr = match condition {
            Some(condition) if condition.kind == BoundaryKind::Dirichlet => {
                let value = self.edge_value(condition, shape.blocks)?;
                if value.len == 1 && shape.blocks > 1 {
                    DiscreteExpr::mat_vec(ones_column(shape.blocks)?, value.expr)
                } else {
                    value.expr
                }
            }
            // A flux that reads this same edge value (particle surface
            // kinetics) would recurse, so it falls through to extrapolation.
            Some(condition)
                if condition.kind == BoundaryKind::Neumann
                    && !reads_edge(&condition.value, operand) =>
            {
                let reconstruction = self.method.boundary_value_from_flux(submesh, side)?;
                let node = DiscreteExpr::mat_vec(
                    block_diagonal(shape.blocks, &reconstruction.node)?,
                    self.symbol(operand)?.expr,
                );
                let gradient = self.edge_value(condition, shape.blocks)?.expr;
                DiscreteExpr::binary(
                    BinaryOp::Add,
                    node,
                    DiscreteExpr::binary(
                        BinaryOp::Mul,
                        DiscreteExpr::Constant(reconstruction.gradient),
                        gradient,
                    ),
                )
            }
            _ => {
                let values = self.nodes_of(operand)?;
                let extrapolate = self.method.boundary_value(submesh, side)?;
                DiscreteExpr::mat_vec(block_diagonal(shape.blocks, &extrapolate)?, values)
            }
        };
        Ok(self.collapsed(symbol, expr, shape.blocks))
    }

    fn broadcast(&self, target: &Domain, operand: &Symbol) -> Result<Discrete, DiscretizationError> {
        let source = self.symbol(operand)?;
        if source.location == Location::Faces {
            return Err(DiscretizationError::Location {
                operation: "broadcast",
                expected: "nodes",
                found: "faces",
            });
        }
        let shape = self.shape(target)?;
        if source.len == shape.len() && source.len > 1 {
            return Ok(Discrete::nodes(source.expr, source.len));
        }
        let operator = if source.len == 1 {
            ones_column(shape.len())?
        } else if source.len == shape.blocks {
            block_diagonal(shape.blocks, &ones_column(shape.npts())?)?
        } else {
            return Err(DiscretizationError::ShapeMismatch {
                context: "broadcast".to_owned(),
                expected: shape.blocks,
                found: source.len,
            });
        };
        Ok(Discrete::nodes(
            DiscreteExpr::mat_vec(operator, source.expr),
            shape.len(),
        ))
    }

    fn restrict(&self, target: &Domain, operand: &Symbol) -> Result<Discrete, DiscretizationError> {
        let source = self.symbol(operand)?;
        if source.location == Location::Scalar {
            return Ok(source);
        }
        let primary = operand.domain().primary();
        let Some(start) = target
            .primary()
            .first()
            .and_then(|first| primary.iter().position(|sub| sub == first))
        else {
            return Err(DiscretizationError::Location {
                operation: "restriction",
                expected: "a contained sub-domain",
                found: "an unrelated sub-domain",
            });
        };
        let offset = primary[..start]
            .iter()
            .map(|sub| self.mesh.npts(&[*sub]))
            .sum::<Result<usize, _>>()?;
        let count = self.mesh.npts(target.primary())?;
        let total = self.mesh.npts(primary)?;
        let (operator, len) = match source.location {
            Location::Faces => (selection(1, total + 1, offset, count + 1)?, count + 1),
            _ => (selection(1, total, offset, count)?, count),
        };
        Ok(Discrete::on(
            source.location,
            DiscreteExpr::mat_vec(operator, source.expr),
            len,
        ))
    }

    fn concatenation(&self, parts: &[Symbol]) -> Result<Discrete, DiscretizationError> {
        let mut exprs = Vec::with_capacity(parts.len());
        let mut len = 0;
        for part in parts {
            let size = self.shape(part.domain())?.len();
            let discrete = self.symbol(part)?;
            exprs.push(self.fill(discrete, part.domain(), size, "concatenation")?);
            len += size;
        }
        Ok(Discrete::nodes(DiscreteExpr::Concat(exprs), len))
    }

    /// Discretizes a symbol onto nodes, averaging face values.
    fn nodes_of(&self, symbol: &Symbol) -> Result<DiscreteExpr, DiscretizationError> {
        let discrete = self.symbol(symbol)?;
        Ok(self.to_nodes(discrete, symbol.domain())?.expr)
    }

    fn to_nodes(&self, discrete: Discrete, domain: &Domain) -> Result<Discrete, DiscretizationError> {
        if discrete.location != Location::Faces {
            return Ok(discrete);
        }
        let shape = self.shape(domain)?;
        let expr = self.face_to_node(&shape, discrete.expr)?;
        Ok(Discrete::nodes(expr, shape.len()))
    }

    /// Wraps the result of an operator that collapses the primary dimension.
    fn collapsed(&self, symbol: &Symbol, expr: DiscreteExpr, blocks: usize) -> Discrete {
        if symbol.domain().is_scalar() {
            Discrete::scalar(expr)
        } else {
            Discrete::nodes(expr, blocks)
        }
    }

    /// Brings a quantity on `domain` to exactly `size` node entries.
    fn fill(
        &self,
        discrete: Discrete,
        domain: &Domain,
        size: usize,
        context: &str,
    ) -> Result<DiscreteExpr, DiscretizationError> {
        let discrete = self.to_nodes(discrete, domain)?;
        match discrete.len {
            len if len == size => Ok(discrete.expr),
            1 => Ok(DiscreteExpr::mat_vec(ones_column(size)?, discrete.expr)),
            len => Err(DiscretizationError::ShapeMismatch {
                context: context.to_owned(),
                expected: size,
                found: len,
            }),
        }
    }

    fn initial_condition(
        &self,
        variable: &Variable,
        size: usize,
    ) -> Result<DVector<f64>, DiscretizationError> {
        let symbol = self.model.initial_condition(variable).ok_or_else(|| {
            DiscretizationError::Expr(ExprError::UndefinedSymbol(format!(
                "initial condition of {variable}"
            )))
        })?;
        if !symbol.variables().is_empty() {
            return Err(DiscretizationError::InitialConditionDependsOnState(
                variable.clone(),
            ));
        }
        let discrete = self.symbol(symbol)?;
        let expr = self.fill(discrete, variable.domain(), size, variable.name())?;
        let values = expr.evaluate(0.0, &DVector::zeros(0))?;
        debug!("initial condition of `{variable}` has {} entries", values.len());
        Ok(values)
    }

    /// Primary coordinates for reconstructing an output in space.
    fn coordinates(
        &self,
        domain: &Domain,
        location: Location,
    ) -> Result<DVector<f64>, DiscretizationError> {
        if domain.is_scalar() || location == Location::Scalar {
            return Ok(DVector::zeros(0));
        }
        let shape = self.shape(domain)?;
        let submesh = shape.submesh("output")?;
        Ok(match location {
            Location::Faces => submesh.edges().clone(),
            _ => submesh.nodes().clone(),
        })
    }
}

/// Returns `true` if `value` contains an edge value of `operand`.
fn reads_edge(value: &Symbol, operand: &Symbol) -> bool {
    value.any(&mut |node| matches!(node.expr(), Expr::BoundaryValue(_, inner) if inner == operand))
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_relative_eq;
    use voltaic_core::{ModelBuilder, SubDomain};

    use super::*;
    use crate::{
        FiniteVolume,
        geometry::{CollectorGeometry, Geometry},
        mesh::{PointKey, Points, SubMesh},
    };

    fn separator_mesh(points: usize) -> Mesh {
        let geometry = Geometry::new()
            .with_extent(SubDomain::Separator, 0.0, 1.0)
            .unwrap();
        let points = Points::empty().with(PointKey::Xs, points).unwrap();
        Mesh::new(&geometry, &points).unwrap()
    }

    fn diffusion(left: BoundaryCondition, right: BoundaryCondition) -> (Variable, Model) {
        let c = Variable::new("c", Domain::single(SubDomain::Separator));
        let mut builder = ModelBuilder::new("diffusion");
        builder
            .rhs(&c, c.symbol().grad().unwrap().div().unwrap())
            .unwrap();
        builder
            .initial_condition(&c, Symbol::constant(1.0))
            .boundary_conditions(&c, left, right)
            .variable("c", c.symbol())
            .variable("c at right", c.symbol().boundary_value(Side::Right).unwrap());
        (c, builder.build())
    }

    #[test]
    fn diffusion_conserves_the_boundary_flux() {
        let (_, model) = diffusion(
            BoundaryCondition::no_flux(),
            BoundaryCondition::neumann(Symbol::constant(1.0)),
        );
        let mesh = separator_mesh(10);
        let system = discretize(&model, &mesh, &FiniteVolume::default()).unwrap();

        assert_eq!(system.size(), 10);
        assert_eq!(system.initial_state(), &DVector::from_element(10, 1.0));

        let y = DVector::from_fn(10, |i, _| (i as f64 * 0.7).cos());
        let f = system.rhs_algebraic(0.0, &y).unwrap();
        assert_relative_eq!(f.sum() * 0.1, 1.0, epsilon = 1e-10);
    }

    /// Cell mesh over the three through-cell sub-domains with uneven widths.
    fn cell_mesh(n: usize, s: usize, p: usize) -> Mesh {
        let geometry = Geometry::new()
            .with_extent(SubDomain::NegativeElectrode, 0.0, 1.0)
            .unwrap()
            .with_extent(SubDomain::Separator, 1.0, 1.4)
            .unwrap()
            .with_extent(SubDomain::PositiveElectrode, 1.4, 2.5)
            .unwrap();
        let points = Points::empty()
            .with(PointKey::Xn, n)
            .unwrap()
            .with(PointKey::Xs, s)
            .unwrap()
            .with(PointKey::Xp, p)
            .unwrap();
        Mesh::new(&geometry, &points).unwrap()
    }

    #[test]
    fn fluxes_match_across_sub_domain_interfaces() {
        let c = Variable::new("c", Domain::through_cell());
        let kappa = Symbol::concatenate(
            [
                (SubDomain::NegativeElectrode, 1.0),
                (SubDomain::Separator, 0.5),
                (SubDomain::PositiveElectrode, 3.0),
            ]
            .into_iter()
            .map(|(sub, k)| Symbol::constant(k).broadcast(Domain::single(sub)).unwrap())
            .collect(),
        )
        .unwrap();
        let rhs = kappa.times(&c.symbol().grad().unwrap()).unwrap().div().unwrap();

        for method in [
            FiniteVolume::new(Interpolation::Arithmetic),
            FiniteVolume::new(Interpolation::Harmonic),
        ] {
            for (n, s, p) in [(7, 4, 3), (20, 11, 13)] {
                let mut builder = ModelBuilder::new("interfaces");
                builder.rhs(&c, rhs.clone()).unwrap();
                builder
                    .initial_condition(&c, Symbol::constant(0.0))
                    .boundary_conditions(
                        &c,
                        BoundaryCondition::no_flux(),
                        BoundaryCondition::neumann(Symbol::constant(1.0)),
                    );
                let mesh = cell_mesh(n, s, p);
                let system = discretize(&builder.build(), &mesh, &method).unwrap();
                let widths = mesh.combine(&SubDomain::THROUGH_CELL).unwrap().widths();

                let size = n + s + p;
                let y = DVector::from_fn(size, |i, _| (i as f64 * 0.37).sin() + 0.1 * i as f64);
                let f = system.rhs_algebraic(0.0, &y).unwrap();
                // Interior fluxes cancel, leaving the boundary flux through the right edge.
                assert_relative_eq!(f.dot(&widths), 3.0, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn linear_profile_is_steady_under_dirichlet_conditions() {
        let (_, model) = diffusion(
            BoundaryCondition::dirichlet(Symbol::constant(0.0)),
            BoundaryCondition::dirichlet(Symbol::constant(1.0)),
        );
        let mesh = separator_mesh(8);
        let system = discretize(&model, &mesh, &FiniteVolume::default()).unwrap();
        let SubMesh::OneD(submesh) = mesh.submesh(SubDomain::Separator).unwrap() else {
            panic!("separator is one-dimensional");
        };
        let y = submesh.nodes().clone();
        let f = system.rhs_algebraic(0.0, &y).unwrap();
        for value in f.iter() {
            assert_relative_eq!(*value, 0.0, epsilon = 1e-10);
        }

        let right = system.variable("c at right").unwrap();
        assert_relative_eq!(right.evaluate(0.0, &y).unwrap()[0], 1.0);
    }

    #[test]
    fn neumann_boundary_value_uses_the_flux() {
        let (_, model) = diffusion(
            BoundaryCondition::no_flux(),
            BoundaryCondition::neumann(Symbol::constant(2.0)),
        );
        let mesh = separator_mesh(4);
        let system = discretize(&model, &mesh, &FiniteVolume::default()).unwrap();
        let y = DVector::from_element(4, 3.0);
        let right = system.variable("c at right").unwrap();
        // Last node plus half a cell of the edge gradient.
        assert_relative_eq!(right.evaluate(0.0, &y).unwrap()[0], 3.25);
        assert_eq!(right.location(), Location::Scalar);
    }

    #[test]
    fn neumann_gradient_points_along_increasing_x_at_both_edges() {
        let c = Variable::new("c", Domain::single(SubDomain::Separator));
        let mut builder = ModelBuilder::new("left flux");
        builder
            .rhs(&c, c.symbol().grad().unwrap().div().unwrap())
            .unwrap();
        builder
            .initial_condition(&c, Symbol::constant(1.0))
            .boundary_conditions(
                &c,
                BoundaryCondition::neumann(Symbol::constant(2.0)),
                BoundaryCondition::neumann(Symbol::constant(2.0)),
            )
            .variable("c at left", c.symbol().boundary_value(Side::Left).unwrap())
            .variable("c at right", c.symbol().boundary_value(Side::Right).unwrap());
        let mesh = separator_mesh(4);
        let system = discretize(&builder.build(), &mesh, &FiniteVolume::default()).unwrap();
        let y = DVector::from_element(4, 3.0);

        let left = system.variable("c at left").unwrap();
        let right = system.variable("c at right").unwrap();
        assert_relative_eq!(left.evaluate(0.0, &y).unwrap()[0], 2.75);
        assert_relative_eq!(right.evaluate(0.0, &y).unwrap()[0], 3.25);

        // The same gradient enters on the left and leaves on the right.
        let f = system.rhs_algebraic(0.0, &y).unwrap();
        assert_relative_eq!(f.sum() * 0.25, 0.0, epsilon = 1e-12);
        assert_relative_eq!(f[0], -8.0, epsilon = 1e-12);
        assert_relative_eq!(f[3], 8.0, epsilon = 1e-12);
    }

    #[test]
    fn discretizing_twice_gives_equal_systems() {
        let (_, model) = diffusion(
            BoundaryCondition::no_flux(),
            BoundaryCondition::neumann(Symbol::constant(1.0)),
        );
        let mesh = separator_mesh(6);
        let first = discretize(&model, &mesh, &FiniteVolume::default()).unwrap();
        let second = discretize(&model, &mesh, &FiniteVolume::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn particles_conserve_flux_in_every_secondary_block() {
        let domain = Domain::single(SubDomain::NegativeParticle)
            .with_secondary(vec![SubDomain::NegativeElectrode]);
        let c = Variable::new("c_s", domain);
        let rhs = c.symbol().grad().unwrap().div().unwrap();
        let mut builder = ModelBuilder::new("particles");
        builder.rhs(&c, rhs.clone()).unwrap();
        builder
            .initial_condition(&c, Symbol::constant(0.5))
            .boundary_conditions(
                &c,
                BoundaryCondition::no_flux(),
                BoundaryCondition::neumann(Symbol::constant(-1.0)),
            )
            .variable("uptake", rhs.integral().unwrap());
        let model = builder.build();

        let geometry = Geometry::new()
            .with_extent(SubDomain::NegativeElectrode, 0.0, 0.4)
            .unwrap()
            .with_extent(SubDomain::NegativeParticle, 0.0, 1.0)
            .unwrap();
        let points = Points::empty()
            .with(PointKey::Xn, 3)
            .unwrap()
            .with(PointKey::Rn, 5)
            .unwrap();
        let mesh = Mesh::new(&geometry, &points).unwrap();
        let system = discretize(&model, &mesh, &FiniteVolume::default()).unwrap();
        assert_eq!(system.size(), 15);

        let y = DVector::from_fn(15, |i, _| 0.1 * i as f64);
        let uptake = system
            .variable("uptake")
            .unwrap()
            .evaluate(0.0, &y)
            .unwrap();
        assert_eq!(uptake.len(), 3);
        for value in uptake.iter() {
            assert_relative_eq!(*value, -4.0 * PI, epsilon = 1e-10);
        }
    }

    #[test]
    fn unprocessed_parameters_are_rejected() {
        let a = Variable::new("a", Domain::scalar());
        let mut builder = ModelBuilder::new("decay");
        builder
            .rhs(&a, Symbol::parameter("rate").times(&a.symbol()).unwrap())
            .unwrap();
        builder.initial_condition(&a, Symbol::constant(1.0));
        let err = discretize(&builder.build(), &separator_mesh(2), &FiniteVolume::default())
            .unwrap_err();
        assert_eq!(err, DiscretizationError::UnprocessedParameter("rate".into()));
    }

    #[test]
    fn initial_conditions_must_not_read_states() {
        let a = Variable::new("a", Domain::scalar());
        let b = Variable::new("b", Domain::scalar());
        let mut builder = ModelBuilder::new("pair");
        builder.rhs(&a, b.symbol()).unwrap();
        builder.rhs(&b, a.symbol()).unwrap();
        builder
            .initial_condition(&a, b.symbol())
            .initial_condition(&b, Symbol::constant(0.0));
        let err = discretize(&builder.build(), &separator_mesh(2), &FiniteVolume::default())
            .unwrap_err();
        assert!(matches!(
            err,
            DiscretizationError::InitialConditionDependsOnState(_)
        ));
    }

    #[test]
    fn algebraic_rows_have_zero_mass() {
        let a = Variable::new("a", Domain::scalar());
        let b = Variable::new("b", Domain::scalar());
        let mut builder = ModelBuilder::new("dae");
        builder.rhs(&a, b.symbol() * -1.0).unwrap();
        builder
            .algebraic(&b, b.symbol().minus(&(a.symbol() * 2.0)).unwrap())
            .unwrap();
        builder
            .initial_condition(&a, Symbol::constant(1.0))
            .initial_condition(&b, Symbol::constant(2.0));
        let system =
            discretize(&builder.build(), &separator_mesh(2), &FiniteVolume::default()).unwrap();
        assert_eq!(system.mass(), &DVector::from_vec(vec![1.0, 0.0]));
        assert!(system.is_algebraic(1));
        assert_eq!(system.algebraic_size(), 1);
    }

    #[test]
    fn planar_collector_is_not_implemented() {
        let phi = Variable::new("phi", Domain::single(SubDomain::CurrentCollector));
        let mut builder = ModelBuilder::new("collector");
        builder
            .algebraic(&phi, phi.symbol().grad().unwrap().div().unwrap())
            .unwrap();
        builder
            .initial_condition(&phi, Symbol::constant(0.0))
            .boundary_conditions(
                &phi,
                BoundaryCondition::dirichlet(Symbol::constant(0.0)),
                BoundaryCondition::no_flux(),
            );
        let geometry = Geometry::new()
            .with_extent(SubDomain::CurrentCollector, 0.0, 1.0)
            .unwrap()
            .with_collector(CollectorGeometry::Plane {
                width: 1.0,
                height: 1.0,
            });
        let points = Points::empty()
            .with(PointKey::Y, 3)
            .unwrap()
            .with(PointKey::Z, 3)
            .unwrap();
        let mesh = Mesh::new(&geometry, &points).unwrap();
        let err = discretize(&builder.build(), &mesh, &FiniteVolume::default()).unwrap_err();
        assert!(matches!(err, DiscretizationError::NotImplemented(_)));
    }
}

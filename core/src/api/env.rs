use std::fmt;
use std::sync::Arc;

use super::error::PlanError;
use super::options::PlanOptions;
use super::program::Program;
use crate::activation::MapActivation;
use crate::ast::{CheckedExpr, Expr};
use crate::interpreter::{Container, NameResolver, Planner};
use crate::overloads::Registry;
use crate::types::{DefaultTypeAdapter, TypeAdapter, TypeProvider, TypeRegistry};

/// Everything the planner needs: overloads, host types, value adapter and
/// namespace resolution. Immutable once built and cheap to clone.
///
/// ```
/// use celeste_core::api::Env;
/// use celeste_core::ast::ExprBuilder;
/// use celeste_core::Val;
///
/// let env = Env::new();
/// let b = ExprBuilder::new();
/// let expr = b.binary("_+_", b.ident("x"), b.literal(1i64));
/// let program = env.plan(&expr.into()).expect("plans");
/// let vars = env.activation().bind("x", 41i64);
/// assert_eq!(program.eval(&vars), Val::Int(42));
/// ```
#[derive(Clone)]
pub struct Env {
    registry: Arc<Registry>,
    provider: Arc<dyn TypeProvider>,
    adapter: Arc<dyn TypeAdapter>,
    resolver: Arc<dyn NameResolver>,
    options: PlanOptions,
}

impl Env {
    /// Environment with the standard library, no host types and the root
    /// namespace.
    pub fn new() -> Env {
        Env::builder().build()
    }

    pub fn builder() -> EnvBuilder {
        EnvBuilder::default()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn provider(&self) -> &Arc<dyn TypeProvider> {
        &self.provider
    }

    pub fn adapter(&self) -> &Arc<dyn TypeAdapter> {
        &self.adapter
    }

    pub fn options(&self) -> PlanOptions {
        self.options
    }

    /// An empty activation converting native bindings with this
    /// environment's adapter.
    pub fn activation(&self) -> MapActivation {
        MapActivation::with_adapter(self.adapter.clone())
    }

    /// Compiles a checked expression into a reusable program.
    pub fn plan(&self, checked: &CheckedExpr) -> Result<Program, PlanError> {
        let planner = Planner::new(
            &self.registry,
            &self.provider,
            self.resolver.as_ref(),
            checked,
            &self.options,
        );
        let root = planner.plan()?;
        let program = Program::new(root);
        tracing::debug!(
            nodes = program.node_count(),
            cost = %program.cost(),
            optimize = self.options.optimize,
            track_state = self.options.observes(),
            exhaustive = self.options.exhaustive,
            "Planned program"
        );
        Ok(program)
    }

    /// Compiles an expression that went through no checker.
    pub fn plan_unchecked(&self, expr: Expr) -> Result<Program, PlanError> {
        self.plan(&CheckedExpr::unchecked(expr))
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Assembles an [`Env`].
#[derive(Default)]
pub struct EnvBuilder {
    registry: Option<Arc<Registry>>,
    provider: Option<Arc<dyn TypeProvider>>,
    adapter: Option<Arc<dyn TypeAdapter>>,
    resolver: Option<Arc<dyn NameResolver>>,
    options: PlanOptions,
}

impl EnvBuilder {
    /// Overloads available to programs. Defaults to [`Registry::standard`].
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(Arc::new(registry));
        self
    }

    /// Shares a registry between environments.
    pub fn shared_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn types(mut self, provider: impl TypeProvider + 'static) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    pub fn adapter(mut self, adapter: impl TypeAdapter + 'static) -> Self {
        self.adapter = Some(Arc::new(adapter));
        self
    }

    /// Namespace unchecked identifiers are resolved in.
    pub fn container(self, name: &str) -> Self {
        self.name_resolver(Container::new(name))
    }

    pub fn name_resolver(mut self, resolver: impl NameResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn options(mut self, options: PlanOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Env {
        let env = Env {
            registry: self
                .registry
                .unwrap_or_else(|| Arc::new(Registry::standard())),
            provider: self
                .provider
                .unwrap_or_else(|| Arc::new(TypeRegistry::new())),
            adapter: self.adapter.unwrap_or_else(|| Arc::new(DefaultTypeAdapter)),
            resolver: self.resolver.unwrap_or_else(|| Arc::new(Container::root())),
            options: self.options,
        };
        tracing::debug!(registry = ?env.registry, "Built environment");
        env
    }
}

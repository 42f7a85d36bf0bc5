//! Declaration/codegen scheduler.
//!
//! Classes are compiled in two phases so any class may refer to any other
//! class of the unit, regardless of source order:
//!
//! ```text
//!  declare(A)  declare(B)                       flush_all()
//!      │           │                                 │
//!      ▼           ▼                                 ▼
//!  ┌────────┐  ┌────────┐     ┌──────────────────────────────────────────┐
//!  │ header │  │ header │ ──► │ queue: Members(A) Members(B) │ Ctor(A.0) │
//!  │ eager  │  │ eager  │     │        Method(A.1) Ctor(B.0) ...         │
//!  └────────┘  └────────┘     └──────────────────────────────────────────┘
//! ```
//!
//! Declaring a class parses and registers its header immediately and queues
//! a member task. Flushing first checks the class hierarchy, then drains the
//! queue in FIFO order: each member task declares fields and signatures and
//! queues one task per body, so every signature in the unit is known before
//! the first body compiles.
//!
//! # Example
//!
//! ```ignore
//! let mut scheduler = Scheduler::new(CompilerOptions::default())?;
//! scheduler.declare("class A {\n var b: B\n}", Some("A.mu"))?;
//! scheduler.declare("class B {\n}", Some("B.mu"))?;
//! scheduler.flush_all()?;
//! let classes = scheduler.finish()?;
//! ```

use std::collections::VecDeque;

use muesli_core::{ClassId, CompilationError, MethodId, MethodSymbol, Result, Span};
use muesli_registry::SymbolRegistry;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::artifact::{ClassArtifact, ClassHeader, ClassWriter, MethodArtifact};
use crate::bytecode::ConstantPool;
use crate::config::CompilerOptions;
use crate::constructor::ConstructorCompiler;
use crate::context::CompilationContext;
use crate::expr::{ExprCompiler, ReferenceCompiler};
use crate::method::compile_method;
use crate::passes::{BodyTask, MemberPass, declare_class};
use crate::source::{SourceLine, split_lines};

/// Deferred work waiting for [`Scheduler::flush_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingTask {
    /// Declare the members of a registered class.
    Members { class: ClassId, body: Vec<SourceLine> },
    Constructor { method: MethodId, body: Vec<SourceLine> },
    DefaultConstructor { method: MethodId },
    Method { method: MethodId, body: Vec<SourceLine> },
}

impl PendingTask {
    /// Class the task belongs to.
    pub fn class(&self) -> ClassId {
        match self {
            PendingTask::Members { class, .. } => *class,
            PendingTask::Constructor { method, .. }
            | PendingTask::DefaultConstructor { method }
            | PendingTask::Method { method, .. } => method.class,
        }
    }

    fn from_body(class: ClassId, task: BodyTask) -> Self {
        match task {
            BodyTask::Constructor { index, body } => PendingTask::Constructor {
                method: MethodId::new(class, index),
                body,
            },
            BodyTask::DefaultConstructor { index } => PendingTask::DefaultConstructor {
                method: MethodId::new(class, index),
            },
            BodyTask::Method { index, body } => PendingTask::Method {
                method: MethodId::new(class, index),
                body,
            },
        }
    }
}

/// Drives the compilation of one unit.
pub struct Scheduler {
    options: CompilerOptions,
    registry: SymbolRegistry,
    writers: FxHashMap<ClassId, ClassWriter>,
    /// Declared classes in declaration order, with their header line.
    declared: Vec<(ClassId, Span)>,
    queue: VecDeque<PendingTask>,
    expr: Box<dyn ExprCompiler>,
}

impl Scheduler {
    /// Create a scheduler with the configured builtins preloaded.
    pub fn new(options: CompilerOptions) -> Result<Self> {
        let registry = SymbolRegistry::with_builtins(&options.builtins)?;
        Ok(Self {
            options,
            registry,
            writers: FxHashMap::default(),
            declared: Vec::new(),
            queue: VecDeque::new(),
            expr: Box::new(ReferenceCompiler::new()),
        })
    }

    /// Use `expr` for every expression in the unit.
    pub fn with_expr_compiler(mut self, expr: Box<dyn ExprCompiler>) -> Self {
        self.expr = expr;
        self
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn registry(&self) -> &SymbolRegistry {
        &self.registry
    }

    // ==========================================================================
    // Declaration
    // ==========================================================================

    /// Declare the class in `source`.
    ///
    /// The header is parsed, registered and written immediately; members and
    /// bodies wait for [`flush_all`](Self::flush_all).
    pub fn declare(&mut self, source: &str, file_name: Option<&str>) -> Result<ClassId> {
        let lines = split_lines(source)?;
        let declared = declare_class(&self.registry, &self.options, lines, file_name)?;
        let symbol = declared.symbol;

        let mut writer = ClassWriter::new(self.options.class_version);
        writer.visit(ClassHeader {
            name: symbol.name.clone(),
            modifiers: symbol.modifiers,
            parent: symbol.parent.clone(),
            interfaces: symbol.interfaces.clone(),
            source_file: symbol.source_file.clone(),
        })?;

        let name = symbol.name.clone();
        let id = self.registry.register(symbol)?;
        debug!(class = %name, %id, "declared class");
        self.writers.insert(id, writer);
        self.declared.push((id, declared.span));
        self.enqueue(PendingTask::Members {
            class: id,
            body: declared.body,
        });
        Ok(id)
    }

    fn enqueue(&mut self, task: PendingTask) {
        debug!(class = %task.class(), queued = self.queue.len() + 1, "queued task");
        self.queue.push_back(task);
    }

    /// Number of queued tasks.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Number of queued tasks belonging to class `name`.
    pub fn pending_for(&self, name: &str) -> usize {
        let Some(id) = self.registry.id_of(name) else {
            return 0;
        };
        self.queue.iter().filter(|task| task.class() == id).count()
    }

    /// Header already written for class `name`.
    pub fn header(&self, name: &str) -> Option<&ClassHeader> {
        let id = self.registry.id_of(name)?;
        self.writers.get(&id).and_then(ClassWriter::header)
    }

    // ==========================================================================
    // Code generation
    // ==========================================================================

    /// Run every queued task, including the tasks they queue.
    ///
    /// The first error aborts the flush. Flushing an empty queue does nothing.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn flush_all(&mut self) -> Result<()> {
        if self.queue.is_empty() {
            return Ok(());
        }
        self.check_hierarchy()?;
        while let Some(task) = self.queue.pop_front() {
            self.run(task)?;
        }
        Ok(())
    }

    /// Every parent must be a registered, non-sealed class, and the
    /// hierarchy must be acyclic.
    fn check_hierarchy(&self) -> Result<()> {
        for &(id, span) in &self.declared {
            let class = self.registry.class(id)?;
            let Some(parent_name) = class.parent.as_deref() else {
                continue;
            };
            let parent = self
                .registry
                .lookup(parent_name)
                .ok_or_else(|| CompilationError::unknown_type(parent_name, span))?;
            if parent.is_interface() {
                return Err(CompilationError::resolution(
                    format!(
                        "'{}' cannot extend interface '{}'",
                        class.simple_name, parent.name
                    ),
                    span,
                ));
            }
            if parent.is_final() {
                return Err(CompilationError::type_mismatch(
                    format!(
                        "'{}' cannot extend sealed class '{}'",
                        class.simple_name, parent.name
                    ),
                    span,
                ));
            }
        }
        if self.registry.hierarchy().is_cyclic() {
            let span = self.declared.first().map_or(Span::synthetic(), |d| d.1);
            return Err(CompilationError::resolution(
                "cyclic inheritance in the compilation unit",
                span,
            ));
        }
        Ok(())
    }

    fn run(&mut self, task: PendingTask) -> Result<()> {
        let class = task.class();
        debug!(%class, "running task");
        match task {
            PendingTask::Members { class, body } => {
                let members = MemberPass::new(&mut self.registry, class).run(&body)?;
                let writer = self.writer(class)?;
                for field in members.fields {
                    writer.visit_field(field)?;
                }
                for method in members.abstract_methods {
                    writer.visit_method(method)?;
                }
                for task in members.bodies {
                    self.enqueue(PendingTask::from_body(class, task));
                }
            }
            PendingTask::Constructor { method, body } => {
                self.compile_body(method, |ctx, expr, pool, symbol| {
                    ConstructorCompiler::new(ctx, expr).compile(pool, symbol, &body)
                })?;
            }
            PendingTask::DefaultConstructor { method } => {
                self.compile_body(method, |ctx, expr, pool, symbol| {
                    ConstructorCompiler::new(ctx, expr).compile_default(pool, symbol)
                })?;
            }
            PendingTask::Method { method, body } => {
                self.compile_body(method, |ctx, expr, pool, symbol| {
                    compile_method(ctx, expr, pool, symbol, &body)
                })?;
            }
        }
        Ok(())
    }

    fn writer(&mut self, class: ClassId) -> Result<&mut ClassWriter> {
        self.writers
            .get_mut(&class)
            .ok_or_else(|| CompilationError::internal(format!("no writer for class {}", class)))
    }

    /// Compile one body against the complete registry, then store the
    /// finished symbol back and write its artifact.
    fn compile_body<F>(&mut self, id: MethodId, compile: F) -> Result<()>
    where
        F: FnOnce(
            &CompilationContext<'_>,
            &dyn ExprCompiler,
            &mut ConstantPool,
            MethodSymbol,
        ) -> Result<(MethodSymbol, MethodArtifact)>,
    {
        let writer = self
            .writers
            .get_mut(&id.class)
            .ok_or_else(|| CompilationError::internal(format!("no writer for class {}", id.class)))?;
        let (symbol, artifact) = {
            let class = self.registry.class(id.class)?;
            let method = self.registry.method(id)?.clone();
            let ctx = CompilationContext::new(&self.registry, class, &self.options);
            compile(&ctx, self.expr.as_ref(), writer.pool_mut(), method)?
        };
        writer.visit_method(artifact)?;
        *self.registry.method_mut(id)? = symbol;
        Ok(())
    }

    /// Flush, then collect every class artifact in declaration order.
    pub fn finish(mut self) -> Result<Vec<ClassArtifact>> {
        self.flush_all()?;
        let mut artifacts = Vec::with_capacity(self.declared.len());
        for (id, _) in &self.declared {
            let writer = self.writers.remove(id).ok_or_else(|| {
                CompilationError::internal(format!("no writer for class {}", id))
            })?;
            artifacts.push(writer.finish()?);
        }
        Ok(artifacts)
    }
}

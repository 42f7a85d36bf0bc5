//! Compilation unit API.
//!
//! A [`Unit`] collects the source files of one compilation unit and builds
//! them together, so classes may refer to each other in any order.
//!
//! # Example
//!
//! ```ignore
//! use muesli::Unit;
//!
//! let mut unit = Unit::new();
//! unit.add_source("Point.mu", r#"
//!     package geo
//!     class Point {
//!         var x: int
//!         constructor Point(x: int) {
//!             super()
//!             this.x = x
//!         }
//!     }
//! "#)?;
//! unit.add_source("Circle.mu", "package geo\nclass Circle {\n var center: Point\n}")?;
//!
//! unit.build()?;
//! let point = unit.class("geo/Point").unwrap();
//! ```

use muesli_compiler::{ClassArtifact, CompilationError, CompilerOptions, Scheduler};
use rustc_hash::FxHashSet;
use tracing::debug;
use xxhash_rust::xxh64::xxh64;

/// One source file of the unit.
#[derive(Debug, Clone)]
struct SourceFile {
    name: String,
    text: String,
    hash: u64,
}

/// A set of source files compiled together.
///
/// 1. Create a unit with [`Unit::new`] or [`Unit::with_options`]
/// 2. Add source files with [`add_source`](Unit::add_source)
/// 3. Build with [`build`](Unit::build)
/// 4. Read the class artifacts
#[derive(Debug, Default)]
pub struct Unit {
    options: CompilerOptions,

    /// Source files in the order they were added
    sources: Vec<SourceFile>,

    /// Files changed since the last build
    dirty_files: FxHashSet<String>,

    /// Artifacts of the last successful build
    artifacts: Vec<ClassArtifact>,

    is_built: bool,
}

impl Unit {
    /// Create an empty unit with default options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CompilerOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    fn hash_source(source: &str) -> u64 {
        xxh64(source.as_bytes(), 0)
    }

    fn find(&self, filename: &str) -> Option<usize> {
        self.sources.iter().position(|s| s.name == filename)
    }

    /// Add a source file to the unit.
    ///
    /// # Errors
    ///
    /// Fails if the unit has already been built, or if a file with the same
    /// name was already added. Use [`update_source`](Unit::update_source) to
    /// change a file.
    pub fn add_source(
        &mut self,
        filename: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<(), UnitError> {
        if self.is_built {
            return Err(UnitError::AlreadyBuilt);
        }
        let filename = filename.into();
        if self.find(&filename).is_some() {
            return Err(UnitError::DuplicateFile(filename));
        }
        let text = source.into();
        let hash = Self::hash_source(&text);
        self.dirty_files.insert(filename.clone());
        self.sources.push(SourceFile {
            name: filename,
            text,
            hash,
        });
        Ok(())
    }

    /// Replace a source file and mark it for recompilation.
    ///
    /// Returns `true` if the text actually changed.
    pub fn update_source(
        &mut self,
        filename: impl AsRef<str>,
        source: impl Into<String>,
    ) -> Result<bool, UnitError> {
        let filename = filename.as_ref();
        let index = self
            .find(filename)
            .ok_or_else(|| UnitError::FileNotFound(filename.to_string()))?;
        let text = source.into();
        let hash = Self::hash_source(&text);
        let file = &mut self.sources[index];
        if file.hash == hash {
            return Ok(false);
        }
        file.text = text;
        file.hash = hash;
        self.dirty_files.insert(filename.to_string());
        Ok(true)
    }

    /// Whether files changed since the last build.
    pub fn has_pending_changes(&self) -> bool {
        !self.dirty_files.is_empty()
    }

    pub fn dirty_files(&self) -> &FxHashSet<String> {
        &self.dirty_files
    }

    /// Compile every source file.
    ///
    /// Class headers are declared file by file, then members and bodies are
    /// compiled once the whole unit is known. The first error aborts the
    /// build and no artifacts are kept.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn build(&mut self) -> Result<(), BuildError> {
        if self.is_built {
            return Err(BuildError::AlreadyBuilt);
        }
        if self.sources.is_empty() {
            return Err(BuildError::NoSources);
        }

        let mut scheduler = Scheduler::new(self.options.clone())?;
        for file in &self.sources {
            scheduler
                .declare(&file.text, Some(&file.name))
                .map_err(|error| BuildError::Declaration {
                    file: file.name.clone(),
                    error,
                })?;
        }
        self.artifacts = scheduler.finish()?;
        debug!(classes = self.artifacts.len(), "built unit");

        self.is_built = true;
        self.dirty_files.clear();
        Ok(())
    }

    /// Build again if any file changed since the last build.
    pub fn rebuild(&mut self) -> Result<(), BuildError> {
        if self.is_built && self.dirty_files.is_empty() {
            return Ok(());
        }
        self.is_built = false;
        self.artifacts.clear();
        self.build()
    }

    pub fn is_built(&self) -> bool {
        self.is_built
    }

    /// Artifacts of the last build, in source order.
    pub fn classes(&self) -> &[ClassArtifact] {
        &self.artifacts
    }

    /// Artifact of the class with fully qualified name `name`.
    pub fn class(&self, name: &str) -> Option<&ClassArtifact> {
        self.artifacts.iter().find(|c| c.name() == name)
    }

    pub fn class_count(&self) -> usize {
        self.artifacts.len()
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Reset to an empty unit, keeping the options.
    pub fn clear(&mut self) {
        self.sources.clear();
        self.dirty_files.clear();
        self.artifacts.clear();
        self.is_built = false;
    }
}

/// Errors from adding or updating sources.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UnitError {
    #[error("Unit has already been built. Use update_source() and rebuild() or clear() to start over.")]
    AlreadyBuilt,

    #[error("File '{0}' not found in unit")]
    FileNotFound(String),

    #[error("File '{0}' was already added to the unit")]
    DuplicateFile(String),
}

/// Errors from building a unit.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("No sources added to unit")]
    NoSources,

    #[error("Unit has already been built")]
    AlreadyBuilt,

    /// A file's header failed to declare.
    #[error("{file}: {error}")]
    Declaration {
        file: String,
        #[source]
        error: CompilationError,
    },

    /// Member declaration or code generation failed.
    #[error(transparent)]
    Compilation(#[from] CompilationError),
}

impl BuildError {
    /// The underlying compilation error, if any.
    pub fn compilation_error(&self) -> Option<&CompilationError> {
        match self {
            BuildError::Declaration { error, .. } | BuildError::Compilation(error) => Some(error),
            BuildError::NoSources | BuildError::AlreadyBuilt => None,
        }
    }
}

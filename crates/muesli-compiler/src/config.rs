//! Compiler configuration.

use muesli_core::OBJECT_CLASS;
use muesli_registry::DEFAULT_BUILTINS;

/// Default class-file major version.
pub const DEFAULT_CLASS_VERSION: u16 = 52;

/// Options shared by every class of a compilation unit.
///
/// ```
/// use muesli_compiler::CompilerOptions;
///
/// let options = CompilerOptions::default()
///     .with_class_version(55)
///     .with_debug_info(false);
/// assert_eq!(options.class_version, 55);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Major version written into every class artifact.
    pub class_version: u16,
    /// Parent of classes declared without `extends`.
    pub root_parent: String,
    /// Emit local-variable and line-number tables.
    pub debug_info: bool,
    /// Platform classes preloaded into the registry.
    pub builtins: Vec<String>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            class_version: DEFAULT_CLASS_VERSION,
            root_parent: OBJECT_CLASS.to_string(),
            debug_info: true,
            builtins: DEFAULT_BUILTINS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CompilerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class_version(mut self, version: u16) -> Self {
        self.class_version = version;
        self
    }

    pub fn with_root_parent(mut self, parent: impl Into<String>) -> Self {
        self.root_parent = parent.into();
        self
    }

    pub fn with_debug_info(mut self, enabled: bool) -> Self {
        self.debug_info = enabled;
        self
    }

    /// Replace the builtin class list.
    pub fn with_builtins(mut self, builtins: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.builtins = builtins.into_iter().map(Into::into).collect();
        self
    }
}

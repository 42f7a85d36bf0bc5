//! Return statement compilation.

use muesli_core::{CompilationError, Descriptor, Result, Span};

use super::StmtCompiler;

impl<'a, 'ctx, 'pool> StmtCompiler<'a, 'ctx, 'pool> {
    /// Compile `return [value]`.
    ///
    /// A value is required exactly when the method does not return void,
    /// and must be assignable to the return type. The return instruction
    /// follows the declared type, so string literals return by reference.
    pub(super) fn compile_return(&mut self, value: &str, span: Span) -> Result<()> {
        let return_type = self.emitter.method().return_type.clone();
        let value = value.trim();

        match (value.is_empty(), return_type.is_void()) {
            (true, true) => self.emitter.emit_return(&Descriptor::VOID),
            (false, false) => {
                self.compile_value(value, &return_type, span)?;
                self.emitter.emit_return(&return_type)
            }
            (false, true) => Err(CompilationError::protocol(
                format!(
                    "void method '{}' cannot return a value",
                    self.emitter.method().name
                ),
                span,
            )),
            (true, false) => Err(CompilationError::protocol(
                format!(
                    "method '{}' must return a value of type '{}'",
                    self.emitter.method().name,
                    return_type.display_name()
                ),
                span,
            )),
        }
    }
}

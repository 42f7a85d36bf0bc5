//! Class artifacts.
//!
//! A [`ClassWriter`] collects the output for one class: the header is
//! written eagerly when the class is declared, members as their bodies
//! finish compiling. [`ClassWriter::finish`] yields the immutable
//! [`ClassArtifact`].

use muesli_core::{AccessFlags, CompilationError, LiteralValue, Result};

use crate::bytecode::{CodeBuffer, ConstantPool, LineNumberEntry};

/// Debug entry describing where a local variable lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariableEntry {
    pub name: String,
    pub descriptor: String,
    pub start_pc: u16,
    pub length: u16,
    pub slot: u16,
}

/// A compiled field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldArtifact {
    pub name: String,
    pub descriptor: String,
    pub modifiers: AccessFlags,
    /// Value of a static constant, stored instead of initializer code.
    pub constant_value: Option<LiteralValue>,
}

/// A compiled method or constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodArtifact {
    pub name: String,
    pub descriptor: String,
    pub modifiers: AccessFlags,
    pub max_stack: u16,
    pub max_locals: u16,
    /// `None` for abstract methods.
    pub code: Option<CodeBuffer>,
    pub local_variables: Vec<LocalVariableEntry>,
}

impl MethodArtifact {
    pub fn line_numbers(&self) -> &[LineNumberEntry] {
        self.code.as_ref().map_or(&[], |code| code.line_numbers())
    }

    /// Debug entry for the local named `name`.
    pub fn local(&self, name: &str) -> Option<&LocalVariableEntry> {
        self.local_variables.iter().find(|l| l.name == name)
    }
}

/// Class header fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassHeader {
    pub name: String,
    pub modifiers: AccessFlags,
    pub parent: Option<String>,
    pub interfaces: Vec<String>,
    pub source_file: Option<String>,
}

/// The complete output for one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassArtifact {
    pub version: u16,
    pub header: ClassHeader,
    pub constant_pool: ConstantPool,
    pub fields: Vec<FieldArtifact>,
    pub methods: Vec<MethodArtifact>,
}

impl ClassArtifact {
    pub fn name(&self) -> &str {
        &self.header.name
    }

    pub fn field(&self, name: &str) -> Option<&FieldArtifact> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Method by name and descriptor.
    pub fn method(&self, name: &str, descriptor: &str) -> Option<&MethodArtifact> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.descriptor == descriptor)
    }

    /// All methods and constructors named `name`.
    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MethodArtifact> {
        self.methods.iter().filter(move |m| m.name == name)
    }
}

/// Accumulates the artifact of one class.
#[derive(Debug)]
pub struct ClassWriter {
    version: u16,
    header: Option<ClassHeader>,
    pool: ConstantPool,
    fields: Vec<FieldArtifact>,
    methods: Vec<MethodArtifact>,
}

impl ClassWriter {
    pub fn new(version: u16) -> Self {
        Self {
            version,
            header: None,
            pool: ConstantPool::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Write the class header. Each writer takes exactly one header.
    pub fn visit(&mut self, header: ClassHeader) -> Result<()> {
        if let Some(existing) = &self.header {
            return Err(CompilationError::internal(format!(
                "class header for '{}' written twice",
                existing.name
            )));
        }
        self.pool.class(&header.name)?;
        if let Some(parent) = &header.parent {
            self.pool.class(parent)?;
        }
        for interface in &header.interfaces {
            self.pool.class(interface)?;
        }
        self.header = Some(header);
        Ok(())
    }

    pub fn header(&self) -> Option<&ClassHeader> {
        self.header.as_ref()
    }

    pub fn pool(&self) -> &ConstantPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut ConstantPool {
        &mut self.pool
    }

    pub fn visit_field(&mut self, field: FieldArtifact) -> Result<()> {
        self.pool.utf8(&field.name)?;
        self.pool.utf8(&field.descriptor)?;
        if let Some(value) = &field.constant_value {
            self.pool.literal(value)?;
        }
        self.fields.push(field);
        Ok(())
    }

    pub fn visit_method(&mut self, method: MethodArtifact) -> Result<()> {
        self.pool.utf8(&method.name)?;
        self.pool.utf8(&method.descriptor)?;
        self.methods.push(method);
        Ok(())
    }

    pub fn methods(&self) -> &[MethodArtifact] {
        &self.methods
    }

    /// Finish the class. Fails if no header was written.
    pub fn finish(self) -> Result<ClassArtifact> {
        let header = self
            .header
            .ok_or_else(|| CompilationError::internal("class finished without a header"))?;
        Ok(ClassArtifact {
            version: self.version,
            header,
            constant_pool: self.pool,
            fields: self.fields,
            methods: self.methods,
        })
    }
}

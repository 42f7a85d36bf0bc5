//! Per-class constant pool.
//!
//! Entries are addressed by 1-based `u16` indices. Long and double entries
//! occupy two indices, the second of which is unusable. Identical entries
//! are stored once.

use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;

use muesli_core::{CompilationError, LiteralValue, Result};

/// Values stored in the constant pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PoolEntry {
    Utf8(String),
    Integer(i32),
    Float(OrderedFloat<f32>),
    Long(i64),
    Double(OrderedFloat<f64>),
    /// Index of the class name's `Utf8` entry.
    Class(u16),
    /// Index of the string's `Utf8` entry.
    String(u16),
    /// Name and descriptor `Utf8` indices.
    NameAndType(u16, u16),
    /// Class and name-and-type indices.
    FieldRef(u16, u16),
    MethodRef(u16, u16),
    InterfaceMethodRef(u16, u16),
}

impl PoolEntry {
    /// Whether this entry takes two pool indices.
    pub fn is_wide(&self) -> bool {
        matches!(self, PoolEntry::Long(_) | PoolEntry::Double(_))
    }
}

/// Constant pool with deduplication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstantPool {
    /// Entry at index `i + 1`; `None` for the upper half of wide entries.
    slots: Vec<Option<PoolEntry>>,
    index: FxHashMap<PoolEntry, u16>,
}

impl ConstantPool {
    /// Create a new empty constant pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or get an existing entry, returns its index.
    pub fn add(&mut self, entry: PoolEntry) -> Result<u16> {
        if let Some(&idx) = self.index.get(&entry) {
            return Ok(idx);
        }
        let width = if entry.is_wide() { 2 } else { 1 };
        let idx = u16::try_from(self.slots.len() + 1)
            .ok()
            .filter(|idx| idx.checked_add(width - 1).is_some())
            .ok_or_else(|| CompilationError::internal("constant pool overflow"))?;
        let wide = entry.is_wide();
        self.slots.push(Some(entry.clone()));
        if wide {
            self.slots.push(None);
        }
        self.index.insert(entry, idx);
        Ok(idx)
    }

    pub fn utf8(&mut self, text: &str) -> Result<u16> {
        self.add(PoolEntry::Utf8(text.to_string()))
    }

    /// Class entry for a slash-separated class path.
    pub fn class(&mut self, path: &str) -> Result<u16> {
        let name = self.utf8(path)?;
        self.add(PoolEntry::Class(name))
    }

    pub fn string(&mut self, value: &str) -> Result<u16> {
        let text = self.utf8(value)?;
        self.add(PoolEntry::String(text))
    }

    pub fn integer(&mut self, value: i32) -> Result<u16> {
        self.add(PoolEntry::Integer(value))
    }

    pub fn float(&mut self, value: f32) -> Result<u16> {
        self.add(PoolEntry::Float(OrderedFloat(value)))
    }

    pub fn long(&mut self, value: i64) -> Result<u16> {
        self.add(PoolEntry::Long(value))
    }

    pub fn double(&mut self, value: f64) -> Result<u16> {
        self.add(PoolEntry::Double(OrderedFloat(value)))
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> Result<u16> {
        let name = self.utf8(name)?;
        let descriptor = self.utf8(descriptor)?;
        self.add(PoolEntry::NameAndType(name, descriptor))
    }

    pub fn field_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> Result<u16> {
        let class = self.class(owner)?;
        let nat = self.name_and_type(name, descriptor)?;
        self.add(PoolEntry::FieldRef(class, nat))
    }

    pub fn method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> Result<u16> {
        let class = self.class(owner)?;
        let nat = self.name_and_type(name, descriptor)?;
        self.add(PoolEntry::MethodRef(class, nat))
    }

    pub fn interface_method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> Result<u16> {
        let class = self.class(owner)?;
        let nat = self.name_and_type(name, descriptor)?;
        self.add(PoolEntry::InterfaceMethodRef(class, nat))
    }

    /// Loadable entry for a literal, or `None` for `null`.
    pub fn literal(&mut self, value: &LiteralValue) -> Result<Option<u16>> {
        let idx = match value {
            LiteralValue::Boolean(b) => self.integer(i32::from(*b))?,
            LiteralValue::Int(v) => self.integer(*v)?,
            LiteralValue::Char(c) => self.integer(i32::from(*c))?,
            LiteralValue::Long(v) => self.long(*v)?,
            LiteralValue::Float(v) => self.add(PoolEntry::Float(*v))?,
            LiteralValue::Double(v) => self.add(PoolEntry::Double(*v))?,
            LiteralValue::String(s) => self.string(s)?,
            LiteralValue::Null => return Ok(None),
        };
        Ok(Some(idx))
    }

    /// Get an entry by index.
    pub fn get(&self, index: u16) -> Option<&PoolEntry> {
        let position = usize::from(index).checked_sub(1)?;
        self.slots.get(position)?.as_ref()
    }

    /// Text of the `Utf8` entry at `index`.
    pub fn utf8_at(&self, index: u16) -> Option<&str> {
        match self.get(index)? {
            PoolEntry::Utf8(text) => Some(text),
            _ => None,
        }
    }

    /// `(owner, name, descriptor)` of a field or method reference.
    pub fn member_ref(&self, index: u16) -> Option<(&str, &str, &str)> {
        let (class, nat) = match self.get(index)? {
            PoolEntry::FieldRef(c, n)
            | PoolEntry::MethodRef(c, n)
            | PoolEntry::InterfaceMethodRef(c, n) => (*c, *n),
            _ => return None,
        };
        let PoolEntry::Class(owner) = self.get(class)? else {
            return None;
        };
        let PoolEntry::NameAndType(name, descriptor) = self.get(nat)? else {
            return None;
        };
        Some((
            self.utf8_at(*owner)?,
            self.utf8_at(*name)?,
            self.utf8_at(*descriptor)?,
        ))
    }

    /// Number of indices used, wide entries counting twice.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterate over `(index, entry)` pairs, skipping unusable indices.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &PoolEntry)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|entry| (i as u16 + 1, entry)))
    }
}

//! Modifier bitsets for classes, members and locals.
//!
//! Bit values follow the class-file access flag layout so the artifact
//! writer can persist them verbatim.

use bitflags::bitflags;

bitflags! {
    /// Access and property flags.
    ///
    /// `SUPER` shares its bit with method `SYNCHRONIZED`; the compiler only
    /// ever sets it on classes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SUPER = 0x0020;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const SYNTHETIC = 0x1000;
    }
}

impl AccessFlags {
    /// Mask of the mutually exclusive visibility flags.
    pub const VISIBILITY: AccessFlags = AccessFlags::PUBLIC
        .union(AccessFlags::PRIVATE)
        .union(AccessFlags::PROTECTED);

    #[inline]
    pub fn is_static(self) -> bool {
        self.contains(AccessFlags::STATIC)
    }

    #[inline]
    pub fn is_final(self) -> bool {
        self.contains(AccessFlags::FINAL)
    }

    #[inline]
    pub fn is_private(self) -> bool {
        self.contains(AccessFlags::PRIVATE)
    }

    #[inline]
    pub fn is_abstract(self) -> bool {
        self.contains(AccessFlags::ABSTRACT)
    }

    /// Whether any visibility flag is already set.
    #[inline]
    pub fn has_visibility(self) -> bool {
        self.intersects(AccessFlags::VISIBILITY)
    }
}

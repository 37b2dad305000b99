use std::fmt::{self, Display};

///
/// ScalarType
/// Primitive type of a scalar field.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScalarType {
    Bool,
    Int,
    Uint,
    Float,
    Text,
}

impl ScalarType {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float => "float",
            Self::Text => "text",
        }
    }
}

///
/// FieldShape
///
/// Runtime type shape reported by a field's Rust type.
/// Drives decoding, index-kind inference and the `index` legality check.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldShape {
    /// Primitive value; `optional` marks `Option<T>` (pointer-to-scalar).
    Scalar { ty: ScalarType, optional: bool },
    Embedded,
    Record,
    Records,
    Map,
}

impl FieldShape {
    #[must_use]
    pub const fn scalar(ty: ScalarType) -> Self {
        Self::Scalar {
            ty,
            optional: false,
        }
    }

    #[must_use]
    pub const fn optional(ty: ScalarType) -> Self {
        Self::Scalar { ty, optional: true }
    }

    #[must_use]
    pub const fn kind(self) -> FieldKind {
        match self {
            Self::Scalar { .. } => FieldKind::Scalar,
            Self::Embedded => FieldKind::EmbeddedStruct,
            Self::Record => FieldKind::PointerToRecord,
            Self::Records => FieldKind::SliceOfRecords,
            Self::Map => FieldKind::MapField,
        }
    }

    #[must_use]
    pub const fn scalar_type(self) -> Option<ScalarType> {
        match self {
            Self::Scalar { ty, .. } => Some(ty),
            _ => None,
        }
    }
}

///
/// FieldKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldKind {
    Scalar,
    EmbeddedStruct,
    PointerToRecord,
    SliceOfRecords,
    MapField,
}

///
/// IndexKind
///
/// How an indexed field is scored in its sorted-set index.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum IndexKind {
    #[default]
    None,
    Numeric,
    Boolean,
    Alphabetical,
}

impl IndexKind {
    /// Index kind implied by a scalar type.
    #[must_use]
    pub const fn for_scalar(ty: ScalarType) -> Self {
        match ty {
            ScalarType::Bool => Self::Boolean,
            ScalarType::Int | ScalarType::Uint | ScalarType::Float => Self::Numeric,
            ScalarType::Text => Self::Alphabetical,
        }
    }

    #[must_use]
    pub const fn is_indexed(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Extra key segment for index kinds that need a structure distinct
    /// from the plain `<model>:<field>` sorted set. Every current kind is a
    /// sorted set, so none do.
    #[must_use]
    pub const fn key_suffix(self) -> Option<&'static str> {
        None
    }
}

impl Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::None => "none",
            Self::Numeric => "numeric",
            Self::Boolean => "boolean",
            Self::Alphabetical => "alphabetical",
        };
        write!(f, "{label}")
    }
}

///
/// FieldDecl
///
/// One declared field as emitted by `#[derive(Model)]`: the Rust field
/// name, its raw option string (if any) and its shape. Options are
/// validated by the spec compiler, not here.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FieldDecl {
    pub name: &'static str,
    pub options: Option<&'static str>,
    pub shape: FieldShape,
}

impl FieldDecl {
    #[must_use]
    pub const fn new(name: &'static str, options: Option<&'static str>, shape: FieldShape) -> Self {
        Self {
            name,
            options,
            shape,
        }
    }
}

///
/// FieldModel
/// Compiled descriptor for one stored field.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldModel {
    /// Declared field identifier, unique within the type.
    pub name: &'static str,
    /// External hash field name.
    pub redis_name: &'static str,
    pub kind: FieldKind,
    pub index_kind: IndexKind,
    pub shape: FieldShape,
}

impl FieldModel {
    #[must_use]
    pub const fn is_indexed(&self) -> bool {
        self.index_kind.is_indexed()
    }
}

use thiserror::Error;

/// Failures of the attribute layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttributeError {
    #[error("attribute {name} already exists with element type {existing}, not {requested}")]
    TypeMismatch {
        name: String,
        existing: &'static str,
        requested: &'static str,
    },
    #[error("row {row} is out of range for {nb_rows} rows")]
    IndexOutOfRange { row: u32, nb_rows: u32 },
    #[error("vector of length {len} is not a permutation of 0..{nb_rows}")]
    InvalidPermutation { len: usize, nb_rows: u32 },
    #[error("mapping targets row {row} beyond the stated size {size}")]
    MappingOutOfRange { row: u32, size: u32 },
}

/// Failures of the mesh builders and accessors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshError {
    #[error("{kind} index {index} is out of range ({nb} {kind}s)")]
    IndexOutOfRange {
        kind: &'static str,
        index: u32,
        nb: u32,
    },
    #[error("local index {local} is out of range for {kind} {index}")]
    LocalIndexOutOfRange {
        kind: &'static str,
        index: u32,
        local: u8,
    },
    #[error("a {kind} needs at least {min} vertices, got {got}")]
    InvalidArity {
        kind: &'static str,
        min: usize,
        got: usize,
    },
    #[error("adjacency between {from} and {to} would not be reciprocal")]
    AdjacencyInconsistent { from: u32, to: u32 },
    #[error(transparent)]
    Attribute(#[from] AttributeError),
}

/// Failures of geometric constructions. Degeneracies inside queries do not
/// error, they yield `None`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("cannot normalize a vector of length {length}")]
    DegenerateVector { length: f64 },
}

/// Failures of the model layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("component {id} is not part of the model")]
    ComponentNotFound { id: String },
    #[error("a component with uuid {id} is already registered")]
    DuplicateUuid { id: String },
    #[error("relation {relation} cannot link a {from} to a {to}")]
    InvalidRelationTypes {
        relation: &'static str,
        from: &'static str,
        to: &'static str,
    },
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    Attribute(#[from] AttributeError),
}

/// Umbrella error for callers that do not care about the failing layer.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Attribute(#[from] AttributeError),
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

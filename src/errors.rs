use thiserror::Error;

/// Errors raised while mutating a codec's registries.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The name is already taken in this registry.
    #[error("name {0:?} is already registered")]
    DuplicateName(String),

    /// The identity is already registered, under the returned name.
    #[error("identity is already registered as {0:?}")]
    DuplicateIdentity(String),

    /// `register_class` was given no name and the descriptor carries none.
    #[error("no name given and the class descriptor carries none")]
    MissingName,

    /// Resource values must be tables, custom objects, or procedures.
    #[error("resource values must be tables, custom objects, or procedures")]
    NotShareable,
}

/// Errors raised during `serialize`.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The value has no wire representation under the current registrations.
    #[error("cannot serialize {0}")]
    Unserializable(&'static str),

    /// A custom encoder's argument graph reached the value being encoded
    /// before it was numbered.
    #[error("infinite loop in constructor for {0:?}")]
    InfiniteConstructor(String),

    /// A registered encode callback failed.
    #[error("encoder for type {name:?} failed: {message}")]
    Custom {
        /// Registered type name.
        name: String,
        /// Callback-provided detail.
        message: String,
    },
}

/// Errors raised during `deserialize`.
///
/// Offsets are byte positions into the input where the failing read began.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The cursor would run past the end of the input.
    #[error("input truncated at offset {offset}: wanted {needed} more bytes, {remaining} left")]
    Truncated {
        /// Position of the failing read.
        offset: usize,
        /// Bytes the read required.
        needed: usize,
        /// Bytes actually left.
        remaining: usize,
    },

    /// The first byte of a value is not in the tag set.
    #[error("unknown tag {tag:#04x} at offset {offset}")]
    BadTag {
        /// The offending byte.
        tag: u8,
        /// Position of that byte.
        offset: usize,
    },

    /// A decoded length is negative, fractional, or larger than the
    /// remaining input.
    #[error("bad length {len} at offset {offset}")]
    BadLength {
        /// Position of the length encoding.
        offset: usize,
        /// The decoded length (truncated to an integer).
        len: i64,
    },

    /// A back-reference points outside the identity table.
    #[error("back-reference {index} at offset {offset} is outside the identity table (length {len})")]
    BadReference {
        /// Position of the index encoding.
        offset: usize,
        /// The decoded index.
        index: i64,
        /// Identity table length at that point.
        len: usize,
    },

    /// A custom object names a type this codec has not registered.
    #[error("no type registered as {name:?}")]
    UnknownType {
        /// The decoded type name.
        name: String,
    },

    /// A resource names an object this codec has not registered.
    #[error("no resource registered as {name:?}")]
    UnknownResource {
        /// The decoded resource name.
        name: String,
    },

    /// The legacy text form of a float failed to parse.
    #[error("malformed number at offset {offset}")]
    MalformedNumber {
        /// Position of the float tag.
        offset: usize,
    },

    /// A type or resource name slot held something other than a string.
    #[error("expected a string name at offset {offset}")]
    BadName {
        /// Position of the name encoding.
        offset: usize,
    },

    /// Input nesting exceeded the codec's recursion limit.
    #[error("nesting deeper than {limit} at offset {offset}")]
    DepthLimit {
        /// Position where the limit was hit.
        offset: usize,
        /// The configured limit.
        limit: usize,
    },

    /// A registered decode callback failed.
    #[error("deserializer for type {name:?} failed: {message}")]
    Custom {
        /// Registered type name.
        name: String,
        /// Callback-provided detail.
        message: String,
    },
}

/// Bias added to an inline integer; tag bytes `1..=201` carry `tag - 101`.
pub(crate) const INLINE_BIAS: i64 = 101;
/// Smallest integer with a one-byte encoding.
pub(crate) const INLINE_MIN: i64 = -100;
/// Largest integer with a one-byte encoding.
pub(crate) const INLINE_MAX: i64 = 100;
/// Largest tag byte that denotes an inline integer.
pub(crate) const INLINE_TOP: u8 = 201;

/// Null constant.
pub(crate) const TAG_NULL: u8 = 202;
/// Float tag; followed by 8 big-endian IEEE-754 bytes, or by decimal text
/// and a second float tag in legacy mode.
pub(crate) const TAG_FLOAT: u8 = 203;
/// `true` constant.
pub(crate) const TAG_TRUE: u8 = 204;
/// `false` constant.
pub(crate) const TAG_FALSE: u8 = 205;
/// String tag; followed by a value-encoded length and that many raw bytes.
pub(crate) const TAG_STR: u8 = 206;
/// Table tag; array part then map part, each a value-encoded count.
pub(crate) const TAG_TABLE: u8 = 207;
/// Back-reference tag; followed by a value-encoded 1-based identity index.
pub(crate) const TAG_REF: u8 = 208;
/// Custom object tag; type name, argument count, then the arguments.
pub(crate) const TAG_CUSTOM: u8 = 209;
/// Opaque procedure tag; value-encoded length and the dumped body.
pub(crate) const TAG_PROC: u8 = 210;
/// Resource tag; followed by the value-encoded resource name.
pub(crate) const TAG_RESOURCE: u8 = 211;
/// Extended integer tag; followed by 8 big-endian two's-complement bytes.
pub(crate) const TAG_INT64: u8 = 212;

/// The quiet NaN pattern every NaN is canonicalized to on encode.
pub(crate) const CANONICAL_NAN: u64 = 0x7FF8_0000_0000_0000;

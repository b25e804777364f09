use crate::error::Result;
use crate::objects::{Array, Dictionary, Stream};
use std::fmt;

/// Identity of an indirect object: object number plus generation number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId {
    number: u32,
    generation: u16,
}

impl ObjectId {
    pub fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn generation(&self) -> u16 {
        self.generation
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}

/// Integer value. `explicit_sign` records that the source spelled a `+` or
/// `-` sign, so a `+` is re-emitted for non-negative values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integer {
    value: i64,
    explicit_sign: bool,
}

impl Integer {
    pub fn new(value: i64) -> Self {
        Self {
            value,
            explicit_sign: false,
        }
    }

    pub fn with_sign(value: i64) -> Self {
        Self {
            value,
            explicit_sign: true,
        }
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn has_explicit_sign(&self) -> bool {
        self.explicit_sign
    }

    pub(crate) fn serialize(&self, out: &mut Vec<u8>) {
        out.push(b' ');
        if self.explicit_sign && self.value >= 0 {
            out.push(b'+');
        }
        out.extend_from_slice(self.value.to_string().as_bytes());
    }
}

/// Real value, same sign convention as [`Integer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Real {
    value: f64,
    explicit_sign: bool,
}

impl Real {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            explicit_sign: false,
        }
    }

    pub fn with_sign(value: f64) -> Self {
        Self {
            value,
            explicit_sign: true,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub(crate) fn serialize(&self, out: &mut Vec<u8>) {
        out.push(b' ');
        if self.explicit_sign && self.value >= 0.0 {
            out.push(b'+');
        }
        // Fixed six decimal places, locale independent
        out.extend_from_slice(format!("{:.6}", self.value).as_bytes());
    }
}

/// Slash-prefixed identifier. The stored form keeps the leading `/`; the
/// semantic value strips it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name(String);

impl Name {
    /// Build a name from either a stored (`/Type`) or bare (`Type`) spelling.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.starts_with('/') {
            Name(name)
        } else {
            Name(format!("/{name}"))
        }
    }

    /// The stored form, including the leading `/`.
    pub fn stored(&self) -> &str {
        &self.0
    }

    /// The semantic value, without the leading `/`.
    pub fn value(&self) -> &str {
        &self.0[1..]
    }

    pub(crate) fn serialize(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.0.as_bytes());
    }
}

/// Literal string: the body between `(` and `)`, stored raw as it appeared
/// in the source (escapes are not resolved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfString(Vec<u8>);

impl PdfString {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        PdfString(body.into())
    }

    /// The raw stored body.
    pub fn value(&self) -> &[u8] {
        &self.0
    }

    /// The body with `\\`, `\(`, `\)`, `\n` and `\r` escapes resolved.
    pub fn unescaped(&self) -> Vec<u8> {
        let mut res = self.0.clone();
        for (pattern, subst) in [
            (&b"\\\\"[..], &b"\\"[..]),
            (&b"\\("[..], &b"("[..]),
            (&b"\\)"[..], &b")"[..]),
            (&b"\\n"[..], &b"\n"[..]),
            (&b"\\r"[..], &b"\r"[..]),
        ] {
            res = replace_all(&res, pattern, subst);
        }
        res
    }

    pub(crate) fn serialize(&self, out: &mut Vec<u8>) {
        out.push(b'(');
        let mut prev = 0u8;
        for &b in &self.0 {
            if (b == b'(' || b == b')') && prev != b'\\' {
                out.push(b'\\');
            }
            out.push(b);
            prev = b;
        }
        out.push(b')');
    }
}

/// Replace every occurrence of `pattern`, rescanning from the start after
/// each substitution.
fn replace_all(haystack: &[u8], pattern: &[u8], subst: &[u8]) -> Vec<u8> {
    let mut res = haystack.to_vec();
    loop {
        let pos = res
            .windows(pattern.len())
            .position(|window| window == pattern);
        match pos {
            Some(pos) => {
                res.splice(pos..pos + pattern.len(), subst.iter().copied());
            }
            None => break,
        }
    }
    res
}

/// Hexadecimal string: the body between `<` and `>`, must have even length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexString(String);

impl HexString {
    pub fn new(body: impl Into<String>) -> Self {
        HexString(body.into())
    }

    pub fn value(&self) -> &str {
        &self.0
    }

    pub(crate) fn serialize(&self, out: &mut Vec<u8>) {
        out.push(b'<');
        out.extend_from_slice(self.0.as_bytes());
        out.push(b'>');
    }
}

/// A PDF value.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    Boolean(bool),
    Integer(Integer),
    Real(Real),
    Name(Name),
    String(PdfString),
    HexString(HexString),
    Reference(ObjectId),
    Array(Array),
    Dictionary(Dictionary),
    Stream(Stream),
}

impl Object {
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(i.value()),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Object::Real(r) => Some(r.value()),
            Object::Integer(i) => Some(i.value() as f64),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&Name> {
        match self {
            Object::Name(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&PdfString> {
        match self {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Object::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Object::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_stream(&self) -> Option<&Stream> {
        match self {
            Object::Stream(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_stream_mut(&mut self) -> Option<&mut Stream> {
        match self {
            Object::Stream(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<ObjectId> {
        match self {
            Object::Reference(id) => Some(*id),
            _ => None,
        }
    }

    /// Append this value's PDF byte form to `out`.
    ///
    /// Numeric and reference forms begin with a space; names carry their
    /// leading `/`. Fails with `InvalidStream` for a stream whose payload is
    /// still an unloaded view into the source file.
    pub fn serialize(&self, out: &mut Vec<u8>) -> Result<()> {
        match self {
            Object::Null => out.extend_from_slice(b"null"),
            Object::Boolean(true) => out.extend_from_slice(b" true"),
            Object::Boolean(false) => out.extend_from_slice(b" false"),
            Object::Integer(i) => i.serialize(out),
            Object::Real(r) => r.serialize(out),
            Object::Name(n) => n.serialize(out),
            Object::String(s) => s.serialize(out),
            Object::HexString(h) => h.serialize(out),
            Object::Reference(id) => {
                out.extend_from_slice(format!(" {} {} R", id.number(), id.generation()).as_bytes());
            }
            Object::Array(a) => a.serialize(out)?,
            Object::Dictionary(d) => d.serialize(out)?,
            Object::Stream(s) => s.serialize(out)?,
        }
        Ok(())
    }

    /// Serialization as an owned buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.serialize(&mut out)?;
        Ok(out)
    }
}

impl From<bool> for Object {
    fn from(b: bool) -> Self {
        Object::Boolean(b)
    }
}

impl From<i64> for Object {
    fn from(i: i64) -> Self {
        Object::Integer(Integer::new(i))
    }
}

impl From<Integer> for Object {
    fn from(i: Integer) -> Self {
        Object::Integer(i)
    }
}

impl From<f64> for Object {
    fn from(f: f64) -> Self {
        Object::Real(Real::new(f))
    }
}

impl From<Name> for Object {
    fn from(n: Name) -> Self {
        Object::Name(n)
    }
}

impl From<ObjectId> for Object {
    fn from(id: ObjectId) -> Self {
        Object::Reference(id)
    }
}

impl From<Array> for Object {
    fn from(a: Array) -> Self {
        Object::Array(a)
    }
}

impl From<Dictionary> for Object {
    fn from(d: Dictionary) -> Self {
        Object::Dictionary(d)
    }
}

impl From<Stream> for Object {
    fn from(s: Stream) -> Self {
        Object::Stream(s)
    }
}

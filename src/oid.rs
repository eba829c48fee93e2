//! Object Identifier (OID) type.
//!
//! OIDs are stored as `SmallVec<[u32; 16]>`, which keeps every UPS-MIB
//! instance OID off the heap. Ordering is numeric, arc by arc, so
//! `1.3.6.1.2.1` sorts before `1.3.6.1.10`.

use crate::error::internal::DecodeErrorKind;
use crate::error::{Error, Result};
use smallvec::SmallVec;
use std::fmt;

/// Maximum number of arcs accepted while decoding (RFC 2578 Section 3.5).
pub const MAX_OID_LEN: usize = 128;

/// Object Identifier.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Oid {
    arcs: SmallVec<[u32; 16]>,
}

impl Oid {
    /// Create an empty OID.
    pub fn empty() -> Self {
        Self {
            arcs: SmallVec::new(),
        }
    }

    /// Create an OID from arc values.
    ///
    /// ```
    /// use ups_snmp::oid::Oid;
    ///
    /// let oid = Oid::new([1, 3, 6, 1]);
    /// assert_eq!(oid.len(), 4);
    /// ```
    pub fn new(arcs: impl IntoIterator<Item = u32>) -> Self {
        Self {
            arcs: arcs.into_iter().collect(),
        }
    }

    /// Create an OID from a slice of arcs.
    pub fn from_slice(arcs: &[u32]) -> Self {
        Self {
            arcs: SmallVec::from_slice(arcs),
        }
    }

    /// Parse dotted notation. A leading dot is accepted, so both
    /// `"1.3.6.1"` and `".1.3.6.1"` give the same OID.
    ///
    /// ```
    /// use ups_snmp::oid::Oid;
    ///
    /// let a = Oid::parse(".1.3.6.1.2.1.33").unwrap();
    /// let b = Oid::parse("1.3.6.1.2.1.33").unwrap();
    /// assert_eq!(a, b);
    /// assert!(Oid::parse("1.3.x").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let mut arcs = SmallVec::new();
        for part in s.split('.') {
            if part.is_empty() {
                continue;
            }
            let arc: u32 = part
                .parse()
                .map_err(|_| Error::InvalidOid(s.into()).boxed())?;
            arcs.push(arc);
        }
        Ok(Self { arcs })
    }

    /// Get the arc values.
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Whether `self` lies in the subtree rooted at `other` (or equals it).
    pub fn starts_with(&self, other: &Oid) -> bool {
        self.arcs.len() >= other.arcs.len() && self.arcs[..other.arcs.len()] == other.arcs[..]
    }

    /// The arcs following `prefix`, if `self` lies under it.
    pub fn strip_prefix(&self, prefix: &Oid) -> Option<&[u32]> {
        self.starts_with(prefix)
            .then(|| &self.arcs[prefix.arcs.len()..])
    }

    /// Get the parent OID (all arcs except the last).
    pub fn parent(&self) -> Option<Oid> {
        let (_, rest) = self.arcs.split_last()?;
        Some(Oid::from_slice(rest))
    }

    /// Create a child OID by appending an arc.
    pub fn child(&self, arc: u32) -> Oid {
        let mut arcs = self.arcs.clone();
        arcs.push(arc);
        Oid { arcs }
    }

    /// Create a descendant OID by appending several arcs.
    pub fn join(&self, suffix: &[u32]) -> Oid {
        let mut arcs = self.arcs.clone();
        arcs.extend_from_slice(suffix);
        Oid { arcs }
    }

    /// Dotted notation with a leading dot (`.1.3.6.1...`), as used in
    /// readings and descriptor addressing.
    pub fn to_dotted(&self) -> String {
        let mut s = String::with_capacity(self.arcs.len() * 3);
        for arc in &self.arcs {
            s.push('.');
            s.push_str(&arc.to_string());
        }
        s
    }

    /// Encode the content octets (X.690 Section 8.19).
    ///
    /// The first two arcs share a subidentifier (`arc1 * 40 + arc2`).
    pub fn to_ber_smallvec(&self) -> SmallVec<[u8; 64]> {
        let mut bytes = SmallVec::new();
        match self.arcs.as_slice() {
            [] => {}
            [first] => encode_subidentifier(&mut bytes, first * 40),
            [first, second, rest @ ..] => {
                encode_subidentifier(&mut bytes, first * 40 + second);
                for &arc in rest {
                    encode_subidentifier(&mut bytes, arc);
                }
            }
        }
        bytes
    }

    /// Encode the content octets into a `Vec`.
    pub fn to_ber(&self) -> Vec<u8> {
        self.to_ber_smallvec().to_vec()
    }

    /// Decode content octets. Errors are detail kinds; the BER decoder turns
    /// them into a public error with the right target.
    pub(crate) fn from_ber(data: &[u8]) -> std::result::Result<Self, DecodeErrorKind> {
        if data.is_empty() {
            return Ok(Self::empty());
        }

        let mut arcs = SmallVec::new();
        let (first, mut i) = decode_subidentifier(data)?;
        match first {
            0..40 => {
                arcs.push(0);
                arcs.push(first);
            }
            40..80 => {
                arcs.push(1);
                arcs.push(first - 40);
            }
            _ => {
                arcs.push(2);
                arcs.push(first - 80);
            }
        }

        while i < data.len() {
            let (arc, consumed) = decode_subidentifier(&data[i..])?;
            arcs.push(arc);
            i += consumed;
            if arcs.len() > MAX_OID_LEN {
                return Err(DecodeErrorKind::OidTooLong {
                    count: arcs.len(),
                    max: MAX_OID_LEN,
                });
            }
        }

        Ok(Self { arcs })
    }
}

fn encode_subidentifier(bytes: &mut SmallVec<[u8; 64]>, value: u32) {
    let mut groups = 1;
    let mut temp = value >> 7;
    while temp > 0 {
        groups += 1;
        temp >>= 7;
    }
    for i in (0..groups).rev() {
        let mut byte = ((value >> (i * 7)) & 0x7F) as u8;
        if i > 0 {
            byte |= 0x80;
        }
        bytes.push(byte);
    }
}

fn decode_subidentifier(data: &[u8]) -> std::result::Result<(u32, usize), DecodeErrorKind> {
    let mut value: u32 = 0;
    for (i, &byte) in data.iter().enumerate() {
        if value > (u32::MAX >> 7) {
            return Err(DecodeErrorKind::IntegerOverflow);
        }
        value = (value << 7) | (byte & 0x7F) as u32;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(DecodeErrorKind::TruncatedData)
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arc in &self.arcs {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", arc)?;
            first = false;
        }
        Ok(())
    }
}

impl std::str::FromStr for Oid {
    type Err = Box<Error>;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<&[u32]> for Oid {
    fn from(arcs: &[u32]) -> Self {
        Self::from_slice(arcs)
    }
}

impl<const N: usize> From<[u32; N]> for Oid {
    fn from(arcs: [u32; N]) -> Self {
        Self::new(arcs)
    }
}

impl PartialOrd for Oid {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Oid {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.arcs.cmp(&other.arcs)
    }
}

/// Build an OID from literal arcs.
///
/// ```
/// use ups_snmp::oid;
///
/// let ups = oid!(1, 3, 6, 1, 2, 1, 33);
/// assert_eq!(ups.to_string(), "1.3.6.1.2.1.33");
/// ```
#[macro_export]
macro_rules! oid {
    ($($arc:expr),* $(,)?) => {
        $crate::oid::Oid::from_slice(&[$($arc),*])
    };
}

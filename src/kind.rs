//! Element kinds - the scalar types a buffer or array can hold
//!
//! Design: one tag per native representation, with every byte-width
//! question answered here so containers never compute sizes themselves.

use std::fmt;

/// Native scalar representation of a container element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ElementKind {
    Bool = 0,
    Int8 = 1,
    Int16 = 2,
    Int32 = 3,
    Int64 = 4,
    Float32 = 5,
    Float64 = 6,
    Complex64 = 7,
    Complex128 = 8,
}

impl ElementKind {
    pub const ALL: [ElementKind; 9] = [
        Self::Bool,
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::Float32,
        Self::Float64,
        Self::Complex64,
        Self::Complex128,
    ];

    /// Size of one element in bytes
    #[inline]
    pub const fn width(self) -> usize {
        match self {
            Self::Bool | Self::Int8 => 1,
            Self::Int16 => 2,
            Self::Int32 | Self::Float32 => 4,
            Self::Int64 | Self::Float64 | Self::Complex64 => 8,
            Self::Complex128 => 16,
        }
    }

    /// Alignment requirement (complex numbers align like their parts)
    #[inline]
    pub const fn align(self) -> usize {
        match self {
            Self::Complex64 => 4,
            Self::Complex128 => 8,
            other => other.width(),
        }
    }

    /// Decode the tag used across the C ABI
    pub const fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Bool),
            1 => Some(Self::Int8),
            2 => Some(Self::Int16),
            3 => Some(Self::Int32),
            4 => Some(Self::Int64),
            5 => Some(Self::Float32),
            6 => Some(Self::Float64),
            7 => Some(Self::Complex64),
            8 => Some(Self::Complex128),
            _ => None,
        }
    }

    /// Type number the host array library reports for this kind
    pub const fn type_code(self) -> i32 {
        match self {
            Self::Bool => 0,
            Self::Int8 => 1,
            Self::Int16 => 3,
            Self::Int32 => 5,
            Self::Int64 => 7,
            Self::Float32 => 11,
            Self::Float64 => 12,
            Self::Complex64 => 14,
            Self::Complex128 => 15,
        }
    }

    /// Inverse of [`type_code`](Self::type_code). Code 9 (`long long`) is
    /// also 64 bits wide on every platform the runtime targets.
    pub const fn from_type_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Bool),
            1 => Some(Self::Int8),
            3 => Some(Self::Int16),
            5 => Some(Self::Int32),
            7 | 9 => Some(Self::Int64),
            11 => Some(Self::Float32),
            12 => Some(Self::Float64),
            14 => Some(Self::Complex64),
            15 => Some(Self::Complex128),
            _ => None,
        }
    }

    /// Decode an array-interface type string such as `"<f8"` or `"|b1"`.
    ///
    /// Only native byte order (or order-free single bytes) is accepted.
    pub fn from_typestr(typestr: &str) -> Option<Self> {
        let mut chars = typestr.chars();
        let order = chars.next()?;
        let native = if cfg!(target_endian = "little") { '<' } else { '>' };
        let class = chars.next()?;
        let size: usize = chars.as_str().parse().ok()?;

        if order != native && order != '|' && order != '=' {
            return None;
        }

        let kind = match (class, size) {
            ('b', 1) => Self::Bool,
            ('i', 1) => Self::Int8,
            ('i', 2) => Self::Int16,
            ('i', 4) => Self::Int32,
            ('i', 8) => Self::Int64,
            ('f', 4) => Self::Float32,
            ('f', 8) => Self::Float64,
            ('c', 8) => Self::Complex64,
            ('c', 16) => Self::Complex128,
            _ => return None,
        };
        Some(kind)
    }

    /// Native-endian array-interface type string, inverse of
    /// [`from_typestr`](Self::from_typestr)
    pub fn typestr(self) -> String {
        let order = if cfg!(target_endian = "little") { '<' } else { '>' };
        let (order, class) = match self {
            Self::Bool => ('|', 'b'),
            Self::Int8 => ('|', 'i'),
            Self::Int16 | Self::Int32 | Self::Int64 => (order, 'i'),
            Self::Float32 | Self::Float64 => (order, 'f'),
            Self::Complex64 | Self::Complex128 => (order, 'c'),
        };
        format!("{}{}{}", order, class, self.width())
    }

    /// Argument-parsing format character for this kind.
    ///
    /// Complex arguments are parsed as generic objects and unwrapped later.
    pub const fn parse_code(self) -> char {
        match self {
            Self::Int8 => 'b',
            Self::Int16 => 'h',
            Self::Int32 => 'i',
            Self::Int64 => 'l',
            Self::Float32 => 'f',
            Self::Float64 => 'd',
            Self::Complex64 | Self::Complex128 => 'O',
            Self::Bool => 'p',
        }
    }

    /// Host-level type name (for error messages)
    pub const fn host_type_name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64 => "int",
            Self::Float32 | Self::Float64 => "float",
            Self::Complex64 | Self::Complex128 => "complex",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Complex64 => "complex64",
            Self::Complex128 => "complex128",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Complex number laid out like C99 `float complex` / `double complex`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct Complex<T> {
    pub re: T,
    pub im: T,
}

impl<T> Complex<T> {
    #[inline]
    pub const fn new(re: T, im: T) -> Self {
        Self { re, im }
    }
}

pub type Complex64 = Complex<f32>;
pub type Complex128 = Complex<f64>;

/// Rust scalar type that maps onto exactly one [`ElementKind`]
///
/// Encoding is native-endian and byte-for-byte what the host stores.
pub trait Element: Copy + fmt::Debug {
    const KIND: ElementKind;

    /// Write `self` into `out`, which is exactly one element wide
    fn write_bytes(self, out: &mut [u8]);

    /// Read a value from exactly one element's bytes
    fn read_bytes(bytes: &[u8]) -> Self;
}

macro_rules! impl_element {
    ($ty:ty, $kind:ident) => {
        impl Element for $ty {
            const KIND: ElementKind = ElementKind::$kind;

            #[inline]
            fn write_bytes(self, out: &mut [u8]) {
                out.copy_from_slice(&self.to_ne_bytes());
            }

            #[inline]
            fn read_bytes(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(bytes);
                <$ty>::from_ne_bytes(raw)
            }
        }
    };
}

impl_element!(i8, Int8);
impl_element!(i16, Int16);
impl_element!(i32, Int32);
impl_element!(i64, Int64);
impl_element!(f32, Float32);
impl_element!(f64, Float64);

impl Element for bool {
    const KIND: ElementKind = ElementKind::Bool;

    #[inline]
    fn write_bytes(self, out: &mut [u8]) {
        out[0] = self as u8;
    }

    #[inline]
    fn read_bytes(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

macro_rules! impl_complex_element {
    ($part:ty, $kind:ident) => {
        impl Element for Complex<$part> {
            const KIND: ElementKind = ElementKind::$kind;

            #[inline]
            fn write_bytes(self, out: &mut [u8]) {
                let half = std::mem::size_of::<$part>();
                let (re, im) = out.split_at_mut(half);
                self.re.write_bytes(re);
                self.im.write_bytes(im);
            }

            #[inline]
            fn read_bytes(bytes: &[u8]) -> Self {
                let half = std::mem::size_of::<$part>();
                Complex::new(
                    <$part>::read_bytes(&bytes[..half]),
                    <$part>::read_bytes(&bytes[half..]),
                )
            }
        }
    };
}

impl_complex_element!(f32, Complex64);
impl_complex_element!(f64, Complex128);

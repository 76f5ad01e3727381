//! In-process host interpreter model
//!
//! Design: objects live in generation-checked slots, so a handle that
//! outlives its object is detected instead of aliasing whatever reuses the
//! slot. Reference counts, the `True`/`False`/`None` singletons, the pending
//! error and array storage behave like the real interpreter's.
//! - Integers are stored as `i128` so 64-bit overflow is observable
//! - Array storage is 8-byte aligned and never moves while the object lives
//! - An optional live-object limit simulates allocation failure

use super::{HostApi, HostArrayInfo, HostErrorKind, HostType};
use crate::array::{contiguous_strides, element_count, MemoryOrder};
use crate::kind::{Element, ElementKind};
use crate::logging::{trace, warn};
use parking_lot::Mutex;

/// Generation-checked object handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef {
    index: u32,
    generation: u32,
}

/// Pending host exception
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostError {
    pub kind: HostErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Int(i128),
    Float(f64),
    Complex { re: f64, im: f64 },
    Bool(bool),
    None,
    Str(String),
    Array(HostArray),
}

impl HostValue {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Complex { .. } => "complex",
            Self::Bool(_) => "bool",
            Self::None => "NoneType",
            Self::Str(_) => "str",
            Self::Array(_) => "ndarray",
        }
    }
}

/// Host-owned n-dimensional array
#[derive(Debug, Clone, PartialEq)]
pub struct HostArray {
    storage: Vec<u64>,
    /// Byte offset of element zero inside `storage`
    offset: usize,
    shape: Vec<usize>,
    strides: Vec<isize>,
    kind: ElementKind,
}

impl HostArray {
    fn new(kind: ElementKind, shape: &[usize], strides: &[isize], offset: usize, bytes: &[u8]) -> Self {
        let mut storage = vec![0u64; bytes.len().div_ceil(8).max(1)];
        let raw = unsafe { std::slice::from_raw_parts_mut(storage.as_mut_ptr() as *mut u8, storage.len() * 8) };
        raw[..bytes.len()].copy_from_slice(bytes);

        Self {
            storage,
            offset,
            shape: shape.to_vec(),
            strides: strides.to_vec(),
            kind,
        }
    }

    fn bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.storage.as_ptr() as *const u8, self.storage.len() * 8) }
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.storage.as_mut_ptr() as *mut u8, self.storage.len() * 8) }
    }

    fn data_ptr(&mut self) -> *mut u8 {
        unsafe { (self.storage.as_mut_ptr() as *mut u8).add(self.offset) }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }
}

/// Whether every element addressed by `shape`/`strides` from `offset`
/// lies inside `len` bytes.
fn layout_fits(shape: &[usize], strides: &[isize], offset: usize, width: usize, len: usize) -> bool {
    if shape.len() != strides.len() || offset > len {
        return false;
    }
    if shape.iter().any(|&extent| extent == 0) {
        return true;
    }

    let mut low = offset as i128;
    let mut high = offset as i128;
    for (&extent, &stride) in shape.iter().zip(strides) {
        let span = (extent as i128 - 1) * stride as i128;
        if span < 0 {
            low += span;
        } else {
            high += span;
        }
    }
    low >= 0 && high + width as i128 <= len as i128
}

struct Slot {
    generation: u32,
    refcount: u32,
    immortal: bool,
    value: Option<HostValue>,
}

struct Inner {
    slots: Vec<Slot>,
    free: Vec<u32>,
    error: Option<HostError>,
    live_limit: Option<usize>,
    live: usize,
}

const TRUE_INDEX: u32 = 0;
const FALSE_INDEX: u32 = 1;
const NONE_INDEX: u32 = 2;

impl Inner {
    fn get(&self, obj: ObjRef) -> Option<&HostValue> {
        self.slots
            .get(obj.index as usize)
            .filter(|slot| slot.generation == obj.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    fn get_mut(&mut self, obj: ObjRef) -> Option<&mut HostValue> {
        self.slots
            .get_mut(obj.index as usize)
            .filter(|slot| slot.generation == obj.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    fn raise(&mut self, kind: HostErrorKind, message: impl Into<String>) {
        self.error = Some(HostError {
            kind,
            message: message.into(),
        });
    }

    fn insert(&mut self, value: HostValue, immortal: bool) -> Option<ObjRef> {
        if let Some(limit) = self.live_limit {
            if !immortal && self.live >= limit {
                self.raise(HostErrorKind::MemoryError, "object limit reached");
                return None;
            }
        }

        let obj = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.refcount = 1;
                slot.immortal = immortal;
                slot.value = Some(value);
                ObjRef {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    refcount: 1,
                    immortal,
                    value: Some(value),
                });
                ObjRef { index, generation: 0 }
            }
        };

        if !immortal {
            self.live += 1;
        }
        Some(obj)
    }
}

/// Simulated host interpreter
pub struct ObjectArena {
    inner: Mutex<Inner>,
}

impl ObjectArena {
    pub fn new() -> Self {
        let mut inner = Inner {
            slots: Vec::new(),
            free: Vec::new(),
            error: None,
            live_limit: None,
            live: 0,
        };
        for value in [HostValue::Bool(true), HostValue::Bool(false), HostValue::None] {
            inner.insert(value, true);
        }
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Make every later non-singleton allocation fail once `limit` objects are live
    pub fn set_live_limit(&self, limit: Option<usize>) {
        self.inner.lock().live_limit = limit;
    }

    fn alloc(&self, value: HostValue) -> ObjRef {
        let mut inner = self.inner.lock();
        let had_limit = inner.live_limit.take();
        let obj = inner.insert(value, false);
        inner.live_limit = had_limit;
        // Insertion with the limit lifted cannot fail.
        obj.unwrap_or(ObjRef {
            index: NONE_INDEX,
            generation: 0,
        })
    }

    /// New integer object (test/embedder constructor, ignores the live limit)
    pub fn int(&self, value: i128) -> ObjRef {
        self.alloc(HostValue::Int(value))
    }

    pub fn float(&self, value: f64) -> ObjRef {
        self.alloc(HostValue::Float(value))
    }

    pub fn complex(&self, re: f64, im: f64) -> ObjRef {
        self.alloc(HostValue::Complex { re, im })
    }

    pub fn str(&self, value: &str) -> ObjRef {
        self.alloc(HostValue::Str(value.to_string()))
    }

    pub fn none(&self) -> ObjRef {
        ObjRef {
            index: NONE_INDEX,
            generation: 0,
        }
    }

    /// Dense array from typed values laid out in `order`
    pub fn array<T: Element>(&self, shape: &[usize], values: &[T], order: MemoryOrder) -> ObjRef {
        let width = T::KIND.width();
        let mut bytes = vec![0u8; values.len() * width];
        for (chunk, value) in bytes.chunks_exact_mut(width).zip(values) {
            value.write_bytes(chunk);
        }
        let strides = contiguous_strides(shape, width, order);
        self.alloc(HostValue::Array(HostArray::new(T::KIND, shape, &strides, 0, &bytes)))
    }

    /// Array over a copy of `bytes`, with element zero at byte `offset`
    /// and arbitrary byte strides (transposed, reversed or sliced layouts).
    ///
    /// Returns `None` with a pending `ValueError` if any addressed element
    /// falls outside `bytes`.
    pub fn array_from_parts(
        &self,
        kind: ElementKind,
        shape: &[usize],
        strides: &[isize],
        offset: usize,
        bytes: &[u8],
    ) -> Option<ObjRef> {
        if !layout_fits(shape, strides, offset, kind.width(), bytes.len()) {
            self.set_error(HostErrorKind::ValueError, "array layout exceeds its storage");
            return None;
        }
        Some(self.alloc(HostValue::Array(HostArray::new(kind, shape, strides, offset, bytes))))
    }

    /// Mutate an array's backing bytes in place
    pub fn with_array_bytes_mut<R>(&self, obj: ObjRef, f: impl FnOnce(&mut [u8]) -> R) -> Option<R> {
        let mut inner = self.inner.lock();
        match inner.get_mut(obj) {
            Some(HostValue::Array(array)) => {
                let offset = array.offset;
                Some(f(&mut array.bytes_mut()[offset..]))
            }
            _ => None,
        }
    }

    /// Copy of the array's backing bytes from element zero on
    pub fn array_bytes(&self, obj: ObjRef) -> Option<Vec<u8>> {
        let inner = self.inner.lock();
        match inner.get(obj) {
            Some(HostValue::Array(array)) => Some(array.bytes()[array.offset..].to_vec()),
            _ => None,
        }
    }

    /// Snapshot of an object's value; `None` for stale handles
    pub fn value(&self, obj: ObjRef) -> Option<HostValue> {
        self.inner.lock().get(obj).cloned()
    }

    pub fn is_alive(&self, obj: ObjRef) -> bool {
        self.inner.lock().get(obj).is_some()
    }

    pub fn refcount(&self, obj: ObjRef) -> Option<u32> {
        let inner = self.inner.lock();
        inner
            .slots
            .get(obj.index as usize)
            .filter(|slot| slot.generation == obj.generation && slot.value.is_some())
            .map(|slot| slot.refcount)
    }

    /// Number of live non-singleton objects
    pub fn live_objects(&self) -> usize {
        self.inner.lock().live
    }

    pub fn pending_error(&self) -> Option<HostError> {
        self.inner.lock().error.clone()
    }

    /// Fetch and clear the pending error
    pub fn take_error(&self) -> Option<HostError> {
        self.inner.lock().error.take()
    }

    fn real_value(inner: &mut Inner, obj: ObjRef, what: &str) -> f64 {
        match inner.get(obj) {
            Some(HostValue::Float(v)) => *v,
            Some(HostValue::Int(v)) => *v as f64,
            Some(HostValue::Bool(b)) => *b as i64 as f64,
            Some(other) => {
                let message = format!("{} must be a real number, not {}", what, other.type_name());
                inner.raise(HostErrorKind::TypeError, message);
                -1.0
            }
            None => {
                inner.raise(HostErrorKind::TypeError, "stale object handle");
                -1.0
            }
        }
    }
}

impl Default for ObjectArena {
    fn default() -> Self {
        Self::new()
    }
}

impl HostApi for ObjectArena {
    type Object = ObjRef;

    fn incref(&self, obj: ObjRef) {
        let mut inner = self.inner.lock();
        match inner.slots.get_mut(obj.index as usize) {
            Some(slot) if slot.generation == obj.generation && slot.value.is_some() => {
                if !slot.immortal {
                    slot.refcount += 1;
                }
            }
            _ => warn!(?obj, "incref on stale handle"),
        }
    }

    fn decref(&self, obj: ObjRef) {
        let mut inner = self.inner.lock();
        let freed = match inner.slots.get_mut(obj.index as usize) {
            Some(slot) if slot.generation == obj.generation && slot.value.is_some() => {
                if slot.immortal {
                    false
                } else {
                    debug_assert!(slot.refcount > 0, "refcount underflow");
                    slot.refcount -= 1;
                    if slot.refcount == 0 {
                        slot.value = None;
                        slot.generation = slot.generation.wrapping_add(1);
                        true
                    } else {
                        false
                    }
                }
            }
            _ => {
                warn!(?obj, "decref on stale handle");
                false
            }
        };

        if freed {
            inner.free.push(obj.index);
            inner.live -= 1;
            trace!(?obj, "host object freed");
        }
    }

    fn is_same(&self, a: ObjRef, b: ObjRef) -> bool {
        a == b
    }

    fn type_of(&self, obj: ObjRef) -> HostType {
        match self.inner.lock().get(obj) {
            Some(HostValue::Int(_)) => HostType::Int,
            Some(HostValue::Float(_)) => HostType::Float,
            Some(HostValue::Complex { .. }) => HostType::Complex,
            Some(HostValue::Bool(_)) => HostType::Bool,
            Some(HostValue::None) => HostType::None,
            Some(HostValue::Array(_)) => HostType::Array,
            Some(HostValue::Str(_)) | None => HostType::Other,
        }
    }

    fn as_i64(&self, obj: ObjRef) -> i64 {
        let mut inner = self.inner.lock();
        match inner.get(obj) {
            Some(HostValue::Int(v)) => match i64::try_from(*v) {
                Ok(v) => v,
                Err(_) => {
                    inner.raise(HostErrorKind::OverflowError, "int too large to convert to C long");
                    -1
                }
            },
            Some(HostValue::Bool(b)) => *b as i64,
            Some(other) => {
                let message = format!("an integer is required (got type {})", other.type_name());
                inner.raise(HostErrorKind::TypeError, message);
                -1
            }
            None => {
                inner.raise(HostErrorKind::TypeError, "stale object handle");
                -1
            }
        }
    }

    fn as_f64(&self, obj: ObjRef) -> f64 {
        let mut inner = self.inner.lock();
        Self::real_value(&mut inner, obj, "value")
    }

    fn complex_real(&self, obj: ObjRef) -> f64 {
        let mut inner = self.inner.lock();
        if let Some(HostValue::Complex { re, .. }) = inner.get(obj) {
            return *re;
        }
        Self::real_value(&mut inner, obj, "complex real part")
    }

    fn complex_imag(&self, obj: ObjRef) -> f64 {
        let mut inner = self.inner.lock();
        match inner.get(obj) {
            Some(HostValue::Complex { im, .. }) => *im,
            Some(HostValue::Float(_) | HostValue::Int(_) | HostValue::Bool(_)) => 0.0,
            Some(other) => {
                let message = format!("complex imaginary part must be a number, not {}", other.type_name());
                inner.raise(HostErrorKind::TypeError, message);
                -1.0
            }
            None => {
                inner.raise(HostErrorKind::TypeError, "stale object handle");
                -1.0
            }
        }
    }

    fn error_occurred(&self) -> bool {
        self.inner.lock().error.is_some()
    }

    fn set_error(&self, kind: HostErrorKind, message: &str) {
        self.inner.lock().raise(kind, message);
    }

    fn clear_error(&self) {
        self.inner.lock().error = None;
    }

    fn true_object(&self) -> ObjRef {
        ObjRef {
            index: TRUE_INDEX,
            generation: 0,
        }
    }

    fn false_object(&self) -> ObjRef {
        ObjRef {
            index: FALSE_INDEX,
            generation: 0,
        }
    }

    fn array_info(&self, obj: ObjRef) -> Option<HostArrayInfo> {
        let mut inner = self.inner.lock();
        match inner.get_mut(obj) {
            Some(HostValue::Array(array)) => {
                let len = element_count(&array.shape)?;
                Some(HostArrayInfo {
                    data: array.data_ptr(),
                    shape: array.shape.clone(),
                    strides: array.strides.clone(),
                    type_code: array.kind.type_code(),
                    item_size: array.kind.width(),
                    len,
                    byte_len: len * array.kind.width(),
                })
            }
            _ => None,
        }
    }

    fn new_int(&self, value: i64) -> Option<ObjRef> {
        self.inner.lock().insert(HostValue::Int(value as i128), false)
    }

    fn new_float(&self, value: f64) -> Option<ObjRef> {
        self.inner.lock().insert(HostValue::Float(value), false)
    }

    fn new_complex(&self, re: f64, im: f64) -> Option<ObjRef> {
        self.inner.lock().insert(HostValue::Complex { re, im }, false)
    }

    fn new_array(&self, shape: &[usize], type_code: i32, bytes: &[u8]) -> Option<ObjRef> {
        let mut inner = self.inner.lock();
        let Some(kind) = ElementKind::from_type_code(type_code) else {
            inner.raise(HostErrorKind::TypeError, format!("unsupported array type {}", type_code));
            return None;
        };

        let expected = element_count(shape).and_then(|n| n.checked_mul(kind.width()));
        if expected != Some(bytes.len()) {
            inner.raise(HostErrorKind::ValueError, "array data does not match shape");
            return None;
        }

        let strides = contiguous_strides(shape, kind.width(), MemoryOrder::RowMajor);
        inner.insert(HostValue::Array(HostArray::new(kind, shape, &strides, 0, bytes)), false)
    }
}

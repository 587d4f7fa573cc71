//! Arrays numéricos n-dimensionais em memória.
//!
//! `NdArray` é um shape mais um buffer tipado em ordem row-major. É a unidade
//! que os slots armazenam e as verificações comparam.

use serde::{Deserialize, Serialize};

use super::errors::{GoldfileError, GoldfileResult};

/// Tipo de elemento de um array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dtype {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl Dtype {
    /// Tamanho de um elemento em bytes.
    pub fn size(self) -> usize {
        match self {
            Dtype::Bool | Dtype::I8 | Dtype::U8 => 1,
            Dtype::I16 | Dtype::U16 => 2,
            Dtype::I32 | Dtype::U32 | Dtype::F32 => 4,
            Dtype::I64 | Dtype::U64 | Dtype::F64 => 8,
        }
    }

    /// Caractere de tipo usado nos descritores (`b`, `i`, `u`, `f`).
    pub fn kind(self) -> char {
        match self {
            Dtype::Bool => 'b',
            Dtype::I8 | Dtype::I16 | Dtype::I32 | Dtype::I64 => 'i',
            Dtype::U8 | Dtype::U16 | Dtype::U32 | Dtype::U64 => 'u',
            Dtype::F32 | Dtype::F64 => 'f',
        }
    }

    /// Converte caractere de tipo e tamanho em bytes de volta para um dtype.
    pub fn from_kind_size(kind: char, size: usize) -> Option<Self> {
        let dtype = match (kind, size) {
            ('b', 1) => Dtype::Bool,
            ('i', 1) => Dtype::I8,
            ('i', 2) => Dtype::I16,
            ('i', 4) => Dtype::I32,
            ('i', 8) => Dtype::I64,
            ('u', 1) => Dtype::U8,
            ('u', 2) => Dtype::U16,
            ('u', 4) => Dtype::U32,
            ('u', 8) => Dtype::U64,
            ('f', 4) => Dtype::F32,
            ('f', 8) => Dtype::F64,
            _ => return None,
        };
        Some(dtype)
    }

    /// Nome legível, ex: `float64`.
    pub fn name(self) -> &'static str {
        match self {
            Dtype::Bool => "bool",
            Dtype::I8 => "int8",
            Dtype::I16 => "int16",
            Dtype::I32 => "int32",
            Dtype::I64 => "int64",
            Dtype::U8 => "uint8",
            Dtype::U16 => "uint16",
            Dtype::U32 => "uint32",
            Dtype::U64 => "uint64",
            Dtype::F32 => "float32",
            Dtype::F64 => "float64",
        }
    }
}

impl std::fmt::Display for Dtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Buffer tipado de elementos, row-major.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Bool(Vec<bool>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

/// Aplica a mesma expressão ao vetor interno de qualquer variante de `ArrayData`.
macro_rules! with_buffer {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            ArrayData::Bool($v) => $body,
            ArrayData::I8($v) => $body,
            ArrayData::I16($v) => $body,
            ArrayData::I32($v) => $body,
            ArrayData::I64($v) => $body,
            ArrayData::U8($v) => $body,
            ArrayData::U16($v) => $body,
            ArrayData::U32($v) => $body,
            ArrayData::U64($v) => $body,
            ArrayData::F32($v) => $body,
            ArrayData::F64($v) => $body,
        }
    };
}

impl ArrayData {
    /// Número de elementos.
    pub fn len(&self) -> usize {
        with_buffer!(self, v => v.len())
    }

    /// Se o buffer está vazio.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dtype do buffer.
    pub fn dtype(&self) -> Dtype {
        match self {
            ArrayData::Bool(_) => Dtype::Bool,
            ArrayData::I8(_) => Dtype::I8,
            ArrayData::I16(_) => Dtype::I16,
            ArrayData::I32(_) => Dtype::I32,
            ArrayData::I64(_) => Dtype::I64,
            ArrayData::U8(_) => Dtype::U8,
            ArrayData::U16(_) => Dtype::U16,
            ArrayData::U32(_) => Dtype::U32,
            ArrayData::U64(_) => Dtype::U64,
            ArrayData::F32(_) => Dtype::F32,
            ArrayData::F64(_) => Dtype::F64,
        }
    }

    /// Reordena elementos com `order[i]` = índice de origem do destino `i`.
    pub(crate) fn permute(&self, order: &[usize]) -> Self {
        match self {
            ArrayData::Bool(v) => ArrayData::Bool(order.iter().map(|&i| v[i]).collect()),
            ArrayData::I8(v) => ArrayData::I8(order.iter().map(|&i| v[i]).collect()),
            ArrayData::I16(v) => ArrayData::I16(order.iter().map(|&i| v[i]).collect()),
            ArrayData::I32(v) => ArrayData::I32(order.iter().map(|&i| v[i]).collect()),
            ArrayData::I64(v) => ArrayData::I64(order.iter().map(|&i| v[i]).collect()),
            ArrayData::U8(v) => ArrayData::U8(order.iter().map(|&i| v[i]).collect()),
            ArrayData::U16(v) => ArrayData::U16(order.iter().map(|&i| v[i]).collect()),
            ArrayData::U32(v) => ArrayData::U32(order.iter().map(|&i| v[i]).collect()),
            ArrayData::U64(v) => ArrayData::U64(order.iter().map(|&i| v[i]).collect()),
            ArrayData::F32(v) => ArrayData::F32(order.iter().map(|&i| v[i]).collect()),
            ArrayData::F64(v) => ArrayData::F64(order.iter().map(|&i| v[i]).collect()),
        }
    }
}

/// Tipos escalares que um `NdArray` pode conter.
pub trait Element: Copy + std::fmt::Debug + 'static {
    /// Dtype deste tipo de elemento.
    const DTYPE: Dtype;

    /// Embrulha um vetor na variante de buffer correspondente.
    fn wrap(values: Vec<Self>) -> ArrayData;

    /// Empresta o buffer se ele contém este tipo de elemento.
    fn view(data: &ArrayData) -> Option<&[Self]>;
}

macro_rules! impl_element {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: Dtype = Dtype::$variant;

                fn wrap(values: Vec<Self>) -> ArrayData {
                    ArrayData::$variant(values)
                }

                fn view(data: &ArrayData) -> Option<&[Self]> {
                    match data {
                        ArrayData::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_element! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
}

/// Número de elementos implicado por um shape. Shape vazio é um escalar.
pub fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
}

/// Array N-dimensional com shape e dtype fixos.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    shape: Vec<usize>,
    data: ArrayData,
}

impl NdArray {
    /// Cria um array a partir de um shape e valores row-major.
    pub fn new<T: Element>(shape: Vec<usize>, values: Vec<T>) -> GoldfileResult<Self> {
        Self::from_data(shape, T::wrap(values))
    }

    /// Cria um array a partir de um shape e um buffer já tipado.
    pub fn from_data(shape: Vec<usize>, data: ArrayData) -> GoldfileResult<Self> {
        let expected = element_count(&shape)
            .ok_or_else(|| GoldfileError::InvalidArray(format!("shape {:?} overflows", shape)))?;
        if expected != data.len() {
            return Err(GoldfileError::InvalidArray(format!(
                "shape {:?} needs {} elements, got {}",
                shape,
                expected,
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    /// Cria um array unidimensional.
    pub fn from_vec<T: Element>(values: Vec<T>) -> Self {
        Self {
            shape: vec![values.len()],
            data: T::wrap(values),
        }
    }

    /// Cria um array de dimensão zero.
    pub fn scalar<T: Element>(value: T) -> Self {
        Self {
            shape: Vec::new(),
            data: T::wrap(vec![value]),
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Número de elementos.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn dtype(&self) -> Dtype {
        self.data.dtype()
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    /// Empresta os elementos se o array contém `T`.
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::view(&self.data)
    }

    /// Retorna os mesmos dados sob um novo shape com o mesmo número de elementos.
    pub fn reshape(self, shape: Vec<usize>) -> GoldfileResult<Self> {
        Self::from_data(shape, self.data)
    }

    /// Converte um índice linear row-major em multi-índice.
    pub fn unravel(&self, flat: usize) -> Vec<usize> {
        let mut index = vec![0; self.shape.len()];
        let mut rest = flat;
        for (axis, &dim) in self.shape.iter().enumerate().rev() {
            if dim == 0 {
                continue;
            }
            index[axis] = rest % dim;
            rest /= dim;
        }
        index
    }
}

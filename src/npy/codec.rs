//! Leitura e escrita de payloads `.npy`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::types::array::{element_count, ArrayData, Dtype, NdArray};
use crate::{GoldfileError, GoldfileResult};

use super::header::{ByteOrder, Header};

/// String mágica no início de todo arquivo `.npy`.
pub const MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Cabeçalhos recebem padding para que o payload comece neste alinhamento.
const ALIGNMENT: usize = 64;

/// Lê um array de um stream `.npy`.
pub fn read_npy<R: Read>(mut reader: R) -> GoldfileResult<NdArray> {
    let mut magic = [0u8; 6];
    read_exact(&mut reader, &mut magic, "magic string")?;
    if &magic != MAGIC {
        return Err(GoldfileError::format("missing \\x93NUMPY magic string"));
    }

    let mut version = [0u8; 2];
    read_exact(&mut reader, &mut version, "format version")?;
    let header_len = match version[0] {
        1 => {
            let mut len = [0u8; 2];
            read_exact(&mut reader, &mut len, "header length")?;
            u16::from_le_bytes(len) as usize
        }
        2 | 3 => {
            let mut len = [0u8; 4];
            read_exact(&mut reader, &mut len, "header length")?;
            u32::from_le_bytes(len) as usize
        }
        major => {
            return Err(GoldfileError::format(format!(
                "unsupported format version {}.{}",
                major, version[1]
            )))
        }
    };

    let raw_header = read_bounded(&mut reader, header_len, "header")?;
    let text = std::str::from_utf8(&raw_header)
        .map_err(|_| GoldfileError::format("header is not valid UTF-8"))?;
    let header = Header::parse(text)?;

    let count = element_count(&header.shape)
        .ok_or_else(|| GoldfileError::format(format!("shape {:?} overflows", header.shape)))?;
    let byte_len = count
        .checked_mul(header.dtype.size())
        .ok_or_else(|| GoldfileError::format("payload size overflows"))?;

    let payload = read_bounded(&mut reader, byte_len, "array data")?;

    let data = decode(&payload, header.dtype, header.byte_order);
    let data = if header.fortran_order && header.shape.len() > 1 {
        data.permute(&fortran_to_c_order(&header.shape))
    } else {
        data
    };

    NdArray::from_data(header.shape, data)
}

/// Escreve um array como stream `.npy` little-endian em ordem C.
pub fn write_npy<W: Write>(mut writer: W, array: &NdArray) -> GoldfileResult<()> {
    let header = Header::for_array(array.dtype(), array.shape());
    writer.write_all(&preamble(&header)?)?;
    writer.write_all(&encode(array.data()))?;
    writer.flush()?;
    Ok(())
}

/// Lê um array de um arquivo `.npy`.
pub fn load<P: AsRef<Path>>(path: P) -> GoldfileResult<NdArray> {
    let file = File::open(path.as_ref())?;
    read_npy(BufReader::new(file))
}

/// Escreve um array em um arquivo `.npy`, substituindo-o se existir.
///
/// Escrita simples; slots passam pela gravação atômica do cache.
pub fn save<P: AsRef<Path>>(path: P, array: &NdArray) -> GoldfileResult<()> {
    let file = File::create(path.as_ref())?;
    write_npy(BufWriter::new(file), array)
}

/// Serializa um array para uma imagem `.npy` em memória.
pub fn to_bytes(array: &NdArray) -> GoldfileResult<Vec<u8>> {
    let mut buf = Vec::new();
    write_npy(&mut buf, array)?;
    Ok(buf)
}

/// Interpreta uma imagem `.npy` em memória.
pub fn from_bytes(bytes: &[u8]) -> GoldfileResult<NdArray> {
    read_npy(bytes)
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> GoldfileResult<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            GoldfileError::format(format!("truncated file while reading {}", what))
        } else {
            GoldfileError::Io(e)
        }
    })
}

/// Lê exatamente `len` bytes sem confiar em `len` para alocar.
///
/// O buffer cresce conforme os dados chegam, então um cabeçalho que declara
/// mais bytes do que o arquivo contém termina em erro de formato.
fn read_bounded<R: Read>(reader: &mut R, len: usize, what: &str) -> GoldfileResult<Vec<u8>> {
    let mut buf = Vec::new();
    reader.by_ref().take(len as u64).read_to_end(&mut buf)?;
    if buf.len() != len {
        return Err(GoldfileError::format(format!(
            "truncated file while reading {}",
            what
        )));
    }
    Ok(buf)
}

/// Magic, versão, tamanho e texto do cabeçalho com padding.
fn preamble(header: &Header) -> GoldfileResult<Vec<u8>> {
    let dict = header.to_dict();

    // 1.0 guarda o tamanho do cabeçalho como u16, 2.0 como u32
    let (major, len_bytes) = if dict.len() + 1 + ALIGNMENT <= u16::MAX as usize {
        (1u8, 2usize)
    } else {
        (2u8, 4usize)
    };
    let fixed = MAGIC.len() + 2 + len_bytes;
    let unpadded = fixed + dict.len() + 1;
    let padding = (ALIGNMENT - unpadded % ALIGNMENT) % ALIGNMENT;
    let header_len = dict.len() + padding + 1;

    let mut out = Vec::with_capacity(fixed + header_len);
    out.extend_from_slice(MAGIC);
    out.push(major);
    out.push(0);
    if major == 1 {
        let len = u16::try_from(header_len)
            .map_err(|_| GoldfileError::format("header too long for format 1.0"))?;
        out.extend_from_slice(&len.to_le_bytes());
    } else {
        let len = u32::try_from(header_len)
            .map_err(|_| GoldfileError::format("header too long for format 2.0"))?;
        out.extend_from_slice(&len.to_le_bytes());
    }
    out.extend_from_slice(dict.as_bytes());
    out.resize(out.len() + padding, b' ');
    out.push(b'\n');
    Ok(out)
}

macro_rules! decode_as {
    ($bytes:expr, $order:expr, $ty:ty, $variant:ident) => {{
        const N: usize = std::mem::size_of::<$ty>();
        ArrayData::$variant(
            $bytes
                .chunks_exact(N)
                .map(|chunk| {
                    let mut raw = [0u8; N];
                    raw.copy_from_slice(chunk);
                    match $order {
                        ByteOrder::Little => <$ty>::from_le_bytes(raw),
                        ByteOrder::Big => <$ty>::from_be_bytes(raw),
                    }
                })
                .collect(),
        )
    }};
}

fn decode(bytes: &[u8], dtype: Dtype, order: ByteOrder) -> ArrayData {
    match dtype {
        Dtype::Bool => ArrayData::Bool(bytes.iter().map(|&b| b != 0).collect()),
        Dtype::I8 => decode_as!(bytes, order, i8, I8),
        Dtype::I16 => decode_as!(bytes, order, i16, I16),
        Dtype::I32 => decode_as!(bytes, order, i32, I32),
        Dtype::I64 => decode_as!(bytes, order, i64, I64),
        Dtype::U8 => ArrayData::U8(bytes.to_vec()),
        Dtype::U16 => decode_as!(bytes, order, u16, U16),
        Dtype::U32 => decode_as!(bytes, order, u32, U32),
        Dtype::U64 => decode_as!(bytes, order, u64, U64),
        Dtype::F32 => decode_as!(bytes, order, f32, F32),
        Dtype::F64 => decode_as!(bytes, order, f64, F64),
    }
}

fn encode(data: &ArrayData) -> Vec<u8> {
    match data {
        ArrayData::Bool(v) => v.iter().map(|&b| b as u8).collect(),
        ArrayData::I8(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
        ArrayData::I16(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
        ArrayData::I32(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
        ArrayData::I64(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
        ArrayData::U8(v) => v.clone(),
        ArrayData::U16(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
        ArrayData::U32(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
        ArrayData::U64(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
        ArrayData::F32(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
        ArrayData::F64(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
    }
}

/// Para cada posição em ordem C, a posição do mesmo elemento em um
/// buffer column-major com o shape dado.
fn fortran_to_c_order(shape: &[usize]) -> Vec<usize> {
    let count = shape.iter().product::<usize>();
    let mut f_strides = vec![1usize; shape.len()];
    for axis in 1..shape.len() {
        f_strides[axis] = f_strides[axis - 1] * shape[axis - 1];
    }

    let mut order: Vec<usize> = Vec::with_capacity(count);
    let mut index = vec![0usize; shape.len()];
    for _ in 0..count {
        order.push(index.iter().zip(&f_strides).map(|(i, s)| i * s).sum());
        // avança o multi-índice em ordem C, último eixo mais rápido
        for axis in (0..shape.len()).rev() {
            index[axis] += 1;
            if index[axis] < shape[axis] {
                break;
            }
            index[axis] = 0;
        }
    }
    order
}

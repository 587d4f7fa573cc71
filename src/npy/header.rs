//! Cabeçalho `.npy`: o literal de dict Python que descreve dtype, ordem e shape.

use crate::types::array::Dtype;
use crate::{GoldfileError, GoldfileResult};

/// Ordem de bytes do payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    /// Ordem de bytes da máquina atual.
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }
}

/// Cabeçalho interpretado de um arquivo `.npy`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub dtype: Dtype,
    pub byte_order: ByteOrder,
    pub fortran_order: bool,
    pub shape: Vec<usize>,
}

impl Header {
    /// Cabeçalho para escrever um array little-endian em ordem C.
    pub fn for_array(dtype: Dtype, shape: &[usize]) -> Self {
        Self {
            dtype,
            byte_order: ByteOrder::Little,
            fortran_order: false,
            shape: shape.to_vec(),
        }
    }

    /// Descritor de tipo, ex: `<f8` ou `|u1`.
    pub fn descr(&self) -> String {
        let order = if self.dtype.size() == 1 {
            '|'
        } else {
            match self.byte_order {
                ByteOrder::Little => '<',
                ByteOrder::Big => '>',
            }
        };
        format!("{}{}{}", order, self.dtype.kind(), self.dtype.size())
    }

    /// Gera o literal do dict, sem padding nem quebra de linha final.
    pub fn to_dict(&self) -> String {
        let shape = match self.shape.as_slice() {
            [] => "()".to_string(),
            [only] => format!("({},)", only),
            dims => format!(
                "({})",
                dims.iter()
                    .map(|d| d.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        };
        format!(
            "{{'descr': '{}', 'fortran_order': {}, 'shape': {}, }}",
            self.descr(),
            if self.fortran_order { "True" } else { "False" },
            shape
        )
    }

    /// Interpreta o literal do dict encontrado no cabeçalho de um arquivo.
    pub fn parse(text: &str) -> GoldfileResult<Self> {
        let entries = DictParser::new(text).parse()?;

        let mut descr = None;
        let mut fortran_order = None;
        let mut shape = None;

        for (key, value) in entries {
            match (key.as_str(), value) {
                ("descr", Value::Str(s)) => descr = Some(s),
                ("fortran_order", Value::Bool(b)) => fortran_order = Some(b),
                ("shape", Value::Tuple(dims)) => shape = Some(dims),
                ("descr" | "fortran_order" | "shape", other) => {
                    return Err(GoldfileError::format(format!(
                        "unexpected value for '{}': {:?}",
                        key, other
                    )))
                }
                (other, _) => {
                    return Err(GoldfileError::format(format!("unexpected header key '{}'", other)))
                }
            }
        }

        let descr = descr.ok_or_else(|| GoldfileError::format("header is missing 'descr'"))?;
        let (dtype, byte_order) = parse_descr(&descr)?;

        Ok(Self {
            dtype,
            byte_order,
            fortran_order: fortran_order
                .ok_or_else(|| GoldfileError::format("header is missing 'fortran_order'"))?,
            shape: shape.ok_or_else(|| GoldfileError::format("header is missing 'shape'"))?,
        })
    }
}

/// Separa um descritor como `>i4` em dtype e ordem de bytes.
fn parse_descr(descr: &str) -> GoldfileResult<(Dtype, ByteOrder)> {
    let mut chars = descr.chars();
    let (order, kind) = match chars.next() {
        Some('<') => (ByteOrder::Little, chars.next()),
        Some('>') => (ByteOrder::Big, chars.next()),
        Some('=') | Some('|') => (ByteOrder::native(), chars.next()),
        first => (ByteOrder::native(), first),
    };
    let kind = kind.ok_or_else(|| GoldfileError::format(format!("empty dtype '{}'", descr)))?;
    let size: usize = chars
        .as_str()
        .parse()
        .map_err(|_| GoldfileError::format(format!("bad dtype size in '{}'", descr)))?;

    let dtype = Dtype::from_kind_size(kind, size)
        .ok_or_else(|| GoldfileError::format(format!("unsupported dtype '{}'", descr)))?;
    Ok((dtype, order))
}

#[derive(Debug)]
enum Value {
    Str(String),
    Bool(bool),
    Tuple(Vec<usize>),
}

/// Parser para o pequeno subconjunto de literais Python que o numpy escreve.
struct DictParser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> DictParser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    fn parse(mut self) -> GoldfileResult<Vec<(String, Value)>> {
        let mut entries = Vec::new();
        self.expect(b'{')?;
        loop {
            self.skip_ws();
            if self.eat(b'}') {
                break;
            }
            let key = self.string()?;
            self.skip_ws();
            self.expect(b':')?;
            let value = self.value()?;
            entries.push((key, value));
            self.skip_ws();
            if self.eat(b',') {
                continue;
            }
            self.expect(b'}')?;
            break;
        }
        self.skip_ws();
        if self.pos != self.bytes.len() {
            return Err(self.error("trailing characters after header dict"));
        }
        Ok(entries)
    }

    fn value(&mut self) -> GoldfileResult<Value> {
        self.skip_ws();
        match self.peek() {
            Some(b'\'') | Some(b'"') => Ok(Value::Str(self.string()?)),
            Some(b'(') => Ok(Value::Tuple(self.tuple()?)),
            Some(b'T') if self.eat_word("True") => Ok(Value::Bool(true)),
            Some(b'F') if self.eat_word("False") => Ok(Value::Bool(false)),
            Some(b'[') => Err(self.error("structured dtypes are not supported")),
            _ => Err(self.error("unsupported header value")),
        }
    }

    fn string(&mut self) -> GoldfileResult<String> {
        let quote = match self.peek() {
            Some(q @ (b'\'' | b'"')) => q,
            _ => return Err(self.error("expected string")),
        };
        self.pos += 1;
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == quote {
                let s = String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();
                self.pos += 1;
                return Ok(s);
            }
            self.pos += 1;
        }
        Err(self.error("unterminated string"))
    }

    fn tuple(&mut self) -> GoldfileResult<Vec<usize>> {
        self.expect(b'(')?;
        let mut dims = Vec::new();
        loop {
            self.skip_ws();
            if self.eat(b')') {
                return Ok(dims);
            }
            dims.push(self.integer()?);
            self.skip_ws();
            if self.eat(b',') {
                continue;
            }
            self.expect(b')')?;
            return Ok(dims);
        }
    }

    fn integer(&mut self) -> GoldfileResult<usize> {
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected dimension"));
        }
        let digits = std::str::from_utf8(&self.bytes[start..self.pos])
            .map_err(|_| self.error("invalid dimension"))?;
        let value = digits
            .parse()
            .map_err(|_| self.error("dimension out of range"))?;
        // longs do Python 2 têm sufixo L.
        self.eat(b'L');
        Ok(value)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.bytes[self.pos..].starts_with(word.as_bytes()) {
            self.pos += word.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, b: u8) -> GoldfileResult<()> {
        self.skip_ws();
        if self.eat(b) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", b as char)))
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn error(&self, msg: &str) -> GoldfileError {
        GoldfileError::format(format!("{} at header offset {}", msg, self.pos))
    }
}

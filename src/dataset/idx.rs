//! Codec for the tagged binary array format used by the item and label files.
//!
//! # File layout
//! ```text
//! bytes  0-1:  reserved (ignored)
//! byte   2:    element-type tag
//! byte   3:    dimension count D
//! bytes  4..:  D big-endian u32 dimension sizes
//! rest:        row-major payload of Π(dims) elements of the tagged width
//! ```
//!
//! Tags and widths:
//! ```text
//! 0x08  unsigned 8-bit   1 byte
//! 0x09  signed 8-bit     1 byte
//! 0x0B  short            1 byte
//! 0x0C  int              4 bytes
//! 0x0D  float            4 bytes
//! 0x0E  double           8 bytes
//! ```
//!
//! Item files (`D ≥ 2`): dimension 0 is the example count; the remaining
//! dimensions are flattened, so each example becomes one column of the output
//! matrix. Byte-wide elements are intensities and are normalized by 255.0;
//! wider elements are stored as decoded.
//!
//! Label files (`D = 1`): dimension 0 is the label count; values are returned
//! raw, one integer per example.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use byteorder::{BigEndian, ReadBytesExt};

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Element-type tag from byte 2 of the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Unsigned8,
    Signed8,
    Short,
    Int,
    Float,
    Double,
}

impl ElementType {
    pub fn from_tag(tag: u8) -> Result<ElementType> {
        match tag {
            0x08 => Ok(ElementType::Unsigned8),
            0x09 => Ok(ElementType::Signed8),
            0x0B => Ok(ElementType::Short),
            0x0C => Ok(ElementType::Int),
            0x0D => Ok(ElementType::Float),
            0x0E => Ok(ElementType::Double),
            other => Err(Error::Decode(format!(
                "unknown element-type tag 0x{other:02X}"
            ))),
        }
    }

    /// Payload width in bytes. `Short` is one byte wide in this format.
    pub fn width(self) -> usize {
        match self {
            ElementType::Unsigned8 | ElementType::Signed8 | ElementType::Short => 1,
            ElementType::Int | ElementType::Float => 4,
            ElementType::Double => 8,
        }
    }
}

/// How 4- and 8-byte payload elements are interpreted.
///
/// `Legacy` concatenates the big-endian bytes into an integer and takes that
/// integer's magnitude as the numeric value, even when the tag says float or
/// double. Files written against the historical reader decode identically
/// under this mode, which is why it is the default — but it is almost
/// certainly not what the float tags intend. `Ieee` reads the float tags as
/// standard big-endian IEEE-754 bit patterns. The two modes agree on the
/// integer tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumericDecode {
    #[default]
    Legacy,
    Ieee,
}

struct Header {
    ty: ElementType,
    dims: Vec<usize>,
}

fn truncated(what: &str) -> Error {
    Error::Decode(format!("unexpected end of data while reading {what}"))
}

fn read_header(cur: &mut Cursor<&[u8]>) -> Result<Header> {
    cur.read_u16::<BigEndian>()
        .map_err(|_| truncated("the reserved prefix"))?;
    let ty = ElementType::from_tag(cur.read_u8().map_err(|_| truncated("the element-type tag"))?)?;
    let dims_no = cur.read_u8().map_err(|_| truncated("the dimension count"))? as usize;

    let mut dims = Vec::with_capacity(dims_no);
    for i in 0..dims_no {
        let size = cur
            .read_u32::<BigEndian>()
            .map_err(|_| truncated(&format!("the size of dimension {i}")))?;
        dims.push(size as usize);
    }

    Ok(Header { ty, dims })
}

/// Decodes one element at the cursor. Returns the raw numeric value; the
/// caller decides about normalization.
fn read_element(cur: &mut Cursor<&[u8]>, ty: ElementType, mode: NumericDecode) -> Result<f64> {
    let eof = || truncated("a payload element");
    let v = match ty {
        ElementType::Unsigned8 | ElementType::Short => cur.read_u8().map_err(|_| eof())? as f64,
        ElementType::Signed8 => cur.read_i8().map_err(|_| eof())? as f64,
        ElementType::Int => cur.read_i32::<BigEndian>().map_err(|_| eof())? as f64,
        ElementType::Float => match mode {
            NumericDecode::Legacy => cur.read_i32::<BigEndian>().map_err(|_| eof())? as f32 as f64,
            NumericDecode::Ieee => cur.read_f32::<BigEndian>().map_err(|_| eof())? as f64,
        },
        ElementType::Double => match mode {
            NumericDecode::Legacy => cur.read_i64::<BigEndian>().map_err(|_| eof())? as f64,
            NumericDecode::Ieee => cur.read_f64::<BigEndian>().map_err(|_| eof())?,
        },
    };
    Ok(v)
}

/// Parses an item byte stream into an F×N matrix: one column per example,
/// F = product of all dimensions past the first.
pub fn decode_items(bytes: &[u8], mode: NumericDecode) -> Result<Matrix> {
    let mut cur = Cursor::new(bytes);
    let header = read_header(&mut cur)?;

    if header.dims.len() < 2 {
        return Err(Error::Decode(format!(
            "item data needs at least 2 dimensions, found {}",
            header.dims.len()
        )));
    }

    let examples = header.dims[0];
    let mut slice_len = 1usize;
    for &d in &header.dims[1..] {
        slice_len = slice_len
            .checked_mul(d)
            .ok_or_else(|| Error::Decode("dimension product overflows usize".to_owned()))?;
    }

    let needed = examples
        .checked_mul(slice_len)
        .and_then(|n| n.checked_mul(header.ty.width()))
        .ok_or_else(|| Error::Decode("payload length overflows usize".to_owned()))?;
    let available = bytes.len() - cur.position() as usize;
    if available < needed {
        return Err(Error::Decode(format!(
            "payload truncated: {examples} examples of {slice_len} elements need {needed} bytes, found {available}"
        )));
    }

    let normalize = header.ty.width() == 1;
    let mut items = Matrix::zeros(slice_len, examples);
    for c in 0..examples {
        for r in 0..slice_len {
            let raw = read_element(&mut cur, header.ty, mode)?;
            items.data[r][c] = if normalize { raw / 255.0 } else { raw };
        }
    }

    Ok(items)
}

/// Parses a label byte stream into one raw integer per example.
pub fn decode_labels(bytes: &[u8], mode: NumericDecode) -> Result<Vec<i64>> {
    let mut cur = Cursor::new(bytes);
    let header = read_header(&mut cur)?;

    if header.dims.len() != 1 {
        return Err(Error::Decode(format!(
            "label data must be 1-dimensional, found {} dimensions",
            header.dims.len()
        )));
    }

    let count = header.dims[0];
    let needed = count
        .checked_mul(header.ty.width())
        .ok_or_else(|| Error::Decode("payload length overflows usize".to_owned()))?;
    let available = bytes.len() - cur.position() as usize;
    if available < needed {
        return Err(Error::Decode(format!(
            "payload truncated: {count} labels need {needed} bytes, found {available}"
        )));
    }

    let mut labels = Vec::with_capacity(count);
    for _ in 0..count {
        labels.push(read_element(&mut cur, header.ty, mode)? as i64);
    }

    Ok(labels)
}

/// Reads and decodes an item file.
pub fn load_items(path: impl AsRef<Path>, mode: NumericDecode) -> Result<Matrix> {
    let path = path.as_ref();
    let bytes = fs::read(path)
        .map_err(|e| Error::Decode(format!("cannot read '{}': {e}", path.display())))?;
    decode_items(&bytes, mode)
}

/// Reads and decodes a label file.
pub fn load_labels(path: impl AsRef<Path>, mode: NumericDecode) -> Result<Vec<i64>> {
    let path = path.as_ref();
    let bytes = fs::read(path)
        .map_err(|e| Error::Decode(format!("cannot read '{}': {e}", path.display())))?;
    decode_labels(&bytes, mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a byte stream: reserved prefix, tag, dimension sizes, payload.
    fn stream(tag: u8, dims: &[u32], payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0x00, 0x00, tag, dims.len() as u8];
        for d in dims {
            bytes.extend_from_slice(&d.to_be_bytes());
        }
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn u8_labels_decode_raw() {
        // ASCII '5' stays 0x35; masking to a class index is the trainer's job.
        let bytes = stream(0x08, &[4], &[0, 9, 3, 0x35]);
        let labels = decode_labels(&bytes, NumericDecode::Legacy).unwrap();
        assert_eq!(labels, vec![0, 9, 3, 0x35]);
    }

    #[test]
    fn signed8_labels_keep_their_sign() {
        let bytes = stream(0x09, &[2], &[0xFF, 0x05]);
        let labels = decode_labels(&bytes, NumericDecode::Legacy).unwrap();
        assert_eq!(labels, vec![-1, 5]);
    }

    #[test]
    fn int_labels_concatenate_big_endian() {
        let bytes = stream(0x0C, &[2], &[0, 0, 1, 44, 255, 255, 255, 255]);
        let labels = decode_labels(&bytes, NumericDecode::Legacy).unwrap();
        assert_eq!(labels, vec![300, -1]);
    }

    #[test]
    fn two_by_three_items_land_column_per_example() {
        let bytes = stream(0x08, &[2, 3], &[0, 85, 170, 255, 128, 64]);
        let items = decode_items(&bytes, NumericDecode::Legacy).unwrap();

        assert_eq!(items.rows, 3);
        assert_eq!(items.cols, 2);
        assert_eq!(items.column(0), vec![0.0, 85.0 / 255.0, 170.0 / 255.0]);
        assert_eq!(items.column(1), vec![1.0, 128.0 / 255.0, 64.0 / 255.0]);
    }

    #[test]
    fn byte_wide_items_normalize_into_unit_interval() {
        let payload: Vec<u8> = (0..=255).collect();
        let bytes = stream(0x08, &[16, 4, 4], &payload);
        let items = decode_items(&bytes, NumericDecode::Legacy).unwrap();
        for c in 0..items.cols {
            for v in items.column(c) {
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn extra_dimensions_multiply_into_the_slice_length() {
        let bytes = stream(0x08, &[2, 2, 3, 2], &[0u8; 24]);
        let items = decode_items(&bytes, NumericDecode::Legacy).unwrap();
        assert_eq!(items.rows, 12);
        assert_eq!(items.cols, 2);
    }

    #[test]
    fn float_items_diverge_between_modes() {
        // 0x3F800000 is 1.0f32; the legacy reading takes the bits as an integer.
        let bytes = stream(0x0D, &[1, 1], &[0x3F, 0x80, 0x00, 0x00]);

        let ieee = decode_items(&bytes, NumericDecode::Ieee).unwrap();
        assert_eq!(ieee.data[0][0], 1.0);

        let legacy = decode_items(&bytes, NumericDecode::Legacy).unwrap();
        assert!(legacy.data[0][0] > 1.0e9, "legacy mode reads raw integer magnitude");
    }

    #[test]
    fn double_items_follow_the_same_split() {
        let bytes = stream(0x0E, &[1, 1], &1.5f64.to_be_bytes());

        let ieee = decode_items(&bytes, NumericDecode::Ieee).unwrap();
        assert_eq!(ieee.data[0][0], 1.5);

        let legacy = decode_items(&bytes, NumericDecode::Legacy).unwrap();
        assert_eq!(legacy.data[0][0], i64::from_be_bytes(1.5f64.to_be_bytes()) as f64);
    }

    #[test]
    fn int_items_skip_normalization() {
        let bytes = stream(0x0C, &[1, 2], &[0, 0, 1, 44, 0, 0, 0, 7]);
        let items = decode_items(&bytes, NumericDecode::Legacy).unwrap();
        assert_eq!(items.column(0), vec![300.0, 7.0]);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let bytes = stream(0x0A, &[1], &[0]);
        assert!(decode_labels(&bytes, NumericDecode::Legacy).is_err());
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let bytes = stream(0x08, &[2, 3], &[0, 85, 170]);
        let err = decode_items(&bytes, NumericDecode::Legacy).unwrap_err();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn truncated_header_is_rejected() {
        assert!(decode_labels(&[0x00], NumericDecode::Legacy).is_err());
        assert!(decode_labels(&stream(0x08, &[], &[])[..3], NumericDecode::Legacy).is_err());
    }

    #[test]
    fn one_dimensional_items_are_rejected() {
        let bytes = stream(0x08, &[3], &[1, 2, 3]);
        assert!(decode_items(&bytes, NumericDecode::Legacy).is_err());
    }

    #[test]
    fn multi_dimensional_labels_are_rejected() {
        let bytes = stream(0x08, &[1, 3], &[1, 2, 3]);
        assert!(decode_labels(&bytes, NumericDecode::Legacy).is_err());
    }
}

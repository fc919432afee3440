//! `local` stream element types, and the dynamic-width / transpose
//! transforms applied to them at VB finalize time.
//!
//! Grounded on spec §4.3's ltype table; dynamic-width narrowing and the
//! matrix transpose are genozip-original transforms with no direct teacher
//! counterpart, so they're modeled after the other examples' columnar int
//! packing (`other_examples/blosc-context.rs.rs`'s shuffle-then-narrow
//! pipeline for the width-reduction shape).

/// The local stream's element layout. Selected per-context at segmentation
/// time, except `DynInt` which is resolved to a concrete width at finalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    Hex8,
    Hex16,
    Hex32,
    Hex64,
    Bitmap,
    TransposedU8,
    TransposedU16,
    TransposedU32,
    Sequence,
    DynInt,
}

impl LType {
    pub fn is_signed(self) -> bool {
        matches!(self, LType::I8 | LType::I16 | LType::I32 | LType::I64)
    }

    pub fn is_transposed(self) -> bool {
        matches!(
            self,
            LType::TransposedU8 | LType::TransposedU32 | LType::TransposedU16
        )
    }
}

/// Zig-zag interlace: maps signed integers onto the unsigned range so small
/// magnitudes (either sign) produce small encoded values.
pub fn zigzag_encode(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

pub fn zigzag_decode(v: u64) -> i64 {
    ((v >> 1) as i64) ^ -((v & 1) as i64)
}

/// Narrowest unsigned integer type spanning `[min, max]`, after reserving
/// the top value of each candidate width as the "missing" sentinel per
/// spec §4.3 ("if max occupies the top value of a type, round up").
fn narrowest_unsigned(min: u64, max: u64) -> LType {
    let _ = min;
    if max < u8::MAX as u64 {
        LType::U8
    } else if max < u16::MAX as u64 {
        LType::U16
    } else if max < u32::MAX as u64 {
        LType::U32
    } else {
        LType::U64
    }
}

/// Scans a slice of signed values and returns the chosen `LType` plus the
/// zig-zagged, width-reduced byte buffer (little-endian).
pub fn reduce_dyn_int_signed(values: &[i64]) -> (LType, Vec<u8>) {
    let zz: Vec<u64> = values.iter().map(|&v| zigzag_encode(v)).collect();
    let max = zz.iter().copied().max().unwrap_or(0);
    let ltype = match narrowest_unsigned(0, max) {
        LType::U8 => LType::I8,
        LType::U16 => LType::I16,
        LType::U32 => LType::I32,
        _ => LType::I64,
    };
    let bytes = pack_unsigned(&zz, unsigned_counterpart(ltype));
    (ltype, bytes)
}

/// Scans a slice of unsigned values and returns the chosen `LType` plus the
/// width-reduced little-endian byte buffer.
pub fn reduce_dyn_int_unsigned(values: &[u64]) -> (LType, Vec<u8>) {
    let max = values.iter().copied().max().unwrap_or(0);
    let min = values.iter().copied().min().unwrap_or(0);
    let ltype = narrowest_unsigned(min, max);
    let bytes = pack_unsigned(values, ltype);
    (ltype, bytes)
}

fn unsigned_counterpart(signed: LType) -> LType {
    match signed {
        LType::I8 => LType::U8,
        LType::I16 => LType::U16,
        LType::I32 => LType::U32,
        _ => LType::U64,
    }
}

fn pack_unsigned(values: &[u64], ltype: LType) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * width_bytes(ltype));
    for &v in values {
        match ltype {
            LType::U8 => out.push(v as u8),
            LType::U16 => out.extend_from_slice(&(v as u16).to_le_bytes()),
            LType::U32 => out.extend_from_slice(&(v as u32).to_le_bytes()),
            _ => out.extend_from_slice(&v.to_le_bytes()),
        }
    }
    out
}

pub fn width_bytes(ltype: LType) -> usize {
    match ltype {
        LType::U8 | LType::I8 | LType::Hex8 => 1,
        LType::U16 | LType::I16 | LType::Hex16 | LType::TransposedU16 => 2,
        LType::U32 | LType::I32 | LType::Hex32 | LType::TransposedU32 => 4,
        LType::U64 | LType::I64 | LType::Hex64 => 8,
        LType::TransposedU8 => 1,
        LType::Bitmap | LType::Sequence | LType::DynInt => 1,
    }
}

/// Transposes a row-major matrix of `cols` columns into column-major order,
/// treating each `elem_width`-byte run of `src` as one opaque matrix entry
/// (so it works for any chosen integer width without a generic type param).
/// Returns `None` (transpose abandoned) if `cols` or `elem_width` is zero,
/// `src.len()` isn't a whole number of `elem_width`-sized entries, or the
/// entry count isn't a multiple of `cols` — per spec §4.3, the buffer is
/// then emitted untransposed.
pub fn transpose_bytes(src: &[u8], cols: usize, elem_width: usize) -> Option<Vec<u8>> {
    if cols == 0 || elem_width == 0 || !src.len().is_multiple_of(elem_width) {
        return None;
    }
    let n_elems = src.len() / elem_width;
    if !n_elems.is_multiple_of(cols) {
        return None;
    }
    let rows = n_elems / cols;
    let mut dst = vec![0u8; src.len()];
    for r in 0..rows {
        for c in 0..cols {
            let s = (r * cols + c) * elem_width;
            let d = (c * rows + r) * elem_width;
            dst[d..d + elem_width].copy_from_slice(&src[s..s + elem_width]);
        }
    }
    Some(dst)
}

/// Transposes a row-major matrix of `cols` columns into column-major order:
/// `dst[c * rows + r] = src[r * cols + c]`. Returns `None` (transpose
/// abandoned) if `src.len()` isn't a multiple of `cols`, per spec §4.3.
pub fn transpose<T: Copy + Default>(src: &[T], cols: usize) -> Option<Vec<T>> {
    if cols == 0 || !src.len().is_multiple_of(cols) {
        return None;
    }
    let rows = src.len() / cols;
    let mut dst = vec![T::default(); src.len()];
    for r in 0..rows {
        for c in 0..cols {
            dst[c * rows + r] = src[r * cols + c];
        }
    }
    Some(dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zigzag_round_trips_negatives_and_positives() {
        for v in [-5i64, -1, 0, 1, 5, i32::MIN as i64, i32::MAX as i64] {
            assert_eq!(zigzag_decode(zigzag_encode(v)), v);
        }
    }

    #[test]
    fn dyn_int_picks_u8_for_small_range() {
        let (lt, bytes) = reduce_dyn_int_unsigned(&[1, 2, 3, 254]);
        assert_eq!(lt, LType::U8);
        assert_eq!(bytes.len(), 4);
    }

    #[test]
    fn dyn_int_reserves_top_value_as_missing_sentinel() {
        // max == 0xff (u8::MAX) must round up to u16, since 0xff is reserved.
        let (lt, _) = reduce_dyn_int_unsigned(&[1, 2, 0xff]);
        assert_eq!(lt, LType::U16);
    }

    #[test]
    fn transpose_round_trips() {
        let src = vec![1u8, 2, 3, 4, 5, 6]; // 2 rows x 3 cols
        let t = transpose(&src, 3).unwrap();
        assert_eq!(t, vec![1, 4, 2, 5, 3, 6]);
        let back = transpose(&t, 2).unwrap(); // 3 rows x 2 cols -> transpose back
        assert_eq!(back, src);
    }

    #[test]
    fn transpose_abandoned_on_uneven_length() {
        let src = vec![1u8, 2, 3, 4, 5];
        assert!(transpose(&src, 3).is_none());
    }

    #[test]
    fn transpose_bytes_round_trips_u16_elements() {
        // 2 rows x 3 cols of u16 little-endian entries.
        let src: Vec<u8> = [1u16, 2, 3, 4, 5, 6]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let t = transpose_bytes(&src, 3, 2).unwrap();
        let expect: Vec<u8> = [1u16, 4, 2, 5, 3, 6]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        assert_eq!(t, expect);
    }

    #[test]
    fn transpose_bytes_abandoned_when_entry_count_not_divisible_by_cols() {
        let src = vec![0u8; 10]; // 5 u16 entries, not divisible by cols=3
        assert!(transpose_bytes(&src, 3, 2).is_none());
    }
}

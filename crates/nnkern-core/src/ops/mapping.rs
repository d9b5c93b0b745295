use super::{checked, require_data, require_size};
use crate::buffer::Vector;
use crate::dispatch;
use crate::element::{Element, GatherIndex};
use crate::error::{Error, Result};

/// Gather: `c[i] = base[indices[i]]`.
///
/// An empty `base` has nothing to point into and fails with
/// [`Error::InvalidPointer`]. Every index is checked against `base` before
/// anything is written.
pub fn cpu_mapping<T1, T2>(c: &mut Vector<T1>, base: &[T1], indices: &Vector<T2>) -> Result<()>
where
    T1: Element,
    T2: GatherIndex,
{
    checked("cpu_mapping", || {
        require_data("indices", indices)?;
        require_data("c", c)?;
        if base.is_empty() {
            return Err(Error::InvalidPointer { operand: "base" });
        }
        require_size("c", indices.len(), c.len())?;
        let len = base.len();
        match indices
            .as_slice()
            .iter()
            .find(|i| i.to_index().is_none_or(|i| i >= len))
        {
            Some(bad) => Err(Error::IndexOutOfRange {
                index: bad.to_i64(),
                len,
            }),
            None => Ok(()),
        }
    })?;
    dispatch::mapping(base, indices.as_slice(), c.as_mut_slice());
    Ok(())
}

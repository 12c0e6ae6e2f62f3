//! Alignment
//!
//! Natively, the align attribute in rust does not allow anything other than an integer literal.
//! RT-Thread, however, gives the alignment for stacks and message pools as `RT_ALIGN_SIZE` in
//! `rtconfig.h`.  This defines a bit of a trick to enforce alignment of structs to values given by
//! constants, along with the kernel's `RT_ALIGN` rounding.

use crate::kconfig;

/// The kernel's alignment for stacks and pools.
pub const RT_ALIGN: usize = kconfig::RT_ALIGN_SIZE;

/// Round `size` up to a multiple of [`RT_ALIGN`], as the kernel's `RT_ALIGN` macro does.
pub const fn align_up(size: usize) -> usize {
    size.next_multiple_of(RT_ALIGN)
}

/// Round `size` down to a multiple of [`RT_ALIGN`].
pub const fn align_down(size: usize) -> usize {
    size - size % RT_ALIGN
}

#[doc(hidden)]
pub struct AlignAsStruct;

#[doc(hidden)]
pub trait AlignAsTrait<const N: usize> {
    type Aligned;
}

macro_rules! impl_alignas {
    ( $($align:literal),* $(,)? ) => {
        $(
            const _: () = {
                #[repr(align($align))]
                pub struct Aligned;
                impl AlignAsTrait<$align> for AlignAsStruct {
                    type Aligned = Aligned;
                }
            };
        )*
    };
}
// RT_ALIGN_SIZE is a small power of two on every supported port.
impl_alignas!(1, 2, 4, 8, 16, 32, 64);

/// Align a given struct to a given alignment.  To use this, just include `AlignAs<N>` as the first
/// member of the struct.
#[repr(transparent)]
pub struct AlignAs<const N: usize>([<AlignAsStruct as AlignAsTrait<N>>::Aligned; 0])
where
    AlignAsStruct: AlignAsTrait<N>;

impl<const N: usize> AlignAs<N>
where
    AlignAsStruct: AlignAsTrait<N>,
{
    /// Construct a new AlignAs.
    ///
    /// It is zero bytes, but needs a constructor as the field is private.
    pub const fn new() -> AlignAs<N> {
        AlignAs([])
    }
}

impl<const N: usize> Default for AlignAs<N>
where
    AlignAsStruct: AlignAsTrait<N>,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_follows_rt_align() {
        assert_eq!(align_up(0), 0);
        assert_eq!(align_up(1), RT_ALIGN);
        assert_eq!(align_up(RT_ALIGN), RT_ALIGN);
        assert_eq!(align_down(RT_ALIGN * 3 + 1), RT_ALIGN * 3);
    }

    #[test]
    fn aligned_struct() {
        #[allow(dead_code)]
        struct Buf {
            align: AlignAs<RT_ALIGN>,
            data: [u8; 3],
        }
        assert_eq!(core::mem::align_of::<Buf>(), RT_ALIGN);
    }
}

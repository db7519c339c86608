//! Flat copy of the payload image to its execution address.

use core::fmt;
use core::ops::Range;

use crate::error::RelocateError;
use crate::payload::{PayloadDestination, PayloadImage};

/// Memory the payload is copied into.
pub trait PayloadRegion {
    /// Address the first payload byte lands at.
    fn destination(&self) -> PayloadDestination;

    /// Number of bytes the region can hold.
    fn capacity(&self) -> usize;

    /// Returns the first `len` bytes of the region for writing.
    ///
    /// Only called with `len <= self.capacity()`.
    fn window(&mut self, len: usize) -> &mut [u8];
}

/// A region of physical memory at a fixed address.
#[derive(Debug)]
pub struct PhysicalRegion {
    destination: PayloadDestination,
    capacity: usize,
}

impl PhysicalRegion {
    /// # Safety
    /// `destination..destination + capacity` must be writable RAM that nothing
    /// else reads or writes while the region is alive.
    pub const unsafe fn new(destination: PayloadDestination, capacity: usize) -> Self {
        Self {
            destination,
            capacity,
        }
    }
}

impl PayloadRegion for PhysicalRegion {
    fn destination(&self) -> PayloadDestination {
        self.destination
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn window(&mut self, len: usize) -> &mut [u8] {
        assert!(len <= self.capacity);
        // SAFETY: `new` guarantees exclusive, writable memory for `capacity`
        // bytes, and `&mut self` keeps the window unique.
        unsafe { core::slice::from_raw_parts_mut(self.destination.as_mut_ptr(), len) }
    }
}

/// Summary of a completed relocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relocation {
    pub source: usize,
    pub destination: PayloadDestination,
    pub len: usize,
}

impl fmt::Display for Relocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} bytes 0x{:x} -> 0x{:x}",
            self.len,
            self.source,
            self.destination.as_usize()
        )
    }
}

fn overlaps(a: Range<usize>, b: Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

/// Checks that `image` can be copied into `region` without touching either.
pub fn plan(
    image: PayloadImage<'_>,
    region: &impl PayloadRegion,
) -> Result<Relocation, RelocateError> {
    let destination = region.destination();
    let relocation = Relocation {
        source: image.base(),
        destination,
        len: image.len(),
    };
    if image.is_empty() {
        return Ok(relocation);
    }

    let capacity = region.capacity();
    if image.len() > capacity {
        return Err(RelocateError::DestinationTooSmall {
            required: image.len(),
            capacity,
        });
    }

    let source = image.base()..image.base() + image.len();
    let target = destination.as_usize()..destination.as_usize() + image.len();
    if overlaps(source, target) {
        return Err(RelocateError::Overlap);
    }
    Ok(relocation)
}

/// Copies `image` byte for byte into the start of `region`.
///
/// An empty image leaves the region untouched.
pub fn relocate(
    image: PayloadImage<'_>,
    region: &mut impl PayloadRegion,
) -> Result<Relocation, RelocateError> {
    let relocation = plan(image, &*region)?;
    if !image.is_empty() {
        region.window(image.len()).copy_from_slice(image.as_bytes());
    }
    Ok(relocation)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::vec;
    use std::vec::Vec;

    use super::*;

    /// Heap buffer standing in for physical memory.
    pub(crate) struct BufferRegion(pub Vec<u8>);

    impl PayloadRegion for BufferRegion {
        fn destination(&self) -> PayloadDestination {
            PayloadDestination::new(self.0.as_ptr() as usize)
        }

        fn capacity(&self) -> usize {
            self.0.len()
        }

        fn window(&mut self, len: usize) -> &mut [u8] {
            &mut self.0[..len]
        }
    }

    const PAYLOAD: [u8; 8] = [0x97, 0x02, 0x00, 0x00, 0x73, 0x00, 0x50, 0x10];

    #[test]
    fn copies_bytes_to_region_start() {
        let mut region = BufferRegion(vec![0xaa; 16]);
        let relocation = relocate(PayloadImage::new(&PAYLOAD), &mut region).unwrap();

        assert_eq!(8, relocation.len);
        assert_eq!(region.destination(), relocation.destination);
        assert_eq!(&PAYLOAD[..], &region.0[..8]);
        assert_eq!(&[0xaa; 8], &region.0[8..]);
    }

    #[test]
    fn relocating_twice_is_stable() {
        let mut region = BufferRegion(vec![0; 8]);
        relocate(PayloadImage::new(&PAYLOAD), &mut region).unwrap();
        let first = region.0.clone();
        relocate(PayloadImage::new(&PAYLOAD), &mut region).unwrap();
        assert_eq!(first, region.0);
        assert_eq!(&PAYLOAD[..], &region.0[..]);
    }

    #[test]
    fn empty_image_leaves_region_untouched() {
        let mut region = BufferRegion(vec![0x5a; 4]);
        let image = unsafe { PayloadImage::from_raw_parts(0x1949 as *const u8, 0) };
        let relocation = relocate(image, &mut region).unwrap();
        assert_eq!(0, relocation.len);
        assert_eq!(vec![0x5a; 4], region.0);
    }

    #[test]
    fn rejects_oversized_image() {
        let mut region = BufferRegion(vec![0; 4]);
        assert_eq!(
            Err(RelocateError::DestinationTooSmall {
                required: 8,
                capacity: 4
            }),
            relocate(PayloadImage::new(&PAYLOAD), &mut region)
        );
        assert_eq!(vec![0; 4], region.0);
    }

    #[test]
    fn rejects_overlap() {
        let mut region = BufferRegion(PAYLOAD.to_vec());
        let alias = unsafe { PayloadImage::from_raw_parts(region.0.as_ptr(), 4) };
        assert_eq!(Err(RelocateError::Overlap), relocate(alias, &mut region));
    }

    #[test]
    fn plan_matches_relocate_without_copying() {
        let region = BufferRegion(vec![0; 4]);
        let planned = plan(PayloadImage::new(&PAYLOAD[..4]), &region).unwrap();
        assert_eq!(4, planned.len);
        assert_eq!(vec![0; 4], region.0);

        let mut region = region;
        assert_eq!(
            Ok(planned),
            relocate(PayloadImage::new(&PAYLOAD[..4]), &mut region)
        );
    }

    #[test]
    fn overlap_edges() {
        assert!(!overlaps(0..4, 4..8));
        assert!(!overlaps(4..8, 0..4));
        assert!(overlaps(0..5, 4..8));
        assert!(overlaps(2..3, 0..8));
    }

    #[test]
    fn relocation_display() {
        let relocation = Relocation {
            source: 0x8000_1000,
            destination: PayloadDestination::new(0x6000_0000),
            len: 32,
        };
        assert_eq!(
            "32 bytes 0x80001000 -> 0x60000000",
            std::format!("{relocation}")
        );
    }
}

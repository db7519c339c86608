use core::fmt;

/// Physical address the payload executes from unless the platform says otherwise.
pub const DEFAULT_PAYLOAD_DEST: PayloadDestination = PayloadDestination::new(0x6000_0000);

/// Fixed physical address the payload is copied to and entered at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PayloadDestination(usize);

impl PayloadDestination {
    pub const fn new(addr: usize) -> Self {
        Self(addr)
    }

    /// Parses a hex address, with or without a `0x` prefix.
    pub fn from_hex(value: &str) -> Option<Self> {
        let digits = value.strip_prefix("0x").unwrap_or(value);
        usize::from_str_radix(digits, 16).ok().map(Self)
    }

    pub const fn as_usize(self) -> usize {
        self.0
    }

    pub const fn as_mut_ptr(self) -> *mut u8 {
        self.0 as *mut u8
    }

    #[inline]
    pub const fn is_aligned(self, align: usize) -> bool {
        self.0 % align == 0
    }
}

impl fmt::Display for PayloadDestination {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PayloadDestination(0x{:x})", self.0)
    }
}

/// The raw bytes of the payload as placed by the linker.
#[derive(Debug, Clone, Copy)]
pub struct PayloadImage<'a> {
    bytes: &'a [u8],
}

impl<'a> PayloadImage<'a> {
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Builds an image from a link-time (address, length) pair.
    ///
    /// A zero length yields an empty image whatever `base` is.
    ///
    /// # Safety
    /// For a non-zero `len`, `base..base + len` must be readable and stay
    /// unmodified for `'a`.
    pub unsafe fn from_raw_parts(base: *const u8, len: usize) -> Self {
        if len == 0 {
            return Self::new(&[]);
        }
        // SAFETY: upheld by the caller for non-empty images.
        Self::new(unsafe { core::slice::from_raw_parts(base, len) })
    }

    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub const fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn base(&self) -> usize {
        self.bytes.as_ptr() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_length_ignores_base() {
        // a weak link-time default may point anywhere, even unaligned
        let image = unsafe { PayloadImage::from_raw_parts(0x1949 as *const u8, 0) };
        assert!(image.is_empty());
        assert_eq!(0, image.len());
    }

    #[test]
    fn raw_parts_match_slice() {
        let bytes = [0x13, 0x00, 0x00, 0x00];
        let image = unsafe { PayloadImage::from_raw_parts(bytes.as_ptr(), bytes.len()) };
        assert_eq!(&bytes[..], image.as_bytes());
        assert_eq!(bytes.as_ptr() as usize, image.base());
    }

    #[test]
    fn destination_from_hex() {
        assert_eq!(
            Some(PayloadDestination::new(0x8020_0000)),
            PayloadDestination::from_hex("0x80200000")
        );
        assert_eq!(
            Some(PayloadDestination::new(0x6000_0000)),
            PayloadDestination::from_hex("60000000")
        );
        assert_eq!(None, PayloadDestination::from_hex("0x"));
        assert_eq!(None, PayloadDestination::from_hex(""));
        assert_eq!(None, PayloadDestination::from_hex("0x8020_0000"));
        assert_eq!(None, PayloadDestination::from_hex("ram"));
    }

    #[test]
    fn destination_display() {
        assert_eq!(
            "PayloadDestination(0x60000000)",
            std::format!("{DEFAULT_PAYLOAD_DEST}")
        );
        assert!(DEFAULT_PAYLOAD_DEST.is_aligned(4096));
    }
}

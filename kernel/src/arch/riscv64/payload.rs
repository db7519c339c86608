use kernel_hartsync::PayloadImage;

unsafe extern "C" {
    static __payload_start: u8;
    static __payload_end: u8;
}

/// The payload linked into this image. Empty unless `HARTBOOT_PAYLOAD` was
/// set at build time.
pub fn image() -> PayloadImage<'static> {
    // SAFETY: both symbols come from payload.S and bracket the embedded blob
    // in .rodata, which is never written.
    unsafe {
        let start = &raw const __payload_start;
        let end = &raw const __payload_end;
        PayloadImage::from_raw_parts(start, end as usize - start as usize)
    }
}

//! C interface.
//!
//! Exposes the following C header:
//!
//! ```c
//! typedef struct ulid_ctx ulid_ctx;
//! typedef uint8_t ulid[16];
//!
//! struct ulid_ctx *ulid_init(uint32_t seed);
//! int  ulid_seed(struct ulid_ctx *ctx, uint32_t seed);
//! void ulid_free(struct ulid_ctx *ctx);
//! int  ulid_new(struct ulid_ctx *ctx, ulid *dest);
//! int  ulid_write_new(struct ulid_ctx *ctx, char *dest, size_t size);
//! int  ulid_write(const ulid *id, char *dest, size_t size);
//! int  ulid_read(const char *src, size_t len, ulid *dest);
//! ```
//!
//! The crate builds a static (`libulid_lite.a`) and a dynamic (`libulid_lite.so`) library next
//! to the Rust library. Build with `cargo build --release --features ffi` and link C programs
//! against either one; without the feature, both libraries export no symbols.
//!
//! Functions returning `int` return a non-negative value on success and the negative
//! [`Error::code`] on failure. Passing a null `ctx` generates with an ephemeral context
//! seeded from the system clock.

use std::{
    ffi::{c_char, c_int},
    slice,
};

use crate::{decode, new_id, write_new_terminated, Error, RngContext, Ulid, ULID_BINARY_LEN, ULID_TERMINATED_LEN};

/// Opaque context handed out to C callers.
#[allow(non_camel_case_types)]
pub type ulid_ctx = RngContext;

/// Binary ULID as seen from C.
#[allow(non_camel_case_types)]
pub type ulid = [u8; ULID_BINARY_LEN];

/// Number of characters reported by successful write functions (the NUL byte excluded).
const WRITTEN: c_int = 26;

fn status(result: Result<c_int, Error>) -> c_int {
    result.unwrap_or_else(Error::code)
}

/// # Safety
///
/// `dest` must be null or valid for writes of `size` bytes.
unsafe fn destination<'a>(dest: *mut c_char, size: usize) -> Result<&'a mut [u8], Error> {
    if dest.is_null() {
        Err(Error::InvalidArgument)
    } else {
        Ok(unsafe { slice::from_raw_parts_mut(dest.cast::<u8>(), size) })
    }
}

/// Creates a context and seeds its random number generator.
///
/// A `seed` of zero seeds from the system clock. The context must be released with [`ulid_free`].
#[no_mangle]
pub extern "C" fn ulid_init(seed: u32) -> *mut ulid_ctx {
    Box::into_raw(Box::new(RngContext::new(u64::from(seed))))
}

/// Re-seeds a context. A `seed` of zero seeds from the system clock.
///
/// # Safety
///
/// `ctx` must be null or a live pointer returned by [`ulid_init`].
#[no_mangle]
pub unsafe extern "C" fn ulid_seed(ctx: *mut ulid_ctx, seed: u32) -> c_int {
    match unsafe { ctx.as_mut() } {
        Some(ctx) => {
            ctx.reseed(u64::from(seed));
            0
        }
        None => Error::InvalidArgument.code(),
    }
}

/// Releases a context. Null is ignored.
///
/// # Safety
///
/// `ctx` must be null or a pointer returned by [`ulid_init`], not released before.
#[no_mangle]
pub unsafe extern "C" fn ulid_free(ctx: *mut ulid_ctx) {
    if !ctx.is_null() {
        drop(unsafe { Box::from_raw(ctx) });
    }
}

/// Generates a new binary ULID into `dest`.
///
/// # Safety
///
/// `ctx` must be null or a live pointer returned by [`ulid_init`];
/// `dest` must be null or valid for writes.
#[no_mangle]
pub unsafe extern "C" fn ulid_new(ctx: *mut ulid_ctx, dest: *mut ulid) -> c_int {
    let Some(dest) = (unsafe { dest.as_mut() }) else {
        return Error::InvalidArgument.code();
    };

    status(new_id(unsafe { ctx.as_mut() }).map(|id| {
        *dest = id.to_bytes();
        0
    }))
}

/// Generates a new ULID and writes it as text, including the terminating NUL byte, to `dest`.
///
/// `size` must be at least 27. Returns 26 on success.
///
/// # Safety
///
/// `ctx` must be null or a live pointer returned by [`ulid_init`];
/// `dest` must be null or valid for writes of `size` bytes.
#[no_mangle]
pub unsafe extern "C" fn ulid_write_new(ctx: *mut ulid_ctx, dest: *mut c_char, size: usize) -> c_int {
    let result = unsafe { destination(dest, size) }
        .and_then(|dest| write_new_terminated(unsafe { ctx.as_mut() }, dest).map(|_| WRITTEN));

    status(result)
}

/// Writes the binary ULID `id` as text, including the terminating NUL byte, to `dest`.
///
/// `size` must be at least 27. Returns 26 on success.
///
/// # Safety
///
/// `id` must be null or valid for reads; `dest` must be null or valid for writes of `size` bytes.
#[no_mangle]
pub unsafe extern "C" fn ulid_write(id: *const ulid, dest: *mut c_char, size: usize) -> c_int {
    let Some(id) = (unsafe { id.as_ref() }) else {
        return Error::InvalidArgument.code();
    };

    let result = unsafe { destination(dest, size) }
        .and_then(|dest| crate::encode_into_terminated(Ulid::from_bytes(*id), dest).map(|_| WRITTEN));

    status(result)
}

/// Parses `len` bytes of ULID text at `src` into the binary ULID `dest`.
///
/// Decoding is strict. Returns 0 on success.
///
/// # Safety
///
/// `src` must be null or valid for reads of `len` bytes; `dest` must be null or valid for writes.
#[no_mangle]
pub unsafe extern "C" fn ulid_read(src: *const c_char, len: usize, dest: *mut ulid) -> c_int {
    if src.is_null() {
        return Error::InvalidArgument.code();
    }
    let Some(dest) = (unsafe { dest.as_mut() }) else {
        return Error::InvalidArgument.code();
    };

    let text = unsafe { slice::from_raw_parts(src.cast::<u8>(), len) };

    let result = std::str::from_utf8(text)
        .map_err(|error| Error::InvalidCharacter {
            index: error.valid_up_to(),
        })
        .and_then(decode)
        .map(|id| {
            *dest = id.to_bytes();
            0
        });

    status(result)
}

const _: () = assert!(ULID_TERMINATED_LEN == WRITTEN as usize + 1);

#[cfg(test)]
mod tests {
    use std::ptr;

    use super::*;

    fn text(buffer: &[u8]) -> &str {
        std::ffi::CStr::from_bytes_until_nul(buffer).unwrap().to_str().unwrap()
    }

    #[test]
    fn test_c_signatures() {
        let _: extern "C" fn(u32) -> *mut ulid_ctx = ulid_init;
        let _: unsafe extern "C" fn(*mut ulid_ctx, u32) -> c_int = ulid_seed;
        let _: unsafe extern "C" fn(*mut ulid_ctx) = ulid_free;
        let _: unsafe extern "C" fn(*mut ulid_ctx, *mut ulid) -> c_int = ulid_new;
        let _: unsafe extern "C" fn(*mut ulid_ctx, *mut c_char, usize) -> c_int = ulid_write_new;
        let _: unsafe extern "C" fn(*const ulid, *mut c_char, usize) -> c_int = ulid_write;
        let _: unsafe extern "C" fn(*const c_char, usize, *mut ulid) -> c_int = ulid_read;
    }

    #[test]
    fn test_context_lifecycle() {
        let a = ulid_init(17);
        let b = ulid_init(17);

        let mut first_a: ulid = [0; 16];
        let mut first_b: ulid = [0; 16];

        unsafe {
            assert_eq!(ulid_new(a, &mut first_a), 0);
            assert_eq!(ulid_new(b, &mut first_b), 0);

            assert_eq!(ulid_seed(a, 5), 0);
            assert_eq!(ulid_seed(ptr::null_mut(), 5), Error::InvalidArgument.code());

            ulid_free(a);
            ulid_free(b);
            ulid_free(ptr::null_mut());
        }

        assert_eq!(Ulid::from_bytes(first_a).randomness(), Ulid::from_bytes(first_b).randomness());
    }

    #[test]
    fn test_write() {
        let id: ulid = [0x00, 0x00, 0x01, 0x8C, 0x6F, 0x2D, 0x38, 0xB4, 0, 0, 0, 0, 0, 0, 0, 0];
        let mut buffer = [0x7F_u8; 32];

        let written = unsafe { ulid_write(&id, buffer.as_mut_ptr().cast(), buffer.len()) };

        assert_eq!(written, 26);
        assert_eq!(text(&buffer), "00000RRVSD72T0000000000000");

        let mut back: ulid = [0xFF; 16];
        let read = unsafe { ulid_read(buffer.as_ptr().cast(), 26, &mut back) };

        assert_eq!(read, 0);
        assert_eq!(back, id);
    }

    #[test]
    fn test_write_new() {
        let mut buffer = [0u8; ULID_TERMINATED_LEN];

        let written = unsafe { ulid_write_new(ptr::null_mut(), buffer.as_mut_ptr().cast(), buffer.len()) };

        assert_eq!(written, 26);
        assert_eq!(text(&buffer).len(), 26);
    }

    #[test]
    fn test_errors() {
        let id: ulid = [0; 16];
        let mut buffer = [0u8; 26];

        unsafe {
            assert_eq!(
                ulid_write(&id, buffer.as_mut_ptr().cast(), buffer.len()),
                Error::BufferTooSmall { required: 27, actual: 26 }.code()
            );
            assert_eq!(ulid_write(&id, ptr::null_mut(), 27), Error::InvalidArgument.code());
            assert_eq!(ulid_write(ptr::null(), buffer.as_mut_ptr().cast(), 26), Error::InvalidArgument.code());
            assert_eq!(ulid_new(ptr::null_mut(), ptr::null_mut()), Error::InvalidArgument.code());

            let mut dest: ulid = [0; 16];
            let bad = b"0000000000000000000000000U";
            assert_eq!(
                ulid_read(bad.as_ptr().cast(), bad.len(), &mut dest),
                Error::InvalidCharacter { index: 25 }.code()
            );
            assert_eq!(ulid_read(bad.as_ptr().cast(), 25, &mut dest), Error::InvalidLength.code());
            assert_eq!(ulid_read(ptr::null(), 26, &mut dest), Error::InvalidArgument.code());
        }
    }
}

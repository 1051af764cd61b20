//! FFI (Foreign Function Interface) for GUI front ends

use crate::error::ErrorCode;
use crate::{available, slideshow, AudioOutcome, CanvasTarget, RunRequest};
use libc::{c_char, c_void, size_t};
use std::ffi::{CStr, CString};
use std::path::PathBuf;
use std::ptr;
use std::slice;

/// FFI result structure
#[repr(C)]
pub struct FfiResult {
    pub code: ErrorCode,
    pub message: *mut c_char,
}

impl FfiResult {
    fn ok() -> Self {
        Self {
            code: ErrorCode::Ok,
            message: ptr::null_mut(),
        }
    }

    /// Success with an informational message
    fn ok_with(message: &str) -> Self {
        Self {
            code: ErrorCode::Ok,
            message: to_c_string(message),
        }
    }

    fn error(code: ErrorCode, message: &str) -> Self {
        Self {
            code,
            message: to_c_string(message),
        }
    }
}

fn to_c_string(message: &str) -> *mut c_char {
    CString::new(message.replace('\0', " "))
        .map(CString::into_raw)
        .unwrap_or(ptr::null_mut())
}

/// FFI canvas configuration
#[repr(C)]
pub struct FfiCanvas {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// Progress callback: whole percentage (0-100) and the caller's user data
pub type FfiProgressCallback = Option<unsafe extern "C" fn(percent: u8, user_data: *mut c_void)>;

unsafe fn optional_path(ptr: *const c_char, what: &str) -> Result<Option<PathBuf>, FfiResult> {
    if ptr.is_null() {
        return Ok(None);
    }
    match CStr::from_ptr(ptr).to_str() {
        Ok(s) => Ok(Some(PathBuf::from(s))),
        Err(_) => Err(FfiResult::error(
            ErrorCode::InvalidInput,
            &format!("Invalid {}", what),
        )),
    }
}

/// Check if ffmpeg is available for audio muxing
///
/// Video encoding does not need it.
///
/// # Safety
/// - `ffmpeg_path` must be a valid null-terminated string or null
#[no_mangle]
pub unsafe extern "C" fn picreel_available(ffmpeg_path: *const c_char) -> FfiResult {
    let ffmpeg_path = match optional_path(ffmpeg_path, "ffmpeg path") {
        Ok(p) => p,
        Err(e) => return e,
    };

    match available(ffmpeg_path.as_deref()) {
        Ok(_) => FfiResult::ok(),
        Err(e) => FfiResult::error(ErrorCode::from(&e), &e.to_string()),
    }
}

/// Create a slideshow video from images in the given order
///
/// On success the message is null, or describes a dropped audio track.
///
/// # Safety
/// - `images` must point to `image_count` valid null-terminated strings
/// - `output_path` must be a valid null-terminated string
/// - `audio_path` and `ffmpeg_path` must be valid null-terminated strings or null
/// - `canvas` must point to a valid `FfiCanvas`
/// - `progress` is called on the calling thread with `user_data`
#[no_mangle]
pub unsafe extern "C" fn picreel_run(
    images: *const *const c_char,
    image_count: size_t,
    audio_path: *const c_char,
    output_path: *const c_char,
    canvas: *const FfiCanvas,
    ffmpeg_path: *const c_char,
    progress: FfiProgressCallback,
    user_data: *mut c_void,
) -> FfiResult {
    // Validate inputs
    if images.is_null() || image_count == 0 {
        return FfiResult::error(ErrorCode::InvalidInput, "No images provided");
    }

    if canvas.is_null() {
        return FfiResult::error(ErrorCode::InvalidInput, "Canvas is null");
    }

    let output = match optional_path(output_path, "output path") {
        Ok(Some(p)) => p,
        Ok(None) => return FfiResult::error(ErrorCode::InvalidInput, "Output path is null"),
        Err(e) => return e,
    };

    let audio = match optional_path(audio_path, "audio path") {
        Ok(p) => p,
        Err(e) => return e,
    };

    let ffmpeg_path = match optional_path(ffmpeg_path, "ffmpeg path") {
        Ok(p) => p,
        Err(e) => return e,
    };

    // Convert image paths
    let mut paths = Vec::with_capacity(image_count);
    for &image in slice::from_raw_parts(images, image_count) {
        match optional_path(image, "image path") {
            Ok(Some(p)) => paths.push(p),
            Ok(None) => return FfiResult::error(ErrorCode::InvalidInput, "Image path is null"),
            Err(e) => return e,
        }
    }

    let canvas = &*canvas;
    let request = RunRequest {
        images: paths,
        audio,
        output,
        canvas: CanvasTarget::new(canvas.width, canvas.height, canvas.fps),
    };

    let mut report_progress = |percent: u8| {
        if let Some(callback) = progress {
            callback(percent, user_data);
        }
    };

    match slideshow(&request, ffmpeg_path.as_deref(), &mut report_progress) {
        Ok(report) => match report.audio {
            AudioOutcome::Dropped { reason } => {
                FfiResult::ok_with(&format!("Audio dropped: {}", reason))
            }
            _ => FfiResult::ok(),
        },
        Err(e) => FfiResult::error(ErrorCode::from(&e), &e.to_string()),
    }
}

/// Free a result's message string
///
/// # Safety
/// - `result` must point to a valid `FfiResult` that was returned by a picreel function
#[no_mangle]
pub unsafe extern "C" fn picreel_free_result(result: *mut FfiResult) {
    if result.is_null() {
        return;
    }

    let result = &mut *result;
    if !result.message.is_null() {
        // Reclaim the CString and let it drop
        let _ = CString::from_raw(result.message);
        result.message = ptr::null_mut();
    }
}

/// Get version string
#[no_mangle]
pub extern "C" fn picreel_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_rejects_null_images() {
        let canvas = FfiCanvas {
            width: 640,
            height: 480,
            fps: 30,
        };
        let mut result = unsafe {
            picreel_run(
                ptr::null(),
                0,
                ptr::null(),
                c"out.mp4".as_ptr(),
                &canvas,
                ptr::null(),
                None,
                ptr::null_mut(),
            )
        };
        assert_eq!(result.code, ErrorCode::InvalidInput);
        assert!(!result.message.is_null());
        unsafe { picreel_free_result(&mut result) };
        assert!(result.message.is_null());
    }

    #[test]
    fn test_run_reports_invalid_canvas() {
        let canvas = FfiCanvas {
            width: 640,
            height: 480,
            fps: 0,
        };
        let images = [c"a.png".as_ptr()];
        let mut result = unsafe {
            picreel_run(
                images.as_ptr(),
                images.len(),
                ptr::null(),
                c"out.mp4".as_ptr(),
                &canvas,
                ptr::null(),
                None,
                ptr::null_mut(),
            )
        };
        assert_eq!(result.code, ErrorCode::InvalidInput);
        unsafe { picreel_free_result(&mut result) };
    }

    #[test]
    fn test_version_is_nul_terminated() {
        let version = unsafe { CStr::from_ptr(picreel_version()) };
        assert_eq!(version.to_str().unwrap(), env!("CARGO_PKG_VERSION"));
    }
}

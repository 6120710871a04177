//! Safe wrappers around FFmpeg FFI calls.
//!
//! Every function in this module is `pub` and **safe** to call.  All `unsafe`
//! blocks are contained here with explicit safety arguments.  Callers outside
//! this module should never need to write `unsafe` for routine FFmpeg access.

use std::ffi::CString;
use std::path::Path;

use ffmpeg_next as ffmpeg;

use crate::error::FfmpegError;

// ── Stream setup ─────────────────────────────────────────────────────────────

/// Zero out `codec_tag` on the `AVCodecParameters` attached to an output
/// stream, so the muxer picks the correct tag for the target container.
///
/// Must be called after `out_stream.set_parameters(...)` and before
/// `write_header`.
pub fn stream_reset_codec_tag(out_stream: &mut ffmpeg::format::stream::StreamMut) {
    // SAFETY: `out_stream.as_mut_ptr()` is valid for the lifetime of the
    // stream.  `codecpar` is set by `set_parameters` and is non-null.
    // `codec_tag` is a plain u32 field.
    unsafe {
        (*(*out_stream.as_mut_ptr()).codecpar).codec_tag = 0;
    }
}

// ── Output context management ────────────────────────────────────────────────

/// Allocate an output `AVFormatContext` for `format_name` without any IO
/// attached.  The segment files are attached later with [`open_avio`].
pub fn alloc_output_context(
    format_name: &str,
) -> Result<ffmpeg::format::context::Output, FfmpegError> {
    let c_format = CString::new(format_name)
        .map_err(|_| FfmpegError::MuxerCreate(format!("invalid format name {:?}", format_name)))?;
    let mut output_ptr: *mut ffmpeg::ffi::AVFormatContext = std::ptr::null_mut();

    // SAFETY: all pointer arguments are either valid C strings that outlive
    // the call or null, which FFmpeg documents as "guess from format name".
    let ret = unsafe {
        ffmpeg::ffi::avformat_alloc_output_context2(
            &mut output_ptr,
            std::ptr::null_mut(),
            c_format.as_ptr(),
            std::ptr::null(),
        )
    };

    if ret < 0 || output_ptr.is_null() {
        return Err(FfmpegError::MuxerCreate(format!(
            "{}: {}",
            format_name,
            ffmpeg::Error::from(ret)
        )));
    }

    // SAFETY: `output_ptr` was just allocated by FFmpeg and is owned by the
    // returned wrapper from here on.
    Ok(unsafe { ffmpeg::format::context::Output::wrap(output_ptr) })
}

/// Open `path` for writing and attach it as the `pb` of `output`.
pub fn open_avio(
    output: &mut ffmpeg::format::context::Output,
    path: &Path,
) -> Result<(), FfmpegError> {
    let c_path = CString::new(path.to_string_lossy().as_bytes())
        .map_err(|_| FfmpegError::OpenOutput(format!("invalid path {:?}", path)))?;

    // SAFETY: `output.as_mut_ptr()` is valid for the lifetime of `output`.
    // `avio_open` either stores a freshly opened context in `pb` or leaves it
    // untouched and returns a negative error code.
    let ret = unsafe {
        let ctx = output.as_mut_ptr();
        ffmpeg::ffi::avio_open(
            &mut (*ctx).pb,
            c_path.as_ptr(),
            ffmpeg::ffi::AVIO_FLAG_WRITE as std::ffi::c_int,
        )
    };

    if ret < 0 {
        return Err(FfmpegError::OpenOutput(format!(
            "{}: {}",
            path.display(),
            ffmpeg::Error::from(ret)
        )));
    }
    Ok(())
}

/// Flush and close the `pb` of `output`, leaving it null.
///
/// Safe to call when no IO is attached.
pub fn close_avio(output: &mut ffmpeg::format::context::Output) -> Result<(), FfmpegError> {
    // SAFETY: `output.as_mut_ptr()` is valid for the lifetime of `output`.
    // `avio_closep` flushes, frees and nulls `pb`; a null `pb` is skipped.
    let ret = unsafe {
        let ctx = output.as_mut_ptr();
        if ctx.is_null() || (*ctx).pb.is_null() {
            return Ok(());
        }
        ffmpeg::ffi::avio_flush((*ctx).pb);
        ffmpeg::ffi::avio_closep(&mut (*ctx).pb)
    };

    if ret < 0 {
        return Err(FfmpegError::OpenOutput(format!(
            "close failed: {}",
            ffmpeg::Error::from(ret)
        )));
    }
    Ok(())
}

/// Drain packets the interleaver is still holding into the current `pb`.
pub fn flush_interleaved(output: &mut ffmpeg::format::context::Output) -> Result<(), FfmpegError> {
    // SAFETY: a null packet asks the muxer to flush its interleaving queue;
    // the context is valid for the lifetime of `output`.
    let ret = unsafe {
        ffmpeg::ffi::av_interleaved_write_frame(output.as_mut_ptr(), std::ptr::null_mut())
    };

    if ret < 0 {
        return Err(FfmpegError::WritePacket(format!(
            "interleave flush failed: {}",
            ffmpeg::Error::from(ret)
        )));
    }
    Ok(())
}

/// Returns `true` if an IO context is currently attached to `output`.
pub fn has_avio(output: &ffmpeg::format::context::Output) -> bool {
    // SAFETY: read-only null checks on a pointer valid for `output`'s lifetime.
    unsafe {
        let ctx = output.as_ptr();
        !ctx.is_null() && !(*ctx).pb.is_null()
    }
}

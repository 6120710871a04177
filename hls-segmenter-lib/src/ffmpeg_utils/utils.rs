//! FFmpeg utility functions

use ffmpeg_next as ffmpeg;

/// Convert a timestamp from one timebase to another.
///
/// Rounds to the nearest tick (halves away from zero) and saturates at the
/// `i64` extremes instead of wrapping. `i64::MIN` and `i64::MAX` are passed
/// through untouched, matching FFmpeg's `AV_ROUND_PASS_MINMAX`.
pub fn rescale_ts(ts: i64, from: ffmpeg::Rational, to: ffmpeg::Rational) -> i64 {
    if ts == i64::MIN || ts == i64::MAX || from == to {
        return ts;
    }

    let mut b = from.numerator() as i128 * to.denominator() as i128;
    let mut c = from.denominator() as i128 * to.numerator() as i128;
    if c == 0 {
        return ts;
    }
    if c < 0 {
        b = -b;
        c = -c;
    }

    let scaled = ts as i128 * b;
    let mut quotient = scaled / c;
    let remainder = scaled % c;
    if remainder.abs() * 2 >= c {
        quotient += scaled.signum();
    }

    quotient.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

/// Rescale an optional timestamp; an unknown timestamp stays unknown.
pub fn rescale_opt(
    ts: Option<i64>,
    from: ffmpeg::Rational,
    to: ffmpeg::Rational,
) -> Option<i64> {
    ts.map(|ts| rescale_ts(ts, from, to))
}

/// Move a packet's presentation, decode and duration fields from the source
/// timebase to the output timebase, and forget its source byte position.
pub fn rescale_packet(packet: &mut ffmpeg::Packet, from: ffmpeg::Rational, to: ffmpeg::Rational) {
    packet.set_pts(rescale_opt(packet.pts(), from, to));
    packet.set_dts(rescale_opt(packet.dts(), from, to));
    packet.set_duration(rescale_ts(packet.duration(), from, to));
    packet.set_position(-1);
}

/// Convert PTS to seconds using timebase
pub fn pts_to_seconds(pts: i64, timebase: ffmpeg::Rational) -> f64 {
    let num = timebase.numerator() as f64;
    let den = timebase.denominator() as f64;
    (pts as f64 * num) / den
}

/// Get the media type name
pub fn media_type_name(media_type: ffmpeg::media::Type) -> &'static str {
    match media_type {
        ffmpeg::media::Type::Video => "video",
        ffmpeg::media::Type::Audio => "audio",
        ffmpeg::media::Type::Subtitle => "subtitle",
        ffmpeg::media::Type::Data => "data",
        ffmpeg::media::Type::Attachment => "attachment",
        _ => "unknown",
    }
}

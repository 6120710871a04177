use crate::config::SegmenterOptions;
use crate::error::Result;
use crate::ffmpeg_utils::context::InputContext;
use crate::segment::{SegmentMuxer, Segmenter};
use crate::types::SegmentationReport;

/// Segment `options.input` into `options.output_dir` and publish the
/// playlist at `options.manifest_path`.
///
/// The output directory must already exist.  FFmpeg must have been
/// initialized with [`crate::init`].
pub fn segment_file(options: &SegmenterOptions) -> Result<SegmentationReport> {
    options.validate()?;

    let input = InputContext::open(&options.input)?;
    tracing::info!(
        "Opened {:?}: {} streams, {:.2}s",
        input.source_path(),
        input.num_streams(),
        input.duration()
    );

    let muxer = SegmentMuxer::new(&options.container_format, &options.muxer_options)?;
    let mut segmenter = Segmenter::new(input, muxer, options.clone())?;

    match segmenter.run() {
        Ok(report) => Ok(report),
        Err(e) => {
            tracing::error!(
                "Segmentation of {:?} aborted after {} segments: {}",
                options.input,
                segmenter.report().segments_created,
                e
            );
            Err(e)
        }
    }
}

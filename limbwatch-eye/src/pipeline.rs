//! File-to-file annotation run

use crate::config::VisionConfig;
use crate::error::VisionError;
use crate::models::YoloPoseModel;
use crate::video::{FrameFeed, VideoSink, VideoSource};
use limbwatch_core::{Monitor, MonitorConfig, PoseModel, ProgressEvent, RunSummary};
use opencv::core::Mat;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Annotate `input` into `output` with the YOLOv8-pose model named in
/// `vision`. Progress lines go to `report` as they happen.
///
/// An unreadable input fails with [`VisionError::StreamOpen`] before the
/// output file is created. Any later failure removes the partial output.
pub fn run_video(
    input: &Path,
    output: &Path,
    monitor_config: &MonitorConfig,
    vision: &VisionConfig,
    report: &mut dyn FnMut(&ProgressEvent),
) -> Result<RunSummary, VisionError> {
    monitor_config.validate().map_err(VisionError::Config)?;
    vision.validate().map_err(VisionError::Config)?;

    report(&ProgressEvent::Started {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
    });

    let source = VideoSource::open(input, monitor_config.default_fps)?;
    let model = YoloPoseModel::new(vision)?;
    annotate(source, output, model, monitor_config, vision, report)
}

/// Drive an already opened source through `model` into `output`.
pub fn annotate<M>(
    source: VideoSource,
    output: &Path,
    model: M,
    monitor_config: &MonitorConfig,
    vision: &VisionConfig,
    report: &mut dyn FnMut(&ProgressEvent),
) -> Result<RunSummary, VisionError>
where
    M: PoseModel<Frame = Mat>,
{
    let fourcc = vision
        .fourcc_chars()
        .ok_or_else(|| VisionError::Config(format!("Invalid codec '{}'", vision.fourcc)))?;
    let fps = source.fps();
    let mut sink = VideoSink::create(output, fourcc, fps, source.frame_size())?;

    let result = drive(source, model, monitor_config, vision, &mut sink, report);

    match result {
        Ok(summary) => {
            sink.release()?;
            report(&ProgressEvent::Finished { output: output.to_path_buf() });
            info!(
                "Run complete: {} frames, {} with a person, {} alerts, {} annotated, {} evidence frames held",
                summary.frames, summary.frames_with_detection, summary.alerts, summary.alert_frames, summary.evidence_frames
            );
            Ok(summary)
        }
        Err(e) => {
            error!("Run failed: {}", e);
            if let Err(release_err) = sink.release() {
                warn!("{}", release_err);
            }
            drop(sink);
            if let Err(remove_err) = remove_partial_output(output) {
                warn!("Could not remove partial output {:?}: {}", output, remove_err);
            }
            Err(e)
        }
    }
}

fn drive<M>(
    source: VideoSource,
    model: M,
    monitor_config: &MonitorConfig,
    vision: &VisionConfig,
    sink: &mut VideoSink,
    report: &mut dyn FnMut(&ProgressEvent),
) -> Result<RunSummary, VisionError>
where
    M: PoseModel<Frame = Mat>,
{
    let mut monitor = Monitor::new(model, monitor_config, source.fps())?;
    let mut feed = FrameFeed::new(source, vision.prefetch_frames)?;

    let threshold = monitor.threshold();
    while let Some(mut frame) = feed.next_frame()? {
        let frame_report = monitor.process_frame(&mut frame)?;

        if frame_report.heartbeat {
            report(&ProgressEvent::Heartbeat { frame: frame_report.index });
        }
        for alert in &frame_report.analysis.alerts {
            report(&ProgressEvent::Alert {
                limb: alert.limb.clone(),
                speed: alert.speed,
                threshold,
            });
        }
        debug!("Frame {}: {:?}", frame_report.index, frame_report.analysis.speeds);

        sink.write(&frame)?;
    }

    Ok(monitor.summary())
}

/// Delete a half-written output file. A file that was never created is not
/// an error.
pub(crate) fn remove_partial_output(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            info!("Removed partial output {:?}", path);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

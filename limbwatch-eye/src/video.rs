//! Video file decode and encode

use crate::error::VisionError;
use crossbeam::channel::{self, Receiver};
use opencv::{
    core::{Mat, Size},
    prelude::*,
    videoio::{
        VideoCapture, VideoWriter, CAP_ANY, CAP_PROP_FPS, CAP_PROP_FRAME_COUNT,
        CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH,
    },
};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Decoder for one input video file
pub struct VideoSource {
    capture: VideoCapture,
    path: PathBuf,
    width: i32,
    height: i32,
    fps: u32,
    frame_count: u64,
}

impl VideoSource {
    /// Open `path` for reading. `default_fps` stands in when the container
    /// reports no usable frame rate.
    pub fn open(path: &Path, default_fps: u32) -> Result<Self, VisionError> {
        if !path.is_file() {
            return Err(VisionError::stream_open(path, "not a readable file"));
        }
        let path_str = path
            .to_str()
            .ok_or_else(|| VisionError::stream_open(path, "path is not valid UTF-8"))?;

        let capture = VideoCapture::from_file(path_str, CAP_ANY)
            .map_err(|e| VisionError::stream_open(path, e.message))?;
        let opened = capture
            .is_opened()
            .map_err(|e| VisionError::stream_open(path, e.message))?;
        if !opened {
            return Err(VisionError::stream_open(path, "no decoder could open the stream"));
        }

        let width = capture.get(CAP_PROP_FRAME_WIDTH)? as i32;
        let height = capture.get(CAP_PROP_FRAME_HEIGHT)? as i32;
        let reported_fps = capture.get(CAP_PROP_FPS)?;
        let frame_count = capture.get(CAP_PROP_FRAME_COUNT)?.max(0.0) as u64;

        let fps = if reported_fps.is_finite() && reported_fps >= 1.0 {
            reported_fps as u32
        } else {
            warn!("{:?} reports {} fps, using {}", path, reported_fps, default_fps);
            default_fps
        };

        info!("Opened {:?}: {}x{} @ {}fps, {} frames", path, width, height, fps, frame_count);

        Ok(Self {
            capture,
            path: path.to_path_buf(),
            width,
            height,
            fps,
            frame_count,
        })
    }

    /// Next frame, or `None` at end of stream
    pub fn read(&mut self) -> Result<Option<Mat>, VisionError> {
        let mut frame = Mat::default();
        let grabbed = self
            .capture
            .read(&mut frame)
            .map_err(|e| VisionError::Decode(format!("Failed to read from {:?}: {}", self.path, e)))?;

        if !grabbed || frame.empty() {
            return Ok(None);
        }
        Ok(Some(frame))
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn frame_size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Frame count reported by the container; may be 0 or approximate
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Encoder for the annotated output file
pub struct VideoSink {
    writer: VideoWriter,
    path: PathBuf,
    released: bool,
}

impl VideoSink {
    pub fn create(path: &Path, fourcc: [char; 4], fps: u32, size: Size) -> Result<Self, VisionError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| VisionError::Encode(format!("Output path {:?} is not valid UTF-8", path)))?;

        let code = VideoWriter::fourcc(fourcc[0], fourcc[1], fourcc[2], fourcc[3])
            .map_err(|e| VisionError::Encode(format!("Unsupported codec {:?}: {}", fourcc, e)))?;
        let writer = VideoWriter::new(path_str, code, f64::from(fps), size, true)
            .map_err(|e| VisionError::Encode(format!("Failed to create {:?}: {}", path, e)))?;

        let opened = writer
            .is_opened()
            .map_err(|e| VisionError::Encode(format!("Writer for {:?} not opened: {}", path, e)))?;
        if !opened {
            return Err(VisionError::Encode(format!("Writer for {:?} failed to open", path)));
        }

        info!("Writing {:?} at {}x{} @ {}fps", path, size.width, size.height, fps);
        Ok(Self { writer, path: path.to_path_buf(), released: false })
    }

    pub fn write(&mut self, frame: &Mat) -> Result<(), VisionError> {
        self.writer
            .write(frame)
            .map_err(|e| VisionError::Encode(format!("Failed to write to {:?}: {}", self.path, e)))
    }

    /// Flush and close the file. Safe to call more than once.
    pub fn release(&mut self) -> Result<(), VisionError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.writer
            .release()
            .map_err(|e| VisionError::Encode(format!("Failed to finalize {:?}: {}", self.path, e)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for VideoSink {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("{}", e);
        }
    }
}

/// Frames in arrival order, decoded inline or by a read-ahead thread
pub enum FrameFeed {
    Inline(VideoSource),
    Prefetched {
        frames: Option<Receiver<Result<Mat, VisionError>>>,
        decoder: Option<JoinHandle<()>>,
    },
}

impl FrameFeed {
    /// Decode inline when `depth` is 0, otherwise keep up to `depth` frames
    /// decoded ahead on a dedicated thread.
    pub fn new(source: VideoSource, depth: usize) -> Result<Self, VisionError> {
        if depth == 0 {
            return Ok(FrameFeed::Inline(source));
        }

        let (tx, rx) = channel::bounded(depth);
        let decoder = thread::Builder::new()
            .name("limbwatch-decode".to_string())
            .spawn(move || {
                let mut source = source;
                loop {
                    match source.read() {
                        Ok(Some(frame)) => {
                            if tx.send(Ok(frame)).is_err() {
                                debug!("Frame receiver dropped, stopping decoder");
                                break;
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            let _ = tx.send(Err(e));
                            break;
                        }
                    }
                }
            })?;

        Ok(FrameFeed::Prefetched { frames: Some(rx), decoder: Some(decoder) })
    }

    /// Next frame, or `None` once the stream is exhausted
    pub fn next_frame(&mut self) -> Result<Option<Mat>, VisionError> {
        match self {
            FrameFeed::Inline(source) => source.read(),
            FrameFeed::Prefetched { frames, .. } => match frames.as_ref() {
                Some(rx) => match rx.recv() {
                    Ok(frame) => frame.map(Some),
                    // Sender gone: the decoder hit end of stream.
                    Err(_) => Ok(None),
                },
                None => Ok(None),
            },
        }
    }
}

impl Drop for FrameFeed {
    fn drop(&mut self) {
        if let FrameFeed::Prefetched { frames, decoder } = self {
            // Unblock a decoder waiting on a full channel before joining it.
            drop(frames.take());
            if let Some(handle) = decoder.take() {
                if handle.join().is_err() {
                    warn!("Decoder thread panicked");
                }
            }
        }
    }
}

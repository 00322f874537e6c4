use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use image::GrayImage;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use turbidity::{AnalysisResult, FrameSource, Pipeline, TurbidityError};

use crate::CliError;

/// Settings for a continuous monitoring run
#[derive(Debug, Clone)]
pub struct MonitorOptions {
    /// Pause between two captures
    pub interval: Duration,
    /// Where to write annotated frames, if anywhere
    pub capture_dir: Option<PathBuf>,
    pub threshold: i32,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            capture_dir: None,
            threshold: turbidity::algorithms::DEFAULT_THRESHOLD,
        }
    }
}

/// Totals for a finished monitoring run.
///
/// Every captured frame is either analyzed or dropped. Frames the pipeline
/// rejected as invalid are counted as dropped and also in `frames_rejected`.
#[derive(Debug, Clone, Default)]
pub struct MonitorSummary {
    pub frames_captured: u64,
    pub frames_analyzed: u64,
    pub frames_dropped: u64,
    pub frames_rejected: u64,
    pub last: Option<AnalysisResult>,
}

struct Frame {
    seq: u64,
    image: GrayImage,
}

/// Capture frames on a blocking thread and analyze them as they arrive.
///
/// There is no frame queue: a frame that arrives while an analysis is running
/// is dropped, and the next frame captured after the analysis ends is the next
/// one analyzed. A frame the pipeline rejects as invalid input is logged and
/// skipped. Runs until the source is exhausted or Ctrl-C is received. A
/// capture error ends the run and is returned.
pub async fn run_monitor<S>(
    mut source: S,
    pipeline: Arc<Pipeline>,
    options: MonitorOptions,
) -> Result<MonitorSummary, CliError>
where
    S: FrameSource + 'static,
{
    info!(source = %source.description(), interval = ?options.interval, "Starting monitor");
    if let Some(dir) = &options.capture_dir {
        tokio::fs::create_dir_all(dir).await?;
    }

    let (tx, mut rx) = watch::channel::<Option<Arc<Frame>>>(None);
    let interval = options.interval;

    let producer = tokio::task::spawn_blocking(move || -> Result<u64, CliError> {
        let mut seq = 0u64;
        while let Some(image) = source.capture_frame()? {
            seq += 1;
            if tx.send(Some(Arc::new(Frame { seq, image }))).is_err() {
                debug!(seq, "Monitor stopped listening, ending capture");
                break;
            }
            if !interval.is_zero() {
                std::thread::sleep(interval);
            }
        }
        Ok(seq)
    });

    let mut summary = MonitorSummary::default();
    let mut last_seq = 0u64;

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = rx.borrow_and_update().clone();
                let Some(frame) = latest else {
                    continue;
                };

                let skipped = frame.seq - last_seq - 1;
                if skipped > 0 {
                    debug!(skipped, seq = frame.seq, "Analysis fell behind capture");
                }
                last_seq = frame.seq;

                let analyzed = analyze_frame(
                    Arc::clone(&pipeline),
                    frame,
                    options.threshold,
                    options.capture_dir.clone(),
                )
                .await;

                // frames captured during the analysis are stale
                let _ = rx.borrow_and_update();

                match analyzed {
                    Ok(result) => {
                        summary.frames_analyzed += 1;
                        summary.last = Some(result);
                    }
                    Err(CliError::Analysis(TurbidityError::InvalidInput(reason))) => {
                        warn!(seq = last_seq, %reason, "Skipping invalid frame");
                        summary.frames_rejected += 1;
                    }
                    Err(e) => return Err(e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping monitor");
                break;
            }
        }
    }

    drop(rx);
    summary.frames_captured = producer.await??;
    summary.frames_dropped = summary.frames_captured - summary.frames_analyzed;

    info!(
        captured = summary.frames_captured,
        analyzed = summary.frames_analyzed,
        dropped = summary.frames_dropped,
        rejected = summary.frames_rejected,
        "Monitor finished"
    );
    Ok(summary)
}

async fn analyze_frame(
    pipeline: Arc<Pipeline>,
    frame: Arc<Frame>,
    threshold: i32,
    capture_dir: Option<PathBuf>,
) -> Result<AnalysisResult, CliError> {
    let result = tokio::task::spawn_blocking(move || -> Result<AnalysisResult, CliError> {
        let result = pipeline.process(&frame.image, threshold)?;
        if let Some(dir) = capture_dir {
            let path = dir.join(format!("capture_{:05}.png", frame.seq));
            if let Err(e) = result.save_overlay(&frame.image, &path) {
                warn!(path = %path.display(), error = %e, "Failed to save capture");
            }
        }
        info!(
            seq = frame.seq,
            particles = result.object_count,
            risk = %result.risk_level,
            potable = result.potable,
            "Frame analyzed"
        );
        Ok(result)
    })
    .await??;
    Ok(result)
}

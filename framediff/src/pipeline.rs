//! # Detection loop

use crate::prelude::v1::*;
use anyhow::Context;
use log::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Pump frames from `source` until cancelled, dispatching debounced alerts on motion.
///
/// Each iteration blocks on the next frame, compares it against the previous one, and
/// on motion consults the dispatcher. A frame read failure is fatal and propagates
/// immediately; setting `cancel` stops the loop before the next read.
///
/// # Arguments
///
/// * `source` - stream of luminance frames.
/// * `detection` - frame pair comparison settings.
/// * `dispatcher` - debounce state for alert delivery.
/// * `publisher` - alert delivery capability.
/// * `cancel` - cooperative stop flag, checked once per iteration.
pub fn run(
    source: &mut dyn FrameSource,
    detection: &PixelDiffDetection,
    dispatcher: &mut AlertDispatcher,
    publisher: &mut dyn Publisher,
    cancel: &AtomicBool,
) -> Result<()> {
    let mut previous: Option<LumaFrame> = None;

    while !cancel.load(Ordering::Relaxed) {
        let frame = source
            .next_frame()
            .context("failed to read the next frame from the stream")?;

        if detection.detect(previous.as_ref(), &frame)? {
            match dispatcher.maybe_trigger(Instant::now(), publisher) {
                DispatchOutcome::Dispatched => info!("motion detected, alert dispatched"),
                DispatchOutcome::Suppressed { remaining } => debug!(
                    "motion detected, but suppressed for another {:.1}s",
                    remaining.as_secs_f64()
                ),
            }
        }

        previous = Some(frame);
    }

    info!("detection loop cancelled");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::time::Duration;

    struct ScriptedSource {
        frames: VecDeque<LumaFrame>,
    }

    impl ScriptedSource {
        fn new(frames: impl IntoIterator<Item = LumaFrame>) -> Self {
            Self {
                frames: frames.into_iter().collect(),
            }
        }
    }

    impl FrameSource for ScriptedSource {
        fn next_frame(&mut self) -> Result<LumaFrame> {
            self.frames
                .pop_front()
                .ok_or_else(|| anyhow!("stream ended"))
        }

        fn dimensions(&self) -> Option<(usize, usize)> {
            self.frames.front().map(|f| f.dim())
        }

        fn framerate(&self) -> Option<f64> {
            None
        }
    }

    #[derive(Default)]
    struct RecordingPublisher {
        published: usize,
    }

    impl Publisher for RecordingPublisher {
        fn publish(&mut self) -> Result<()> {
            self.published += 1;
            Ok(())
        }
    }

    fn flat(width: usize, height: usize, value: u8) -> LumaFrame {
        LumaFrame::from_luma(vec![value; width * height], width, height).unwrap()
    }

    fn with_block(mut frame: LumaFrame, x0: usize, y0: usize, side: usize, value: u8) -> LumaFrame {
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                frame.set(x, y, value);
            }
        }
        frame
    }

    #[test]
    fn read_failure_ends_the_loop() {
        let mut source = ScriptedSource::new([flat(8, 8, 0), flat(8, 8, 0)]);
        let detection = PixelDiffDetection::default();
        let mut dispatcher = AlertDispatcher::new(Duration::from_secs(30));
        let mut publisher = RecordingPublisher::default();
        let cancel = AtomicBool::new(false);

        let result = run(
            &mut source,
            &detection,
            &mut dispatcher,
            &mut publisher,
            &cancel,
        );

        assert!(result.is_err());
        assert_eq!(publisher.published, 0);
    }

    #[test]
    fn first_frame_is_baseline_only() {
        // Even with zeroed thresholds a lone frame cannot trigger.
        let mut source = ScriptedSource::new([flat(16, 16, 255)]);
        let detection = PixelDiffDetection::new(0, 0.0);
        let mut dispatcher = AlertDispatcher::new(Duration::from_secs(30));
        let mut publisher = RecordingPublisher::default();
        let cancel = AtomicBool::new(false);

        let result = run(
            &mut source,
            &detection,
            &mut dispatcher,
            &mut publisher,
            &cancel,
        );

        assert!(result.is_err());
        assert_eq!(publisher.published, 0);
    }

    #[test]
    fn motion_burst_publishes_once_within_cooldown() {
        // A moving block produces motion on every consecutive pair, but the cooldown
        // only lets the first event through.
        let frames = [
            flat(32, 32, 0),
            with_block(flat(32, 32, 0), 0, 0, 8, 200),
            with_block(flat(32, 32, 0), 8, 8, 8, 200),
            with_block(flat(32, 32, 0), 16, 16, 8, 200),
        ];
        let mut source = ScriptedSource::new(frames);
        let detection = PixelDiffDetection::new(10, 50.0);
        let mut dispatcher = AlertDispatcher::new(Duration::from_secs(30));
        let mut publisher = RecordingPublisher::default();
        let cancel = AtomicBool::new(false);

        let result = run(
            &mut source,
            &detection,
            &mut dispatcher,
            &mut publisher,
            &cancel,
        );

        assert!(result.is_err());
        assert_eq!(publisher.published, 1);
    }

    #[test]
    fn cancellation_stops_the_loop_before_reading() {
        // An empty source fails on any read, so a clean return proves none happened.
        let mut source = ScriptedSource::new([]);
        let detection = PixelDiffDetection::default();
        let mut dispatcher = AlertDispatcher::new(Duration::from_secs(30));
        let mut publisher = RecordingPublisher::default();
        let cancel = AtomicBool::new(true);

        let result = run(
            &mut source,
            &detection,
            &mut dispatcher,
            &mut publisher,
            &cancel,
        );

        assert!(result.is_ok());
        assert_eq!(publisher.published, 0);
    }

    #[test]
    fn dimension_change_mid_stream_is_fatal() {
        let mut source = ScriptedSource::new([flat(16, 16, 0), flat(8, 8, 0)]);
        let detection = PixelDiffDetection::default();
        let mut dispatcher = AlertDispatcher::new(Duration::from_secs(30));
        let mut publisher = RecordingPublisher::default();
        let cancel = AtomicBool::new(false);

        let err = run(
            &mut source,
            &detection,
            &mut dispatcher,
            &mut publisher,
            &cancel,
        )
        .unwrap_err();

        assert!(err.downcast_ref::<DimensionMismatch>().is_some());
        assert_eq!(publisher.published, 0);
    }
}

//! Pause/resume timestamp correction.
//!
//! Capture backends have no pause concept: pausing only stops the
//! session from consuming buffers, the backend keeps producing them with
//! its own monotonically growing timestamps. Without correction, a
//! pause/resume cycle leaves a hole in the output timeline equal to the
//! pause duration. The fix is one cumulative offset, recomputed once per
//! resume from the reference channel, subtracted from every outgoing
//! buffer on every channel.

use reel_common::time::MediaTime;
use reel_media::SampleBuffer;

/// Timing state shared by all channels of one session.
#[derive(Debug, Default)]
pub struct StreamTiming {
    /// Cumulative duration subtracted from every outgoing timestamp.
    /// Only grows, and only on resume.
    offset: MediaTime,

    /// End time (adjusted pts + duration) of the last reference-channel
    /// buffer. The anchor the next resume continues from.
    last_frame_end: MediaTime,

    /// Set by `resume()`, cleared by the first reference-channel buffer
    /// that recomputes the offset.
    resuming: bool,
}

impl StreamTiming {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the offset recomputation for the next reference buffer.
    pub fn request_resume(&mut self) {
        self.resuming = true;
    }

    pub fn is_resuming(&self) -> bool {
        self.resuming
    }

    pub fn offset(&self) -> MediaTime {
        self.offset
    }

    pub fn last_frame_end(&self) -> MediaTime {
        self.last_frame_end
    }

    /// Rewrite one buffer's timestamps in place.
    ///
    /// Returns `false` when the buffer must be dropped: non-reference
    /// buffers that arrive between `resume()` and the first reference
    /// buffer would carry the stale offset and break per-channel
    /// monotonicity, so they are discarded.
    pub fn apply(&mut self, is_reference: bool, buffer: &mut SampleBuffer) -> bool {
        if self.resuming {
            if !is_reference {
                return false;
            }
            // Continue seamlessly from the last pre-pause frame:
            // offset += (raw - offsetSoFar) - lastFrameEnd
            let increment = (buffer.pts - self.offset) - self.last_frame_end;
            self.offset += increment;
            self.resuming = false;
            tracing::debug!(
                offset = %self.offset,
                increment = %increment,
                "Resume offset recomputed"
            );
        }

        buffer.pts -= self.offset;
        if let Some(dts) = buffer.dts {
            buffer.dts = Some(dts - self.offset);
        }

        if is_reference {
            self.last_frame_end = buffer.end_time();
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn buf(pts_ms: i64, dur_ms: i64) -> SampleBuffer {
        SampleBuffer::new(MediaTime::from_millis(pts_ms), MediaTime::from_millis(dur_ms))
    }

    #[test]
    fn offset_stays_zero_without_pause() {
        let mut timing = StreamTiming::new();
        for i in 0..10 {
            let mut b = buf(i * 33, 33);
            assert!(timing.apply(true, &mut b));
            assert_eq!(b.pts.as_millis(), i * 33);
        }
        assert_eq!(timing.offset(), MediaTime::ZERO);
        assert_eq!(timing.last_frame_end().as_millis(), 330);
    }

    #[test]
    fn resume_continues_from_last_frame() {
        let mut timing = StreamTiming::new();
        for i in 0..10 {
            let mut b = buf(i * 33, 33);
            timing.apply(true, &mut b);
        }
        // Paused from 330 through 462; first buffer after resume at 495.
        timing.request_resume();
        let mut b = buf(495, 33);
        assert!(timing.apply(true, &mut b));
        assert_eq!(b.pts.as_millis(), 330);
        assert_eq!(timing.offset().as_millis(), 165);

        // Subsequent buffers keep the fixed offset.
        let mut b = buf(528, 33);
        assert!(timing.apply(true, &mut b));
        assert_eq!(b.pts.as_millis(), 363);
        assert_eq!(timing.offset().as_millis(), 165);
    }

    #[test]
    fn second_pause_accumulates_offset() {
        let mut timing = StreamTiming::new();
        timing.apply(true, &mut buf(0, 33));
        timing.request_resume();
        timing.apply(true, &mut buf(133, 33)); // offset 100
        assert_eq!(timing.offset().as_millis(), 100);

        timing.request_resume();
        let mut b = buf(366, 33); // raw; adjusted continues from 66
        assert!(timing.apply(true, &mut b));
        assert_eq!(b.pts.as_millis(), 66);
        assert_eq!(timing.offset().as_millis(), 300);
    }

    #[test]
    fn non_reference_buffers_are_dropped_while_resuming() {
        let mut timing = StreamTiming::new();
        timing.apply(true, &mut buf(0, 33));
        timing.request_resume();
        let mut audio = buf(140, 20);
        assert!(!timing.apply(false, &mut audio));
        // Reference buffer clears the flag; audio flows again.
        timing.apply(true, &mut buf(200, 33));
        let mut audio = buf(220, 20);
        assert!(timing.apply(false, &mut audio));
    }

    #[test]
    fn dts_is_shifted_with_pts() {
        let mut timing = StreamTiming::new();
        timing.apply(true, &mut buf(0, 33));
        timing.request_resume();
        let mut b = buf(100, 33).with_dts(MediaTime::from_millis(95));
        assert!(timing.apply(true, &mut b));
        let offset = timing.offset();
        assert_eq!(b.pts.as_millis(), 100 - offset.as_millis());
        assert_eq!(b.dts.unwrap().as_millis(), 95 - offset.as_millis());
    }

    #[test]
    fn non_reference_channel_does_not_perturb_timing_state() {
        let mut timing = StreamTiming::new();
        timing.apply(true, &mut buf(0, 33));
        let anchor = timing.last_frame_end();
        timing.apply(false, &mut buf(500, 20));
        assert_eq!(timing.last_frame_end(), anchor);
        assert_eq!(timing.offset(), MediaTime::ZERO);
    }

    proptest! {
        /// Adjusted reference timestamps strictly increase across any
        /// schedule of pause/resume cycles, and each resume lands within
        /// one frame of the pre-pause anchor.
        #[test]
        fn adjusted_timestamps_strictly_increase(
            segments in prop::collection::vec((1usize..20, 1i64..40), 1..8),
            frame_ms in 10i64..50,
        ) {
            let mut timing = StreamTiming::new();
            let mut raw_ms = 0i64;
            let mut last_adjusted: Option<i64> = None;

            for (i, (frames, gap_frames)) in segments.iter().enumerate() {
                if i > 0 {
                    // Paused: the backend clock keeps running.
                    raw_ms += gap_frames * frame_ms;
                    timing.request_resume();
                }
                for _ in 0..*frames {
                    let mut b = buf(raw_ms, frame_ms);
                    prop_assert!(timing.apply(true, &mut b));
                    let adjusted = b.pts.as_millis();
                    if let Some(prev) = last_adjusted {
                        prop_assert!(adjusted > prev);
                        prop_assert!(adjusted <= prev + frame_ms);
                    }
                    last_adjusted = Some(adjusted);
                    raw_ms += frame_ms;
                }
            }
        }
    }
}

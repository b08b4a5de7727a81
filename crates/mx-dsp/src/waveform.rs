//! Waveform peak summaries for the timeline overview
//!
//! One value per display pixel for the whole track set. Each bucket is an
//! approximation: up to [`POINTS_PER_BUCKET`] evenly spaced samples are
//! probed instead of scanning every sample, which keeps recomputation cheap
//! enough to run on every track-set change. Overlapping tracks are layered by
//! maximum, not summed.

use std::time::{Duration, Instant};

use mx_core::{Track, any_soloed, max_duration_secs};
use serde::Serialize;

/// Samples probed per bucket
pub const POINTS_PER_BUCKET: usize = 10;

/// Delay between the last track-set change and recomputation
pub const DEFAULT_SUMMARY_DEBOUNCE: Duration = Duration::from_millis(100);

// ═══════════════════════════════════════════════════════════════════════════
// SUMMARY
// ═══════════════════════════════════════════════════════════════════════════

/// Fixed-length sequence of per-bucket peak magnitudes
///
/// Values are finite and non-negative but may exceed 1.0; the renderer
/// clamps with [`WaveformSummary::clamped`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WaveformSummary {
    buckets: Vec<f32>,
}

impl WaveformSummary {
    pub fn silent(width: usize) -> Self {
        Self {
            buckets: vec![0.0; width],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.buckets
    }

    /// Values clamped to `[0, 1]` for drawing
    pub fn clamped(&self) -> impl Iterator<Item = f32> + '_ {
        self.buckets.iter().map(|v| v.clamp(0.0, 1.0))
    }

    /// Loudest bucket
    pub fn max(&self) -> f32 {
        self.buckets.iter().copied().fold(0.0, f32::max)
    }
}

/// Reduce the track set to `width` peak buckets
///
/// The longest track (muted or not) spans the full width so the layout stays
/// stable while toggling mute/solo. Only ready, audible tracks contribute;
/// a track of relative length `r` fills the first `floor(width * r)` buckets.
pub fn summarize(tracks: &[Track], width: usize) -> WaveformSummary {
    let mut summary = WaveformSummary::silent(width);
    if width == 0 {
        return summary;
    }

    let max_duration = max_duration_secs(tracks);
    if max_duration <= 0.0 {
        return summary;
    }

    let soloing = any_soloed(tracks);

    for track in tracks.iter().filter(|t| t.is_active(soloing)) {
        let Some(audio) = track.audio() else {
            continue;
        };
        let total = audio.frames();
        if total == 0 {
            continue;
        }

        let ratio = track.duration_secs() / max_duration;
        let populated = ((width as f64 * ratio).floor() as usize).min(width);
        let step = total.div_ceil(width);
        let gain = track.gain() as f32;

        for (i, bucket) in summary.buckets.iter_mut().take(populated).enumerate() {
            let start = i * step;
            let mut peak = 0.0f32;

            for j in 0..POINTS_PER_BUCKET {
                let idx = start + j * step / POINTS_PER_BUCKET;
                if idx >= total {
                    break;
                }
                let value = audio.abs_peak_at(idx);
                if value.is_finite() {
                    peak = peak.max(value);
                }
            }

            *bucket = bucket.max(peak * gain);
        }
    }

    summary
}

// ═══════════════════════════════════════════════════════════════════════════
// DEBOUNCE
// ═══════════════════════════════════════════════════════════════════════════

/// Trailing-edge debounce driven by caller-supplied timestamps
#[derive(Debug, Clone)]
pub struct SummaryDebouncer {
    delay: Duration,
    dirty_since: Option<Instant>,
}

impl SummaryDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            dirty_since: None,
        }
    }

    /// Record a change; restarts the delay
    pub fn notify(&mut self, now: Instant) {
        self.dirty_since = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.dirty_since.is_some()
    }

    /// True once `delay` has elapsed since the last change
    pub fn is_due(&self, now: Instant) -> bool {
        self.dirty_since
            .is_some_and(|t| now.saturating_duration_since(t) >= self.delay)
    }

    /// Consume a due change
    pub fn take_due(&mut self, now: Instant) -> bool {
        if self.is_due(now) {
            self.dirty_since = None;
            true
        } else {
            false
        }
    }
}

impl Default for SummaryDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_SUMMARY_DEBOUNCE)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// SUMMARIZER
// ═══════════════════════════════════════════════════════════════════════════

/// Holds the current summary and recomputes it after track-set or width
/// changes settle. Each recomputation replaces the previous summary.
#[derive(Debug, Clone)]
pub struct WaveformSummarizer {
    width: usize,
    debouncer: SummaryDebouncer,
    summary: WaveformSummary,
    generation: u64,
}

impl WaveformSummarizer {
    pub fn new(width: usize) -> Self {
        Self::with_debouncer(width, SummaryDebouncer::default())
    }

    pub fn with_debouncer(width: usize, debouncer: SummaryDebouncer) -> Self {
        Self {
            width,
            debouncer,
            summary: WaveformSummary::silent(width),
            generation: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Change the bucket count; schedules a recompute if it differs
    pub fn set_width(&mut self, width: usize, now: Instant) {
        if width != self.width {
            self.width = width;
            self.debouncer.notify(now);
        }
    }

    /// Track added, removed, decoded, or remixed
    pub fn tracks_changed(&mut self, now: Instant) {
        self.debouncer.notify(now);
    }

    /// Recompute if a change has settled; returns the fresh summary when it did
    pub fn poll(&mut self, now: Instant, tracks: &[Track]) -> Option<&WaveformSummary> {
        if !self.debouncer.take_due(now) {
            return None;
        }

        self.summary = summarize(tracks, self.width);
        self.generation += 1;
        log::debug!(
            "Waveform summary #{} recomputed: {} buckets, {} tracks",
            self.generation,
            self.width,
            tracks.len()
        );
        Some(&self.summary)
    }

    /// Recompute immediately, bypassing the debounce
    pub fn refresh(&mut self, tracks: &[Track]) -> &WaveformSummary {
        self.debouncer = SummaryDebouncer::new(self.debouncer.delay);
        self.summary = summarize(tracks, self.width);
        self.generation += 1;
        &self.summary
    }

    pub fn summary(&self) -> &WaveformSummary {
        &self.summary
    }

    /// Number of recomputations so far
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mx_core::{DecodedAudio, TrackId};

    fn track(id: u64, samples: Vec<f32>, gain: f64) -> Track {
        let audio = DecodedAudio::mono(100, samples).unwrap();
        Track::with_audio(TrackId::new(id), format!("t{id}"), audio).gain_of(gain)
    }

    #[test]
    fn test_length_matches_width() {
        let tracks = vec![track(1, vec![0.5; 1000], 1.0)];
        for width in [0, 1, 7, 100, 1000, 5000] {
            let s = summarize(&tracks, width);
            assert_eq!(s.len(), width);
            assert!(s.values().iter().all(|v| v.is_finite() && *v >= 0.0));
        }
    }

    #[test]
    fn test_empty_set_is_silent() {
        assert_eq!(summarize(&[], 8), WaveformSummary::silent(8));

        let pending = Track::new(TrackId::new(1), "pending");
        assert_eq!(summarize(&[pending], 8).max(), 0.0);
    }

    #[test]
    fn test_shorter_track_leaves_trailing_buckets() {
        let long = track(1, vec![0.2; 1000], 1.0);
        let short = track(2, vec![0.8; 400], 1.0);
        let s = summarize(&[long, short], 10);

        // First 4 buckets layered by max
        for v in &s.values()[..4] {
            assert_eq!(*v, 0.8);
        }
        for v in &s.values()[4..] {
            assert_eq!(*v, 0.2);
        }
    }

    #[test]
    fn test_gain_scales_and_layers_by_max() {
        let a = track(1, vec![0.5; 100], 0.5);
        let b = track(2, vec![0.3; 100], 1.0);
        let s = summarize(&[a, b], 4);
        assert!(s.values().iter().all(|v| (*v - 0.3).abs() < 1e-6));
    }

    #[test]
    fn test_muted_track_keeps_layout_but_no_peaks() {
        let mut long = track(1, vec![0.9; 1000], 1.0);
        long.muted = true;
        let short = track(2, vec![0.4; 500], 1.0);
        let s = summarize(&[long, short], 10);

        assert_eq!(&s.values()[..5], &[0.4; 5]);
        assert_eq!(&s.values()[5..], &[0.0; 5]);
    }

    #[test]
    fn test_solo_filters_other_tracks() {
        let mut a = track(1, vec![0.9; 100], 1.0);
        let mut b = track(2, vec![0.1; 100], 1.0);
        b.soloed = true;
        a.muted = false;
        let s = summarize(&[a, b], 5);
        assert!(s.values().iter().all(|v| (*v - 0.1).abs() < 1e-6));
    }

    #[test]
    fn test_values_above_unity_are_clamped_for_drawing() {
        let hot = track(1, vec![1.5; 10], 1.0);
        let s = summarize(&[hot], 2);
        assert_eq!(s.max(), 1.5);
        assert!(s.clamped().all(|v| v == 1.0));
    }

    #[test]
    fn test_debounce() {
        let t0 = Instant::now();
        let mut d = SummaryDebouncer::new(Duration::from_millis(100));
        assert!(!d.is_due(t0));

        d.notify(t0);
        assert!(!d.take_due(t0 + Duration::from_millis(50)));

        // A second change restarts the window
        d.notify(t0 + Duration::from_millis(60));
        assert!(!d.take_due(t0 + Duration::from_millis(120)));
        assert!(d.take_due(t0 + Duration::from_millis(160)));
        assert!(!d.is_pending());
    }

    #[test]
    fn test_summarizer_replaces_summary() {
        let t0 = Instant::now();
        let mut summarizer = WaveformSummarizer::new(4);
        let mut tracks = vec![track(1, vec![0.5; 100], 1.0)];

        summarizer.tracks_changed(t0);
        assert!(summarizer.poll(t0, &tracks).is_none());
        let first = summarizer
            .poll(t0 + DEFAULT_SUMMARY_DEBOUNCE, &tracks)
            .cloned()
            .unwrap();
        assert_eq!(first.values(), &[0.5; 4]);

        tracks[0].set_gain(0.5);
        summarizer.tracks_changed(t0 + Duration::from_secs(1));
        summarizer.set_width(2, t0 + Duration::from_secs(1));
        let second = summarizer
            .poll(t0 + Duration::from_secs(2), &tracks)
            .cloned()
            .unwrap();
        assert_eq!(second.values(), &[0.25; 2]);
        assert_eq!(summarizer.generation(), 2);

        // Nothing pending
        assert!(summarizer.poll(t0 + Duration::from_secs(3), &tracks).is_none());
        assert_eq!(summarizer.refresh(&tracks).len(), 2);
        assert_eq!(summarizer.generation(), 3);
    }
}

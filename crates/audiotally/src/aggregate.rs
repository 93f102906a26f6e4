//! Sample-count aggregation and duration formatting.
//!
//! Everything here is a pure function of its inputs: no I/O, no state.

use serde::{Deserialize, Serialize};

use crate::clip::ClipRecord;

/// Derived totals for a set of clips at a given project sample rate.
///
/// Recomputed on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Sum of all region lengths in samples.
    pub total_samples: u64,

    /// Project sample rate in Hz the totals were computed against.
    pub sample_rate: u32,

    /// The clips that contributed to the total, in document order.
    pub clips: Vec<ClipRecord>,
}

impl AggregateResult {
    /// Total duration formatted as `m:ss.mmm`.
    #[must_use]
    pub fn total_duration(&self) -> String {
        samples_to_time(self.total_samples, self.sample_rate)
    }

    /// Total duration in seconds.
    #[must_use]
    pub fn total_seconds(&self) -> f64 {
        self.total_samples as f64 / f64::from(self.sample_rate)
    }

    /// Number of contributing clips.
    #[must_use]
    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    /// Render the detailed per-clip report shown on an explicit calculation.
    #[must_use]
    pub fn report(&self) -> String {
        let mut out = format!("Found {} clips:\n\n", self.clips.len());

        for (i, clip) in self.clips.iter().enumerate() {
            let duration = samples_to_time(clip.duration_samples, self.sample_rate);
            let seconds = clip.duration_samples as f64 / f64::from(self.sample_rate);
            out.push_str(&format!("{}. {}\n", i + 1, clip.filename));
            out.push_str(&format!("   Duration: {duration} ({seconds:.3}s)\n"));
            out.push_str(&format!(
                "   Samples: {} to {}\n\n",
                group_digits(clip.start),
                group_digits(clip.end)
            ));
        }

        out.push_str(&format!("TOTAL DURATION: {}\n", self.total_duration()));
        out.push_str(&format!(
            "Total samples: {}\n",
            group_digits(self.total_samples)
        ));
        out.push_str(&format!(
            "Sample rate: {} Hz\n",
            group_digits(u64::from(self.sample_rate))
        ));
        out
    }
}

/// Sum region lengths at the given sample rate.
///
/// Order-independent: permuting `clips` leaves `total_samples` unchanged.
#[must_use]
pub fn aggregate(clips: &[ClipRecord], sample_rate: u32) -> AggregateResult {
    let total_samples = clips.iter().map(|c| c.duration_samples).sum();
    AggregateResult {
        total_samples,
        sample_rate,
        clips: clips.to_vec(),
    }
}

/// Format a sample count as `m:ss.mmm` at the given rate.
///
/// Minutes are unpadded; seconds and milliseconds are zero-padded to two and
/// three digits.
#[must_use]
pub fn samples_to_time(samples: u64, sample_rate: u32) -> String {
    let seconds = samples as f64 / f64::from(sample_rate);
    let minutes = (seconds / 60.0).floor() as u64;
    let remaining_seconds = (seconds % 60.0).floor() as u64;
    let milliseconds = ((seconds - seconds.floor()) * 1000.0).floor() as u64;

    format!("{minutes}:{remaining_seconds:02}.{milliseconds:03}")
}

/// Group a number's digits in threes: `144000` renders as `144,000`.
fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(filename: &str, start: u64, end: u64) -> ClipRecord {
        ClipRecord::new(filename, start, end).unwrap()
    }

    #[test]
    fn test_samples_to_time_zero() {
        assert_eq!(samples_to_time(0, 48000), "0:00.000");
    }

    #[test]
    fn test_samples_to_time_three_seconds() {
        assert_eq!(samples_to_time(144_000, 48000), "0:03.000");
    }

    #[test]
    fn test_samples_to_time_hundred_seconds() {
        assert_eq!(samples_to_time(4_410_000, 44100), "1:40.000");
    }

    #[test]
    fn test_samples_to_time_fractional() {
        // 1.5 seconds at 48 kHz
        assert_eq!(samples_to_time(72_000, 48000), "0:01.500");
    }

    #[test]
    fn test_samples_to_time_minutes_unpadded() {
        // 10 minutes, 5.25 seconds at 48 kHz
        let samples = 48000 * (10 * 60) + 48000 * 5 + 12000;
        assert_eq!(samples_to_time(samples, 48000), "10:05.250");
    }

    #[test]
    fn test_aggregate_sums_durations() {
        let clips = vec![clip("a.wav", 0, 48000), clip("b.wav", 1000, 97_000)];
        let result = aggregate(&clips, 48000);

        assert_eq!(result.total_samples, 144_000);
        assert_eq!(result.sample_rate, 48000);
        assert_eq!(result.clip_count(), 2);
        assert_eq!(result.total_duration(), "0:03.000");
    }

    #[test]
    fn test_aggregate_order_independent() {
        let a = clip("a.wav", 0, 100);
        let b = clip("b.wav", 50, 400);
        let c = clip("c.wav", 7, 1007);

        let forward = aggregate(&[a.clone(), b.clone(), c.clone()], 48000);
        let reversed = aggregate(&[c, b, a], 48000);

        assert_eq!(forward.total_samples, reversed.total_samples);
    }

    #[test]
    fn test_aggregate_empty() {
        let result = aggregate(&[], 44100);
        assert_eq!(result.total_samples, 0);
        assert_eq!(result.total_duration(), "0:00.000");
        assert_eq!(result.total_seconds(), 0.0);
    }

    #[test]
    fn test_total_seconds() {
        let result = aggregate(&[clip("a.wav", 0, 144_000)], 48000);
        assert!((result.total_seconds() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_group_digits() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1000), "1,000");
        assert_eq!(group_digits(144_000), "144,000");
        assert_eq!(group_digits(4_410_000), "4,410,000");
    }

    #[test]
    fn test_report_layout() {
        let result = aggregate(&[clip("kick.wav", 1000, 49000)], 48000);
        let report = result.report();

        assert!(report.contains("Found 1 clips:"));
        assert!(report.contains("1. kick.wav"));
        assert!(report.contains("Duration: 0:01.000 (1.000s)"));
        assert!(report.contains("Samples: 1,000 to 49,000"));
        assert!(report.contains("TOTAL DURATION: 0:01.000"));
        assert!(report.contains("Sample rate: 48,000 Hz"));
    }

    #[test]
    fn test_result_serialization() {
        let result = aggregate(&[clip("a.wav", 0, 100)], 48000);
        let json = serde_json::to_string(&result).unwrap();
        let deserialized: AggregateResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, deserialized);
    }
}

use umbra_core::{Result, UmbraError};

use crate::values::Interpolatable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    #[default]
    Linear,
    Step,
}

/// Keys closer together than this are treated as the same instant.
const TIME_EPSILON: f32 = 1e-6;

const MAX_SCAN_OFFSET: usize = 3;

/// Remembers where the previous sample landed so that forward playback finds
/// the next interval in O(1).
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyframeCursor {
    pub last_index: usize,
}

/// One component track of a bone channel.
///
/// Invariant: `times` is strictly increasing and `times.len() == values.len()`.
#[derive(Debug, Clone)]
pub struct KeyframeTrack<T: Interpolatable> {
    times: Vec<f32>,
    values: Vec<T>,
    pub interpolation: InterpolationMode,
}

impl<T: Interpolatable> Default for KeyframeTrack<T> {
    fn default() -> Self {
        Self {
            times: Vec::new(),
            values: Vec::new(),
            interpolation: InterpolationMode::Linear,
        }
    }
}

impl<T: Interpolatable> KeyframeTrack<T> {
    /// Builds a track from `(time, value)` pairs.
    ///
    /// Keys sharing a timestamp collapse into one, keeping the later value.
    /// Non-finite, negative or decreasing times are rejected.
    pub fn from_keys(
        channel: &str,
        keys: impl IntoIterator<Item = (f32, T)>,
        interpolation: InterpolationMode,
    ) -> Result<Self> {
        let invalid = |reason: String| UmbraError::InvalidKeyframes {
            channel: channel.to_string(),
            reason,
        };

        let mut times: Vec<f32> = Vec::new();
        let mut values: Vec<T> = Vec::new();
        for (time, value) in keys {
            if !time.is_finite() {
                return Err(invalid("non-finite key time".to_string()));
            }
            if time < 0.0 {
                return Err(invalid(format!("negative key time {time}")));
            }
            if let Some(&last) = times.last() {
                if (time - last).abs() <= TIME_EPSILON {
                    if let Some(slot) = values.last_mut() {
                        *slot = value;
                    }
                    continue;
                }
                if time < last {
                    return Err(invalid(format!("key time {time} follows {last}")));
                }
            }
            times.push(time);
            values.push(value);
        }

        Ok(Self {
            times,
            values,
            interpolation,
        })
    }

    #[must_use]
    pub fn times(&self) -> &[f32] {
        &self.times
    }

    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Time of the last key, or 0 for an empty track.
    #[must_use]
    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Stateless sample. Returns `None` for an empty track.
    #[must_use]
    pub fn sample(&self, time: f32) -> Option<T> {
        if self.times.is_empty() {
            return None;
        }
        // First index whose time is strictly after `time`
        let next_idx = self.times.partition_point(|&t| t <= time);
        Some(self.sample_at_frame(next_idx.saturating_sub(1), time))
    }

    /// Sample using (and updating) a cursor.
    pub fn sample_with_cursor(&self, time: f32, cursor: &mut KeyframeCursor) -> Option<T> {
        let len = self.times.len();
        match len {
            0 => return None,
            1 => return Some(self.values[0]),
            _ => {}
        }

        let i = cursor.last_index.min(len - 1);
        let t_curr = self.times[i];

        let found_index = if time >= t_curr {
            // Forward playback: scan ahead a few intervals
            let mut res = None;
            for offset in 0..=MAX_SCAN_OFFSET {
                let idx = i + offset;
                if idx >= len - 1 {
                    res = Some(len - 1);
                    break;
                }
                if time < self.times[idx + 1] {
                    res = Some(idx);
                    break;
                }
            }
            res
        } else {
            // Backwards step: scan behind a few keys
            let mut res = None;
            for offset in 1..=MAX_SCAN_OFFSET {
                if i < offset {
                    break;
                }
                let idx = i - offset;
                if time >= self.times[idx] {
                    res = Some(idx);
                    break;
                }
            }
            res
        };

        // Large jump (loop wrap, scrubbing): fall back to binary search
        let index = found_index.unwrap_or_else(|| {
            self.times
                .partition_point(|&t| t <= time)
                .saturating_sub(1)
        });
        cursor.last_index = index;

        Some(self.sample_at_frame(index, time))
    }

    fn sample_at_frame(&self, index: usize, time: f32) -> T {
        let len = self.times.len();

        if index >= len - 1 {
            return self.values[len - 1];
        }

        let next_idx = index + 1;
        let t0 = self.times[index];
        let t1 = self.times[next_idx];
        let dt = t1 - t0;

        let t = if dt > TIME_EPSILON { (time - t0) / dt } else { 0.0 };
        let t = t.clamp(0.0, 1.0);

        match self.interpolation {
            InterpolationMode::Step => self.values[index],
            InterpolationMode::Linear => {
                T::interpolate_linear(self.values[index], self.values[next_idx], t)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn ramp() -> KeyframeTrack<Vec3> {
        KeyframeTrack::from_keys(
            "ramp",
            (0..8).map(|i| (i as f32, Vec3::splat(i as f32 * 10.0))),
            InterpolationMode::Linear,
        )
        .unwrap()
    }

    #[test]
    fn duplicate_times_keep_the_later_value() {
        let track = KeyframeTrack::from_keys(
            "dup",
            [(0.0, Vec3::ZERO), (0.0, Vec3::X), (1.0, Vec3::Y)],
            InterpolationMode::Linear,
        )
        .unwrap();
        assert_eq!(track.len(), 2);
        assert_eq!(track.values()[0], Vec3::X);
    }

    #[test]
    fn decreasing_times_are_rejected() {
        let err = KeyframeTrack::from_keys(
            "bad",
            [(1.0, Vec3::ZERO), (0.5, Vec3::X)],
            InterpolationMode::Linear,
        )
        .unwrap_err();
        assert!(matches!(err, UmbraError::InvalidKeyframes { .. }));
    }

    #[test]
    fn non_finite_times_are_rejected() {
        assert!(
            KeyframeTrack::from_keys("nan", [(f32::NAN, Vec3::ZERO)], InterpolationMode::Linear)
                .is_err()
        );
        assert!(
            KeyframeTrack::from_keys("neg", [(-1.0, Vec3::ZERO)], InterpolationMode::Linear)
                .is_err()
        );
    }

    #[test]
    fn cursor_matches_stateless_sampling() {
        let track = ramp();
        let mut cursor = KeyframeCursor::default();
        // Forward, a jump back (loop), then forward again
        for &t in &[0.0, 0.25, 1.5, 2.0, 6.9, 7.5, 0.1, 3.3, 3.2, 5.0] {
            let a = track.sample(t).unwrap();
            let b = track.sample_with_cursor(t, &mut cursor).unwrap();
            assert!(a.abs_diff_eq(b, 1e-5), "t={t}: {a} vs {b}");
        }
    }

    #[test]
    fn stale_cursor_is_clamped() {
        let track = ramp();
        let mut cursor = KeyframeCursor { last_index: 999 };
        let v = track.sample_with_cursor(2.5, &mut cursor).unwrap();
        assert!(v.abs_diff_eq(Vec3::splat(25.0), 1e-5));
        assert_eq!(cursor.last_index, 2);
    }

    #[test]
    fn step_holds_left_key() {
        let mut track = ramp();
        track.interpolation = InterpolationMode::Step;
        assert_eq!(track.sample(1.99), Some(Vec3::splat(10.0)));
        assert_eq!(track.sample(2.0), Some(Vec3::splat(20.0)));
    }

    #[test]
    fn empty_track_samples_nothing() {
        let track = KeyframeTrack::<Vec3>::default();
        assert!(track.sample(0.0).is_none());
        assert!(track.sample_with_cursor(1.0, &mut KeyframeCursor::default()).is_none());
        assert_eq!(track.end_time(), 0.0);
    }
}

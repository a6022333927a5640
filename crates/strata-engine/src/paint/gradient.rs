use crate::coords::Vec2;

use super::Color;

/// Maximum number of color-ramp stops a paint retains.
pub const MAX_COLOR_RAMP_STOPS: usize = 256;

/// Gradient spread behavior outside the [0, 1] range.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum SpreadMode {
    /// Clamp to edge stops.
    #[default]
    Pad,
    /// Repeat the gradient pattern.
    Repeat,
    /// Mirror-repeat the gradient pattern.
    Reflect,
}

/// A single gradient stop.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Color,
}

impl ColorStop {
    #[inline]
    pub const fn new(offset: f32, color: Color) -> Self {
        Self { offset, color }
    }
}

/// Linear gradient axis in paint space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LinearGradient {
    pub start: Vec2,
    pub end: Vec2,
}

impl Default for LinearGradient {
    fn default() -> Self {
        Self { start: Vec2::zero(), end: Vec2::new(1.0, 0.0) }
    }
}

impl LinearGradient {
    #[inline]
    pub const fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }

    /// `[x0, y0, x1, y1]` parameter form.
    #[inline]
    pub fn from_params(p: [f32; 4]) -> Self {
        Self::new(Vec2::new(p[0], p[1]), Vec2::new(p[2], p[3]))
    }

    #[inline]
    pub fn to_params(self) -> [f32; 4] {
        [self.start.x, self.start.y, self.end.x, self.end.y]
    }
}

/// Radial gradient in paint space. The focal point is retained for parameter
/// round-trips; rendering treats the gradient as centered.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RadialGradient {
    pub center: Vec2,
    pub focus: Vec2,
    pub radius: f32,
}

impl Default for RadialGradient {
    fn default() -> Self {
        Self { center: Vec2::zero(), focus: Vec2::zero(), radius: 1.0 }
    }
}

impl RadialGradient {
    /// `[cx, cy, fx, fy, r]` parameter form.
    #[inline]
    pub fn from_params(p: [f32; 5]) -> Self {
        Self {
            center: Vec2::new(p[0], p[1]),
            focus: Vec2::new(p[2], p[3]),
            radius: p[4],
        }
    }

    #[inline]
    pub fn to_params(self) -> [f32; 5] {
        [self.center.x, self.center.y, self.focus.x, self.focus.y, self.radius]
    }
}

/// Normalizes user stops into a monotonic, boundary-complete sequence.
///
/// - stops with offsets outside [0, 1] (or NaN) are skipped;
/// - a stop whose offset is below its predecessor's rejects the whole input;
/// - missing stops at 0 and 1 are synthesized from the nearest accepted stop;
/// - an empty result falls back to opaque black at 0 and opaque white at 1.
pub fn normalize_stops(input: &[ColorStop]) -> Vec<ColorStop> {
    let mut out: Vec<ColorStop> = Vec::with_capacity(input.len() + 2);
    let mut last_offset = 0.0f32;

    for stop in input.iter().take(MAX_COLOR_RAMP_STOPS) {
        if !(0.0..=1.0).contains(&stop.offset) {
            continue;
        }
        if stop.offset < last_offset {
            out.clear();
            break;
        }
        if out.is_empty() && stop.offset != 0.0 {
            out.push(ColorStop::new(0.0, stop.color));
        }
        out.push(*stop);
        last_offset = stop.offset;
    }

    if let Some(&last) = out.last() {
        if last.offset != 1.0 {
            out.push(ColorStop::new(1.0, last.color));
        }
    }

    if out.is_empty() {
        out.push(ColorStop::new(0.0, Color::black()));
        out.push(ColorStop::new(1.0, Color::white()));
    }

    out
}

/// Expands normalized `stops` so they cover `[min_offset, max_offset]` under
/// the given spread mode.
///
/// Pad extends the edge colors, repeat restarts the ramp every unit, reflect
/// walks the ramp back and forth. Repeat and reflect periods start at the
/// nearest even integer at or below `min_offset`, so reflected runs line up.
///
/// This is the CPU form of what the GPU ramp sampler does with clamp, repeat
/// and mirror addressing; interpolating the result at `t` gives the color the
/// sampler returns for the wrapped `t`.
pub fn generate_stops(
    stops: &[ColorStop],
    spread: SpreadMode,
    min_offset: f32,
    max_offset: f32,
) -> Vec<ColorStop> {
    let mut out = Vec::new();
    let (Some(&first), Some(&last)) = (stops.first(), stops.last()) else {
        return out;
    };
    if stops.len() == 1 || !(min_offset.is_finite() && max_offset.is_finite()) {
        out.push(ColorStop::new(min_offset, first.color));
        out.push(ColorStop::new(max_offset, first.color));
        return out;
    }

    let mut o = 0.0f32;
    let mut min_done = false;

    if min_offset < 0.0 {
        if spread == SpreadMode::Pad {
            out.push(ColorStop::new(min_offset, first.color));
            if max_offset < 0.0 {
                out.push(ColorStop::new(max_offset, first.color));
                return out;
            }
        } else {
            let ioff = min_offset.floor() as i64;
            o = (ioff - (ioff & 1)) as f32;
        }
    }

    // Every step advances `o` by a stop gap; zero gaps only occur between
    // coincident stops, and each full pass over the ramp advances by 1.
    let span = (max_offset - o).max(0.0).ceil() as usize + 1;
    let max_steps = span.saturating_mul(stops.len()).saturating_add(stops.len());

    let end_forward = stops.len() - 1;
    let mut step: isize = 1;
    let mut i1: usize = 0;
    let mut iend = end_forward;

    for _ in 0..max_steps {
        if i1 == iend {
            match spread {
                SpreadMode::Pad => {
                    if !min_done {
                        out.push(ColorStop::new(min_offset, last.color));
                    }
                    out.push(ColorStop::new(max_offset, last.color));
                    return out;
                }
                SpreadMode::Repeat => {
                    i1 = 0;
                    if min_done {
                        out.push(ColorStop::new(o, first.color));
                    }
                }
                SpreadMode::Reflect => {
                    step = -step;
                    iend = if step == 1 { end_forward } else { 0 };
                }
            }
        }

        let i2 = (i1 as isize + step) as usize;
        let s1 = stops[i1];
        let s2 = stops[i2];
        let gap = (s2.offset - s1.offset).abs();

        if !min_done && o + gap > min_offset {
            min_done = true;
            out.push(ColorStop::new(o, s1.color));
        }

        let max_done = o + gap > max_offset;

        if min_done {
            out.push(ColorStop::new(o + gap, s2.color));
        }

        if max_done {
            break;
        }
        o += gap;
        i1 = i2;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red() -> Color { Color::new(1.0, 0.0, 0.0, 1.0) }
    fn blue() -> Color { Color::new(0.0, 0.0, 1.0, 1.0) }
    fn s(offset: f32, color: Color) -> ColorStop { ColorStop::new(offset, color) }

    fn is_normalized(stops: &[ColorStop]) -> bool {
        !stops.is_empty()
            && stops[0].offset == 0.0
            && stops[stops.len() - 1].offset == 1.0
            && stops.windows(2).all(|w| w[0].offset <= w[1].offset)
    }

    // ── normalize_stops ───────────────────────────────────────────────────

    #[test]
    fn descending_input_falls_back_to_default() {
        let out = normalize_stops(&[s(0.3, red()), s(0.1, blue())]);
        assert_eq!(out, vec![s(0.0, Color::black()), s(1.0, Color::white())]);
    }

    #[test]
    fn empty_input_falls_back_to_default() {
        let out = normalize_stops(&[]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].color, Color::black());
        assert_eq!(out[1].color, Color::white());
    }

    #[test]
    fn interior_stop_gets_both_boundaries() {
        let out = normalize_stops(&[s(0.5, red())]);
        assert_eq!(out, vec![s(0.0, red()), s(0.5, red()), s(1.0, red())]);
    }

    #[test]
    fn out_of_range_stops_are_skipped() {
        let out = normalize_stops(&[s(-0.5, blue()), s(0.0, red()), s(1.5, blue()), s(1.0, red())]);
        assert_eq!(out, vec![s(0.0, red()), s(1.0, red())]);
    }

    #[test]
    fn trailing_boundary_uses_last_accepted_color() {
        let out = normalize_stops(&[s(0.0, red()), s(0.4, blue()), s(7.0, red())]);
        assert_eq!(out.last().copied(), Some(s(1.0, blue())));
    }

    #[test]
    fn equal_offsets_are_kept() {
        let out = normalize_stops(&[s(0.0, red()), s(0.5, red()), s(0.5, blue()), s(1.0, blue())]);
        assert_eq!(out.len(), 4);
        assert!(is_normalized(&out));
    }

    #[test]
    fn normalized_output_is_always_monotonic() {
        let inputs: [&[ColorStop]; 4] = [
            &[s(0.9, red()), s(0.2, blue()), s(0.5, red())],
            &[s(0.25, red()), s(0.75, blue())],
            &[s(f32::NAN, red())],
            &[s(1.0, red())],
        ];
        for input in inputs {
            assert!(is_normalized(&normalize_stops(input)), "input {input:?}");
        }
    }

    // ── generate_stops ────────────────────────────────────────────────────

    fn ramp() -> Vec<ColorStop> {
        vec![s(0.0, red()), s(1.0, blue())]
    }

    #[test]
    fn pad_extends_edge_colors() {
        let out = generate_stops(&ramp(), SpreadMode::Pad, -1.0, 2.0);
        assert_eq!(out.first().copied(), Some(s(-1.0, red())));
        assert_eq!(out.last().copied(), Some(s(2.0, blue())));
    }

    #[test]
    fn pad_entirely_below_zero_is_flat_first_color() {
        let out = generate_stops(&ramp(), SpreadMode::Pad, -3.0, -2.0);
        assert_eq!(out, vec![s(-3.0, red()), s(-2.0, red())]);
    }

    #[test]
    fn repeat_restarts_each_unit() {
        let out = generate_stops(&ramp(), SpreadMode::Repeat, 0.0, 2.5);
        assert!(out.windows(2).all(|w| w[0].offset <= w[1].offset));
        assert!(out.last().unwrap().offset >= 2.5);
        // Each period begins with the first stop's color.
        assert!(out.iter().any(|st| st.offset == 1.0 && st.color == red()));
        assert!(out.iter().any(|st| st.offset == 2.0 && st.color == red()));
    }

    #[test]
    fn reflect_alternates_direction() {
        let out = generate_stops(&ramp(), SpreadMode::Reflect, 0.0, 1.5);
        assert_eq!(out[0], s(0.0, red()));
        assert_eq!(out[1], s(1.0, blue()));
        assert_eq!(out[2], s(2.0, red()));
    }

    #[test]
    fn reflect_negative_start_aligns_to_even_period() {
        let out = generate_stops(&ramp(), SpreadMode::Reflect, -1.5, 0.5);
        assert!(out[0].offset <= -1.5);
        assert!(out.last().unwrap().offset >= 0.5);
    }
}

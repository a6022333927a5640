/// Normalized dash pattern.
///
/// Entries alternate on/off starting with "on". An odd trailing entry is
/// dropped, negative entries count as zero, and a pattern whose total cycle
/// length is not positive disables dashing.
#[derive(Debug, Clone, PartialEq)]
pub struct DashPattern {
    entries: Vec<f32>,
    cycle: f32,
}

impl DashPattern {
    pub fn new(raw: &[f32]) -> Option<Self> {
        let even = raw.len() - raw.len() % 2;
        let entries: Vec<f32> = raw[..even]
            .iter()
            .map(|&v| if v.is_finite() { v.max(0.0) } else { 0.0 })
            .collect();
        let cycle: f32 = entries.iter().sum();
        if entries.is_empty() || !(cycle > 0.0) || !cycle.is_finite() {
            return None;
        }
        Some(Self { entries, cycle })
    }

    #[inline]
    pub fn entries(&self) -> &[f32] {
        &self.entries
    }

    /// Sum of all entries (always positive).
    #[inline]
    pub fn cycle(&self) -> f32 {
        self.cycle
    }

    /// Upper bound on pattern steps needed to walk an edge of `len` units.
    ///
    /// Every full pass over the entries advances by one cycle, so an edge
    /// spans at most `ceil(len / cycle) + 1` passes. Saturates at
    /// `usize::MAX` for cycles far shorter than the edge.
    #[inline]
    pub fn max_steps(&self, len: f32) -> usize {
        let passes = (len.max(0.0) / self.cycle).ceil();
        let passes = if passes.is_nan() { 0 } else { passes as usize };
        self.entries.len().saturating_mul(passes.saturating_add(1)).saturating_add(1)
    }
}

/// Position within a dash pattern while walking a contour.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct DashCursor {
    /// Current entry.
    pub index: usize,
    /// Stroke distance at which the current entry began.
    pub start: f32,
    pub on: bool,
}

impl DashCursor {
    /// Cursor at stroke distance 0 for the given phase.
    ///
    /// The phase is first reduced modulo the cycle (keeping its sign), then
    /// consumed by walking entries forward for a positive phase or backward
    /// for a negative one.
    pub fn at_phase(pattern: &DashPattern, phase: f32) -> Self {
        let entries = pattern.entries();
        let n = entries.len();
        let phase = if phase.is_finite() { phase % pattern.cycle() } else { 0.0 };

        let mut c = DashCursor { index: 0, start: -phase, on: true };
        if c.start < 0.0 {
            while c.start + entries[c.index] <= 0.0 {
                c.start += entries[c.index];
                c.index = (c.index + 1) % n;
                c.on = !c.on;
            }
        } else if c.start > 0.0 {
            c.index = n;
            while c.start > 0.0 {
                c.index = if c.index == 0 { n - 1 } else { c.index - 1 };
                c.start -= entries[c.index];
                c.on = !c.on;
            }
        }
        c
    }

    /// Stroke distance at which the current entry ends.
    #[inline]
    pub fn end(&self, pattern: &DashPattern) -> f32 {
        self.start + pattern.entries()[self.index]
    }

    /// Moves to the next entry.
    #[inline]
    pub fn advance(&mut self, pattern: &DashPattern) {
        self.start = self.end(pattern);
        self.index = (self.index + 1) % pattern.entries().len();
        self.on = !self.on;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── normalization ─────────────────────────────────────────────────────

    #[test]
    fn odd_entry_is_dropped() {
        let p = DashPattern::new(&[4.0, 2.0, 9.0]).unwrap();
        assert_eq!(p.entries(), &[4.0, 2.0]);
        assert_eq!(p.cycle(), 6.0);
    }

    #[test]
    fn empty_or_zero_cycle_disables_dashing() {
        assert!(DashPattern::new(&[]).is_none());
        assert!(DashPattern::new(&[5.0]).is_none());
        assert!(DashPattern::new(&[0.0, 0.0]).is_none());
        assert!(DashPattern::new(&[-3.0, -1.0]).is_none());
    }

    #[test]
    fn negative_entries_count_as_zero() {
        let p = DashPattern::new(&[-3.0, 2.0]).unwrap();
        assert_eq!(p.entries(), &[0.0, 2.0]);
    }

    #[test]
    fn step_bound_grows_with_edge_length() {
        let p = DashPattern::new(&[10.0, 5.0]).unwrap();
        assert_eq!(p.max_steps(100.0), 2 * (7 + 1) + 1);
        assert!(p.max_steps(1000.0) > p.max_steps(100.0));
    }

    #[test]
    fn step_bound_saturates_for_tiny_cycles() {
        let p = DashPattern::new(&[1e-30, 1e-30]).unwrap();
        assert_eq!(p.max_steps(1e6), usize::MAX);
        assert_eq!(p.max_steps(f32::INFINITY), usize::MAX);
    }

    // ── phase ─────────────────────────────────────────────────────────────

    #[test]
    fn zero_phase_starts_on_first_entry() {
        let p = DashPattern::new(&[10.0, 5.0]).unwrap();
        assert_eq!(DashCursor::at_phase(&p, 0.0), DashCursor { index: 0, start: 0.0, on: true });
    }

    #[test]
    fn positive_phase_walks_forward() {
        let p = DashPattern::new(&[10.0, 5.0]).unwrap();
        let c = DashCursor::at_phase(&p, 12.0);
        assert_eq!(c.index, 1);
        assert!(!c.on);
        assert_eq!(c.start, -2.0);
        assert_eq!(c.end(&p), 3.0);
    }

    #[test]
    fn phase_reduces_modulo_cycle() {
        let p = DashPattern::new(&[10.0, 5.0]).unwrap();
        assert_eq!(DashCursor::at_phase(&p, 27.0), DashCursor::at_phase(&p, 12.0));
    }

    #[test]
    fn negative_phase_walks_backward() {
        let p = DashPattern::new(&[10.0, 5.0]).unwrap();
        let c = DashCursor::at_phase(&p, -3.0);
        // Distance 0 lies in the off entry that precedes the pattern start.
        assert_eq!(c.index, 1);
        assert!(!c.on);
        assert_eq!(c.start, -2.0);
        assert_eq!(c.end(&p), 3.0);
    }
}

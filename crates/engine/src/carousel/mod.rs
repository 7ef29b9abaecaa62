//! Infinite carousel state machine.
//!
//! The carousel tracks an unbounded signed *position*; the logical slide is
//! `position mod len`. A step past either end moves the position out of
//! `[0, len)` so the renderer can animate in the direction of travel. When the
//! transition ends the position is folded back into range and the result is
//! reported as a snap, which the renderer applies without animation.
//!
//! While a transition is running every further input is ignored.
//!
//! [`CarouselDriver`] runs the transition and autoplay timers on Tokio.

mod driver;

pub use driver::CarouselDriver;

/// User or timer input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarouselInput {
    Next,
    Prev,
    GoTo(usize),
    AutoplayTick,
}

/// Machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarouselPhase {
    Idle,
    /// Animating from logical slide `from` towards the current position.
    Transitioning { from: usize },
}

/// Result of feeding an input to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A transition started; the caller must arm the transition timer.
    Started { from: usize, position: i64 },
    /// Input arrived mid-transition and was dropped.
    Ignored,
    /// The input would not move the carousel.
    Unchanged,
}

/// Result of a transition timer elapsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settled {
    /// Logical slide now shown.
    pub index: usize,
    /// Whether the position was folded back into range.
    pub snapped: bool,
}

/// Carousel over `len` logical slides with `visible` rendered slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Carousel {
    len: usize,
    visible: usize,
    position: i64,
    phase: CarouselPhase,
}

impl Carousel {
    /// Create an idle carousel showing slide 0.
    ///
    /// `visible` is clamped to at least one slot.
    #[must_use]
    pub fn new(len: usize, visible: usize) -> Self {
        Self {
            len,
            visible: visible.max(1),
            position: 0,
            phase: CarouselPhase::Idle,
        }
    }

    /// Number of logical slides.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether there are no slides.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> CarouselPhase {
        self.phase
    }

    /// Whether a transition is running.
    #[must_use]
    pub const fn is_transitioning(&self) -> bool {
        matches!(self.phase, CarouselPhase::Transitioning { .. })
    }

    /// Raw position, possibly outside `[0, len)` mid-transition.
    #[must_use]
    pub const fn position(&self) -> i64 {
        self.position
    }

    /// Logical slide at the current position.
    #[must_use]
    pub fn index(&self) -> usize {
        self.logical(self.position)
    }

    /// Logical slides occupying the rendered slots, left to right.
    #[must_use]
    pub fn window(&self) -> Vec<usize> {
        if self.is_empty() {
            return Vec::new();
        }
        (0..self.visible)
            .map(|offset| {
                let offset = i64::try_from(offset).unwrap_or(i64::MAX);
                self.logical(self.position.saturating_add(offset))
            })
            .collect()
    }

    /// Feed an input.
    pub fn apply(&mut self, input: CarouselInput) -> StepOutcome {
        if self.is_transitioning() {
            return StepOutcome::Ignored;
        }
        if self.len <= 1 {
            return StepOutcome::Unchanged;
        }

        let from = self.index();
        let target = match input {
            CarouselInput::Next | CarouselInput::AutoplayTick => self.position + 1,
            CarouselInput::Prev => self.position - 1,
            CarouselInput::GoTo(index) => {
                if index >= self.len || index == from {
                    return StepOutcome::Unchanged;
                }
                i64::try_from(index).unwrap_or(0)
            }
        };

        self.position = target;
        self.phase = CarouselPhase::Transitioning { from };
        StepOutcome::Started {
            from,
            position: target,
        }
    }

    /// End the running transition.
    ///
    /// Returns `None` if no transition was running.
    pub fn finish_transition(&mut self) -> Option<Settled> {
        if !self.is_transitioning() {
            return None;
        }
        let index = self.index();
        let folded = i64::try_from(index).unwrap_or(0);
        let snapped = folded != self.position;
        self.position = folded;
        self.phase = CarouselPhase::Idle;
        Some(Settled { index, snapped })
    }

    fn logical(&self, position: i64) -> usize {
        let Ok(len) = i64::try_from(self.len) else {
            return 0;
        };
        if len == 0 {
            return 0;
        }
        usize::try_from(position.rem_euclid(len)).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_wraps_with_snap() {
        let mut c = Carousel::new(3, 1);
        for expected in [1, 2] {
            assert!(matches!(c.apply(CarouselInput::Next), StepOutcome::Started { .. }));
            assert_eq!(
                c.finish_transition(),
                Some(Settled {
                    index: expected,
                    snapped: false
                })
            );
        }

        assert_eq!(
            c.apply(CarouselInput::Next),
            StepOutcome::Started {
                from: 2,
                position: 3
            }
        );
        assert_eq!(c.index(), 0);
        assert_eq!(
            c.finish_transition(),
            Some(Settled {
                index: 0,
                snapped: true
            })
        );
        assert_eq!(c.position(), 0);
    }

    #[test]
    fn test_prev_from_first_wraps_to_last() {
        let mut c = Carousel::new(4, 1);
        c.apply(CarouselInput::Prev);
        assert_eq!(c.position(), -1);
        assert_eq!(
            c.finish_transition(),
            Some(Settled {
                index: 3,
                snapped: true
            })
        );
    }

    #[test]
    fn test_input_ignored_while_transitioning() {
        let mut c = Carousel::new(5, 1);
        c.apply(CarouselInput::Next);
        assert_eq!(c.apply(CarouselInput::Next), StepOutcome::Ignored);
        assert_eq!(c.apply(CarouselInput::AutoplayTick), StepOutcome::Ignored);
        assert_eq!(c.finish_transition().map(|s| s.index), Some(1));
        assert_eq!(c.finish_transition(), None);
    }

    #[test]
    fn test_go_to() {
        let mut c = Carousel::new(5, 1);
        assert_eq!(c.apply(CarouselInput::GoTo(0)), StepOutcome::Unchanged);
        assert_eq!(c.apply(CarouselInput::GoTo(9)), StepOutcome::Unchanged);
        assert!(matches!(c.apply(CarouselInput::GoTo(3)), StepOutcome::Started { from: 0, .. }));
        assert_eq!(c.finish_transition().map(|s| s.index), Some(3));
    }

    #[test]
    fn test_window_wraps_over_logical_slides() {
        let mut c = Carousel::new(4, 3);
        assert_eq!(c.window(), vec![0, 1, 2]);
        c.apply(CarouselInput::Prev);
        assert_eq!(c.window(), vec![3, 0, 1]);
        c.finish_transition();
        assert_eq!(c.window(), vec![3, 0, 1]);
    }

    #[test]
    fn test_degenerate_sizes() {
        let mut empty = Carousel::new(0, 3);
        assert!(empty.window().is_empty());
        assert_eq!(empty.apply(CarouselInput::Next), StepOutcome::Unchanged);

        let mut single = Carousel::new(1, 2);
        assert_eq!(single.apply(CarouselInput::Next), StepOutcome::Unchanged);
        assert_eq!(single.window(), vec![0, 0]);
    }
}

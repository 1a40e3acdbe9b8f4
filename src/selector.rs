use std::time::Duration;

use rand::Rng;

use crate::runtime::Repeating;

/// Cadence of the spin animation.
pub const SPIN_INTERVAL_MS: u64 = 100;
/// Transient indices shown before the final one.
pub const SPIN_STEPS: u32 = 10;

/// Uniformly pick an index in `[0, len)`.
///
/// `len` must be at least 1; a single variant always yields 0.
pub fn random_index<R: Rng>(rng: &mut R, len: usize) -> usize {
    debug_assert!(len > 0, "cannot pick from an empty variant list");
    if len <= 1 {
        return 0;
    }
    rng.gen_range(0..len)
}

/// Something the selector reports to its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEvent {
    /// Shown while spinning; never persisted.
    Transient(usize),
    /// The locked-in choice.
    Final(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpinSettings {
    pub animate: bool,
    pub steps: u32,
    pub interval: Duration,
}

impl Default for SpinSettings {
    fn default() -> Self {
        Self {
            animate: true,
            steps: SPIN_STEPS,
            interval: Duration::from_millis(SPIN_INTERVAL_MS),
        }
    }
}

impl SpinSettings {
    pub fn instant() -> Self {
        Self {
            animate: false,
            ..Self::default()
        }
    }
}

/// One-shot random variant picker.
///
/// A selection is reported exactly once per unlocked session; further
/// requests are ignored until [`VariantSelector::reset`].
#[derive(Debug, Clone)]
pub struct VariantSelector {
    len: usize,
    difficulty: Option<Vec<String>>,
    settings: SpinSettings,
    locked: bool,
    selected: Option<usize>,
    highlighted: Option<usize>,
    spin: Option<Repeating>,
}

impl VariantSelector {
    pub fn new(len: usize, difficulty: Option<Vec<String>>, settings: SpinSettings) -> Self {
        Self {
            len: len.max(1),
            difficulty,
            settings,
            locked: false,
            selected: None,
            highlighted: None,
            spin: None,
        }
    }

    pub fn variant_count(&self) -> usize {
        self.len
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_spinning(&self) -> bool {
        self.spin.is_some()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// The index currently on display: the transient one while spinning.
    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted.or(self.selected)
    }

    pub fn difficulty_label(&self, index: usize) -> Option<&str> {
        self.difficulty
            .as_ref()
            .and_then(|labels| labels.get(index))
            .map(String::as_str)
    }

    /// Ask for a variant. Returns `None` when locked or already spinning.
    pub fn request<R: Rng>(&mut self, rng: &mut R) -> Option<SelectionEvent> {
        if self.locked || self.spin.is_some() {
            return None;
        }

        let settings = &self.settings;
        if !settings.animate || settings.steps == 0 || settings.interval.is_zero() {
            return Some(self.settle(rng));
        }

        let first = random_index(rng, self.len);
        self.highlighted = Some(first);
        // the last firing settles the choice
        self.spin = Some(Repeating::bounded(
            self.settings.interval,
            self.settings.steps,
        ));
        Some(SelectionEvent::Transient(first))
    }

    /// Advance the spin animation. Returns every event due in `dt`, ending
    /// with `Final` once the animation runs out.
    pub fn on_tick<R: Rng>(&mut self, dt: Duration, rng: &mut R) -> Vec<SelectionEvent> {
        let Some(spin) = self.spin.as_mut() else {
            return Vec::new();
        };

        let fired = spin.advance(dt);
        let exhausted = spin.is_exhausted();
        let mut events = Vec::with_capacity(fired as usize);

        let transients = if exhausted { fired.saturating_sub(1) } else { fired };
        for _ in 0..transients {
            let index = random_index(rng, self.len);
            self.highlighted = Some(index);
            events.push(SelectionEvent::Transient(index));
        }

        if exhausted {
            self.spin = None;
            events.push(self.settle(rng));
        }
        events
    }

    /// Lock in a previously chosen index, e.g. when restoring saved progress.
    pub fn restore(&mut self, index: usize) {
        self.spin = None;
        self.selected = Some(index.min(self.len - 1));
        self.highlighted = None;
        self.locked = true;
    }

    /// Unlock the control and forget the choice.
    pub fn reset(&mut self) {
        self.cancel();
        self.selected = None;
        self.locked = false;
    }

    /// Stop a running spin without settling.
    pub fn cancel(&mut self) {
        self.spin = None;
        self.highlighted = None;
    }

    fn settle<R: Rng>(&mut self, rng: &mut R) -> SelectionEvent {
        let index = random_index(rng, self.len);
        self.selected = Some(index);
        self.highlighted = None;
        self.locked = true;
        SelectionEvent::Final(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn spin_to_end(selector: &mut VariantSelector, rng: &mut StdRng) -> Vec<SelectionEvent> {
        let mut events = Vec::new();
        for _ in 0..100 {
            events.extend(selector.on_tick(Duration::from_millis(100), rng));
            if !selector.is_spinning() {
                break;
            }
        }
        events
    }

    #[test]
    fn random_index_stays_in_range() {
        let mut rng = rng();
        for len in 1..20 {
            for _ in 0..50 {
                assert!(random_index(&mut rng, len) < len);
            }
        }
    }

    #[test]
    fn instant_selection_locks_immediately() {
        let mut rng = rng();
        let mut selector = VariantSelector::new(3, None, SpinSettings::instant());

        let event = selector.request(&mut rng).unwrap();

        let SelectionEvent::Final(index) = event else {
            panic!("expected a final selection, got {event:?}");
        };
        assert!(index < 3);
        assert!(selector.is_locked());
        assert_eq!(selector.selected(), Some(index));
    }

    #[test]
    fn zero_interval_spin_settles_at_once() {
        let mut rng = rng();
        let settings = SpinSettings {
            animate: true,
            steps: SPIN_STEPS,
            interval: Duration::ZERO,
        };
        let mut selector = VariantSelector::new(3, None, settings);

        let event = selector.request(&mut rng);

        assert!(matches!(event, Some(SelectionEvent::Final(_))), "{event:?}");
        assert!(!selector.is_spinning());
        assert!(selector.is_locked());
    }

    #[test]
    fn locked_selector_ignores_requests() {
        let mut rng = rng();
        let mut selector = VariantSelector::new(5, None, SpinSettings::instant());
        selector.request(&mut rng);
        let chosen = selector.selected();

        for _ in 0..20 {
            assert_eq!(selector.request(&mut rng), None);
        }
        assert_eq!(selector.selected(), chosen);
    }

    #[test]
    fn animated_selection_reports_exactly_one_final() {
        let mut rng = rng();
        let mut selector = VariantSelector::new(4, None, SpinSettings::default());

        let first = selector.request(&mut rng).unwrap();
        assert!(matches!(first, SelectionEvent::Transient(_)));
        assert!(!selector.is_locked());
        assert_eq!(selector.request(&mut rng), None, "second request while spinning");

        let events = spin_to_end(&mut selector, &mut rng);
        let finals: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                SelectionEvent::Final(i) => Some(*i),
                SelectionEvent::Transient(_) => None,
            })
            .collect();

        assert_eq!(finals.len(), 1);
        assert_eq!(events.last(), Some(&SelectionEvent::Final(finals[0])));
        assert_eq!(events.len() as u32, SPIN_STEPS);
        assert_eq!(selector.selected(), Some(finals[0]));
        assert!(selector.is_locked());
    }

    #[test]
    fn large_tick_settles_in_one_call() {
        let mut rng = rng();
        let mut selector = VariantSelector::new(2, None, SpinSettings::default());
        selector.request(&mut rng);

        let events = selector.on_tick(Duration::from_secs(10), &mut rng);

        assert!(matches!(events.last(), Some(SelectionEvent::Final(_))));
        assert!(!selector.is_spinning());
    }

    #[test]
    fn single_variant_spins_and_settles_on_zero() {
        let mut rng = rng();
        let mut selector = VariantSelector::new(1, None, SpinSettings::default());

        assert_eq!(
            selector.request(&mut rng),
            Some(SelectionEvent::Transient(0))
        );
        let events = spin_to_end(&mut selector, &mut rng);

        assert!(events.iter().all(|e| matches!(
            e,
            SelectionEvent::Transient(0) | SelectionEvent::Final(0)
        )));
        assert_eq!(selector.selected(), Some(0));
    }

    #[test]
    fn cancel_mid_spin_reports_nothing_more() {
        let mut rng = rng();
        let mut selector = VariantSelector::new(3, None, SpinSettings::default());
        selector.request(&mut rng);
        selector.on_tick(Duration::from_millis(300), &mut rng);

        selector.cancel();

        assert!(selector
            .on_tick(Duration::from_secs(5), &mut rng)
            .is_empty());
        assert!(!selector.is_locked());
        assert_eq!(selector.selected(), None);
    }

    #[test]
    fn reset_unlocks() {
        let mut rng = rng();
        let mut selector = VariantSelector::new(3, None, SpinSettings::instant());
        selector.request(&mut rng);

        selector.reset();

        assert!(!selector.is_locked());
        assert_eq!(selector.selected(), None);
        assert!(matches!(
            selector.request(&mut rng),
            Some(SelectionEvent::Final(_))
        ));
    }

    #[test]
    fn restore_locks_the_given_index() {
        let mut selector = VariantSelector::new(3, None, SpinSettings::default());
        selector.restore(2);

        assert!(selector.is_locked());
        assert_eq!(selector.selected(), Some(2));
        assert_eq!(selector.request(&mut rng()), None);
    }

    #[test]
    fn difficulty_labels_are_optional() {
        let labels = vec!["easy".to_string(), "hard".to_string()];
        let selector = VariantSelector::new(2, Some(labels), SpinSettings::default());

        assert_eq!(selector.difficulty_label(1), Some("hard"));
        assert_eq!(selector.difficulty_label(5), None);

        let plain = VariantSelector::new(2, None, SpinSettings::default());
        assert_eq!(plain.difficulty_label(0), None);
    }
}

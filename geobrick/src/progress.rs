/// Progress sink. Returning `false` asks the writer to stop.
pub trait Progress {
    /// `complete` runs from 0.0 to 1.0.
    fn report(&mut self, complete: f64) -> bool;
}

impl<F: FnMut(f64) -> bool> Progress for F {
    fn report(&mut self, complete: f64) -> bool {
        self(complete)
    }
}

/// Ignores progress and never cancels.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Progress for Silent {
    fn report(&mut self, _complete: f64) -> bool {
        true
    }
}

/// Maps the 0..1 progress of a sub task onto `min..max` of its parent.
pub(crate) struct Scaled<'a> {
    parent: &'a mut dyn Progress,
    min: f64,
    max: f64,
}

impl<'a> Scaled<'a> {
    pub fn new(parent: &'a mut dyn Progress, min: f64, max: f64) -> Self {
        Self { parent, min, max }
    }
}

impl Progress for Scaled<'_> {
    fn report(&mut self, complete: f64) -> bool {
        self.parent.report(self.min + complete * (self.max - self.min))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled() {
        let mut seen = Vec::new();
        let mut parent = |p: f64| {
            seen.push(p);
            p < 0.7
        };
        let mut scaled = Scaled::new(&mut parent, 0.5, 0.75);
        assert!(scaled.report(0.0));
        assert!(!scaled.report(1.0));
        assert_eq!(seen, vec![0.5, 0.75]);
    }
}

//! Symbolic constraint priorities folded into a single real number.

/// A constraint priority. Internally a single `f64` composed from three
/// clipped components (`strong`, `medium`, `weak` buckets) and a weight, per
/// the classic Cassowary strength encoding.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Strength(f64);

const CLIP_LO: f64 = 0.0;
const CLIP_HI: f64 = 1000.0;

impl Strength {
    /// Constraints at this strength must hold exactly (up to epsilon); they
    /// never contribute to the objective.
    pub const REQUIRED: Strength = Strength(1_001_001_000.0);
    pub const STRONG: Strength = Strength(1_000_000.0);
    pub const MEDIUM: Strength = Strength(1_000.0);
    pub const WEAK: Strength = Strength(1.0);

    /// `clip(a*w)*1e6 + clip(b*w)*1e3 + clip(c*w)`, clipped again to
    /// `[0, REQUIRED]`.
    pub fn create(a: f64, b: f64, c: f64, weight: f64) -> Strength {
        let clip_component = |x: f64| x.max(CLIP_LO).min(CLIP_HI);
        let value = clip_component(a * weight) * 1_000_000.0
            + clip_component(b * weight) * 1_000.0
            + clip_component(c * weight);
        Strength(value).clip()
    }

    /// `create(a, b, c, 1.0)`.
    pub fn new(a: f64, b: f64, c: f64) -> Strength {
        Self::create(a, b, c, 1.0)
    }

    pub fn clip(self) -> Strength {
        Strength(self.0.max(CLIP_LO).min(Self::REQUIRED.0))
    }

    pub fn is_required(self) -> bool {
        self.0 >= Self::REQUIRED.0
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for Strength {
    fn default() -> Self {
        Strength::REQUIRED
    }
}

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::RationError;

/// A nutrient tracked by the formulation.
///
/// Protein, TDN and the macro minerals are percentages of dry matter;
/// the trace minerals are parts per million.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Nutrient {
    Protein,
    Tdn,
    Ca,
    P,
    Mg,
    Fe,
    Cu,
    Zn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NutrientUnit {
    /// Percent of dry matter; 1 % = 10 g/kg
    Percent,
    /// Parts per million; 1 ppm = 1 mg/kg = 0.001 g/kg
    Ppm,
}

impl NutrientUnit {
    /// Grams of nutrient per kilogram of feed for one unit of concentration
    pub fn grams_per_kg(self) -> f64 {
        match self {
            NutrientUnit::Percent => 10.0,
            NutrientUnit::Ppm => 0.001,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            NutrientUnit::Percent => "%",
            NutrientUnit::Ppm => "ppm",
        }
    }
}

impl Nutrient {
    pub const ALL: [Nutrient; 8] = [
        Nutrient::Protein,
        Nutrient::Tdn,
        Nutrient::Ca,
        Nutrient::P,
        Nutrient::Mg,
        Nutrient::Fe,
        Nutrient::Cu,
        Nutrient::Zn,
    ];

    pub const MINERALS: [Nutrient; 6] = [
        Nutrient::Ca,
        Nutrient::P,
        Nutrient::Mg,
        Nutrient::Fe,
        Nutrient::Cu,
        Nutrient::Zn,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Nutrient::Protein => "protein",
            Nutrient::Tdn => "tdn",
            Nutrient::Ca => "ca",
            Nutrient::P => "p",
            Nutrient::Mg => "mg",
            Nutrient::Fe => "fe",
            Nutrient::Cu => "cu",
            Nutrient::Zn => "zn",
        }
    }

    pub fn unit(self) -> NutrientUnit {
        match self {
            Nutrient::Fe | Nutrient::Cu | Nutrient::Zn => NutrientUnit::Ppm,
            _ => NutrientUnit::Percent,
        }
    }

    pub fn is_mineral(self) -> bool {
        !matches!(self, Nutrient::Protein | Nutrient::Tdn)
    }

    /// Convert a concentration in this nutrient's unit to grams per kilogram.
    ///
    /// Every LP row is written in g/kg, so thresholds and coefficients of the
    /// same row always share a scale.
    pub fn to_grams_per_kg(self, concentration: f64) -> f64 {
        concentration * self.unit().grams_per_kg()
    }

    pub fn from_grams_per_kg(self, grams: f64) -> f64 {
        grams / self.unit().grams_per_kg()
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.code())
    }
}

impl FromStr for Nutrient {
    type Err = RationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        Nutrient::ALL
            .into_iter()
            .find(|n| n.code() == code)
            .ok_or_else(|| RationError::UnknownNutrient(s.to_string()))
    }
}

/// Concentration of every tracked nutrient.
///
/// All eight values are always present. When loading, `protein` and `tdn`
/// are required and any missing mineral defaults to zero.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NutrientProfile {
    pub protein: f64,
    pub tdn: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub ca: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub p: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub mg: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub fe: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cu: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub zn: f64,
}

impl NutrientProfile {
    /// Profile with protein and TDN set and all minerals zero
    pub fn new(protein: f64, tdn: f64) -> Self {
        Self {
            protein,
            tdn,
            ..Self::default()
        }
    }

    pub fn with(mut self, nutrient: Nutrient, value: f64) -> Self {
        self.set(nutrient, value);
        self
    }

    pub fn get(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Protein => self.protein,
            Nutrient::Tdn => self.tdn,
            Nutrient::Ca => self.ca,
            Nutrient::P => self.p,
            Nutrient::Mg => self.mg,
            Nutrient::Fe => self.fe,
            Nutrient::Cu => self.cu,
            Nutrient::Zn => self.zn,
        }
    }

    pub fn set(&mut self, nutrient: Nutrient, value: f64) {
        let slot = match nutrient {
            Nutrient::Protein => &mut self.protein,
            Nutrient::Tdn => &mut self.tdn,
            Nutrient::Ca => &mut self.ca,
            Nutrient::P => &mut self.p,
            Nutrient::Mg => &mut self.mg,
            Nutrient::Fe => &mut self.fe,
            Nutrient::Cu => &mut self.cu,
            Nutrient::Zn => &mut self.zn,
        };
        *slot = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Nutrient, f64)> + '_ {
        Nutrient::ALL.into_iter().map(|n| (n, self.get(n)))
    }
}

/// The nutrients whose minimums a problem enforces.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NutrientSet(BTreeSet<Nutrient>);

impl NutrientSet {
    /// Protein and TDN, which every ration enforces
    pub fn core() -> Self {
        Self(BTreeSet::from([Nutrient::Protein, Nutrient::Tdn]))
    }

    /// No nutrient rows at all; only intake and share rows are built
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    pub fn all() -> Self {
        Self(Nutrient::ALL.into_iter().collect())
    }

    pub fn insert(&mut self, nutrient: Nutrient) -> bool {
        self.0.insert(nutrient)
    }

    pub fn contains(&self, nutrient: Nutrient) -> bool {
        self.0.contains(&nutrient)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Nutrient> + '_ {
        self.0.iter().copied()
    }
}

impl Default for NutrientSet {
    fn default() -> Self {
        Self::core()
    }
}

impl Extend<Nutrient> for NutrientSet {
    fn extend<I: IntoIterator<Item = Nutrient>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_conversion() {
        // 12 % protein is 120 g/kg; 50 ppm iron is 0.05 g/kg
        assert_eq!(Nutrient::Protein.to_grams_per_kg(12.0), 120.0);
        assert!((Nutrient::Fe.to_grams_per_kg(50.0) - 0.05).abs() < 1e-12);
        assert!((Nutrient::Zn.from_grams_per_kg(Nutrient::Zn.to_grams_per_kg(40.0)) - 40.0).abs() < 1e-12);
        assert_eq!(Nutrient::Cu.unit().symbol(), "ppm");
    }

    #[test]
    fn test_parse_codes() {
        assert_eq!("TDN".parse::<Nutrient>().unwrap(), Nutrient::Tdn);
        assert_eq!(" zn ".parse::<Nutrient>().unwrap(), Nutrient::Zn);
        assert!("selenium".parse::<Nutrient>().is_err());
        for n in Nutrient::ALL {
            assert_eq!(n.code().parse::<Nutrient>().unwrap(), n);
        }
    }

    #[test]
    fn test_profile_defaults_minerals_to_zero() {
        let profile = NutrientProfile::new(10.2, 55.0).with(Nutrient::Fe, 250.0);
        assert_eq!(profile.get(Nutrient::Protein), 10.2);
        assert_eq!(profile.get(Nutrient::Fe), 250.0);
        assert_eq!(profile.get(Nutrient::Ca), 0.0);
        assert_eq!(profile.iter().count(), 8);
    }

    #[test]
    fn test_core_set_always_has_protein_and_tdn() {
        let mut set = NutrientSet::core();
        assert!(set.contains(Nutrient::Protein) && set.contains(Nutrient::Tdn));
        set.extend(Nutrient::MINERALS);
        assert_eq!(set.len(), 8);
        assert!(!set.insert(Nutrient::Ca));
    }
}

use phf::{Map, phf_map};
use std::str::FromStr;

/// Lookup table from normalized element symbol to element.
///
/// Covers the elements commonly observed in macromolecular structures,
/// including the metals that occur as cofactors or crystallization additives.
static ELEMENT_BY_SYMBOL: Map<&'static str, Element> = phf_map! {
    "H" => Element::Hydrogen,
    "C" => Element::Carbon,
    "N" => Element::Nitrogen,
    "O" => Element::Oxygen,
    "F" => Element::Fluorine,
    "Na" => Element::Sodium,
    "Mg" => Element::Magnesium,
    "P" => Element::Phosphorus,
    "S" => Element::Sulfur,
    "Cl" => Element::Chlorine,
    "K" => Element::Potassium,
    "Ca" => Element::Calcium,
    "Mn" => Element::Manganese,
    "Fe" => Element::Iron,
    "Co" => Element::Cobalt,
    "Ni" => Element::Nickel,
    "Cu" => Element::Copper,
    "Zn" => Element::Zinc,
    "Se" => Element::Selenium,
    "Br" => Element::Bromine,
    "I" => Element::Iodine,
};

/// Chemical element metadata attached to a point sample.
///
/// The engine itself is element-agnostic; the only property it consumes is
/// the atomic mass, which weights the center-of-mass computation. Points
/// without an element fall back to unit mass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
    Hydrogen,
    Carbon,
    Nitrogen,
    Oxygen,
    Fluorine,
    Sodium,
    Magnesium,
    Phosphorus,
    Sulfur,
    Chlorine,
    Potassium,
    Calcium,
    Manganese,
    Iron,
    Cobalt,
    Nickel,
    Copper,
    Zinc,
    Selenium,
    Bromine,
    Iodine,
}

impl Element {
    /// Standard atomic mass in Daltons.
    pub fn mass(&self) -> f64 {
        match self {
            Element::Hydrogen => 1.008,
            Element::Carbon => 12.011,
            Element::Nitrogen => 14.007,
            Element::Oxygen => 15.999,
            Element::Fluorine => 18.998,
            Element::Sodium => 22.990,
            Element::Magnesium => 24.305,
            Element::Phosphorus => 30.974,
            Element::Sulfur => 32.06,
            Element::Chlorine => 35.45,
            Element::Potassium => 39.098,
            Element::Calcium => 40.078,
            Element::Manganese => 54.938,
            Element::Iron => 55.845,
            Element::Cobalt => 58.933,
            Element::Nickel => 58.693,
            Element::Copper => 63.546,
            Element::Zinc => 65.38,
            Element::Selenium => 78.971,
            Element::Bromine => 79.904,
            Element::Iodine => 126.904,
        }
    }

    /// The element symbol in its conventional capitalization.
    pub fn symbol(&self) -> &'static str {
        match self {
            Element::Hydrogen => "H",
            Element::Carbon => "C",
            Element::Nitrogen => "N",
            Element::Oxygen => "O",
            Element::Fluorine => "F",
            Element::Sodium => "Na",
            Element::Magnesium => "Mg",
            Element::Phosphorus => "P",
            Element::Sulfur => "S",
            Element::Chlorine => "Cl",
            Element::Potassium => "K",
            Element::Calcium => "Ca",
            Element::Manganese => "Mn",
            Element::Iron => "Fe",
            Element::Cobalt => "Co",
            Element::Nickel => "Ni",
            Element::Copper => "Cu",
            Element::Zinc => "Zn",
            Element::Selenium => "Se",
            Element::Bromine => "Br",
            Element::Iodine => "I",
        }
    }
}

impl FromStr for Element {
    type Err = ();

    /// Parses an element symbol, case-insensitively ("FE", "fe" and "Fe" all
    /// resolve to iron).
    ///
    /// # Errors
    ///
    /// Returns `()` if the input is not a known element symbol.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.len() > 2 {
            return Err(());
        }
        let mut symbol = String::with_capacity(2);
        let mut chars = s.chars();
        if let Some(first) = chars.next() {
            symbol.push(first.to_ascii_uppercase());
        }
        for c in chars {
            symbol.push(c.to_ascii_lowercase());
        }
        ELEMENT_BY_SYMBOL.get(symbol.as_str()).copied().ok_or(())
    }
}

use nalgebra::Point3;

/// A single atom record of a macromolecular structure.
///
/// Atoms carry only what the structure formats round-trip: identity, position
/// and the per-atom scalars written to the occupancy and B-factor columns.
/// The B-factor column holds per-residue confidence (pLDDT) for predicted models.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Serial number as read from the source file.
    pub serial: usize,
    /// The name of the atom (e.g., "CA", "N", "O").
    pub name: String,
    /// Element symbol, if the source provided one.
    pub element: Option<String>,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
    /// Occupancy fraction.
    pub occupancy: f64,
    /// Temperature factor, or model confidence for predicted structures.
    pub b_factor: f64,
}

impl Atom {
    /// Creates a new `Atom` with full occupancy and a zero B-factor.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the atom.
    /// * `position` - The 3D coordinates of the atom.
    pub fn new(name: &str, position: Point3<f64>) -> Self {
        Self {
            serial: 0,
            name: name.to_string(),
            element: None,
            position,
            occupancy: 1.0,
            b_factor: 0.0,
        }
    }

    /// Returns the element symbol, inferring it from the atom name when the
    /// source did not carry one.
    pub fn element_symbol(&self) -> String {
        if let Some(element) = &self.element {
            if !element.is_empty() {
                return element.clone();
            }
        }
        self.name
            .trim()
            .chars()
            .find(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_uppercase().to_string())
            .unwrap_or_default()
    }
}

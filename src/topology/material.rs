slotmap::new_key_type! {
    /// Unique identifier for a material in the CSG store.
    pub struct MaterialId;
}

/// Multi-group attenuation data filling a cell.
///
/// Only the total cross sections matter here: they bound the optical
/// length of a segment.
#[derive(Debug, Clone)]
pub struct Material {
    /// User-visible id, written to the track cache.
    pub id: i32,
    pub name: String,
    /// Total cross section per energy group.
    pub sigma_t: Vec<f64>,
}

impl Material {
    #[must_use]
    pub fn new(id: i32, name: &str, sigma_t: Vec<f64>) -> Self {
        Self {
            id,
            name: name.to_owned(),
            sigma_t,
        }
    }

    /// Largest total cross section over all groups, `0` when empty.
    #[must_use]
    pub fn max_sigma_t(&self) -> f64 {
        self.sigma_t.iter().copied().fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_sigma_t_over_groups() {
        let m = Material::new(1, "fuel", vec![0.2, 1.4, 0.9]);
        assert_eq!(m.max_sigma_t(), 1.4);
        assert_eq!(Material::new(2, "void", vec![]).max_sigma_t(), 0.0);
    }
}

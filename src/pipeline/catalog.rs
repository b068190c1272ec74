//! Bundled analyte catalog: canonical units, default reference ranges, and
//! the alias lists the rule-based extractor matches against.
//!
//! The catalog is immutable, built once at startup, and passed explicitly to
//! the extraction stages — it is the only state shared across uploads.

#[derive(Debug, Clone)]
pub struct AnalyteSpec {
    pub name: String,
    pub unit: String,
    pub ref_min: f64,
    pub ref_max: f64,
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AnalyteCatalog {
    entries: Vec<AnalyteSpec>,
}

impl AnalyteCatalog {
    /// The bundled default catalog. Order is stable; the synthetic fallback
    /// generator emits one reading per entry in this order.
    pub fn bundled() -> Self {
        let spec = |name: &str, unit: &str, ref_min: f64, ref_max: f64, aliases: &[&str]| {
            AnalyteSpec {
                name: name.to_string(),
                unit: unit.to_string(),
                ref_min,
                ref_max,
                aliases: aliases.iter().map(|a| a.to_string()).collect(),
            }
        };

        Self {
            entries: vec![
                spec("glucose", "mg/dL", 70.0, 100.0, &["glucose", "glu"]),
                spec(
                    "cholesterol_total",
                    "mg/dL",
                    125.0,
                    200.0,
                    &["cholesterol", "total cholesterol", "cholesterol total"],
                ),
                spec("hdl", "mg/dL", 40.0, 60.0, &["hdl", "good cholesterol"]),
                spec("ldl", "mg/dL", 0.0, 130.0, &["ldl", "bad cholesterol"]),
                spec(
                    "triglycerides",
                    "mg/dL",
                    0.0,
                    150.0,
                    &["triglycerides", "triacylglycerols"],
                ),
                spec("hemoglobin", "g/dL", 12.0, 17.5, &["hemoglobin", "hgb"]),
            ],
        }
    }

    pub fn entries(&self) -> &[AnalyteSpec] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_catalog_has_six_analytes() {
        let catalog = AnalyteCatalog::bundled();
        assert_eq!(catalog.len(), 6);
        let names: Vec<&str> = catalog.entries().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "glucose",
                "cholesterol_total",
                "hdl",
                "ldl",
                "triglycerides",
                "hemoglobin"
            ]
        );
    }

    #[test]
    fn every_entry_has_a_valid_range_and_aliases() {
        for spec in AnalyteCatalog::bundled().entries() {
            assert!(spec.ref_min <= spec.ref_max, "{} range inverted", spec.name);
            assert!(!spec.aliases.is_empty(), "{} has no aliases", spec.name);
            assert!(!spec.unit.is_empty());
        }
    }
}

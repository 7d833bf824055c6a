//! Structural Shapes Catalog (AISC)
//!
//! Weight and paintable surface area per foot for rolled and hollow shapes.
//! Surface area is derived from section dimensions by family, so a catalog
//! loaded from a CSV without an explicit area column still prices coating.
//!
//! ## Supported Shape Families
//!
//! - **W, M, S, HP**: wide flange and other I-shapes
//! - **C, MC**: channels
//! - **L**: single angles
//! - **HSS**: rectangular/square and round hollow sections
//! - **Pipe**: standard pipe

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;

use crate::errors::{EstimateError, EstimateResult};
use crate::units::parse_inches;

/// Shape family classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeFamily {
    /// Wide flange beam (W-shape)
    W,
    /// Miscellaneous shape (M-shape)
    M,
    /// American Standard beam (S-shape)
    S,
    /// H-pile (HP-shape)
    HP,
    /// American Standard channel (C-shape)
    C,
    /// Miscellaneous channel (MC-shape)
    MC,
    /// Single angle (L-shape)
    L,
    /// Rectangular/square hollow structural section
    HssRect,
    /// Round hollow structural section
    HssRound,
    /// Pipe (standard, extra strong, double extra strong)
    Pipe,
}

impl ShapeFamily {
    /// All families for picker iteration
    pub const ALL: [ShapeFamily; 10] = [
        ShapeFamily::W,
        ShapeFamily::M,
        ShapeFamily::S,
        ShapeFamily::HP,
        ShapeFamily::C,
        ShapeFamily::MC,
        ShapeFamily::L,
        ShapeFamily::HssRect,
        ShapeFamily::HssRound,
        ShapeFamily::Pipe,
    ];

    /// Parse from AISC type code
    pub fn from_aisc_code(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "W" => Some(ShapeFamily::W),
            "M" => Some(ShapeFamily::M),
            "S" => Some(ShapeFamily::S),
            "HP" => Some(ShapeFamily::HP),
            "C" => Some(ShapeFamily::C),
            "MC" => Some(ShapeFamily::MC),
            "L" => Some(ShapeFamily::L),
            "HSS" => Some(ShapeFamily::HssRect), // refined by the caller when OD is present
            "PIPE" => Some(ShapeFamily::Pipe),
            _ => None,
        }
    }

    /// Infer the family from a designation such as `W14X90` or `HSS6.625X.280`.
    pub fn from_designation(designation: &str) -> Option<Self> {
        let key = normalize_designation(designation);
        if let Some(rest) = key.strip_prefix("HSS") {
            // Round HSS designations have two terms (OD x wall), rectangular have three.
            return Some(if rest.matches('X').count() == 1 {
                ShapeFamily::HssRound
            } else {
                ShapeFamily::HssRect
            });
        }
        if key.starts_with("PIPE") {
            return Some(ShapeFamily::Pipe);
        }
        let prefix: String = key.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
        Self::from_aisc_code(&prefix)
    }

    /// AISC type code (round and rectangular HSS share "HSS")
    pub fn code(&self) -> &'static str {
        match self {
            ShapeFamily::W => "W",
            ShapeFamily::M => "M",
            ShapeFamily::S => "S",
            ShapeFamily::HP => "HP",
            ShapeFamily::C => "C",
            ShapeFamily::MC => "MC",
            ShapeFamily::L => "L",
            ShapeFamily::HssRect | ShapeFamily::HssRound => "HSS",
            ShapeFamily::Pipe => "PIPE",
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            ShapeFamily::W => "Wide Flange (W)",
            ShapeFamily::M => "Miscellaneous (M)",
            ShapeFamily::S => "American Standard (S)",
            ShapeFamily::HP => "H-Pile (HP)",
            ShapeFamily::C => "Channel (C)",
            ShapeFamily::MC => "Miscellaneous Channel (MC)",
            ShapeFamily::L => "Angle (L)",
            ShapeFamily::HssRect => "HSS Rectangular/Square",
            ShapeFamily::HssRound => "HSS Round",
            ShapeFamily::Pipe => "Pipe",
        }
    }
}

impl std::fmt::Display for ShapeFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Section dimensions needed to derive paintable area (inches).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SectionDims {
    /// I-shapes and channels: depth, flange width, web thickness
    Flanged { d: f64, bf: f64, tw: f64 },
    /// Angles: both leg lengths
    Angle { leg_a: f64, leg_b: f64 },
    /// Rectangular/square HSS: outside height and width
    Box { h: f64, b: f64 },
    /// Round HSS and pipe: outside diameter
    Round { od: f64 },
}

impl SectionDims {
    /// Exterior surface area per linear foot, ft²/ft
    pub fn surface_area_per_ft(&self) -> f64 {
        match *self {
            SectionDims::Flanged { d, bf, tw } => (2.0 * d + 4.0 * bf - 2.0 * tw) / 12.0,
            SectionDims::Angle { leg_a, leg_b } => 2.0 * (leg_a + leg_b) / 12.0,
            SectionDims::Box { h, b } => 2.0 * (h + b) / 12.0,
            SectionDims::Round { od } => std::f64::consts::PI * od / 12.0,
        }
    }
}

/// One catalog row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeEntry {
    /// Shape family (W, HSS, C, L, etc.)
    pub family: ShapeFamily,

    /// AISC Manual label (e.g., "W14X90", "HSS8X8X1/2")
    pub designation: String,

    /// Nominal weight per linear foot (lb/ft)
    pub weight_per_ft: f64,

    /// Paintable surface area per linear foot (ft²/ft)
    pub surface_area_per_ft: f64,

    /// Dimensions the area was derived from, when known
    pub dims: Option<SectionDims>,
}

impl ShapeEntry {
    /// Build an entry whose surface area is derived from its dimensions.
    pub fn from_dims(family: ShapeFamily, designation: &str, weight_per_ft: f64, dims: SectionDims) -> Self {
        ShapeEntry {
            family,
            designation: designation.to_string(),
            weight_per_ft,
            surface_area_per_ft: dims.surface_area_per_ft(),
            dims: Some(dims),
        }
    }
}

impl std::fmt::Display for ShapeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({:.2} lb/ft, {:.3} sf/ft)",
            self.designation, self.weight_per_ft, self.surface_area_per_ft
        )
    }
}

/// Canonical lookup key: uppercase, no whitespace, `x` separators as `X`.
pub fn normalize_designation(designation: &str) -> String {
    designation
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Shape catalog indexed by normalized designation.
#[derive(Debug, Clone, Default)]
pub struct ShapeCatalog {
    /// Shapes indexed by normalized designation
    shapes: HashMap<String, ShapeEntry>,

    /// Designations grouped by family for pickers
    by_family: HashMap<ShapeFamily, Vec<String>>,

    /// Catalog version (e.g., "16.0")
    pub version: Option<String>,
}

impl ShapeCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a shape, replacing any entry with the same designation
    pub fn insert(&mut self, shape: ShapeEntry) {
        let key = normalize_designation(&shape.designation);
        let family = shape.family;

        if self.shapes.insert(key.clone(), shape).is_none() {
            self.by_family.entry(family).or_default().push(key);
        }
    }

    /// Look up a shape by designation (case- and whitespace-insensitive).
    pub fn get(&self, designation: &str) -> Option<&ShapeEntry> {
        self.shapes.get(&normalize_designation(designation))
    }

    /// All shapes of one family, sorted by designation
    pub fn shapes_of_family(&self, family: ShapeFamily) -> Vec<&ShapeEntry> {
        let mut shapes: Vec<&ShapeEntry> = self
            .by_family
            .get(&family)
            .map(|keys| keys.iter().filter_map(|k| self.shapes.get(k)).collect())
            .unwrap_or_default();
        shapes.sort_by(|a, b| a.designation.cmp(&b.designation));
        shapes
    }

    /// All shapes under an AISC type code, sorted by designation. "HSS"
    /// covers both rectangular and round sections. Empty for an unknown code.
    pub fn shapes_of_code(&self, code: &str) -> Vec<&ShapeEntry> {
        let code = code.trim().to_ascii_uppercase();
        let mut shapes: Vec<&ShapeEntry> = ShapeFamily::ALL
            .iter()
            .filter(|family| family.code() == code)
            .flat_map(|family| self.shapes_of_family(*family))
            .collect();
        shapes.sort_by(|a, b| a.designation.cmp(&b.designation));
        shapes
    }

    /// Prefix search (e.g., "W14" matches all W14 shapes), sorted by designation
    pub fn search(&self, pattern: &str) -> Vec<&ShapeEntry> {
        let prefix = normalize_designation(pattern);
        let mut shapes: Vec<&ShapeEntry> = self
            .shapes
            .iter()
            .filter(|(k, _)| k.starts_with(&prefix))
            .map(|(_, v)| v)
            .collect();
        shapes.sort_by(|a, b| a.designation.cmp(&b.designation));
        shapes
    }

    /// Get the number of shapes in the catalog
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Merge shapes from an AISC-style CSV export into this catalog.
    ///
    /// Required columns: `Type`, `AISC_Manual_Label`, `W`. An `SA` column
    /// (ft²/ft) is used directly when present; otherwise the area is derived
    /// from `d`/`bf`/`tw`, `Ht`/`B`, `OD` or the angle legs in the label.
    /// Returns the number of shapes loaded.
    pub fn load_csv<R: Read>(&mut self, reader: R) -> EstimateResult<usize> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| EstimateError::import(0, format!("Failed to read header: {}", e)))?
            .clone();
        let col = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

        let type_idx = col("Type").ok_or_else(|| EstimateError::import(0, "Missing 'Type' column"))?;
        let label_idx = col("AISC_Manual_Label")
            .ok_or_else(|| EstimateError::import(0, "Missing 'AISC_Manual_Label' column"))?;
        let w_idx = col("W").ok_or_else(|| EstimateError::import(0, "Missing 'W' column"))?;
        let sa_idx = col("SA");
        let d_idx = col("d");
        let bf_idx = col("bf");
        let tw_idx = col("tw");
        let ht_idx = col("Ht");
        let b_idx = col("B");
        let od_idx = col("OD");

        let mut loaded = 0;
        for (i, record) in csv_reader.records().enumerate() {
            let row = i + 2;
            let record = record.map_err(|e| EstimateError::import(row, e.to_string()))?;

            let field = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or("");
            let number = |idx: Option<usize>| parse_optional_f64(field(idx));

            let label = field(Some(label_idx));
            if label.is_empty() {
                continue; // Skip rows without a label
            }
            let family = match ShapeFamily::from_aisc_code(field(Some(type_idx))) {
                Some(ShapeFamily::HssRect) if number(od_idx).is_some() => ShapeFamily::HssRound,
                Some(f) => f,
                None => continue, // Skip unknown shape types
            };

            let dims = match family {
                ShapeFamily::HssRound | ShapeFamily::Pipe => {
                    number(od_idx).map(|od| SectionDims::Round { od })
                }
                ShapeFamily::HssRect => match (number(ht_idx), number(b_idx)) {
                    (Some(h), Some(b)) => Some(SectionDims::Box { h, b }),
                    _ => None,
                },
                ShapeFamily::L => angle_legs(label),
                _ => match (number(d_idx), number(bf_idx), number(tw_idx)) {
                    (Some(d), Some(bf), Some(tw)) => Some(SectionDims::Flanged { d, bf, tw }),
                    _ => None,
                },
            };

            let surface_area_per_ft = number(sa_idx)
                .or_else(|| dims.map(|d| d.surface_area_per_ft()))
                .unwrap_or(0.0);

            self.insert(ShapeEntry {
                family,
                designation: label.to_string(),
                weight_per_ft: number(Some(w_idx)).unwrap_or(0.0),
                surface_area_per_ft,
                dims,
            });
            loaded += 1;
        }

        Ok(loaded)
    }
}

/// Read the leg lengths out of an angle label such as `L4X3X3/8`.
fn angle_legs(label: &str) -> Option<SectionDims> {
    let key = normalize_designation(label);
    let mut parts = key.trim_start_matches('L').split('X');
    let leg_a = parse_inches(parts.next()?)?;
    let leg_b = parse_inches(parts.next()?)?;
    Some(SectionDims::Angle { leg_a, leg_b })
}

/// Parse an optional f64 from a CSV field
///
/// Returns None for empty strings, dashes, or invalid numbers.
fn parse_optional_f64(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed == "-" || trimmed == "—" {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

// ============================================================================
// Built-in Common Shapes (for use without CSV file)
// ============================================================================

/// Get a catalog with common shapes pre-loaded
///
/// Weights and dimensions from the AISC Manual 16th Ed for the sizes a
/// miscellaneous/structural fabricator quotes most often.
pub fn builtin_common_shapes() -> ShapeCatalog {
    let mut catalog = ShapeCatalog::new();

    // (label, weight plf, d, bf, tw)
    let flanged: [(ShapeFamily, &str, f64, f64, f64, f64); 32] = [
        // W24 / W21 / W18 / W16 (common beams)
        (ShapeFamily::W, "W24X94", 94.0, 24.3, 9.07, 0.515),
        (ShapeFamily::W, "W24X76", 76.0, 23.9, 8.99, 0.44),
        (ShapeFamily::W, "W24X55", 55.0, 23.6, 7.01, 0.395),
        (ShapeFamily::W, "W21X62", 62.0, 21.0, 8.24, 0.4),
        (ShapeFamily::W, "W21X44", 44.0, 20.7, 6.5, 0.35),
        (ShapeFamily::W, "W18X71", 71.0, 18.5, 7.64, 0.495),
        (ShapeFamily::W, "W18X50", 50.0, 18.0, 7.5, 0.355),
        (ShapeFamily::W, "W18X35", 35.0, 17.7, 6.0, 0.3),
        (ShapeFamily::W, "W16X50", 50.0, 16.3, 7.07, 0.38),
        (ShapeFamily::W, "W16X36", 36.0, 15.9, 6.99, 0.295),
        (ShapeFamily::W, "W16X26", 26.0, 15.7, 5.5, 0.25),
        // W14 / W12 / W10 / W8 / W6 (columns and light framing)
        (ShapeFamily::W, "W14X132", 132.0, 14.7, 14.7, 0.645),
        (ShapeFamily::W, "W14X90", 90.0, 14.0, 14.5, 0.44),
        (ShapeFamily::W, "W14X48", 48.0, 13.8, 8.03, 0.34),
        (ShapeFamily::W, "W14X30", 30.0, 13.8, 6.73, 0.27),
        (ShapeFamily::W, "W14X22", 22.0, 13.7, 5.0, 0.23),
        (ShapeFamily::W, "W12X96", 96.0, 12.7, 12.2, 0.55),
        (ShapeFamily::W, "W12X58", 58.0, 12.2, 10.0, 0.36),
        (ShapeFamily::W, "W12X40", 40.0, 11.9, 8.01, 0.295),
        (ShapeFamily::W, "W12X26", 26.0, 12.2, 6.49, 0.23),
        (ShapeFamily::W, "W12X19", 19.0, 12.2, 4.01, 0.235),
        (ShapeFamily::W, "W10X49", 49.0, 10.0, 10.0, 0.34),
        (ShapeFamily::W, "W10X33", 33.0, 9.73, 7.96, 0.29),
        (ShapeFamily::W, "W10X22", 22.0, 10.2, 5.75, 0.24),
        (ShapeFamily::W, "W8X31", 31.0, 8.0, 8.0, 0.285),
        (ShapeFamily::W, "W8X24", 24.0, 7.93, 6.5, 0.245),
        (ShapeFamily::W, "W8X18", 18.0, 8.14, 5.25, 0.23),
        (ShapeFamily::W, "W6X15", 15.0, 5.99, 5.99, 0.23),
        (ShapeFamily::W, "W6X9", 9.0, 5.9, 3.94, 0.17),
        // Channels
        (ShapeFamily::C, "C12X20.7", 20.7, 12.0, 2.94, 0.282),
        (ShapeFamily::C, "C10X15.3", 15.3, 10.0, 2.6, 0.24),
        (ShapeFamily::C, "C8X11.5", 11.5, 8.0, 2.26, 0.22),
    ];
    for (family, label, w, d, bf, tw) in flanged {
        catalog.insert(ShapeEntry::from_dims(family, label, w, SectionDims::Flanged { d, bf, tw }));
    }

    // (label, weight plf, leg a, leg b)
    let angles = [
        ("L6X6X3/8", 14.9, 6.0, 6.0),
        ("L4X4X1/4", 6.6, 4.0, 4.0),
        ("L4X3X3/8", 8.5, 4.0, 3.0),
        ("L3X3X1/4", 4.9, 3.0, 3.0),
    ];
    for (label, w, leg_a, leg_b) in angles {
        catalog.insert(ShapeEntry::from_dims(ShapeFamily::L, label, w, SectionDims::Angle { leg_a, leg_b }));
    }

    // (label, weight plf, h, b)
    let boxes = [
        ("HSS8X8X3/8", 37.69, 8.0, 8.0),
        ("HSS6X6X1/4", 19.02, 6.0, 6.0),
        ("HSS6X4X1/4", 15.62, 6.0, 4.0),
        ("HSS4X4X1/4", 12.21, 4.0, 4.0),
    ];
    for (label, w, h, b) in boxes {
        catalog.insert(ShapeEntry::from_dims(ShapeFamily::HssRect, label, w, SectionDims::Box { h, b }));
    }

    // (family, label, weight plf, OD)
    let rounds = [
        (ShapeFamily::HssRound, "HSS6.625X.280", 19.02, 6.625),
        (ShapeFamily::Pipe, "PIPE6STD", 19.0, 6.625),
        (ShapeFamily::Pipe, "PIPE4STD", 10.8, 4.5),
        (ShapeFamily::Pipe, "PIPE3STD", 7.58, 3.5),
    ];
    for (family, label, w, od) in rounds {
        catalog.insert(ShapeEntry::from_dims(family, label, w, SectionDims::Round { od }));
    }

    catalog.version = Some("builtin-common".to_string());
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_parsing() {
        assert_eq!(ShapeFamily::from_aisc_code("W"), Some(ShapeFamily::W));
        assert_eq!(ShapeFamily::from_aisc_code("pipe"), Some(ShapeFamily::Pipe));
        assert_eq!(ShapeFamily::from_aisc_code("UNKNOWN"), None);
    }

    #[test]
    fn test_family_from_designation() {
        assert_eq!(ShapeFamily::from_designation("W14x90"), Some(ShapeFamily::W));
        assert_eq!(ShapeFamily::from_designation("MC8X8.5"), Some(ShapeFamily::MC));
        assert_eq!(ShapeFamily::from_designation("HSS6X6X1/4"), Some(ShapeFamily::HssRect));
        assert_eq!(ShapeFamily::from_designation("HSS6.625X.280"), Some(ShapeFamily::HssRound));
        assert_eq!(ShapeFamily::from_designation("Pipe4STD"), Some(ShapeFamily::Pipe));
        assert_eq!(ShapeFamily::from_designation("Z12"), None);
    }

    #[test]
    fn test_builtin_shapes() {
        let catalog = builtin_common_shapes();
        assert!(catalog.len() > 40);

        let w14x90 = catalog.get("W14X90").unwrap();
        assert_eq!(w14x90.weight_per_ft, 90.0);
        // (2*14.0 + 4*14.5 - 2*0.44) / 12
        assert!((w14x90.surface_area_per_ft - 7.0933).abs() < 1e-3);

        // Case- and whitespace-insensitive lookup
        let loose = catalog.get(" w14x90 ").unwrap();
        assert_eq!(loose.designation, "W14X90");
    }

    #[test]
    fn test_surface_area_formulas() {
        let angle = SectionDims::Angle { leg_a: 4.0, leg_b: 4.0 };
        assert!((angle.surface_area_per_ft() - 16.0 / 12.0).abs() < 1e-12);

        let hss = SectionDims::Box { h: 6.0, b: 4.0 };
        assert!((hss.surface_area_per_ft() - 20.0 / 12.0).abs() < 1e-12);

        let pipe = SectionDims::Round { od: 12.0 };
        assert!((pipe.surface_area_per_ft() - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_family_listing_and_search() {
        let catalog = builtin_common_shapes();

        let angles = catalog.shapes_of_family(ShapeFamily::L);
        assert_eq!(angles.len(), 4);
        assert!(angles.iter().all(|s| s.family == ShapeFamily::L));

        let w14 = catalog.search("w14");
        assert_eq!(w14.len(), 5);
        assert!(w14.iter().all(|s| s.designation.starts_with("W14")));
    }

    #[test]
    fn test_hss_code_lists_rect_and_round() {
        let catalog = builtin_common_shapes();

        let hss = catalog.shapes_of_code("hss");
        assert_eq!(hss.len(), 5);
        assert!(hss.iter().any(|s| s.designation == "HSS6X6X1/4"));
        assert!(hss.iter().any(|s| s.designation == "HSS6.625X.280"));

        assert_eq!(catalog.shapes_of_code("PIPE").len(), 3);
        assert!(catalog.shapes_of_code("Z").is_empty());
    }

    #[test]
    fn test_load_csv() {
        let csv = "\
Type,AISC_Manual_Label,W,d,bf,tw,Ht,B,OD,SA
W,W30X99,99,29.7,10.5,0.52,,,,
HSS,HSS10X10X1/2,62.46,,,,10,10,,
HSS,HSS8.625X.322,28.58,,,,,,8.625,
L,L5X3X1/2,12.8,,,,,,,
C,C15X33.9,33.9,15,3.4,0.4,,,,4.1
Z,Z-BAR,5,,,,,,,
";
        let mut catalog = ShapeCatalog::new();
        let loaded = catalog.load_csv(csv.as_bytes()).unwrap();
        assert_eq!(loaded, 5);

        let w30 = catalog.get("W30X99").unwrap();
        assert!((w30.surface_area_per_ft - (2.0 * 29.7 + 42.0 - 1.04) / 12.0).abs() < 1e-9);

        let round = catalog.get("HSS8.625X.322").unwrap();
        assert_eq!(round.family, ShapeFamily::HssRound);

        let angle = catalog.get("L5X3X1/2").unwrap();
        assert!((angle.surface_area_per_ft - 16.0 / 12.0).abs() < 1e-9);

        // Explicit SA column wins over the dimension formula
        assert_eq!(catalog.get("C15X33.9").unwrap().surface_area_per_ft, 4.1);
    }

    #[test]
    fn test_load_csv_missing_columns() {
        let mut catalog = ShapeCatalog::new();
        let result = catalog.load_csv("Label,W\nW8X10,10\n".as_bytes());
        assert!(matches!(result, Err(EstimateError::Import { row: 0, .. })));
    }

    #[test]
    fn test_parse_optional_f64() {
        assert_eq!(parse_optional_f64("123.45"), Some(123.45));
        assert_eq!(parse_optional_f64("  456  "), Some(456.0));
        assert_eq!(parse_optional_f64(""), None);
        assert_eq!(parse_optional_f64("-"), None);
        assert_eq!(parse_optional_f64("—"), None);
        assert_eq!(parse_optional_f64("not a number"), None);
    }
}

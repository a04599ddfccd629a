//! Nutrient name tables, unit conversion and the special-cased nutrients
//! (alcohol, energy, and the niacin/folate synonym pairs).

pub const ETHANOL_DENSITY_G_PER_ML: f64 = 0.789;
pub const KJ_TO_KCAL: f64 = 0.23900574;

const IU_VITAMIN_A: f64 = 3e-7;
const IU_VITAMIN_D: f64 = 2.5e-8;
const IU_VITAMIN_E: f64 = 6.7e-7;

/// The "regular" nutrients iterated directly by the validator — every
/// canonical nutrient field except alcohol, energy, and the two
/// sum-if-both synonym pairs (vitamin_b3/vitamin_pp, vitamin_b9/folates),
/// which get their own aggregation rules.
pub const REGULAR_NUTRIENTS: &[&str] = &[
    "bicarbonate",
    "caffeine",
    "calcium",
    "carbohydrates",
    "chloride",
    "cholesterol",
    "chromium",
    "copper",
    "fat",
    "fiber",
    "fluoride",
    "iodine",
    "iron",
    "lactose",
    "magnesium",
    "manganese",
    "molybdenum",
    "monounsaturated_fat",
    "omega_3_fat",
    "omega_6_fat",
    "phosphorus",
    "polyunsaturated_fat",
    "potassium",
    "proteins",
    "salt",
    "saturated_fat",
    "selenium",
    "sodium",
    "starch",
    "sugars",
    "taurine",
    "trans_fat",
    "vitamin_a",
    "vitamin_b1",
    "vitamin_b2",
    "vitamin_b5",
    "vitamin_b6",
    "vitamin_b7",
    "vitamin_b12",
    "vitamin_c",
    "vitamin_d",
    "vitamin_e",
    "vitamin_k",
    "vitamin_k1",
    "zinc",
];

/// Maps a canonical (underscored) nutrient name to the raw, hyphenated key
/// OpenFoodFacts uses in its nutriments map. Enumerated explicitly rather
/// than derived, since a handful of names (pantothenic acid, biotin,
/// phylloquinone) don't follow the mechanical underscore-to-hyphen rule.
pub fn raw_key(canonical: &str) -> &str {
    match canonical {
        "energy_kcal" => "energy-kcal",
        "energy_kj" => "energy-kj",
        "vitamin_b3" => "vitamin-b3",
        "vitamin_pp" => "vitamin-pp",
        "vitamin_b9" => "vitamin-b9",
        "folates" => "folates",
        "monounsaturated_fat" => "monounsaturated-fat",
        "polyunsaturated_fat" => "polyunsaturated-fat",
        "omega_3_fat" => "omega-3-fat",
        "omega_6_fat" => "omega-6-fat",
        "trans_fat" => "trans-fat",
        "saturated_fat" => "saturated-fat",
        "vitamin_a" => "vitamin-a",
        "vitamin_b1" => "vitamin-b1",
        "vitamin_b2" => "vitamin-b2",
        "vitamin_b5" => "pantothenic-acid",
        "vitamin_b6" => "vitamin-b6",
        "vitamin_b7" => "biotin",
        "vitamin_b12" => "vitamin-b12",
        "vitamin_c" => "vitamin-c",
        "vitamin_d" => "vitamin-d",
        "vitamin_e" => "vitamin-e",
        "vitamin_k" => "vitamin-k",
        "vitamin_k1" => "phylloquinone",
        other => other,
    }
}

/// A nutrient's three sibling keys as read from a parsed record: base
/// value, declared unit, and the upstream-normalized per-100g value.
#[derive(Debug, Clone, Default)]
pub struct NutrientTriple {
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub value_100g: Option<f64>,
}

/// Converts one nutrient triple to grams per 100g of product.
///
/// `name` selects the IU conversion constant for vitamin A/D/E; any other
/// nutrient given in IU converts to `None`.
pub fn convert_nutrient(value: Option<f64>, unit: Option<&str>, value_100g: Option<f64>, factor: f64, name: &str) -> Option<f64> {
    if let Some(v100) = value_100g {
        if v100 != 0.0 {
            return Some(v100);
        }
    }

    let (value, unit) = match (value, unit) {
        (Some(v), Some(u)) => (v, u),
        _ => return None,
    };

    if value == 0.0 {
        return None;
    }

    match unit {
        "\u{b5}g" | "\u{3bc}g" | "&#181;g" => Some(factor * value / 1_000_000.0),
        "mg" | "mcg" => Some(factor * value / 1_000.0),
        "g" | "g/100mL" | "g/100g" | "" => Some(factor * value),
        "IU" => match name {
            "vitamin_a" => Some(factor * value * IU_VITAMIN_A),
            "vitamin_d" => Some(factor * value * IU_VITAMIN_D),
            "vitamin_e" => Some(factor * value * IU_VITAMIN_E),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_100g_short_circuits() {
        assert_eq!(convert_nutrient(None, None, Some(12.5), 99.0, "fat"), Some(12.5));
    }

    #[test]
    fn zero_value_is_null() {
        assert_eq!(convert_nutrient(Some(0.0), Some("g"), None, 1.0, "fat"), None);
    }

    #[test]
    fn micrograms_scale_by_one_million() {
        assert_eq!(convert_nutrient(Some(500.0), Some("\u{b5}g"), None, 1.0, "iron"), Some(0.0005));
    }

    #[test]
    fn milligrams_scale_by_one_thousand() {
        assert_eq!(convert_nutrient(Some(1.0), Some("mg"), None, 1.0, "calcium"), Some(0.001));
    }

    #[test]
    fn iu_only_applies_to_named_vitamins() {
        assert!(convert_nutrient(Some(1.0), Some("IU"), None, 1.0, "vitamin_a").is_some());
        assert_eq!(convert_nutrient(Some(1.0), Some("IU"), None, 1.0, "iron"), None);
    }

    #[test]
    fn unknown_unit_is_null() {
        assert_eq!(convert_nutrient(Some(1.0), Some("lbs"), None, 1.0, "fat"), None);
    }

    proptest::proptest! {
        /// A non-zero `value_100g` always wins outright, regardless of the
        /// raw value/unit/factor it's paired with.
        #[test]
        fn value_100g_always_short_circuits(
            v100 in 0.001f64..10_000.0,
            value in -1000.0f64..1000.0,
            factor in 0.01f64..100.0,
        ) {
            let result = convert_nutrient(Some(value), Some("g"), Some(v100), factor, "fat");
            proptest::prop_assert_eq!(result, Some(v100));
        }

        /// Microgram and milligram scaling is linear in both the raw value
        /// and the per-serving factor.
        #[test]
        fn gram_scaling_is_linear(value in 0.001f64..10_000.0, factor in 0.01f64..100.0) {
            let micro = convert_nutrient(Some(value), Some("\u{b5}g"), None, factor, "iron").unwrap();
            let milli = convert_nutrient(Some(value), Some("mg"), None, factor, "iron").unwrap();
            proptest::prop_assert!((micro - factor * value / 1_000_000.0).abs() < 1e-12);
            proptest::prop_assert!((milli - factor * value / 1_000.0).abs() < 1e-12);
        }

        /// IU conversion only ever produces a value for the three named
        /// vitamins; every other nutrient name converts to null.
        #[test]
        fn iu_is_null_outside_named_vitamins(value in 0.001f64..10_000.0, name_idx in 0usize..REGULAR_NUTRIENTS.len()) {
            let name = REGULAR_NUTRIENTS[name_idx];
            let result = convert_nutrient(Some(value), Some("IU"), None, 1.0, name);
            if matches!(name, "vitamin_a" | "vitamin_d" | "vitamin_e") {
                proptest::prop_assert!(result.is_some());
            } else {
                proptest::prop_assert_eq!(result, None);
            }
        }
    }
}

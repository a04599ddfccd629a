//! The canonical, persisted product entry.

use chrono::NaiveDate;

/// Measurement unit for `quantity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    G,
    Ml,
}

/// A validated, normalized OpenFoodFacts catalog entry, keyed by barcode.
#[derive(Debug, Clone, Default)]
pub struct ProductEntry {
    pub code: String,
    pub created: Option<NaiveDate>,
    pub last_updated: Option<NaiveDate>,
    pub name: String,
    pub localized_names: Option<String>,
    pub brands: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<Unit>,
    pub serving_quantity: Option<f64>,

    pub alcohol: Option<f64>,
    pub bicarbonate: Option<f64>,
    pub caffeine: Option<f64>,
    pub calcium: Option<f64>,
    pub carbohydrates: Option<f64>,
    pub chloride: Option<f64>,
    pub cholesterol: Option<f64>,
    pub chromium: Option<f64>,
    pub copper: Option<f64>,
    pub energy: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub fluoride: Option<f64>,
    pub iodine: Option<f64>,
    pub iron: Option<f64>,
    pub lactose: Option<f64>,
    pub magnesium: Option<f64>,
    pub manganese: Option<f64>,
    pub molybdenum: Option<f64>,
    pub monounsaturated_fat: Option<f64>,
    pub omega_3_fat: Option<f64>,
    pub omega_6_fat: Option<f64>,
    pub phosphorus: Option<f64>,
    pub polyunsaturated_fat: Option<f64>,
    pub potassium: Option<f64>,
    pub proteins: Option<f64>,
    pub salt: Option<f64>,
    pub saturated_fat: Option<f64>,
    pub selenium: Option<f64>,
    pub sodium: Option<f64>,
    pub starch: Option<f64>,
    pub sugars: Option<f64>,
    pub taurine: Option<f64>,
    pub trans_fat: Option<f64>,
    pub vitamin_a: Option<f64>,
    pub vitamin_b1: Option<f64>,
    pub vitamin_b2: Option<f64>,
    pub vitamin_b3: Option<f64>,
    pub vitamin_b5: Option<f64>,
    pub vitamin_b6: Option<f64>,
    pub vitamin_b7: Option<f64>,
    pub vitamin_b9: Option<f64>,
    pub vitamin_b12: Option<f64>,
    pub vitamin_c: Option<f64>,
    pub vitamin_d: Option<f64>,
    pub vitamin_e: Option<f64>,
    pub vitamin_k: Option<f64>,
    pub vitamin_k1: Option<f64>,
    pub zinc: Option<f64>,
}

impl ProductEntry {
    /// `true` if every nutrient field (including energy and the two
    /// aggregated synonyms) is null — the all-zero rejection gate operates
    /// on this.
    pub fn all_nutrients_null(&self) -> bool {
        self.alcohol.is_none()
            && self.energy.is_none()
            && self.bicarbonate.is_none()
            && self.caffeine.is_none()
            && self.calcium.is_none()
            && self.carbohydrates.is_none()
            && self.chloride.is_none()
            && self.cholesterol.is_none()
            && self.chromium.is_none()
            && self.copper.is_none()
            && self.fat.is_none()
            && self.fiber.is_none()
            && self.fluoride.is_none()
            && self.iodine.is_none()
            && self.iron.is_none()
            && self.lactose.is_none()
            && self.magnesium.is_none()
            && self.manganese.is_none()
            && self.molybdenum.is_none()
            && self.monounsaturated_fat.is_none()
            && self.omega_3_fat.is_none()
            && self.omega_6_fat.is_none()
            && self.phosphorus.is_none()
            && self.polyunsaturated_fat.is_none()
            && self.potassium.is_none()
            && self.proteins.is_none()
            && self.salt.is_none()
            && self.saturated_fat.is_none()
            && self.selenium.is_none()
            && self.sodium.is_none()
            && self.starch.is_none()
            && self.sugars.is_none()
            && self.taurine.is_none()
            && self.trans_fat.is_none()
            && self.vitamin_a.is_none()
            && self.vitamin_b1.is_none()
            && self.vitamin_b2.is_none()
            && self.vitamin_b3.is_none()
            && self.vitamin_b5.is_none()
            && self.vitamin_b6.is_none()
            && self.vitamin_b7.is_none()
            && self.vitamin_b9.is_none()
            && self.vitamin_b12.is_none()
            && self.vitamin_c.is_none()
            && self.vitamin_d.is_none()
            && self.vitamin_e.is_none()
            && self.vitamin_k.is_none()
            && self.vitamin_k1.is_none()
            && self.zinc.is_none()
    }
}

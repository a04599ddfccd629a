//! Validator/Normalizer: `RawRecord` → `ProductEntry` or `InvalidDataError`.

use std::collections::HashMap;

use chrono::DateTime;
use serde_json::Value;

use crate::barcode::{valid_ean13, valid_ean8};
use crate::entry::{ProductEntry, Unit};
use crate::errors::InvalidDataError;
use crate::nutrients::{convert_nutrient, raw_key, ETHANOL_DENSITY_G_PER_ML, KJ_TO_KCAL, REGULAR_NUTRIENTS};
use crate::record::{RawRecord, LANGUAGES};

fn reject(reason: impl Into<String>) -> InvalidDataError {
    InvalidDataError::new(reason.into())
}

/// Runs every pre-filter gate, barcode check, quantity/serving resolution,
/// nutrient normalization and the final all-zero gate, in the order the
/// original implementation applies them (first failure wins).
pub fn convert_entry(record: &RawRecord) -> Result<ProductEntry, InvalidDataError> {
    if RawRecord::flag_is_set(&record.no_nutrition_data) {
        return Err(reject("no nutrition data"));
    }

    let id = record.id.as_deref().ok_or_else(|| reject("no identifier"))?;
    let id_value: i64 = id.parse().map_err(|_| reject(format!("invalid identifier ({id})")))?;
    if id_value == 0 {
        return Err(reject(format!("invalid identifier ({id})")));
    }

    let created_t = record.created_t.ok_or_else(|| reject("no creation date"))?;

    let name = record
        .product_name
        .clone()
        .ok_or_else(|| reject("no product name"))?;

    let codes_tags = record
        .codes_tags
        .as_ref()
        .filter(|tags| !tags.is_empty())
        .ok_or_else(|| reject("no codes tags"))?;

    if RawRecord::flag_is_set(&record.obsolete) {
        return Err(reject("obsolete entry"));
    }

    let raw_code = record.code.clone().unwrap_or_default();
    let code = if codes_tags.iter().any(|t| t == "code-8") {
        let padded = format!("{raw_code:0>8}");
        if !valid_ean8(&padded) {
            return Err(reject("invalid EAN-8 code"));
        }
        padded
    } else if codes_tags.iter().any(|t| t == "code-13") {
        let padded = format!("{raw_code:0>13}");
        if !valid_ean13(&padded) {
            return Err(reject("invalid EAN-13 code"));
        }
        padded
    } else {
        return Err(reject("no supported code tag found"));
    };

    let nutriments = record
        .nutrient_source()
        .ok_or_else(|| reject("no nutriments present"))?;

    let quantity = record.product_quantity.filter(|q| *q != 0.0);
    let unit = match record.product_quantity_unit.as_deref() {
        None | Some("g") => Unit::G,
        Some("ml") => Unit::Ml,
        _ => Unit::G,
    };

    let serving_quantity = resolve_serving_quantity(record, quantity)?;

    let factor = if record.nutrition_data_per.as_deref() == Some("serving") {
        let sq = serving_quantity.ok_or_else(|| reject("nutrition data per serving, but no serving quantity"))?;
        100.0 / sq
    } else {
        1.0
    };

    let mut entry = ProductEntry {
        code,
        name: name.clone(),
        quantity,
        unit: Some(unit),
        serving_quantity,
        ..Default::default()
    };

    entry.alcohol = zero_to_null(convert_alcohol(nutriments, factor)?);
    entry.energy = zero_to_null(convert_energy(nutriments, factor));
    entry.vitamin_b3 = zero_to_null(convert_summed_synonyms(nutriments, "vitamin_b3", "vitamin_pp", factor));
    entry.vitamin_b9 = zero_to_null(convert_summed_synonyms(nutriments, "vitamin_b9", "folates", factor));

    for &nutrient in REGULAR_NUTRIENTS {
        let value = convert_named(nutriments, nutrient, factor);
        assign_regular(&mut entry, nutrient, value);
    }

    entry.created = DateTime::from_timestamp(created_t, 0).map(|dt| dt.date_naive());
    entry.last_updated = record
        .last_updated_t
        .and_then(|t| DateTime::from_timestamp(t, 0))
        .map(|dt| dt.date_naive())
        .or(entry.created);

    entry.localized_names = build_localized_names(record, &name);
    entry.brands = record.brands.as_deref().map(normalize_brands);

    if entry.all_nutrients_null() {
        return Err(reject("all nutrition data is zero"));
    }

    Ok(entry)
}

/// Collapses a computed `Some(0.0)` to `None`, matching the zero-as-null
/// convention applied to every other nutrient so the final all-null gate
/// sees it consistently.
fn zero_to_null(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

fn resolve_serving_quantity(record: &RawRecord, quantity: Option<f64>) -> Result<Option<f64>, InvalidDataError> {
    let Some(serving_quantity) = record.serving_quantity.filter(|q| *q != 0.0) else {
        return Ok(None);
    };
    match record.serving_quantity_unit.as_deref() {
        None | Some("g") => Ok(Some(serving_quantity)),
        Some("%") => {
            let q = quantity.ok_or_else(|| reject("serving_quantity in percent, but no product_quantity"))?;
            Ok(Some(serving_quantity / 100.0 * q))
        }
        Some(other) => Err(reject(format!("unsupported serving quantity unit: {other}"))),
    }
}

fn convert_named(map: &HashMap<String, Value>, canonical: &str, factor: f64) -> Option<f64> {
    let triple = RawRecord::nutrient_triple(map, raw_key(canonical));
    convert_nutrient(triple.value, triple.unit.as_deref(), triple.value_100g, factor, canonical)
}

fn convert_summed_synonyms(map: &HashMap<String, Value>, a: &str, b: &str, factor: f64) -> Option<f64> {
    let va = convert_named(map, a, factor);
    let vb = convert_named(map, b, factor);
    match (va, vb) {
        (Some(x), Some(y)) => Some(x + y),
        (Some(x), None) => Some(x),
        (None, Some(y)) => Some(y),
        (None, None) => None,
    }
}

fn convert_alcohol(map: &HashMap<String, Value>, factor: f64) -> Result<Option<f64>, InvalidDataError> {
    let value = map.get("alcohol").and_then(Value::as_f64);
    let Some(value) = value else {
        return Ok(None);
    };
    let unit = map.get("alcohol_unit").and_then(Value::as_str);
    let Some(unit) = unit else {
        return Err(reject("alcohol has no unit"));
    };
    let grams = if matches!(unit, "% vol" | "% vol / *" | "vol" | "%") {
        value * ETHANOL_DENSITY_G_PER_ML
    } else if unit == "g" {
        value
    } else {
        return Err(reject(format!("invalid alcohol unit: {unit}")));
    };
    Ok(Some(grams * factor))
}

fn convert_energy(map: &HashMap<String, Value>, factor: f64) -> Option<f64> {
    if let Some(kcal) = map.get("energy-kcal").and_then(Value::as_f64) {
        return Some(kcal * factor);
    }
    map.get("energy-kj")
        .and_then(Value::as_f64)
        .map(|kj| kj * factor * KJ_TO_KCAL)
}

fn build_localized_names(record: &RawRecord, canonical_name: &str) -> Option<String> {
    let parts: Vec<String> = LANGUAGES
        .iter()
        .filter_map(|lang| {
            let value = record.localized_name(lang)?;
            if value == canonical_name {
                None
            } else {
                Some(format!("{lang}:{value}"))
            }
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(","))
    }
}

fn normalize_brands(brands: &str) -> String {
    brands.split(',').map(str::trim).collect::<Vec<_>>().join(",")
}

fn assign_regular(entry: &mut ProductEntry, name: &str, value: Option<f64>) {
    match name {
        "bicarbonate" => entry.bicarbonate = value,
        "caffeine" => entry.caffeine = value,
        "calcium" => entry.calcium = value,
        "carbohydrates" => entry.carbohydrates = value,
        "chloride" => entry.chloride = value,
        "cholesterol" => entry.cholesterol = value,
        "chromium" => entry.chromium = value,
        "copper" => entry.copper = value,
        "fat" => entry.fat = value,
        "fiber" => entry.fiber = value,
        "fluoride" => entry.fluoride = value,
        "iodine" => entry.iodine = value,
        "iron" => entry.iron = value,
        "lactose" => entry.lactose = value,
        "magnesium" => entry.magnesium = value,
        "manganese" => entry.manganese = value,
        "molybdenum" => entry.molybdenum = value,
        "monounsaturated_fat" => entry.monounsaturated_fat = value,
        "omega_3_fat" => entry.omega_3_fat = value,
        "omega_6_fat" => entry.omega_6_fat = value,
        "phosphorus" => entry.phosphorus = value,
        "polyunsaturated_fat" => entry.polyunsaturated_fat = value,
        "potassium" => entry.potassium = value,
        "proteins" => entry.proteins = value,
        "salt" => entry.salt = value,
        "saturated_fat" => entry.saturated_fat = value,
        "selenium" => entry.selenium = value,
        "sodium" => entry.sodium = value,
        "starch" => entry.starch = value,
        "sugars" => entry.sugars = value,
        "taurine" => entry.taurine = value,
        "trans_fat" => entry.trans_fat = value,
        "vitamin_a" => entry.vitamin_a = value,
        "vitamin_b1" => entry.vitamin_b1 = value,
        "vitamin_b2" => entry.vitamin_b2 = value,
        "vitamin_b5" => entry.vitamin_b5 = value,
        "vitamin_b6" => entry.vitamin_b6 = value,
        "vitamin_b7" => entry.vitamin_b7 = value,
        "vitamin_b12" => entry.vitamin_b12 = value,
        "vitamin_c" => entry.vitamin_c = value,
        "vitamin_d" => entry.vitamin_d = value,
        "vitamin_e" => entry.vitamin_e = value,
        "vitamin_k" => entry.vitamin_k = value,
        "vitamin_k1" => entry.vitamin_k1 = value,
        "zinc" => entry.zinc = value,
        _ => unreachable!("unlisted regular nutrient {name}"),
    }
}

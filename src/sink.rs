//! `EntrySink`: the abstract persistence collaborator, plus a concrete
//! PostgreSQL implementation.

use async_trait::async_trait;
use sqlx::{PgPool, QueryBuilder};

use crate::entry::{ProductEntry, Unit};
use crate::errors::SinkError;

/// Accepts batches of entries and commits them atomically. Duplicate
/// `code`s within or across batches overwrite (upsert semantics).
#[async_trait]
pub trait EntrySink: Send {
    async fn put_all(&mut self, batch: &[ProductEntry]) -> Result<(), SinkError>;
    async fn commit(&mut self) -> Result<(), SinkError>;
    async fn rollback(&mut self) -> Result<(), SinkError>;
}

/// Transaction-scoped Postgres sink: every `put_all` batch is staged inside
/// one open transaction (started lazily on first use), `commit` ends it.
pub struct PostgresEntrySink {
    pool: PgPool,
    tx: Option<sqlx::Transaction<'static, sqlx::Postgres>>,
}

impl PostgresEntrySink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, tx: None }
    }

    async fn transaction(&mut self) -> Result<&mut sqlx::Transaction<'static, sqlx::Postgres>, SinkError> {
        if self.tx.is_none() {
            self.tx = Some(self.pool.begin().await?);
        }
        Ok(self.tx.as_mut().expect("just populated"))
    }
}

fn unit_str(unit: Option<Unit>) -> &'static str {
    match unit {
        Some(Unit::Ml) => "ML",
        _ => "G",
    }
}

#[async_trait]
impl EntrySink for PostgresEntrySink {
    async fn put_all(&mut self, batch: &[ProductEntry]) -> Result<(), SinkError> {
        if batch.is_empty() {
            return Ok(());
        }
        let tx = self.transaction().await?;

        for entry in batch {
            let mut builder = QueryBuilder::new(
                "INSERT INTO product_entries (\
                code, created, last_updated, name, localized_names, brands, quantity, unit, serving_quantity, \
                alcohol, bicarbonate, caffeine, calcium, carbohydrates, chloride, cholesterol, chromium, copper, \
                energy, fat, fiber, fluoride, iodine, iron, lactose, magnesium, manganese, molybdenum, \
                monounsaturated_fat, omega_3_fat, omega_6_fat, phosphorus, polyunsaturated_fat, potassium, \
                proteins, salt, saturated_fat, selenium, sodium, starch, sugars, taurine, trans_fat, \
                vitamin_a, vitamin_b1, vitamin_b2, vitamin_b3, vitamin_b5, vitamin_b6, vitamin_b7, vitamin_b9, \
                vitamin_b12, vitamin_c, vitamin_d, vitamin_e, vitamin_k, vitamin_k1, zinc\
                ) VALUES (",
            );
            let mut separated = builder.separated(", ");
            separated.push_bind(&entry.code);
            separated.push_bind(entry.created);
            separated.push_bind(entry.last_updated);
            separated.push_bind(&entry.name);
            separated.push_bind(&entry.localized_names);
            separated.push_bind(&entry.brands);
            separated.push_bind(entry.quantity);
            separated.push_bind(unit_str(entry.unit));
            separated.push_bind(entry.serving_quantity);
            separated.push_bind(entry.alcohol);
            separated.push_bind(entry.bicarbonate);
            separated.push_bind(entry.caffeine);
            separated.push_bind(entry.calcium);
            separated.push_bind(entry.carbohydrates);
            separated.push_bind(entry.chloride);
            separated.push_bind(entry.cholesterol);
            separated.push_bind(entry.chromium);
            separated.push_bind(entry.copper);
            separated.push_bind(entry.energy);
            separated.push_bind(entry.fat);
            separated.push_bind(entry.fiber);
            separated.push_bind(entry.fluoride);
            separated.push_bind(entry.iodine);
            separated.push_bind(entry.iron);
            separated.push_bind(entry.lactose);
            separated.push_bind(entry.magnesium);
            separated.push_bind(entry.manganese);
            separated.push_bind(entry.molybdenum);
            separated.push_bind(entry.monounsaturated_fat);
            separated.push_bind(entry.omega_3_fat);
            separated.push_bind(entry.omega_6_fat);
            separated.push_bind(entry.phosphorus);
            separated.push_bind(entry.polyunsaturated_fat);
            separated.push_bind(entry.potassium);
            separated.push_bind(entry.proteins);
            separated.push_bind(entry.salt);
            separated.push_bind(entry.saturated_fat);
            separated.push_bind(entry.selenium);
            separated.push_bind(entry.sodium);
            separated.push_bind(entry.starch);
            separated.push_bind(entry.sugars);
            separated.push_bind(entry.taurine);
            separated.push_bind(entry.trans_fat);
            separated.push_bind(entry.vitamin_a);
            separated.push_bind(entry.vitamin_b1);
            separated.push_bind(entry.vitamin_b2);
            separated.push_bind(entry.vitamin_b3);
            separated.push_bind(entry.vitamin_b5);
            separated.push_bind(entry.vitamin_b6);
            separated.push_bind(entry.vitamin_b7);
            separated.push_bind(entry.vitamin_b9);
            separated.push_bind(entry.vitamin_b12);
            separated.push_bind(entry.vitamin_c);
            separated.push_bind(entry.vitamin_d);
            separated.push_bind(entry.vitamin_e);
            separated.push_bind(entry.vitamin_k);
            separated.push_bind(entry.vitamin_k1);
            separated.push_bind(entry.zinc);
            builder.push(
                ") ON CONFLICT (code) DO UPDATE SET \
                created = EXCLUDED.created, last_updated = EXCLUDED.last_updated, name = EXCLUDED.name, \
                localized_names = EXCLUDED.localized_names, brands = EXCLUDED.brands, quantity = EXCLUDED.quantity, \
                unit = EXCLUDED.unit, serving_quantity = EXCLUDED.serving_quantity, alcohol = EXCLUDED.alcohol, \
                bicarbonate = EXCLUDED.bicarbonate, caffeine = EXCLUDED.caffeine, calcium = EXCLUDED.calcium, \
                carbohydrates = EXCLUDED.carbohydrates, chloride = EXCLUDED.chloride, cholesterol = EXCLUDED.cholesterol, \
                chromium = EXCLUDED.chromium, copper = EXCLUDED.copper, energy = EXCLUDED.energy, fat = EXCLUDED.fat, \
                fiber = EXCLUDED.fiber, fluoride = EXCLUDED.fluoride, iodine = EXCLUDED.iodine, iron = EXCLUDED.iron, \
                lactose = EXCLUDED.lactose, magnesium = EXCLUDED.magnesium, manganese = EXCLUDED.manganese, \
                molybdenum = EXCLUDED.molybdenum, monounsaturated_fat = EXCLUDED.monounsaturated_fat, \
                omega_3_fat = EXCLUDED.omega_3_fat, omega_6_fat = EXCLUDED.omega_6_fat, phosphorus = EXCLUDED.phosphorus, \
                polyunsaturated_fat = EXCLUDED.polyunsaturated_fat, potassium = EXCLUDED.potassium, \
                proteins = EXCLUDED.proteins, salt = EXCLUDED.salt, saturated_fat = EXCLUDED.saturated_fat, \
                selenium = EXCLUDED.selenium, sodium = EXCLUDED.sodium, starch = EXCLUDED.starch, \
                sugars = EXCLUDED.sugars, taurine = EXCLUDED.taurine, trans_fat = EXCLUDED.trans_fat, \
                vitamin_a = EXCLUDED.vitamin_a, vitamin_b1 = EXCLUDED.vitamin_b1, vitamin_b2 = EXCLUDED.vitamin_b2, \
                vitamin_b3 = EXCLUDED.vitamin_b3, vitamin_b5 = EXCLUDED.vitamin_b5, vitamin_b6 = EXCLUDED.vitamin_b6, \
                vitamin_b7 = EXCLUDED.vitamin_b7, vitamin_b9 = EXCLUDED.vitamin_b9, vitamin_b12 = EXCLUDED.vitamin_b12, \
                vitamin_c = EXCLUDED.vitamin_c, vitamin_d = EXCLUDED.vitamin_d, vitamin_e = EXCLUDED.vitamin_e, \
                vitamin_k = EXCLUDED.vitamin_k, vitamin_k1 = EXCLUDED.vitamin_k1, zinc = EXCLUDED.zinc",
            );

            builder
                .build()
                .execute(&mut **tx)
                .await
                .map_err(SinkError::Connection)?;
        }

        Ok(())
    }

    async fn commit(&mut self) -> Result<(), SinkError> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await.map_err(|e| SinkError::Commit(e.to_string()))?;
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), SinkError> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await.map_err(|e| SinkError::Commit(e.to_string()))?;
        }
        Ok(())
    }
}

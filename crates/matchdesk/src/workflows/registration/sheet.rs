use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::domain::{NewRegistration, PaymentStatus, Registration, RegistrationId, SlotKind};
use super::ledger::{LedgerError, RegistrationLedger};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Durable row-oriented ledger backed by a CSV file. New registrations are
/// appended; payment updates rewrite the file in place. Rows are cached in
/// memory, so reads never touch disk after startup.
pub struct CsvLedger {
    path: PathBuf,
    rows: Mutex<Vec<Registration>>,
}

impl CsvLedger {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let rows = if path.exists() {
            read_rows(&path)?
        } else {
            Vec::new()
        };

        Ok(Self {
            path,
            rows: Mutex::new(rows),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn rewrite(&self, rows: &[Registration]) -> Result<(), LedgerError> {
        let mut writer = csv::Writer::from_path(&self.path)
            .map_err(|err| LedgerError::Unavailable(err.to_string()))?;
        for row in rows {
            writer
                .serialize(SheetRow::from(row))
                .map_err(|err| LedgerError::Unavailable(err.to_string()))?;
        }
        writer
            .flush()
            .map_err(|err| LedgerError::Unavailable(err.to_string()))
    }
}

impl RegistrationLedger for CsvLedger {
    fn append(&self, registration: NewRegistration) -> Result<Registration, LedgerError> {
        let mut rows = self.rows.lock().expect("ledger mutex poisoned");
        let registration = registration.into_registration(RegistrationId(rows.len() as u64 + 1));

        let fresh_file = std::fs::metadata(&self.path)
            .map(|meta| meta.len() == 0)
            .unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| LedgerError::Unavailable(err.to_string()))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(fresh_file)
            .from_writer(file);
        writer
            .serialize(SheetRow::from(&registration))
            .map_err(|err| LedgerError::Unavailable(err.to_string()))?;
        writer
            .flush()
            .map_err(|err| LedgerError::Unavailable(err.to_string()))?;

        rows.push(registration.clone());
        Ok(registration)
    }

    fn count_main(&self, category: &str) -> Result<u32, LedgerError> {
        let rows = self.rows.lock().expect("ledger mutex poisoned");
        Ok(rows
            .iter()
            .filter(|row| row.category == category && row.slot == SlotKind::Main)
            .count() as u32)
    }

    fn fetch(&self, id: RegistrationId) -> Result<Option<Registration>, LedgerError> {
        let rows = self.rows.lock().expect("ledger mutex poisoned");
        Ok(rows.iter().find(|row| row.id == id).cloned())
    }

    fn find_by_handle(&self, handle: &str) -> Result<Vec<Registration>, LedgerError> {
        let rows = self.rows.lock().expect("ledger mutex poisoned");
        Ok(rows
            .iter()
            .filter(|row| row.handle == handle)
            .cloned()
            .collect())
    }

    fn in_category(&self, category: &str) -> Result<Vec<Registration>, LedgerError> {
        let rows = self.rows.lock().expect("ledger mutex poisoned");
        Ok(rows
            .iter()
            .filter(|row| row.category == category)
            .cloned()
            .collect())
    }

    fn update_payment(
        &self,
        id: RegistrationId,
        expected: PaymentStatus,
        next: PaymentStatus,
        receipt_ref: Option<&str>,
    ) -> Result<Registration, LedgerError> {
        let mut rows = self.rows.lock().expect("ledger mutex poisoned");
        let index = rows
            .iter()
            .position(|row| row.id == id)
            .ok_or(LedgerError::NotFound)?;
        if rows[index].payment != expected {
            return Err(LedgerError::ConcurrentModification);
        }

        let mut updated = rows.clone();
        updated[index].payment = next;
        if let Some(receipt) = receipt_ref {
            updated[index].receipt_ref = Some(receipt.to_string());
        }

        // The in-memory cache only advances once the file rewrite succeeded.
        self.rewrite(&updated)?;
        let registration = updated[index].clone();
        *rows = updated;
        Ok(registration)
    }
}

fn read_rows(path: &Path) -> Result<Vec<Registration>, LedgerError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|err| LedgerError::Unavailable(err.to_string()))?;

    let mut rows = Vec::new();
    for (index, record) in reader.deserialize::<SheetRow>().enumerate() {
        let row = record.map_err(|err| LedgerError::Unavailable(err.to_string()))?;
        let id = RegistrationId(index as u64 + 1);
        rows.push(row.into_registration(id)?);
    }

    Ok(rows)
}

/// One persisted row; column names match the operator-facing sheet.
#[derive(Debug, Serialize, Deserialize)]
struct SheetRow {
    #[serde(rename = "Timestamp")]
    timestamp: String,
    #[serde(rename = "Category")]
    category: String,
    #[serde(rename = "Player")]
    player: String,
    #[serde(rename = "Partner")]
    partner: String,
    #[serde(rename = "Phone")]
    phone: String,
    #[serde(rename = "Handle")]
    handle: String,
    #[serde(rename = "Slot")]
    slot: String,
    #[serde(rename = "Payment")]
    payment: String,
    #[serde(rename = "Receipt")]
    receipt: String,
}

impl From<&Registration> for SheetRow {
    fn from(registration: &Registration) -> Self {
        Self {
            timestamp: registration
                .submitted_at
                .naive_utc()
                .format(TIMESTAMP_FORMAT)
                .to_string(),
            category: registration.category.clone(),
            player: registration.player_name.clone(),
            partner: registration.partner_name.clone().unwrap_or_default(),
            phone: registration.phone.clone(),
            handle: registration.handle.clone(),
            slot: registration.slot.label().to_string(),
            payment: registration.payment.label().to_string(),
            receipt: registration.receipt_ref.clone().unwrap_or_default(),
        }
    }
}

impl SheetRow {
    fn into_registration(self, id: RegistrationId) -> Result<Registration, LedgerError> {
        let submitted_at = NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT)
            .map_err(|err| {
                LedgerError::Unavailable(format!("malformed timestamp in row {}: {err}", id))
            })?
            .and_utc();
        let slot = SlotKind::from_label(&self.slot)
            .ok_or_else(|| LedgerError::Unavailable(format!("malformed slot in row {id}")))?;
        let payment = PaymentStatus::from_label(&self.payment)
            .ok_or_else(|| LedgerError::Unavailable(format!("malformed payment in row {id}")))?;

        Ok(Registration {
            id,
            submitted_at,
            category: self.category,
            player_name: self.player,
            partner_name: Some(self.partner).filter(|partner| !partner.is_empty()),
            phone: self.phone,
            handle: self.handle,
            slot,
            payment,
            receipt_ref: Some(self.receipt).filter(|receipt| !receipt.is_empty()),
        })
    }
}

//! Spreadsheet export derivation.
//!
//! Pure half of the export feature: derive the rows and column widths for
//! the on-demand fleet report. The console crate owns the actual workbook
//! writing; everything here is testable without touching the filesystem.

use chrono::NaiveDateTime;

use crate::company::map_company_name;
use crate::vehicle::VehicleSnapshot;

/// Hard cap on exported data rows.
pub const EXPORT_ROW_CAP: usize = 5_000;

/// Fixed report column headers.
pub const EXPORT_HEADERS: [&str; 5] = ["KAPI_NO", "SIRKET", "DURUM", "TARIH", "SAAT"];

/// Padding added to the widest cell when sizing a column.
pub const COLUMN_PADDING: usize = 5;

/// One report row: door code, company, status, date, time.
pub type ExportRow = [String; 5];

/// Derive report rows from a vehicle list: newest-first by last update,
/// capped at [`EXPORT_ROW_CAP`].
///
/// Vehicles without a parseable timestamp sort last (treated as epoch) and
/// are still exported with whatever date/time strings they carried.
#[must_use]
pub fn export_rows(vehicles: &[VehicleSnapshot], now: NaiveDateTime) -> Vec<ExportRow> {
    let mut capped: Vec<&VehicleSnapshot> = vehicles.iter().take(EXPORT_ROW_CAP).collect();
    capped.sort_by_key(|v| std::cmp::Reverse(v.last_update().unwrap_or(NaiveDateTime::MIN)));

    capped
        .into_iter()
        .map(|v| {
            [
                v.door_code().to_owned(),
                map_company_name(v.operator_type.as_deref().unwrap_or("")),
                if v.is_active(now) { "AKTIF" } else { "PASIF" }.to_owned(),
                v.last_location_date.clone().unwrap_or_default(),
                v.last_location_time.clone().unwrap_or_default(),
            ]
        })
        .collect()
}

/// Width of each column: the longest cell (header included) in characters,
/// plus [`COLUMN_PADDING`].
#[must_use]
pub fn column_widths(headers: &[&str], rows: &[ExportRow]) -> Vec<usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            let widest_cell = rows
                .iter()
                .map(|row| row.get(i).map_or(0, |cell| cell.chars().count()))
                .max()
                .unwrap_or(0);
            widest_cell.max(header.chars().count()) + COLUMN_PADDING
        })
        .collect()
}

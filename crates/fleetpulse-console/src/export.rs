//! Spreadsheet export writer.
//!
//! The pure half (row derivation, column sizing, cap, ordering) lives in
//! [`fleetpulse_core::export`]; this module only turns those rows into an
//! `.xlsx` workbook on disk.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use rust_xlsxwriter::Workbook;

use fleetpulse_core::{column_widths, export_rows, FleetError, FleetResult, VehicleSnapshot, EXPORT_HEADERS};

/// Sheet name inside the workbook.
const SHEET_NAME: &str = "Veriler";

/// Default export file name in the working directory, timestamped so
/// repeated exports do not clobber each other.
#[must_use]
pub fn default_export_path() -> PathBuf {
    PathBuf::from(format!(
        "fleetpulse-report-{}.xlsx",
        Local::now().format("%Y%m%d-%H%M%S")
    ))
}

/// Write the fleet report for the given vehicle list.
///
/// The caller passes the currently visible (filtered) list, or the full
/// fleet when no filter is applied; ordering, status derivation, and the
/// 5000-row cap are handled by the core export module.
pub fn write_report(
    path: &Path,
    vehicles: &[VehicleSnapshot],
    now: NaiveDateTime,
) -> FleetResult<()> {
    let rows = export_rows(vehicles, now);
    let widths = column_widths(&EXPORT_HEADERS, &rows);

    let mut workbook = Workbook::new();
    let failed = |e: rust_xlsxwriter::XlsxError| FleetError::ExportFailed {
        path: path.to_path_buf(),
        source: Box::new(e),
    };

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME).map_err(failed)?;

        for (col, header) in EXPORT_HEADERS.iter().enumerate() {
            sheet
                .write_string(0, col as u16, *header)
                .map_err(failed)?;
        }
        for (row_idx, row) in rows.iter().enumerate() {
            for (col, cell) in row.iter().enumerate() {
                sheet
                    .write_string(row_idx as u32 + 1, col as u16, cell)
                    .map_err(failed)?;
            }
        }
        for (col, width) in widths.iter().enumerate() {
            sheet
                .set_column_width(col as u16, *width as f64)
                .map_err(failed)?;
        }
    }

    workbook.save(path).map_err(failed)?;
    tracing::info!(
        target: "fleetpulse.export",
        path = %path.display(),
        rows = rows.len(),
        "fleet report written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetpulse_core::parse_datetime;

    fn vehicle(door: &str) -> VehicleSnapshot {
        VehicleSnapshot {
            vehicle_door_code: Some(door.to_owned()),
            operator_type: Some("iett".to_owned()),
            last_location_date: Some("01-06-2025".to_owned()),
            last_location_time: Some("11:58:00".to_owned()),
            ..VehicleSnapshot::default()
        }
    }

    #[test]
    fn report_file_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        let now = parse_datetime("01-06-2025", "12:00:00").unwrap();
        write_report(&path, &[vehicle("B-058"), vehicle("B-100")], now).unwrap();
        let metadata = std::fs::metadata(&path).unwrap();
        assert!(metadata.len() > 0);
    }

    #[test]
    fn empty_fleet_still_produces_a_header_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");
        let now = parse_datetime("01-06-2025", "12:00:00").unwrap();
        write_report(&path, &[], now).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn unwritable_path_reports_export_failure() {
        let now = parse_datetime("01-06-2025", "12:00:00").unwrap();
        let err = write_report(Path::new("/nonexistent-dir/report.xlsx"), &[vehicle("A")], now)
            .unwrap_err();
        assert!(matches!(err, FleetError::ExportFailed { .. }));
    }
}

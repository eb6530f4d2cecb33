use crate::domain::model::{AccessEntry, Attachment, ReportEntry};
use crate::utils::error::Result;
use chrono::{NaiveDate, NaiveDateTime};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const REPORT_CAPTION: &str = "Berikut laporan pengguna dan aktivitas blast.";
pub const REPORT_MIME_TYPE: &str = "application/zip";

/// 報表檔名，例如 `laporan_20250101_093000.zip`
pub fn report_file_name(now: NaiveDateTime) -> String {
    format!("laporan_{}.zip", now.format("%Y%m%d_%H%M%S"))
}

/// `Users` sheet as CSV.
pub fn users_csv(users: &[AccessEntry], today: NaiveDate) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Nomor", "Dibuat", "Expired", "Status"])?;
    for user in users {
        let status = if user.is_expired(today) {
            "Expired"
        } else {
            "Active"
        };
        let created = user.created.format("%Y-%m-%d").to_string();
        let expired = user.expired.format("%Y-%m-%d").to_string();
        writer.write_record([user.number.as_str(), created.as_str(), expired.as_str(), status])?;
    }
    writer.flush()?;
    Ok(writer.into_inner().map_err(|e| e.into_error())?)
}

/// `Reports` sheet as CSV.
pub fn reports_csv(reports: &[ReportEntry]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["User", "Command", "Target", "Pesan", "Waktu"])?;
    for report in reports {
        writer.write_record([
            report.user.as_str(),
            report.command.as_str(),
            report.target.as_str(),
            report.message.as_str(),
            report.timestamp.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(writer.into_inner().map_err(|e| e.into_error())?)
}

/// Packs both sheets into one ZIP archive.
pub fn build_report_archive(
    users: &[AccessEntry],
    reports: &[ReportEntry],
    today: NaiveDate,
) -> Result<Vec<u8>> {
    let users_data = users_csv(users, today)?;
    let reports_data = reports_csv(reports)?;

    tracing::debug!(
        "Creating report archive ({} users, {} reports)",
        users.len(),
        reports.len()
    );

    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    zip.start_file::<_, ()>("users.csv", FileOptions::default())?;
    zip.write_all(&users_data)?;

    zip.start_file::<_, ()>("reports.csv", FileOptions::default())?;
    zip.write_all(&reports_data)?;

    // 完成並取回底層 Vec<u8>
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

pub fn report_attachment(file_name: &str, data: Vec<u8>) -> Attachment {
    Attachment {
        mime_type: REPORT_MIME_TYPE.to_string(),
        filename: Some(file_name.to_string()),
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_report_file_name() {
        let now = date(2025, 3, 7).and_hms_opt(9, 5, 1).unwrap();
        assert_eq!(report_file_name(now), "laporan_20250307_090501.zip");
    }

    #[test]
    fn test_users_csv_marks_status() {
        let users = vec![
            AccessEntry {
                number: "628111".to_string(),
                created: date(2025, 1, 1),
                expired: date(2025, 2, 1),
            },
            AccessEntry {
                number: "628222".to_string(),
                created: date(2025, 1, 1),
                expired: date(2999, 12, 31),
            },
        ];
        let csv = String::from_utf8(users_csv(&users, date(2025, 6, 1)).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Nomor,Dibuat,Expired,Status");
        assert_eq!(lines[1], "628111,2025-01-01,2025-02-01,Expired");
        assert_eq!(lines[2], "628222,2025-01-01,2999-12-31,Active");
    }

    #[test]
    fn test_archive_contains_both_sheets() {
        let reports = vec![ReportEntry {
            user: "628111@c.us".to_string(),
            command: "blast".to_string(),
            target: "nomor.txt".to_string(),
            message: "Halo, semua".to_string(),
            timestamp: "2025-01-01T00:00:00Z".to_string(),
        }];
        let data = build_report_archive(&[], &reports, date(2025, 1, 1)).unwrap();

        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(data)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut content = String::new();
        archive
            .by_name("reports.csv")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert!(content.starts_with("User,Command,Target,Pesan,Waktu"));
        assert!(content.contains("\"Halo, semua\""));
    }
}

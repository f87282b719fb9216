use std::path::Path;

use anyhow::{Context, Result, anyhow};
use rust_xlsxwriter::{Workbook, Worksheet};
use tabled::{Table, Tabled};

use crate::aggregate::OpeningStatRow;
use crate::session::AnalysisReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") => Ok(ExportFormat::Csv),
            Some("xlsx") => Ok(ExportFormat::Xlsx),
            _ => Err(anyhow!(
                "unsupported export extension for {} (use .csv or .xlsx)",
                path.display()
            )),
        }
    }
}

pub fn render_table(rows: &[OpeningStatRow]) -> String {
    if rows.is_empty() {
        return "(no results)".to_string();
    }
    Table::new(rows).to_string()
}

pub fn export_report(path: &Path, report: &AnalysisReport) -> Result<usize> {
    match ExportFormat::from_path(path)? {
        ExportFormat::Csv => write_stats_csv(path, &report.rows)?,
        ExportFormat::Xlsx => {
            let sheet = format!("{} {:?}", report.side, report.time_class);
            write_stats_xlsx(path, &sheet, &report.rows)?
        }
    }
    Ok(report.rows.len())
}

pub fn write_stats_csv(path: &Path, rows: &[OpeningStatRow]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("create {}", path.display()))?;
    if rows.is_empty() {
        let headers = OpeningStatRow::headers();
        writer
            .write_record(headers.iter().map(|h| h.as_bytes()))
            .context("write header")?;
    }
    for row in rows {
        writer.serialize(row).context("write stats row")?;
    }
    writer.flush().context("flush stats csv")?;
    Ok(())
}

pub fn write_stats_xlsx(path: &Path, sheet_name: &str, rows: &[OpeningStatRow]) -> Result<()> {
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name)?;
        write_stat_rows(sheet, rows)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(())
}

fn write_stat_rows(worksheet: &mut Worksheet, rows: &[OpeningStatRow]) -> Result<()> {
    for (col_idx, header) in OpeningStatRow::headers().iter().enumerate() {
        worksheet
            .write_string(0, col_idx as u16, &**header)
            .with_context(|| format!("write header ({col_idx})"))?;
    }
    for (idx, row) in rows.iter().enumerate() {
        let r = idx as u32 + 1;
        worksheet
            .write_string(r, 0, &row.opening)
            .with_context(|| format!("write opening ({r})"))?;
        let numbers = [
            row.games_played as f64,
            row.win_rate,
            row.draw_rate,
            row.loss_rate,
            row.avg_user_rating,
            row.avg_opponent_rating,
        ];
        for (offset, value) in numbers.into_iter().enumerate() {
            let col = offset as u16 + 1;
            worksheet
                .write_number(r, col, value)
                .with_context(|| format!("write cell ({r},{col})"))?;
        }
    }
    Ok(())
}

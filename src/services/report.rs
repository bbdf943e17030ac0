use actix_web::web;
use chrono::NaiveDate;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument};
use sqlx::SqlitePool;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::{db, error::AppError, model::attendance::Presence};

// A4 portrait, millimetres
pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
pub const TOP_Y: f32 = 280.0;
pub const BOTTOM_MARGIN: f32 = 20.0;
pub const LINE_HEIGHT: f32 = 7.0;
const MARGIN_LEFT: f32 = 15.0;
const COLUMNS: [f32; 3] = [MARGIN_LEFT, 60.0, 160.0];
const HEADER: [&str; 3] = ["Reg No", "Name", "Status"];

const TITLE_SIZE: f32 = 16.0;
const HEADING_SIZE: f32 = 13.0;
const BODY_SIZE: f32 = 11.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub reg_no: String,
    pub name: String,
    pub status: Presence,
}

#[derive(Debug, Clone, Default)]
pub struct ReportTable {
    pub title: Option<String>,
    pub rows: Vec<ReportRow>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub present: usize,
    pub absent: usize,
}

impl Tally {
    pub fn of(rows: &[ReportRow]) -> Self {
        let present = rows
            .iter()
            .filter(|r| r.status == Presence::Present)
            .count();
        Self {
            present,
            absent: rows.len() - present,
        }
    }

    pub fn line(&self) -> String {
        format!(
            "Total Present: {} | Total Absent: {}",
            self.present, self.absent
        )
    }
}

#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub title: String,
    pub details: Vec<String>,
    pub tables: Vec<ReportTable>,
    /// Only set in single-hour mode.
    pub tally: Option<Tally>,
}

#[derive(Debug, Clone)]
pub struct ReportArtifact {
    pub file_name: String,
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub tally: Option<Tally>,
}

#[derive(sqlx::FromRow)]
struct ReportRowSql {
    attendance_id: i64,
    student_id: i64,
    reg_no: Option<String>,
    name: Option<String>,
    status: bool,
}

pub fn report_file_name(section_id: i64, hour_id: Option<i64>, date: NaiveDate) -> String {
    match hour_id {
        Some(hour_id) => format!("attendance_report_{section_id}_{hour_id}_{date}.pdf"),
        None => format!("attendance_report_{section_id}_{date}.pdf"),
    }
}

async fn hour_rows(
    pool: &SqlitePool,
    hour_id: i64,
    date: NaiveDate,
) -> Result<Vec<ReportRow>, AppError> {
    let rows = sqlx::query_as::<_, ReportRowSql>(
        r#"
        SELECT a.id AS attendance_id, a.student_id, s.reg_no, s.name, a.status
        FROM attendance a
        LEFT JOIN students s ON s.id = a.student_id
        WHERE a.hour_id = ? AND a.date = ?
        ORDER BY a.id
        "#,
    )
    .bind(hour_id)
    .bind(date)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| match (row.reg_no, row.name) {
            (Some(reg_no), Some(name)) => Ok(ReportRow {
                reg_no,
                name,
                status: Presence::from(row.status),
            }),
            _ => Err(AppError::DataIntegrity(format!(
                "attendance {} references missing student {}",
                row.attendance_id, row.student_id
            ))),
        })
        .collect()
}

/// Collects the rows of a report without rendering it.
///
/// With `hour_id` the report covers that hour and carries a tally; without
/// it, every hour of the section gets its own table in stored order.
pub async fn build_report(
    pool: &SqlitePool,
    section_id: i64,
    hour_id: Option<i64>,
    date: NaiveDate,
) -> Result<ReportDocument, AppError> {
    let section_label = db::find_section(pool, section_id)
        .await?
        .map(|s| s.name)
        .unwrap_or_else(|| format!("Section {section_id}"));

    let mut details = vec![format!("Section: {section_label}")];

    let (tables, tally) = match hour_id {
        Some(hour_id) => {
            let hour_label = db::find_hour(pool, hour_id)
                .await?
                .map(|h| h.time_slot)
                .unwrap_or_else(|| format!("Hour {hour_id}"));
            details.push(format!("Hour: {hour_label}"));

            let rows = hour_rows(pool, hour_id, date).await?;
            let tally = Tally::of(&rows);
            (vec![ReportTable { title: None, rows }], Some(tally))
        }
        None => {
            let mut tables = Vec::new();
            for hour in db::list_hours(pool, section_id).await? {
                tables.push(ReportTable {
                    title: Some(format!("Hour: {}", hour.time_slot)),
                    rows: hour_rows(pool, hour.id, date).await?,
                });
            }
            (tables, None)
        }
    };

    details.push(format!("Date: {date}"));

    Ok(ReportDocument {
        title: "Attendance Report".to_string(),
        details,
        tables,
        tally,
    })
}

// -------------------- Layout --------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub bold: bool,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct Page {
    pub items: Vec<PlacedText>,
}

struct Cursor {
    pages: Vec<Page>,
    y: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y: TOP_Y,
        }
    }

    /// Whether `lines` more lines fit above the bottom margin.
    fn fits(&self, lines: usize) -> bool {
        self.y - LINE_HEIGHT * (lines.saturating_sub(1)) as f32 >= BOTTOM_MARGIN
    }

    fn break_page(&mut self) {
        self.pages.push(Page::default());
        self.y = TOP_Y;
    }

    fn place(&mut self, x: f32, size: f32, bold: bool, text: &str) {
        let y = self.y;
        if let Some(page) = self.pages.last_mut() {
            page.items.push(PlacedText {
                x,
                y,
                size,
                bold,
                text: text.to_string(),
            });
        }
    }

    fn line(&mut self, size: f32, bold: bool, text: &str) {
        if !self.fits(1) {
            self.break_page();
        }
        self.place(MARGIN_LEFT, size, bold, text);
        self.y -= LINE_HEIGHT;
    }

    fn gap(&mut self) {
        self.y -= LINE_HEIGHT / 2.0;
    }

    fn row(&mut self, cells: [&str; 3], bold: bool) {
        for (x, cell) in COLUMNS.into_iter().zip(cells) {
            self.place(x, BODY_SIZE, bold, cell);
        }
        self.y -= LINE_HEIGHT;
    }

    fn table(&mut self, table: &ReportTable) {
        // title + header + first row stay together
        let needed = if table.title.is_some() { 3 } else { 2 };
        if !self.fits(needed) {
            self.break_page();
        }
        if let Some(title) = &table.title {
            self.line(HEADING_SIZE, true, title);
        }
        self.row(HEADER, true);

        if table.rows.is_empty() {
            self.line(BODY_SIZE, false, "No attendance recorded");
        }

        for row in &table.rows {
            if !self.fits(1) {
                self.break_page();
                self.row(HEADER, true);
            }
            self.row([row.reg_no.as_str(), row.name.as_str(), row.status.as_ref()], false);
        }
        self.gap();
    }
}

/// Places every line of the report on A4 pages, breaking once the cursor
/// would cross the bottom margin.
pub fn layout(doc: &ReportDocument) -> Vec<Page> {
    let mut cursor = Cursor::new();

    cursor.line(TITLE_SIZE, true, &doc.title);
    for detail in &doc.details {
        cursor.line(BODY_SIZE, false, detail);
    }
    cursor.gap();

    for table in &doc.tables {
        cursor.table(table);
    }

    if let Some(tally) = doc.tally {
        cursor.line(BODY_SIZE, true, &tally.line());
    }

    cursor.pages
}

// -------------------- Rendering --------------------

fn pdf_error(e: impl std::fmt::Display) -> AppError {
    AppError::Report(e.to_string())
}

pub fn render_pdf(doc: &ReportDocument) -> Result<Vec<u8>, AppError> {
    let pages = layout(doc);

    let (pdf, first_page, first_layer) = PdfDocument::new(
        doc.title.as_str(),
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Layer 1",
    );
    let regular: IndirectFontRef = pdf
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_error)?;
    let bold: IndirectFontRef = pdf
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;

    for (index, page) in pages.iter().enumerate() {
        let (page_index, layer_index) = if index == 0 {
            (first_page, first_layer)
        } else {
            pdf.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), format!("Page {}", index + 1))
        };
        let layer = pdf.get_page(page_index).get_layer(layer_index);

        for item in &page.items {
            let font = if item.bold { &bold } else { &regular };
            layer.use_text(item.text.as_str(), item.size, Mm(item.x), Mm(item.y), font);
        }
    }

    pdf.save_to_bytes().map_err(pdf_error)
}

/// Builds, renders and stores the report under `reports_dir`, replacing any
/// earlier file for the same key.
pub async fn generate_report(
    pool: &SqlitePool,
    reports_dir: &Path,
    section_id: i64,
    hour_id: Option<i64>,
    date: NaiveDate,
) -> Result<ReportArtifact, AppError> {
    let document = build_report(pool, section_id, hour_id, date).await?;
    let tally = document.tally;
    let file_name = report_file_name(section_id, hour_id, date);
    let dir = reports_dir.to_path_buf();
    let path = dir.join(&file_name);

    debug!(section_id, ?hour_id, %date, tables = document.tables.len(), "Rendering report");

    let target = path.clone();
    let bytes = web::block(move || -> Result<Vec<u8>, AppError> {
        let bytes = render_pdf(&document)?;
        fs::create_dir_all(&dir)?;
        fs::write(&target, &bytes)?;
        Ok(bytes)
    })
    .await
    .map_err(|e| AppError::Report(e.to_string()))??;

    info!(path = %path.display(), size = bytes.len(), "Report saved");

    Ok(ReportArtifact {
        file_name,
        path,
        bytes,
        tally,
    })
}

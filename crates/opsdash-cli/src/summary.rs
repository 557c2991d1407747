//! Terminal tables for command output.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use opsdash_model::{JobRecord, MappingSet, SyncResult};
use opsdash_report::{SalesSummary, format_with_commas};
use opsdash_sync::SyncRun;

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

pub fn sync_table(run: &SyncRun) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Remote table"),
        header_cell("Local table"),
        header_cell("Fetched"),
        header_cell("Written"),
        header_cell("Status"),
        header_cell("Error"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Center);
    for result in &run.results {
        table.add_row(vec![
            Cell::new(&result.remote_table),
            Cell::new(&result.table),
            Cell::new(result.rows_fetched),
            Cell::new(result.rows_written),
            status_cell(result),
            match result.error_message() {
                Some(message) => Cell::new(message).fg(Color::Red),
                None => dim_cell("-"),
            },
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(run.results.iter().map(|r| r.rows_fetched).sum::<usize>())
            .add_attribute(Attribute::Bold),
        Cell::new(run.rows_written()).add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
    ]);
    table
}

pub fn print_sync_summary(run: &SyncRun) {
    println!("{}", sync_table(run));
    let seconds = (run.finished_at - run.started_at).num_milliseconds() as f64 / 1000.0;
    if run.succeeded() {
        println!("Synced {} tables in {seconds:.1}s", run.results.len());
    } else {
        eprintln!("Sync stopped after a failure ({seconds:.1}s)");
    }
}

pub fn jobs_table(jobs: &[JobRecord]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Id"),
        header_cell("Name"),
        header_cell("Kind"),
        header_cell("Every"),
        header_cell("Enabled"),
        header_cell("Last run"),
        header_cell("Status"),
        header_cell("Last log line"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Center);
    for job in jobs {
        let status = match job.last_status.as_deref() {
            Some("success") => Cell::new("success").fg(Color::Green),
            Some(other) => Cell::new(other).fg(Color::Red),
            None => dim_cell("never"),
        };
        let last_line = job
            .last_run_log
            .as_deref()
            .and_then(|log| log.lines().last())
            .unwrap_or("-");
        table.add_row(vec![
            Cell::new(job.id),
            Cell::new(&job.name),
            Cell::new(&job.kind),
            Cell::new(format_interval(job.interval_minutes)),
            Cell::new(if job.enabled { "yes" } else { "no" }),
            Cell::new(job.last_run.as_deref().unwrap_or("-")),
            status,
            Cell::new(last_line),
        ]);
    }
    table
}

pub fn mappings_table(mappings: &MappingSet) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Remote table"),
        header_cell("Local table"),
        header_cell("Columns"),
        header_cell("Key"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for (index, mapping) in mappings.iter().enumerate() {
        let columns: Vec<String> = mapping
            .columns()
            .iter()
            .map(|pair| {
                if pair.remote == pair.local {
                    pair.local.clone()
                } else {
                    format!("{} -> {}", pair.remote, pair.local)
                }
            })
            .collect();
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(mapping.remote_table()),
            Cell::new(mapping.local_table()),
            Cell::new(columns.join(", ")),
            Cell::new(mapping.primary_key().join(", ")),
        ]);
    }
    table
}

pub fn sales_tables(summary: &SalesSummary) -> (Table, Table) {
    let mut items = Table::new();
    items.set_header(vec![
        header_cell("Item"),
        header_cell("Revenue"),
        header_cell("Tons sold"),
    ]);
    apply_table_style(&mut items);
    align_column(&mut items, 1, CellAlignment::Right);
    align_column(&mut items, 2, CellAlignment::Right);
    for item in &summary.by_item {
        items.add_row(vec![
            Cell::new(&item.description),
            Cell::new(format_with_commas(item.revenue)),
            Cell::new(format_with_commas(item.tons_sold)),
        ]);
    }

    let mut years = Table::new();
    years.set_header(vec![
        header_cell("Year"),
        header_cell("Revenue"),
        header_cell("Tons sold"),
    ]);
    apply_table_style(&mut years);
    align_column(&mut years, 1, CellAlignment::Right);
    align_column(&mut years, 2, CellAlignment::Right);
    for year in &summary.by_year {
        years.add_row(vec![
            Cell::new(year.year),
            Cell::new(format_with_commas(year.revenue)),
            Cell::new(format_with_commas(year.tons_sold)),
        ]);
    }
    (items, years)
}

fn format_interval(minutes: u32) -> String {
    match minutes {
        m if m % 1440 == 0 => format!("{}d", m / 1440),
        m if m % 60 == 0 => format!("{}h", m / 60),
        m => format!("{m}m"),
    }
}

fn status_cell(result: &SyncResult) -> Cell {
    if result.is_success() {
        Cell::new("ok").fg(Color::Green)
    } else {
        Cell::new("FAILED")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold)
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use opsdash_model::FailureKind;

    use super::*;

    #[test]
    fn intervals() {
        assert_eq!(format_interval(1440), "1d");
        assert_eq!(format_interval(120), "2h");
        assert_eq!(format_interval(45), "45m");
    }

    #[test]
    fn sync_table_lists_results_and_totals() {
        let started_at = Utc.with_ymd_and_hms(2024, 3, 1, 2, 0, 0).unwrap();
        let run = SyncRun {
            started_at,
            finished_at: started_at,
            results: vec![
                SyncResult::success("AR_Customer", "Customer", 12),
                SyncResult::failure(
                    "CI_Item",
                    "CI_Item",
                    FailureKind::LocalWrite,
                    "disk full",
                    3,
                ),
            ],
        };
        let rendered = sync_table(&run).to_string();
        assert!(rendered.contains("AR_Customer"));
        assert!(rendered.contains("FAILED"));
        assert!(rendered.contains("TOTAL"));
        assert!(rendered.contains("15"));
    }
}

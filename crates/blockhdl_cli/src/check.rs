//! `blockhdl check`: load, simplify and wire a model without emitting it.
//!
//! Prints one row per wired block: its name, kind, the nets it reads, and
//! the net it drives.

use blockhdl_diagnostics::DiagnosticSink;
use blockhdl_netlist::{wire_model, Net, WiredNetlist};
use serde_json::json;

use crate::pipeline::{load_project, render_and_report};
use crate::{CheckArgs, GlobalArgs, ReportFormat};

/// Runs the `blockhdl check` command.
///
/// Returns exit code 0 if the model wires cleanly, 1 otherwise.
pub fn run(args: &CheckArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let sink = DiagnosticSink::new();

    let Some(project) = load_project(global, args.model.as_deref(), &sink)? else {
        render_and_report(&sink, args.format, global);
        return Ok(1);
    };

    let wired = match wire_model(&project.model, &project.config, &sink) {
        Ok((_, _, wired)) => wired,
        Err(e) => {
            sink.emit(e.to_diagnostic());
            render_and_report(&sink, args.format, global);
            return Ok(1);
        }
    };

    match args.format {
        ReportFormat::Text => print!("{}", format_table(&wired)),
        ReportFormat::Json => println!("{}", table_json(&wired)),
    }

    render_and_report(&sink, args.format, global);
    Ok(if sink.has_errors() { 1 } else { 0 })
}

struct Row {
    block: String,
    kind: &'static str,
    inputs: Vec<Net>,
    output: Option<Net>,
}

fn rows(wired: &WiredNetlist) -> Vec<Row> {
    wired
        .iter()
        .map(|w| Row {
            block: w.block.name.clone(),
            kind: w.block.kind.model_name(),
            inputs: w.in_signal.nets().to_vec(),
            output: w.out_signal,
        })
        .collect()
}

/// Renders the wiring as an aligned text table.
pub fn format_table(wired: &WiredNetlist) -> String {
    let rows = rows(wired);
    let cells: Vec<[String; 4]> = rows
        .into_iter()
        .map(|r| {
            let inputs = if r.inputs.is_empty() {
                "-".to_string()
            } else {
                r.inputs
                    .iter()
                    .map(Net::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            [
                r.block,
                r.kind.to_string(),
                inputs,
                r.output.map_or_else(|| "-".to_string(), |n| n.to_string()),
            ]
        })
        .collect();

    let header = ["BLOCK", "KIND", "READS", "DRIVES"];
    let mut widths = header.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    let mut push_line = |cols: [&str; 4]| {
        let line = format!(
            "{:<w0$}  {:<w1$}  {:<w2$}  {}",
            cols[0],
            cols[1],
            cols[2],
            cols[3],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
        );
        out.push_str(line.trim_end());
        out.push('\n');
    };
    push_line(header);
    for row in &cells {
        push_line([&row[0], &row[1], &row[2], &row[3]]);
    }
    out
}

/// Renders the wiring as a JSON array of rows.
pub fn table_json(wired: &WiredNetlist) -> String {
    let rows: Vec<_> = rows(wired)
        .into_iter()
        .map(|r| {
            json!({
                "block": r.block,
                "kind": r.kind,
                "reads": r.inputs,
                "drives": r.output,
            })
        })
        .collect();
    serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockhdl_config::load_config_from_str;
    use blockhdl_graph::ModelDescription;

    fn wired(model: &str) -> WiredNetlist {
        let desc = ModelDescription::from_json(model).unwrap();
        let config = load_config_from_str("[module]\nname = \"m\"\n").unwrap();
        let (_, _, wired) = wire_model(&desc, &config, &DiagnosticSink::new()).unwrap();
        wired
    }

    const CHAIN: &str = r#"{
        "blocks": [
            { "id": "g", "kind": "GAIN_f", "gain": 0.5 },
            { "id": "i", "kind": "INTEGRAL_f" }
        ],
        "links": [ { "source": "g", "target": "i" } ]
    }"#;

    #[test]
    fn table_lists_blocks_in_order() {
        let table = format_table(&wired(CHAIN));
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("BLOCK"));
        assert!(lines[1].starts_with("g "));
        assert!(lines[1].contains("GAIN_f"));
        assert!(lines[1].contains("in"));
        assert!(lines[2].starts_with("i "));
        assert!(lines[2].ends_with("out"));
    }

    #[test]
    fn table_columns_align() {
        let table = format_table(&wired(CHAIN));
        let kind_col = table.lines().next().unwrap().find("KIND").unwrap();
        for line in table.lines().skip(1) {
            assert!(line[kind_col..].starts_with("GAIN_f") || line[kind_col..].starts_with("INTEGRAL_f"));
        }
    }

    #[test]
    fn json_rows_carry_nets() {
        let value: serde_json::Value = serde_json::from_str(&table_json(&wired(CHAIN))).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["block"], "g");
        assert_eq!(rows[0]["reads"][0], "in");
        assert_eq!(rows[1]["drives"], "out");
        assert_eq!(rows[0]["drives"], rows[1]["reads"][0]);
    }
}

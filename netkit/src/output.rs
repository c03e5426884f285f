use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use netkit_core::table::{self, Style};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat { Text, Json, Jsonl }

impl OutputFormat {
    /// Config files spell formats as plain strings.
    pub fn from_config(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "jsonl" => Ok(OutputFormat::Jsonl),
            other => bail!("unknown output format {other:?} in config (expected text, json or jsonl)"),
        }
    }

    /// CLI flag, then config, then text. A bad config value is only an error
    /// when the flag does not override it.
    pub fn resolve(flag: Option<OutputFormat>, config: Option<&str>) -> Result<Self> {
        if let Some(f) = flag {
            return Ok(f);
        }
        config.map_or(Ok(OutputFormat::Text), Self::from_config)
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_else(|_| String::new())
}

/// Where and how to write a result set.
pub struct Sink<'a> {
    pub format: OutputFormat,
    pub out: Option<&'a Path>,
    pub csv: bool,
    pub style: Style,
}

impl Sink<'_> {
    pub fn emit<R, F>(&self, headers: &[&str], rows: &[R], cells: F) -> Result<()>
    where
        R: Serialize,
        F: Fn(&R) -> Vec<Option<String>>,
    {
        if self.csv {
            let path = self.out.context("--csv requires --out <file>")?;
            let mut wtr = csv::Writer::from_writer(File::create(path)?);
            wtr.write_record(headers)?;
            for r in rows {
                wtr.write_record(cells(r).into_iter().map(|c| c.unwrap_or_default()))?;
            }
            wtr.flush()?;
            return Ok(());
        }

        let mut w: Box<dyn Write> = match self.out {
            Some(path) => {
                let file = OpenOptions::new().create(true).truncate(true).write(true).open(path)
                    .with_context(|| format!("failed to open {}", path.display()))?;
                Box::new(BufWriter::new(file))
            }
            None => Box::new(io::stdout().lock()),
        };
        write_rows(&mut w, self.format, self.style, headers, rows, cells)?;
        w.flush()?;
        Ok(())
    }
}

fn write_rows<W, R, F>(w: &mut W, format: OutputFormat, style: Style, headers: &[&str], rows: &[R], cells: F) -> Result<()>
where
    W: Write + ?Sized,
    R: Serialize,
    F: Fn(&R) -> Vec<Option<String>>,
{
    match format {
        OutputFormat::Text => {
            let grid: Vec<Vec<Option<String>>> = rows.iter().map(&cells).collect();
            write!(w, "{}", table::render(headers, &grid, style))?;
        }
        OutputFormat::Json => {
            let obj = serde_json::json!({
                "captured_at": now_rfc3339(),
                "count": rows.len(),
                "rows": rows,
            });
            writeln!(w, "{}", serde_json::to_string(&obj)?)?;
        }
        OutputFormat::Jsonl => {
            for r in rows { writeln!(w, "{}", serde_json::to_string(r)?)?; }
        }
    }
    Ok(())
}

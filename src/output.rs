use crate::registry::{CheckResult, Status};
use crate::verdict::Verdict;
use crossterm::style::{style, Stylize};
use crossterm::tty::IsTty;
use serde::Serialize;
use std::io::{self, Write};

#[derive(Clone, Copy)]
enum Paint {
  Bold,
  Dim,
  Green,
  Red,
  Yellow,
}

/// Human-readable report, one aligned row per registry
pub struct Printer<W: Write> {
  out: W,
  color: bool,
}

impl<W: Write> Printer<W> {
  pub fn new(out: W, color: bool) -> Self {
    Self { out, color }
  }

  pub fn print(&mut self, name: &str, results: &[CheckResult]) -> io::Result<()> {
    writeln!(
      self.out,
      "\nChecking availability for {}\n",
      self.paint(&format!("\"{}\"", name), Paint::Bold)
    )?;

    let width = results.iter().map(|r| r.registry.chars().count()).max().unwrap_or(0);

    for r in results {
      let status = match r.status {
        Status::Available => self.paint("✓ available", Paint::Green),
        Status::Taken => self.paint("✗ taken", Paint::Red),
        Status::Unknown => {
          let reason = r
            .error
            .as_ref()
            .map_or_else(|| "unknown error".to_string(), |e| e.to_string());
          self.paint(&format!("⚠ {}", reason), Paint::Yellow)
        }
      };
      writeln!(self.out, "  {:<width$}  {}", r.registry, status, width = width)?;

      if let Some(ref detail) = r.detail {
        writeln!(self.out, "  {:<width$}  {}", "", self.paint(detail, Paint::Dim), width = width)?;
      }
    }

    let available = results.iter().filter(|r| r.status == Status::Available).count();
    writeln!(self.out, "\n{} of {} available", available, results.len())
  }

  fn paint(&self, text: &str, paint: Paint) -> String {
    if !self.color {
      return text.to_string();
    }
    match paint {
      Paint::Bold => style(text).bold().to_string(),
      Paint::Dim => style(text).dim().to_string(),
      Paint::Green => style(text).green().to_string(),
      Paint::Red => style(text).red().to_string(),
      Paint::Yellow => style(text).yellow().to_string(),
    }
  }
}

#[derive(Serialize)]
struct JsonReport<'a> {
  name: &'a str,
  verdict: Verdict,
  results: &'a [CheckResult],
}

pub fn print_json<W: Write>(out: &mut W, name: &str, results: &[CheckResult]) -> anyhow::Result<()> {
  let report = JsonReport {
    name,
    verdict: Verdict::from_results(results),
    results,
  };
  serde_json::to_writer_pretty(&mut *out, &report)?;
  writeln!(out)?;
  Ok(())
}

/// Color only on a terminal, and never with `--no-color` or `NO_COLOR` set.
pub fn should_use_color(no_color_flag: bool) -> bool {
  if no_color_flag {
    return false;
  }
  if std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()) {
    return false;
  }
  io::stdout().is_tty()
}

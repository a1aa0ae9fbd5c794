use colored::*;

use crate::{
  diagnostic::{Diagnostic, LabelStyle, Locus},
  diagnostic_code::Severity,
};

/// Renders a diagnostic against its source text.
///
/// The first line (for runtime codes, the first two lines) is the stable
/// reporting format the driver promises on stderr; the gutter/caret block
/// underneath is context and only appears when the source line is known.
pub struct DiagnosticFormatter<'a> {
  diagnostic: &'a Diagnostic,
  source_lines: Vec<&'a str>,
}

impl<'a> DiagnosticFormatter<'a> {
  pub fn new(diagnostic: &'a Diagnostic, source_code: &'a str) -> Self {
    Self {
      diagnostic,
      source_lines: source_code.lines().collect(),
    }
  }

  pub fn format(&self) -> String {
    self.render(true)
  }

  /// Format without colors for tests and file logging
  pub fn format_plain(&self) -> String {
    self.render(false)
  }

  fn severity_text(&self) -> &'static str {
    match self.diagnostic.severity {
      Severity::Error => "Error",
      Severity::Warning => "Warning",
    }
  }

  fn locus_text(&self) -> String {
    match &self.diagnostic.locus {
      None => String::new(),
      Some(Locus::Eof) => " at end".to_string(),
      Some(Locus::Lexeme(lexeme)) => format!(" at '{}'", lexeme),
    }
  }

  fn get_line_content(&self, line_num: usize) -> Option<&str> {
    line_num.checked_sub(1).and_then(|i| self.source_lines.get(i).copied())
  }

  fn underline_char(&self, style: LabelStyle) -> char {
    match style {
      LabelStyle::Primary => '^',
      LabelStyle::Secondary => '-',
    }
  }

  fn render(&self, color: bool) -> String {
    let mut output = String::new();

    let paint = |text: &str| -> String {
      if !color {
        return text.to_string();
      }
      match self.diagnostic.severity {
        Severity::Error => text.red().bold().to_string(),
        Severity::Warning => text.yellow().bold().to_string(),
      }
    };

    // Header in the driver's wire format.
    if self.diagnostic.code.is_runtime() {
      output.push_str(&format!("{}\n", self.diagnostic.message));
      if let Some(line) = self.diagnostic.line() {
        output.push_str(&format!("[line {}]\n", line));
      }
    } else {
      match self.diagnostic.line() {
        Some(line) => output.push_str(&format!(
          "[line {}] {}{}: {}\n",
          line,
          paint(self.severity_text()),
          self.locus_text(),
          self.diagnostic.message
        )),
        None => output.push_str(&format!(
          "{}: {}\n",
          paint(self.severity_text()),
          self.diagnostic.message
        )),
      }
    }

    // Source excerpt with underlines, one block per label.
    for label in &self.diagnostic.labels {
      let Some(line_content) = self.get_line_content(label.span.line) else {
        continue;
      };

      let gutter = |text: &str| -> String {
        if color {
          text.blue().bold().to_string()
        } else {
          text.to_string()
        }
      };

      output.push_str(&format!("    {}\n", gutter("|")));
      output.push_str(&format!(
        " {} {} {}\n",
        gutter(&format!("{:>2}", label.span.line)),
        gutter("|"),
        line_content
      ));

      let padding = " ".repeat(label.span.column);
      let underline = self
        .underline_char(label.style)
        .to_string()
        .repeat(label.span.length.max(1));
      let underline = match (color, label.style) {
        (false, _) => underline,
        (true, LabelStyle::Primary) => paint(&underline),
        (true, LabelStyle::Secondary) => underline.cyan().bold().to_string(),
      };

      match &label.message {
        Some(message) => output.push_str(&format!(
          "    {} {}{} {}\n",
          gutter("|"),
          padding,
          underline,
          message
        )),
        None => output.push_str(&format!("    {} {}{}\n", gutter("|"), padding, underline)),
      }
    }

    for note in &self.diagnostic.notes {
      output.push_str(&format!("    = note: {}\n", note));
    }

    if let Some(help) = &self.diagnostic.help {
      output.push_str(&format!("    = help: {}\n", help));
    }

    output
  }
}

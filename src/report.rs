use console::{style, StyledObject, Term};
use std::time::Instant;

fn paint<T: AsRef<str>>(text: T, look: fn(StyledObject<&str>) -> StyledObject<&str>) -> String {
  look(style(text.as_ref())).to_string()
}

pub fn bold<T: AsRef<str>>(text: T) -> String {
  paint(text, |s| s.bold())
}

pub fn error<T: AsRef<str>>(text: T) -> String {
  paint(text, |s| s.red())
}

pub fn warning<T: AsRef<str>>(text: T) -> String {
  paint(text, |s| s.color256(214).bold())
}

pub fn success<T: AsRef<str>>(text: T) -> String {
  paint(text, |s| s.green())
}

pub fn highlight<T: AsRef<str>>(text: T) -> String {
  paint(text, |s| s.blue().bold())
}

pub fn light<T: AsRef<str>>(text: T) -> String {
  paint(text, |s| s.color256(245))
}

#[cfg(windows)]
pub const ARROW: &str = ">";

#[cfg(not(windows))]
pub const ARROW: &str = "▶";

#[cfg(windows)]
pub const CHECK: &str = "v";

#[cfg(not(windows))]
pub const CHECK: &str = "✓";

const LINE_WIDTH: usize = 72;

pub fn line() -> String {
  "-".repeat(LINE_WIDTH)
}

pub fn double_line() -> String {
  "=".repeat(LINE_WIDTH)
}

// Tool name, version and purpose framed by separator lines
pub fn banner(title: &str, version: &str, about: &str) -> String {
  format!(
    "\n{} {}\n{}\n{}\n{}\n",
    highlight(title),
    version,
    line(),
    about,
    double_line()
  )
}

/// Prints `✓ <what> in N.NN seconds.` lines for the phases of a run.
#[derive(Debug)]
pub struct Reporter {
  enabled: bool,
  part_time: Instant,
}

impl Reporter {
  pub fn new(enabled: bool) -> Self {
    Reporter { enabled, part_time: Instant::now() }
  }

  // Close the current phase and start timing the next one
  pub fn step<T: AsRef<str>>(&mut self, what: T) {
    if self.enabled {
      println!(
        "{} {} in {:.2} seconds.",
        success(CHECK),
        what.as_ref(),
        self.part_time.elapsed().as_secs_f64()
      );
    }
    self.part_time = Instant::now();
  }

  pub fn progress(&self, label: &str, total: usize) -> Progress {
    Progress::new(label, total, self.enabled)
  }
}

/// Percentage line redrawn in place while rows complete.
///
/// Only the thread that collects results advances it, so the shown value
/// never decreases.
#[derive(Debug)]
pub struct Progress {
  label: String,
  total: usize,
  done: usize,
  percent: usize,
  enabled: bool,
  term: Term,
}

impl Progress {
  pub fn new(label: &str, total: usize, enabled: bool) -> Self {
    let progress = Progress {
      label: label.to_string(),
      total,
      done: 0,
      percent: 0,
      enabled,
      term: Term::stdout(),
    };
    progress.draw();
    progress
  }

  pub fn hidden(total: usize) -> Self {
    Progress::new("", total, false)
  }

  pub fn done(&self) -> usize {
    self.done
  }

  pub fn percent(&self) -> usize {
    self.percent
  }

  // One more unit of work finished; redraws only when the whole percentage moves
  pub fn advance(&mut self) {
    self.done = (self.done + 1).min(self.total);
    let percent = if self.total == 0 { 100 } else { self.done * 100 / self.total };
    if percent > self.percent {
      self.percent = percent;
      self.draw();
    }
  }

  pub fn finish(&mut self) {
    if self.enabled {
      let _ = self.term.clear_line();
    }
  }

  fn draw(&self) {
    if !self.enabled {
      return;
    }
    let _ = self.term.clear_line();
    let _ = self.term.write_str(&format!("\r{}... {}%", self.label, self.percent));
  }
}

//! Progress display for provider audits
//!
//! Shows a spinner while the lock file is read and a bar while registry
//! lookups are in flight. Drawn on stderr so it never mixes with reports.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::path::Path;
use std::time::Duration;

const SPINNER_TEMPLATE: &str = "{spinner:.cyan} {msg}";
const LOOKUP_TEMPLATE: &str = "{spinner:.cyan} {prefix} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}";
const TICK: Duration = Duration::from_millis(90);

/// Progress reporter for the phases of one audit
pub struct Progress {
    /// Off in quiet and JSON modes
    enabled: bool,
    active: Option<ProgressBar>,
}

impl Progress {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            active: None,
        }
    }

    /// Spinner shown while the lock file is read and parsed
    pub fn reading_lock_file(&mut self, path: &Path) {
        let Some(spinner) = self.replace(None, ProgressStyle::default_spinner(), SPINNER_TEMPLATE)
        else {
            return;
        };
        spinner.set_message(format!("Reading {}", path.display()));
    }

    /// Bar counting registry lookups for `providers` providers
    pub fn begin_lookups(&mut self, providers: usize) {
        let Some(bar) = self.replace(
            Some(providers as u64),
            ProgressStyle::default_bar().progress_chars("=> "),
            LOOKUP_TEMPLATE,
        ) else {
            return;
        };
        bar.set_prefix("Checking providers");
    }

    /// Record one finished lookup, naming the provider just checked
    pub fn provider_done(&self, provider: &str) {
        if let Some(bar) = &self.active {
            bar.set_message(provider.to_string());
            bar.inc(1);
        }
    }

    /// Remove whatever is on screen
    pub fn clear(&mut self) {
        if let Some(bar) = self.active.take() {
            bar.finish_and_clear();
        }
    }

    fn replace(
        &mut self,
        len: Option<u64>,
        style: ProgressStyle,
        template: &str,
    ) -> Option<&ProgressBar> {
        self.clear();
        if !self.enabled {
            return None;
        }
        let bar = ProgressBar::with_draw_target(len, ProgressDrawTarget::stderr());
        if let Ok(style) = style.template(template) {
            bar.set_style(style);
        }
        bar.enable_steady_tick(TICK);
        self.active = Some(bar);
        self.active.as_ref()
    }
}

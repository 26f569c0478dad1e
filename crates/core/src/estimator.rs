//! Heuristic, allocation-light token estimation calibrated per model family.

use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFamily {
  Default,
  Openai,
  Claude,
  Codex,
}

impl ModelFamily {
  fn base_ratio(self) -> f64 {
    match self {
      ModelFamily::Default => 4.0,
      ModelFamily::Openai => 4.0,
      ModelFamily::Claude => 4.3,
      ModelFamily::Codex => 3.3,
    }
  }
}

#[derive(Debug, Default)]
struct Densities {
  len: usize,
  letters: usize,
  cjk: usize,
  newlines: usize,
  punct: usize,
  whitespace: usize,
  symbols: usize,
}

fn is_cjk(c: char) -> bool {
  let cp = c as u32;
  (0x4E00..=0x9FFF).contains(&cp)
    || (0x3040..=0x30FF).contains(&cp)
    || (0xAC00..=0xD7A3).contains(&cp)
    || (0x3400..=0x4DBF).contains(&cp)
}

fn scan(text: &str) -> Densities {
  let mut d = Densities::default();
  for c in text.chars() {
    d.len += 1;
    if is_cjk(c) {
      d.cjk += 1;
    } else if c.is_alphabetic() {
      d.letters += 1;
    }
    if c == '\n' {
      d.newlines += 1;
    }
    if ".,;:!?'\"".contains(c) {
      d.punct += 1;
    }
    if c.is_whitespace() {
      d.whitespace += 1;
    }
    let cp = c as u32;
    if (0x21..=0x7E).contains(&cp) && !c.is_alphanumeric() {
      d.symbols += 1;
    }
  }
  d
}

/// Computes the effective chars-per-token ratio for `text` under `model`,
/// following the density-adjustment rules in the component's contract.
/// Exposed separately from `estimate` so the cached blended estimator can
/// reuse it without re-deriving tokens.
fn effective_ratio(text: &str, model: ModelFamily) -> f64 {
  let len = text.chars().count();
  if len == 0 {
    return model.base_ratio();
  }
  let d = scan(text);
  let len_f = len as f64;
  let cjk_density = d.cjk as f64 / len_f;
  let punct_density = d.punct as f64 / len_f;
  let newline_density = d.newlines as f64 / len_f;
  let whitespace_density = d.whitespace as f64 / len_f;
  let symbol_density = d.symbols as f64 / len_f;
  let non_letter_share = 1.0 - (d.letters as f64 / len_f);

  let mut ratio = model.base_ratio();

  if cjk_density > 0.3 {
    ratio = ratio.min(1.7);
  } else if cjk_density > 0.1 {
    let t = (cjk_density - 0.1) / 0.2;
    ratio = ratio + (1.7 - ratio) * t;
  }

  ratio *= match model {
    ModelFamily::Codex => 1.0 - (0.10f64).min(symbol_density * 0.5 + non_letter_share * 0.05),
    ModelFamily::Claude => 1.0 - (0.05f64).min(punct_density * 0.5 + newline_density * 0.5),
    _ => 1.0 - (0.03f64).min(punct_density * 0.3 + newline_density * 0.3 + whitespace_density * 0.05),
  };

  ratio.clamp(1.5, 8.0)
}

/// Pure, thread-safe token estimator with a bounded cache for hot paths.
pub struct TokenEstimator {
  overrides: HashMap<ModelFamily, f64>,
  cache: Mutex<HashMap<(usize, usize), f64>>,
  cache_cap: usize,
}

impl Default for TokenEstimator {
  fn default() -> Self {
    Self::new()
  }
}

impl TokenEstimator {
  pub fn new() -> Self {
    Self { overrides: HashMap::new(), cache: Mutex::new(HashMap::new()), cache_cap: 120_000 }
  }

  /// Overrides the base ratio for a model family. Rejects non-positive ratios.
  pub fn with_ratio_override(mut self, model: ModelFamily, ratio: f64) -> Result<Self, String> {
    if ratio <= 0.0 {
      return Err(format!("invalid ratio override {ratio}: must be > 0"));
    }
    self.overrides.insert(model, ratio);
    Ok(self)
  }

  fn base_ratio(&self, model: ModelFamily) -> f64 {
    self.overrides.get(&model).copied().unwrap_or_else(|| model.base_ratio())
  }

  /// Normalizes line endings to LF (no trimming) and estimates token count.
  pub fn estimate(&self, text: &str, model: ModelFamily) -> u32 {
    if text.is_empty() {
      return 0;
    }
    let normalized = normalize_line_endings(text);
    let len = normalized.chars().count();
    if len == 0 {
      return 0;
    }
    let mut base = self.base_ratio(model);
    let computed = effective_ratio(&normalized, model);
    // when an override is present it still receives the same density
    // adjustments, scaled proportionally to the ratio's own base.
    if self.overrides.contains_key(&model) {
      let default_base = model.base_ratio();
      let adjustment = computed / default_base;
      base = (base * adjustment).clamp(1.5, 8.0);
    } else {
      base = computed;
    }
    ((len as f64) / base).ceil() as u32
  }

  /// Cached blended estimator keyed by `(length, word_count)`, intended for
  /// hot paths that re-estimate similarly-shaped text repeatedly. Bounded at
  /// 120,000 entries; evicts arbitrarily once full.
  pub fn estimate_cached(&self, text: &str, model: ModelFamily) -> u32 {
    if text.is_empty() {
      return 0;
    }
    let len = text.chars().count();
    let word_count = text.split_whitespace().count();
    let key = (len, word_count);
    {
      let cache = self.cache.lock().unwrap();
      if let Some(ratio) = cache.get(&key) {
        return ((len as f64) / ratio).ceil() as u32;
      }
    }
    let normalized = normalize_line_endings(text);
    let ratio = effective_ratio(&normalized, model);
    let mut cache = self.cache.lock().unwrap();
    if cache.len() < self.cache_cap {
      cache.insert(key, ratio);
    }
    ((len as f64) / ratio).ceil() as u32
  }
}

fn normalize_line_endings(text: &str) -> String {
  if !text.contains('\r') {
    return text.to_string();
  }
  text.replace("\r\n", "\n").replace('\r', "\n")
}

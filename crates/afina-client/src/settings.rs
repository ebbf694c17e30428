//! Generation settings: native-style numeric parsing, persistence under a
//! single local-storage key, and the floating panel that edits them.

use afina_types::RagParameters;
use anyhow::{Context, Result};

use crate::storage::LocalStorage;

pub const SETTINGS_KEY: &str = "chatSettings";

/// Integer prefix of `s`, the way `parseInt(s)` reads it.
///
/// Leading whitespace and a sign are allowed, a `0x` prefix switches to hex,
/// and trailing garbage is ignored. `None` when no digit is found. Digit runs
/// past the `i64` range saturate so the value still goes out as a number.
pub fn parse_int(s: &str) -> Option<i64> {
    let t = s.trim_start();
    let (neg, rest) = match t.as_bytes().first() {
        Some(b'-') => (true, &t[1..]),
        Some(b'+') => (false, &t[1..]),
        _ => (false, t),
    };
    let (radix, digits) = match rest.get(..2) {
        Some("0x") | Some("0X") => (16, &rest[2..]),
        _ => (10, rest),
    };
    let end = digits.find(|c: char| !c.is_digit(radix)).unwrap_or(digits.len());
    if end == 0 { return None; }
    // only overflow can fail here
    let v = i64::from_str_radix(&digits[..end], radix).unwrap_or(i64::MAX);
    Some(if neg { -v } else { v })
}

/// Float prefix of `s`, the way `parseFloat(s)` reads it. Non-finite results are `None`.
pub fn parse_float(s: &str) -> Option<f64> {
    let t = s.trim_start();
    let b = t.as_bytes();
    let mut i = 0;
    if matches!(b.first(), Some(b'+') | Some(b'-')) { i += 1; }
    let mut mantissa_digits = 0;
    while i < b.len() && b[i].is_ascii_digit() { i += 1; mantissa_digits += 1; }
    if i < b.len() && b[i] == b'.' {
        i += 1;
        while i < b.len() && b[i].is_ascii_digit() { i += 1; mantissa_digits += 1; }
    }
    if mantissa_digits == 0 { return None; }
    if i < b.len() && (b[i] == b'e' || b[i] == b'E') {
        let mut j = i + 1;
        if matches!(b.get(j), Some(b'+') | Some(b'-')) { j += 1; }
        let exp_start = j;
        while j < b.len() && b[j].is_ascii_digit() { j += 1; }
        if j > exp_start { i = j; }
    }
    let v: f64 = t[..i].parse().ok()?;
    v.is_finite().then_some(v)
}

/// Persisted settings, or defaults when nothing usable is stored.
pub fn load_settings(storage: &LocalStorage) -> RagParameters {
    match storage.get_item(SETTINGS_KEY) {
        None => RagParameters::default(),
        Some(raw) => serde_json::from_str(raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "stored chat settings are malformed; using defaults");
            RagParameters::default()
        }),
    }
}

pub fn persist_settings(storage: &mut LocalStorage, settings: &RagParameters) -> Result<()> {
    let raw = serde_json::to_string(settings).context("serialising chat settings")?;
    storage.set_item(SETTINGS_KEY, raw)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField { NPredict, Temperature, TopK, RagK, RagSimThreshold }

impl SettingsField {
    pub const ALL: [SettingsField; 5] = [
        SettingsField::NPredict,
        SettingsField::Temperature,
        SettingsField::TopK,
        SettingsField::RagK,
        SettingsField::RagSimThreshold,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SettingsField::NPredict => "Max tokens",
            SettingsField::Temperature => "Temperature",
            SettingsField::TopK => "Top-K",
            SettingsField::RagK => "RAG K (contexts)",
            SettingsField::RagSimThreshold => "RAG similarity threshold",
        }
    }

    /// Advisory range shown next to the field. Nothing enforces it.
    pub fn hint(self) -> &'static str {
        match self {
            SettingsField::NPredict => "1-2048",
            SettingsField::Temperature => "0-2",
            SettingsField::TopK => "1-100",
            SettingsField::RagK => "1-10",
            SettingsField::RagSimThreshold => "0-1",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }
}

fn show_int(v: Option<i64>) -> String { v.map(|n| n.to_string()).unwrap_or_default() }
fn show_float(v: Option<f64>) -> String { v.map(|n| n.to_string()).unwrap_or_default() }

/// Hidden-by-default overlay holding the five fields as raw text.
#[derive(Debug, Clone)]
pub struct SettingsPanel {
    open: bool,
    fields: [String; 5],
    focus: usize,
}

impl SettingsPanel {
    pub fn new(current: &RagParameters) -> Self {
        let mut panel = Self { open: false, fields: Default::default(), focus: 0 };
        panel.fill_from(current);
        panel
    }

    pub fn is_open(&self) -> bool { self.open }

    pub fn toggle(&mut self) { self.open = !self.open; }

    pub fn fill_from(&mut self, p: &RagParameters) {
        self.fields = [
            show_int(p.n_predict),
            show_float(p.temperature),
            show_int(p.top_k),
            show_int(p.rag_k),
            show_float(p.rag_sim_threshold),
        ];
    }

    pub fn field(&self, f: SettingsField) -> &str { &self.fields[f.index()] }

    pub fn set_field(&mut self, f: SettingsField, value: impl Into<String>) {
        self.fields[f.index()] = value.into();
    }

    pub fn focused(&self) -> SettingsField { SettingsField::ALL[self.focus] }

    pub fn focus_next(&mut self) { self.focus = (self.focus + 1) % SettingsField::ALL.len(); }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + SettingsField::ALL.len() - 1) % SettingsField::ALL.len();
    }

    pub fn type_char(&mut self, c: char) { self.fields[self.focus].push(c); }

    pub fn backspace(&mut self) { self.fields[self.focus].pop(); }

    /// Parse every field; ints and floats as the field kind dictates, no clamping.
    pub fn parse(&self) -> RagParameters {
        RagParameters {
            n_predict: parse_int(&self.fields[0]),
            temperature: parse_float(&self.fields[1]),
            top_k: parse_int(&self.fields[2]),
            rag_k: parse_int(&self.fields[3]),
            rag_sim_threshold: parse_float(&self.fields[4]),
        }
    }

    /// Overwrite `settings` wholesale, persist, and close the panel.
    pub fn save(&mut self, settings: &mut RagParameters, storage: &mut LocalStorage) -> Result<()> {
        *settings = self.parse();
        persist_settings(storage, settings)?;
        self.open = false;
        Ok(())
    }
}

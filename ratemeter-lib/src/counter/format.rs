//! Template expansion for meter text.
//!
//! Templates contain `{name}` or `{name:spec}` placeholders. Numeric fields accept a
//! `W.Pf` spec (width and precision, e.g. `{percentage:3.0f}`). Unknown values are
//! shown as `?`, and unknown placeholders are copied through untouched.

use core::time::Duration;
use indicatif::{FormattedDuration, HumanCount};

/// Default text for the widget surface.
pub const WIDGET_TEMPLATE: &str = "{count}/{total}, {rate} {unit}/s\n{elapsed} elapsed, {remaining} ETA\n{percentage:3.0f}%";

/// Plot title when the total is known.
pub const DETERMINATE_TITLE: &str = "{prefix}{percentage:3.0f}% {count}/{total} [{elapsed}<{remaining}, {rate} {unit}/s]";

/// Plot title when the total is unknown.
pub const INDETERMINATE_TITLE: &str = "{prefix}{count} [{elapsed}, {rate} {unit}/s]";

const UNKNOWN: &str = "?";

/// Everything needed to produce one line (or block) of meter text.
#[derive(Debug, Clone, Copy)]
pub struct MeterFields<'a> {
    pub n: u64,
    pub total: Option<u64>,
    pub elapsed: f64,
    pub rate: Option<f64>,
    pub desc: &'a str,
    pub unit: &'a str,
    pub unit_scale: bool,

    /// Template override; when absent a title template matching the mode is used.
    pub template: Option<&'a str>,
}

impl MeterFields<'_> {
    /// Completed fraction in percent, when the total is known and non-zero.
    #[must_use]
    #[expect(clippy::cast_precision_loss, reason = "loss of precision acceptable for percentage calculation")]
    pub fn percentage(&self) -> Option<f64> {
        self.total.filter(|&t| t > 0).map(|t| 100.0 * self.n as f64 / t as f64)
    }

    /// Seconds left at the current rate.
    #[must_use]
    #[expect(clippy::cast_precision_loss, reason = "acceptable for duration")]
    pub fn remaining(&self) -> Option<f64> {
        let total = self.total?;
        let rate = self.rate.filter(|r| r.is_finite() && *r > 0.0)?;
        Some(total.saturating_sub(self.n) as f64 / rate)
    }
}

/// Expand the template in `fields` (or the default title) into display text.
#[must_use]
pub fn format_meter(fields: &MeterFields<'_>) -> String {
    let template = fields.template.unwrap_or(if fields.total.is_some() {
        DETERMINATE_TITLE
    } else {
        INDETERMINATE_TITLE
    });

    let mut out = String::with_capacity(template.len() + 32);
    let mut rest = template;

    while let Some((before, after)) = rest.split_once('{') {
        out.push_str(before);

        let Some((placeholder, tail)) = after.split_once('}') else {
            out.push('{');
            rest = after;
            break;
        };

        let (name, spec) = placeholder.split_once(':').map_or((placeholder, None), |(n, s)| (n, Some(s)));
        if let Some(value) = field_value(name, fields) {
            out.push_str(&value.render(spec));
        } else {
            out.push('{');
            out.push_str(placeholder);
            out.push('}');
        }

        rest = tail;
    }

    out.push_str(rest);
    out
}

enum Value {
    Number { value: Option<f64>, precision: usize },
    Text(String),
}

impl Value {
    fn render(&self, spec: Option<&str>) -> String {
        let spec = spec.and_then(NumberSpec::parse);
        match self {
            Self::Number { value: Some(v), precision } => {
                let (width, precision) = spec.map_or((0, *precision), |s| (s.width, s.precision.unwrap_or(*precision)));
                format!("{v:>width$.precision$}")
            }
            Self::Number { value: None, .. } => {
                let width = spec.map_or(0, |s| s.width);
                format!("{UNKNOWN:>width$}")
            }
            Self::Text(text) => {
                let width = spec.map_or(0, |s| s.width);
                format!("{text:>width$}")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NumberSpec {
    width: usize,
    precision: Option<usize>,
}

impl NumberSpec {
    fn parse(spec: &str) -> Option<Self> {
        let spec = spec.strip_suffix('f').unwrap_or(spec);
        let (width, precision) = spec.split_once('.').map_or((spec, None), |(w, p)| (w, Some(p)));

        let width = if width.is_empty() { 0 } else { width.parse().ok()? };
        let precision = match precision {
            Some(p) => Some(p.parse().ok()?),
            None => None,
        };

        Some(Self { width, precision })
    }
}

fn field_value(name: &str, fields: &MeterFields<'_>) -> Option<Value> {
    let value = match name {
        "desc" => Value::Text(fields.desc.to_string()),
        "prefix" => Value::Text(if fields.desc.is_empty() {
            String::new()
        } else {
            format!("{}: ", fields.desc)
        }),
        "count" | "n" | "n_fmt" => Value::Text(count_text(fields.n, fields.unit_scale)),
        "total" | "total_fmt" => Value::Text(fields.total.map_or_else(|| UNKNOWN.to_string(), |t| count_text(t, fields.unit_scale))),
        "unit" => Value::Text(fields.unit.to_string()),
        "rate" => Value::Number {
            value: fields.rate.filter(|r| r.is_finite()),
            precision: 2,
        },
        "elapsed" => Value::Text(duration_text(Some(fields.elapsed))),
        "remaining" => Value::Text(duration_text(fields.remaining())),
        "percentage" => Value::Number {
            value: fields.percentage(),
            precision: 0,
        },
        _ => return None,
    };

    Some(value)
}

fn count_text(n: u64, unit_scale: bool) -> String {
    if unit_scale { HumanCount(n).to_string() } else { n.to_string() }
}

fn duration_text(secs: Option<f64>) -> String {
    // Estimates past the range of `Duration` are as unknown as a missing rate.
    secs.and_then(|s| Duration::try_from_secs_f64(s.max(0.0)).ok())
        .map_or_else(|| UNKNOWN.to_string(), |d| FormattedDuration(d).to_string())
}

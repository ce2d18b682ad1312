/// Parameter constraints and typed route values
///
/// A constraint kind (`int`, `guid`, ...) names a [`Converter`] that turns the
/// raw, already-decoded path segment into a [`RouteValue`]. The mapping lives
/// in an explicit [`ConstraintRegistry`] handed to the compiler, so hosts can
/// add their own kinds without any global state.
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use uuid::Uuid;

/// A parameter value extracted from a path, typed by its constraint
#[derive(Debug, Clone, PartialEq)]
pub enum RouteValue {
    Str(String),
    Int(i32),
    Long(i64),
    Bool(bool),
    Float(f32),
    Double(f64),
    /// Plain decimal notation only (`-12.50`), no exponent, no `NaN`/`inf`
    Decimal(f64),
    Guid(Uuid),
    DateTime(NaiveDateTime),
}

impl RouteValue {
    /// Returns the string payload for untyped parameters
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RouteValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value widened to `i64` for `int`/`long` parameters
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RouteValue::Int(v) => Some(i64::from(*v)),
            RouteValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RouteValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RouteValue::Float(v) => Some(f64::from(*v)),
            RouteValue::Double(v) | RouteValue::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_guid(&self) -> Option<Uuid> {
        match self {
            RouteValue::Guid(g) => Some(*g),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            RouteValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

/// Renders the value in a form its own converter parses back
impl fmt::Display for RouteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteValue::Str(s) => f.write_str(s),
            RouteValue::Int(v) => write!(f, "{}", v),
            RouteValue::Long(v) => write!(f, "{}", v),
            RouteValue::Bool(v) => write!(f, "{}", v),
            RouteValue::Float(v) => write!(f, "{}", v),
            RouteValue::Double(v) | RouteValue::Decimal(v) => write!(f, "{}", v),
            RouteValue::Guid(g) => write!(f, "{}", g.hyphenated()),
            RouteValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

impl From<&str> for RouteValue {
    fn from(value: &str) -> Self {
        RouteValue::Str(value.to_string())
    }
}

impl From<String> for RouteValue {
    fn from(value: String) -> Self {
        RouteValue::Str(value)
    }
}

// ============================================================================
// Converters
// ============================================================================

type ConvertFn = dyn Fn(&str) -> Option<RouteValue> + Send + Sync;

/// Conversion function `raw segment → typed value`; `None` means the
/// segment does not satisfy the constraint
#[derive(Clone)]
pub struct Converter {
    convert: Arc<ConvertFn>,
}

impl Converter {
    pub fn new<F>(convert: F) -> Self
    where
        F: Fn(&str) -> Option<RouteValue> + Send + Sync + 'static,
    {
        Self {
            convert: Arc::new(convert),
        }
    }

    /// Builds a converter from any `FromStr` type
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_navigator::{Converter, RouteValue};
    ///
    /// let port = Converter::parsing(|v: u16| RouteValue::Int(i32::from(v)));
    /// assert_eq!(port.convert("8080"), Some(RouteValue::Int(8080)));
    /// assert_eq!(port.convert("70000"), None);
    /// ```
    pub fn parsing<T, F>(wrap: F) -> Self
    where
        T: FromStr,
        F: Fn(T) -> RouteValue + Send + Sync + 'static,
    {
        Self::new(move |raw| raw.parse::<T>().ok().map(&wrap))
    }

    pub fn convert(&self, raw: &str) -> Option<RouteValue> {
        (self.convert)(raw)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Converter(..)")
    }
}

fn parse_bool(raw: &str) -> Option<RouteValue> {
    if raw.eq_ignore_ascii_case("true") {
        Some(RouteValue::Bool(true))
    } else if raw.eq_ignore_ascii_case("false") {
        Some(RouteValue::Bool(false))
    } else {
        None
    }
}

/// `[+-]digits[.digits]` or `[+-].digits`
fn parse_decimal(raw: &str) -> Option<RouteValue> {
    let unsigned = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    let well_formed = !(int_part.is_empty() && frac_part.is_empty())
        && digits_only(int_part)
        && digits_only(frac_part)
        && !unsigned.ends_with('.');

    if !well_formed {
        return None;
    }

    raw.parse::<f64>().ok().map(RouteValue::Decimal)
}

/// Locale-invariant date/time parsing
fn parse_datetime(raw: &str) -> Option<RouteValue> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(RouteValue::DateTime(dt.naive_utc()));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(RouteValue::DateTime)
}

// ============================================================================
// Registry
// ============================================================================

/// Mapping from constraint kind to converter
///
/// Kinds are matched case-insensitively. Kinds that are not registered are
/// permitted in templates and behave like plain string parameters.
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::{ConstraintRegistry, RouteValue};
///
/// let registry = ConstraintRegistry::builtin()
///     .with_converter("slug", |raw| {
///         raw.chars()
///             .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
///             .then(|| RouteValue::Str(raw.to_string()))
///     });
///
/// assert!(registry.is_compatible("int", "42"));
/// assert!(!registry.is_compatible("int", "forty-two"));
/// assert!(!registry.is_compatible("slug", "Not A Slug"));
/// assert!(registry.is_compatible("unknown-kind", "anything"));
/// ```
#[derive(Debug, Clone)]
pub struct ConstraintRegistry {
    converters: HashMap<String, Converter>,
}

impl ConstraintRegistry {
    /// Registry with no kinds at all; every constraint degrades to a string
    pub fn empty() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    /// Registry with the built-in kinds: `int`, `long`, `bool`, `float`,
    /// `double`, `decimal`, `guid`, `datetime`
    pub fn builtin() -> Self {
        Self::empty()
            .with("int", Converter::parsing(RouteValue::Int))
            .with("long", Converter::parsing(RouteValue::Long))
            .with("bool", Converter::new(parse_bool))
            .with("float", Converter::parsing(RouteValue::Float))
            .with("double", Converter::parsing(RouteValue::Double))
            .with("decimal", Converter::new(parse_decimal))
            .with("guid", Converter::parsing(RouteValue::Guid))
            .with("datetime", Converter::new(parse_datetime))
    }

    /// Adds or replaces a converter (functional builder)
    pub fn with(mut self, kind: impl Into<String>, converter: Converter) -> Self {
        self.converters
            .insert(kind.into().to_ascii_lowercase(), converter);
        self
    }

    /// Adds or replaces a converter from a closure
    pub fn with_converter<F>(self, kind: impl Into<String>, convert: F) -> Self
    where
        F: Fn(&str) -> Option<RouteValue> + Send + Sync + 'static,
    {
        self.with(kind, Converter::new(convert))
    }

    pub fn get(&self, kind: &str) -> Option<&Converter> {
        self.converters.get(&kind.to_ascii_lowercase())
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.get(kind).is_some()
    }

    /// Runs the converter for `kind`; unknown kinds pass the raw string through
    pub fn convert(&self, kind: &str, raw: &str) -> Option<RouteValue> {
        match self.get(kind) {
            Some(converter) => converter.convert(raw),
            None => Some(RouteValue::Str(raw.to_string())),
        }
    }

    /// Whether `value` would be accepted by a `{name:kind}` segment
    pub fn is_compatible(&self, kind: &str, value: &str) -> bool {
        self.convert(kind, value).is_some()
    }
}

impl Default for ConstraintRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

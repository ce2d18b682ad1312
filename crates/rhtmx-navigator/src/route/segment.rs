/// Route segment model
///
/// Pure functional classification of template fragments into typed segments.
/// Classification never fails; the compiler rejects malformed shapes.
use crate::constraint::Converter;

/// Syntactic shape of one template fragment
///
/// Functional sum type for pattern matching route segments.
/// Each parameter variant carries its name and optional constraint kind.
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::route::segment::{classify_segment, PatternSegmentType};
///
/// // Literal segment
/// let seg = classify_segment("about");
/// assert!(matches!(seg, PatternSegmentType::Static(_)));
///
/// // Required parameter with constraint
/// let seg = classify_segment("{id:int}");
/// assert!(matches!(seg, PatternSegmentType::Required(_, Some(_))));
///
/// // Optional parameter
/// let seg = classify_segment("{page?}");
/// assert!(matches!(seg, PatternSegmentType::Optional(_, None)));
///
/// // Catch-all
/// let seg = classify_segment("{*rest}");
/// assert!(matches!(seg, PatternSegmentType::CatchAll(_, None)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSegmentType {
    /// Catch-all segment: {*rest}; the compiler refuses {*rest:kind}
    CatchAll(String, Option<String>),
    /// Optional parameter: {id?} or {id:int?}
    Optional(String, Option<String>),
    /// Required parameter: {id} or {id:int}
    Required(String, Option<String>),
    /// Literal text segment
    Static(String),
}

/// Classifies a segment into a pattern type (pure function)
///
/// # Parsing Rules (evaluated in order)
///
/// 1. Anything not wrapped in `{}` is **static**
/// 2. A leading `*` inside the braces marks a **catch-all**
/// 3. A trailing `?` marks an **optional** parameter
/// 4. Otherwise the parameter is **required**
///
/// In every parameter form an embedded `:` separates the name from a
/// constraint kind.
pub fn classify_segment(segment: &str) -> PatternSegmentType {
    match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        Some(inner) => {
            if let Some(param_part) = inner.strip_prefix('*') {
                // `{*rest?}` is accepted; a catch-all is optional by nature
                let param_part = param_part.strip_suffix('?').unwrap_or(param_part);
                let (name, constraint) = parse_param_with_constraint(param_part);
                return PatternSegmentType::CatchAll(name, constraint);
            }

            if let Some(param_part) = inner.strip_suffix('?') {
                let (name, constraint) = parse_param_with_constraint(param_part);
                return PatternSegmentType::Optional(name, constraint);
            }

            let (name, constraint) = parse_param_with_constraint(inner);
            PatternSegmentType::Required(name, constraint)
        }
        None => PatternSegmentType::Static(segment.to_string()),
    }
}

/// Parses parameter name and optional constraint kind (pure function)
///
/// Only the first `:` separates; the remainder is the kind verbatim.
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::route::segment::parse_param_with_constraint;
///
/// assert_eq!(parse_param_with_constraint("id"), ("id".to_string(), None));
/// assert_eq!(
///     parse_param_with_constraint("id:int"),
///     ("id".to_string(), Some("int".to_string()))
/// );
/// ```
pub fn parse_param_with_constraint(param: &str) -> (String, Option<String>) {
    param
        .split_once(':')
        .map(|(name, kind)| (name.to_string(), Some(kind.to_string())))
        .unwrap_or_else(|| (param.to_string(), None))
}

// ============================================================================
// Compiled segments
// ============================================================================

/// What a compiled segment matches
#[derive(Debug, Clone)]
pub enum SegmentKind {
    /// Case-preserved literal text, compared case-insensitively
    Literal(String),
    Parameter(ParameterSegment),
}

/// A named parameter slot
#[derive(Debug, Clone)]
pub struct ParameterSegment {
    pub name: String,
    pub catch_all: bool,
    pub optional: bool,
    /// Constraint kind as written in the template (`int`, `guid`, ...)
    pub constraint: Option<String>,
    /// Bound converter; `None` for unconstrained or unknown kinds
    pub converter: Option<Converter>,
}

/// One atom of a compiled template; immutable once compiled
#[derive(Debug, Clone)]
pub struct RouteSegment {
    kind: SegmentKind,
}

impl RouteSegment {
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::Literal(text.into()),
        }
    }

    pub fn parameter(parameter: ParameterSegment) -> Self {
        Self {
            kind: SegmentKind::Parameter(parameter),
        }
    }

    pub fn kind(&self) -> &SegmentKind {
        &self.kind
    }

    pub fn is_parameter(&self) -> bool {
        matches!(self.kind, SegmentKind::Parameter(_))
    }

    pub fn is_catch_all(&self) -> bool {
        matches!(&self.kind, SegmentKind::Parameter(p) if p.catch_all)
    }

    pub fn is_optional(&self) -> bool {
        matches!(&self.kind, SegmentKind::Parameter(p) if p.optional)
    }

    pub fn literal_text(&self) -> Option<&str> {
        match &self.kind {
            SegmentKind::Literal(text) => Some(text),
            SegmentKind::Parameter(_) => None,
        }
    }

    pub fn parameter_name(&self) -> Option<&str> {
        match &self.kind {
            SegmentKind::Parameter(p) => Some(&p.name),
            SegmentKind::Literal(_) => None,
        }
    }

    pub fn constraint(&self) -> Option<&str> {
        match &self.kind {
            SegmentKind::Parameter(p) => p.constraint.as_deref(),
            SegmentKind::Literal(_) => None,
        }
    }

    pub fn converter(&self) -> Option<&Converter> {
        match &self.kind {
            SegmentKind::Parameter(p) => p.converter.as_ref(),
            SegmentKind::Literal(_) => None,
        }
    }
}

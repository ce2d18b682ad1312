/// URL validator: a stateless, fail-closed security gate
///
/// Rejects control characters, a fixed set of invalid characters, traversal
/// sequences, dangerous schemes and oversized input. The input is decoded
/// once so percent-encoding cannot smuggle any of these past the checks.
/// Absent (empty) input is always valid.
use std::borrow::Cow;

use crate::config::ValidationConfig;

pub const MAX_PATH_LENGTH: usize = 2048;
pub const MAX_PARAMETER_LENGTH: usize = 512;

const INVALID_PATH_CHARS: &[char] = &['<', '>', '"', '\0', '|', '*', '?'];
/// Query values legitimately carry `|`, `*` and `?`
const INVALID_QUERY_CHARS: &[char] = &['<', '>', '"', '\0'];
const TRAVERSAL_SEQUENCES: &[&str] = &["../", "..\\"];
const DANGEROUS_SCHEMES: &[&str] = &["javascript:", "data:", "vbscript:", "file:", "ftp:"];

/// Outcome of a validation: hard errors plus advisory warnings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// Validator with configurable length ceilings
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::UrlValidator;
///
/// let validator = UrlValidator::default();
///
/// assert!(validator.validate_path("/users/123").is_valid());
/// assert!(!validator.validate_path("/users/../admin").is_valid());
/// assert!(!validator.validate_path("/go/javascript:alert(1)").is_valid());
/// assert!(!validator.validate_path("/file%00.txt").is_valid());
/// assert!(validator.validate_path("").is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlValidator {
    max_path_length: usize,
    max_parameter_length: usize,
}

impl Default for UrlValidator {
    fn default() -> Self {
        Self {
            max_path_length: MAX_PATH_LENGTH,
            max_parameter_length: MAX_PARAMETER_LENGTH,
        }
    }
}

impl UrlValidator {
    pub fn new(max_path_length: usize, max_parameter_length: usize) -> Self {
        Self {
            max_path_length,
            max_parameter_length,
        }
    }

    pub fn from_config(config: &ValidationConfig) -> Self {
        Self::new(config.max_path_length, config.max_parameter_length)
    }

    pub fn max_path_length(&self) -> usize {
        self.max_path_length
    }

    pub fn max_parameter_length(&self) -> usize {
        self.max_parameter_length
    }

    /// Validates the path portion of a URL
    pub fn validate_path(&self, path: &str) -> ValidationResult {
        let mut result = ValidationResult::valid();
        if path.is_empty() {
            return result;
        }

        if path.chars().count() > self.max_path_length {
            result.error(format!(
                "path exceeds the maximum length of {} characters",
                self.max_path_length
            ));
            return result;
        }

        check_content(path, INVALID_PATH_CHARS, &mut result);

        if path.contains("//") {
            result.warn("path contains empty segments");
        }
        if path.contains('\\') {
            result.warn("path contains backslashes");
        }
        if path.contains('%') {
            result.warn("path contains percent-encoded characters");
        }

        result
    }

    /// Validates one (decoded) route parameter value
    pub fn validate_route_parameter(&self, value: &str, name: &str) -> ValidationResult {
        let mut result = ValidationResult::valid();
        if value.is_empty() {
            return result;
        }

        if value.chars().count() > self.max_parameter_length {
            result.error(format!(
                "parameter `{}` exceeds the maximum length of {} characters",
                name, self.max_parameter_length
            ));
            return result;
        }

        check_content(value, INVALID_PATH_CHARS, &mut result);

        if value.trim() != value {
            result.warn(format!("parameter `{}` has surrounding whitespace", name));
        }

        result
    }

    /// Validates a query string, with or without its leading `?`
    pub fn validate_query_string(&self, query: &str) -> ValidationResult {
        let mut result = ValidationResult::valid();
        let query = query.strip_prefix('?').unwrap_or(query);
        if query.is_empty() {
            return result;
        }

        if query.chars().count() > self.max_path_length {
            result.error(format!(
                "query string exceeds the maximum length of {} characters",
                self.max_path_length
            ));
            return result;
        }

        check_content(query, INVALID_QUERY_CHARS, &mut result);

        if query.split('&').any(|pair| pair.starts_with('=')) {
            result.warn("query string contains a value without a key");
        }

        result
    }

    /// Screens a whole navigation target before it is split into parts
    ///
    /// Splitting drops the scheme, authority and fragment, so they are
    /// checked here for traversal and dangerous schemes. The query is left
    /// to [`validate_query_string`](Self::validate_query_string).
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_navigator::UrlValidator;
    ///
    /// let validator = UrlValidator::default();
    /// assert!(validator.validate_uri("https://example.com/users/1#top").is_valid());
    /// assert!(!validator.validate_uri("javascript://evil/users/1").is_valid());
    /// assert!(!validator.validate_uri("/users/1#/../admin").is_valid());
    /// ```
    pub fn validate_uri(&self, uri: &str) -> ValidationResult {
        let mut result = ValidationResult::valid();
        let (before_fragment, fragment) = uri.split_once('#').unwrap_or((uri, ""));
        let location = before_fragment
            .split_once('?')
            .map_or(before_fragment, |(location, _)| location);

        for part in [location, fragment] {
            if let Some(decoded) = decode_once(part, &mut result) {
                check_threats(part, &decoded, &mut result);
            }
        }

        result
    }

    /// Best-effort cleanup of a value before it is placed in a generated URL
    ///
    /// Never used during matching: matching rejects, it does not repair.
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_navigator::UrlValidator;
    ///
    /// let validator = UrlValidator::default();
    /// assert_eq!(validator.sanitize_parameter("../etc/<passwd>"), "etc/passwd");
    /// assert_eq!(validator.sanitize_parameter("JavaScript:alert(1)"), "alert(1)");
    /// ```
    pub fn sanitize_parameter(&self, value: &str) -> String {
        let mut cleaned: String = value
            .chars()
            .filter(|c| !c.is_control() && !INVALID_PATH_CHARS.contains(c))
            .collect();

        // Removal can create new matches (`....//` → `../`), so repeat
        loop {
            let before = cleaned.len();
            for sequence in TRAVERSAL_SEQUENCES {
                cleaned = cleaned.replace(sequence, "");
            }
            for scheme in DANGEROUS_SCHEMES {
                cleaned = remove_ignore_ascii_case(&cleaned, scheme);
            }
            if cleaned.len() == before {
                break;
            }
        }

        cleaned.chars().take(self.max_parameter_length).collect()
    }
}

fn check_content(input: &str, invalid_chars: &[char], result: &mut ValidationResult) {
    if input.chars().any(|c| c.is_control() && c != '\0') {
        result.error("contains control characters");
    }

    if let Some(c) = input.chars().find(|c| invalid_chars.contains(c)) {
        result.error(format!("contains invalid character {:?}", c));
    }

    // Decode exactly once; an undecodable escape is itself a rejection
    let Some(decoded) = decode_once(input, result) else {
        return;
    };

    if matches!(decoded, Cow::Owned(_)) && decoded.chars().any(char::is_control) {
        result.error("contains encoded control characters");
    }

    check_threats(input, &decoded, result);
}

fn decode_once<'a>(input: &'a str, result: &mut ValidationResult) -> Option<Cow<'a, str>> {
    let decoded = urlencoding::decode(input).ok();
    if decoded.is_none() {
        result.error("contains percent-encoding that is not valid UTF-8");
    }
    decoded
}

/// Traversal and dangerous-scheme checks on both forms of the input
fn check_threats(input: &str, decoded: &str, result: &mut ValidationResult) {
    if has_traversal(input) || has_traversal(decoded) {
        result.error("contains a path traversal sequence");
    }

    let lowered_input = input.to_ascii_lowercase();
    let lowered_decoded = decoded.to_ascii_lowercase();
    if let Some(scheme) = DANGEROUS_SCHEMES
        .iter()
        .find(|scheme| lowered_decoded.contains(*scheme) || lowered_input.contains(*scheme))
    {
        result.error(format!("contains dangerous scheme `{}`", scheme));
    }
}

fn has_traversal(input: &str) -> bool {
    TRAVERSAL_SEQUENCES.iter().any(|seq| input.contains(seq))
        || input.split(['/', '\\']).any(|segment| segment == "..")
}

fn remove_ignore_ascii_case(haystack: &str, needle: &str) -> String {
    let lowered = haystack.to_ascii_lowercase();
    let mut out = String::with_capacity(haystack.len());
    let mut cursor = 0;

    // ASCII lowercasing keeps byte offsets aligned with the original
    while let Some(found) = lowered[cursor..].find(needle) {
        out.push_str(&haystack[cursor..cursor + found]);
        cursor += found + needle.len();
    }
    out.push_str(&haystack[cursor..]);
    out
}

// ============================================================================
// Default-limit shorthands
// ============================================================================

/// [`UrlValidator::validate_path`] with the default limits
pub fn validate_path(path: &str) -> ValidationResult {
    UrlValidator::default().validate_path(path)
}

/// [`UrlValidator::validate_route_parameter`] with the default limits
pub fn validate_route_parameter(value: &str, name: &str) -> ValidationResult {
    UrlValidator::default().validate_route_parameter(value, name)
}

/// [`UrlValidator::validate_query_string`] with the default limits
pub fn validate_query_string(query: &str) -> ValidationResult {
    UrlValidator::default().validate_query_string(query)
}

/// [`UrlValidator::sanitize_parameter`] with the default limits
pub fn sanitize_parameter(value: &str) -> String {
    UrlValidator::default().sanitize_parameter(value)
}

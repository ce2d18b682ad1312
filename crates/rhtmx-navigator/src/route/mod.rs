/// Route module: declared routes, compiled entries and the template compiler
///
/// Hosts describe their routes with [`RouteDefinition`] (an explicit,
/// startup-time registration list) and the [`RouteCompiler`] turns them into
/// immutable [`RouteEntry`] values.
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub mod compiler;
pub mod segment;

pub use compiler::RouteCompiler;
pub use segment::{
    classify_segment, parse_param_with_constraint, ParameterSegment, PatternSegmentType,
    RouteSegment, SegmentKind,
};

// ============================================================================
// View handles
// ============================================================================

/// Opaque handle to the view a route renders
///
/// The navigator never inspects it; the renderer uses it to pick a view.
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::ViewHandle;
///
/// struct UserProfile;
///
/// let handle = ViewHandle::of::<UserProfile>();
/// assert!(handle.name().ends_with("UserProfile"));
/// assert_eq!(ViewHandle::named("home"), ViewHandle::named("home"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewHandle(Arc<str>);

impl ViewHandle {
    /// Handle identified by a view type
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self(Arc::from(std::any::type_name::<T>()))
    }

    /// Handle identified by an arbitrary stable key
    pub fn named(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ViewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Declarations
// ============================================================================

/// Secondary template declared for a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasDefinition {
    pub template: String,
    pub priority: i32,
    pub redirect_to_primary: bool,
}

impl AliasDefinition {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            priority: 0,
            redirect_to_primary: false,
        }
    }

    /// Higher priorities are tried first among the aliases of one route
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// A match on this alias redirects to the canonical primary URL
    pub fn redirect_to_primary(mut self) -> Self {
        self.redirect_to_primary = true;
        self
    }
}

/// A route as declared by the host application
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::{AliasDefinition, RouteDefinition, ViewHandle};
///
/// let route = RouteDefinition::new("/users/{id:int}", ViewHandle::named("user"))
///     .with_name("user.profile")
///     .with_loader("users.load")
///     .with_meta("requires_auth", "true")
///     .with_alias(AliasDefinition::new("/u/{id:int}").redirect_to_primary());
///
/// assert_eq!(route.name.as_deref(), Some("user.profile"));
/// assert_eq!(route.aliases.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct RouteDefinition {
    pub template: String,
    pub view: ViewHandle,
    pub name: Option<String>,
    pub data_loader: Option<String>,
    pub metadata: HashMap<String, String>,
    pub aliases: Vec<AliasDefinition>,
}

impl RouteDefinition {
    pub fn new(template: impl Into<String>, view: ViewHandle) -> Self {
        Self {
            template: template.into(),
            view,
            name: None,
            data_loader: None,
            metadata: HashMap::new(),
            aliases: Vec::new(),
        }
    }

    /// Sets a logical name used for URL generation
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the stable key of the data loader the host resolves for this route
    pub fn with_loader(mut self, key: impl Into<String>) -> Self {
        self.data_loader = Some(key.into());
        self
    }

    /// Sets a metadata key-value pair (consumed by middleware)
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Sets multiple metadata entries at once
    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata.extend(metadata);
        self
    }

    pub fn with_alias(mut self, alias: AliasDefinition) -> Self {
        self.aliases.push(alias);
        self
    }

    /// Adds several plain aliases (priority 0, no redirect)
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases
            .extend(aliases.into_iter().map(AliasDefinition::new));
        self
    }
}

// ============================================================================
// Compiled entries
// ============================================================================

/// Compiled alias of a route entry
///
/// `priority` only orders the aliases of the entry that owns them. Two
/// different entries competing for the same path are still decided by table
/// order, whatever their aliases' priorities.
#[derive(Debug, Clone)]
pub struct RouteAlias {
    pub template: Vec<RouteSegment>,
    pub source: String,
    pub priority: i32,
    pub redirect_to_primary: bool,
}

/// A compiled route; immutable once the table is built
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub template: Vec<RouteSegment>,
    /// Template as declared, kept for URL generation
    pub source: String,
    pub view: ViewHandle,
    pub name: Option<String>,
    pub data_loader: Option<String>,
    pub metadata: HashMap<String, String>,
    /// Sorted by descending priority
    pub aliases: Vec<RouteAlias>,
}

impl RouteEntry {
    /// Number of template segments; the table's specificity key
    pub fn segment_count(&self) -> usize {
        self.template.len()
    }

    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.template.iter().filter_map(RouteSegment::parameter_name)
    }

    /// Gets a metadata value by key
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_navigator::{RouteCompiler, RouteDefinition, ViewHandle};
    ///
    /// let table = RouteCompiler::default()
    ///     .build_table(vec![
    ///         RouteDefinition::new("/admin", ViewHandle::named("admin"))
    ///             .with_meta("role", "admin"),
    ///     ])
    ///     .unwrap();
    ///
    /// let entry = &table.entries()[0];
    /// assert_eq!(entry.get_meta("role"), Some("admin"));
    /// assert!(!entry.has_meta("title"));
    /// ```
    pub fn get_meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    pub fn has_meta(&self, key: &str) -> bool {
        self.metadata.contains_key(key)
    }
}

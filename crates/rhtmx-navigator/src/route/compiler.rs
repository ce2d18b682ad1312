/// Route template compiler
///
/// Turns declared template strings such as `/users/{id:int}` into ordered
/// [`RouteSegment`] arrays, and whole declaration lists into a
/// specificity-sorted [`RouteTable`].
use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use super::segment::{classify_segment, ParameterSegment, PatternSegmentType, RouteSegment};
use super::{RouteAlias, RouteDefinition, RouteEntry};
use crate::constraint::ConstraintRegistry;
use crate::error::CompileError;
use crate::table::RouteTable;

/// Fold accumulator for compiling one template
#[derive(Default)]
struct CompileState {
    segments: Vec<RouteSegment>,
    names: HashSet<String>,
    catch_all: Option<String>,
}

/// Compiles templates against an explicit constraint mapping
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::RouteCompiler;
///
/// let compiler = RouteCompiler::default();
/// let segments = compiler.compile("/users/{id:int}/posts/{*rest}").unwrap();
///
/// assert_eq!(segments.len(), 4);
/// assert_eq!(segments[0].literal_text(), Some("users"));
/// assert_eq!(segments[1].constraint(), Some("int"));
/// assert!(segments[1].converter().is_some());
/// assert!(segments[3].is_catch_all());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteCompiler {
    constraints: Arc<ConstraintRegistry>,
}

impl RouteCompiler {
    pub fn new(constraints: ConstraintRegistry) -> Self {
        Self {
            constraints: Arc::new(constraints),
        }
    }

    pub fn constraints(&self) -> &Arc<ConstraintRegistry> {
        &self.constraints
    }

    /// Compiles a single template into segments
    ///
    /// Empty path pieces are discarded, so `/`, `` and `//` all compile to
    /// an empty template.
    pub fn compile(&self, template: &str) -> Result<Vec<RouteSegment>, CompileError> {
        template
            .split('/')
            .filter(|s| !s.is_empty())
            .try_fold(CompileState::default(), |state, raw| {
                self.process_segment(template, state, raw)
            })
            .map(|state| state.segments)
    }

    fn process_segment(
        &self,
        template: &str,
        mut state: CompileState,
        raw: &str,
    ) -> Result<CompileState, CompileError> {
        if let Some(name) = state.catch_all.take() {
            return Err(CompileError::CatchAllNotTerminal {
                template: template.to_string(),
                name,
            });
        }

        let segment = match classify_segment(raw) {
            PatternSegmentType::Static(text) => {
                if text.contains(['{', '}']) {
                    return Err(CompileError::UnbalancedBraces {
                        template: template.to_string(),
                        segment: raw.to_string(),
                    });
                }
                RouteSegment::literal(text)
            }
            PatternSegmentType::Required(name, kind) => {
                self.parameter(template, raw, &mut state, name, kind, false, false)?
            }
            PatternSegmentType::Optional(name, kind) => {
                self.parameter(template, raw, &mut state, name, kind, true, false)?
            }
            PatternSegmentType::CatchAll(name, Some(constraint)) => {
                return Err(CompileError::ConstrainedCatchAll {
                    template: template.to_string(),
                    name,
                    constraint,
                });
            }
            PatternSegmentType::CatchAll(name, kind) => {
                state.catch_all = Some(name.clone());
                self.parameter(template, raw, &mut state, name, kind, true, true)?
            }
        };

        state.segments.push(segment);
        Ok(state)
    }

    #[allow(clippy::too_many_arguments)]
    fn parameter(
        &self,
        template: &str,
        raw: &str,
        state: &mut CompileState,
        name: String,
        constraint: Option<String>,
        optional: bool,
        catch_all: bool,
    ) -> Result<RouteSegment, CompileError> {
        let inner = &raw[1..raw.len() - 1];
        if inner.contains(['{', '}']) {
            return Err(CompileError::UnbalancedBraces {
                template: template.to_string(),
                segment: raw.to_string(),
            });
        }

        if name.is_empty() {
            return Err(CompileError::EmptyParameterName {
                template: template.to_string(),
                segment: raw.to_string(),
            });
        }

        if !state.names.insert(name.clone()) {
            return Err(CompileError::DuplicateParameter {
                template: template.to_string(),
                name,
            });
        }

        let converter = constraint.as_deref().and_then(|kind| {
            let converter = self.constraints.get(kind).cloned();
            if converter.is_none() {
                debug!(
                    "Unknown constraint `{}` on `{}` in `{}`; treating it as a string",
                    kind, name, template
                );
            }
            converter
        });

        Ok(RouteSegment::parameter(ParameterSegment {
            name,
            catch_all,
            optional,
            constraint,
            converter,
        }))
    }

    /// Compiles one declared route and its aliases
    ///
    /// A malformed primary template is an error; a malformed alias is
    /// skipped with a warning.
    pub fn compile_definition(
        &self,
        definition: RouteDefinition,
    ) -> Result<RouteEntry, CompileError> {
        let template = self.compile(&definition.template)?;

        let mut aliases: Vec<RouteAlias> = definition
            .aliases
            .into_iter()
            .filter_map(|alias| match self.compile(&alias.template) {
                Ok(segments) => Some(RouteAlias {
                    template: segments,
                    source: alias.template,
                    priority: alias.priority,
                    redirect_to_primary: alias.redirect_to_primary,
                }),
                Err(err) => {
                    warn!(
                        "Skipping alias `{}` of route `{}`: {}",
                        alias.template, definition.template, err
                    );
                    None
                }
            })
            .collect();

        // Stable: equal priorities keep declaration order
        aliases.sort_by_key(|alias| std::cmp::Reverse(alias.priority));

        Ok(RouteEntry {
            template,
            source: definition.template,
            view: definition.view,
            name: definition.name,
            data_loader: definition.data_loader,
            metadata: definition.metadata,
            aliases,
        })
    }

    /// Compiles every declared route into a specificity-sorted table
    pub fn build_table<I>(&self, definitions: I) -> Result<RouteTable, CompileError>
    where
        I: IntoIterator<Item = RouteDefinition>,
    {
        let entries = definitions
            .into_iter()
            .map(|definition| self.compile_definition(definition))
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Compiled route table with {} entries", entries.len());
        Ok(RouteTable::new(entries))
    }
}

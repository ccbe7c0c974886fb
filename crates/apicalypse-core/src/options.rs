//! Filter options and their composition.
//!
//! Each constructor in this module captures its arguments in a
//! [`FilterOption`]. Nothing is validated until the option is applied to a
//! [`FilterSet`], at which point the option either writes exactly one filter
//! or returns an error and writes nothing. Options are plain values, so a
//! composed option can be stored and reused across any number of queries.
//!
//! See <https://apicalypse.io/syntax/> for the syntax each filter expects.

use crate::error::{Error, Result};
use crate::filter::{FilterName, FilterSet};
use crate::whitespace;
use tracing::debug;

/// A deferred, validated write of one filter (or a sequence of them).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    kind: OptionKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum OptionKind {
    Fields(Vec<String>),
    Exclude(Vec<String>),
    Where(Vec<String>),
    Limit(i64),
    Offset(i64),
    Sort { field: String, order: String },
    Search { column: String, term: String },
    Composite(Vec<Option<FilterOption>>),
}

impl FilterOption {
    const fn new(kind: OptionKind) -> Self {
        Self { kind }
    }

    /// Filter written by this option, or `None` for a composed option.
    #[must_use]
    pub const fn filter_name(&self) -> Option<FilterName> {
        match &self.kind {
            OptionKind::Fields(_) => Some(FilterName::Fields),
            OptionKind::Exclude(_) => Some(FilterName::Exclude),
            OptionKind::Where(_) => Some(FilterName::Where),
            OptionKind::Limit(_) => Some(FilterName::Limit),
            OptionKind::Offset(_) => Some(FilterName::Offset),
            OptionKind::Sort { .. } => Some(FilterName::Sort),
            OptionKind::Search { .. } => Some(FilterName::Search),
            OptionKind::Composite(_) => None,
        }
    }

    /// Returns true if this option was built with [`compose`].
    #[must_use]
    pub const fn is_composite(&self) -> bool {
        matches!(self.kind, OptionKind::Composite(_))
    }

    /// Validate the captured arguments and write the result into `filters`.
    ///
    /// A composed option applies its members in order and stops at the first
    /// error. Members applied before the failure stay applied.
    ///
    /// # Errors
    ///
    /// Returns the validation error of the failing option, or
    /// [`Error::NilOption`] if a composed option contains an absent member.
    pub fn apply(&self, filters: &mut FilterSet) -> Result<()> {
        match &self.kind {
            OptionKind::Fields(names) => {
                let value = field_list(FilterName::Fields, names)?;
                filters.set(FilterName::Fields, value)
            }
            OptionKind::Exclude(names) => {
                let value = field_list(FilterName::Exclude, names)?;
                filters.set(FilterName::Exclude, value)
            }
            OptionKind::Where(predicates) => {
                require_values(FilterName::Where, predicates, "predicate")?;
                filters.set(FilterName::Where, predicates.join(" & "))
            }
            OptionKind::Limit(n) => {
                let value = non_negative(FilterName::Limit, *n)?;
                filters.set(FilterName::Limit, value)
            }
            OptionKind::Offset(n) => {
                let value = non_negative(FilterName::Offset, *n)?;
                filters.set(FilterName::Offset, value)
            }
            OptionKind::Sort { field, order } => {
                if whitespace::is_blank(field) {
                    return Err(Error::BlankArgument("field"));
                }
                if whitespace::is_blank(order) {
                    return Err(Error::BlankArgument("order"));
                }
                filters.set(FilterName::Sort, format!("{field} {order}"))
            }
            OptionKind::Search { column, term } => {
                if whitespace::is_blank(term) {
                    return Err(Error::BlankArgument("term"));
                }
                let value = if whitespace::is_blank(column) {
                    format!("\"{term}\"")
                } else {
                    format!("{column} \"{term}\"")
                };
                filters.set(FilterName::Search, value)
            }
            OptionKind::Composite(members) => {
                ensure_present(members)?;
                members
                    .iter()
                    .flatten()
                    .try_for_each(|member| member.apply(filters))
            }
        }
    }

    fn contains_absent(&self) -> bool {
        match &self.kind {
            OptionKind::Composite(members) => members
                .iter()
                .any(|member| member.as_ref().map_or(true, Self::contains_absent)),
            _ => false,
        }
    }
}

/// Include only the named fields in the results.
///
/// The names are joined with `,` and all whitespace is stripped, so
/// `fields(["name", "release date"])` stores `name,releasedate`.
pub fn fields<I, S>(names: I) -> FilterOption
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    FilterOption::new(OptionKind::Fields(collect(names)))
}

/// Exclude the named fields from the results.
pub fn exclude<I, S>(names: I) -> FilterOption
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    FilterOption::new(OptionKind::Exclude(collect(names)))
}

/// Filter results with custom predicates, AND'd together with ` & `.
///
/// Predicates are passed through verbatim.
pub fn where_clause<I, S>(predicates: I) -> FilterOption
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    FilterOption::new(OptionKind::Where(collect(predicates)))
}

/// Limit the number of results returned.
#[must_use]
pub const fn limit(n: i64) -> FilterOption {
    FilterOption::new(OptionKind::Limit(n))
}

/// Skip the first `n` results.
#[must_use]
pub const fn offset(n: i64) -> FilterOption {
    FilterOption::new(OptionKind::Offset(n))
}

/// Sort results by `field` in the given order (usually `asc` or `desc`).
pub fn sort(field: impl Into<String>, order: impl Into<String>) -> FilterOption {
    FilterOption::new(OptionKind::Sort {
        field: field.into(),
        order: order.into(),
    })
}

/// Search for `term`, optionally restricted to `column`.
///
/// A blank column searches the API's default column.
pub fn search(column: impl Into<String>, term: impl Into<String>) -> FilterOption {
    FilterOption::new(OptionKind::Search {
        column: column.into(),
        term: term.into(),
    })
}

/// Combine options into one reusable option.
///
/// Applying the result is equivalent to applying each member in order.
pub fn compose<I>(options: I) -> FilterOption
where
    I: IntoIterator,
    I::Item: Into<Option<FilterOption>>,
{
    FilterOption::new(OptionKind::Composite(
        options.into_iter().map(Into::into).collect(),
    ))
}

/// Apply options to `filters` in order, stopping at the first error.
///
/// Absent options are detected before anything is written. Filters written
/// before a validation failure remain in the set; callers should discard the
/// set on error.
///
/// # Errors
///
/// Returns [`Error::NilOption`] if any option (or composed member) is absent,
/// otherwise the first validation error.
pub fn apply_all<I>(filters: &mut FilterSet, options: I) -> Result<()>
where
    I: IntoIterator,
    I::Item: Into<Option<FilterOption>>,
{
    let options: Vec<Option<FilterOption>> = options.into_iter().map(Into::into).collect();
    ensure_present(&options)?;

    for option in options.iter().flatten() {
        option.apply(filters)?;
    }

    debug!(
        options = options.len(),
        filters = filters.len(),
        "applied filter options"
    );
    Ok(())
}

fn ensure_present(options: &[Option<FilterOption>]) -> Result<()> {
    let absent = options
        .iter()
        .any(|option| option.as_ref().map_or(true, FilterOption::contains_absent));

    if absent {
        Err(Error::NilOption)
    } else {
        Ok(())
    }
}

fn collect<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(Into::into).collect()
}

fn require_values(name: FilterName, values: &[String], argument: &'static str) -> Result<()> {
    if values.is_empty() {
        return Err(Error::MissingInput(name));
    }
    if values.iter().any(|value| whitespace::is_blank(value)) {
        return Err(Error::BlankArgument(argument));
    }
    Ok(())
}

fn field_list(name: FilterName, names: &[String]) -> Result<String> {
    require_values(name, names, "field")?;
    Ok(whitespace::remove(&names.join(",")))
}

fn non_negative(filter: FilterName, value: i64) -> Result<String> {
    if value < 0 {
        return Err(Error::NegativeInput { filter, value });
    }
    Ok(value.to_string())
}

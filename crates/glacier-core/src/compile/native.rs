use crate::value::{Boost, Float64};
use std::fmt;

///
/// NativeQuery
///
/// Engine-level query produced by compilation. Immutable once built and
/// compared structurally.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct NativeQuery {
    pub boost: Boost,
    pub kind: NativeQueryKind,
}

impl NativeQuery {
    #[must_use]
    pub const fn new(kind: NativeQueryKind) -> Self {
        Self {
            boost: Boost::DEFAULT,
            kind,
        }
    }

    #[must_use]
    pub const fn match_all() -> Self {
        Self::new(NativeQueryKind::MatchAll)
    }

    #[must_use]
    pub const fn match_none() -> Self {
        Self::new(NativeQueryKind::MatchNone)
    }

    #[must_use]
    pub const fn with_boost(mut self, boost: Boost) -> Self {
        self.boost = boost;
        self
    }

    #[must_use]
    pub const fn boost(&self) -> Boost {
        self.boost
    }

    #[must_use]
    pub const fn kind(&self) -> &NativeQueryKind {
        &self.kind
    }
}

impl fmt::Display for NativeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NativeQueryKind::MatchAll => f.write_str("*:*")?,
            NativeQueryKind::MatchNone => f.write_str("-*:*")?,
            NativeQueryKind::Term { field, term } => write!(f, "{field}:{term}")?,
            NativeQueryKind::Terms { field, terms } => {
                write!(f, "{field}:(")?;
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{term}")?;
                }
                f.write_str(")")?;
            }
            NativeQueryKind::Prefix { field, prefix, .. } => write!(f, "{field}:{prefix}*")?,
            NativeQueryKind::Range {
                field,
                lower,
                upper,
            } => {
                let open = if matches!(lower, NativeBound::Excluded(_)) { '{' } else { '[' };
                let close = if matches!(upper, NativeBound::Excluded(_)) { '}' } else { ']' };
                write!(f, "{field}:{open}{lower} TO {upper}{close}")?;
            }
            NativeQueryKind::FieldExists { field } => write!(f, "_exists_:{field}")?,
            NativeQueryKind::Boolean { clauses, .. } => {
                f.write_str("(")?;
                for (i, clause) in clauses.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}{}", clause.occur.prefix(), clause.query)?;
                }
                f.write_str(")")?;
            }
            NativeQueryKind::ConstantScore { inner } => write!(f, "ConstantScore({inner})")?,
        }

        if !self.boost.is_default() {
            write!(f, "^{}", self.boost)?;
        }

        Ok(())
    }
}

///
/// NativeQueryKind
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum NativeQueryKind {
    MatchAll,
    MatchNone,
    Term {
        field: String,
        term: NativeTerm,
    },
    Terms {
        field: String,
        terms: Vec<NativeTerm>,
    },
    Prefix {
        field: String,
        prefix: String,
        rewrite: Option<String>,
    },
    Range {
        field: String,
        lower: NativeBound,
        upper: NativeBound,
    },
    FieldExists {
        field: String,
    },
    Boolean {
        clauses: Vec<NativeClause>,
        minimum_should_match: Option<u32>,
        disable_coord: bool,
    },
    ConstantScore {
        inner: Box<NativeQuery>,
    },
}

///
/// NativeTerm
///
/// Typed term after field coercion. Dates are epoch milliseconds.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum NativeTerm {
    Text(String),
    Long(i64),
    Double(Float64),
    Bool(bool),
    DateMillis(i64),
}

impl fmt::Display for NativeTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(v) => f.write_str(v),
            Self::Long(v) | Self::DateMillis(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
        }
    }
}

///
/// NativeBound
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum NativeBound {
    Unbounded,
    Included(NativeTerm),
    Excluded(NativeTerm),
}

impl NativeBound {
    #[must_use]
    pub const fn term(&self) -> Option<&NativeTerm> {
        match self {
            Self::Unbounded => None,
            Self::Included(term) | Self::Excluded(term) => Some(term),
        }
    }
}

impl fmt::Display for NativeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.term() {
            None => f.write_str("*"),
            Some(term) => write!(f, "{term}"),
        }
    }
}

///
/// Occur
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Occur {
    Must,
    Filter,
    Should,
    MustNot,
}

impl Occur {
    const fn prefix(self) -> &'static str {
        match self {
            Self::Must => "+",
            Self::Filter => "#",
            Self::Should => "",
            Self::MustNot => "-",
        }
    }
}

///
/// NativeClause
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct NativeClause {
    pub occur: Occur,
    pub query: NativeQuery,
}

impl NativeClause {
    #[must_use]
    pub const fn must(query: NativeQuery) -> Self {
        Self {
            occur: Occur::Must,
            query,
        }
    }

    #[must_use]
    pub const fn filter(query: NativeQuery) -> Self {
        Self {
            occur: Occur::Filter,
            query,
        }
    }

    #[must_use]
    pub const fn should(query: NativeQuery) -> Self {
        Self {
            occur: Occur::Should,
            query,
        }
    }

    #[must_use]
    pub const fn must_not(query: NativeQuery) -> Self {
        Self {
            occur: Occur::MustNot,
            query,
        }
    }
}

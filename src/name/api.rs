use std::fmt;

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::error::{LazyError, LazyResult};

#[derive(Parser)]
#[grammar = "name/dotted_name.pest"] // relative to src
pub struct NameParser;

/// An absolute dotted name such as `pkg.sub.leaf`.
///
/// Every value of this type has passed the grammar, so it always holds at
/// least one segment and never an empty one.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DottedName(String);

impl DottedName {
    /// Parse an absolute name. Relative names are rejected here; use
    /// [`DottedName::resolve`] with an anchor for those.
    pub fn parse(name: &str) -> LazyResult<Self> {
        Self::resolve(name, None)
    }

    /// Turn `name` into an absolute name, using `anchor` for relative forms.
    ///
    /// A name with `k` leading dots climbs `k - 1` levels up from the anchor
    /// before appending the rest: `.x` under `pkg` is `pkg.x`, `..x` under
    /// `a.b` is `a.x`.
    pub fn resolve(name: &str, anchor: Option<&str>) -> LazyResult<Self> {
        let top = parse_top(name)?;
        match top.as_rule() {
            Rule::absolute => {
                if let Some(anchor) = anchor {
                    return Err(LazyError::invalid(format!(
                        "expected a relative name when an anchor is provided, got {:?} (anchor {:?})",
                        name, anchor
                    )));
                }
                Ok(DottedName(top.as_str().to_string()))
            }
            Rule::relative => {
                let anchor = anchor.ok_or_else(|| {
                    LazyError::invalid(format!("relative name {:?} needs an anchor", name))
                })?;
                let anchor = DottedName::parse(anchor)?;
                let mut inner = top.into_inner();
                let climb = inner.next().map(|dots| dots.as_str().len()).unwrap_or(1) - 1;
                let rest = inner.next().map(|path| path.as_str().to_string());

                let mut base: Vec<&str> = anchor.segments().collect();
                if climb >= base.len() {
                    return Err(LazyError::invalid(format!(
                        "relative name {:?} climbs past the top of anchor {:?}",
                        name,
                        anchor.as_str()
                    )));
                }
                base.truncate(base.len() - climb);
                let mut joined = base.join(".");
                if let Some(rest) = rest {
                    joined.push('.');
                    joined.push_str(&rest);
                }
                Ok(DottedName(joined))
            }
            _ => Err(LazyError::invalid(format!("malformed name {:?}", name))),
        }
    }

    /// Builds `self.child` from an already-validated single segment or a
    /// member name. No grammar check happens here; lookups with an odd
    /// member name simply miss.
    pub(crate) fn child(&self, segment: &str) -> DottedName {
        DottedName(format!("{}.{}", self.0, segment))
    }

    /// Append a relative path (`b` or `b.c`) to this name.
    pub fn join(&self, path: &str) -> LazyResult<DottedName> {
        let path = DottedName::parse(path)?;
        Ok(self.child(path.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// The last segment.
    pub fn leaf(&self) -> &str {
        match self.0.rfind('.') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// The last segment as a one-segment name.
    pub(crate) fn leaf_name(&self) -> DottedName {
        DottedName(self.leaf().to_string())
    }

    /// The first segment.
    pub fn head(&self) -> &str {
        match self.0.find('.') {
            Some(idx) => &self.0[..idx],
            None => &self.0,
        }
    }

    pub fn parent(&self) -> Option<DottedName> {
        self.0
            .rfind('.')
            .map(|idx| DottedName(self.0[..idx].to_string()))
    }

    /// Every prefix of this name, root first and `self` last.
    pub fn family(&self) -> Vec<DottedName> {
        let mut family = Vec::with_capacity(self.depth());
        let mut current = String::with_capacity(self.0.len());
        for segment in self.segments() {
            if !current.is_empty() {
                current.push('.');
            }
            current.push_str(segment);
            family.push(DottedName(current.clone()));
        }
        family
    }

    pub fn is_ancestor_of(&self, other: &DottedName) -> bool {
        other.0.len() > self.0.len()
            && other.0.starts_with(&self.0)
            && other.0.as_bytes()[self.0.len()] == b'.'
    }
}

impl fmt::Display for DottedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DottedName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn parse_top(name: &str) -> LazyResult<Pair<'_, Rule>> {
    let mut pairs = NameParser::parse(Rule::name, name)
        .map_err(|e| LazyError::invalid(format!("malformed name {:?}: {}", name, e)))?;
    pairs
        .next()
        .and_then(|top| top.into_inner().next())
        .ok_or_else(|| LazyError::invalid(format!("malformed name {:?}", name)))
}

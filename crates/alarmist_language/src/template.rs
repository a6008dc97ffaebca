//! Alarm message templates.
//!
//! A template is plain text with `${cond.$x}` placeholders. Parsing strips
//! the placeholders and remembers where each one goes; rendering resolves
//! them against the alarm vector of the last firing and inserts the values
//! from right to left so earlier offsets stay valid.
//!
//! A grouped function leaves `Any` in the alarm vector. Such a cell is
//! resolved to the most recently hit cell in its range, so every
//! placeholder of one condition describes the same cell.
//!
//! | Placeholder     | Value                                         |
//! |-----------------|-----------------------------------------------|
//! | `${c.$s}`       | source name of `c`'s alarm cell               |
//! | `${c.$t}`       | target name of `c`'s alarm cell               |
//! | `${c.$m}`       | body of the cell's latest message             |
//! | `${c.$g1}`..`9` | capture group of the cell's latest message    |

use std::fmt;

use alarmist_foundation::{DomainVector, Error, NameKind, Result};

use crate::view::EvalContext;

/// What a placeholder resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Placeholder {
    /// `$s`
    Source,
    /// `$t`
    Target,
    /// `$m`
    Message,
    /// `$gN`, capture group `N` in `1..=9`
    Group(usize),
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("$s"),
            Self::Target => f.write_str("$t"),
            Self::Message => f.write_str("$m"),
            Self::Group(n) => write!(f, "$g{n}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Insertion {
    offset: usize,
    condition: usize,
    placeholder: Placeholder,
}

/// A parsed alarm message template.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AlarmTemplate {
    plain: String,
    stripped: String,
    insertions: Vec<Insertion>,
}

fn parse_reference(
    reference: &str,
    template: &str,
    resolve: &impl Fn(&str) -> Option<usize>,
) -> Result<(usize, Placeholder)> {
    let bad = || Error::parse(format!("malformed placeholder '${{{reference}}}'"), template);
    let (name, arg) = reference.rsplit_once('.').ok_or_else(bad)?;
    let placeholder = match arg {
        "$s" => Placeholder::Source,
        "$t" => Placeholder::Target,
        "$m" => Placeholder::Message,
        _ => {
            let digit = arg.strip_prefix("$g").ok_or_else(bad)?;
            match digit.as_bytes() {
                [d @ b'1'..=b'9'] => Placeholder::Group(usize::from(d - b'0')),
                _ => return Err(bad()),
            }
        }
    };
    let condition = resolve(name).ok_or_else(|| Error::unknown_name(NameKind::Condition, name))?;
    Ok((condition, placeholder))
}

impl AlarmTemplate {
    /// Parses a template. `resolve` maps a condition name to its rule-local index.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` for an unterminated or malformed placeholder and
    /// `UnknownName` for a condition the rule does not reference.
    pub fn parse(template: &str, resolve: impl Fn(&str) -> Option<usize>) -> Result<Self> {
        let mut stripped = String::with_capacity(template.len());
        let mut insertions = Vec::new();
        let mut rest = template;

        while let Some(open) = rest.find("${") {
            stripped.push_str(&rest[..open]);
            let after = &rest[open + 2..];
            let close = after
                .find('}')
                .ok_or_else(|| Error::parse("unterminated placeholder", template))?;
            let (condition, placeholder) = parse_reference(&after[..close], template, &resolve)?;
            insertions.push(Insertion {
                offset: stripped.len(),
                condition,
                placeholder,
            });
            rest = &after[close + 1..];
        }
        stripped.push_str(rest);

        Ok(Self {
            plain: template.to_string(),
            stripped,
            insertions,
        })
    }

    /// The template as written.
    #[must_use]
    pub fn plain(&self) -> &str {
        &self.plain
    }

    /// True if the template has no placeholders.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.insertions.is_empty()
    }

    /// Rule-local indices of the conditions the template reads.
    pub fn conditions(&self) -> impl Iterator<Item = usize> + '_ {
        self.insertions.iter().map(|i| i.condition)
    }

    /// Renders against the alarm vector of the last firing.
    ///
    /// # Errors
    ///
    /// Fails if a placeholder's cell cannot be resolved, e.g. because the
    /// alarm vector never visited that condition.
    pub fn render(&self, ctx: &EvalContext<'_>, alarm: &DomainVector) -> Result<String> {
        let mut result = self.stripped.clone();
        for insertion in self.insertions.iter().rev() {
            let pair = alarm
                .get(insertion.condition)
                .ok_or_else(|| Error::size_mismatch(alarm.len(), insertion.condition + 1))?;
            let map = ctx.condition(insertion.condition)?.hitmap();
            let pair = map.resolve_any(pair);
            let value = match insertion.placeholder {
                Placeholder::Source => map.source_name(pair.source)?,
                Placeholder::Target => map.target_name(pair.target)?,
                Placeholder::Message => map.latest_message(pair)?.map_or("", |m| m.body.as_str()),
                Placeholder::Group(n) => map.message_group(pair, n)?.unwrap_or(""),
            };
            result.insert_str(insertion.offset, value);
        }
        Ok(result)
    }
}

impl fmt::Display for AlarmTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.plain)
    }
}

//! Structural decoder from dump bytes to an [`Archive`].
//!
//! The element tree from [`markup::parse`] is walked top-down. Each leaf is
//! handed to the [`Coerce`] rule its field is declared with; failures carry
//! the element path (`rrd/rra[1]/database/row[3]/v[0]`) so malformed input
//! can be located. Elements the schema does not name are ignored.
//!
//! When a scalar element appears more than once the last occurrence is used;
//! repeated `params`, `cdp_prep` or `database` blocks are merged in document
//! order.

use tracing::debug;

use crate::coerce::{Coerce, Float, RawText, Sample, Seconds, SpacedInt, TrimmedText, UnixTime};
use crate::error::{FieldError, Result, StructuralError};
use crate::markup::{self, Element};
use crate::schema::{Archive, ConsolidationState, DataSource, Params, RoundRobinArchive, Row};

/// Name of the dump's root element.
const ROOT: &str = "rrd";

/// Decodes a complete `rrdtool dump` buffer.
///
/// # Errors
///
/// Returns [`RrdError::Structural`](crate::RrdError::Structural) when the
/// buffer is not well-formed or a required element is missing, and
/// [`RrdError::Field`](crate::RrdError::Field) when a leaf cannot be coerced.
/// Unknown sample values are not errors.
///
/// # Example
///
/// ```rust
/// let dump = br#"<rrd>
///   <version>0003</version><step>300</step><lastupdate>1700000000</lastupdate>
///   <ds>
///     <name> load </name><type> GAUGE </type><minimal_heartbeat>600</minimal_heartbeat>
///     <min>0</min><max>NaN</max><last_ds>1</last_ds><value>0</value>
///     <unknown_sec> 0 </unknown_sec>
///   </ds>
/// </rrd>"#;
///
/// let archive = rrdump::decode(dump)?;
/// assert_eq!(archive.data_sources[0].name, "load");
/// assert!(archive.data_sources[0].max.is_unknown());
/// # Ok::<(), rrdump::RrdError>(())
/// ```
pub fn decode(bytes: &[u8]) -> Result<Archive> {
    let root = markup::parse(bytes)?;
    if root.name() != ROOT {
        return Err(StructuralError::UnexpectedRoot {
            found: root.name().to_string(),
        }
        .into());
    }

    let archive = Node::root(&root).archive()?;
    debug!(
        data_sources = archive.data_sources.len(),
        archives = archive.archives.len(),
        rows = archive.archives.iter().map(|a| a.rows.len()).sum::<usize>(),
        "decoded rrd dump"
    );
    Ok(archive)
}

/// An element together with its path from the root.
struct Node<'a> {
    element: &'a Element,
    path: String,
}

impl<'a> Node<'a> {
    fn root(element: &'a Element) -> Self {
        Self {
            element,
            path: element.name().to_string(),
        }
    }

    /// The last child named `name`, if present.
    fn optional(&self, name: &str) -> Option<Node<'a>> {
        self.element.children_named(name).last().map(|element| Node {
            element,
            path: format!("{}/{name}", self.path),
        })
    }

    /// The last child named `name`.
    fn required(&self, name: &str) -> Result<Node<'a>> {
        self.optional(name).ok_or_else(|| {
            StructuralError::MissingElement {
                path: format!("{}/{name}", self.path),
            }
            .into()
        })
    }

    /// Every child named `name`, indexed in the path by position.
    fn repeated(&self, name: &'a str) -> impl Iterator<Item = Node<'a>> + '_ {
        self.element
            .children_named(name)
            .enumerate()
            .map(move |(i, element)| Node {
                element,
                path: format!("{}/{name}[{i}]", self.path),
            })
    }

    /// Every block named `name`. Blocks are only indexed in the path when
    /// there is more than one.
    fn blocks(&self, name: &'a str) -> Vec<Node<'a>> {
        if self.element.children_named(name).nth(1).is_some() {
            self.repeated(name).collect()
        } else {
            self.optional(name).into_iter().collect()
        }
    }

    /// Every `item` of every `block` child, in document order. At least one
    /// `block` must be present.
    fn merged(&self, block: &'a str, item: &'a str) -> Result<Vec<Node<'a>>> {
        let blocks = self.blocks(block);
        if blocks.is_empty() {
            return Err(StructuralError::MissingElement {
                path: format!("{}/{block}", self.path),
            }
            .into());
        }
        Ok(blocks.iter().flat_map(|b| b.repeated(item)).collect())
    }

    /// Coerces this element's text with rule `C`.
    fn value<C: Coerce>(&self) -> Result<C::Output> {
        let raw = self.element.text();
        C::coerce(raw).map_err(|source| {
            FieldError {
                path: self.path.clone(),
                kind: C::KIND,
                raw: raw.to_string(),
                source,
            }
            .into()
        })
    }

    /// Coerces the required child `name` with rule `C`.
    fn field<C: Coerce>(&self, name: &str) -> Result<C::Output> {
        self.required(name)?.value::<C>()
    }

    fn archive(&self) -> Result<Archive> {
        Ok(Archive {
            version: self.field::<RawText>("version")?,
            step: self.field::<Seconds>("step")?,
            last_update: self.field::<UnixTime>("lastupdate")?,
            data_sources: self
                .repeated("ds")
                .map(|ds| ds.data_source())
                .collect::<Result<_>>()?,
            archives: self
                .repeated("rra")
                .map(|rra| rra.round_robin_archive())
                .collect::<Result<_>>()?,
        })
    }

    fn data_source(&self) -> Result<DataSource> {
        Ok(DataSource {
            name: self.field::<TrimmedText>("name")?,
            kind: self.field::<TrimmedText>("type")?,
            minimal_heartbeat: self.field::<SpacedInt>("minimal_heartbeat")?,
            min: self.field::<Sample>("min")?,
            max: self.field::<Sample>("max")?,
            last_ds: self.field::<SpacedInt>("last_ds")?,
            value: self.field::<Sample>("value")?,
            unknown_sec: self.field::<SpacedInt>("unknown_sec")?,
        })
    }

    fn round_robin_archive(&self) -> Result<RoundRobinArchive> {
        let params = self.blocks("params");
        let params = if params.is_empty() {
            None
        } else {
            let xff = params.iter().rev().find_map(|p| p.optional("xff"));
            Some(Params {
                xff: xff.map(|x| x.value::<Float>()).transpose()?,
            })
        };

        Ok(RoundRobinArchive {
            cf: self.field::<RawText>("cf")?,
            pdp_per_row: self.field::<SpacedInt>("pdp_per_row")?,
            params,
            cdp_prep: self
                .merged("cdp_prep", "ds")?
                .iter()
                .map(|ds| ds.consolidation_state())
                .collect::<Result<_>>()?,
            rows: self
                .merged("database", "row")?
                .iter()
                .map(|row| row.row())
                .collect::<Result<_>>()?,
        })
    }

    fn consolidation_state(&self) -> Result<ConsolidationState> {
        Ok(ConsolidationState {
            primary_value: self.field::<Sample>("primary_value")?,
            secondary_value: self.field::<Sample>("secondary_value")?,
            value: self.field::<Sample>("value")?,
            unknown_datapoints: self.field::<Sample>("unknown_datapoints")?,
        })
    }

    fn row(&self) -> Result<Row> {
        self.repeated("v")
            .map(|v| v.value::<Sample>())
            .collect::<Result<Vec<_>>>()
            .map(Row::new)
    }
}

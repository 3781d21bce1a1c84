//! Interactive selection of metadata types and members against a universe.
//!
//! Each type is in one of three states with respect to the selection: absent, partially
//! present, or fully present (as many members as the universe lists). Toggling a type line moves
//! absent or partial types to full and removes full ones; toggling a member line adds or removes
//! that one member without ever pruning the type entry.

use std::fmt;

use anyhow::Result;

use crate::app::render::ManifestRenderer;
use crate::domain::errors::DomainError;
use crate::domain::model::{ApiVersion, TypeSet};

pub const CHECKED_MARKER: &str = "[√]";
pub const UNCHECKED_MARKER: &str = "[x]";
pub const MEMBER_INDENT: &str = "    ";

/// One row of the quick-panel listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingLine {
    Type { name: String, checked: bool },
    Member { name: String, checked: bool },
}

impl ListingLine {
    pub fn name(&self) -> &str {
        match self {
            Self::Type { name, .. } | Self::Member { name, .. } => name,
        }
    }

    pub fn is_checked(&self) -> bool {
        match self {
            Self::Type { checked, .. } | Self::Member { checked, .. } => *checked,
        }
    }

    pub fn is_member(&self) -> bool {
        matches!(self, Self::Member { .. })
    }
}

/// Display text only; nothing parses it back.
impl fmt::Display for ListingLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.is_checked() {
            CHECKED_MARKER
        } else {
            UNCHECKED_MARKER
        };
        match self {
            Self::Type { name, .. } => write!(f, "{marker}{name}"),
            Self::Member { name, .. } => write!(f, "{MEMBER_INDENT}{marker}{name}"),
        }
    }
}

/// What a listing index refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleTarget {
    Type {
        type_name: String,
        checked: bool,
    },
    Member {
        type_name: String,
        member: String,
        checked: bool,
    },
}

/// Flattened listing of a universe with checked markers from a selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayListing {
    lines: Vec<ListingLine>,
}

impl DisplayListing {
    /// Types in ascending order, each followed by its members. Types without members in the
    /// universe are left out.
    pub fn render(universe: &TypeSet, selection: &TypeSet) -> Self {
        let mut lines = Vec::new();
        for (type_name, members) in universe {
            if members.is_empty() {
                continue;
            }
            lines.push(ListingLine::Type {
                name: type_name.clone(),
                checked: selection.contains_type(type_name),
            });
            lines.extend(members.iter().map(|member| ListingLine::Member {
                name: member.clone(),
                checked: selection.contains_member(type_name, member),
            }));
        }
        Self { lines }
    }

    pub fn lines(&self) -> &[ListingLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ListingLine> {
        self.lines.get(index)
    }

    /// Resolve an index to its type, walking up from member lines to the owning type line.
    pub fn resolve(&self, index: usize) -> Result<ToggleTarget, DomainError> {
        let line = self.lines.get(index).ok_or(DomainError::InvalidSelection {
            index,
            reason: "index out of range",
        })?;

        match line {
            ListingLine::Type { name, checked } => Ok(ToggleTarget::Type {
                type_name: name.clone(),
                checked: *checked,
            }),
            ListingLine::Member { name, checked } => {
                let owner = self.lines[..index]
                    .iter()
                    .rev()
                    .find(|line| !line.is_member())
                    .ok_or(DomainError::InvalidSelection {
                        index,
                        reason: "member line without an owning type",
                    })?;
                Ok(ToggleTarget::Member {
                    type_name: owner.name().to_owned(),
                    member: name.clone(),
                    checked: *checked,
                })
            }
        }
    }
}

/// Apply a toggle at `index`, returning the new selection and its listing.
///
/// The input selection is left untouched; an index that does not resolve is an error and
/// produces nothing.
pub fn toggle(
    listing: &DisplayListing,
    index: usize,
    universe: &TypeSet,
    selection: &TypeSet,
) -> Result<(TypeSet, DisplayListing), DomainError> {
    let target = listing.resolve(index)?;
    let mut next = selection.clone();
    apply(&target, universe, &mut next);
    let listing = DisplayListing::render(universe, &next);
    Ok((next, listing))
}

fn apply(target: &ToggleTarget, universe: &TypeSet, selection: &mut TypeSet) {
    match target {
        ToggleTarget::Type { type_name, checked } => {
            if *checked && selection.is_fully_selected(type_name, universe) {
                selection.remove_type(type_name);
            } else {
                let members = universe.members(type_name).cloned().unwrap_or_default();
                selection.insert_type(type_name.as_str(), members);
            }
        }
        ToggleTarget::Member {
            type_name,
            member,
            checked,
        } => {
            if *checked {
                selection.remove_member(type_name, member);
            } else {
                selection.add_member(type_name, member.as_str());
            }
        }
    }
}

/// Result of [`SelectionSession::toggle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub target: ToggleTarget,
    /// Manifest rendered from the new selection.
    pub manifest_xml: String,
}

/// Selection state for one editing target.
///
/// Toggles mutate the session in place; a session must not be shared between concurrent
/// editors.
#[derive(Debug)]
pub struct SelectionSession {
    universe: TypeSet,
    selection: TypeSet,
    listing: DisplayListing,
    cursor: usize,
    renderer: ManifestRenderer,
    version: ApiVersion,
}

impl SelectionSession {
    pub fn new(
        universe: TypeSet,
        selection: TypeSet,
        cursor: usize,
        renderer: ManifestRenderer,
        version: ApiVersion,
    ) -> Self {
        let listing = DisplayListing::render(&universe, &selection);
        let cursor = cursor.min(listing.len().saturating_sub(1));
        Self {
            universe,
            selection,
            listing,
            cursor,
            renderer,
            version,
        }
    }

    pub fn universe(&self) -> &TypeSet {
        &self.universe
    }

    pub fn selection(&self) -> &TypeSet {
        &self.selection
    }

    pub fn listing(&self) -> &DisplayListing {
        &self.listing
    }

    /// Listing index the panel should highlight.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let last = self.listing.len().saturating_sub(1);
        self.cursor = self.cursor.saturating_add_signed(delta).min(last);
    }

    /// Toggle the line at `index`, remember it as the cursor, and re-render the manifest.
    pub fn toggle(&mut self, index: usize) -> Result<ToggleOutcome> {
        let target = self.listing.resolve(index)?;
        let (selection, listing) = toggle(&self.listing, index, &self.universe, &self.selection)?;
        self.selection = selection;
        self.listing = listing;
        self.cursor = index;

        tracing::debug!(?target, types = self.selection.len(), "selection toggled");
        Ok(ToggleOutcome {
            target,
            manifest_xml: self.render_manifest()?,
        })
    }

    pub fn render_manifest(&self) -> Result<String> {
        self.renderer.render(&self.selection, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn universe() -> TypeSet {
        let mut universe = TypeSet::new();
        universe.insert_type("ApexClass", ["a", "b", "c"]);
        universe.insert_type("ApexTrigger", ["*"]);
        universe.insert_type("EmptyType", Vec::<String>::new());
        universe
    }

    fn index_of(listing: &DisplayListing, text: &str) -> usize {
        listing
            .lines()
            .iter()
            .position(|line| line.to_string() == text)
            .unwrap_or_else(|| panic!("{text} not in listing"))
    }

    #[test]
    fn renders_sorted_listing_with_markers() {
        let mut selection = TypeSet::new();
        selection.insert_type("ApexClass", ["b"]);

        let listing = DisplayListing::render(&universe(), &selection);
        let text: Vec<String> = listing.lines().iter().map(ToString::to_string).collect();

        assert_eq!(
            text,
            [
                "[√]ApexClass",
                "    [x]a",
                "    [√]b",
                "    [x]c",
                "[x]ApexTrigger",
                "    [x]*",
            ]
        );
    }

    #[test]
    fn empty_universe_types_are_not_listed() {
        let listing = DisplayListing::render(&universe(), &TypeSet::new());
        assert!(listing.lines().iter().all(|line| line.name() != "EmptyType"));
    }

    #[test]
    fn toggling_type_twice_returns_to_empty() {
        let universe = universe();
        let listing = DisplayListing::render(&universe, &TypeSet::new());
        let index = index_of(&listing, "[x]ApexClass");

        let (selected, listing) = toggle(&listing, index, &universe, &TypeSet::new()).unwrap();
        assert_eq!(selected.members("ApexClass"), universe.members("ApexClass"));

        let (cleared, _) = toggle(&listing, index, &universe, &selected).unwrap();
        assert_eq!(cleared, TypeSet::new());
    }

    #[test]
    fn toggling_partial_type_rechecks_fully() {
        let universe = universe();
        let mut selection = TypeSet::new();
        selection.insert_type("ApexClass", ["a"]);
        let listing = DisplayListing::render(&universe, &selection);

        let (next, _) = toggle(&listing, 0, &universe, &selection).unwrap();
        assert_eq!(next.members("ApexClass"), universe.members("ApexClass"));
    }

    #[test]
    fn member_toggles_add_and_remove_without_pruning() {
        let universe = universe();
        let listing = DisplayListing::render(&universe, &TypeSet::new());
        let index = index_of(&listing, "    [x]b");

        let (added, listing) = toggle(&listing, index, &universe, &TypeSet::new()).unwrap();
        assert!(added.contains_member("ApexClass", "b"));
        assert_eq!(listing.get(0).map(ListingLine::is_checked), Some(true));

        let (removed, listing) = toggle(&listing, index, &universe, &added).unwrap();
        assert!(removed.contains_type("ApexClass"));
        assert!(removed.members("ApexClass").unwrap().is_empty());
        assert_eq!(listing.get(index).map(ListingLine::is_checked), Some(false));
    }

    #[test]
    fn emptied_type_line_rechecks_fully() {
        let universe = universe();
        let mut selection = TypeSet::new();
        selection.insert_type("ApexClass", Vec::<String>::new());
        let listing = DisplayListing::render(&universe, &selection);

        let (next, _) = toggle(&listing, 0, &universe, &selection).unwrap();
        assert_eq!(next.members("ApexClass").unwrap().len(), 3);
    }

    #[test]
    fn member_resolves_to_owning_type() {
        let listing = DisplayListing::render(&universe(), &TypeSet::new());
        let index = index_of(&listing, "    [x]*");
        assert_eq!(
            listing.resolve(index).unwrap(),
            ToggleTarget::Member {
                type_name: "ApexTrigger".into(),
                member: "*".into(),
                checked: false,
            }
        );
    }

    #[test]
    fn invalid_indexes_fail_without_touching_selection() {
        let universe = universe();
        let listing = DisplayListing::render(&universe, &TypeSet::new());
        let err = toggle(&listing, 99, &universe, &TypeSet::new()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidSelection { index: 99, .. }));

        let orphan = DisplayListing {
            lines: vec![ListingLine::Member {
                name: "a".into(),
                checked: false,
            }],
        };
        assert!(orphan.resolve(0).is_err());
    }

    #[test]
    fn session_tracks_cursor_and_renders_manifest() -> Result<()> {
        let mut session = SelectionSession::new(
            universe(),
            TypeSet::new(),
            42,
            ManifestRenderer::new()?,
            ApiVersion::new(52),
        );
        assert_eq!(session.cursor(), session.listing().len() - 1);

        let outcome = session.toggle(2)?;
        assert_eq!(session.cursor(), 2);
        assert!(outcome.manifest_xml.contains("<members>b</members>"));
        assert!(outcome.manifest_xml.contains("<name>ApexClass</name>"));

        session.move_cursor(-5);
        assert_eq!(session.cursor(), 0);
        Ok(())
    }

    #[test]
    fn session_rejects_out_of_range_toggle() -> Result<()> {
        let mut session = SelectionSession::new(
            universe(),
            TypeSet::new(),
            0,
            ManifestRenderer::new()?,
            ApiVersion::new(52),
        );
        let err = session.toggle(100).unwrap_err();
        assert!(err.downcast_ref::<DomainError>().is_some());
        assert!(session.selection().is_empty());
        Ok(())
    }
}

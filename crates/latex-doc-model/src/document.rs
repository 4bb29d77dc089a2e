use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use crate::markers;
use crate::reference::{ContentReference, SectionRef};

/// Files that accompany the main `.tex` source (images, `.bib`, style files).
pub type SupportingFiles = BTreeMap<PathBuf, Vec<u8>>;

/// Lines of one region: the pre-section block and its sections in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegionContent {
    pub pre_section: Vec<String>,
    pub sections: Vec<(SectionRef, Vec<String>)>,
}

/// Ordered mapping from references to line lists.
///
/// Iteration follows document order: the main region before the appendix and,
/// within a region, the pre-section entry before its sections.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContentMap {
    entries: Vec<(ContentReference, Vec<String>)>,
}

impl ContentMap {
    pub fn from_regions(main: RegionContent, appendix: Option<RegionContent>) -> Self {
        let mut entries = Vec::new();
        push_region(&mut entries, main, false);
        if let Some(appendix) = appendix {
            push_region(&mut entries, appendix, true);
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, reference: &ContentReference) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(key, _)| key == reference)
            .map(|(_, lines)| lines.as_slice())
    }

    pub fn contains_key(&self, reference: &ContentReference) -> bool {
        self.get(reference).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ContentReference> {
        self.entries.iter().map(|(key, _)| key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ContentReference, &[String])> {
        self.entries
            .iter()
            .map(|(key, lines)| (key, lines.as_slice()))
    }

    /// Entries of one region, in order.
    pub fn region(
        &self,
        in_appendix: bool,
    ) -> impl Iterator<Item = (&ContentReference, &[String])> {
        self.iter()
            .filter(move |(key, _)| key.in_appendix() == in_appendix)
    }

    /// Whether an appendix region exists, even an empty one.
    pub fn has_appendix(&self) -> bool {
        self.contains_key(&ContentReference::pre_section(true))
    }

    pub fn sections(&self) -> impl Iterator<Item = &SectionRef> {
        self.keys().filter_map(ContentReference::as_section)
    }

    /// Every explicit and generated label, in document order.
    pub fn labels(&self) -> Vec<&str> {
        self.sections().flat_map(SectionRef::labels).collect()
    }

    /// Labels declared more than once, sorted.
    pub fn duplicate_labels(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut duplicates = BTreeSet::new();
        for label in self.labels() {
            if !seen.insert(label) {
                duplicates.insert(label.to_string());
            }
        }
        duplicates.into_iter().collect()
    }

    /// Copy of the map with `lines` placed before the existing lines of
    /// `reference`. Returns `None` when the reference is not a key.
    pub fn with_prepended(&self, reference: &ContentReference, lines: &[String]) -> Option<Self> {
        let position = self.entries.iter().position(|(key, _)| key == reference)?;
        let mut entries = self.entries.clone();
        let existing = std::mem::take(&mut entries[position].1);
        entries[position].1 = lines.iter().cloned().chain(existing).collect();
        Some(Self { entries })
    }
}

fn push_region(
    entries: &mut Vec<(ContentReference, Vec<String>)>,
    region: RegionContent,
    in_appendix: bool,
) {
    entries.push((ContentReference::pre_section(in_appendix), region.pre_section));
    for (section, lines) in region.sections {
        debug_assert_eq!(section.in_appendix, in_appendix);
        entries.push((ContentReference::Section(section), lines));
    }
}

/// Constructor input for [`Document`].
#[derive(Clone, Debug, Default)]
pub struct DocumentParts {
    pub pre_matter: Vec<String>,
    pub begin_document: Vec<String>,
    pub content: ContentMap,
    pub bibliography: Vec<String>,
    pub supporting_files: SupportingFiles,
}

/// Immutable structural model of a LaTeX document.
///
/// Every update goes through a `with_*` method that returns a new value; the
/// supporting files are shared between copies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pre_matter: Vec<String>,
    begin_document: Vec<String>,
    content: ContentMap,
    bibliography: Vec<String>,
    supporting_files: Arc<SupportingFiles>,
}

impl Document {
    pub fn from_parts(parts: DocumentParts) -> Self {
        Self {
            pre_matter: parts.pre_matter,
            begin_document: parts.begin_document,
            content: parts.content,
            bibliography: parts.bibliography,
            supporting_files: Arc::new(parts.supporting_files),
        }
    }

    /// Lines from `\documentclass` up to, not including, `\begin{document}`.
    pub fn pre_matter(&self) -> &[String] {
        &self.pre_matter
    }

    /// Lines between `\begin{document}` and `\maketitle`.
    pub fn begin_document(&self) -> &[String] {
        &self.begin_document
    }

    pub fn content(&self) -> &ContentMap {
        &self.content
    }

    /// Bibliography block including its opening line; empty when absent.
    pub fn bibliography(&self) -> &[String] {
        &self.bibliography
    }

    pub fn supporting_files(&self) -> &SupportingFiles {
        &self.supporting_files
    }

    pub fn labels(&self) -> Vec<&str> {
        self.content.labels()
    }

    pub fn with_pre_matter(&self, pre_matter: Vec<String>) -> Self {
        Self {
            pre_matter,
            ..self.clone()
        }
    }

    pub fn with_content(&self, content: ContentMap) -> Self {
        Self {
            content,
            ..self.clone()
        }
    }

    pub fn with_supporting_files(&self, supporting_files: SupportingFiles) -> Self {
        Self {
            supporting_files: Arc::new(supporting_files),
            ..self.clone()
        }
    }

    /// Adds `\usepackage{package}` to the end of the preamble unless that
    /// exact line is already present.
    pub fn with_extra_package(&self, package: &str) -> Self {
        let line = markers::use_package(package);
        if self.pre_matter.iter().any(|existing| existing == &line) {
            return self.clone();
        }
        let mut pre_matter = self.pre_matter.clone();
        pre_matter.push(line);
        self.with_pre_matter(pre_matter)
    }
}

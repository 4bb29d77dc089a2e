use std::fmt;

use serde::Serialize;

const GENERATED_LABEL_PREFIX: &str = "sec:genai:generated:label:";
const APPENDIX_INFIX: &str = "appendix:";

/// Content before the first `\section{..}` of a region.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct PreSectionRef {
    pub in_appendix: bool,
}

/// A `\section{..}` entry and the labels it can be addressed by.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct SectionRef {
    pub in_appendix: bool,
    pub title: String,
    /// The first `\label{..}` found in the section body, if any.
    pub label: Option<String>,
    /// Always present; emitted by the serializer right after the title.
    pub generated_label: String,
}

impl SectionRef {
    pub fn new(
        in_appendix: bool,
        index: usize,
        title: impl Into<String>,
        label: Option<String>,
    ) -> Self {
        Self {
            in_appendix,
            title: title.into(),
            label,
            generated_label: generated_label(index, in_appendix),
        }
    }

    /// Explicit label (if any) followed by the generated one.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.label
            .as_deref()
            .into_iter()
            .chain(std::iter::once(self.generated_label.as_str()))
    }
}

/// Identifies exactly one entry of a document's content map.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ContentReference {
    PreSection(PreSectionRef),
    Section(SectionRef),
}

impl ContentReference {
    pub fn pre_section(in_appendix: bool) -> Self {
        ContentReference::PreSection(PreSectionRef { in_appendix })
    }

    pub fn in_appendix(&self) -> bool {
        match self {
            ContentReference::PreSection(pre) => pre.in_appendix,
            ContentReference::Section(section) => section.in_appendix,
        }
    }

    pub fn as_section(&self) -> Option<&SectionRef> {
        match self {
            ContentReference::Section(section) => Some(section),
            ContentReference::PreSection(_) => None,
        }
    }
}

impl From<SectionRef> for ContentReference {
    fn from(section: SectionRef) -> Self {
        ContentReference::Section(section)
    }
}

impl fmt::Display for ContentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let region = if self.in_appendix() { "appendix" } else { "main" };
        match self {
            ContentReference::PreSection(_) => write!(f, "pre-section ({region})"),
            ContentReference::Section(section) => {
                write!(f, "section '{}' ({region}", section.title)?;
                if let Some(label) = &section.label {
                    write!(f, ", label {label}")?;
                }
                write!(f, ", {})", section.generated_label)
            }
        }
    }
}

/// Label assigned to the `index`-th section (zero-based) of a region.
pub fn generated_label(index: usize, in_appendix: bool) -> String {
    if in_appendix {
        format!("{GENERATED_LABEL_PREFIX}{APPENDIX_INFIX}{index}")
    } else {
        format!("{GENERATED_LABEL_PREFIX}{index}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_labels_are_namespaced_per_region() {
        assert_eq!(generated_label(0, false), "sec:genai:generated:label:0");
        assert_eq!(
            generated_label(0, true),
            "sec:genai:generated:label:appendix:0"
        );
        assert_ne!(generated_label(3, false), generated_label(3, true));
    }

    #[test]
    fn labels_list_explicit_first() {
        let section = SectionRef::new(false, 2, "Method", Some("sec:method".into()));
        let labels: Vec<&str> = section.labels().collect();
        assert_eq!(labels, vec!["sec:method", "sec:genai:generated:label:2"]);

        let bare = SectionRef::new(true, 0, "Extra", None);
        assert_eq!(bare.labels().count(), 1);
    }

    #[test]
    fn display_names_region_and_labels() {
        let reference: ContentReference =
            SectionRef::new(false, 0, "Intro", Some("sec:intro".into())).into();
        assert_eq!(
            reference.to_string(),
            "section 'Intro' (main, label sec:intro, sec:genai:generated:label:0)"
        );
        assert_eq!(
            ContentReference::pre_section(true).to_string(),
            "pre-section (appendix)"
        );
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_value(ContentReference::pre_section(false)).unwrap();
        assert_eq!(json["kind"], "pre-section");
        assert_eq!(json["in_appendix"], false);
    }
}
